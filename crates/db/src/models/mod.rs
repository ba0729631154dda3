pub mod client;
pub mod equipment;
pub mod notification;
pub mod permission;
pub mod service_request;
pub mod session;
pub mod site;
pub mod technician;
pub mod user;
pub mod warehouse_request;
pub mod work_order;
