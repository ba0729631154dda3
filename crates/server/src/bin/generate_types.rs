//! Writes the TypeScript declarations of every API type to `shared/types.ts`.

use std::{env, fs, path::PathBuf};

use ts_rs::TS;

fn declarations() -> Vec<String> {
    vec![
        utils::response::ErrorBody::decl(),
        utils::response::ApiResponse::<()>::decl(),
        utils::pagination::PageRequest::decl(),
        utils::pagination::Pagination::decl(),
        utils::pagination::Page::<()>::decl(),
        utils::views::SortDirection::decl(),
        db::models::user::UserRole::decl(),
        db::models::user::User::decl(),
        db::models::user::CreateUserRequest::decl(),
        db::models::user::UpdateUserRequest::decl(),
        db::models::user::UserFilters::decl(),
        db::models::client::Client::decl(),
        db::models::client::CreateClient::decl(),
        db::models::client::UpdateClient::decl(),
        db::models::client::ClientFilters::decl(),
        db::models::site::Site::decl(),
        db::models::site::CreateSite::decl(),
        db::models::site::UpdateSite::decl(),
        db::models::site::SiteFilters::decl(),
        db::models::equipment::EquipmentStatus::decl(),
        db::models::equipment::Equipment::decl(),
        db::models::equipment::CreateEquipment::decl(),
        db::models::equipment::UpdateEquipment::decl(),
        db::models::equipment::EquipmentFilters::decl(),
        db::models::technician::Technician::decl(),
        db::models::technician::CreateTechnician::decl(),
        db::models::technician::UpdateTechnician::decl(),
        db::models::technician::TechnicianFilters::decl(),
        db::models::service_request::RequestType::decl(),
        db::models::service_request::RequestPriority::decl(),
        db::models::service_request::RequestStatus::decl(),
        db::models::service_request::ServiceRequest::decl(),
        db::models::service_request::CreateServiceRequest::decl(),
        db::models::service_request::UpdateServiceRequest::decl(),
        db::models::service_request::ServiceRequestFilters::decl(),
        db::models::work_order::OrderStatus::decl(),
        db::models::work_order::WorkOrder::decl(),
        db::models::work_order::CreateWorkOrder::decl(),
        db::models::work_order::UpdateWorkOrder::decl(),
        db::models::work_order::UpdateOrderStatus::decl(),
        db::models::work_order::WorkOrderFilters::decl(),
        db::models::work_order::OrderStats::decl(),
        db::models::warehouse_request::WarehouseStatus::decl(),
        db::models::warehouse_request::WarehouseRequest::decl(),
        db::models::warehouse_request::CreateWarehouseRequest::decl(),
        db::models::warehouse_request::UpdateWarehouseRequest::decl(),
        db::models::warehouse_request::WarehouseRequestFilters::decl(),
        db::models::notification::NotificationKind::decl(),
        db::models::notification::Notification::decl(),
        db::models::notification::CreateNotification::decl(),
        db::models::notification::UpdateNotification::decl(),
        db::models::notification::NotificationFilters::decl(),
        db::models::notification::UnreadCount::decl(),
        db::models::notification::MarkedRead::decl(),
        db::models::permission::AppModule::decl(),
        db::models::permission::Action::decl(),
        db::models::permission::Permission::decl(),
        db::models::permission::CreatePermission::decl(),
        db::models::permission::UpdatePermission::decl(),
        db::models::permission::PermissionFilters::decl(),
        services::services::auth::LoginResponse::decl(),
        services::services::auth::RefreshResponse::decl(),
        services::services::permissions::ModuleAccess::decl(),
        services::services::tracking::TrackingStep::decl(),
        services::services::tracking::TimelineEntry::decl(),
        services::services::tracking::Tracking::decl(),
        services::services::tracking::WarehouseTracking::decl(),
        server::routes::auth::LoginRequest::decl(),
        server::routes::auth::RefreshRequest::decl(),
        server::routes::health::HealthStatus::decl(),
    ]
}

fn main() -> std::io::Result<()> {
    let out_dir = env::var("TYPES_OUT_DIR").map_or_else(|_| PathBuf::from("shared"), PathBuf::from);
    fs::create_dir_all(&out_dir)?;

    let mut contents = String::from("// Generated by `cargo run --bin generate_types`. Do not edit.\n\n");
    for decl in declarations() {
        contents.push_str("export ");
        contents.push_str(&decl);
        contents.push_str("\n\n");
    }

    let path = out_dir.join("types.ts");
    fs::write(&path, contents)?;
    println!("Wrote {}", path.display());
    Ok(())
}
