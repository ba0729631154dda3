//! One module per back-office resource. Every function is a single call
//! against a fixed path and returns the envelope's `data`.

pub mod clientes;
pub mod equipos;
pub mod notificaciones;
pub mod ordenes;
pub mod permisos;
pub mod sedes;
pub mod solicitudes;
pub mod solicitudes_bodega;
pub mod tecnicos;
pub mod usuarios;
