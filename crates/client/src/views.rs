//! Screen-side narrowing of an already fetched page: the search box,
//! dropdown filters and column sorting of the list screens.

pub use db::query::Searchable;
use db::models::{
    equipment::{Equipment, EquipmentStatus},
    service_request::{RequestPriority, ServiceRequest},
    work_order::{OrderStatus, WorkOrder},
};
use utils::views::{SortDirection, filter_view, matches_choice, matches_text, sort_by_key};

/// The search box: same fields the server-side `search` filter looks at.
pub fn search<T: Searchable + Clone>(items: &[T], term: &str) -> Vec<T> {
    filter_view(items, |item| matches_text(item.search_fields(), term))
}

/// Equipment list: search box, status dropdown, sorted by name.
pub fn equipment_view(
    items: &[Equipment],
    term: &str,
    estado: Option<EquipmentStatus>,
    direction: SortDirection,
) -> Vec<Equipment> {
    let mut view = filter_view(items, |e| {
        matches_text(e.search_fields(), term) && matches_choice(&e.estado, estado.as_ref())
    });
    sort_by_key(&mut view, |e| e.nombre.to_lowercase(), direction);
    view
}

/// Work-order list sorted by scheduled date. Unscheduled orders sort first ascending.
pub fn orders_view(
    items: &[WorkOrder],
    term: &str,
    estado: Option<OrderStatus>,
    direction: SortDirection,
) -> Vec<WorkOrder> {
    let mut view = filter_view(items, |o| {
        matches_text(o.search_fields(), term) && matches_choice(&o.estado, estado.as_ref())
    });
    sort_by_key(&mut view, |o| o.fecha_programada, direction);
    view
}

fn urgency(prioridad: RequestPriority) -> u8 {
    match prioridad {
        RequestPriority::Baja => 0,
        RequestPriority::Media => 1,
        RequestPriority::Alta => 2,
        RequestPriority::Urgente => 3,
    }
}

/// Service requests, most urgent first; ties keep their fetched order.
pub fn requests_by_urgency(items: &[ServiceRequest], term: &str) -> Vec<ServiceRequest> {
    let mut view = search(items, term);
    sort_by_key(&mut view, |r| urgency(r.prioridad), SortDirection::Desc);
    view
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use db::models::service_request::{RequestStatus, RequestType};
    use uuid::Uuid;

    use super::*;

    fn equipment(nombre: &str, marca: Option<&str>, estado: EquipmentStatus) -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            sede_id: Uuid::new_v4(),
            nombre: nombre.to_string(),
            marca: marca.map(str::to_string),
            modelo: None,
            serie: None,
            tipo: None,
            estado,
            fecha_instalacion: None,
            ultimo_mantenimiento: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn order(numero: &str, estado: OrderStatus, fecha: Option<NaiveDate>) -> WorkOrder {
        WorkOrder {
            id: Uuid::new_v4(),
            numero: numero.to_string(),
            solicitud_id: Uuid::new_v4(),
            equipo_id: Uuid::new_v4(),
            tecnico_id: None,
            estado,
            fecha_programada: fecha,
            fecha_ejecucion: None,
            observaciones: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn request(descripcion: &str, prioridad: RequestPriority) -> ServiceRequest {
        ServiceRequest {
            id: Uuid::new_v4(),
            cliente_id: Uuid::new_v4(),
            sede_id: Uuid::new_v4(),
            equipo_id: None,
            tipo: RequestType::default(),
            prioridad,
            descripcion: descripcion.to_string(),
            estado: RequestStatus::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn equipment_view_filters_and_sorts() {
        let items = vec![
            equipment("Unidad dental", Some("Sirona"), EquipmentStatus::Operativo),
            equipment("autoclave", Some("Tuttnauer"), EquipmentStatus::Operativo),
            equipment("Rayos X", Some("Sirona"), EquipmentStatus::EnMantenimiento),
        ];

        let view = equipment_view(&items, "sirona", None, SortDirection::Asc);
        let names: Vec<_> = view.iter().map(|e| e.nombre.as_str()).collect();
        assert_eq!(names, ["Rayos X", "Unidad dental"]);

        let view = equipment_view(&items, "", Some(EquipmentStatus::Operativo), SortDirection::Desc);
        let names: Vec<_> = view.iter().map(|e| e.nombre.as_str()).collect();
        assert_eq!(names, ["Unidad dental", "autoclave"]);
    }

    #[test]
    fn orders_sort_by_schedule() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d);
        let items = vec![
            order("OT-000003", OrderStatus::Pending, day(20)),
            order("OT-000001", OrderStatus::Executed, day(5)),
            order("OT-000002", OrderStatus::Pending, None),
        ];

        let view = orders_view(&items, "", None, SortDirection::Asc);
        let numeros: Vec<_> = view.iter().map(|o| o.numero.as_str()).collect();
        assert_eq!(numeros, ["OT-000002", "OT-000001", "OT-000003"]);

        let view = orders_view(&items, "ot-", Some(OrderStatus::Pending), SortDirection::Desc);
        let numeros: Vec<_> = view.iter().map(|o| o.numero.as_str()).collect();
        assert_eq!(numeros, ["OT-000003", "OT-000002"]);
    }

    #[test]
    fn urgent_requests_come_first() {
        let items = vec![
            request("Revisión anual", RequestPriority::Baja),
            request("Fuga en compresor", RequestPriority::Urgente),
            request("Lámpara intermitente", RequestPriority::Media),
            request("Compresor ruidoso", RequestPriority::Urgente),
        ];

        let view = requests_by_urgency(&items, "");
        let descripciones: Vec<_> = view.iter().map(|r| r.descripcion.as_str()).collect();
        assert_eq!(
            descripciones,
            ["Fuga en compresor", "Compresor ruidoso", "Lámpara intermitente", "Revisión anual"]
        );

        assert_eq!(requests_by_urgency(&items, "COMPRESOR").len(), 2);
    }
}
