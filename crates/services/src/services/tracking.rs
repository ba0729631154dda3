//! Derived progress for warehouse requests. Pure functions over the stored dates.

use chrono::NaiveDate;
use db::models::warehouse_request::{WarehouseRequest, WarehouseStatus};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrackingStep {
    Solicitada,
    Aprobada,
    Despachada,
    Entregada,
    Rechazada,
}

const STEP_COUNT: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct TimelineEntry {
    pub step: TrackingStep,
    pub fecha: Option<NaiveDate>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Tracking {
    pub solicitud_id: Uuid,
    pub estado: WarehouseStatus,
    pub current_step: TrackingStep,
    /// 0..=100
    pub progress: u8,
    pub days_elapsed: i64,
    pub timeline: Vec<TimelineEntry>,
}

/// Warehouse request together with its derived progress.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct WarehouseTracking {
    pub solicitud: WarehouseRequest,
    pub seguimiento: Tracking,
}

/// Date fields in step order.
fn step_dates(request: &WarehouseRequest) -> [(TrackingStep, Option<NaiveDate>); 4] {
    [
        (TrackingStep::Solicitada, Some(request.fecha_solicitud)),
        (TrackingStep::Aprobada, request.fecha_aprobacion),
        (TrackingStep::Despachada, request.fecha_despacho),
        (TrackingStep::Entregada, request.fecha_entrega),
    ]
}

pub fn timeline(request: &WarehouseRequest) -> Vec<TimelineEntry> {
    step_dates(request)
        .into_iter()
        .map(|(step, fecha)| TimelineEntry {
            step,
            fecha,
            completed: fecha.is_some(),
        })
        .collect()
}

/// Percentage of the four steps whose date is recorded. Rejected requests report 0.
pub fn progress(request: &WarehouseRequest) -> u8 {
    if request.estado == WarehouseStatus::Rechazada {
        return 0;
    }
    let completed = step_dates(request)
        .iter()
        .filter(|(_, fecha)| fecha.is_some())
        .count() as u8;
    completed * 100 / STEP_COUNT
}

/// Latest step with a recorded date.
pub fn current_step(request: &WarehouseRequest) -> TrackingStep {
    if request.estado == WarehouseStatus::Rechazada {
        return TrackingStep::Rechazada;
    }
    step_dates(request)
        .into_iter()
        .rev()
        .find(|(_, fecha)| fecha.is_some())
        .map(|(step, _)| step)
        .unwrap_or(TrackingStep::Solicitada)
}

/// Whole days from the request date to delivery, or to `today` while undelivered.
pub fn days_elapsed(request: &WarehouseRequest, today: NaiveDate) -> i64 {
    let end = request.fecha_entrega.unwrap_or(today);
    (end - request.fecha_solicitud).num_days().max(0)
}

pub fn track(request: &WarehouseRequest, today: NaiveDate) -> Tracking {
    Tracking {
        solicitud_id: request.id,
        estado: request.estado,
        current_step: current_step(request),
        progress: progress(request),
        days_elapsed: days_elapsed(request, today),
        timeline: timeline(request),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn request(solicitud: NaiveDate) -> WarehouseRequest {
        WarehouseRequest {
            id: Uuid::new_v4(),
            orden_id: None,
            tecnico_id: None,
            descripcion: "Kit de mantenimiento".to_string(),
            cantidad: 1,
            estado: WarehouseStatus::Pendiente,
            fecha_solicitud: solicitud,
            fecha_aprobacion: None,
            fecha_despacho: None,
            fecha_entrega: None,
            observaciones: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn new_request_is_a_quarter_done() {
        let r = request(date(3, 1));
        assert_eq!(progress(&r), 25);
        assert_eq!(current_step(&r), TrackingStep::Solicitada);
        assert_eq!(days_elapsed(&r, date(3, 11)), 10);
    }

    #[test]
    fn progress_counts_recorded_dates() {
        let mut r = request(date(3, 1));
        r.fecha_aprobacion = Some(date(3, 2));
        assert_eq!(progress(&r), 50);
        r.fecha_despacho = Some(date(3, 4));
        assert_eq!(progress(&r), 75);
        assert_eq!(current_step(&r), TrackingStep::Despachada);
    }

    #[test]
    fn delivered_request_stops_the_clock() {
        let mut r = request(date(3, 1));
        r.estado = WarehouseStatus::Entregada;
        r.fecha_aprobacion = Some(date(3, 2));
        r.fecha_despacho = Some(date(3, 3));
        r.fecha_entrega = Some(date(3, 6));

        let tracking = track(&r, date(6, 30));
        assert_eq!(tracking.progress, 100);
        assert_eq!(tracking.current_step, TrackingStep::Entregada);
        assert_eq!(tracking.days_elapsed, 5);
        assert!(tracking.timeline.iter().all(|e| e.completed));
    }

    #[test]
    fn skipped_step_still_reports_latest_date() {
        let mut r = request(date(3, 1));
        r.fecha_despacho = Some(date(3, 5));
        assert_eq!(progress(&r), 50);
        assert_eq!(current_step(&r), TrackingStep::Despachada);
        let approved = &timeline(&r)[1];
        assert_eq!(approved.step, TrackingStep::Aprobada);
        assert!(!approved.completed);
    }

    #[test]
    fn rejected_request_has_no_progress() {
        let mut r = request(date(3, 1));
        r.estado = WarehouseStatus::Rechazada;
        r.fecha_aprobacion = Some(date(3, 2));
        assert_eq!(progress(&r), 0);
        assert_eq!(current_step(&r), TrackingStep::Rechazada);
        assert_eq!(timeline(&r).len(), 4);
    }

    #[test]
    fn future_request_date_never_goes_negative() {
        let r = request(date(5, 1));
        assert_eq!(days_elapsed(&r, date(4, 1)), 0);
    }
}
