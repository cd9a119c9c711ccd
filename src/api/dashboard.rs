use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::storage_failure;
use crate::engine::clock::ClockHandle;
use crate::engine::metrics::DailySummary;
use crate::storage::Storage;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    #[schema(example = "2026-01-19", format = "date")]
    pub date: String,
    #[schema(example = 12)]
    pub total_employees: usize,
    /// Distinct employees with at least one record today.
    #[schema(example = 9)]
    pub present: usize,
    #[schema(example = 23)]
    pub records: usize,
    /// Time of the latest record today, `HH:MM:SS`.
    #[schema(example = "13:42:10", nullable = true)]
    pub last_activity: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Today's headline numbers", body = DashboardResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Dashboard"
)]
pub async fn get_dashboard(
    storage: web::Data<Storage>,
    clock: web::Data<ClockHandle>,
) -> actix_web::Result<impl Responder> {
    let today = clock.today();

    let (roster, records) =
        futures::future::join(storage.employees(), storage.records_on(today)).await;
    let roster = roster.map_err(|e| storage_failure(e, "dashboard"))?;
    let records = records.map_err(|e| storage_failure(e, "dashboard"))?;

    let summary = DailySummary::compute(&roster, &records);

    Ok(HttpResponse::Ok().json(DashboardResponse {
        date: today.format("%Y-%m-%d").to_string(),
        total_employees: summary.total_employees,
        present: summary.present,
        records: summary.records,
        last_activity: summary
            .last_activity
            .map(|t| t.format("%H:%M:%S").to_string()),
    }))
}
