use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::info;

use crate::api::storage_failure;
use crate::engine::clock::ClockHandle;
use crate::engine::metrics::count_absences;
use crate::storage::Storage;
use crate::utils::csv_export;

fn csv_attachment(filename: String, body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .body(body)
}

/// Today's attendance as a spreadsheet
#[utoipa::path(
    get,
    path = "/api/export/attendance",
    responses(
        (status = 200, description = "Semicolon separated CSV", body = String, content_type = "text/csv"),
        (status = 404, description = "No records today", body = Object, example = json!({
            "message": "No records to export"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Export"
)]
pub async fn export_attendance(
    storage: web::Data<Storage>,
    clock: web::Data<ClockHandle>,
) -> actix_web::Result<impl Responder> {
    let today = clock.today();

    let (roster, records) =
        futures::future::join(storage.employees(), storage.records_on(today)).await;
    let roster = roster.map_err(|e| storage_failure(e, "export_attendance"))?;
    let records = records.map_err(|e| storage_failure(e, "export_attendance"))?;

    if records.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No records to export"
        })));
    }

    let filename = csv_export::attendance_filename(today);
    info!(records = records.len(), filename = %filename, "Exporting attendance");

    Ok(csv_attachment(
        filename,
        csv_export::attendance_csv(&records, &roster),
    ))
}

/// Roster with absence days as a spreadsheet
#[utoipa::path(
    get,
    path = "/api/export/employees",
    responses(
        (status = 200, description = "Semicolon separated CSV", body = String, content_type = "text/csv"),
        (status = 404, description = "No employees registered", body = Object, example = json!({
            "message": "No employees to export"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Export"
)]
pub async fn export_employees(
    storage: web::Data<Storage>,
    clock: web::Data<ClockHandle>,
) -> actix_web::Result<impl Responder> {
    let (roster, records) = futures::future::join(storage.employees(), storage.records()).await;
    let roster = roster.map_err(|e| storage_failure(e, "export_employees"))?;
    let records = records.map_err(|e| storage_failure(e, "export_employees"))?;

    if roster.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No employees to export"
        })));
    }

    let today = clock.today();
    let offset = clock.offset();
    let filename = csv_export::employees_filename(today);
    info!(employees = roster.len(), filename = %filename, "Exporting employees");

    let body = csv_export::employees_csv(&roster, offset, |e| {
        count_absences(&e.employee_id, &roster, &records, today, offset)
    });

    Ok(csv_attachment(filename, body))
}
