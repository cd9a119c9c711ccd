use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::api::storage_failure;
use crate::engine::clock::ClockHandle;
use crate::engine::schedule::{self, SCHEDULE};
use crate::model::attendance::{AttendanceRecord, EventKind};
use crate::storage::Storage;
use crate::utils::csv_export::format_time;

/// Payload of a kiosk scan or a manual entry.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Decoded QR text; surrounding whitespace is ignored.
    #[schema(example = "EMP-001")]
    pub employee_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordAttendanceResponse {
    #[schema(example = "Rosa Quispe - Entrada registrado: 7:58 AM")]
    pub message: String,
    #[schema(example = "Entrada")]
    pub label: String,
    pub record: AttendanceRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleSlotResponse {
    pub kind: EventKind,
    #[schema(example = "Entrada")]
    pub label: String,
    #[schema(example = "08:00")]
    pub scheduled: String,
    #[schema(example = "06:00")]
    pub window_start: String,
    #[schema(example = "11:00")]
    pub window_end: String,
}

fn hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Record attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = ScanRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = RecordAttendanceResponse),
        (status = 400, description = "Empty identifier", body = Object, example = json!({
            "message": "employee_id is required"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 429, description = "Too many scans"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    storage: web::Data<Storage>,
    clock: web::Data<ClockHandle>,
    payload: web::Json<ScanRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = payload.employee_id.trim();
    if employee_id.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "employee_id is required"
        })));
    }

    let employee = storage
        .find_employee(employee_id)
        .await
        .map_err(|e| storage_failure(e, "record_attendance"))?;

    let Some(employee) = employee else {
        warn!(employee_id, "Scan for unknown employee");
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let now = clock.now();
    let kind = schedule::classify(now.time());
    let record = AttendanceRecord::new(&employee, kind, now);

    storage.append_record(&record).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to record attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let label = schedule::label(kind);
    info!(
        employee_id,
        event_type = kind.as_str(),
        event_time = %record.event_time,
        "Attendance recorded"
    );

    Ok(HttpResponse::Created().json(RecordAttendanceResponse {
        message: format!(
            "{} - {} registrado: {}",
            employee.name,
            label,
            format_time(record.event_time)
        ),
        label: label.to_string(),
        record,
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Records for the current operational day", body = [AttendanceRecord]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn today_attendance(
    storage: web::Data<Storage>,
    clock: web::Data<ClockHandle>,
) -> actix_web::Result<impl Responder> {
    let records = storage
        .records_on(clock.today())
        .await
        .map_err(|e| storage_failure(e, "today_attendance"))?;

    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    get,
    path = "/api/schedule",
    responses(
        (status = 200, description = "Daily schedule and clock windows", body = [ScheduleSlotResponse])
    ),
    tag = "Attendance"
)]
pub async fn get_schedule() -> impl Responder {
    let slots: Vec<ScheduleSlotResponse> = SCHEDULE
        .iter()
        .map(|slot| ScheduleSlotResponse {
            kind: slot.kind,
            label: slot.label.to_string(),
            scheduled: slot.scheduled.to_string(),
            window_start: hhmm(slot.window_start),
            window_end: hhmm(slot.window_end),
        })
        .collect();

    HttpResponse::Ok().json(slots)
}

#[cfg(test)]
mod tests {
    use actix_web::http::{Method, StatusCode};
    use actix_web::{App, test};
    use chrono::NaiveDate;
    use serde_json::{Value, json};

    use crate::api::test_support::{app_routes, clock_at, request, storage};

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    async fn register(storage: &actix_web::web::Data<crate::storage::Storage>) {
        let app = test::init_service(
            App::new()
                .app_data(storage.clone())
                .app_data(clock_at(monday(), 6, 30))
                .configure(app_routes),
        )
        .await;
        let req = request()
            .method(Method::POST)
            .uri("/api/employee")
            .set_json(json!({
                "employee_id": "EMP-001",
                "name": "Rosa Quispe",
                "position": "Operaria"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn scan_is_classified_by_the_clock() {
        let storage = storage();
        register(&storage).await;

        for (hour, minute, kind, label) in [
            (7, 58, "entrada", "Entrada"),
            (12, 40, "salida_almuerzo", "Salida a Almuerzo"),
            (13, 45, "regreso_almuerzo", "Regreso de Almuerzo"),
            (17, 31, "salida_final", "Salida Final"),
            (20, 0, "entrada", "Entrada"),
        ] {
            let app = test::init_service(
                App::new()
                    .app_data(storage.clone())
                    .app_data(clock_at(monday(), hour, minute))
                    .configure(app_routes),
            )
            .await;

            let req = request()
                .method(Method::POST)
                .uri("/api/attendance")
                .set_json(json!({ "employee_id": "  EMP-001\n" }))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;

            assert_eq!(body["record"]["event_type"], kind);
            assert_eq!(body["label"], label);
            assert_eq!(body["record"]["employee_name"], "Rosa Quispe");
            assert_eq!(body["record"]["event_date"], "2026-01-05");
        }

        let app = test::init_service(
            App::new()
                .app_data(storage)
                .app_data(clock_at(monday(), 21, 0))
                .configure(app_routes),
        )
        .await;
        let req = request().uri("/api/attendance/today").to_request();
        let today: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(today.as_array().map(Vec::len), Some(5));
        assert_eq!(today[0]["event_time"], "07:58:00");
    }

    #[actix_web::test]
    async fn message_mentions_name_label_and_time() {
        let storage = storage();
        register(&storage).await;
        let app = test::init_service(
            App::new()
                .app_data(storage)
                .app_data(clock_at(monday(), 8, 5))
                .configure(app_routes),
        )
        .await;

        let req = request()
            .method(Method::POST)
            .uri("/api/attendance")
            .set_json(json!({ "employee_id": "EMP-001" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Rosa Quispe - Entrada registrado: 8:05 AM");
    }

    #[actix_web::test]
    async fn unknown_or_blank_identifier_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(storage())
                .app_data(clock_at(monday(), 8, 0))
                .configure(app_routes),
        )
        .await;

        let req = request()
            .method(Method::POST)
            .uri("/api/attendance")
            .set_json(json!({ "employee_id": "NOPE" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = request()
            .method(Method::POST)
            .uri("/api/attendance")
            .set_json(json!({ "employee_id": "   " }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn schedule_lists_the_four_windows_in_order() {
        let app = test::init_service(
            App::new()
                .app_data(storage())
                .app_data(clock_at(monday(), 8, 0))
                .configure(app_routes),
        )
        .await;

        let req = request().uri("/api/schedule").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(4));
        assert_eq!(body[0]["window_start"], "06:00");
        assert_eq!(body[1]["window_start"], "11:01");
        assert_eq!(body[2]["kind"], "regreso_almuerzo");
        assert_eq!(body[3]["window_end"], "19:00");
    }
}
