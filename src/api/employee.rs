use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

use crate::api::storage_failure;
use crate::engine::clock::ClockHandle;
use crate::engine::metrics::{EmployeeStats, count_absences, count_lateness};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{Employee, NewEmployee, RegistrationError};
use crate::storage::Storage;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Matches identifier, name or DNI, case-insensitive.
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeListItem {
    #[serde(flatten)]
    pub employee: Employee,
    #[schema(example = 2)]
    pub absence_days: usize,
    #[schema(example = 1)]
    pub lateness_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<EmployeeListItem>,
    #[schema(example = 10)]
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeProfile {
    pub employee: Employee,
    pub total_records: usize,
    pub attended_days: usize,
    pub absence_days: usize,
    pub lateness_count: usize,
    /// Most recent record by date and time.
    pub last_attendance: Option<AttendanceRecord>,
}

/// Register Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee registered", body = Employee),
        (status = 400, description = "Missing required field", body = Object, example = json!({
            "message": "name is required"
        })),
        (status = 409, description = "Employee id or DNI already registered", body = Object, example = json!({
            "message": "Employee id EMP-001 already exists"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    storage: web::Data<Storage>,
    clock: web::Data<ClockHandle>,
    payload: web::Json<NewEmployee>,
) -> actix_web::Result<impl Responder> {
    let now = clock.now().with_timezone(&Utc);

    let employee = match storage.register_employee(payload.into_inner(), now).await {
        Ok(employee) => employee,
        Err(e) => {
            return match e.downcast_ref::<RegistrationError>() {
                Some(rejection @ RegistrationError::MissingField(_)) => Ok(HttpResponse::BadRequest()
                    .json(json!({ "message": rejection.to_string() }))),
                Some(rejection) => {
                    Ok(HttpResponse::Conflict().json(json!({ "message": rejection.to_string() })))
                }
                None => Err(storage_failure(e, "create_employee")),
            };
        }
    };

    info!(employee_id = %employee.employee_id, "Employee registered");
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Roster with absence and lateness counts", body = EmployeeListResponse)
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    storage: web::Data<Storage>,
    clock: web::Data<ClockHandle>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let (roster, records) = futures::future::join(storage.employees(), storage.records()).await;
    let roster = roster.map_err(|e| storage_failure(e, "list_employees"))?;
    let records = records.map_err(|e| storage_failure(e, "list_employees"))?;

    let today = clock.today();
    let offset = clock.offset();
    let search = query.search.as_deref().unwrap_or("");

    let data: Vec<EmployeeListItem> = roster
        .iter()
        .filter(|e| e.matches(search))
        .map(|e| EmployeeListItem {
            absence_days: count_absences(&e.employee_id, &roster, &records, today, offset),
            lateness_count: count_lateness(&e.employee_id, &roster, &records),
            employee: e.clone(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        total: data.len(),
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee identifier")
    ),
    responses(
        (status = 200, description = "Employee profile", body = EmployeeProfile),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    storage: web::Data<Storage>,
    clock: web::Data<ClockHandle>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let employee = storage
        .find_employee(&employee_id)
        .await
        .map_err(|e| storage_failure(e, "get_employee"))?;

    let Some(employee) = employee else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let records = storage
        .records()
        .await
        .map_err(|e| storage_failure(e, "get_employee"))?;

    let stats = EmployeeStats::compute(&employee, &records, clock.today(), clock.offset());

    Ok(HttpResponse::Ok().json(EmployeeProfile {
        employee,
        total_records: stats.total_records,
        attended_days: stats.attended_days,
        absence_days: stats.absence_days,
        lateness_count: stats.lateness_count,
        last_attendance: stats.last_record,
    }))
}

/// Delete Employee. Attendance history is kept.
#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee identifier")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    storage: web::Data<Storage>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    match storage.delete_employee(&employee_id).await {
        Ok(true) => {
            info!(employee_id = %employee_id, "Employee deleted");
            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
        Err(e) => {
            error!(error = %e, employee_id = %employee_id, "Failed to delete employee");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}
