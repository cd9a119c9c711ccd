use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{EnumString, IntoStaticStr};
use utoipa::ToSchema;

use crate::model::employee::Employee;

/// The four attendance events of a working day.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Entrada,
    SalidaAlmuerzo,
    RegresoAlmuerzo,
    SalidaFinal,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// One clock event. Name and position are copied from the roster at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "0d5f3a1e-8c1b-4f3e-9a57-4b0a7c2f9e11",
        "employee_id": "EMP-001",
        "employee_name": "Rosa Quispe",
        "employee_position": "Operaria",
        "event_type": "entrada",
        "event_date": "2026-01-19",
        "event_time": "07:58:12",
        "created_at": "2026-01-19T12:58:12Z"
    })
)]
pub struct AttendanceRecord {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub employee_position: String,
    pub event_type: EventKind,

    #[schema(value_type = String, format = "date")]
    pub event_date: NaiveDate,

    #[schema(value_type = String, example = "07:58:12")]
    pub event_time: NaiveTime,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Builds the record for `employee` clocking `kind` at the operational moment `at`.
    pub fn new(employee: &Employee, kind: EventKind, at: DateTime<FixedOffset>) -> Self {
        let local = at.naive_local();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id: employee.employee_id.clone(),
            employee_name: employee.name.clone(),
            employee_position: employee.position.clone(),
            event_type: kind,
            event_date: local.date(),
            // stored as HH:MM:SS
            event_time: local.time().with_nanosecond(0).unwrap_or(local.time()),
            created_at: at.with_timezone(&Utc),
        }
    }
}
