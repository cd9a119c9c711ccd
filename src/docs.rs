use crate::api::attendance::{RecordAttendanceResponse, ScanRequest, ScheduleSlotResponse};
use crate::api::dashboard::DashboardResponse;
use crate::api::employee::{EmployeeListItem, EmployeeListResponse, EmployeeProfile, EmployeeQuery};
use crate::model::attendance::{AttendanceRecord, EventKind};
use crate::model::employee::{Employee, NewEmployee};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Kiosk API",
        version = "0.1.0",
        description = r#"
## QR Attendance Tracker

Employees are registered with an identifier that is printed as a QR code.
Scanning the code at the kiosk records the event of the day that matches the
current time window.

### Schedule
| Event | Scheduled | Window |
|---|---|---|
| Entrada | 08:00 | 06:00 - 11:00 |
| Salida a Almuerzo | 12:30 | 11:01 - 13:30 |
| Regreso de Almuerzo | 14:00 | 13:31 - 16:00 |
| Salida Final | 17:30 | 16:01 - 19:00 |

Scans outside every window are recorded as **Entrada**.

### Metrics
- **Tardanza**: an entrada after 08:00.
- **Día faltado**: a weekday since registration without an entrada. The current day is never counted.

### Exports
Semicolon separated CSV with a UTF-8 BOM, ready for Excel.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::record_attendance,
        crate::api::attendance::today_attendance,
        crate::api::attendance::get_schedule,

        crate::api::dashboard::get_dashboard,

        crate::api::export::export_attendance,
        crate::api::export::export_employees
    ),
    components(
        schemas(
            Employee,
            NewEmployee,
            EmployeeQuery,
            EmployeeListItem,
            EmployeeListResponse,
            EmployeeProfile,
            AttendanceRecord,
            EventKind,
            ScanRequest,
            RecordAttendanceResponse,
            ScheduleSlotResponse,
            DashboardResponse
        )
    ),
    tags(
        (name = "Employee", description = "Roster management APIs"),
        (name = "Attendance", description = "Kiosk scan and daily log APIs"),
        (name = "Dashboard", description = "Daily summary"),
        (name = "Export", description = "Spreadsheet exports"),
    )
)]
pub struct ApiDoc;
