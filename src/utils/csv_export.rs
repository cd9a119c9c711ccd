//! Spreadsheet exports.
//!
//! Semicolon separated with a UTF-8 byte order mark so Spanish-locale Excel
//! opens the files without an import dialog.

use std::collections::HashMap;

use chrono::{FixedOffset, NaiveDate, NaiveTime, Timelike};

use crate::engine::{local_day, schedule};
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;

const BOM: &str = "\u{feff}";
const SEPARATOR: &str = ";";
const NO_AREA: &str = "Sin área";
const NO_PHONE: &str = "Sin teléfono";

/// `DD/MM/YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `H:MM AM/PM`, 12-hour clock.
pub fn format_time(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    format!("{}:{:02} {}", hour, time.minute(), if pm { "PM" } else { "AM" })
}

/// Quote a field only when it would break the row.
fn field(value: &str) -> String {
    if value.contains(SEPARATOR) || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn row(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|f| field(f))
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    line.push('\n');
    line
}

pub fn attendance_filename(today: NaiveDate) -> String {
    format!("Asistencia_{}.csv", today.format("%Y-%m-%d"))
}

pub fn employees_filename(today: NaiveDate) -> String {
    format!("Empleados_{}.csv", today.format("%Y-%m-%d"))
}

/// One row per record, sorted by employee name then time. Area and phone come
/// from the current roster.
pub fn attendance_csv(records: &[AttendanceRecord], roster: &[Employee]) -> String {
    let by_id: HashMap<&str, &Employee> = roster
        .iter()
        .map(|e| (e.employee_id.as_str(), e))
        .collect();

    let mut sorted: Vec<&AttendanceRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.employee_name
            .to_lowercase()
            .cmp(&b.employee_name.to_lowercase())
            .then_with(|| a.event_time.cmp(&b.event_time))
    });

    let mut csv = String::from(BOM);
    csv.push_str(&row(&[
        "Nombre",
        "ID Empleado",
        "Cargo",
        "Área",
        "Teléfono",
        "Tipo de Evento",
        "Fecha",
        "Hora",
    ]));

    for record in sorted {
        let employee = by_id.get(record.employee_id.as_str());
        let area = employee.and_then(|e| e.area.as_deref()).unwrap_or(NO_AREA);
        let phone = employee.and_then(|e| e.phone.as_deref()).unwrap_or(NO_PHONE);

        csv.push_str(&row(&[
            &record.employee_name,
            &record.employee_id,
            &record.employee_position,
            area,
            phone,
            schedule::label(record.event_type),
            &format_date(record.event_date),
            &format_time(record.event_time),
        ]));
    }

    csv
}

/// Roster sorted by name with each employee's absence days.
pub fn employees_csv<F>(roster: &[Employee], offset: FixedOffset, absence_days: F) -> String
where
    F: Fn(&Employee) -> usize,
{
    let mut sorted: Vec<&Employee> = roster.iter().collect();
    sorted.sort_by_key(|e| e.name.to_lowercase());

    let mut csv = String::from(BOM);
    csv.push_str(&row(&[
        "Nombre",
        "ID Empleado",
        "Cargo",
        "Área",
        "Teléfono",
        "Días Faltados",
        "Fecha Registro",
    ]));

    for employee in sorted {
        let registered = local_day(employee.created_at, offset);

        csv.push_str(&row(&[
            &employee.name,
            &employee.employee_id,
            &employee.position,
            employee.area.as_deref().unwrap_or(NO_AREA),
            employee.phone.as_deref().unwrap_or(NO_PHONE),
            &absence_days(employee).to_string(),
            &format_date(registered),
        ]));
    }

    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::EventKind;
    use chrono::{TimeZone, Utc};

    fn employee(id: &str, name: &str, area: Option<&str>) -> Employee {
        Employee {
            employee_id: id.into(),
            name: name.into(),
            dni: None,
            position: "Operario".into(),
            area: area.map(Into::into),
            phone: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 6, 3, 0, 0).unwrap(),
            active: true,
        }
    }

    fn record(id: &str, name: &str, kind: EventKind, h: u32, m: u32) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("{id}-{h}-{m}"),
            employee_id: id.into(),
            employee_name: name.into(),
            employee_position: "Operario".into(),
            event_type: kind,
            event_date: NaiveDate::from_ymd_opt(2026, 1, 19).unwrap(),
            event_time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn time_is_twelve_hour() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(format_time(t(0, 5)), "12:05 AM");
        assert_eq!(format_time(t(8, 0)), "8:00 AM");
        assert_eq!(format_time(t(12, 30)), "12:30 PM");
        assert_eq!(format_time(t(17, 9)), "5:09 PM");
    }

    #[test]
    fn attendance_rows_sorted_by_name_then_time() {
        let roster = vec![employee("E2", "Zoila Ramos", Some("Caja"))];
        let records = vec![
            record("E2", "Zoila Ramos", EventKind::Entrada, 7, 50),
            record("E1", "Andrés Pari", EventKind::SalidaAlmuerzo, 12, 31),
            record("E1", "Andrés Pari", EventKind::Entrada, 8, 4),
        ];

        let csv = attendance_csv(&records, &roster);
        let lines: Vec<&str> = csv.lines().collect();

        assert!(lines[0].starts_with('\u{feff}'));
        assert_eq!(
            lines[0].trim_start_matches('\u{feff}'),
            "Nombre;ID Empleado;Cargo;Área;Teléfono;Tipo de Evento;Fecha;Hora"
        );
        assert_eq!(
            lines[1],
            "Andrés Pari;E1;Operario;Sin área;Sin teléfono;Entrada;19/01/2026;8:04 AM"
        );
        assert_eq!(
            lines[2],
            "Andrés Pari;E1;Operario;Sin área;Sin teléfono;Salida a Almuerzo;19/01/2026;12:31 PM"
        );
        assert_eq!(
            lines[3],
            "Zoila Ramos;E2;Operario;Caja;Sin teléfono;Entrada;19/01/2026;7:50 AM"
        );
    }

    #[test]
    fn employee_rows_carry_absences_and_local_registration_date() {
        let roster = vec![
            employee("E2", "zoila Ramos", None),
            employee("E1", "Andrés Pari", Some("Planta; Norte")),
        ];
        let lima = FixedOffset::west_opt(5 * 3600).unwrap();

        let csv = employees_csv(&roster, lima, |e| if e.employee_id == "E1" { 3 } else { 0 });
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "Andrés Pari;E1;Operario;\"Planta; Norte\";Sin teléfono;3;05/01/2026"
        );
        assert_eq!(lines[2], "zoila Ramos;E2;Operario;Sin área;Sin teléfono;0;05/01/2026");
    }

    #[test]
    fn filenames_carry_the_day() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
        assert_eq!(attendance_filename(day), "Asistencia_2026-01-19.csv");
        assert_eq!(employees_filename(day), "Empleados_2026-01-19.csv");
    }
}
