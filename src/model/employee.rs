use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "EMP-001",
        "name": "Rosa Quispe",
        "dni": "45871236",
        "position": "Operaria",
        "area": "Producción",
        "phone": "987654321",
        "created_at": "2026-01-05T13:00:00Z",
        "active": true
    })
)]
pub struct Employee {
    /// User-assigned identifier, also the QR payload.
    #[schema(example = "EMP-001")]
    pub employee_id: String,

    #[schema(example = "Rosa Quispe")]
    pub name: String,

    /// National ID, unique across the roster when present.
    #[schema(example = "45871236", nullable = true)]
    pub dni: Option<String>,

    #[schema(example = "Operaria")]
    pub position: String,

    #[schema(example = "Producción", nullable = true)]
    pub area: Option<String>,

    #[schema(example = "987654321", nullable = true)]
    pub phone: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    pub active: bool,
}

/// Registration form. Optional fields left blank are stored as absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "Rosa Quispe")]
    pub name: String,
    #[schema(example = "Operaria")]
    pub position: String,
    #[schema(example = "45871236", nullable = true)]
    pub dni: Option<String>,
    #[schema(example = "Producción", nullable = true)]
    pub area: Option<String>,
    #[schema(example = "987654321", nullable = true)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum RegistrationError {
    #[display(fmt = "{} is required", _0)]
    MissingField(&'static str),

    #[display(fmt = "Employee id {} already exists", _0)]
    DuplicateEmployeeId(String),

    #[display(fmt = "DNI {} is already registered", _0)]
    DuplicateDni(String),
}

impl std::error::Error for RegistrationError {}

fn required(value: &str, field: &'static str) -> Result<String, RegistrationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RegistrationError::MissingField(field));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Employee {
    /// Builds an employee from a registration form. Required fields must be non-blank.
    pub fn from_form(form: NewEmployee, now: DateTime<Utc>) -> Result<Employee, RegistrationError> {
        Ok(Employee {
            employee_id: required(&form.employee_id, "employee_id")?,
            name: required(&form.name, "name")?,
            position: required(&form.position, "position")?,
            dni: optional(form.dni),
            area: optional(form.area),
            phone: optional(form.phone),
            created_at: now,
            active: true,
        })
    }

    /// Identifier and DNI must not already appear in `roster`.
    pub fn ensure_unique(&self, roster: &[Employee]) -> Result<(), RegistrationError> {
        if roster.iter().any(|e| e.employee_id == self.employee_id) {
            return Err(RegistrationError::DuplicateEmployeeId(self.employee_id.clone()));
        }

        if let Some(dni) = &self.dni {
            if roster.iter().any(|e| e.dni.as_deref() == Some(dni.as_str())) {
                return Err(RegistrationError::DuplicateDni(dni.clone()));
            }
        }
        Ok(())
    }

    /// Case-insensitive substring match over identifier, name and DNI.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        self.employee_id.to_lowercase().contains(&needle)
            || self.name.to_lowercase().contains(&needle)
            || self
                .dni
                .as_deref()
                .is_some_and(|dni| dni.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rosa() -> Employee {
        Employee {
            employee_id: "EMP-001".into(),
            name: "Rosa Quispe".into(),
            dni: Some("45871236".into()),
            position: "Operaria".into(),
            area: None,
            phone: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 13, 0, 0).unwrap(),
            active: true,
        }
    }

    fn form(id: &str, dni: Option<&str>) -> NewEmployee {
        NewEmployee {
            employee_id: id.into(),
            name: " Carlos Huamán ".into(),
            position: "Chofer".into(),
            dni: dni.map(Into::into),
            area: Some("  ".into()),
            phone: None,
        }
    }

    #[test]
    fn form_is_trimmed_and_blank_optionals_dropped() {
        let now = Utc.with_ymd_and_hms(2026, 1, 19, 14, 0, 0).unwrap();
        let emp = Employee::from_form(form(" EMP-002 ", Some("")), now).unwrap();

        assert_eq!(emp.employee_id, "EMP-002");
        assert_eq!(emp.name, "Carlos Huamán");
        assert_eq!(emp.dni, None);
        assert_eq!(emp.area, None);
        assert_eq!(emp.created_at, now);
        assert!(emp.active);
        assert_eq!(emp.ensure_unique(&[rosa()]), Ok(()));
    }

    #[test]
    fn duplicates_and_missing_fields_are_rejected() {
        let now = Utc::now();
        let roster = [rosa()];

        let same_id = Employee::from_form(form("EMP-001", None), now).unwrap();
        assert_eq!(
            same_id.ensure_unique(&roster),
            Err(RegistrationError::DuplicateEmployeeId("EMP-001".into()))
        );
        let same_dni = Employee::from_form(form("EMP-009", Some(" 45871236 ")), now).unwrap();
        assert_eq!(
            same_dni.ensure_unique(&roster),
            Err(RegistrationError::DuplicateDni("45871236".into()))
        );

        let mut no_position = form("EMP-009", None);
        no_position.position = "   ".into();
        assert_eq!(
            Employee::from_form(no_position, now),
            Err(RegistrationError::MissingField("position"))
        );
        assert_eq!(
            RegistrationError::MissingField("name").to_string(),
            "name is required"
        );
    }

    #[test]
    fn search_covers_id_name_and_dni() {
        let emp = rosa();
        assert!(emp.matches("emp-0"));
        assert!(emp.matches("QUISPE"));
        assert!(emp.matches("8712"));
        assert!(emp.matches("   "));
        assert!(!emp.matches("carlos"));
    }
}
