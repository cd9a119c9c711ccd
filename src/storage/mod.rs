//! Roster and attendance log persistence.
//!
//! The remote MySQL store is authoritative when reachable. The local JSON
//! cache is written first on every change and answers reads whenever the
//! remote store is missing or failing. `Storage::sync_with_remote` pushes
//! rows written during an outage back up.

pub mod local;
pub mod mysql;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{Employee, NewEmployee};

pub use local::LocalStore;
pub use mysql::MySqlStore;

pub trait Store {
    async fn list_employees(&self) -> Result<Vec<Employee>>;
    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>>;
    async fn insert_employee(&self, employee: &Employee) -> Result<()>;
    /// Returns false when no employee had that identifier.
    async fn delete_employee(&self, employee_id: &str) -> Result<bool>;
    async fn list_records(&self) -> Result<Vec<AttendanceRecord>>;
    async fn records_on(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>>;
    async fn append_record(&self, record: &AttendanceRecord) -> Result<()>;
}

macro_rules! read_with_fallback {
    ($self:ident, $method:ident ( $($arg:expr),* )) => {{
        if let Some(remote) = &$self.remote {
            match remote.$method($($arg),*).await {
                Ok(value) => return Ok(value),
                Err(e) => warn!(
                    error = %e,
                    op = stringify!($method),
                    "Remote store failed, reading local cache"
                ),
            }
        }
        $self.local.$method($($arg),*).await
    }};
}

pub struct Storage {
    remote: Option<MySqlStore>,
    local: LocalStore,
}

impl Storage {
    pub fn new(remote: Option<MySqlStore>, local: LocalStore) -> Self {
        Self { remote, local }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn employees(&self) -> Result<Vec<Employee>> {
        read_with_fallback!(self, list_employees())
    }

    pub async fn records(&self) -> Result<Vec<AttendanceRecord>> {
        read_with_fallback!(self, list_records())
    }

    pub async fn records_on(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        read_with_fallback!(self, records_on(date))
    }

    /// Remote first; a remote miss still consults the local cache.
    pub async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
        if let Some(remote) = &self.remote {
            match remote.find_employee(employee_id).await {
                Ok(Some(employee)) => return Ok(Some(employee)),
                Ok(None) => {}
                Err(e) => warn!(error = %e, employee_id, "Remote employee lookup failed"),
            }
        }
        self.local.find_employee(employee_id).await
    }

    /// Validates and stores a new employee.
    ///
    /// Uniqueness is checked against the remote roster when it answers and
    /// always against the local cache under its lock. Rejections surface as a
    /// `RegistrationError` inside the returned error.
    pub async fn register_employee(&self, form: NewEmployee, now: DateTime<Utc>) -> Result<Employee> {
        let employee = Employee::from_form(form, now)?;

        if let Some(remote) = &self.remote {
            match remote.list_employees().await {
                Ok(roster) => employee.ensure_unique(&roster)?,
                Err(e) => warn!(error = %e, "Remote roster unavailable, checking local cache only"),
            }
        }

        self.local.insert_employee(&employee).await?;

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.insert_employee(&employee).await {
                error!(
                    error = %e,
                    employee_id = %employee.employee_id,
                    "Failed to save employee remotely, kept in local cache"
                );
            }
        }
        Ok(employee)
    }

    pub async fn delete_employee(&self, employee_id: &str) -> Result<bool> {
        let mut deleted = self.local.delete_employee(employee_id).await?;

        if let Some(remote) = &self.remote {
            match remote.delete_employee(employee_id).await {
                Ok(found) => deleted |= found,
                Err(e) => error!(error = %e, employee_id, "Failed to delete employee remotely"),
            }
        }
        Ok(deleted)
    }

    pub async fn append_record(&self, record: &AttendanceRecord) -> Result<()> {
        self.local.append_record(record).await?;

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.append_record(record).await {
                error!(
                    error = %e,
                    employee_id = %record.employee_id,
                    record_id = %record.id,
                    "Failed to save attendance remotely, kept in local cache"
                );
            }
        }
        Ok(())
    }

    /// Push local-only rows up, then pull missing remote rows into the local
    /// cache. Existing keys are skipped on both sides.
    pub async fn sync_with_remote(&self, batch_size: usize) -> Result<()> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };

        let (employees_up, records_up) = remote.upload_from(&self.local).await?;
        let (employees_down, records_down) = remote.copy_into(&self.local, batch_size).await?;
        info!(
            employees_up,
            records_up,
            employees_down,
            records_down,
            "Local cache synced with remote store"
        );
        Ok(())
    }
}
