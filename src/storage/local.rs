use std::fs;
use std::path::{Path, PathBuf};

use actix_web::web;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::lock::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use crate::storage::Store;

const EMPLOYEES_FILE: &str = "attendance_employees.json";
const RECORDS_FILE: &str = "attendance_records.json";

#[derive(Default)]
struct Snapshot {
    employees: Vec<Employee>,
    records: Vec<AttendanceRecord>,
}

/// Local cache: an in-memory snapshot written through to JSON files.
///
/// Every change is written to disk on the blocking pool first and only then
/// becomes visible in memory, so a failed write leaves the cache untouched.
pub struct LocalStore {
    dir: Option<PathBuf>,
    state: Mutex<Snapshot>,
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn save<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_vec_pretty(items)?;
    fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

impl LocalStore {
    /// Opens (or creates) the cache directory and loads both files.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let employees = load(&dir.join(EMPLOYEES_FILE))?;
        let records = load(&dir.join(RECORDS_FILE))?;
        debug!(
            dir = %dir.display(),
            employees = employees.len(),
            records = records.len(),
            "Local store opened"
        );

        Ok(Self {
            dir: Some(dir),
            state: Mutex::new(Snapshot { employees, records }),
        })
    }

    /// Memory-only cache, nothing touches the disk.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            state: Mutex::new(Snapshot::default()),
        }
    }

    /// Writes `items` to `file` off the worker thread and hands them back on success.
    async fn persist<T>(&self, file: &str, items: Vec<T>) -> Result<Vec<T>>
    where
        T: Serialize + Send + 'static,
    {
        let Some(dir) = &self.dir else {
            return Ok(items);
        };

        let path = dir.join(file);
        web::block(move || save(&path, &items).map(|()| items)).await?
    }

    /// Adds employees whose identifier is not cached yet. Returns how many were added.
    pub async fn merge_employees(&self, batch: Vec<Employee>) -> Result<usize> {
        let mut state = self.state.lock().await;
        let mut employees = state.employees.clone();
        for employee in batch {
            if !employees.iter().any(|e| e.employee_id == employee.employee_id) {
                employees.push(employee);
            }
        }

        let added = employees.len() - state.employees.len();
        if added > 0 {
            state.employees = self.persist(EMPLOYEES_FILE, employees).await?;
        }
        Ok(added)
    }

    /// Adds records whose id is not cached yet. Returns how many were added.
    pub async fn merge_records(&self, batch: Vec<AttendanceRecord>) -> Result<usize> {
        let mut state = self.state.lock().await;
        let mut records = state.records.clone();
        for record in batch {
            if !records.iter().any(|r| r.id == record.id) {
                records.push(record);
            }
        }

        let added = records.len() - state.records.len();
        if added > 0 {
            state.records = self.persist(RECORDS_FILE, records).await?;
        }
        Ok(added)
    }
}

impl Store for LocalStore {
    async fn list_employees(&self) -> Result<Vec<Employee>> {
        Ok(self.state.lock().await.employees.clone())
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
        Ok(self
            .state
            .lock()
            .await
            .employees
            .iter()
            .find(|e| e.employee_id == employee_id)
            .cloned())
    }

    /// Fails with a `RegistrationError` when the identifier or DNI is taken.
    async fn insert_employee(&self, employee: &Employee) -> Result<()> {
        let mut state = self.state.lock().await;
        employee.ensure_unique(&state.employees)?;

        let mut employees = state.employees.clone();
        employees.push(employee.clone());
        state.employees = self.persist(EMPLOYEES_FILE, employees).await?;
        Ok(())
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.employees.iter().any(|e| e.employee_id == employee_id) {
            return Ok(false);
        }

        let employees = state
            .employees
            .iter()
            .filter(|e| e.employee_id != employee_id)
            .cloned()
            .collect();
        state.employees = self.persist(EMPLOYEES_FILE, employees).await?;
        Ok(true)
    }

    async fn list_records(&self) -> Result<Vec<AttendanceRecord>> {
        Ok(self.state.lock().await.records.clone())
    }

    async fn records_on(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .records
            .iter()
            .filter(|r| r.event_date == date)
            .cloned()
            .collect())
    }

    async fn append_record(&self, record: &AttendanceRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut records = state.records.clone();
        records.push(record.clone());
        state.records = self.persist(RECORDS_FILE, records).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::EventKind;
    use crate::model::employee::RegistrationError;
    use chrono::{NaiveTime, Utc};

    fn employee(id: &str) -> Employee {
        Employee {
            employee_id: id.into(),
            name: format!("Empleado {id}"),
            dni: None,
            position: "Operario".into(),
            area: Some("Planta".into()),
            phone: None,
            created_at: Utc::now(),
            active: true,
        }
    }

    fn record(id: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: id.into(),
            employee_id: "E1".into(),
            employee_name: "Empleado E1".into(),
            employee_position: "Operario".into(),
            event_type: EventKind::RegresoAlmuerzo,
            event_date: NaiveDate::from_ymd_opt(2026, 1, 19).unwrap(),
            event_time: NaiveTime::from_hms_opt(13, 45, 2).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "asistencia-{name}-{}",
            uuid::Uuid::new_v4()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[actix_web::test]
    async fn snapshot_survives_reopen() {
        let dir = scratch_dir("reopen");
        {
            let store = LocalStore::open(&dir).unwrap();
            store.insert_employee(&employee("E1")).await.unwrap();
            store.append_record(&record("r1")).await.unwrap();
        }

        let reopened = LocalStore::open(&dir).unwrap();
        let employees = reopened.list_employees().await.unwrap();
        let records = reopened.list_records().await.unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].area.as_deref(), Some("Planta"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "r1");
        assert_eq!(records[0].event_type, EventKind::RegresoAlmuerzo);
        assert_eq!(records[0].event_time, NaiveTime::from_hms_opt(13, 45, 2).unwrap());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[actix_web::test]
    async fn duplicate_id_or_dni_is_rejected() {
        let store = LocalStore::in_memory();
        let mut first = employee("E1");
        first.dni = Some("12345678".into());
        store.insert_employee(&first).await.unwrap();

        let err = store.insert_employee(&employee("E1")).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<RegistrationError>(),
            Some(&RegistrationError::DuplicateEmployeeId("E1".into()))
        );

        let mut same_dni = employee("E2");
        same_dni.dni = Some("12345678".into());
        let err = store.insert_employee(&same_dni).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<RegistrationError>(),
            Some(&RegistrationError::DuplicateDni("12345678".into()))
        );
        assert_eq!(store.list_employees().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn concurrent_inserts_with_same_dni_admit_one() {
        let dir = scratch_dir("same-dni");
        let store = LocalStore::open(&dir).unwrap();

        let mut a = employee("EMP-A");
        a.dni = Some("12345678".into());
        let mut b = employee("EMP-B");
        b.dni = Some("12345678".into());

        let (first, second) =
            futures::future::join(store.insert_employee(&a), store.insert_employee(&b)).await;
        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);

        let reopened = LocalStore::open(&dir).unwrap();
        assert_eq!(reopened.list_employees().await.unwrap().len(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[actix_web::test]
    async fn failed_write_leaves_cache_untouched() {
        let dir = scratch_dir("failed-write");
        let store = LocalStore::open(&dir).unwrap();

        // a non-empty directory in place of the log makes the rename fail
        let blocker = dir.join(RECORDS_FILE);
        fs::create_dir_all(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        assert!(store.append_record(&record("r1")).await.is_err());
        assert!(store.list_records().await.unwrap().is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[actix_web::test]
    async fn merge_only_adds_missing_keys() {
        let store = LocalStore::in_memory();
        store.insert_employee(&employee("E1")).await.unwrap();
        store.append_record(&record("r1")).await.unwrap();

        let added = store
            .merge_employees(vec![employee("E1"), employee("E2")])
            .await
            .unwrap();
        assert_eq!(added, 1);
        let added = store
            .merge_records(vec![record("r1"), record("r2")])
            .await
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.list_records().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn merge_into_existing_files_persists() {
        let dir = scratch_dir("merge");
        {
            let store = LocalStore::open(&dir).unwrap();
            store.append_record(&record("r1")).await.unwrap();
        }

        let store = LocalStore::open(&dir).unwrap();
        let added = store
            .merge_records(vec![record("r1"), record("r2")])
            .await
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.merge_records(vec![record("r2")]).await.unwrap(), 0);

        let reopened = LocalStore::open(&dir).unwrap();
        let ids: Vec<String> = reopened
            .list_records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["r1", "r2"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[actix_web::test]
    async fn empty_file_loads_as_empty_list() {
        let dir = scratch_dir("empty");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(EMPLOYEES_FILE), "").unwrap();

        let store = LocalStore::open(&dir).unwrap();
        assert!(store.list_employees().await.unwrap().is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }
}
