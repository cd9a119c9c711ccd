use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures_util::StreamExt;
use sqlx::MySqlPool;

use crate::model::attendance::{AttendanceRecord, EventKind};
use crate::model::employee::Employee;
use crate::storage::{LocalStore, Store};

const EMPLOYEE_COLUMNS: &str = "employee_id, name, dni, position, area, phone, created_at, active";
const RECORD_COLUMNS: &str = "id, employee_id, employee_name, employee_position, event_type, \
     event_date, event_time, created_at";

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    employee_id: String,
    employee_name: String,
    employee_position: String,
    event_type: String,
    event_date: NaiveDate,
    event_time: NaiveTime,
    created_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for AttendanceRecord {
    type Error = anyhow::Error;

    fn try_from(row: RecordRow) -> Result<Self> {
        let event_type = EventKind::from_str(&row.event_type).map_err(|e: strum::ParseError| {
            anyhow!("record {} has event type {}: {e}", row.id, row.event_type)
        })?;

        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            employee_position: row.employee_position,
            event_type,
            event_date: row.event_date,
            event_time: row.event_time,
            created_at: row.created_at,
        })
    }
}

fn into_records(rows: Vec<RecordRow>) -> Result<Vec<AttendanceRecord>> {
    rows.into_iter().map(AttendanceRecord::try_from).collect()
}

/// Remote store backed by the `employees` and `attendance_records` tables.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Streams both tables into `local` in batches. Returns (employees, records) added.
    pub async fn copy_into(&self, local: &LocalStore, batch_size: usize) -> Result<(usize, usize)> {
        let batch_size = batch_size.max(1);

        let employee_sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees");
        let mut stream = sqlx::query_as::<_, Employee>(&employee_sql).fetch(&self.pool);
        let mut batch = Vec::with_capacity(batch_size);
        let mut employees = 0usize;

        while let Some(row) = stream.next().await {
            batch.push(row.context("fetching employee row")?);
            if batch.len() >= batch_size {
                employees += local.merge_employees(std::mem::take(&mut batch)).await?;
            }
        }
        if !batch.is_empty() {
            employees += local.merge_employees(batch).await?;
        }

        let record_sql = format!("SELECT {RECORD_COLUMNS} FROM attendance_records");
        let mut stream = sqlx::query_as::<_, RecordRow>(&record_sql).fetch(&self.pool);
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = 0usize;

        while let Some(row) = stream.next().await {
            let row = row.context("fetching attendance row")?;
            batch.push(AttendanceRecord::try_from(row)?);
            if batch.len() >= batch_size {
                records += local.merge_records(std::mem::take(&mut batch)).await?;
            }
        }
        if !batch.is_empty() {
            records += local.merge_records(batch).await?;
        }

        Ok((employees, records))
    }

    /// Pushes the local cache up, skipping rows the remote already has.
    /// Returns (employees, records) inserted.
    pub async fn upload_from(&self, local: &LocalStore) -> Result<(u64, u64)> {
        let mut employees = 0;
        for employee in local.list_employees().await? {
            employees += self.write_employee(&employee, true).await?;
        }

        let mut records = 0;
        for record in local.list_records().await? {
            records += self.write_record(&record, true).await?;
        }

        Ok((employees, records))
    }

    async fn write_employee(&self, employee: &Employee, skip_existing: bool) -> Result<u64> {
        let sql = format!(
            "INSERT {}INTO employees ({EMPLOYEE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            if skip_existing { "IGNORE " } else { "" }
        );
        let result = sqlx::query(&sql)
            .bind(&employee.employee_id)
            .bind(&employee.name)
            .bind(&employee.dni)
            .bind(&employee.position)
            .bind(&employee.area)
            .bind(&employee.phone)
            .bind(employee.created_at)
            .bind(employee.active)
            .execute(&self.pool)
            .await
            .with_context(|| format!("inserting employee {}", employee.employee_id))?;
        Ok(result.rows_affected())
    }

    async fn write_record(&self, record: &AttendanceRecord, skip_existing: bool) -> Result<u64> {
        let sql = format!(
            "INSERT {}INTO attendance_records ({RECORD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            if skip_existing { "IGNORE " } else { "" }
        );
        let result = sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.employee_id)
            .bind(&record.employee_name)
            .bind(&record.employee_position)
            .bind(record.event_type.as_str())
            .bind(record.event_date)
            .bind(record.event_time)
            .bind(record.created_at)
            .execute(&self.pool)
            .await
            .with_context(|| format!("inserting attendance record {}", record.id))?;
        Ok(result.rows_affected())
    }
}

impl Store for MySqlStore {
    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY created_at DESC");
        sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("listing employees")
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?");
        sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("looking up employee {employee_id}"))
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<()> {
        self.write_employee(employee, false).await?;
        Ok(())
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("deleting employee {employee_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_records(&self) -> Result<Vec<AttendanceRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM attendance_records ORDER BY created_at");
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("listing attendance records")?;
        into_records(rows)
    }

    async fn records_on(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE event_date = ? ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("listing attendance records for {date}"))?;
        into_records(rows)
    }

    async fn append_record(&self, record: &AttendanceRecord) -> Result<()> {
        self.write_record(record, false).await?;
        Ok(())
    }
}
