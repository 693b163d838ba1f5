//! SQLite 實作的 [`CustomerStore`]。
//!
//! 單一連線放在 `Arc<Mutex<Connection>>` 裡，所有查詢都在 `spawn_blocking`
//! 執行。寫入用 `BEGIN IMMEDIATE` 加 `INSERT ... ON CONFLICT`，同一車牌的並行
//! 送出會排隊，最後 commit 的那筆生效。

use crate::domain::model::{Customer, CustomerInfo, LicensePlate, Vehicle, VisitOutcome};
use crate::domain::ports::CustomerStore;
use crate::utils::error::{CarwashError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SCHEMA_SQL: &str = include_str!("schema.sql");

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, created_at, updated_at";
const VEHICLE_COLUMNS: &str =
    "id, year, make, model, license_plate, customer_id, created_at, updated_at, last_receipt_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub customers: i64,
    pub vehicles: i64,
}

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// 開啟或建立資料庫檔案，schema 不存在時自動建立
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        Self::initialize_connection(&conn)?;

        tracing::info!(
            "🗄️ Opened database at {} (journal_mode={})",
            path.display(),
            journal_mode
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_connection(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    fn initialize_connection(conn: &Connection) -> Result<()> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn row_counts(&self) -> Result<RowCounts> {
        self.with_conn(|conn| {
            let customers = conn.query_row("SELECT COUNT(*) FROM customer", [], |row| row.get(0))?;
            let vehicles = conn.query_row("SELECT COUNT(*) FROM vehicle", [], |row| row.get(0))?;
            Ok(RowCounts {
                customers,
                vehicles,
            })
        })
        .await
    }

    /// 在 blocking 執行緒上取得連線執行 `f`
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| CarwashError::internal("database connection lock poisoned"))?;
            f(&mut *guard)
        })
        .await?
    }
}

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn vehicle_from_row(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        id: row.get(0)?,
        year: row.get(1)?,
        make: row.get(2)?,
        model: row.get(3)?,
        license_plate: row.get(4)?,
        customer_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        last_receipt_at: row.get(8)?,
    })
}

fn upsert_visit(conn: &mut Connection, plate: &str, info: &CustomerInfo) -> Result<VisitOutcome> {
    // IMMEDIATE：交易一開始就拿寫鎖，查詢與寫入之間不會被插隊
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = Utc::now();

    let inserted = tx.execute(
        "INSERT INTO customer (name, phone, email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(email) DO NOTHING",
        params![info.name, info.phone, info.email, now],
    )?;
    let customer_id: i64 = tx.query_row(
        "SELECT id FROM customer WHERE email = ?1",
        params![info.email],
        |row| row.get(0),
    )?;

    let previous: Option<(i64, i64)> = tx
        .query_row(
            "SELECT id, customer_id FROM vehicle WHERE license_plate = ?1",
            params![plate],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    tx.execute(
        "INSERT INTO vehicle (year, make, model, license_plate, customer_id, created_at, updated_at, last_receipt_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, NULL)
         ON CONFLICT(license_plate) DO UPDATE SET
             year = excluded.year,
             make = excluded.make,
             model = excluded.model,
             customer_id = excluded.customer_id,
             updated_at = excluded.updated_at,
             last_receipt_at = NULL",
        params![info.year, info.make, info.model, plate, customer_id, now],
    )?;

    let vehicle_id = match previous {
        Some((id, _)) => id,
        None => tx.last_insert_rowid(),
    };

    tx.commit()?;

    Ok(VisitOutcome {
        customer_id,
        vehicle_id,
        customer_created: inserted > 0,
        vehicle_created: previous.is_none(),
        previous_owner: previous
            .map(|(_, owner)| owner)
            .filter(|owner| *owner != customer_id),
    })
}

#[async_trait]
impl CustomerStore for SqliteStore {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let email = email.trim().to_lowercase();
        self.with_conn(move |conn| {
            let customer = conn
                .query_row(
                    &format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE email = ?1"),
                    params![email],
                    customer_from_row,
                )
                .optional()?;
            Ok(customer)
        })
        .await
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>> {
        self.with_conn(move |conn| {
            let customer = conn
                .query_row(
                    &format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = ?1"),
                    params![id],
                    customer_from_row,
                )
                .optional()?;
            Ok(customer)
        })
        .await
    }

    async fn find_vehicle_by_plate(&self, plate: &LicensePlate) -> Result<Option<Vehicle>> {
        let plate = plate.as_str().to_string();
        self.with_conn(move |conn| {
            let vehicle = conn
                .query_row(
                    &format!("SELECT {VEHICLE_COLUMNS} FROM vehicle WHERE license_plate = ?1"),
                    params![plate],
                    vehicle_from_row,
                )
                .optional()?;
            Ok(vehicle)
        })
        .await
    }

    async fn vehicles_for_customer(&self, customer_id: i64) -> Result<Vec<Vehicle>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {VEHICLE_COLUMNS} FROM vehicle WHERE customer_id = ?1 ORDER BY license_plate"
            ))?;
            let vehicles = stmt
                .query_map(params![customer_id], vehicle_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(vehicles)
        })
        .await
    }

    async fn record_visit(
        &self,
        plate: &LicensePlate,
        info: &CustomerInfo,
    ) -> Result<VisitOutcome> {
        let plate = plate.as_str().to_string();
        let info = info.normalized();

        let outcome = self
            .with_conn(move |conn| upsert_visit(conn, &plate, &info))
            .await?;

        tracing::debug!(
            customer_id = outcome.customer_id,
            vehicle_id = outcome.vehicle_id,
            customer_created = outcome.customer_created,
            vehicle_created = outcome.vehicle_created,
            "Visit committed"
        );

        Ok(outcome)
    }

    async fn mark_receipted(&self, plate: &LicensePlate) -> Result<DateTime<Utc>> {
        let plate = plate.as_str().to_string();
        self.with_conn(move |conn| {
            let now = Utc::now();
            let updated = conn.execute(
                "UPDATE vehicle SET last_receipt_at = ?1 WHERE license_plate = ?2",
                params![now, plate],
            )?;
            if updated == 0 {
                return Err(CarwashError::VehicleNotFound { plate });
            }
            Ok(now)
        })
        .await
    }
}
