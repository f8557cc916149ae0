//! DuckDB-backed record store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use duckdb::{Connection, params};
use tracing::{debug, info};
use uuid::Uuid;
use vantage_core::{Collection, Company, Record, RecordMeta};

use crate::{Repository, StoreError};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS companies (
        id          VARCHAR PRIMARY KEY,
        name        VARCHAR NOT NULL,
        industry    VARCHAR,
        description VARCHAR,
        website     VARCHAR
    );
    CREATE SEQUENCE IF NOT EXISTS record_seq;
    CREATE TABLE IF NOT EXISTS records (
        seq        BIGINT DEFAULT nextval('record_seq'),
        collection VARCHAR NOT NULL,
        id         VARCHAR NOT NULL,
        company    VARCHAR NOT NULL,
        created_at VARCHAR NOT NULL,
        body       VARCHAR NOT NULL,
        PRIMARY KEY (collection, id)
    );
";

/// DuckDB store holding companies and the six record collections.
///
/// Records live in one `records` table keyed by collection and id, with the
/// record body stored as JSON. `created_at` is an RFC 3339 string in UTC with
/// microsecond precision so it orders lexically.
///
/// Use [`open`](Self::open) for an ephemeral in-memory database and
/// [`open_persistent`](Self::open_persistent) for a file that survives restarts.
pub struct DuckStore {
    conn: Mutex<Connection>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Other(format!("create {}: {e}", parent.display())))?;
        }
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "opened duckdb store");
        Ok(store)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other("duckdb connection lock poisoned".into()))
    }

    // ── Companies ──

    pub fn companies(&self) -> Result<Vec<Company>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, industry, description, website FROM companies ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Company {
                id: row.get(0)?,
                name: row.get(1)?,
                industry: row.get(2)?,
                description: row.get(3)?,
                website: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn find_company(&self, id: &str) -> Result<Company, StoreError> {
        self.companies()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::UnknownCompany(id.to_string()))
    }

    pub fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        let conn = self.conn()?;
        if company_exists(&conn, &company.id)? {
            return Err(StoreError::Duplicate(format!("company {}", company.id)));
        }
        conn.execute(
            "INSERT INTO companies (id, name, industry, description, website) VALUES (?, ?, ?, ?, ?)",
            params![
                company.id,
                company.name,
                company.industry,
                company.description,
                company.website
            ],
        )?;
        info!(id = %company.id, name = %company.name, "added company");
        Ok(())
    }

    // ── Records ──

    /// Raw JSON bodies of a collection for one company, newest first.
    pub fn bodies(&self, collection: Collection, company: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT body FROM records WHERE collection = ? AND company = ?
             ORDER BY created_at DESC, seq DESC",
        )?;
        let rows = stmt.query_map(params![collection.table_name(), company], |row| row.get(0))?;
        let bodies = rows.collect::<Result<Vec<String>, _>>()?;
        debug!(collection = %collection, company, count = bodies.len(), "fetched records");
        Ok(bodies)
    }

    pub fn insert<R: Record>(&self, company: &str, mut record: R) -> Result<R, StoreError> {
        let conn = self.conn()?;
        if !company_exists(&conn, company)? {
            return Err(StoreError::MissingReference(format!("company {company}")));
        }
        let created_at = Utc::now();
        *record.meta_mut() = RecordMeta {
            id: Uuid::new_v4().to_string(),
            company: company.to_string(),
            created_at: Some(created_at),
        };
        let body = serde_json::to_string(&record)?;
        conn.execute(
            "INSERT INTO records (collection, id, company, created_at, body) VALUES (?, ?, ?, ?, ?)",
            params![
                R::COLLECTION.table_name(),
                record.id(),
                company,
                created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                body
            ],
        )?;
        Ok(record)
    }

    pub fn replace<R: Record>(&self, company: &str, id: &str, mut record: R) -> Result<R, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT body FROM records WHERE collection = ? AND company = ? AND id = ?",
        )?;
        let existing = stmt
            .query_map(params![R::COLLECTION.table_name(), company, id], |row| {
                row.get::<_, String>(0)
            })?
            .next()
            .transpose()?
            .ok_or_else(|| StoreError::NotFound {
                collection: R::COLLECTION,
                id: id.to_string(),
            })?;
        let stored: R = serde_json::from_str(&existing)?;
        *record.meta_mut() = stored.meta().clone();
        conn.execute(
            "UPDATE records SET body = ? WHERE collection = ? AND company = ? AND id = ?",
            params![
                serde_json::to_string(&record)?,
                R::COLLECTION.table_name(),
                company,
                id
            ],
        )?;
        Ok(record)
    }

    pub fn remove(&self, collection: Collection, company: &str, id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM records WHERE collection = ? AND company = ? AND id = ?",
            params![collection.table_name(), company, id],
        )?;
        if deleted == 0 {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn remove_all(&self, collection: Collection, company: &str) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM records WHERE collection = ? AND company = ?",
            params![collection.table_name(), company],
        )?;
        info!(collection = %collection, company, deleted, "cleared collection");
        Ok(deleted)
    }

    /// Number of stored records across all companies.
    pub fn record_count(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT count(*)::BIGINT FROM records", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}

fn company_exists(conn: &Connection, id: &str) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT count(*)::BIGINT FROM companies WHERE id = ?",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[async_trait]
impl Repository for DuckStore {
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        self.companies()
    }

    async fn company(&self, id: &str) -> Result<Company, StoreError> {
        self.find_company(id)
    }

    async fn add_company(&self, company: Company) -> Result<Company, StoreError> {
        self.insert_company(&company)?;
        Ok(company)
    }

    async fn get_all<R: Record>(&self, company: &str) -> Result<Vec<R>, StoreError> {
        self.bodies(R::COLLECTION, company)?
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StoreError::from))
            .collect()
    }

    async fn create<R: Record>(&self, company: &str, record: R) -> Result<R, StoreError> {
        self.insert(company, record)
    }

    async fn update<R: Record>(&self, company: &str, id: &str, record: R) -> Result<R, StoreError> {
        self.replace(company, id, record)
    }

    async fn delete(&self, collection: Collection, company: &str, id: &str) -> Result<(), StoreError> {
        self.remove(collection, company, id)
    }

    async fn clear(&self, collection: Collection, company: &str) -> Result<usize, StoreError> {
        self.remove_all(collection, company)
    }
}
