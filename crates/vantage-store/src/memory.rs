//! In-process store. Used by tests and as a scratch backend.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;
use vantage_core::{Collection, Company, Record, RecordMeta};

use crate::{Repository, StoreError};

struct Row {
    seq: u64,
    id: String,
    company: String,
    created_at: DateTime<Utc>,
    body: serde_json::Value,
}

#[derive(Default)]
struct Tables {
    companies: Vec<Company>,
    rows: HashMap<Collection, Vec<Row>>,
    next_seq: u64,
}

/// Record store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Other("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Other("memory store lock poisoned".into()))
    }
}

impl Tables {
    fn has_company(&self, id: &str) -> bool {
        self.companies.iter().any(|c| c.id == id)
    }

    fn find(&mut self, collection: Collection, company: &str, id: &str) -> Option<&mut Row> {
        self.rows
            .get_mut(&collection)?
            .iter_mut()
            .find(|r| r.company == company && r.id == id)
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        let mut companies = self.read()?.companies.clone();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    async fn company(&self, id: &str) -> Result<Company, StoreError> {
        self.read()?
            .companies
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| StoreError::UnknownCompany(id.to_string()))
    }

    async fn add_company(&self, company: Company) -> Result<Company, StoreError> {
        let mut tables = self.write()?;
        if tables.has_company(&company.id) {
            return Err(StoreError::Duplicate(format!("company {}", company.id)));
        }
        info!(id = %company.id, name = %company.name, "added company");
        tables.companies.push(company.clone());
        Ok(company)
    }

    async fn get_all<R: Record>(&self, company: &str) -> Result<Vec<R>, StoreError> {
        let tables = self.read()?;
        let mut rows: Vec<&Row> = tables
            .rows
            .get(&R::COLLECTION)
            .map(|rows| rows.iter().filter(|r| r.company == company).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| (b.created_at, b.seq).cmp(&(a.created_at, a.seq)));
        rows.into_iter()
            .map(|r| serde_json::from_value(r.body.clone()).map_err(StoreError::from))
            .collect()
    }

    async fn create<R: Record>(&self, company: &str, mut record: R) -> Result<R, StoreError> {
        let mut tables = self.write()?;
        if !tables.has_company(company) {
            return Err(StoreError::MissingReference(format!("company {company}")));
        }
        let created_at = Utc::now();
        *record.meta_mut() = RecordMeta {
            id: Uuid::new_v4().to_string(),
            company: company.to_string(),
            created_at: Some(created_at),
        };
        let body = serde_json::to_value(&record)?;
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.rows.entry(R::COLLECTION).or_default().push(Row {
            seq,
            id: record.id().to_string(),
            company: company.to_string(),
            created_at,
            body,
        });
        Ok(record)
    }

    async fn update<R: Record>(
        &self,
        company: &str,
        id: &str,
        mut record: R,
    ) -> Result<R, StoreError> {
        let mut tables = self.write()?;
        let row = tables
            .find(R::COLLECTION, company, id)
            .ok_or_else(|| StoreError::NotFound {
                collection: R::COLLECTION,
                id: id.to_string(),
            })?;
        *record.meta_mut() = RecordMeta {
            id: row.id.clone(),
            company: row.company.clone(),
            created_at: Some(row.created_at),
        };
        row.body = serde_json::to_value(&record)?;
        Ok(record)
    }

    async fn delete(
        &self,
        collection: Collection,
        company: &str,
        id: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let rows = tables.rows.entry(collection).or_default();
        let idx = rows
            .iter()
            .position(|r| r.company == company && r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        rows.remove(idx);
        Ok(())
    }

    async fn clear(&self, collection: Collection, company: &str) -> Result<usize, StoreError> {
        let mut tables = self.write()?;
        let rows = tables.rows.entry(collection).or_default();
        let before = rows.len();
        rows.retain(|r| r.company != company);
        Ok(before - rows.len())
    }
}
