//! Backend selection: a REST endpoint when one is configured, otherwise a
//! local DuckDB file.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use tracing::info;
use vantage_core::{Collection, Company, Record};
use vantage_remote::RestStore;
use vantage_store::{DuckStore, Repository, StoreError};

pub enum Backend {
    Duck(DuckStore),
    Rest(RestStore),
}

impl Backend {
    pub fn open(rest_url: Option<&str>, api_key: Option<&str>, db: &Path) -> anyhow::Result<Self> {
        match rest_url {
            Some(url) => {
                info!(url, "using REST backend");
                Ok(Backend::Rest(RestStore::new(
                    url.to_string(),
                    api_key.map(str::to_string),
                )))
            }
            None => {
                let store = DuckStore::open_persistent(db)
                    .with_context(|| format!("opening {}", db.display()))?;
                Ok(Backend::Duck(store))
            }
        }
    }
}

macro_rules! delegate {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Backend::Duck($store) => $call,
            Backend::Rest($store) => $call,
        }
    };
}

#[async_trait]
impl Repository for Backend {
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        delegate!(self, s => s.list_companies().await)
    }

    async fn company(&self, id: &str) -> Result<Company, StoreError> {
        delegate!(self, s => s.company(id).await)
    }

    async fn add_company(&self, company: Company) -> Result<Company, StoreError> {
        delegate!(self, s => s.add_company(company).await)
    }

    async fn get_all<R: Record>(&self, company: &str) -> Result<Vec<R>, StoreError> {
        delegate!(self, s => s.get_all(company).await)
    }

    async fn create<R: Record>(&self, company: &str, record: R) -> Result<R, StoreError> {
        delegate!(self, s => s.create(company, record).await)
    }

    async fn update<R: Record>(&self, company: &str, id: &str, record: R) -> Result<R, StoreError> {
        delegate!(self, s => s.update(company, id, record).await)
    }

    async fn delete(&self, collection: Collection, company: &str, id: &str) -> Result<(), StoreError> {
        delegate!(self, s => s.delete(collection, company, id).await)
    }

    async fn clear(&self, collection: Collection, company: &str) -> Result<usize, StoreError> {
        delegate!(self, s => s.clear(collection, company).await)
    }
}
