//! REST backend speaking the PostgREST dialect used by Supabase.
//!
//! Tables live under `{base_url}/rest/v1/{table}`; filters are query
//! parameters such as `company=eq.acme`. Writes ask for
//! `Prefer: return=representation` so the stored row comes back.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use vantage_core::{Collection, Company, Record};
use vantage_store::{Repository, StoreError};

const COMPANIES: &str = "companies";

/// Error payload returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Map a failed response onto a [`StoreError`].
///
/// Postgres codes: `42P01` undefined table, `23505` unique violation,
/// `23503` foreign key violation. `PGRST205` is PostgREST's own "table not in
/// schema cache".
pub fn classify_error(status: u16, body: &str, table: &str) -> StoreError {
    let parsed: ApiError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .unwrap_or_else(|| body.trim().to_string());
    match parsed.code.as_deref() {
        Some("42P01") | Some("PGRST205") => StoreError::TableMissing(table.to_string()),
        Some("23505") => StoreError::Duplicate(message),
        Some("23503") => StoreError::MissingReference(message),
        _ => StoreError::Remote { status, message },
    }
}

/// JSON body for an insert: the record without store-assigned fields, scoped
/// to `company`.
pub fn insert_body<R: Record>(record: &R, company: &str) -> Result<Value, StoreError> {
    let mut body = serde_json::to_value(record)?;
    if let Some(obj) = body.as_object_mut() {
        obj.remove("id");
        obj.remove("created_at");
        obj.insert("company".into(), Value::String(company.to_string()));
    }
    Ok(body)
}

/// JSON body for an update: identity and scoping are never rewritten.
pub fn update_body<R: Record>(record: &R) -> Result<Value, StoreError> {
    let mut body = serde_json::to_value(record)?;
    if let Some(obj) = body.as_object_mut() {
        obj.remove("id");
        obj.remove("created_at");
        obj.remove("company");
    }
    Ok(body)
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

/// HTTP client for a PostgREST endpoint.
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestStore {
    /// `base_url` is the project URL, e.g. `https://xyz.supabase.co`.
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn table_url(&self, table: &str, params: &[(&str, String)]) -> Result<Url, StoreError> {
        let base = format!("{}/rest/v1/{table}", self.base_url);
        Url::parse_with_params(&base, params)
            .map_err(|e| StoreError::Transport(format!("invalid url {base}: {e}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }
        req
    }

    /// Send and decode a JSON array response.
    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        table: &str,
    ) -> Result<Vec<T>, StoreError> {
        let resp = req.send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body, table));
        }
        let text = resp.text().await.map_err(transport)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn write_one<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        table: &str,
    ) -> Result<T, StoreError> {
        let req = req.header("Prefer", "return=representation");
        self.send::<T>(req, table)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Other(format!("{table}: write returned no row")))
    }
}

#[async_trait]
impl Repository for RestStore {
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
        let url = self.table_url(
            COMPANIES,
            &[("select", "*".into()), ("order", "name.asc".into())],
        )?;
        self.send(self.request(Method::GET, url), COMPANIES).await
    }

    async fn company(&self, id: &str) -> Result<Company, StoreError> {
        let url = self.table_url(COMPANIES, &[("select", "*".into()), ("id", eq(id))])?;
        self.send::<Company>(self.request(Method::GET, url), COMPANIES)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::UnknownCompany(id.to_string()))
    }

    async fn add_company(&self, company: Company) -> Result<Company, StoreError> {
        let url = self.table_url(COMPANIES, &[])?;
        let req = self.request(Method::POST, url).json(&company);
        let created: Company = self.write_one(req, COMPANIES).await?;
        info!(id = %created.id, "added company");
        Ok(created)
    }

    async fn get_all<R: Record>(&self, company: &str) -> Result<Vec<R>, StoreError> {
        let table = R::COLLECTION.table_name();
        let url = self.table_url(
            table,
            &[
                ("select", "*".into()),
                ("company", eq(company)),
                ("order", "created_at.desc".into()),
            ],
        )?;
        debug!(url = %url, "fetching");
        let records: Vec<R> = self.send(self.request(Method::GET, url), table).await?;
        debug!(table, count = records.len(), "fetched");
        Ok(records)
    }

    async fn create<R: Record>(&self, company: &str, record: R) -> Result<R, StoreError> {
        let table = R::COLLECTION.table_name();
        let url = self.table_url(table, &[])?;
        let body = insert_body(&record, company)?;
        let req = self.request(Method::POST, url).json(&body);
        self.write_one(req, table).await
    }

    async fn update<R: Record>(&self, company: &str, id: &str, record: R) -> Result<R, StoreError> {
        let table = R::COLLECTION.table_name();
        let url = self.table_url(table, &[("id", eq(id)), ("company", eq(company))])?;
        let body = update_body(&record)?;
        let req = self.request(Method::PATCH, url).json(&body);
        self.write_one(req, table).await.map_err(|e| match e {
            StoreError::Other(_) => StoreError::NotFound {
                collection: R::COLLECTION,
                id: id.to_string(),
            },
            other => other,
        })
    }

    async fn delete(&self, collection: Collection, company: &str, id: &str) -> Result<(), StoreError> {
        let table = collection.table_name();
        let url = self.table_url(table, &[("id", eq(id)), ("company", eq(company))])?;
        let req = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation");
        let deleted: Vec<Value> = self.send(req, table).await?;
        if deleted.is_empty() {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn clear(&self, collection: Collection, company: &str) -> Result<usize, StoreError> {
        let table = collection.table_name();
        let url = self.table_url(table, &[("company", eq(company))])?;
        let req = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation");
        let deleted: Vec<Value> = self.send(req, table).await?;
        info!(table, company, deleted = deleted.len(), "cleared collection");
        Ok(deleted.len())
    }
}
