use async_trait::async_trait;
use vantage_core::{Collection, Company, Record};

use crate::StoreError;

/// Persistence collaborator for companies and their six record collections.
///
/// Every record operation is scoped to one company. Backends assign `id`,
/// `company` and `created_at` on create and ignore whatever the caller put
/// there.
#[async_trait]
pub trait Repository: Send + Sync {
    /// All companies, ordered by name.
    async fn list_companies(&self) -> Result<Vec<Company>, StoreError>;

    /// Look up one company. [`StoreError::UnknownCompany`] if absent.
    async fn company(&self, id: &str) -> Result<Company, StoreError>;

    async fn add_company(&self, company: Company) -> Result<Company, StoreError>;

    /// Every record of `R`'s collection belonging to `company`, newest first.
    async fn get_all<R: Record>(&self, company: &str) -> Result<Vec<R>, StoreError>;

    async fn create<R: Record>(&self, company: &str, record: R) -> Result<R, StoreError>;

    /// Replace the stored fields of an existing record, keeping its identity.
    async fn update<R: Record>(&self, company: &str, id: &str, record: R)
    -> Result<R, StoreError>;

    async fn delete(&self, collection: Collection, company: &str, id: &str)
    -> Result<(), StoreError>;

    /// Remove every record of `collection` for `company`; returns how many.
    async fn clear(&self, collection: Collection, company: &str) -> Result<usize, StoreError>;
}
