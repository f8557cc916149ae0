//! One company's working set: the six collections, their fetch states, and
//! the create/delete flows that keep them current.

use tracing::{info, warn};
use vantage_core::columns;
use vantage_core::{
    Collection, Collections, ComplianceRecord, Dashboard, EquityGrant, FundingRound, LoadState,
    Notice, Readiness, Record, References, ShareClass, ShareTransaction, Stakeholder, TableView,
};

use crate::{Repository, StoreError};

/// Shown instead of the dashboard when any collection failed to load.
pub const DASHBOARD_ERROR: &str =
    "Error loading dashboard data. Please make sure the database is properly set up.";

/// Fetch states of the six collections.
#[derive(Debug, Default)]
pub struct States {
    stakeholders: LoadState<Vec<Stakeholder>>,
    share_classes: LoadState<Vec<ShareClass>>,
    transactions: LoadState<Vec<ShareTransaction>>,
    funding_rounds: LoadState<Vec<FundingRound>>,
    equity_grants: LoadState<Vec<EquityGrant>>,
    compliance_records: LoadState<Vec<ComplianceRecord>>,
}

impl States {
    fn readiness(&self) -> [Readiness; 6] {
        [
            self.stakeholders.readiness(),
            self.share_classes.readiness(),
            self.transactions.readiness(),
            self.funding_rounds.readiness(),
            self.equity_grants.readiness(),
            self.compliance_records.readiness(),
        ]
    }
}

/// A record type the workspace tracks a fetch state for.
pub trait Tracked: Record {
    fn slot(states: &States) -> &LoadState<Vec<Self>>;
    fn slot_mut(states: &mut States) -> &mut LoadState<Vec<Self>>;
}

macro_rules! tracked {
    ($($ty:ty => $field:ident),+ $(,)?) => {
        $(
            impl Tracked for $ty {
                fn slot(states: &States) -> &LoadState<Vec<Self>> {
                    &states.$field
                }
                fn slot_mut(states: &mut States) -> &mut LoadState<Vec<Self>> {
                    &mut states.$field
                }
            }
        )+
    };
}

tracked! {
    Stakeholder => stakeholders,
    ShareClass => share_classes,
    ShareTransaction => transactions,
    FundingRound => funding_rounds,
    EquityGrant => equity_grants,
    ComplianceRecord => compliance_records,
}

/// What the dashboard screen should show.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    Loading,
    Failed(String),
    Ready(Box<Dashboard>),
}

/// A delete the user asked for but has not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    collection: Collection,
    id: String,
}

impl PendingDelete {
    pub const TITLE: &'static str = "Confirm Deletion";
    pub const MESSAGE: &'static str =
        "Are you sure you want to delete this item? This action cannot be undone.";

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn confirm(self) -> ConfirmedDelete {
        ConfirmedDelete(self)
    }

    /// Abandon the request. Nothing is sent to the store.
    pub fn cancel(self) {}
}

/// Proof that the user confirmed a delete; only [`PendingDelete::confirm`]
/// produces one.
#[derive(Debug)]
pub struct ConfirmedDelete(PendingDelete);

/// Fetches and holds one company's collections.
pub struct Workspace<S> {
    store: S,
    company: String,
    states: States,
}

impl<S: Repository> Workspace<S> {
    /// Nothing is fetched until [`refresh_all`](Self::refresh_all).
    pub fn new(store: S, company: impl Into<String>) -> Self {
        Self {
            store,
            company: company.into(),
            states: States::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn state<R: Tracked>(&self) -> &LoadState<Vec<R>> {
        R::slot(&self.states)
    }

    /// Loaded records of `R`, empty unless the last fetch succeeded.
    pub fn records<R: Tracked>(&self) -> &[R] {
        R::slot(&self.states)
            .value()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ── Fetching ──

    /// Re-fetch one collection, replacing its state when the fetch resolves.
    pub async fn refresh<R: Tracked>(&mut self) -> Readiness {
        *R::slot_mut(&mut self.states) = LoadState::Loading;
        let result = self.store.get_all::<R>(&self.company).await;
        self.settle(result)
    }

    fn settle<R: Tracked>(&mut self, result: Result<Vec<R>, StoreError>) -> Readiness {
        match &result {
            Ok(records) => info!(
                collection = %R::COLLECTION,
                company = %self.company,
                count = records.len(),
                "fetched"
            ),
            Err(e) => warn!(
                collection = %R::COLLECTION,
                company = %self.company,
                error = %e,
                "fetch failed"
            ),
        }
        let state = LoadState::from_result(result);
        let readiness = state.readiness();
        *R::slot_mut(&mut self.states) = state;
        readiness
    }

    pub async fn refresh_collection(&mut self, collection: Collection) -> Readiness {
        match collection {
            Collection::Stakeholders => self.refresh::<Stakeholder>().await,
            Collection::ShareClasses => self.refresh::<ShareClass>().await,
            Collection::Transactions => self.refresh::<ShareTransaction>().await,
            Collection::FundingRounds => self.refresh::<FundingRound>().await,
            Collection::EquityGrants => self.refresh::<EquityGrant>().await,
            Collection::ComplianceRecords => self.refresh::<ComplianceRecord>().await,
        }
    }

    /// Fetch all six collections concurrently.
    pub async fn refresh_all(&mut self) -> Readiness {
        self.states = States {
            stakeholders: LoadState::Loading,
            share_classes: LoadState::Loading,
            transactions: LoadState::Loading,
            funding_rounds: LoadState::Loading,
            equity_grants: LoadState::Loading,
            compliance_records: LoadState::Loading,
        };

        let store = &self.store;
        let company = self.company.as_str();
        let (stakeholders, share_classes, transactions, funding_rounds, equity_grants, compliance) = futures::join!(
            store.get_all::<Stakeholder>(company),
            store.get_all::<ShareClass>(company),
            store.get_all::<ShareTransaction>(company),
            store.get_all::<FundingRound>(company),
            store.get_all::<EquityGrant>(company),
            store.get_all::<ComplianceRecord>(company),
        );

        Readiness::combine([
            self.settle(stakeholders),
            self.settle(share_classes),
            self.settle(transactions),
            self.settle(funding_rounds),
            self.settle(equity_grants),
            self.settle(compliance),
        ])
    }

    /// Point the workspace at another company and fetch everything again.
    pub async fn rescope(&mut self, company: impl Into<String>) -> Readiness {
        self.company = company.into();
        self.states = States::default();
        info!(company = %self.company, "rescoped workspace");
        self.refresh_all().await
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::combine(self.states.readiness())
    }

    // ── Views ──

    pub fn dashboard(&self) -> DashboardState {
        match self.readiness() {
            Readiness::Loading => DashboardState::Loading,
            Readiness::Failed => DashboardState::Failed(DASHBOARD_ERROR.to_string()),
            Readiness::Ready => DashboardState::Ready(Box::new(Dashboard::compute(
                &self.company,
                Collections {
                    stakeholders: self.records(),
                    share_classes: self.records(),
                    transactions: self.records(),
                    funding_rounds: self.records(),
                    equity_grants: self.records(),
                    compliance_records: self.records(),
                },
            ))),
        }
    }

    /// Names for resolving stakeholder and share class references.
    pub fn references(&self) -> References {
        References::new()
            .with_stakeholders(self.records())
            .with_share_classes(self.records())
    }

    pub fn table_view(&self, collection: Collection) -> TableView {
        TableView::new(columns::for_collection(collection)).with_references(self.references())
    }

    // ── Mutations ──

    /// Store a new record, then re-fetch its collection.
    pub async fn create<R: Tracked>(&mut self, record: R) -> Notice {
        match self.store.create(&self.company, record).await {
            Ok(created) => {
                info!(collection = %R::COLLECTION, id = %created.id(), "created");
                self.refresh::<R>().await;
                Notice::added(R::COLLECTION)
            }
            Err(e) => {
                warn!(collection = %R::COLLECTION, error = %e, "create failed");
                Notice::add_failed(R::COLLECTION)
            }
        }
    }

    pub fn request_delete(&self, collection: Collection, id: impl Into<String>) -> PendingDelete {
        PendingDelete {
            collection,
            id: id.into(),
        }
    }

    /// Fire a confirmed delete once, then re-fetch the collection whether or
    /// not the delete succeeded.
    pub async fn delete(&mut self, confirmed: ConfirmedDelete) -> Notice {
        let PendingDelete { collection, id } = confirmed.0;
        let result = self.store.delete(collection, &self.company, &id).await;
        self.refresh_collection(collection).await;
        match result {
            Ok(()) => {
                info!(collection = %collection, id = %id, "deleted");
                Notice::deleted()
            }
            Err(e) => {
                warn!(collection = %collection, id = %id, error = %e, "delete failed");
                Notice::delete_failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use vantage_core::{Company, GrantKind, GrantStatus, StakeholderKind};

    use super::*;
    use crate::MemoryStore;

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .add_company(Company {
                id: "acme".into(),
                name: "Acme".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .add_company(Company {
                id: "globex".into(),
                name: "Globex".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        store
    }

    fn holder(name: &str, kind: StakeholderKind, shares: u64) -> Stakeholder {
        Stakeholder {
            name: name.into(),
            kind,
            shares,
            join_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn dashboard_loading_until_fetched() {
        let ws = Workspace::new(seeded_store().await, "acme");
        assert_eq!(ws.dashboard(), DashboardState::Loading);
    }

    #[tokio::test]
    async fn refresh_all_computes_dashboard() {
        let store = seeded_store().await;
        store
            .create("acme", holder("John", StakeholderKind::Founder, 100_000))
            .await
            .unwrap();
        store
            .create("acme", holder("Sarah", StakeholderKind::Investor, 50_000))
            .await
            .unwrap();
        store
            .create("globex", holder("Other", StakeholderKind::Investor, 9))
            .await
            .unwrap();

        let mut ws = Workspace::new(store, "acme");
        assert_eq!(ws.refresh_all().await, Readiness::Ready);
        let DashboardState::Ready(dash) = ws.dashboard() else {
            panic!("dashboard should be ready");
        };
        assert_eq!(dash.totals.stakeholders, 2);
        assert_eq!(dash.totals.shares, 150_000);
        // Newest first from the store: Sarah then John.
        assert_eq!(dash.distribution[0].kind, StakeholderKind::Investor);
    }

    #[tokio::test]
    async fn create_refetches_and_reports() {
        let mut ws = Workspace::new(seeded_store().await, "acme");
        ws.refresh_all().await;

        let notice = ws
            .create(EquityGrant {
                recipient_id: "s1".into(),
                kind: GrantKind::Rsu,
                quantity: 100,
                status: GrantStatus::Active,
                ..Default::default()
            })
            .await;
        assert_eq!(notice.message, "Equity grant added successfully");
        assert_eq!(ws.records::<EquityGrant>().len(), 1);
        assert_eq!(ws.records::<EquityGrant>()[0].company(), "acme");
    }

    #[tokio::test]
    async fn create_failure_becomes_notice() {
        let mut ws = Workspace::new(MemoryStore::new(), "missing");
        let notice = ws.create(ShareClass::default()).await;
        assert!(notice.is_error());
        assert_eq!(notice.message, "Error adding share class");
    }

    #[tokio::test]
    async fn confirmed_delete_removes_and_refetches() {
        let store = seeded_store().await;
        let a = store
            .create("acme", holder("A", StakeholderKind::Employee, 1))
            .await
            .unwrap();
        store
            .create("acme", holder("B", StakeholderKind::Employee, 1))
            .await
            .unwrap();

        let mut ws = Workspace::new(store, "acme");
        ws.refresh_all().await;
        assert_eq!(ws.records::<Stakeholder>().len(), 2);

        let pending = ws.request_delete(Collection::Stakeholders, a.id());
        assert_eq!(pending.id(), a.id());
        let notice = ws.delete(pending.confirm()).await;
        assert_eq!(notice, Notice::deleted());
        let names: Vec<&str> = ws
            .records::<Stakeholder>()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["B"]);
    }

    #[tokio::test]
    async fn failed_delete_still_refetches() {
        let store = seeded_store().await;
        store
            .create("acme", holder("A", StakeholderKind::Employee, 1))
            .await
            .unwrap();
        let mut ws = Workspace::new(store, "acme");
        ws.refresh_all().await;

        let pending = ws.request_delete(Collection::Stakeholders, "no-such-id");
        let notice = ws.delete(pending.confirm()).await;
        assert_eq!(notice, Notice::delete_failed());
        assert_eq!(ws.state::<Stakeholder>().readiness(), Readiness::Ready);
        assert_eq!(ws.records::<Stakeholder>().len(), 1);
    }

    #[tokio::test]
    async fn rescope_switches_company() {
        let store = seeded_store().await;
        store
            .create("globex", holder("G", StakeholderKind::Founder, 5))
            .await
            .unwrap();
        let mut ws = Workspace::new(store, "acme");
        ws.refresh_all().await;
        assert!(ws.records::<Stakeholder>().is_empty());

        ws.rescope("globex").await;
        assert_eq!(ws.company(), "globex");
        assert_eq!(ws.records::<Stakeholder>().len(), 1);
    }

    #[tokio::test]
    async fn references_resolve_names() {
        let store = seeded_store().await;
        let class = store
            .create(
                "acme",
                ShareClass {
                    name: "Common A".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let mut h = holder("John", StakeholderKind::Founder, 10);
        h.share_class = Some(class.id().to_string());
        store.create("acme", h).await.unwrap();

        let mut ws = Workspace::new(store, "acme");
        ws.refresh_all().await;
        let view = ws.table_view(Collection::Stakeholders);
        let rows = view.rows(ws.records::<Stakeholder>(), None);
        assert_eq!(rows[0][4].text, "Common A");
    }

    /// Fails every share-class fetch, serves everything else from memory.
    struct FlakyClasses {
        inner: MemoryStore,
        failed: AtomicBool,
    }

    #[async_trait]
    impl Repository for FlakyClasses {
        async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
            self.inner.list_companies().await
        }
        async fn company(&self, id: &str) -> Result<Company, StoreError> {
            self.inner.company(id).await
        }
        async fn add_company(&self, company: Company) -> Result<Company, StoreError> {
            self.inner.add_company(company).await
        }
        async fn get_all<R: Record>(&self, company: &str) -> Result<Vec<R>, StoreError> {
            if R::COLLECTION == Collection::ShareClasses {
                self.failed.store(true, Ordering::SeqCst);
                return Err(StoreError::TableMissing("share_classes".into()));
            }
            self.inner.get_all(company).await
        }
        async fn create<R: Record>(&self, company: &str, record: R) -> Result<R, StoreError> {
            self.inner.create(company, record).await
        }
        async fn update<R: Record>(
            &self,
            company: &str,
            id: &str,
            record: R,
        ) -> Result<R, StoreError> {
            self.inner.update(company, id, record).await
        }
        async fn delete(
            &self,
            collection: Collection,
            company: &str,
            id: &str,
        ) -> Result<(), StoreError> {
            self.inner.delete(collection, company, id).await
        }
        async fn clear(&self, collection: Collection, company: &str) -> Result<usize, StoreError> {
            self.inner.clear(collection, company).await
        }
    }

    #[tokio::test]
    async fn one_failed_collection_fails_dashboard() {
        let store = FlakyClasses {
            inner: seeded_store().await,
            failed: AtomicBool::new(false),
        };
        let mut ws = Workspace::new(store, "acme");
        assert_eq!(ws.refresh_all().await, Readiness::Failed);
        assert!(ws.store().failed.load(Ordering::SeqCst));
        assert_eq!(
            ws.dashboard(),
            DashboardState::Failed(DASHBOARD_ERROR.to_string())
        );
        assert!(ws.state::<ShareClass>().error().is_some());
        assert_eq!(ws.state::<Stakeholder>().readiness(), Readiness::Ready);
    }
}
