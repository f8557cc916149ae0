//! Demo data set for a fresh company.

use chrono::NaiveDate;
use tracing::info;
use vantage_core::{
    Collection, ComplianceRecord, ComplianceStatus, EquityGrant, FundingRound, FundingStatus,
    GrantKind, GrantStatus, Priority, Record, ShareClass, ShareTransaction, Stakeholder,
    StakeholderKind, TransactionKind,
};

use crate::{Repository, StoreError};

/// Records created by [`seed_sample_data`], per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub share_classes: usize,
    pub stakeholders: usize,
    pub transactions: usize,
    pub funding_rounds: usize,
    pub equity_grants: usize,
    pub compliance_records: usize,
}

/// Dependent collections first.
const CLEAR_ORDER: [Collection; 6] = [
    Collection::ComplianceRecords,
    Collection::EquityGrants,
    Collection::Transactions,
    Collection::Stakeholders,
    Collection::ShareClasses,
    Collection::FundingRounds,
];

fn day(y: i32, m: u32, d: u32) -> Result<NaiveDate, StoreError> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| StoreError::Other(format!("invalid sample date {y}-{m}-{d}")))
}

/// Replace `company`'s records with the demo cap table.
///
/// References are wired with the ids the store hands back, so this works
/// against any backend.
pub async fn seed_sample_data<S: Repository>(
    store: &S,
    company: &str,
) -> Result<SeedSummary, StoreError> {
    info!(company, "seeding sample data");
    store.company(company).await?;
    for collection in CLEAR_ORDER {
        store.clear(collection, company).await?;
    }

    let mut summary = SeedSummary::default();

    // ── Share classes ──

    let class_specs = [
        ("Common A", "Standard common stock rights", "1 vote per share", "Pro rata participation", "1x"),
        (
            "Preferred A",
            "Enhanced rights with anti-dilution protection",
            "1.5 votes per share",
            "Priority distribution",
            "1.5x",
        ),
        ("Common B", "Standard rights without voting", "No voting rights", "Pro rata participation", "1x"),
        (
            "Preferred B",
            "Enhanced rights with double liquidation preference",
            "2 votes per share",
            "Priority distribution",
            "2x",
        ),
    ];
    let mut classes = Vec::with_capacity(class_specs.len());
    for (name, rights, voting, dividend, liquidation) in class_specs {
        let class = ShareClass {
            name: name.into(),
            rights: rights.into(),
            voting_rights: voting.into(),
            dividend_rights: dividend.into(),
            liquidation_preference: liquidation.into(),
            ..Default::default()
        };
        classes.push(store.create(company, class).await?);
    }
    summary.share_classes = classes.len();
    let class_id = |idx: usize| classes.get(idx).map(|c| c.id().to_string());
    let (common_a, preferred_a, common_b, preferred_b) = (0, 1, 2, 3);

    // ── Stakeholders ──

    use StakeholderKind::*;
    let holder_specs = [
        ("John Smith", "john@example.com", Founder, 1_000_000, common_a, day(2023, 1, 1)?),
        ("Sarah Johnson", "sarah@example.com", Investor, 500_000, preferred_a, day(2023, 2, 15)?),
        ("Michael Brown", "michael@example.com", Employee, 50_000, common_b, day(2023, 3, 1)?),
        ("Emily Davis", "emily@example.com", Advisor, 25_000, common_a, day(2023, 4, 15)?),
        ("Tech Ventures LLC", "info@techventures.com", Investor, 750_000, preferred_b, day(2023, 5, 1)?),
        ("David Wilson", "david@example.com", Employee, 30_000, common_b, day(2023, 6, 15)?),
        ("Lisa Chen", "lisa@example.com", Employee, 40_000, common_b, day(2023, 7, 1)?),
        ("Growth Fund I", "info@growthfund.com", Investor, 1_000_000, preferred_b, day(2023, 8, 15)?),
        ("Robert Taylor", "robert@example.com", Advisor, 20_000, common_a, day(2023, 9, 1)?),
        ("Angel Group X", "info@angelgroup.com", Investor, 250_000, preferred_a, day(2023, 10, 15)?),
    ];
    let mut holders = Vec::with_capacity(holder_specs.len());
    for (name, email, kind, shares, class, join_date) in holder_specs {
        let holder = Stakeholder {
            name: name.into(),
            email: email.into(),
            kind,
            shares,
            share_class: class_id(class),
            join_date,
            ..Default::default()
        };
        holders.push(store.create(company, holder).await?);
    }
    summary.stakeholders = holders.len();
    let holder_id = |idx: usize| {
        holders
            .get(idx)
            .map(|h| h.id().to_string())
            .unwrap_or_default()
    };

    // ── Transactions ──

    let mut transactions: Vec<ShareTransaction> = holders
        .iter()
        .map(|h| ShareTransaction {
            date: h.join_date,
            kind: TransactionKind::Issuance,
            from_stakeholder: None,
            to_stakeholder: h.id().to_string(),
            quantity: h.shares,
            share_class: h.share_class.clone(),
            price: if h.kind == Investor { 1.00 } else { 0.01 },
            ..Default::default()
        })
        .collect();
    transactions.push(ShareTransaction {
        date: day(2023, 6, 1)?,
        kind: TransactionKind::Transfer,
        from_stakeholder: Some(holder_id(0)),
        to_stakeholder: holder_id(2),
        quantity: 10_000,
        share_class: class_id(common_a),
        price: 0.50,
        ..Default::default()
    });
    transactions.push(ShareTransaction {
        date: day(2023, 7, 15)?,
        kind: TransactionKind::Transfer,
        from_stakeholder: Some(holder_id(1)),
        to_stakeholder: holder_id(3),
        quantity: 5_000,
        share_class: class_id(preferred_a),
        price: 1.50,
        ..Default::default()
    });
    for tx in transactions {
        store.create(company, tx).await?;
        summary.transactions += 1;
    }

    // ── Funding rounds ──

    let round_specs: [(&str, NaiveDate, f64, f64, &[&str], FundingStatus); 4] = [
        ("Pre-Seed", day(2023, 1, 15)?, 500_000.0, 5_000_000.0, &["Angel Group X"], FundingStatus::Closed),
        ("Seed", day(2023, 4, 1)?, 2_000_000.0, 10_000_000.0, &["Tech Ventures LLC"], FundingStatus::Closed),
        ("Series A", day(2023, 8, 15)?, 5_000_000.0, 25_000_000.0, &["Growth Fund I"], FundingStatus::Closed),
        (
            "Series B",
            day(2024, 1, 15)?,
            10_000_000.0,
            50_000_000.0,
            &["Growth Fund II", "Tech Fund X"],
            FundingStatus::Active,
        ),
    ];
    for (name, date, amount, valuation, investors, status) in round_specs {
        let round = FundingRound {
            name: name.into(),
            round_type: "Equity".into(),
            date,
            amount,
            valuation,
            investors: investors.iter().map(|s| s.to_string()).collect(),
            status,
            ..Default::default()
        };
        store.create(company, round).await?;
        summary.funding_rounds += 1;
    }

    // ── Equity grants ──

    let cliff = "4 years with 1 year cliff";
    let quarterly = "4 years quarterly vesting";
    let grant_specs = [
        (2, GrantKind::StockOption, 50_000, day(2023, 3, 1)?, cliff, 0.50),
        (5, GrantKind::StockOption, 30_000, day(2023, 6, 15)?, cliff, 0.75),
        (6, GrantKind::StockOption, 40_000, day(2023, 7, 1)?, cliff, 0.75),
        (3, GrantKind::Rsu, 25_000, day(2023, 4, 15)?, quarterly, 0.0),
        (8, GrantKind::Rsu, 20_000, day(2023, 9, 1)?, quarterly, 0.0),
    ];
    for (recipient, kind, quantity, grant_date, vesting, price) in grant_specs {
        let grant = EquityGrant {
            recipient_id: holder_id(recipient),
            kind,
            quantity,
            grant_date,
            vesting_schedule: vesting.into(),
            exercise_price: price,
            status: GrantStatus::Active,
            ..Default::default()
        };
        store.create(company, grant).await?;
        summary.equity_grants += 1;
    }

    // ── Compliance ──

    let compliance_specs = [
        ("Annual Filing", day(2024, 3, 31)?, "Annual company return filing", 0, Priority::High),
        ("Board Meeting", day(2024, 2, 28)?, "Q1 2024 Board Meeting", 0, Priority::Medium),
        (
            "Share Certificate",
            day(2024, 2, 15)?,
            "Issue new share certificates for Series B investors",
            1,
            Priority::High,
        ),
        ("Tax Filing", day(2024, 4, 15)?, "Annual tax return preparation and filing", 0, Priority::High),
        ("Option Grant Review", day(2024, 3, 15)?, "Review and approve new option grants", 1, Priority::Medium),
        ("Shareholder Meeting", day(2024, 5, 15)?, "Annual shareholder meeting preparation", 0, Priority::Medium),
        ("Regulatory Filing", day(2024, 6, 30)?, "Securities regulatory filing", 1, Priority::High),
        ("Vesting Review", day(2024, 3, 1)?, "Quarterly vesting schedule review", 1, Priority::Medium),
    ];
    for (kind, due_date, description, assignee, priority) in compliance_specs {
        let record = ComplianceRecord {
            kind: kind.into(),
            due_date,
            status: ComplianceStatus::Pending,
            description: description.into(),
            assigned_to: holder_id(assignee),
            priority,
            ..Default::default()
        };
        store.create(company, record).await?;
        summary.compliance_records += 1;
    }

    info!(
        company,
        stakeholders = summary.stakeholders,
        transactions = summary.transactions,
        "sample data ready"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DashboardState, MemoryStore, Workspace};
    use vantage_core::Company;

    async fn store() -> MemoryStore {
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
    }

    #[tokio::test]
    async fn seeds_every_collection() {
        let store = store().await;
        let summary = seed_sample_data(&store, "acme").await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                share_classes: 4,
                stakeholders: 10,
                transactions: 12,
                funding_rounds: 4,
                equity_grants: 5,
                compliance_records: 8,
            }
        );
    }

    #[tokio::test]
    async fn reseeding_replaces_data() {
        let store = store().await;
        seed_sample_data(&store, "acme").await.unwrap();
        seed_sample_data(&store, "acme").await.unwrap();
        let holders: Vec<Stakeholder> = store.get_all("acme").await.unwrap();
        assert_eq!(holders.len(), 10);
    }

    #[tokio::test]
    async fn unknown_company_is_rejected() {
        let store = store().await;
        let err = seed_sample_data(&store, "globex").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownCompany(_)));
    }

    #[tokio::test]
    async fn references_point_at_created_records() {
        let store = store().await;
        seed_sample_data(&store, "acme").await.unwrap();

        let classes: Vec<ShareClass> = store.get_all("acme").await.unwrap();
        let holders: Vec<Stakeholder> = store.get_all("acme").await.unwrap();
        let grants: Vec<EquityGrant> = store.get_all("acme").await.unwrap();

        let john = holders.iter().find(|h| h.name == "John Smith").unwrap();
        let common_a = classes.iter().find(|c| c.name == "Common A").unwrap();
        assert_eq!(john.share_class.as_deref(), Some(common_a.id()));

        let michael = holders.iter().find(|h| h.name == "Michael Brown").unwrap();
        assert!(
            grants
                .iter()
                .any(|g| g.recipient_id == michael.id() && g.quantity == 50_000)
        );
    }

    #[tokio::test]
    async fn seeded_dashboard_figures() {
        let store = store().await;
        seed_sample_data(&store, "acme").await.unwrap();
        let mut ws = Workspace::new(store, "acme");
        ws.refresh_all().await;

        let DashboardState::Ready(dash) = ws.dashboard() else {
            panic!("dashboard should be ready");
        };
        assert_eq!(dash.totals.stakeholders, 10);
        assert_eq!(dash.totals.shares, 3_665_000);
        assert_eq!(dash.totals.active_grants, 5);
        assert_eq!(dash.totals.pending_compliance, 8);
        assert_eq!(dash.totals.funding_raised, 17_500_000.0);

        let investors = dash
            .distribution
            .iter()
            .find(|s| s.kind == StakeholderKind::Investor)
            .unwrap();
        assert_eq!(investors.shares, 2_500_000);
        assert_eq!(investors.percent, 68.2);

        let rounds: Vec<&str> = dash.funding_history.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(rounds, vec!["Pre-Seed", "Seed", "Series A", "Series B"]);

        assert_eq!(dash.recent_transactions.len(), 3);
        assert_eq!(dash.recent_transactions[0].quantity, 5_000);
        assert_eq!(dash.upcoming_compliance.len(), 3);
        assert_eq!(dash.upcoming_compliance[0].kind, "Vesting Review");
    }
}
