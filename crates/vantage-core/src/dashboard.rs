//! Dashboard aggregation: totals, distributions and chart-ready series.
//!
//! Everything here is recomputed from the raw collections on every call.
//! Each operation accepts any collection, empty included, and never fails.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::model::{
    ComplianceRecord, ComplianceStatus, EquityGrant, FundingRound, GrantKind, GrantStatus, Record,
    ShareClass, ShareTransaction, Stakeholder, StakeholderKind,
};

/// Chart colours, assigned to groups by index and cycled.
pub const PALETTE: [&str; 5] = ["#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884d8"];

/// Rows shown in the "recent" and "upcoming" panels.
pub const RECENT_LIMIT: usize = 3;

/// Borrowed view of a company's six collections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Collections<'a> {
    pub stakeholders: &'a [Stakeholder],
    pub share_classes: &'a [ShareClass],
    pub transactions: &'a [ShareTransaction],
    pub funding_rounds: &'a [FundingRound],
    pub equity_grants: &'a [EquityGrant],
    pub compliance_records: &'a [ComplianceRecord],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub stakeholders: usize,
    pub shares: u64,
    pub active_grants: usize,
    pub pending_compliance: usize,
    pub funding_raised: f64,
}

/// One stakeholder kind's share of the cap table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareSlice {
    pub kind: StakeholderKind,
    pub shares: u64,
    /// Percentage of all shares, one decimal place.
    pub percent: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingPoint {
    pub name: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub valuation: f64,
}

/// Per-month totals keyed by a category (grant kind, compliance status).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket<K: Ord> {
    /// Short month name, e.g. `"Mar"`.
    pub month: String,
    pub values: BTreeMap<K, u64>,
}

impl<K: Ord> MonthBucket<K> {
    pub fn get(&self, key: &K) -> u64 {
        self.values.get(key).copied().unwrap_or(0)
    }
}

/// Everything the dashboard screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub totals: Totals,
    pub distribution: Vec<ShareSlice>,
    pub funding_history: Vec<FundingPoint>,
    pub grants_by_month: Vec<MonthBucket<GrantKind>>,
    pub compliance_by_month: Vec<MonthBucket<ComplianceStatus>>,
    pub recent_transactions: Vec<ShareTransaction>,
    pub upcoming_compliance: Vec<ComplianceRecord>,
}

impl Dashboard {
    /// Aggregate one company's collections.
    ///
    /// Records belonging to any other company are left out (and logged), so
    /// figures never mix companies.
    pub fn compute(company: &str, input: Collections<'_>) -> Self {
        let stakeholders = scoped(company, input.stakeholders);
        let transactions = scoped(company, input.transactions);
        let rounds = scoped(company, input.funding_rounds);
        let grants = scoped(company, input.equity_grants);
        let compliance = scoped(company, input.compliance_records);

        Self {
            totals: totals(&stakeholders, &rounds, &grants, &compliance),
            distribution: share_distribution(&stakeholders),
            funding_history: funding_history(&rounds),
            grants_by_month: grants_by_month(&grants),
            compliance_by_month: compliance_by_month(&compliance),
            recent_transactions: recent_transactions(&transactions)
                .into_iter()
                .cloned()
                .collect(),
            upcoming_compliance: upcoming_compliance(&compliance)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

/// Borrow `records` as-is when all belong to `company`, otherwise copy the
/// matching ones.
fn scoped<'a, R: Record>(company: &str, records: &'a [R]) -> Cow<'a, [R]> {
    let foreign = records.iter().filter(|r| r.company() != company).count();
    if foreign == 0 {
        return Cow::Borrowed(records);
    }
    warn!(
        collection = %R::COLLECTION,
        company,
        foreign,
        "dropping records scoped to another company"
    );
    Cow::Owned(
        records
            .iter()
            .filter(|r| r.company() == company)
            .cloned()
            .collect(),
    )
}

// ── Operations ──

pub fn totals(
    stakeholders: &[Stakeholder],
    rounds: &[FundingRound],
    grants: &[EquityGrant],
    compliance: &[ComplianceRecord],
) -> Totals {
    Totals {
        stakeholders: stakeholders.len(),
        shares: stakeholders.iter().fold(0u64, |sum, s| sum.saturating_add(s.shares)),
        active_grants: grants
            .iter()
            .filter(|g| g.status == GrantStatus::Active)
            .count(),
        pending_compliance: compliance
            .iter()
            .filter(|r| r.status == ComplianceStatus::Pending)
            .count(),
        funding_raised: rounds.iter().map(|r| r.amount).sum(),
    }
}

/// Shares per stakeholder kind, in order of first appearance.
pub fn share_distribution(stakeholders: &[Stakeholder]) -> Vec<ShareSlice> {
    let mut groups: Vec<(StakeholderKind, u64)> = Vec::new();
    for s in stakeholders {
        match groups.iter_mut().find(|(kind, _)| *kind == s.kind) {
            Some((_, shares)) => *shares = shares.saturating_add(s.shares),
            None => groups.push((s.kind, s.shares)),
        }
    }

    let total = groups
        .iter()
        .fold(0u64, |sum, (_, shares)| sum.saturating_add(*shares));
    groups
        .into_iter()
        .enumerate()
        .map(|(i, (kind, shares))| ShareSlice {
            kind,
            shares,
            percent: percent_of(shares, total),
            color: PALETTE[i % PALETTE.len()],
        })
        .collect()
}

fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Funding rounds oldest first.
pub fn funding_history(rounds: &[FundingRound]) -> Vec<FundingPoint> {
    let mut ordered: Vec<&FundingRound> = rounds.iter().collect();
    ordered.sort_by_key(|r| r.date);
    ordered
        .into_iter()
        .map(|r| FundingPoint {
            name: r.name.clone(),
            date: r.date,
            amount: r.amount,
            valuation: r.valuation,
        })
        .collect()
}

/// Granted quantity per month and grant kind.
pub fn grants_by_month(grants: &[EquityGrant]) -> Vec<MonthBucket<GrantKind>> {
    bucket_by_month(grants, |g| (g.grant_date, g.kind, g.quantity))
}

/// Number of compliance records per due month and status.
pub fn compliance_by_month(records: &[ComplianceRecord]) -> Vec<MonthBucket<ComplianceStatus>> {
    bucket_by_month(records, |r| (r.due_date, r.status, 1))
}

/// Buckets keep the order in which their month was first seen, which is not
/// necessarily calendar order. Months of different years share a bucket.
fn bucket_by_month<T, K: Ord + Copy>(
    items: &[T],
    entry: impl Fn(&T) -> (NaiveDate, K, u64),
) -> Vec<MonthBucket<K>> {
    let mut buckets: Vec<MonthBucket<K>> = Vec::new();
    for item in items {
        let (date, key, amount) = entry(item);
        let month = month_name(date);
        let idx = match buckets.iter().position(|b| b.month == month) {
            Some(idx) => idx,
            None => {
                buckets.push(MonthBucket {
                    month,
                    values: BTreeMap::new(),
                });
                buckets.len() - 1
            }
        };
        let value = buckets[idx].values.entry(key).or_insert(0);
        *value = value.saturating_add(amount);
    }
    buckets
}

/// Short English month name: `2024-03-31` → `"Mar"`.
pub fn month_name(date: NaiveDate) -> String {
    date.format("%b").to_string()
}

/// The newest transactions, at most [`RECENT_LIMIT`].
pub fn recent_transactions(transactions: &[ShareTransaction]) -> Vec<&ShareTransaction> {
    let mut ordered = newest_first(transactions.iter());
    ordered.truncate(RECENT_LIMIT);
    ordered
}

/// The newest pending compliance records, at most [`RECENT_LIMIT`].
pub fn upcoming_compliance(records: &[ComplianceRecord]) -> Vec<&ComplianceRecord> {
    let mut ordered = newest_first(
        records
            .iter()
            .filter(|r| r.status == ComplianceStatus::Pending),
    );
    ordered.truncate(RECENT_LIMIT);
    ordered
}

/// Stable sort by `created_at` descending. Records without a timestamp keep
/// their received order, after every timestamped record.
fn newest_first<'a, R: Record>(records: impl Iterator<Item = &'a R>) -> Vec<&'a R> {
    let mut ordered: Vec<&R> = records.collect();
    ordered.sort_by(|a, b| match (a.created_at(), b.created_at()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FundingStatus, Priority, RecordMeta};
    use chrono::{TimeZone, Utc};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn meta(id: &str) -> RecordMeta {
        RecordMeta {
            id: id.into(),
            company: "acme".into(),
            created_at: None,
        }
    }

    fn holder(kind: StakeholderKind, shares: u64) -> Stakeholder {
        Stakeholder {
            meta: meta("s"),
            kind,
            shares,
            ..Default::default()
        }
    }

    fn grant(kind: GrantKind, quantity: u64, on: &str, status: GrantStatus) -> EquityGrant {
        EquityGrant {
            meta: meta("g"),
            kind,
            quantity,
            grant_date: date(on),
            status,
            ..Default::default()
        }
    }

    fn compliance(id: &str, due: &str, status: ComplianceStatus) -> ComplianceRecord {
        ComplianceRecord {
            meta: meta(id),
            kind: "Filing".into(),
            due_date: date(due),
            status,
            priority: Priority::High,
            ..Default::default()
        }
    }

    fn round(name: &str, on: &str, amount: f64) -> FundingRound {
        FundingRound {
            meta: meta(name),
            name: name.into(),
            round_type: "Equity".into(),
            date: date(on),
            amount,
            valuation: amount * 5.0,
            status: FundingStatus::Closed,
            ..Default::default()
        }
    }

    fn tx(id: &str) -> ShareTransaction {
        ShareTransaction {
            meta: meta(id),
            to_stakeholder: "s1".into(),
            quantity: 1,
            ..Default::default()
        }
    }

    #[test]
    fn distribution_example() {
        let holders = vec![
            holder(StakeholderKind::Founder, 100_000),
            holder(StakeholderKind::Investor, 50_000),
            holder(StakeholderKind::Employee, 5_000),
        ];
        let slices = share_distribution(&holders);
        let summary: Vec<(StakeholderKind, u64, f64)> =
            slices.iter().map(|s| (s.kind, s.shares, s.percent)).collect();
        assert_eq!(
            summary,
            vec![
                (StakeholderKind::Founder, 100_000, 64.5),
                (StakeholderKind::Investor, 50_000, 32.3),
                (StakeholderKind::Employee, 5_000, 3.2),
            ]
        );
        assert_eq!(totals(&holders, &[], &[], &[]).shares, 155_000);
        assert_eq!(slices[0].color, "#0088FE");
        assert_eq!(slices[2].color, "#FFBB28");
    }

    #[test]
    fn huge_share_counts_saturate() {
        let half = u64::MAX / 2 + 1;
        let holders = vec![
            holder(StakeholderKind::Founder, half),
            holder(StakeholderKind::Investor, half),
            holder(StakeholderKind::Founder, 1),
        ];
        let dash = Dashboard::compute(
            "acme",
            Collections {
                stakeholders: &holders,
                ..Default::default()
            },
        );
        assert_eq!(dash.totals.shares, u64::MAX);
        let summary: Vec<(StakeholderKind, u64, f64)> = dash
            .distribution
            .iter()
            .map(|s| (s.kind, s.shares, s.percent))
            .collect();
        assert_eq!(
            summary,
            vec![
                (StakeholderKind::Founder, half + 1, 50.0),
                (StakeholderKind::Investor, half, 50.0),
            ]
        );

        let grants = vec![
            grant(GrantKind::Rsu, u64::MAX, "2024-01-10", GrantStatus::Active),
            grant(GrantKind::Rsu, 5, "2024-01-20", GrantStatus::Active),
        ];
        let months = grants_by_month(&grants);
        assert_eq!(months[0].get(&GrantKind::Rsu), u64::MAX);
    }

    #[test]
    fn distribution_sums_match_total() {
        let holders = vec![
            holder(StakeholderKind::Employee, 7),
            holder(StakeholderKind::Founder, 13),
            holder(StakeholderKind::Employee, 11),
            holder(StakeholderKind::Advisor, 3),
            holder(StakeholderKind::Investor, 29),
        ];
        let slices = share_distribution(&holders);
        let group_sum: u64 = slices.iter().map(|s| s.shares).sum();
        assert_eq!(group_sum, totals(&holders, &[], &[], &[]).shares);

        let pct: f64 = slices.iter().map(|s| s.percent).sum();
        let tolerance = 0.1 * slices.len() as f64;
        assert!((pct - 100.0).abs() <= tolerance, "percent sum {pct}");
        assert_eq!(slices[0].kind, StakeholderKind::Employee);
        assert_eq!(slices[0].shares, 18);
    }

    #[test]
    fn zero_total_shares_gives_zero_percent() {
        let holders = vec![
            holder(StakeholderKind::Founder, 0),
            holder(StakeholderKind::Employee, 0),
        ];
        let slices = share_distribution(&holders);
        assert_eq!(slices.len(), 2);
        assert!(slices.iter().all(|s| s.percent == 0.0));
    }

    #[test]
    fn palette_cycles() {
        let kinds = [
            StakeholderKind::Founder,
            StakeholderKind::Investor,
            StakeholderKind::Employee,
            StakeholderKind::Advisor,
        ];
        let holders: Vec<_> = kinds.iter().map(|k| holder(*k, 1)).collect();
        let slices = share_distribution(&holders);
        for (i, slice) in slices.iter().enumerate() {
            assert_eq!(slice.color, PALETTE[i % PALETTE.len()]);
        }
    }

    #[test]
    fn funding_history_is_chronological() {
        let rounds = vec![
            round("Series A", "2023-06-01", 5_000_000.0),
            round("Seed", "2023-01-15", 2_000_000.0),
        ];
        let history = funding_history(&rounds);
        let names: Vec<&str> = history.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Seed", "Series A"]);
        assert_eq!(history[0].valuation, 10_000_000.0);
    }

    #[test]
    fn grants_bucket_in_first_seen_order() {
        let grants = vec![
            grant(GrantKind::StockOption, 50_000, "2023-06-15", GrantStatus::Active),
            grant(GrantKind::Rsu, 25_000, "2023-03-01", GrantStatus::Active),
            grant(GrantKind::StockOption, 30_000, "2023-06-20", GrantStatus::Expired),
            grant(GrantKind::Rsu, 5_000, "2023-06-01", GrantStatus::Active),
        ];
        let buckets = grants_by_month(&grants);
        let months: Vec<&str> = buckets.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(months, vec!["Jun", "Mar"]);
        assert_eq!(buckets[0].get(&GrantKind::StockOption), 80_000);
        assert_eq!(buckets[0].get(&GrantKind::Rsu), 5_000);
        assert_eq!(buckets[1].get(&GrantKind::StockOption), 0);
        assert_eq!(buckets[1].get(&GrantKind::Rsu), 25_000);
    }

    #[test]
    fn empty_grants_give_empty_series() {
        assert!(grants_by_month(&[]).is_empty());
        let dash = Dashboard::compute("acme", Collections::default());
        assert!(dash.distribution.is_empty());
        assert!(dash.funding_history.is_empty());
        assert!(dash.compliance_by_month.is_empty());
        assert!(dash.recent_transactions.is_empty());
        assert_eq!(dash.totals, Totals::default());
    }

    #[test]
    fn compliance_counts_per_status() {
        let records = vec![
            compliance("a", "2024-03-31", ComplianceStatus::Pending),
            compliance("b", "2024-02-28", ComplianceStatus::Completed),
            compliance("c", "2024-03-15", ComplianceStatus::Pending),
            compliance("d", "2024-03-01", ComplianceStatus::Overdue),
        ];
        let buckets = compliance_by_month(&records);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].month, "Mar");
        assert_eq!(buckets[0].get(&ComplianceStatus::Pending), 2);
        assert_eq!(buckets[0].get(&ComplianceStatus::Overdue), 1);
        assert_eq!(buckets[1].get(&ComplianceStatus::Completed), 1);
    }

    #[test]
    fn recent_transactions_take_first_three_in_order() {
        let txs: Vec<_> = ["t1", "t2", "t3", "t4", "t5"].iter().map(|id| tx(id)).collect();
        let recent: Vec<&str> = recent_transactions(&txs).iter().map(|t| t.id()).collect();
        assert_eq!(recent, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn recent_transactions_prefer_newest_timestamp() {
        let mut txs: Vec<_> = ["old", "new", "untimed", "mid"].iter().map(|id| tx(id)).collect();
        txs[0].meta.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        txs[1].meta.created_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        txs[3].meta.created_at = Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        let recent: Vec<&str> = recent_transactions(&txs).iter().map(|t| t.id()).collect();
        assert_eq!(recent, vec!["new", "mid", "old"]);
    }

    #[test]
    fn upcoming_compliance_only_pending() {
        let records = vec![
            compliance("a", "2024-03-31", ComplianceStatus::Completed),
            compliance("b", "2024-02-28", ComplianceStatus::Pending),
            compliance("c", "2024-02-15", ComplianceStatus::Pending),
            compliance("d", "2024-04-15", ComplianceStatus::InProgress),
            compliance("e", "2024-03-15", ComplianceStatus::Pending),
            compliance("f", "2024-05-15", ComplianceStatus::Pending),
        ];
        let ids: Vec<&str> = upcoming_compliance(&records).iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b", "c", "e"]);
    }

    #[test]
    fn totals_count_statuses_and_funding() {
        let grants = vec![
            grant(GrantKind::StockOption, 1, "2023-01-01", GrantStatus::Active),
            grant(GrantKind::Rsu, 1, "2023-01-01", GrantStatus::Cancelled),
            grant(GrantKind::Sars, 1, "2023-01-01", GrantStatus::Active),
        ];
        let records = vec![
            compliance("a", "2024-01-01", ComplianceStatus::Pending),
            compliance("b", "2024-01-01", ComplianceStatus::Overdue),
        ];
        let rounds = vec![round("Seed", "2023-04-01", 2_000_000.0), round("Pre", "2023-01-15", 500_000.0)];
        let t = totals(&[], &rounds, &grants, &records);
        assert_eq!(t.active_grants, 2);
        assert_eq!(t.pending_compliance, 1);
        assert_eq!(t.funding_raised, 2_500_000.0);
    }

    #[test]
    fn compute_ignores_other_companies() {
        let mut foreign = holder(StakeholderKind::Investor, 1_000);
        foreign.meta.company = "globex".into();
        let holders = vec![holder(StakeholderKind::Founder, 10), foreign];
        let dash = Dashboard::compute(
            "acme",
            Collections {
                stakeholders: &holders,
                ..Default::default()
            },
        );
        assert_eq!(dash.totals.stakeholders, 1);
        assert_eq!(dash.totals.shares, 10);
        assert_eq!(dash.distribution.len(), 1);
        assert_eq!(dash.distribution[0].percent, 100.0);
    }

    #[test]
    fn month_names_are_short_english() {
        assert_eq!(month_name(date("2024-01-31")), "Jan");
        assert_eq!(month_name(date("2023-09-01")), "Sep");
    }
}
