//! Cap-table record types shared by the store, remote and CLI crates.
//!
//! Every record carries a [`RecordMeta`] (id, owning company, creation time)
//! flattened into its JSON form. References between records are bare ids;
//! display names are resolved by the table view, never stored on the record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::FieldValue;

/// Error returned when parsing an enum value from its wire name fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a fieldless enum whose serde, `Display` and `FromStr` forms share
/// one lowercase wire name per variant. The first variant is the default.
macro_rules! wire_enum {
    (
        $(#[$doc:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

wire_enum! {
    /// How a stakeholder came to hold equity.
    StakeholderKind, "stakeholder type" {
        Founder => "founder",
        Investor => "investor",
        Employee => "employee",
        Advisor => "advisor",
    }
}

wire_enum! {
    TransactionKind, "transaction type" {
        Issuance => "issuance",
        Transfer => "transfer",
        Exercise => "exercise",
    }
}

wire_enum! {
    FundingStatus, "funding round status" {
        Planned => "planned",
        Active => "active",
        Closed => "closed",
    }
}

wire_enum! {
    /// Instrument awarded by an equity grant.
    GrantKind, "grant type" {
        StockOption => "option",
        Rsu => "rsu",
        Sars => "sars",
        Warrant => "warrant",
    }
}

wire_enum! {
    GrantStatus, "grant status" {
        Active => "active",
        Exercised => "exercised",
        Expired => "expired",
        Cancelled => "cancelled",
    }
}

wire_enum! {
    ComplianceStatus, "compliance status" {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Overdue => "overdue",
    }
}

wire_enum! {
    Priority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

// ── Collections ──

/// The six record collections of a company's cap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Stakeholders,
    ShareClasses,
    Transactions,
    FundingRounds,
    EquityGrants,
    ComplianceRecords,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Stakeholders,
        Collection::ShareClasses,
        Collection::Transactions,
        Collection::FundingRounds,
        Collection::EquityGrants,
        Collection::ComplianceRecords,
    ];

    /// Table name in the relational store.
    pub fn table_name(self) -> &'static str {
        match self {
            Collection::Stakeholders => "stakeholders",
            Collection::ShareClasses => "share_classes",
            Collection::Transactions => "share_transactions",
            Collection::FundingRounds => "funding_rounds",
            Collection::EquityGrants => "equity_grants",
            Collection::ComplianceRecords => "compliance_records",
        }
    }

    /// Section slug used on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Collection::Stakeholders => "stakeholders",
            Collection::ShareClasses => "share-classes",
            Collection::Transactions => "transactions",
            Collection::FundingRounds => "funding-rounds",
            Collection::EquityGrants => "equity-grants",
            Collection::ComplianceRecords => "compliance",
        }
    }

    /// Singular, lowercase noun for notices ("share class", "equity grant").
    pub fn noun(self) -> &'static str {
        match self {
            Collection::Stakeholders => "stakeholder",
            Collection::ShareClasses => "share class",
            Collection::Transactions => "transaction",
            Collection::FundingRounds => "funding round",
            Collection::EquityGrants => "equity grant",
            Collection::ComplianceRecords => "compliance record",
        }
    }

    /// Section title ("Share Classes").
    pub fn title(self) -> &'static str {
        match self {
            Collection::Stakeholders => "Stakeholders",
            Collection::ShareClasses => "Share Classes",
            Collection::Transactions => "Share Transactions",
            Collection::FundingRounds => "Funding Rounds",
            Collection::EquityGrants => "Equity Grants",
            Collection::ComplianceRecords => "Compliance",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Collection {
    type Err = ParseEnumError;

    /// Accepts either the section slug or the table name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Collection::ALL
            .into_iter()
            .find(|c| c.slug() == wanted || c.table_name() == wanted)
            .ok_or_else(|| ParseEnumError {
                kind: "collection",
                value: s.to_string(),
            })
    }
}

// ── Records ──

/// Identity and scoping shared by every record. Assigned by the store on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A company-scoped record stored in one of the six collections.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Top-level field addressed by a table column key. Unknown keys are `Null`.
    fn field(&self, key: &str) -> FieldValue;

    fn id(&self) -> &str {
        &self.meta().id
    }

    fn company(&self) -> &str {
        &self.meta().company
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.meta().created_at
    }
}

/// Fields every record answers to, regardless of type.
fn meta_field(meta: &RecordMeta, key: &str) -> FieldValue {
    match key {
        "id" => FieldValue::text(&meta.id),
        "company" => FieldValue::text(&meta.company),
        "created_at" => meta
            .created_at
            .map(|ts| FieldValue::Text(ts.to_rfc3339()))
            .unwrap_or(FieldValue::Null),
        _ => FieldValue::Null,
    }
}

fn reference(collection: Collection, id: Option<&str>) -> FieldValue {
    match id {
        Some(id) if !id.is_empty() => FieldValue::Ref {
            collection,
            id: id.to_string(),
        },
        _ => FieldValue::Null,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stakeholder {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: StakeholderKind,
    pub shares: u64,
    /// Share class id.
    #[serde(default)]
    pub share_class: Option<String>,
    pub join_date: NaiveDate,
}

impl Record for Stakeholder {
    const COLLECTION: Collection = Collection::Stakeholders;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "name" => FieldValue::text(&self.name),
            "email" => FieldValue::text(&self.email),
            "type" => FieldValue::text(self.kind.as_str()),
            "shares" => FieldValue::Integer(self.shares),
            "share_class" => reference(Collection::ShareClasses, self.share_class.as_deref()),
            "join_date" => FieldValue::Date(self.join_date),
            _ => meta_field(&self.meta, key),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareClass {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    #[serde(default)]
    pub rights: String,
    #[serde(default)]
    pub voting_rights: String,
    #[serde(default)]
    pub dividend_rights: String,
    #[serde(default)]
    pub liquidation_preference: String,
}

impl Record for ShareClass {
    const COLLECTION: Collection = Collection::ShareClasses;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "name" => FieldValue::text(&self.name),
            "rights" => FieldValue::text(&self.rights),
            "voting_rights" => FieldValue::text(&self.voting_rights),
            "dividend_rights" => FieldValue::text(&self.dividend_rights),
            "liquidation_preference" => FieldValue::text(&self.liquidation_preference),
            _ => meta_field(&self.meta, key),
        }
    }
}

/// A movement of shares. Issuances have no sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareTransaction {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub from_stakeholder: Option<String>,
    pub to_stakeholder: String,
    pub quantity: u64,
    #[serde(default)]
    pub share_class: Option<String>,
    pub price: f64,
}

impl Record for ShareTransaction {
    const COLLECTION: Collection = Collection::Transactions;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "date" => FieldValue::Date(self.date),
            "type" => FieldValue::text(self.kind.as_str()),
            "from_stakeholder" => {
                reference(Collection::Stakeholders, self.from_stakeholder.as_deref())
            }
            "to_stakeholder" => reference(Collection::Stakeholders, Some(&self.to_stakeholder)),
            "quantity" => FieldValue::Integer(self.quantity),
            "share_class" => reference(Collection::ShareClasses, self.share_class.as_deref()),
            "price" => FieldValue::Number(self.price),
            _ => meta_field(&self.meta, key),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingRound {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    #[serde(rename = "type")]
    pub round_type: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub valuation: f64,
    #[serde(default)]
    pub investors: Vec<String>,
    pub status: FundingStatus,
}

impl Record for FundingRound {
    const COLLECTION: Collection = Collection::FundingRounds;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "name" => FieldValue::text(&self.name),
            "type" => FieldValue::text(&self.round_type),
            "date" => FieldValue::Date(self.date),
            "amount" => FieldValue::Number(self.amount),
            "valuation" => FieldValue::Number(self.valuation),
            "investors" => FieldValue::Text(self.investors.join(", ")),
            "status" => FieldValue::text(self.status.as_str()),
            _ => meta_field(&self.meta, key),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityGrant {
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Stakeholder id of the recipient.
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub kind: GrantKind,
    pub quantity: u64,
    pub grant_date: NaiveDate,
    #[serde(default)]
    pub vesting_schedule: String,
    #[serde(default)]
    pub exercise_price: f64,
    pub status: GrantStatus,
}

impl Record for EquityGrant {
    const COLLECTION: Collection = Collection::EquityGrants;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "recipient_id" => reference(Collection::Stakeholders, Some(&self.recipient_id)),
            "type" => FieldValue::text(self.kind.as_str()),
            "quantity" => FieldValue::Integer(self.quantity),
            "grant_date" => FieldValue::Date(self.grant_date),
            "vesting_schedule" => FieldValue::text(&self.vesting_schedule),
            "exercise_price" => FieldValue::Number(self.exercise_price),
            "status" => FieldValue::text(self.status.as_str()),
            _ => meta_field(&self.meta, key),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(rename = "type")]
    pub kind: String,
    pub due_date: NaiveDate,
    pub status: ComplianceStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_to: String,
    pub priority: Priority,
}

impl Record for ComplianceRecord {
    const COLLECTION: Collection = Collection::ComplianceRecords;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "type" => FieldValue::text(&self.kind),
            "due_date" => FieldValue::Date(self.due_date),
            "status" => FieldValue::text(self.status.as_str()),
            "description" => FieldValue::text(&self.description),
            "assigned_to" => FieldValue::text(&self.assigned_to),
            "priority" => FieldValue::text(self.priority.as_str()),
            _ => meta_field(&self.meta, key),
        }
    }
}
