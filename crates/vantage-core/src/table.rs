//! Sortable table view over in-memory record collections.
//!
//! A [`TableView`] owns column metadata and a [`References`] lookup, never the
//! records. [`render`] is a pure function of (columns, records, sort state):
//! it returns a new ordering of borrowed records and leaves the input alone.
//!
//! # Ordering rules
//!
//! - Null values sort last in both directions.
//! - Text compares case-folded first, then exactly, so "alice" and "Alice" sit
//!   together the way a locale collator would place them.
//! - Numbers compare numerically and dates chronologically.
//! - Anything else (mixed types on one column) falls back to comparing the
//!   display strings.
//! - The sort is stable: ties keep their input order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Collection, Record, ShareClass, Stakeholder};

// ── Values ──

/// A record field as seen by the table view.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(u64),
    Number(f64),
    Date(NaiveDate),
    /// Id of a record in another collection.
    Ref { collection: Collection, id: String },
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Ref { id, .. } => f.write_str(id),
        }
    }
}

/// Ascending order of two non-null values.
pub fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => compare_text(x, y),
        (FieldValue::Date(x), FieldValue::Date(y)) => x.cmp(y),
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => compare_text(&a.to_string(), &b.to_string()),
        },
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// ── References ──

/// Display names of referenced records, keyed by collection and id.
#[derive(Debug, Clone, Default)]
pub struct References {
    names: HashMap<Collection, HashMap<String, String>>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: Collection, id: impl Into<String>, name: impl Into<String>) {
        self.names
            .entry(collection)
            .or_default()
            .insert(id.into(), name.into());
    }

    pub fn with_stakeholders(mut self, stakeholders: &[Stakeholder]) -> Self {
        for s in stakeholders {
            self.insert(Collection::Stakeholders, s.id(), &s.name);
        }
        self
    }

    pub fn with_share_classes(mut self, classes: &[ShareClass]) -> Self {
        for c in classes {
            self.insert(Collection::ShareClasses, c.id(), &c.name);
        }
        self
    }

    pub fn name(&self, collection: Collection, id: &str) -> Option<&str> {
        self.names
            .get(&collection)
            .and_then(|m| m.get(id))
            .map(String::as_str)
    }
}

/// Resolve a column key against a record.
///
/// Keys have at most one nested segment: `share_class.name` reads the
/// `share_class` reference and looks up its display name. An unresolvable
/// path is `Null`.
pub fn resolve<R: Record>(record: &R, key: &str, refs: &References) -> FieldValue {
    let (head, tail) = match key.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (key, None),
    };
    let value = record.field(head);
    match (tail, value) {
        (None, value) => value,
        (Some("name"), FieldValue::Ref { collection, id }) => refs
            .name(collection, &id)
            .map(FieldValue::text)
            .unwrap_or(FieldValue::Null),
        (Some("id"), FieldValue::Ref { id, .. }) => FieldValue::Text(id),
        _ => FieldValue::Null,
    }
}

// ── Sort state ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Next state after activating `key`: the same key flips direction, a new
    /// key starts ascending.
    pub fn toggle(current: Option<&SortState>, key: &str) -> SortState {
        match current {
            Some(state) if state.key == key => SortState {
                key: state.key.clone(),
                direction: state.direction.flipped(),
            },
            _ => SortState::ascending(key),
        }
    }
}

// ── Columns and cells ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Default,
    Success,
    Warning,
    Error,
}

/// Maps a cell's text to a badge variant.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeStyle {
    rules: Vec<(String, BadgeVariant)>,
    fallback: BadgeVariant,
}

impl BadgeStyle {
    pub fn new(fallback: BadgeVariant) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    pub fn when(mut self, value: impl Into<String>, variant: BadgeVariant) -> Self {
        self.rules.push((value.into(), variant));
        self
    }

    pub fn variant_for(&self, value: &str) -> BadgeVariant {
        self.rules
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, variant)| *variant)
            .unwrap_or(self.fallback)
    }
}

/// How a column turns a field value into display text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellFormatter {
    Text,
    /// Thousands-grouped integer.
    Integer,
    /// Dollar amount; a missing value shows as `$0`.
    Currency,
    Date,
    Badge(BadgeStyle),
    /// Resolved reference name, with a placeholder when unresolved.
    Reference { placeholder: String },
}

impl CellFormatter {
    pub fn reference(placeholder: impl Into<String>) -> Self {
        CellFormatter::Reference {
            placeholder: placeholder.into(),
        }
    }

    pub fn format(&self, value: &FieldValue) -> Cell {
        match self {
            CellFormatter::Text | CellFormatter::Date => Cell::plain(value.to_string()),
            CellFormatter::Integer => match value {
                FieldValue::Integer(n) => Cell::plain(group_thousands(*n)),
                FieldValue::Number(n) if n.fract() == 0.0 && *n >= 0.0 => {
                    Cell::plain(group_thousands(*n as u64))
                }
                other => Cell::plain(other.to_string()),
            },
            CellFormatter::Currency => match value.as_number() {
                Some(n) => Cell::plain(format_currency(n)),
                None if value.is_null() => Cell::plain(format_currency(0.0)),
                None => Cell::plain(value.to_string()),
            },
            CellFormatter::Badge(style) => {
                let text = value.to_string();
                let variant = style.variant_for(&text);
                Cell {
                    text,
                    badge: Some(variant),
                }
            }
            CellFormatter::Reference { placeholder } => match value {
                FieldValue::Null => Cell::plain(placeholder.clone()),
                other => Cell::plain(other.to_string()),
            },
        }
    }
}

/// One formatted table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub badge: Option<BadgeVariant>,
}

impl Cell {
    fn plain(text: String) -> Self {
        Self { text, badge: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub header: String,
    pub sortable: bool,
    pub formatter: CellFormatter,
}

impl Column {
    /// A sortable plain-text column.
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            sortable: true,
            formatter: CellFormatter::Text,
        }
    }

    pub fn formatter(mut self, formatter: CellFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

// ── Rendering ──

/// Order `records` for display.
///
/// With no sort state, or a state naming a column that is absent or not
/// sortable, the input order is returned unchanged.
pub fn render<'a, R: Record>(
    columns: &[Column],
    records: &'a [R],
    sort: Option<&SortState>,
    refs: &References,
) -> Vec<&'a R> {
    let sort = sort.filter(|s| columns.iter().any(|c| c.sortable && c.key == s.key));
    match sort {
        Some(state) => sort_records(records, state, refs),
        None => records.iter().collect(),
    }
}

/// Stable sort of `records` by `state.key`, nulls last in both directions.
pub fn sort_records<'a, R: Record>(
    records: &'a [R],
    state: &SortState,
    refs: &References,
) -> Vec<&'a R> {
    let mut keyed: Vec<(FieldValue, &'a R)> = records
        .iter()
        .map(|r| (resolve(r, &state.key, refs), r))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = compare_values(a, b);
            match state.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    });

    keyed.into_iter().map(|(_, r)| r).collect()
}

/// Column set plus reference lookup for one collection's table.
#[derive(Debug, Clone)]
pub struct TableView {
    columns: Vec<Column>,
    refs: References,
}

impl TableView {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            refs: References::default(),
        }
    }

    pub fn with_references(mut self, refs: References) -> Self {
        self.refs = refs;
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn references(&self) -> &References {
        &self.refs
    }

    /// Sort state after the user activates the header for `key`.
    /// Non-sortable or unknown columns leave the state unchanged.
    pub fn toggle(&self, current: Option<&SortState>, key: &str) -> Option<SortState> {
        let sortable = self.columns.iter().any(|c| c.key == key && c.sortable);
        if sortable {
            Some(SortState::toggle(current, key))
        } else {
            current.cloned()
        }
    }

    pub fn render<'a, R: Record>(&self, records: &'a [R], sort: Option<&SortState>) -> Vec<&'a R> {
        render(&self.columns, records, sort, &self.refs)
    }

    /// Ordered, formatted rows: one `Vec<Cell>` per record, one cell per column.
    pub fn rows<R: Record>(&self, records: &[R], sort: Option<&SortState>) -> Vec<Vec<Cell>> {
        self.render(records, sort)
            .into_iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|col| col.formatter.format(&resolve(record, &col.key, &self.refs)))
                    .collect()
            })
            .collect()
    }
}

// ── Number formatting ──

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Dollar amount with thousands grouping; cents only when non-zero.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let frac = cents % 100;
    let body = if frac == 0 {
        whole
    } else {
        format!("{whole}.{frac:02}")
    };
    if amount < 0.0 {
        format!("-${body}")
    } else {
        format!("${body}")
    }
}
