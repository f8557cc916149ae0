//! Standard column sets for each collection's table.

use crate::model::Collection;
use crate::table::{BadgeStyle, BadgeVariant, CellFormatter, Column};

/// Placeholder shown when a reference cannot be resolved.
pub const MISSING: &str = "-";

pub fn for_collection(collection: Collection) -> Vec<Column> {
    match collection {
        Collection::Stakeholders => stakeholders(),
        Collection::ShareClasses => share_classes(),
        Collection::Transactions => transactions(),
        Collection::FundingRounds => funding_rounds(),
        Collection::EquityGrants => equity_grants(),
        Collection::ComplianceRecords => compliance_records(),
    }
}

fn id_column() -> Column {
    Column::new("id", "Id").unsortable()
}

fn badge(fallback: BadgeVariant, rules: &[(&str, BadgeVariant)]) -> CellFormatter {
    let style = rules
        .iter()
        .fold(BadgeStyle::new(fallback), |style, (value, variant)| {
            style.when(*value, *variant)
        });
    CellFormatter::Badge(style)
}

pub fn stakeholders() -> Vec<Column> {
    use BadgeVariant::*;
    vec![
        Column::new("name", "Name"),
        Column::new("email", "Email"),
        Column::new("type", "Type").formatter(badge(Default, &[("founder", Success)])),
        Column::new("shares", "Shares").formatter(CellFormatter::Integer),
        Column::new("share_class.name", "Share Class").formatter(CellFormatter::reference(MISSING)),
        Column::new("join_date", "Join Date").formatter(CellFormatter::Date),
        id_column(),
    ]
}

pub fn share_classes() -> Vec<Column> {
    vec![
        Column::new("name", "Name"),
        Column::new("rights", "Rights"),
        Column::new("voting_rights", "Voting Rights"),
        Column::new("dividend_rights", "Dividend Rights"),
        Column::new("liquidation_preference", "Liquidation Preference"),
        id_column(),
    ]
}

pub fn transactions() -> Vec<Column> {
    use BadgeVariant::*;
    vec![
        Column::new("date", "Date").formatter(CellFormatter::Date),
        Column::new("type", "Type").formatter(badge(Default, &[("issuance", Success)])),
        Column::new("from_stakeholder.name", "From").formatter(CellFormatter::reference(MISSING)),
        Column::new("to_stakeholder.name", "To").formatter(CellFormatter::reference(MISSING)),
        Column::new("quantity", "Quantity").formatter(CellFormatter::Integer),
        Column::new("share_class.name", "Share Class").formatter(CellFormatter::reference(MISSING)),
        Column::new("price", "Price").formatter(CellFormatter::Currency),
        id_column(),
    ]
}

pub fn funding_rounds() -> Vec<Column> {
    use BadgeVariant::*;
    vec![
        Column::new("name", "Name"),
        Column::new("type", "Type"),
        Column::new("date", "Date").formatter(CellFormatter::Date),
        Column::new("amount", "Amount").formatter(CellFormatter::Currency),
        Column::new("valuation", "Valuation").formatter(CellFormatter::Currency),
        Column::new("status", "Status")
            .formatter(badge(Default, &[("closed", Success), ("active", Warning)])),
        id_column(),
    ]
}

pub fn equity_grants() -> Vec<Column> {
    use BadgeVariant::*;
    vec![
        Column::new("recipient_id.name", "Recipient").formatter(CellFormatter::reference(MISSING)),
        Column::new("type", "Type").formatter(badge(Default, &[])),
        Column::new("quantity", "Quantity").formatter(CellFormatter::Integer),
        Column::new("grant_date", "Grant Date").formatter(CellFormatter::Date),
        Column::new("vesting_schedule", "Vesting Schedule"),
        Column::new("exercise_price", "Exercise Price").formatter(CellFormatter::Currency),
        Column::new("status", "Status")
            .formatter(badge(Error, &[("active", Success), ("exercised", Warning)])),
        id_column(),
    ]
}

pub fn compliance_records() -> Vec<Column> {
    use BadgeVariant::*;
    vec![
        Column::new("type", "Type"),
        Column::new("due_date", "Due Date").formatter(CellFormatter::Date),
        Column::new("status", "Status")
            .formatter(badge(Error, &[("completed", Success), ("pending", Warning)])),
        Column::new("description", "Description"),
        Column::new("assigned_to", "Assigned To"),
        Column::new("priority", "Priority")
            .formatter(badge(Error, &[("low", Default), ("medium", Warning)])),
        id_column(),
    ]
}
