//! Terminal rendering for tables, the dashboard and notices.
//!
//! Tables go through an all-Utf8 Arrow `RecordBatch` so Arrow's pretty
//! printer handles column widths and borders.

use std::fmt::Write as _;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use vantage_core::dashboard::Dashboard;
use vantage_core::table::{BadgeVariant, Cell, format_currency, group_thousands};
use vantage_core::{Collection, Notice, NoticeLevel, References, TableView};

// ── Tables ──

/// Cell text with its badge marker, e.g. `[+] founder`.
pub fn cell_text(cell: &Cell) -> String {
    match cell.badge {
        None | Some(BadgeVariant::Default) => cell.text.clone(),
        Some(BadgeVariant::Success) => format!("[+] {}", cell.text),
        Some(BadgeVariant::Warning) => format!("[!] {}", cell.text),
        Some(BadgeVariant::Error) => format!("[x] {}", cell.text),
    }
}

/// One Utf8 column per header, one row per entry of `rows`.
pub fn text_batch(headers: &[&str], rows: &[Vec<String>]) -> Result<RecordBatch, ArrowError> {
    let fields: Vec<Field> = headers
        .iter()
        .map(|h| Field::new(*h, DataType::Utf8, false))
        .collect();
    let columns: Vec<ArrayRef> = (0..headers.len())
        .map(|i| {
            let values: Vec<String> = rows
                .iter()
                .map(|row| row.get(i).cloned().unwrap_or_default())
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> anyhow::Result<String> {
    let batch = text_batch(headers, rows)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}

/// Render a collection's rows using the view's column headers.
pub fn format_view(view: &TableView, rows: &[Vec<Cell>]) -> anyhow::Result<String> {
    let headers: Vec<&str> = view.columns().iter().map(|c| c.header.as_str()).collect();
    let text: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    format_table(&headers, &text)
}

pub fn print_view(collection: Collection, view: &TableView, rows: &[Vec<Cell>]) -> anyhow::Result<()> {
    println!("=== {} ({}) ===", collection.title(), rows.len());
    println!("{}", format_view(view, rows)?);
    Ok(())
}

// ── Notices ──

pub fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Error => eprintln!("error: {notice}"),
        NoticeLevel::Success | NoticeLevel::Info => println!("{notice}"),
    }
}

// ── Dashboard ──

fn name_or_dash(refs: &References, id: Option<&str>) -> String {
    id.and_then(|id| refs.name(Collection::Stakeholders, id))
        .unwrap_or("-")
        .to_string()
}

/// Dashboard as a grouped text card.
pub fn render_dashboard(title: &str, dash: &Dashboard, refs: &References) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {title} ===");
    let _ = writeln!(out);

    let t = &dash.totals;
    let _ = writeln!(out, "Totals");
    let _ = writeln!(out, "  {:<26} {}", "Total stakeholders", t.stakeholders);
    let _ = writeln!(out, "  {:<26} {}", "Total shares", group_thousands(t.shares));
    let _ = writeln!(out, "  {:<26} {}", "Active grants", t.active_grants);
    let _ = writeln!(out, "  {:<26} {}", "Pending compliance", t.pending_compliance);
    let _ = writeln!(out, "  {:<26} {}", "Funding raised", format_currency(t.funding_raised));
    let _ = writeln!(out);

    section(&mut out, "Share distribution", dash.distribution.is_empty());
    for slice in &dash.distribution {
        let _ = writeln!(
            out,
            "  {:<26} {:>12}  {:>5.1}%  {}",
            slice.kind.as_str(),
            group_thousands(slice.shares),
            slice.percent,
            slice.color
        );
    }
    let _ = writeln!(out);

    section(&mut out, "Funding history", dash.funding_history.is_empty());
    for point in &dash.funding_history {
        let _ = writeln!(
            out,
            "  {:<26} {}  raised {:<14} valuation {}",
            point.name,
            point.date,
            format_currency(point.amount),
            format_currency(point.valuation)
        );
    }
    let _ = writeln!(out);

    section(&mut out, "Equity grants by month", dash.grants_by_month.is_empty());
    for bucket in &dash.grants_by_month {
        let parts: Vec<String> = bucket
            .values
            .iter()
            .map(|(kind, qty)| format!("{kind} {}", group_thousands(*qty)))
            .collect();
        let _ = writeln!(out, "  {:<26} {}", bucket.month, parts.join(", "));
    }
    let _ = writeln!(out);

    section(&mut out, "Compliance status by month", dash.compliance_by_month.is_empty());
    for bucket in &dash.compliance_by_month {
        let parts: Vec<String> = bucket
            .values
            .iter()
            .map(|(status, count)| format!("{status} {count}"))
            .collect();
        let _ = writeln!(out, "  {:<26} {}", bucket.month, parts.join(", "));
    }
    let _ = writeln!(out);

    section(&mut out, "Recent transactions", dash.recent_transactions.is_empty());
    for tx in &dash.recent_transactions {
        let _ = writeln!(
            out,
            "  {} {:<10} {:>12} @ {:<8} {} -> {}",
            tx.date,
            tx.kind.as_str(),
            group_thousands(tx.quantity),
            format_currency(tx.price),
            name_or_dash(refs, tx.from_stakeholder.as_deref()),
            name_or_dash(refs, Some(tx.to_stakeholder.as_str())),
        );
    }
    let _ = writeln!(out);

    section(&mut out, "Upcoming compliance", dash.upcoming_compliance.is_empty());
    for record in &dash.upcoming_compliance {
        let _ = writeln!(
            out,
            "  {} {:<22} [{}] {}",
            record.due_date,
            record.kind,
            record.priority,
            record.description
        );
    }

    out
}

fn section(out: &mut String, header: &str, empty: bool) {
    let _ = writeln!(out, "{header}");
    if empty {
        let _ = writeln!(out, "  (none)");
    }
}
