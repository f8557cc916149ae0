mod backend;
mod display;
mod session_file;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::warn;
use vantage_core::table::Cell;
use vantage_core::{
    AuthPolicy, Collection, Company, ComplianceRecord, EquityGrant, FundingRound, Notice,
    ShareClass, ShareTransaction, SortDirection, SortState, Stakeholder, TableView,
};
use vantage_store::{DashboardState, PendingDelete, Repository, Workspace, seed_sample_data};

use crate::backend::Backend;

#[derive(Parser)]
#[command(name = "vantage", version, about = "Cap-table dashboard")]
struct Cli {
    /// Where the login session is kept between runs.
    #[arg(long, env = "VANTAGE_SESSION", default_value = ".vantage/session.json", global = true)]
    session_file: PathBuf,

    /// DuckDB database used when no REST endpoint is configured.
    #[arg(long, env = "VANTAGE_DB", default_value = ".vantage/vantage.duckdb", global = true)]
    db: PathBuf,

    /// PostgREST / Supabase project URL.
    #[arg(long, env = "VANTAGE_REST_URL", global = true)]
    rest_url: Option<String>,

    #[arg(long, env = "VANTAGE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List companies.
    Companies,
    /// Register a company.
    AddCompany {
        id: String,
        name: String,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
    /// Log in and select a company.
    Login {
        company: String,
        #[arg(long, short)]
        username: Option<String>,
        #[arg(long, short)]
        password: Option<String>,
    },
    Logout,
    /// Switch the active company.
    Switch { company: String },
    /// Totals, distributions and recent activity for the active company.
    Dashboard,
    /// Show one collection as a table.
    List {
        collection: Collection,
        /// Column key to sort by, e.g. `name` or `share_class.name`.
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        desc: bool,
    },
    /// Create a record from a JSON object.
    Add { collection: Collection, json: String },
    /// Delete a record after confirmation.
    Delete {
        collection: Collection,
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Replace the active company's data with the sample cap table.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let backend = Backend::open(cli.rest_url.as_deref(), cli.api_key.as_deref(), &cli.db)?;
    let session = session_file::load(&cli.session_file)?;

    match cli.command {
        Command::Companies => {
            let companies = backend.list_companies().await?;
            let current = session.company();
            let rows: Vec<Vec<String>> = companies
                .into_iter()
                .map(|c| {
                    let marker = if current == Some(c.id.as_str()) { "*" } else { "" };
                    vec![
                        marker.to_string(),
                        c.id,
                        c.name,
                        c.industry.unwrap_or_default(),
                    ]
                })
                .collect();
            println!("{}", display::format_table(&["", "Id", "Name", "Industry"], &rows)?);
        }

        Command::AddCompany {
            id,
            name,
            industry,
            description,
            website,
        } => {
            let company = backend
                .add_company(Company {
                    id,
                    name,
                    industry,
                    description,
                    website,
                })
                .await?;
            println!("Company {} ({}) added", company.name, company.id);
        }

        Command::Login {
            company,
            username,
            password,
        } => {
            let found = backend
                .company(&company)
                .await
                .with_context(|| format!("looking up company {company}"))?;
            let session = session.login(
                &auth_policy(),
                username.as_deref().unwrap_or_default(),
                password.as_deref().unwrap_or_default(),
                &found.id,
            )?;
            session_file::save(&cli.session_file, &session)?;
            println!(
                "Logged in as {} ({})",
                session.user().unwrap_or_default(),
                found.name
            );
        }

        Command::Logout => {
            session_file::log_out(&cli.session_file, session)?;
            println!("Logged out");
        }

        Command::Switch { company } => {
            let found = backend
                .company(&company)
                .await
                .with_context(|| format!("looking up company {company}"))?;
            let session = session.switch_company(&found.id)?;
            session_file::save(&cli.session_file, &session)?;
            println!("Switched to {}", found.name);
        }

        Command::Dashboard => {
            let company = backend.company(session.require_company()?).await?;
            let mut ws = Workspace::new(backend, company.id.clone());
            ws.refresh_all().await;
            match ws.dashboard() {
                DashboardState::Loading => println!("Loading..."),
                DashboardState::Failed(message) => bail!(message),
                DashboardState::Ready(dash) => {
                    print!(
                        "{}",
                        display::render_dashboard(&company.name, &dash, &ws.references())
                    );
                }
            }
        }

        Command::List {
            collection,
            sort,
            desc,
        } => {
            let company = session.require_company()?.to_string();
            let mut ws = Workspace::new(backend, company);
            ws.refresh_all().await;
            let view = ws.table_view(collection);

            let sort = sort.map(|key| {
                if !view.columns().iter().any(|c| c.key == key && c.sortable) {
                    warn!(key = %key, "not a sortable column; showing stored order");
                }
                SortState {
                    key,
                    direction: if desc {
                        SortDirection::Desc
                    } else {
                        SortDirection::Asc
                    },
                }
            });
            let rows = collection_rows(&ws, collection, &view, sort.as_ref())?;
            display::print_view(collection, &view, &rows)?;
        }

        Command::Add { collection, json } => {
            let company = session.require_company()?.to_string();
            let mut ws = Workspace::new(backend, company);
            let notice = add_record(&mut ws, collection, &json).await?;
            finish(notice)?;
        }

        Command::Delete {
            collection,
            id,
            yes,
        } => {
            let company = session.require_company()?.to_string();
            let mut ws = Workspace::new(backend, company);
            let pending = ws.request_delete(collection, id);
            if !yes && !confirm(&pending)? {
                pending.cancel();
                println!("Cancelled");
                return Ok(());
            }
            let notice = ws.delete(pending.confirm()).await;
            finish(notice)?;
        }

        Command::Seed => {
            let company = session.require_company()?;
            let summary = seed_sample_data(&backend, company).await?;
            println!(
                "Seeded {company}: {} share classes, {} stakeholders, {} transactions, \
                 {} funding rounds, {} equity grants, {} compliance records",
                summary.share_classes,
                summary.stakeholders,
                summary.transactions,
                summary.funding_rounds,
                summary.equity_grants,
                summary.compliance_records
            );
        }
    }

    Ok(())
}

/// Print a success notice; an error notice becomes the command's error.
fn finish(notice: Notice) -> anyhow::Result<()> {
    if notice.is_error() {
        bail!(notice.message);
    }
    display::print_notice(&notice);
    Ok(())
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

/// Demo credentials, overridable from the environment.
fn auth_policy() -> AuthPolicy {
    let default = AuthPolicy::default();
    AuthPolicy::new(
        std::env::var("VANTAGE_USER").unwrap_or(default.username),
        std::env::var("VANTAGE_PASSWORD").unwrap_or(default.password),
    )
}

fn confirm(pending: &PendingDelete) -> anyhow::Result<bool> {
    println!("{}", PendingDelete::TITLE);
    print!(
        "{} ({} {}) [y/N] ",
        PendingDelete::MESSAGE,
        pending.collection().noun(),
        pending.id()
    );
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn collection_rows<S: Repository>(
    ws: &Workspace<S>,
    collection: Collection,
    view: &TableView,
    sort: Option<&SortState>,
) -> anyhow::Result<Vec<Vec<Cell>>> {
    let failed = |error: Option<&str>| -> anyhow::Result<()> {
        match error {
            Some(e) => bail!("loading {collection}: {e}"),
            None => Ok(()),
        }
    };
    let rows = match collection {
        Collection::Stakeholders => {
            failed(ws.state::<Stakeholder>().error())?;
            view.rows(ws.records::<Stakeholder>(), sort)
        }
        Collection::ShareClasses => {
            failed(ws.state::<ShareClass>().error())?;
            view.rows(ws.records::<ShareClass>(), sort)
        }
        Collection::Transactions => {
            failed(ws.state::<ShareTransaction>().error())?;
            view.rows(ws.records::<ShareTransaction>(), sort)
        }
        Collection::FundingRounds => {
            failed(ws.state::<FundingRound>().error())?;
            view.rows(ws.records::<FundingRound>(), sort)
        }
        Collection::EquityGrants => {
            failed(ws.state::<EquityGrant>().error())?;
            view.rows(ws.records::<EquityGrant>(), sort)
        }
        Collection::ComplianceRecords => {
            failed(ws.state::<ComplianceRecord>().error())?;
            view.rows(ws.records::<ComplianceRecord>(), sort)
        }
    };
    Ok(rows)
}

async fn add_record<S: Repository>(
    ws: &mut Workspace<S>,
    collection: Collection,
    json: &str,
) -> anyhow::Result<Notice> {
    let context = || format!("parsing {} JSON", collection.noun());
    let notice = match collection {
        Collection::Stakeholders => {
            let record: Stakeholder = serde_json::from_str(json).with_context(context)?;
            ws.create(record).await
        }
        Collection::ShareClasses => {
            let record: ShareClass = serde_json::from_str(json).with_context(context)?;
            ws.create(record).await
        }
        Collection::Transactions => {
            let record: ShareTransaction = serde_json::from_str(json).with_context(context)?;
            ws.create(record).await
        }
        Collection::FundingRounds => {
            let record: FundingRound = serde_json::from_str(json).with_context(context)?;
            ws.create(record).await
        }
        Collection::EquityGrants => {
            let record: EquityGrant = serde_json::from_str(json).with_context(context)?;
            ws.create(record).await
        }
        Collection::ComplianceRecords => {
            let record: ComplianceRecord = serde_json::from_str(json).with_context(context)?;
            ws.create(record).await
        }
    };
    Ok(notice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use vantage_store::MemoryStore;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_collection_slugs() {
        let cli = Cli::try_parse_from(["vantage", "list", "share-classes", "--sort", "name", "--desc"])
            .unwrap();
        match cli.command {
            Command::List {
                collection,
                sort,
                desc,
            } => {
                assert_eq!(collection, Collection::ShareClasses);
                assert_eq!(sort.as_deref(), Some("name"));
                assert!(desc);
            }
            _ => panic!("expected list"),
        }
        assert!(Cli::try_parse_from(["vantage", "list", "ledgers"]).is_err());
    }

    async fn workspace() -> Workspace<MemoryStore> {
        let store = MemoryStore::new();
        store
            .add_company(Company {
                id: "acme".into(),
                name: "Acme".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        Workspace::new(store, "acme")
    }

    #[tokio::test]
    async fn add_record_parses_and_creates() {
        let mut ws = workspace().await;
        let notice = add_record(
            &mut ws,
            Collection::ComplianceRecords,
            r#"{"type":"Tax Filing","due_date":"2024-04-15","status":"pending","priority":"high"}"#,
        )
        .await
        .unwrap();
        assert_eq!(notice.message, "Compliance record added successfully");

        let view = ws.table_view(Collection::ComplianceRecords);
        let rows = collection_rows(&ws, Collection::ComplianceRecords, &view, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0].text, "Tax Filing");
    }

    #[test]
    fn error_notices_fail_the_command() {
        assert!(finish(Notice::deleted()).is_ok());
        let err = finish(Notice::delete_failed()).unwrap_err();
        assert_eq!(err.to_string(), "Error deleting item");
    }

    #[tokio::test]
    async fn add_record_rejects_bad_json() {
        let mut ws = workspace().await;
        let err = add_record(&mut ws, Collection::Stakeholders, "{").await.unwrap_err();
        assert!(err.to_string().contains("parsing stakeholder JSON"));
    }

    #[tokio::test]
    async fn rows_sorted_by_requested_key() {
        let mut ws = workspace().await;
        for name in ["Preferred B", "Common A", "common B"] {
            ws.create(ShareClass {
                name: name.into(),
                ..Default::default()
            })
            .await;
        }
        let view = ws.table_view(Collection::ShareClasses);
        let sort = SortState::ascending("name");
        let rows = collection_rows(&ws, Collection::ShareClasses, &view, Some(&sort)).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r[0].text.as_str()).collect();
        assert_eq!(names, vec!["Common A", "common B", "Preferred B"]);
    }
}
