//! Persistence for Vantage: the `Repository` trait, in-memory and DuckDB
//! backends, the per-company `Workspace`, and sample-data seeding.

mod error;
mod memory;
mod repository;
pub mod seed;
pub mod workspace;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use repository::Repository;
pub use seed::{SeedSummary, seed_sample_data};
pub use workspace::{ConfirmedDelete, DashboardState, PendingDelete, Tracked, Workspace};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
