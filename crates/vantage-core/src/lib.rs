pub mod columns;
pub mod dashboard;
pub mod load;
pub mod model;
pub mod notice;
pub mod session;
pub mod table;

pub use dashboard::{Collections, Dashboard};
pub use load::{LoadState, Readiness};
pub use model::{
    Collection, Company, ComplianceRecord, ComplianceStatus, EquityGrant, FundingRound,
    FundingStatus, GrantKind, GrantStatus, Priority, Record, RecordMeta, ShareClass,
    ShareTransaction, Stakeholder, StakeholderKind, TransactionKind,
};
pub use notice::{Notice, NoticeLevel};
pub use session::{AuthPolicy, Session, SessionError};
pub use table::{Column, FieldValue, References, SortDirection, SortState, TableView};
