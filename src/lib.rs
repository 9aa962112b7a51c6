// Monthly Transaction Summary - Core Library
// Exposes the aggregation pipeline for use by the API server and tests.

pub mod aggregate;
pub mod extract;
pub mod normalize;
pub mod query;
pub mod store;

// Re-export commonly used types
pub use aggregate::{group_by_month, sort_groups, MonthGroup, MonthKey};
pub use extract::flatten_transactions;
pub use normalize::{normalize, normalize_date, DateError, DateValue, NormalizedTransaction};
pub use query::{aggregate_all, aggregate_for_account, is_valid_account_key, QueryError};
pub use store::{
    get_account, get_all_accounts, insert_account, setup_database, Account, Store, StoreError,
    StoreState, Transaction,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
