// Query facade.
//
// Wires extraction, normalization, grouping, and ordering into the two
// entry points the HTTP surface exposes. Every failure crosses this boundary
// as a QueryError variant; nothing escapes untyped.

use anyhow::{Context, Result};
use thiserror::Error;

use crate::aggregate::{group_by_month, sort_groups, MonthGroup};
use crate::extract::flatten_transactions;
use crate::normalize::{normalize, NormalizedTransaction};
use crate::store::{get_account, get_all_accounts, Account, Store, StoreError};

#[derive(Debug, Error)]
pub enum QueryError {
    /// Storage connection not established or lost. Retryable.
    #[error("storage unavailable")]
    StorageUnavailable,

    /// Caller-supplied account key fails shape validation.
    #[error("invalid account key")]
    InvalidIdentifier,

    /// Well-formed key with no matching account.
    #[error("account not found")]
    AccountNotFound,

    /// Unexpected failure during extraction, normalization, or grouping.
    /// The detail is for logs, never for the response body.
    #[error(transparent)]
    Aggregation(#[from] anyhow::Error),
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotReady => QueryError::StorageUnavailable,
            StoreError::Backend(e) => QueryError::Aggregation(e),
        }
    }
}

/// External keys are 24 hex characters, case-insensitive.
pub fn is_valid_account_key(key: &str) -> bool {
    key.len() == 24 && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// Extract, normalize, group, and order. A transaction whose date cannot be
/// normalized fails the whole query: dropping it silently would make count
/// and totalAmount wrong with no signal to the caller.
fn run_pipeline(accounts: &[Account]) -> Result<Vec<MonthGroup>> {
    let normalized: Result<Vec<NormalizedTransaction>> = flatten_transactions(accounts)
        .map(|(account_id, tx)| {
            normalize(tx).with_context(|| format!("Bad transaction date in account {}", account_id))
        })
        .collect();

    let mut groups = group_by_month(normalized?);
    sort_groups(&mut groups);
    Ok(groups)
}

/// Monthly groups across every account, newest month first.
pub fn aggregate_all(store: &Store) -> Result<Vec<MonthGroup>, QueryError> {
    let accounts = store.with_conn(get_all_accounts)?;
    Ok(run_pipeline(&accounts)?)
}

/// Monthly groups for one account. The result is empty (not an error) when
/// the account exists but has no transactions.
pub fn aggregate_for_account(store: &Store, key: &str) -> Result<Vec<MonthGroup>, QueryError> {
    if !is_valid_account_key(key) {
        return Err(QueryError::InvalidIdentifier);
    }

    let account = store
        .with_conn(|conn| get_account(conn, key))?
        .ok_or(QueryError::AccountNotFound)?;

    Ok(run_pipeline(std::slice::from_ref(&account))?)
}
