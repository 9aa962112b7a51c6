// Transaction extraction.
//
// Flattens account records into the sequence the aggregator consumes.
// Accounts whose transactions array is absent or empty contribute nothing
// and cause no error. Pure; order preserved (accounts in input order,
// transactions in stored order).

use crate::store::{Account, Transaction};

/// Lazily flatten accounts into `(account_id, transaction)` pairs.
pub fn flatten_transactions(
    accounts: &[Account],
) -> impl Iterator<Item = (&str, &Transaction)> + '_ {
    accounts
        .iter()
        .filter_map(|account| {
            account
                .transactions
                .as_deref()
                .filter(|txs| !txs.is_empty())
                .map(|txs| (account.id.as_str(), txs))
        })
        .flat_map(|(id, txs)| txs.iter().map(move |tx| (id, tx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::DateValue;

    fn tx(kind: &str, amount: f64, date: &str) -> Transaction {
        Transaction {
            kind: kind.to_string(),
            amount,
            date: DateValue::Text(date.to_string()),
        }
    }

    fn account(id: &str, transactions: Option<Vec<Transaction>>) -> Account {
        Account {
            id: id.to_string(),
            transactions,
        }
    }

    #[test]
    fn test_skips_absent_and_empty_transaction_lists() {
        let accounts = vec![
            account("aaaaaaaaaaaaaaaaaaaaaaaa", None),
            account("bbbbbbbbbbbbbbbbbbbbbbbb", Some(vec![])),
            account(
                "cccccccccccccccccccccccc",
                Some(vec![tx("debit", 10.0, "2024-01-02")]),
            ),
        ];

        let flat: Vec<_> = flatten_transactions(&accounts).collect();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].0, "cccccccccccccccccccccccc");
        assert_eq!(flat[0].1.kind, "debit");
    }

    #[test]
    fn test_preserves_account_and_transaction_order() {
        let accounts = vec![
            account(
                "aaaaaaaaaaaaaaaaaaaaaaaa",
                Some(vec![tx("debit", 1.0, "2024-01-01"), tx("credit", 2.0, "2024-01-02")]),
            ),
            account(
                "bbbbbbbbbbbbbbbbbbbbbbbb",
                Some(vec![tx("debit", 3.0, "2024-01-03")]),
            ),
        ];

        let amounts: Vec<f64> = flatten_transactions(&accounts)
            .map(|(_, tx)| tx.amount)
            .collect();
        assert_eq!(amounts, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let accounts: Vec<Account> = vec![];
        assert_eq!(flatten_transactions(&accounts).count(), 0);
    }
}
