// Month aggregation and ordering.
//
// Groups normalized transactions by calendar (year, month) and produces one
// accumulator per distinct key: count, summed amount, and the constituent
// items in input order. Calendar fields are taken from the UTC instant, so a
// transaction at 23:30-05:00 on the last day of a month belongs to the next
// month's group.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::normalize::NormalizedTransaction;

/// Grouping key: calendar year and month (1-12) in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

/// One per distinct (year, month). Serializes to the wire shape:
/// `{"_id": {"year", "month"}, "count", "totalAmount", "items"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthGroup {
    #[serde(rename = "_id")]
    pub id: MonthKey,
    pub count: i64,
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,
    pub items: Vec<NormalizedTransaction>,
}

/// Group transactions by (year, month). Output order is unspecified; the
/// caller sorts with `sort_groups`. Two transactions share a group exactly
/// when their normalized dates share a UTC year and month.
pub fn group_by_month(
    transactions: impl IntoIterator<Item = NormalizedTransaction>,
) -> Vec<MonthGroup> {
    let mut groups: HashMap<MonthKey, MonthGroup> = HashMap::new();

    for tx in transactions {
        let key = MonthKey {
            year: tx.date.year(),
            month: tx.date.month(),
        };

        let group = groups.entry(key).or_insert_with(|| MonthGroup {
            id: key,
            count: 0,
            total_amount: 0.0,
            items: Vec::new(),
        });

        group.count += 1;
        group.total_amount += tx.amount;
        group.items.push(tx);
    }

    groups.into_values().collect()
}

/// Sort groups by year descending, month descending. Year and month are the
/// group key, so no two groups can tie; the order is total and deterministic.
pub fn sort_groups(groups: &mut [MonthGroup]) {
    groups.sort_by(|a, b| {
        b.id.year
            .cmp(&a.id.year)
            .then(b.id.month.cmp(&a.id.month))
    });
}
