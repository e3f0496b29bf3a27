//! Property-based test generators using proptest.
//!
//! Generated entities always satisfy their own validation rules, so
//! properties can focus on sync behavior.

use pocketsync_model::{Category, EntryType, MonthFilter, Transaction};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for entry types.
pub fn entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![
        Just(EntryType::Income),
        Just(EntryType::Expense),
        Just(EntryType::Savings),
    ]
}

/// Strategy for server-style ids (`srv_<n>`).
pub fn server_id_strategy() -> impl Strategy<Value = String> {
    (1u32..500).prop_map(|n| format!("srv_{n}"))
}

/// Strategy for positive amounts with two decimal places.
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for valid months.
pub fn month_strategy() -> impl Strategy<Value = MonthFilter> {
    (2000i32..2100, 1u8..=12).prop_map(|(year, month)| {
        MonthFilter::new(year, month).expect("Generated month is in range")
    })
}

/// Strategy for valid `YYYY-MM-DD` dates (days 1-28 so every month works).
pub fn date_strategy() -> impl Strategy<Value = String> {
    (month_strategy(), 1u8..=28).prop_map(|(month, day)| format!("{month}-{day:02}"))
}

/// Strategy for transactions with the given id.
pub fn transaction_strategy(id: String) -> impl Strategy<Value = Transaction> {
    (
        amount_strategy(),
        entry_type_strategy(),
        "[a-z]{1,8}",
        date_strategy(),
        proptest::option::of("[ -~]{0,40}"),
        0i64..2_000_000_000_000,
    )
        .prop_map(move |(amount, entry_type, category_id, date, description, created_at)| {
            Transaction {
                id: id.clone(),
                amount,
                entry_type,
                category_id,
                date,
                description,
                created_at,
            }
        })
}

/// Strategy for categories with the given id.
pub fn category_strategy(id: String) -> impl Strategy<Value = Category> {
    (
        "[A-Za-z ]{1,20}",
        entry_type_strategy(),
        any::<bool>(),
        0i64..2_000_000_000_000,
        any::<u32>(),
        proptest::option::of("[a-z_]{1,12}"),
    )
        .prop_map(move |(name, entry_type, is_active, updated_at, color, icon)| Category {
            id: id.clone(),
            name,
            entry_type,
            is_active,
            updated_at,
            color: i64::from(color),
            icon,
        })
}

/// Strategy for a batch of transactions with distinct server ids.
pub fn transaction_batch_strategy(max: usize) -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::btree_set(server_id_strategy(), 0..max).prop_flat_map(|ids| {
        ids.into_iter()
            .map(transaction_strategy)
            .collect::<Vec<_>>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_transactions_validate(txn in transaction_strategy("srv_1".into())) {
            prop_assert!(txn.validate().is_ok());
            prop_assert!(txn.month().is_some());
        }

        #[test]
        fn batches_have_distinct_ids(batch in transaction_batch_strategy(20)) {
            let mut ids: Vec<_> = batch.iter().map(|t| t.id.clone()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), batch.len());
        }
    }
}
