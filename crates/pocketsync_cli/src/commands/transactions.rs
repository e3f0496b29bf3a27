//! Transaction commands.

use super::Format;
use pocketsync_engine::SyncEngine;
use pocketsync_model::{is_local_id, EntryType, MonthFilter, Transaction};
use rust_decimal::Decimal;
use time::OffsetDateTime;

/// Fields for a new transaction.
#[derive(Debug, Clone)]
pub struct Draft {
    /// Amount.
    pub amount: Decimal,
    /// Income, expense or savings.
    pub entry_type: EntryType,
    /// Category id.
    pub category: String,
    /// Date, today if `None`.
    pub date: Option<String>,
    /// Note.
    pub description: Option<String>,
}

impl Draft {
    fn into_transaction(self) -> Transaction {
        let date = self
            .date
            .unwrap_or_else(|| OffsetDateTime::now_utc().date().to_string());
        let transaction = Transaction::new(self.amount, self.entry_type, self.category, date);
        match self.description {
            Some(description) => transaction.with_description(description),
            None => transaction,
        }
    }
}

/// Records a transaction, locally if the server is unreachable.
pub async fn add(engine: &SyncEngine, draft: Draft) -> Result<Transaction, Box<dyn std::error::Error>> {
    let transaction = draft.into_transaction();
    transaction.validate()?;

    let saved = engine.transactions().create(transaction).await?;
    if is_local_id(&saved.id) {
        println!("Saved {} locally; it will be sent on the next sync", saved.id);
    } else {
        println!("Created {}", saved.id);
    }
    Ok(saved)
}

/// Lists transactions, newest date first.
pub fn list(
    engine: &SyncEngine,
    month: Option<MonthFilter>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut transactions = match month {
        Some(month) => engine.transactions().in_month(&month)?,
        None => engine.transactions().active()?,
    };
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&transactions)?),
        Format::Text => {
            if transactions.is_empty() {
                println!("No transactions");
            }
            for txn in &transactions {
                println!(
                    "{}  {:>12}  {:<8} {:<16} {}  {}",
                    txn.date,
                    txn.amount,
                    txn.entry_type,
                    txn.category_id,
                    txn.id,
                    txn.description.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

/// Deletes transactions, marking them for the next sync if offline.
pub async fn remove(engine: &SyncEngine, ids: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match ids {
        [id] => engine.transactions().delete(id).await?,
        _ => engine.transactions().delete_many(ids).await?,
    }
    println!("Removed {} transaction(s)", ids.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::offline_engine;
    use pocketsync_store::RowState;

    fn draft(date: &str) -> Draft {
        Draft {
            amount: Decimal::new(1250, 2),
            entry_type: EntryType::Expense,
            category: "cat_1".into(),
            date: Some(date.into()),
            description: Some("lunch".into()),
        }
    }

    #[tokio::test]
    async fn offline_add_and_remove_stay_pending() {
        let (engine, _dir) = offline_engine();

        let saved = add(&engine, draft("2025-01-15")).await.unwrap();
        assert!(is_local_id(&saved.id));
        assert_eq!(saved.description.as_deref(), Some("lunch"));
        let row = engine.store().transactions().get(&saved.id).unwrap().unwrap();
        assert_eq!(row.state, RowState::PendingCreate);

        remove(&engine, &[saved.id.clone()]).await.unwrap();
        assert!(engine.transactions().active().unwrap().is_empty());
        assert_eq!(
            engine.store().transactions().pending_deletion().unwrap(),
            vec![saved.id]
        );
    }

    #[tokio::test]
    async fn rejects_impossible_dates() {
        let (engine, _dir) = offline_engine();
        assert!(add(&engine, draft("2025-02-30")).await.is_err());
        assert!(engine.transactions().active().unwrap().is_empty());
    }

    #[test]
    fn missing_date_means_today() {
        let mut draft = draft("unused");
        draft.date = None;
        let txn = draft.into_transaction();
        assert!(txn.validate().is_ok());
    }
}
