//! Category commands.

use super::Format;
use pocketsync_engine::SyncEngine;
use pocketsync_model::{is_local_id, Category, EntryType};

/// Creates a category, locally if the server is unreachable.
pub async fn add(
    engine: &SyncEngine,
    name: String,
    entry_type: EntryType,
    color: Option<i64>,
    icon: Option<String>,
) -> Result<Category, Box<dyn std::error::Error>> {
    let mut category = Category::new(name, entry_type);
    if let Some(color) = color {
        category = category.with_color(color);
    }
    if let Some(icon) = icon {
        category = category.with_icon(icon);
    }

    let saved = engine.categories().create(category).await?;
    if is_local_id(&saved.id) {
        println!("Saved {} locally; it will be sent on the next sync", saved.id);
    } else {
        println!("Created {}", saved.id);
    }
    Ok(saved)
}

/// Lists categories by name.
pub fn list(engine: &SyncEngine, all: bool, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let mut categories: Vec<Category> = engine
        .categories()
        .active()?
        .into_iter()
        .filter(|category| all || category.is_active)
        .collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&categories)?),
        Format::Text => {
            if categories.is_empty() {
                println!("No categories");
            }
            for category in &categories {
                let inactive = if category.is_active { "" } else { " (inactive)" };
                println!(
                    "{:<20} {:<8} {}{}",
                    category.name, category.entry_type, category.id, inactive
                );
            }
        }
    }
    Ok(())
}

/// Deletes categories, marking them for the next sync if offline.
pub async fn remove(engine: &SyncEngine, ids: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match ids {
        [id] => engine.categories().delete(id).await?,
        _ => engine.categories().delete_many(ids).await?,
    }
    println!("Removed {} categor{}", ids.len(), if ids.len() == 1 { "y" } else { "ies" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::offline_engine;

    #[tokio::test]
    async fn offline_categories_are_kept_and_removed_together() {
        let (engine, _dir) = offline_engine();
        let food = add(&engine, "Food".into(), EntryType::Expense, Some(0xff00ff), None)
            .await
            .unwrap();
        let pay = add(&engine, "Pay".into(), EntryType::Income, None, Some("wallet".into()))
            .await
            .unwrap();
        assert_eq!(food.color, 0xff00ff);
        assert_eq!(pay.icon.as_deref(), Some("wallet"));
        assert_eq!(engine.categories().active().unwrap().len(), 2);

        remove(&engine, &[food.id, pay.id]).await.unwrap();

        assert!(engine.categories().active().unwrap().is_empty());
        assert_eq!(
            engine.store().categories().counts().unwrap().pending_delete,
            2
        );
    }
}
