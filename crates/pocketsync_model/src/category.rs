//! Budget categories.

use crate::entity::{new_local_id, now_millis, Entity};
use crate::transaction::EntryType;
use serde::{Deserialize, Serialize};

/// A named bucket transactions are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Server-assigned id, or a `local_` placeholder until confirmed.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Which kind of transaction this category applies to.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Inactive categories are hidden from pickers but keep their history.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Last write time in epoch millis, compared for last-write-wins.
    #[serde(default)]
    pub updated_at: i64,
    /// ARGB colour.
    #[serde(default)]
    pub color: i64,
    /// Icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Category {
    /// Creates an active category with a fresh local-only id.
    pub fn new(name: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            id: new_local_id(),
            name: name.into(),
            entry_type,
            is_active: true,
            updated_at: now_millis(),
            color: 0,
            icon: None,
        }
    }

    /// Sets the colour.
    pub fn with_color(mut self, color: i64) -> Self {
        self.color = color;
        self
    }

    /// Sets the icon name.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Stamps `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at);
    }
}

impl Entity for Category {
    const COLLECTION: &'static str = "categories";
    const KIND: &'static str = "category";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    /// Last write wins: a remote snapshot only replaces a local row that is
    /// not newer than it.
    fn supersedes(&self, local: &Self) -> bool {
        self.updated_at >= local.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(updated_at: i64) -> Category {
        Category {
            id: "A".into(),
            name: "Groceries".into(),
            entry_type: EntryType::Expense,
            is_active: true,
            updated_at,
            color: 0xFF00FF00,
            icon: Some("cart".into()),
        }
    }

    #[test]
    fn newer_remote_supersedes_local() {
        assert!(category(200).supersedes(&category(100)));
        assert!(category(100).supersedes(&category(100)));
        assert!(!category(100).supersedes(&category(200)));
    }

    #[test]
    fn json_round_trip_uses_wire_names() {
        let json = serde_json::to_value(category(5)).unwrap();
        assert_eq!(json["type"], "EXPENSE");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["updatedAt"], 5);
        assert_eq!(json["icon"], "cart");
    }

    #[test]
    fn json_defaults_missing_optional_fields() {
        let parsed: Category =
            serde_json::from_str(r#"{"id":"c1","name":"Rent","type":"EXPENSE","extra":[1,2]}"#)
                .unwrap();
        assert!(parsed.is_active);
        assert_eq!(parsed.updated_at, 0);
        assert_eq!(parsed.icon, None);
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut future = category(i64::MAX - 1);
        future.touch();
        assert_eq!(future.updated_at, i64::MAX - 1);

        let mut past = category(1);
        past.touch();
        assert!(past.updated_at > 1);
    }
}
