//! # Domain Types
//!
//! Entity types shared by the local cache, the sync engine, and the remote
//! service boundary.
//!
//! ## Identity
//! Every entity carries an opaque `id` string. Ids are UUID v4, generated
//! client-side when an entity is created offline and kept verbatim when the
//! remote service assigns them. Client generation is what makes offline
//! creation safe: no coordination is needed for uniqueness.
//!
//! ## Timestamps
//! `created_at`/`updated_at` are UTC timestamps owned by the entity itself.
//! `updated_at` is refreshed on every mutation (local or remote) and is the
//! sole tie-breaker for item conflicts, compared as milliseconds since epoch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Measurement Unit
// =============================================================================

/// Measurement unit for a shopping item amount.
///
/// Stored and serialized as the short label the frontend shows next to the
/// amount ("2 kg", "6 pcs").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Unit {
    /// Countable pieces - the default for anything without a better fit.
    #[default]
    #[serde(rename = "pcs")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pcs"))]
    Pieces,

    #[serde(rename = "g")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "g"))]
    Grams,

    #[serde(rename = "kg")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "kg"))]
    Kilograms,

    #[serde(rename = "ml")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ml"))]
    Milliliters,

    #[serde(rename = "l")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "l"))]
    Liters,

    #[serde(rename = "pack")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pack"))]
    Packs,

    #[serde(rename = "can")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "can"))]
    Cans,

    #[serde(rename = "bottle")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "bottle"))]
    Bottles,
}

impl Unit {
    /// Returns the short label used in serialization and display.
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Pieces => "pcs",
            Unit::Grams => "g",
            Unit::Kilograms => "kg",
            Unit::Milliliters => "ml",
            Unit::Liters => "l",
            Unit::Packs => "pack",
            Unit::Cans => "can",
            Unit::Bottles => "bottle",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Unit {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pcs" | "pc" | "piece" | "pieces" => Ok(Unit::Pieces),
            "g" | "gram" | "grams" => Ok(Unit::Grams),
            "kg" | "kilogram" | "kilograms" => Ok(Unit::Kilograms),
            "ml" => Ok(Unit::Milliliters),
            "l" | "liter" | "liters" | "litre" | "litres" => Ok(Unit::Liters),
            "pack" | "packs" => Ok(Unit::Packs),
            "can" | "cans" => Ok(Unit::Cans),
            "bottle" | "bottles" => Ok(Unit::Bottles),
            other => Err(crate::error::CoreError::UnknownUnit(other.to_string())),
        }
    }
}

// =============================================================================
// Shopping List
// =============================================================================

/// A shopping list owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShoppingList {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owner of the list; all remote queries are scoped to this user.
    pub owner_id: String,

    /// Display name.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// Archived lists are kept but hidden from the default view.
    pub is_archived: bool,

    /// User-defined category display order, set by drag-reorder.
    /// `None` until the user reorders for the first time.
    pub category_order: Option<Vec<String>>,

    /// Whether the list is shared with other users.
    pub is_shared: bool,

    /// Share code handed out when the list is shared.
    pub share_code: Option<String>,

    /// User who originally created the list (may differ from owner for
    /// shared lists).
    pub created_by: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation; the sole conflict tie-breaker.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ShoppingList {
    /// Merges the provided patch fields onto this list.
    ///
    /// Fields absent from the patch keep their current value. Does not touch
    /// `updated_at`; callers re-stamp it after applying.
    pub fn apply(&mut self, patch: &ListPatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(ref description) = patch.description {
            self.description = Some(description.clone());
        }
        if let Some(is_archived) = patch.is_archived {
            self.is_archived = is_archived;
        }
        if let Some(is_shared) = patch.is_shared {
            self.is_shared = is_shared;
        }
        if let Some(ref share_code) = patch.share_code {
            self.share_code = Some(share_code.clone());
        }
        if let Some(ref order) = patch.category_order {
            self.category_order = Some(order.clone());
        }
    }
}

// =============================================================================
// Shopping Item
// =============================================================================

/// A single entry on a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShoppingItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The list this item belongs to. Every item belongs to exactly one list.
    pub list_id: String,

    /// Display name ("Milk").
    pub name: String,

    /// Quantity; must be positive.
    pub amount: f64,

    /// Measurement unit for the amount.
    pub unit: Unit,

    /// Free-form grouping label used for display sorting.
    pub category: String,

    /// Optional free-form notes.
    pub notes: Option<String>,

    /// Optional reference to an uploaded image.
    pub image_url: Option<String>,

    /// Whether the item has been ticked off.
    pub is_checked: bool,

    /// Explicit ordering within the item's category.
    pub position: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation; the sole conflict tie-breaker.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ShoppingItem {
    /// Merges the provided patch fields onto this item.
    ///
    /// Fields absent from the patch keep their current value. Does not touch
    /// `updated_at`; callers re-stamp it after applying.
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(ref category) = patch.category {
            self.category = category.clone();
        }
        if let Some(ref notes) = patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(ref image_url) = patch.image_url {
            self.image_url = Some(image_url.clone());
        }
        if let Some(is_checked) = patch.is_checked {
            self.is_checked = is_checked;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
    }
}

// =============================================================================
// Input Shapes
// =============================================================================

/// Input for creating a list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewList {
    /// Caller-provided id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Input for creating an item. Optional fields get defaulted at creation:
/// amount 1, unit pcs, category "Other", unchecked, position 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewItem {
    /// Caller-provided id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub list_id: String,

    pub name: String,

    #[serde(default)]
    pub amount: Option<f64>,

    #[serde(default)]
    pub unit: Option<Unit>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub is_checked: Option<bool>,

    #[serde(default)]
    pub position: Option<i64>,
}

/// Partial update for a list. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ListPatch {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub is_archived: Option<bool>,

    #[serde(default)]
    pub is_shared: Option<bool>,

    #[serde(default)]
    pub share_code: Option<String>,

    #[serde(default)]
    pub category_order: Option<Vec<String>>,
}

impl ListPatch {
    /// Patch that only replaces the category display order.
    pub fn category_order(order: Vec<String>) -> Self {
        ListPatch {
            category_order: Some(order),
            ..Default::default()
        }
    }
}

/// Whole-record patch, used when a pending local edit is (re-)submitted
/// during push: resolution is never field-level, so the full record goes out.
impl From<&ShoppingList> for ListPatch {
    fn from(list: &ShoppingList) -> Self {
        ListPatch {
            name: Some(list.name.clone()),
            description: list.description.clone(),
            is_archived: Some(list.is_archived),
            is_shared: Some(list.is_shared),
            share_code: list.share_code.clone(),
            category_order: list.category_order.clone(),
        }
    }
}

/// Partial update for an item. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub amount: Option<f64>,

    #[serde(default)]
    pub unit: Option<Unit>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub is_checked: Option<bool>,

    #[serde(default)]
    pub position: Option<i64>,
}

impl ItemPatch {
    /// Patch that only flips the checked flag.
    pub fn checked(is_checked: bool) -> Self {
        ItemPatch {
            is_checked: Some(is_checked),
            ..Default::default()
        }
    }
}

/// Whole-record patch for push resubmission; see [`ListPatch`]'s `From`.
impl From<&ShoppingItem> for ItemPatch {
    fn from(item: &ShoppingItem) -> Self {
        ItemPatch {
            name: Some(item.name.clone()),
            amount: Some(item.amount),
            unit: Some(item.unit),
            category: Some(item.category.clone()),
            notes: item.notes.clone(),
            image_url: item.image_url.clone(),
            is_checked: Some(item.is_checked),
            position: Some(item.position),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_unit_default_is_pieces() {
        assert_eq!(Unit::default(), Unit::Pieces);
        assert_eq!(Unit::default().label(), "pcs");
    }

    #[test]
    fn test_unit_roundtrip() {
        for unit in [
            Unit::Pieces,
            Unit::Grams,
            Unit::Kilograms,
            Unit::Milliliters,
            Unit::Liters,
            Unit::Packs,
            Unit::Cans,
            Unit::Bottles,
        ] {
            assert_eq!(Unit::from_str(unit.label()).unwrap(), unit);
        }
    }

    #[test]
    fn test_unit_from_str_aliases() {
        assert_eq!(Unit::from_str("pieces").unwrap(), Unit::Pieces);
        assert_eq!(Unit::from_str("Litre").unwrap(), Unit::Liters);
        assert!(Unit::from_str("bushel").is_err());
    }

    #[test]
    fn test_unit_serde_uses_short_label() {
        let json = serde_json::to_string(&Unit::Kilograms).unwrap();
        assert_eq!(json, "\"kg\"");
        let unit: Unit = serde_json::from_str("\"pcs\"").unwrap();
        assert_eq!(unit, Unit::Pieces);
    }

    #[test]
    fn test_list_apply_patch_merges_fields() {
        let mut list = ShoppingList {
            id: "l1".into(),
            owner_id: "u1".into(),
            name: "Groceries".into(),
            description: None,
            is_archived: false,
            category_order: None,
            is_shared: false,
            share_code: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        list.apply(&ListPatch {
            name: Some("Weekly Groceries".into()),
            category_order: Some(vec!["Dairy".into(), "Produce".into()]),
            ..Default::default()
        });

        assert_eq!(list.name, "Weekly Groceries");
        assert_eq!(
            list.category_order,
            Some(vec!["Dairy".to_string(), "Produce".to_string()])
        );
        // Untouched fields keep their values
        assert!(!list.is_archived);
        assert!(list.description.is_none());
    }

    #[test]
    fn test_item_apply_patch_merges_fields() {
        let mut item = ShoppingItem {
            id: "i1".into(),
            list_id: "l1".into(),
            name: "Milk".into(),
            amount: 1.0,
            unit: Unit::Pieces,
            category: "Dairy".into(),
            notes: None,
            image_url: None,
            is_checked: false,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        item.apply(&ItemPatch::checked(true));
        assert!(item.is_checked);
        assert_eq!(item.name, "Milk");

        item.apply(&ItemPatch {
            amount: Some(2.0),
            unit: Some(Unit::Liters),
            ..Default::default()
        });
        assert_eq!(item.amount, 2.0);
        assert_eq!(item.unit, Unit::Liters);
        assert!(item.is_checked);
    }
}
