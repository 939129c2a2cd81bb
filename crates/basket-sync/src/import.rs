//! # Bulk Import Parsing
//!
//! Export files from earlier app versions (and third-party tools) arrive in
//! several ad hoc JSON shapes. Instead of duck-typing them throughout the
//! code, the accepted shapes are a closed set of serde variants detected
//! once at this boundary and converted to one canonical form immediately.
//!
//! ## Accepted Shapes
//! ```json
//! { "name": "Groceries", "items": [...] }                 // single list
//! [ { "name": "Groceries" }, { "name": "Hardware" } ]     // array of lists
//! { "lists": [ { "name": "Groceries" } ] }                // wrapped
//! ```

use serde::Deserialize;

use basket_core::NewItem;

use crate::error::{SyncError, SyncResult};

/// Canonical import shape: one list with its items.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportList {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub items: Vec<NewItem>,
}

/// The closed set of accepted payload shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    /// A single list object.
    Single(ImportList),
    /// A bare array of lists.
    ListArray(Vec<ImportList>),
    /// Lists under a `lists` key.
    WrappedLists { lists: Vec<ImportList> },
}

/// Parses an import payload into the canonical shape.
///
/// Detection happens once, here; the rest of the code only ever sees
/// `Vec<ImportList>`.
pub fn parse_import(json: &str) -> SyncResult<Vec<ImportList>> {
    let payload: ImportPayload = serde_json::from_str(json)
        .map_err(|e| SyncError::InvalidImport(format!("unrecognized payload shape: {e}")))?;

    Ok(match payload {
        ImportPayload::Single(list) => vec![list],
        ImportPayload::ListArray(lists) => lists,
        ImportPayload::WrappedLists { lists } => lists,
    })
}
