//! Report records and JSON persistence.
//!
//! The report is an ordered sequence of records, one per layer with at
//! least one pending action. Containers with no change are omitted from
//! the document entirely, never emitted empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::StyleInfo;
use crate::error::{AuditError, Result};

/// Action labels of the report vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// A layer present only in the reference store.
    #[serde(rename = "Add layer")]
    AddLayer,
    /// A layer absent from the reference store, slated for deletion.
    #[serde(rename = "Remove layer")]
    RemoveLayer,
    /// Fields to add to an existing layer.
    #[serde(rename = "Add field(s)")]
    AddFields,
    /// Fields to remove from an existing layer.
    #[serde(rename = "Remove field(s)")]
    RemoveFields,
    /// Styles (or geometry tags of shared styles) to add.
    #[serde(rename = "Add style(s)")]
    AddStyles,
    /// Styles (or geometry tags of shared styles) to remove.
    #[serde(rename = "Remove style(s)")]
    RemoveStyles,
}

/// One diff entry of the report.
///
/// Keyed by the current-store physical name, or by the logical name for
/// layers present only in the reference store. A record with no actions is
/// never emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerReportRecord {
    /// Physical (or, for additions, logical) layer name.
    #[serde(rename = "LayerName")]
    pub layer_name: String,
    /// Pending actions, in classification order.
    #[serde(rename = "Actions")]
    pub actions: Vec<Action>,
    /// Fields to add, omitted when none.
    #[serde(rename = "FieldsToAdd", skip_serializing_if = "Option::is_none", default)]
    pub fields_to_add: Option<Vec<String>>,
    /// Fields to remove, omitted when none.
    #[serde(rename = "FieldsToRemove", skip_serializing_if = "Option::is_none", default)]
    pub fields_to_remove: Option<Vec<String>>,
    /// Styles to add keyed by class-id, omitted when none.
    #[serde(rename = "StylesToAdd", skip_serializing_if = "Option::is_none", default)]
    pub styles_to_add: Option<BTreeMap<String, StyleInfo>>,
    /// Styles to remove keyed by class-id, omitted when none.
    #[serde(rename = "StylesToRemove", skip_serializing_if = "Option::is_none", default)]
    pub styles_to_remove: Option<BTreeMap<String, StyleInfo>>,
}

impl LayerReportRecord {
    /// Creates an empty record for a layer.
    #[must_use]
    pub fn new(layer_name: impl Into<String>) -> Self {
        Self {
            layer_name: layer_name.into(),
            actions: Vec::new(),
            fields_to_add: None,
            fields_to_remove: None,
            styles_to_add: None,
            styles_to_remove: None,
        }
    }

    /// Creates a whole-layer removal record, with no field/style detail.
    #[must_use]
    pub fn removal(layer_name: impl Into<String>) -> Self {
        let mut record = Self::new(layer_name);
        record.actions.push(Action::RemoveLayer);
        record
    }
}

/// Serializes the report sequence to a pretty-printed JSON file.
pub fn write_report(path: &Path, records: &[LayerReportRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).map_err(|err| AuditError::ReportWrite {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(())
}
