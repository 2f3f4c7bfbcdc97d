//! Layer catalog: the merged view of both stores.
//!
//! The builder scans the current store (one record per physical table) and
//! the reference store (all physical tables sharing a logical name union
//! into one record), then seals the result into a [`LayerCatalog`] that the
//! reconciliation engine consumes read-only.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::exceptions::ExceptionSet;
use crate::geometry::{GeometrySet, GeometryType};
use crate::naming;
use crate::store::{CurrentStore, ReferenceStore};
use crate::style;

/// A cartographic rendering rule keyed by class-id within its layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleInfo {
    /// Display label of the style.
    #[serde(rename = "Name")]
    pub name: String,
    /// Geometry kinds the style applies to. Never empty for a stored style.
    #[serde(rename = "GeometryTypes")]
    pub geometry: GeometrySet,
}

impl StyleInfo {
    /// Creates a style entry.
    #[must_use]
    pub fn new(name: impl Into<String>, geometry: GeometrySet) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }
}

/// One physical table of the current store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentLayer {
    /// Logical name (physical name with the representation prefix stripped).
    pub name: String,
    /// Physical table name, kept for reporting.
    pub physical_name: String,
    /// Column names in enumeration order.
    pub fields: Vec<String>,
    /// Styles keyed by class-id.
    pub styles: BTreeMap<String, StyleInfo>,
}

/// One logical layer of the reference store, merged across every physical
/// table sharing its logical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceUnion {
    /// Logical name.
    pub name: String,
    /// Union of column names across contributing tables, exclusions removed.
    pub fields: Vec<String>,
    /// Styles keyed by class-id; geometry sets unioned across contributors.
    pub styles: BTreeMap<String, StyleInfo>,
}

/// Sealed output of the catalog builder.
#[derive(Debug, Clone, Default)]
pub struct LayerCatalog {
    /// Current layers in enumeration order.
    pub current: Vec<CurrentLayer>,
    /// Reference unions in first-sighting order.
    pub reference: Vec<ReferenceUnion>,
}

/// Options for the catalog builder.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Prefix of current tables holding the actual representation.
    pub actual_prefix: String,
    /// Prefix of current tables holding the planned representation.
    pub planned_prefix: String,
    /// Internal style-storage table of the reference store, never a layer.
    pub style_table: String,
    /// Attribute field carrying the style class enumeration in QML.
    pub class_field: String,
    /// Synthetic columns excluded from reference field unions.
    pub excluded_fields: Vec<String>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            actual_prefix: "tpAcual".to_string(),
            planned_prefix: "tpPlan".to_string(),
            style_table: "layer_styles".to_string(),
            class_field: "CLASSID".to_string(),
            excluded_fields: vec!["geom".to_string(), String::new()],
        }
    }
}

impl CatalogOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current-store representation prefixes.
    #[must_use]
    pub fn with_prefixes(mut self, actual: impl Into<String>, planned: impl Into<String>) -> Self {
        self.actual_prefix = actual.into();
        self.planned_prefix = planned.into();
        self
    }

    /// Sets the QML class-id attribute field name.
    #[must_use]
    pub fn with_class_field(mut self, field: impl Into<String>) -> Self {
        self.class_field = field.into();
        self
    }
}

/// Builds the layer catalog from live schema and style reads.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    options: CatalogOptions,
}

impl CatalogBuilder {
    /// Creates a builder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with custom options.
    #[must_use]
    pub fn with_options(options: CatalogOptions) -> Self {
        Self { options }
    }

    /// Scans both stores and builds the sealed catalog.
    ///
    /// Store faults propagate; decode anomalies resolve to empty or
    /// skipped contributions.
    pub async fn build(
        &self,
        current: &CurrentStore,
        reference: &ReferenceStore,
        exceptions: &ExceptionSet,
    ) -> Result<LayerCatalog> {
        let mut catalog = LayerCatalog::default();

        for prefix in [&self.options.actual_prefix, &self.options.planned_prefix] {
            for table in current.table_names(prefix).await? {
                let name = naming::strip_prefix(&table, prefix)
                    .unwrap_or(table.as_str())
                    .to_string();
                let fields = current.table_fields(&table).await?;
                let styles = collect_current_styles(&current.style_strings(&table).await?);
                debug!(
                    "current layer '{}': {} field(s), {} style(s)",
                    table,
                    fields.len(),
                    styles.len()
                );
                catalog.current.push(CurrentLayer {
                    name,
                    physical_name: table,
                    fields,
                    styles,
                });
            }
        }

        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        for table in reference.table_names(&self.options.style_table).await? {
            let logical = naming::logical_name(&table).to_string();
            let fields = reference.table_fields(&table).await?;
            let styles = self.reference_styles(reference, &table).await?;
            merge_reference_table(
                &mut catalog.reference,
                &mut index,
                logical,
                fields,
                styles,
                &self.options.excluded_fields,
            );
        }

        apply_exceptions(&mut catalog.reference, exceptions);

        Ok(catalog)
    }

    /// Decodes one reference table's style contribution.
    async fn reference_styles(
        &self,
        reference: &ReferenceStore,
        table: &str,
    ) -> Result<BTreeMap<String, StyleInfo>> {
        let hint = naming::geometry_suffix(table).and_then(GeometryType::from_suffix);
        let Some(hint) = hint else {
            warn!("reference table '{}' has no geometry suffix, skipping styles", table);
            return Ok(BTreeMap::new());
        };
        let Some(document) = reference.style_document(table).await? else {
            debug!("reference table '{}' has no style document", table);
            return Ok(BTreeMap::new());
        };
        Ok(style::decode_reference_style(
            &document,
            hint,
            &self.options.class_field,
        ))
    }
}

/// Decodes the current store's bracket-encoded style strings.
///
/// A class-id recurring within one layer unions its geometry tags;
/// undecodable strings are skipped.
fn collect_current_styles(raw: &[String]) -> BTreeMap<String, StyleInfo> {
    let mut styles: BTreeMap<String, StyleInfo> = BTreeMap::new();
    for entry in raw {
        let Some((class_id, style)) = style::decode_current_style(entry) else {
            debug!("skipping undecodable style string '{}'", entry);
            continue;
        };
        match styles.entry(class_id) {
            Entry::Occupied(mut existing) => {
                existing
                    .get_mut()
                    .geometry
                    .extend(style.geometry.iter().copied());
            }
            Entry::Vacant(slot) => {
                slot.insert(style);
            }
        }
    }
    styles
}

/// Merges one reference table into the union list.
///
/// The first sighting of a logical name creates the union; later sightings
/// union fields (exclusions removed, order preserved) and union each shared
/// class-id's geometry set. Merging is monotonic: nothing already present
/// is removed.
fn merge_reference_table(
    unions: &mut Vec<ReferenceUnion>,
    index: &mut BTreeMap<String, usize>,
    logical: String,
    fields: Vec<String>,
    styles: BTreeMap<String, StyleInfo>,
    excluded_fields: &[String],
) {
    if let Some(&position) = index.get(&logical) {
        let union = &mut unions[position];
        union_fields(&mut union.fields, fields, excluded_fields);
        for (class_id, style) in styles {
            match union.styles.entry(class_id) {
                Entry::Occupied(mut existing) => {
                    existing
                        .get_mut()
                        .geometry
                        .extend(style.geometry.iter().copied());
                }
                Entry::Vacant(slot) => {
                    slot.insert(style);
                }
            }
        }
    } else {
        let mut union = ReferenceUnion {
            name: logical.clone(),
            fields: Vec::new(),
            styles,
        };
        union_fields(&mut union.fields, fields, excluded_fields);
        index.insert(logical, unions.len());
        unions.push(union);
    }
}

/// Appends incoming fields not yet present, skipping excluded columns.
fn union_fields(existing: &mut Vec<String>, incoming: Vec<String>, excluded: &[String]) {
    for field in incoming {
        if excluded.contains(&field) || existing.contains(&field) {
            continue;
        }
        existing.push(field);
    }
}

/// Applies the exception overrides: for every union named in the set, a
/// style carrying neither outline tag gains both.
fn apply_exceptions(unions: &mut [ReferenceUnion], exceptions: &ExceptionSet) {
    for union in unions.iter_mut().filter(|u| exceptions.contains(&u.name)) {
        for style in union.styles.values_mut() {
            let has_outline = style.geometry.contains(&GeometryType::Line)
                || style.geometry.contains(&GeometryType::Polygon);
            if !has_outline {
                style.geometry.insert(GeometryType::Line);
                style.geometry.insert(GeometryType::Polygon);
            }
        }
    }
}
