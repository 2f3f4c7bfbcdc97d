//! Reconciliation engine.
//!
//! Compares every current layer against the reference unions and classifies
//! each discrepancy into report actions: whole layers to add or remove,
//! fields to add or remove, and styles to add or remove. Style changes are
//! evaluated per geometry axis (sign vs outline) rather than whole-entry,
//! so a style shared by both stores can gain or lose individual geometry
//! tags. The engine is pure: anomalies resolve to dropped or merged data,
//! never to an error.

use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::{CurrentLayer, LayerCatalog, ReferenceUnion, StyleInfo};
use crate::geometry::{outline_tags, GeometrySet, GeometryType};
use crate::report::{Action, LayerReportRecord};

/// Options for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    /// Synthetic geometry column, never proposed for addition.
    pub geometry_column: String,
    /// Synthetic primary-key column, never proposed for removal.
    pub primary_key_column: String,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            geometry_column: "geom".to_string(),
            primary_key_column: "ID".to_string(),
        }
    }
}

impl ReconcilerOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Diffs a layer catalog into a sequence of report records.
#[derive(Debug, Default)]
pub struct Reconciler {
    options: ReconcilerOptions,
}

impl Reconciler {
    /// Creates a reconciler with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reconciler with custom options.
    #[must_use]
    pub fn with_options(options: ReconcilerOptions) -> Self {
        Self { options }
    }

    /// Produces the report sequence for a sealed catalog.
    ///
    /// Order: current-only layers first (enumeration order), then every
    /// reference union (enumeration order). A union is matched against the
    /// first current layer sharing its logical name. Layers identical to
    /// their reference counterpart produce no record.
    #[must_use]
    pub fn reconcile(&self, catalog: &LayerCatalog) -> Vec<LayerReportRecord> {
        let mut report = Vec::new();

        for layer in &catalog.current {
            if catalog.reference.iter().all(|union| union.name != layer.name) {
                debug!("layer '{}' absent from reference", layer.physical_name);
                report.push(LayerReportRecord::removal(layer.physical_name.clone()));
            }
        }

        for union in &catalog.reference {
            match catalog.current.iter().find(|layer| layer.name == union.name) {
                None => report.push(add_layer_record(union)),
                Some(layer) => {
                    if let Some(record) = self.diff_layer(layer, union) {
                        report.push(record);
                    }
                }
            }
        }

        report
    }

    /// Compares one matched pairing; `None` when already reconciled.
    fn diff_layer(&self, layer: &CurrentLayer, union: &ReferenceUnion) -> Option<LayerReportRecord> {
        let fields_to_add = self.fields_to_add(layer, union);
        let fields_to_remove = self.fields_to_remove(layer, union);
        let (styles_to_add, styles_to_remove) = diff_styles(&layer.styles, &union.styles);

        let mut record = LayerReportRecord::new(layer.physical_name.clone());
        if !fields_to_add.is_empty() {
            record.actions.push(Action::AddFields);
            record.fields_to_add = Some(fields_to_add);
        }
        if !fields_to_remove.is_empty() {
            record.actions.push(Action::RemoveFields);
            record.fields_to_remove = Some(fields_to_remove);
        }
        if !styles_to_add.is_empty() {
            record.actions.push(Action::AddStyles);
            record.styles_to_add = Some(styles_to_add);
        }
        if !styles_to_remove.is_empty() {
            record.actions.push(Action::RemoveStyles);
            record.styles_to_remove = Some(styles_to_remove);
        }

        if record.actions.is_empty() {
            None
        } else {
            Some(record)
        }
    }

    /// Reference fields missing from the current layer, in reference order.
    /// The synthetic geometry and empty-name columns are never proposed.
    fn fields_to_add(&self, layer: &CurrentLayer, union: &ReferenceUnion) -> Vec<String> {
        union
            .fields
            .iter()
            .filter(|field| {
                !layer.fields.contains(field)
                    && field.as_str() != self.options.geometry_column
                    && !field.is_empty()
            })
            .cloned()
            .collect()
    }

    /// Current fields missing from the union, in current order. The
    /// synthetic primary-key and geometry columns are never proposed.
    fn fields_to_remove(&self, layer: &CurrentLayer, union: &ReferenceUnion) -> Vec<String> {
        layer
            .fields
            .iter()
            .filter(|field| {
                !union.fields.contains(field)
                    && field.as_str() != self.options.primary_key_column
                    && field.as_str() != self.options.geometry_column
                    && !field.is_empty()
            })
            .cloned()
            .collect()
    }
}

/// Record for a layer present only in the reference store.
fn add_layer_record(union: &ReferenceUnion) -> LayerReportRecord {
    let mut record = LayerReportRecord::new(union.name.clone());
    record.actions.push(Action::AddLayer);
    if !union.fields.is_empty() {
        record.actions.push(Action::AddFields);
        record.fields_to_add = Some(union.fields.clone());
    }
    if !union.styles.is_empty() {
        record.actions.push(Action::AddStyles);
        record.styles_to_add = Some(union.styles.clone());
    }
    record
}

/// Per-class-id style reconciliation for one layer pairing.
///
/// A class-id present on only one side moves wholesale; a shared class-id
/// goes through per-axis geometry reconciliation, with partial changes on
/// the same id accumulating into a single add and/or remove entry.
fn diff_styles(
    current: &BTreeMap<String, StyleInfo>,
    reference: &BTreeMap<String, StyleInfo>,
) -> (BTreeMap<String, StyleInfo>, BTreeMap<String, StyleInfo>) {
    let mut to_add = BTreeMap::new();
    let mut to_remove = BTreeMap::new();

    for (class_id, style) in current {
        if !reference.contains_key(class_id) {
            to_remove.insert(class_id.clone(), style.clone());
        }
    }

    for (class_id, ref_style) in reference {
        match current.get(class_id) {
            None => {
                to_add.insert(class_id.clone(), ref_style.clone());
            }
            Some(cur_style) => {
                let delta = reconcile_geometry(&cur_style.geometry, &ref_style.geometry);
                if !delta.add.is_empty() {
                    merge_delta(&mut to_add, class_id, &ref_style.name, delta.add);
                }
                if !delta.remove.is_empty() {
                    merge_delta(&mut to_remove, class_id, &cur_style.name, delta.remove);
                }
            }
        }
    }

    (to_add, to_remove)
}

/// Tag-level changes for one shared class-id.
#[derive(Debug, Default, PartialEq, Eq)]
struct GeometryDelta {
    add: GeometrySet,
    remove: GeometrySet,
}

/// Reconciles a current geometry set against the reference set, one axis
/// at a time.
///
/// Sign axis: the `Point` tag moves independently in either direction.
/// Outline axis: when the reference has no outline representation, every
/// outline tag the current side holds is removed as one entry; otherwise
/// each outline tag the reference holds and the current side lacks is
/// added. An axis held in common contributes nothing.
fn reconcile_geometry(current: &GeometrySet, reference: &GeometrySet) -> GeometryDelta {
    let mut delta = GeometryDelta::default();

    let cur_sign = current.contains(&GeometryType::Point);
    let ref_sign = reference.contains(&GeometryType::Point);
    if ref_sign && !cur_sign {
        delta.add.insert(GeometryType::Point);
    }
    if cur_sign && !ref_sign {
        delta.remove.insert(GeometryType::Point);
    }

    let cur_outline = outline_tags(current);
    let ref_outline = outline_tags(reference);
    if ref_outline.is_empty() {
        delta.remove.extend(cur_outline);
    } else {
        delta.add.extend(ref_outline.difference(&cur_outline));
    }

    delta
}

/// Accumulates axis changes into the existing entry for a class-id.
fn merge_delta(
    map: &mut BTreeMap<String, StyleInfo>,
    class_id: &str,
    name: &str,
    tags: GeometrySet,
) {
    map.entry(class_id.to_string())
        .or_insert_with(|| StyleInfo::new(name, GeometrySet::new()))
        .geometry
        .extend(tags);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryType::{Line, Point, Polygon};

    fn style(name: &str, tags: &[GeometryType]) -> StyleInfo {
        StyleInfo::new(name, tags.iter().copied().collect())
    }

    fn layer(name: &str, physical: &str, fields: &[&str]) -> CurrentLayer {
        CurrentLayer {
            name: name.to_string(),
            physical_name: physical.to_string(),
            fields: fields.iter().map(ToString::to_string).collect(),
            styles: BTreeMap::new(),
        }
    }

    fn union(name: &str, fields: &[&str]) -> ReferenceUnion {
        ReferenceUnion {
            name: name.to_string(),
            fields: fields.iter().map(ToString::to_string).collect(),
            styles: BTreeMap::new(),
        }
    }

    fn reconcile(catalog: &LayerCatalog) -> Vec<LayerReportRecord> {
        Reconciler::new().reconcile(catalog)
    }

    #[test]
    fn test_current_only_layer_is_removed_wholesale() {
        let catalog = LayerCatalog {
            current: vec![layer("OLD", "OLD", &["ID", "NAME"])],
            reference: Vec::new(),
        };

        let report = reconcile(&catalog);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].layer_name, "OLD");
        assert_eq!(report[0].actions, vec![Action::RemoveLayer]);
        assert!(report[0].fields_to_add.is_none());
        assert!(report[0].fields_to_remove.is_none());
        assert!(report[0].styles_to_add.is_none());
        assert!(report[0].styles_to_remove.is_none());
    }

    #[test]
    fn test_reference_only_layer_is_added_with_fields_and_styles() {
        let mut reference = union("RIVERS", &["NAME", "FLOW"]);
        reference
            .styles
            .insert("3".to_string(), style("Creek", &[Line, Polygon]));
        let catalog = LayerCatalog {
            current: Vec::new(),
            reference: vec![reference],
        };

        let report = reconcile(&catalog);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].layer_name, "RIVERS");
        assert_eq!(
            report[0].actions,
            vec![Action::AddLayer, Action::AddFields, Action::AddStyles]
        );
        assert_eq!(
            report[0].fields_to_add.as_deref(),
            Some(["NAME".to_string(), "FLOW".to_string()].as_slice())
        );
        let styles = report[0].styles_to_add.as_ref().unwrap();
        assert_eq!(styles["3"].geometry, [Line, Polygon].into());
    }

    #[test]
    fn test_reference_only_layer_without_detail_gets_add_layer_only() {
        let catalog = LayerCatalog {
            current: Vec::new(),
            reference: vec![union("EMPTY", &[])],
        };

        let report = reconcile(&catalog);
        assert_eq!(report[0].actions, vec![Action::AddLayer]);
        assert!(report[0].fields_to_add.is_none());
        assert!(report[0].styles_to_add.is_none());
    }

    #[test]
    fn test_identical_layers_produce_no_record() {
        let mut current = layer("ROADS", "tpAcualROADS", &["ID", "NAME"]);
        current
            .styles
            .insert("1".to_string(), style("Paved", &[Line, Polygon]));
        let mut reference = union("ROADS", &["ID", "NAME"]);
        reference
            .styles
            .insert("1".to_string(), style("Paved", &[Line, Polygon]));
        let catalog = LayerCatalog {
            current: vec![current],
            reference: vec![reference],
        };

        assert!(reconcile(&catalog).is_empty());
    }

    #[test]
    fn test_synthetic_columns_are_excluded_both_ways() {
        // geom/"" never proposed for addition even if only the reference
        // lists them; ID/geom never proposed for removal.
        let current = layer("ROADS", "tpAcualROADS", &["ID", "NAME", "geom"]);
        let reference = union("ROADS", &["NAME", "geom", ""]);
        let catalog = LayerCatalog {
            current: vec![current],
            reference: vec![reference],
        };

        assert!(reconcile(&catalog).is_empty());
    }

    #[test]
    fn test_field_diff_orders_follow_enumeration() {
        let current = layer("ROADS", "tpAcualROADS", &["ID", "OBSOLETE", "NAME", "LEGACY"]);
        let reference = union("ROADS", &["NAME", "WIDTH", "LANES"]);
        let catalog = LayerCatalog {
            current: vec![current],
            reference: vec![reference],
        };

        let report = reconcile(&catalog);
        assert_eq!(
            report[0].fields_to_add.as_deref(),
            Some(["WIDTH".to_string(), "LANES".to_string()].as_slice())
        );
        assert_eq!(
            report[0].fields_to_remove.as_deref(),
            Some(["OBSOLETE".to_string(), "LEGACY".to_string()].as_slice())
        );
        assert_eq!(
            report[0].actions,
            vec![Action::AddFields, Action::RemoveFields]
        );
    }

    #[test]
    fn test_axis_independence_of_style_deltas() {
        // The shared outline axis must not appear in either delta when only
        // the sign axis differs.
        let mut current = layer("ROADS", "tpAcualROADS", &["ID"]);
        current
            .styles
            .insert("1".to_string(), style("Paved", &[Line, Polygon]));
        let mut reference = union("ROADS", &[]);
        reference
            .styles
            .insert("1".to_string(), style("Paved", &[Point, Line, Polygon]));
        let catalog = LayerCatalog {
            current: vec![current],
            reference: vec![reference],
        };

        let report = reconcile(&catalog);
        let styles = report[0].styles_to_add.as_ref().unwrap();
        assert_eq!(styles["1"].geometry, [Point].into());
        assert!(report[0].styles_to_remove.is_none());
    }

    #[test]
    fn test_outline_pair_removed_when_reference_has_none() {
        let mut current = layer("ROADS", "tpAcualROADS", &["ID"]);
        current
            .styles
            .insert("1".to_string(), style("Paved", &[Line, Polygon]));
        let mut reference = union("ROADS", &[]);
        reference.styles.insert("1".to_string(), style("Paved", &[Point]));
        let catalog = LayerCatalog {
            current: vec![current],
            reference: vec![reference],
        };

        let report = reconcile(&catalog);
        let to_remove = report[0].styles_to_remove.as_ref().unwrap();
        assert_eq!(to_remove["1"].geometry, [Line, Polygon].into());
        let to_add = report[0].styles_to_add.as_ref().unwrap();
        assert_eq!(to_add["1"].geometry, [Point].into());
    }

    #[test]
    fn test_sign_to_outline_swap_accumulates_per_entry() {
        // A sign-only current style against an outline-only reference style
        // yields one remove entry (Point) and one add entry (Line).
        let mut current = layer("ROADS", "tpAcualROADS", &["ID"]);
        current.styles.insert("1".to_string(), style("Paved", &[Point]));
        let mut reference = union("ROADS", &[]);
        reference.styles.insert("1".to_string(), style("Paved", &[Line]));
        let catalog = LayerCatalog {
            current: vec![current],
            reference: vec![reference],
        };

        let report = reconcile(&catalog);
        assert_eq!(
            report[0].styles_to_add.as_ref().unwrap()["1"].geometry,
            [Line].into()
        );
        assert_eq!(
            report[0].styles_to_remove.as_ref().unwrap()["1"].geometry,
            [Point].into()
        );
        assert_eq!(
            report[0].actions,
            vec![Action::AddStyles, Action::RemoveStyles]
        );
    }

    #[test]
    fn test_current_only_class_id_removed_with_its_set() {
        let mut current = layer("ROADS", "tpAcualROADS", &["ID"]);
        current.styles.insert("9".to_string(), style("Gone", &[Point]));
        let catalog = LayerCatalog {
            current: vec![current],
            reference: vec![union("ROADS", &[])],
        };

        let report = reconcile(&catalog);
        let to_remove = report[0].styles_to_remove.as_ref().unwrap();
        assert_eq!(to_remove["9"].geometry, [Point].into());
        assert!(report[0].styles_to_add.is_none());
    }

    #[test]
    fn test_end_to_end_roads_scenario() {
        let mut current = layer("ROADS", "ROADS", &["ID", "NAME", "geom"]);
        current.styles.insert("1".to_string(), style("Paved", &[Line]));
        let mut reference = union("ROADS", &["NAME", "WIDTH"]);
        reference
            .styles
            .insert("1".to_string(), style("Paved", &[Line, Polygon]));
        reference.styles.insert("2".to_string(), style("Dirt", &[Point]));
        let catalog = LayerCatalog {
            current: vec![current],
            reference: vec![reference],
        };

        let report = reconcile(&catalog);
        assert_eq!(report.len(), 1);
        let record = &report[0];
        assert_eq!(
            record.fields_to_add.as_deref(),
            Some(["WIDTH".to_string()].as_slice())
        );
        assert!(record.fields_to_remove.is_none());
        let to_add = record.styles_to_add.as_ref().unwrap();
        assert_eq!(to_add["1"].name, "Paved");
        assert_eq!(to_add["1"].geometry, [Polygon].into());
        assert_eq!(to_add["2"].name, "Dirt");
        assert_eq!(to_add["2"].geometry, [Point].into());
        assert!(record.styles_to_remove.is_none());
        assert_eq!(record.actions, vec![Action::AddFields, Action::AddStyles]);
    }

    #[test]
    fn test_output_order_removals_then_reference_order() {
        let catalog = LayerCatalog {
            current: vec![
                layer("OLD", "tpAcualOLD", &["ID"]),
                layer("ROADS", "tpAcualROADS", &["ID", "EXTRA"]),
            ],
            reference: vec![union("ROADS", &[]), union("RIVERS", &["NAME"])],
        };

        let report = reconcile(&catalog);
        let names: Vec<&str> = report.iter().map(|r| r.layer_name.as_str()).collect();
        assert_eq!(names, vec!["tpAcualOLD", "tpAcualROADS", "RIVERS"]);
    }

    #[test]
    fn test_union_matches_first_current_layer() {
        // The actual-representation table shadows the planned one.
        let catalog = LayerCatalog {
            current: vec![
                layer("ROADS", "tpAcualROADS", &["ID"]),
                layer("ROADS", "tpPlanROADS", &["ID", "EXTRA"]),
            ],
            reference: vec![union("ROADS", &[])],
        };

        let report = reconcile(&catalog);
        // The first layer is identical; the planned one is shadowed.
        assert!(report.is_empty());
    }

    #[test]
    fn test_reconcile_geometry_no_change() {
        let set: GeometrySet = [Point, Line].into();
        assert_eq!(reconcile_geometry(&set, &set), GeometryDelta::default());
    }

    #[test]
    fn test_reconcile_geometry_partial_outline_removed_wholesale() {
        // A lone outline tag on the current side is still removed as one
        // entry when the reference has no outline representation.
        let current: GeometrySet = [Line].into();
        let reference: GeometrySet = [Point].into();
        let delta = reconcile_geometry(&current, &reference);
        assert_eq!(delta.remove, [Line].into());
        assert_eq!(delta.add, [Point].into());
    }
}
