//! Schema and style reconciliation for geospatial layer stores.
//!
//! `layer-audit` compares the table/field definitions and cartographic
//! style assignments of a current store against a reference store and
//! produces an advisory diff report: which layers, fields and styles must
//! be added, removed or re-tagged to bring the current store into
//! alignment.
//!
//! # Architecture
//!
//! - **Stores** - `sqlx`-backed readers for the current store mirror and
//!   the reference GeoPackage: table lists, column names, raw style
//!   payloads.
//! - **Style decoders** - the reference QML document and the current
//!   store's bracket-encoded inline strings, both reduced to
//!   class-id keyed [`catalog::StyleInfo`] records.
//! - **Catalog builder** - one record per current physical table; all
//!   reference tables sharing a logical name union into one record,
//!   merging fields and per-style geometry sets across the point/line/
//!   polygon physical split.
//! - **Reconciler** - diffs the sealed catalog into report records,
//!   reconciling style geometry per axis (sign vs outline) so shared
//!   styles gain or lose individual tags.
//! - **Report** - the JSON document with closed action labels; unchanged
//!   containers are omitted.
//!
//! # Example
//!
//! ```rust,ignore
//! use layer_audit::prelude::*;
//!
//! let exceptions = ExceptionSet::load(Path::new("exceptions.txt"));
//! let catalog = CatalogBuilder::new()
//!     .build(&current_store, &reference_store, &exceptions)
//!     .await?;
//! let report = Reconciler::new().reconcile(&catalog);
//! write_report(Path::new("LayerReport.json"), &report)?;
//! ```

pub mod catalog;
pub mod error;
pub mod exceptions;
pub mod geometry;
pub mod naming;
pub mod reconcile;
pub mod report;
pub mod store;
pub mod style;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{
        CatalogBuilder, CatalogOptions, CurrentLayer, LayerCatalog, ReferenceUnion, StyleInfo,
    };
    pub use crate::error::{AuditError, Result};
    pub use crate::exceptions::ExceptionSet;
    pub use crate::geometry::{GeometrySet, GeometryType};
    pub use crate::reconcile::{Reconciler, ReconcilerOptions};
    pub use crate::report::{write_report, Action, LayerReportRecord};
    pub use crate::store::{CurrentStore, ReferenceStore};
}
