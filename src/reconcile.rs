use crate::catalog::MetricCatalog;
use crate::change::{percent_change, Change};
use crate::value::{FieldValue, RawRecord};
use log::info;

/// Marker written into a cell when the source field held no data.
pub const MISSING_MARKER: &str = "数据缺失";

/// One reconciled report row: both period values formatted for display plus
/// the computed change.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub display_name: String,
    pub current: String,
    pub previous: String,
    pub change: Change,
    pub current_missing: bool,
    pub previous_missing: bool,
}

impl MetricRow {
    /// Change column content; a missing change degrades to the same marker
    /// as a missing value.
    pub fn change_display(&self) -> String {
        if self.change.is_missing() {
            MISSING_MARKER.to_string()
        } else {
            self.change.to_string()
        }
    }
}

/// Merges current- and previous-period raw records into one row per mapped
/// catalog entry, in catalog order. Pure over its inputs; every mapped entry
/// yields a row no matter how sparse the raw data is. Entries without a
/// source-field mapping are skipped with a diagnostic.
pub fn reconcile(
    catalog: &MetricCatalog,
    current: &RawRecord,
    previous: &RawRecord,
) -> Vec<MetricRow> {
    let mut rows = Vec::with_capacity(catalog.len());

    for spec in catalog.iter() {
        let Some(field) = spec.source_field.as_deref() else {
            info!(
                "metric '{}' has no source field mapping, skipping",
                spec.display_name
            );
            continue;
        };

        let val_current = current.field(field);
        let val_previous = previous.field(field);

        // The change compares the pre-formatting values, not the cell text.
        let change = percent_change(&val_current, &val_previous);

        rows.push(MetricRow {
            display_name: spec.display_name.clone(),
            current: format_cell(&val_current, spec.is_percentage),
            previous: format_cell(&val_previous, spec.is_percentage),
            change,
            current_missing: val_current.is_missing(),
            previous_missing: val_previous.is_missing(),
        });
    }

    rows
}

fn format_cell(value: &FieldValue, is_percentage: bool) -> String {
    if is_percentage {
        // Rate fields arrive as fractions (0.98). A non-numeric rate carries
        // nothing renderable.
        return match value.as_f64() {
            Some(v) => format!("{:.2}%", v * 100.0),
            None => MISSING_MARKER.to_string(),
        };
    }

    if value.is_missing() {
        MISSING_MARKER.to_string()
    } else {
        value.to_string()
    }
}
