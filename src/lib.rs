//! # Store Report Builder
//!
//! A library for reconciling period-over-period store performance metrics
//! from heterogeneous raw sources into a formatted, styled analysis report.
//!
//! ## Core Concepts
//!
//! - **Raw Records**: field-name → raw-value maps as adapters deliver them
//!   (plain scalars, localized numeric strings, or tagged-text wrappers)
//! - **Catalog**: the fixed, ordered list of business metrics a report
//!   contains, with their source-field mapping
//! - **Reconciliation**: merging current- and previous-period values into one
//!   normalized, change-annotated row per metric
//! - **Aggregation**: grouping per-transaction product records by name
//!   (sums for amount/count, first-seen conversion rate)
//! - **Rendering**: laying rows and product tables out into a styled
//!   document with deterministic color banding
//!
//! ## Example
//!
//! ```rust,ignore
//! use store_report_builder::*;
//! use chrono::NaiveDate;
//!
//! let mut source = TableSource::new("october export");
//! source.add_metrics(october, metrics_table);
//! source.add_metrics(september, previous_metrics_table);
//!
//! let builder = ReportBuilder::new().with_kind(AnalysisKind::Monthly);
//! let report = builder
//!     .generate(&source, "竞潮玩旗舰店", NaiveDate::from_ymd_opt(2025, 11, 5).unwrap(), None)
//!     .await?;
//!
//! report.document.write_json(std::fs::File::create(&report.filename)?)?;
//! ```

pub mod aggregate;
pub mod catalog;
pub mod change;
pub mod document;
pub mod error;
pub mod period;
pub mod reconcile;
pub mod render;
pub mod source;
pub mod value;

#[cfg(feature = "gemini")]
pub mod llm;

pub use aggregate::{aggregate, sort_products, AggregatedProduct, ProductRecord, SortKey};
pub use catalog::{MetricCatalog, MetricSpec};
pub use change::{percent_change, Change, Direction};
pub use document::{Cell, CellRange, CellStyle, CellValue, Document, Sheet};
pub use error::{ReportError, Result};
pub use period::*;
pub use reconcile::{reconcile, MetricRow, MISSING_MARKER};
pub use render::{report_filename, Commentary, ReportLayout, ReportRenderer};
pub use source::*;
pub use value::{normalize, FieldValue, RawRecord, RawValue, TextFragment};

use chrono::NaiveDate;
use log::{debug, info};

/// A finished report plus the presentation conventions around it.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub document: Document,
    pub filename: String,
    pub current_period: ReportPeriod,
    pub previous_period: ReportPeriod,
}

/// Orchestrates one report generation: validate the catalog, collect raw
/// inputs, reconcile, aggregate, render.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    catalog: MetricCatalog,
    kind: AnalysisKind,
    sort_key: SortKey,
    renderer: ReportRenderer,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self {
            catalog: MetricCatalog::default(),
            kind: AnalysisKind::Weekly,
            sort_key: SortKey::Amount,
            renderer: ReportRenderer::new(),
        }
    }
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: MetricCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_kind(mut self, kind: AnalysisKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_sort_key(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    pub fn with_layout(mut self, layout: ReportLayout) -> Self {
        self.renderer = ReportRenderer::with_layout(layout);
        self
    }

    /// Full pipeline against a data source. The comparison windows are the
    /// last complete week/month pair before `reference`. Fails fast on an
    /// invalid catalog and when no period yielded any metric data; partial
    /// data renders with missing markers instead of failing.
    pub async fn generate<S: StoreDataSource>(
        &self,
        source: &S,
        store_name: &str,
        reference: NaiveDate,
        commentary: Option<&Commentary>,
    ) -> Result<GeneratedReport> {
        self.catalog.validate()?;

        let (current_period, previous_period) = comparison_windows(self.kind, reference);
        info!(
            "generating report for '{}': {} vs {}",
            store_name, current_period, previous_period
        );

        let inputs =
            collect_report_inputs(source, store_name, &current_period, &previous_period).await;
        if !inputs.has_metrics() {
            return Err(ReportError::SourceError {
                name: source.name().to_string(),
                details: format!("no metric data found for store '{}'", store_name),
            });
        }

        let labels = self.kind.labels(&current_period, &previous_period);
        let document = self.assemble(store_name, &inputs, &labels, commentary)?;

        Ok(GeneratedReport {
            document,
            filename: report_filename(store_name, reference, "json"),
            current_period,
            previous_period,
        })
    }

    /// Synchronous core: reconcile, aggregate, sort and render already
    /// collected inputs.
    pub fn assemble(
        &self,
        store_name: &str,
        inputs: &ReportInputs,
        labels: &PeriodLabels,
        commentary: Option<&Commentary>,
    ) -> Result<Document> {
        self.catalog.validate()?;

        let rows = reconcile(&self.catalog, &inputs.current_metrics, &inputs.previous_metrics);
        debug!("reconciled {} metric rows", rows.len());

        let mut current_products = aggregate(&inputs.current_products);
        let mut previous_products = aggregate(&inputs.previous_products);
        sort_products(&mut current_products, self.sort_key);
        sort_products(&mut previous_products, self.sort_key);

        Ok(self.renderer.render(
            store_name,
            labels,
            &rows,
            &current_products,
            &previous_products,
            commentary,
        ))
    }
}

/// One-call wrapper with default catalog, layout and amount-descending
/// product sorting.
pub async fn generate_store_report<S: StoreDataSource>(
    source: &S,
    store_name: &str,
    kind: AnalysisKind,
    reference: NaiveDate,
) -> Result<GeneratedReport> {
    ReportBuilder::new()
        .with_kind(kind)
        .generate(source, store_name, reference, None)
        .await
}
