use crate::error::{ReportError, Result};
use crate::period::ReportPeriod;
use crate::value::{FieldValue, RawRecord};
use futures::join;
use log::{debug, warn};
use serde::Deserialize;
use std::path::Path;

const STORE_NAME_COLUMN: &str = "门店名称";
const REDEMPTION_STORE_COLUMN: &str = "核销门店";

/// Adapter contract: yields raw records for a (store, period). Transport,
/// retries and authentication are the adapter's business.
#[allow(async_fn_in_trait)]
pub trait StoreDataSource {
    /// Adapter name used in diagnostics.
    fn name(&self) -> &str;

    async fn metrics(&self, store_name: &str, period: &ReportPeriod) -> Result<RawRecord>;

    async fn products(&self, store_name: &str, period: &ReportPeriod) -> Result<Vec<RawRecord>>;
}

/// Everything a single report generation consumes from the outside world.
#[derive(Debug, Clone, Default)]
pub struct ReportInputs {
    pub current_metrics: RawRecord,
    pub previous_metrics: RawRecord,
    pub current_products: Vec<RawRecord>,
    pub previous_products: Vec<RawRecord>,
}

impl ReportInputs {
    pub fn has_metrics(&self) -> bool {
        !self.current_metrics.is_empty() || !self.previous_metrics.is_empty()
    }
}

/// Fans the four independent fetches out concurrently and joins them all.
/// A failed fetch degrades to empty data for that slot with a warning;
/// the batch is never aborted on a partial failure.
pub async fn collect_report_inputs<S: StoreDataSource>(
    source: &S,
    store_name: &str,
    current: &ReportPeriod,
    previous: &ReportPeriod,
) -> ReportInputs {
    debug!(
        "collecting report inputs for '{}' from '{}' ({} vs {})",
        store_name,
        source.name(),
        current,
        previous
    );

    let (current_metrics, previous_metrics, current_products, previous_products) = join!(
        source.metrics(store_name, current),
        source.metrics(store_name, previous),
        source.products(store_name, current),
        source.products(store_name, previous),
    );

    ReportInputs {
        current_metrics: or_empty("current metrics", current_metrics),
        previous_metrics: or_empty("previous metrics", previous_metrics),
        current_products: or_empty("current products", current_products),
        previous_products: or_empty("previous products", previous_products),
    }
}

fn or_empty<T: Default>(what: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{} fetch failed, continuing with empty data: {}", what, e);
            T::default()
        }
    }
}

/// A pre-fetched table of rows, as parsed from an exported spreadsheet or a
/// paged table query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RecordTable {
    rows: Vec<RawRecord>,
}

impl RecordTable {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self { rows }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ReportError::SourceError {
            name: path.display().to_string(),
            details: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| ReportError::SourceError {
            name: path.display().to_string(),
            details: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The column carrying store names: an exact `门店名称` header wins,
    /// otherwise the first column mentioning 门店 or 店铺.
    fn store_column(&self) -> Option<String> {
        let first = self.rows.first()?;

        for name in first.field_names() {
            if name.trim() == STORE_NAME_COLUMN {
                return Some(name.to_string());
            }
        }
        first
            .field_names()
            .find(|name| name.contains("门店") || name.contains("店铺"))
            .map(str::to_string)
    }

    /// Finds the row for a store: exact match on the trimmed name first,
    /// substring match as a fallback.
    pub fn store_record(&self, store_name: &str) -> Option<RawRecord> {
        let column = self.store_column()?;
        let wanted = store_name.trim();

        let cell_text = |row: &RawRecord| row.field(&column).to_string();

        self.rows
            .iter()
            .find(|row| cell_text(row).trim() == wanted)
            .or_else(|| self.rows.iter().find(|row| cell_text(row).contains(wanted)))
            .cloned()
    }

    /// Rows whose redemption-store column names this store exactly.
    pub fn rows_for_store(&self, store_name: &str) -> Vec<RawRecord> {
        let wanted = store_name.trim();
        self.rows
            .iter()
            .filter(|row| match row.field(REDEMPTION_STORE_COLUMN) {
                FieldValue::Missing => false,
                value => value.to_string().trim() == wanted,
            })
            .cloned()
            .collect()
    }
}

/// In-memory adapter over period-keyed tables; the shape a scraped export or
/// an uploaded file lands in after parsing.
#[derive(Debug, Clone, Default)]
pub struct TableSource {
    name: String,
    metric_tables: Vec<(ReportPeriod, RecordTable)>,
    product_tables: Vec<(ReportPeriod, RecordTable)>,
}

impl TableSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_metrics(&mut self, period: ReportPeriod, table: RecordTable) -> &mut Self {
        self.metric_tables.push((period, table));
        self
    }

    pub fn add_products(&mut self, period: ReportPeriod, table: RecordTable) -> &mut Self {
        self.product_tables.push((period, table));
        self
    }

    fn table_for<'a>(
        tables: &'a [(ReportPeriod, RecordTable)],
        period: &ReportPeriod,
    ) -> Option<&'a RecordTable> {
        tables.iter().find(|(p, _)| p == period).map(|(_, t)| t)
    }
}

impl StoreDataSource for TableSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn metrics(&self, store_name: &str, period: &ReportPeriod) -> Result<RawRecord> {
        let table = Self::table_for(&self.metric_tables, period).ok_or_else(|| {
            ReportError::SourceError {
                name: self.name.clone(),
                details: format!("no metric table covers {}", period),
            }
        })?;

        table
            .store_record(store_name)
            .ok_or_else(|| ReportError::SourceError {
                name: self.name.clone(),
                details: format!("store '{}' not found for {}", store_name, period),
            })
    }

    async fn products(&self, store_name: &str, period: &ReportPeriod) -> Result<Vec<RawRecord>> {
        let table = Self::table_for(&self.product_tables, period).ok_or_else(|| {
            ReportError::SourceError {
                name: self.name.clone(),
                details: format!("no product table covers {}", period),
            }
        })?;

        Ok(table.rows_for_store(store_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RawValue;
    use chrono::NaiveDate;
    use futures::executor::block_on;

    fn period(y: i32, m: u32) -> ReportPeriod {
        ReportPeriod {
            start: NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(y, m, 28).unwrap(),
        }
    }

    fn store_row(column: &str, store: &str, visits: i64) -> RawRecord {
        let mut row = RawRecord::new();
        row.insert(column, store);
        row.insert("门店页访问次数", visits);
        row
    }

    #[test]
    fn test_exact_store_column_wins() {
        let table = RecordTable::new(vec![store_row("门店名称", "旗舰店", 100)]);
        assert_eq!(table.store_column().as_deref(), Some("门店名称"));
    }

    #[test]
    fn test_fuzzy_store_column_fallback() {
        let table = RecordTable::new(vec![store_row("店铺名称", "旗舰店", 100)]);
        assert_eq!(table.store_column().as_deref(), Some("店铺名称"));

        let mut no_store_columns = RawRecord::new();
        no_store_columns.insert("城市", "成都");
        no_store_columns.insert("访问次数", 100i64);
        let table = RecordTable::new(vec![no_store_columns]);
        assert_eq!(table.store_column(), None);
    }

    #[test]
    fn test_exact_row_match_beats_substring() {
        let table = RecordTable::new(vec![
            store_row("门店名称", "竞潮玩旗舰店二号", 1),
            store_row("门店名称", "竞潮玩旗舰店", 2),
        ]);

        let record = table.store_record("竞潮玩旗舰店").unwrap();
        assert_eq!(record.field("门店页访问次数"), FieldValue::Int(2));
    }

    #[test]
    fn test_substring_fallback_when_no_exact_match() {
        let table = RecordTable::new(vec![store_row("门店名称", "竞潮玩旗舰店(高新区)", 7)]);
        let record = table.store_record("旗舰店").unwrap();
        assert_eq!(record.field("门店页访问次数"), FieldValue::Int(7));
    }

    #[test]
    fn test_product_rows_filtered_by_redemption_store() {
        let mut mine = RawRecord::new();
        mine.insert("核销门店", RawValue::tagged("旗舰店"));
        mine.insert("商品名称", RawValue::tagged("夜间套餐"));
        let mut other = RawRecord::new();
        other.insert("核销门店", RawValue::tagged("别家店"));

        let table = RecordTable::new(vec![mine, other]);
        assert_eq!(table.rows_for_store("旗舰店").len(), 1);

        // Rows without the column never match.
        let table = RecordTable::new(vec![RawRecord::new()]);
        assert!(table.rows_for_store("旗舰店").is_empty());
    }

    #[test]
    fn test_collect_joins_all_four_fetches() {
        let current = period(2025, 10);
        let previous = period(2025, 9);

        let mut source = TableSource::new("export");
        source.add_metrics(
            current,
            RecordTable::new(vec![store_row("门店名称", "旗舰店", 120)]),
        );
        source.add_metrics(
            previous,
            RecordTable::new(vec![store_row("门店名称", "旗舰店", 100)]),
        );

        let inputs = block_on(collect_report_inputs(&source, "旗舰店", &current, &previous));
        assert_eq!(
            inputs.current_metrics.field("门店页访问次数"),
            FieldValue::Int(120)
        );
        assert_eq!(
            inputs.previous_metrics.field("门店页访问次数"),
            FieldValue::Int(100)
        );
        // No product tables registered: both fetches degraded to empty.
        assert!(inputs.current_products.is_empty());
        assert!(inputs.previous_products.is_empty());
        assert!(inputs.has_metrics());
    }

    #[test]
    fn test_missing_store_degrades_to_empty_record() {
        let current = period(2025, 10);
        let previous = period(2025, 9);

        let mut source = TableSource::new("export");
        source.add_metrics(
            current,
            RecordTable::new(vec![store_row("门店名称", "别家店", 5)]),
        );

        let inputs = block_on(collect_report_inputs(&source, "旗舰店", &current, &previous));
        assert!(inputs.current_metrics.is_empty());
        assert!(inputs.previous_metrics.is_empty());
        assert!(!inputs.has_metrics());
    }

    #[test]
    fn test_record_table_from_missing_file_is_source_error() {
        let result = RecordTable::from_json_file("/nonexistent/table.json");
        assert!(matches!(result, Err(ReportError::SourceError { .. })));
    }
}
