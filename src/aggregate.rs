use crate::value::{FieldValue, RawRecord};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const FIELD_NAME: &str = "商品名称";
const FIELD_AMOUNT: &str = "实付总金额";
const FIELD_COUNT: &str = "核销次数";
const FIELD_RATE: &str = "转化率";

/// One per-transaction product line, normalized with declared defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub name: String,
    pub amount: f64,
    pub count: i64,
    pub conversion_rate: String,
}

impl ProductRecord {
    pub fn from_raw(record: &RawRecord) -> Self {
        let name = match record.field(FIELD_NAME) {
            FieldValue::Missing => "N/A".to_string(),
            value => value.to_string(),
        };
        let conversion_rate = match record.field(FIELD_RATE) {
            FieldValue::Missing => "0%".to_string(),
            value => value.to_string(),
        };

        Self {
            name,
            amount: record.field(FIELD_AMOUNT).as_f64().unwrap_or(0.0),
            count: record.field(FIELD_COUNT).as_i64().unwrap_or(0),
            conversion_rate,
        }
    }
}

/// One row per distinct product name: amount/count summed over all
/// contributing records, conversion rate fixed at the first record seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregatedProduct {
    #[schemars(description = "Normalized product name")]
    pub name: String,

    #[schemars(description = "Total paid amount across all records of this product")]
    pub amount: f64,

    #[schemars(description = "Total redemption count across all records of this product")]
    pub count: i64,

    #[schemars(description = "Conversion rate text of the first record seen for this product")]
    pub conversion_rate: String,
}

/// Sort key for the product tables, chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Amount,
    Count,
}

/// Groups raw product records by exact normalized name, preserving first
/// appearance order. Sums are commutative over record order; the kept
/// conversion rate is not (first-seen wins), so input order matters.
pub fn aggregate(records: &[RawRecord]) -> Vec<AggregatedProduct> {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut products: Vec<AggregatedProduct> = Vec::new();

    for raw in records {
        let record = ProductRecord::from_raw(raw);

        match by_name.get(&record.name) {
            Some(&index) => {
                let product = &mut products[index];
                product.amount += record.amount;
                product.count += record.count;
            }
            None => {
                by_name.insert(record.name.clone(), products.len());
                products.push(AggregatedProduct {
                    name: record.name,
                    amount: record.amount,
                    count: record.count,
                    conversion_rate: record.conversion_rate,
                });
            }
        }
    }

    products
}

/// Stable descending sort by the chosen key, applied before rendering.
pub fn sort_products(products: &mut [AggregatedProduct], key: SortKey) {
    match key {
        SortKey::Amount => products.sort_by(|a, b| b.amount.total_cmp(&a.amount)),
        SortKey::Count => products.sort_by(|a, b| b.count.cmp(&a.count)),
    }
}
