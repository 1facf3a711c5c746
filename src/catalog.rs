use crate::error::{ReportError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One business metric the report must contain.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MetricSpec {
    #[schemars(description = "Row label shown in the report, e.g. '门店曝光量'")]
    pub display_name: String,

    /// Source field this metric reads from. `None` marks a template row that
    /// is filled by hand; reconciliation skips it with a diagnostic.
    #[serde(default)]
    #[schemars(description = "Raw field name in the adapter record, if mapped")]
    pub source_field: Option<String>,

    /// Percentage-valued metrics arrive as fractions (0.98) and render as
    /// "98.00%".
    #[serde(default)]
    #[schemars(description = "Whether the raw value is a fraction to render as a percentage")]
    pub is_percentage: bool,
}

impl MetricSpec {
    pub fn new(display_name: &str, source_field: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            source_field: Some(source_field.to_string()),
            is_percentage: false,
        }
    }

    pub fn percentage(display_name: &str, source_field: &str) -> Self {
        Self {
            is_percentage: true,
            ..Self::new(display_name, source_field)
        }
    }
}

/// The fixed, ordered list of metrics a report contains. Loaded once;
/// declaration order is the row order of the rendered report.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MetricCatalog {
    pub metrics: Vec<MetricSpec>,
}

impl MetricCatalog {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ReportError::CatalogError(format!("cannot read catalog file {}: {}", path.display(), e))
        })?;
        let catalog: MetricCatalog = serde_json::from_str(&contents).map_err(|e| {
            ReportError::CatalogError(format!("invalid catalog file {}: {}", path.display(), e))
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(ReportError::CatalogError(
                "catalog contains no metrics".to_string(),
            ));
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSpec> {
        self.metrics.iter()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(MetricCatalog)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

impl Default for MetricCatalog {
    /// The built-in store-operations catalog. Raw field names follow the
    /// upstream table columns; the three rate metrics arrive as fractions.
    fn default() -> Self {
        Self {
            metrics: vec![
                MetricSpec::new("门店曝光量", "门店页访问次数"),
                MetricSpec::new("门店详情页浏览量", "门店页访问人数"),
                MetricSpec::new("门店页成交人数", "门店意向成交人数"),
                MetricSpec::new("新增评论数", "新增评价数"),
                MetricSpec::percentage("评价回复率", "评价回复率"),
                MetricSpec::percentage("商责退单率", "经营风险商责退单率"),
                MetricSpec::new("团购券购买数", "门店意向成交券数"),
                MetricSpec::new("团购券购买金额", "门店意向成交金额"),
                MetricSpec::new("团购券核销数", "门店核销券数"),
                MetricSpec::new("核销金额（元）", "门店核销金额"),
                MetricSpec::new("到店新客数", "门店核销新客数"),
                MetricSpec::new("到店老客数", "门店核销老客数"),
                MetricSpec::new("视频条数", "门店关联视频数"),
                MetricSpec::new("同城网吧人气榜排名", "上榜榜单及排名"),
                MetricSpec::new("门店经营分", "门店经营分"),
                MetricSpec::new("门店评分", "门店评分"),
                MetricSpec::percentage("差评率", "经营风险差评率"),
                MetricSpec::new("未成交人数/百分比", "api_visit_lost_count"),
                MetricSpec::new("流失到其他门店成交人数", "api_lost_to_other_store_deal_count"),
                MetricSpec::new("退款金额（元）/百分比", "门店意向退款金额"),
            ],
        }
    }
}
