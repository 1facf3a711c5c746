use crate::aggregate::AggregatedProduct;
use crate::llm::client::GeminiClient;
use crate::llm::prompts;
use crate::value::RawRecord;
use log::{info, warn};

const INSIGHTS_TEMPERATURE: f32 = 0.0;

/// Model-side product aggregation: the same grouping contract as
/// `aggregate::aggregate`, delegated to the LLM for messy exports whose
/// field shapes drift. Degrades to an empty list on any failure; callers
/// fall back to the deterministic aggregator.
pub async fn generate_product_insights(
    client: &GeminiClient,
    model: &str,
    raw_records: &[RawRecord],
) -> Vec<AggregatedProduct> {
    if raw_records.is_empty() {
        return Vec::new();
    }

    let records_json = match serde_json::to_string_pretty(raw_records) {
        Ok(json) => json,
        Err(e) => {
            warn!("cannot serialize product records for insights: {}", e);
            return Vec::new();
        }
    };

    let schema = serde_json::to_value(schemars::schema_for!(Vec<AggregatedProduct>)).ok();

    let response = client
        .generate_content(
            model,
            prompts::SYSTEM_PROMPT_AGGREGATOR,
            &prompts::product_insights_prompt(&records_json),
            schema,
            INSIGHTS_TEMPERATURE,
        )
        .await;

    match response {
        Ok(text) => {
            let parsed: serde_json::Result<Vec<AggregatedProduct>> =
                serde_json::from_str(strip_code_fences(&text));
            match parsed {
                Ok(products) => {
                    info!("product insights returned {} aggregated rows", products.len());
                    products
                }
                Err(e) => {
                    warn!("product insights response was not valid JSON: {}", e);
                    Vec::new()
                }
            }
        }
        Err(e) => {
            warn!("product insights call failed: {}", e);
            Vec::new()
        }
    }
}

/// Models occasionally wrap JSON in markdown fences even when asked not to.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}
