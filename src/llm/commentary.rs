use crate::aggregate::AggregatedProduct;
use crate::llm::client::GeminiClient;
use crate::llm::prompts;
use crate::render::Commentary;
use crate::source::ReportInputs;
use log::{info, warn};
use serde_json::json;

pub const DEFAULT_COMMENTARY_MODEL: &str = "gemini-2.5-flash-lite";

/// Shown in the commentary region when a generation call fails; the report
/// is still produced.
pub const COMMENTARY_FALLBACK: &str = "分析生成失败，请稍后重试。";

const COMMENTARY_TEMPERATURE: f32 = 0.3;

/// External commentary collaborator: turns the reconciled data summary into
/// the two opaque strings the report places verbatim.
pub struct CommentaryGenerator {
    client: GeminiClient,
    model: String,
}

impl CommentaryGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_COMMENTARY_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Never fails: each half independently degrades to the fallback text.
    pub async fn generate(&self, data_summary: &serde_json::Value) -> Commentary {
        let summary = serde_json::to_string_pretty(data_summary).unwrap_or_default();

        Commentary {
            problem_analysis: self
                .ask("problem analysis", &prompts::problem_analysis_prompt(&summary))
                .await,
            improvement_suggestion: self
                .ask(
                    "improvement suggestions",
                    &prompts::improvement_suggestions_prompt(&summary),
                )
                .await,
        }
    }

    async fn ask(&self, what: &str, prompt: &str) -> String {
        match self
            .client
            .generate_content(
                &self.model,
                prompts::SYSTEM_PROMPT_ANALYST,
                prompt,
                None,
                COMMENTARY_TEMPERATURE,
            )
            .await
        {
            Ok(text) => {
                info!("generated {}", what);
                text.trim().to_string()
            }
            Err(e) => {
                warn!("{} generation failed: {}", what, e);
                COMMENTARY_FALLBACK.to_string()
            }
        }
    }
}

/// The context handed to the commentary collaborator: both raw period
/// records plus the aggregated product view.
pub fn data_summary(inputs: &ReportInputs, products_aggregated: &[AggregatedProduct]) -> serde_json::Value {
    json!({
        "current_period_data": &inputs.current_metrics,
        "previous_period_data": &inputs.previous_metrics,
        "products_aggregated": products_aggregated,
    })
}
