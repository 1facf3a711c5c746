// Prompts for the commentary and product-insight calls. Output constraints
// (length, no markdown emphasis, business language) are enforced here, not in
// the core: the report only ever sees opaque strings.

pub const SYSTEM_PROMPT_ANALYST: &str =
    "你是一位精通数据分析和商业咨询的专家，擅长从数据中发现问题并提供解决方案。";

pub const SYSTEM_PROMPT_AGGREGATOR: &str = "你是一位精通JSON处理和数据聚合的专家。";

pub fn problem_analysis_prompt(data_summary: &str) -> String {
    format!(
        r#"你是一位资深的数据分析师和商业顾问。请根据以下门店经营数据，进行深入的问题分析。
**门店数据摘要：**
```json
{data_summary}
```
**分析要求：**
1. 重点关注数据中的异常值、负增长趋势和潜在问题
2. 结合网吧行业特点，分析数据背后的业务含义
3. 数据来源如果是英文字段，要进行翻译成中文的操作，相关指标不能是英文的
**输出要求：**
- 直接输出问题分析内容，不要包含标题、前言或其他格式
- 内容要简洁明了，重点突出
- 严格控制在50字以内，一段话阐述清楚主要问题
- 不要使用星号（*）等特殊符号来进行内容标注或强调
- 不要引用具体的数据百分比，只描述问题本质"#
    )
}

pub fn improvement_suggestions_prompt(data_summary: &str) -> String {
    format!(
        r#"你是一位资深的数据分析师和商业顾问。请根据以下门店经营数据，提供具体的改进建议。
**门店数据摘要：**
```json
{data_summary}
```
**建议要求：**
1. 针对数据分析中发现的问题，提供具体可行的改进建议
2. 结合电竞行业特点，提供通用性的建议，避免提及具体套餐名称
**输出要求：**
- 直接输出改进建议内容，不要包含标题、前言或其他格式
- 内容要实用性强，重点突出
- 严格控制在50字以内
- 不要使用星号（*）等特殊符号来进行内容标注或强调
- 不要提及技术术语，使用业务语言
- 不要提及具体的套餐名称"#
    )
}

pub fn product_insights_prompt(raw_records: &str) -> String {
    format!(
        r#"你是一位顶级数据分析师。请处理以下来自门店销售表格的原始JSON数据。
**原始数据:**
```json
{raw_records}
```
---
**处理任务:**
1.  **解析字段**:
    - `商品名称` 字段可能是 `[{{"text": "名称"}}]` 或纯文本，请提取出文本。
    - `转化率` 字段是 `[{{"text": "xx.xx%"}}]`，请提取出百分比文本。
    - `实付总金额` 和 `核销次数` 是数值。
2.  **分组聚合**: 按解析出的`商品名称`进行分组。
    - `amount`: 累加每个商品所有记录的`实付总金额`。
    - `count`: 累加每个商品所有记录的`核销次数`。
    - `conversion_rate`: 对于每个商品，只保留其所有记录中**第一个出现**的`转化率`文本值。
3.  **输出JSON**: 返回一个聚合后的JSON数组，每个对象包含`name`, `amount`, `count`, `conversion_rate`四个字段。
**输出要求:**
- 只输出纯粹的、不含任何其他文字说明的JSON数组。"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_the_summary() {
        let prompt = problem_analysis_prompt("{\"门店评分\": 4.8}");
        assert!(prompt.contains("{\"门店评分\": 4.8}"));
        assert!(prompt.contains("50字以内"));

        let prompt = improvement_suggestions_prompt("{}");
        assert!(prompt.contains("改进建议"));
    }

    #[test]
    fn test_insights_prompt_names_output_fields() {
        let prompt = product_insights_prompt("[]");
        for field in ["name", "amount", "count", "conversion_rate"] {
            assert!(prompt.contains(field));
        }
    }
}
