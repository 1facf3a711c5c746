use crate::aggregate::AggregatedProduct;
use crate::document::{CellRange, CellValue, Document, Sheet};
use crate::period::PeriodLabels;
use crate::reconcile::MetricRow;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const TITLE_FILL: &str = "FFFFE0";
const DECLINE_FILL: &str = "FFFFC7CE";
const TIER_LOW_FILL: &str = "FFC0CB";
const TIER_MEDIUM_FILL: &str = "E0FFFF";
const TIER_HIGH_FILL: &str = "F0FFF0";
const COLUMN_WIDTH_CAP: usize = 60;

/// Free-text commentary produced by an external collaborator. The renderer
/// treats both strings as opaque and only frames them into the fixed region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Commentary {
    pub problem_analysis: String,
    pub improvement_suggestion: String,
}

impl Commentary {
    pub fn to_region_text(&self) -> String {
        format!(
            "【问题分析】\n{}\n\n【改进建议】\n{}",
            self.problem_analysis, self.improvement_suggestion
        )
    }
}

/// Explicit cell addressing for every logical report region, so layout
/// changes never require re-deriving offsets scattered through the writer.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    pub metrics_sheet: String,
    pub products_sheet: String,
    /// Columns spanned by the metrics title banner.
    pub metrics_title_columns: u32,
    pub metric_name_col: u32,
    pub current_col: u32,
    pub previous_col: u32,
    pub change_col: u32,
    pub commentary_col: u32,
    pub metrics_header_row: u32,
    pub metrics_first_row: u32,
    /// Columns spanned by the products title banner (two 4-column tables).
    pub products_title_columns: u32,
    pub products_header_row: u32,
    pub products_first_row: u32,
    pub previous_products_start_col: u32,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            metrics_sheet: "数据分析".to_string(),
            products_sheet: "套餐分析".to_string(),
            metrics_title_columns: 6,
            metric_name_col: 2,
            current_col: 3,
            previous_col: 4,
            change_col: 5,
            commentary_col: 6,
            metrics_header_row: 2,
            metrics_first_row: 3,
            products_title_columns: 8,
            products_header_row: 3,
            products_first_row: 4,
            previous_products_start_col: 5,
        }
    }
}

/// Lays the reconciled rows and aggregated product tables out into a styled
/// document. Pure over its inputs: identical inputs produce an identical
/// document.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    layout: ReportLayout,
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: ReportLayout) -> Self {
        Self { layout }
    }

    pub fn render(
        &self,
        store_name: &str,
        labels: &PeriodLabels,
        metric_rows: &[MetricRow],
        current_products: &[AggregatedProduct],
        previous_products: &[AggregatedProduct],
        commentary: Option<&Commentary>,
    ) -> Document {
        let mut document = Document::new();
        self.render_metrics_sheet(&mut document, store_name, labels, metric_rows, commentary);
        self.render_products_sheet(
            &mut document,
            store_name,
            labels,
            current_products,
            previous_products,
        );
        document
    }

    fn render_metrics_sheet(
        &self,
        document: &mut Document,
        store_name: &str,
        labels: &PeriodLabels,
        metric_rows: &[MetricRow],
        commentary: Option<&Commentary>,
    ) {
        let layout = &self.layout;
        let sheet = document.add_sheet(layout.metrics_sheet.clone());

        write_title(
            sheet,
            format!("{} 经营数据分析报告", store_name),
            layout.metrics_title_columns,
        );

        let header_row = layout.metrics_header_row;
        write_header(sheet, header_row, layout.metric_name_col, "指标");
        write_header(sheet, header_row, layout.current_col, &labels.current_value);
        write_header(sheet, header_row, layout.previous_col, &labels.previous_value);
        write_header(sheet, header_row, layout.change_col, "环比变化");
        write_header(sheet, header_row, layout.commentary_col, "AI分析");

        let mut row = layout.metrics_first_row;
        for metric in metric_rows {
            sheet.set_cell(row, layout.metric_name_col, metric.display_name.as_str());
            sheet.set_cell(row, layout.current_col, metric.current.as_str());
            sheet.set_cell(row, layout.previous_col, metric.previous.as_str());

            let change_cell = sheet.set_cell(row, layout.change_col, metric.change_display());
            if metric.change.is_decline() {
                change_cell.style.fill_color = Some(DECLINE_FILL.to_string());
            }

            row += 1;
        }

        if let Some(commentary) = commentary {
            let cell = sheet.set_cell(
                layout.metrics_first_row,
                layout.commentary_col,
                commentary.to_region_text(),
            );
            cell.style.wrap_text = true;

            let last_row = row.saturating_sub(1).max(layout.metrics_first_row);
            sheet.merge(CellRange::new(
                layout.metrics_first_row,
                layout.commentary_col,
                last_row,
                layout.commentary_col,
            ));
        }

        sheet.auto_size_columns(COLUMN_WIDTH_CAP);
    }

    fn render_products_sheet(
        &self,
        document: &mut Document,
        store_name: &str,
        labels: &PeriodLabels,
        current_products: &[AggregatedProduct],
        previous_products: &[AggregatedProduct],
    ) {
        let layout = &self.layout;
        let sheet = document.add_sheet(layout.products_sheet.clone());

        write_title(
            sheet,
            format!("{} 套餐数据分析报告", store_name),
            layout.products_title_columns,
        );

        let table_width = layout.previous_products_start_col - 1;
        write_table_banner(sheet, 1, table_width, &labels.current_products);
        write_table_banner(
            sheet,
            layout.previous_products_start_col,
            table_width,
            &labels.previous_products,
        );

        self.write_product_table(sheet, current_products, 0);
        self.write_product_table(sheet, previous_products, layout.previous_products_start_col - 1);

        sheet.auto_size_columns(COLUMN_WIDTH_CAP);
    }

    fn write_product_table(
        &self,
        sheet: &mut Sheet,
        products: &[AggregatedProduct],
        col_offset: u32,
    ) {
        let layout = &self.layout;

        for (index, header) in ["套餐名称", "销售额", "核销次数", "转化率"]
            .iter()
            .enumerate()
        {
            write_header(
                sheet,
                layout.products_header_row,
                col_offset + 1 + index as u32,
                header,
            );
        }

        for (offset, product) in products.iter().enumerate() {
            let row = layout.products_first_row + offset as u32;
            let fill = tier_fill(product.count);

            let cells: [CellValue; 4] = [
                product.name.as_str().into(),
                product.amount.into(),
                product.count.into(),
                product.conversion_rate.as_str().into(),
            ];
            for (index, value) in cells.into_iter().enumerate() {
                let cell = sheet.set_cell(row, col_offset + 1 + index as u32, value);
                cell.style.align_center = true;
                cell.style.bordered = true;
                if let Some(color) = fill {
                    cell.style.fill_color = Some(color.to_string());
                }
            }
        }
    }
}

/// Fixed count tiers picking a product row's highlight. Boundaries are
/// closed at 10 and 20; counts below 1 get no color.
fn tier_fill(count: i64) -> Option<&'static str> {
    match count {
        1..=10 => Some(TIER_LOW_FILL),
        11..=20 => Some(TIER_MEDIUM_FILL),
        c if c > 20 => Some(TIER_HIGH_FILL),
        _ => None,
    }
}

fn write_title(sheet: &mut Sheet, title: String, columns: u32) {
    let cell = sheet.set_cell(1, 1, title);
    cell.style.bold = true;
    cell.style.font_size = Some(20);
    cell.style.align_center = true;
    cell.style.fill_color = Some(TITLE_FILL.to_string());
    sheet.merge(CellRange::new(1, 1, 1, columns));
}

fn write_table_banner(sheet: &mut Sheet, start_col: u32, width: u32, label: &str) {
    let cell = sheet.set_cell(2, start_col, label);
    cell.style.bold = true;
    cell.style.align_center = true;
    sheet.merge(CellRange::new(2, start_col, 2, start_col + width - 1));
}

fn write_header(sheet: &mut Sheet, row: u32, col: u32, label: &str) {
    let cell = sheet.set_cell(row, col, label);
    cell.style.bold = true;
    cell.style.align_center = true;
}

/// Output filename convention: `<store>_分析报告_<yyyymmdd>.<ext>` with
/// everything outside CJK/ASCII-alphanumeric replaced by underscores.
pub fn report_filename(store_name: &str, date: NaiveDate, extension: &str) -> String {
    let safe_name: String = store_name
        .chars()
        .map(|c| {
            let is_cjk = matches!(c as u32, 0x4E00..=0x9FA5);
            if c.is_ascii_alphanumeric() || is_cjk {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{}_分析报告_{}.{}", safe_name, date.format("%Y%m%d"), extension)
}
