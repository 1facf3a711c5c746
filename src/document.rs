use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

/// Styling attributes carried as data on the model; writers decide how to
/// realize them. Fill colors are RGB hex like "FFC0CB".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    pub bold: bool,
    pub font_size: Option<u32>,
    pub fill_color: Option<String>,
    pub align_center: bool,
    pub wrap_text: bool,
    pub bordered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    #[serde(default)]
    pub style: CellStyle,
}

/// Inclusive rectangular region, 1-based like spreadsheet coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl CellRange {
    pub fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: Vec<Cell>,
    merges: Vec<CellRange>,
    column_widths: BTreeMap<u32, usize>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Writes a cell, replacing any prior content at the same position, and
    /// returns it for style adjustments.
    pub fn set_cell(&mut self, row: u32, col: u32, value: impl Into<CellValue>) -> &mut Cell {
        let value = value.into();
        if let Some(index) = self.cells.iter().position(|c| c.row == row && c.col == col) {
            self.cells[index].value = value;
            return &mut self.cells[index];
        }

        self.cells.push(Cell {
            row,
            col,
            value,
            style: CellStyle::default(),
        });
        self.cells.last_mut().expect("cell just pushed")
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn merge(&mut self, range: CellRange) {
        self.merges.push(range);
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    pub fn set_column_width(&mut self, col: u32, width: usize) {
        self.column_widths.insert(col, width);
    }

    pub fn column_width(&self, col: u32) -> Option<usize> {
        self.column_widths.get(&col).copied()
    }

    pub fn max_row(&self) -> u32 {
        self.cells.iter().map(|c| c.row).max().unwrap_or(0)
    }

    pub fn max_col(&self) -> u32 {
        self.cells.iter().map(|c| c.col).max().unwrap_or(0)
    }

    /// Sizes every populated column to its longest content plus padding,
    /// capped. Double-width characters (CJK, fullwidth forms) count twice.
    pub fn auto_size_columns(&mut self, cap: usize) {
        let mut widths: BTreeMap<u32, usize> = BTreeMap::new();
        for cell in &self.cells {
            let width = display_width(&cell.value.to_string());
            let slot = widths.entry(cell.col).or_insert(0);
            *slot = (*slot).max(width);
        }

        for (col, longest) in widths {
            self.column_widths.insert(col, (longest + 2).min(cap));
        }
    }

    /// Plain-text grid of the sheet, padded to the column widths. Purely a
    /// function of the cell content, so identical inputs render identically.
    pub fn to_text(&self) -> String {
        let max_row = self.max_row();
        let max_col = self.max_col();
        let mut lines = Vec::with_capacity(max_row as usize);

        for row in 1..=max_row {
            let mut pieces = Vec::with_capacity(max_col as usize);
            for col in 1..=max_col {
                let text = self
                    .cell(row, col)
                    .map(|c| c.value.to_string())
                    .unwrap_or_default();
                let width = self.column_width(col).unwrap_or(0);
                pieces.push(pad_to_width(&text, width));
            }
            lines.push(pieces.join("  ").trim_end().to_string());
        }

        lines.join("\n")
    }
}

/// The rendered report artifact: an ordered set of styled sheets with
/// deterministic JSON and text emissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub sheets: Vec<Sheet>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, name: impl Into<String>) -> &mut Sheet {
        self.sheets.push(Sheet::new(name));
        self.sheets.last_mut().expect("sheet just pushed")
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_json<W: Write>(&self, mut sink: W) -> crate::error::Result<()> {
        let json = self.to_json_string()?;
        sink.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn to_text(&self) -> String {
        self.sheets
            .iter()
            .map(|sheet| format!("=== {} ===\n{}", sheet.name, sheet.to_text()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn write_text<W: Write>(&self, mut sink: W) -> crate::error::Result<()> {
        sink.write_all(self.to_text().as_bytes())?;
        Ok(())
    }
}

/// Content width in terminal/cell units: CJK ideographs, CJK punctuation and
/// fullwidth forms occupy two units, everything else one.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

fn char_width(c: char) -> usize {
    match c as u32 {
        0x1100..=0x115F // Hangul jamo
        | 0x2E80..=0x303E // CJK radicals, punctuation
        | 0x3041..=0x33FF // kana, CJK compatibility
        | 0x3400..=0x4DBF // CJK extension A
        | 0x4E00..=0x9FFF // CJK unified ideographs
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3 // Hangul syllables
        | 0xF900..=0xFAFF // CJK compatibility ideographs
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60 // fullwidth forms
        | 0xFFE0..=0xFFE6 => 2,
        _ => 1,
    }
}

fn pad_to_width(text: &str, width: usize) -> String {
    let current = display_width(text);
    if current >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - current))
    }
}
