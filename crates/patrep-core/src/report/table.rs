//! Projection of typed report rows into named sheets of cells.

use crate::models::{BoundingBox, LegendRow, MatchResult, SummaryRow, TextLineRecord};

pub const SUMMARY_SHEET: &str = "Summary";
pub const DETAILS_SHEET: &str = "Details";
pub const TEXT_BLOCKS_SHEET: &str = "Text Blocks";
pub const LEGEND_SHEET: &str = "Legend";

const SUMMARY_COLUMNS: &[&str] = &["File", "Page", "Pattern", "Match", "Count"];
const DETAILS_COLUMNS: &[&str] = &[
    "File", "Page", "Text", "x1", "y1", "x2", "y2", "Score", "Pattern", "Match",
];
const TEXT_BLOCKS_COLUMNS: &[&str] = &["File", "Page", "Text", "x1", "y1", "x2", "y2", "Score"];
const LEGEND_COLUMNS: &[&str] = &["Pattern Id", "Regular Expression"];

/// A single sheet value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Number(f64),
    /// A hyperlink shown as `label`.
    Link { target: String, label: String },
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Plain-text rendering for formats without native links.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Integer(n) => n.to_string(),
            Cell::Number(n) => n.to_string(),
            Cell::Link { target, label } => format!("{label} ({target})"),
        }
    }
}

/// A named table with a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &str, columns: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

fn file_cell(record: &TextLineRecord) -> Cell {
    Cell::Link {
        target: record.deep_link(),
        label: record.source.label.clone(),
    }
}

/// Coordinates are rounded to hundredths of a point.
fn coordinate(value: f32) -> Cell {
    Cell::Number((f64::from(value) * 100.0).round() / 100.0)
}

fn location_cells(record: &TextLineRecord) -> Vec<Cell> {
    let BoundingBox { x1, y1, x2, y2 } = record.bbox;
    vec![
        file_cell(record),
        Cell::Integer(i64::from(record.page)),
        Cell::text(record.text.as_str()),
        coordinate(x1),
        coordinate(y1),
        coordinate(x2),
        coordinate(y2),
        Cell::Integer(i64::from(record.score)),
    ]
}

pub fn summary_sheet(rows: &[SummaryRow]) -> Sheet {
    let rows = rows
        .iter()
        .map(|row| {
            vec![
                Cell::Link {
                    target: row.source.deep_link(row.page),
                    label: row.source.label.clone(),
                },
                Cell::Integer(i64::from(row.page)),
                Cell::Text(row.pattern_label()),
                Cell::text(row.value.as_str()),
                Cell::Integer(row.count as i64),
            ]
        })
        .collect();
    Sheet::new(SUMMARY_SHEET, SUMMARY_COLUMNS, rows)
}

pub fn details_sheet(matches: &[MatchResult]) -> Sheet {
    let rows = matches
        .iter()
        .map(|m| {
            let mut cells = location_cells(&m.record);
            cells.push(Cell::Text(m.pattern_label()));
            cells.push(Cell::text(m.value.as_str()));
            cells
        })
        .collect();
    Sheet::new(DETAILS_SHEET, DETAILS_COLUMNS, rows)
}

pub fn text_blocks_sheet(records: &[TextLineRecord]) -> Sheet {
    let rows = records.iter().map(location_cells).collect();
    Sheet::new(TEXT_BLOCKS_SHEET, TEXT_BLOCKS_COLUMNS, rows)
}

pub fn legend_sheet(rows: &[LegendRow]) -> Sheet {
    let rows = rows
        .iter()
        .map(|row| {
            let id = match &row.link {
                Some(target) => Cell::Link {
                    target: target.clone(),
                    label: row.id.clone(),
                },
                None => Cell::text(row.id.as_str()),
            };
            vec![id, Cell::text(row.expression.as_str())]
        })
        .collect();
    Sheet::new(LEGEND_SHEET, LEGEND_COLUMNS, rows)
}
