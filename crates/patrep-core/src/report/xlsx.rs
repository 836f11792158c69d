//! Minimal SpreadsheetML workbook writer.
//!
//! Produces one worksheet per sheet with a bold, frozen header row. Text is
//! stored as inline strings and links as `HYPERLINK` formulas carrying a
//! cached label, so readers that ignore formulas still see the label.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{validate_sheet_names, Cell, ReportSink, Sheet};
use crate::error::ReportError;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const HEADER_STYLE: &str = "1";
const LINK_STYLE: &str = "2";

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="3"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font><font><u/><sz val="11"/><color rgb="FF0563C1"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/><xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

/// Writes sheets into a single `.xlsx` workbook.
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_archive(&self, sheets: &[Sheet]) -> io::Result<()> {
        let file = File::create(&self.path)?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut parts: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".to_string(), content_types(sheets.len())?),
            ("_rels/.rels".to_string(), ROOT_RELS.as_bytes().to_vec()),
            ("xl/workbook.xml".to_string(), workbook(sheets)?),
            ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels(sheets.len())?),
            ("xl/styles.xml".to_string(), STYLES.as_bytes().to_vec()),
        ];
        for (i, sheet) in sheets.iter().enumerate() {
            parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), worksheet(sheet)?));
        }

        for (name, data) in parts {
            zip.start_file(name, options).map_err(io::Error::other)?;
            zip.write_all(&data)?;
        }
        zip.finish().map_err(io::Error::other)?;
        Ok(())
    }
}

impl ReportSink for XlsxSink {
    fn write(&mut self, sheets: &[Sheet]) -> Result<(), ReportError> {
        validate_sheet_names(sheets)?;

        if let Err(e) = self.write_archive(sheets) {
            // Leave no truncated workbook behind.
            let _ = std::fs::remove_file(&self.path);
            return Err(ReportError::Workbook {
                path: self.path.clone(),
                reason: e.to_string(),
            });
        }

        debug!("Wrote {} sheets to {}", sheets.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Event writer over an in-memory XML part.
struct Part {
    writer: Writer<Vec<u8>>,
}

impl Part {
    fn new() -> io::Result<Self> {
        let mut part = Self {
            writer: Writer::new(Vec::new()),
        };
        part.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(part)
    }

    fn event(&mut self, event: Event<'_>) -> io::Result<()> {
        self.writer.write_event(event).map_err(io::Error::other)
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(start))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(start))
    }

    fn end(&mut self, name: &str) -> io::Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> io::Result<()> {
        self.start(name, attrs)?;
        self.event(Event::Text(BytesText::new(&escape_xstring(text))))?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

fn content_types(sheet_count: usize) -> io::Result<Vec<u8>> {
    let mut part = Part::new()?;
    part.start("Types", &[("xmlns", CONTENT_TYPES_NS)])?;
    part.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    part.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    part.empty(
        "Override",
        &[
            ("PartName", "/xl/workbook.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
            ),
        ],
    )?;
    part.empty(
        "Override",
        &[
            ("PartName", "/xl/styles.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
            ),
        ],
    )?;
    for i in 1..=sheet_count {
        let name = format!("/xl/worksheets/sheet{i}.xml");
        part.empty(
            "Override",
            &[
                ("PartName", name.as_str()),
                (
                    "ContentType",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
                ),
            ],
        )?;
    }
    part.end("Types")?;
    Ok(part.finish())
}

fn workbook(sheets: &[Sheet]) -> io::Result<Vec<u8>> {
    let mut part = Part::new()?;
    part.start("workbook", &[("xmlns", MAIN_NS), ("xmlns:r", REL_NS)])?;
    part.start("sheets", &[])?;
    for (i, sheet) in sheets.iter().enumerate() {
        let id = (i + 1).to_string();
        let rel = format!("rId{id}");
        part.empty(
            "sheet",
            &[("name", sheet.name.as_str()), ("sheetId", id.as_str()), ("r:id", rel.as_str())],
        )?;
    }
    part.end("sheets")?;
    part.end("workbook")?;
    Ok(part.finish())
}

fn workbook_rels(sheet_count: usize) -> io::Result<Vec<u8>> {
    let mut part = Part::new()?;
    part.start("Relationships", &[("xmlns", PACKAGE_REL_NS)])?;
    for i in 1..=sheet_count {
        let id = format!("rId{i}");
        let target = format!("worksheets/sheet{i}.xml");
        part.empty(
            "Relationship",
            &[
                ("Id", id.as_str()),
                ("Type", "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet"),
                ("Target", target.as_str()),
            ],
        )?;
    }
    let styles_id = format!("rId{}", sheet_count + 1);
    part.empty(
        "Relationship",
        &[
            ("Id", styles_id.as_str()),
            ("Type", "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles"),
            ("Target", "styles.xml"),
        ],
    )?;
    part.end("Relationships")?;
    Ok(part.finish())
}

fn worksheet(sheet: &Sheet) -> io::Result<Vec<u8>> {
    let mut part = Part::new()?;
    part.start("worksheet", &[("xmlns", MAIN_NS)])?;

    part.start("sheetViews", &[])?;
    part.start("sheetView", &[("workbookViewId", "0")])?;
    part.empty(
        "pane",
        &[
            ("ySplit", "1"),
            ("topLeftCell", "A2"),
            ("activePane", "bottomLeft"),
            ("state", "frozen"),
        ],
    )?;
    part.end("sheetView")?;
    part.end("sheetViews")?;

    part.start("sheetData", &[])?;

    part.start("row", &[("r", "1")])?;
    for (col, name) in sheet.columns.iter().enumerate() {
        inline_string(&mut part, &cell_ref(col, 1), name, Some(HEADER_STYLE))?;
    }
    part.end("row")?;

    for (i, row) in sheet.rows.iter().enumerate() {
        let row_number = i + 2;
        part.start("row", &[("r", row_number.to_string().as_str())])?;
        for (col, cell) in row.iter().enumerate() {
            write_cell(&mut part, &cell_ref(col, row_number), cell)?;
        }
        part.end("row")?;
    }

    part.end("sheetData")?;
    part.end("worksheet")?;
    Ok(part.finish())
}

fn write_cell(part: &mut Part, reference: &str, cell: &Cell) -> io::Result<()> {
    match cell {
        Cell::Text(text) => inline_string(part, reference, text, None),
        Cell::Integer(n) => number(part, reference, &n.to_string()),
        Cell::Number(n) if n.is_finite() => number(part, reference, &n.to_string()),
        Cell::Number(n) => inline_string(part, reference, &n.to_string(), None),
        Cell::Link { target, label } => {
            part.start("c", &[("r", reference), ("t", "str"), ("s", LINK_STYLE)])?;
            part.text_element("f", &[], &hyperlink_formula(target, label))?;
            part.text_element("v", &[], label)?;
            part.end("c")
        }
    }
}

fn inline_string(
    part: &mut Part,
    reference: &str,
    text: &str,
    style: Option<&str>,
) -> io::Result<()> {
    let mut attrs = vec![("r", reference), ("t", "inlineStr")];
    if let Some(style) = style {
        attrs.push(("s", style));
    }
    part.start("c", &attrs)?;
    part.start("is", &[])?;
    part.text_element("t", &[("xml:space", "preserve")], text)?;
    part.end("is")?;
    part.end("c")
}

fn number(part: &mut Part, reference: &str, value: &str) -> io::Result<()> {
    part.start("c", &[("r", reference)])?;
    part.text_element("v", &[], value)?;
    part.end("c")
}

/// Encode characters XML 1.0 cannot carry as OOXML `_xHHHH_` escapes.
///
/// A literal `_xHHHH_` sequence in the input gets its underscore escaped as
/// `_x005F_` so readers do not decode it.
fn escape_xstring(text: &str) -> Cow<'_, str> {
    let needs_escape = text.chars().any(is_forbidden_in_xml) || text.contains("_x");
    if !needs_escape {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for (i, c) in text.char_indices() {
        if is_forbidden_in_xml(c) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else if c == '_' && looks_like_escape(&text[i..]) {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

fn is_forbidden_in_xml(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
    )
}

/// `rest` starts with `_x` followed by four hex digits and `_`.
fn looks_like_escape(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    bytes.len() >= 7
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

/// `HYPERLINK("target","label")` with embedded quotes doubled.
fn hyperlink_formula(target: &str, label: &str) -> String {
    format!(
        "HYPERLINK(\"{}\",\"{}\")",
        target.replace('"', "\"\""),
        label.replace('"', "\"\"")
    )
}

/// A1-style reference for a zero-based column and one-based row.
fn cell_ref(col: usize, row: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_ref() {
        assert_eq!(cell_ref(0, 1), "A1");
        assert_eq!(cell_ref(25, 2), "Z2");
        assert_eq!(cell_ref(26, 3), "AA3");
        assert_eq!(cell_ref(701, 4), "ZZ4");
        assert_eq!(cell_ref(702, 5), "AAA5");
    }

    #[test]
    fn test_hyperlink_formula_escapes_quotes() {
        assert_eq!(
            hyperlink_formula("file:///a.pdf#page=1", "say \"hi\""),
            "HYPERLINK(\"file:///a.pdf#page=1\",\"say \"\"hi\"\"\")"
        );
    }

    fn sample() -> Vec<Sheet> {
        vec![
            Sheet {
                name: "Summary".to_string(),
                columns: vec!["File".to_string(), "Page".to_string(), "Match".to_string()],
                rows: vec![vec![
                    Cell::Link {
                        target: "file:///docs/a.pdf#page=2".to_string(),
                        label: "a".to_string(),
                    },
                    Cell::Integer(2),
                    Cell::text("HOLD <42> & co"),
                ]],
            },
            Sheet {
                name: "Text Blocks".to_string(),
                columns: vec!["Text".to_string(), "x1".to_string()],
                rows: vec![vec![Cell::text("Status: HOLD 42"), Cell::Number(72.25)]],
            },
        ]
    }

    #[test]
    fn test_workbook_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let mut sink = XlsxSink::new(&path);
        sink.write(&sample()).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Summary", "Text Blocks"]);

        let summary = workbook.worksheet_range("Summary").unwrap();
        assert_eq!(summary.get((0, 0)), Some(&Data::String("File".to_string())));
        assert_eq!(summary.get((1, 0)), Some(&Data::String("a".to_string())));
        assert_eq!(summary.get((1, 1)), Some(&Data::Float(2.0)));
        assert_eq!(summary.get((1, 2)), Some(&Data::String("HOLD <42> & co".to_string())));

        let formulas = workbook.worksheet_formula("Summary").unwrap();
        assert_eq!(
            formulas.get_value((1, 0)).map(String::as_str),
            Some("HYPERLINK(\"file:///docs/a.pdf#page=2\",\"a\")")
        );

        let blocks = workbook.worksheet_range("Text Blocks").unwrap();
        assert_eq!(blocks.get((1, 0)), Some(&Data::String("Status: HOLD 42".to_string())));
        assert_eq!(blocks.get((1, 1)), Some(&Data::Float(72.25)));
    }

    #[test]
    fn test_escape_xstring() {
        assert_eq!(escape_xstring("HOLD 42"), "HOLD 42");
        assert_eq!(escape_xstring("a\u{b}b\u{c}c"), "a_x000B_b_x000C_c");
        assert_eq!(escape_xstring("tab\tkept\n"), "tab\tkept\n");
        assert_eq!(escape_xstring("raw _x0041_ text"), "raw _x005F_x0041_ text");
        assert_eq!(escape_xstring("snake_x_case"), "snake_x_case");
    }

    #[test]
    fn test_control_characters_are_escaped_in_sheet_xml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let sheets = vec![Sheet {
            name: "Text Blocks".to_string(),
            columns: vec!["File".to_string(), "Text".to_string()],
            rows: vec![vec![
                Cell::Link {
                    target: "file:///docs/a.pdf#page=1".to_string(),
                    label: "form\u{c}feed".to_string(),
                },
                Cell::text("HOLD 1\u{c}end\u{b}"),
            ]],
        }];
        XlsxSink::new(&path).write(&sheets).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut xml = String::new();
        io::Read::read_to_string(
            &mut archive.by_name("xl/worksheets/sheet1.xml").unwrap(),
            &mut xml,
        )
        .unwrap();

        assert!(!xml.contains('\u{c}'));
        assert!(!xml.contains('\u{b}'));
        assert!(xml.contains("HOLD 1_x000C_end_x000B_"));
        assert!(xml.contains("<v>form_x000C_feed</v>"));
    }

    #[test]
    fn test_duplicate_sheet_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let mut sheets = sample();
        sheets[1].name = "Summary".to_string();

        let err = XlsxSink::new(&path).write(&sheets).unwrap_err();
        assert!(matches!(err, ReportError::DuplicateSheet(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.xlsx");

        let err = XlsxSink::new(&path).write(&sample()).unwrap_err();
        assert!(matches!(err, ReportError::Workbook { .. }));
    }
}
