//! Text line reconstruction from page content streams.
//!
//! Walks the content operators of one page, tracking the text state, and
//! produces positioned spans (one per show operator) which are grouped into
//! lines by baseline.
//!
//! ```text
//! content ops  ->  LayoutSpan[]  ->  LayoutLine[]
//! ```

use std::collections::HashMap;

use lopdf::content::Operation;
use lopdf::Object;

use super::cmap::{decode_text_simple, FontDecoder};
use crate::models::BoundingBox;

/// Approximate glyph width as a fraction of font size, used in place of
/// font metrics.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Share of the font size above the baseline.
const ASCENT_RATIO: f32 = 0.8;

/// Share of the font size below the baseline.
const DESCENT_RATIO: f32 = 0.2;

/// Baselines closer than this (in points) belong to the same line.
const BASELINE_TOLERANCE: f32 = 1.0;

/// A horizontal gap wider than this multiple of the font size starts a new line.
const LINE_GAP_FACTOR: f32 = 3.0;

/// Default page size (US Letter) when a page has no usable `MediaBox`.
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// A run of text drawn by one show operator.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSpan {
    pub text: String,
    /// Box in page space with a top-left origin.
    pub bbox: BoundingBox,
    /// Baseline in page space with a top-left origin.
    pub baseline: f32,
    /// Rendered font size.
    pub font_size: f32,
}

/// Spans sharing a baseline, in drawing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutLine {
    pub spans: Vec<LayoutSpan>,
}

impl LayoutLine {
    /// Span texts joined with a single space.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Union of the span boxes.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.spans
            .iter()
            .map(|s| s.bbox)
            .reduce(|acc, b| acc.union(&b))
    }

    fn accepts(&self, span: &LayoutSpan) -> bool {
        let Some(last) = self.spans.last() else {
            return false;
        };
        let size = last.font_size.max(span.font_size);
        let same_baseline =
            (last.baseline - span.baseline).abs() <= BASELINE_TOLERANCE.max(size * 0.2);
        let gap = span.bbox.x1 - last.bbox.x2;
        same_baseline && gap >= -size && gap <= size * LINE_GAP_FACTOR
    }
}

/// Text lines of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Page number (1-indexed).
    pub number: u32,
    pub lines: Vec<LayoutLine>,
}

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_size: f32,
    /// Elements [a, b, c, d, tx, ty] of the current text matrix.
    text_matrix: [f32; 6],
    /// Text line matrix, set by BT and updated by Td/TD/T*/Tm.
    line_matrix: [f32; 6],
    /// Current transformation matrix.
    ctm: [f32; 6],
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            ctm: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn render_matrix(&self) -> [f32; 6] {
        multiply(&self.text_matrix, &self.ctm)
    }

    /// Point in user space for a text-space offset from the current origin.
    fn user_point(&self, dx: f32) -> (f32, f32) {
        transform(&self.render_matrix(), dx, self.text_rise)
    }

    /// Rendered font size including matrix scaling.
    fn effective_font_size(&self) -> f32 {
        let m = self.render_matrix();
        let scale = (m[2].powi(2) + m[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    /// Horizontal displacement in text space after showing `text`.
    fn text_advance(&self, text: &str) -> f32 {
        text.chars()
            .map(|ch| {
                let mut w = self.font_size * APPROX_CHAR_WIDTH_RATIO + self.char_spacing;
                if ch == ' ' {
                    w += self.word_spacing;
                }
                w * self.horiz_scale
            })
            .sum()
    }
}

/// Builds lines while walking the content stream.
struct LineBuilder {
    page_top: f32,
    page_left: f32,
    lines: Vec<LayoutLine>,
}

impl LineBuilder {
    fn push(&mut self, text: String, start: (f32, f32), end: (f32, f32), size: f32) {
        if text.trim().is_empty() {
            return;
        }

        let x1 = start.0.min(end.0) - self.page_left;
        let x2 = start.0.max(end.0) - self.page_left;
        let baseline = self.page_top - start.1;
        let bbox = BoundingBox::new(
            x1,
            baseline - size * ASCENT_RATIO,
            x2,
            baseline + size * DESCENT_RATIO,
        );

        let span = LayoutSpan {
            text,
            bbox,
            baseline,
            font_size: size,
        };

        match self.lines.last_mut() {
            Some(line) if line.accepts(&span) => line.spans.push(span),
            _ => self.lines.push(LayoutLine { spans: vec![span] }),
        }
    }
}

/// Reconstruct text lines from a page's content operations.
///
/// `media_box` is `[x0, y0, x1, y1]` in PDF user space; returned boxes use a
/// top-left origin relative to it.
pub fn layout_lines(
    operations: &[Operation],
    fonts: &HashMap<Vec<u8>, FontDecoder>,
    media_box: [f32; 4],
) -> Vec<LayoutLine> {
    let mut state = TextState::default();
    let mut stack: Vec<[f32; 6]> = Vec::new();
    let mut builder = LineBuilder {
        page_top: media_box[3],
        page_left: media_box[0],
        lines: Vec::new(),
    };

    let decode = |state: &TextState, bytes: &[u8]| -> String {
        match fonts.get(&state.font_key) {
            Some(decoder) => decoder.decode(bytes),
            None => decode_text_simple(bytes),
        }
    };

    for op in operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix(operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => {
                if let (Some(Object::Name(key)), Some(size)) =
                    (operands.first(), operands.get(1).and_then(number))
                {
                    state.font_key = key.clone();
                    state.font_size = size;
                }
            }
            "Tm" => {
                if let Some(m) = matrix(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (operand(operands, 0), operand(operands, 1)) {
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (operand(operands, 0), operand(operands, 1)) {
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.translate_line(0.0, -state.leading),
            "TL" => {
                if let Some(v) = operand(operands, 0) {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = operand(operands, 0) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = operand(operands, 0) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = operand(operands, 0) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = operand(operands, 0) {
                    state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = decode(&state, bytes);
                    show_text(&mut state, &mut builder, text);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = decode(&state, bytes);
                    show_text(&mut state, &mut builder, text);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (operand(operands, 0), operand(operands, 1)) {
                    state.word_spacing = aw;
                    state.char_spacing = ac;
                }
                state.translate_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = decode(&state, bytes);
                    show_text(&mut state, &mut builder, text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let start = state.user_point(0.0);
                    let size = state.effective_font_size();
                    let mut text = String::new();
                    let gap_threshold =
                        state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale * 0.3;

                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                let fragment = decode(&state, bytes);
                                let dx = state.text_advance(&fragment);
                                text.push_str(&fragment);
                                state.advance_x(dx);
                            }
                            other => {
                                // Kerning in thousandths of text space; large
                                // negative values separate words.
                                if let Some(adj) = number(other) {
                                    let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                                    if dx > gap_threshold
                                        && !text.is_empty()
                                        && !text.ends_with(' ')
                                    {
                                        text.push(' ');
                                    }
                                    state.advance_x(dx);
                                }
                            }
                        }
                    }

                    let end = state.user_point(0.0);
                    builder.push(text, start, end, size);
                }
            }
            _ => {}
        }
    }

    builder.lines
}

fn show_text(state: &mut TextState, builder: &mut LineBuilder, text: String) {
    let start = state.user_point(0.0);
    let size = state.effective_font_size();
    let dx = state.text_advance(&text);
    state.advance_x(dx);
    let end = state.user_point(0.0);
    builder.push(text, start, end, size);
}

/// Read a numeric operand.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn operand(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(number)
}

fn matrix(operands: &[Object]) -> Option<[f32; 6]> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(m)
}

/// Concatenate two affine matrices: `a` applied first, then `b`.
fn multiply(a: &[f32; 6], b: &[f32; 6]) -> [f32; 6] {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn transform(m: &[f32; 6], x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::StringFormat;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn text(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn font(size: i64) -> Operation {
        op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(size)])
    }

    fn lines_of(ops: &[Operation]) -> Vec<String> {
        layout_lines(ops, &HashMap::new(), DEFAULT_MEDIA_BOX)
            .iter()
            .map(LayoutLine::text)
            .collect()
    }

    #[test]
    fn test_single_show_produces_one_line() {
        let ops = vec![
            op("BT", vec![]),
            font(12),
            op("Td", vec![Object::Integer(100), Object::Integer(700)]),
            op("Tj", vec![text("Status: HOLD 42 pending")]),
            op("ET", vec![]),
        ];

        let lines = layout_lines(&ops, &HashMap::new(), DEFAULT_MEDIA_BOX);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Status: HOLD 42 pending");

        let bbox = lines[0].bbox().unwrap();
        assert_eq!(bbox.x1, 100.0);
        // 23 glyphs at 6pt each.
        assert_eq!(bbox.x2, 100.0 + 23.0 * 6.0);
        // Baseline at 792 - 700 = 92 from the top.
        assert!((bbox.y1 - (92.0 - 9.6)).abs() < 1e-3);
        assert!((bbox.y2 - (92.0 + 2.4)).abs() < 1e-3);
    }

    #[test]
    fn test_spans_on_same_baseline_join_with_single_space() {
        let ops = vec![
            op("BT", vec![]),
            font(10),
            op("Td", vec![Object::Integer(50), Object::Integer(500)]),
            op("Tj", vec![text("HOLD")]),
            op("Tj", vec![text("42")]),
            op("ET", vec![]),
        ];

        assert_eq!(lines_of(&ops), vec!["HOLD 42"]);
    }

    #[test]
    fn test_next_line_operators_split_lines() {
        let ops = vec![
            op("BT", vec![]),
            font(10),
            op("TL", vec![Object::Integer(14)]),
            op("Td", vec![Object::Integer(50), Object::Integer(500)]),
            op("Tj", vec![text("first")]),
            op("T*", vec![]),
            op("Tj", vec![text("second")]),
            op("'", vec![text("third")]),
            op("ET", vec![]),
        ];

        assert_eq!(lines_of(&ops), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_separate_text_objects_on_one_baseline_merge() {
        let ops = vec![
            op("BT", vec![]),
            font(10),
            op("Td", vec![Object::Integer(50), Object::Integer(500)]),
            op("Tj", vec![text("REV")]),
            op("ET", vec![]),
            op("BT", vec![]),
            font(10),
            op("Td", vec![Object::Integer(72), Object::Integer(500)]),
            op("Tj", vec![text("B")]),
            op("ET", vec![]),
        ];

        assert_eq!(lines_of(&ops), vec!["REV B"]);
    }

    #[test]
    fn test_large_horizontal_gap_starts_new_line() {
        let ops = vec![
            op("BT", vec![]),
            font(10),
            op("Td", vec![Object::Integer(50), Object::Integer(500)]),
            op("Tj", vec![text("left")]),
            op("Td", vec![Object::Integer(400), Object::Integer(0)]),
            op("Tj", vec![text("right")]),
            op("ET", vec![]),
        ];

        assert_eq!(lines_of(&ops), vec!["left", "right"]);
    }

    #[test]
    fn test_tj_array_inserts_space_on_wide_kerning() {
        let ops = vec![
            op("BT", vec![]),
            font(10),
            op("Td", vec![Object::Integer(50), Object::Integer(500)]),
            op(
                "TJ",
                vec![Object::Array(vec![
                    text("HO"),
                    Object::Integer(-20),
                    text("LD"),
                    Object::Integer(-400),
                    text("7"),
                ])],
            ),
            op("ET", vec![]),
        ];

        assert_eq!(lines_of(&ops), vec!["HOLD 7"]);
    }

    #[test]
    fn test_ctm_and_tm_scaling() {
        let ops = vec![
            op("q", vec![]),
            op(
                "cm",
                vec![
                    Object::Integer(2),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(2),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            op("BT", vec![]),
            font(10),
            op(
                "Tm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Integer(10),
                    Object::Integer(100),
                ],
            ),
            op("Tj", vec![text("AB")]),
            op("ET", vec![]),
            op("Q", vec![]),
        ];

        let lines = layout_lines(&ops, &HashMap::new(), DEFAULT_MEDIA_BOX);
        let span = &lines[0].spans[0];
        assert_eq!(span.font_size, 20.0);
        assert_eq!(span.bbox.x1, 20.0);
        assert_eq!(span.bbox.x2, 40.0);
        assert_eq!(span.baseline, 792.0 - 200.0);
    }

    #[test]
    fn test_whitespace_only_and_non_text_operators_ignored() {
        let ops = vec![
            op(
                "re",
                vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(10),
                    Object::Integer(10),
                ],
            ),
            op("f", vec![]),
            op("BT", vec![]),
            font(10),
            op("Tj", vec![text("   ")]),
            op("ET", vec![]),
        ];

        assert!(layout_lines(&ops, &HashMap::new(), DEFAULT_MEDIA_BOX).is_empty());
    }

    #[test]
    fn test_media_box_offset() {
        let ops = vec![
            op("BT", vec![]),
            font(10),
            op("Td", vec![Object::Integer(110), Object::Integer(300)]),
            op("Tj", vec![text("X")]),
            op("ET", vec![]),
        ];

        let lines = layout_lines(&ops, &HashMap::new(), [10.0, 0.0, 410.0, 400.0]);
        let span = &lines[0].spans[0];
        assert_eq!(span.bbox.x1, 100.0);
        assert_eq!(span.baseline, 100.0);
    }
}
