//! PDF fixtures shared by unit and integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

/// Content of one synthetic page.
pub enum TestPage {
    /// One text line per entry, top to bottom, in a standard Type1 font.
    Lines(Vec<String>),
    /// One line of two-byte codes shown with a Type0 font and a `ToUnicode` map.
    CidLine { codes: Vec<u8>, cmap: String },
}

impl TestPage {
    pub fn lines(lines: &[&str]) -> Self {
        TestPage::Lines(lines.iter().map(|s| s.to_string()).collect())
    }

    pub fn cid_line(codes: &[u8], cmap: &str) -> Self {
        TestPage::CidLine {
            codes: codes.to_vec(),
            cmap: cmap.to_string(),
        }
    }
}

fn text_ops(font: &str, x: i64, y: i64, string: Object) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(12)]),
        Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
        Operation::new("Tj", vec![string]),
        Operation::new("ET", vec![]),
    ]
}

/// Build an in-memory PDF with the given pages.
pub fn build_pdf(pages: &[TestPage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let helvetica = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let mut page_ids = Vec::new();
    for page in pages {
        let mut page_fonts: Option<Dictionary> = None;
        let operations = match page {
            TestPage::Lines(lines) => lines
                .iter()
                .enumerate()
                .flat_map(|(i, line)| {
                    let string = Object::String(line.as_bytes().to_vec(), StringFormat::Literal);
                    text_ops("F1", 72, 700 - 20 * i as i64, string)
                })
                .collect(),
            TestPage::CidLine { codes, cmap } => {
                let cmap_stream = Stream::new(Dictionary::new(), cmap.as_bytes().to_vec());
                let cmap_id = doc.add_object(cmap_stream);
                let cid_font = doc.add_object(Dictionary::from_iter(vec![
                    ("Type", Object::Name(b"Font".to_vec())),
                    ("Subtype", Object::Name(b"Type0".to_vec())),
                    ("BaseFont", Object::Name(b"TestCID".to_vec())),
                    ("Encoding", Object::Name(b"Identity-H".to_vec())),
                    ("ToUnicode", Object::Reference(cmap_id)),
                ]));
                page_fonts = Some(Dictionary::from_iter(vec![("F2", Object::Reference(cid_font))]));
                let string = Object::String(codes.clone(), StringFormat::Hexadecimal);
                text_ops("F2", 72, 700, string)
            }
        };

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("encode content"),
        ));

        let mut page_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if let Some(fonts) = page_fonts {
            page_dict.set(
                "Resources",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "Font",
                    Object::Dictionary(fonts),
                )])),
            );
        }
        page_ids.push(doc.add_object(page_dict));
    }

    // Resources and MediaBox live on the page tree root and are inherited.
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        ),
        (
            "Resources",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "Font",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "F1",
                    Object::Reference(helvetica),
                )])),
            )])),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save PDF");
    buffer
}

/// Write a PDF built from `pages` to `dir/name`.
pub fn write_pdf(dir: &Path, name: &str, pages: &[TestPage]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture directory");
    }
    std::fs::write(&path, build_pdf(pages)).expect("write PDF fixture");
    path
}

/// Write a file that carries a PDF extension but cannot be parsed.
pub fn write_corrupt_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.7\nthis file was truncated").expect("write corrupt fixture");
    path
}
