//! PDF line extraction using lopdf.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::cmap::{FontDecoder, ToUnicodeMap};
use super::layout::{layout_lines, number, PageLayout, DEFAULT_MEDIA_BOX};
use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self { document: None }
    }

    fn document(&self) -> Result<&Document> {
        self.document.as_ref().ok_or(PdfError::NotLoaded)
    }

    fn page_id(&self, doc: &Document, page: u32) -> Result<ObjectId> {
        doc.get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Look up a page attribute, following `Parent` links for inherited
    /// attributes such as `Resources` and `MediaBox`.
    fn get_inherited<'a>(
        &self,
        doc: &'a Document,
        node_id: ObjectId,
        key: &[u8],
    ) -> Option<&'a Object> {
        let mut current = node_id;
        // Guards against cyclic page trees.
        for _ in 0..32 {
            let Ok(Object::Dictionary(dict)) = doc.get_object(current) else {
                return None;
            };

            if let Ok(value) = dict.get(key) {
                return doc.dereference(value).ok().map(|(_, obj)| obj);
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current = *parent_id,
                _ => return None,
            }
        }
        None
    }

    /// Get resources dictionary for a page, handling inheritance.
    fn get_page_resources<'a>(
        &self,
        doc: &'a Document,
        page_id: ObjectId,
    ) -> Option<&'a Dictionary> {
        match self.get_inherited(doc, page_id, b"Resources")? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    fn get_media_box(&self, doc: &Document, page_id: ObjectId) -> [f32; 4] {
        let Some(Object::Array(values)) = self.get_inherited(doc, page_id, b"MediaBox") else {
            return DEFAULT_MEDIA_BOX;
        };

        let numbers: Vec<f32> = values.iter().filter_map(number).collect();
        if numbers.len() != 4 {
            return DEFAULT_MEDIA_BOX;
        }

        [
            numbers[0].min(numbers[2]),
            numbers[1].min(numbers[3]),
            numbers[0].max(numbers[2]),
            numbers[1].max(numbers[3]),
        ]
    }

    /// Build string decoders for every font in the page resources.
    fn get_font_decoders(
        &self,
        doc: &Document,
        page_id: ObjectId,
    ) -> HashMap<Vec<u8>, FontDecoder> {
        let mut decoders = HashMap::new();

        let Some(resources) = self.get_page_resources(doc, page_id) else {
            return decoders;
        };
        let Ok(fonts) = resources.get(b"Font") else {
            return decoders;
        };
        let Ok((_, Object::Dictionary(font_dict))) = doc.dereference(fonts) else {
            return decoders;
        };

        for (name, font_ref) in font_dict.iter() {
            let to_unicode = match doc.dereference(font_ref) {
                Ok((_, Object::Dictionary(font))) => self.read_to_unicode(doc, font),
                _ => None,
            };
            trace!(
                "Font {}: ToUnicode {}",
                String::from_utf8_lossy(name),
                if to_unicode.is_some() { "present" } else { "absent" }
            );
            decoders.insert(name.clone(), FontDecoder::new(to_unicode));
        }

        decoders
    }

    fn read_to_unicode(&self, doc: &Document, font: &Dictionary) -> Option<ToUnicodeMap> {
        let cmap_ref = font.get(b"ToUnicode").ok()?;
        let (_, Object::Stream(stream)) = doc.dereference(cmap_ref).ok()? else {
            return None;
        };

        let data = match stream.decompressed_content() {
            Ok(d) => d,
            Err(_) => stream.content.clone(),
        };
        Some(ToUnicodeMap::parse(&data))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn page_layout(&self, page: u32) -> Result<PageLayout> {
        let doc = self.document()?;
        let page_id = self.page_id(doc, page)?;

        let content = doc.get_page_content(page_id).map_err(|e| PdfError::Content {
            page,
            reason: e.to_string(),
        })?;
        let content = Content::decode(&content).map_err(|e| PdfError::Content {
            page,
            reason: e.to_string(),
        })?;

        let fonts = self.get_font_decoders(doc, page_id);
        let media_box = self.get_media_box(doc, page_id);
        let lines = layout_lines(&content.operations, &fonts, media_box);

        debug!("Page {}: {} text lines", page, lines.len());
        Ok(PageLayout { number: page, lines })
    }
}
