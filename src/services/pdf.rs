//! Page-wise PDF text extraction.

use lopdf::{Dictionary, Document, Object};

use crate::error::PdfError;
use crate::services::chunker::DocumentInfo;

/// Text of one source page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    pub text: String,
}

/// A parsed PDF: per-page text plus the document information dictionary.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub pages: Vec<PageText>,
    pub info: DocumentInfo,
    pub total_pages: u32,
}

/// Parse a PDF from memory and extract text page by page, together with the
/// Title/Author/Keywords/CreationDate/ModDate entries of the Info dictionary.
///
/// Pages whose content streams cannot be decoded contribute empty text
/// rather than failing the whole document.
pub fn extract(bytes: &[u8], file_name: &str) -> Result<PdfDocument, PdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfError::ParseError(e.to_string()))?;

    let page_map = doc.get_pages();
    if page_map.is_empty() {
        return Err(PdfError::EmptyDocument);
    }
    let total_pages = page_map.len() as u32;

    let mut pages = Vec::with_capacity(page_map.len());
    for page_number in page_map.keys() {
        let text = doc
            .extract_text(&[*page_number])
            .unwrap_or_default()
            .trim()
            .to_string();
        pages.push(PageText {
            page: *page_number,
            text,
        });
    }

    let mut info = document_info(&doc);
    info.file_name = file_name.to_string();

    Ok(PdfDocument {
        pages,
        info,
        total_pages,
    })
}

fn document_info(doc: &Document) -> DocumentInfo {
    let info_dict = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| match obj {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        });

    match info_dict {
        Some(dict) => DocumentInfo {
            file_name: String::new(),
            title: info_string(dict, b"Title"),
            author: info_string(dict, b"Author"),
            keywords: info_string(dict, b"Keywords"),
            created_at: info_string(dict, b"CreationDate"),
            modified_at: info_string(dict, b"ModDate"),
        },
        None => DocumentInfo::default(),
    }
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => {
            let value = String::from_utf8_lossy(bytes).trim().to_string();
            if value.is_empty() { None } else { Some(value) }
        }
        _ => None,
    })
}
