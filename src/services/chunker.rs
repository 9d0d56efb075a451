//! Text chunking with overlap for embedding.

use crate::error::ChunkConfigError;
use crate::models::{Chunk, ChunkMetadata};

/// Document-level metadata applied to every chunk produced from one source.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub file_name: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
}

/// Splits page text into contiguous overlapping character windows.
#[derive(Debug, Clone)]
pub struct TextChunker {
    size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker. `overlap >= size` is a configuration error and
    /// fails fast rather than producing a zero or negative step.
    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkConfigError> {
        if size == 0 {
            return Err(ChunkConfigError::ZeroSize);
        }
        if overlap >= size {
            return Err(ChunkConfigError::OverlapTooLarge { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    /// Split `text` into windows of up to `size` characters, advancing
    /// `size - overlap` characters per step. Adjacent windows share the
    /// overlap region verbatim. Non-empty input always yields at least one
    /// chunk; windows are cut on `char` boundaries.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        if total == 0 {
            return Vec::new();
        }

        let step = self.size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.size).min(total);
            chunks.push(chars[start..end].iter().collect());
            if end >= total {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Chunk one source page, tagging each window with its 1-based sequence
    /// id and the page/document provenance.
    pub fn chunk_page(
        &self,
        text: &str,
        page: u32,
        total_pages: u32,
        info: &DocumentInfo,
    ) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Chunk {
                text,
                metadata: ChunkMetadata {
                    chunk_id: idx as u32 + 1,
                    page,
                    file_name: info.file_name.clone(),
                    title: info.title.clone(),
                    author: info.author.clone(),
                    keywords: info.keywords.clone(),
                    created_at: info.created_at.clone(),
                    modified_at: info.modified_at.clone(),
                    total_pages,
                },
            })
            .collect()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}
