//! Scrollback capture and restore
//!
//! Captured pane text is stored compressed inside the snapshot. Capture is
//! best-effort plain text, not a terminal image; restore hands the lines
//! back for display, never re-injects them into a live terminal.

use tracing::debug;

use remux_protocol::{CompressionMethod, ScrollbackBlob};
use remux_utils::{RemuxError, Result};

/// Compresses and restores captured scrollback text
#[derive(Debug, Clone)]
pub struct ScrollbackCodec {
    /// Maximum lines to keep per pane
    max_lines: usize,
}

impl ScrollbackCodec {
    /// Create a codec keeping at most `max_lines` per pane
    pub fn new(max_lines: usize) -> Self {
        Self { max_lines }
    }

    /// Compress captured lines into a storable blob
    ///
    /// Keeps the newest `max_lines` lines. Empty input produces an empty
    /// uncompressed blob.
    pub fn encode(&self, lines: &[String]) -> ScrollbackBlob {
        let lines = if self.max_lines > 0 && lines.len() > self.max_lines {
            &lines[lines.len() - self.max_lines..]
        } else {
            lines
        };

        if lines.is_empty() {
            return ScrollbackBlob {
                line_count: 0,
                compressed_data: Vec::new(),
                compression: CompressionMethod::None,
            };
        }

        let raw: Vec<u8> = lines.join("\n").into_bytes();
        let compressed = lz4_flex::compress_prepend_size(&raw);

        debug!(
            "Encoded {} scrollback lines ({} bytes -> {} bytes)",
            lines.len(),
            raw.len(),
            compressed.len()
        );

        ScrollbackBlob {
            line_count: lines.len(),
            compressed_data: compressed,
            compression: CompressionMethod::Lz4,
        }
    }

    /// Decompress a blob back into lines
    pub fn decode(&self, blob: &ScrollbackBlob) -> Result<Vec<String>> {
        if blob.line_count == 0 {
            return Ok(Vec::new());
        }

        let raw = match blob.compression {
            CompressionMethod::None => blob.compressed_data.clone(),
            CompressionMethod::Lz4 => lz4_flex::decompress_size_prepended(&blob.compressed_data)
                .map_err(|e| {
                    RemuxError::persistence(format!("LZ4 decompression failed: {}", e))
                })?,
        };

        let text = String::from_utf8(raw)
            .map_err(|e| RemuxError::persistence(format!("Scrollback is not UTF-8: {}", e)))?;

        Ok(text.lines().map(|l| l.to_string()).collect())
    }

    /// Extract the last `preview_lines` lines as a plain-text preview
    pub fn tail_preview(lines: &[String], preview_lines: usize) -> String {
        let start = lines.len().saturating_sub(preview_lines);
        lines[start..].join("\n")
    }
}
