//! Program image loading.
//!
//! Two image formats: raw little-endian binary, and hex text with one
//! 32-bit word per line (comments after `#`, blank lines ignored). Text
//! images are detected by the `.hex` extension.

use std::fs;
use std::io::{self, Error, ErrorKind};
use std::path::Path;

/// Reads a program image into a byte vector.
///
/// # Arguments
///
/// * `path` - Image path; `.hex` selects the text format.
pub fn load_image(path: &Path) -> io::Result<Vec<u8>> {
    if path.extension().map_or(false, |e| e == "hex") {
        load_hex(path)
    } else {
        fs::read(path)
    }
}

/// Parses a hex text image: one 32-bit word per line, most significant
/// digit first, emitted little-endian.
fn load_hex(path: &Path) -> io::Result<Vec<u8>> {
    let text = fs::read_to_string(path)?;
    let mut bytes = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let word = line.split('#').next().unwrap_or("").trim();
        if word.is_empty() {
            continue;
        }
        let value = u32::from_str_radix(word.trim_start_matches("0x"), 16).map_err(|e| {
            Error::new(
                ErrorKind::InvalidData,
                format!("{}:{}: bad hex word: {}", path.display(), lineno + 1, e),
            )
        })?;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Ok(bytes)
}

/// Packs a slice of instruction words into a little-endian byte image.
///
/// Used by tests and by callers that assemble programs in memory.
pub fn words_to_image(words: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for w in words {
        bytes.extend_from_slice(&w.to_le_bytes());
    }
    bytes
}
