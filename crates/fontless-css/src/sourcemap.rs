//! Source Map v3 output.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    pub sources_content: Vec<Option<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Encodes the map as a `data:` URL suitable for a `sourceMappingURL` comment.
    pub fn to_url(&self) -> serde_json::Result<String> {
        let json = self.to_json()?;
        Ok(format!(
            "data:application/json;charset=utf-8;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(json)
        ))
    }
}

const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub(crate) fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_DIGITS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Builds the `mappings` string while the output is walked front to back.
///
/// Columns are counted in UTF-16 code units, which is what JavaScript consumers expect.
pub(crate) struct MappingsBuilder<'a> {
    original: &'a str,
    line_starts: Vec<usize>,
    out: String,
    gen_col: i64,
    line_has_segment: bool,
    prev_gen_col: i64,
    prev_orig_line: i64,
    prev_orig_col: i64,
}

impl<'a> MappingsBuilder<'a> {
    pub(crate) fn new(original: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            original
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            original,
            line_starts,
            out: String::new(),
            gen_col: 0,
            line_has_segment: false,
            prev_gen_col: 0,
            prev_orig_line: 0,
            prev_orig_col: 0,
        }
    }

    fn original_position(&self, offset: usize) -> (i64, i64) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        let line_start = self.line_starts[line];
        let col: usize = self.original[line_start..offset]
            .chars()
            .map(char::len_utf16)
            .sum();
        (line as i64, col as i64)
    }

    fn segment(&mut self, orig_offset: usize) {
        if self.line_has_segment && self.gen_col == self.prev_gen_col {
            return;
        }
        let (line, col) = self.original_position(orig_offset);
        if self.line_has_segment {
            self.out.push(',');
        }
        encode_vlq(&mut self.out, self.gen_col - self.prev_gen_col);
        encode_vlq(&mut self.out, 0);
        encode_vlq(&mut self.out, line - self.prev_orig_line);
        encode_vlq(&mut self.out, col - self.prev_orig_col);
        self.prev_gen_col = self.gen_col;
        self.prev_orig_line = line;
        self.prev_orig_col = col;
        self.line_has_segment = true;
    }

    fn new_line(&mut self) {
        self.out.push(';');
        self.gen_col = 0;
        self.prev_gen_col = 0;
        self.line_has_segment = false;
    }

    pub(crate) fn advance_unmapped(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.new_line();
            } else {
                self.gen_col += ch.len_utf16() as i64;
            }
        }
    }

    pub(crate) fn advance_mapped(&mut self, text: &str, start: usize, hires: bool) {
        self.segment(start);
        let mut at_line_start = false;
        for (i, ch) in text.char_indices() {
            if at_line_start || (hires && i > 0) {
                self.segment(start + i);
                at_line_start = false;
            }
            if ch == '\n' {
                self.new_line();
                at_line_start = true;
            } else {
                self.gen_col += ch.len_utf16() as i64;
            }
        }
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}
