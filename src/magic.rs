//! Span-based source editing with source map output.
//!
//! Every rewrite in the pipeline is a combination of prepend, append and
//! whole-statement removal, so the editor only supports those three edits and
//! generates a standard v3 source map with one segment per retained original
//! line. That keeps positions valid at statement granularity, which is the
//! contract the rewrites need.

use serde_json::json;

const VLQ_CHARS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub struct MagicString {
    original: String,
    /// Rendered in reverse insertion order: the last prepend lands first.
    prepends: Vec<String>,
    appends: Vec<String>,
    /// Non-overlapping removed byte spans, kept sorted.
    removals: Vec<(u32, u32)>,
}

impl MagicString {
    pub fn new(original: &str) -> Self {
        MagicString {
            original: original.to_string(),
            prepends: Vec::new(),
            appends: Vec::new(),
            removals: Vec::new(),
        }
    }

    pub fn prepend(&mut self, content: &str) {
        self.prepends.push(content.to_string());
    }

    pub fn append(&mut self, content: &str) {
        self.appends.push(content.to_string());
    }

    /// Remove a byte span of the original source. Spans must not overlap;
    /// overlapping spans are merged.
    pub fn remove(&mut self, start: u32, end: u32) {
        self.removals.push((start, end));
        self.removals.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(self.removals.len());
        for &(start, end) in &self.removals {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        self.removals = merged;
    }

    pub fn has_edits(&self) -> bool {
        !self.prepends.is_empty() || !self.appends.is_empty() || !self.removals.is_empty()
    }

    fn prepend_block(&self) -> String {
        let mut block = String::new();
        for content in self.prepends.iter().rev() {
            block.push_str(content);
            if !content.ends_with('\n') {
                block.push('\n');
            }
        }
        block
    }

    /// The original source split into kept slices around the removals.
    fn kept_slices(&self) -> Vec<(usize, usize)> {
        let mut slices = Vec::new();
        let mut cursor = 0usize;
        for &(start, end) in &self.removals {
            let (start, end) = (start as usize, end as usize);
            if start > cursor {
                slices.push((cursor, start));
            }
            cursor = cursor.max(end);
        }
        if cursor < self.original.len() {
            slices.push((cursor, self.original.len()));
        }
        slices
    }

    pub fn to_code(&self) -> String {
        let mut out = self.prepend_block();
        for (start, end) in self.kept_slices() {
            out.push_str(&self.original[start..end]);
        }
        for content in &self.appends {
            out.push_str(content);
        }
        out
    }

    /// Generate a source map v3 object mapping retained output back to the
    /// original source. Prepended and appended lines are synthetic and carry
    /// no mappings.
    pub fn generate_map(&self, source_name: &str) -> serde_json::Value {
        let prepend_lines = self.prepend_block().matches('\n').count();

        // Walk the original once, tracking both coordinate systems.
        let mut line_segments: Vec<Vec<(u32, u32, u32)>> = Vec::new(); // (out_col, orig_line, orig_col)
        let mut out_line = 0usize;
        let mut out_col = 0u32;
        let mut orig_line = 0u32;
        let mut orig_col = 0u32;

        let bytes = self.original.as_bytes();
        let slices = self.kept_slices();
        let mut slice_iter = slices.iter().copied();
        let mut current = slice_iter.next();
        let mut at_segment_boundary = true;

        for (i, &b) in bytes.iter().enumerate() {
            let kept = loop {
                match current {
                    Some((start, end)) => {
                        if i < start {
                            break false;
                        }
                        if i < end {
                            break true;
                        }
                        current = slice_iter.next();
                        at_segment_boundary = true;
                    }
                    None => break false,
                }
            };

            if kept {
                if at_segment_boundary {
                    while line_segments.len() <= out_line {
                        line_segments.push(Vec::new());
                    }
                    line_segments[out_line].push((out_col, orig_line, orig_col));
                    at_segment_boundary = false;
                }
                if b == b'\n' {
                    out_line += 1;
                    out_col = 0;
                    at_segment_boundary = true;
                } else {
                    out_col += 1;
                }
            }

            if b == b'\n' {
                orig_line += 1;
                orig_col = 0;
            } else {
                orig_col += 1;
            }
        }

        let mut mappings = String::new();
        mappings.push_str(&";".repeat(prepend_lines));
        let mut prev_orig_line: i64 = 0;
        let mut prev_orig_col: i64 = 0;
        for (i, segments) in line_segments.iter().enumerate() {
            if i > 0 {
                mappings.push(';');
            }
            let mut prev_out_col: i64 = 0;
            for (j, &(out_col, orig_line, orig_col)) in segments.iter().enumerate() {
                if j > 0 {
                    mappings.push(',');
                }
                encode_vlq(out_col as i64 - prev_out_col, &mut mappings);
                encode_vlq(0, &mut mappings); // source index
                encode_vlq(orig_line as i64 - prev_orig_line, &mut mappings);
                encode_vlq(orig_col as i64 - prev_orig_col, &mut mappings);
                prev_out_col = out_col as i64;
                prev_orig_line = orig_line as i64;
                prev_orig_col = orig_col as i64;
            }
        }

        json!({
            "version": 3,
            "sources": [source_name],
            "sourcesContent": [self.original],
            "names": [],
            "mappings": mappings,
        })
    }
}

fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(VLQ_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}
