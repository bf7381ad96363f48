//! Line-oriented detection / ground-truth records.
//!
//! Each line reads `<image key> <x offset> [reserved...]`; records are grouped
//! by key. Trailing fields (`y width height` in files this crate writes) are
//! ignored on input.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::error::{Error, Result};
use crate::window::{WIN_HEIGHT, WIN_WIDTH};

/// Horizontal window offsets grouped by image key, keys sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    records: BTreeMap<String, Vec<i64>>,
}

impl AnnotationSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `offset` to the record of `key`.
    pub fn insert(&mut self, key: impl Into<String>, offset: i64) {
        self.records.entry(key.into()).or_default().push(offset);
    }

    /// Offsets recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&[i64]> {
        self.records.get(key).map(Vec::as_slice)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if there is no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of offsets across all keys.
    pub fn total(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[i64])> + '_ {
        self.records
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Sort every record's offsets ascending.
    pub fn sort_offsets(&mut self) {
        for offsets in self.records.values_mut() {
            offsets.sort_unstable();
        }
    }

    /// Parse annotation text; `path` is only used in error messages.
    ///
    /// Blank lines are skipped. Offsets are sorted ascending per key.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut set = Self::new();
        for (idx, line) in text.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            let Some(key) = tokens.next() else {
                continue;
            };
            let offset = tokens
                .next()
                .ok_or_else(|| Error::format(path, idx + 1, format!("record '{key}' has no offset")))?;
            let offset = offset.parse::<i64>().map_err(|_| {
                Error::format(path, idx + 1, format!("offset '{offset}' is not an integer"))
            })?;
            set.insert(key, offset);
        }
        set.sort_offsets();
        Ok(set)
    }

    /// Read and parse an annotation file.
    pub fn read_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Render as `<key> <offset> 0 <WIN_WIDTH> <WIN_HEIGHT>` lines.
    ///
    /// Offsets keep their stored order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, offsets) in self.iter() {
            for offset in offsets {
                let _ = writeln!(out, "{key} {offset} 0 {WIN_WIDTH} {WIN_HEIGHT}");
            }
        }
        out
    }

    /// Write [`AnnotationSet::render`] output to `path`.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render()).map_err(|e| Error::io(path, e))
    }
}
