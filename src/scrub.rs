use regex::Regex;
use serde_json::Value;

use crate::storage::table::visit_strings;
use crate::storage::{StorageMetadata, StorageTable};

pub const REDACTED: &str = "[REDACTED]";

/// Redacts secrets from recorded data before a storage file is shared.
#[derive(Debug, Clone)]
pub struct ScrubConfig {
    patterns: Vec<Regex>,
}

impl ScrubConfig {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    pub fn default_patterns() -> Vec<Regex> {
        // No look-behind in `regex`; keep these plain.
        let raw = [
            r"sk-[A-Za-z0-9]{10,}",
            r"Bearer\s+[A-Za-z0-9._-]{10,}",
            r"(?i)(api[_-]?key|token|secret|password)\s*[=:]\s*[A-Za-z0-9._-]{8,}",
            r"AKIA[0-9A-Z]{16}",
        ];
        raw.into_iter().filter_map(|p| Regex::new(p).ok()).collect()
    }

    pub fn default_shareable() -> Self {
        Self::new(Self::default_patterns())
    }

    /// Add a pattern on top of the current ones.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn scrub_string(&self, input: &str) -> String {
        let mut out = input.to_string();
        for re in &self.patterns {
            out = re.replace_all(&out, REDACTED).into_owned();
        }
        out
    }

    /// Scrub every string inside `value` in place. Returns how many changed.
    pub fn scrub_value(&self, value: &mut Value) -> usize {
        let mut changed = 0;
        visit_strings(value, &mut |s: &mut String| self.scrub_in_place(s, &mut changed));
        changed
    }

    pub fn scrub_table(&self, table: &mut StorageTable) -> usize {
        let mut changed = 0;
        table.for_each_string_mut(&mut |s: &mut String| self.scrub_in_place(s, &mut changed));
        changed
    }

    pub fn scrub_metadata(&self, metadata: &mut StorageMetadata) -> usize {
        let mut changed = 0;
        for value in metadata.as_map_mut().values_mut() {
            changed += self.scrub_value(value);
        }
        changed
    }

    fn scrub_in_place(&self, s: &mut String, changed: &mut usize) {
        let scrubbed = self.scrub_string(s);
        if scrubbed != *s {
            *s = scrubbed;
            *changed += 1;
        }
    }
}
