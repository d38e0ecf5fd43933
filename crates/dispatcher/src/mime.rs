//! MimeTable - default extension to MIME type lookup

use contracts::{MimeLookup, DEFAULT_MIME_TYPE};
use std::collections::HashMap;

const BUILTIN: &[(&str, &str)] = &[
    ("bmp", "image/bmp"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("kjb", "application/xml"),
    ("ktr", "application/xml"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    ("rtf", "application/rtf"),
    ("svg", "image/svg+xml"),
    ("tar", "application/x-tar"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("tsv", "text/tab-separated-values"),
    ("txt", "text/plain"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

/// Case-insensitive MIME table with optional overrides
#[derive(Debug, Clone)]
pub struct MimeTable {
    entries: HashMap<String, String>,
}

impl MimeTable {
    /// Table with the built-in entries only
    pub fn new() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in table with overrides applied on top
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut table = Self::new();
        for (ext, mime) in overrides {
            table.insert(ext, mime);
        }
        table
    }

    pub fn insert(&mut self, extension: &str, mime_type: &str) {
        self.entries
            .insert(normalize(extension), mime_type.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MimeLookup for MimeTable {
    fn mime_type_for(&self, extension: &str) -> &str {
        self.entries
            .get(&normalize(extension))
            .map(String::as_str)
            .unwrap_or(DEFAULT_MIME_TYPE)
    }
}

fn normalize(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}
