// src/mime.rs

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Extension used when a content type has no entry in the table.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Entries used when no table file has been installed.
const BUILTIN: &[(&str, &str)] = &[
    ("bin", "application/octet-stream"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("xml", "application/xml"),
    ("js", "application/javascript"),
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
];

static GLOBAL: OnceLock<MimeTable> = OnceLock::new();

#[derive(Debug, Error)]
pub enum MimeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed mime table entry on line {line}: {content}")]
    Malformed { line: usize, content: String },
    #[error("mime table already initialized")]
    AlreadyInitialized,
}

/// Maps content types to file extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeTable {
    extensions: HashMap<String, String>,
}

impl MimeTable {
    pub fn builtin() -> Self {
        let extensions = BUILTIN
            .iter()
            .map(|(ext, mime)| (mime.to_string(), ext.to_string()))
            .collect();
        Self { extensions }
    }

    /// Parses lines of the form `'mp4' => 'video/mp4',`. Blank lines are skipped.
    ///
    /// When a content type appears more than once the last extension wins.
    pub fn parse(source: &str) -> Result<Self, MimeError> {
        let mut extensions = HashMap::new();
        for (i, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let cleaned: String = line.chars().filter(|c| *c != '\'' && *c != ',').collect();
            let (ext, mime) = cleaned
                .split_once("=>")
                .map(|(e, m)| (e.trim(), m.trim()))
                .filter(|(e, m)| !e.is_empty() && !m.is_empty())
                .ok_or_else(|| MimeError::Malformed { line: i + 1, content: line.to_string() })?;
            extensions.insert(mime.to_ascii_lowercase(), ext.to_string());
        }
        Ok(Self { extensions })
    }

    pub async fn load(path: &Path) -> Result<Self, MimeError> {
        let source = tokio::fs::read_to_string(path).await?;
        Self::parse(&source)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Looks up the extension for a content type, ignoring case and any
    /// `; charset=...` style parameters.
    pub fn lookup(&self, content_type: &str) -> Option<&str> {
        let essence = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        self.extensions.get(&essence).map(String::as_str)
    }

    /// Like [`lookup`](Self::lookup) but never misses.
    pub fn extension_for(&self, content_type: &str) -> &str {
        self.lookup(content_type).unwrap_or(FALLBACK_EXTENSION)
    }
}

/// Installs the process-wide table. Only the first call succeeds.
pub fn init_global(table: MimeTable) -> Result<(), MimeError> {
    GLOBAL.set(table).map_err(|_| MimeError::AlreadyInitialized)
}

/// The process-wide table; the built-in one if nothing was installed.
pub fn global() -> &'static MimeTable {
    GLOBAL.get_or_init(MimeTable::builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_lines() {
        let table = MimeTable::parse(
            "'mp4' => 'video/mp4',\n\n  'png' => 'image/png',\n'jpeg' => 'image/jpeg',\n'jpg' => 'image/jpeg',\n",
        )
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup("video/mp4"), Some("mp4"));
        assert_eq!(table.lookup("image/jpeg"), Some("jpg"));
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let err = MimeTable::parse("'mp4' => 'video/mp4',\nnot a mapping\n").unwrap_err();
        match err {
            MimeError::Malformed { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "not a mapping");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lookup_ignores_parameters_and_case() {
        let table = MimeTable::builtin();
        assert_eq!(table.lookup("Text/HTML; charset=UTF-8"), Some("html"));
    }

    #[test]
    fn test_miss_falls_back() {
        let table = MimeTable::builtin();
        assert_eq!(table.lookup("application/x-made-up"), None);
        assert_eq!(table.extension_for("application/x-made-up"), "bin");
        assert_eq!(table.extension_for(""), "bin");
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mime");
        tokio::fs::write(&path, "'flac' => 'audio/flac',\n").await.unwrap();
        let table = MimeTable::load(&path).await.unwrap();
        assert_eq!(table.extension_for("audio/flac"), "flac");

        assert!(matches!(
            MimeTable::load(&dir.path().join("missing")).await,
            Err(MimeError::Io(_))
        ));
    }
}
