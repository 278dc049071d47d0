//! Knowledge source types.
//!
//! A knowledge source is an opaque reference document made visible to the
//! agents for one turn: either a default bundled document or a file the user
//! uploaded during the session. The core never parses document content -
//! text payloads are forwarded verbatim and PDF payloads as raw bytes.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Document kind, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnowledgeKind {
    Pdf,
    Text,
}

impl KnowledgeKind {
    /// Kind for a path, or `None` for unsupported extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => Some(KnowledgeKind::Pdf),
            Some(ext) if ext.eq_ignore_ascii_case("txt") => Some(KnowledgeKind::Text),
            _ => None,
        }
    }
}

/// Where a knowledge source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnowledgeOrigin {
    /// Bundled with the application (e.g. the PHQ-9 questionnaire).
    Default,
    /// Uploaded by the user during the session.
    Uploaded,
}

/// Opaque payload of a loaded source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgePayload {
    /// UTF-8 content of a text document.
    Text(String),
    /// Raw bytes of a PDF document, forwarded without parsing.
    Bytes(Vec<u8>),
}

/// One loaded reference document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeSource {
    /// Display name (the file name).
    pub name: String,
    pub kind: KnowledgeKind,
    pub origin: KnowledgeOrigin,
    pub payload: KnowledgePayload,
}

/// The set of reference documents visible to agents for one turn.
///
/// Immutable once built; rebuilt at the start of every turn so that
/// uploads become visible on the next turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeContext {
    sources: Vec<KnowledgeSource>,
}

impl KnowledgeContext {
    pub fn new(sources: Vec<KnowledgeSource>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[KnowledgeSource] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Display names of all sources, for task descriptions and logs.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn kind_from_extension() {
        assert_eq!(
            KnowledgeKind::from_path(&PathBuf::from("PHQ-9.pdf")),
            Some(KnowledgeKind::Pdf)
        );
        assert_eq!(
            KnowledgeKind::from_path(&PathBuf::from("notes.TXT")),
            Some(KnowledgeKind::Text)
        );
        assert_eq!(KnowledgeKind::from_path(&PathBuf::from("image.png")), None);
        assert_eq!(KnowledgeKind::from_path(&PathBuf::from("no_extension")), None);
    }

    #[test]
    fn context_reports_source_names() {
        let context = KnowledgeContext::new(vec![KnowledgeSource {
            name: "PHQ-9.pdf".to_string(),
            kind: KnowledgeKind::Pdf,
            origin: KnowledgeOrigin::Default,
            payload: KnowledgePayload::Bytes(vec![1, 2, 3]),
        }]);
        assert_eq!(context.source_names(), vec!["PHQ-9.pdf".to_string()]);
        assert!(!context.is_empty());
    }
}
