//! Knowledge context resolution.
//!
//! The builder tracks the default document paths plus anything the user
//! uploaded during the session, and materializes a fresh immutable
//! [`KnowledgeContext`] at the start of each turn. A source that fails to
//! load is omitted from the turn with a warning for the UI collaborator -
//! never a failed turn.

use sana_core::error::{Result, SanaError};
use sana_core::knowledge::{
    KnowledgeContext, KnowledgeKind, KnowledgeOrigin, KnowledgePayload, KnowledgeSource,
};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Result of resolving the knowledge context for one turn.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBuild {
    pub context: KnowledgeContext,
    /// Human-readable warnings for sources that were omitted.
    pub warnings: Vec<String>,
}

/// Resolves the documents visible to agents each turn.
pub struct KnowledgeContextBuilder {
    defaults: Vec<PathBuf>,
    uploads: RwLock<Vec<PathBuf>>,
}

impl KnowledgeContextBuilder {
    /// Creates a builder with the configured default document paths.
    pub fn new(defaults: Vec<PathBuf>) -> Self {
        Self {
            defaults,
            uploads: RwLock::new(Vec::new()),
        }
    }

    /// Registers an uploaded file for all subsequent turns.
    ///
    /// Returns the display name of the accepted file. Unsupported or
    /// unreadable files are rejected here, at upload time, so the user
    /// gets immediate feedback instead of a silent omission later.
    pub async fn add_upload(&self, path: PathBuf) -> Result<String> {
        if KnowledgeKind::from_path(&path).is_none() {
            return Err(SanaError::knowledge(format!(
                "unsupported file type for {}: only .pdf and .txt are accepted",
                path.display()
            )));
        }
        if !path.exists() {
            return Err(SanaError::knowledge(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let name = display_name(&path);
        let mut uploads = self.uploads.write().await;
        if !uploads.contains(&path) {
            uploads.push(path);
        }
        Ok(name)
    }

    /// Currently registered uploads.
    pub async fn uploads(&self) -> Vec<PathBuf> {
        self.uploads.read().await.clone()
    }

    /// Materializes the knowledge context for one turn.
    ///
    /// Default documents that are absent on disk are skipped quietly (they
    /// are optional); any source that exists but cannot be read is omitted
    /// with a warning.
    pub async fn build(&self) -> KnowledgeBuild {
        let mut sources = Vec::new();
        let mut warnings = Vec::new();

        for path in &self.defaults {
            if !path.exists() {
                tracing::debug!(path = %path.display(), "default knowledge source absent, skipping");
                continue;
            }
            match load_source(path, KnowledgeOrigin::Default) {
                Ok(source) => sources.push(source),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "omitting default knowledge source");
                    warnings.push(format!(
                        "Error loading default knowledge source {}: {err}",
                        path.display()
                    ));
                }
            }
        }

        for path in self.uploads.read().await.iter() {
            match load_source(path, KnowledgeOrigin::Uploaded) {
                Ok(source) => sources.push(source),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "omitting uploaded resource");
                    warnings.push(format!(
                        "Error loading uploaded resource {}: {err}",
                        path.display()
                    ));
                }
            }
        }

        KnowledgeBuild {
            context: KnowledgeContext::new(sources),
            warnings,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_source(path: &Path, origin: KnowledgeOrigin) -> Result<KnowledgeSource> {
    let kind = KnowledgeKind::from_path(path).ok_or_else(|| {
        SanaError::knowledge(format!("unsupported file type: {}", path.display()))
    })?;

    let payload = match kind {
        KnowledgeKind::Text => KnowledgePayload::Text(std::fs::read_to_string(path)?),
        KnowledgeKind::Pdf => KnowledgePayload::Bytes(std::fs::read(path)?),
    };

    Ok(KnowledgeSource {
        name: display_name(path),
        kind,
        origin,
        payload,
    })
}
