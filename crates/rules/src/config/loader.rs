//! Filesystem loader for engine documents.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::schema::{ConfigEnvelope, ConfigKind};

use super::error::{ConfigError, LoadResult, LoadStatus, Result};
use super::scoring::{ScoringConfigRule, ScoringConfigSpec};
use super::thresholds::{CompiledThresholds, ThresholdConfigRule};

/// A parsed, validated engine document.
#[derive(Debug, Clone)]
pub enum ConfigDocument {
    Scoring(ScoringConfigSpec),
    Thresholds(CompiledThresholds),
}

/// Everything the engine needs from the rules directory.
#[derive(Debug)]
pub struct EngineDocuments {
    pub scoring: ScoringConfigSpec,
    pub thresholds: CompiledThresholds,
    /// Per-file outcome, in scan order.
    pub results: Vec<LoadResult>,
}

impl Default for EngineDocuments {
    fn default() -> Self {
        Self {
            scoring: ScoringConfigSpec::default(),
            thresholds: CompiledThresholds::default(),
            results: Vec::new(),
        }
    }
}

/// Scans a directory (recursively, in sorted path order) for `*.yml` /
/// `*.yaml` documents and keeps the last valid document of each kind.
/// Kinds with no valid document fall back to built-in defaults.
pub struct ConfigLoader {
    rules_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
        }
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Load every document under the rules directory.
    ///
    /// A missing directory yields the defaults. Parse and validation errors
    /// are reported per file and never abort the scan.
    pub fn load(&self) -> Result<EngineDocuments> {
        let mut docs = EngineDocuments::default();
        if !self.rules_dir.exists() {
            warn!(path = %self.rules_dir.display(), "rules directory missing, using defaults");
            return Ok(docs);
        }

        let mut files = Vec::new();
        collect_files(&self.rules_dir, &mut files)?;
        files.sort();

        for path in files {
            let status = match classify(&path) {
                Some(reason) => LoadStatus::Skipped { reason },
                None => match load_file(&path) {
                    Ok(None) => LoadStatus::Skipped {
                        reason: "disabled".to_string(),
                    },
                    Ok(Some((id, doc))) => {
                        let kind = match doc {
                            ConfigDocument::Scoring(spec) => {
                                docs.scoring = spec;
                                ConfigKind::ScoringConfig
                            }
                            ConfigDocument::Thresholds(t) => {
                                docs.thresholds = t;
                                ConfigKind::ThresholdConfig
                            }
                        };
                        info!(
                            id = %id,
                            kind = %kind,
                            path = %path.display(),
                            "loaded engine document"
                        );
                        LoadStatus::Loaded {
                            id,
                            kind: kind.to_string(),
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to load engine document");
                        LoadStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                },
            };
            docs.results.push(LoadResult { path, status });
        }

        Ok(docs)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        if path.is_dir() {
            if !hidden {
                collect_files(&path, out)?;
            }
            continue;
        }
        out.push(path);
    }
    Ok(())
}

/// Reason to skip a file, if any.
fn classify(path: &Path) -> Option<String> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name.starts_with('.') {
        return Some("dotfile".to_string());
    }
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false);
    if !is_yaml {
        return Some("not a YAML file".to_string());
    }
    None
}

/// Parse one file via two-pass deserialization.
///
/// First pass reads the envelope to find `kind`; second pass deserializes
/// the kind-specific document and validates it. Returns `Ok(None)` for
/// documents with `metadata.enabled: false`.
pub fn load_file(path: &Path) -> Result<Option<(String, ConfigDocument)>> {
    let contents = fs::read_to_string(path)?;
    parse_document(&contents)
}

/// Parse a document from a YAML string.
pub fn parse_document(contents: &str) -> Result<Option<(String, ConfigDocument)>> {
    let envelope: ConfigEnvelope = serde_yaml::from_str(contents)?;
    if envelope.metadata.id.is_empty() {
        return Err(ConfigError::Validation(
            "metadata.id must not be empty".to_string(),
        ));
    }
    if !envelope.metadata.enabled {
        return Ok(None);
    }

    let kind: ConfigKind = envelope
        .kind
        .parse()
        .map_err(|_| ConfigError::UnknownKind(envelope.kind.clone()))?;

    let doc = match kind {
        ConfigKind::ScoringConfig => {
            let rule: ScoringConfigRule = serde_yaml::from_str(contents)?;
            ConfigDocument::Scoring(rule.compile()?)
        }
        ConfigKind::ThresholdConfig => {
            let rule: ThresholdConfigRule = serde_yaml::from_str(contents)?;
            ConfigDocument::Thresholds(rule.compile()?)
        }
    };
    Ok(Some((envelope.metadata.id, doc)))
}
