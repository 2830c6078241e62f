use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CocoError, CocoResult};
use crate::models::EntityPattern;

pub const MODEL_FILE: &str = "intent_model.json";
pub const LABELS_FILE: &str = "intent_labels.json";
pub const PATTERNS_FILE: &str = "entity_patterns_compiled.json";
pub const REPORT_FILE: &str = "training_report.txt";
pub const RULES_FILE: &str = "rules.json";

/// Shape of `intent_labels.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentLabels {
    pub labels: Vec<String>,
}

/// File names inside an artifacts directory.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join(MODEL_FILE)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.root.join(LABELS_FILE)
    }

    pub fn patterns_path(&self) -> PathBuf {
        self.root.join(PATTERNS_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    pub fn rules_candidate(&self) -> PathBuf {
        self.root.join(RULES_FILE)
    }

    pub fn ensure_exists(&self) -> CocoResult<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(CocoError::MissingResource {
                path: self.root.clone(),
            })
        }
    }

    pub fn load_labels(&self) -> CocoResult<IntentLabels> {
        read_json(self.labels_path())
    }

    pub fn load_patterns(&self) -> CocoResult<Vec<EntityPattern>> {
        read_json(self.patterns_path())
    }
}

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> CocoResult<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| CocoError::io(path, err))?;
    serde_json::from_str(&raw).map_err(|err| CocoError::json(path, err))
}

/// Pretty-printed, non-ASCII characters kept verbatim.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> CocoResult<()> {
    let path = path.as_ref();
    let raw = serde_json::to_string_pretty(value).map_err(|err| CocoError::json(path, err))?;
    fs::write(path, raw).map_err(|err| CocoError::io(path, err))
}
