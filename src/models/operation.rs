use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{SemanticField, TagValue};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EditAction {
    Set(TagValue),
    Delete,
}

impl EditAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Set(_) => "Set",
            Self::Delete => "Delete",
        }
    }
}

/// One field-level change applied to every file of a bulk edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldEdit {
    pub field: SemanticField,
    pub action: EditAction,
}

impl FieldEdit {
    pub fn set(field: SemanticField, value: TagValue) -> Self {
        Self {
            field,
            action: EditAction::Set(value),
        }
    }

    pub fn delete(field: SemanticField) -> Self {
        Self {
            field,
            action: EditAction::Delete,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationResult {
    pub path: PathBuf,
    pub success: bool,
    /// Whether the file's metadata actually changed and was saved.
    pub changed: bool,
    pub error: Option<String>,
}

impl OperationResult {
    pub fn success(path: PathBuf, changed: bool) -> Self {
        Self {
            path,
            success: true,
            changed,
            error: None,
        }
    }

    pub fn failure(path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            path,
            success: false,
            changed: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgressEvent {
    pub current: usize,
    pub total: usize,
    pub filename: String,
    pub success: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationSummary {
    pub total: usize,
    pub succeeded: usize,
    pub changed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl OperationSummary {
    pub fn from_results(expected_total: usize, results: &[OperationResult]) -> Self {
        let succeeded = results.iter().filter(|result| result.success).count();
        let changed = results.iter().filter(|result| result.changed).count();
        let failed = results.len().saturating_sub(succeeded);
        let cancelled = expected_total.saturating_sub(results.len());

        Self {
            total: expected_total,
            succeeded,
            changed,
            failed,
            cancelled,
        }
    }
}
