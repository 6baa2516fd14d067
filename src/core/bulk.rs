use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    mpsc::Sender,
};

use rayon::prelude::*;

use crate::config::StoreConfig;
use crate::core::metadata::{MetadataRecord, Result};
use crate::models::{EditAction, FieldEdit, OperationResult, ProgressEvent};

/// Applies the same field edits to many files in place, one record per file.
pub struct BulkEditor;

impl BulkEditor {
    pub fn apply(
        paths: &[PathBuf],
        edits: &[FieldEdit],
        config: &StoreConfig,
        progress_tx: Sender<ProgressEvent>,
    ) -> Vec<OperationResult> {
        Self::apply_with_cancel(paths, edits, config, progress_tx, None)
    }

    /// Results come back in input order. Files not started before the cancel
    /// flag is raised are left out.
    pub fn apply_with_cancel(
        paths: &[PathBuf],
        edits: &[FieldEdit],
        config: &StoreConfig,
        progress_tx: Sender<ProgressEvent>,
        cancel_flag: Option<&AtomicBool>,
    ) -> Vec<OperationResult> {
        let total = paths.len();
        let progress_counter = AtomicUsize::new(0);

        let mut indexed: Vec<(usize, OperationResult)> = paths
            .par_iter()
            .enumerate()
            .filter_map(|(index, path)| {
                if let Some(flag) = cancel_flag {
                    if flag.load(Ordering::Relaxed) {
                        return None;
                    }
                }

                let result = match Self::edit_file(path, edits, config) {
                    Ok(changed) => OperationResult::success(path.clone(), changed),
                    Err(err) => {
                        log::warn!("failed to edit {}: {err}", path.display());
                        OperationResult::failure(path.clone(), err.to_string())
                    }
                };

                let current = progress_counter.fetch_add(1, Ordering::Relaxed) + 1;
                let _ = progress_tx.send(ProgressEvent {
                    current,
                    total,
                    filename: Self::display_name(path),
                    success: result.success,
                });

                Some((index, result))
            })
            .collect();

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    /// Apply `edits` to one file and save it. Returns whether anything changed.
    pub fn edit_file(path: &Path, edits: &[FieldEdit], config: &StoreConfig) -> Result<bool> {
        let mut record = MetadataRecord::open_with_config(path, config.clone())?;

        for edit in edits {
            log::debug!(
                "{} {} on {}",
                edit.action.label(),
                edit.field,
                path.display()
            );
            match &edit.action {
                EditAction::Set(value) => record.set_field(edit.field, value.clone())?,
                EditAction::Delete => {
                    record.delete_field(edit.field);
                }
            }
        }

        let changed = record.is_dirty();
        record.save()?;
        Ok(changed)
    }

    fn display_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string())
    }
}
