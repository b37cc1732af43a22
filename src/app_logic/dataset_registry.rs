/*
 * The client's view of the datasets registered on the service for the current
 * session, plus the dataset-related selections made locally: which dataset is
 * targeted by queries, which file is staged for upload, and the details last loaded
 * for a dataset.
 *
 * The dataset list is only ever replaced wholesale with the contents of a completed
 * refresh. Refreshes are numbered when issued, and only the completion of the most
 * recently issued refresh may replace the list.
 */
use super::client_error::ClientError;
use crate::core::{Dataset, DatasetDetails};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct DatasetRegistry {
    datasets: Vec<Dataset>,
    selected_id: Option<String>,
    details: Option<DatasetDetails>,
    chosen_upload_file: Option<PathBuf>,
    latest_refresh_sequence: u64,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn contains(&self, dataset_id: &str) -> bool {
        self.datasets.iter().any(|d| d.id == dataset_id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected_dataset(&self) -> Option<&Dataset> {
        let id = self.selected_id.as_deref()?;
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn details(&self) -> Option<&DatasetDetails> {
        self.details.as_ref()
    }

    pub fn chosen_upload_file(&self) -> Option<&Path> {
        self.chosen_upload_file.as_deref()
    }

    // Issues the sequence number for a new refresh. Never reused, even across resets.
    pub fn next_refresh_sequence(&mut self) -> u64 {
        self.latest_refresh_sequence += 1;
        self.latest_refresh_sequence
    }

    pub fn is_latest_refresh(&self, sequence: u64) -> bool {
        sequence == self.latest_refresh_sequence
    }

    /*
     * Replaces the whole dataset list. Duplicate ids keep their first occurrence.
     * The selection and loaded details survive only if their dataset is still listed.
     */
    pub fn replace_all(&mut self, datasets: Vec<Dataset>) {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            if seen.insert(dataset.id.clone()) {
                unique.push(dataset);
            } else {
                log::warn!(
                    "DatasetRegistry: Ignoring duplicate dataset id '{}' in listing.",
                    dataset.id
                );
            }
        }
        self.datasets = unique;
        log::debug!(
            "DatasetRegistry: Dataset list replaced ({} entries).",
            self.datasets.len()
        );

        if let Some(id) = self.selected_id.as_deref() {
            if !self.contains(id) {
                log::debug!("DatasetRegistry: Selected dataset '{id}' is gone; clearing selection.");
                self.selected_id = None;
            }
        }
        if let Some(id) = self.details.as_ref().map(|d| d.id.clone()) {
            if !self.contains(&id) {
                self.details = None;
            }
        }
    }

    pub fn select(&mut self, dataset_id: &str) -> Result<(), ClientError> {
        if !self.contains(dataset_id) {
            return Err(ClientError::Validation(format!(
                "Unknown dataset '{dataset_id}'"
            )));
        }
        self.selected_id = Some(dataset_id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
    }

    pub fn choose_upload_file(&mut self, file: Option<PathBuf>) {
        self.chosen_upload_file = file;
    }

    // Clears the staged file, but only if it is still the one that was uploaded.
    pub fn clear_uploaded_file(&mut self, uploaded: &Path) {
        if self.chosen_upload_file.as_deref() == Some(uploaded) {
            self.chosen_upload_file = None;
        }
    }

    pub fn set_details(&mut self, details: DatasetDetails) {
        self.details = Some(details);
    }

    pub fn clear(&mut self) {
        self.datasets.clear();
        self.selected_id = None;
        self.details = None;
        self.chosen_upload_file = None;
    }
}
