//! Patient list and search glue over the repository.
//!
//! The browser owns the filtered patient list the view layer binds its
//! sidebar to; picking a patient hands back the id the embedder feeds
//! into `ImageViewer::load_patient_images`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::models::Patient;
use crate::patients::PatientRepository;

pub struct PatientBrowser {
    repository: Arc<dyn PatientRepository>,
    patients: Vec<Patient>,
    search_text: String,
    selected: Option<usize>,
}

impl PatientBrowser {
    /// Create a browser and load the initial patient list.
    pub fn new(repository: Arc<dyn PatientRepository>) -> Self {
        let mut browser = Self {
            repository,
            patients: Vec::new(),
            search_text: String::new(),
            selected: None,
        };
        browser.refresh();
        browser
    }

    /// Reload the list from the repository, applying the current search
    /// term. Any previous selection is dropped.
    pub fn refresh(&mut self) {
        self.patients = if self.search_text.trim().is_empty() {
            self.repository.all_patients()
        } else {
            self.repository.search_patients(&self.search_text)
        };
        self.selected = None;
        info!("Loaded {} patients", self.patients.len());
    }

    /// Update the search term and re-filter immediately.
    pub fn set_search_text(&mut self, term: impl Into<String>) {
        self.search_text = term.into();
        self.refresh();
        debug!(
            "Search for {:?} returned {} patients",
            self.search_text,
            self.patients.len()
        );
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// Select a patient by list position; returns its id for driving the
    /// viewer. Out-of-range indices clear the selection.
    pub fn select(&mut self, index: usize) -> Option<String> {
        match self.patients.get(index) {
            Some(patient) => {
                info!("Selected patient: {}", patient.name);
                self.selected = Some(index);
                Some(patient.id.clone())
            }
            None => {
                self.selected = None;
                None
            }
        }
    }

    pub fn selected_patient(&self) -> Option<&Patient> {
        self.selected.and_then(|i| self.patients.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patients::InMemoryPatientRepository;

    fn browser() -> PatientBrowser {
        PatientBrowser::new(Arc::new(InMemoryPatientRepository::with_sample_data()))
    }

    #[test]
    fn loads_patient_list_on_construction() {
        let browser = browser();
        assert_eq!(browser.patients().len(), 3);
        assert!(browser.selected_patient().is_none());
    }

    #[test]
    fn search_filters_and_blank_restores() {
        let mut browser = browser();
        browser.set_search_text("boris");
        assert_eq!(browser.patients().len(), 1);
        assert_eq!(browser.patients()[0].medical_record_number, "MR002");

        browser.set_search_text("");
        assert_eq!(browser.patients().len(), 3);
    }

    #[test]
    fn select_returns_patient_id() {
        let mut browser = browser();
        let id = browser.select(1).unwrap();
        assert_eq!(id, browser.selected_patient().unwrap().id);

        assert!(browser.select(99).is_none());
        assert!(browser.selected_patient().is_none());
    }
}
