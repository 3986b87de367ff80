//! Patient lookup and storage.
//!
//! The viewer core only needs `get_patient_by_id`; the rest of the trait
//! covers the list, search and editing surface an embedding application
//! binds its patient list to. `InMemoryPatientRepository` is the reference
//! implementation backing the demo binary and the tests.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::image_loader::probe_dimensions;
use crate::models::{is_supported_image, MedicalImage, Patient};

/// Lookup and editing surface for patient records.
///
/// Implementations are synchronous; patient lookup is never a suspension
/// point for the viewer.
pub trait PatientRepository: Send + Sync {
    fn get_patient_by_id(&self, patient_id: &str) -> Option<Patient>;
    fn all_patients(&self) -> Vec<Patient>;
    /// Case-insensitive match on name or medical record number; a blank
    /// term returns everything.
    fn search_patients(&self, term: &str) -> Vec<Patient>;
    /// Store a patient, assigning an id when none is set; returns the id.
    fn add_patient(&self, patient: Patient) -> String;
    /// Replace a stored patient by id; false if unknown.
    fn update_patient(&self, patient: Patient) -> bool;
    /// Remove a patient by id; false if unknown.
    fn remove_patient(&self, patient_id: &str) -> bool;
}

/// In-memory patient list.
pub struct InMemoryPatientRepository {
    patients: RwLock<Vec<Patient>>,
    next_id: AtomicU64,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self {
            patients: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Repository pre-seeded with the sample patients.
    pub fn with_sample_data() -> Self {
        let repository = Self::new();
        for patient in sample_patients() {
            repository.add_patient(patient);
        }
        repository
    }

    fn assign_id(&self) -> String {
        format!("p{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for InMemoryPatientRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientRepository for InMemoryPatientRepository {
    fn get_patient_by_id(&self, patient_id: &str) -> Option<Patient> {
        self.patients
            .read()
            .iter()
            .find(|p| p.id == patient_id)
            .cloned()
    }

    fn all_patients(&self) -> Vec<Patient> {
        self.patients.read().clone()
    }

    fn search_patients(&self, term: &str) -> Vec<Patient> {
        let patients = self.patients.read();
        if term.trim().is_empty() {
            return patients.clone();
        }
        patients
            .iter()
            .filter(|p| p.matches_search(term))
            .cloned()
            .collect()
    }

    fn add_patient(&self, mut patient: Patient) -> String {
        if patient.id.is_empty() {
            patient.id = self.assign_id();
        }
        let id = patient.id.clone();
        info!("Patient added: {} ({})", patient.name, id);
        self.patients.write().push(patient);
        id
    }

    fn update_patient(&self, patient: Patient) -> bool {
        let mut patients = self.patients.write();
        match patients.iter_mut().find(|p| p.id == patient.id) {
            Some(existing) => {
                info!("Patient updated: {} ({})", patient.name, patient.id);
                *existing = patient;
                true
            }
            None => false,
        }
    }

    fn remove_patient(&self, patient_id: &str) -> bool {
        let mut patients = self.patients.write();
        let before = patients.len();
        patients.retain(|p| p.id != patient_id);
        patients.len() != before
    }
}

/// Sweep a directory for displayable images and append them to a patient's
/// collection. Returns the number of images imported.
///
/// Files whose dimensions cannot be probed are still imported, matching
/// the viewer's tolerance for undecodable entries.
pub fn import_images_from_dir(
    repository: &dyn PatientRepository,
    patient_id: &str,
    dir: &Path,
) -> Result<usize> {
    let mut patient = repository
        .get_patient_by_id(patient_id)
        .with_context(|| format!("Unknown patient: {}", patient_id))?;

    let mut imported = 0;
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to scan directory {:?}", dir))?;
        if !entry.file_type().is_file() || !is_supported_image(entry.path()) {
            continue;
        }

        let path = entry.path().to_path_buf();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_size = entry.metadata().map(|m| m.len()).unwrap_or(0);

        let (width, height) = match probe_dimensions(&path) {
            Ok(dims) => dims,
            Err(err) => {
                warn!("Could not read image dimensions for {:?}: {}", path, err);
                (0, 0)
            }
        };

        let id = format!("{}_img{}", patient_id, patient.images.len() + 1);
        patient.images.push(
            MedicalImage::new(id, patient_id, file_name, path)
                .with_description("Imported image")
                .with_dimensions(width, height)
                .with_file_size(file_size),
        );
        imported += 1;
    }

    info!(
        "Imported {} images from {:?} for patient {}",
        imported, dir, patient_id
    );
    repository.update_patient(patient);
    Ok(imported)
}

/// The demo data set: three patients with two studies each.
pub fn sample_patients() -> Vec<Patient> {
    vec![
        Patient::new("1", "Alice Hartmann")
            .with_birth_year(1980)
            .with_gender("F")
            .with_record_number("MR001")
            .with_images(vec![
                MedicalImage::new(
                    "img1_1",
                    "1",
                    "chest_xray_front.jpg",
                    "assets/sample/chest_xray_front.jpg",
                )
                .with_modality("X-Ray")
                .with_body_part("Chest")
                .with_description("Chest X-ray, frontal view"),
                MedicalImage::new(
                    "img1_2",
                    "1",
                    "chest_xray_side.jpg",
                    "assets/sample/chest_xray_side.jpg",
                )
                .with_modality("X-Ray")
                .with_body_part("Chest")
                .with_description("Chest X-ray, lateral view"),
            ]),
        Patient::new("2", "Boris Lindgren")
            .with_birth_year(1975)
            .with_gender("M")
            .with_record_number("MR002")
            .with_images(vec![
                MedicalImage::new(
                    "img2_1",
                    "2",
                    "brain_mri_t1.jpg",
                    "assets/sample/brain_mri_t1.jpg",
                )
                .with_modality("MRI")
                .with_body_part("Head")
                .with_description("Brain MRI, T1-weighted"),
                MedicalImage::new(
                    "img2_2",
                    "2",
                    "brain_mri_t2.jpg",
                    "assets/sample/brain_mri_t2.jpg",
                )
                .with_modality("MRI")
                .with_body_part("Head")
                .with_description("Brain MRI, T2-weighted"),
            ]),
        Patient::new("3", "Chloe Marchand")
            .with_birth_year(1990)
            .with_gender("F")
            .with_record_number("MR003")
            .with_images(vec![
                MedicalImage::new(
                    "img3_1",
                    "3",
                    "abdomen_ct_plain.jpg",
                    "assets/sample/abdomen_ct_plain.jpg",
                )
                .with_modality("CT")
                .with_body_part("Abdomen")
                .with_description("Abdominal CT, plain"),
                MedicalImage::new(
                    "img3_2",
                    "3",
                    "abdomen_ct_contrast.jpg",
                    "assets/sample/abdomen_ct_contrast.jpg",
                )
                .with_modality("CT")
                .with_body_part("Abdomen")
                .with_description("Abdominal CT, contrast-enhanced"),
            ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn lookup_by_id() {
        let repository = InMemoryPatientRepository::with_sample_data();
        let patient = repository.get_patient_by_id("2").unwrap();
        assert_eq!(patient.name, "Boris Lindgren");
        assert_eq!(patient.images.len(), 2);
        assert!(repository.get_patient_by_id("nope").is_none());
    }

    #[test]
    fn search_by_name_and_record_number() {
        let repository = InMemoryPatientRepository::with_sample_data();
        assert_eq!(repository.search_patients("alice").len(), 1);
        assert_eq!(repository.search_patients("MR00").len(), 3);
        assert_eq!(repository.search_patients("  ").len(), 3);
        assert!(repository.search_patients("zzz").is_empty());
    }

    #[test]
    fn add_assigns_id_when_missing() {
        let repository = InMemoryPatientRepository::new();
        let id = repository.add_patient(Patient::new("", "No Id"));
        assert_eq!(id, "p1");
        assert!(repository.get_patient_by_id("p1").is_some());

        let id = repository.add_patient(Patient::new("custom", "Has Id"));
        assert_eq!(id, "custom");
    }

    #[test]
    fn update_and_remove() {
        let repository = InMemoryPatientRepository::with_sample_data();
        let mut patient = repository.get_patient_by_id("1").unwrap();
        patient.name = "Renamed".into();
        assert!(repository.update_patient(patient));
        assert_eq!(repository.get_patient_by_id("1").unwrap().name, "Renamed");

        assert!(!repository.update_patient(Patient::new("ghost", "Ghost")));
        assert!(repository.remove_patient("1"));
        assert!(!repository.remove_patient("1"));
        assert_eq!(repository.all_patients().len(), 2);
    }

    #[test]
    fn import_sweeps_supported_images() {
        let dir = tempdir().unwrap();
        let png = RgbaImage::from_pixel(10, 20, Rgba([1, 2, 3, 255]));
        png.save(dir.path().join("scan_a.png")).unwrap();
        png.save(dir.path().join("scan_b.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let repository = InMemoryPatientRepository::new();
        let id = repository.add_patient(Patient::new("", "Import Target"));

        let imported = import_images_from_dir(&repository, &id, dir.path()).unwrap();
        assert_eq!(imported, 2);

        let patient = repository.get_patient_by_id(&id).unwrap();
        assert_eq!(patient.images.len(), 2);
        assert_eq!(patient.images[0].width, 10);
        assert_eq!(patient.images[0].height, 20);
        assert!(patient.images[0].file_size > 0);
    }

    #[test]
    fn import_unknown_patient_is_an_error() {
        let dir = tempdir().unwrap();
        let repository = InMemoryPatientRepository::new();
        assert!(import_images_from_dir(&repository, "ghost", dir.path()).is_err());
    }
}
