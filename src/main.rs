use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use medview::models::Patient;
use medview::patients::{import_images_from_dir, InMemoryPatientRepository};
use medview::{
    FileImageLoader, ImageViewer, PatientBrowser, PatientRepository, ThemeSwitcher, ViewerConfig,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medview=info".parse().unwrap()),
        )
        .init();

    let config = ViewerConfig::from_env();
    let repository = Arc::new(InMemoryPatientRepository::with_sample_data());

    // An optional directory argument is imported as an extra patient, so
    // the demo can run against real images.
    if let Some(dir) = std::env::args().nth(1).map(PathBuf::from) {
        let id = repository.add_patient(Patient::new("", "Imported Images"));
        import_images_from_dir(repository.as_ref(), &id, &dir)?;
    }

    let loader = Arc::new(FileImageLoader::new());
    let mut viewer = ImageViewer::new(repository.clone(), loader, &config);
    let mut browser = PatientBrowser::new(repository);

    let mut themes = ThemeSwitcher::new();
    info!("Active theme: {}", themes.current().name());
    themes.switch_next();

    for patient in browser.patients() {
        info!(
            "Patient {} ({}) with {} images",
            patient.name,
            patient.medical_record_number,
            patient.images.len()
        );
    }

    // Walk every patient the way a user would: select, wait for the
    // first image, then step through the viewport operations.
    let count = browser.patients().len();
    for index in 0..count {
        let Some(patient_id) = browser.select(index) else {
            continue;
        };
        viewer.load_patient_images(&patient_id);

        for _ in 0..50 {
            viewer.pump();
            if !viewer.is_image_loading() {
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        info!(
            "Viewer state: phase {:?}, zoom {}, {} events",
            viewer.load_phase(),
            viewer.zoom_percentage(),
            viewer.take_events().len()
        );

        viewer.zoom_in_at(100.0, 100.0);
        viewer.start_panning(100.0, 100.0);
        viewer.update_panning(140.0, 120.0);
        viewer.stop_panning();
        info!(
            "After zoom and pan: {} at pan ({:.0}, {:.0}), cursor {:?}",
            viewer.zoom_percentage(),
            viewer.pan().0,
            viewer.pan().1,
            viewer.cursor()
        );
        viewer.reset_zoom();
    }

    Ok(())
}
