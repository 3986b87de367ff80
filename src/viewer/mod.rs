//! The image viewer engine: viewport navigation plus asynchronous
//! image-load orchestration.
//!
//! All mutation happens on the thread that owns the `ImageViewer`; the
//! only off-thread work is decoding, which runs in the load queue's
//! workers. Each selection bumps a generation counter and every decode
//! request carries the generation it was issued under; `pump` applies an
//! outcome only while its generation is still current, so overlapping
//! loads from rapid selection changes can never overwrite the display
//! with stale content.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::image_loader::{DecodedImage, ImageLoader};
use crate::models::MedicalImage;
use crate::patients::PatientRepository;

mod cache;
mod load_queue;
pub mod viewport;
pub mod zoom;

pub use viewport::{CursorMode, Viewport};
pub use zoom::ZoomTable;

use cache::DecodedCache;
use load_queue::{LoadOutcome, LoadQueue, LoadRequest};

/// Lifecycle of the currently selected image's load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    NoSelection,
    Loading,
    Loaded,
    Failed,
}

/// State-change notification for the view layer.
///
/// Events carry the new values and are drained with
/// [`ImageViewer::take_events`]; they replace framework-specific
/// property-change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// The image collection was replaced.
    CollectionChanged { count: usize },
    /// The selected entry changed.
    SelectionChanged { index: Option<usize> },
    ZoomChanged { level: f64 },
    PanChanged { x: f64, y: f64 },
    CursorChanged { cursor: CursorMode },
    /// The viewer-level loading flag flipped.
    LoadingChanged { loading: bool },
    /// The displayed bitmap was replaced or cleared.
    ImageChanged,
}

/// Viewer engine for one patient's image collection.
pub struct ImageViewer {
    repository: Arc<dyn PatientRepository>,
    viewport: Viewport,
    images: Vec<MedicalImage>,
    selected: Option<usize>,
    phase: LoadPhase,
    loading_message: String,
    current_image: Option<Arc<DecodedImage>>,
    generation: u64,
    queue: LoadQueue,
    cache: DecodedCache,
    events: VecDeque<ViewerEvent>,
}

impl ImageViewer {
    pub fn new(
        repository: Arc<dyn PatientRepository>,
        loader: Arc<dyn ImageLoader>,
        config: &ViewerConfig,
    ) -> Self {
        let table = ZoomTable::from_levels_or_default(config.zoom_levels.clone());
        Self {
            repository,
            viewport: Viewport::new(table),
            images: Vec::new(),
            selected: None,
            phase: LoadPhase::NoSelection,
            loading_message: String::new(),
            current_image: None,
            generation: 0,
            queue: LoadQueue::new(loader, config.load_workers),
            cache: DecodedCache::new(config.cache_bytes),
            events: VecDeque::new(),
        }
    }

    // =========================================================================
    // Selection and load orchestration
    // =========================================================================

    /// Replace the image collection with the given patient's images and
    /// auto-select the first entry.
    ///
    /// An unknown patient id behaves exactly like an empty image list.
    pub fn load_patient_images(&mut self, patient_id: &str) {
        let images = self
            .repository
            .get_patient_by_id(patient_id)
            .map(|p| p.images)
            .unwrap_or_default();
        info!(
            "Loaded {} images for patient: {}",
            images.len(),
            patient_id
        );

        self.images = images;
        self.events.push_back(ViewerEvent::CollectionChanged {
            count: self.images.len(),
        });

        if self.images.is_empty() {
            self.select_image(None);
        } else {
            self.select_image(Some(0));
        }
    }

    /// Change the selected entry.
    ///
    /// `Some(index)` issues a new load for that entry without waiting for
    /// or cancelling in-flight loads; `None` clears the display.
    /// Out-of-range indices are ignored.
    pub fn select_image(&mut self, index: Option<usize>) {
        if let Some(i) = index {
            if i >= self.images.len() {
                debug!("Ignoring selection of out-of-range image index {}", i);
                return;
            }
        }

        // The previously selected entry is no longer the one being waited
        // on, whatever its in-flight load does.
        if let Some(prev) = self.selected {
            if let Some(entry) = self.images.get_mut(prev) {
                entry.is_loading = false;
            }
        }

        // Invalidates every in-flight load, including on deselect.
        self.generation = self.generation.wrapping_add(1);
        self.selected = index;
        self.events
            .push_back(ViewerEvent::SelectionChanged { index });
        self.with_viewport(|v| v.reset_zoom());

        match index {
            Some(i) => self.begin_load(i),
            None => self.clear_display(),
        }
    }

    fn begin_load(&mut self, index: usize) {
        let entry = &self.images[index];
        let image_id = entry.id.clone();
        let file_name = entry.file_name.clone();
        let path = entry.file_path.clone();
        info!("Selected image: {}", file_name);

        if let Some(cached) = self.cache.get(&path) {
            debug!("Decoded image cache hit for {:?}", path);
            self.set_loading(false);
            self.loading_message.clear();
            self.phase = LoadPhase::Loaded;
            self.current_image = Some(cached);
            self.events.push_back(ViewerEvent::ImageChanged);
            return;
        }

        self.images[index].is_loading = true;
        self.loading_message = format!("Loading image: {}", file_name);
        self.set_loading(true);

        let submitted = self.queue.submit(LoadRequest {
            generation: self.generation,
            image_id,
            path,
        });
        if !submitted {
            warn!("Could not queue load for image: {}", file_name);
            self.images[index].is_loading = false;
            self.set_loading(false);
            self.phase = LoadPhase::Failed;
            if self.current_image.take().is_some() {
                self.events.push_back(ViewerEvent::ImageChanged);
            }
        }
    }

    fn clear_display(&mut self) {
        self.set_loading(false);
        self.phase = LoadPhase::NoSelection;
        self.loading_message.clear();
        if self.current_image.take().is_some() {
            self.events.push_back(ViewerEvent::ImageChanged);
        }
    }

    /// Apply completed load outcomes.
    ///
    /// Must be called from the owning thread, typically once per frame or
    /// after the load queue signals activity. Returns the number of
    /// outcomes drained, including discarded stale ones.
    pub fn pump(&mut self) -> usize {
        let outcomes = self.queue.poll();
        let drained = outcomes.len();
        for outcome in outcomes {
            self.apply_outcome(outcome);
        }
        drained
    }

    fn apply_outcome(&mut self, outcome: LoadOutcome) {
        // The initiating entry is done loading either way.
        if let Some(entry) = self.images.iter_mut().find(|e| e.id == outcome.image_id) {
            entry.is_loading = false;
        }

        if outcome.generation != self.generation {
            debug!("Discarding stale load result for {:?}", outcome.path);
            return;
        }

        match outcome.image {
            Some(image) => {
                info!("Image loaded: {:?}", outcome.path);
                let image = Arc::new(image);
                self.cache.insert(outcome.path, Arc::clone(&image));
                self.set_loading(false);
                self.current_image = Some(image);
                self.phase = LoadPhase::Loaded;
                self.events.push_back(ViewerEvent::ImageChanged);
            }
            None => {
                warn!("Failed to load image: {:?}", outcome.path);
                self.set_loading(false);
                self.phase = LoadPhase::Failed;
                if self.current_image.take().is_some() {
                    self.events.push_back(ViewerEvent::ImageChanged);
                }
            }
        }
    }

    fn set_loading(&mut self, loading: bool) {
        let was_loading = self.phase == LoadPhase::Loading;
        if loading {
            self.phase = LoadPhase::Loading;
        }
        if was_loading != loading {
            self.events
                .push_back(ViewerEvent::LoadingChanged { loading });
        }
    }

    // =========================================================================
    // Viewport operations
    // =========================================================================

    pub fn zoom_in(&mut self) {
        self.with_viewport(|v| v.zoom_in());
    }

    pub fn zoom_out(&mut self) {
        self.with_viewport(|v| v.zoom_out());
    }

    pub fn zoom_in_at(&mut self, x: f64, y: f64) {
        self.with_viewport(|v| v.zoom_in_at(x, y));
    }

    pub fn zoom_out_at(&mut self, x: f64, y: f64) {
        self.with_viewport(|v| v.zoom_out_at(x, y));
    }

    pub fn reset_zoom(&mut self) {
        self.with_viewport(|v| v.reset_zoom());
    }

    pub fn fit_to_window(&mut self) {
        self.with_viewport(|v| v.fit_to_window());
    }

    pub fn start_panning(&mut self, x: f64, y: f64) {
        self.with_viewport(|v| v.start_panning(x, y));
    }

    pub fn update_panning(&mut self, x: f64, y: f64) {
        self.with_viewport(|v| v.update_panning(x, y));
    }

    pub fn stop_panning(&mut self) {
        self.with_viewport(|v| v.stop_panning());
    }

    fn with_viewport<F: FnOnce(&mut Viewport)>(&mut self, f: F) {
        let zoom = self.viewport.zoom_level();
        let pan = self.viewport.pan();
        let cursor = self.viewport.cursor();

        f(&mut self.viewport);

        if self.viewport.zoom_level() != zoom {
            self.events.push_back(ViewerEvent::ZoomChanged {
                level: self.viewport.zoom_level(),
            });
        }
        let (x, y) = self.viewport.pan();
        if (x, y) != pan {
            self.events.push_back(ViewerEvent::PanChanged { x, y });
        }
        if self.viewport.cursor() != cursor {
            self.events.push_back(ViewerEvent::CursorChanged {
                cursor: self.viewport.cursor(),
            });
        }
    }

    // =========================================================================
    // Observable state
    // =========================================================================

    pub fn zoom_level(&self) -> f64 {
        self.viewport.zoom_level()
    }

    pub fn zoom_percentage(&self) -> String {
        self.viewport.zoom_percentage()
    }

    pub fn can_zoom_in(&self) -> bool {
        self.viewport.can_zoom_in()
    }

    pub fn can_zoom_out(&self) -> bool {
        self.viewport.can_zoom_out()
    }

    pub fn cursor(&self) -> CursorMode {
        self.viewport.cursor()
    }

    pub fn pan(&self) -> (f64, f64) {
        self.viewport.pan()
    }

    pub fn is_image_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    pub fn loading_message(&self) -> &str {
        &self.loading_message
    }

    pub fn current_image(&self) -> Option<Arc<DecodedImage>> {
        self.current_image.clone()
    }

    pub fn load_phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn images(&self) -> &[MedicalImage] {
        &self.images
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_image(&self) -> Option<&MedicalImage> {
        self.selected.and_then(|i| self.images.get(i))
    }

    /// Drain pending state-change events, oldest first.
    pub fn take_events(&mut self) -> Vec<ViewerEvent> {
        self.events.drain(..).collect()
    }
}
