//! medview: viewport navigation and image-load orchestration for a
//! per-patient image viewer.
//!
//! The engine is view-framework-free: a UI layer feeds pointer and
//! selection events into [`viewer::ImageViewer`], drains its state-change
//! events, and renders the observable state.

pub mod browser;
pub mod config;
pub mod image_loader;
pub mod models;
pub mod patients;
pub mod theme;
pub mod viewer;

pub use browser::PatientBrowser;
pub use config::ViewerConfig;
pub use image_loader::{DecodedImage, FileImageLoader, ImageLoader};
pub use patients::{InMemoryPatientRepository, PatientRepository};
pub use theme::{Theme, ThemeSwitcher};
pub use viewer::{CursorMode, ImageViewer, LoadPhase, ViewerEvent};
