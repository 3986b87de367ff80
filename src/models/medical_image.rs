use std::path::{Path, PathBuf};

/// A single image attached to a patient record.
///
/// The viewer holds its working copy of these entries; `is_loading` is the
/// per-entry flag mirrored by the load orchestration while a decode for this
/// entry is in flight.
#[derive(Debug, Clone)]
pub struct MedicalImage {
    pub id: String,
    pub patient_id: String,
    pub file_name: String,
    pub file_path: PathBuf,
    pub modality: String,
    pub body_part: String,
    pub description: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub is_loading: bool,
}

impl MedicalImage {
    /// Create a new image entry with just the essential fields.
    pub fn new(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        file_name: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            patient_id: patient_id.into(),
            file_name: file_name.into(),
            file_path: file_path.into(),
            modality: String::new(),
            body_part: String::new(),
            description: String::new(),
            width: 0,
            height: 0,
            file_size: 0,
            is_loading: false,
        }
    }

    pub fn with_modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = modality.into();
        self
    }

    pub fn with_body_part(mut self, body_part: impl Into<String>) -> Self {
        self.body_part = body_part.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = file_size;
        self
    }

    /// Human-readable file size ("1.5 MB").
    pub fn file_size_formatted(&self) -> String {
        format_bytes(self.file_size)
    }
}

/// Check whether a path has a displayable image extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            matches!(
                e.to_ascii_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif"
            )
        })
        .unwrap_or(false)
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut len = bytes as f64;
    let mut order = 0;
    while len >= 1024.0 && order < UNITS.len() - 1 {
        order += 1;
        len /= 1024.0;
    }
    if (len - len.trunc()).abs() < f64::EPSILON {
        format!("{} {}", len as u64, UNITS[order])
    } else {
        format!("{:.2} {}", len, UNITS[order])
    }
}
