//! Viewer configuration from the environment, with parse-or-default
//! fallback: malformed values never fail, they fall back.

use crate::viewer::zoom::DEFAULT_ZOOM_LEVELS;

/// Default budget for the decoded-image cache.
pub const DEFAULT_CACHE_MB: usize = 256;

/// Default number of decode worker threads.
pub const DEFAULT_LOAD_WORKERS: usize = 2;

/// Runtime configuration for the image viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Ascending zoom factors offered by the viewer.
    pub zoom_levels: Vec<f64>,
    /// Decoded-image cache budget in bytes.
    pub cache_bytes: usize,
    /// Number of decode worker threads.
    pub load_workers: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            zoom_levels: DEFAULT_ZOOM_LEVELS.to_vec(),
            cache_bytes: DEFAULT_CACHE_MB * 1024 * 1024,
            load_workers: DEFAULT_LOAD_WORKERS,
        }
    }
}

impl ViewerConfig {
    /// Build a configuration from `MEDVIEW_*` environment variables,
    /// falling back to defaults for anything absent or malformed.
    pub fn from_env() -> Self {
        Self {
            zoom_levels: std::env::var("MEDVIEW_ZOOM_LEVELS")
                .ok()
                .and_then(|raw| parse_zoom_levels(&raw))
                .unwrap_or_else(|| DEFAULT_ZOOM_LEVELS.to_vec()),
            cache_bytes: std::env::var("MEDVIEW_CACHE_MB")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(DEFAULT_CACHE_MB * 1024 * 1024),
            load_workers: std::env::var("MEDVIEW_LOAD_WORKERS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_LOAD_WORKERS),
        }
    }
}

/// Parse a comma-separated list of decimal zoom factors.
///
/// Returns `None` unless every entry parses to a finite positive number
/// and the sequence is strictly increasing; callers fall back to the
/// default table in that case.
pub fn parse_zoom_levels(raw: &str) -> Option<Vec<f64>> {
    let levels: Vec<f64> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;

    if levels.is_empty() {
        return None;
    }
    if levels.iter().any(|l| !l.is_finite() || *l <= 0.0) {
        return None;
    }
    if levels.windows(2).any(|w| w[0] >= w[1]) {
        return None;
    }
    Some(levels)
}
