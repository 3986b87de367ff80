use tracing::warn;

/// Zoom factors offered by the viewer when no custom table is configured.
pub const DEFAULT_ZOOM_LEVELS: [f64; 11] = [
    0.1, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 3.0, 4.0, 5.0,
];

/// Ordered, immutable table of zoom factors.
///
/// The zoom index into this table is the sole source of truth for the
/// current magnification; stepping operations saturate at the ends.
#[derive(Debug, Clone)]
pub struct ZoomTable {
    levels: Vec<f64>,
    default_index: usize,
}

impl ZoomTable {
    /// Build a table from custom levels.
    ///
    /// Levels must be finite, positive and strictly increasing, with at
    /// least one entry; returns `None` otherwise so callers can fall back
    /// to the default table.
    pub fn new(levels: Vec<f64>) -> Option<Self> {
        if levels.is_empty() {
            return None;
        }
        if levels.iter().any(|l| !l.is_finite() || *l <= 0.0) {
            return None;
        }
        if levels.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }

        let default_index = Self::find_default_index(&levels);
        Some(Self {
            levels,
            default_index,
        })
    }

    /// Build a table from configured levels, falling back to the default
    /// table when the configuration is rejected.
    pub fn from_levels_or_default(levels: Vec<f64>) -> Self {
        match Self::new(levels) {
            Some(table) => table,
            None => {
                warn!("Invalid zoom level configuration, using default table");
                Self::default()
            }
        }
    }

    /// Index of `1.0`, or of the entry closest to `1.0` when a custom
    /// table omits it.
    fn find_default_index(levels: &[f64]) -> usize {
        levels
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (*a - 1.0).abs();
                let db = (*b - 1.0).abs();
                da.partial_cmp(&db).expect("levels are finite")
            })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Zoom factor at the given index, clamped to the table bounds.
    pub fn level(&self, index: usize) -> f64 {
        let index = index.min(self.levels.len() - 1);
        self.levels[index]
    }

    pub fn default_index(&self) -> usize {
        self.default_index
    }

    pub fn last_index(&self) -> usize {
        self.levels.len() - 1
    }
}

impl Default for ZoomTable {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_LEVELS.to_vec()).expect("default zoom table is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_centers_on_one() {
        let table = ZoomTable::default();
        assert_eq!(table.len(), 11);
        assert_eq!(table.level(table.default_index()), 1.0);
        assert_eq!(table.default_index(), 4);
    }

    #[test]
    fn rejects_unordered_and_non_positive_levels() {
        assert!(ZoomTable::new(vec![]).is_none());
        assert!(ZoomTable::new(vec![1.0, 0.5]).is_none());
        assert!(ZoomTable::new(vec![0.5, 0.5, 1.0]).is_none());
        assert!(ZoomTable::new(vec![-1.0, 1.0]).is_none());
        assert!(ZoomTable::new(vec![0.0, 1.0]).is_none());
        assert!(ZoomTable::new(vec![1.0, f64::NAN]).is_none());
    }

    #[test]
    fn custom_table_without_one_falls_back_to_closest() {
        let table = ZoomTable::new(vec![0.5, 0.9, 2.0, 4.0]).unwrap();
        assert_eq!(table.default_index(), 1);
        assert_eq!(table.level(table.default_index()), 0.9);
    }

    #[test]
    fn invalid_configuration_uses_default_table() {
        let table = ZoomTable::from_levels_or_default(vec![2.0, 1.0]);
        assert_eq!(table.len(), DEFAULT_ZOOM_LEVELS.len());
    }

    #[test]
    fn level_clamps_out_of_range_index() {
        let table = ZoomTable::default();
        assert_eq!(table.level(999), 5.0);
    }
}
