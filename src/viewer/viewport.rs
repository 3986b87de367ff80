//! Viewport navigation: discrete zoom stepping, point-anchored zoom,
//! and the drag-panning state machine.
//!
//! All operations are pure state mutations on the UI thread; none of them
//! can fail. Calls that make no sense in the current state (zooming past a
//! table end, pan updates with no active drag) are ignored rather than
//! reported, because pointer-event delivery from a view layer cannot
//! guarantee strict ordering relative to mouse-capture loss.

use tracing::debug;

use crate::viewer::zoom::ZoomTable;

/// Cursor the view layer should display over the image surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// No magnification; nothing to drag.
    Arrow,
    /// A drag gesture is in progress.
    Hand,
    /// Magnified; the image can be dragged.
    SizeAll,
}

/// Transient state of a single drag gesture.
///
/// Exists only between `start_panning` and `stop_panning`.
#[derive(Debug, Clone, Copy)]
struct PanSession {
    last_x: f64,
    last_y: f64,
}

/// Zoom and pan state for the displayed image.
#[derive(Debug, Clone)]
pub struct Viewport {
    table: ZoomTable,
    zoom_index: usize,
    pan_x: f64,
    pan_y: f64,
    cursor: CursorMode,
    pan_session: Option<PanSession>,
}

impl Viewport {
    pub fn new(table: ZoomTable) -> Self {
        let zoom_index = table.default_index();
        let mut viewport = Self {
            table,
            zoom_index,
            pan_x: 0.0,
            pan_y: 0.0,
            cursor: CursorMode::Arrow,
            pan_session: None,
        };
        viewport.update_cursor();
        viewport
    }

    pub fn zoom_level(&self) -> f64 {
        self.table.level(self.zoom_index)
    }

    /// Zoom level formatted as an integer percentage ("125%").
    pub fn zoom_percentage(&self) -> String {
        format!("{:.0}%", self.zoom_level() * 100.0)
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom_index < self.table.last_index()
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom_index > 0
    }

    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    pub fn cursor(&self) -> CursorMode {
        self.cursor
    }

    pub fn is_panning(&self) -> bool {
        self.pan_session.is_some()
    }

    /// Step one level up the table; no-op at the top.
    pub fn zoom_in(&mut self) {
        if self.can_zoom_in() {
            self.zoom_index += 1;
            self.update_cursor();
            debug!("Zoomed in to {}", self.zoom_percentage());
        }
    }

    /// Step one level down the table; no-op at the bottom.
    pub fn zoom_out(&mut self) {
        if self.can_zoom_out() {
            self.zoom_index -= 1;
            self.update_cursor();
            debug!("Zoomed out to {}", self.zoom_percentage());
        }
    }

    /// Step one level up, keeping the given screen point visually fixed.
    ///
    /// At the top of the table this is a no-op on both zoom and pan.
    pub fn zoom_in_at(&mut self, x: f64, y: f64) {
        if self.can_zoom_in() {
            self.step_zoom_anchored(self.zoom_index + 1, x, y);
        }
    }

    /// Step one level down, keeping the given screen point visually fixed.
    pub fn zoom_out_at(&mut self, x: f64, y: f64) {
        if self.can_zoom_out() {
            self.step_zoom_anchored(self.zoom_index - 1, x, y);
        }
    }

    fn step_zoom_anchored(&mut self, new_index: usize, x: f64, y: f64) {
        let old_level = self.zoom_level();
        self.zoom_index = new_index;
        let new_level = self.zoom_level();

        // Translate so the anchor stays put: scale the anchor-to-pan vector
        // by the level ratio and re-attach it at the anchor.
        let factor = new_level / old_level;
        self.pan_x = x - (x - self.pan_x) * factor;
        self.pan_y = y - (y - self.pan_y) * factor;

        self.update_cursor();
        debug!(
            "Zoomed to {} anchored at ({:.0}, {:.0})",
            self.zoom_percentage(),
            x,
            y
        );
    }

    /// Return to the default zoom level and zero the pan.
    pub fn reset_zoom(&mut self) {
        self.zoom_index = self.table.default_index();
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.update_cursor();
        debug!("Zoom reset to {}", self.zoom_percentage());
    }

    /// Alias for `reset_zoom`; no fit-to-bounds computation is performed.
    pub fn fit_to_window(&mut self) {
        self.reset_zoom();
    }

    /// Begin a drag gesture at the given point.
    ///
    /// The cursor becomes `Hand` for the duration of the gesture even when
    /// panning is disabled at the current zoom level.
    pub fn start_panning(&mut self, x: f64, y: f64) {
        self.pan_session = Some(PanSession {
            last_x: x,
            last_y: y,
        });
        self.update_cursor();
    }

    /// Feed a pointer move into an active drag gesture.
    ///
    /// The pan only moves above 100% zoom, but the last point is tracked
    /// unconditionally so a zoom change mid-drag cannot cause a pan jump.
    /// Ignored when no gesture is active.
    pub fn update_panning(&mut self, x: f64, y: f64) {
        let Some(session) = self.pan_session.as_mut() else {
            return;
        };

        if self.table.level(self.zoom_index) > 1.0 {
            self.pan_x += x - session.last_x;
            self.pan_y += y - session.last_y;
        }
        session.last_x = x;
        session.last_y = y;
    }

    /// End the drag gesture, dropping the forced `Hand` cursor.
    ///
    /// Ignored when no gesture is active.
    pub fn stop_panning(&mut self) {
        if self.pan_session.take().is_some() {
            self.update_cursor();
        }
    }

    fn update_cursor(&mut self) {
        self.cursor = if self.pan_session.is_some() {
            CursorMode::Hand
        } else if self.zoom_level() > 1.0 {
            CursorMode::SizeAll
        } else {
            CursorMode::Arrow
        };
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ZoomTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoomed_in(steps: usize) -> Viewport {
        let mut viewport = Viewport::default();
        for _ in 0..steps {
            viewport.zoom_in();
        }
        viewport
    }

    #[test]
    fn zoom_in_then_out_restores_level() {
        let mut viewport = Viewport::default();
        let level = viewport.zoom_level();
        viewport.zoom_in();
        viewport.zoom_out();
        assert_eq!(viewport.zoom_level(), level);
    }

    #[test]
    fn zoom_saturates_at_table_ends() {
        let mut viewport = Viewport::default();
        for _ in 0..32 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom_level(), 5.0);
        assert!(!viewport.can_zoom_in());
        viewport.zoom_in();
        assert_eq!(viewport.zoom_level(), 5.0);

        for _ in 0..32 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.zoom_level(), 0.1);
        assert!(!viewport.can_zoom_out());
        viewport.zoom_out();
        assert_eq!(viewport.zoom_level(), 0.1);
    }

    #[test]
    fn zoom_percentage_formatting() {
        let mut viewport = Viewport::default();
        assert_eq!(viewport.zoom_percentage(), "100%");
        viewport.zoom_in();
        assert_eq!(viewport.zoom_percentage(), "125%");
    }

    #[test]
    fn anchored_zoom_keeps_point_fixed() {
        let mut viewport = Viewport::default();
        viewport.zoom_in_at(100.0, 100.0);
        // 1.0 -> 1.25: pan' = 100 - (100 - 0) * 1.25 = -25
        assert_eq!(viewport.zoom_level(), 1.25);
        assert_eq!(viewport.pan(), (-25.0, -25.0));
    }

    #[test]
    fn anchored_zoom_at_top_is_a_full_no_op() {
        let mut viewport = Viewport::default();
        for _ in 0..32 {
            viewport.zoom_in();
        }
        let pan = viewport.pan();
        viewport.zoom_in_at(50.0, 50.0);
        assert_eq!(viewport.zoom_level(), 5.0);
        assert_eq!(viewport.pan(), pan);
    }

    #[test]
    fn reset_zoom_restores_defaults() {
        let mut viewport = zoomed_in(3);
        viewport.start_panning(0.0, 0.0);
        viewport.update_panning(40.0, 25.0);
        viewport.stop_panning();
        assert_ne!(viewport.pan(), (0.0, 0.0));

        viewport.reset_zoom();
        assert_eq!(viewport.zoom_level(), 1.0);
        assert_eq!(viewport.pan(), (0.0, 0.0));
        assert_eq!(viewport.cursor(), CursorMode::Arrow);
    }

    #[test]
    fn panning_disabled_at_or_below_full_size() {
        let mut viewport = Viewport::default();
        viewport.start_panning(10.0, 10.0);
        viewport.update_panning(60.0, 60.0);
        assert_eq!(viewport.pan(), (0.0, 0.0));
        viewport.stop_panning();

        viewport.zoom_out();
        viewport.start_panning(10.0, 10.0);
        viewport.update_panning(60.0, 60.0);
        assert_eq!(viewport.pan(), (0.0, 0.0));
    }

    #[test]
    fn panning_moves_when_magnified() {
        let mut viewport = zoomed_in(1);
        viewport.start_panning(10.0, 10.0);
        viewport.update_panning(60.0, 35.0);
        assert_eq!(viewport.pan(), (50.0, 25.0));
        viewport.update_panning(70.0, 40.0);
        assert_eq!(viewport.pan(), (60.0, 30.0));
    }

    #[test]
    fn cursor_follows_gesture_and_zoom() {
        let mut viewport = Viewport::default();
        assert_eq!(viewport.cursor(), CursorMode::Arrow);

        viewport.start_panning(0.0, 0.0);
        assert_eq!(viewport.cursor(), CursorMode::Hand);
        viewport.stop_panning();
        assert_eq!(viewport.cursor(), CursorMode::Arrow);

        viewport.zoom_in();
        assert_eq!(viewport.cursor(), CursorMode::SizeAll);
        viewport.start_panning(0.0, 0.0);
        assert_eq!(viewport.cursor(), CursorMode::Hand);
        viewport.stop_panning();
        assert_eq!(viewport.cursor(), CursorMode::SizeAll);
    }

    #[test]
    fn zoom_mid_drag_does_not_jump_pan() {
        let mut viewport = Viewport::default();
        viewport.start_panning(10.0, 10.0);
        // Below 100% nothing moves, but the last point keeps tracking.
        viewport.update_panning(200.0, 200.0);
        assert_eq!(viewport.pan(), (0.0, 0.0));

        viewport.zoom_in();
        viewport.zoom_in();
        let (pan_x, pan_y) = viewport.pan();
        viewport.update_panning(205.0, 203.0);
        assert_eq!(viewport.pan(), (pan_x + 5.0, pan_y + 3.0));
    }

    #[test]
    fn pan_events_ignored_while_idle() {
        let mut viewport = zoomed_in(2);
        let pan = viewport.pan();
        viewport.update_panning(500.0, 500.0);
        assert_eq!(viewport.pan(), pan);
        viewport.stop_panning();
        assert_eq!(viewport.cursor(), CursorMode::SizeAll);
    }

    #[test]
    fn hand_cursor_is_unconditional_on_start() {
        let mut viewport = Viewport::default();
        viewport.zoom_out();
        viewport.start_panning(0.0, 0.0);
        assert_eq!(viewport.cursor(), CursorMode::Hand);
    }
}
