use tracing::{info, warn};

/// Available display themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Light" => Some(Theme::Light),
            "Dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Tracks the active theme; applying it to widget resources is the view
/// layer's job.
#[derive(Debug)]
pub struct ThemeSwitcher {
    available: Vec<Theme>,
    current: Theme,
}

impl ThemeSwitcher {
    pub fn new() -> Self {
        Self {
            available: vec![Theme::Light, Theme::Dark],
            current: Theme::Light,
        }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn available(&self) -> &[Theme] {
        &self.available
    }

    /// Switch by name; unknown names are refused with a warning.
    pub fn set_theme(&mut self, name: &str) -> bool {
        match Theme::from_name(name) {
            Some(theme) => {
                self.current = theme;
                info!("Theme changed to: {}", name);
                true
            }
            None => {
                warn!("Theme not found: {}", name);
                false
            }
        }
    }

    /// Cycle to the next available theme and return it.
    pub fn switch_next(&mut self) -> Theme {
        let index = self
            .available
            .iter()
            .position(|t| *t == self.current)
            .unwrap_or(0);
        let next = self.available[(index + 1) % self.available.len()];
        self.current = next;
        info!("Theme switched to: {}", next.name());
        next
    }
}

impl Default for ThemeSwitcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_theme_by_name() {
        let mut switcher = ThemeSwitcher::new();
        assert_eq!(switcher.current(), Theme::Light);
        assert!(switcher.set_theme("Dark"));
        assert_eq!(switcher.current(), Theme::Dark);
        assert!(!switcher.set_theme("Neon"));
        assert_eq!(switcher.current(), Theme::Dark);
    }

    #[test]
    fn switch_next_cycles() {
        let mut switcher = ThemeSwitcher::new();
        assert_eq!(switcher.switch_next(), Theme::Dark);
        assert_eq!(switcher.switch_next(), Theme::Light);
    }
}
