//! Engine configuration.

use crate::error::{ConfigError, ConfigResult};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Keys that move the selection during a keyboard drag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragKeys {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

impl Default for DragKeys {
    fn default() -> Self {
        Self {
            up: vec!["ArrowUp".to_string()],
            down: vec!["ArrowDown".to_string()],
            left: vec!["ArrowLeft".to_string()],
            right: vec!["ArrowRight".to_string()],
        }
    }
}

impl DragKeys {
    /// Unit direction bound to `key` (case-insensitive), if any.
    pub fn direction(&self, key: &str) -> Option<Vec2> {
        let matches = |keys: &[String]| keys.iter().any(|k| k.eq_ignore_ascii_case(key));
        if matches(&self.up) {
            Some(Vec2::new(0.0, -1.0))
        } else if matches(&self.down) {
            Some(Vec2::new(0.0, 1.0))
        } else if matches(&self.left) {
            Some(Vec2::new(-1.0, 0.0))
        } else if matches(&self.right) {
            Some(Vec2::new(1.0, 0.0))
        } else {
            None
        }
    }
}

/// Window auto-scroll while the selection rectangle is near the viewport edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorAutoScroll {
    /// Pixels scrolled per step.
    pub speed: f64,
    pub interval_ms: u64,
    /// Distance from the viewport edge at which scrolling starts. Negative
    /// values mean the pointer has to leave the viewport first.
    pub edge_threshold: f64,
}

impl Default for SelectorAutoScroll {
    fn default() -> Self {
        Self {
            speed: 20.0,
            interval_ms: 50,
            edge_threshold: -15.0,
        }
    }
}

/// Engine configuration. Every field has a default, so partial JSON
/// objects deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Allow dragging selected items.
    pub draggability: bool,
    /// Pressing an unselected item selects it and starts dragging at once.
    pub immediate_drag: bool,
    pub keyboard_drag: bool,
    /// Pixels moved per key press.
    pub keyboard_drag_speed: f64,
    pub drag_keys: DragKeys,
    /// Treat every gesture as if a multi-select modifier were held.
    pub multi_select_mode: bool,
    /// With a multi-select modifier, covering an already selected item
    /// deselects it.
    pub multi_select_toggling: bool,
    /// Bump stacking layers on selection and while dragging.
    pub use_layers: bool,
    /// Near-miss tolerance for drop targets, clamped to 0..=0.5 at use.
    pub drop_target_threshold: f64,
    /// Distance from the area edge at which area auto-scroll starts.
    pub overflow_tolerance: Vec2,
    /// Pixels scrolled per area auto-scroll step.
    pub auto_scroll_speed: f64,
    /// Zoom factor applied to the area.
    pub zoom: f64,
    /// Time-to-live of cached item rectangles, in milliseconds.
    pub refresh_memory_rate: u64,
    /// Time after which a held system key is considered released, in milliseconds.
    pub key_decay: u64,
    /// Pointer travel (per axis) before a gesture publishes updates.
    pub drag_threshold: f64,
    pub selector_auto_scroll: SelectorAutoScroll,
    /// Interval of the area auto-scroll check, in milliseconds.
    pub area_auto_scroll_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            draggability: true,
            immediate_drag: true,
            keyboard_drag: true,
            keyboard_drag_speed: 10.0,
            drag_keys: DragKeys::default(),
            multi_select_mode: false,
            multi_select_toggling: true,
            use_layers: true,
            drop_target_threshold: 0.0,
            overflow_tolerance: Vec2::new(25.0, 25.0),
            auto_scroll_speed: 5.0,
            zoom: 1.0,
            refresh_memory_rate: 80,
            key_decay: 500,
            drag_threshold: 5.0,
            selector_auto_scroll: SelectorAutoScroll::default(),
            area_auto_scroll_interval: 16,
        }
    }
}

impl Settings {
    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        non_negative("keyboardDragSpeed", self.keyboard_drag_speed)?;
        non_negative("dropTargetThreshold", self.drop_target_threshold)?;
        non_negative("overflowTolerance.x", self.overflow_tolerance.x)?;
        non_negative("overflowTolerance.y", self.overflow_tolerance.y)?;
        non_negative("autoScrollSpeed", self.auto_scroll_speed)?;
        non_negative("dragThreshold", self.drag_threshold)?;
        non_negative("selectorAutoScroll.speed", self.selector_auto_scroll.speed)?;

        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(invalid("zoom", format!("must be a positive number, got {}", self.zoom)));
        }
        if !self.selector_auto_scroll.edge_threshold.is_finite() {
            return Err(invalid("selectorAutoScroll.edgeThreshold", "must be finite".to_string()));
        }
        if self.selector_auto_scroll.interval_ms == 0 {
            return Err(invalid("selectorAutoScroll.intervalMs", "must be greater than zero".to_string()));
        }
        if self.area_auto_scroll_interval == 0 {
            return Err(invalid("areaAutoScrollInterval", "must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Drop target threshold as used for collision tests.
    pub fn drop_threshold(&self) -> f64 {
        self.drop_target_threshold.clamp(0.0, 0.5)
    }

    pub fn refresh_memory_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_memory_rate)
    }

    pub fn key_decay(&self) -> Duration {
        Duration::from_millis(self.key_decay)
    }

    pub fn area_auto_scroll_interval(&self) -> Duration {
        Duration::from_millis(self.area_auto_scroll_interval)
    }

    pub fn selector_auto_scroll_interval(&self) -> Duration {
        Duration::from_millis(self.selector_auto_scroll.interval_ms)
    }
}

fn non_negative(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be a non-negative number, got {value}")))
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{"zoom": 2, "multiSelectMode": true}"#).unwrap();
        assert!((settings.zoom - 2.0).abs() < f64::EPSILON);
        assert!(settings.multi_select_mode);
        assert!(settings.draggability);
        assert_eq!(settings.key_decay, 500);
        assert_eq!(settings.selector_auto_scroll, SelectorAutoScroll::default());
    }

    #[test]
    fn test_nested_partial_json() {
        let settings =
            Settings::from_json(r#"{"selectorAutoScroll": {"speed": 40}, "dragKeys": {"up": ["w"]}}"#)
                .unwrap();
        assert!((settings.selector_auto_scroll.speed - 40.0).abs() < f64::EPSILON);
        assert_eq!(settings.selector_auto_scroll.interval_ms, 50);
        assert_eq!(settings.drag_keys.direction("W"), Some(Vec2::new(0.0, -1.0)));
        assert_eq!(settings.drag_keys.direction("arrowdown"), Some(Vec2::new(0.0, 1.0)));
        assert_eq!(settings.drag_keys.direction("ArrowUp"), None);
    }

    #[test]
    fn test_invalid_values() {
        let err = Settings::from_json(r#"{"zoom": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "zoom", .. }));

        let err = Settings::from_json(r#"{"autoScrollSpeed": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "autoScrollSpeed", .. }));

        let err = Settings::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_drop_threshold_clamped() {
        let settings = Settings {
            drop_target_threshold: 2.0,
            ..Settings::default()
        };
        assert!((settings.drop_threshold() - 0.5).abs() < f64::EPSILON);
    }
}
