//! Marquee Core Library
//!
//! Platform-agnostic interaction engine for rectangle selection, multi-item
//! dragging and drop zones. The host plugs in through [`RenderSurface`] and
//! feeds input into an [`Engine`].

pub mod bus;
pub mod cache;
pub mod drag;
pub mod drop_zones;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod selectable;
pub mod selected;
pub mod selection;
pub mod selector;
pub mod selector_area;
pub mod settings;
pub mod stores;
pub mod surface;
pub mod timers;

pub use bus::{DropData, Event, InteractionData, SelectionChange, SubscriptionId, Topic};
pub use drag::DragMove;
pub use drop_zones::DropZoneConfig;
pub use engine::Engine;
pub use error::{ConfigError, ConfigResult};
pub use geometry::{BoundingRect, Edge, collides, selector_position};
pub use input::{InputEvent, KeyInput, KeyPhase, Modifiers, MouseButton, PointerInput, PointerPhase, ScrollTarget};
pub use selected::RunLabel;
pub use selection::shift_range;
pub use settings::Settings;
pub use surface::{ElementId, Flag, HeadlessSurface, ListenerGroup, RenderSurface};
