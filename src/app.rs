//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the track list, the
//! selection, the open popup and the now-playing slot.

mod model;

pub use model::*;
