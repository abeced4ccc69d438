//! In-memory UI state for the tile explorer.
//!
//! Nothing here performs I/O. All mutation goes through named transition
//! methods so each one can be tested in isolation.

pub mod error_log;
pub mod layer;

pub use error_log::{ErrorEntry, ErrorLog};
pub use layer::{ActiveLayer, Channel, LayerState, RgbLayer, RgbSelection, SinglebandLayer, Transition};
