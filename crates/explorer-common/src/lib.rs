//! Common types shared across the tile explorer crates.

pub mod error;
pub mod key;
pub mod metadata;
pub mod stretch;

pub use error::{ExplorerError, ExplorerResult};
pub use key::{DatasetIdentity, DatasetRecord, Key};
pub use metadata::{
    ApiMessage, ColormapEntry, ColormapResponse, DatasetsResponse, KeysResponse, Metadata,
};
pub use stretch::{default_stretch, Stretch};
