//! Client-side plumbing for browsing a raster tile backend.
//!
//! - [`urls`]: deterministic endpoint URL construction
//! - [`query`]: paginated dataset search constraints
//! - [`client`]: async HTTP access to the REST API
//! - [`cache`]: session-lifetime metadata cache

pub mod cache;
pub mod client;
pub mod query;
pub mod urls;

pub use cache::MetadataCache;
pub use client::{ClientConfig, TileClient};
pub use query::DatasetQuery;
pub use urls::{QueryOptions, TileTarget};
