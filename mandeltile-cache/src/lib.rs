pub mod cache;
pub mod config;
pub mod inflight;
pub mod split;
pub mod store;

pub use cache::{BuildReport, TileCache};
pub use config::{CacheConfig, SplitMode};
pub use inflight::{InFlight, InFlightGuard};
pub use split::{child_axes, child_axes_at, partition, refine};
pub use store::{StoreLayout, TileStore};
