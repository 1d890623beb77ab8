pub mod cache;
pub mod fuzzy;
pub mod reconnect;
pub mod rest;
pub mod status;
pub mod sync;
pub mod ws;

pub use cache::StateCache;
pub use fuzzy::ResolveResult;
pub use sync::HaSynchronizer;
