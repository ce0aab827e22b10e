//! High-level facade over the cache, loaders, and index.
//!
//! [`AssetCache`] wires the memory and disk caches, request coalescing,
//! batch loading, and the maintenance daemon behind one API.

mod facade;
mod fetch;

pub use facade::AssetCache;
