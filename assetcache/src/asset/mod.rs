//! Asset identity, location, and decoded forms.

mod key;
mod mapping;
mod model;
mod thumbnail;

pub use key::{AssetKey, AssetKind};
pub use mapping::{category_of, index_path, remote_path, CategoryPath, DEFAULT_REMOTE_ROOT};
pub use model::ModelAsset;
pub use thumbnail::{Thumbnail, DEFAULT_THUMBNAIL_SIZE};
