//! Asset identifiers.

use std::fmt;
use std::sync::Arc;

use crate::error::AssetError;

/// Logical name of an asset, shared by every cache tier and the remote store.
///
/// Cheap to clone; the name is reference counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey(Arc<str>);

impl AssetKey {
    /// Creates a key, rejecting empty or whitespace-only names.
    pub fn new(name: impl AsRef<str>) -> Result<Self, AssetError> {
        let name = name.as_ref();
        if name.trim().is_empty() {
            return Err(AssetError::InvalidKey(name.to_string()));
        }
        Ok(Self(Arc::from(name)))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The two kinds of asset the cache serves.
///
/// Each kind has its own remote directory, file extension, disk
/// subdirectory, size limit and decoder; everything else is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// A 3D model package.
    Model,
    /// A preview image for a model.
    Thumbnail,
}

impl AssetKind {
    /// Every kind, in a stable order.
    pub const ALL: [AssetKind; 2] = [AssetKind::Model, AssetKind::Thumbnail];

    /// Directory segment used in remote paths and under the disk cache root.
    pub fn directory(self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Thumbnail => "thumbnails",
        }
    }

    /// File extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Model => "usdz",
            Self::Thumbnail => "jpg",
        }
    }

    /// Short lowercase label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_rejects_empty() {
        assert!(matches!(AssetKey::new(""), Err(AssetError::InvalidKey(_))));
        assert!(matches!(AssetKey::new("   "), Err(AssetError::InvalidKey(_))));
    }

    #[test]
    fn test_key_roundtrips_name() {
        let key = AssetKey::new("tops_blue_01").unwrap();
        assert_eq!(key.as_str(), "tops_blue_01");
        assert_eq!(key.to_string(), "tops_blue_01");
        assert_eq!(key, AssetKey::new("tops_blue_01").unwrap());
    }

    #[test]
    fn test_kind_layout() {
        assert_eq!(AssetKind::Model.directory(), "models");
        assert_eq!(AssetKind::Model.extension(), "usdz");
        assert_eq!(AssetKind::Thumbnail.directory(), "thumbnails");
        assert_eq!(AssetKind::Thumbnail.extension(), "jpg");
        assert_ne!(
            AssetKind::Model.directory(),
            AssetKind::Thumbnail.directory()
        );
    }
}
