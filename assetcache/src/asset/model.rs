//! Decoded model assets.

use bytes::Bytes;

use super::key::AssetKey;
use crate::error::AssetError;

/// A model package ready for the renderer.
///
/// The package format is opaque to the cache; decoding only checks that
/// the payload is usable. Clones share the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAsset {
    name: AssetKey,
    data: Bytes,
}

impl ModelAsset {
    /// Decode a model from raw package bytes.
    pub fn decode(name: &AssetKey, data: Bytes) -> Result<Self, AssetError> {
        if data.is_empty() {
            return Err(AssetError::decode(name.as_str(), "model file is empty"));
        }
        Ok(Self {
            name: name.clone(),
            data,
        })
    }

    /// The asset name this model was loaded for.
    pub fn name(&self) -> &AssetKey {
        &self.name
    }

    /// Raw package bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Package size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_empty() {
        let key = AssetKey::new("tops_blue_01").unwrap();
        let err = ModelAsset::decode(&key, Bytes::new()).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[test]
    fn test_decode_keeps_bytes() {
        let key = AssetKey::new("tops_blue_01").unwrap();
        let model = ModelAsset::decode(&key, Bytes::from_static(b"PK\x03\x04usdz")).unwrap();
        assert_eq!(model.name(), &key);
        assert_eq!(model.size_bytes(), 8);
        assert_eq!(&model.data()[..2], b"PK");
    }
}
