//! Asset name → remote location mapping.
//!
//! Asset names carry their category in a prefix (`tops_`, `hair_`, ...).
//! The mapping is pure so the same name always resolves to the same
//! remote path, independent of whether the resource index is loaded.

use super::key::AssetKind;

/// Remote root used when none is configured.
pub const DEFAULT_REMOTE_ROOT: &str = "avatar_assets";

/// Category and subcategory an asset lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPath {
    pub category: &'static str,
    pub subcategory: &'static str,
}

impl CategoryPath {
    const fn new(category: &'static str, subcategory: &'static str) -> Self {
        Self {
            category,
            subcategory,
        }
    }
}

/// Derive the category and subcategory of an asset from its name.
///
/// Names that match no rule, including `hair_` names without a
/// `_base`/`_front`/`_back` part, fall back to `base/base`.
///
/// # Example
///
/// ```
/// use assetcache::asset::category_of;
///
/// let path = category_of("tops_blue_01");
/// assert_eq!((path.category, path.subcategory), ("clothes", "tops"));
/// ```
pub fn category_of(name: &str) -> CategoryPath {
    if name.starts_with("tops_") {
        CategoryPath::new("clothes", "tops")
    } else if name.starts_with("bottoms_") {
        CategoryPath::new("clothes", "bottoms")
    } else if name.starts_with("socks_") {
        CategoryPath::new("clothes", "socks")
    } else if name.starts_with("hair_") {
        if name.contains("_base") {
            CategoryPath::new("hair", "base")
        } else if name.contains("_front") {
            CategoryPath::new("hair", "front")
        } else if name.contains("_back") {
            CategoryPath::new("hair", "back")
        } else {
            CategoryPath::new("base", "base")
        }
    } else if name.starts_with("eyebrow_") {
        CategoryPath::new("base", "eyebrows")
    } else if name.starts_with("eye_") {
        CategoryPath::new("base", "eyes")
    } else {
        CategoryPath::new("base", "base")
    }
}

/// Build the remote path for an asset.
///
/// ```text
/// <root>/<kind>/<category>/<subcategory>/<name>.<ext>
/// ```
///
/// # Example
///
/// ```
/// use assetcache::asset::{remote_path, AssetKind};
///
/// assert_eq!(
///     remote_path("avatar_assets", AssetKind::Model, "tops_blue_01"),
///     "avatar_assets/models/clothes/tops/tops_blue_01.usdz"
/// );
/// ```
pub fn remote_path(root: &str, kind: AssetKind, name: &str) -> String {
    let path = category_of(name);
    format!(
        "{}/{}/{}/{}/{}.{}",
        root.trim_end_matches('/'),
        kind.directory(),
        path.category,
        path.subcategory,
        name,
        kind.extension()
    )
}

/// Remote path of a JSON index document under the root.
pub fn index_path(root: &str, file_name: &str) -> String {
    format!("{}/json/{}", root.trim_end_matches('/'), file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(name: &str) -> (&'static str, &'static str) {
        let p = category_of(name);
        (p.category, p.subcategory)
    }

    #[test]
    fn test_clothes_prefixes() {
        assert_eq!(pair("tops_blue_01"), ("clothes", "tops"));
        assert_eq!(pair("bottoms_jeans"), ("clothes", "bottoms"));
        assert_eq!(pair("socks_red"), ("clothes", "socks"));
    }

    #[test]
    fn test_hair_parts() {
        assert_eq!(pair("hair_long_base"), ("hair", "base"));
        assert_eq!(pair("hair_bob_front_02"), ("hair", "front"));
        assert_eq!(pair("hair_bob_back"), ("hair", "back"));
        assert_eq!(pair("hair_unknown"), ("base", "base"));
    }

    #[test]
    fn test_eye_prefixes_do_not_overlap() {
        assert_eq!(pair("eye_round"), ("base", "eyes"));
        assert_eq!(pair("eyebrow_thin"), ("base", "eyebrows"));
    }

    #[test]
    fn test_fallback() {
        assert_eq!(pair("body"), ("base", "base"));
        assert_eq!(pair("Tops_upper"), ("base", "base"));
    }

    #[test]
    fn test_remote_path_thumbnail() {
        assert_eq!(
            remote_path("avatar_assets/", AssetKind::Thumbnail, "hair_bob_front_02"),
            "avatar_assets/thumbnails/hair/front/hair_bob_front_02.jpg"
        );
    }

    #[test]
    fn test_index_path() {
        assert_eq!(
            index_path("avatar_assets", "colors.json"),
            "avatar_assets/json/colors.json"
        );
    }
}
