//! Resource index: categories, subcategories, model names, and colors.
//!
//! The index is a handful of JSON files under `<root>/json/` in the remote
//! store:
//!
//! | file | shape |
//! |---|---|
//! | `categories.json` (optional) | `{"order": [..], "metadata": {cat: {key: value}}}` |
//! | `<category>.json` | `{"<subcategory>": ["model", ...]}` |
//! | `colors.json` | `[{"hex": "#RRGGBB"}, ...]` |
//!
//! Missing files are not errors: a missing category file is an empty
//! category, a missing `categories.json` means alphabetical order, and a
//! missing `colors.json` an empty palette.

mod color;

pub use color::Color;

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::asset::{index_path, AssetKey};
use crate::error::AssetError;
use crate::store::{RemoteAssetStore, StoreError};

/// Index file listing category order and metadata.
pub const CATEGORIES_FILE: &str = "categories.json";

/// Index file with the color palette.
pub const COLORS_FILE: &str = "colors.json";

/// Category files loaded even when `categories.json` does not list them.
pub const DEFAULT_CATEGORIES: [&str; 3] = ["base", "hair", "clothes"];

/// Subcategory name to model names.
pub type Subcategories = BTreeMap<String, Vec<String>>;

#[derive(Debug, Default, Deserialize)]
struct CategoriesFile {
    #[serde(default)]
    order: Vec<String>,
    #[serde(default)]
    metadata: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ColorEntry {
    hex: Option<String>,
}

/// In-memory resource index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceIndex {
    categories: BTreeMap<String, Subcategories>,
    order: Vec<String>,
    metadata: HashMap<String, HashMap<String, String>>,
    colors: Vec<Color>,
}

impl ResourceIndex {
    /// Builds an index from parsed parts.
    ///
    /// Categories named in `preferred_order` come first, in that order; the
    /// rest follow alphabetically.
    pub fn new(
        categories: BTreeMap<String, Subcategories>,
        preferred_order: &[String],
        metadata: HashMap<String, HashMap<String, String>>,
        colors: Vec<Color>,
    ) -> Self {
        let mut order: Vec<String> = Vec::with_capacity(categories.len());
        for name in preferred_order {
            if categories.contains_key(name) && !order.contains(name) {
                order.push(name.clone());
            }
        }
        // BTreeMap iterates alphabetically
        for name in categories.keys() {
            if !order.contains(name) {
                order.push(name.clone());
            }
        }

        Self {
            categories,
            order,
            metadata,
            colors,
        }
    }

    /// Main categories in display order.
    pub fn categories(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Subcategories of `category`, sorted. Empty for unknown categories.
    pub fn subcategories(&self, category: &str) -> Vec<&str> {
        self.categories
            .get(category)
            .map(|subs| subs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Model names in one subcategory.
    pub fn models(&self, category: &str, subcategory: &str) -> &[String] {
        self.categories
            .get(category)
            .and_then(|subs| subs.get(subcategory))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every model key of every subcategory, in subcategory order.
    ///
    /// Returns `None` for an unknown category. Blank names are skipped.
    pub fn keys_for(&self, category: &str) -> Option<Vec<AssetKey>> {
        let subs = self.categories.get(category)?;
        Some(
            subs.values()
                .flatten()
                .filter_map(|name| AssetKey::new(name).ok())
                .collect(),
        )
    }

    pub fn metadata(&self, category: &str) -> Option<&HashMap<String, String>> {
        self.metadata.get(category)
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Total number of model names across all categories.
    pub fn model_count(&self) -> usize {
        self.categories
            .values()
            .flat_map(|subs| subs.values())
            .map(Vec::len)
            .sum()
    }

    /// Downloads and parses the index from `store`.
    ///
    /// # Arguments
    ///
    /// * `root` - Remote root, e.g. `avatar_assets`
    /// * `default_categories` - Category files to load in addition to `order`
    /// * `max_bytes` - Size limit for each index file
    pub async fn load<S: RemoteAssetStore>(
        store: &S,
        root: &str,
        default_categories: &[String],
        max_bytes: u64,
    ) -> Result<Self, AssetError> {
        let categories_file = match fetch_optional(store, root, CATEGORIES_FILE, max_bytes).await? {
            Some(data) => parse_categories_file(&data)?,
            None => {
                warn!("{} not found; using alphabetical order", CATEGORIES_FILE);
                CategoriesFile::default()
            }
        };

        let mut names: Vec<&String> = Vec::new();
        for name in categories_file.order.iter().chain(default_categories) {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        let fetches = names.into_iter().map(|name| async move {
            let file_name = format!("{}.json", name);
            let subs = match fetch_optional(store, root, &file_name, max_bytes).await? {
                Some(data) => parse_category(&file_name, &data)?,
                None => {
                    debug!(category = %name, "Category file not found; treating as empty");
                    Subcategories::new()
                }
            };
            Ok::<_, AssetError>((name.clone(), subs))
        });
        let categories = futures::future::try_join_all(fetches)
            .await?
            .into_iter()
            .collect::<BTreeMap<_, _>>();

        let colors = match fetch_optional(store, root, COLORS_FILE, max_bytes).await? {
            Some(data) => parse_colors(&data)?,
            None => Vec::new(),
        };

        let index = Self::new(
            categories,
            &categories_file.order,
            categories_file.metadata,
            colors,
        );
        info!(
            categories = index.order.len(),
            models = index.model_count(),
            colors = index.colors.len(),
            "Resource index loaded"
        );
        Ok(index)
    }
}

async fn fetch_optional<S: RemoteAssetStore>(
    store: &S,
    root: &str,
    file_name: &str,
    max_bytes: u64,
) -> Result<Option<Vec<u8>>, AssetError> {
    match store.fetch(&index_path(root, file_name), max_bytes).await {
        Ok(data) => Ok(Some(data)),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_categories_file(data: &[u8]) -> Result<CategoriesFile, AssetError> {
    serde_json::from_slice(data)
        .map_err(|e| AssetError::Index(format!("{}: {}", CATEGORIES_FILE, e)))
}

fn parse_category(file_name: &str, data: &[u8]) -> Result<Subcategories, AssetError> {
    serde_json::from_slice(data).map_err(|e| AssetError::Index(format!("{}: {}", file_name, e)))
}

fn parse_colors(data: &[u8]) -> Result<Vec<Color>, AssetError> {
    let entries: Vec<ColorEntry> = serde_json::from_slice(data)
        .map_err(|e| AssetError::Index(format!("{}: {}", COLORS_FILE, e)))?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let hex = entry.hex?;
            match hex.parse::<Color>() {
                Ok(color) => Some(color),
                Err(e) => {
                    warn!(error = %e, "Skipping palette entry");
                    None
                }
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::MemoryStore;

    fn defaults() -> Vec<String> {
        DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
    }

    fn store_with_index() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(
            "avatar_assets/json/categories.json",
            br#"{"order": ["clothes", "hair"], "metadata": {"clothes": {"icon": "shirt"}}}"#.to_vec(),
        );
        store.insert(
            "avatar_assets/json/clothes.json",
            br#"{"tops": ["tops_blue_01", "tops_red_01"], "bottoms": ["bottoms_jeans_01"]}"#.to_vec(),
        );
        store.insert(
            "avatar_assets/json/hair.json",
            br#"{"front": ["hair_01_front"]}"#.to_vec(),
        );
        store.insert(
            "avatar_assets/json/colors.json",
            br##"[{"hex": "#FF0000"}, {"name": "no hex"}, {"hex": "bogus"}, {"hex": "#00FF00"}]"##.to_vec(),
        );
        store
    }

    #[tokio::test]
    async fn test_load_full_index() {
        let store = store_with_index();
        let index = ResourceIndex::load(&store, "avatar_assets", &defaults(), 1024 * 1024)
            .await
            .unwrap();

        // Listed order first, then the rest alphabetically; base.json is missing
        assert_eq!(index.categories(), vec!["clothes", "hair", "base"]);
        assert_eq!(index.subcategories("clothes"), vec!["bottoms", "tops"]);
        assert!(index.subcategories("base").is_empty());
        assert_eq!(index.models("clothes", "tops"), ["tops_blue_01", "tops_red_01"]);
        assert_eq!(index.colors(), [Color::new(255, 0, 0), Color::new(0, 255, 0)]);
        assert_eq!(index.metadata("clothes").unwrap()["icon"], "shirt");
        assert_eq!(index.model_count(), 4);
    }

    #[tokio::test]
    async fn test_keys_for_spans_subcategories() {
        let store = store_with_index();
        let index = ResourceIndex::load(&store, "avatar_assets", &defaults(), 1024 * 1024)
            .await
            .unwrap();

        let keys: Vec<String> = index
            .keys_for("clothes")
            .unwrap()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["bottoms_jeans_01", "tops_blue_01", "tops_red_01"]);
        assert!(index.keys_for("shoes").is_none());
    }

    #[tokio::test]
    async fn test_missing_categories_file_is_alphabetical() {
        let store = MemoryStore::new();
        store.insert("avatar_assets/json/hair.json", br#"{"back": ["hair_01_back"]}"#.to_vec());

        let index = ResourceIndex::load(&store, "avatar_assets", &defaults(), 1024)
            .await
            .unwrap();
        assert_eq!(index.categories(), vec!["base", "clothes", "hair"]);
        assert!(index.colors().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_category_file_is_index_error() {
        let store = MemoryStore::new();
        store.insert("avatar_assets/json/base.json", b"[1, 2, 3]".to_vec());

        let err = ResourceIndex::load(&store, "avatar_assets", &defaults(), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Index(msg) if msg.contains("base.json")));
    }

    #[test]
    fn test_new_ignores_unknown_order_entries() {
        let mut categories = BTreeMap::new();
        categories.insert("b".to_string(), Subcategories::new());
        categories.insert("a".to_string(), Subcategories::new());

        let order = vec!["zzz".to_string(), "b".to_string()];
        let index = ResourceIndex::new(categories, &order, HashMap::new(), Vec::new());
        assert_eq!(index.categories(), vec!["b", "a"]);
    }
}
