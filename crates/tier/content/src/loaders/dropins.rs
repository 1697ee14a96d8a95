//! Drop-in tier fragments.
//!
//! Each `*.json` file in the drop-in directory declares one tier:
//!
//! ```json
//! { "id": "hard", "order": 4, "meta": { "displayName": "Hard" },
//!   "tier": { "health_multiplier": 1.5 } }
//! ```
//!
//! Instead of a nested `tier` object, settings may also sit at the top level
//! next to the reserved keys. Fragments are sorted by `(order, id)`; a missing
//! order sorts last. The first fragment for an id wins.
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::document::{SECTION_META, SECTION_TIERS};
use super::{LoadResult, read_file};
use crate::error::{ConfigError, Result};

const RESERVED_KEYS: [&str; 4] = ["meta", "order", "id", "tier"];
const INDEX_FILE: &str = "index.json";

/// One parsed drop-in file.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub id: String,
    /// `f64::INFINITY` when the file declares no usable order.
    pub order: f64,
    pub meta: Option<Value>,
    pub tier: Map<String, Value>,
    pub source: PathBuf,
}

impl Fragment {
    /// Parses one fragment document.
    pub fn parse(source: &Path, content: &str) -> LoadResult<Self> {
        let value: Value = serde_json::from_str(content)
            .with_context(|| format!("malformed drop-in {}", source.display()))?;
        let Value::Object(mut root) = value else {
            return Err(anyhow!("drop-in {} is not a JSON object", source.display()));
        };

        let id = root
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("drop-in {} has no id", source.display()))?;

        let order = match root.get("order").and_then(Value::as_f64) {
            Some(order) if order.is_finite() => order,
            _ => {
                warn!(
                    target: "tier::config",
                    file = %source.display(),
                    tier = %id,
                    "Drop-in has no numeric order; sorting it last"
                );
                f64::INFINITY
            }
        };

        let meta = root.remove("meta").filter(Value::is_object);
        let tier = match root.remove("tier") {
            Some(Value::Object(nested)) => nested,
            _ => root
                .into_iter()
                .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
                .collect(),
        };

        Ok(Self {
            id,
            order,
            meta,
            tier,
            source: source.to_path_buf(),
        })
    }

    fn sort_key(&self, other: &Self) -> Ordering {
        self.order
            .total_cmp(&other.order)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Reads and merges the drop-in directory.
pub struct DropInLoader {
    dir: PathBuf,
}

impl DropInLoader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate fragment files, excluding `index.json`. Empty if the directory is missing.
    pub fn fragment_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| ConfigError::io(&self.dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ConfigError::io(&self.dir, e))?.path();
            let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
            let is_index = path.file_name().and_then(|name| name.to_str()) == Some(INDEX_FILE);
            if path.is_file() && is_json && !is_index {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parses every fragment, skipping broken ones, sorted and de-duplicated.
    pub fn load(&self) -> Result<Vec<Fragment>> {
        let mut fragments: Vec<Fragment> = self
            .fragment_files()?
            .into_iter()
            .filter_map(|path| match read_fragment(&path) {
                Ok(fragment) => Some(fragment),
                Err(err) => {
                    warn!(target: "tier::config", error = %format!("{err:#}"), "Skipping drop-in");
                    None
                }
            })
            .collect();

        fragments.sort_by(Fragment::sort_key);

        let mut seen = HashSet::new();
        fragments.retain(|fragment| {
            let fresh = seen.insert(fragment.id.to_lowercase());
            if !fresh {
                warn!(
                    target: "tier::config",
                    tier = %fragment.id,
                    file = %fragment.source.display(),
                    "Duplicate drop-in tier id; keeping the earlier fragment"
                );
            }
            fresh
        });

        debug!(target: "tier::config", count = fragments.len(), dir = %self.dir.display(), "Loaded drop-ins");
        Ok(fragments)
    }
}

fn read_fragment(path: &Path) -> LoadResult<Fragment> {
    let content = read_file(path)?;
    Fragment::parse(path, &content)
}

/// Replaces `tiers` and `meta` in `root` with sections synthesized from `fragments`.
///
/// With no fragments the document's own sections stay in place.
pub fn merge_fragments(root: &mut Map<String, Value>, fragments: &[Fragment]) {
    if fragments.is_empty() {
        return;
    }
    let mut tiers = Map::new();
    let mut meta = Map::new();
    for fragment in fragments {
        tiers.insert(fragment.id.clone(), Value::Object(fragment.tier.clone()));
        if let Some(m) = &fragment.meta {
            meta.insert(fragment.id.clone(), m.clone());
        }
    }
    root.insert(SECTION_TIERS.to_string(), Value::Object(tiers));
    root.insert(SECTION_META.to_string(), Value::Object(meta));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(content: Value) -> LoadResult<Fragment> {
        Fragment::parse(Path::new("test.json"), &content.to_string())
    }

    #[test]
    fn nested_tier_object_wins_over_flat_keys() {
        let fragment = parse(json!({
            "id": "hard", "order": 3,
            "tier": { "health_multiplier": 2.0 },
            "damage_multiplier": 9.0
        }))
        .unwrap();

        assert_eq!(fragment.tier.len(), 1);
        assert_eq!(fragment.tier["health_multiplier"], json!(2.0));
    }

    #[test]
    fn flat_keys_exclude_reserved_names() {
        let fragment = parse(json!({
            "id": "easy", "order": 1, "meta": { "displayName": "Easy" },
            "damage_multiplier": 0.5
        }))
        .unwrap();

        assert_eq!(fragment.tier.keys().collect::<Vec<_>>(), vec!["damage_multiplier"]);
        assert!(fragment.meta.is_some());
    }

    #[test]
    fn missing_id_is_an_error_and_missing_order_sorts_last() {
        assert!(parse(json!({ "order": 1 })).is_err());
        assert!(parse(json!([1, 2])).is_err());

        let fragment = parse(json!({ "id": "late" })).unwrap();
        assert_eq!(fragment.order, f64::INFINITY);
    }

    #[test]
    fn merge_replaces_sections_in_fragment_order() {
        let mut root = Map::new();
        root.insert("tiers".into(), json!({ "legacy": {} }));
        let fragments = vec![
            parse(json!({ "id": "b", "order": 1 })).unwrap(),
            parse(json!({ "id": "a", "order": 2, "meta": { "displayName": "A" } })).unwrap(),
        ];

        merge_fragments(&mut root, &fragments);

        let ids: Vec<_> = root["tiers"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(root["meta"].get("a").is_some());
        assert!(root["meta"].get("b").is_none());
    }
}
