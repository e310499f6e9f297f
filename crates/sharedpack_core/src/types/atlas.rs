use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An external packed-sub-resource container (a sprite sheet) that can absorb
/// an item instead of the item being treated as a standalone duplicate.
///
/// Aggregates only redirect classification; they are never partitioned
/// themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasAggregate {
  pub name: String,

  /// A resident aggregate forces the backing item of any sprite it absorbs
  /// into the resident group, breaking a hidden cycle between a shared
  /// group and the resident group.
  pub is_resident: bool,

  /// Asset paths of the sprites this aggregate packs.
  pub sprite_paths: BTreeSet<String>,
}

impl AtlasAggregate {
  /// Whether this aggregate packs a sprite at the given path.
  pub fn binds(&self, path: &str) -> bool {
    self.sprite_paths.contains(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn binds_by_exact_path() {
    let atlas = AtlasAggregate {
      name: "MainAtlas".into(),
      is_resident: false,
      sprite_paths: BTreeSet::from(["Assets/UI/icon.png".to_string()]),
    };

    assert!(atlas.binds("Assets/UI/icon.png"));
    assert!(!atlas.binds("Assets/UI/other.png"));
  }
}
