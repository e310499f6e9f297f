use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::diagnostic::DedupError;
use crate::types::{AtlasAggregate, Item, ItemId, ObservedKind};

pub type SnapshotProviderRef = Arc<dyn SnapshotProvider + Send + Sync>;

/// Computes the full bundle/item reference graph for the current build
/// configuration.
///
/// The provider is consulted once per pass and must recompute from scratch on
/// every call: each pass mutates the configuration, so a cached graph would
/// describe the previous iteration. Latency is proportional to project size
/// and is treated as synchronous I/O.
#[mockall::automock]
pub trait SnapshotProvider {
  fn compute_snapshot(&self) -> Result<DependencySnapshot, DedupError>;
}

/// A bundle as reported by the snapshot provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
  pub name: String,

  /// Name of the group that owns this bundle.
  pub group: String,

  /// Asset paths explicitly packed into this bundle by the user.
  pub explicit_assets: Vec<String>,
}

/// One sighting of an implicit item while walking a bundle's dependency
/// closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemObservation {
  pub id: ItemId,
  pub path: String,
  pub kind: ObservedKind,
  pub is_sub_asset: bool,
  pub is_from_raw_folder: bool,

  /// Bundle whose closure reached the item.
  pub bundle: String,
}

/// The full reference graph for one pass: every bundle, every implicit item
/// with its referencing-bundle-set, and the atlas aggregates that may absorb
/// sprite items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySnapshot {
  pub bundles: Vec<Bundle>,
  pub items: Vec<Item>,
  pub atlases: Vec<AtlasAggregate>,
}

impl DependencySnapshot {
  /// Folds per-bundle observations into one [`Item`] per identifier.
  ///
  /// Kinds keep first-observation order, `is_sub_asset` holds only when every
  /// observation saw a sub-object, and referencing bundles are unioned.
  /// Residency is resolved separately by [`DependencySnapshot::mark_residents`]
  /// once the caller knows which group is the resident one.
  pub fn from_observations(
    bundles: Vec<Bundle>,
    observations: Vec<ItemObservation>,
    atlases: Vec<AtlasAggregate>,
  ) -> Self {
    let mut folded: IndexMap<ItemId, Item> = IndexMap::new();

    for observation in observations {
      let ItemObservation {
        id,
        path,
        kind,
        is_sub_asset,
        is_from_raw_folder,
        bundle,
      } = observation;

      let item = folded.entry(id.clone()).or_insert_with(|| Item {
        id,
        path,
        kinds: Vec::new(),
        is_sub_asset: true,
        is_resident: false,
        is_from_raw_folder: false,
        referencing_bundles: BTreeSet::new(),
      });

      if !item.kinds.contains(&kind) {
        item.kinds.push(kind);
      }
      item.is_sub_asset &= is_sub_asset;
      item.is_from_raw_folder |= is_from_raw_folder;
      item.referencing_bundles.insert(bundle);
    }

    Self {
      bundles,
      items: folded.into_values().collect(),
      atlases,
    }
  }

  /// Flags every item referenced by at least one bundle of the always-loaded
  /// group. A no-op when no resident group is configured.
  pub fn mark_residents(&mut self, resident_group: Option<&str>) {
    let Some(resident_group) = resident_group else {
      return;
    };

    let resident_bundles: BTreeSet<&str> = self
      .bundles
      .iter()
      .filter(|bundle| bundle.group == resident_group)
      .map(|bundle| bundle.name.as_str())
      .collect();

    for item in &mut self.items {
      item.is_resident = item
        .referencing_bundles
        .iter()
        .any(|bundle| resident_bundles.contains(bundle.as_str()));
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn observation(id: &str, path: &str, kind: ObservedKind, sub: bool, bundle: &str) -> ItemObservation {
    ItemObservation {
      id: ItemId::new(id),
      path: path.to_string(),
      kind,
      is_sub_asset: sub,
      is_from_raw_folder: false,
      bundle: bundle.to_string(),
    }
  }

  #[test]
  fn folding_unions_bundles_and_keeps_first_observation_kind_order() {
    let snapshot = DependencySnapshot::from_observations(
      vec![],
      vec![
        observation("x", "Assets/x.png", ObservedKind::Texture, false, "A"),
        observation("x", "Assets/x.png", ObservedKind::Sprite, true, "B"),
        observation("x", "Assets/x.png", ObservedKind::Texture, false, "A"),
      ],
      vec![],
    );

    assert_eq!(snapshot.items.len(), 1);
    let item = &snapshot.items[0];
    assert_eq!(item.kinds, vec![ObservedKind::Texture, ObservedKind::Sprite]);
    assert_eq!(
      item.referencing_bundles,
      BTreeSet::from(["A".to_string(), "B".to_string()])
    );
    // One observation saw the main asset, so the item is not a pure sub-asset.
    assert!(!item.is_sub_asset);
  }

  #[test]
  fn folding_marks_sub_asset_only_when_every_observation_agrees() {
    let snapshot = DependencySnapshot::from_observations(
      vec![],
      vec![
        observation("s", "Assets/sheet.png", ObservedKind::Sprite, true, "A"),
        observation("s", "Assets/sheet.png", ObservedKind::Sprite, true, "B"),
      ],
      vec![],
    );

    assert!(snapshot.items[0].is_sub_asset);
  }

  #[test]
  fn folding_preserves_item_insertion_order() {
    let snapshot = DependencySnapshot::from_observations(
      vec![],
      vec![
        observation("x", "Assets/x.png", ObservedKind::Texture, false, "A"),
        observation("y", "Assets/y.png", ObservedKind::Texture, false, "A"),
        observation("x", "Assets/x.png", ObservedKind::Texture, false, "B"),
      ],
      vec![],
    );

    let ids: Vec<&str> = snapshot.items.iter().map(|i| i.id.0.as_str()).collect();
    assert_eq!(ids, vec!["x", "y"]);
  }

  #[test]
  fn mark_residents_flags_items_referenced_from_the_resident_group() {
    let bundles = vec![
      Bundle {
        name: "boot_bundle".into(),
        group: "Boot".into(),
        explicit_assets: vec![],
      },
      Bundle {
        name: "level1".into(),
        group: "Levels".into(),
        explicit_assets: vec![],
      },
    ];

    let mut snapshot = DependencySnapshot::from_observations(
      bundles,
      vec![
        observation("x", "Assets/x.png", ObservedKind::Texture, false, "boot_bundle"),
        observation("x", "Assets/x.png", ObservedKind::Texture, false, "level1"),
        observation("y", "Assets/y.png", ObservedKind::Texture, false, "level1"),
      ],
      vec![],
    );

    snapshot.mark_residents(Some("Boot"));
    assert!(snapshot.items[0].is_resident);
    assert!(!snapshot.items[1].is_resident);

    // Without a configured resident group nothing is flagged.
    snapshot.mark_residents(None);
    assert!(snapshot.items[0].is_resident);
  }
}
