use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Stable content identifier for an asset.
///
/// Assigned by the host project (a GUID or a content hash); the engine only
/// requires that it stays stable across snapshots of the same project state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }
}

impl Display for ItemId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// The kind of sub-object through which an item was observed being pulled
/// into a bundle ("used as Sprite", "used as Shader", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObservedKind {
  Sprite,
  Shader,
  Material,
  Texture,
  Other(String),
}

/// An implicit dependency candidate, folded from every observation of the
/// same identifier within one dependency snapshot.
///
/// Items are ephemeral: they are rebuilt from scratch for every snapshot and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
  pub id: ItemId,

  /// Logical asset path. Sub-assets share the path of their main asset.
  pub path: String,

  /// Observed sub-types in first-observation order, deduplicated.
  pub kinds: Vec<ObservedKind>,

  /// True only if every observation saw this item as a sub-object of
  /// something else.
  pub is_sub_asset: bool,

  /// True if any referencing bundle belongs to the always-loaded group.
  pub is_resident: bool,

  /// The item resolved from a legacy raw-resource folder. Warning-only.
  pub is_from_raw_folder: bool,

  /// Names of every bundle that transitively references this item.
  pub referencing_bundles: BTreeSet<String>,
}

impl Item {
  pub fn first_kind(&self) -> Option<&ObservedKind> {
    self.kinds.first()
  }

  /// True when the item was only ever observed through the given kind.
  pub fn observed_only_as(&self, kind: &ObservedKind) -> bool {
    self.kinds.len() == 1 && self.kinds[0] == *kind
  }

  /// Human-readable address: the file name with its extension stripped.
  pub fn address(&self) -> &str {
    address_from_path(&self.path)
  }
}

/// File name of `path` with the extension stripped.
pub fn address_from_path(path: &str) -> &str {
  let name = path.rsplit('/').next().unwrap_or(path);
  match name.rfind('.') {
    Some(0) | None => name,
    Some(dot) => &name[..dot],
  }
}
