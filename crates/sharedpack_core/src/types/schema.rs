use serde::{Deserialize, Serialize};

/// How a group's items are packed into bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BundleMode {
  /// One bundle for the whole group.
  PackTogether,
  /// One bundle per item.
  PackSeparately,
}

/// How bundle files are named on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BundleNaming {
  HashedName,
  LiteralName,
}

/// What one bundle load request pulls into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadMode {
  AllPackedAssetsAndDependencies,
  RequestedAssetAndDependencies,
}

/// How assets are identified inside a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InternalIdMode {
  GroupIdentifier,
  FullPath,
}

/// How asset names are recorded inside a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InternalNaming {
  Dynamic,
  FullPath,
}

/// Packing schema attached to a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSchema {
  pub bundle_mode: BundleMode,
  pub include_addresses_in_catalog: bool,
  pub include_guids_in_catalog: bool,
  pub include_labels_in_catalog: bool,
  pub load_mode: LoadMode,
  pub internal_id_mode: InternalIdMode,
  pub internal_naming: InternalNaming,
  pub use_crc: bool,
  pub naming: BundleNaming,
}

impl GroupSchema {
  /// Fixed contract applied to every engine-owned group: the three catalog
  /// inclusion flags are off to keep the manifest small, assets load with
  /// their dependencies, internal ids come from the group identifier, naming
  /// is dynamic and CRC checks are disabled. Only the bundle mode and the
  /// hashed-vs-literal file naming vary per caller.
  pub fn engine_defaults(bundle_mode: BundleMode, hashed_names: bool) -> Self {
    Self {
      bundle_mode,
      include_addresses_in_catalog: false,
      include_guids_in_catalog: false,
      include_labels_in_catalog: false,
      load_mode: LoadMode::AllPackedAssetsAndDependencies,
      internal_id_mode: InternalIdMode::GroupIdentifier,
      internal_naming: InternalNaming::Dynamic,
      use_crc: false,
      naming: if hashed_names {
        BundleNaming::HashedName
      } else {
        BundleNaming::LiteralName
      },
    }
  }

  /// Defaults for user-owned groups in fixtures and tests.
  pub fn user_defaults() -> Self {
    Self {
      bundle_mode: BundleMode::PackTogether,
      include_addresses_in_catalog: true,
      include_guids_in_catalog: true,
      include_labels_in_catalog: true,
      load_mode: LoadMode::RequestedAssetAndDependencies,
      internal_id_mode: InternalIdMode::FullPath,
      internal_naming: InternalNaming::FullPath,
      use_crc: true,
      naming: BundleNaming::LiteralName,
    }
  }
}
