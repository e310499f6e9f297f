use serde::{Deserialize, Serialize};

use crate::types::schema::GroupSchema;

/// Prefix of the numbered groups created for multi-bundle equivalence classes.
pub const SHARED_GROUP_PREFIX: &str = "Shared_";

/// Persistent group collecting every shader when the shader group is enabled.
pub const SHADER_GROUP_NAME: &str = "Shared_Shader";

/// Catch-all group for isolated duplicates, packed separately so items with
/// different referencing-bundle-sets never share a bundle.
pub const SINGLE_GROUP_NAME: &str = "Shared_Single";

/// Persistent group for always-loaded items referenced by several bundles.
pub const RESIDENT_GROUP_NAME: &str = "Residents";

/// Leading character marking a group as engine-owned in display order.
pub const ENGINE_MARKER: char = '+';

/// A build-configuration unit owning one bundle's packing policy.
///
/// Roughly 1:1 with a bundle. Groups matching one of the reserved names are
/// engine-owned; every other group is a read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
  pub name: String,
  pub schema: GroupSchema,
}

/// True for the group names the engine is allowed to create, mutate or
/// delete. A leading marker character does not change ownership.
pub fn is_engine_owned(name: &str) -> bool {
  let name = name.strip_prefix(ENGINE_MARKER).unwrap_or(name);
  name == RESIDENT_GROUP_NAME || name.starts_with(SHARED_GROUP_PREFIX)
}
