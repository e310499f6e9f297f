use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use crate::types::ItemId;

/// Fatal errors. Any of these aborts the whole run before the failing pass
/// commits anything; retrying is the caller's decision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DedupError {
  /// The external provider could not compute the reference graph, e.g.
  /// because of unsaved external state.
  #[error("dependency snapshot unavailable: {reason}")]
  SnapshotUnavailable { reason: String },

  /// The settings store has no schema template for a group the engine asked
  /// it to create.
  #[error("no schema template available for group '{group}'")]
  SchemaTemplateMissing { group: String },

  /// An item received zero or more than one disposition. The rule chain
  /// makes this unreachable; if it fires anyway the invariant is broken and
  /// silently picking a bucket would hide it.
  #[error("item '{item}' received {matched} dispositions; classification must assign exactly one")]
  InconsistentClassification { item: ItemId, matched: usize },
}

/// Non-fatal findings, accumulated during a run and returned alongside a
/// successful outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DedupWarning {
  /// An implicit resource from a raw asset folder is duplicated across
  /// bundles; placement cannot deduplicate it.
  RawFolderDuplicate { path: String, bundle_count: usize },

  /// A resident sprite atlas absorbed a sprite whose backing item is shared;
  /// the backing item was forced resident to break the cycle.
  CircularResidentAtlas { atlas: String, path: String },
}

impl Display for DedupWarning {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      DedupWarning::RawFolderDuplicate { path, bundle_count } => write!(
        f,
        "raw-folder resource '{path}' is pulled into {bundle_count} bundles and cannot be deduplicated"
      ),
      DedupWarning::CircularResidentAtlas { atlas, path } => write!(
        f,
        "resident atlas '{atlas}' absorbs '{path}'; its backing item was forced resident"
      ),
    }
  }
}
