//! Shared-dependency deduplication engine.
//!
//! An asset-packaging pipeline duplicates any item that several bundles pull
//! in transitively. Given a snapshot of the bundle/item reference graph, this
//! engine classifies every implicit item, partitions the shareable ones into
//! equivalence classes keyed by their exact referencing-bundle-set, and
//! materializes each class as a shared group — then re-runs itself against a
//! fresh snapshot until a pass resolves nothing new or the iteration cap is
//! reached.
//!
//! The pipeline per pass is `snapshot → classify → partition → materialize`,
//! with all store mutations committed as a single unit at the end of the
//! pass.

pub mod classify;
pub mod driver;
pub mod materialize;
pub mod ordering;
pub mod partition;

use serde::{Deserialize, Serialize};

use sharedpack_core::diagnostic::DedupError;
use sharedpack_core::snapshot::SnapshotProviderRef;
use sharedpack_core::store::SettingsStoreRef;

pub use driver::RunOutcome;

/// Caller-facing configuration for one deduplication run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
  /// Group whose bundles are always loaded. Items they reference are
  /// gathered into the resident group instead of shared ones.
  pub resident_group: Option<String>,

  /// Collect every shader into the persistent shader group.
  pub shader_group_enabled: bool,

  /// Leave materials duplicated instead of bundling them.
  pub allow_duplicate_material: bool,

  /// Name engine-owned bundle files by content hash instead of literally.
  pub hashed_bundle_names: bool,

  /// Upper bound on duplicate-of-duplicate passes. A tunable safety valve:
  /// resolving one layer of duplication can expose a new one, and
  /// convergence is expected but not provable.
  pub max_iterations: usize,

  /// The project's default group. Threaded explicitly into every ordering
  /// decision; never read from ambient state.
  pub default_group: String,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      resident_group: None,
      shader_group_enabled: false,
      allow_duplicate_material: false,
      hashed_bundle_names: false,
      max_iterations: 10,
      default_group: "Default".to_string(),
    }
  }
}

/// Facade wiring a snapshot provider and a settings store to the pass
/// pipeline.
///
/// The engine is single-threaded and synchronous; it assumes exclusive
/// ownership of the build-configuration state for the duration of a run.
pub struct DedupEngine {
  provider: SnapshotProviderRef,
  store: SettingsStoreRef,
}

impl DedupEngine {
  pub fn new(provider: SnapshotProviderRef, store: SettingsStoreRef) -> Self {
    Self { provider, store }
  }

  /// Runs deduplication to fixpoint (or to the iteration cap).
  ///
  /// Fatal errors abort before the failing pass commits anything; the engine
  /// never retries on its own.
  pub fn run(&self, config: &RunConfig) -> Result<RunOutcome, DedupError> {
    driver::run(self.provider.as_ref(), self.store.as_ref(), config)
  }
}
