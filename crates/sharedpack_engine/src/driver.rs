use tracing::{debug, instrument};

use sharedpack_core::diagnostic::{DedupError, DedupWarning};
use sharedpack_core::snapshot::SnapshotProvider;
use sharedpack_core::store::SettingsStore;

use crate::classify::{classify, ClassifyOptions};
use crate::materialize::materialize;
use crate::partition::partition;
use crate::RunConfig;

/// Result of a full deduplication run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunOutcome {
  /// True when at least one pass created a shared, resident or shader group.
  pub resolved: bool,

  /// Passes executed before the fixpoint or the iteration cap was reached.
  pub iterations: usize,

  /// Entries moved across all passes.
  pub placements: usize,

  /// Soft findings accumulated across all passes.
  pub warnings: Vec<DedupWarning>,
}

/// Repeats {snapshot → classify → partition → materialize} until a pass
/// resolves nothing new, or `max_iterations` passes have run.
///
/// Materializing shared groups changes which bundles reference which items,
/// so one pass can expose a new layer of duplication; equally, convergence is
/// not provable in general, hence the cap. The snapshot is recomputed from
/// scratch every pass. Fatal errors abort the run before the failing pass
/// commits anything; the driver never retries on its own.
#[instrument(level = "debug", skip_all, fields(max_iterations = config.max_iterations))]
pub fn run(
  provider: &dyn SnapshotProvider,
  store: &dyn SettingsStore,
  config: &RunConfig,
) -> Result<RunOutcome, DedupError> {
  let options = ClassifyOptions {
    shader_group_enabled: config.shader_group_enabled,
    allow_duplicate_material: config.allow_duplicate_material,
  };

  let mut outcome = RunOutcome::default();
  let max_iterations = config.max_iterations.max(1);

  while outcome.iterations < max_iterations {
    let mut snapshot = provider.compute_snapshot()?;
    snapshot.mark_residents(config.resident_group.as_deref());

    let mut classification = classify(&snapshot, options)?;
    outcome.warnings.append(&mut classification.warnings);

    let classes = partition(std::mem::take(&mut classification.shareable));
    let pass = materialize(&classification, &classes, store, config)?;

    outcome.iterations += 1;
    outcome.placements += pass.placements;

    debug!(
      iteration = outcome.iterations,
      resolved = pass.resolved(),
      placements = pass.placements,
      "completed pass"
    );

    if !pass.resolved() {
      break;
    }
    outcome.resolved = true;
  }

  Ok(outcome)
}
