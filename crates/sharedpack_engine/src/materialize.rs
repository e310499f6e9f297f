use itertools::Itertools;
use tracing::{debug, instrument};

use sharedpack_core::diagnostic::DedupError;
use sharedpack_core::store::SettingsStore;
use sharedpack_core::types::{
  is_engine_owned, BundleMode, GroupSchema, Item, RESIDENT_GROUP_NAME, SHADER_GROUP_NAME,
  SHARED_GROUP_PREFIX, SINGLE_GROUP_NAME,
};

use crate::classify::Classification;
use crate::ordering::{compare_group_names, next_shared_suffix};
use crate::partition::EquivalenceClass;
use crate::RunConfig;

/// What one materialization pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MaterializeOutcome {
  /// Newly created multi-bundle shared groups.
  pub shared_groups_created: usize,

  /// Entries that actually moved; idempotent re-placements are excluded.
  pub placements: usize,

  pub resident_grouped: bool,
  pub shader_grouped: bool,
}

impl MaterializeOutcome {
  /// True when this pass resolved at least one layer of duplication, meaning
  /// the driver should schedule another pass against a fresh snapshot.
  pub fn resolved(&self) -> bool {
    self.shared_groups_created > 0 || self.resident_grouped || self.shader_grouped
  }
}

/// Turns classification output into group and entry mutations.
///
/// The resident and shader buckets go to their persistent groups, every
/// equivalence class spanning several bundles gets its own numbered shared
/// group, and single-bundle overflow folds into the catch-all group packed
/// separately. Ineligible paths are dropped before any group is touched, and
/// a shared group counts as created only when at least one member actually
/// moved, so a stable configuration materializes to a no-op instead of
/// accreting empty groups. All mutations stage in the store and publish as
/// one commit at the end of the pass; an error before that leaves the store
/// untouched.
#[instrument(level = "debug", skip_all, fields(classes = classes.len()))]
pub fn materialize(
  classification: &Classification,
  classes: &[EquivalenceClass],
  store: &dyn SettingsStore,
  config: &RunConfig,
) -> Result<MaterializeOutcome, DedupError> {
  let mut outcome = MaterializeOutcome::default();
  let mut suffix = next_shared_suffix(&store.group_names());

  let resident = eligible_members(store, &classification.resident);
  if !resident.is_empty() {
    let placed = place_all(store, RESIDENT_GROUP_NAME, BundleMode::PackTogether, &resident, config)?;
    outcome.placements += placed;
    outcome.resident_grouped = placed > 0;
  }

  let shader = eligible_members(store, &classification.shader);
  if !shader.is_empty() {
    let placed = place_all(store, SHADER_GROUP_NAME, BundleMode::PackTogether, &shader, config)?;
    outcome.placements += placed;
    outcome.shader_grouped = placed > 0;
  }

  let mut singles: Vec<Item> = Vec::new();
  for class in classes {
    let members = eligible_members(store, &class.members);
    if members.is_empty() {
      continue;
    }

    if class.bundles.len() > 1 {
      let name = format!("{SHARED_GROUP_PREFIX}{suffix}");
      suffix += 1;
      let placed = place_all(store, &name, BundleMode::PackTogether, &members, config)?;
      outcome.placements += placed;
      if placed > 0 {
        outcome.shared_groups_created += 1;
      } else {
        // Every member already sat exactly where it belongs; a group staged
        // for nothing must not survive the pass.
        store.delete_group_if_empty(&name);
      }
    } else {
      // Isolated overflow shares one catch-all group packed separately
      // instead of a dedicated group per item.
      singles.extend(members);
    }
  }

  if !singles.is_empty() {
    outcome.placements += place_all(
      store,
      SINGLE_GROUP_NAME,
      BundleMode::PackSeparately,
      &singles,
      config,
    )?;
  }

  // The catch-all must never persist empty.
  store.delete_group_if_empty(SINGLE_GROUP_NAME);

  store.sort_groups(&|a, b| compare_group_names(a, b, &config.default_group));
  store.commit();

  debug!(
    shared_groups = outcome.shared_groups_created,
    placements = outcome.placements,
    resident = outcome.resident_grouped,
    shader = outcome.shader_grouped,
    "materialized pass"
  );
  Ok(outcome)
}

/// Members whose paths the store accepts as entries. Resolved up front so no
/// group is ever created for items that cannot be placed into it.
fn eligible_members(store: &dyn SettingsStore, members: &[Item]) -> Vec<Item> {
  members
    .iter()
    .filter(|item| {
      let eligible = store.is_path_eligible(&item.path);
      if !eligible {
        debug!(path = %item.path, "path not eligible for an entry; skipping");
      }
      eligible
    })
    .cloned()
    .collect()
}

fn place_all(
  store: &dyn SettingsStore,
  name: &str,
  bundle_mode: BundleMode,
  members: &[Item],
  config: &RunConfig,
) -> Result<usize, DedupError> {
  debug_assert!(is_engine_owned(name), "engine may only mutate its own groups");

  let group = store.create_or_get_group(
    name,
    GroupSchema::engine_defaults(bundle_mode, config.hashed_bundle_names),
  )?;

  let mut placed = 0;
  let ordered = members
    .iter()
    .sorted_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));

  for item in ordered {
    if store.place_item(&item.id, &item.path, &group.name, item.address()) {
      placed += 1;
    }
  }

  Ok(placed)
}
