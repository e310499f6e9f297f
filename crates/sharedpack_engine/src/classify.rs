use std::collections::{BTreeSet, HashSet};

use tracing::{debug, instrument, warn};

use sharedpack_core::diagnostic::{DedupError, DedupWarning};
use sharedpack_core::snapshot::DependencySnapshot;
use sharedpack_core::types::{Item, ItemId, ObservedKind};

/// Policy flags steering classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOptions {
  pub shader_group_enabled: bool,
  pub allow_duplicate_material: bool,
}

/// The single disposition every implicit item receives.
///
/// Exactly one rule fires per item, in this priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
  /// Absorbed by a sprite atlas; not placed by this engine at all.
  AtlasAbsorbed,
  /// Referenced from the always-loaded group by two or more bundles.
  Resident,
  /// Collected into the persistent shader group.
  Shader,
  /// Deliberately left duplicated wherever it already is.
  MaterialExempt,
  /// Referenced by a single bundle; no action needed.
  Singleton,
  /// Candidate for equivalence partitioning.
  Shareable,
}

/// Bucketed classifier output. Buckets are mutually exclusive; dropped
/// dispositions are only counted.
#[derive(Debug, Default)]
pub struct Classification {
  pub resident: Vec<Item>,
  pub shader: Vec<Item>,
  pub shareable: Vec<Item>,
  pub absorbed: usize,
  pub material_exempt: usize,
  pub singletons: usize,
  pub warnings: Vec<DedupWarning>,
}

/// Assigns every item of the snapshot exactly one disposition.
///
/// An atlas pre-pass resolves sprite absorption first: sprites bound by a
/// resident aggregate force their backing item (same path, observed as a main
/// asset) into the resident group, preventing a hidden cycle between a shared
/// group and the resident group.
#[instrument(level = "debug", skip_all, fields(items = snapshot.items.len()))]
pub fn classify(
  snapshot: &DependencySnapshot,
  options: ClassifyOptions,
) -> Result<Classification, DedupError> {
  let mut out = Classification::default();

  let mut absorbed: HashSet<&ItemId> = HashSet::new();
  let mut forced_resident: BTreeSet<&str> = BTreeSet::new();

  for item in &snapshot.items {
    if !item.observed_only_as(&ObservedKind::Sprite) {
      continue;
    }
    let Some(atlas) = snapshot.atlases.iter().find(|atlas| atlas.binds(&item.path)) else {
      continue;
    };

    absorbed.insert(&item.id);
    if atlas.is_resident && forced_resident.insert(&item.path) {
      warn!(
        atlas = %atlas.name,
        path = %item.path,
        "resident atlas absorbs a shared sprite; forcing its backing item resident"
      );
      out.warnings.push(DedupWarning::CircularResidentAtlas {
        atlas: atlas.name.clone(),
        path: item.path.clone(),
      });
    }
  }

  let mut seen: HashSet<&ItemId> = HashSet::new();

  for item in &snapshot.items {
    if item.is_from_raw_folder && item.referencing_bundles.len() >= 2 {
      warn!(
        path = %item.path,
        bundles = item.referencing_bundles.len(),
        "raw-folder resource duplicated across bundles; placement cannot deduplicate it"
      );
      out.warnings.push(DedupWarning::RawFolderDuplicate {
        path: item.path.clone(),
        bundle_count: item.referencing_bundles.len(),
      });
    }

    // A duplicated identifier would receive two dispositions; surface that
    // instead of silently bucketing it twice.
    if !seen.insert(&item.id) {
      return Err(DedupError::InconsistentClassification {
        item: item.id.clone(),
        matched: 2,
      });
    }

    match disposition(item, &absorbed, &forced_resident, options) {
      Disposition::AtlasAbsorbed => out.absorbed += 1,
      Disposition::Resident => out.resident.push(item.clone()),
      Disposition::Shader => out.shader.push(item.clone()),
      Disposition::MaterialExempt => out.material_exempt += 1,
      Disposition::Singleton => out.singletons += 1,
      Disposition::Shareable => out.shareable.push(item.clone()),
    }
  }

  debug!(
    resident = out.resident.len(),
    shader = out.shader.len(),
    shareable = out.shareable.len(),
    absorbed = out.absorbed,
    material_exempt = out.material_exempt,
    singletons = out.singletons,
    "classified snapshot"
  );
  Ok(out)
}

/// First matching rule wins; the chain guarantees exactly one fires.
fn disposition(
  item: &Item,
  absorbed: &HashSet<&ItemId>,
  forced_resident: &BTreeSet<&str>,
  options: ClassifyOptions,
) -> Disposition {
  if absorbed.contains(&item.id) {
    return Disposition::AtlasAbsorbed;
  }

  let resident = item.is_resident || forced_resident.contains(item.path.as_str());
  if resident && item.referencing_bundles.len() >= 2 {
    return Disposition::Resident;
  }

  if options.shader_group_enabled && matches!(item.first_kind(), Some(ObservedKind::Shader)) {
    return Disposition::Shader;
  }

  if options.allow_duplicate_material && matches!(item.first_kind(), Some(ObservedKind::Material))
  {
    return Disposition::MaterialExempt;
  }

  if item.referencing_bundles.len() == 1 {
    return Disposition::Singleton;
  }

  Disposition::Shareable
}
