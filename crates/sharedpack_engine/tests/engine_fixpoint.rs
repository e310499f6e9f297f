//! End-to-end runs against the in-memory project: full passes of
//! snapshot → classify → partition → materialize, driven to fixpoint.

use std::collections::BTreeSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use sharedpack_core::diagnostic::{DedupError, DedupWarning};
use sharedpack_core::in_memory::InMemoryProject;
use sharedpack_core::snapshot::{DependencySnapshot, MockSnapshotProvider};
use sharedpack_core::types::{AtlasAggregate, GroupSchema, Item, ItemId, ObservedKind};
use sharedpack_engine::{driver, DedupEngine, RunConfig};

fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .try_init();
}

/// Three bundles A, B, C. All three pull in X, A and B also pull in Y, and C
/// alone pulls in Z.
fn three_bundle_project() -> Arc<InMemoryProject> {
  let project = Arc::new(InMemoryProject::new());

  for root in ["Assets/a.prefab", "Assets/b.prefab", "Assets/c.prefab"] {
    project.declare_asset(root, ObservedKind::Other("Prefab".into()));
  }
  project.declare_asset("Assets/x.png", ObservedKind::Texture);
  project.declare_asset("Assets/y.png", ObservedKind::Texture);
  project.declare_asset("Assets/z.png", ObservedKind::Texture);

  for root in ["Assets/a.prefab", "Assets/b.prefab", "Assets/c.prefab"] {
    project.declare_dependency(root, "Assets/x.png").unwrap();
  }
  project
    .declare_dependency("Assets/a.prefab", "Assets/y.png")
    .unwrap();
  project
    .declare_dependency("Assets/b.prefab", "Assets/y.png")
    .unwrap();
  project
    .declare_dependency("Assets/c.prefab", "Assets/z.png")
    .unwrap();

  project.add_group("A", GroupSchema::user_defaults());
  project.add_group("B", GroupSchema::user_defaults());
  project.add_group("C", GroupSchema::user_defaults());
  project.add_explicit_entry("A", "Assets/a.prefab").unwrap();
  project.add_explicit_entry("B", "Assets/b.prefab").unwrap();
  project.add_explicit_entry("C", "Assets/c.prefab").unwrap();

  project
}

fn engine_for(project: &Arc<InMemoryProject>) -> DedupEngine {
  DedupEngine::new(project.clone(), project.clone())
}

#[test]
fn shared_items_split_into_per_set_groups_and_singletons_stay_put() {
  init_tracing();
  let project = three_bundle_project();
  let engine = engine_for(&project);

  let outcome = engine.run(&RunConfig::default()).unwrap();

  assert!(outcome.resolved);
  // Pass one resolves both duplicates; pass two confirms the fixpoint.
  assert_eq!(outcome.iterations, 2);

  // X is referenced by {A, B, C}, Y by {A, B}: different sets, different
  // shared groups.
  assert_eq!(project.group_of("Assets/x.png"), Some("Shared_0".into()));
  assert_eq!(project.group_of("Assets/y.png"), Some("Shared_1".into()));
  assert_eq!(project.address_of("Assets/x.png"), Some("x".into()));

  // Z is referenced once and is left alone.
  assert_eq!(project.group_of("Assets/z.png"), None);
}

#[test]
fn rerunning_a_stable_configuration_resolves_nothing() {
  let project = three_bundle_project();
  let engine = engine_for(&project);

  let first = engine.run(&RunConfig::default()).unwrap();
  assert!(first.resolved);

  let placements_after_first = project.placement_count();
  let second = engine.run(&RunConfig::default()).unwrap();

  assert!(!second.resolved);
  assert_eq!(second.iterations, 1);
  assert_eq!(second.placements, 0);
  assert_eq!(project.placement_count(), placements_after_first);
}

#[test]
fn resident_references_gather_into_the_resident_group() {
  let project = three_bundle_project();
  // Boot also pulls in X, and Boot is the always-loaded group.
  project.declare_asset("Assets/boot.prefab", ObservedKind::Other("Prefab".into()));
  project
    .declare_dependency("Assets/boot.prefab", "Assets/x.png")
    .unwrap();
  project.add_group("Boot", GroupSchema::user_defaults());
  project.add_explicit_entry("Boot", "Assets/boot.prefab").unwrap();

  let engine = engine_for(&project);
  let outcome = engine
    .run(&RunConfig {
      resident_group: Some("Boot".into()),
      ..RunConfig::default()
    })
    .unwrap();

  assert!(outcome.resolved);
  assert_eq!(project.group_of("Assets/x.png"), Some("Residents".into()));
  // Y is untouched by residency and still gets a shared group.
  assert_eq!(project.group_of("Assets/y.png"), Some("Shared_0".into()));
}

#[test]
fn shaders_collect_into_the_shader_group_when_enabled() {
  let project = three_bundle_project();
  project.declare_asset("Assets/lit.shader", ObservedKind::Shader);
  project
    .declare_dependency("Assets/x.png", "Assets/lit.shader")
    .unwrap();

  let engine = engine_for(&project);
  let outcome = engine
    .run(&RunConfig {
      shader_group_enabled: true,
      ..RunConfig::default()
    })
    .unwrap();

  assert!(outcome.resolved);
  assert_eq!(
    project.group_of("Assets/lit.shader"),
    Some("Shared_Shader".into())
  );
}

#[test]
fn absorbed_sprites_are_not_placed() {
  let project = three_bundle_project();
  project.declare_sub_asset("Assets/x.png[sprite]", "Assets/x.png", ObservedKind::Sprite);
  for root in ["Assets/a.prefab", "Assets/b.prefab"] {
    project
      .declare_dependency(root, "Assets/x.png[sprite]")
      .unwrap();
  }
  project.add_atlas(AtlasAggregate {
    name: "MainAtlas".into(),
    is_resident: false,
    sprite_paths: BTreeSet::from(["Assets/x.png".to_string()]),
  });

  let engine = engine_for(&project);
  engine.run(&RunConfig::default()).unwrap();

  // The sprite sub-asset is absorbed by the atlas; the backing texture is
  // still deduplicated on its own.
  assert_eq!(project.group_of("Assets/x.png[sprite]"), None);
  assert_eq!(project.group_of("Assets/x.png"), Some("Shared_0".into()));
}

#[test]
fn raw_folder_duplicates_surface_as_warnings() {
  let project = three_bundle_project();
  project.declare_asset("Assets/Raw/clip.bytes", ObservedKind::Other("Binary".into()));
  project.mark_raw_folder("Assets/Raw/clip.bytes").unwrap();
  project
    .declare_dependency("Assets/a.prefab", "Assets/Raw/clip.bytes")
    .unwrap();
  project
    .declare_dependency("Assets/b.prefab", "Assets/Raw/clip.bytes")
    .unwrap();

  let engine = engine_for(&project);
  let outcome = engine.run(&RunConfig::default()).unwrap();

  assert!(outcome.warnings.contains(&DedupWarning::RawFolderDuplicate {
    path: "Assets/Raw/clip.bytes".into(),
    bundle_count: 2,
  }));
}

#[test]
fn ineligible_shared_paths_reach_the_fixpoint_without_littering_groups() {
  init_tracing();
  let project = three_bundle_project();
  project.mark_path_ineligible("Assets/x.png");
  project.mark_path_ineligible("Assets/y.png");

  let engine = engine_for(&project);
  let outcome = engine.run(&RunConfig::default()).unwrap();

  // Nothing placeable means nothing resolved: one pass, no placements, and
  // no shared group staged only to persist empty.
  assert!(!outcome.resolved);
  assert_eq!(outcome.iterations, 1);
  assert_eq!(outcome.placements, 0);
  assert_eq!(
    project.published_group_names(),
    vec!["A".to_string(), "B".to_string(), "C".to_string()]
  );
}

#[test]
fn failed_snapshots_abort_the_run_without_mutation() {
  let project = three_bundle_project();
  project.fail_next_snapshot("scene has unsaved changes");

  let engine = engine_for(&project);
  let err = engine.run(&RunConfig::default()).unwrap_err();

  assert_eq!(
    err,
    DedupError::SnapshotUnavailable {
      reason: "scene has unsaved changes".into()
    }
  );
  assert_eq!(project.commit_count(), 0);
  assert_eq!(
    project.published_group_names(),
    vec!["A".to_string(), "B".to_string(), "C".to_string()]
  );
}

#[test]
fn missing_schema_template_aborts_before_any_commit() {
  let project = three_bundle_project();
  project.drop_schema_template("Shared_0");

  let engine = engine_for(&project);
  let err = engine.run(&RunConfig::default()).unwrap_err();

  assert_eq!(
    err,
    DedupError::SchemaTemplateMissing {
      group: "Shared_0".into()
    }
  );
  assert_eq!(project.commit_count(), 0);
  assert_eq!(project.group_of("Assets/x.png"), None);
}

#[test]
fn pathological_providers_stop_at_the_iteration_cap() {
  init_tracing();

  // A provider that reports the same duplication forever, no matter what the
  // store looks like.
  let frozen = DependencySnapshot {
    bundles: vec![],
    items: vec![Item {
      id: ItemId::new("x"),
      path: "Assets/x.png".into(),
      kinds: vec![ObservedKind::Texture],
      is_sub_asset: false,
      is_resident: false,
      is_from_raw_folder: false,
      referencing_bundles: BTreeSet::from(["A".to_string(), "B".to_string()]),
    }],
    atlases: vec![],
  };

  let mut provider = MockSnapshotProvider::new();
  provider
    .expect_compute_snapshot()
    .times(4)
    .returning(move || Ok(frozen.clone()));

  let store = InMemoryProject::new();
  let config = RunConfig {
    max_iterations: 4,
    ..RunConfig::default()
  };

  let outcome = driver::run(&provider, &store, &config).unwrap();
  assert!(outcome.resolved);
  assert_eq!(outcome.iterations, 4);
}
