use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use indexmap::IndexMap;
use tracing::debug;

use crate::diagnostic::DedupError;
use crate::hash::hash_string;
use crate::snapshot::{Bundle, DependencySnapshot, ItemObservation, SnapshotProvider};
use crate::store::SettingsStore;
use crate::types::{address_from_path, AtlasAggregate, Group, GroupSchema, ItemId, ObservedKind};

/// A declared asset in the fixture project, keyed by a unique asset key.
///
/// Main assets use their path as key; sub-assets get a distinct key but share
/// the path of their main asset.
#[derive(Debug, Clone)]
struct AssetDecl {
  id: ItemId,
  path: String,
  kind: ObservedKind,
  is_sub_asset: bool,
  is_from_raw_folder: bool,
  dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct EntryState {
  path: String,
  group: String,
  address: String,
}

#[derive(Debug, Clone, Default)]
struct ProjectState {
  groups: IndexMap<String, Group>,
  entries: IndexMap<ItemId, EntryState>,
}

/// In-memory project standing in for both the host build pipeline and the
/// persistent settings store.
///
/// It owns a declared asset-dependency table, recomputes the implicit
/// reference closure on every snapshot request (no caching across passes),
/// and stages store mutations until [`SettingsStore::commit`]. Used by the
/// engine's tests and by consumers that want to dry-run a deduplication
/// without a real project behind it.
#[derive(Default)]
pub struct InMemoryProject {
  assets: Mutex<IndexMap<String, AssetDecl>>,
  atlases: Mutex<Vec<AtlasAggregate>>,

  published: Mutex<ProjectState>,
  staged: Mutex<Option<ProjectState>>,

  commits: AtomicUsize,
  placements: AtomicUsize,

  snapshot_failure: Mutex<Option<String>>,
  groups_without_schema_template: Mutex<HashSet<String>>,
  ineligible_paths: Mutex<HashSet<String>>,
}

impl InMemoryProject {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declares a main asset. The key doubles as the asset path; the item id is
  /// derived by hashing the key so it stays stable across snapshots.
  pub fn declare_asset(&self, key: &str, kind: ObservedKind) -> ItemId {
    self.declare(key, key, kind, false)
  }

  /// Declares a sub-object reached through another asset (a sprite inside a
  /// texture, a sub-material). Sub-assets share their main asset's path.
  pub fn declare_sub_asset(&self, key: &str, path: &str, kind: ObservedKind) -> ItemId {
    self.declare(key, path, kind, true)
  }

  fn declare(&self, key: &str, path: &str, kind: ObservedKind, is_sub_asset: bool) -> ItemId {
    let id = ItemId::new(hash_string(key.to_string()));
    self.assets.lock().unwrap().insert(
      key.to_string(),
      AssetDecl {
        id: id.clone(),
        path: path.to_string(),
        kind,
        is_sub_asset,
        is_from_raw_folder: false,
        dependencies: Vec::new(),
      },
    );
    id
  }

  /// Flags an asset as living in a legacy raw-resource folder.
  pub fn mark_raw_folder(&self, key: &str) -> anyhow::Result<()> {
    let mut assets = self.assets.lock().unwrap();
    let decl = assets
      .get_mut(key)
      .ok_or_else(|| anyhow::anyhow!("unknown asset '{key}'"))?;
    decl.is_from_raw_folder = true;
    Ok(())
  }

  /// Adds a dependency edge between two declared assets.
  pub fn declare_dependency(&self, from: &str, to: &str) -> anyhow::Result<()> {
    let mut assets = self.assets.lock().unwrap();
    anyhow::ensure!(assets.contains_key(to), "unknown asset '{to}'");
    let decl = assets
      .get_mut(from)
      .ok_or_else(|| anyhow::anyhow!("unknown asset '{from}'"))?;
    decl.dependencies.push(to.to_string());
    Ok(())
  }

  pub fn add_atlas(&self, atlas: AtlasAggregate) {
    self.atlases.lock().unwrap().push(atlas);
  }

  /// Creates a group directly in the published state (test setup, not an
  /// engine mutation).
  pub fn add_group(&self, name: &str, schema: GroupSchema) {
    self.published.lock().unwrap().groups.insert(
      name.to_string(),
      Group {
        name: name.to_string(),
        schema,
      },
    );
  }

  /// Places a user-authored entry directly in the published state. Explicit
  /// entries are authoritative: snapshots never report them as implicit.
  pub fn add_explicit_entry(&self, group: &str, key: &str) -> anyhow::Result<()> {
    let assets = self.assets.lock().unwrap();
    let decl = assets
      .get(key)
      .ok_or_else(|| anyhow::anyhow!("unknown asset '{key}'"))?;
    self.published.lock().unwrap().entries.insert(
      decl.id.clone(),
      EntryState {
        path: decl.path.clone(),
        group: group.to_string(),
        address: address_from_path(&decl.path).to_string(),
      },
    );
    Ok(())
  }

  /// Makes the next `compute_snapshot` call fail with the given reason.
  pub fn fail_next_snapshot(&self, reason: &str) {
    *self.snapshot_failure.lock().unwrap() = Some(reason.to_string());
  }

  /// Makes `create_or_get_group` fail for the named group.
  pub fn drop_schema_template(&self, group: &str) {
    self
      .groups_without_schema_template
      .lock()
      .unwrap()
      .insert(group.to_string());
  }

  /// Makes the eligibility predicate reject the given path.
  pub fn mark_path_ineligible(&self, path: &str) {
    self
      .ineligible_paths
      .lock()
      .unwrap()
      .insert(path.to_string());
  }

  pub fn commit_count(&self) -> usize {
    self.commits.load(AtomicOrdering::SeqCst)
  }

  /// Number of entry placements that actually changed state.
  pub fn placement_count(&self) -> usize {
    self.placements.load(AtomicOrdering::SeqCst)
  }

  /// Committed group names, in display order.
  pub fn published_group_names(&self) -> Vec<String> {
    self.published.lock().unwrap().groups.keys().cloned().collect()
  }

  pub fn has_group(&self, name: &str) -> bool {
    self.published.lock().unwrap().groups.contains_key(name)
  }

  /// Committed schema of a group, if it exists.
  pub fn group_schema(&self, name: &str) -> Option<GroupSchema> {
    self
      .published
      .lock()
      .unwrap()
      .groups
      .get(name)
      .map(|group| group.schema.clone())
  }

  /// Committed entry paths of a group, in placement order.
  pub fn entries_in(&self, group: &str) -> Vec<String> {
    self
      .published
      .lock()
      .unwrap()
      .entries
      .values()
      .filter(|entry| entry.group == group)
      .map(|entry| entry.path.clone())
      .collect()
  }

  /// Committed group of a declared asset's entry, if it has one.
  pub fn group_of(&self, key: &str) -> Option<String> {
    let id = self.assets.lock().unwrap().get(key)?.id.clone();
    self
      .published
      .lock()
      .unwrap()
      .entries
      .get(&id)
      .map(|entry| entry.group.clone())
  }

  /// Committed address of a declared asset's entry, if it has one.
  pub fn address_of(&self, key: &str) -> Option<String> {
    let id = self.assets.lock().unwrap().get(key)?.id.clone();
    self
      .published
      .lock()
      .unwrap()
      .entries
      .get(&id)
      .map(|entry| entry.address.clone())
  }

  fn with_staged<R>(&self, f: impl FnOnce(&mut ProjectState) -> R) -> R {
    let mut staged = self.staged.lock().unwrap();
    let state = staged.get_or_insert_with(|| self.published.lock().unwrap().clone());
    f(state)
  }

  fn read_view<R>(&self, f: impl FnOnce(&ProjectState) -> R) -> R {
    let staged = self.staged.lock().unwrap();
    match staged.as_ref() {
      Some(state) => f(state),
      None => f(&self.published.lock().unwrap()),
    }
  }
}

impl SnapshotProvider for InMemoryProject {
  fn compute_snapshot(&self) -> Result<DependencySnapshot, DedupError> {
    if let Some(reason) = self.snapshot_failure.lock().unwrap().take() {
      return Err(DedupError::SnapshotUnavailable { reason });
    }

    // A new snapshot starts a new pass; staging left over from an aborted
    // pass is discarded.
    *self.staged.lock().unwrap() = None;

    let assets = self.assets.lock().unwrap();
    let state = self.published.lock().unwrap();

    let explicit_ids: HashSet<&ItemId> = state.entries.keys().collect();
    let key_of_id: IndexMap<&ItemId, &String> =
      assets.iter().map(|(key, decl)| (&decl.id, key)).collect();

    let mut bundles = Vec::new();
    let mut observations = Vec::new();

    for group_name in state.groups.keys() {
      let roots: Vec<&String> = state
        .entries
        .values()
        .filter(|entry| entry.group == *group_name)
        .filter_map(|entry| {
          // Entries for undeclared assets can exist in hand-built states;
          // they own no dependency closure.
          assets
            .values()
            .find(|decl| decl.path == entry.path)
            .and_then(|decl| key_of_id.get(&decl.id).copied())
        })
        .collect();

      let explicit_assets: Vec<String> = state
        .entries
        .values()
        .filter(|entry| entry.group == *group_name)
        .map(|entry| entry.path.clone())
        .collect();

      // Breadth-first closure in declaration order keeps observation order,
      // and with it shared-group numbering, reproducible.
      let mut queue: VecDeque<&String> = roots.iter().copied().collect();
      let mut seen: HashSet<&String> = queue.iter().copied().collect();
      let mut reached: Vec<&String> = Vec::new();

      while let Some(key) = queue.pop_front() {
        let Some(decl) = assets.get(key) else {
          continue;
        };
        for dep in &decl.dependencies {
          if seen.insert(dep) {
            queue.push_back(dep);
            reached.push(dep);
          }
        }
      }

      for key in reached {
        let Some(decl) = assets.get(key) else {
          continue;
        };
        if explicit_ids.contains(&decl.id) {
          continue;
        }
        observations.push(ItemObservation {
          id: decl.id.clone(),
          path: decl.path.clone(),
          kind: decl.kind.clone(),
          is_sub_asset: decl.is_sub_asset,
          is_from_raw_folder: decl.is_from_raw_folder,
          bundle: group_name.clone(),
        });
      }

      bundles.push(Bundle {
        name: group_name.clone(),
        group: group_name.clone(),
        explicit_assets,
      });
    }

    let snapshot = DependencySnapshot::from_observations(
      bundles,
      observations,
      self.atlases.lock().unwrap().clone(),
    );
    debug!(
      bundles = snapshot.bundles.len(),
      items = snapshot.items.len(),
      "computed in-memory snapshot"
    );
    Ok(snapshot)
  }
}

impl SettingsStore for InMemoryProject {
  fn group_names(&self) -> Vec<String> {
    self.read_view(|state| state.groups.keys().cloned().collect())
  }

  fn create_or_get_group(&self, name: &str, schema: GroupSchema) -> Result<Group, DedupError> {
    if self
      .groups_without_schema_template
      .lock()
      .unwrap()
      .contains(name)
    {
      return Err(DedupError::SchemaTemplateMissing {
        group: name.to_string(),
      });
    }

    self.with_staged(|state| {
      let group = state.groups.entry(name.to_string()).or_insert_with(|| Group {
        name: name.to_string(),
        schema: schema.clone(),
      });
      group.schema = schema;
      Ok(group.clone())
    })
  }

  fn place_item(&self, item: &ItemId, path: &str, group: &str, address: &str) -> bool {
    let next = EntryState {
      path: path.to_string(),
      group: group.to_string(),
      address: address.to_string(),
    };

    let changed = self.with_staged(|state| match state.entries.get(item) {
      Some(existing) if *existing == next => false,
      _ => {
        state.entries.insert(item.clone(), next);
        true
      }
    });

    if changed {
      self.placements.fetch_add(1, AtomicOrdering::SeqCst);
    }
    changed
  }

  fn delete_group_if_empty(&self, name: &str) -> bool {
    self.with_staged(|state| {
      if !state.groups.contains_key(name) {
        return false;
      }
      if state.entries.values().any(|entry| entry.group == name) {
        return false;
      }
      state.groups.shift_remove(name);
      true
    })
  }

  fn sort_groups(&self, compare: &dyn Fn(&str, &str) -> Ordering) {
    self.with_staged(|state| {
      state.groups.sort_by(|a, _, b, _| compare(a, b));
    });
  }

  fn commit(&self) {
    if let Some(state) = self.staged.lock().unwrap().take() {
      *self.published.lock().unwrap() = state;
    }
    self.commits.fetch_add(1, AtomicOrdering::SeqCst);
  }

  fn is_path_eligible(&self, path: &str) -> bool {
    !self.ineligible_paths.lock().unwrap().contains(path)
  }
}
