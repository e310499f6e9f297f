use std::cmp::Ordering;
use std::sync::Arc;

use crate::diagnostic::DedupError;
use crate::types::{Group, GroupSchema, ItemId};

pub type SettingsStoreRef = Arc<dyn SettingsStore + Send + Sync>;

/// Mutation boundary to the persistent build-configuration store.
///
/// Implementations stage every mutation and publish them atomically on
/// [`SettingsStore::commit`]: a pass that aborts before committing must leave
/// no observable trace, and a concurrent reader never sees a partially
/// migrated state spanning two iterations. The engine is the sole mutator for
/// the duration of a run.
pub trait SettingsStore {
  /// Names of all groups, in current display order.
  fn group_names(&self) -> Vec<String>;

  /// Creates the named group with the given schema, or updates an existing
  /// group's schema in place.
  ///
  /// Fails with [`DedupError::SchemaTemplateMissing`] when the store cannot
  /// supply a schema template for a new group.
  fn create_or_get_group(&self, name: &str, schema: GroupSchema) -> Result<Group, DedupError>;

  /// Creates or moves the build entry for `item` into `group` under
  /// `address`.
  ///
  /// Returns false when the entry was already placed exactly there; the call
  /// is then a no-op observable from outside.
  fn place_item(&self, item: &ItemId, path: &str, group: &str, address: &str) -> bool;

  /// Deletes the named group when it exists and owns no entries.
  fn delete_group_if_empty(&self, name: &str) -> bool;

  /// Reorders all groups by the given comparator.
  fn sort_groups(&self, compare: &dyn Fn(&str, &str) -> Ordering);

  /// Publishes every staged mutation as one settings-changed notification.
  fn commit(&self);

  /// Whether a path may become a build entry at all. Injected so the engine
  /// never depends on how eligibility is computed, only on the answer.
  fn is_path_eligible(&self, path: &str) -> bool;
}
