use std::collections::BTreeSet;

use tracing::{debug, instrument};

use sharedpack_core::types::Item;

/// A set of items exhibiting exactly the same referencing-bundle-set.
///
/// Ephemeral: computed fresh every pass, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceClass {
  pub bundles: BTreeSet<String>,
  pub members: Vec<Item>,
}

/// Groups shareable items into classes keyed by their referencing-bundle-set.
///
/// Linear scan over open classes: a class matches when its set has the same
/// cardinality and contains every bundle the item references. O(classes ×
/// items), which is fine because the class count is bounded by the number of
/// distinct dependency patterns. Classes keep insertion order; final naming
/// is resolved during materialization.
#[instrument(level = "debug", skip_all, fields(items = shareable.len()))]
pub fn partition(shareable: Vec<Item>) -> Vec<EquivalenceClass> {
  let mut classes: Vec<EquivalenceClass> = Vec::new();

  'items: for item in shareable {
    for class in classes.iter_mut() {
      let same_set = class.bundles.len() == item.referencing_bundles.len()
        && item
          .referencing_bundles
          .iter()
          .all(|bundle| class.bundles.contains(bundle));
      if same_set {
        class.members.push(item);
        continue 'items;
      }
    }

    classes.push(EquivalenceClass {
      bundles: item.referencing_bundles.clone(),
      members: vec![item],
    });
  }

  debug!(classes = classes.len(), "partitioned shareable items");
  classes
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use sharedpack_core::types::{ItemId, ObservedKind};

  use super::*;

  fn item(id: &str, bundles: &[&str]) -> Item {
    Item {
      id: ItemId::new(id),
      path: format!("Assets/{id}.png"),
      kinds: vec![ObservedKind::Texture],
      is_sub_asset: false,
      is_resident: false,
      is_from_raw_folder: false,
      referencing_bundles: bundles.iter().map(|b| b.to_string()).collect(),
    }
  }

  #[test]
  fn items_with_equal_sets_share_a_class() {
    let classes = partition(vec![
      item("x", &["A", "B"]),
      item("y", &["B", "A"]),
      item("z", &["A", "B", "C"]),
    ]);

    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0].members.len(), 2);
    assert_eq!(
      classes[0].bundles,
      BTreeSet::from(["A".to_string(), "B".to_string()])
    );
    assert_eq!(classes[1].members.len(), 1);
  }

  #[test]
  fn equal_cardinality_with_different_bundles_opens_a_new_class() {
    let classes = partition(vec![item("x", &["A", "B"]), item("y", &["A", "C"])]);

    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0].members[0].id, ItemId::new("x"));
    assert_eq!(classes[1].members[0].id, ItemId::new("y"));
  }

  #[test]
  fn classes_keep_first_seen_order() {
    let classes = partition(vec![
      item("late_pattern", &["C", "D"]),
      item("early_pattern", &["A", "B"]),
      item("late_again", &["C", "D"]),
    ]);

    assert_eq!(
      classes[0].bundles,
      BTreeSet::from(["C".to_string(), "D".to_string()])
    );
    assert_eq!(classes[0].members.len(), 2);
    assert_eq!(classes[1].members.len(), 1);
  }

  #[test]
  fn empty_input_yields_no_classes() {
    assert_eq!(partition(vec![]), vec![]);
  }
}
