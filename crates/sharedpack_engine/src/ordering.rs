use std::cmp::Ordering;

use sharedpack_core::types::{ENGINE_MARKER, SHARED_GROUP_PREFIX};

/// Total order over group names, used for display order and for numbering
/// newly created shared groups.
///
/// The designated default group sorts first, engine-marked groups sort after
/// every unmarked group, and otherwise names compare ordinally with digit
/// runs compared as magnitudes, so `Group2` sorts before `Group10`.
pub fn compare_group_names(a: &str, b: &str, default_group: &str) -> Ordering {
  if a == b {
    return Ordering::Equal;
  }
  if a == default_group {
    return Ordering::Less;
  }
  if b == default_group {
    return Ordering::Greater;
  }

  let a_marked = a.starts_with(ENGINE_MARKER);
  let b_marked = b.starts_with(ENGINE_MARKER);
  if a_marked != b_marked {
    return if a_marked {
      Ordering::Greater
    } else {
      Ordering::Less
    };
  }

  compare_with_numeric_runs(a, b)
}

/// First numeric suffix for shared groups created in one pass: the count of
/// groups already carrying the shared prefix when the pass begins. Each group
/// created in the same pass increments from there.
pub fn next_shared_suffix(existing_groups: &[String]) -> usize {
  existing_groups
    .iter()
    .filter(|name| name.starts_with(SHARED_GROUP_PREFIX))
    .count()
}

/// Ordinal comparison, except that aligned digit runs compare numerically.
fn compare_with_numeric_runs(a: &str, b: &str) -> Ordering {
  let a_bytes = a.as_bytes();
  let b_bytes = b.as_bytes();
  let mut i = 0;
  let mut j = 0;

  while i < a_bytes.len() && j < b_bytes.len() {
    let ca = a_bytes[i];
    let cb = b_bytes[j];

    if ca.is_ascii_digit() && cb.is_ascii_digit() {
      let a_end = digit_run_end(a_bytes, i);
      let b_end = digit_run_end(b_bytes, j);
      let a_run = &a[i..a_end];
      let b_run = &b[j..b_end];

      // Compare stripped runs by length first: more significant digits win.
      let a_magnitude = a_run.trim_start_matches('0');
      let b_magnitude = b_run.trim_start_matches('0');
      let by_magnitude = a_magnitude
        .len()
        .cmp(&b_magnitude.len())
        .then_with(|| a_magnitude.cmp(b_magnitude));
      if by_magnitude != Ordering::Equal {
        return by_magnitude;
      }

      // Equal magnitudes with different zero-padding still need an order.
      let raw = a_run.cmp(b_run);
      if raw != Ordering::Equal {
        return raw;
      }

      i = a_end;
      j = b_end;
    } else {
      match ca.cmp(&cb) {
        Ordering::Equal => {
          i += 1;
          j += 1;
        }
        unequal => return unequal,
      }
    }
  }

  (a_bytes.len() - i).cmp(&(b_bytes.len() - j))
}

fn digit_run_end(bytes: &[u8], start: usize) -> usize {
  let mut end = start;
  while end < bytes.len() && bytes[end].is_ascii_digit() {
    end += 1;
  }
  end
}
