use std::cmp::Ordering;

/// Outer join of two key-sorted lists. Where both lists have a key, the entry
/// from `major` wins. Output stays sorted.
///
/// ```
/// let major = vec![(1, "a"), (3, "b")];
/// let minor = vec![(0, "x"), (3, "y"), (4, "z")];
///
/// assert_eq!(chartparse::utils::merge_sorted(&major, &minor), vec![
///   (0, "x"),
///   (1, "a"),
///   (3, "b"),
///   (4, "z"),
/// ]);
/// ```
pub fn merge_sorted<K, V>(major: &[(K, V)], minor: &[(K, V)]) -> Vec<(K, V)>
where
  K: Ord + Copy,
  V: Copy,
{
  let mut out = Vec::with_capacity(major.len() + minor.len());
  let (mut i, mut j) = (0, 0);
  while i < major.len() && j < minor.len() {
    match major[i].0.cmp(&minor[j].0) {
      Ordering::Less => {
        out.push(major[i]);
        i += 1;
      }
      Ordering::Greater => {
        out.push(minor[j]);
        j += 1;
      }
      Ordering::Equal => {
        out.push(major[i]);
        i += 1;
        j += 1;
      }
    }
  }
  out.extend_from_slice(&major[i..]);
  out.extend_from_slice(&minor[j..]);
  out
}

/// Right join of two key-sorted lists: exactly the keys of `minor` survive,
/// but where `major` also has the key its entry wins.
///
/// ```
/// let major = vec![(1, 10), (2, 20), (5, 50)];
/// let minor = vec![(2, 0), (3, 0), (5, 0)];
///
/// assert_eq!(chartparse::utils::right_intersect_sorted(&major, &minor), vec![
///   (2, 20),
///   (3, 0),
///   (5, 50),
/// ]);
/// ```
pub fn right_intersect_sorted<K, V>(major: &[(K, V)], minor: &[(K, V)]) -> Vec<(K, V)>
where
  K: Ord + Copy,
  V: Copy,
{
  let mut out = Vec::with_capacity(minor.len());
  let (mut i, mut j) = (0, 0);
  while i < major.len() && j < minor.len() {
    match major[i].0.cmp(&minor[j].0) {
      Ordering::Less => i += 1,
      Ordering::Greater => {
        out.push(minor[j]);
        j += 1;
      }
      Ordering::Equal => {
        out.push(major[i]);
        i += 1;
        j += 1;
      }
    }
  }
  out.extend_from_slice(&minor[j..]);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_merge_with_empty() {
    let some = vec![(1u32, 1.0f32), (2, 2.0)];
    assert_eq!(merge_sorted(&some, &[]), some);
    assert_eq!(merge_sorted(&[], &some), some);
  }

  #[test]
  fn test_right_intersect_keeps_minor_keys() {
    let major = vec![(0u32, 9.0f32), (7, 9.0)];
    let minor = vec![(1u32, 0.0f32), (2, 0.0)];
    assert_eq!(right_intersect_sorted(&major, &minor), minor);
    assert!(right_intersect_sorted(&major, &[]).is_empty());
  }
}
