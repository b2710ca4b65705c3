//! The dynamic programming table and the extent bounds used to prune split search.

use crate::config::{EMPTY_SCORE, Score};
use crate::states::StateId;

/// The closest and farthest complementary endpoint at which a state has been
/// seen for a fixed endpoint.
///
/// For spans *ending* at `end`, `narrow` is the greatest begin and `wide` the
/// smallest. For spans *starting* at `begin`, `narrow` is the smallest end and
/// `wide` the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
  pub narrow: usize,
  pub wide: usize,
}

impl Bounds {
  /// Nothing seen yet, for bounds keyed by end
  const EMPTY_LEFT: Self = Self {
    narrow: usize::MIN,
    wide: usize::MAX,
  };

  /// Nothing seen yet, for bounds keyed by begin
  const EMPTY_RIGHT: Self = Self {
    narrow: usize::MAX,
    wide: usize::MIN,
  };

  pub fn is_empty(&self) -> bool {
    *self == Self::EMPTY_LEFT || *self == Self::EMPTY_RIGHT
  }
}

/// Scratch space for one parse: `score[begin][end][state]` for every span of
/// a sentence up to `words` entries long, plus extent bounds and, per begin,
/// the sparse list of states seen starting there.
///
/// Spans are upper-triangular (`end > begin`) and stored row by row in one
/// flat buffer, so each `[begin][end]` block of states is contiguous.
#[derive(Debug, Clone)]
pub struct Chart {
  words: usize,
  states: usize,
  scores: Vec<Score>,
  /// end * states + state => begins of spans ending at end
  left_extents: Vec<Bounds>,
  /// begin * states + state => ends of spans starting at begin
  right_extents: Vec<Bounds>,
  /// begin => states in order of first appearance
  seen_states: Vec<Vec<StateId>>,
}

impl Chart {
  pub fn new(words: usize, states: usize) -> Self {
    let cells = words * (words + 1) / 2;
    Self {
      words,
      states,
      scores: vec![EMPTY_SCORE; cells * states],
      left_extents: vec![Bounds::EMPTY_LEFT; (words + 1) * states],
      right_extents: vec![Bounds::EMPTY_RIGHT; words * states],
      seen_states: (0..words).map(|_| Vec::with_capacity(1024.min(states))).collect(),
    }
  }

  /// Longest sentence (in entries) this chart holds
  pub fn capacity(&self) -> usize {
    self.words
  }

  pub fn state_count(&self) -> usize {
    self.states
  }

  /// Index of the first state of the `[begin, end)` block
  fn cell(&self, begin: usize, end: usize) -> usize {
    debug_assert!(begin < end && end <= self.words, "bad span {}..{}", begin, end);
    let row = begin * (2 * self.words - begin + 1) / 2;
    (row + end - begin - 1) * self.states
  }

  /// Resets everything a sentence of `len` entries can touch. Cheaper than a
  /// full reset when `len` is well below capacity.
  pub fn clear(&mut self, len: usize) {
    assert!(len <= self.words, "can't clear {} entries of a {} entry chart", len, self.words);

    for begin in 0..len {
      let from = self.cell(begin, begin + 1);
      let to = self.cell(begin, len) + self.states;
      self.scores[from..to].fill(EMPTY_SCORE);
    }
    self.left_extents[..(len + 1) * self.states].fill(Bounds::EMPTY_LEFT);
    self.right_extents[..len * self.states].fill(Bounds::EMPTY_RIGHT);
    for seen in self.seen_states[..len].iter_mut() {
      seen.clear();
    }
  }

  /// Records `score` for `state` over `[begin, end)`, keeping the best score
  /// if one is already there.
  pub fn put(&mut self, begin: usize, end: usize, state: StateId, score: Score) {
    let idx = self.cell(begin, end) + state.index();
    let current = self.scores[idx];
    if current != EMPTY_SCORE {
      if current < score {
        self.scores[idx] = score;
      }
      return;
    }
    self.scores[idx] = score;

    // first time this state occupies [begin, end), widen the bounds to fit
    let left = &mut self.left_extents[end * self.states + state.index()];
    left.narrow = left.narrow.max(begin);
    left.wide = left.wide.min(begin);

    let right = &mut self.right_extents[begin * self.states + state.index()];
    if right.narrow == Bounds::EMPTY_RIGHT.narrow {
      self.seen_states[begin].push(state);
    }
    right.narrow = right.narrow.min(end);
    right.wide = right.wide.max(end);
  }

  pub fn put_all(&mut self, begin: usize, end: usize, scores: &[(StateId, Score)]) {
    for &(state, score) in scores {
      self.put(begin, end, state, score);
    }
  }

  /// Best score of `state` over `[begin, end)`, or [`EMPTY_SCORE`]
  pub fn get(&self, begin: usize, end: usize, state: StateId) -> Score {
    self.scores[self.cell(begin, end) + state.index()]
  }

  /// Best score of `state` over `[begin, end)` if it has one
  pub fn score(&self, begin: usize, end: usize, state: StateId) -> Option<Score> {
    Some(self.get(begin, end, state)).filter(|s| *s != EMPTY_SCORE)
  }

  /// Where spans of `state` ending at `end` begin
  pub fn left_bounds(&self, end: usize, state: StateId) -> Bounds {
    self.left_extents[end * self.states + state.index()]
  }

  /// Where spans of `state` starting at `begin` end
  pub fn right_bounds(&self, begin: usize, state: StateId) -> Bounds {
    self.right_extents[begin * self.states + state.index()]
  }

  /// States recorded over some span starting at `begin`, in order of first appearance
  pub fn seen_states(&self, begin: usize) -> &[StateId] {
    &self.seen_states[begin]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn test_put_keeps_max() {
    let mut chart = Chart::new(4, 3);
    assert_eq!(chart.get(0, 2, StateId(1)), EMPTY_SCORE);
    chart.put(0, 2, StateId(1), -40);
    chart.put(0, 2, StateId(1), -60);
    assert_eq!(chart.get(0, 2, StateId(1)), -40);
    chart.put(0, 2, StateId(1), -10);
    assert_eq!(chart.score(0, 2, StateId(1)), Some(-10));
    assert_eq!(chart.score(0, 2, StateId(0)), None);
    assert_eq!(chart.score(1, 2, StateId(1)), None);
  }

  #[test]
  fn test_cells_dont_alias() {
    let mut chart = Chart::new(5, 2);
    let mut expected = Vec::new();
    let mut score = -1;
    for begin in 0..5 {
      for end in begin + 1..=5 {
        for state in 0..2 {
          chart.put(begin, end, StateId(state), score);
          expected.push((begin, end, state, score));
          score -= 1;
        }
      }
    }
    for (begin, end, state, score) in expected {
      assert_eq!(chart.get(begin, end, StateId(state)), score);
    }
  }

  #[test]
  fn test_seen_states_in_first_appearance_order() {
    let mut chart = Chart::new(4, 5);
    chart.put(1, 3, StateId(4), -1);
    chart.put(1, 2, StateId(2), -1);
    chart.put(1, 4, StateId(4), -1);
    chart.put(1, 2, StateId(4), -1);
    assert_eq!(chart.seen_states(1), &[StateId(4), StateId(2)]);
    assert!(chart.seen_states(0).is_empty());
    assert_eq!(chart.right_bounds(1, StateId(4)), Bounds { narrow: 2, wide: 4 });
  }

  #[test]
  fn test_clear_resets_prefix() {
    let mut chart = Chart::new(4, 2);
    chart.put(0, 1, StateId(0), -5);
    chart.put(2, 4, StateId(1), -5);
    chart.clear(2);
    assert_eq!(chart.get(0, 1, StateId(0)), EMPTY_SCORE);
    assert!(chart.seen_states(0).is_empty());
    assert!(chart.left_bounds(1, StateId(0)).is_empty());
    assert!(chart.right_bounds(0, StateId(0)).is_empty());
    // outside the cleared prefix, but the next parse of length 2 never looks there
    assert_eq!(chart.get(2, 4, StateId(1)), -5);

    chart.clear(4);
    assert_eq!(chart.get(2, 4, StateId(1)), EMPTY_SCORE);
    assert!(chart.left_bounds(4, StateId(1)).is_empty());
  }

  fn put_strategy(words: usize, states: u32) -> impl Strategy<Value = (usize, usize, u32, Score)> {
    (0..words, 1..=words, 0..states, (EMPTY_SCORE + 1)..=0)
      .prop_filter("end must follow begin", |(begin, end, _, _)| begin < end)
  }

  proptest! {
    #[test]
    fn prop_get_returns_max_put(puts in prop::collection::vec(put_strategy(6, 4), 1..60)) {
      let mut chart = Chart::new(6, 4);
      for &(begin, end, state, score) in puts.iter() {
        chart.put(begin, end, StateId(state), score);
      }
      for &(begin, end, state, _) in puts.iter() {
        let best = puts
          .iter()
          .filter(|p| p.0 == begin && p.1 == end && p.2 == state)
          .map(|p| p.3)
          .max()
          .unwrap();
        prop_assert_eq!(chart.get(begin, end, StateId(state)), best);
      }
    }

    #[test]
    fn prop_bounds_track_extremes(puts in prop::collection::vec(put_strategy(6, 3), 1..60)) {
      let mut chart = Chart::new(6, 3);
      for &(begin, end, state, score) in puts.iter() {
        chart.put(begin, end, StateId(state), score);
      }
      for &(begin, end, state, _) in puts.iter() {
        let begins = puts.iter().filter(|p| p.1 == end && p.2 == state).map(|p| p.0);
        prop_assert_eq!(
          chart.left_bounds(end, StateId(state)),
          Bounds { narrow: begins.clone().max().unwrap(), wide: begins.min().unwrap() }
        );

        let ends = puts.iter().filter(|p| p.0 == begin && p.2 == state).map(|p| p.1);
        prop_assert_eq!(
          chart.right_bounds(begin, StateId(state)),
          Bounds { narrow: ends.clone().min().unwrap(), wide: ends.max().unwrap() }
        );

        let seen = chart.seen_states(begin).iter().filter(|s| **s == StateId(state)).count();
        prop_assert_eq!(seen, 1);
      }
    }
  }
}
