use std::fmt;

use crate::config::{to_score, Score};
use crate::states::{StateId, StateRegistry};

/// `child -> parent`, e.g. NNP => NP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnaryRule {
  pub child: StateId,
  pub parent: StateId,
  pub score: Score,
}

impl UnaryRule {
  pub fn new(child: StateId, parent: StateId, weight: f32) -> Self {
    Self {
      child,
      parent,
      score: to_score(weight),
    }
  }

  /// Sort key of the closed rule list
  pub fn key(&self) -> (StateId, StateId) {
    (self.child, self.parent)
  }

  pub fn display<'a>(&'a self, states: &'a StateRegistry) -> RuleDisplay<'a, Self> {
    RuleDisplay { rule: self, states }
  }
}

impl fmt::Display for UnaryRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} -> {} ({})", self.child, self.parent, self.score)
  }
}

/// `left right -> parent`, e.g. VBD @VP|VBD => VP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryRule {
  pub left: StateId,
  pub right: StateId,
  pub parent: StateId,
  pub score: Score,
}

impl BinaryRule {
  pub fn new(left: StateId, right: StateId, parent: StateId, weight: f32) -> Self {
    Self {
      left,
      right,
      parent,
      score: to_score(weight),
    }
  }

  /// Boundary rules join two real (non-synthetic) states; the grammar only uses
  /// them to close a sentence against the boundary symbol.
  pub fn is_boundary(&self, states: &StateRegistry) -> bool {
    !states.is_synthetic(self.left) && !states.is_synthetic(self.right)
  }

  pub fn display<'a>(&'a self, states: &'a StateRegistry) -> RuleDisplay<'a, Self> {
    RuleDisplay { rule: self, states }
  }
}

impl fmt::Display for BinaryRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {} -> {} ({})", self.left, self.right, self.parent, self.score)
  }
}

/// Shows a rule with state tags instead of ids
pub struct RuleDisplay<'a, R> {
  rule: &'a R,
  states: &'a StateRegistry,
}

impl fmt::Display for RuleDisplay<'_, UnaryRule> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let r = self.rule;
    write!(f, "{} -> {} ({})", self.states[r.child], self.states[r.parent], r.score)
  }
}

impl fmt::Display for RuleDisplay<'_, BinaryRule> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let r = self.rule;
    write!(
      f,
      "{} {} -> {} ({})",
      self.states[r.left], self.states[r.right], self.states[r.parent], r.score
    )
  }
}
