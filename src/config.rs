//! Fixed-point score encoding, tunables and data file locations.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::states::StateId;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A log-probability scaled by [`SCORE_RESOLUTION`] and truncated to 16 bits.
pub type Score = i16;

/// Spreads trained log-probabilities across the 16 bit score space.
pub const SCORE_RESOLUTION: f32 = 50.0;

/// Marks a chart cell that hasn't been scored.
pub const EMPTY_SCORE: Score = Score::MIN;

/// Longest sentence (boundary entry included) a default workspace holds.
pub const DEFAULT_SENTENCE_LENGTH: usize = 45;

/// Converts a trained weight to a [`Score`], truncating toward zero.
pub fn to_score(weight: f32) -> Score {
  (weight * SCORE_RESOLUTION) as Score
}

/// Narrows a widened sum back to a storable score. The empty sentinel is
/// never produced, sums below it clamp to the lowest real score.
pub fn saturate(sum: i32) -> Score {
  sum.clamp(EMPTY_SCORE as i32 + 1, Score::MAX as i32) as Score
}

/// Smoothing knobs for [`crate::lexicon::Lexicon`].
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconConfig {
  /// Words seen at most this often get smoothed toward the unknown-word distribution
  pub smooth_threshold: f32,
  pub word_smooth_factor: f32,
  pub sig_smooth_factor: f32,
  /// Candidates scoring at or below this log-probability are dropped
  pub min_log_prob: f32,
}

impl Default for LexiconConfig {
  fn default() -> Self {
    Self {
      smooth_threshold: 100.0,
      word_smooth_factor: 0.2,
      sig_smooth_factor: 1.0,
      min_log_prob: -100.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
  /// Capacity of each pooled chart, counting the trailing boundary entry
  pub max_sentence_len: usize,
  /// Number of charts in the pool, i.e. how many parses may run at once
  pub workspaces: usize,
  pub goal_state: StateId,
  pub boundary_state: StateId,
  /// Tolerance used when backtrace matches sums against recorded scores
  pub epsilon: Score,
  /// Pass token positions to signature scoring, enabling `UNK-INIT`
  pub sentence_initial_signatures: bool,
  pub lexicon: LexiconConfig,
}

impl Default for ParserConfig {
  fn default() -> Self {
    Self {
      max_sentence_len: DEFAULT_SENTENCE_LENGTH,
      workspaces: 1,
      goal_state: StateId(411),
      boundary_state: StateId(412),
      epsilon: 0,
      sentence_initial_signatures: false,
      lexicon: LexiconConfig::default(),
    }
  }
}

impl ParserConfig {
  pub fn with_max_sentence_len(mut self, max_sentence_len: usize) -> Self {
    self.max_sentence_len = max_sentence_len;
    self
  }

  pub fn with_workspaces(mut self, workspaces: usize) -> Self {
    self.workspaces = workspaces;
    self
  }

  pub fn with_goal_state(mut self, goal_state: StateId) -> Self {
    self.goal_state = goal_state;
    self
  }

  pub fn with_boundary_state(mut self, boundary_state: StateId) -> Self {
    self.boundary_state = boundary_state;
    self
  }

  pub fn with_epsilon(mut self, epsilon: Score) -> Self {
    self.epsilon = epsilon;
    self
  }

  pub fn with_sentence_initial_signatures(mut self, enabled: bool) -> Self {
    self.sentence_initial_signatures = enabled;
    self
  }

  pub fn validate(&self, state_count: usize) -> Result<()> {
    if self.workspaces == 0 {
      return Err(Error::Config("at least one workspace is required".into()));
    }
    if self.max_sentence_len < 2 {
      return Err(Error::Config(format!(
        "max sentence length {} leaves no room for a word and the boundary",
        self.max_sentence_len
      )));
    }
    for (name, state) in [("goal", self.goal_state), ("boundary", self.boundary_state)] {
      if state.index() >= state_count {
        return Err(Error::Config(format!(
          "{} state {} is outside the {} loaded states",
          name, state, state_count
        )));
      }
    }
    Ok(())
  }
}

/// Locations of the trained tables inside a data directory.
#[derive(Debug, Clone)]
pub struct DataFiles {
  dir: PathBuf,
}

impl DataFiles {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn states(&self) -> PathBuf {
    self.dir.join("states")
  }

  pub fn words(&self) -> PathBuf {
    self.dir.join("words")
  }

  pub fn sigs(&self) -> PathBuf {
    self.dir.join("sigs")
  }

  pub fn word_state(&self) -> PathBuf {
    self.dir.join("word_state")
  }

  pub fn sig_state(&self) -> PathBuf {
    self.dir.join("sig_state")
  }

  pub fn unary_rules(&self) -> PathBuf {
    self.dir.join("unary_rules")
  }

  pub fn binary_rules(&self) -> PathBuf {
    self.dir.join("binary_rules")
  }

  pub fn americanizations(&self) -> PathBuf {
    self.dir.join("americanizations")
  }

  /// Every table, in load order
  pub fn all(&self) -> [PathBuf; 8] {
    [
      self.americanizations(),
      self.states(),
      self.words(),
      self.sigs(),
      self.word_state(),
      self.sig_state(),
      self.unary_rules(),
      self.binary_rules(),
    ]
  }

  /// Fails on the first table that doesn't exist
  pub fn check(&self) -> Result<()> {
    match self.all().into_iter().find(|path| !path.exists()) {
      Some(path) => Err(Error::Missing { path }),
      None => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_to_score_truncates() {
    assert_eq!(to_score(-0.25), -12);
    assert_eq!(to_score(-1.0), -50);
    assert_eq!(to_score(0.0), 0);
    assert_eq!(to_score(-0.5596158), -27);
  }

  #[test]
  fn test_saturate_avoids_sentinel() {
    assert_eq!(saturate(-40_000), EMPTY_SCORE + 1);
    assert_eq!(saturate(40_000), Score::MAX);
    assert_eq!(saturate(-123), -123);
  }

  #[test]
  fn test_validate() {
    let config = ParserConfig::default()
      .with_goal_state(StateId(0))
      .with_boundary_state(StateId(1));
    assert!(config.validate(2).is_ok());
    assert!(config.validate(1).is_err());
    assert!(config.clone().with_workspaces(0).validate(2).is_err());
    assert!(config.with_max_sentence_len(1).validate(2).is_err());
  }

  #[test]
  fn test_check_names_missing_table() {
    let dir = tempfile::tempdir().unwrap();
    let files = DataFiles::new(dir.path());
    match files.check() {
      Err(Error::Missing { path }) => assert_eq!(path, dir.path().join("americanizations")),
      other => panic!("expected a missing table, got {:?}", other),
    }

    for path in files.all() {
      std::fs::write(path, "").unwrap();
    }
    assert!(files.check().is_ok());
  }
}
