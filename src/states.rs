use std::fmt;
use std::ops::Index;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::parse_grammar::{parse_id_text, read_table};

/// Dense id of a grammar state, `0..StateRegistry::len()`
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StateId(pub u32);

impl StateId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl From<usize> for StateId {
  fn from(idx: usize) -> Self {
    Self(idx as u32)
  }
}

impl fmt::Display for StateId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

const SYNTHETIC_MARKER: char = '@';
const OPEN_CLASS_MARKER: char = '+';
const CATEGORY_DELIMITERS: &[char] = &['=', '|', '#', '^', '~', '_'];

#[derive(Debug, Clone, PartialEq)]
pub struct State {
  pub tag: String,
  pub index: StateId,
  /// Only exists to binarize n-ary productions, never shows up in output
  pub synthetic: bool,
  /// Eligible for signature-based guessing of unseen words
  pub open_class: bool,
}

impl State {
  /// Parses a raw tag from the states table, stripping its marker
  pub fn new(index: StateId, raw: &str) -> Self {
    let synthetic = raw.starts_with(SYNTHETIC_MARKER);
    let open_class = raw.starts_with(OPEN_CLASS_MARKER);
    let tag = if synthetic || open_class { &raw[1..] } else { raw };
    Self {
      tag: tag.to_string(),
      index,
      synthetic,
      open_class,
    }
  }

  /// The tag without markovization, functional tags and other annotations:
  /// `NP^S=2` -> `NP`. Tags that *start* with a delimiter (`#`) come out empty.
  pub fn basic_category(&self) -> &str {
    match self.tag.find(CATEGORY_DELIMITERS) {
      Some(idx) => &self.tag[..idx],
      None => &self.tag,
    }
  }
}

impl fmt::Display for State {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.synthetic {
      write!(f, "{}", SYNTHETIC_MARKER)?;
    } else if self.open_class {
      write!(f, "{}", OPEN_CLASS_MARKER)?;
    }
    write!(f, "{}", self.tag)
  }
}

/// Every state of the grammar, indexable by [`StateId`]. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct StateRegistry {
  states: Vec<State>,
}

impl StateRegistry {
  pub fn read_from_file(path: &Path) -> Result<Self> {
    let src = read_table(path)?;
    Self::parse(&src, &path.display().to_string())
  }

  pub fn parse(src: &str, source_name: &str) -> Result<Self> {
    let mut states = parse_id_text(src, source_name)?
      .into_iter()
      .map(|(idx, raw)| State::new(StateId::from(idx), &raw))
      .collect::<Vec<_>>();
    states.sort_by_key(|s| s.index);

    // ids have to be dense, everything downstream indexes arrays with them
    for (expected, state) in states.iter().enumerate() {
      if state.index.index() != expected {
        return Err(Error::malformed(
          source_name,
          0,
          format!("state ids aren't contiguous: expected {}, found {}", expected, state.index),
        ));
      }
    }

    tracing::debug!("{} states", states.len());
    Ok(Self { states })
  }

  pub fn len(&self) -> usize {
    self.states.len()
  }

  pub fn is_empty(&self) -> bool {
    self.states.is_empty()
  }

  pub fn get(&self, id: StateId) -> Option<&State> {
    self.states.get(id.index())
  }

  pub fn contains(&self, id: StateId) -> bool {
    id.index() < self.states.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, State> {
    self.states.iter()
  }

  pub fn is_synthetic(&self, id: StateId) -> bool {
    self[id].synthetic
  }
}

impl Index<StateId> for StateRegistry {
  type Output = State;

  fn index(&self, id: StateId) -> &State {
    &self.states[id.index()]
  }
}

impl FromStr for StateRegistry {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::parse(s, "states")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_markers_are_stripped() {
    let states: StateRegistry = "1 @NP|DT\n0 +NN\n2 S^ROOT-v".parse().unwrap();
    assert_eq!(states.len(), 3);

    assert_eq!(states[StateId(0)].tag, "NN");
    assert!(states[StateId(0)].open_class);
    assert!(!states[StateId(0)].synthetic);

    assert_eq!(states[StateId(1)].tag, "NP|DT");
    assert!(states.is_synthetic(StateId(1)));

    assert_eq!(states[StateId(2)].tag, "S^ROOT-v");
    assert_eq!(states[StateId(2)].to_string(), "S^ROOT-v");
    assert_eq!(states[StateId(1)].to_string(), "@NP|DT");
  }

  #[test]
  fn test_basic_category() {
    let cat = |tag: &str| State::new(StateId(0), tag).basic_category().to_string();
    assert_eq!(cat("S^ROOT-v"), "S");
    assert_eq!(cat("VP-VBN-v"), "VP-VBN-v");
    assert_eq!(cat("NP=2"), "NP");
    assert_eq!(cat("PP|IN~x_y"), "PP");
    assert_eq!(cat("#"), "");
    assert_eq!(cat("$"), "$");
    assert_eq!(cat("@ADJP|JJ"), "ADJP");
  }

  #[test]
  fn test_ids_must_be_dense() {
    assert!("0 A\n2 B".parse::<StateRegistry>().is_err());
    assert!("0 A\n0 B".parse::<StateRegistry>().is_err());
  }
}
