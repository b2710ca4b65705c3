use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::Score;
use crate::states::StateId;

/// Everything that can go wrong while loading tables or parsing a sentence.
///
/// Note that a sentence the grammar simply doesn't license is *not* an error,
/// parse entry points return `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum Error {
  #[error("can't find {}", path.display())]
  Missing { path: PathBuf },

  #[error("failed to read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("{source_name}:{line}: {message}")]
  Malformed {
    source_name: String,
    line: usize,
    message: String,
  },

  #[error("sentence of {length} entries is too large for a workspace of {capacity}")]
  Capacity { length: usize, capacity: usize },

  #[error("no rule reproduces score {score} for state {state} over {begin}..{end}")]
  Inconsistent {
    state: StateId,
    begin: usize,
    end: usize,
    score: Score,
  },

  #[error("invalid configuration: {0}")]
  Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
  pub(crate) fn malformed(source_name: &str, line: usize, message: impl Into<String>) -> Self {
    Self::Malformed {
      source_name: source_name.to_string(),
      line,
      message: message.into(),
    }
  }
}
