//! Readers for the whitespace/line delimited tables the trained grammar ships as.
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

pub(crate) use regex_static;

/// Reads a whole table, distinguishing a missing file from an unreadable one
pub fn read_table(path: &Path) -> Result<String> {
  if !path.exists() {
    return Err(Error::Missing {
      path: path.to_path_buf(),
    });
  }
  tracing::info!("loading {}", path.display());
  fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Non-blank lines, numbered from 1
pub fn lines(src: &str) -> impl Iterator<Item = (usize, &str)> {
  src
    .lines()
    .enumerate()
    .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
    .filter(|(_, line)| !line.trim().is_empty())
}

/// Parses `index<space>text` rows. Everything after the first space is the text,
/// so tags and words may themselves contain spaces.
pub fn parse_id_text(src: &str, source_name: &str) -> Result<Vec<(usize, String)>> {
  regex_static!(ID_TEXT, r"^\s*(\d+) (.*)$");

  lines(src)
    .map(|(line_no, line)| {
      let caps = ID_TEXT
        .captures(line)
        .ok_or_else(|| Error::malformed(source_name, line_no, format!("expected `index text`, got {:?}", line)))?;
      let index = parse_field(&caps[1], source_name, line_no, "index")?;
      Ok((index, caps[2].to_string()))
    })
    .collect()
}

/// Splits a row into exactly `N` whitespace separated fields
pub fn fields<'a, const N: usize>(line: &'a str, source_name: &str, line_no: usize) -> Result<[&'a str; N]> {
  let mut out = [""; N];
  let mut iter = line.split_whitespace();
  for slot in out.iter_mut() {
    *slot = iter
      .next()
      .ok_or_else(|| Error::malformed(source_name, line_no, format!("expected {} fields", N)))?;
  }
  if iter.next().is_some() {
    return Err(Error::malformed(source_name, line_no, format!("expected {} fields", N)));
  }
  Ok(out)
}

pub fn parse_field<T: FromStr>(field: &str, source_name: &str, line_no: usize, what: &str) -> Result<T> {
  field
    .parse()
    .map_err(|_| Error::malformed(source_name, line_no, format!("bad {}: {:?}", what, field)))
}
