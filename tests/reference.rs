//! Checks against the trained reference grammar. The tables aren't shipped with
//! the crate; point `CHARTPARSE_DATA` at them and run with `--ignored`.

use std::env;
use std::path::PathBuf;

use chartparse::config::ParserConfig;
use chartparse::{Error, Parser};

fn data_dir() -> PathBuf {
  env::var_os("CHARTPARSE_DATA")
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("share").join("pfp"))
}

fn reference_parser() -> Parser {
  Parser::load(data_dir(), ParserConfig::default()).unwrap()
}

#[test]
#[ignore]
fn test_parse_listing() {
  let parser = reference_parser();
  let sentence =
    "Description This 2005 Nissan Altima available from Rama Auto Inc with Stock # 330051 is priced at $ 9500.00 .";
  assert_eq!(
    parser.parse(sentence).unwrap().as_deref(),
    Some(
      "(ROOT (S (S (VP (VBG Description) (NP (DT This) (CD 2005) (NNP Nissan) (NNP Altima)) (ADJP (JJ available) (PP (IN from) (NP (NP (NNP Rama) (NNP Auto) (NNP Inc)) (PP (IN with) (NP (NNP Stock)))))))) (NP (# #) (CD 330051)) (VP (VBZ is) (VP-VBN-v (VBN priced) (PP (IN at) (NP ($ $) (CD 9500.00))))) (. .)) )"
    )
  );
}

#[test]
#[ignore]
fn test_known_word_candidates() {
  let parser = reference_parser();
  let scores = parser.lexicon().score("The", None);
  assert_eq!(scores.len(), 5);
  assert!(scores.windows(2).all(|w| w[0].0 < w[1].0));
}

#[test]
#[ignore]
fn test_empty_word_candidates() {
  let parser = reference_parser();
  assert_eq!(parser.lexicon().score("", None).len(), 18);
}

#[test]
#[ignore]
fn test_same_tree_twice() {
  let parser = reference_parser();
  let tokens = ["The", "dealer", "priced", "it", "at", "$", "9500.00", "."];
  assert_eq!(parser.parse_tree(&tokens).unwrap(), parser.parse_tree(&tokens).unwrap());
}

#[test]
fn test_missing_tables() {
  let dir = tempfile::tempdir().unwrap();
  match Parser::load(dir.path(), ParserConfig::default()) {
    Err(Error::Missing { path }) => assert!(path.starts_with(dir.path())),
    Err(e) => panic!("unexpected error {}", e),
    Ok(_) => panic!("loaded from an empty directory"),
  }
}
