#[macro_use]
extern crate lazy_static;

pub mod chart;
pub mod cky;
pub mod config;
pub mod error;
pub mod grammar;
pub mod lexicon;
pub mod parse_grammar;
pub mod pool;
pub mod rules;
pub mod states;
pub mod syntree;
pub mod tokenizer;
pub mod utils;

use std::path::Path;

use crate::cky::{Candidates, ChartParser, ParseTree};
use crate::config::{to_score, DataFiles, ParserConfig};
pub use crate::error::{Error, Result};
use crate::grammar::Grammar;
use crate::lexicon::Lexicon;
use crate::pool::WorkspacePool;
use crate::syntree::SynTree;
use crate::tokenizer::{Tokenize, Tokenizer};

/// A loaded grammar and lexicon plus the charts to parse with. Shareable
/// across threads; at most `workspaces` parses run at once, the rest wait.
pub struct Parser {
  grammar: Grammar,
  lexicon: Lexicon,
  tokenizer: Box<dyn Tokenize + Send + Sync>,
  config: ParserConfig,
  pool: WorkspacePool,
}

impl Parser {
  /// Loads every table under `data_dir`. Any missing table is reported before
  /// the others are read.
  pub fn load(data_dir: impl AsRef<Path>, config: ParserConfig) -> Result<Self> {
    let files = DataFiles::new(data_dir.as_ref());
    files.check()?;
    tracing::info!("loading lexicon and grammar from {}", files.dir().display());

    let tokenizer = Tokenizer::read_from_file(&files.americanizations())?;
    let grammar = Grammar::read_from_files(&files)?;
    let lexicon = Lexicon::read_from_files(&grammar.states, &files, config.lexicon.clone())?;
    Self::from_parts(grammar, lexicon, tokenizer, config)
  }

  pub fn from_parts<T>(grammar: Grammar, lexicon: Lexicon, tokenizer: T, config: ParserConfig) -> Result<Self>
  where
    T: Tokenize + Send + Sync + 'static,
  {
    config.validate(grammar.states.len())?;
    let pool = WorkspacePool::new(config.workspaces, config.max_sentence_len, grammar.states.len());
    Ok(Self {
      grammar,
      lexicon,
      tokenizer: Box::new(tokenizer),
      config,
      pool,
    })
  }

  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  pub fn lexicon(&self) -> &Lexicon {
    &self.lexicon
  }

  pub fn config(&self) -> &ParserConfig {
    &self.config
  }

  pub fn pool(&self) -> &WorkspacePool {
    &self.pool
  }

  pub fn tokenize(&self, sentence: &str) -> Vec<String> {
    self.tokenizer.tokenize(sentence)
  }

  /// Tokenizes and parses a raw sentence into a bracketed tree. `Ok(None)`
  /// means the grammar has no derivation for it.
  pub fn parse(&self, sentence: &str) -> Result<Option<String>> {
    self.parse_tokens(&self.tokenize(sentence))
  }

  pub fn parse_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Option<String>> {
    Ok(self.parse_tree(tokens)?.map(|tree| self.render(&tree, tokens)))
  }

  /// The debinarized tree with chart scores. Leaves hold token positions; the
  /// last child of the root covers the boundary entry after the final token.
  pub fn parse_tree<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Option<ParseTree>> {
    let sentence = self.candidates(tokens);
    if sentence.len() > self.config.max_sentence_len {
      return Err(Error::Capacity {
        length: sentence.len(),
        capacity: self.config.max_sentence_len,
      });
    }

    let mut chart = self.pool.acquire();
    ChartParser::new(&self.grammar, &self.config).parse(&sentence, &mut chart)
  }

  /// Lexical candidates for each token, plus the trailing boundary entry
  fn candidates<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<Candidates> {
    let mut sentence = Vec::with_capacity(tokens.len() + 1);
    for (idx, token) in tokens.iter().enumerate() {
      let position = self.config.sentence_initial_signatures.then_some(idx);
      let candidates = self
        .lexicon
        .score(token.as_ref(), position)
        .into_iter()
        .map(|(state, log_prob)| (state, to_score(log_prob)))
        .collect::<Candidates>();
      if candidates.is_empty() {
        tracing::warn!("no candidate states for {:?}", token.as_ref());
      }
      sentence.push(candidates);
    }
    sentence.push(vec![(self.config.boundary_state, 0)]);
    sentence
  }

  /// Penn Treebank style brackets, labelled with basic categories
  pub fn render<S: AsRef<str>>(&self, tree: &ParseTree, tokens: &[S]) -> String {
    let mut out = String::new();
    self.stitch(&mut out, tree, tokens);
    out
  }

  fn stitch<S: AsRef<str>>(&self, out: &mut String, tree: &ParseTree, tokens: &[S]) {
    let token = |idx: usize| tokens.get(idx).map_or("", |t| t.as_ref());

    match tree {
      SynTree::Leaf(word) => out.push_str(token(word.value)),
      SynTree::Branch(cons, children) => {
        // the boundary is invisible, but its separator isn't
        if cons.value.state == self.config.boundary_state {
          return;
        }

        let category = self.grammar.states[cons.value.state].basic_category();
        out.push('(');
        match children.as_slice() {
          [SynTree::Leaf(word)] if category.is_empty() => out.push_str(token(word.value)),
          _ => out.push_str(category),
        }
        out.push(' ');
        for (idx, child) in children.iter().enumerate() {
          if idx > 0 {
            out.push(' ');
          }
          self.stitch(out, child, tokens);
        }
        out.push(')');
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::states::StateId;
  use crate::tokenizer::WhitespaceTokenizer;
  use std::fs;
  use std::path::PathBuf;
  use std::thread;

  fn toy_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join("toy")
  }

  fn toy_config() -> ParserConfig {
    ParserConfig::default()
      .with_goal_state(StateId(0))
      .with_boundary_state(StateId(1))
      .with_max_sentence_len(8)
  }

  fn toy_parser() -> Parser {
    Parser::load(toy_dir(), toy_config()).unwrap()
  }

  #[test]
  fn test_parse_sentence() {
    let parser = toy_parser();
    assert_eq!(
      parser.parse("the dog barks").unwrap().as_deref(),
      Some("(ROOT (S (NP (DT the) (NN dog)) (VP (VBZ barks))) )")
    );
    assert_eq!(
      parser.parse("the dog barks a dog").unwrap().as_deref(),
      Some("(ROOT (S (NP (DT the) (NN dog)) (VP (VBZ barks) (NP (DT a) (NN dog)))) )")
    );
  }

  #[test]
  fn test_unknown_word() {
    let parser = toy_parser();
    assert_eq!(
      parser.parse_tokens(&["the", "cats", "barks"]).unwrap().as_deref(),
      Some("(ROOT (S (NP (DT the) (NN cats)) (VP (VBZ barks))) )")
    );
  }

  #[test]
  fn test_no_parse_is_not_an_error() {
    let parser = toy_parser();
    assert_eq!(parser.parse("dog the barks").unwrap(), None);
    assert_eq!(parser.parse("").unwrap(), None);
  }

  #[test]
  fn test_scored_tree() {
    let parser = toy_parser();
    let tree = parser.parse_tree(&["the", "dog", "barks"]).unwrap().unwrap();
    let (root, children) = tree.get_branch().unwrap();
    assert_eq!(root.value.state, StateId(0));
    // the -27, dog 0, barks -14, then -25 -50 -25 from the rules
    assert_eq!(root.value.score, -141);
    assert_eq!(children.last().unwrap().span(), (3, 4));
  }

  #[test]
  fn test_capacity_error() {
    let parser = Parser::load(toy_dir(), toy_config().with_max_sentence_len(4)).unwrap();
    assert!(parser.parse("the dog barks").unwrap().is_some());
    let err = parser.parse("the dog barks a dog").unwrap_err();
    assert!(matches!(err, Error::Capacity { length: 6, capacity: 4 }));
    // the failed request doesn't hold on to a chart
    assert_eq!(parser.pool().available(), 1);
  }

  #[test]
  fn test_missing_data_dir() {
    let err = Parser::load(toy_dir().join("nope"), toy_config()).err().unwrap();
    assert!(matches!(err, Error::Missing { .. }));
    assert!(err.to_string().starts_with("can't find"));
  }

  #[test]
  fn test_bad_config() {
    let err = Parser::load(toy_dir(), ParserConfig::default()).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
  }

  #[test]
  fn test_malformed_table() {
    let dir = tempfile::tempdir().unwrap();
    for entry in fs::read_dir(toy_dir()).unwrap() {
      let entry = entry.unwrap();
      fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    fs::write(dir.path().join("binary_rules"), "5 8 3 -0.5\n3 9 two -0.5\n").unwrap();

    match Parser::load(dir.path(), toy_config()) {
      Err(Error::Malformed { source_name, line, .. }) => {
        assert!(source_name.ends_with("binary_rules"));
        assert_eq!(line, 2);
      }
      Err(e) => panic!("unexpected error {}", e),
      Ok(_) => panic!("loaded a malformed table"),
    }
  }

  #[test]
  fn test_parallel_parses_agree() {
    let parser = Parser::load(toy_dir(), toy_config().with_workspaces(2)).unwrap();
    let expected = parser.parse("the dog barks a dog").unwrap();
    assert!(expected.is_some());

    thread::scope(|s| {
      let handles = (0..8)
        .map(|_| s.spawn(|| parser.parse("the dog barks a dog").unwrap()))
        .collect::<Vec<_>>();
      for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
      }
    });
    assert_eq!(parser.pool().available(), 2);
  }

  #[test]
  fn test_repeat_parse_is_deterministic() {
    let parser = toy_parser();
    let first = parser.parse_tree(&["the", "dog", "barks"]).unwrap();
    parser.parse("a dog barks the dog").unwrap();
    let second = parser.parse_tree(&["the", "dog", "barks"]).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn test_from_parts_with_pretokenized_input() {
    let grammar = Grammar::read_from_files(&DataFiles::new(toy_dir())).unwrap();
    let lexicon = Lexicon::read_from_files(&grammar.states, &DataFiles::new(toy_dir()), Default::default()).unwrap();
    let parser = Parser::from_parts(grammar, lexicon, WhitespaceTokenizer, toy_config()).unwrap();
    assert_eq!(parser.tokenize("the  dog\tbarks"), vec!["the", "dog", "barks"]);
    assert!(parser.parse("the dog barks").unwrap().is_some());
  }
}
