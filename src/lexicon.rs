//! P(state | word) from trained word and signature counts.
//!
//! Known words are scored from their own counts. Rare known words get smoothed
//! toward the distribution of unknown words, and words that were never seen in
//! training fall back to a coarse shape signature (`UNK-LC-DASHs` and friends)
//! restricted to open-class states.

use regex::Regex;
use std::collections::HashMap;

use crate::config::{DataFiles, LexiconConfig};
use crate::error::{Error, Result};
use crate::parse_grammar::{fields, lines, parse_field, parse_id_text, read_table, regex_static};
use crate::states::{StateId, StateRegistry};
use crate::utils::{merge_sorted, right_intersect_sorted};

type Counts = Vec<(StateId, f32)>;

/// Raw text of the four lexicon tables
#[derive(Debug, Clone, Copy)]
pub struct LexiconTables<'a> {
  pub words: &'a str,
  pub sigs: &'a str,
  pub word_state: &'a str,
  pub sig_state: &'a str,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
  config: LexiconConfig,
  word_index: HashMap<String, usize>,
  sig_index: HashMap<String, usize>,
  /// word id => (state, count), sorted by state
  word_state: Vec<Counts>,
  /// signature id => (state, count), sorted by state
  sig_state: Vec<Counts>,
  word_totals: Vec<f32>,
  sig_totals: Vec<f32>,
  /// state => total count over known words
  known_state: Vec<f32>,
  /// state => total count over signatures
  unknown_state: Vec<f32>,
  unknown_total: f32,
  /// open-class states, zero counts
  open_class: Counts,
  /// every state a known word was ever seen with, zero counts
  any_known: Counts,
}

/// Builds the word-shape signature used to score unseen words.
///
/// ```
/// use chartparse::lexicon::signature;
///
/// assert_eq!(signature("phalanxes", None), "UNK-LCs");
/// assert_eq!(signature("IBM", None), "UNK-ALLC");
/// assert_eq!(signature("Apple", Some(0)), "UNK-INITe");
/// assert_eq!(signature("Apple", Some(3)), "UNK-UCe");
/// assert_eq!(signature("1984", None), "UNK-NUM");
/// assert_eq!(signature("x-ray", None), "UNK-LC-DASHy");
/// ```
pub fn signature(word: &str, position: Option<usize>) -> String {
  // decimal digits only, and titlecase letters count on both sides of the case checks
  regex_static!(DIGIT, r"\p{Nd}");
  regex_static!(NON_DIGIT, r"\P{Nd}");
  regex_static!(LOWER, r"[\p{Ll}\p{Lt}]");
  regex_static!(INITIAL_UPPER, r"^[\p{Lu}\p{Lt}]");

  let digit = DIGIT.is_match(word);
  let nondigit = NON_DIGIT.is_match(word);
  let lower = LOWER.is_match(word);

  let mut sig = String::from("UNK");
  if INITIAL_UPPER.is_match(word) {
    if !lower {
      sig.push_str("-ALLC");
    } else if position == Some(0) {
      sig.push_str("-INIT");
    } else {
      sig.push_str("-UC");
    }
  } else if lower {
    sig.push_str("-LC");
  }

  if word.contains('-') {
    sig.push_str("-DASH");
  }

  if digit {
    sig.push_str(if nondigit { "-DIG" } else { "-NUM" });
  } else if word.chars().count() > 3 {
    if let Some(last) = word.chars().last() {
      sig.extend(last.to_lowercase());
    }
  }

  sig
}

impl Lexicon {
  pub fn read_from_files(states: &StateRegistry, files: &DataFiles, config: LexiconConfig) -> Result<Self> {
    let paths = [files.words(), files.sigs(), files.word_state(), files.sig_state()];
    // fail on any missing table before spending time reading the others
    if let Some(missing) = paths.iter().find(|p| !p.exists()) {
      return Err(Error::Missing { path: missing.clone() });
    }
    let [words, sigs, word_state, sig_state] = paths;
    let words = read_table(&words)?;
    let sigs = read_table(&sigs)?;
    let word_state = read_table(&word_state)?;
    let sig_state = read_table(&sig_state)?;

    Self::parse(
      states,
      LexiconTables {
        words: &words,
        sigs: &sigs,
        word_state: &word_state,
        sig_state: &sig_state,
      },
      config,
    )
  }

  pub fn parse(states: &StateRegistry, tables: LexiconTables<'_>, config: LexiconConfig) -> Result<Self> {
    let word_index = Self::parse_index(tables.words, "words")?;
    let sig_index = Self::parse_index(tables.sigs, "sigs")?;
    let word_slots = word_index.values().max().map_or(0, |max| max + 1);
    let sig_slots = sig_index.values().max().map_or(0, |max| max + 1);

    let word = Self::parse_counts(states, tables.word_state, "word_state", word_slots)?;
    let sig = Self::parse_counts(states, tables.sig_state, "sig_state", sig_slots)?;

    let open_class = states
      .iter()
      .filter(|s| s.open_class)
      .map(|s| (s.index, 0.0))
      .collect::<Vec<_>>();
    let any_known = word
      .state_totals
      .iter()
      .enumerate()
      .filter(|(_, count)| **count > 0.0)
      .map(|(idx, _)| (StateId::from(idx), 0.0))
      .collect::<Vec<_>>();

    tracing::debug!(
      "lexicon: {} words, {} signatures, {} open-class states, {} known states",
      word_index.len(),
      sig_index.len(),
      open_class.len(),
      any_known.len()
    );

    Ok(Self {
      config,
      word_index,
      sig_index,
      word_state: word.by_entry,
      sig_state: sig.by_entry,
      word_totals: word.entry_totals,
      sig_totals: sig.entry_totals,
      known_state: word.state_totals,
      unknown_state: sig.state_totals,
      unknown_total: sig.total,
      open_class,
      any_known,
    })
  }

  fn parse_index(src: &str, source_name: &str) -> Result<HashMap<String, usize>> {
    Ok(
      parse_id_text(src, source_name)?
        .into_iter()
        .map(|(idx, text)| (text, idx))
        .collect(),
    )
  }

  fn parse_counts(states: &StateRegistry, src: &str, source_name: &str, slots: usize) -> Result<CountTable> {
    let mut table = CountTable {
      by_entry: vec![Vec::new(); slots],
      entry_totals: vec![0.0; slots],
      state_totals: vec![0.0; states.len()],
      total: 0.0,
    };

    for (line_no, line) in lines(src) {
      let [entry, state, count] = fields::<3>(line, source_name, line_no)?;
      let entry: usize = parse_field(entry, source_name, line_no, "id")?;
      let state = StateId(parse_field(state, source_name, line_no, "state")?);
      let count: f32 = parse_field(count, source_name, line_no, "count")?;

      if entry >= slots {
        return Err(Error::malformed(source_name, line_no, format!("unknown id {}", entry)));
      }
      if !states.contains(state) {
        return Err(Error::malformed(source_name, line_no, format!("unknown state {}", state)));
      }

      table.entry_totals[entry] += count;
      table.by_entry[entry].push((state, count));
      table.state_totals[state.index()] += count;
      table.total += count;
    }

    for counts in table.by_entry.iter_mut() {
      counts.sort_by_key(|(state, _)| *state);
    }

    Ok(table)
  }

  pub fn config(&self) -> &LexiconConfig {
    &self.config
  }

  /// Open-class states, the candidates of any unseen word
  pub fn open_class(&self) -> impl Iterator<Item = StateId> + '_ {
    self.open_class.iter().map(|(state, _)| *state)
  }

  pub fn is_known(&self, word: &str) -> bool {
    self.known_word(word).is_some()
  }

  fn known_word(&self, word: &str) -> Option<usize> {
    self
      .word_index
      .get(word)
      .copied()
      .filter(|&idx| self.word_totals.get(idx).is_some_and(|total| *total > 0.0))
  }

  /// Candidate states for `word` with their log-probabilities, sorted by state.
  /// `position` is the token's index in the sentence if it should influence
  /// the signature of unseen words.
  pub fn score(&self, word: &str, position: Option<usize>) -> Vec<(StateId, f32)> {
    match self.known_word(word) {
      Some(idx) => {
        let smooth = self.word_totals[idx] <= self.config.smooth_threshold;
        self.word_score(idx, smooth)
      }
      None => self.sig_score(word, position),
    }
  }

  fn word_score(&self, word: usize, smooth: bool) -> Vec<(StateId, f32)> {
    let background: &[(StateId, f32)] = if smooth { &self.any_known } else { &[] };
    let candidates = merge_sorted(&self.word_state[word], background);
    let word_total = self.word_totals[word];
    let factor = self.config.word_smooth_factor;

    candidates
      .into_iter()
      .filter_map(|(state, count)| {
        let state_total = self.known_state[state.index()];
        let p_state_given_word = if smooth {
          (count + factor * (self.unknown_state[state.index()] / self.unknown_total)) / (word_total + factor)
        } else {
          count / word_total
        };
        let log_prob = (p_state_given_word * word_total / state_total).ln();
        (log_prob > self.config.min_log_prob).then_some((state, log_prob))
      })
      .collect()
  }

  fn sig_score(&self, word: &str, position: Option<usize>) -> Vec<(StateId, f32)> {
    let sig = signature(word, position);
    let (candidates, sig_total) = match self.sig_index.get(&sig) {
      Some(&idx) if idx < self.sig_state.len() => (
        right_intersect_sorted(&self.sig_state[idx], &self.open_class),
        self.sig_totals[idx],
      ),
      _ => (self.open_class.clone(), 0.0),
    };
    let factor = self.config.sig_smooth_factor;

    candidates
      .into_iter()
      .filter_map(|(state, count)| {
        let state_total = self.known_state[state.index()];
        let p_state_given_sig =
          (count + factor * (self.unknown_state[state.index()] / self.unknown_total)) / (sig_total + factor);
        let log_prob = (p_state_given_sig / state_total).ln();
        (log_prob > self.config.min_log_prob).then_some((state, log_prob))
      })
      .collect()
  }
}

struct CountTable {
  by_entry: Vec<Counts>,
  entry_totals: Vec<f32>,
  state_totals: Vec<f32>,
  total: f32,
}
