//! Exhaustive bottom-up parsing over a binarized grammar.
//!
//! Every span of the sentence, shortest first, gets a score for every state
//! the grammar can build over it. Binary combinations only search the split
//! points the chart's extent bounds allow, and the closed unary rules are
//! applied once per span. The sentence ends with a boundary entry that only
//! the grammar's boundary rules can consume, producing the goal state over the
//! whole input.

use std::fmt;

use crate::chart::Chart;
use crate::config::{saturate, ParserConfig, Score};
use crate::error::{Error, Result};
use crate::grammar::Grammar;
use crate::states::StateId;
use crate::syntree::{Constituent, SynTree, Word};

/// Lexical candidates for one sentence entry, as `(state, score)` pairs.
pub type Candidates = Vec<(StateId, Score)>;

/// A parse tree node: the state and the chart score it was recovered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartNode {
  pub state: StateId,
  pub score: Score,
}

impl fmt::Display for ChartNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.state, self.score)
  }
}

/// A parse tree whose leaves are sentence positions.
pub type ParseTree = SynTree<ChartNode, usize>;

#[derive(Debug, Clone, Copy)]
pub struct ChartParser<'g> {
  grammar: &'g Grammar,
  goal: StateId,
  boundary: StateId,
  epsilon: Score,
}

impl<'g> ChartParser<'g> {
  pub fn new(grammar: &'g Grammar, config: &ParserConfig) -> Self {
    Self {
      grammar,
      goal: config.goal_state,
      boundary: config.boundary_state,
      epsilon: config.epsilon,
    }
  }

  /// Parses a sentence of lexical candidates whose last entry is the boundary.
  ///
  /// Returns `Ok(None)` when the grammar doesn't derive the goal state over the
  /// whole sentence. The chart is cleared before use and may be reused.
  pub fn parse(&self, sentence: &[Candidates], chart: &mut Chart) -> Result<Option<ParseTree>> {
    if sentence.len() > chart.capacity() {
      return Err(Error::Capacity {
        length: sentence.len(),
        capacity: chart.capacity(),
      });
    }
    debug_assert_eq!(chart.state_count(), self.grammar.states.len());

    // nothing but the boundary, or not even that
    if sentence.len() < 2 {
      return Ok(None);
    }

    self.fill(sentence, chart);
    self.close_boundary(sentence.len(), chart);

    if chart.score(0, sentence.len(), self.goal).is_none() {
      tracing::debug!("no parse for {} entries", sentence.len());
      return Ok(None);
    }

    let tree = self.best_parse(sentence, chart, 0, sentence.len(), self.goal)?;
    tracing::debug!("parsed {} entries, score {}", sentence.len(), chart.get(0, sentence.len(), self.goal));
    Ok(Some(self.debinarize(tree)))
  }

  /// Scores every span that ends before the boundary entry.
  fn fill(&self, sentence: &[Candidates], chart: &mut Chart) {
    let len = sentence.len();
    chart.clear(len);
    for (begin, candidates) in sentence.iter().enumerate() {
      chart.put_all(begin, begin + 1, candidates);
    }

    for size in 1..len {
      for begin in 0..len - size {
        let end = begin + size;
        if size > 1 {
          self.apply_binary(chart, begin, end);
        }
        self.apply_unary(chart, begin, end);
      }
    }
  }

  fn apply_binary(&self, chart: &mut Chart, begin: usize, end: usize) {
    // states this cell adds to the list aren't candidates for its own left child
    let seen = chart.seen_states(begin).len();
    for i in 0..seen {
      let left = chart.seen_states(begin)[i];
      for rule in self.grammar.binary.rules_by_left(left) {
        let ends = chart.right_bounds(begin, left);
        let begins = chart.left_bounds(end, rule.right);
        // the right child must be able to start somewhere the left child ends
        if begins.narrow < ends.narrow || begins.wide > ends.wide {
          continue;
        }

        let mut best: Option<i32> = None;
        for split in ends.narrow.max(begins.wide)..=ends.wide.min(begins.narrow) {
          if let (Some(l), Some(r)) = (chart.score(begin, split, left), chart.score(split, end, rule.right)) {
            let sum = l as i32 + r as i32;
            best = Some(best.map_or(sum, |b| b.max(sum)));
          }
        }
        if let Some(best) = best {
          chart.put(begin, end, rule.parent, saturate(best + rule.score as i32));
        }
      }
    }
  }

  fn apply_unary(&self, chart: &mut Chart, begin: usize, end: usize) {
    // in closed-rule order, so parents written here feed later rules
    for rule in self.grammar.unary.closed_rules() {
      if let Some(child) = chart.score(begin, end, rule.child) {
        chart.put(begin, end, rule.parent, saturate(child as i32 + rule.score as i32));
      }
    }
  }

  /// Joins everything before the boundary with the boundary entry.
  fn close_boundary(&self, len: usize, chart: &mut Chart) {
    let split = len - 1;
    for rule in self.grammar.binary.boundary_rules().iter().filter(|r| r.right == self.boundary) {
      if let (Some(l), Some(r)) = (chart.score(0, split, rule.left), chart.score(split, len, rule.right)) {
        chart.put(0, len, rule.parent, saturate(l as i32 + r as i32 + rule.score as i32));
      }
    }
  }

  fn reproduces(&self, target: Score, sum: i32) -> bool {
    (saturate(sum) as i32 - target as i32).abs() <= self.epsilon as i32
  }

  /// Recovers the derivation of `state` over `[begin, end)` from a filled chart.
  ///
  /// Binary rules are tried first (split points left to right), then direct
  /// unary rules. A rule whose children can't be derived in turn is passed
  /// over for the next one. Fails with [`Error::Inconsistent`] when no rule
  /// reproduces the recorded score.
  pub fn best_parse(
    &self,
    sentence: &[Candidates],
    chart: &Chart,
    begin: usize,
    end: usize,
    state: StateId,
  ) -> Result<ParseTree> {
    let tree = self.derive(sentence, chart, begin, end, state, &mut Vec::new());
    if let Err(Error::Inconsistent {
      state,
      begin,
      end,
      score,
    }) = &tree
    {
      tracing::error!(
        "backtrace failed: {} over {}..{} scored {} but no rule reproduces it",
        self.grammar.states[*state],
        begin,
        end,
        score
      );
    }
    tree
  }

  /// `chain` holds the states above this one in the current run of unary
  /// rules over the same span.
  fn derive(
    &self,
    sentence: &[Candidates],
    chart: &Chart,
    begin: usize,
    end: usize,
    state: StateId,
    chain: &mut Vec<StateId>,
  ) -> Result<ParseTree> {
    let score = chart.get(begin, end, state);
    let node = Constituent {
      value: ChartNode { state, score },
      span: (begin, end),
    };

    if end - begin == 1 && sentence[begin].iter().any(|&(s, _)| s == state) {
      let word = SynTree::Leaf(Word {
        value: begin,
        span: (begin, end),
      });
      return Ok(SynTree::Branch(node, vec![word]));
    }

    let mut failure = None;

    let full = begin == 0 && end == sentence.len();
    let (rules, splits) = if full {
      (self.grammar.binary.boundary_rules(), end - 1..end)
    } else {
      (self.grammar.binary.rules_by_parent(state), begin + 1..end)
    };
    for split in splits {
      for rule in rules
        .iter()
        .filter(|r| r.parent == state && (!full || r.right == self.boundary))
      {
        if let (Some(l), Some(r)) = (chart.score(begin, split, rule.left), chart.score(split, end, rule.right)) {
          if !self.reproduces(score, rule.score as i32 + l as i32 + r as i32) {
            continue;
          }
          let children = self
            .derive(sentence, chart, begin, split, rule.left, &mut Vec::new())
            .and_then(|left| Ok((left, self.derive(sentence, chart, split, end, rule.right, &mut Vec::new())?)));
          match children {
            Ok((left, right)) => return Ok(SynTree::Branch(node, vec![left, right])),
            Err(e) => failure = Some(e),
          }
        }
      }
    }

    for rule in self.grammar.unary.rules_by_parent(state) {
      if rule.child == state || chain.contains(&rule.child) {
        continue;
      }
      if let Some(child) = chart.score(begin, end, rule.child) {
        if !self.reproduces(score, rule.score as i32 + child as i32) {
          continue;
        }
        chain.push(state);
        let child = self.derive(sentence, chart, begin, end, rule.child, chain);
        chain.pop();
        match child {
          Ok(child) => return Ok(SynTree::Branch(node, vec![child])),
          Err(e) => failure = Some(e),
        }
      }
    }

    Err(failure.unwrap_or(Error::Inconsistent {
      state,
      begin,
      end,
      score,
    }))
  }

  /// Removes synthetic states, promoting their children.
  pub fn debinarize(&self, tree: ParseTree) -> ParseTree {
    let states = &self.grammar.states;
    tree.splice(&|node: &ChartNode| states.is_synthetic(node.state))
  }
}
