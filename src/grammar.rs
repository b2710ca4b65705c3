use std::collections::HashSet;
use std::fmt;

use crate::config::DataFiles;
use crate::error::{Error, Result};
use crate::parse_grammar::{fields, lines, parse_field, read_table};
use crate::rules::{BinaryRule, UnaryRule};
use crate::states::{StateId, StateRegistry};

fn parse_state(states: &StateRegistry, field: &str, source_name: &str, line_no: usize) -> Result<StateId> {
  let state = StateId(parse_field(field, source_name, line_no, "state")?);
  if !states.contains(state) {
    return Err(Error::malformed(source_name, line_no, format!("unknown state {}", state)));
  }
  Ok(state)
}

/// Unary rules indexed by parent, plus their transitive closure.
///
/// The closure is built incrementally while rules are read: each new rule
/// `c -> p` is composed with every already-closed rule into `c` and every
/// already-closed rule out of `p`, once. A `(child, parent)` pair keeps the
/// score of whichever path reached it first, not the best one, and nothing is
/// ever revisited. The trained scores assume exactly this closure.
#[derive(Debug, Clone, Default)]
pub struct UnaryGrammar {
  by_parent: Vec<Vec<UnaryRule>>,
  /// direct and composed rules, sorted by (child, parent)
  closed: Vec<UnaryRule>,
}

impl UnaryGrammar {
  pub fn parse(states: &StateRegistry, src: &str, source_name: &str) -> Result<Self> {
    let rules = lines(src)
      .map(|(line_no, line)| {
        let [child, parent, weight] = fields::<3>(line, source_name, line_no)?;
        Ok(UnaryRule::new(
          parse_state(states, child, source_name, line_no)?,
          parse_state(states, parent, source_name, line_no)?,
          parse_field(weight, source_name, line_no, "weight")?,
        ))
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(Self::new(states.len(), rules))
  }

  pub fn new<I>(state_count: usize, rules: I) -> Self
  where
    I: IntoIterator<Item = UnaryRule>,
  {
    let identity = |idx: usize| UnaryRule {
      child: StateId::from(idx),
      parent: StateId::from(idx),
      score: 0,
    };

    let mut by_parent = vec![Vec::new(); state_count];
    // closed rules leaving / entering each state, identity rule first
    let mut upward: Vec<Vec<UnaryRule>> = (0..state_count).map(|i| vec![identity(i)]).collect();
    let mut downward: Vec<Vec<UnaryRule>> = (0..state_count).map(|i| vec![identity(i)]).collect();
    let mut closed_pairs: HashSet<(StateId, StateId)> =
      (0..state_count).map(|i| (StateId::from(i), StateId::from(i))).collect();

    for rule in rules {
      upward[rule.child.index()].push(rule);
      downward[rule.parent.index()].push(rule);
      by_parent[rule.parent.index()].push(rule);
      closed_pairs.insert(rule.key());

      // [everything above rule.parent] <- rule <- [everything below rule.child]
      let above_count = upward[rule.parent.index()].len();
      for i in 0..above_count {
        let above = upward[rule.parent.index()][i];
        let below_count = downward[rule.child.index()].len();
        for j in 0..below_count {
          let below = downward[rule.child.index()][j];
          if closed_pairs.insert((below.child, above.parent)) {
            let composed = UnaryRule {
              child: below.child,
              parent: above.parent,
              score: above.score.saturating_add(rule.score).saturating_add(below.score),
            };
            upward[composed.child.index()].push(composed);
            downward[composed.parent.index()].push(composed);
          }
        }
      }
    }

    let mut closed = Vec::with_capacity(upward.iter().map(|rules| rules.len() - 1).sum());
    for mut rules in upward {
      rules.remove(0);
      rules.sort_by_key(UnaryRule::key);
      closed.extend(rules);
    }

    tracing::debug!(
      "unary grammar: {} rules, {} after closure",
      by_parent.iter().map(Vec::len).sum::<usize>(),
      closed.len()
    );

    Self { by_parent, closed }
  }

  /// Direct (unclosed) rules producing `parent`
  pub fn rules_by_parent(&self, parent: StateId) -> &[UnaryRule] {
    self.by_parent.get(parent.index()).map_or(&[], Vec::as_slice)
  }

  /// The full closure, sorted by child then parent
  pub fn closed_rules(&self) -> &[UnaryRule] {
    &self.closed
  }

  pub fn len(&self) -> usize {
    self.by_parent.iter().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Binary rules indexed by left child (for filling the chart) and by parent
/// (for backtrace). Boundary rules are kept apart.
#[derive(Debug, Clone, Default)]
pub struct BinaryGrammar {
  /// left => rules, sorted by right child
  by_left: Vec<Vec<BinaryRule>>,
  /// parent => rules, sorted by left child
  by_parent: Vec<Vec<BinaryRule>>,
  boundary: Vec<BinaryRule>,
}

impl BinaryGrammar {
  pub fn parse(states: &StateRegistry, src: &str, source_name: &str) -> Result<Self> {
    let rules = lines(src)
      .map(|(line_no, line)| {
        let [left, right, parent, weight] = fields::<4>(line, source_name, line_no)?;
        Ok(BinaryRule::new(
          parse_state(states, left, source_name, line_no)?,
          parse_state(states, right, source_name, line_no)?,
          parse_state(states, parent, source_name, line_no)?,
          parse_field(weight, source_name, line_no, "weight")?,
        ))
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(Self::new(states, rules))
  }

  pub fn new(states: &StateRegistry, rules: Vec<BinaryRule>) -> Self {
    // size every bucket up front, the rule lists are the hottest data in the parser
    let mut left_sizes = vec![0; states.len()];
    let mut parent_sizes = vec![0; states.len()];
    let mut boundary_size = 0;
    for rule in rules.iter() {
      if rule.is_boundary(states) {
        boundary_size += 1;
      } else {
        left_sizes[rule.left.index()] += 1;
        parent_sizes[rule.parent.index()] += 1;
      }
    }

    let mut by_left: Vec<Vec<BinaryRule>> = left_sizes.into_iter().map(Vec::with_capacity).collect();
    let mut by_parent: Vec<Vec<BinaryRule>> = parent_sizes.into_iter().map(Vec::with_capacity).collect();
    let mut boundary = Vec::with_capacity(boundary_size);
    for rule in rules {
      if rule.is_boundary(states) {
        boundary.push(rule);
      } else {
        by_left[rule.left.index()].push(rule);
        by_parent[rule.parent.index()].push(rule);
      }
    }

    for bucket in by_left.iter_mut() {
      bucket.sort_by_key(|r| r.right);
    }
    for bucket in by_parent.iter_mut() {
      bucket.sort_by_key(|r| r.left);
    }

    tracing::debug!(
      "binary grammar: {} rules, {} boundary rules",
      by_left.iter().map(Vec::len).sum::<usize>(),
      boundary.len()
    );

    Self {
      by_left,
      by_parent,
      boundary,
    }
  }

  pub fn rules_by_left(&self, left: StateId) -> &[BinaryRule] {
    self.by_left.get(left.index()).map_or(&[], Vec::as_slice)
  }

  pub fn rules_by_parent(&self, parent: StateId) -> &[BinaryRule] {
    self.by_parent.get(parent.index()).map_or(&[], Vec::as_slice)
  }

  pub fn boundary_rules(&self) -> &[BinaryRule] {
    &self.boundary
  }

  pub fn len(&self) -> usize {
    self.by_left.iter().map(Vec::len).sum::<usize>() + self.boundary.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Raw text of the three grammar tables
#[derive(Debug, Clone, Copy)]
pub struct GrammarTables<'a> {
  pub states: &'a str,
  pub unary_rules: &'a str,
  pub binary_rules: &'a str,
}

/// The read-only half of the parser: states and both rule indexes.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
  pub states: StateRegistry,
  pub unary: UnaryGrammar,
  pub binary: BinaryGrammar,
}

impl Grammar {
  pub fn read_from_files(files: &DataFiles) -> Result<Self> {
    let states = StateRegistry::read_from_file(&files.states())?;
    let unary_path = files.unary_rules();
    let unary = UnaryGrammar::parse(&states, &read_table(&unary_path)?, &unary_path.display().to_string())?;
    let binary_path = files.binary_rules();
    let binary = BinaryGrammar::parse(&states, &read_table(&binary_path)?, &binary_path.display().to_string())?;
    Ok(Self { states, unary, binary })
  }

  pub fn parse(tables: GrammarTables<'_>) -> Result<Self> {
    let states = StateRegistry::parse(tables.states, "states")?;
    let unary = UnaryGrammar::parse(&states, tables.unary_rules, "unary_rules")?;
    let binary = BinaryGrammar::parse(&states, tables.binary_rules, "binary_rules")?;
    Ok(Self { states, unary, binary })
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** states: {}", self.states.len())?;
    writeln!(f, "//** unary rules: {} ({} closed)", self.unary.len(), self.unary.closed_rules().len())?;
    writeln!(f, "//** binary rules: {}", self.binary.len())?;

    for rule in self.unary.closed_rules() {
      writeln!(f, "{}", rule.display(&self.states))?;
    }
    for rule in self.binary.by_left.iter().flatten() {
      writeln!(f, "{}", rule.display(&self.states))?;
    }
    for rule in self.binary.boundary_rules() {
      writeln!(f, "{}", rule.display(&self.states))?;
    }

    Ok(())
  }
}
