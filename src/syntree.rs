use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub struct Constituent<T> {
  pub value: T,
  pub span: (usize, usize),
}

impl<T> fmt::Display for Constituent<T>
where
  T: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Word<U> {
  pub value: U,
  pub span: (usize, usize),
}

impl<U> fmt::Display for Word<U>
where
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

/// A parse tree. Every node owns its children; pre-terminals are branches
/// over a single leaf.
#[derive(Debug, PartialEq, Clone)]
pub enum SynTree<T, U> {
  Branch(Constituent<T>, Vec<SynTree<T, U>>),
  Leaf(Word<U>),
}

impl<T, U> SynTree<T, U> {
  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(_))
  }

  pub fn get_leaf(&self) -> Option<&Word<U>> {
    match self {
      Self::Leaf(w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&Constituent<T>, &Vec<SynTree<T, U>>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  /// A branch whose only child is a leaf
  pub fn is_preterminal(&self) -> bool {
    match self {
      Self::Branch(_, children) => children.len() == 1 && children[0].is_leaf(),
      _ => false,
    }
  }

  pub fn span(&self) -> (usize, usize) {
    match self {
      Self::Branch(c, _) => c.span,
      Self::Leaf(w) => w.span,
    }
  }

  pub fn map<V, W, FB, FL>(&self, map_branch: &FB, map_leaf: &FL) -> SynTree<V, W>
  where
    FB: Fn(&Constituent<T>) -> V,
    FL: Fn(&Word<U>) -> W,
  {
    match self {
      Self::Branch(t, children) => {
        let children = children
          .iter()
          .map(|c| c.map(map_branch, map_leaf))
          .collect::<Vec<_>>();
        SynTree::Branch(
          Constituent {
            span: t.span,
            value: map_branch(t),
          },
          children,
        )
      }
      Self::Leaf(u) => SynTree::Leaf(Word {
        span: u.span,
        value: map_leaf(u),
      }),
    }
  }

  /// Replaces every branch below the root for which `remove` holds with its
  /// own children, in order. Works bottom-up, so runs of removable branches
  /// collapse completely. Leaves and the root are never removed.
  pub fn splice<F>(self, remove: &F) -> Self
  where
    F: Fn(&T) -> bool,
  {
    match self {
      Self::Branch(cons, children) => {
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
          match child.splice(remove) {
            Self::Branch(c, grandchildren) if remove(&c.value) => kept.extend(grandchildren),
            other => kept.push(other),
          }
        }
        Self::Branch(cons, kept)
      }
      leaf => leaf,
    }
  }

  /// Branch values in pre-order
  pub fn branch_values(&self) -> Vec<&T> {
    let mut out = Vec::new();
    self.collect_branch_values(&mut out);
    out
  }

  fn collect_branch_values<'a>(&'a self, out: &mut Vec<&'a T>) {
    if let Self::Branch(c, children) = self {
      out.push(&c.value);
      for child in children {
        child.collect_branch_values(out);
      }
    }
  }
}

impl<T, U> fmt::Display for SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(t) => write!(f, "{}", t),
      Self::Branch(t, ts) => {
        write!(f, "({}", t)?;
        if ts.len() == 1 {
          write!(f, " ({}))", ts[0])
        } else {
          for t in ts.iter() {
            for line in t.to_string().lines() {
              write!(f, "\n  {}", line)?;
            }
          }
          write!(f, ")")
        }
      }
    }
  }
}
