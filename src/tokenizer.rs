//! Splitting raw text into the Penn Treebank style tokens the lexicon was trained on.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::parse_grammar::{lines, read_table, regex_static};

/// Anything that can turn a raw sentence into tokens for the parser.
pub trait Tokenize {
  fn tokenize(&self, input: &str) -> Vec<String>;
}

/// Input that is already tokenized, space separated
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenize for WhitespaceTokenizer {
  fn tokenize(&self, input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
  }
}

/// Spelling rewrite applied to whole tokens
#[derive(Debug)]
struct Rewrite {
  find: Regex,
  replace: &'static str,
  unless: Option<Regex>,
}

impl Rewrite {
  fn new(find: &str, replace: &'static str, unless: Option<&str>) -> Self {
    Self {
      find: Regex::new(find).unwrap(),
      replace,
      unless: unless.map(|u| Regex::new(u).unwrap()),
    }
  }

  fn apply(&self, word: &str) -> Option<String> {
    if self.unless.as_ref().is_some_and(|u| u.is_match(word)) {
      return None;
    }
    let caps = self.find.captures(word)?;
    let mut out = String::new();
    caps.expand(self.replace, &mut out);
    Some(out)
  }
}

fn builtin_rewrites() -> Vec<Rewrite> {
  vec![
    Rewrite::new(r"^(.*)haem(at)?o(.*)$", "${1}hem${2}o${3}", None),
    Rewrite::new(r"^(.*)aemia$", "${1}emia", None),
    Rewrite::new(r"^(.*)([lL]euk)aem(.*)$", "${1}${2}em${3}", None),
    Rewrite::new(r"^(.*)programme(s?)$", "${1}program${2}", None),
    Rewrite::new(r"^([a-z]{3,})our(s?)$", "${1}or${2}", Some(r"^(?:glamour|de[tv]our)$")),
  ]
}

/// Abbreviations that keep their trailing period
const ABBREVIATIONS: &[&str] = &[
  "Inc", "Corp", "Co", "Ltd", "Bros", "Mr", "Mrs", "Ms", "Dr", "Prof", "Jr", "Sr", "St", "Mt", "Gen", "Gov", "Sen",
  "Rep", "Rev", "Sgt", "Capt", "Col", "Lt", "vs", "etc", "Jan", "Feb", "Mar", "Apr", "Jun", "Jul", "Aug", "Sep",
  "Sept", "Oct", "Nov", "Dec", "No", "Ave", "Blvd",
];

/// Clitics split off the word they follow, PTB style
const CLITICS: &[&str] = &["n't", "'s", "'re", "'ll", "'ve", "'d", "'m"];

/// Splits a case-insensitive `suffix` off a longer `word`
fn split_suffix<'w>(word: &'w str, suffix: &str) -> Option<(&'w str, &'w str)> {
  let at = word.len().checked_sub(suffix.len())?;
  if at == 0 || !word.is_char_boundary(at) {
    return None;
  }
  let (stem, tail) = word.split_at(at);
  tail.eq_ignore_ascii_case(suffix).then_some((stem, tail))
}

/// `U.S`, `J`
fn is_initials(stem: &str) -> bool {
  stem
    .split('.')
    .all(|part| part.chars().count() == 1 && part.chars().all(char::is_alphabetic))
}

/// The default tokenizer: punctuation normalization, PTB escapes and
/// americanized spelling.
#[derive(Debug)]
pub struct Tokenizer {
  literals: HashMap<String, String>,
  rewrites: Vec<Rewrite>,
}

impl Default for Tokenizer {
  fn default() -> Self {
    Self {
      literals: HashMap::new(),
      rewrites: builtin_rewrites(),
    }
  }
}

impl Tokenizer {
  /// Loads the literal `british american` spelling table
  pub fn read_from_file(path: &Path) -> Result<Self> {
    read_table(path)?.parse::<Self>().map_err(|e| match e {
      Error::Malformed { line, message, .. } => Error::malformed(&path.display().to_string(), line, message),
      e => e,
    })
  }

  pub fn literals(&self) -> usize {
    self.literals.len()
  }

  /// colour => color
  pub fn americanize(&self, word: &str) -> String {
    if let Some(american) = self.literals.get(word) {
      return american.clone();
    }
    self
      .rewrites
      .iter()
      .find_map(|r| r.apply(word))
      .unwrap_or_else(|| word.to_string())
  }

  /// Smooths over windows codepage and typographic characters, and the few
  /// html entities that show up in scraped text.
  fn normalize(input: &str) -> String {
    regex_static!(AMP, r"(?i)&amp;");
    const REPLACEMENTS: &[(&str, &str)] = &[
      ("&apos;", "'"),
      ("&quot;", "\""),
      ("&mdash;", "--"),
      ("&ndash;", "--"),
      ("\u{91}", "`"),
      ("\u{2018}", "`"),
      ("\u{92}", "'"),
      ("\u{2019}", "'"),
      ("\u{93}", "``"),
      ("\u{201c}", "``"),
      ("\u{94}", "''"),
      ("\u{201d}", "''"),
      ("\u{96}", "--"),
      ("\u{97}", "--"),
      ("\u{2013}", "--"),
      ("\u{2014}", "--"),
      ("\u{bc}", "1\\/4"),
      ("\u{bd}", "1\\/2"),
      ("\u{be}", "3\\/4"),
      ("\u{a2}", "cents"),
      ("\u{a3}", "#"),
      ("\u{80}", "$"),
      ("\u{20ac}", "$"),
    ];

    let mut out = AMP.replace_all(input, "&").into_owned();
    for &(from, to) in REPLACEMENTS {
      if out.contains(from) {
        out = out.replace(from, to);
      }
    }
    out
  }

  fn push_word(&self, word: &str, out: &mut Vec<String>) {
    // trailing period: keep it on abbreviations and initials, split it otherwise
    if let Some(stem) = word.strip_suffix('.') {
      if is_initials(stem) || ABBREVIATIONS.contains(&stem) {
        out.push(word.to_string());
      } else {
        self.push_word(stem, out);
        out.push(".".to_string());
      }
      return;
    }

    if let Some((stem, clitic)) = CLITICS.iter().find_map(|c| split_suffix(word, c)) {
      out.push(self.americanize(stem));
      out.push(clitic.to_string());
      return;
    }

    out.push(self.americanize(word));
  }
}

impl Tokenize for Tokenizer {
  fn tokenize(&self, input: &str) -> Vec<String> {
    regex_static!(
      TOKEN,
      r#"<[^<>\s]+>|\w+(?:[.'&\-]\w+)*\.?|``|''|--+|\.\.\.|\\?[/*]|\S"#
    );

    let normalized = Self::normalize(input);
    let mut out = Vec::new();
    let mut open_quote = true;
    for m in TOKEN.find_iter(&normalized) {
      let token = m.as_str();
      match token {
        "(" => out.push("-LRB-".to_string()),
        ")" => out.push("-RRB-".to_string()),
        "[" => out.push("-LSB-".to_string()),
        "]" => out.push("-RSB-".to_string()),
        "{" => out.push("-LCB-".to_string()),
        "}" => out.push("-RCB-".to_string()),
        "\"" => {
          out.push(if open_quote { "``" } else { "''" }.to_string());
          open_quote = !open_quote;
        }
        "/" | "\\/" => out.push("\\/".to_string()),
        "*" | "\\*" => out.push("\\*".to_string()),
        t if t.starts_with("--") => out.push("--".to_string()),
        t if t.starts_with(|c: char| c.is_alphanumeric() || c == '_') => self.push_word(t, &mut out),
        t => out.push(t.to_string()),
      }
    }
    out
  }
}

impl FromStr for Tokenizer {
  type Err = Error;

  /// Parses the `americanizations` table: whitespace separated `british american` pairs
  fn from_str(src: &str) -> Result<Self> {
    let mut words = Vec::new();
    for (line_no, line) in lines(src) {
      words.extend(line.split_whitespace().map(|w| (line_no, w)));
    }
    if words.len() % 2 != 0 {
      let (line_no, word) = words[words.len() - 1];
      return Err(Error::malformed(
        "americanizations",
        line_no,
        format!("{:?} has no american spelling", word),
      ));
    }

    let literals = words
      .chunks(2)
      .map(|pair| (pair[0].1.to_string(), pair[1].1.to_string()))
      .collect::<HashMap<_, _>>();
    tracing::debug!("{} americanizations", literals.len());

    Ok(Self {
      literals,
      ..Self::default()
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn toy() -> Tokenizer {
    include_str!("../testdata/toy/americanizations").parse().unwrap()
  }

  #[test]
  fn test_nothing() {
    assert!(toy().tokenize("").is_empty());
    assert!(toy().tokenize("  \t ").is_empty());
  }

  #[test]
  fn test_sgml() {
    assert_eq!(toy().tokenize("<blah>"), vec!["<blah>"]);
  }

  #[test]
  fn test_dashes() {
    for input in ["&mdash;", "\u{96}", "\u{2013}", "--"] {
      assert_eq!(toy().tokenize(input), vec!["--"], "{:?}", input);
    }
  }

  #[test]
  fn test_ampersand() {
    assert_eq!(toy().tokenize("hey &Amp; dude"), vec!["hey", "&", "dude"]);
    assert_eq!(toy().tokenize("b&b"), vec!["b&b"]);
    assert_eq!(toy().tokenize("b&Amp;b"), vec!["b&b"]);
  }

  #[test]
  fn test_contractions() {
    assert_eq!(toy().tokenize("I CAN'T GET NO"), vec!["I", "CA", "N'T", "GET", "NO"]);
    assert_eq!(toy().tokenize("the dog's bone"), vec!["the", "dog", "'s", "bone"]);
  }

  #[test]
  fn test_americanize() {
    let words = toy().tokenize("haematologists devour the colour superleukaemia.");
    assert_eq!(
      words,
      vec!["hematologists", "devour", "the", "color", "superleukemia", "."]
    );
    let t = toy();
    assert_eq!(t.americanize("favourite"), "favorite");
    assert_eq!(t.americanize("programmes"), "programs");
    assert_eq!(t.americanize("harbours"), "harbors");
    assert_eq!(t.americanize("glamour"), "glamour");
    assert_eq!(t.americanize("Leukaemic"), "Leukemic");
  }

  #[test]
  fn test_escapes_and_brackets() {
    assert_eq!(toy().tokenize("this / that"), vec!["this", "\\/", "that"]);
    assert_eq!(toy().tokenize("this \\/ that"), vec!["this", "\\/", "that"]);
    assert_eq!(toy().tokenize("(a [b] {c})"), vec!["-LRB-", "a", "-LSB-", "b", "-RSB-", "-LCB-", "c", "-RCB-", "-RRB-"]);
  }

  #[test]
  fn test_quotes() {
    assert_eq!(toy().tokenize("\"hi\" he said"), vec!["``", "hi", "''", "he", "said"]);
    assert_eq!(toy().tokenize("\u{201c}hi\u{201d}"), vec!["``", "hi", "''"]);
  }

  #[test]
  fn test_periods() {
    assert_eq!(
      toy().tokenize("Bob, Inc. bought a monkey."),
      vec!["Bob", ",", "Inc.", "bought", "a", "monkey", "."]
    );
    assert_eq!(toy().tokenize("the U.S. economy"), vec!["the", "U.S.", "economy"]);
    assert_eq!(
      toy().tokenize("priced at $9500.00."),
      vec!["priced", "at", "$", "9500.00", "."]
    );
  }

  #[test]
  fn test_reference_sentence() {
    let input = "Description This 2005 Nissan Altima available from Rama Auto Inc with Stock # 330051 is priced at $ 9500.00 .";
    assert_eq!(toy().tokenize(input), WhitespaceTokenizer.tokenize(input));
  }

  #[test]
  fn test_odd_table_is_malformed() {
    let err = "colour color\nfavourite\n".parse::<Tokenizer>().unwrap_err();
    assert!(matches!(err, Error::Malformed { line: 2, .. }));
  }
}
