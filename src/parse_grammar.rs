//! Line-oriented reading of grammar files.
//!
//! Two rule forms share a file, one rule per line:
//!
//! ```text
//! NP -> (D) Adj+ N        // syntactic rule
//! N : {dog, cat, mouse}   // lexical rule
//! ```
//!
//! Surface sugar expands here, so the parser only ever sees plain
//! alternatives: `(X)` generates the variants with and without `X`,
//! `X+` generates 1 to [`REPEAT_BOUND`] copies in place, and a
//! top-level `|` splits the rule into independent alternatives.

use regex::Regex;
use thiserror::Error;

use crate::rules::{Lexicon, Production, Rule};

/// Cap on how many copies `X+` expands to.
pub const REPEAT_BOUND: usize = 6;

/// Structural faults in the grammar text. Each variant carries the
/// offending line; reading aborts at the first fault.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GrammarError {
  #[error("expected a syntactic (`->`) or lexical (`:`) rule: {0:?}")]
  UnknownRuleForm(String),
  #[error("more than one `->` in rule: {0:?}")]
  DuplicateArrow(String),
  #[error("more than one `:` in rule: {0:?}")]
  DuplicateColon(String),
  #[error("empty right-hand side in rule: {0:?}")]
  EmptyRhs(String),
  #[error("bad symbol {symbol:?} in rule: {line:?}")]
  BadSymbol { symbol: String, line: String },
}

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Category names are letters, digits and dots; a right-hand symbol may
/// additionally be wrapped `(X)` or suffixed `X+`.
fn is_valid_rhs_symbol(s: &str) -> bool {
  regex_static!(RHS_SYMBOL, r"^(\([A-Za-z0-9.]+\)|[A-Za-z0-9.]+\+?)$");
  RHS_SYMBOL.is_match(s)
}

fn is_valid_category(s: &str) -> bool {
  regex_static!(CATEGORY, r"^[A-Za-z0-9.]+$");
  CATEGORY.is_match(s)
}

/// Parses a grammar text into syntactic rules and a lexicon. Blank
/// lines and `//` comments are skipped; every other line must be a
/// syntactic or a lexical rule.
pub fn parse(src: &str) -> Result<(Vec<Rule>, Lexicon), GrammarError> {
  let mut rules = Vec::new();
  let mut lexicon = Lexicon::new();

  for line in src.lines() {
    let line = strip_comment(line).trim();
    if line.is_empty() {
      continue;
    }
    if line.contains("->") {
      read_syntactic(line, &mut rules)?;
    } else if line.contains(':') {
      read_lexical(line, &mut lexicon)?;
    } else {
      return Err(GrammarError::UnknownRuleForm(line.to_string()));
    }
  }

  Ok((rules, lexicon))
}

fn strip_comment(line: &str) -> &str {
  match line.find("//") {
    Some(idx) => &line[..idx],
    None => line,
  }
}

fn read_syntactic(line: &str, rules: &mut Vec<Rule>) -> Result<(), GrammarError> {
  let mut halves = line.split("->");
  let lhs = halves.next().unwrap_or_default().trim();
  let rhs = halves.next().unwrap_or_default().trim();
  if halves.next().is_some() {
    return Err(GrammarError::DuplicateArrow(line.to_string()));
  }
  if !is_valid_category(lhs) {
    return Err(GrammarError::BadSymbol {
      symbol: lhs.to_string(),
      line: line.to_string(),
    });
  }

  for alternative in rhs.split('|') {
    let symbols: Vec<&str> = alternative.split_whitespace().collect();
    if symbols.is_empty() {
      return Err(GrammarError::EmptyRhs(line.to_string()));
    }
    for s in symbols.iter() {
      if !is_valid_rhs_symbol(s) {
        return Err(GrammarError::BadSymbol {
          symbol: s.to_string(),
          line: line.to_string(),
        });
      }
    }

    // sugar expands repeats first, then the optional inclusion lattice
    for repeated in expand_repeats(&symbols) {
      let repeated: Vec<&str> = repeated.iter().map(String::as_str).collect();
      for expansion in expand_optionals(&repeated) {
        let productions = expansion.into_iter().map(Production::Nonterminal).collect();
        rules.push(Rule::new(lhs, productions));
      }
    }
  }

  Ok(())
}

fn read_lexical(line: &str, lexicon: &mut Lexicon) -> Result<(), GrammarError> {
  let mut halves = line.split(':');
  let category = halves.next().unwrap_or_default().trim();
  let words = halves.next().unwrap_or_default().trim();
  if halves.next().is_some() {
    return Err(GrammarError::DuplicateColon(line.to_string()));
  }
  if !is_valid_category(category) {
    return Err(GrammarError::BadSymbol {
      symbol: category.to_string(),
      line: line.to_string(),
    });
  }

  // the plain and the braced form both reduce to a word list
  let mut seen_word = false;
  for chunk in words.split(['{', ',', '}']) {
    for word in chunk.split_whitespace() {
      lexicon.add(word, category);
      seen_word = true;
    }
  }
  if !seen_word {
    return Err(GrammarError::EmptyRhs(line.to_string()));
  }

  Ok(())
}

/// Replaces each symbol with every one of its expansions, folding the
/// partial alternatives left to right so each symbol's choices multiply
/// out in place.
fn cross_expand(symbols: &[&str], choices_for: impl Fn(&str) -> Vec<Vec<String>>) -> Vec<Vec<String>> {
  let mut alternatives: Vec<Vec<String>> = vec![Vec::new()];
  for &symbol in symbols {
    let choices = choices_for(symbol);
    alternatives = alternatives
      .into_iter()
      .flat_map(|prefix| {
        choices.iter().map(move |choice| {
          let mut seq = prefix.clone();
          seq.extend(choice.iter().cloned());
          seq
        })
      })
      .collect();
  }
  alternatives
}

/// Expands every `X+` in `symbols` into 1 to [`REPEAT_BOUND`] copies of
/// `X` in place. Several repeated symbols multiply out.
pub fn expand_repeats(symbols: &[&str]) -> Vec<Vec<String>> {
  cross_expand(symbols, |s| match s.strip_suffix('+') {
    Some(base) => (1..=REPEAT_BOUND)
      .map(|n| vec![base.to_string(); n])
      .collect(),
    None => vec![vec![s.to_string()]],
  })
}

/// Expands every `(X)` in `symbols` into the variants with and without
/// it: the full cartesian product over inclusion choices. Dropping every
/// optional at once can leave an empty alternative, which makes the
/// left-hand symbol nullable.
pub fn expand_optionals(symbols: &[&str]) -> Vec<Vec<String>> {
  cross_expand(symbols, |s| {
    match s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
      Some(inner) => vec![Vec::new(), vec![inner.to_string()]],
      None => vec![vec![s.to_string()]],
    }
  })
}

#[cfg(test)]
fn seq(symbols: &[&str]) -> Vec<String> {
  symbols.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_read_simple_rules() {
  let (rules, lexicon) = parse("NP -> D N\nD : dog").unwrap();

  assert_eq!(rules.len(), 1);
  assert_eq!(rules[0].symbol, "NP");
  assert_eq!(
    rules[0].productions,
    vec![
      Production::Nonterminal("D".to_string()),
      Production::Nonterminal("N".to_string()),
    ]
  );
  assert_eq!(lexicon.tags_of("dog"), Some(&["D".to_string()][..]));
}

#[test]
fn test_read_braced_lexicon() {
  let (rules, lexicon) = parse("D : {dog, cat, mouse}").unwrap();

  assert!(rules.is_empty());
  assert_eq!(lexicon.len(), 3);
  for word in ["dog", "cat", "mouse"] {
    assert_eq!(lexicon.tags_of(word), Some(&["D".to_string()][..]));
  }
}

#[test]
fn test_alternation_splits_rules() {
  let (rules, _) = parse("VP -> V | V NP").unwrap();

  assert_eq!(rules.len(), 2);
  assert_eq!(rules[0].productions, vec![Production::Nonterminal("V".to_string())]);
  assert_eq!(rules[1].len(), 2);
}

#[test]
fn test_expand_optionals_covers_every_choice() {
  use std::collections::HashSet;

  let expanded: HashSet<Vec<String>> = expand_optionals(&["(D)", "(Adj)", "N"])
    .into_iter()
    .collect();
  let expected: HashSet<Vec<String>> = [
    seq(&["N"]),
    seq(&["D", "N"]),
    seq(&["Adj", "N"]),
    seq(&["D", "Adj", "N"]),
  ]
  .into_iter()
  .collect();

  assert_eq!(expanded, expected);
}

#[test]
fn test_expand_repeats_is_bounded() {
  let expanded = expand_repeats(&["A", "B+", "C"]);

  assert_eq!(expanded.len(), REPEAT_BOUND);
  for (i, alternative) in expanded.iter().enumerate() {
    let mut want = vec!["A".to_string()];
    want.extend(vec!["B".to_string(); i + 1]);
    want.push("C".to_string());
    assert_eq!(alternative, &want);
  }
}

#[test]
fn test_all_optional_rhs_keeps_empty_alternative() {
  let (rules, _) = parse("X -> (A) (B)").unwrap();

  assert_eq!(rules.len(), 4);
  assert!(rules.iter().any(|r| r.is_empty()));
}

#[test]
fn test_rejects_malformed_lines() {
  assert!(matches!(
    parse("NP D N"),
    Err(GrammarError::UnknownRuleForm(_))
  ));
  assert!(matches!(
    parse("NP -> D -> N"),
    Err(GrammarError::DuplicateArrow(_))
  ));
  assert!(matches!(
    parse("D : a : b"),
    Err(GrammarError::DuplicateColon(_))
  ));
  assert!(matches!(parse("NP ->"), Err(GrammarError::EmptyRhs(_))));
  assert!(matches!(parse("NP -> D |"), Err(GrammarError::EmptyRhs(_))));
  assert!(matches!(parse("N :"), Err(GrammarError::EmptyRhs(_))));
  assert!(matches!(
    parse("NP -> D? N"),
    Err(GrammarError::BadSymbol { .. })
  ));
}

#[test]
fn test_comments_and_blank_lines_are_skipped() {
  let (rules, lexicon) = parse(
    "
      // determiners
      D : {a, the}

      NP -> D N // a noun phrase
      N : dog
    ",
  )
  .unwrap();

  assert_eq!(rules.len(), 1);
  assert_eq!(lexicon.len(), 3);
}
