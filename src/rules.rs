use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use crate::Err;
use crate::parse_grammar::{GrammarError, parse};

#[derive(Debug, Clone, PartialEq)]
pub enum Production {
  /// A surface word. Never appears in a grammar rule; the scanner builds
  /// lexical rules with a terminal right-hand side on the fly.
  Terminal(String),
  /// A phrasal or pre-terminal category.
  Nonterminal(String),
}

impl Production {
  pub fn symbol_str(&self) -> &str {
    match self {
      Self::Terminal(s) => s,
      Self::Nonterminal(s) => s,
    }
  }

  pub fn is_nonterminal(&self) -> bool {
    match self {
      Self::Nonterminal(_) => true,
      _ => false,
    }
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Terminal(s) => write!(f, "{}", s),
      Self::Nonterminal(s) => write!(f, "{}", s),
    }
  }
}

/// One alternative of a category: a single right-hand side. A category
/// with several alternatives is stored as several rules under the same
/// symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
  pub symbol: String,
  pub productions: Vec<Production>,
}

impl Rule {
  pub fn new(symbol: impl Into<String>, productions: Vec<Production>) -> Self {
    Self {
      symbol: symbol.into(),
      productions,
    }
  }

  /// The rule the scanner materializes when it tags `word` as `category`.
  pub fn lexical(category: &str, word: &str) -> Self {
    Self::new(category, vec![Production::Terminal(word.to_string())])
  }

  pub fn len(&self) -> usize {
    self.productions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn symbol_str(&self) -> &str {
    &self.symbol
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.symbol)?;
    for p in self.productions.iter() {
      write!(f, " {}", p)?;
    }
    Ok(())
  }
}

/// Word to pre-terminal tags. A word with several tags is ambiguous
/// between categories ("dog" as N or V).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexicon {
  entries: HashMap<String, Vec<String>>,
}

impl Lexicon {
  pub fn new() -> Self {
    Self::default()
  }

  /// Tags `word` with `category`; repeated tags are kept once, in
  /// insertion order.
  pub fn add(&mut self, word: &str, category: &str) {
    let tags = self.entries.entry(word.to_string()).or_default();
    if !tags.iter().any(|t| t == category) {
      tags.push(category.to_string());
    }
  }

  pub fn tags_of(&self, word: &str) -> Option<&[String]> {
    self.entries.get(word).map(Vec::as_slice)
  }

  pub fn has_tag(&self, word: &str, category: &str) -> bool {
    self
      .entries
      .get(word)
      .is_some_and(|tags| tags.iter().any(|t| t == category))
  }

  pub fn contains_word(&self, word: &str) -> bool {
    self.entries.contains_key(word)
  }

  /// The union of all tags: every category that can be produced directly
  /// from a word.
  pub fn parts_of_speech(&self) -> HashSet<String> {
    self.entries.values().flatten().cloned().collect()
  }

  pub fn words(&self) -> impl Iterator<Item = &String> {
    self.entries.keys()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl fmt::Display for Lexicon {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut by_category: HashMap<&str, Vec<&str>> = HashMap::new();
    for (word, tags) in self.entries.iter() {
      for tag in tags.iter() {
        by_category.entry(tag.as_str()).or_default().push(word.as_str());
      }
    }
    for (category, words) in by_category.iter() {
      writeln!(f, "{} : {{{}}}", category, words.join(", "))?;
    }
    Ok(())
  }
}

#[derive(Debug)]
pub struct Grammar {
  pub start: String,
  pub rules: HashMap<String, Vec<Rc<Rule>>>,
  pub lexicon: Lexicon,
  nullables: HashSet<String>,
  nonterminals: HashSet<String>,
  parts_of_speech: HashSet<String>,
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** start: {}", self.start)?;
    write!(f, "//** nonterminals:")?;
    for nt in self.nonterminals.iter() {
      write!(f, " {}", nt)?;
    }
    writeln!(f)?;

    write!(f, "//** parts of speech:")?;
    for pos in self.parts_of_speech.iter() {
      write!(f, " {}", pos)?;
    }
    writeln!(f)?;

    write!(f, "//** nullables:")?;
    for nt in self.nullables.iter() {
      write!(f, " {}", nt)?;
    }
    writeln!(f)?;

    for rule in self.rules.values().flatten() {
      writeln!(f, "{}", rule)?;
    }
    write!(f, "{}", self.lexicon)?;

    Ok(())
  }
}

impl Grammar {
  pub const DEFAULT_START: &'static str = "S";

  pub fn new(rules: Vec<Rule>, lexicon: Lexicon, start: impl Into<String>) -> Self {
    let nonterminals: HashSet<String> = rules.iter().map(|r| r.symbol.clone()).collect();

    let rules: HashMap<String, Vec<Rc<Rule>>> =
      rules.into_iter().fold(HashMap::new(), |mut map, rule| {
        map
          .entry(rule.symbol.clone())
          .or_insert_with(Vec::new)
          .push(Rc::new(rule));
        map
      });

    let nullables = Self::find_nullables(&rules);
    let parts_of_speech = lexicon.parts_of_speech();

    Self {
      start: start.into(),
      rules,
      lexicon,
      nullables,
      nonterminals,
      parts_of_speech,
    }
  }

  pub fn with_start(mut self, start: impl Into<String>) -> Self {
    self.start = start.into();
    self
  }

  /// Reads a grammar from a file. The start symbol is `S` when defined,
  /// else the first rule's symbol.
  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, Err> {
    let src = fs::read_to_string(path)?;
    let g: Grammar = src.parse()?;
    Ok(g)
  }

  /// Every alternative of `symbol`; empty when the grammar has none.
  pub fn alternatives(&self, symbol: &str) -> &[Rc<Rule>] {
    self.rules.get(symbol).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn is_nullable(&self, s: &str) -> bool {
    self.nullables.contains(s)
  }

  pub fn is_part_of_speech(&self, s: &str) -> bool {
    self.parts_of_speech.contains(s)
  }

  /// True iff every symbol mentioned on a right-hand side is defined:
  /// either it heads rules of its own, or some word carries it as a tag.
  /// Advisory; an unverified grammar still parses, it just cannot
  /// recognize anything through the undefined symbol.
  pub fn verify_productions(&self) -> bool {
    self.rules.values().flatten().all(|rule| {
      rule.productions.iter().all(|p| match p {
        Production::Nonterminal(s) => self.rules.contains_key(s) || self.parts_of_speech.contains(s),
        Production::Terminal(_) => true,
      })
    })
  }

  /// True iff every token of `input` has a lexicon entry. Advisory.
  pub fn verify_lexicon(&self, input: &[&str]) -> bool {
    input.iter().all(|w| self.lexicon.contains_word(w))
  }
}

impl Grammar {
  fn rule_is_nullable(nullables: &HashSet<String>, rule: &Rule) -> bool {
    rule.is_empty()
      || rule.productions.iter().all(|p| match p {
        Production::Nonterminal(s) => nullables.contains(s),
        Production::Terminal(_) => false,
      })
  }

  fn find_nullables(rules: &HashMap<String, Vec<Rc<Rule>>>) -> HashSet<String> {
    let mut nullables: HashSet<String> = HashSet::new();

    let mut last_length = 1;
    while last_length != nullables.len() {
      last_length = nullables.len();
      for r in rules.values().flatten() {
        if !nullables.contains(&r.symbol) && Self::rule_is_nullable(&nullables, r) {
          nullables.insert(r.symbol.clone());
        }
      }
    }

    nullables
  }
}

impl FromStr for Grammar {
  type Err = GrammarError;

  /// Parses a grammar from a string. The start symbol is `S` when a rule
  /// defines it, otherwise the first rule's symbol. An empty grammar is
  /// legal and recognizes nothing.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (rules, lexicon) = parse(s)?;

    let start = if rules.iter().any(|r| r.symbol == Self::DEFAULT_START) {
      Self::DEFAULT_START.to_string()
    } else {
      rules
        .first()
        .map(|r| r.symbol.clone())
        .unwrap_or_else(|| Self::DEFAULT_START.to_string())
    };

    Ok(Self::new(rules, lexicon, start))
  }
}

#[test]
fn test_parse_grammar() {
  let g: Grammar = r#"
       S -> NP VP
       NP -> D N | N
       VP -> V | V NP

       D : the
       N : {dog, runs}
       V : {dog, runs}
     "#
  .parse()
  .unwrap();

  assert_eq!(g.start, "S");
  assert_eq!(g.rules.len(), 3);
  assert_eq!(g.rules.get("S").unwrap().len(), 1);
  assert_eq!(g.rules.get("NP").unwrap().len(), 2);
  assert_eq!(g.rules.get("VP").unwrap().len(), 2);
  assert!(g.rules.get("dog").is_none());
  assert!(g.rules.get("D").is_none());

  assert_eq!(g.lexicon.tags_of("the"), Some(&["D".to_string()][..]));
  assert_eq!(
    g.lexicon.tags_of("dog"),
    Some(&["N".to_string(), "V".to_string()][..])
  );

  assert!(g.is_part_of_speech("D"));
  assert!(g.is_part_of_speech("V"));
  assert!(!g.is_part_of_speech("NP"));

  let mut words: Vec<&str> = g.lexicon.words().map(String::as_str).collect();
  words.sort_unstable();
  assert_eq!(words, vec!["dog", "runs", "the"]);
}

#[test]
fn test_find_nullables() {
  let g: Grammar = r#"
      S -> X N
      X -> (A) (B)
      A : a
      B : b
      N : n
    "#
  .parse()
  .unwrap();

  assert!(g.is_nullable("X"));
  assert!(!g.is_nullable("S"));
  assert!(!g.is_nullable("A"));
}

#[test]
fn test_verify_productions() {
  // "D" heads no rules and tags no word
  let inconsistent: Grammar = "NP -> D N\nN : dog".parse().unwrap();
  assert!(!inconsistent.verify_productions());

  let consistent: Grammar = "NP -> D N\nD : the\nN : dog".parse().unwrap();
  assert!(consistent.verify_productions());
}

#[test]
fn test_verify_lexicon() {
  let g: Grammar = "NP -> D N\nD : the\nN : dog".parse().unwrap();
  assert!(g.verify_lexicon(&["the", "dog"]));
  assert!(!g.verify_lexicon(&["the", "cat"]));
  assert!(g.verify_lexicon(&[]));
}

#[test]
fn test_start_symbol_selection() {
  // S wins whenever it is defined, regardless of rule order
  let g: Grammar = "NP -> D N\nS -> NP\nD : the\nN : dog".parse().unwrap();
  assert_eq!(g.start, "S");

  // otherwise the first rule heads the grammar
  let g: Grammar = "NP -> D N\nD : the\nN : dog".parse().unwrap();
  assert_eq!(g.start, "NP");

  let g = g.with_start("D");
  assert_eq!(g.start, "D");
}
