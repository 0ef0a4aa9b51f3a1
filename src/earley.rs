use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::rules::{Grammar, Production, Rule};

/// Synthetic outermost category. The chart is seeded with `γ -> start`,
/// and a parse succeeds iff a completed `γ` state spans the whole input.
pub const GAMMA: &str = "γ";

/// A rule with a dot position: `pos` counts how many right-hand symbols
/// have been recognized, so `0 <= pos <= rule.len()` always holds and
/// the item is complete at `pos == rule.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct LR0 {
  pub rule: Rc<Rule>,
  pub pos: usize,
}

impl LR0 {
  pub fn new(rule: &Rc<Rule>) -> Self {
    Self {
      rule: rule.clone(),
      pos: 0,
    }
  }

  pub fn is_active(&self) -> bool {
    self.pos < self.rule.len()
  }

  pub fn advance(&self) -> Self {
    assert!(self.is_active(), "dot must stay within the right-hand side");
    Self {
      rule: self.rule.clone(),
      pos: self.pos + 1,
    }
  }

  pub fn next_production(&self) -> Option<&Production> {
    self.rule.productions.get(self.pos)
  }
}

impl fmt::Display for LR0 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} →", self.rule.symbol)?;
    for idx in 0..self.rule.len() {
      if idx == self.pos {
        write!(f, " ・")?;
      }
      write!(f, " {}", self.rule.productions[idx])?;
    }
    if !self.is_active() {
      write!(f, " ・")?;
    }
    Ok(())
  }
}

/// An item with its origin position and its backpointers. `num` is
/// assigned by the chart at first insertion, monotonically across all
/// columns; `parents` holds the numbers of the completed states that
/// advanced the dot to where it is, and is what tree reconstruction
/// follows.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
  pub num: usize,
  pub lr0: LR0,
  pub origin: usize,
  pub parents: BTreeSet<usize>,
}

impl State {
  pub fn new(lr0: LR0, origin: usize) -> Self {
    Self {
      num: 0,
      lr0,
      origin,
      parents: BTreeSet::new(),
    }
  }

  pub fn advance(&self) -> Self {
    Self {
      num: 0,
      lr0: self.lr0.advance(),
      origin: self.origin,
      parents: self.parents.clone(),
    }
  }

  /// Advances the dot over the constituent that `completed` finished,
  /// recording it as a backpointer.
  pub fn advanced_by(&self, completed: &State) -> Self {
    let mut next = self.advance();
    next.parents.insert(completed.num);
    next
  }

  /// Identity for chart deduplication; `num` and `parents` do not
  /// distinguish states.
  fn same_item(&self, other: &State) -> bool {
    self.lr0 == other.lr0 && self.origin == other.origin
  }
}

#[derive(Debug)]
pub struct Chart {
  columns: Vec<Vec<State>>,
  next_num: usize,
}

impl Chart {
  pub fn new(length: usize) -> Self {
    Self {
      columns: vec![Vec::new(); length],
      next_num: 1,
    }
  }

  pub fn len(&self) -> usize {
    self.columns.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn len_at(&self, k: usize) -> usize {
    self.columns[k].len()
  }

  /// Inserts `state` at column `k`, assigning its number. A duplicate
  /// of an existing item is not appended; its backpointers merge into
  /// the existing state instead.
  pub fn add(&mut self, k: usize, state: State) {
    if let Some(existing) = self.columns[k].iter_mut().find(|s| s.same_item(&state)) {
      existing.parents.extend(state.parents.iter().copied());
    } else {
      let mut state = state;
      state.num = self.next_num;
      self.next_num += 1;
      self.columns[k].push(state);
    }
  }

  /// True iff the final column holds a completed `γ` state reaching back
  /// to position 0.
  pub fn recognizes(&self) -> bool {
    match self.columns.last() {
      None => false,
      Some(column) => column
        .iter()
        .any(|s| s.lr0.rule.symbol == GAMMA && !s.lr0.is_active() && s.origin == 0),
    }
  }

  /// Get an owned state so that passing around &mut chart is more ergonomic.
  /// The clone is an rc, two usizes and a small set.
  fn get_state(&self, k: usize, idx: usize) -> State {
    self.columns[k][idx].clone()
  }
}

impl IntoIterator for Chart {
  type Item = (usize, Vec<State>);
  type IntoIter = std::iter::Enumerate<std::vec::IntoIter<Vec<State>>>;

  fn into_iter(self) -> Self::IntoIter {
    self.columns.into_iter().enumerate()
  }
}

impl fmt::Display for Chart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for k in 0..self.len() {
      writeln!(f, "Column {}:", k)?;
      for state in self.columns[k].iter() {
        write!(f, "  #{} {}..{}: {}", state.num, state.origin, k, state.lr0)?;
        if state.parents.is_empty() {
          writeln!(f)?;
        } else {
          writeln!(f, " (from {:?})", state.parents)?;
        }
      }
    }
    Ok(())
  }
}

/// Builds the full chart for `input`. The chart is returned whether or
/// not the parse succeeded; a failed parse simply has no spanning `γ`
/// completion for [`Chart::recognizes`] to find.
pub fn parse_chart(g: &Grammar, input: &[&str]) -> Chart {
  let mut chart = Chart::new(input.len() + 1);

  trace!(start = %g.start, len = input.len(), "seeding chart");
  let top = Rc::new(Rule::new(
    GAMMA,
    vec![Production::Nonterminal(g.start.clone())],
  ));
  chart.add(0, State::new(LR0::new(&top), 0));

  for k in 0..chart.len() {
    // need to use while loop because the number of states at k can expand during the loop
    let mut idx = 0;
    while idx < chart.len_at(k) {
      let state = chart.get_state(k, idx);
      idx += 1;

      match state.lr0.next_production() {
        None => completer(&mut chart, k, &state),
        Some(p) if g.is_part_of_speech(p.symbol_str()) => scanner(g, &mut chart, k, &state, input),
        Some(_) => predictor(g, &mut chart, k, &state),
      };
    }
  }

  chart
}

fn completer(chart: &mut Chart, k: usize, state: &State) {
  assert!(!state.lr0.is_active(), "tried to complete active state");

  trace!(symbol = %state.lr0.rule.symbol, origin = state.origin, at = k, "complete");

  // the constituent is finished, now advance the states that were
  // waiting for its symbol at its origin
  for idx in 0..chart.len_at(state.origin) {
    let waiting = chart.get_state(state.origin, idx);

    if let Some(np) = waiting.lr0.next_production() {
      if np.symbol_str() == state.lr0.rule.symbol_str() {
        // the advanced state ends where the completed constituent ends
        chart.add(k, waiting.advanced_by(state));
      }
    }
  }
}

fn predictor(g: &Grammar, chart: &mut Chart, k: usize, state: &State) {
  assert!(state.lr0.is_active(), "tried to predict non-active state");
  assert!(
    state.lr0.next_production().unwrap().is_nonterminal(),
    "tried to predict a terminal"
  );

  // hypothesize that one of the alternatives for the needed symbol will
  // succeed starting here
  let needed = state.lr0.next_production().unwrap().symbol_str();
  trace!(symbol = needed, at = k, "predict");

  for alternative in g.alternatives(needed) {
    chart.add(k, State::new(LR0::new(alternative), k));

    if g.is_nullable(needed) {
      // complete `state` early: the needed symbol may be produced by
      // empty input, whose completion lands in this same column and
      // would not rerun the completer for states predicted after it
      chart.add(k, state.advance());
    }
  }
}

fn scanner(g: &Grammar, chart: &mut Chart, k: usize, state: &State, input: &[&str]) {
  assert!(state.lr0.is_active(), "tried to scan non-active state");
  assert!(
    state.lr0.next_production().unwrap().is_nonterminal(),
    "tried to scan a terminal"
  );

  let expected = state.lr0.next_production().unwrap().symbol_str();
  if k < input.len() && g.lexicon.has_tag(input[k], expected) {
    trace!(category = expected, word = input[k], at = k, "scan");

    // the lexical state is born complete and waits at k + 1
    let rule = Rc::new(Rule::lexical(expected, input[k]));
    chart.add(k + 1, State::new(LR0::new(&rule).advance(), k));
  }
}

#[cfg(test)]
fn english() -> Grammar {
  r#"
    S -> NP VP | VP
    NP -> D N | N
    VP -> V | V NP

    D : the
    N : {dog, runs}
    V : {dog, runs}
  "#
  .parse()
  .unwrap()
}

#[test]
fn test_recognizes_sentence() {
  let g = english();
  assert!(parse_chart(&g, &["the", "dog", "runs"]).recognizes());
  assert!(parse_chart(&g, &["dog", "runs"]).recognizes());
}

#[test]
fn test_rejects_sentence_outside_language() {
  let g = english();
  assert!(!parse_chart(&g, &["the", "the"]).recognizes());
  assert!(!parse_chart(&g, &["runs", "the"]).recognizes());
  // unknown words fail the scan, they don't abort the parse
  assert!(!parse_chart(&g, &["the", "platypus", "runs"]).recognizes());
}

#[test]
fn test_seed_state_is_gamma() {
  let g = english();
  let chart = parse_chart(&g, &["the", "dog", "runs"]);

  let (k, states) = chart.into_iter().next().unwrap();
  assert_eq!(k, 0);
  assert_eq!(states[0].num, 1);
  assert_eq!(states[0].origin, 0);
  assert_eq!(states[0].lr0.rule.symbol, GAMMA);
  assert_eq!(states[0].lr0.pos, 0);
}

#[test]
fn test_no_duplicate_items_within_column() {
  let g: Grammar = r#"
      S -> S S | X
      X : x
    "#
  .parse()
  .unwrap();

  let chart = parse_chart(&g, &["x", "x", "x", "x"]);
  for (_k, states) in chart {
    for (i, a) in states.iter().enumerate() {
      for b in states.iter().skip(i + 1) {
        assert!(!a.same_item(b), "duplicate item: {} and {}", a.lr0, b.lr0);
      }
    }
  }
}

#[test]
fn test_predictor_is_idempotent() {
  let g = english();
  let mut chart = Chart::new(4);
  let top = Rc::new(Rule::new(
    GAMMA,
    vec![Production::Nonterminal("S".to_string())],
  ));
  chart.add(0, State::new(LR0::new(&top), 0));

  let seed = chart.get_state(0, 0);
  predictor(&g, &mut chart, 0, &seed);
  let len = chart.len_at(0);
  predictor(&g, &mut chart, 0, &seed);

  assert_eq!(chart.len_at(0), len);
}

#[test]
fn test_scanner_builds_completed_lexical_state() {
  let g = english();
  let chart = parse_chart(&g, &["the", "dog", "runs"]);

  let column_1 = chart.into_iter().nth(1).unwrap().1;
  let lexical = column_1
    .iter()
    .find(|s| s.lr0.rule.symbol == "D")
    .expect("scanner should have tagged \"the\"");

  assert!(!lexical.lr0.is_active());
  assert_eq!(lexical.origin, 0);
  assert_eq!(
    lexical.lr0.rule.productions,
    vec![Production::Terminal("the".to_string())]
  );
}

#[test]
fn test_completer_merges_duplicate_completions() {
  // two splits of "x x x" complete the same S -> S S item over 0..3;
  // the second completion must merge backpointers, not duplicate the state
  let g: Grammar = r#"
      S -> S S | X
      X : x
    "#
  .parse()
  .unwrap();

  let chart = parse_chart(&g, &["x", "x", "x"]);
  let last = chart.into_iter().nth(3).unwrap().1;
  let spanning: Vec<&State> = last
    .iter()
    .filter(|s| s.lr0.rule.symbol == "S" && s.lr0.rule.len() == 2 && !s.lr0.is_active() && s.origin == 0)
    .collect();

  assert_eq!(spanning.len(), 1);
  assert!(spanning[0].parents.len() >= 3);
}

#[test]
fn test_empty_input() {
  let g = english();
  let chart = parse_chart(&g, &[]);
  assert_eq!(chart.len(), 1);
  assert!(!chart.recognizes());

  // a nullable start symbol recognizes the empty sentence
  let nullable: Grammar = "S -> (A)\nA : a".parse().unwrap();
  assert!(parse_chart(&nullable, &[]).recognizes());
}

#[test]
fn test_empty_grammar_recognizes_nothing() {
  let g: Grammar = "".parse().unwrap();
  assert!(!parse_chart(&g, &["dog"]).recognizes());
  assert!(!parse_chart(&g, &[]).recognizes());
}
