#[macro_use]
extern crate lazy_static;

pub mod earley;
pub mod forest;
pub mod parse_grammar;
pub mod rules;
pub mod syntree;

use std::rc::Rc;

use crate::earley::{Chart, parse_chart};
use crate::forest::Forest;
use crate::rules::Rule;

pub use crate::parse_grammar::GrammarError;
pub use crate::rules::Grammar;
pub use crate::syntree::SynTree;

/// Boxed static error type
pub type Err = Box<dyn std::error::Error + 'static>;

impl Grammar {
  pub fn parse_chart(&self, input: &[&str]) -> Chart {
    parse_chart(self, input)
  }

  fn parse_forest(&self, input: &[&str]) -> Forest {
    Forest::from(self.parse_chart(input))
  }

  /// True iff the grammar accepts `input`, without building trees.
  pub fn recognize(&self, input: &[&str]) -> bool {
    self.parse_chart(input).recognizes()
  }

  /// Every derivation of `input`, keeping the full rule at each branch.
  pub fn parse_trees(&self, input: &[&str]) -> Vec<SynTree<Rc<Rule>, String>> {
    self.parse_forest(input).trees(self)
  }

  /// Every derivation of `input` as a labelled tree, the shape tree
  /// renderers consume: each branch carries its category, each
  /// pre-terminal has a single child holding the surface word.
  pub fn parse(&self, input: &[&str]) -> Vec<SynTree<String, String>> {
    self
      .parse_trees(input)
      .into_iter()
      .map(|t| t.map(|c| c.value.symbol.clone(), |w| w.value.clone()))
      .collect()
  }
}

#[test]
fn test_parse_simple_sentence() {
  let g: Grammar = r#"
    S -> NP VP | VP
    NP -> D N | N
    VP -> V | V NP

    D : the
    N : {dog, runs}
    V : {dog, runs}
  "#
  .parse()
  .unwrap();

  let trees = g.parse(&["the", "dog", "runs"]);
  assert_eq!(trees.len(), 1);
  assert_eq!(
    trees[0].to_string(),
    "(S (NP (D the) (N dog)) (VP (V runs)))"
  );

  assert!(g.recognize(&["the", "dog", "runs"]));
  assert!(!g.recognize(&["the", "runs"]));
}

#[test]
fn test_parse_prepositional_phrase() {
  let g: Grammar = r#"
    S -> NP VP
    NP -> D N | N
    VP -> V NP | V NP PP
    PP -> P NP

    D : the
    N : {I, fireworks, Pennsylvania}
    V : bought
    P : in
  "#
  .parse()
  .unwrap();

  let trees = g.parse(&["I", "bought", "fireworks", "in", "Pennsylvania"]);
  assert_eq!(trees.len(), 1);
  assert_eq!(
    trees[0].to_string(),
    "(S (NP (N I)) (VP (V bought) (NP (N fireworks)) (PP (P in) (NP (N Pennsylvania)))))"
  );
}

#[test]
fn test_ambiguous_attachment_yields_every_reading() {
  let g: Grammar = r#"
    S -> NP VP
    NP -> D N | N | NP PP
    VP -> V NP | V NP PP
    PP -> P NP

    D : the
    N : {man, dog, park}
    V : saw
    P : in
  "#
  .parse()
  .unwrap();

  let sentence: Vec<&str> = "the man saw the dog in the park".split(' ').collect();
  let trees = g.parse(&sentence);

  let rendered: Vec<String> = trees.iter().map(|t| t.to_string()).collect();
  assert_eq!(rendered.len(), 2);
  // the phrase attaches to the verb or to the object noun phrase
  assert!(rendered.contains(
    &"(S (NP (D the) (N man)) (VP (V saw) (NP (D the) (N dog)) (PP (P in) (NP (D the) (N park)))))"
      .to_string()
  ));
  assert!(rendered.contains(
    &"(S (NP (D the) (N man)) (VP (V saw) (NP (NP (D the) (N dog)) (PP (P in) (NP (D the) (N park))))))"
      .to_string()
  ));

  // tree order is stable across runs
  let again: Vec<String> = g.parse(&sentence).iter().map(|t| t.to_string()).collect();
  assert_eq!(rendered, again);
}
