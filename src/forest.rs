use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::earley::Chart;
use crate::rules::{Grammar, Production, Rule};
use crate::syntree::{Constituent, SynTree, Word};

/// Every way of picking one element from each set in `sets`, in order.
/// An ambiguous child contributes one set per reading, so the picks are
/// the distinct child sequences. Will clone the elements.
fn combinations<T: Clone>(sets: &[Vec<T>]) -> Vec<Vec<T>> {
  let mut picks: Vec<Vec<T>> = vec![Vec::new()];
  for set in sets {
    picks = picks
      .into_iter()
      .flat_map(|prefix| {
        set.iter().map(move |choice| {
          let mut pick = prefix.clone();
          pick.push(choice.clone());
          pick
        })
      })
      .collect();
  }
  picks
}

/// A completed constituent: the rule that finished, the span it covers,
/// and the backpointers its chart state accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestState {
  rule: Rc<Rule>,
  span: (usize, usize),
  num: usize,
  parents: BTreeSet<usize>,
}

impl ForestState {
  fn new(rule: &Rc<Rule>, span: (usize, usize), num: usize, parents: BTreeSet<usize>) -> Self {
    Self {
      rule: rule.clone(),
      span,
      num,
      parents,
    }
  }

  /// True iff this constituent covers the whole `len`-token input under
  /// `symbol`.
  pub fn is_spanning(&self, symbol: &str, len: usize) -> bool {
    self.span == (0, len) && self.rule.symbol == symbol
  }
}

impl fmt::Display for ForestState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "#{} {}..{}: {}",
      self.num, self.span.0, self.span.1, self.rule
    )
  }
}

impl From<&ForestState> for Constituent<ForestState> {
  fn from(fs: &ForestState) -> Self {
    Constituent {
      value: fs.clone(),
      span: fs.span,
    }
  }
}

/// Trees under construction carry their forest state so child searches
/// can follow its backpointers; [`Forest::trees`] strips this down to
/// the rule at the end.
type BuildTree = SynTree<ForestState, String>;

/// The completed states of a chart, indexed by origin. There is a column
/// for every position including the end of the input, where zero-width
/// completions of nullable symbols live.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest(Vec<Vec<ForestState>>);

impl Forest {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Checks if a subtree has already been filled in by make_trees(),
  /// or if it is a leaf and doesn't need to be
  fn subtree_is_complete(node: &BuildTree) -> bool {
    if let Some((cons, children)) = node.get_branch() {
      cons.value.rule.len() == children.len()
    } else {
      // is a leaf
      true
    }
  }

  /// Takes a rule and search span, and returns every possible sequence
  /// of child trees matching the rule's productions positionally, with
  /// spans tiling `search_start..search_end` exactly.
  ///
  /// Candidate children must carry a state number the parent's
  /// backpointers mention, so sequences never mix constituents from
  /// unrelated derivations. Zero-width children are exempt: a nullable
  /// constituent completed over an empty span is a valid child wherever
  /// its symbol is needed, and the early completion of its waiting
  /// parent may not have recorded it.
  fn extend_out(
    &self,
    parents: &BTreeSet<usize>,
    rule: &Rule,
    prod_idx: usize,
    search_start: usize,
    search_end: usize,
  ) -> Vec<Vec<BuildTree>> {
    if prod_idx == rule.len() {
      return if search_start == search_end {
        // base case, we consumed the whole rule and the whole span together.
        // provide a single empty sequence to prepend onto as the stack unwinds
        vec![Vec::new()]
      } else {
        // ran out of productions before consuming the span
        Vec::new()
      };
    }

    match &rule.productions[prod_idx] {
      Production::Nonterminal(wanted) => {
        // look for completed constituents producing this symbol at the search start
        self.0[search_start]
          .iter()
          .filter(|s| {
            s.rule.symbol == *wanted
              && s.span.1 <= search_end
              && (s.span.0 == s.span.1 || parents.contains(&s.num))
          })
          .flat_map(|s| {
            // recursively find possible sequences that start directly after this state
            self
              .extend_out(parents, rule, prod_idx + 1, s.span.1, search_end)
              .into_iter()
              // prepend an unfilled tree headed by this state onto each of them
              .map(move |mut seq| {
                seq.insert(0, SynTree::Branch(s.into(), Vec::new()));
                seq
              })
          })
          .collect()
      }
      Production::Terminal(word) => {
        if search_start >= search_end {
          // no token left to consume
          return Vec::new();
        }
        let leaf = SynTree::Leaf(Word {
          value: word.clone(),
          span: (search_start, search_start + 1),
        });

        self
          .extend_out(parents, rule, prod_idx + 1, search_start + 1, search_end)
          .into_iter()
          .map(move |mut seq| {
            seq.insert(0, leaf.clone());
            seq
          })
          .collect()
      }
    }
  }

  /// Takes a possibly-unfilled tree and returns all the complete trees
  /// it describes. An unfilled tree is a branch with 0 children whose
  /// rule wants more; its children come from extend_out.
  fn make_trees(&self, tree: BuildTree) -> Vec<BuildTree> {
    if Self::subtree_is_complete(&tree) {
      vec![tree]
    } else {
      let (cons, _) = tree.get_branch().unwrap();
      self
        .extend_out(
          &cons.value.parents,
          &cons.value.rule,
          0,
          cons.span.0,
          cons.span.1,
        )
        .into_iter()
        .flat_map(|children| {
          let child_sets = children
            .into_iter()
            .map(|child| self.make_trees(child))
            .collect::<Vec<_>>();
          combinations(&child_sets)
            .into_iter()
            .map(|set| SynTree::Branch(cons.clone(), set))
        })
        .collect::<Vec<_>>()
    }
  }

  /// Every derivation of the input under the grammar's start symbol, in
  /// insertion order of the spanning completions. Empty when the parse
  /// failed.
  pub fn trees(&self, g: &Grammar) -> Vec<SynTree<Rc<Rule>, String>> {
    if self.is_empty() {
      return Vec::new();
    }

    let input_len = self.len() - 1;
    // seed the search with the start-symbol constituents covering the
    // whole input, then fill each seed in every possible way
    self.0[0]
      .iter()
      .filter(|s| s.is_spanning(&g.start, input_len))
      .map(|s| SynTree::Branch(s.into(), Vec::new()))
      .flat_map(|seed| self.make_trees(seed))
      .map(|t| t.map(|c| c.value.rule.clone(), |w| w.value.clone()))
      .collect()
  }
}

impl From<Chart> for Forest {
  fn from(chart: Chart) -> Self {
    let mut v = vec![Vec::new(); chart.len()];

    for (k, states) in chart.into_iter() {
      for state in states {
        // unfinished items can't contribute to a tree
        if !state.lr0.is_active() {
          v[state.origin].push(ForestState::new(
            &state.lr0.rule,
            (state.origin, k),
            state.num,
            state.parents,
          ));
        }
      }
    }

    Self(v)
  }
}

impl fmt::Display for Forest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for k in 0..self.len() {
      writeln!(f, "Origin {}:", k)?;
      for fs in self.0[k].iter() {
        writeln!(f, "  {}", fs)?;
      }
    }

    Ok(())
  }
}

#[cfg(test)]
use crate::earley::parse_chart;

#[cfg(test)]
fn bracketed(tree: &SynTree<Rc<Rule>, String>) -> String {
  tree
    .map(|c| c.value.symbol.clone(), |w| w.value.clone())
    .to_string()
}

#[test]
fn test_tree_ambiguity_is_exact() {
  // the naive span-driven walk finds 2 spurious extra trees here:
  //  (S (S x) (S x))                 covers only [x][x]
  //  (S (S (S x) (S x)) (S (S x) (S x)))  wants four tokens
  // exact tiling rules both out; "x x x" has exactly 2 bracketings
  let g: Grammar = r#"
      S -> S S | X
      X : x
    "#
  .parse()
  .unwrap();

  let forest: Forest = parse_chart(&g, &["x", "x", "x"]).into();
  let trees = forest.trees(&g);

  assert_eq!(trees.len(), 2);
  let rendered: Vec<String> = trees.iter().map(bracketed).collect();
  assert!(rendered.contains(&"(S (S (X x)) (S (S (X x)) (S (X x))))".to_string()));
  assert!(rendered.contains(&"(S (S (S (X x)) (S (X x))) (S (X x)))".to_string()));

  for tree in trees.iter() {
    assert_eq!(tree.leaves().len(), 3);
  }
}

#[test]
fn test_no_parse_yields_no_trees() {
  let g: Grammar = r#"
      S -> S S | X
      X : x
    "#
  .parse()
  .unwrap();

  let forest: Forest = parse_chart(&g, &["y"]).into();
  assert!(forest.trees(&g).is_empty());

  let forest: Forest = parse_chart(&g, &[]).into();
  assert!(forest.trees(&g).is_empty());
}

#[test]
fn test_nullable_constituent_appears_childless() {
  let g: Grammar = r#"
      S -> A B
      A -> (C)
      B : b
      C : c
    "#
  .parse()
  .unwrap();

  let forest: Forest = parse_chart(&g, &["b"]).into();
  let trees = forest.trees(&g);
  assert_eq!(trees.len(), 1);
  assert_eq!(bracketed(&trees[0]), "(S (A) (B b))");

  let forest: Forest = parse_chart(&g, &["c", "b"]).into();
  let trees = forest.trees(&g);
  assert_eq!(trees.len(), 1);
  assert_eq!(bracketed(&trees[0]), "(S (A (C c)) (B b))");
}

#[test]
fn test_forest_indexes_completions_by_origin() {
  let g: Grammar = r#"
      S -> S S | X
      X : x
    "#
  .parse()
  .unwrap();

  let forest: Forest = parse_chart(&g, &["x", "x"]).into();
  assert_eq!(forest.len(), 3);

  // every origin-0 constituent starts at 0
  for fs in forest.0[0].iter() {
    assert_eq!(fs.span.0, 0);
  }
  // exactly one start-symbol constituent spans the input
  let spanning = forest.0[0]
    .iter()
    .filter(|s| s.is_spanning("S", 2))
    .count();
  assert_eq!(spanning, 1);
}
