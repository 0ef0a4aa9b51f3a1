//! Cross-module invariants, checked over random sentences and random
//! surface sugar rather than hand-picked cases.

use std::collections::HashSet;

use proptest::prelude::*;

use parsnip::parse_grammar::{REPEAT_BOUND, expand_optionals, expand_repeats};
use parsnip::rules::Grammar;

fn english() -> Grammar {
  r#"
    S -> NP VP
    NP -> D N | N | NP PP
    VP -> V | V NP | V NP PP
    PP -> P NP

    D : {the, a}
    N : {man, dog, park, telescope}
    V : {saw, runs}
    P : {in, with}
  "#
  .parse()
  .unwrap()
}

fn arb_sentence() -> impl Strategy<Value = Vec<&'static str>> {
  prop::collection::vec(
    prop::sample::select(vec![
      "the", "a", "man", "dog", "saw", "runs", "in", "with", "park", "telescope",
    ]),
    0..8,
  )
}

proptest! {
  #[test]
  fn dot_stays_within_the_rule(sentence in arb_sentence()) {
    let g = english();
    let chart = g.parse_chart(&sentence);
    for (_k, states) in chart {
      for s in states {
        prop_assert!(s.lr0.pos <= s.lr0.rule.len());
      }
    }
  }

  #[test]
  fn state_numbers_are_unique_and_dense(sentence in arb_sentence()) {
    let g = english();
    let chart = g.parse_chart(&sentence);

    let mut nums: Vec<usize> = Vec::new();
    let mut parents: Vec<usize> = Vec::new();
    for (_k, states) in chart {
      for s in states {
        nums.push(s.num);
        parents.extend(s.parents.iter().copied());
      }
    }

    let unique: HashSet<usize> = nums.iter().copied().collect();
    prop_assert_eq!(unique.len(), nums.len());
    prop_assert_eq!(nums.iter().min().copied(), Some(1));
    prop_assert_eq!(nums.iter().max().copied(), Some(nums.len()));

    // backpointers only ever name real states
    for p in parents {
      prop_assert!(unique.contains(&p));
    }
  }

  #[test]
  fn parsing_is_deterministic(sentence in arb_sentence()) {
    let g = english();

    let chart_a = g.parse_chart(&sentence).to_string();
    let chart_b = g.parse_chart(&sentence).to_string();
    prop_assert_eq!(chart_a, chart_b);

    let trees_a: Vec<String> = g.parse(&sentence).iter().map(|t| t.to_string()).collect();
    let trees_b: Vec<String> = g.parse(&sentence).iter().map(|t| t.to_string()).collect();
    prop_assert_eq!(trees_a, trees_b);
  }

  #[test]
  fn recognition_matches_tree_extraction(sentence in arb_sentence()) {
    let g = english();

    let recognized = g.recognize(&sentence);
    let trees = g.parse(&sentence);
    prop_assert_eq!(recognized, !trees.is_empty());

    // every derivation yields the sentence back as its leaves
    for tree in trees.iter() {
      let leaves: Vec<&str> = tree.leaves().into_iter().map(String::as_str).collect();
      prop_assert_eq!(&leaves, &sentence);
    }
  }

  #[test]
  fn optional_expansion_is_the_inclusion_lattice(mask in prop::collection::vec(any::<bool>(), 1..6)) {
    let names: Vec<String> = (0..mask.len()).map(|i| format!("X{}", i)).collect();
    let surface: Vec<String> = names
      .iter()
      .zip(mask.iter())
      .map(|(n, optional)| if *optional { format!("({})", n) } else { n.clone() })
      .collect();
    let surface: Vec<&str> = surface.iter().map(String::as_str).collect();

    let expanded: HashSet<Vec<String>> = expand_optionals(&surface).into_iter().collect();

    // exactly the subsequences keeping every non-optional symbol
    let optionals = mask.iter().filter(|o| **o).count();
    let mut expected: HashSet<Vec<String>> = HashSet::new();
    for bits in 0..(1u32 << optionals) {
      let mut seq = Vec::new();
      let mut opt_idx = 0;
      for (name, optional) in names.iter().zip(mask.iter()) {
        if *optional {
          if bits & (1 << opt_idx) != 0 {
            seq.push(name.clone());
          }
          opt_idx += 1;
        } else {
          seq.push(name.clone());
        }
      }
      expected.insert(seq);
    }

    prop_assert_eq!(expanded, expected);
  }

  #[test]
  fn repeat_expansion_leaves_neighbors_untouched(pos in 0usize..4) {
    let mut surface: Vec<String> = (0..4).map(|i| format!("Y{}", i)).collect();
    surface[pos] = format!("{}+", surface[pos]);
    let surface: Vec<&str> = surface.iter().map(String::as_str).collect();

    let expanded = expand_repeats(&surface);
    prop_assert_eq!(expanded.len(), REPEAT_BOUND);

    let repeated = format!("Y{}", pos);
    for (i, alternative) in expanded.iter().enumerate() {
      // i + 1 copies in place, everything else in its old order
      prop_assert_eq!(alternative.len(), 3 + i + 1);
      prop_assert_eq!(alternative.iter().filter(|s| **s == repeated).count(), i + 1);

      let others: Vec<&String> = alternative.iter().filter(|s| **s != repeated).collect();
      let expected: Vec<String> = (0..4)
        .filter(|idx| *idx != pos)
        .map(|idx| format!("Y{}", idx))
        .collect();
      prop_assert_eq!(others, expected.iter().collect::<Vec<&String>>());
    }
  }
}
