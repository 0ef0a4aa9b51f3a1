use std::env;
use std::io;
use std::io::Write;
use std::process;

use tracing_subscriber::EnvFilter;

use parsnip::Err;
use parsnip::rules::Grammar;

fn usage(prog_name: &str) -> String {
  format!(
    r"
Usage: {} FILE [options]

Options:
  -h, --help    Print this message
  -c, --chart   Print the parse chart (defaults to not printing)",
    prog_name
  )
}

fn parse(g: &Grammar, sentence: &str, print_chart: bool) -> Result<(), Err> {
  let sentence = sentence.split(' ').collect::<Vec<_>>();

  if !g.verify_lexicon(&sentence) {
    println!("note: some words have no lexicon entry, the parse will fail");
  }

  if print_chart {
    println!("chart:\n{}", g.parse_chart(&sentence));
  }

  let trees = g.parse(&sentence);

  println!(
    "Parsed {} tree{}",
    trees.len(),
    if trees.len() == 1 { "" } else { "s" }
  );

  for t in trees {
    println!("{}\n", t);
  }

  Ok(())
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts: Vec<String> = env::args().collect();
  let prog_name = opts[0].clone();

  if opts.len() < 2 {
    println!("{}", usage(&prog_name));
    process::exit(1);
  }

  let mut opts = opts.into_iter().skip(1);
  let filename = opts.next().unwrap();

  let mut print_chart = false; // default to *not* printing the chart
  for o in opts {
    if o == "-h" || o == "--help" {
      println!("{}", usage(&prog_name));
      process::exit(0);
    } else if o == "-c" || o == "--chart" {
      print_chart = true;
    }
  }

  let g: Grammar = Grammar::read_from_file(&filename)?;
  if !g.verify_productions() {
    println!("note: the grammar mentions symbols that head no rules and tag no words");
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        parse(&g, input.trim(), print_chart)?;
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
