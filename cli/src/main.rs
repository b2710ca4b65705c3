use std::env;
use std::io;
use std::io::Write;
use std::process;

use chartparse::config::{DEFAULT_SENTENCE_LENGTH, ParserConfig, VERSION};
use chartparse::Parser;
use tracing_subscriber::EnvFilter;

pub type Err = Box<dyn std::error::Error + 'static>;

fn usage(prog_name: &str) -> String {
  format!(
    r"chartparse {}
Usage: {} DATA_DIR [options]

Reads one sentence per line from stdin and prints its parse.

Options:
  -h, --help          Print this message
  -l, --max-len N     Longest sentence to accept, in tokens (defaults to {})
  -t, --tokens        Input is already tokenized, space separated
  -s, --scores        Also print the scored tree",
    VERSION,
    prog_name,
    DEFAULT_SENTENCE_LENGTH - 1
  )
}

fn parse(parser: &Parser, sentence: &str, pretokenized: bool, print_scores: bool) -> Result<(), Err> {
  let tokens = if pretokenized {
    sentence.split_whitespace().map(str::to_string).collect::<Vec<_>>()
  } else {
    parser.tokenize(sentence)
  };

  let tree = match parser.parse_tree(&tokens) {
    Ok(Some(tree)) => tree,
    Ok(None) => {
      println!("(no parse)");
      return Ok(());
    }
    // a bad sentence shouldn't end the session
    Err(e) => {
      eprintln!("error: {}", e);
      return Ok(());
    }
  };

  println!("{}", parser.render(&tree, &tokens));
  if print_scores {
    let states = &parser.grammar().states;
    let scored = tree.map(
      &|c| format!("{} {}", states[c.value.state], c.value.score),
      &|w| tokens.get(w.value).cloned().unwrap_or_default(),
    );
    println!("{}", scored);
  }
  println!();

  Ok(())
}

struct Args {
  data_dir: String,
  max_len: usize,
  pretokenized: bool,
  print_scores: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "chartparse"));
    }

    let args_len = v.len();
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap_or_default();

    if args_len < 2 {
      return Err(Self::make_error_message("not enough arguments", prog_name));
    }

    let mut data_dir: Option<String> = None;
    let mut max_len = DEFAULT_SENTENCE_LENGTH - 1;
    let mut pretokenized = false;
    let mut print_scores = false;

    while let Some(o) = iter.next() {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-t" || o == "--tokens" {
        pretokenized = true;
      } else if o == "-s" || o == "--scores" {
        print_scores = true;
      } else if o == "-l" || o == "--max-len" {
        max_len = match iter.next().map(|n| n.parse::<usize>()) {
          Some(Ok(n)) if n > 0 => n,
          _ => return Err(Self::make_error_message("--max-len needs a positive number", prog_name)),
        };
      } else if data_dir.is_none() {
        data_dir = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    if let Some(data_dir) = data_dir {
      Ok(Self {
        data_dir,
        max_len,
        pretokenized,
        print_scores,
      })
    } else {
      Err(Self::make_error_message("missing data directory", prog_name))
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  // one more entry for the boundary
  let config = ParserConfig::default().with_max_sentence_len(opts.max_len + 1);
  let parser = Parser::load(&opts.data_dir, config)?;
  tracing::info!("ready, {} states", parser.grammar().states.len());

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
        parse(&parser, input.trim(), opts.pretokenized, opts.print_scores)?;
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
