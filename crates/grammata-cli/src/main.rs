mod tasks;

use crate::tasks::{rpn::Translator, Checker, Engine, Table, Verdict};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use grammata::{action::Ignored, grammar::RuleSet};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the parse table of a grammar description and print it.
    Table {
        #[arg(long, value_enum, default_value = "ll")]
        engine: Engine,

        /// The path of grammar description file.
        grammar: PathBuf,
    },

    /// Check the declarations in a C source file.
    Check {
        #[arg(long, value_enum, default_value = "ll")]
        engine: Engine,

        /// The grammar of the lexer stage. Defaults to the bundled one.
        #[arg(long)]
        lexer: Option<PathBuf>,

        /// The grammar of the syntax stage. Defaults to the bundled one.
        #[arg(long)]
        syntax: Option<PathBuf>,

        /// A word passed through by the lexer as it is.
        #[arg(long = "keyword")]
        keywords: Vec<String>,

        /// Print the built tables to stderr.
        #[arg(long)]
        dump: bool,

        /// The path of the source file.
        input: PathBuf,

        /// Write the verdict to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Translate an arithmetic expression into postfix notation.
    Rpn {
        #[arg(long, value_enum, default_value = "ll")]
        engine: Engine,

        /// The grammar of expressions. Defaults to the bundled one.
        #[arg(long)]
        grammar: Option<PathBuf>,

        /// Print the built table to stderr.
        #[arg(long)]
        dump: bool,

        expr: String,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    match args.command {
        Command::Table { engine, grammar } => print_table(engine, &grammar),
        Command::Check {
            engine,
            lexer,
            syntax,
            keywords,
            dump,
            input,
            output,
        } => {
            let lexer = read_grammar(lexer.as_deref(), tasks::lexer::GRAMMAR)?;
            let syntax = read_grammar(syntax.as_deref(), tasks::declarations::GRAMMAR)?;
            let source = fs::read_to_string(&input)
                .with_context(|| format!("failed to read the input file {}", input.display()))?;

            let verdict = match Checker::new(engine, &lexer, &syntax, keywords) {
                Ok(checker) => {
                    if dump {
                        eprintln!("lexer:\n---\n{}", checker.lexer_table());
                        eprintln!("syntax:\n---\n{}", checker.syntax_table());
                    }
                    checker.check(&source)
                }
                Err(err) => {
                    tracing::error!("{:#}", err);
                    Verdict::NotGrammar
                }
            };

            match output {
                Some(path) => fs::write(&path, format!("{}\n", verdict)).with_context(|| {
                    format!("failed to write the verdict to {}", path.display())
                })?,
                None => println!("{}", verdict),
            }
            Ok(())
        }
        Command::Rpn {
            engine,
            grammar,
            dump,
            expr,
        } => {
            let grammar = read_grammar(grammar.as_deref(), tasks::rpn::GRAMMAR)?;
            let translator = Translator::new(engine, &grammar)?;
            if dump {
                eprintln!("{}", translator.table());
            }
            match translator.translate(&expr) {
                Some(rpn) => println!("{}", rpn),
                None => anyhow::bail!("not an expression: {:?}", expr),
            }
            Ok(())
        }
    }
}

fn print_table(engine: Engine, path: &Path) -> anyhow::Result<()> {
    let grammar = RuleSet::from_file(path)
        .with_context(|| format!("failed to load the grammar {}", path.display()))?;
    let table = Table::<Ignored>::build(engine, &grammar)?;
    println!("{}", table);

    let num_conflicts = table.num_conflicts();
    if num_conflicts > 0 {
        let suffix = if num_conflicts == 1 { "" } else { "s" };
        println!(
            "[warning] The table has {} shift/reduce conflict{}, resolved as reduce.",
            num_conflicts, suffix
        );
    }
    Ok(())
}

fn read_grammar(path: Option<&Path>, bundled: &str) -> anyhow::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read the grammar file {}", path.display())),
        None => Ok(bundled.to_owned()),
    }
}
