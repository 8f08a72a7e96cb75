#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![warn(clippy::nursery)]

use anyhow::{Context, Result, bail, ensure};
use clap::{Parser, Subcommand};
use glob::glob;
use owo_colors::OwoColorize;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use kpl_syntax::corpus::{self, Outcome};
use kpl_syntax::{kpl_parser, outline, verify_grammar_loads};

#[derive(Parser, Debug)]
#[command(name = "kpl_syntax", version, about = "Parse and check KPL sources")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    /// Never color the output.
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the syntax tree of a file (stdin when no path is given).
    Parse {
        path: Option<PathBuf>,

        /// Only report success through the exit status.
        #[arg(long, short)]
        quiet: bool,
    },
    /// Check that every file matching the patterns parses.
    Check {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// List the definitions in a file (stdin when no path is given).
    Outline { path: Option<PathBuf> },
    /// Run corpus tests.
    Test {
        #[arg(default_value = "tests/corpus")]
        dir: PathBuf,
    },
    /// Check that the KPL grammar loads.
    Verify,
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("kpl_syntax=debug")
        } else {
            EnvFilter::new("kpl_syntax=warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    if let Some(p) = path {
        fs::read_to_string(p).with_context(|| format!("could not read {}", p.display()))
    } else {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        Ok(s)
    }
}

struct Painter {
    color: bool,
}

impl Painter {
    fn ok(&self, s: &str) -> String {
        if self.color { s.green().to_string() } else { s.to_string() }
    }

    fn bad(&self, s: &str) -> String {
        if self.color { s.red().bold().to_string() } else { s.to_string() }
    }

    fn dim(&self, s: &str) -> String {
        if self.color { s.dimmed().to_string() } else { s.to_string() }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(args.verbose);
    let paint = Painter {
        color: !args.no_color && io::stdout().is_terminal(),
    };

    match args.command {
        Command::Parse { path, quiet } => cmd_parse(path.as_ref(), quiet),
        Command::Check { patterns } => cmd_check(&patterns, &paint),
        Command::Outline { path } => cmd_outline(path.as_ref()),
        Command::Test { dir } => cmd_test(&dir, &paint),
        Command::Verify => cmd_verify(&paint),
    }
}

fn cmd_parse(path: Option<&PathBuf>, quiet: bool) -> Result<()> {
    let src = read_input(path)?;
    let tree = kpl_parser()?.parse(src)?;
    if !quiet {
        println!("{}", tree.root_node().to_sexp());
    }
    Ok(())
}

fn cmd_check(patterns: &[String], paint: &Painter) -> Result<()> {
    let parser = kpl_parser()?;
    let mut files = Vec::new();
    for pattern in patterns {
        let before = files.len();
        for entry in glob(pattern).with_context(|| format!("bad pattern {pattern}"))? {
            files.push(entry?);
        }
        ensure!(files.len() > before, "no files match {pattern}");
    }

    let mut failed = 0usize;
    for file in &files {
        let src = fs::read_to_string(file)
            .with_context(|| format!("could not read {}", file.display()))?;
        match parser.parse(src) {
            Ok(_) => println!("{} {}", paint.ok("ok"), file.display()),
            Err(err) => {
                let Some(point) = err.point() else {
                    return Err(err.into());
                };
                failed += 1;
                println!("{} {}:{point}", paint.bad("error"), file.display());
                eprintln!("{err}");
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} files failed to parse", files.len());
    }
    Ok(())
}

fn cmd_outline(path: Option<&PathBuf>) -> Result<()> {
    let src = read_input(path)?;
    let tree = kpl_parser()?.parse(src)?;
    for sym in outline::outline(&tree) {
        println!("{}:{} {}", sym.row + 1, sym.kind, sym.name);
    }
    Ok(())
}

fn cmd_test(dir: &Path, paint: &Painter) -> Result<()> {
    let parser = kpl_parser()?;
    let report = corpus::run_dir(&parser, dir)?;
    for failure in &report.failures {
        println!(
            "{} {} ({}:{})",
            paint.bad("FAIL"),
            failure.case.name,
            failure.file.display(),
            failure.case.line
        );
        match &failure.outcome {
            Outcome::Mismatch { actual } => {
                println!("  {} {}", paint.dim("expected:"), failure.case.expected);
                println!("  {} {actual}", paint.dim("actual:  "));
            }
            Outcome::UnexpectedError { message } => {
                println!("  {}", message.replace('\n', "\n  "));
            }
            Outcome::UnexpectedSuccess { actual } => {
                println!("  {} {actual}", paint.dim("expected an error, got:"));
            }
            Outcome::Passed => {}
        }
    }
    println!(
        "{} passed, {} failed, {} total",
        paint.ok(&report.passed.to_string()),
        report.failures.len(),
        report.total()
    );
    ensure!(report.is_success(), "{} corpus cases failed", report.failures.len());
    Ok(())
}

fn cmd_verify(paint: &Painter) -> Result<()> {
    let language = verify_grammar_loads()?;
    println!(
        "{} {} grammar loaded ({} node kinds)",
        paint.ok("ok"),
        language.name(),
        language.node_kind_count()
    );
    Ok(())
}
