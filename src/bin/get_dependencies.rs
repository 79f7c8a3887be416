use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use installed::logging;
use installed::parser::{declared_dependencies, match_declared};

#[derive(Parser)]
#[command(name = "get-dependencies")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Get dependencies in a package", long_about = None)]
struct Cli {
    /// Dependency names to look for with --match or --match-all
    names: Vec<String>,

    /// Project directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Include devDependencies
    #[arg(long)]
    dev: bool,

    /// Print the given names that are declared; exit 1 if none are
    #[arg(short = 'f', long = "match")]
    match_any: bool,

    /// Print the given names that are declared; exit 1 unless all are
    #[arg(short = 'a', long)]
    match_all: bool,

    /// No output, exit codes only
    #[arg(short, long)]
    silent: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            if !cli.silent {
                eprintln!("Error: {:#}", err);
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    let matching = cli.match_any || cli.match_all;
    let found = if matching {
        match_declared(&cli.dir, cli.dev, &cli.names)
    } else {
        declared_dependencies(&cli.dir, cli.dev)
    };
    let found =
        found.with_context(|| format!("Failed to read dependencies in {}", cli.dir.display()))?;

    if !cli.silent && !found.is_empty() {
        println!("{}", found.join("\n"));
    }

    let code = if cli.match_all {
        u8::from(!cli.names.iter().all(|name| found.contains(name)))
    } else if cli.match_any {
        u8::from(found.is_empty())
    } else {
        0
    };
    Ok(code)
}
