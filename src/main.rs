use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use installed::export::{self, OutputFormat, RenderOptions};
use installed::inspect::{self, QueryOptions};
use installed::{logging, Depth, FilterOptions, MatchQuery};

#[derive(Parser)]
#[command(name = "installed")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Display data about installed packages", long_about = None)]
#[command(after_help = "Examples:
  installed                              List all top-level dependencies
  installed inherits mkdirp              Fails only if neither is installed
  installed --all inherits mkdirp        Fails unless both are installed
  installed --depth=-1 mkdirp            Look for mkdirp at any depth
  installed mkdirp@^1.0.0                Look for a version matching ^1.0.0
  installed --table --format=\"{name} {license} {path}\"
  installed --filter=scripts.test        Only packages with a test script")]
struct Cli {
    /// Packages to look for, as name[@range]
    #[arg(value_name = "NAME[@RANGE]")]
    queries: Vec<String>,

    /// Project directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Traversal depth; -1 or Infinity traverses the entire tree
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    depth: Depth,

    /// Include development dependencies
    #[arg(long)]
    dev: bool,

    /// Filter out extraneous dependencies
    #[arg(long)]
    no_extraneous: bool,

    /// Exit with 2 unless every query matches
    #[arg(short, long)]
    all: bool,

    /// No output, exit codes only
    #[arg(short, long)]
    silent: bool,

    /// Do not print the summary to stderr
    #[arg(long)]
    no_summary: bool,

    /// Output template; place variables in {curlies}
    #[arg(long, value_name = "TEMPLATE")]
    format: Option<String>,

    /// List possible --format and --table variables
    #[arg(long)]
    list_vars: bool,

    /// Show output as a table, one column per --format variable
    #[arg(long)]
    table: bool,

    /// Permit duplicate lines of output
    #[arg(long)]
    no_unique: bool,

    /// Only keep packages where this dotted path is set, e.g. scripts.test
    #[arg(long, value_name = "PATH")]
    filter: Option<String>,

    /// Only keep packages that have every --format variable
    #[arg(long)]
    strict: bool,

    /// Generate JSON output, keyed by --format variables when given
    #[arg(long)]
    json: bool,

    /// Flatten --json output so there is no object nesting
    #[arg(long)]
    flatten: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn query_options(&self) -> QueryOptions {
        QueryOptions {
            depth: self.depth,
            filter: FilterOptions {
                include_dev: self.dev,
                include_extraneous: !self.no_extraneous,
            },
        }
    }

    fn render_options(&self) -> RenderOptions {
        let format = if self.json {
            OutputFormat::Json
        } else if self.table {
            OutputFormat::Table
        } else {
            OutputFormat::Text
        };

        RenderOptions {
            format,
            template: self.format.clone(),
            flatten: self.flatten,
            pairs: self.json && self.table,
            unique: !self.no_unique,
            strict: self.strict,
            filter: self.filter.clone(),
            max_width: export::terminal_width(),
        }
    }

    fn summary(&self, line: &str) {
        if !self.silent && !self.no_summary {
            eprintln!("{}", line);
        }
    }
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
    if cli.list_vars {
        return list_vars(cli);
    }

    let queries: Vec<MatchQuery> = cli.queries.iter().map(|q| MatchQuery::parse(q)).collect();
    let result = inspect::match_installed(&cli.dir, &queries, &cli.query_options())
        .with_context(|| format!("Failed to read installed packages in {}", cli.dir.display()))?;

    let satisfied = queries
        .iter()
        .filter(|q| result.satisfied.contains(&q.key()))
        .count();
    let all_satisfied = result.all_satisfied(&queries);

    let options = cli.render_options();
    let records = export::select(result.matched, &options);
    let total = if cli.silent {
        export::render_to(&records, &options, &mut io::sink())
    } else {
        export::render_to(&records, &options, &mut io::stdout().lock())
    };
    let total = total.context("Failed to write output")?;

    let matching = if queries.is_empty() { "" } else { "matching " };
    let mut code = 0;
    match total {
        0 => {
            cli.summary(&format!("No {}dependencies!", matching));
            code = 1;
        }
        1 => cli.summary(&format!("1 {}dependency", matching)),
        n => cli.summary(&format!("{} {}dependencies.", n, matching)),
    }

    if cli.all {
        cli.summary(&format!("{} out of {} matches.", satisfied, queries.len()));
        if !all_satisfied {
            code = 2;
        }
    }

    Ok(code)
}

fn list_vars(cli: &Cli) -> Result<u8> {
    let project = inspect::read_project(&cli.dir)
        .with_context(|| format!("Failed to read project in {}", cli.dir.display()))?
        .context("Project has no root package")?;

    if !cli.silent {
        eprintln!("Possible format keys:");
        let mut stdout = io::stdout().lock();
        export::write_vars(&project, export::terminal_width(), &mut stdout)?;
    }
    Ok(0)
}
