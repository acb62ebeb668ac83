use crate::config::Config;
use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

License: MIT
Rust Edition: 2024"
);

#[derive(Parser, Debug)]
#[command(name = "repren")]
#[command(about = "Multi-pattern search and replace with file renaming and automatic backups")]
#[command(long_about = "repren rewrites file contents and renames files using any number of
regular-expression replacements at once.

All patterns are matched against the original text, never against each
other's output, so swaps like foo->bar, bar->foo just work. When two
matches overlap, the one from the earlier pattern wins and the other is
skipped with a warning.

Every rewritten file is written to a temporary file first and only then
moved into place; the original is kept as FILE.orig (or FILE.orig.1, ...).

PATTERNS:
  A pattern file has one SEARCH<TAB>REPLACEMENT pair per line. Blank lines
  and lines starting with '#' are ignored. Replacements may refer to
  groups: $1, ${1}, $name, ${name}; $$ is a literal dollar sign.

STDIN/STDOUT:
  When no paths are given, repren reads stdin and writes the result to
  stdout. Renames are not available in this mode.

EXAMPLES:
  repren --from foo --to bar src/                Replace in all files under src/
  repren -p patterns.tsv --full .                Rewrite contents and rename files
  repren -p patterns.tsv --renames -n .          Preview renames only
  repren --preserve-case --from foo_bar --to baz_qux .
                                                 Also replace FooBar, fooBar, FOO_BAR
  repren -n --diff --from 'v(\\d+)' --to 'version$1' docs/
                                                 Show what would change
  echo 'a b' | repren --from '(\\w+) (\\w+)' --to '$2 $1'")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
struct Cli {
    /// Files and directories to process (stdin when omitted)
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Pattern file with SEARCH<TAB>REPLACEMENT lines
    #[arg(short = 'p', long, value_name = "FILE", conflicts_with_all = ["from", "to"])]
    patterns: Option<PathBuf>,

    /// Single search pattern
    #[arg(long, value_name = "REGEX", requires = "to", allow_hyphen_values = true)]
    from: Option<String>,

    /// Replacement for --from
    #[arg(long, value_name = "TEMPLATE", requires = "from", allow_hyphen_values = true)]
    to: Option<String>,

    /// Rename files and rewrite their contents
    #[arg(long, conflicts_with = "renames")]
    full: bool,

    /// Rename files only, leaving contents alone
    #[arg(long)]
    renames: bool,

    /// Treat search patterns as literal text
    #[arg(short = 'l', long)]
    literal: bool,

    /// Only match at word boundaries
    #[arg(short = 'b', long)]
    word_breaks: bool,

    /// Case-insensitive matching
    #[arg(short = 'i', long)]
    insensitive: bool,

    /// Let '.' match newlines
    #[arg(long)]
    dotall: bool,

    /// Also replace lowerCamel, UpperCamel, lower_underscore and UPPER_UNDERSCORE variants
    #[arg(long)]
    preserve_case: bool,

    /// Skip files and directories whose name matches REGEX at the start
    #[arg(long, value_name = "REGEX")]
    #[arg(help = "Skip files and directories whose name matches REGEX at the start\nDefault: '\\.' (dot-files)")]
    exclude: Option<String>,

    /// Transform each file as a whole instead of line by line
    #[arg(long)]
    #[arg(help = "Transform each file as a whole instead of line by line\nNeeded for patterns that span lines")]
    at_once: bool,

    /// Show what would change without touching any file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Print the compiled patterns and exit
    #[arg(short = 't', long)]
    parse_only: bool,

    /// Delete .orig backups after a successful rewrite
    #[arg(long)]
    clean: bool,

    /// Overwrite an existing backup instead of creating FILE.orig.N
    #[arg(long)]
    clobber_backups: bool,

    /// With --dry-run, print a unified diff of each changed file
    #[arg(long)]
    diff: bool,

    /// Only print warnings and errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print debug output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Configuration file to use instead of ~/.repren/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a commented default configuration file and exit
    #[arg(long, conflicts_with = "show_config")]
    init_config: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Also append log output to FILE
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// Where the patterns come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSource {
    File(PathBuf),
    Pair { from: String, to: String },
}

/// What to change in each file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Contents,
    Renames,
    Full,
}

impl Mode {
    pub fn do_contents(self) -> bool {
        self != Mode::Renames
    }

    pub fn do_renames(self) -> bool {
        self != Mode::Contents
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Run,
    InitConfig,
    ShowConfig,
}

/// Settings that can come from the config file or the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub literal: bool,
    pub word_breaks: bool,
    pub insensitive: bool,
    pub dotall: bool,
    pub preserve_case: bool,
    pub exclude: Option<String>,
    pub at_once: bool,
    pub clean: bool,
    pub clobber_backups: bool,
    pub log_file: Option<PathBuf>,
}

impl Overrides {
    /// Merge the command line over `config`. A switch can only turn an
    /// option on; values replace the configured ones.
    pub fn apply(&self, config: &mut Config) {
        config.patterns.literal |= self.literal;
        config.patterns.word_breaks |= self.word_breaks;
        config.patterns.insensitive |= self.insensitive;
        config.patterns.dotall |= self.dotall;
        config.patterns.preserve_case |= self.preserve_case;
        config.files.at_once |= self.at_once;
        config.files.clean |= self.clean;
        config.files.clobber_backups |= self.clobber_backups;
        if let Some(exclude) = &self.exclude {
            config.files.exclude = exclude.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.logging.log_file = Some(log_file.clone());
        }
    }
}

#[derive(Debug)]
pub struct Args {
    pub action: Action,
    /// Always set for `Action::Run`
    pub patterns: Option<PatternSource>,
    pub paths: Vec<PathBuf>,
    pub mode: Mode,
    pub overrides: Overrides,
    pub dry_run: bool,
    pub parse_only: bool,
    pub diff: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

pub fn parse_args() -> Result<Args> {
    into_args(Cli::parse())
}

/// Parse an explicit argument list (the first item is the program name)
pub fn parse_args_from<I, T>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    into_args(Cli::try_parse_from(args)?)
}

fn into_args(cli: Cli) -> Result<Args> {
    let action = if cli.init_config {
        Action::InitConfig
    } else if cli.show_config {
        Action::ShowConfig
    } else {
        Action::Run
    };

    let patterns = match (cli.patterns, cli.from, cli.to) {
        (Some(file), _, _) => Some(PatternSource::File(file)),
        (None, Some(from), Some(to)) => Some(PatternSource::Pair { from, to }),
        _ => None,
    };
    if action == Action::Run && patterns.is_none() {
        anyhow::bail!("Missing patterns. Use --patterns FILE or --from REGEX --to TEMPLATE");
    }

    let mode = if cli.full {
        Mode::Full
    } else if cli.renames {
        Mode::Renames
    } else {
        Mode::Contents
    };

    if action == Action::Run && cli.paths.is_empty() && mode.do_renames() && !cli.parse_only {
        anyhow::bail!("Renames need file paths; they are not available when reading stdin");
    }

    Ok(Args {
        action,
        patterns,
        paths: cli.paths,
        mode,
        overrides: Overrides {
            literal: cli.literal,
            word_breaks: cli.word_breaks,
            insensitive: cli.insensitive,
            dotall: cli.dotall,
            preserve_case: cli.preserve_case,
            exclude: cli.exclude,
            at_once: cli.at_once,
            clean: cli.clean,
            clobber_backups: cli.clobber_backups,
            log_file: cli.log_file,
        },
        dry_run: cli.dry_run,
        parse_only: cli.parse_only,
        diff: cli.diff,
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    })
}
