use anyhow::{Context, Result};
use repren::cli::{self, Action, Args, PatternSource};
use repren::config::{self, Config};
use repren::error_helpers::io_error_message;
use repren::file_processor::{FileProcessor, RewriteOptions, transform_stream};
use repren::logger;
use repren::pattern_parser::{PatternOptions, PatternSet, parse_patterns};
use repren::replacer::multi_replace;
use repren::report::Report;
use repren::tally::Tally;
use repren::walker::{compile_exclude, rewrite_files};
use std::fs;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{debug, info, warn};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", Report::format_error(&e, Report::stderr_color()));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args()?;
    let config_path = args.config.clone().or_else(|| config::config_file_path().ok());

    if args.action == Action::InitConfig {
        let path = config_path.context("Cannot determine home directory; pass --config FILE")?;
        config::save_default_config(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = match &config_path {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    args.overrides.apply(&mut config);
    config::validate_config(&config)?;

    if args.action == Action::ShowConfig {
        print!("{}", config::to_toml(&config)?);
        return Ok(());
    }

    let level = logger::resolve_level(&config.logging.level, args.quiet, args.verbose);
    let _guard = logger::init_logging(level, config.logging.log_file.as_deref())?;

    let options = PatternOptions {
        literal: config.patterns.literal,
        word_breaks: config.patterns.word_breaks,
        insensitive: config.patterns.insensitive,
        dotall: config.patterns.dotall,
        preserve_case: config.patterns.preserve_case,
    };
    let source = args.patterns.as_ref().context("Missing patterns")?;
    let patterns = load_patterns(source, options)?;

    if args.parse_only {
        print!("{}", patterns);
        return Ok(());
    }
    debug!("{}", patterns.to_string().trim_end());

    if args.paths.is_empty() {
        return rewrite_stdin(&patterns, !config.files.at_once);
    }
    rewrite_paths(&args, &config, patterns)
}

fn load_patterns(source: &PatternSource, options: PatternOptions) -> Result<PatternSet> {
    let patterns = match source {
        PatternSource::File(path) => {
            let contents = fs::read(path).map_err(|e| {
                let message = io_error_message(path, "reading pattern file", &e);
                anyhow::Error::new(e).context(message)
            })?;
            parse_patterns(&contents, options)
                .with_context(|| format!("Invalid pattern file: {}", path.display()))?
        }
        PatternSource::Pair { from, to } => PatternSet::from_pair(from.as_bytes(), to.as_bytes(), options)?,
    };
    Ok(patterns)
}

fn rewrite_stdin(patterns: &PatternSet, by_line: bool) -> Result<()> {
    let mut transform = |input: &[u8]| multi_replace(input, patterns, Some("stdin"));
    let stats = transform_stream(
        &mut transform,
        io::stdin().lock(),
        BufWriter::new(io::stdout().lock()),
        by_line,
    )
    .context("Failed to transform standard input")?;

    let mut tally = Tally::new();
    tally.record_scan(stats.bytes_read, stats.counts);
    eprint!("{}", Report::format_stream_summary(&tally));
    Ok(())
}

fn rewrite_paths(args: &Args, config: &Config, patterns: PatternSet) -> Result<()> {
    let exclude = compile_exclude(&config.files.exclude)?;

    if args.diff && !args.dry_run {
        warn!("--diff only applies to dry runs; ignoring it");
    }
    let options = RewriteOptions {
        by_line: !config.files.at_once,
        dry_run: args.dry_run,
        clean: config.files.clean,
        clobber_backups: config.files.clobber_backups,
        preview: args.diff && args.dry_run,
    };
    if args.dry_run {
        info!("Dry run: No files will be changed");
    }

    let processor = FileProcessor::new(patterns, args.mode.do_renames(), args.mode.do_contents(), options);
    let use_color = Report::stdout_color();
    let mut tally = Tally::new();
    let roots: &[PathBuf] = &args.paths;

    rewrite_files(roots, &exclude, &processor, &mut tally, |outcome| {
        if let Some(preview) = &outcome.preview {
            print!("{}", Report::format_preview(preview, use_color));
        }
    })?;

    eprint!("{}", Report::format_summary(&tally, args.dry_run));
    Ok(())
}
