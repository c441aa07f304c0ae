//! transmat - MATLAB/Octave front end
//!
//! Reads a source file, runs the lexer and parser, and prints the syntax
//! tree (or the first syntax error) for downstream translation passes.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{ConfigLoader, LogLevel, OutputFormat, TransmatConfig};
use env_logger::Env;
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use transmat_lexer::{tokenize_detailed, TokenKind};
use transmat_parser::{parse_with_options, CompatMode, ParserOptions, Program};

#[derive(Parser)]
#[command(
    name = "transmat",
    version,
    about = "Parse MATLAB/Octave sources into a syntax tree",
    after_help = r#"
Environment Variables:
  TRANSMAT_DEBUG=1              Enable debug logging
  TRANSMAT_LOG_LEVEL=debug      Set log level (error, warn, info, debug, trace)
  TRANSMAT_COMPAT=strict        Parser dialect (matlab, strict)
  TRANSMAT_FORMAT=yaml          Output format (json, yaml, debug)
  TRANSMAT_PRETTY=0             Compact JSON output
  TRANSMAT_CONFIG=<path>        Path to configuration file
"#
)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, env = "TRANSMAT_DEBUG")]
    debug: bool,

    /// Set log level
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Configuration file path
    #[arg(long, env = "TRANSMAT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a source file and print its syntax tree
    Parse {
        /// Source file, or `-` for standard input
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Reject command syntax and do not recover from malformed if-conditions
        #[arg(long)]
        strict: bool,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the token stream of a source file
    Tokens {
        /// Source file, or `-` for standard input
        file: PathBuf,
    },

    /// Inspect or create configuration files
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Show version information
    Version {
        /// Show detailed version information
        #[arg(long)]
        detailed: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a sample configuration (to stdout when no path is given)
    Generate {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let log_level = if cli.debug {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.into()
    } else {
        config.log_filter()
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .filter_level(log_level)
        .init();

    debug!("transmat v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Parse {
            file,
            format,
            strict,
            compact,
        } => execute_parse(&file, &config, format, strict, compact),
        Commands::Tokens { file } => execute_tokens(&file),
        Commands::Config { action } => execute_config(action, &config),
        Commands::Version { detailed } => {
            show_version(detailed);
            Ok(())
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read standard input")?;
        return Ok(source);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn execute_parse(
    file: &Path,
    config: &TransmatConfig,
    format: Option<OutputFormat>,
    strict: bool,
    compact: bool,
) -> Result<()> {
    let source = read_source(file)?;
    let compat = if strict {
        CompatMode::Strict
    } else {
        config.parser.compat
    };
    info!("Parsing {} ({:?} mode)", file.display(), compat);

    let program = match parse_with_options(&source, &ParserOptions::new(compat)) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}:{}: {err}", file.display(), err.position().line);
            std::process::exit(1);
        }
    };

    let format = format.unwrap_or(config.output.format);
    let pretty = config.output.pretty && !compact;
    println!("{}", render(&program, format, pretty)?);
    Ok(())
}

fn render(program: &Program, format: OutputFormat, pretty: bool) -> Result<String> {
    let text = match format {
        OutputFormat::Json if pretty => {
            serde_json::to_string_pretty(program).context("Failed to serialize tree to JSON")?
        }
        OutputFormat::Json => {
            serde_json::to_string(program).context("Failed to serialize tree to JSON")?
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(program).context("Failed to serialize tree to YAML")?
        }
        OutputFormat::Debug => format!("{program:#?}"),
    };
    Ok(text)
}

fn execute_tokens(file: &Path) -> Result<()> {
    let source = read_source(file)?;
    let tokens = tokenize_detailed(&source);
    for token in &tokens {
        println!(
            "{}:{}\t{:?}\t{:?}",
            token.line, token.offset, token.kind, token.text
        );
    }
    let errors = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Error)
        .count();
    if errors > 0 {
        warn!("{} unrecognized token(s) in {}", errors, file.display());
    }
    Ok(())
}

fn execute_config(action: ConfigCommand, config: &TransmatConfig) -> Result<()> {
    match action {
        ConfigCommand::Show => {
            let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
            print!("{yaml}");
        }
        ConfigCommand::Generate { output: Some(path) } => {
            ConfigLoader::save_to_file(&TransmatConfig::default(), &path)?;
            println!("Configuration written to {}", path.display());
        }
        ConfigCommand::Generate { output: None } => {
            print!("{}", ConfigLoader::generate_sample_config());
        }
    }
    Ok(())
}

fn show_version(detailed: bool) {
    println!("transmat v{}", env!("CARGO_PKG_VERSION"));

    if detailed {
        println!(
            "Profile: {}",
            if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            }
        );
        println!("Target: {}-{}", std::env::consts::ARCH, std::env::consts::OS);
        println!();
        println!("Components:");
        println!("  • transmat-lexer: MATLAB/Octave tokenizer");
        println!("  • transmat-parser: syntax tree construction and desugaring");
    }
}
