// pogkit CLI - bulk edits for product offering group and category archives

mod commands;
mod exit_codes;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use exit_codes::{EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "pogkit")]
#[command(about = "Create, extend and expire product offering bundles and categories (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Engine config file (TOML). Defaults to <config dir>/pogkit/config.toml if present
    #[arg(long, global = true, env = "POGKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Locale for generated names (overrides the config file)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where results go. Shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write the output archive here (only written when something changed)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Write every issue as CSV (UTF-8 with BOM)
    #[arg(long)]
    pub issues: Option<PathBuf>,

    /// Write skipped rows as CSV (UTF-8 with BOM)
    #[arg(long)]
    pub skipped: Option<PathBuf>,

    /// Print the operation result as JSON to stdout (archive bytes excluded)
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build service bundles from a table (Addons name, Addons ID, Имя услуги, ID услуги)
    #[command(after_help = "\
Examples:
  pogkit create-bundles addons.xlsx -o bundles.zip
  pogkit create-bundles addons.csv -o bundles.zip --issues issues.csv")]
    CreateBundles {
        /// Table file (xlsx, xls, ods, csv)
        table: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Append services to existing service bundles (Addons ID, Имя услуги, ID услуги)
    #[command(after_help = "\
Examples:
  pogkit add-entries export.zip services.xlsx -o export-new.zip
  pogkit add-entries export.zip services.csv -o out.zip --skipped skipped.csv --json")]
    AddEntries {
        /// Input archive (zip)
        archive: PathBuf,
        /// Table file
        table: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Expire services in service bundles (json_id, service_id)
    #[command(after_help = "\
Examples:
  pogkit expire-entries export.zip expire.csv -o export-new.zip")]
    ExpireEntries {
        archive: PathBuf,
        table: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Expire and add services across every service bundle (ID услуги, Имя услуги)
    #[command(after_help = "\
Examples:
  pogkit expire-and-add export.zip --expire old.xlsx --add new.xlsx -o export-new.zip")]
    ExpireAndAdd {
        archive: PathBuf,
        /// Table of services to expire
        #[arg(long)]
        expire: PathBuf,
        /// Table of services to add
        #[arg(long)]
        add: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Build one transition bundle from a table of offers (offer_id)
    #[command(after_help = "\
Examples:
  pogkit create-transition offers.csv --name \"Moves to Max\" --id T_MAX -o transition.zip")]
    CreateTransition {
        table: PathBuf,
        /// Display name of the bundle
        #[arg(long, default_value = "")]
        name: String,
        /// Bundle id (also the file name)
        #[arg(long)]
        id: String,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Append one offer to transition bundles listed in a table (json_id)
    #[command(after_help = "\
Examples:
  pogkit add-transition export.zip targets.csv --offer-id TP_NEW -o export-new.zip")]
    AddTransition {
        archive: PathBuf,
        table: PathBuf,
        /// Offer appended to every listed bundle
        #[arg(long)]
        offer_id: String,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Expire offers in transition bundles (json_id, offer_id)
    #[command(after_help = "\
Examples:
  pogkit expire-transition export.zip expire.csv -o export-new.zip")]
    ExpireTransition {
        archive: PathBuf,
        table: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Build category documents from a table (offer_id, category_id)
    #[command(after_help = "\
Examples:
  pogkit categories categories.xlsx -o categories.zip")]
    Categories {
        table: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  pogkit-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = settings::resolve(cli.config.as_deref(), cli.locale.as_deref())
        .and_then(|config| commands::dispatch(&config, cli.command));

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
