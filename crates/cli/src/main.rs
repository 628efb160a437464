use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use debuginfo::commands::{
    functions_command, init_project_command, list_parsers_command, parse_command,
    project_info_command, runs_command, types_command, view_info_command, ParseOptions,
    ReportFormat,
};
use debuginfo::logging::{init_logging, resolve_format, LogLevel};

/// Debug-info parser registry and analysis database CLI.
///
/// This CLI is a thin wrapper around `debuginfo-core` (exposed in code as
/// `debuginfo_core`). All substantive logic lives in the library.
#[derive(Parser, Debug)]
#[command(
    name = "debuginfo",
    version,
    about = "Run debug-info parsers over native binaries and record what they find",
    long_about = None
)]
struct Cli {
    /// Log level (error, warn, info, debug, trace). Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (pretty or json). Defaults to DEBUGINFO_LOG_FORMAT, then pretty.
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered debug-info parsers.
    Parsers {
        /// Also report whether each parser accepts this binary.
        #[arg(long)]
        binary: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show what the binary view sees in a file: format, sections, symbols.
    ViewInfo {
        #[arg(long)]
        binary: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Initialize a new project at the given root.
    ///
    /// This will:
    /// - Create a `.debuginfo` metadata directory and `reports` directory.
    /// - Write `.debuginfo/project.json` and create the project database.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show basic information about an existing project.
    ProjectInfo {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run debug-info parsers over a binary and record the results.
    Parse {
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the binary to parse.
        #[arg(long)]
        binary: String,

        /// Name to record the binary under. Defaults to the file name.
        #[arg(long)]
        name: Option<String>,

        /// Parser to run; repeat to run several in order. Defaults to the
        /// project's default parsers, then every parser valid for the binary.
        #[arg(long = "parser")]
        parsers: Vec<String>,

        /// Do not write results to the project database.
        #[arg(long, default_value_t = false)]
        no_persist: bool,

        /// Write `reports/<binary>.debuginfo.<ext>`.
        #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "json")]
        report: Option<ReportFormat>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List functions recorded for a binary.
    Functions {
        #[arg(long, default_value = ".")]
        root: String,

        /// Recorded binary name.
        #[arg(long)]
        binary: String,

        /// Only show results from this parser's latest run.
        #[arg(long)]
        parser: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List types recorded for a binary.
    Types {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        binary: String,

        #[arg(long)]
        parser: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List recorded parse runs.
    Runs {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        binary: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .as_deref()
        .map(|l| l.parse::<LogLevel>().map_err(|e| anyhow!(e)))
        .transpose()?;
    init_logging(level, resolve_format(cli.log_format.as_deref())?)?;

    match cli.command {
        Command::Parsers { binary, json } => list_parsers_command(binary.as_deref(), json)?,
        Command::ViewInfo { binary, json } => view_info_command(&binary, json)?,
        Command::InitProject { root, name } => init_project_command(&root, name)?,
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::Parse { root, binary, name, parsers, no_persist, report, json } => {
            parse_command(&ParseOptions {
                root,
                binary,
                name,
                parsers,
                persist: !no_persist,
                report,
                json,
            })?
        }
        Command::Functions { root, binary, parser, json } => {
            functions_command(&root, &binary, parser.as_deref(), json)?
        }
        Command::Types { root, binary, parser, json } => {
            types_command(&root, &binary, parser.as_deref(), json)?
        }
        Command::Runs { root, binary, json } => runs_command(&root, binary.as_deref(), json)?,
    }

    Ok(())
}
