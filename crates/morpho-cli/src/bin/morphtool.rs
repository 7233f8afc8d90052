use std::path::PathBuf;

use clap::{Parser, Subcommand};

use morpho_cli::commands::analyze_ops::{self, AnalyzeFlags};
use morpho_cli::commands::config_ops;
use morpho_cli::trace_init::init_tracing;

#[derive(Parser)]
#[command(name = "morphtool", about = "Lattice morphological analyzer")]
struct Cli {
    /// Write JSON trace lines to this directory (needs --features trace)
    #[arg(long, global = true)]
    trace_dir: Option<PathBuf>,

    /// Settings TOML to use instead of the built-in defaults
    #[arg(long, global = true)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Segment text and print the best path
    Analyze {
        /// Dictionary CSV (surface,left_id,right_id,cost,feature...)
        dict_file: String,
        /// Connection matrix definition
        conn_file: String,
        /// Text to analyze
        text: String,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
        /// Also list every node on some complete path
        #[arg(long)]
        all_morphs: bool,
        /// Attach marginal probabilities to each morpheme
        #[arg(long)]
        marginal: bool,
    },
    /// Print the N best segmentations
    Nbest {
        /// Dictionary CSV (surface,left_id,right_id,cost,feature...)
        dict_file: String,
        /// Connection matrix definition
        conn_file: String,
        /// Text to analyze
        text: String,
        /// Number of paths (default: [nbest] default_n from settings)
        #[arg(short, long)]
        n: Option<usize>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.trace_dir.as_deref());
    if let Some(file) = &cli.settings {
        config_ops::settings_load(file);
    }

    match cli.command {
        Command::Analyze {
            dict_file,
            conn_file,
            text,
            json,
            all_morphs,
            marginal,
        } => {
            let flags = AnalyzeFlags {
                json,
                all_morphs,
                marginal,
            };
            analyze_ops::analyze_cmd(&dict_file, &conn_file, &text, flags)
        }
        Command::Nbest {
            dict_file,
            conn_file,
            text,
            n,
            json,
        } => analyze_ops::nbest_cmd(&dict_file, &conn_file, &text, n, json),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
