//! BotBoundary CLI - Command-line interface for the risk decision engine
//!
//! Commands:
//! - score: Evaluate a telemetry record and print the decision
//! - encode: Print the feature vector for a telemetry record

use clap::{Parser, Subcommand};
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use botboundary_engine::{
    EngineConfig, EngineError, FeatureEncoder, RiskEngine, Thresholds, ENGINE_VERSION,
    FEATURE_ORDER,
};

/// BotBoundary - Behavioral risk decision engine
#[derive(Parser)]
#[command(name = "botboundary")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score login-attempt telemetry into allow/challenge/deny", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a telemetry record and print the decision as JSON
    Score {
        /// Telemetry JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Root directory of trained artifacts
        #[arg(long, default_value = "saved_models")]
        model_dir: PathBuf,

        /// Treat the attempt as an enrolled user with this id
        #[arg(long)]
        user_id: Option<String>,

        /// Allow threshold on the normalized risk scale
        #[arg(long, default_value_t = 0.80)]
        allow_threshold: f64,

        /// Challenge threshold on the normalized risk scale
        #[arg(long, default_value_t = 0.95)]
        challenge_threshold: f64,
    },

    /// Print the 28-dimensional feature vector for a telemetry record
    Encode {
        /// Telemetry JSON file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Print one "path: value" line per feature instead of a JSON array
        #[arg(long)]
        labeled: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            match err {
                // Rejections carry meaning for scripts driving the CLI
                EngineError::ModelNotFound { .. } => ExitCode::from(3),
                EngineError::MalformedRequest(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(command: Commands) -> Result<(), EngineError> {
    match command {
        Commands::Score {
            input,
            model_dir,
            user_id,
            allow_threshold,
            challenge_threshold,
        } => {
            let telemetry = read_json(&input)?;
            let mut config = EngineConfig::new(model_dir);
            config.thresholds = Thresholds::new(allow_threshold, challenge_threshold)?;
            let engine = RiskEngine::new(config);

            let registered_user = user_id.is_some();
            let assessment =
                engine.evaluate_telemetry(&telemetry, registered_user, user_id.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
            Ok(())
        }

        Commands::Encode { input, labeled } => {
            let telemetry = read_json(&input)?;
            let vector = FeatureEncoder::encode(&telemetry);
            if labeled {
                for (path, value) in FEATURE_ORDER.iter().zip(vector.as_slice()) {
                    println!("{}: {}", path, value);
                }
            } else {
                println!("{}", serde_json::to_string(vector.as_slice())?);
            }
            Ok(())
        }
    }
}

fn read_json(path: &PathBuf) -> Result<serde_json::Value, EngineError> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}
