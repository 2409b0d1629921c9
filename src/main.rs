use azul_analyzer::logging::setup_logging;
use azul_analyzer::neural::NeuralEvaluator;
use azul_analyzer::quality::SearchBudget;
use azul_analyzer::recording::CsvWriter;
use azul_analyzer::services::{AnalysisMode, BatchRequest, SessionManager};
use azul_analyzer::{analyze, AnalysisConfig, AnalysisRequest, AnalyzerError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeCli {
    Quick,
    Standard,
    Deep,
    Exhaustive,
}

impl From<ModeCli> for AnalysisMode {
    fn from(cli: ModeCli) -> Self {
        match cli {
            ModeCli::Quick => AnalysisMode::Quick,
            ModeCli::Standard => AnalysisMode::Standard,
            ModeCli::Deep => AnalysisMode::Deep,
            ModeCli::Exhaustive => AnalysisMode::Exhaustive,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "azul_analyzer", version, about = "Move-quality analysis for Azul positions")]
struct Cli {
    /// JSON analysis configuration; flags below override it
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write rotated log files to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Policy/value network weights (safetensors)
    #[arg(long)]
    weights: Option<String>,

    /// Use a seeded untrained network when no weights are available
    #[arg(long, default_value_t = false)]
    allow_untrained: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one position and print the verdict as JSON
    Analyze {
        /// Position notation
        #[arg(short = 'p', long)]
        position: String,

        /// Player to analyse for (must be the player to move)
        #[arg(long, default_value_t = 0)]
        player: usize,

        /// Alpha-beta target depth
        #[arg(long)]
        depth: Option<u8>,

        /// Alpha-beta time limit in milliseconds
        #[arg(long)]
        time_ms: Option<u64>,

        /// MCTS rollouts
        #[arg(long)]
        rollouts: Option<u32>,

        /// Number of alternatives to report (default 3, at most 5)
        #[arg(long)]
        alternatives: Option<usize>,

        /// Skip alternatives
        #[arg(long, default_value_t = false)]
        no_alternatives: bool,
    },
    /// Analyse many positions with a worker pool and export CSV
    Batch {
        /// File with one position notation per line; random positions when absent
        #[arg(long)]
        positions_file: Option<PathBuf>,

        /// Number of positions
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,

        #[arg(long, value_enum, default_value = "standard")]
        mode: ModeCli,

        /// Worker threads
        #[arg(short = 'w', long)]
        workers: Option<usize>,

        /// Seed for sampled positions
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Directory for the CSV export
        #[arg(short = 'o', long, default_value = "analysis_results")]
        out_dir: PathBuf,

        /// Progress log interval in milliseconds
        #[arg(long, default_value_t = 1000)]
        poll_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_level, cli.log_dir.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => {
            log::info!("📂 Loading configuration from {}", path.display());
            AnalysisConfig::from_json_file(path)?
        }
        None => AnalysisConfig::default(),
    };
    if cli.weights.is_some() {
        config.neural.weights_path = cli.weights.clone();
    }
    config.neural.allow_untrained |= cli.allow_untrained;

    let evaluator = Arc::new(NeuralEvaluator::from_config(&config.neural));
    if !evaluator.is_available() {
        log::warn!("⚠️ Neural evaluator unavailable, running with search engines only");
    }

    match cli.command {
        Command::Analyze {
            position,
            player,
            depth,
            time_ms,
            rollouts,
            alternatives,
            no_alternatives,
        } => {
            let request = AnalysisRequest {
                position,
                player_index: player,
                search_budget: Some(SearchBudget {
                    max_depth: depth,
                    time_limit_ms: time_ms,
                    mcts_rollouts: rollouts,
                }),
                include_alternatives: Some(!no_alternatives),
                max_alternatives: alternatives,
            };
            let response = tokio::task::spawn_blocking(move || {
                analyze(&request, &config, Some(evaluator))
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Batch {
            positions_file,
            count,
            mode,
            workers,
            seed,
            out_dir,
            poll_ms,
        } => {
            let positions = match positions_file {
                Some(path) => std::fs::read_to_string(&path)?
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .map(String::from)
                    .collect(),
                None => Vec::new(),
            };
            let position_count = if positions.is_empty() {
                count
            } else {
                count.min(positions.len())
            };
            let request = BatchRequest {
                position_count,
                mode: mode.into(),
                max_workers: workers,
                positions,
                seed,
            };

            let manager = SessionManager::with_evaluator(evaluator);
            let mode_config = if cli.config.is_some() {
                config
            } else {
                request.mode.config()
            };
            let id = manager.start_batch_with_config(request, mode_config).await?;

            let progress = loop {
                tokio::time::sleep(Duration::from_millis(poll_ms.max(10))).await;
                let progress = manager
                    .progress(id)
                    .await
                    .ok_or_else(|| AnalyzerError::InvalidRequest(format!("lost session {}", id)))?;
                log::info!(
                    "⏳ {}/{} positions ({:.1}s)",
                    progress.positions_done,
                    progress.positions_total,
                    progress.elapsed_ms as f64 / 1000.0
                );
                if progress.status.is_finished() {
                    break progress;
                }
            };

            let results = manager.results(id).await?;
            let failures = results.iter().filter(|r| r.error.is_some()).count();
            let path = CsvWriter::new(&out_dir)?.write_session(id, &results)?;
            log::info!(
                "✅ Session {:?}: {} analysed, {} failed, results in {}",
                progress.status,
                results.len(),
                failures,
                path.display()
            );
        }
    }

    Ok(())
}
