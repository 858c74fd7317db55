use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ethicaldrive_core::app::{AnalyzerBuilder, BatchItem, DecisionTally};
use ethicaldrive_core::config::{AppConfig, NarratorMode};
use ethicaldrive_core::domain::{
    EthicalDriveError, MediaError, PerceptionSnapshot, RawPerception, VideoClip, Vocabulary,
    scenario,
};

mod render;

#[derive(Debug, Parser)]
#[command(
    name = "ethicaldrive",
    version,
    about = "Rule-based ethical decisions for driving scenarios"
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the built-in sample scenarios.
    Scenarios {
        #[arg(long)]
        json: bool,
    },
    /// Decide and narrate one snapshot.
    Analyze(AnalyzeArgs),
    /// Analyze every built-in scenario concurrently.
    Batch {
        /// Use the template narrator regardless of config.
        #[arg(long)]
        offline: bool,
        #[arg(long)]
        json: bool,
    },
    /// Ask the narrative generator to assess a video clip.
    Video {
        path: PathBuf,
        /// MIME type; guessed from the extension when omitted.
        #[arg(long)]
        mime: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Built-in scenario id (default: the first scenario).
    #[arg(long, conflicts_with_all = ["file", "object", "signal"])]
    scenario: Option<String>,

    /// JSON perception record with `objects`, `positions`, `signals`, `context`.
    #[arg(long, conflicts_with_all = ["object", "signal"])]
    file: Option<PathBuf>,

    /// Detected object tag (repeatable).
    #[arg(long = "object")]
    object: Vec<String>,

    /// Active signal tag (repeatable).
    #[arg(long = "signal")]
    signal: Vec<String>,

    /// Position label (repeatable, informational).
    #[arg(long = "position")]
    position: Vec<String>,

    #[arg(long, default_value = "")]
    context: String,

    /// Tag vocabulary version (v1 has no `animal`).
    #[arg(long)]
    vocabulary: Option<Vocabulary>,

    /// Use the template narrator regardless of config.
    #[arg(long)]
    offline: bool,

    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ethicaldrive_core=info,ethicaldrive=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Scenarios { json } => {
            let catalog = scenario::catalog();
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                print!("{}", render::scenario_list(&catalog));
            }
        }
        Command::Analyze(args) => analyze(config, args).await?,
        Command::Batch { offline, json } => batch(config, offline, json).await?,
        Command::Video { path, mime, json } => video(config, &path, mime.as_deref(), json).await?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, EthicalDriveError> {
    let config = match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let config = config.apply_env()?;
    info!(
        narrator = ?config.narrator.mode,
        vocabulary = %config.vocabulary,
        "configuration loaded"
    );
    Ok(config)
}

fn offline(mut config: AppConfig, offline: bool) -> AppConfig {
    if offline {
        config.narrator.mode = NarratorMode::Template;
    }
    config
}

async fn analyze(config: AppConfig, args: AnalyzeArgs) -> Result<()> {
    let vocabulary = args.vocabulary.unwrap_or(config.vocabulary);
    let (scenario_id, snapshot) = snapshot_from_args(&args, vocabulary)?;

    let analyzer = AnalyzerBuilder::from_config(&offline(config, args.offline))?.build()?;
    let pending = analyzer.start(scenario_id.as_deref(), &snapshot);

    if args.json {
        let report = pending.finish().await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // the decision is shown before the narrator is awaited
    print!(
        "{}",
        render::perception(pending.scenario_id(), pending.perception())
    );
    print!("{}", render::decision(pending.decision()));
    std::io::stdout().flush()?;

    let report = pending.finish().await;
    print!("{}", render::narrative(&report));
    Ok(())
}

fn snapshot_from_args(
    args: &AnalyzeArgs,
    vocabulary: Vocabulary,
) -> Result<(Option<String>, PerceptionSnapshot), EthicalDriveError> {
    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path).map_err(|source| EthicalDriveError::Read {
            path: path.display().to_string(),
            source,
        })?;
        return Ok((None, PerceptionSnapshot::from_json(&text, vocabulary)?));
    }

    if !args.object.is_empty() || !args.signal.is_empty() {
        let raw = RawPerception {
            objects: args.object.clone(),
            positions: args.position.clone(),
            signals: args.signal.clone(),
            context: args.context.clone(),
        };
        return Ok((None, PerceptionSnapshot::from_raw(&raw, vocabulary)?));
    }

    let selected = match &args.scenario {
        Some(id) => {
            scenario::find(id).ok_or_else(|| EthicalDriveError::UnknownScenario(id.clone()))?
        }
        None => scenario::default_scenario(),
    };
    Ok((Some(selected.id.to_string()), selected.perception))
}

/// Load a clip from disk, guessing the MIME type from the extension if needed.
fn read_clip(path: &Path, mime: Option<&str>) -> Result<VideoClip, EthicalDriveError> {
    let mime = match mime {
        Some(mime) => mime,
        None => {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
            VideoClip::mime_for_extension(ext)
                .ok_or_else(|| MediaError::UnknownExtension(path.display().to_string()))?
        }
    };
    let bytes = std::fs::read(path).map_err(|source| EthicalDriveError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(VideoClip::from_bytes(mime, &bytes)?)
}

async fn batch(config: AppConfig, offline_only: bool, json: bool) -> Result<()> {
    let analyzer = AnalyzerBuilder::from_config(&offline(config, offline_only))?.build()?;
    let items: Vec<BatchItem> = scenario::catalog().into_iter().map(BatchItem::from).collect();

    let reports = analyzer.analyze_batch(items).await;
    let tally = DecisionTally::from_reports(&reports);

    if json {
        let out = serde_json::json!({ "reports": reports, "tally": tally });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for report in &reports {
            print!("{}", render::report(report));
            println!();
        }
        print!("{}", render::tally(&tally));
    }
    Ok(())
}

async fn video(config: AppConfig, path: &Path, mime: Option<&str>, json: bool) -> Result<()> {
    let clip = read_clip(path, mime)?;

    if config.narrator.mode == NarratorMode::Template {
        info!("template narrator cannot watch video; the result will be a placeholder");
    }
    let analyzer = AnalyzerBuilder::from_config(&config)?.build()?;
    let report = analyzer.assess_video(&clip).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::video(&report));
    }
    Ok(())
}
