#![forbid(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use study_engines::modality::{balance_session, ModalityStrategy};
use study_engines::rng::session_rng;
use study_engines::seed::{SeedAlgorithm, SeedGenerator};
use study_kernel_contracts::participant::ParticipantId;
use study_kernel_contracts::scenario::ScenarioId;
use study_os::config::StudyConfig;
use study_os::{prepare_session, start_runner};
use study_storage::{
    upload_session, JsonFileStore, PersistenceAdapter, RealtimeDbConfig, RealtimeDbStore,
};

use crate::error::{Result, ToolError};
use crate::simulate::play_session;

#[derive(Debug, Parser)]
#[command(
    name = "study",
    about = "Stimulus assignment and trial sequencing for the hiring-perception study",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print one participant's session timeline as JSON.
    Plan(SessionArgs),

    /// Play a participant through the session and upload the records.
    Simulate(SimulateArgs),

    /// Show the values derived from a participant id.
    Inspect(InspectArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// Participant id; generated when omitted.
    #[arg(long)]
    pub pid: Option<String>,

    /// Seed for the session RNG.
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON study configuration; pilot defaults when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// One JSON document per participant in --out.
    Json,
    /// Realtime database configured through STUDY_RTDB_URL.
    Remote,
}

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Directory for stored documents and the CSV fallback.
    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = StoreKind::Json)]
    pub store: StoreKind,
}

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    #[arg(long)]
    pub pid: String,

    #[arg(long, value_enum, default_value_t = SeedAlgorithmArg::Rolling31)]
    pub seed_algorithm: SeedAlgorithmArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeedAlgorithmArg {
    Rolling31,
    Sha256,
}

impl From<SeedAlgorithmArg> for SeedAlgorithm {
    fn from(arg: SeedAlgorithmArg) -> Self {
        match arg {
            SeedAlgorithmArg::Rolling31 => SeedAlgorithm::Rolling31,
            SeedAlgorithmArg::Sha256 => SeedAlgorithm::Sha256,
        }
    }
}

pub fn run_from_env(out: &mut dyn Write) -> Result<()> {
    let cli = Cli::parse();
    run(cli, out)
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Commands::Plan(args) => run_plan(&args, out),
        Commands::Simulate(args) => run_simulate(&args, out),
        Commands::Inspect(args) => run_inspect(&args, out),
    }
}

/// File (or pilot defaults), then environment overrides, then `--seed`.
pub fn load_config(args: &SessionArgs) -> Result<StudyConfig> {
    let mut cfg = match &args.config {
        Some(path) => StudyConfig::from_json_file(path)?,
        None => StudyConfig::pilot_v1(),
    };
    cfg.apply_env_overrides();
    if args.seed.is_some() {
        cfg.rng_seed = args.seed;
    }
    Ok(cfg)
}

fn write_json(out: &mut dyn Write, value: &serde_json::Value) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run_plan(args: &SessionArgs, out: &mut dyn Write) -> Result<()> {
    let cfg = load_config(args)?;
    let (session, timeline) = prepare_session(cfg, args.pid.as_deref())?;
    write_json(
        out,
        &json!({
            "session": serde_json::to_value(&session)?,
            "timeline": serde_json::to_value(&timeline)?,
        }),
    )
}

fn open_store(args: &SimulateArgs) -> Result<Box<dyn PersistenceAdapter>> {
    match args.store {
        StoreKind::Json => Ok(Box::new(JsonFileStore::new(&args.out))),
        StoreKind::Remote => {
            let cfg = RealtimeDbConfig::from_env()
                .ok_or_else(|| ToolError::invalid("--store remote needs STUDY_RTDB_URL"))?;
            Ok(Box::new(RealtimeDbStore::new(cfg)?))
        }
    }
}

fn run_simulate(args: &SimulateArgs, out: &mut dyn Write) -> Result<()> {
    let cfg = load_config(&args.session)?;
    let mode = cfg.audio.mode;
    let answer_seed = cfg.rng_seed.map(|s| s.wrapping_add(1));
    let mut store = open_store(args)?;
    let (_, mut runner) = start_runner(cfg, args.session.pid.as_deref())?;
    let ratings = play_session(&mut runner, mode, &mut session_rng(answer_seed))?;
    let report = upload_session(runner.ledger_mut(), store.as_mut(), &args.out)?;
    write_json(
        out,
        &json!({
            "ratings": ratings,
            "report": serde_json::to_value(&report)?,
            "message": report.outcome.participant_message(),
        }),
    )
}

fn run_inspect(args: &InspectArgs, out: &mut dyn Write) -> Result<()> {
    let id = ParticipantId::new(args.pid.as_str())?;
    let generator = SeedAlgorithm::from(args.seed_algorithm).generator();
    let hash = SeedGenerator::participant_hash(generator.as_ref(), &id);
    // Hash-derived balancing never draws from the RNG.
    let modality = balance_session(ModalityStrategy::HashDerived, hash, &mut session_rng(Some(0)))?;
    let orientation: serde_json::Map<String, serde_json::Value> = ScenarioId::ALL
        .iter()
        .filter_map(|id| modality.get(*id).map(|m| (id.as_str().to_string(), json!(m.as_str()))))
        .collect();
    write_json(
        out,
        &json!({
            "participant_id": id,
            "hash": hash.0,
            "fixed_variant": hash.fixed_variant().get(),
            "hash_derived_modality": orientation,
        }),
    )
}
