//! CLI binary for generating, building, and funding Solana smart contracts.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use swarm_agent::AgentConfig;
use swarm_llm::{CostTrackingMiddleware, LlmClient, LoggingMiddleware, OpenAiAdapter};
use swarm_pipeline::{
    standard_agents, ContractPipeline, PipelineConfig, PipelineEvent, PipelineRun, StagePlan,
};
use swarm_toolchain::{BuildReport, BuildRunner, INSTALL_HINT};
use swarm_types::{RunStatus, StageName};
use swarm_wallet::{SolanaRpcClient, WalletManager};

use crate::config::{parse_temperature, SwarmConfig};

const EXAMPLE_REQUIREMENTS: &str = "Create a token vesting contract with the following features:
- Linear vesting over 12 months
- Cliff period of 3 months
- Emergency pause functionality
- Admin controls for vesting schedule modification";

#[derive(Parser)]
#[command(name = "swarm", version, about = "Generate Solana smart contracts with a swarm of LLM agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the .env file used for configuration
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: analyze, design, generate, audit, test, build
    Generate {
        /// Contract requirements (defaults to a token vesting example)
        requirements: Option<String>,

        /// Read requirements from a file
        #[arg(short, long, conflicts_with = "requirements")]
        file: Option<PathBuf>,

        /// Write the run record as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Anchor project directory
        #[arg(long, default_value = "program")]
        project_dir: PathBuf,

        /// Model name (overrides SWARM_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature in [0, 2] (overrides SWARM_TEMPERATURE)
        #[arg(long, value_parser = parse_temperature)]
        temperature: Option<f32>,

        /// Don't run `anchor init` or touch Anchor.toml
        #[arg(long)]
        skip_init: bool,
    },

    /// Build and test an existing Anchor project
    Build {
        /// Anchor project directory
        #[arg(long, default_value = "program")]
        project_dir: PathBuf,
    },

    /// Generate a wallet and request a devnet airdrop
    Wallet {
        /// Directory for wallet.json
        #[arg(long, default_value = "wallet")]
        wallet_dir: PathBuf,

        /// Skip the devnet airdrop
        #[arg(long)]
        no_airdrop: bool,
    },

    /// Show the pipeline stages
    Stages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Generate {
            requirements,
            file,
            output,
            project_dir,
            model,
            temperature,
            skip_init,
        } => {
            let mut config = SwarmConfig::load(&cli.env_file).await?;
            if let Some(model) = model {
                config.model = model;
            }
            let temperature = match temperature {
                Some(t) => t,
                None => config.temperature()?,
            };
            let requirements = resolve_requirements(requirements, file.as_deref()).await?;
            let pipeline_config = PipelineConfig {
                project_dir,
                init_project: !skip_init,
                ..PipelineConfig::default()
            };
            cmd_generate(
                &config,
                temperature,
                pipeline_config,
                &requirements,
                output.as_deref(),
            )
            .await?;
        }
        Commands::Build { project_dir } => {
            let config = SwarmConfig::load(&cli.env_file).await?;
            cmd_build(&config, &project_dir).await?;
        }
        Commands::Wallet {
            wallet_dir,
            no_airdrop,
        } => {
            let config = SwarmConfig::load(&cli.env_file).await?;
            cmd_wallet(&config, wallet_dir, cli.env_file, no_airdrop).await?;
        }
        Commands::Stages => {
            cmd_stages();
        }
    }

    Ok(())
}

async fn resolve_requirements(arg: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(text) = arg {
        return Ok(text);
    }
    if let Some(path) = file {
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()));
    }
    Ok(EXAMPLE_REQUIREMENTS.to_string())
}

// ---- generate ----

async fn cmd_generate(
    config: &SwarmConfig,
    temperature: f32,
    pipeline_config: PipelineConfig,
    requirements: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut adapter = OpenAiAdapter::new(config.require_api_key()?.to_string());
    if let Some(url) = &config.openai_base_url {
        adapter = adapter.with_base_url(url.clone());
    }
    let cost = CostTrackingMiddleware::new();
    let client = LlmClient::new()
        .with_middleware(LoggingMiddleware)
        .with_middleware(cost.clone())
        .with_provider(adapter);

    let agent_config = AgentConfig {
        model: config.model.clone(),
        temperature,
        max_tokens: None,
    };
    let mut pipeline = ContractPipeline::local(
        standard_agents(Arc::new(client), &agent_config),
        pipeline_config,
    )?
    .with_toolchain_program(config.anchor_bin.clone());

    tracing::info!(
        model = %config.model,
        temperature,
        project = %pipeline.config().project_dir.display(),
        toolchain = pipeline.toolchain_program(),
        "Starting contract generation"
    );

    let mut rx = pipeline.events().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            print_progress(&event);
        }
    });

    let run = pipeline.process(requirements).await;
    drop(pipeline);
    let _ = printer.await;

    print_summary(&run);
    println!(
        "\nTokens: {} in, {} out across {} requests",
        cost.total_input_tokens(),
        cost.total_output_tokens(),
        cost.request_count()
    );

    if let Some(path) = output {
        tokio::fs::write(path, run.to_json()?).await?;
        println!("Run record written to {}", path.display());
    }

    match &run.status {
        RunStatus::Completed => Ok(()),
        RunStatus::Failed { step, reason } => anyhow::bail!("pipeline stopped at {step}: {reason}"),
    }
}

fn print_progress(event: &PipelineEvent) {
    match event {
        PipelineEvent::StageStarted { stage, .. } => {
            let label = match stage {
                StageName::TechnicalSpecs => "Analyzing requirements...",
                StageName::Architecture => "Designing contract architecture...",
                StageName::ContractCode => "Generating smart contract code...",
                StageName::SecurityAudit => "Performing security audit...",
                StageName::TestCases => "Generating test cases...",
                StageName::Requirements => return,
            };
            println!("\n{label}");
        }
        PipelineEvent::StageFailed { stage, error } => {
            println!("  {stage} failed: {error}");
        }
        PipelineEvent::ArtifactWritten { path } => {
            println!("\nContract code written to {}", path.display());
        }
        PipelineEvent::BuildFinished { passed: true } => {
            println!("\nSmart contract successfully created and validated!");
        }
        PipelineEvent::BuildFinished { passed: false } => {
            println!("\nWarning: Contract validation failed. Please review the output.");
        }
        _ => {}
    }
}

fn print_summary(run: &PipelineRun) {
    println!("\nRun {}", run.run_id);
    for (name, value) in run.stages.iter() {
        match value {
            Some(text) => println!("  {:<16} {} chars", name.as_str(), text.len()),
            None => println!("  {:<16} -", name.as_str()),
        }
    }
    match &run.status {
        RunStatus::Completed => println!("Status: completed"),
        RunStatus::Failed { step, reason } => println!("Status: failed at {step} ({reason})"),
    }
    match run.build_passed {
        Some(true) => println!("Build: passed"),
        Some(false) => println!("Build: failed"),
        None => println!("Build: not run"),
    }
}

// ---- build ----

async fn cmd_build(config: &SwarmConfig, project_dir: &Path) -> anyhow::Result<()> {
    let runner = BuildRunner::local().with_program(config.anchor_bin.clone());
    match runner.report(project_dir).await {
        BuildReport::Passed => {
            println!("Build and tests passed");
            Ok(())
        }
        BuildReport::ToolchainMissing => {
            anyhow::bail!("'{}' not found. Install it with '{INSTALL_HINT}'", runner.program())
        }
        BuildReport::Failed {
            step,
            exit_code,
            stderr,
        } => {
            eprintln!("{stderr}");
            anyhow::bail!("'{} {step}' exited with code {exit_code}", runner.program())
        }
    }
}

// ---- wallet ----

async fn cmd_wallet(
    config: &SwarmConfig,
    wallet_dir: PathBuf,
    env_file: PathBuf,
    no_airdrop: bool,
) -> anyhow::Result<()> {
    let funding = SolanaRpcClient::new(config.solana_rpc_url()?)?;
    let manager = WalletManager::new(wallet_dir, env_file, Arc::new(funding));

    println!("Generating new Solana wallet...");
    let wallet = manager.generate_wallet().await?;
    println!("\nWallet generated successfully!");
    println!("Public Key: {}", wallet.public_key);
    println!("Private Key: {}", wallet.private_key);
    println!(
        "\nCredentials have been saved to {} and updated in {}",
        manager.wallet_path().display(),
        manager.env_path().display()
    );

    if !no_airdrop {
        println!("\nRequesting devnet SOL airdrop...");
        if manager.fund_wallet_devnet(&wallet.public_key).await {
            println!("Airdrop requested successfully!");
        }
    }

    println!("\nWallet is ready for use with the smart contract swarm!");
    Ok(())
}

// ---- stages ----

fn cmd_stages() {
    println!("{:<16} {:<22} INPUT", "STAGE", "AGENT");
    for spec in StagePlan::standard().stages() {
        println!(
            "{:<16} {:<22} {}",
            spec.name.as_str(),
            spec.role.display_name(),
            spec.input
        );
    }
}
