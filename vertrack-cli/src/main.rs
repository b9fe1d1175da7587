mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use config::ConfigMerger;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;
use vertrack_core::persist::render_build_info;
use vertrack_core::{Exporter, builtin_registry};
use vertrack_types::build::{BuildOptions, BuildResult, BuildSummary};

#[derive(Debug, Parser)]
#[command(
    name = "vertrack",
    version,
    about = "Record the versions of SDKs integrated into a project build."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Export a full build-info snapshot for a finished build.
    ExportBuildInfo(ExportBuildInfoArgs),
    /// Export the resolved component list only.
    ExportSdkInfo(ProjectArgs),
    /// Print a previously exported build-info snapshot.
    ReadBuildInfo(ReadBuildInfoArgs),
    /// List registered components and where their versions come from.
    ListComponents(ListComponentsArgs),
}

#[derive(Debug, Args)]
struct ProjectArgs {
    /// Project root holding vertrack.toml and the asset tree (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Output folder created next to the asset tree (overrides [output].tool_dir).
    #[arg(long)]
    tool_dir: Option<String>,

    /// Seconds to wait for asynchronous host operations (overrides [output].drain_timeout_secs).
    #[arg(long)]
    drain_timeout_secs: Option<u64>,
}

#[derive(Debug, Args)]
struct ExportBuildInfoArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Target platform of the build, e.g. "Android" or "iOS".
    #[arg(long)]
    platform: String,

    /// Platform group for per-group settings (default: same as --platform).
    #[arg(long)]
    group: Option<String>,

    /// Build option flags (none, development, lz4, lz4hc); repeatable.
    #[arg(long = "option", value_parser = parse_build_option)]
    options: Vec<BuildOptions>,

    /// Final state of the build.
    #[arg(long, value_enum, default_value = "succeeded")]
    result: ResultArg,
}

#[derive(Debug, Args)]
struct ReadBuildInfoArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Platform whose snapshot to read.
    #[arg(long)]
    platform: String,
}

#[derive(Debug, Args)]
struct ListComponentsArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ResultArg {
    Succeeded,
    Failed,
    Cancelled,
    Unknown,
}

impl From<ResultArg> for BuildResult {
    fn from(value: ResultArg) -> Self {
        match value {
            ResultArg::Succeeded => BuildResult::Succeeded,
            ResultArg::Failed => BuildResult::Failed,
            ResultArg::Cancelled => BuildResult::Cancelled,
            ResultArg::Unknown => BuildResult::Unknown,
        }
    }
}

fn parse_build_option(s: &str) -> Result<BuildOptions, String> {
    BuildOptions::from_name(s)
        .ok_or_else(|| format!("unknown build option '{s}' (expected none, development, lz4, lz4hc)"))
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::ExportBuildInfo(args) => cmd_export_build_info(args),
        Command::ExportSdkInfo(args) => cmd_export_sdk_info(args),
        Command::ReadBuildInfo(args) => cmd_read_build_info(args),
        Command::ListComponents(args) => cmd_list_components(args),
    }
}

fn exporter(args: &ProjectArgs) -> anyhow::Result<Exporter> {
    let file_config = config::load_or_default(&args.project_root)
        .with_context(|| format!("load config from {}", args.project_root))?;
    let merged = ConfigMerger::new(file_config).merge_cli_args(
        &args.project_root,
        args.tool_dir.as_deref(),
        args.drain_timeout_secs,
        std::io::stderr().is_terminal(),
    );
    debug!(settings = ?merged.export, "export settings");

    let registry = builtin_registry().context("build component registry")?;
    Ok(Exporter::new(
        merged.export,
        Arc::new(merged.provider),
        registry,
        merged.host,
    ))
}

fn cmd_export_build_info(args: ExportBuildInfoArgs) -> anyhow::Result<()> {
    let exporter = Arc::new(exporter(&args.project)?);

    let group = args.group.unwrap_or_else(|| args.platform.clone());
    let mut summary = BuildSummary::new(args.platform, group);
    summary.options = args
        .options
        .into_iter()
        .fold(BuildOptions::NONE, |acc, opt| acc | opt);
    summary.result = args.result.into();

    let Some(handle) = exporter.on_build_finished(summary) else {
        warn!("nothing exported");
        return Ok(());
    };
    let exported = handle
        .join()
        .map_err(|_| anyhow::anyhow!("export thread panicked"))?;
    let path = exported.context("build info export failed")?;
    println!("{}", path);
    Ok(())
}

fn cmd_export_sdk_info(args: ProjectArgs) -> anyhow::Result<()> {
    let exporter = exporter(&args)?;
    let path = exporter
        .export_sdk_info()
        .context("sdk info export failed")?;
    println!("{}", path);
    Ok(())
}

fn cmd_read_build_info(args: ReadBuildInfoArgs) -> anyhow::Result<()> {
    let exporter = exporter(&args.project)?;
    let snapshot = exporter
        .read_build_info(&args.platform)
        .with_context(|| format!("no readable build info for {}", args.platform))?;
    println!("{}", render_build_info(&snapshot)?);
    Ok(())
}

fn cmd_list_components(args: ListComponentsArgs) -> anyhow::Result<()> {
    let registry = builtin_registry().context("build component registry")?;

    match args.format {
        OutputFormat::Text => {
            println!("Registered components:\n");
            println!("  {:<20} {:<12} SOURCE", "NAME", "PROBE");
            println!("  {:<20} {:<12} ------", "----", "-----");
            for info in registry.infos() {
                println!(
                    "  {:<20} {:<12} {}",
                    info.name, info.version_source.kind, info.version_source.source
                );
                if let Some(sub) = &info.sub_versions_source {
                    println!("  {:<20} {:<12} {}", "", sub.kind, sub.source);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&registry.infos())?);
        }
    }
    Ok(())
}
