//! Converge CLI entrypoint.
//!
//! This is the main entrypoint for the converge command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use converge::cli::{Cli, Commands, OutputFormatter};
use converge::config::{
    ConfigParser, ConfigValidator, ConvergeConfig, ProviderBackend, find_config_file,
};
use converge::error::{ConfigError, Result};
use converge::graph::DeclarationGraph;
use converge::provider::{CloudProvider, HttpCloud, InMemoryCloud};
use converge::reconciler::Reconciler;
use converge::target::{LiveTarget, Target, TerraformTarget};
use converge::tasks::ReconcileContext;
use converge::terraform::TerraformFormat;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. `RUST_LOG` takes precedence.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point. Returns whether the command fully succeeded.
async fn run(cli: Cli) -> Result<bool> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate { warnings } => cmd_validate(cli.config.as_ref(), warnings, &formatter),
        Commands::Plan { detailed } => cmd_plan(cli.config.as_ref(), detailed, &formatter).await,
        Commands::Apply { yes, fail_fast } => {
            cmd_apply(cli.config.as_ref(), yes, fail_fast, &formatter).await
        }
        Commands::Terraform { out, json } => {
            cmd_terraform(cli.config.as_ref(), out, json, &formatter).await
        }
    }
}

/// Validate the declaration.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let workspace = Workspace::load(config_path)?;
    let result = ConfigValidator::new().check(&workspace.config);

    if result.is_valid() {
        DeclarationGraph::from_config(&workspace.config)?.validate()?;
        eprintln!("{}", formatter.success("Configuration is valid!"));
    } else {
        for error in &result.errors {
            eprintln!("{}", formatter.error(&error.to_string()));
        }
    }

    if show_warnings {
        for warning in &result.warnings {
            eprintln!("{}", formatter.warning(warning));
        }
    }

    let config = &workspace.config;
    eprintln!("\nConfiguration summary:");
    eprintln!("  Project: {}", config.project.name);
    eprintln!("  VPCs: {}", config.vpcs.len());
    eprintln!("  Internet gateways: {}", config.internet_gateways.len());

    Ok(result.is_valid())
}

/// Show the reconciliation plan.
async fn cmd_plan(
    config_path: Option<&PathBuf>,
    detailed: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let workspace = Workspace::load_validated(config_path)?;
    let backend = workspace.backend().await?;
    let graph = DeclarationGraph::from_config(&workspace.config)?;

    let result = Reconciler::new(&graph, workspace.context(&backend))
        .reconcile(&mut Target::DryRun)
        .await?;

    eprintln!(
        "{}",
        formatter.format_plan(&result.plan(graph.project()), detailed)
    );
    for error in &result.errors {
        eprintln!("{}", formatter.error(error));
    }

    Ok(result.success)
}

/// Apply the declaration against the provider.
async fn cmd_apply(
    config_path: Option<&PathBuf>,
    auto_approve: bool,
    fail_fast: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let workspace = Workspace::load_validated(config_path)?;
    let backend = workspace.backend().await?;

    // Plan against a throwaway graph so ids discovered here do not leak into the apply run.
    let preview = DeclarationGraph::from_config(&workspace.config)?;
    let planned = Reconciler::new(&preview, workspace.context(&backend))
        .reconcile(&mut Target::DryRun)
        .await?;
    let plan = planned.plan(preview.project());

    if plan.is_empty() && planned.success {
        eprintln!("No changes to apply.");
        return Ok(true);
    }

    eprintln!("{}", formatter.format_plan(&plan, false));

    if !auto_approve {
        eprint!("Do you want to apply this plan? [y/N]: ");
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Apply cancelled.");
            return Ok(true);
        }
    }

    let graph = DeclarationGraph::from_config(&workspace.config)?;
    let mut target = Target::Live(LiveTarget::new(backend.provider()));
    let result = Reconciler::new(&graph, workspace.context(&backend))
        .with_fail_fast(fail_fast)
        .reconcile(&mut target)
        .await;

    backend.persist().await?;
    let result = result?;

    eprintln!("\n{}", formatter.format_reconciliation(&result));
    Ok(result.success)
}

/// Render the declaration as Terraform.
async fn cmd_terraform(
    config_path: Option<&PathBuf>,
    out: Option<PathBuf>,
    json: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let workspace = Workspace::load_validated(config_path)?;
    let backend = workspace.backend().await?;
    let graph = DeclarationGraph::from_config(&workspace.config)?;

    let mut target = Target::Terraform(TerraformTarget::new(backend.provider()));
    let result = Reconciler::new(&graph, workspace.context(&backend))
        .with_fail_fast(true)
        .reconcile(&mut target)
        .await?;

    let Target::Terraform(terraform) = target else {
        return Err(converge::error::ConvergeError::internal(
            "Terraform target was replaced during reconciliation",
        ));
    };

    let format = if json {
        TerraformFormat::Json
    } else {
        workspace.config.terraform.format
    };
    let out_dir =
        out.unwrap_or_else(|| workspace.parser.resolve_path(&workspace.config.terraform.output_dir));

    let writer = terraform.into_writer();
    let path = writer.write_to_dir(&out_dir, format).await?;

    eprintln!("{}", formatter.format_terraform(&path, writer.len()));
    Ok(result.success)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// A loaded declaration and the parser that resolved it.
struct Workspace {
    config: ConvergeConfig,
    parser: ConfigParser,
}

/// The provider selected by the declaration.
enum Backend {
    Memory {
        cloud: Arc<InMemoryCloud>,
        fixture: PathBuf,
    },
    Http(Arc<HttpCloud>),
}

impl Workspace {
    /// Loads the declaration with `.env` and environment overrides applied.
    fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let config_file = resolve_config_path(config_path)?;
        debug!("Loading configuration from: {}", config_file.display());

        let parser = ConfigParser::new().with_base_path(
            config_file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new(".")),
        );
        parser.load_dotenv()?;
        let config = parser.load_with_env(&config_file)?;

        Ok(Self { config, parser })
    }

    /// Loads the declaration and rejects it if validation fails.
    fn load_validated(config_path: Option<&PathBuf>) -> Result<Self> {
        let workspace = Self::load(config_path)?;
        let result = ConfigValidator::new().validate(&workspace.config)?;
        for warning in &result.warnings {
            tracing::warn!("{warning}");
        }
        Ok(workspace)
    }

    /// Creates the provider backend.
    async fn backend(&self) -> Result<Backend> {
        let provider = &self.config.provider;

        match provider.backend {
            ProviderBackend::Memory => {
                let fixture = self.parser.resolve_path(&provider.fixture);
                info!("Using in-memory cloud from {}", fixture.display());
                let cloud = Arc::new(InMemoryCloud::load(&fixture).await?);
                Ok(Backend::Memory { cloud, fixture })
            }
            ProviderBackend::Http => {
                let endpoint = provider.endpoint.as_deref().ok_or_else(|| {
                    ConfigError::validation("Endpoint is required", "provider.endpoint")
                })?;
                info!("Using HTTP provider at {endpoint}");
                let cloud = HttpCloud::with_timeout(
                    endpoint,
                    ConfigParser::get_api_token(),
                    provider.timeout_secs,
                )?;
                Ok(Backend::Http(Arc::new(cloud)))
            }
        }
    }

    fn context(&self, backend: &Backend) -> ReconcileContext {
        ReconcileContext::new(backend.provider(), self.config.project.name.as_str())
    }
}

impl Backend {
    fn provider(&self) -> Arc<dyn CloudProvider> {
        match self {
            Self::Memory { cloud, .. } => Arc::clone(cloud) as Arc<dyn CloudProvider>,
            Self::Http(cloud) => Arc::clone(cloud) as Arc<dyn CloudProvider>,
        }
    }

    /// Saves simulated state back to its fixture.
    async fn persist(&self) -> Result<()> {
        if let Self::Memory { cloud, fixture } = self {
            cloud.save(fixture).await?;
            info!("Saved cloud state to {}", fixture.display());
        }
        Ok(())
    }
}

/// Resolves the declaration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}
