//! CLI entrypoint for Agent Conductor
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use conductor_application::{
    AdaptiveModelRouter, AgentRunner, CompositionRepository, CompositionStore, Coordinator,
    Executor, MetaOrchestrator, NoCache, NoProgress, ProgressNotifier, ResponseCache,
    TelemetryStore,
};
use conductor_domain::{AgentFactory, ModelRegistry, TaskContext, TemplateCatalog};
use conductor_infrastructure::{
    CommandExecutor, ConfigLoader, EchoExecutor, FileConfig, FileOutputFormat,
    InProcessCoordinator, JsonFileCompositionRepository, JsonlTelemetryStore, MemoryCompositionRepository,
    MemoryResponseCache, MemoryTelemetryStore,
};
use conductor_presentation::{
    Cli, ConsoleApproval, ConsoleFormatter, OutputFormat, PipedApproval, ProgressReporter,
};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_logging(cli.verbose, config.log_dir().as_deref())?;
    if !config.output.color {
        colored::control::set_override(false);
    }

    info!("Starting Agent Conductor");

    // === Dependency Injection ===
    let mut registry = ModelRegistry::default();
    if let Some(provider) = &config.router.default_provider {
        registry = registry.with_default_provider(provider.clone());
    }
    let registry = Arc::new(registry);

    let telemetry = open_telemetry(&cli, &config);
    let orchestrator_config = config.to_orchestrator_config();
    let router = Arc::new(
        AdaptiveModelRouter::new(telemetry.clone(), registry.clone())
            .with_config(orchestrator_config.router.clone()),
    );

    let output = cli.output.unwrap_or(match config.output.format {
        Some(FileOutputFormat::Json) => OutputFormat::Json,
        Some(FileOutputFormat::Text) | None => OutputFormat::Text,
    });

    // Stats mode
    if let Some(workflow) = &cli.stats {
        let stats = router
            .get_routing_stats(workflow, cli.days)
            .await
            .context("Failed to read routing telemetry")?;
        match output {
            OutputFormat::Text => println!("{}", ConsoleFormatter::format_stats(&stats)),
            OutputFormat::Json => println!("{}", ConsoleFormatter::format_stats_json(&stats)),
        }
        return Ok(ExitCode::SUCCESS);
    }

    // Orchestration mode - task is required
    let task = match &cli.task {
        Some(task) => task.clone(),
        None => bail!("A task is required. Use --stats <workflow> to inspect routing."),
    };
    let context = cli.task_context().map_err(anyhow::Error::msg)?;

    let wiring = Wiring {
        cli: &cli,
        config: &config,
        registry,
        router,
        telemetry,
        output,
    };

    if cli.dry_run {
        return wiring.run(Arc::new(EchoExecutor::new()), &task, &context).await;
    }
    match &config.executor.command {
        Some(program) => match CommandExecutor::try_new(program.clone(), config.executor.args.clone()) {
            Some(executor) => wiring.run(Arc::new(executor), &task, &context).await,
            None => bail!("Executor command not found: {}", program),
        },
        None => {
            warn!("No [executor] command configured; using the echo executor");
            wiring.run(Arc::new(EchoExecutor::new()), &task, &context).await
        }
    }
}

/// Install the stderr subscriber, plus a daily log file when configured
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(filter).with(stderr).init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, "conductor.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .init();
    Ok(Some(guard))
}

/// Prompt at a terminal; otherwise take decisions from piped stdin
fn approval_coordinator() -> Arc<dyn Coordinator> {
    if std::io::stdin().is_terminal() {
        return Arc::new(ConsoleApproval::new());
    }
    let bus: Arc<dyn Coordinator> = Arc::new(InProcessCoordinator::new());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    Arc::new(PipedApproval::new(bus, stdin))
}

fn open_telemetry(cli: &Cli, config: &FileConfig) -> Arc<dyn TelemetryStore> {
    if cli.no_config {
        return Arc::new(MemoryTelemetryStore::new());
    }
    let path = config.data_dir().join("telemetry.jsonl");
    match JsonlTelemetryStore::open(&path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Telemetry unavailable at {}: {}; routing from defaults", path.display(), e);
            Arc::new(MemoryTelemetryStore::new())
        }
    }
}

async fn open_repository(cli: &Cli, config: &FileConfig) -> Arc<dyn CompositionRepository> {
    if cli.no_config {
        return Arc::new(MemoryCompositionRepository::new());
    }
    let dir = config.data_dir().join("compositions");
    match JsonFileCompositionRepository::open(&dir).await {
        Ok(repository) => Arc::new(repository),
        Err(e) => {
            warn!("Composition store unavailable at {}: {}; learning is in-memory only", dir.display(), e);
            Arc::new(MemoryCompositionRepository::new())
        }
    }
}

/// Collaborators shared by every executor choice
struct Wiring<'a> {
    cli: &'a Cli,
    config: &'a FileConfig,
    registry: Arc<ModelRegistry>,
    router: Arc<AdaptiveModelRouter>,
    telemetry: Arc<dyn TelemetryStore>,
    output: OutputFormat,
}

impl Wiring<'_> {
    async fn run<E: Executor + 'static>(
        self,
        executor: Arc<E>,
        task: &str,
        context: &TaskContext,
    ) -> Result<ExitCode> {
        let orchestrator_config = self.config.to_orchestrator_config();

        let progress: Arc<dyn ProgressNotifier> = if self.cli.quiet {
            Arc::new(NoProgress)
        } else {
            Arc::new(ProgressReporter::new())
        };
        let cache: Arc<dyn ResponseCache> = if self.config.cache.enabled {
            Arc::new(MemoryResponseCache::new(self.config.cache.max_entries))
        } else {
            Arc::new(NoCache)
        };

        let runner = Arc::new(
            AgentRunner::new(executor, self.router.clone(), self.registry.clone())
                .with_cache(cache, orchestrator_config.cache_ttl)
                .with_telemetry(self.telemetry.clone())
                .with_progress(progress.clone())
                .with_default_timeout(orchestrator_config.agent_timeout),
        );
        let store = Arc::new(
            CompositionStore::new(open_repository(self.cli, self.config).await)
                .with_config(orchestrator_config.learning.clone()),
        );
        let factory = AgentFactory::new(TemplateCatalog::builtin(), self.registry.clone());

        // Ctrl-C stops new agent calls; calls already running finish
        let cancellation = CancellationToken::new();
        let on_interrupt = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let orchestrator = MetaOrchestrator::new(runner, factory, store)
            .with_coordinator(approval_coordinator())
            .with_progress(progress)
            .with_config(orchestrator_config)
            .with_cancellation(cancellation);

        let interactive = self.cli.interactive
            || context
                .get("interactive")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
        let result = orchestrator.orchestrate(task, context, interactive).await;

        match self.output {
            OutputFormat::Text => println!("{}", ConsoleFormatter::format(&result)),
            OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&result)),
        }

        Ok(if result.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
