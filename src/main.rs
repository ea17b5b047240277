use std::path::Path;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, Layer,
};

use print_spooler::api::{
    health::health_config,
    job::{handlers::job_config, JobService},
    printer::printer_config,
    validation,
};
use print_spooler::cli::{self, Cli};
use print_spooler::config::Config;
use print_spooler::dispatch::{DispatchWorker, Dispatcher};
use print_spooler::shutdown::ShutdownCoordinator;
use print_spooler::spooler::{self, store, JobHeap};

fn file_layer<S>(log_dir: &Path, name: &str, level: LevelFilter) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(log_dir, name))
        .with_ansi(false)
        .with_filter(level)
}

/// Console output plus daily rotating files split by level.
/// Files are created as: logs/info.log.2026-10-16, logs/error.log.2026-10-16, etc.
fn init_tracing(log_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer(log_dir, "info.log", LevelFilter::INFO))
        .with(file_layer(log_dir, "warn.log", LevelFilter::WARN))
        .with(file_layer(log_dir, "error.log", LevelFilter::ERROR))
        .with(file_layer(log_dir, "debug.log", LevelFilter::DEBUG))
        .init();
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Cli::parse();

    let config = Config::from_env().map_err(std::io::Error::other)?;
    init_tracing(&config.log_dir)?;

    if let Some(command) = args.command {
        return cli::run(command, &config).await.map_err(|e| {
            error!("{}", e);
            std::io::Error::other(e.to_string())
        });
    }

    info!("Starting print-spooler");
    info!("Configuration loaded successfully:");
    info!("  - Job file: {}", config.jobs_file.display());
    info!("  - Printers: {}", config.printers);
    info!("  - Max jobs: {:?}", config.max_jobs);
    info!("  - Time scale: {:?} per unit", config.time_scale);
    info!("  - Max payload size: {} bytes", config.max_payload_size);

    // Load once at start; the shutdown coordinator saves once at the end
    let records = store::load(&config.jobs_file).map_err(|e| std::io::Error::other(e.to_string()))?;
    let heap = JobHeap::restore(records, config.max_jobs)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    info!(
        "Scheduler ready with {} jobs, next id sequence {}",
        heap.len(),
        heap.next_sequence()
    );

    let heap = spooler::shared(heap);
    let dispatcher = Arc::new(Dispatcher::new(
        heap.clone(),
        config.printers,
        config.time_scale,
    ));

    // watch channel allows multiple receivers to get the same value
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut worker_handles = Vec::new();

    if config.auto_dispatch {
        let worker = DispatchWorker::new(dispatcher.clone(), config.dispatch_interval);
        worker_handles.push(tokio::spawn(async move {
            worker.run(shutdown_rx).await;
        }));
        info!("Spawned dispatch worker");
    }

    let job_service = web::Data::new(JobService::new(dispatcher));
    let max_payload_size = config.max_payload_size;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(job_service.clone())
            .app_data(web::PayloadConfig::default().limit(max_payload_size))
            .app_data(validation::json_config())
            .configure(health_config)
            .configure(job_config)
            .configure(printer_config)
    });

    info!("Server starting on http://{}", config.bind_addr);

    let server = server.bind(config.bind_addr.as_str())?.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let coordinator = ShutdownCoordinator::new(
        server_handle,
        server_task,
        worker_handles,
        shutdown_tx,
        heap,
        config.jobs_file.clone(),
    );

    coordinator.wait_for_shutdown().await
}
