mod api;
mod client;
mod dao;
mod model;
mod service;

use std::thread;
use std::time::Duration;

use crate::api::cors::build_cors;
use crate::api::endpoints;
use crate::api::middleware::request_logging_middleware;
use crate::api::security::BasicAuthService;
use crate::api::state::AppState;
use crate::client::form::{FormController, FormMessage, FormMessageKind, HttpRegistrationGateway, RegistrationForm};
use crate::dao::pool::connect_with_retry;
use crate::dao::registrations::RegistrationDao;
use crate::model::config::{ApplicationArguments, Command, Config, LoggingConfig, SubmitArguments};
use crate::service::export::ExportService;
use crate::service::registrations::RegistrationService;

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::IntGauge;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();
    match args.command {
        Command::Serve { config_file } => serve(&config_file).await,
        Command::Submit(submit_arguments) => submit(submit_arguments).await,
    }
}

/**
 * Starts the registration server.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 */
async fn serve(config_file: &str) -> std::io::Result<()> {
    let config = get_config(config_file)?;

    init_tracing(&config.logging, "info")?;

    let connection_pool = connect_with_retry(&config.database.db_type).await.map_err(std::io::Error::other)?;

    let registration_dao = RegistrationDao::new();
    let registration_service = RegistrationService::new(registration_dao, connection_pool);
    let export_service = ExportService::new(config.catalog.clone(), config.export.directory.clone());
    let security_service = BasicAuthService::new(config.security.admin.clone());
    if config.security.admin.is_none() {
        tracing::warn!("No admin credentials configured, admin endpoints are open");
    }

    let state = web::Data::new(AppState::new(security_service, registration_service, export_service, config.registration.required_fields.clone(), config.server.environment.clone()));

    let prometheus = PrometheusMetricsBuilder::new("")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    let max_connections_gauge = IntGauge::new("max_connections", "Connection pool maximum").map_err(|err| std::io::Error::other(format!("Failed to create max_connections gauge: {err}")))?;
    let active_connections_gauge = IntGauge::new("active_connections", "Connection pool active").map_err(|err| std::io::Error::other(format!("Failed to create active_connections gauge: {err}")))?;
    let idle_connections_gauge = IntGauge::new("idle_connections", "Connection pool idle").map_err(|err| std::io::Error::other(format!("Failed to create idle_connections gauge: {err}")))?;
    register_prometheus_metrics(&prometheus, &max_connections_gauge)?;
    register_prometheus_metrics(&prometheus, &active_connections_gauge)?;
    register_prometheus_metrics(&prometheus, &idle_connections_gauge)?;

    gather_db_metrics(max_connections_gauge, active_connections_gauge, idle_connections_gauge, state.clone());

    let allowed_origins = config.server.allowed_origins.clone();
    tracing::info!("Starting {} server on {}:{}", config.server.environment, config.server.host, config.server.http_port);

    HttpServer::new(move || {
        App::new()
            .wrap(prometheus.clone())
            .wrap(build_cors(&allowed_origins))
            .wrap(from_fn(request_logging_middleware))
            .app_data(state.clone())
            .configure(endpoints::configure)
    })
    .bind((config.server.host.as_str(), config.server.http_port))?
    .workers(config.server.workers)
    .run()
    .await
}

/**
 * Submits a single registration to a running server and prints the outcome.
 *
 * #Arguments
 * `arguments`: Form values from the command line.
 */
async fn submit(arguments: SubmitArguments) -> std::io::Result<()> {
    init_tracing(&LoggingConfig::default(), "warn")?;
    let mut controller = FormController::new(HttpRegistrationGateway::new(&arguments.server_url));
    controller.form = RegistrationForm {
        name: arguments.name,
        gender: arguments.gender,
        address: arguments.address,
        phone: arguments.phone,
        birthdate: arguments.birthdate,
        living_type: arguments.living_type,
        program: arguments.program,
        privacy_agreement: arguments.privacy_agreement,
    };
    controller.submit().await;
    match controller.message() {
        Some(FormMessage { kind: FormMessageKind::Success, text }) => {
            println!("{text}");
            Ok(())
        }
        Some(FormMessage { text, .. }) => Err(std::io::Error::other(text.clone())),
        None => Err(std::io::Error::other("No response from the registration form")),
    }
}

/**
 * Initializes structured logging to stdout.
 *
 * #Arguments
 * `logging`: Output options and extra filter directives.
 * `default_level`: Level used when `RUST_LOG` is not set.
 */
fn init_tracing(logging: &LoggingConfig, default_level: &str) -> Result<(), std::io::Error> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    for directive in &logging.directives {
        filter = filter.add_directive(directive.parse::<Directive>().map_err(|err| std::io::Error::other(format!("Invalid log directive {directive}: {err}")))?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_ansi(logging.ansi)
        .with_file(logging.file)
        .try_init()
        .map_err(|err| std::io::Error::other(format!("Failed to initialize logging: {err}")))
}

/**
 * Registers custom Prometheus metrics.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the gauge with.
 * `gauge`: The gauge to register.
 */
fn register_prometheus_metrics(prometheus_metrics: &PrometheusMetrics, gauge: &IntGauge) -> Result<(), std::io::Error> {
    prometheus_metrics.registry.register(Box::new(gauge.clone())).map_err(|err| std::io::Error::other(format!("Failed to register Prometheus gauge: {err}")))?;
    Ok(())
}

/**
 * Gathers connection pool metrics in a separate thread.
 *
 * #Arguments
 * `max_connections_gauge`: Gauge for maximum connections.
 * `active_connections_gauge`: Gauge for open connections.
 * `idle_connections_gauge`: Gauge for idle connections.
 * `state`: Application state holding the pool.
 */
fn gather_db_metrics(max_connections_gauge: IntGauge, active_connections_gauge: IntGauge, idle_connections_gauge: IntGauge, state: web::Data<AppState>) {
    thread::spawn(move || {
        loop {
            let (size, idle, max_connections) = state.registration_service.pool_statistics();
            max_connections_gauge.set(i64::from(max_connections));
            active_connections_gauge.set(i64::from(size));
            #[allow(clippy::cast_possible_wrap)]
            idle_connections_gauge.set(idle as i64);
            thread::sleep(Duration::from_secs(1));
        }
    });
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}
