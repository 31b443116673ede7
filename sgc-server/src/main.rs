use clap::Parser;
use colored::*;
use std::env;
use tracing::{info, Level};
use tracing_subscriber::{
    field::RecordFields,
    fmt::{self, time::ChronoUtc, FormatFields},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use error_common::{Result, SgcError};
use logger_redacted::LoggerConfig;
use sgc_server::{create_app, ServerConfig, SgcServer};

/// SGC Engine HTTP Server
#[derive(Parser, Debug)]
#[command(name = "sgc-server")]
#[command(about = "Quality management (ISO 9001) HTTP API server")]
struct Args {
    /// Configuration file path (YAML, TOML or JSON)
    #[arg(short, long, env = "SGC_CONFIG")]
    config: Option<String>,

    /// Server bind address; overrides the configuration file
    #[arg(long)]
    host: Option<String>,

    /// Server port; overrides the configuration file
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON logs even in development
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = ServerConfig::load(args.config.as_deref())
        .map_err(|e| SgcError::ConfigError(e.to_string()))?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    init_tracing(args.verbose, args.json_logs || config.is_production());
    config.validate()?;

    info!("📋 {}", format!("SGC Engine {}", env!("CARGO_PKG_VERSION")).bright_cyan());
    info!("🌐 Bind address: {}", config.bind_address().bright_yellow());
    info!(
        "🗄️  Store: {}",
        if config.database_url.is_some() { "postgres" } else { "memory" }.bright_white()
    );

    let bind_address = config.bind_address();
    let server = SgcServer::new(config).await?;
    let app = create_app(server.clone());

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| SgcError::NetworkError(format!("Failed to bind to {}: {}", bind_address, e)))?;

    info!("🚀 {}", format!("SGC Engine running on http://{}", bind_address).bright_green());
    info!("📋 {}", format!("Health check: http://{}/health", bind_address).bright_blue());
    info!("📋 {}", format!("API v1: http://{}/api/v1", bind_address).bright_blue());
    info!("📖 {}", format!("OpenAPI: http://{}/api-docs/openapi.json", bind_address).bright_blue());

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SgcError::ServerError(format!("HTTP server error: {}", e)));

    server.shutdown().await;
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("🛑 {}", "Shutdown signal received".bright_yellow());
}

fn init_tracing(verbose: bool, json: bool) {
    let logger = LoggerConfig {
        json_output: json,
        log_level: if verbose { "debug" } else { "info" }.to_string(),
        ..Default::default()
    };
    let use_colors = env::var("NO_COLOR").is_err() && atty::is(atty::Stream::Stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        logger
            .filter_directive(&["sgc_server", "quality_service", "document_storage", "database_layer"])
            .into()
    });

    if !logger.json_output && use_colors {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .event_format(ColoredFormatter)
                    .fmt_fields(ColoredFieldFormatter),
            )
            .init();

        print_startup_banner();
    } else {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .init();
    }
}

fn print_startup_banner() {
    println!("{}", "╔══════════════════════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║                         📑 SGC ENGINE                        ║".bright_cyan());
    println!("{}", "║              Sistema de Gestión de Calidad ISO 9001          ║".bright_cyan());
    println!("{}", "╚══════════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

// Colored formatter for development
struct ColoredFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ColoredFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        write!(writer, "{} ", chrono::Utc::now().format("%H:%M:%S%.3f").to_string().bright_black())?;

        let level_str = match *metadata.level() {
            Level::TRACE => "TRACE".bright_purple(),
            Level::DEBUG => "DEBUG".bright_blue(),
            Level::INFO => " INFO".bright_green(),
            Level::WARN => " WARN".bright_yellow(),
            Level::ERROR => "ERROR".bright_red(),
        };
        write!(writer, "[{}] ", level_str)?;

        if let Some(target) = metadata.target().split("::").last() {
            write!(writer, "{:<15} ", target.bright_cyan())?;
        }

        ctx.format_fields(writer.by_ref(), event)?;

        if *metadata.level() >= Level::DEBUG {
            if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
                let file_short = file.rsplit('/').next().unwrap_or(file);
                write!(writer, " {}", format!("({}:{})", file_short, line).bright_black())?;
            }
        }

        writeln!(writer)
    }
}

struct ColoredFieldFormatter;

impl<'a> FormatFields<'a> for ColoredFieldFormatter {
    fn format_fields<R: RecordFields>(
        &self,
        writer: tracing_subscriber::fmt::format::Writer<'a>,
        fields: R,
    ) -> std::fmt::Result {
        let mut visitor = ColoredFieldVisitor {
            writer,
            is_first: true,
        };
        fields.record(&mut visitor);
        Ok(())
    }
}

struct ColoredFieldVisitor<'a> {
    writer: tracing_subscriber::fmt::format::Writer<'a>,
    is_first: bool,
}

impl ColoredFieldVisitor<'_> {
    fn write_field(&mut self, name: &str, value: &str) {
        // Formatting errors surface as truncated log lines, nothing to recover
        let _ = if name == "message" {
            write!(self.writer, "{}", value.white().bold())
        } else {
            write!(
                self.writer,
                "{}{}={}",
                if self.is_first { "" } else { " " },
                name.bright_yellow(),
                value.bright_white()
            )
        };
        self.is_first = false;
    }
}

impl tracing::field::Visit for ColoredFieldVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        self.write_field(field.name(), &rendered);
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.write_field(field.name(), value);
    }
}
