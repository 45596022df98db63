//! Rental marketplace HTTP server.

use std::{io, sync::OnceLock, time};

use application::{api, config, Args, Config};
use axum::{extract::MatchedPath, Extension, Router};
use axum_client_ip::InsecureClientIp;
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// [`log::Level`]s written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum [`log::Level`] to be written, once configured.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    init_logging();

    _ = run().await;
}

/// Installs a [`tracing`] subscriber splitting records between `stdout` and
/// `stderr` by their level.
fn init_logging() {
    let enabled = |level: &log::Level| {
        LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO) >= *level
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(move |meta| {
                    meta.is_span()
                        || !STDERR_LEVELS.contains(meta.level())
                            && enabled(meta.level())
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(move |meta| {
                    meta.is_span()
                        || STDERR_LEVELS.contains(meta.level())
                            && enabled(meta.level())
                })),
        )
        .init();
}

/// Loads the [`Config`], migrates the database and serves the HTTP API until
/// a failure.
async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    if LOG_LEVEL.set(log.level).is_err() {
        log::warn!("log level is already set");
    }

    let mut postgres =
        Postgres::new(&postgres.into()).map_err(|e| {
            log::error!("failed to initialize `Postgres` client: {e}");
        })?;
    let report = migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;
    log::info!(
        "applied {} database migrations",
        report.applied_migrations().len(),
    );

    let app = traced(
        api::router()
            .layer(Extension(Service::new(service.into(), postgres)))
            .layer(cors(&server.cors)?),
    );

    let listener = TcpListener::bind((server.host.as_str(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;
    log::info!("listening on `{}:{}`", server.host, server.port);

    axum::serve(listener, app).await.map_err(|e| {
        log::error!("webserver failed: {e}");
    })
}

/// Builds a [`CorsLayer`] allowing the configured origins to call the API.
fn cors(conf: &config::Cors) -> Result<CorsLayer, ()> {
    let origins = if conf.origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            conf.origins
                .iter()
                .map(|origin| {
                    origin.parse::<http::HeaderValue>().map_err(|e| {
                        log::error!(
                            "`{origin}` is not a correct CORS origin: {e}",
                        );
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(CorsLayer::new()
        .allow_methods([
            http::Method::DELETE,
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::PATCH,
            http::Method::POST,
            http::Method::PUT,
        ])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
        ])
        .allow_origin(origins))
}

/// Wraps every HTTP request handled by the provided [`Router`] into a span,
/// and logs its outcome.
fn traced(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|r: &http::Request<_>| {
                tracing::info_span!(
                    "HTTP request",
                    http.client_ip = InsecureClientIp::from(
                        r.headers(),
                        r.extensions(),
                    )
                    .map(|ip| ip.0.to_string())
                    .ok(),
                    http.method = r.method().as_str(),
                    http.route = r
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str),
                    http.target = r
                        .uri()
                        .path_and_query()
                        .map(http::uri::PathAndQuery::as_str),
                    http.user_agent = r
                        .headers()
                        .get(http::header::USER_AGENT)
                        .and_then(|h| h.to_str().ok()),
                    http.status_code = tracing::field::Empty,
                )
            })
            .on_response(
                |r: &http::Response<_>,
                 dur: time::Duration,
                 span: &tracing::Span| {
                    let status = r.status();
                    _ = span.record("http.status_code", status.as_u16());

                    let duration = format!("{}ms", dur.as_millis());
                    if status.is_server_error() {
                        log::error!(duration, "request failed");
                    } else if status.is_client_error() {
                        log::warn!(duration, "request rejected");
                    } else {
                        log::info!(duration, "request handled");
                    }
                },
            ),
    )
}
