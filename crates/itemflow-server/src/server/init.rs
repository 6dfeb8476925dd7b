use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use axum::routing::get;
use tower_http::trace::TraceLayer;
use axum::http::Request;
use axum::extract::MatchedPath;
use tracing::{info_span, Span};
use tower_http::timeout::TimeoutLayer;
use std::time::Duration;
use clap::Args;
use itemflow::{BatchConfig, InMemoryStore};

use crate::server::config::SeedConfig;
use crate::server::routes::{default, items, process};
use crate::server::state::ServerState;

#[derive(Debug, Args)]
pub struct RouterArgs {
    /// Items processed concurrently by a batch run.
    #[clap(short, long, default_value = "10")]
    pub workers: usize,

    /// Simulated latency per item, in milliseconds.
    #[clap(long, default_value = "100")]
    pub process_delay_ms: u64,

    /// Upper bound on the time spent answering one request.
    #[clap(long, default_value = "15")]
    pub request_timeout_secs: u64,

    /// How long an unread background run result is kept, in seconds.
    #[clap(long, default_value = "300")]
    pub run_retention_secs: u64,

    /// JSON file with items to load at startup.
    #[clap(long)]
    pub seed: Option<PathBuf>,
}

impl RouterArgs {
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            workers: self.workers,
            process_delay: Duration::from_millis(self.process_delay_ms),
        }
    }
}

/// Build the shared state from the arguments and the router on top of it.
///
/// The returned state owns the batch worker pool; shut it down once the
/// server has stopped.
pub fn init_router(args: &RouterArgs) -> anyhow::Result<(Router, Arc<ServerState>)> {
    let seed = match &args.seed {
        Some(path) => SeedConfig::from_path(path)?,
        None => SeedConfig::default(),
    };
    tracing::info!("Seeding store with {} item(s)", seed.items.len());

    let store = InMemoryStore::with_items(seed.items);
    let state = Arc::new(
        ServerState::in_memory(store, &args.batch_config())
            .with_run_retention(Duration::from_secs(args.run_retention_secs)),
    );

    let router = build_router(state.clone(), Duration::from_secs(args.request_timeout_secs));
    Ok((router, state))
}

/// Request timeouts only cover the CRUD routes. A blocking batch run answers
/// when it is done, however long that takes.
pub fn build_router(state: Arc<ServerState>, request_timeout: Duration) -> Router {
    let crud = Router::new()
        .route("/api/items", get(items::list_items).post(items::create_item))
        .route(
            "/api/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/health", get(default::health_check))
        .layer(TimeoutLayer::new(request_timeout));

    let processing = Router::new()
        .route(
            "/api/items/process",
            get(process::process_items).post(process::start_processing),
        )
        .route("/api/items/process/:run_id", get(process::processing_status));

    Router::new()
        .merge(crud)
        .merge(processing)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    // Log the matched route's path (with placeholders not filled in).
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str);
                    tracing::debug!("{}", request.uri());

                    info_span!(
                        "http_request",
                        method = ?request.method(),
                        matched_path,
                        status = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::response::Response, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        tracing::debug!("Responded in {} ms", latency.as_millis());
                    },
                ),
        )
}
