//! # geofenced — geofence daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`geofenced.toml` plus environment overrides)
//! - Initialize logging
//! - Connect to `PostgreSQL` (running migrations) and Redis; either failing
//!   is fatal
//! - Spawn the broadcast hub and construct the application services
//! - Build the axum router, bind and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use geofence_adapter_cache_redis as cache;
use geofence_adapter_http_axum::router;
use geofence_adapter_http_axum::state::AppState;
use geofence_adapter_storage_postgis_sqlx::{
    self as storage, PgGeofenceEventLog, PgLocationRepository, PgZoneRepository,
};
use geofence_app::hub::{BroadcastHub, ChannelSubscriber, HubConfig};
use geofence_app::services::geo_cache::GeoCache;
use geofence_app::services::geofence_evaluator::GeofenceEvaluator;
use geofence_app::services::location_service::LocationService;
use geofence_app::services::zone_service::ZoneService;

use crate::config::{Config, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(&config);

    // PostgreSQL + PostGIS
    let db = storage::Config {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
    }
    .build()
    .await
    .inspect_err(|err| tracing::error!(error = %err, "database unavailable"))?;
    let pool = db.pool().clone();
    tracing::info!("connected to postgres");

    // Redis
    let redis = cache::Config {
        redis_url: config.redis.url.clone(),
    }
    .build()
    .await
    .inspect_err(|err| tracing::error!(error = %err, "redis unavailable"))?;
    tracing::info!("connected to redis");

    // Repositories
    let locations = Arc::new(PgLocationRepository::new(pool.clone()));
    let zones = Arc::new(PgZoneRepository::new(pool.clone()));
    let event_log = PgGeofenceEventLog::new(pool);

    // Broadcast hub
    let (hub, hub_task) = BroadcastHub::<ChannelSubscriber>::spawn(HubConfig {
        command_capacity: config.hub.command_capacity,
        broadcast_timeout: config.broadcast_timeout(),
    });

    // Services
    let evaluator = Arc::new(GeofenceEvaluator::new(
        Arc::clone(&zones),
        redis.snapshot_store(),
        hub.clone(),
        event_log,
        config.snapshot_ttl(),
    ));
    let geo_cache = Arc::new(GeoCache::new(redis.geo_index(), Arc::clone(&locations)));
    let location_service = LocationService::new(locations, geo_cache, hub.clone(), evaluator);
    let zone_service = ZoneService::new(zones);

    // HTTP
    let state = AppState::new(location_service, zone_service, hub)
        .with_subscriber_buffer(config.hub.subscriber_buffer);
    let app = router::build(state, router::cors_layer(&config.cors.allowed_origins));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(address = %bind_addr, "geofenced listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    hub_task.abort();
    tracing::info!("geofenced stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter `{}`: {err}", config.logging.filter);
        EnvFilter::new("info")
    });
    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
