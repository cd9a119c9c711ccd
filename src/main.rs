use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod config;
mod db;
mod docs;
mod engine;
mod model;
mod routes;
mod storage;
mod utils;

use config::Config;
use db::init_db;
use engine::clock::{ClockHandle, SystemClock};
use routes::RateLimits;
use storage::{LocalStore, MySqlStore, Storage};

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance kiosk is running"
}

async fn sync_once(storage: &Storage) {
    if let Err(e) = storage.sync_with_remote(250).await {
        warn!(error = %e, "Failed to sync local cache with remote store");
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let offset = config.utc_offset()?;
    let clock = Data::new(ClockHandle::new(SystemClock::new(offset)));
    let limits = RateLimits::from_config(&config)?;

    let local = LocalStore::open(&config.local_store_dir)
        .with_context(|| format!("opening local store at {}", config.local_store_dir))?;

    let remote = match &config.database_url {
        Some(url) => match init_db(url).await {
            Ok(pool) => Some(MySqlStore::new(pool)),
            Err(e) => {
                warn!(error = %e, "Remote database unreachable, using local store only");
                None
            }
        },
        None => {
            warn!("DATABASE_URL not set, using local store only");
            None
        }
    };

    let storage = Data::new(Storage::new(remote, local));
    let storage_for_sync = storage.clone();
    let sync_every = config.sync_interval();

    actix_web::rt::spawn(async move {
        let Some(every) = sync_every else {
            sync_once(&storage_for_sync).await;
            return;
        };

        // first tick completes immediately
        let mut ticker = actix_web::rt::time::interval(every);
        loop {
            ticker.tick().await;
            sync_once(&storage_for_sync).await;
        }
    });

    let server_addr = config.server_addr.clone();

    info!(
        addr = %server_addr,
        utc_offset = %offset,
        remote = storage.has_remote(),
        "Listening"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(storage.clone())
            .app_data(clock.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &limits, &config.api_prefix))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
