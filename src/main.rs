use anyhow::{Context, Result};
use file_web::{
    config::{AppConfig, Backend},
    routes::routes::build_router,
    services::{
        file_repository::ObjectStoreRepository,
        file_service::FileService,
        memory_store::InMemoryObjectStore,
        object_store::ObjectStore,
        s3_store::{S3ObjectStore, S3Settings},
    },
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting file-web with config: {:?}", cfg);

    // --- Initialize object store ---
    let store: Arc<dyn ObjectStore> = match cfg.backend {
        Backend::S3 => {
            let settings = S3Settings {
                bucket: cfg.bucket.clone().unwrap_or_default(),
                region: cfg.region.clone(),
                endpoint: cfg.endpoint.clone(),
                force_path_style: cfg.force_path_style,
            };
            Arc::new(
                S3ObjectStore::new(&settings)
                    .await
                    .context("initializing S3 client")?,
            )
        }
        Backend::Memory => {
            tracing::warn!("Using in-memory backend; files are lost on exit");
            Arc::new(InMemoryObjectStore::new())
        }
    };
    tracing::info!(backend = store.backend_name(), "Object store ready");

    // --- Initialize core service ---
    let repo = ObjectStoreRepository::with_ttl(store, cfg.access_token_ttl()?);
    let service = FileService::new(Arc::new(repo));

    // --- Build router ---
    let app = build_router(service, cfg.max_upload_bytes);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
