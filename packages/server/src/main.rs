use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use layout::{LayoutEngine, PublisherRegistry};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::services::image_host::FilesystemImageHost;
use server::services::mailer::{LogMailer, Mailer, SmtpMailer};
use server::services::tokens::TokenService;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = server::database::init_db(&config.database)
        .await
        .context("Failed to connect to database")?;

    match &config.catalog.catalog_file {
        Some(path) if path.exists() => {
            let catalog = server::seed::Catalog::load(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            server::seed::seed_catalog(&db, &catalog)
                .await
                .context("Failed to seed catalog")?;
        }
        Some(path) => warn!("Catalog file {} not found, skipping", path.display()),
        None => {}
    }
    server::seed::seed_admin(&db, &config.auth)
        .await
        .context("Failed to seed bootstrap admin")?;
    server::seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;

    let mailer: Arc<dyn Mailer> = if config.mail.enabled {
        Arc::new(SmtpMailer::new(&config.mail).context("Failed to configure SMTP")?)
    } else {
        info!("Mail disabled, emails will only be logged");
        Arc::new(LogMailer)
    };

    let images = FilesystemImageHost::new(
        config.uploads.dir.clone(),
        config.uploads.max_size,
        config.uploads.public_base_url.clone(),
    )
    .await
    .context("Failed to prepare upload directory")?;

    let publishers = PublisherRegistry::load(&config.print.publishers_file).with_context(|| {
        format!(
            "Failed to load publisher profiles {}",
            config.print.publishers_file.display()
        )
    })?;
    info!(
        publishers = ?publishers.publisher_names().collect::<Vec<_>>(),
        "Loaded publisher profiles"
    );
    let layout = LayoutEngine::from_dir(&config.print.template_dir, publishers)
        .strict_publishers(config.print.strict_publishers);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        tokens: TokenService::from_config(&config.tracking),
        mailer,
        images: Arc::new(images),
        layout: Arc::new(layout),
        config: Arc::new(config),
    };

    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
