use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use ledgerlink_connect::{
    CancellationCommand, HttpProviderClientFactory, ProviderClientFactory, Repositories,
    SyncConfig, SyncOrchestrator,
};
use ledgerlink_core::blobs::BlobStoreTrait;
use ledgerlink_storage_sqlite::{
    db, BillingDocumentRepository, CreditNoteRepository, FsBlobStore, LedgerRepository,
    MembershipRepository, OrganizationRepository,
};

use crate::{auth::AuthManager, config::Config};

pub struct AppState {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub cancellation: Arc<CancellationCommand>,
    pub auth: Arc<AuthManager>,
    pub cron_secret: Option<String>,
}

pub fn init_tracing() {
    let log_format = std::env::var("LL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let repositories = Repositories {
        organizations: Arc::new(OrganizationRepository::new(pool.clone(), writer.clone())),
        memberships: Arc::new(MembershipRepository::new(pool.clone())),
        ledger: Arc::new(LedgerRepository::new(pool.clone(), writer.clone())),
        documents: Arc::new(BillingDocumentRepository::new(pool.clone(), writer.clone())),
        credit_notes: Arc::new(CreditNoteRepository::new(pool.clone(), writer.clone())),
    };

    tracing::info!("Blob directory in use: {}", config.blob_dir);
    let blob_store: Arc<dyn BlobStoreTrait> = Arc::new(FsBlobStore::new(&config.blob_dir));

    let factory: Arc<dyn ProviderClientFactory> = Arc::new(HttpProviderClientFactory::new(
        config.token_api_url.clone(),
        config.session_api_url.clone(),
        config.request_timeout.as_millis() as u64,
    ));

    let sync_config = SyncConfig {
        organization_deadline: config.sync_deadline,
        ..SyncConfig::default()
    };

    let orchestrator = SyncOrchestrator::new(
        repositories.clone(),
        factory.clone(),
        blob_store,
        sync_config,
    );
    let cancellation = CancellationCommand::new(
        repositories,
        orchestrator.session_manager().clone(),
        factory,
    );

    Ok(Arc::new(AppState {
        orchestrator: Arc::new(orchestrator),
        cancellation: Arc::new(cancellation),
        auth: Arc::new(AuthManager::new(&config.jwt_secret)),
        cron_secret: config.cron_secret.clone(),
    }))
}
