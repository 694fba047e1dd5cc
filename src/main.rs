use std::sync::Arc;

use auth_data::repositories::{
    CredentialRepository, MongoCredentialRepository, MongoTokenRepository, TokenRepository,
};
use auth_domain::hashing_service::{Pbkdf2HashingService, DEFAULT_SALT_LENGTH};
use auth_domain::token_service::JwtTokenService;
use auth_domain::{AuthServiceImpl, PasswordPolicy, TokenService};
use auth_server::config::Config;
use auth_server::proto_stub::auth::protobuf::auth_grpc_service_server::AuthGrpcServiceServer;
use auth_server::purge::spawn_token_purge;
use auth_server::service::AuthGrpcServiceImpl;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tokio::sync::{watch, RwLock};
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "auth_server=info,auth_domain=info,auth_data=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!("Starting auth server with config: {:?}", config);

    let mut options = ClientOptions::parse(&config.mongo_uri).await?;
    options.app_name = Some("auth_server".to_string());
    options.connect_timeout = Some(config.store_timeout);
    options.server_selection_timeout = Some(config.store_timeout);
    let client = Client::with_options(options)?;
    let db = Arc::new(RwLock::new(client.database(&config.db_name)));

    let credential_repository = Arc::new(MongoCredentialRepository::new(
        db.clone(),
        config.credentials_collection.clone(),
        config.store_timeout,
    ));
    let token_repository = Arc::new(MongoTokenRepository::new(
        db,
        config.tokens_collection.clone(),
        config.store_timeout,
    ));
    credential_repository.ensure_indexes().await?;
    token_repository.ensure_indexes().await?;

    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(
        config.token_config()?,
        token_repository,
    ));
    let hashing_service = Arc::new(Pbkdf2HashingService::new(
        DEFAULT_SALT_LENGTH,
        config.hash_iterations,
    ));

    let auth_service = AuthServiceImpl::new(
        credential_repository,
        token_service.clone(),
        hashing_service,
        PasswordPolicy::default(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let purge = spawn_token_purge(token_service, config.purge_interval, shutdown_rx);

    let grpc_service = AuthGrpcServiceImpl::new(Box::new(auth_service));

    info!("Auth server listening on {}", config.grpc_addr);
    Server::builder()
        .add_service(AuthGrpcServiceServer::new(grpc_service))
        .serve_with_shutdown(config.grpc_addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    purge.await?;

    Ok(())
}
