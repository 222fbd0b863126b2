mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::access_tokens::{routes as tokens_routes, AccessTokenService};
use crate::features::admin::{routes as admin_routes, AdminService};
use crate::features::audit::AuditService;
use crate::features::auth::routes as auth_routes;
use crate::features::auth::{AuthService, JwtValidator};
use crate::features::files::{routes as files_routes, FileService};
use crate::features::recycle_bin::{routes as recycle_bin_routes, RecycleBinService};
use crate::features::shares::{routes as shares_routes, ShareService};
use crate::features::users::{routes as users_routes, UserProfileService};
use crate::modules::email::{Mailer, ResendClient};
use crate::modules::scanner::{PollPolicy, ScanPipeline, VirusTotalClient};
use crate::modules::storage::{MinIOClient, ObjectStore};
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    // Database
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // External collaborators
    let minio_client: Arc<dyn ObjectStore> = Arc::new(
        MinIOClient::new(config.minio.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?,
    );

    let virustotal = VirusTotalClient::new(&config.scanner)
        .map_err(|e| anyhow::anyhow!("Failed to initialize scanner client: {}", e))?;
    let scan_pipeline = ScanPipeline::new(
        Arc::new(virustotal),
        PollPolicy {
            attempts: config.scanner.poll_attempts,
            interval: config.scanner.poll_interval,
        },
    );
    tracing::info!(
        "Malware scanner initialized (poll_attempts={}, poll_interval={:?})",
        config.scanner.poll_attempts,
        config.scanner.poll_interval
    );

    let resend = ResendClient::new(&config.email)
        .map_err(|e| anyhow::anyhow!("Failed to initialize email client: {}", e))?;
    let mailer = Arc::new(Mailer::new(
        Arc::new(resend),
        &config.app.frontend_url,
        config.security.otp_ttl,
    ));
    tracing::info!("Email client initialized (from={})", config.email.from);

    // Services
    let jwt_validator = Arc::new(JwtValidator::new(&config.auth));
    let audit_service = Arc::new(AuditService::new(pool.clone()));

    let auth_service = Arc::new(AuthService::new(pool.clone(), Arc::clone(&jwt_validator)));

    let access_token_service = Arc::new(AccessTokenService::new(
        pool.clone(),
        &config.access_token,
        Arc::clone(&audit_service),
    ));

    let user_profile_service = Arc::new(UserProfileService::new(
        pool.clone(),
        Arc::clone(&minio_client),
        Arc::clone(&audit_service),
        config.security.clone(),
    ));

    let file_service = Arc::new(
        FileService::new(
            pool.clone(),
            Arc::clone(&minio_client),
            scan_pipeline,
            Arc::clone(&mailer),
            Arc::clone(&access_token_service),
            Arc::clone(&audit_service),
            config.security.clone(),
        )
        .with_max_file_size(config.app.max_file_size),
    );

    let share_service = Arc::new(ShareService::new(
        pool.clone(),
        Arc::clone(&file_service),
        Arc::clone(&access_token_service),
        Arc::clone(&mailer),
        Arc::clone(&audit_service),
        config.security.clone(),
    ));

    let recycle_bin_service = Arc::new(RecycleBinService::new(
        pool.clone(),
        Arc::clone(&file_service),
        Arc::clone(&mailer),
        Arc::clone(&audit_service),
    ));

    let admin_service = Arc::new(AdminService::new(
        pool.clone(),
        Arc::clone(&jwt_validator),
        Arc::clone(&file_service),
        Arc::clone(&recycle_bin_service),
        Arc::clone(&user_profile_service),
        Arc::clone(&audit_service),
    ));
    admin_service
        .seed_bootstrap_admin(&config.bootstrap_admin)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed bootstrap admin: {}", e))?;
    tracing::info!("Services initialized");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require a session token)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(&auth_service)))
        .merge(users_routes::routes(user_profile_service))
        .merge(files_routes::routes(file_service))
        .merge(shares_routes::routes(share_service))
        .merge(recycle_bin_routes::routes(recycle_bin_service))
        .merge(tokens_routes::protected_routes(Arc::clone(
            &access_token_service,
        )))
        .merge(admin_routes::protected_routes(Arc::clone(&admin_service)))
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_validator.clone(),
            middleware::auth_middleware,
        ));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .merge(auth_routes::public_routes(auth_service))
        .merge(admin_routes::public_routes(admin_service))
        .merge(tokens_routes::public_routes(access_token_service));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
