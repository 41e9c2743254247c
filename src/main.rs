use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use session_backend::{
    AppState, SessionService, cache::RedisStore, config::Config, middleware::log_errors, routes,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");
    if config.internal_api_key.is_none() {
        tracing::warn!("INTERNAL_API_KEY is not set, session issuing and admin routes are disabled");
    }

    // 连接 Redis，存储不可用时直接退出
    let redis = match RedisStore::new(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Invalid Redis configuration");
            std::process::exit(1);
        }
    };
    if let Err(e) = redis.connect().await {
        tracing::error!(error = %e, "Session store unavailable at startup");
        std::process::exit(1);
    }

    // 设置应用状态
    let state = AppState {
        config: config.clone(),
        sessions: Arc::new(SessionService::new(Arc::new(redis), &config)),
    };

    // 根路径不能使用 nest
    let base = config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        routes::router(state.clone())
    } else {
        Router::new().nest(base, routes::router(state.clone()))
    };
    let router = router.layer(axum::middleware::from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!(
        %addr,
        session_ttl_secs = config.session_ttl_secs,
        "Session service listening"
    );
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router,
    )
    .await
    .expect("Failed to start server");
}
