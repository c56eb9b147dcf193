//! Triage 分类服务
//!
//! 环境变量:
//! - OPENAI_API_KEY 或 DEEPSEEK_API_KEY: LLM API Key
//! - TRIAGE__LLM__PROVIDER: openai / deepseek / mock
//! - TRIAGE__SERVER__BIND / TRIAGE__SERVER__BASE_PATH: 监听地址与路由前缀
//!
//! 启动: cargo run --bin triage-server --features server

#[cfg(feature = "server")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;
    use triage::classifier::server::create_router;
    use triage::classifier::ClassifierService;
    use triage::config::load_config;
    use triage::core::ShutdownManager;
    use triage::llm::{create_llm_client, RetryConfig};

    let config = load_config(None).context("Failed to load config")?;
    triage::observability::init(&config.app.log_level);

    let llm = create_llm_client(&config.llm);
    let service = Arc::new(ClassifierService::new(llm, RetryConfig::from(&config.llm)));
    let app = create_router(service, &config.server.base_path);

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(
        "Triage server listening on http://{}{}",
        config.server.bind,
        config.server.base_path
    );

    let token = shutdown.token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    tracing::info!("Triage server stopped");
    Ok(())
}

#[cfg(not(feature = "server"))]
fn main() {
    eprintln!("请使用 --features server 编译: cargo run --bin triage-server --features server");
    std::process::exit(1);
}
