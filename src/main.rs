//! Triage - 工单分类终端客户端
//!
//! 入口：加载配置、初始化日志，组装服务并挂载 TUI；启动或运行中出现致命错误时提示并在 1 秒后重新加载。
//!
//! 环境变量:
//! - TRIAGE__API__BASE_URL: 分类服务地址
//! - TRIAGE__CLASSIFIER__MOCK=true: 使用内置 Mock，不访问网络
//! - RUST_LOG: 覆盖日志级别

use anyhow::Context;
use triage::config::load_config;
use triage::core::{alert_stderr, run_with_reload, App, Injector};
use triage::ui::run_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 配置读不到时仍以默认级别初始化日志，错误在下面的启动流程中提示
    let log_level = load_config(None)
        .map(|c| c.app.log_level)
        .unwrap_or_else(|_| "warn".to_string());
    triage::observability::init(&log_level);

    run_with_reload(
        || async {
            let config = load_config(None).context("Failed to load config")?;
            let injector = Injector::from_config(config).context("Failed to create services")?;
            let app = App::new(injector);
            run_app(&app).await.context("App run failed")
        },
        alert_stderr,
    )
    .await;

    Ok(())
}
