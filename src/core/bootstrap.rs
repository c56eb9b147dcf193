//! 组装与启动
//!
//! Injector 在启动时一次性决定 ClassifierApi 绑定哪一个实现（真实后端或 Mock）；
//! run_with_reload 包住整个应用：启动失败时弹出错误提示，1 秒后整体重新加载。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::classifier::{ClassifierApi, HttpClassifierApi, MockClassifierApi};
use crate::config::AppConfig;
use crate::core::{ApiError, ApiService, PageStore};
use crate::router::Router;

/// 致命错误后到重新加载的等待
pub const RELOAD_DELAY: Duration = Duration::from_secs(1);

/// 组装好的服务
#[derive(Clone)]
pub struct Injector {
    pub config: Arc<AppConfig>,
    pub api: Arc<ApiService>,
    pub classifier: Arc<dyn ClassifierApi>,
}

impl Injector {
    pub fn from_config(config: AppConfig) -> Result<Self, ApiError> {
        let api = Arc::new(ApiService::new(&config.api)?);
        let classifier: Arc<dyn ClassifierApi> = if config.classifier.mock {
            tracing::info!("Binding mock classifier API");
            Arc::new(MockClassifierApi)
        } else {
            tracing::info!(base_url = %api.base_url(), "Binding HTTP classifier API");
            Arc::new(HttpClassifierApi::new(api.clone()))
        };
        Ok(Self {
            config: Arc::new(config),
            api,
            classifier,
        })
    }
}

/// 挂载到界面的应用上下文
pub struct App {
    pub injector: Injector,
    pub store: Arc<PageStore>,
    pub router: Router,
}

impl App {
    pub fn new(injector: Injector) -> Self {
        let store = Arc::new(PageStore::new());
        let router = Router::with_default_routes(store.clone());
        Self {
            injector,
            store,
            router,
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.store.teardown();
    }
}

/// 反复运行 `start`，直到它成功返回。
///
/// 每次失败：记录错误、调用 `alert` 阻塞提示，等待 RELOAD_DELAY 后重新开始；不限次数。
pub async fn run_with_reload<F, Fut, A>(mut start: F, mut alert: A)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
    A: FnMut(&anyhow::Error),
{
    loop {
        match start().await {
            Ok(()) => return,
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "Fatal error, reloading");
                alert(&e);
                tokio::time::sleep(RELOAD_DELAY).await;
            }
        }
    }
}

/// 终端下的「alert」：写到 stderr
pub fn alert_stderr(error: &anyhow::Error) {
    eprintln!("Error: {error:#}");
}
