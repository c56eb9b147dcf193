//! 核心层：错误类型、请求封装、页面状态、组装与启动、优雅关闭

pub mod api_service;
pub mod bootstrap;
pub mod error;
pub mod page_store;
pub mod shutdown;

pub use api_service::{ApiService, FetchRequest};
pub use bootstrap::{alert_stderr, run_with_reload, App, Injector, RELOAD_DELAY};
pub use error::{ApiError, RouteError};
pub use page_store::{
    Confirmation, Decision, Notification, NotificationColor, PageSnapshot, PageStore,
    AUTO_CONFIRM_TIMEOUT,
};
pub use shutdown::{ShutdownManager, ShutdownReason};
