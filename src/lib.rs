//! Triage - 客服工单分类客户端与服务
//!
//! 模块划分：
//! - **classifier**: DTO、分类客户端（HTTP / Mock）、属性表、LLM 分类服务与 HTTP 接口
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 请求封装、页面状态（确认与通知队列）、组装与启动、优雅关闭
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）与结构化输出
//! - **observability**: tracing 日志初始化
//! - **router**: 路由表、重定向与懒加载视图
//! - **ui**: Ratatui TUI 界面

pub mod classifier;
pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod router;
pub mod ui;
