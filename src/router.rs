//! 视图路由：路径 -> 命名路由 -> 懒加载视图
//!
//! 导航开始时（同步）把 PageStore 的 is_loading 置为 true，导航结束时（无论成功失败）置回 false。

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::future::{self, BoxFuture, Either};
use futures_util::FutureExt;

use crate::core::{PageStore, RouteError};

/// 解析重定向的最大深度
const MAX_REDIRECTS: usize = 8;

/// 命名路由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Main,
}

impl RouteName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteName::Main => "MAIN",
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 可渲染的视图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    BlankLayout,
    ClassifierPage,
}

/// 懒加载视图：首次匹配时调用一次，结果缓存
pub type ViewLoader = Arc<dyn Fn() -> BoxFuture<'static, Result<ViewKind, String>> + Send + Sync>;

pub fn lazy_view<F, Fut>(load: F) -> ViewLoader
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ViewKind, String>> + Send + 'static,
{
    Arc::new(move || load().boxed())
}

pub enum RouteTarget {
    View(ViewLoader),
    Redirect(RouteName),
}

pub struct RouteRecord {
    pub path: &'static str,
    pub name: Option<RouteName>,
    pub target: RouteTarget,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn view(name: RouteName, path: &'static str, loader: ViewLoader) -> Self {
        Self {
            path,
            name: Some(name),
            target: RouteTarget::View(loader),
            children: Vec::new(),
        }
    }

    pub fn layout(path: &'static str, loader: ViewLoader, children: Vec<RouteRecord>) -> Self {
        Self {
            path,
            name: None,
            target: RouteTarget::View(loader),
            children,
        }
    }

    pub fn redirect(path: &'static str, to: RouteName) -> Self {
        Self {
            path,
            name: None,
            target: RouteTarget::Redirect(to),
            children: Vec::new(),
        }
    }
}

/// 展开后的一条可匹配路由：完整路径 + 从外到内的视图链
struct FlatRoute {
    full_path: String,
    name: Option<RouteName>,
    redirect: Option<RouteName>,
    views: Vec<ViewLoader>,
}

fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize_path(child);
    }
    let parent = parent.trim_end_matches('/');
    if child.is_empty() {
        return normalize_path(parent);
    }
    normalize_path(&format!("{parent}/{child}"))
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn flatten(
    records: Vec<RouteRecord>,
    parent_path: &str,
    parent_views: &[ViewLoader],
    out: &mut Vec<FlatRoute>,
) {
    for record in records {
        let full_path = join_path(parent_path, record.path);
        let mut views = parent_views.to_vec();
        let redirect = match record.target {
            RouteTarget::View(loader) => {
                views.push(loader);
                None
            }
            RouteTarget::Redirect(to) => Some(to),
        };
        if record.children.is_empty() || record.name.is_some() {
            out.push(FlatRoute {
                full_path: full_path.clone(),
                name: record.name,
                redirect,
                views: views.clone(),
            });
        }
        flatten(record.children, &full_path, &views, out);
    }
}

/// 导航结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub name: Option<RouteName>,
    pub path: String,
    /// 从布局到页面的视图链
    pub matched: Vec<ViewKind>,
}

impl Navigation {
    /// 最内层视图
    pub fn view(&self) -> Option<ViewKind> {
        self.matched.last().copied()
    }
}

pub struct Router {
    routes: Vec<FlatRoute>,
    store: Arc<PageStore>,
    loaded: Mutex<HashMap<(usize, usize), ViewKind>>,
}

impl Router {
    pub fn new(records: Vec<RouteRecord>, store: Arc<PageStore>) -> Self {
        let mut routes = Vec::new();
        flatten(records, "", &[], &mut routes);
        Self {
            routes,
            store,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// 默认路由表：`/` 为空白布局，其下空路径重定向到 MAIN，`classifier` 为分类页
    pub fn with_default_routes(store: Arc<PageStore>) -> Self {
        let routes = vec![RouteRecord::layout(
            "/",
            lazy_view(|| async { Ok(ViewKind::BlankLayout) }),
            vec![
                RouteRecord::redirect("", RouteName::Main),
                RouteRecord::view(
                    RouteName::Main,
                    "classifier",
                    lazy_view(|| async { Ok(ViewKind::ClassifierPage) }),
                ),
            ],
        )];
        Self::new(routes, store)
    }

    /// 命名路由的路径
    pub fn path_of(&self, name: RouteName) -> Option<&str> {
        self.routes
            .iter()
            .find(|r| r.name == Some(name))
            .map(|r| r.full_path.as_str())
    }

    fn resolve(&self, path: &str) -> Result<usize, RouteError> {
        let mut current = normalize_path(path);
        for _ in 0..=MAX_REDIRECTS {
            let index = self
                .routes
                .iter()
                .position(|r| r.full_path == current)
                .ok_or_else(|| RouteError::NotFound(current.clone()))?;
            match self.routes[index].redirect {
                None => return Ok(index),
                Some(to) => {
                    current = self
                        .path_of(to)
                        .ok_or_else(|| RouteError::UnknownName(to.to_string()))?
                        .to_string();
                }
            }
        }
        Err(RouteError::RedirectLoop(path.to_string()))
    }

    async fn load(&self, index: usize) -> Result<Navigation, RouteError> {
        let route = &self.routes[index];
        let mut matched = Vec::with_capacity(route.views.len());
        for (depth, loader) in route.views.iter().enumerate() {
            let cached = self
                .loaded
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(&(index, depth))
                .copied();
            let view = match cached {
                Some(view) => view,
                None => {
                    let view = loader().await.map_err(|reason| RouteError::ViewLoad {
                        path: route.full_path.clone(),
                        reason,
                    })?;
                    self.loaded
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .insert((index, depth), view);
                    view
                }
            };
            matched.push(view);
        }
        Ok(Navigation {
            name: route.name,
            path: route.full_path.clone(),
            matched,
        })
    }

    /// 开始导航：返回前已把 is_loading 置为 true；返回的 future 完成或被丢弃时置回 false
    pub fn navigate<'a>(
        &'a self,
        path: &str,
    ) -> impl Future<Output = Result<Navigation, RouteError>> + 'a {
        self.store.set_loading(true);
        let guard = LoadingGuard(self.store.as_ref());
        let path = path.to_string();
        async move {
            let result = match self.resolve(&path) {
                Ok(index) => self.load(index).await,
                Err(e) => Err(e),
            };
            drop(guard);
            match &result {
                Ok(nav) => tracing::debug!(from = %path, to = %nav.path, "navigation finished"),
                Err(e) => tracing::warn!(from = %path, error = %e, "navigation failed"),
            }
            result
        }
    }

    /// 按名称导航；路由表中没有该名称时返回 UnknownName
    pub fn push(
        &self,
        name: RouteName,
    ) -> impl Future<Output = Result<Navigation, RouteError>> + '_ {
        match self.path_of(name) {
            Some(path) => Either::Left(self.navigate(path)),
            None => Either::Right(future::ready(Err(RouteError::UnknownName(name.to_string())))),
        }
    }
}

/// 离开作用域时清除 is_loading
struct LoadingGuard<'a>(&'a PageStore);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set_loading(false);
    }
}
