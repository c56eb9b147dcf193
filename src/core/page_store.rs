//! 页面级 UI 状态：加载标志、待确认提示、待查看通知
//!
//! 确认提示用「待决表」建模：confirm 登记一项并返回 Decision，set_confirmed 按 id 取出并通过 oneshot 给出结果。
//! 所有修改都在短锁内完成，锁内不 await。
//!
//! 自动确认窗口用截止时间表示（tokio 时钟，测试中可暂停），不留后台定时器；重复激活会把窗口重置为从最新一次起算。
//! 从未得到答复的 confirm 会一直等待，直到 teardown 或 PageStore 被丢弃，此时按「否」处理。

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

/// 接受一个带 auto_confirm 的确认后，后续 confirm 自动通过的时长
pub const AUTO_CONFIRM_TIMEOUT: Duration = Duration::from_millis(60_000);

/// 待用户回答的是/否提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub id: u64,
    pub question: String,
    /// 用户勾选「一分钟内不再询问」
    pub auto_confirm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationColor {
    Error,
    Warning,
    Info,
}

impl fmt::Display for NotificationColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationColor::Error => "error",
            NotificationColor::Warning => "warning",
            NotificationColor::Info => "info",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub color: NotificationColor,
}

/// confirm 的结果：自动确认窗口内直接为 Resolved(true)，否则等待 set_confirmed
#[derive(Debug)]
pub enum Decision {
    Resolved(bool),
    Pending { id: u64, rx: oneshot::Receiver<bool> },
}

impl Decision {
    /// 待决项的 id；已直接给出结果时为 None
    pub fn id(&self) -> Option<u64> {
        match self {
            Decision::Resolved(_) => None,
            Decision::Pending { id, .. } => Some(*id),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Decision::Pending { .. })
    }

    /// 等待答复；待决项在答复前被丢弃（teardown）时返回 false
    pub async fn wait(self) -> bool {
        match self {
            Decision::Resolved(value) => value,
            Decision::Pending { rx, .. } => rx.await.unwrap_or(false),
        }
    }
}

/// 渲染用快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    pub is_loading: bool,
    pub auto_confirm_active: bool,
    pub confirmations: Vec<Confirmation>,
    pub notifications: Vec<Notification>,
}

struct PendingConfirmation {
    item: Confirmation,
    resolve: oneshot::Sender<bool>,
}

struct PageState {
    is_loading: bool,
    auto_confirm_until: Option<Instant>,
    confirmations: Vec<PendingConfirmation>,
    notifications: Vec<Notification>,
    last_confirmation_id: u64,
    last_notification_id: u64,
}

impl PageState {
    fn auto_confirm_active(&self) -> bool {
        self.auto_confirm_until.is_some_and(|until| Instant::now() < until)
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            // 首次导航完成前视为加载中
            is_loading: true,
            auto_confirm_until: None,
            confirmations: Vec::new(),
            notifications: Vec::new(),
            last_confirmation_id: 0,
            last_notification_id: 0,
        }
    }
}

/// 按 id 删除一项，保持其余项的相对顺序
fn remove_by_id<T>(items: &mut Vec<T>, id: u64, key: impl Fn(&T) -> u64) -> Option<T> {
    let index = items.iter().position(|item| key(item) == id)?;
    Some(items.remove(index))
}

#[derive(Default)]
pub struct PageStore {
    state: Mutex<PageState>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn set_loading(&self, loading: bool) {
        self.state().is_loading = loading;
    }

    pub fn auto_confirm_active(&self) -> bool {
        self.state().auto_confirm_active()
    }

    /// 请求是/否确认
    pub fn confirm(&self, question: impl Into<String>) -> Decision {
        let mut state = self.state();
        if state.auto_confirm_active() {
            return Decision::Resolved(true);
        }

        state.last_confirmation_id += 1;
        let id = state.last_confirmation_id;
        let (tx, rx) = oneshot::channel();
        state.confirmations.push(PendingConfirmation {
            item: Confirmation {
                id,
                question: question.into(),
                auto_confirm: false,
            },
            resolve: tx,
        });
        tracing::debug!(id, "confirmation requested");
        Decision::Pending { id, rx }
    }

    /// 修改待决项的 auto_confirm 勾选；id 不存在时返回 false
    pub fn set_auto_confirm(&self, id: u64, auto_confirm: bool) -> bool {
        let mut state = self.state();
        match state.confirmations.iter_mut().find(|p| p.item.id == id) {
            Some(pending) => {
                pending.item.auto_confirm = auto_confirm;
                true
            }
            None => false,
        }
    }

    /// 答复确认。item 已不在待决表中（重复调用）时什么也不做并返回 false
    pub fn set_confirmed(&self, item: &Confirmation, confirmed: bool) -> bool {
        let pending = {
            let mut state = self.state();
            let removed = remove_by_id(&mut state.confirmations, item.id, |p| p.item.id);
            let Some(pending) = removed else {
                tracing::debug!(id = item.id, "confirmation already resolved");
                return false;
            };
            if confirmed && item.auto_confirm {
                state.auto_confirm_until = Some(Instant::now() + AUTO_CONFIRM_TIMEOUT);
                tracing::info!(id = item.id, "auto confirm enabled for {:?}", AUTO_CONFIRM_TIMEOUT);
            }
            pending
        };
        // 等待方可能已放弃结果
        let _ = pending.resolve.send(confirmed);
        true
    }

    /// 把任意错误记为一条 error 通知
    pub fn notify_exception(&self, error: impl fmt::Display) {
        self.notify(error.to_string(), NotificationColor::Error);
    }

    pub fn notify(&self, message: impl Into<String>, color: NotificationColor) {
        let mut state = self.state();
        state.last_notification_id += 1;
        let id = state.last_notification_id;
        state.notifications.push(Notification {
            id,
            message: message.into(),
            color,
        });
    }

    /// 用户关闭通知；重复调用返回 false
    pub fn mark_notification_viewed(&self, notification: &Notification) -> bool {
        remove_by_id(&mut self.state().notifications, notification.id, |n| n.id).is_some()
    }

    pub fn confirmations(&self) -> Vec<Confirmation> {
        self.state()
            .confirmations
            .iter()
            .map(|p| p.item.clone())
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    pub fn snapshot(&self) -> PageSnapshot {
        let state = self.state();
        PageSnapshot {
            is_loading: state.is_loading,
            auto_confirm_active: state.auto_confirm_active(),
            confirmations: state.confirmations.iter().map(|p| p.item.clone()).collect(),
            notifications: state.notifications.clone(),
        }
    }

    /// 清空所有状态；仍在等待的 confirm 得到 false。计数器不回退，id 不复用
    pub fn teardown(&self) {
        let mut state = self.state();
        let dropped = state.confirmations.len();
        state.confirmations.clear();
        state.notifications.clear();
        state.auto_confirm_until = None;
        if dropped > 0 {
            tracing::debug!(dropped, "pending confirmations declined on teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_item(store: &PageStore, id: u64) -> Confirmation {
        store
            .confirmations()
            .into_iter()
            .find(|c| c.id == id)
            .expect("pending confirmation")
    }

    #[test]
    fn test_initial_state() {
        let store = PageStore::new();
        let snapshot = store.snapshot();
        assert!(snapshot.is_loading);
        assert!(!snapshot.auto_confirm_active);
        assert!(snapshot.confirmations.is_empty());
        assert!(snapshot.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_confirm_creates_independent_items_with_increasing_ids() {
        let store = PageStore::new();
        let decisions: Vec<_> = (0..4).map(|i| store.confirm(format!("q{i}"))).collect();
        let ids: Vec<u64> = decisions.iter().filter_map(Decision::id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(store.confirmations().len(), 4);

        let item = pending_item(&store, 3);
        assert_eq!(item.question, "q2");
        assert!(!item.auto_confirm);
        assert!(store.set_confirmed(&item, true));

        let mut decisions = decisions.into_iter();
        let first = decisions.next().unwrap();
        let _second = decisions.next().unwrap();
        let third = decisions.next().unwrap();
        assert!(third.wait().await);
        assert_eq!(
            store.confirmations().iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 2, 4]
        );

        let item = pending_item(&store, 1);
        store.set_confirmed(&item, false);
        assert!(!first.wait().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_confirm_window() {
        let store = PageStore::new();
        let decision = store.confirm("Удалить?");
        let id = decision.id().unwrap();
        assert!(store.set_auto_confirm(id, true));
        let item = pending_item(&store, id);

        assert!(store.set_confirmed(&item, true));
        assert!(decision.wait().await);
        assert!(store.auto_confirm_active());

        let during = store.confirm("Ещё раз?");
        assert!(!during.is_pending());
        assert!(during.wait().await);
        assert!(store.confirmations().is_empty());

        tokio::time::advance(Duration::from_millis(59_999)).await;
        assert!(!store.confirm("Почти минута").is_pending());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!store.auto_confirm_active());
        let after = store.confirm("После окна");
        assert_eq!(after.id(), Some(2));
        assert_eq!(store.confirmations().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reactivation_resets_window() {
        let store = PageStore::new();
        let first = store.confirm("a");
        let second = store.confirm("b");
        let (first_id, second_id) = (first.id().unwrap(), second.id().unwrap());
        store.set_auto_confirm(first_id, true);
        store.set_auto_confirm(second_id, true);

        store.set_confirmed(&pending_item(&store, first_id), true);
        tokio::time::advance(Duration::from_secs(30)).await;
        store.set_confirmed(&pending_item(&store, second_id), true);

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(store.auto_confirm_active());
        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(!store.auto_confirm_active());
        assert!(first.wait().await && second.wait().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_confirmation_never_activates_auto_confirm() {
        let store = PageStore::new();
        let decision = store.confirm("q");
        let id = decision.id().unwrap();
        store.set_auto_confirm(id, true);
        let item = pending_item(&store, id);

        assert!(store.set_confirmed(&item, false));
        assert!(!decision.wait().await);
        assert!(!store.auto_confirm_active());
        assert!(store.confirm("next").is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_confirmed_is_idempotent() {
        let store = PageStore::new();
        let decision = store.confirm("q");
        let item = Confirmation {
            auto_confirm: true,
            ..pending_item(&store, decision.id().unwrap())
        };

        assert!(store.set_confirmed(&item, false));
        assert!(!store.set_confirmed(&item, true));
        assert!(!decision.wait().await);
        assert!(!store.auto_confirm_active());
    }

    #[test]
    fn test_notifications_remove_by_id_preserves_order() {
        let store = PageStore::new();
        store.notify_exception("first");
        store.notify_exception(crate::core::ApiError::Status {
            status: 502,
            body: "bad gateway".into(),
        });
        store.notify_exception("third");

        let notifications = store.notifications();
        assert_eq!(
            notifications.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(notifications[1].message, "HTTP 502: bad gateway");
        assert!(notifications.iter().all(|n| n.color == NotificationColor::Error));

        assert!(store.mark_notification_viewed(&notifications[1]));
        assert!(!store.mark_notification_viewed(&notifications[1]));
        assert_eq!(
            store.notifications().iter().map(|n| n.message.as_str()).collect::<Vec<_>>(),
            vec!["first", "third"]
        );

        store.notify_exception("fourth");
        assert_eq!(store.notifications().last().unwrap().id, 4);
    }

    #[tokio::test]
    async fn test_teardown_declines_pending_confirmations() {
        let store = PageStore::new();
        let decision = store.confirm("q");
        store.notify_exception("boom");
        store.teardown();

        assert!(!decision.wait().await);
        assert!(store.snapshot().confirmations.is_empty());
        assert!(store.snapshot().notifications.is_empty());
        assert_eq!(store.confirm("after").id(), Some(2));
    }

    #[test]
    fn test_loading_flag() {
        let store = PageStore::new();
        store.set_loading(false);
        assert!(!store.is_loading());
        store.set_loading(true);
        assert!(store.snapshot().is_loading);
    }
}
