//! TUI 应用主循环
//!
//! 先导航到 "/"，再进入全屏/原始模式。每帧：取回后台任务结果、读 PageStore 快照并渲染、
//! 处理按键。有待回答的确认时按键只作用于确认框。

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::classifier::{ClassifierApi, ClassifyingMessageDto};
use crate::core::{App, Confirmation, PageStore};
use crate::router::{Navigation, ViewKind};
use crate::ui::event::{AppEvent, EventHandler, Shortcut};
use crate::ui::page::{ClassifierPage, PageAction, PageEvent};
use crate::ui::render::draw;

const CLEAR_QUESTION: &str = "Очистить форму и результат?";

/// 运行 TUI：导航失败直接返回错误（交给 run_with_reload），退出时恢复终端
pub async fn run_app(app: &App) -> anyhow::Result<()> {
    let navigation = app.router.navigate("/").await?;
    tracing::info!(path = %navigation.path, "Initial navigation done");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app, &navigation).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &App,
    navigation: &Navigation,
) -> anyhow::Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let event_handler = EventHandler::new();
    let classifier = app.injector.classifier.clone();
    let mut page = ClassifierPage::new();

    if navigation.view() == Some(ViewKind::ClassifierPage) {
        spawn_schema_load(classifier.clone(), app.store.clone(), event_tx.clone());
    }

    loop {
        while let Ok(event) = event_rx.try_recv() {
            page.apply(event);
        }

        let snapshot = app.store.snapshot();
        terminal.draw(|f| draw(f, navigation, &page, &snapshot))?;

        if let Some(ev) = event_handler.poll()? {
            match ev {
                AppEvent::Shortcut(Shortcut::Quit) => break,
                AppEvent::Shortcut(Shortcut::Dismiss) => {
                    if let Some(first) = snapshot.notifications.first() {
                        app.store.mark_notification_viewed(first);
                    }
                }
                AppEvent::Shortcut(Shortcut::Clear) => {
                    spawn_clear_confirmation(&app.store, event_tx.clone());
                }
                AppEvent::Shortcut(Shortcut::Submit) => {
                    if let Some(action) = page.submit() {
                        perform(action, &classifier, &app.store, &event_tx);
                    }
                }
                AppEvent::Key(key) => {
                    if let Some(item) = snapshot.confirmations.first() {
                        handle_confirmation_key(&app.store, item, key);
                    } else if let Some(action) = page.handle_key(key) {
                        perform(action, &classifier, &app.store, &event_tx);
                    }
                }
            }
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}

/// 确认框按键：y/Enter 同意，n/Esc 拒绝，a 切换「一分钟内不再询问」
pub fn handle_confirmation_key(store: &PageStore, item: &Confirmation, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            store.set_confirmed(item, true);
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            store.set_confirmed(item, false);
        }
        KeyCode::Char('a') => {
            store.set_auto_confirm(item.id, !item.auto_confirm);
        }
        _ => {}
    }
}

fn perform(
    action: PageAction,
    classifier: &Arc<dyn ClassifierApi>,
    store: &Arc<PageStore>,
    tx: &mpsc::UnboundedSender<PageEvent>,
) {
    match action {
        PageAction::Submit(request) => {
            spawn_classify(request, classifier.clone(), store.clone(), tx.clone())
        }
    }
}

fn spawn_schema_load(
    classifier: Arc<dyn ClassifierApi>,
    store: Arc<PageStore>,
    tx: mpsc::UnboundedSender<PageEvent>,
) {
    tokio::spawn(async move {
        match classifier.get_classification_schema().await {
            Ok(schema) => {
                let _ = tx.send(PageEvent::SchemaLoaded(schema));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to load classification schema");
                store.notify_exception(e);
            }
        }
    });
}

fn spawn_classify(
    request: ClassifyingMessageDto,
    classifier: Arc<dyn ClassifierApi>,
    store: Arc<PageStore>,
    tx: mpsc::UnboundedSender<PageEvent>,
) {
    tokio::spawn(async move {
        match classifier.classify(&request).await {
            Ok(result) => {
                let _ = tx.send(PageEvent::Classified(result));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Classification request failed");
                store.notify_exception(e);
            }
        }
        let _ = tx.send(PageEvent::RequestFinished);
    });
}

/// 自动确认窗口内立即清空；否则等用户回答
fn spawn_clear_confirmation(store: &PageStore, tx: mpsc::UnboundedSender<PageEvent>) {
    let decision = store.confirm(CLEAR_QUESTION);
    tokio::spawn(async move {
        if decision.wait().await {
            let _ = tx.send(PageEvent::ClearConfirmed);
        }
    });
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
