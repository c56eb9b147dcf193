//! 事件处理
//!
//! 轮询 crossterm 键盘事件，把 Ctrl 快捷键转成 Shortcut，其余按键原样交给页面或确认框。

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// 全局快捷键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Ctrl+S 提交分类
    Submit,
    /// Ctrl+L 清空表单（需确认）
    Clear,
    /// Ctrl+D 关闭最早的一条通知
    Dismiss,
    /// Ctrl+Q / Ctrl+C 退出
    Quit,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Shortcut(Shortcut),
    Key(KeyEvent),
}

pub fn map_key(key: KeyEvent) -> AppEvent {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        let shortcut = match key.code {
            KeyCode::Char('s') => Some(Shortcut::Submit),
            KeyCode::Char('l') => Some(Shortcut::Clear),
            KeyCode::Char('d') => Some(Shortcut::Dismiss),
            KeyCode::Char('q') | KeyCode::Char('c') => Some(Shortcut::Quit),
            _ => None,
        };
        if let Some(shortcut) = shortcut {
            return AppEvent::Shortcut(shortcut);
        }
    }
    AppEvent::Key(key)
}

#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// 最多等待 100ms；无按键时返回 None
    pub fn poll(&self) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(map_key(key)));
                }
            }
        }
        Ok(None)
    }
}
