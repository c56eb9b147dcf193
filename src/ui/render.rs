//! 界面渲染
//!
//! 标题栏显示当前路径与加载状态；左侧为表单，右侧为分类结果；底部为通知；
//! 有待回答的确认时在中间叠加确认框。

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use serde_json::Value;

use crate::core::{Confirmation, NotificationColor, PageSnapshot};
use crate::router::{Navigation, ViewKind};
use crate::ui::page::{ClassifierPage, Field};

/// 底部最多同时显示的通知条数
const MAX_VISIBLE_NOTIFICATIONS: usize = 3;

const HINT: &str = " Tab поле │ Ctrl+S классифицировать │ Ctrl+L очистить │ Ctrl+D скрыть уведомление │ Ctrl+Q выход ";

/// 属性值的显示文本：null 为占位符，字符串不带引号
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "—".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn notification_color(color: NotificationColor) -> Color {
    match color {
        NotificationColor::Error => Color::Red,
        NotificationColor::Warning => Color::Yellow,
        NotificationColor::Info => Color::Cyan,
    }
}

/// 在 area 中居中取 width x height 的矩形（不超出 area）
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { Color::Yellow } else { Color::Blue };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

/// 绘制一帧
pub fn draw(
    f: &mut Frame,
    navigation: &Navigation,
    page: &ClassifierPage,
    snapshot: &PageSnapshot,
) {
    let visible = snapshot.notifications.len().min(MAX_VISIBLE_NOTIFICATIONS) as u16;
    let notifications_height = if visible == 0 { 0 } else { visible + 2 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(notifications_height)])
        .split(f.area());

    let mut status = Vec::new();
    if snapshot.is_loading || page.busy {
        status.push("загрузка…");
    }
    if snapshot.auto_confirm_active {
        status.push("автоподтверждение");
    }
    let title = if status.is_empty() {
        format!(" Triage │ {} ", navigation.path)
    } else {
        format!(" Triage │ {} │ {} ", navigation.path, status.join(" │ "))
    };
    let frame_block = Block::default()
        .title(title)
        .title_bottom(Line::from(Span::styled(HINT, Style::default().fg(Color::DarkGray))))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let body = frame_block.inner(chunks[0]);
    f.render_widget(frame_block, chunks[0]);

    if navigation.view() == Some(ViewKind::ClassifierPage) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(body);
        draw_form(f, page, columns[0]);
        draw_result(f, page, columns[1]);
    }

    if visible > 0 {
        draw_notifications(f, snapshot, chunks[1]);
    }

    if let Some(item) = snapshot.confirmations.first() {
        draw_confirmation(f, item, f.area());
    }
}

fn draw_form(f: &mut Frame, page: &ClassifierPage, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let focused = |field: Field| page.focus == field;
    f.render_widget(
        Paragraph::new(page.name.as_str()).block(field_block(" Имя ", focused(Field::Name))),
        rows[0],
    );
    f.render_widget(
        Paragraph::new(page.topic.as_str()).block(field_block(" Тема ", focused(Field::Topic))),
        rows[1],
    );
    f.render_widget(
        Paragraph::new(page.text.as_str())
            .block(field_block(" Текст обращения ", focused(Field::Text)))
            .wrap(Wrap { trim: false }),
        rows[2],
    );

    let highlight = |field: Field| {
        if focused(field) {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };
    let checkbox = if page.generate_answer { "[x]" } else { "[ ]" };
    f.render_widget(
        Paragraph::new(format!(" {checkbox} Сгенерировать ответ"))
            .style(highlight(Field::GenerateAnswer)),
        rows[3],
    );
    let submit = if page.busy {
        " [ Классификация… ]"
    } else {
        " [ Классифицировать ]"
    };
    f.render_widget(Paragraph::new(submit).style(highlight(Field::Submit)), rows[4]);
}

fn draw_result(f: &mut Frame, page: &ClassifierPage, area: Rect) {
    let block = Block::default()
        .title(" Результат ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let Some(result) = &page.result else {
        f.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let (verdict, color) = if result.valid {
        ("все атрибуты заполнены", Color::Green)
    } else {
        ("не хватает данных", Color::Red)
    };
    let mut lines = vec![Line::from(Span::styled(verdict, Style::default().fg(color)))];

    lines.push(Line::from(Span::styled("Атрибуты:", bold)));
    for attribute in &result.attributes {
        lines.push(Line::from(format!(
            "  {}: {}",
            page.label(&attribute.name),
            format_value(&attribute.value)
        )));
    }

    if !result.missing_attributes.is_empty() {
        lines.push(Line::from(Span::styled("Не хватает:", bold)));
        for name in &result.missing_attributes {
            lines.push(Line::from(format!("  - {}", page.label(name))));
        }
    }

    if !result.keywords.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Ключевые слова: ", bold),
            Span::raw(result.keywords.join(", ")),
        ]));
    }

    if let Some(answer) = &result.answer {
        lines.push(Line::from(Span::styled("Ответ:", bold)));
        lines.extend(answer.lines().map(|l| Line::from(l.to_string())));
    }

    f.render_widget(
        Paragraph::new(Text::from(lines)).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_notifications(f: &mut Frame, snapshot: &PageSnapshot, area: Rect) {
    let lines: Vec<Line> = snapshot
        .notifications
        .iter()
        .take(MAX_VISIBLE_NOTIFICATIONS)
        .map(|n| {
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", n.color),
                    Style::default().fg(notification_color(n.color)),
                ),
                Span::raw(n.message.clone()),
            ])
        })
        .collect();
    let title = format!(" Уведомления ({}) ", snapshot.notifications.len());
    let block = Block::default().title(title).borders(Borders::ALL);
    f.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn draw_confirmation(f: &mut Frame, item: &Confirmation, area: Rect) {
    let rect = centered_rect(60, 7, area);
    let checkbox = if item.auto_confirm { "[x]" } else { "[ ]" };
    let text = Text::from(vec![
        Line::from(item.question.clone()),
        Line::from(""),
        Line::from(format!("{checkbox} a: не спрашивать в течение минуты")),
        Line::from(Span::styled(
            "y / Enter: да   n / Esc: нет",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    let block = Block::default()
        .title(" Подтверждение ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifiedMessageDto, ClassifierAttributeDto};
    use crate::core::Notification;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn render(page: &ClassifierPage, snapshot: &PageSnapshot) -> String {
        let navigation = Navigation {
            name: None,
            path: "/classifier".into(),
            matched: vec![ViewKind::BlankLayout, ViewKind::ClassifierPage],
        };
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal
            .draw(|f| draw(f, &navigation, page, snapshot))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&Value::Null), "—");
        assert_eq!(format_value(&json!("SN-1")), "SN-1");
        assert_eq!(format_value(&json!(3)), "3");
    }

    #[test]
    fn test_draw_result_and_notifications() {
        let mut page = ClassifierPage::new();
        page.labels.insert("failure_point".into(), "Точка отказа".into());
        page.result = Some(ClassifiedMessageDto {
            valid: false,
            attributes: vec![ClassifierAttributeDto {
                name: "failure_point".into(),
                value: json!("Клавиатура"),
            }],
            missing_attributes: vec!["serial_number".into()],
            keywords: vec!["Клавиатура".into()],
            answer: None,
        });
        let snapshot = PageSnapshot {
            is_loading: true,
            notifications: vec![Notification {
                id: 1,
                message: "timeout".into(),
                color: NotificationColor::Error,
            }],
            ..PageSnapshot::default()
        };
        let screen = render(&page, &snapshot);
        assert!(screen.contains("/classifier"));
        assert!(screen.contains("загрузка…"));
        assert!(screen.contains("Точка отказа: Клавиатура"));
        assert!(screen.contains("- serial_number"));
        assert!(screen.contains("[error] timeout"));
    }

    #[test]
    fn test_draw_confirmation_overlay() {
        let snapshot = PageSnapshot {
            confirmations: vec![Confirmation {
                id: 1,
                question: "Очистить форму?".into(),
                auto_confirm: true,
            }],
            ..PageSnapshot::default()
        };
        let screen = render(&ClassifierPage::new(), &snapshot);
        assert!(screen.contains("Очистить форму?"));
        assert!(screen.contains("[x] a:"));
    }

    #[test]
    fn test_centered_rect_is_clamped() {
        let area = Rect::new(0, 0, 40, 5);
        let rect = centered_rect(60, 7, area);
        assert_eq!(rect, Rect::new(0, 0, 40, 5));
        assert_eq!(centered_rect(10, 2, area), Rect::new(15, 1, 10, 2));
    }
}
