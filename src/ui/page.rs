//! 分类页的视图状态
//!
//! 只保存表单、焦点与最近一次结果；按键在这里转成 PageAction，由 app 主循环执行（发请求、弹确认等）。

use std::collections::BTreeMap;

use crossterm::event::{KeyCode, KeyEvent};

use crate::classifier::{ClassificationSchemaDto, ClassifiedMessageDto, ClassifyingMessageDto};

/// 表单焦点，Tab 顺序即声明顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    Name,
    Topic,
    #[default]
    Text,
    GenerateAnswer,
    Submit,
}

impl Field {
    const ORDER: [Field; 5] = [
        Field::Name,
        Field::Topic,
        Field::Text,
        Field::GenerateAnswer,
        Field::Submit,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// 需要主循环执行的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Submit(ClassifyingMessageDto),
}

/// 后台任务回传给页面的结果
#[derive(Debug)]
pub enum PageEvent {
    SchemaLoaded(ClassificationSchemaDto),
    Classified(ClassifiedMessageDto),
    RequestFinished,
    ClearConfirmed,
}

#[derive(Debug, Clone, Default)]
pub struct ClassifierPage {
    pub name: String,
    pub topic: String,
    pub text: String,
    pub generate_answer: bool,
    pub focus: Field,
    /// 属性名 -> 显示名（schema 加载前为空，按原名显示）
    pub labels: BTreeMap<String, String>,
    pub result: Option<ClassifiedMessageDto>,
    /// 分类请求进行中
    pub busy: bool,
}

impl ClassifierPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.labels.get(attribute).map(String::as_str).unwrap_or(attribute)
    }

    fn focused_buffer(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Name => Some(&mut self.name),
            Field::Topic => Some(&mut self.topic),
            Field::Text => Some(&mut self.text),
            Field::GenerateAnswer | Field::Submit => None,
        }
    }

    /// 构造请求；正文为空时返回 None
    pub fn request(&self) -> Option<ClassifyingMessageDto> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        let optional = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        Some(ClassifyingMessageDto {
            name: optional(&self.name),
            topic: optional(&self.topic),
            text: text.to_string(),
            generate_answer: self.generate_answer,
        })
    }

    /// 提交：请求进行中或正文为空时忽略
    pub fn submit(&mut self) -> Option<PageAction> {
        if self.busy {
            return None;
        }
        let request = self.request()?;
        self.busy = true;
        Some(PageAction::Submit(request))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PageAction> {
        match key.code {
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Enter => match self.focus {
                Field::Text => self.text.push('\n'),
                Field::GenerateAnswer => self.generate_answer = !self.generate_answer,
                Field::Submit => return self.submit(),
                Field::Name | Field::Topic => self.focus = self.focus.next(),
            },
            KeyCode::Char(' ') if self.focus == Field::GenerateAnswer => {
                self.generate_answer = !self.generate_answer;
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = self.focused_buffer() {
                    buffer.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.focused_buffer() {
                    buffer.pop();
                }
            }
            _ => {}
        }
        None
    }

    pub fn apply(&mut self, event: PageEvent) {
        match event {
            PageEvent::SchemaLoaded(schema) => self.labels = schema.attribute_labels,
            PageEvent::Classified(result) => self.result = Some(result),
            PageEvent::RequestFinished => self.busy = false,
            PageEvent::ClearConfirmed => self.clear(),
        }
    }

    /// 清空表单与结果，保留 schema
    pub fn clear(&mut self) {
        *self = Self {
            labels: std::mem::take(&mut self.labels),
            busy: self.busy,
            ..Self::default()
        };
    }
}
