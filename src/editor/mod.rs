//! 邮件正文的富文本编辑
//!
//! 编辑器以 HTML 作为内容格式，通过 [`RichTextEditor`] 抽象隔离具体实现；
//! 表单只依赖该 trait，保存时把 HTML 直接映射为 `emailBody`。

pub mod markup;
pub mod preview;
pub mod template_form;

use std::path::PathBuf;

use crate::error::Result;

pub use markup::HtmlEditor;
pub use preview::html_to_lines;
pub use template_form::{CustomEmailForm, TemplateForm};

/// 内容变化时的回调，参数为最新的 HTML
pub type ChangeListener = Box<dyn FnMut(&str) + Send>;

/// 编辑器支持的格式化操作，每个操作在内容末尾追加一个片段
#[derive(Debug, Clone, PartialEq)]
pub enum FormatCommand {
    Paragraph(String),
    Bold(String),
    Italic(String),
    Heading { level: u8, text: String },
    OrderedList(Vec<String>),
    UnorderedList(Vec<String>),
    Link { text: String, url: String },
    /// 读取本地图片并以 base64 data URI 内嵌
    ImageFile(PathBuf),
    Image { mime: String, bytes: Vec<u8>, alt: String },
    Color { text: String, hex: String },
    Highlight { text: String, hex: String },
    LineBreak,
}

pub trait RichTextEditor {
    /// 当前内容（HTML）
    fn content(&self) -> &str;

    /// 整体替换内容，会触发变更回调
    fn set_content(&mut self, html: &str);

    fn on_change(&mut self, listener: ChangeListener);

    fn apply(&mut self, command: FormatCommand) -> Result<()>;
}
