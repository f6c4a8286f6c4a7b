use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{ChangeListener, FormatCommand, RichTextEditor};
use crate::error::{ConsoleError, Result};

/// 内嵌图片的大小上限
const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// 只允许 http / https / mailto 链接
fn check_url(url: &str) -> Result<&str> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    let allowed = ["http://", "https://", "mailto:"]
        .iter()
        .any(|p| lower.starts_with(p) && lower.len() > p.len());
    if allowed {
        Ok(url)
    } else {
        Err(ConsoleError::InvalidInput(format!("unsupported link: {url}")))
    }
}

/// `#rgb` 或 `#rrggbb`
fn check_hex(hex: &str) -> Result<String> {
    let hex = hex.trim();
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(format!("#{}", digits.to_ascii_lowercase()))
    } else {
        Err(ConsoleError::InvalidInput(format!("invalid color: {hex}")))
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => return None,
    })
}

fn image_tag(mime: &str, bytes: &[u8], alt: &str) -> Result<String> {
    if bytes.is_empty() {
        return Err(ConsoleError::InvalidInput("image is empty".into()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ConsoleError::InvalidInput(format!(
            "image exceeds {} bytes",
            MAX_IMAGE_BYTES
        )));
    }
    Ok(format!(
        "<img src=\"data:{};base64,{}\" alt=\"{}\" />",
        mime,
        STANDARD.encode(bytes),
        escape_html(alt)
    ))
}

fn list_items(items: &[String]) -> String {
    items
        .iter()
        .filter(|i| !i.trim().is_empty())
        .map(|i| format!("<li>{}</li>", escape_html(i.trim())))
        .collect()
}

/// 把格式化操作渲染成 HTML 片段
pub fn render(command: &FormatCommand) -> Result<String> {
    Ok(match command {
        FormatCommand::Paragraph(t) => format!("<p>{}</p>", escape_html(t)),
        FormatCommand::Bold(t) => format!("<strong>{}</strong>", escape_html(t)),
        FormatCommand::Italic(t) => format!("<em>{}</em>", escape_html(t)),
        FormatCommand::Heading { level, text } => {
            if !(1..=6).contains(level) {
                return Err(ConsoleError::InvalidInput(format!(
                    "heading level must be 1-6, got {level}"
                )));
            }
            format!("<h{level}>{}</h{level}>", escape_html(text))
        }
        FormatCommand::OrderedList(items) => format!("<ol>{}</ol>", list_items(items)),
        FormatCommand::UnorderedList(items) => format!("<ul>{}</ul>", list_items(items)),
        FormatCommand::Link { text, url } => {
            let url = check_url(url)?;
            let text = if text.trim().is_empty() { url } else { text.as_str() };
            format!("<a href=\"{}\">{}</a>", escape_html(url), escape_html(text))
        }
        FormatCommand::ImageFile(path) => {
            let mime = mime_for_path(path).ok_or_else(|| {
                ConsoleError::InvalidInput(format!("unsupported image type: {}", path.display()))
            })?;
            let bytes = fs::read(path)?;
            let alt = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            image_tag(mime, &bytes, alt)?
        }
        FormatCommand::Image { mime, bytes, alt } => {
            if !mime.starts_with("image/") {
                return Err(ConsoleError::InvalidInput(format!("not an image: {mime}")));
            }
            image_tag(mime, bytes, alt)?
        }
        FormatCommand::Color { text, hex } => format!(
            "<span style=\"color: {}\">{}</span>",
            check_hex(hex)?,
            escape_html(text)
        ),
        FormatCommand::Highlight { text, hex } => format!(
            "<span style=\"background-color: {}\">{}</span>",
            check_hex(hex)?,
            escape_html(text)
        ),
        FormatCommand::LineBreak => "<br />".to_string(),
    })
}

/// 基于 HTML 字符串的编辑器，支持撤销
#[derive(Default)]
pub struct HtmlEditor {
    content: String,
    history: Vec<String>,
    listeners: Vec<ChangeListener>,
}

impl std::fmt::Debug for HtmlEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlEditor")
            .field("content", &self.content)
            .field("history", &self.history.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl HtmlEditor {
    pub fn new(initial: &str) -> Self {
        Self {
            content: initial.to_string(),
            ..Default::default()
        }
    }

    fn replace(&mut self, html: String) {
        let previous = std::mem::replace(&mut self.content, html);
        self.history.push(previous);
        self.notify();
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener(&self.content);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.content = previous;
                self.notify();
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

impl RichTextEditor for HtmlEditor {
    fn content(&self) -> &str {
        &self.content
    }

    fn set_content(&mut self, html: &str) {
        if html != self.content {
            self.replace(html.to_string());
        }
    }

    fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    fn apply(&mut self, command: FormatCommand) -> Result<()> {
        let fragment = render(&command)?;
        let next = format!("{}{}", self.content, fragment);
        self.replace(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn formatting_commands_escape_user_text() {
        let mut editor = HtmlEditor::default();
        editor.apply(FormatCommand::Bold("a < b".into())).unwrap();
        editor
            .apply(FormatCommand::Heading {
                level: 2,
                text: "Hi & bye".into(),
            })
            .unwrap();
        assert_eq!(
            editor.content(),
            "<strong>a &lt; b</strong><h2>Hi &amp; bye</h2>"
        );
    }

    #[test]
    fn lists_links_and_colors() {
        let html = render(&FormatCommand::UnorderedList(vec![
            "one".into(),
            " ".into(),
            "two".into(),
        ]))
        .unwrap();
        assert_eq!(html, "<ul><li>one</li><li>two</li></ul>");

        let html = render(&FormatCommand::Link {
            text: String::new(),
            url: "https://example.com".into(),
        })
        .unwrap();
        assert_eq!(html, "<a href=\"https://example.com\">https://example.com</a>");
        assert!(
            render(&FormatCommand::Link {
                text: "x".into(),
                url: "javascript:alert(1)".into()
            })
            .is_err()
        );

        let html = render(&FormatCommand::Highlight {
            text: "note".into(),
            hex: "FFEE00".into(),
        })
        .unwrap();
        assert_eq!(html, "<span style=\"background-color: #ffee00\">note</span>");
        assert!(
            render(&FormatCommand::Color {
                text: "x".into(),
                hex: "red".into()
            })
            .is_err()
        );
    }

    #[test]
    fn images_are_embedded_as_data_uris() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        let html = render(&FormatCommand::ImageFile(path)).unwrap();
        assert_eq!(
            html,
            "<img src=\"data:image/png;base64,AQID\" alt=\"logo.png\" />"
        );
        let bad = dir.path().join("notes.txt");
        std::fs::write(&bad, "x").unwrap();
        assert!(render(&FormatCommand::ImageFile(bad)).is_err());
    }

    #[test]
    fn listeners_see_every_change_and_undo_restores() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut editor = HtmlEditor::new("<p>start</p>");
        editor.on_change(Box::new(move |html| sink.lock().unwrap().push(html.to_string())));
        editor.apply(FormatCommand::LineBreak).unwrap();
        editor.set_content("<p>replaced</p>");
        assert!(editor.undo());
        assert_eq!(editor.content(), "<p>start</p><br />");
        assert_eq!(seen.lock().unwrap().len(), 3);
    }
}
