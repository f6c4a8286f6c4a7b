/// 把邮件 HTML 转成终端可显示的纯文本行
///
/// 只处理编辑器会产生的标签：段落、标题、列表、链接、图片、换行；
/// 其它标签只保留文本。
pub fn html_to_lines(html: &str) -> Vec<String> {
    let mut r = Renderer::default();
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        r.text(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('>') {
            Some(end) => {
                r.tag(&after[..end]);
                rest = &after[end + 1..];
            }
            None => {
                r.text(&rest[start..]);
                rest = "";
            }
        }
    }
    r.text(rest);
    r.finish()
}

#[derive(Default)]
struct Renderer {
    lines: Vec<String>,
    line: String,
    /// None 为无序列表，Some(n) 为有序列表的下一个序号
    lists: Vec<Option<usize>>,
    link: Option<(String, usize)>,
}

impl Renderer {
    fn flush(&mut self) {
        let line = self.line.trim_end().to_string();
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.line.clear();
    }

    fn space(&mut self) {
        if !self.line.is_empty() && !self.line.ends_with(' ') {
            self.line.push(' ');
        }
    }

    fn text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        if decoded.starts_with(char::is_whitespace) {
            self.space();
        }
        let mut wrote = false;
        for word in decoded.split_whitespace() {
            if wrote {
                self.space();
            }
            self.line.push_str(word);
            wrote = true;
        }
        if wrote && decoded.ends_with(char::is_whitespace) {
            self.space();
        }
    }

    fn tag(&mut self, raw: &str) {
        let raw = raw.trim().trim_end_matches('/').trim();
        let closing = raw.starts_with('/');
        let body = raw.trim_start_matches('/');
        let name: String = body
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match (name.as_str(), closing) {
            ("p" | "div", _) => self.flush(),
            ("br", _) => {
                let line = self.line.trim_end().to_string();
                self.lines.push(line);
                self.line.clear();
            }
            (h, false) if is_heading(h) => {
                self.flush();
                let level = h[1..].parse::<usize>().unwrap_or(1);
                self.line.push_str(&"#".repeat(level));
                self.line.push(' ');
            }
            (h, true) if is_heading(h) => self.flush(),
            ("ul", false) => {
                self.flush();
                self.lists.push(None);
            }
            ("ol", false) => {
                self.flush();
                self.lists.push(Some(1));
            }
            ("ul" | "ol", true) => {
                self.flush();
                self.lists.pop();
            }
            ("li", false) => {
                self.flush();
                let depth = self.lists.len().max(1);
                self.line.push_str(&"  ".repeat(depth - 1));
                match self.lists.last_mut() {
                    Some(Some(n)) => {
                        self.line.push_str(&format!("{n}. "));
                        *n += 1;
                    }
                    _ => self.line.push_str("• "),
                }
            }
            ("li", true) => self.flush(),
            ("a", false) => {
                self.link = attr(body, "href").map(|href| (href, self.line.len()));
            }
            ("a", true) => {
                if let Some((href, start)) = self.link.take() {
                    let text = self.line.get(start..).unwrap_or_default().trim();
                    if text != href {
                        let sep = if self.line.ends_with(' ') { "" } else { " " };
                        self.line.push_str(&format!("{sep}({href})"));
                    }
                }
            }
            ("img", false) => {
                let alt = attr(body, "alt").unwrap_or_default();
                self.space();
                if alt.is_empty() {
                    self.line.push_str("[image]");
                } else {
                    self.line.push_str(&format!("[image: {alt}]"));
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

fn is_heading(name: &str) -> bool {
    name.len() == 2 && name.starts_with('h') && matches!(name.as_bytes()[1], b'1'..=b'6')
}

fn attr(tag: &str, name: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let needle = format!(" {name}=\"");
    let start = lower.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(decode_entities(&tag[start..start + len]))
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_editor_output_as_plain_lines() {
        let html = "<h2>Hello</h2><p>Hi &amp; welcome</p>\
            <ul><li>one</li><li>two</li></ul>\
            <ol><li>a</li><li>b</li></ol>\
            <p>See <a href=\"https://x.io\">docs</a></p>\
            <img src=\"data:image/png;base64,AQID\" alt=\"logo\" />";
        assert_eq!(
            html_to_lines(html),
            [
                "## Hello",
                "Hi & welcome",
                "• one",
                "• two",
                "1. a",
                "2. b",
                "See docs (https://x.io)",
                "[image: logo]",
            ]
        );
    }

    #[test]
    fn inline_tags_keep_word_spacing() {
        let html = "<p>Your <strong>plan</strong> renews <em>today</em>.</p>";
        assert_eq!(html_to_lines(html), ["Your plan renews today."]);
    }

    #[test]
    fn line_breaks_and_plain_text() {
        assert_eq!(html_to_lines("a<br />b"), ["a", "b"]);
        assert_eq!(html_to_lines("  just text  "), ["just text"]);
        assert!(html_to_lines("").is_empty());
    }
}
