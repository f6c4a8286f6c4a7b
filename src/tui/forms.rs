//! 弹出式表单与单行输入

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::console::Command;
use crate::editor::{CustomEmailForm, FormatCommand, RichTextEditor, TemplateForm};
use crate::error::{ConsoleError, Result};
use crate::logging::time::to_date_string;
use crate::models::{AddOn, AddOnPayload, AssignSubscriptionPayload, UpdateSubscriptionPayload};
use crate::plan_editor::PlanField;
use crate::subscription::SubscriptionRow;

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub secret: bool,
}

impl FormField {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            secret: false,
        }
    }

    /// 显示用的值；密码字段以 * 代替
    pub fn display(&self) -> String {
        if self.secret {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormKind {
    Login,
    AssignSubscription,
    UpdateSubscription {
        id: String,
        plan_name: String,
        end_date: String,
        auto_renewal: bool,
        /// 仅当订阅当前有效时提供停用操作
        deactivatable: Option<SubscriptionRow>,
    },
    AddOn {
        id: Option<String>,
    },
}

/// 多字段表单：上下切换字段，直接输入编辑当前字段
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub title: String,
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub selected: usize,
}

fn flag_text(v: bool) -> &'static str {
    if v { "y" } else { "n" }
}

fn parse_flag(label: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Ok(true),
        "n" | "no" | "false" | "0" | "" => Ok(false),
        other => Err(ConsoleError::InvalidInput(format!(
            "{label}: expected y/n, got {other}"
        ))),
    }
}

impl Form {
    pub fn login() -> Self {
        let mut password = FormField::new("密码", "");
        password.secret = true;
        Self {
            title: "管理员登录".into(),
            kind: FormKind::Login,
            fields: vec![FormField::new("邮箱", ""), password],
            selected: 0,
        }
    }

    pub fn assign_subscription(default_plan: &str, today: DateTime<Utc>) -> Self {
        Self {
            title: "分配订阅".into(),
            kind: FormKind::AssignSubscription,
            fields: vec![
                FormField::new("用户邮箱", ""),
                FormField::new("套餐", default_plan),
                FormField::new("开始日期", to_date_string(&today)),
                FormField::new("结束日期", ""),
                FormField::new("自动续费 (y/n)", "n"),
            ],
            selected: 0,
        }
    }

    pub fn update_subscription(row: &SubscriptionRow) -> Self {
        let r = &row.record;
        let end = r.end_date.clone().unwrap_or_default();
        Self {
            title: format!("编辑订阅 {}", r.company_name),
            kind: FormKind::UpdateSubscription {
                id: r.id.clone(),
                plan_name: r.plan_name.clone(),
                end_date: end.clone(),
                auto_renewal: r.auto_renewal,
                deactivatable: row.is_active().then(|| row.clone()),
            },
            fields: vec![
                FormField::new("套餐", r.plan_name.clone()),
                FormField::new("结束日期", end),
                FormField::new("自动续费 (y/n)", flag_text(r.auto_renewal)),
            ],
            selected: 0,
        }
    }

    pub fn addon(existing: Option<&AddOn>) -> Self {
        let (title, id) = match existing {
            Some(a) => (format!("编辑增值包 {}", a.name), Some(a.id.clone())),
            None => ("新建增值包".to_string(), None),
        };
        let fields = match existing {
            Some(a) => vec![
                FormField::new("名称", a.name.clone()),
                FormField::new("描述", a.description.clone()),
                FormField::new("数量", a.quantity.to_string()),
                FormField::new("价格", format!("{:.2}", a.price)),
                FormField::new("热门 (y/n)", flag_text(a.popular)),
            ],
            None => vec![
                FormField::new("名称", ""),
                FormField::new("描述", ""),
                FormField::new("数量", "1"),
                FormField::new("价格", "0"),
                FormField::new("热门 (y/n)", "n"),
            ],
        };
        Self {
            title,
            kind: FormKind::AddOn { id },
            fields,
            selected: 0,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % self.fields.len().max(1);
    }

    pub fn prev_field(&mut self) {
        let n = self.fields.len().max(1);
        self.selected = (self.selected + n - 1) % n;
    }

    pub fn push(&mut self, c: char) {
        if let Some(f) = self.fields.get_mut(self.selected) {
            f.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(f) = self.fields.get_mut(self.selected) {
            f.value.pop();
        }
    }

    pub fn credentials(&self) -> (String, String) {
        (self.value(0).trim().to_string(), self.value(1).to_string())
    }

    /// 编辑订阅表单上的停用操作；订阅已失效时没有该操作
    pub fn deactivate_command(&self) -> Option<Command> {
        match &self.kind {
            FormKind::UpdateSubscription {
                deactivatable: Some(row),
                ..
            } => Some(Command::DeactivateSubscription(row.clone())),
            _ => None,
        }
    }

    /// 把表单内容转换成后端指令；格式错误时返回 InvalidInput
    pub fn to_command(&self) -> Result<Command> {
        match &self.kind {
            FormKind::Login => Err(ConsoleError::InvalidInput(
                "login form does not map to a command".into(),
            )),
            FormKind::AssignSubscription => {
                Ok(Command::AssignSubscription(AssignSubscriptionPayload {
                    email: self.value(0).trim().to_string(),
                    plan_name: self.value(1).trim().to_string(),
                    start_date: self.value(2).trim().to_string(),
                    end_date: self.value(3).trim().to_string(),
                    auto_renewal: parse_flag(self.fields[4].label, self.value(4))?,
                }))
            }
            FormKind::UpdateSubscription {
                id,
                plan_name,
                end_date,
                auto_renewal,
                ..
            } => {
                let plan = self.value(0).trim();
                let end = self.value(1).trim();
                let auto = parse_flag(self.fields[2].label, self.value(2))?;
                let payload = UpdateSubscriptionPayload {
                    plan_name: (plan != plan_name && !plan.is_empty()).then(|| plan.to_string()),
                    end_date: (end != end_date && !end.is_empty()).then(|| end.to_string()),
                    auto_renewal: (auto != *auto_renewal).then_some(auto),
                };
                Ok(Command::UpdateSubscription {
                    id: id.clone(),
                    payload,
                })
            }
            FormKind::AddOn { id } => {
                let quantity: i64 = self.value(2).trim().parse().map_err(|_| {
                    ConsoleError::InvalidInput(format!("not an integer: {}", self.value(2)))
                })?;
                let price: f64 = self
                    .value(3)
                    .trim()
                    .trim_start_matches('$')
                    .parse()
                    .map_err(|_| {
                        ConsoleError::InvalidInput(format!("not a number: {}", self.value(3)))
                    })?;
                let payload = AddOnPayload {
                    name: self.value(0).trim().to_string(),
                    description: self.value(1).trim().to_string(),
                    quantity,
                    price,
                    popular: parse_flag(self.fields[4].label, self.value(4))?,
                };
                Ok(match id {
                    Some(id) => Command::UpdateAddOn {
                        id: id.clone(),
                        payload,
                    },
                    None => Command::CreateAddOn(payload),
                })
            }
        }
    }
}

/// 富文本工具栏上的格式化操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Paragraph,
    Bold,
    Italic,
    Heading,
    OrderedList,
    UnorderedList,
    Link,
    Image,
    Color,
    Highlight,
}

impl FormatKind {
    pub fn prompt(self) -> &'static str {
        match self {
            FormatKind::Paragraph => "段落文本",
            FormatKind::Bold => "加粗文本",
            FormatKind::Italic => "斜体文本",
            FormatKind::Heading => "标题（## 前缀表示级别）",
            FormatKind::OrderedList => "有序列表（; 分隔）",
            FormatKind::UnorderedList => "无序列表（; 分隔）",
            FormatKind::Link => "链接：文本 | URL",
            FormatKind::Image => "图片文件路径",
            FormatKind::Color => "文字颜色：文本 | #hex",
            FormatKind::Highlight => "高亮：文本 | #hex",
        }
    }

    /// 把单行输入解析为格式化操作
    pub fn build(self, input: &str) -> Result<FormatCommand> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ConsoleError::InvalidInput("input is empty".into()));
        }
        let pair = || match input.split_once('|') {
            Some((a, b)) => (a.trim().to_string(), b.trim().to_string()),
            None => (input.to_string(), input.to_string()),
        };
        let items = || {
            input
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        Ok(match self {
            FormatKind::Paragraph => FormatCommand::Paragraph(input.to_string()),
            FormatKind::Bold => FormatCommand::Bold(input.to_string()),
            FormatKind::Italic => FormatCommand::Italic(input.to_string()),
            FormatKind::Heading => {
                let hashes = input.chars().take_while(|c| *c == '#').count();
                let level = if hashes == 0 { 2 } else { hashes.min(6) as u8 };
                FormatCommand::Heading {
                    level,
                    text: input.trim_start_matches('#').trim().to_string(),
                }
            }
            FormatKind::OrderedList => FormatCommand::OrderedList(items()),
            FormatKind::UnorderedList => FormatCommand::UnorderedList(items()),
            FormatKind::Link => {
                let (text, url) = pair();
                FormatCommand::Link { text, url }
            }
            FormatKind::Image => FormatCommand::ImageFile(PathBuf::from(input)),
            FormatKind::Color => {
                let (text, hex) = pair();
                FormatCommand::Color { text, hex }
            }
            FormatKind::Highlight => {
                let (text, hex) = pair();
                FormatCommand::Highlight { text, hex }
            }
        })
    }
}

/// 单行输入的用途
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPurpose {
    PlanValue { plan_id: String, field: PlanField },
    TicketReply { id: String },
    TicketResolve { id: String },
    Subject,
    Recipients,
    Format(FormatKind),
}

/// 正在编辑的邮件：模板或自定义群发
#[derive(Debug)]
pub enum EmailDraft {
    Template(TemplateForm),
    Custom(CustomEmailForm),
}

impl EmailDraft {
    pub fn title(&self) -> String {
        match self {
            EmailDraft::Template(f) if f.is_dirty() => format!("编辑模板 {} *", f.email_type()),
            EmailDraft::Template(f) => format!("编辑模板 {}", f.email_type()),
            EmailDraft::Custom(f) => format!("群发邮件 → {}", f.recipients.label()),
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            EmailDraft::Template(f) => &f.subject,
            EmailDraft::Custom(f) => &f.subject,
        }
    }

    pub fn set_subject(&mut self, subject: &str) {
        match self {
            EmailDraft::Template(f) => f.subject = subject.trim().to_string(),
            EmailDraft::Custom(f) => f.subject = subject.trim().to_string(),
        }
    }

    pub fn editor(&self) -> &crate::editor::HtmlEditor {
        match self {
            EmailDraft::Template(f) => &f.editor,
            EmailDraft::Custom(f) => &f.editor,
        }
    }

    pub fn editor_mut(&mut self) -> &mut crate::editor::HtmlEditor {
        match self {
            EmailDraft::Template(f) => &mut f.editor,
            EmailDraft::Custom(f) => &mut f.editor,
        }
    }

    /// 模板清空正文后重新开始编辑
    pub fn clear_body(&mut self) {
        self.editor_mut().set_content("");
    }

    pub fn to_command(&self) -> Result<Command> {
        match self {
            EmailDraft::Template(f) => {
                if !f.is_dirty() {
                    return Err(ConsoleError::InvalidInput("template has no changes".into()));
                }
                let payload = f.payload();
                if payload.email_subject.is_empty() {
                    return Err(ConsoleError::InvalidInput("subject is required".into()));
                }
                Ok(Command::SaveTemplate {
                    id: f.template_id().to_string(),
                    payload,
                })
            }
            EmailDraft::Custom(f) => Ok(Command::SendEmail(f.payload()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailTemplate, Subscription};
    use chrono::TimeZone;

    fn row() -> SubscriptionRow {
        SubscriptionRow::derive(
            Subscription {
                id: "s1".into(),
                company_name: "Acme".into(),
                user_email: "ops@acme.io".into(),
                plan_name: "Pro".into(),
                start_date: Some("2026-01-01".into()),
                end_date: Some("2026-12-31".into()),
                auto_renewal: true,
                canceled_at: None,
            },
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn update_form_sends_only_changed_fields() {
        let mut form = Form::update_subscription(&row());
        form.selected = 2;
        form.backspace();
        form.push('n');
        match form.to_command().unwrap() {
            Command::UpdateSubscription { id, payload } => {
                assert_eq!(id, "s1");
                assert_eq!(payload.auto_renewal, Some(false));
                assert!(payload.plan_name.is_none());
                assert!(payload.end_date.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn addon_form_rejects_non_numeric_price() {
        let mut form = Form::addon(None);
        form.fields[0].value = "Extra seats".into();
        form.fields[3].value = "cheap".into();
        assert!(form.to_command().is_err());
        form.fields[3].value = "$9.99".into();
        match form.to_command().unwrap() {
            Command::CreateAddOn(p) => assert_eq!(p.price, 9.99),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn login_password_is_masked() {
        let mut form = Form::login();
        form.next_field();
        for c in "hunter2".chars() {
            form.push(c);
        }
        assert_eq!(form.fields[1].display(), "*******");
        assert_eq!(form.credentials().1, "hunter2");
    }

    #[test]
    fn format_inputs_are_parsed() {
        assert_eq!(
            FormatKind::Heading.build("### Welcome").unwrap(),
            FormatCommand::Heading {
                level: 3,
                text: "Welcome".into()
            }
        );
        assert_eq!(
            FormatKind::Link.build("Docs | https://example.com").unwrap(),
            FormatCommand::Link {
                text: "Docs".into(),
                url: "https://example.com".into()
            }
        );
        assert_eq!(
            FormatKind::UnorderedList.build("a; b ;").unwrap(),
            FormatCommand::UnorderedList(vec!["a".into(), "b".into()])
        );
        assert!(FormatKind::Bold.build("  ").is_err());
    }

    #[test]
    fn unchanged_template_is_not_saved() {
        let template = EmailTemplate {
            id: "e1".into(),
            email_type: "welcome".into(),
            email_subject: "Welcome".into(),
            email_body: "<p>Hi</p>".into(),
        };
        let mut draft = EmailDraft::Template(TemplateForm::from_template(&template));
        assert!(draft.to_command().is_err());
        assert_eq!(draft.title(), "编辑模板 welcome");

        draft
            .editor_mut()
            .apply(FormatCommand::Paragraph("Glad you joined".into()))
            .unwrap();
        assert_eq!(draft.title(), "编辑模板 welcome *");
        match draft.to_command().unwrap() {
            Command::SaveTemplate { id, payload } => {
                assert_eq!(id, "e1");
                assert_eq!(payload.email_subject, "Welcome");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
