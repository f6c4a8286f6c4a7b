use super::{HtmlEditor, RichTextEditor};
use crate::error::{ConsoleError, Result};
use crate::models::{EmailTemplate, RecipientGroup, SendEmailPayload, UpdateEmailTemplatePayload};

/// 模板编辑表单；emailType 只读
#[derive(Debug)]
pub struct TemplateForm {
    template_id: String,
    email_type: String,
    original_subject: String,
    original_body: String,
    pub subject: String,
    pub editor: HtmlEditor,
}

impl TemplateForm {
    pub fn from_template(template: &EmailTemplate) -> Self {
        Self {
            template_id: template.id.clone(),
            email_type: template.email_type.clone(),
            original_subject: template.email_subject.clone(),
            original_body: template.email_body.clone(),
            subject: template.email_subject.clone(),
            editor: HtmlEditor::new(&template.email_body),
        }
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn email_type(&self) -> &str {
        &self.email_type
    }

    pub fn is_dirty(&self) -> bool {
        self.subject != self.original_subject || self.editor.content() != self.original_body
    }

    /// 保存请求体：编辑器 HTML 直接作为 emailBody
    pub fn payload(&self) -> UpdateEmailTemplatePayload {
        UpdateEmailTemplatePayload {
            email_subject: self.subject.trim().to_string(),
            email_body: self.editor.content().to_string(),
        }
    }
}

/// 自定义群发邮件表单
#[derive(Debug)]
pub struct CustomEmailForm {
    pub recipients: RecipientGroup,
    pub subject: String,
    pub editor: HtmlEditor,
}

impl Default for CustomEmailForm {
    fn default() -> Self {
        Self {
            recipients: RecipientGroup::AllUsers,
            subject: String::new(),
            editor: HtmlEditor::default(),
        }
    }
}

impl CustomEmailForm {
    /// 在预设分组之间循环切换；自定义列表需通过 [`Self::set_custom`] 填写
    pub fn cycle_group(&mut self) {
        self.recipients = match self.recipients {
            RecipientGroup::AllUsers => RecipientGroup::ActiveSubscribers,
            RecipientGroup::ActiveSubscribers => RecipientGroup::InactiveSubscribers,
            RecipientGroup::InactiveSubscribers | RecipientGroup::Custom(_) => {
                RecipientGroup::AllUsers
            }
        };
    }

    pub fn set_custom(&mut self, input: &str) -> Result<()> {
        self.recipients = RecipientGroup::custom_from_input(input)?;
        Ok(())
    }

    pub fn payload(&self) -> Result<SendEmailPayload> {
        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err(ConsoleError::InvalidInput("subject is required".into()));
        }
        if self.editor.is_empty() {
            return Err(ConsoleError::InvalidInput("body is required".into()));
        }
        Ok(SendEmailPayload {
            recipients: self.recipients.clone(),
            subject: subject.to_string(),
            body: self.editor.content().to_string(),
        })
    }
}
