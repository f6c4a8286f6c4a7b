//! 终端控制台的应用状态与按键处理
//!
//! 不直接接触终端与网络：需要发往后端的请求放进 outbox，
//! 由界面循环取出后交给 tokio 任务执行，结果以 [`Message`] 回来。

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::forms::{EmailDraft, Form, FormatKind, PromptPurpose};
use crate::api::{AdminClient, ApiClient};
use crate::config::Settings;
use crate::console::{
    Command, CommandKind, ConsoleState, Event, NavigationStore, Navigator, Notice, NoticeLevel,
    Section,
};
use crate::editor::{CustomEmailForm, TemplateForm};
use crate::error::Result;
use crate::export;
use crate::models::{Searchable, TicketPriority, TicketStatus};
use crate::plan_editor::PlanField;
use crate::session::{Session, SessionStore};
use crate::subscription::{DurationLabel, SubscriptionStatus};
use crate::view::filters::{cycle_option, cycle_text, distinct_values};
use crate::view::{ListView, RecordFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Console,
}

/// 用户输入模式
#[derive(Debug)]
pub enum InputMode {
    None,
    Search(String),
    Prompt {
        title: String,
        buffer: String,
        purpose: PromptPurpose,
    },
    Form(Form),
    Confirm {
        message: String,
        command: Command,
    },
    ConfirmQuit,
    ConfirmLogout,
    TicketDetail,
    EmailEditor,
}

/// 后台任务回传给界面循环的消息
#[derive(Debug)]
pub enum Message {
    Event(Event),
    LoggedIn(Result<AdminClient>),
}

/// 等待界面循环派发的请求
#[derive(Debug)]
pub enum Outgoing {
    Command { command: Command, delay: Duration },
    Login { email: String, password: String },
}

/// 列表视图中与记录类型无关的操作
trait PagedList {
    fn search_text(&self) -> &str;
    fn edit_search(&mut self, term: String);
    fn page_forward(&mut self);
    fn page_back(&mut self);
    fn cycle_page_size(&mut self);
    fn visible_rows(&self) -> usize;
}

impl<T: Searchable, F: RecordFilter<T>> PagedList for ListView<T, F> {
    fn search_text(&self) -> &str {
        self.search()
    }

    fn edit_search(&mut self, term: String) {
        self.set_search(term);
    }

    fn page_forward(&mut self) {
        self.next_page();
    }

    fn page_back(&mut self) {
        self.prev_page();
    }

    fn cycle_page_size(&mut self) {
        self.cycle_rows_per_page();
    }

    fn visible_rows(&self) -> usize {
        self.rows().len()
    }
}

pub struct App {
    pub settings: Settings,
    api: ApiClient,
    pub screen: Screen,
    pub login: Form,
    pub login_pending: bool,
    client: Option<AdminClient>,
    pub console: ConsoleState,
    pub nav: Navigator,
    /// 当前页内选中的行
    pub selected: usize,
    /// 套餐表单中选中的字段
    pub plan_field: usize,
    pub input_mode: InputMode,
    pub draft: Option<EmailDraft>,
    pub toast: Option<Notice>,
    toast_deadline: Option<Instant>,
    outbox: Vec<Outgoing>,
    session_store: SessionStore,
    nav_store: NavigationStore,
    pub should_quit: bool,
}

impl App {
    /// 创建应用状态；本地有未过期的会话时直接进入控制台
    pub fn new(settings: Settings, now: DateTime<Utc>) -> Result<Self> {
        let api = ApiClient::new(&settings.api)?;
        let data_dir = settings.data_dir();
        let session_store = SessionStore::new(&data_dir);
        let nav_store = NavigationStore::new(&data_dir);
        let start = nav_store.load().unwrap_or_default();
        let rows = settings.console.rows_per_page;
        let mut app = Self {
            settings,
            api,
            screen: Screen::Login,
            login: Form::login(),
            login_pending: false,
            client: None,
            console: ConsoleState::new(rows),
            nav: Navigator::new(start),
            selected: 0,
            plan_field: 0,
            input_mode: InputMode::None,
            draft: None,
            toast: None,
            toast_deadline: None,
            outbox: Vec::new(),
            session_store,
            nav_store,
            should_quit: false,
        };
        if let Some(session) = app.session_store.load(now) {
            tracing::info!("restored cached admin session");
            app.start_console(session);
        }
        Ok(app)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn client(&self) -> Option<&AdminClient> {
        self.client.as_ref()
    }

    pub fn section(&self) -> Section {
        self.nav.current()
    }

    pub fn take_outgoing(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.outbox)
    }

    fn start_console(&mut self, session: Session) {
        self.client = Some(AdminClient::new(self.api.clone(), session));
        self.screen = Screen::Console;
        self.console = ConsoleState::new(self.settings.console.rows_per_page);
        self.input_mode = InputMode::None;
        self.selected = 0;
        for cmd in self.console.enter(self.section()) {
            self.dispatch(cmd);
        }
    }

    /// 退出登录：清理会话缓存并回到登录页
    pub fn logout(&mut self) {
        self.session_store.clear();
        self.client = None;
        self.console = ConsoleState::new(self.settings.console.rows_per_page);
        self.draft = None;
        self.input_mode = InputMode::None;
        self.login = Form::login();
        self.login_pending = false;
        self.screen = Screen::Login;
    }

    fn expire_session(&mut self) {
        tracing::warn!("admin session rejected by backend");
        self.logout();
        self.console
            .notify(NoticeLevel::Error, "登录已失效，请重新登录");
    }

    fn dispatch(&mut self, command: Command) {
        self.dispatch_after(command, Duration::ZERO);
    }

    fn dispatch_after(&mut self, command: Command, delay: Duration) {
        if self.client.is_none() {
            return;
        }
        if let Some(command) = self.console.submit(command) {
            self.outbox.push(Outgoing::Command { command, delay });
        }
    }

    /// 处理后台任务回传的结果
    pub fn handle_message(&mut self, message: Message, now: DateTime<Utc>) {
        match message {
            Message::LoggedIn(Ok(client)) => {
                self.login_pending = false;
                if let Err(e) = self.session_store.save(client.session()) {
                    tracing::warn!(error = %e, "failed to cache session");
                }
                self.login = Form::login();
                self.start_console(client.session().clone());
                self.console.notify(NoticeLevel::Info, "登录成功");
            }
            Message::LoggedIn(Err(e)) => {
                self.login_pending = false;
                self.console
                    .notify(NoticeLevel::Error, format!("登录失败：{e}"));
            }
            Message::Event(event) => {
                if self.client.is_none() {
                    return;
                }
                let kind = event.kind;
                let succeeded = event.result.is_ok();
                let delay = Duration::from_millis(self.settings.console.reload_delay_ms);
                for cmd in self.console.apply(event, now) {
                    self.dispatch_after(cmd, delay);
                }
                if self.console.take_session_expired() {
                    self.expire_session();
                    return;
                }
                if succeeded {
                    self.after_success(kind);
                }
                self.clamp_selection();
            }
        }
    }

    fn after_success(&mut self, kind: CommandKind) {
        match kind {
            CommandKind::OpenTicket if self.console.open_ticket.is_some() => {
                if matches!(self.input_mode, InputMode::None) {
                    self.input_mode = InputMode::TicketDetail;
                }
            }
            CommandKind::SaveTemplate | CommandKind::SendEmail => {
                self.draft = None;
                if matches!(self.input_mode, InputMode::EmailEditor) {
                    self.input_mode = InputMode::None;
                }
            }
            _ => {}
        }
    }

    /// 定时刷新：到期的提示框消失，排队的提示依次显示
    pub fn tick(&mut self, now: Instant) {
        if self.toast_deadline.is_some_and(|deadline| now >= deadline) {
            self.toast = None;
            self.toast_deadline = None;
        }
        if self.toast.is_none() {
            if let Some(notice) = self.console.take_notice() {
                self.toast = Some(notice);
                self.toast_deadline = Some(now + Duration::from_secs(self.settings.console.toast_secs));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: DateTime<Utc>) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.screen {
            Screen::Login => self.login_key(key),
            Screen::Console => {
                let mode = std::mem::replace(&mut self.input_mode, InputMode::None);
                let next = match mode {
                    InputMode::None => {
                        self.normal_key(key, now);
                        return;
                    }
                    InputMode::Search(buffer) => self.search_key(buffer, key),
                    InputMode::Prompt {
                        title,
                        buffer,
                        purpose,
                    } => self.prompt_key(title, buffer, purpose, key),
                    InputMode::Form(form) => self.form_key(form, key),
                    InputMode::Confirm { message, command } => match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                            self.dispatch(command);
                            InputMode::None
                        }
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => InputMode::None,
                        _ => InputMode::Confirm { message, command },
                    },
                    InputMode::ConfirmQuit => self.confirm_quit_key(key),
                    InputMode::ConfirmLogout => match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                            self.logout();
                            return;
                        }
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => InputMode::None,
                        _ => InputMode::ConfirmLogout,
                    },
                    InputMode::TicketDetail => self.ticket_key(key),
                    InputMode::EmailEditor => self.editor_key(key),
                };
                if self.screen == Screen::Console {
                    self.input_mode = next;
                }
            }
        }
    }

    fn confirm_quit_key(&mut self, key: KeyEvent) -> InputMode {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.should_quit = true;
                InputMode::None
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => InputMode::None,
            _ => InputMode::ConfirmQuit,
        }
    }

    fn login_key(&mut self, key: KeyEvent) {
        if matches!(self.input_mode, InputMode::ConfirmQuit) {
            self.input_mode = self.confirm_quit_key(key);
            return;
        }
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::ConfirmQuit,
            KeyCode::Tab | KeyCode::Down => self.login.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.login.prev_field(),
            KeyCode::Backspace => self.login.backspace(),
            KeyCode::Enter => {
                if self.login_pending {
                    return;
                }
                let (email, password) = self.login.credentials();
                if email.is_empty() || password.is_empty() {
                    self.console
                        .notify(NoticeLevel::Error, "请输入邮箱和密码");
                    return;
                }
                self.login_pending = true;
                self.outbox.push(Outgoing::Login { email, password });
            }
            KeyCode::Char(c) => self.login.push(c),
            _ => {}
        }
    }

    fn go_to(&mut self, section: Section) {
        if self.nav.go(section) {
            self.after_navigate();
        }
    }

    fn after_navigate(&mut self) {
        self.selected = 0;
        self.plan_field = 0;
        if let Err(e) = self.nav_store.save(self.section()) {
            tracing::warn!(error = %e, "failed to persist console section");
        }
        for cmd in self.console.enter(self.section()) {
            self.dispatch(cmd);
        }
    }

    fn current_list(&mut self) -> Option<&mut dyn PagedList> {
        let c = &mut self.console;
        match self.nav.current() {
            Section::Users => c.companies.value_mut().map(|v| v as &mut dyn PagedList),
            Section::Payments => c.payments.value_mut().map(|v| v as &mut dyn PagedList),
            Section::Subscriptions => c.subscriptions.value_mut().map(|v| v as &mut dyn PagedList),
            Section::Tickets => c.tickets.value_mut().map(|v| v as &mut dyn PagedList),
            Section::Notifications => c.notifications.value_mut().map(|v| v as &mut dyn PagedList),
            Section::Contacts => c.contacts.value_mut().map(|v| v as &mut dyn PagedList),
            Section::Emails => c.templates.value_mut().map(|v| v as &mut dyn PagedList),
            Section::Dashboard | Section::Plans | Section::AddOns => None,
        }
    }

    /// 当前区块可选中的行数
    fn row_count(&mut self) -> usize {
        match self.section() {
            Section::Plans => self.console.plans.value().map_or(0, Vec::len),
            Section::AddOns => self.console.addons.value().map_or(0, Vec::len),
            _ => self.current_list().map_or(0, |l| l.visible_rows()),
        }
    }

    fn clamp_selection(&mut self) {
        let n = self.row_count();
        if self.selected >= n {
            self.selected = n.saturating_sub(1);
        }
    }

    fn normal_key(&mut self, key: KeyEvent, now: DateTime<Utc>) {
        match key.code {
            KeyCode::Char('q') => self.input_mode = InputMode::ConfirmQuit,
            KeyCode::Char('L') => self.input_mode = InputMode::ConfirmLogout,
            KeyCode::Tab => self.go_to(self.section().next()),
            KeyCode::BackTab => self.go_to(self.section().prev()),
            KeyCode::Char('[') => {
                if self.nav.back() {
                    self.after_navigate();
                }
            }
            KeyCode::Char(']') => {
                if self.nav.forward() {
                    self.after_navigate();
                }
            }
            KeyCode::Char(d) if d.is_ascii_digit() => {
                let n = d.to_digit(10).unwrap_or(0) as usize;
                let index = if n == 0 { 9 } else { n - 1 };
                self.go_to(Section::ALL[index]);
            }
            KeyCode::Char('r') => {
                for cmd in self.console.refresh(self.section()) {
                    self.dispatch(cmd);
                }
            }
            KeyCode::Char('/') => {
                if let Some(list) = self.current_list() {
                    let current = list.search_text().to_string();
                    self.input_mode = InputMode::Search(current);
                }
            }
            KeyCode::PageDown | KeyCode::Right if self.section() != Section::Plans => {
                if let Some(list) = self.current_list() {
                    list.page_forward();
                }
                self.selected = 0;
            }
            KeyCode::PageUp | KeyCode::Left if self.section() != Section::Plans => {
                if let Some(list) = self.current_list() {
                    list.page_back();
                }
                self.selected = 0;
            }
            KeyCode::Char('+') => {
                if let Some(list) = self.current_list() {
                    list.cycle_page_size();
                }
                self.selected = 0;
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.row_count() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('y') => self.copy_selected(),
            _ => match self.section() {
                Section::Dashboard => {}
                Section::Users => self.users_key(key, now),
                Section::Payments => self.payments_key(key, now),
                Section::Subscriptions => self.subscriptions_key(key, now),
                Section::Plans => self.plans_key(key),
                Section::AddOns => self.addons_key(key),
                Section::Tickets => self.tickets_key(key),
                Section::Notifications => self.notifications_key(key, now),
                Section::Contacts => self.contacts_key(key),
                Section::Emails => self.emails_key(key),
            },
        }
    }

    fn search_key(&mut self, mut buffer: String, key: KeyEvent) -> InputMode {
        match key.code {
            KeyCode::Esc => {
                buffer.clear();
                if let Some(list) = self.current_list() {
                    list.edit_search(String::new());
                }
                self.selected = 0;
                return InputMode::None;
            }
            KeyCode::Enter => return InputMode::None,
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => return InputMode::Search(buffer),
        }
        if let Some(list) = self.current_list() {
            list.edit_search(buffer.clone());
        }
        self.selected = 0;
        InputMode::Search(buffer)
    }

    fn prompt_origin(purpose: &PromptPurpose) -> InputMode {
        match purpose {
            PromptPurpose::PlanValue { .. } => InputMode::None,
            PromptPurpose::TicketReply { .. } | PromptPurpose::TicketResolve { .. } => {
                InputMode::TicketDetail
            }
            PromptPurpose::Subject | PromptPurpose::Recipients | PromptPurpose::Format(_) => {
                InputMode::EmailEditor
            }
        }
    }

    fn prompt_key(
        &mut self,
        title: String,
        mut buffer: String,
        purpose: PromptPurpose,
        key: KeyEvent,
    ) -> InputMode {
        match key.code {
            KeyCode::Esc => Self::prompt_origin(&purpose),
            KeyCode::Backspace => {
                buffer.pop();
                InputMode::Prompt {
                    title,
                    buffer,
                    purpose,
                }
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                InputMode::Prompt {
                    title,
                    buffer,
                    purpose,
                }
            }
            KeyCode::Enter => {
                let next = Self::prompt_origin(&purpose);
                if let Err(e) = self.submit_prompt(&buffer, purpose) {
                    self.console.notify(NoticeLevel::Error, e.to_string());
                }
                next
            }
            _ => InputMode::Prompt {
                title,
                buffer,
                purpose,
            },
        }
    }

    fn submit_prompt(&mut self, input: &str, purpose: PromptPurpose) -> Result<()> {
        match purpose {
            PromptPurpose::PlanValue { plan_id, field } => {
                self.console.plan_editor.stage(&plan_id, field, input)
            }
            PromptPurpose::TicketReply { id } => {
                self.dispatch(Command::ReplyTicket {
                    id,
                    message: input.to_string(),
                });
                Ok(())
            }
            PromptPurpose::TicketResolve { id } => {
                self.dispatch(Command::ResolveTicket {
                    id,
                    resolution: input.to_string(),
                });
                Ok(())
            }
            PromptPurpose::Subject => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.set_subject(input);
                }
                Ok(())
            }
            PromptPurpose::Recipients => match self.draft.as_mut() {
                Some(EmailDraft::Custom(form)) => form.set_custom(input),
                _ => Ok(()),
            },
            PromptPurpose::Format(kind) => {
                use crate::editor::RichTextEditor;
                let command = kind.build(input)?;
                match self.draft.as_mut() {
                    Some(draft) => draft.editor_mut().apply(command),
                    None => Ok(()),
                }
            }
        }
    }

    fn prompt(&self, title: impl Into<String>, initial: impl Into<String>, purpose: PromptPurpose) -> InputMode {
        InputMode::Prompt {
            title: title.into(),
            buffer: initial.into(),
            purpose,
        }
    }

    fn form_key(&mut self, mut form: Form, key: KeyEvent) -> InputMode {
        match key.code {
            KeyCode::Esc => return InputMode::None,
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(command) = form.deactivate_command() {
                    return InputMode::Confirm {
                        message: format!("确认停用订阅？（{}）", form.title),
                        command,
                    };
                }
            }
            KeyCode::Char(c) => form.push(c),
            KeyCode::Enter => match form.to_command() {
                Ok(command) => {
                    self.dispatch(command);
                    return InputMode::None;
                }
                Err(e) => self.console.notify(NoticeLevel::Error, e.to_string()),
            },
            _ => {}
        }
        InputMode::Form(form)
    }

    fn confirm(&mut self, message: impl Into<String>, command: Command) {
        self.input_mode = InputMode::Confirm {
            message: message.into(),
            command,
        };
    }

    fn copy_selected(&mut self) {
        let i = self.selected;
        let c = &self.console;
        let text = match self.nav.current() {
            Section::Users => c.companies.value().and_then(|v| v.row_at(i)).map(|r| r.email.clone()),
            Section::Payments => c
                .payments
                .value()
                .and_then(|v| v.row_at(i))
                .map(|r| r.transaction_id.clone()),
            Section::Subscriptions => c
                .subscriptions
                .value()
                .and_then(|v| v.row_at(i))
                .map(|r| r.record.user_email.clone()),
            Section::Tickets => c.tickets.value().and_then(|v| v.row_at(i)).map(|r| r.id.clone()),
            Section::Contacts => c.contacts.value().and_then(|v| v.row_at(i)).map(|r| r.email.clone()),
            _ => None,
        };
        match text.filter(|t| !t.is_empty()) {
            Some(text) => match super::copy_to_clipboard(&text) {
                Ok(()) => self.console.notify(NoticeLevel::Info, "已复制到剪贴板"),
                Err(e) => self.console.notify(NoticeLevel::Error, format!("复制失败：{e}")),
            },
            None => self.console.notify(NoticeLevel::Info, "没有可复制的内容"),
        }
    }

    fn report_export(&mut self, result: Option<Result<PathBuf>>) {
        match result {
            Some(Ok(path)) => self
                .console
                .notify(NoticeLevel::Info, format!("已导出 {}", path.display())),
            Some(Err(e)) => self
                .console
                .notify(NoticeLevel::Error, format!("导出失败：{e}")),
            None => self.console.notify(NoticeLevel::Info, "数据尚未加载"),
        }
    }

    fn export_dir(&self) -> PathBuf {
        PathBuf::from(&self.settings.export.output_dir)
    }

    fn users_key(&mut self, key: KeyEvent, now: DateTime<Utc>) {
        match key.code {
            KeyCode::Char('s') => {
                if let Some(view) = self.console.companies.value_mut() {
                    let options = distinct_values(view.source(), |c| c.status.as_str());
                    view.update_filter(|f| f.status = cycle_text(&f.status, &options));
                }
            }
            KeyCode::Char('b') => {
                if let Some(view) = self.console.companies.value_mut() {
                    view.update_filter(|f| f.blocked = cycle_option(f.blocked, &[true, false]));
                }
            }
            KeyCode::Enter => {
                let target = self
                    .console
                    .companies
                    .value()
                    .and_then(|v| v.row_at(self.selected))
                    .map(|c| (c.id.clone(), c.company_name.clone(), c.blocked));
                if let Some((id, name, blocked)) = target {
                    let verb = if blocked { "解封" } else { "封禁" };
                    self.confirm(
                        format!("确认{verb} {name}？"),
                        Command::SetBlocked {
                            id,
                            blocked: !blocked,
                        },
                    );
                }
            }
            KeyCode::Char('e') => {
                let dir = self.export_dir();
                let result = self
                    .console
                    .companies
                    .value()
                    .map(|v| export::csv::export(&dir, v.filtered(), now));
                self.report_export(result);
            }
            _ => {}
        }
    }

    fn payments_key(&mut self, key: KeyEvent, now: DateTime<Utc>) {
        match key.code {
            KeyCode::Char('s') => {
                if let Some(view) = self.console.payments.value_mut() {
                    let options = distinct_values(view.source(), |p| p.status.as_str());
                    view.update_filter(|f| f.status = cycle_text(&f.status, &options));
                }
            }
            KeyCode::Char('m') => {
                if let Some(view) = self.console.payments.value_mut() {
                    let options = distinct_values(view.source(), |p| p.payment_method.as_str());
                    view.update_filter(|f| f.method = cycle_text(&f.method, &options));
                }
            }
            KeyCode::Char('w') => {
                if let Some(view) = self.console.payments.value_mut() {
                    view.update_filter(|f| {
                        f.window = f.window.next();
                        f.now = now;
                    });
                }
            }
            KeyCode::Char('i') => {
                let dir = self.export_dir();
                let issuer = self.settings.export.clone();
                let result = self
                    .console
                    .payments
                    .value()
                    .and_then(|v| v.row_at(self.selected))
                    .map(|p| export::invoice::write(&dir, p, &issuer, now));
                self.report_export(result);
            }
            KeyCode::Char('e') => {
                let dir = self.export_dir();
                let result = self
                    .console
                    .payments
                    .value()
                    .map(|v| export::csv::export(&dir, v.filtered(), now));
                self.report_export(result);
            }
            _ => {}
        }
    }

    fn subscriptions_key(&mut self, key: KeyEvent, now: DateTime<Utc>) {
        let selected_row = self
            .console
            .subscriptions
            .value()
            .and_then(|v| v.row_at(self.selected))
            .cloned();
        match key.code {
            KeyCode::Char('p') => {
                if let Some(view) = self.console.subscriptions.value_mut() {
                    let options = distinct_values(view.source(), |r| r.record.plan_name.as_str());
                    view.update_filter(|f| f.plan = cycle_text(&f.plan, &options));
                }
            }
            KeyCode::Char('d') => {
                if let Some(view) = self.console.subscriptions.value_mut() {
                    view.update_filter(|f| {
                        f.duration = cycle_option(f.duration, &DurationLabel::NAMED)
                    });
                }
            }
            KeyCode::Char('s') => {
                if let Some(view) = self.console.subscriptions.value_mut() {
                    view.update_filter(|f| {
                        f.status = cycle_option(
                            f.status,
                            &[SubscriptionStatus::Active, SubscriptionStatus::Inactive],
                        )
                    });
                }
            }
            KeyCode::Char(' ') => {
                if let Some(row) = selected_row {
                    self.console.toggle_selected(row.id());
                }
            }
            KeyCode::Char('x') => {
                if let Some(row) = selected_row {
                    if row.is_active() {
                        let message = format!("确认停用 {} 的订阅？", row.record.company_name);
                        self.confirm(message, Command::DeactivateSubscription(row));
                    } else {
                        self.console
                            .notify(NoticeLevel::Error, "只能停用有效的订阅");
                    }
                }
            }
            KeyCode::Char('X') => {
                let command = self.console.bulk_deactivate_command();
                let active = match &command {
                    Command::BulkDeactivate(rows) => rows.iter().filter(|r| r.is_active()).count(),
                    _ => 0,
                };
                if active == 0 {
                    self.console
                        .notify(NoticeLevel::Error, "没有选中有效的订阅");
                } else {
                    self.confirm(format!("确认批量停用 {active} 个订阅？"), command);
                }
            }
            KeyCode::Char('a') => {
                let plan = self
                    .console
                    .plans
                    .value()
                    .and_then(|p| p.first())
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                self.input_mode = InputMode::Form(Form::assign_subscription(&plan, now));
            }
            KeyCode::Char('u') | KeyCode::Enter => {
                if let Some(row) = selected_row {
                    self.input_mode = InputMode::Form(Form::update_subscription(&row));
                }
            }
            KeyCode::Char('e') => {
                let dir = self.export_dir();
                let result = self
                    .console
                    .subscriptions
                    .value()
                    .map(|v| export::csv::export(&dir, v.filtered(), now));
                self.report_export(result);
            }
            _ => {}
        }
    }

    fn plans_key(&mut self, key: KeyEvent) {
        let plan = self
            .console
            .plans
            .value()
            .and_then(|p| p.get(self.selected))
            .cloned();
        let Some(plan) = plan else {
            return;
        };
        let field = PlanField::ALL[self.plan_field.min(PlanField::ALL.len() - 1)];
        match key.code {
            KeyCode::Left => self.plan_field = self.plan_field.saturating_sub(1),
            KeyCode::Right => {
                if self.plan_field + 1 < PlanField::ALL.len() {
                    self.plan_field += 1;
                }
            }
            KeyCode::Char('c') => {
                self.console.plan_editor.toggle_cycle(&plan.id);
            }
            KeyCode::Enter => {
                let current = self.console.plan_editor.display_value(&plan, field);
                let title = match field {
                    PlanField::Price => format!(
                        "{} {} price",
                        plan.name,
                        self.console.plan_editor.cycle(&plan.id).as_str()
                    ),
                    other => format!("{} {}", plan.name, other.label()),
                };
                self.input_mode = self.prompt(
                    title,
                    current,
                    PromptPurpose::PlanValue {
                        plan_id: plan.id.clone(),
                        field,
                    },
                );
            }
            KeyCode::Char('s') => {
                let update = self.console.plan_editor.pending_update(&plan.id);
                self.dispatch(Command::SavePlan {
                    id: plan.id.clone(),
                    update,
                });
            }
            KeyCode::Esc => self.console.plan_editor.cancel(&plan.id),
            KeyCode::Char('k') => self.dispatch(Command::SetPlanContact {
                id: plan.id.clone(),
                is_contact: !plan.is_contact,
            }),
            _ => {}
        }
    }

    fn addons_key(&mut self, key: KeyEvent) {
        let addon = self
            .console
            .addons
            .value()
            .and_then(|a| a.get(self.selected))
            .cloned();
        match key.code {
            KeyCode::Char('n') => self.input_mode = InputMode::Form(Form::addon(None)),
            KeyCode::Enter => {
                if let Some(a) = addon {
                    self.input_mode = InputMode::Form(Form::addon(Some(&a)));
                }
            }
            KeyCode::Delete | KeyCode::Char('d') => {
                if let Some(a) = addon {
                    self.confirm(format!("确认删除增值包 {}？", a.name), Command::DeleteAddOn(a.id));
                }
            }
            _ => {}
        }
    }

    fn tickets_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('s') => {
                if let Some(view) = self.console.tickets.value_mut() {
                    view.update_filter(|f| f.status = cycle_option(f.status, &TicketStatus::ALL));
                }
            }
            KeyCode::Char('p') => {
                if let Some(view) = self.console.tickets.value_mut() {
                    view.update_filter(|f| {
                        f.priority = cycle_option(f.priority, &TicketPriority::ALL)
                    });
                }
            }
            KeyCode::Char('c') => {
                if let Some(view) = self.console.tickets.value_mut() {
                    let options = distinct_values(view.source(), |t| t.category.as_str());
                    view.update_filter(|f| f.category = cycle_text(&f.category, &options));
                }
            }
            KeyCode::Enter => {
                let ticket = self
                    .console
                    .tickets
                    .value()
                    .and_then(|v| v.row_at(self.selected))
                    .cloned();
                if let Some(ticket) = ticket {
                    self.dispatch(Command::OpenTicket(ticket));
                }
            }
            _ => {}
        }
    }

    fn ticket_key(&mut self, key: KeyEvent) -> InputMode {
        let Some(id) = self.console.open_ticket.as_ref().map(|t| t.id.clone()) else {
            return InputMode::None;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.console.open_ticket = None;
                InputMode::None
            }
            KeyCode::Char('r') => self.prompt("回复工单", "", PromptPurpose::TicketReply { id }),
            KeyCode::Char('v') => self.prompt("解决说明", "", PromptPurpose::TicketResolve { id }),
            _ => InputMode::TicketDetail,
        }
    }

    fn notifications_key(&mut self, key: KeyEvent, now: DateTime<Utc>) {
        let Some(view) = self.console.notifications.value_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char('c') => {
                let options = distinct_values(view.source(), |n| n.category.as_str());
                view.update_filter(|f| f.category = cycle_text(&f.category, &options));
            }
            KeyCode::Char('w') => view.update_filter(|f| {
                f.window = f.window.next();
                f.now = now;
            }),
            _ => {}
        }
    }

    fn contacts_key(&mut self, key: KeyEvent) {
        let contact = self
            .console
            .contacts
            .value()
            .and_then(|v| v.row_at(self.selected))
            .cloned();
        match key.code {
            KeyCode::Char('s') => {
                if let Some(view) = self.console.contacts.value_mut() {
                    view.update_filter(|f| {
                        f.status = cycle_option(
                            f.status,
                            &[
                                crate::models::ContactStatus::Pending,
                                crate::models::ContactStatus::Connected,
                            ],
                        )
                    });
                }
            }
            KeyCode::Enter => {
                if let Some(c) = contact {
                    self.dispatch(Command::SetContactStatus {
                        id: c.id,
                        status: c.status.toggled(),
                    });
                }
            }
            KeyCode::Delete | KeyCode::Char('d') => {
                if let Some(c) = contact {
                    self.confirm(
                        format!("确认删除 {} 的联系请求？", c.name),
                        Command::DeleteContact(c.id),
                    );
                }
            }
            _ => {}
        }
    }

    fn emails_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let template = self
                    .console
                    .templates
                    .value()
                    .and_then(|v| v.row_at(self.selected))
                    .cloned();
                if let Some(t) = template {
                    self.draft = Some(EmailDraft::Template(TemplateForm::from_template(&t)));
                    self.input_mode = InputMode::EmailEditor;
                }
            }
            KeyCode::Char('n') => {
                self.draft = Some(EmailDraft::Custom(CustomEmailForm::default()));
                self.input_mode = InputMode::EmailEditor;
            }
            _ => {}
        }
    }

    fn editor_key(&mut self, key: KeyEvent) -> InputMode {
        let Some(draft) = self.draft.as_mut() else {
            return InputMode::None;
        };
        let format = |kind: FormatKind| InputMode::Prompt {
            title: kind.prompt().to_string(),
            buffer: String::new(),
            purpose: PromptPurpose::Format(kind),
        };
        match key.code {
            KeyCode::Esc => {
                self.draft = None;
                InputMode::None
            }
            KeyCode::Char('s') => InputMode::Prompt {
                title: "主题".into(),
                buffer: draft.subject().to_string(),
                purpose: PromptPurpose::Subject,
            },
            KeyCode::Char('t') => format(FormatKind::Paragraph),
            KeyCode::Char('b') => format(FormatKind::Bold),
            KeyCode::Char('i') => format(FormatKind::Italic),
            KeyCode::Char('h') => format(FormatKind::Heading),
            KeyCode::Char('o') => format(FormatKind::OrderedList),
            KeyCode::Char('u') => format(FormatKind::UnorderedList),
            KeyCode::Char('l') => format(FormatKind::Link),
            KeyCode::Char('g') => format(FormatKind::Image),
            KeyCode::Char('c') => format(FormatKind::Color),
            KeyCode::Char('k') => format(FormatKind::Highlight),
            KeyCode::Char('z') => {
                draft.editor_mut().undo();
                InputMode::EmailEditor
            }
            KeyCode::Char('x') => {
                draft.clear_body();
                InputMode::EmailEditor
            }
            KeyCode::Char('r') => {
                if let EmailDraft::Custom(form) = draft {
                    form.cycle_group();
                }
                InputMode::EmailEditor
            }
            KeyCode::Char('R') => {
                if matches!(draft, EmailDraft::Custom(_)) {
                    InputMode::Prompt {
                        title: "收件人邮箱（逗号分隔）".into(),
                        buffer: String::new(),
                        purpose: PromptPurpose::Recipients,
                    }
                } else {
                    InputMode::EmailEditor
                }
            }
            KeyCode::Enter => {
                match draft.to_command() {
                    Ok(command) => self.dispatch(command),
                    Err(e) => self.console.notify(NoticeLevel::Error, e.to_string()),
                }
                InputMode::EmailEditor
            }
            _ => InputMode::EmailEditor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Outcome;
    use crate::error::ConsoleError;
    use crate::models::{Company, Ticket};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn settings(dir: &std::path::Path) -> Settings {
        let mut s = Settings::default();
        s.console.data_dir = dir.join("data").to_string_lossy().into_owned();
        s.export.output_dir = dir.join("exports").to_string_lossy().into_owned();
        s
    }

    fn logged_in(dir: &std::path::Path) -> App {
        let mut app = App::new(settings(dir), now()).unwrap();
        let client = AdminClient::new(app.api().clone(), Session::new("tok", None));
        app.handle_message(Message::LoggedIn(Ok(client)), now());
        app
    }

    fn commands(app: &mut App) -> Vec<Command> {
        app.take_outgoing()
            .into_iter()
            .filter_map(|o| match o {
                Outgoing::Command { command, .. } => Some(command),
                Outgoing::Login { .. } => None,
            })
            .collect()
    }

    fn company(id: &str, blocked: bool) -> Company {
        Company {
            id: id.into(),
            company_name: format!("Co {id}"),
            email: format!("{id}@example.com"),
            website: String::new(),
            status: "Active".into(),
            blocked,
            logo: None,
        }
    }

    #[test]
    fn login_requires_both_fields_and_is_not_resubmitted() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(dir.path()), now()).unwrap();
        assert_eq!(app.screen, Screen::Login);
        app.handle_key(key(KeyCode::Enter), now());
        assert!(app.take_outgoing().is_empty());

        for c in "admin@example.com".chars() {
            app.handle_key(key(KeyCode::Char(c)), now());
        }
        app.handle_key(key(KeyCode::Tab), now());
        for c in "secret".chars() {
            app.handle_key(key(KeyCode::Char(c)), now());
        }
        app.handle_key(key(KeyCode::Enter), now());
        app.handle_key(key(KeyCode::Enter), now());
        let out = app.take_outgoing();
        assert_eq!(out.len(), 1);
        match &out[0] {
            Outgoing::Login { email, password } => {
                assert_eq!(email, "admin@example.com");
                assert_eq!(password, "secret");
            }
            other => panic!("unexpected outgoing: {other:?}"),
        }
    }

    #[test]
    fn successful_login_caches_session_and_loads_start_section() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = logged_in(dir.path());
        assert_eq!(app.screen, Screen::Console);
        assert!(matches!(commands(&mut app).as_slice(), [Command::LoadDashboard]));

        let again = App::new(settings(dir.path()), now()).unwrap();
        assert_eq!(again.screen, Screen::Console);
    }

    #[test]
    fn navigation_is_persisted_and_loads_section_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = logged_in(dir.path());
        commands(&mut app);
        app.handle_key(key(KeyCode::Char('2')), now());
        assert_eq!(app.section(), Section::Users);
        assert!(matches!(commands(&mut app).as_slice(), [Command::LoadCompanies]));

        let restored = App::new(settings(dir.path()), now()).unwrap();
        assert_eq!(restored.section(), Section::Users);

        app.handle_key(key(KeyCode::Char('[')), now());
        assert_eq!(app.section(), Section::Dashboard);
        app.handle_key(key(KeyCode::Char(']')), now());
        assert_eq!(app.section(), Section::Users);
    }

    #[test]
    fn unauthorized_event_routes_back_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = logged_in(dir.path());
        app.handle_message(
            Message::Event(Event {
                kind: CommandKind::LoadDashboard,
                result: Err(ConsoleError::Unauthorized("jwt expired".into())),
            }),
            now(),
        );
        assert_eq!(app.screen, Screen::Login);
        assert!(app.client().is_none());
        let restarted = App::new(settings(dir.path()), now()).unwrap();
        assert_eq!(restarted.screen, Screen::Login);
    }

    #[test]
    fn block_toggle_goes_through_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = logged_in(dir.path());
        app.handle_key(key(KeyCode::Char('2')), now());
        commands(&mut app);
        app.handle_message(
            Message::Event(Event {
                kind: CommandKind::LoadCompanies,
                result: Ok(Outcome::Companies(vec![company("a", false), company("b", true)])),
            }),
            now(),
        );
        app.handle_key(key(KeyCode::Down), now());
        app.handle_key(key(KeyCode::Enter), now());
        assert!(matches!(app.input_mode, InputMode::Confirm { .. }));
        app.handle_key(key(KeyCode::Char('y')), now());
        match commands(&mut app).as_slice() {
            [Command::SetBlocked { id, blocked }] => {
                assert_eq!(id, "b");
                assert!(!blocked);
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn search_edits_are_applied_live() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = logged_in(dir.path());
        app.handle_key(key(KeyCode::Char('2')), now());
        app.handle_message(
            Message::Event(Event {
                kind: CommandKind::LoadCompanies,
                result: Ok(Outcome::Companies(vec![company("alpha", false), company("beta", false)])),
            }),
            now(),
        );
        app.handle_key(key(KeyCode::Char('/')), now());
        for c in "BET".chars() {
            app.handle_key(key(KeyCode::Char(c)), now());
        }
        let view = app.console.companies.value().unwrap();
        assert_eq!(view.filtered_len(), 1);
        app.handle_key(key(KeyCode::Esc), now());
        assert_eq!(app.console.companies.value().unwrap().filtered_len(), 2);
    }

    #[test]
    fn opening_a_ticket_shows_detail_once_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = logged_in(dir.path());
        app.handle_key(key(KeyCode::Char('7')), now());
        assert_eq!(app.section(), Section::Tickets);
        let ticket: Ticket =
            serde_json::from_value(serde_json::json!({"_id": "t1", "status": "Pending"})).unwrap();
        app.handle_message(
            Message::Event(Event {
                kind: CommandKind::LoadTickets,
                result: Ok(Outcome::Tickets(Default::default(), vec![ticket.clone()])),
            }),
            now(),
        );
        commands(&mut app);
        app.handle_key(key(KeyCode::Enter), now());
        assert!(matches!(commands(&mut app).as_slice(), [Command::OpenTicket(_)]));

        let mut opened = ticket;
        opened.status = TicketStatus::InProgress;
        app.handle_message(
            Message::Event(Event {
                kind: CommandKind::OpenTicket,
                result: Ok(Outcome::TicketOpened {
                    ticket: opened,
                    progressed: true,
                }),
            }),
            now(),
        );
        assert!(matches!(app.input_mode, InputMode::TicketDetail));
        assert!(matches!(commands(&mut app).as_slice(), [Command::LoadTickets]));

        app.handle_key(key(KeyCode::Char('r')), now());
        for c in "Looking".chars() {
            app.handle_key(key(KeyCode::Char(c)), now());
        }
        app.handle_key(key(KeyCode::Enter), now());
        assert!(matches!(app.input_mode, InputMode::TicketDetail));
        assert!(matches!(
            commands(&mut app).as_slice(),
            [Command::ReplyTicket { message, .. }] if message == "Looking"
        ));
    }

    #[test]
    fn only_active_subscriptions_offer_deactivation() {
        use crate::models::Subscription;

        let sub = |id: &str, end: &str| Subscription {
            id: id.into(),
            company_name: format!("Co {id}"),
            user_email: format!("{id}@example.com"),
            plan_name: "Pro".into(),
            start_date: Some("2026-01-01".into()),
            end_date: Some(end.into()),
            auto_renewal: false,
            canceled_at: None,
        };
        let dir = tempfile::tempdir().unwrap();
        let mut app = logged_in(dir.path());
        app.handle_key(key(KeyCode::Char('4')), now());
        assert_eq!(app.section(), Section::Subscriptions);
        app.handle_message(
            Message::Event(Event {
                kind: CommandKind::LoadSubscriptions,
                result: Ok(Outcome::Subscriptions(vec![
                    sub("expired", "2026-02-01"),
                    sub("live", "2026-06-01"),
                ])),
            }),
            now(),
        );
        commands(&mut app);

        app.handle_key(key(KeyCode::Char('x')), now());
        assert!(matches!(app.input_mode, InputMode::None));
        assert!(commands(&mut app).is_empty());

        let ctrl_d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        app.handle_key(key(KeyCode::Char('u')), now());
        match &app.input_mode {
            InputMode::Form(form) => assert!(form.deactivate_command().is_none()),
            other => panic!("unexpected mode: {other:?}"),
        }
        app.handle_key(ctrl_d, now());
        assert!(matches!(app.input_mode, InputMode::Form(_)));
        app.handle_key(key(KeyCode::Esc), now());

        app.handle_key(key(KeyCode::Down), now());
        app.handle_key(key(KeyCode::Char('u')), now());
        app.handle_key(ctrl_d, now());
        assert!(matches!(app.input_mode, InputMode::Confirm { .. }));
        app.handle_key(key(KeyCode::Char('y')), now());
        match commands(&mut app).as_slice() {
            [Command::DeactivateSubscription(row)] => assert_eq!(row.id(), "live"),
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn toasts_expire_and_queue() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(dir.path()), now()).unwrap();
        app.console.notify(NoticeLevel::Info, "one");
        app.console.notify(NoticeLevel::Info, "two");
        let start = Instant::now();
        app.tick(start);
        assert_eq!(app.toast.as_ref().map(|t| t.text.as_str()), Some("one"));
        app.tick(start + Duration::from_secs(60));
        assert_eq!(app.toast.as_ref().map(|t| t.text.as_str()), Some("two"));
    }
}
