//! 控制台状态：各业务域的数据、暂存表单，以及后端事件的本地合并
//!
//! 界面循环把指令交给 [`ConsoleState::submit`]，后台任务执行完毕后把
//! [`Event`] 交回 [`ConsoleState::apply`]。写操作成功后先在本地合并，
//! 再只重新拉取受影响的业务域。

pub mod command;
pub mod navigation;

use std::collections::{BTreeSet, HashSet, VecDeque};

use chrono::{DateTime, Utc};

pub use command::{Command, CommandKind, Event, Outcome, execute};
pub use navigation::{NavigationStore, Navigator, Section};

use crate::error::ConsoleError;
use crate::logging::time::to_iso8601_utc_string;
use crate::models::{
    AddOn, Company, ContactRequest, EmailTemplate, Notification, Payment, PaymentStats,
    Searchable, SubscriptionPlan, Ticket, TicketMessage, TicketStats, TicketStatus,
};
use crate::plan_editor::PlanEditor;
use crate::subscription::{SubscriptionRow, SubscriptionStatus};
use crate::view::{
    CompanyFilter, ContactFilter, ListView, Loadable, NoFilter, NotificationFilter,
    PaymentFilter, RecordFilter, SubscriptionFilter, TicketFilter,
};

pub type CompanyList = ListView<Company, CompanyFilter>;
pub type PaymentList = ListView<Payment, PaymentFilter>;
pub type SubscriptionList = ListView<SubscriptionRow, SubscriptionFilter>;
pub type TicketList = ListView<Ticket, TicketFilter>;
pub type NotificationList = ListView<Notification, NotificationFilter>;
pub type ContactList = ListView<ContactRequest, ContactFilter>;
pub type TemplateList = ListView<EmailTemplate, NoFilter>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// 需要以提示框展示给用户的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
}

fn open_first(a: &ContactRequest, b: &ContactRequest) -> std::cmp::Ordering {
    a.status.sort_rank().cmp(&b.status.sort_rank())
}

/// 已加载的列表原地替换数据源（保留搜索、过滤、页码），否则新建视图
fn store_list<T, F>(
    slot: &mut Loadable<ListView<T, F>>,
    items: Vec<T>,
    build: impl FnOnce(Vec<T>) -> ListView<T, F>,
) where
    T: Searchable,
    F: RecordFilter<T>,
{
    if let Loadable::Loaded(view) = slot {
        view.replace_source(items);
    } else {
        *slot = Loadable::Loaded(build(items));
    }
}

/// 加载失败：已有数据时保留旧数据，只提示错误
fn fail_load<T>(slot: &mut Loadable<T>, err: &ConsoleError) {
    if !slot.is_loaded() {
        slot.finish(Err::<T, _>(err.to_string()), |_, _| {});
    }
}

#[derive(Debug, Default)]
pub struct ConsoleState {
    rows_per_page: usize,
    pub dashboard: Loadable<(PaymentStats, TicketStats)>,
    pub companies: Loadable<CompanyList>,
    pub payments: Loadable<PaymentList>,
    pub payment_stats: Option<PaymentStats>,
    pub subscriptions: Loadable<SubscriptionList>,
    /// 批量停用的勾选集合（订阅 id）
    pub selected_subscriptions: BTreeSet<String>,
    pub plans: Loadable<Vec<SubscriptionPlan>>,
    pub plan_editor: PlanEditor,
    pub addons: Loadable<Vec<AddOn>>,
    pub tickets: Loadable<TicketList>,
    pub ticket_stats: Option<TicketStats>,
    /// 详情面板中打开的工单
    pub open_ticket: Option<Ticket>,
    pub notifications: Loadable<NotificationList>,
    pub contacts: Loadable<ContactList>,
    pub templates: Loadable<TemplateList>,
    in_flight: HashSet<CommandKind>,
    notices: VecDeque<Notice>,
    session_expired: bool,
}

impl ConsoleState {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            rows_per_page,
            ..Self::default()
        }
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// 区块首次进入时需要的加载指令；已加载或正在加载的域不会重复请求
    pub fn enter(&self, section: Section) -> Vec<Command> {
        Self::loads_for(section)
            .into_iter()
            .filter(|cmd| self.needs_load(cmd.kind()))
            .collect()
    }

    /// 手动刷新：重新拉取区块涉及的全部域
    pub fn refresh(&self, section: Section) -> Vec<Command> {
        Self::loads_for(section)
    }

    fn loads_for(section: Section) -> Vec<Command> {
        match section {
            Section::Dashboard => vec![Command::LoadDashboard],
            Section::Users => vec![Command::LoadCompanies],
            Section::Payments => vec![Command::LoadPayments],
            Section::Subscriptions => vec![Command::LoadSubscriptions, Command::LoadPlans],
            Section::Plans => vec![Command::LoadPlans],
            Section::AddOns => vec![Command::LoadAddOns],
            Section::Tickets => vec![Command::LoadTickets],
            Section::Notifications => vec![Command::LoadNotifications],
            Section::Contacts => vec![Command::LoadContacts],
            Section::Emails => vec![Command::LoadTemplates],
        }
    }

    fn needs_load(&self, kind: CommandKind) -> bool {
        fn idle<T>(slot: &Loadable<T>) -> bool {
            matches!(slot, Loadable::NotRequested | Loadable::Failed(_))
        }
        match kind {
            CommandKind::LoadDashboard => idle(&self.dashboard),
            CommandKind::LoadCompanies => idle(&self.companies),
            CommandKind::LoadPayments => idle(&self.payments),
            CommandKind::LoadSubscriptions => idle(&self.subscriptions),
            CommandKind::LoadPlans => idle(&self.plans),
            CommandKind::LoadAddOns => idle(&self.addons),
            CommandKind::LoadTickets => idle(&self.tickets),
            CommandKind::LoadNotifications => idle(&self.notifications),
            CommandKind::LoadContacts => idle(&self.contacts),
            CommandKind::LoadTemplates => idle(&self.templates),
            _ => false,
        }
    }

    fn begin_load(&mut self, kind: CommandKind) {
        match kind {
            CommandKind::LoadDashboard => self.dashboard.begin(),
            CommandKind::LoadCompanies => self.companies.begin(),
            CommandKind::LoadPayments => self.payments.begin(),
            CommandKind::LoadSubscriptions => self.subscriptions.begin(),
            CommandKind::LoadPlans => self.plans.begin(),
            CommandKind::LoadAddOns => self.addons.begin(),
            CommandKind::LoadTickets => self.tickets.begin(),
            CommandKind::LoadNotifications => self.notifications.begin(),
            CommandKind::LoadContacts => self.contacts.begin(),
            CommandKind::LoadTemplates => self.templates.begin(),
            _ => {}
        }
    }

    pub fn is_in_flight(&self, kind: CommandKind) -> bool {
        self.in_flight.contains(&kind)
    }

    /// 登记一条即将派发的指令
    ///
    /// 同类写操作仍在进行时拒绝重复提交并给出提示；读操作不去重
    ///
    /// # Returns
    ///
    /// * `Some(command)` - 可以派发
    /// * `None` - 被拦截
    pub fn submit(&mut self, command: Command) -> Option<Command> {
        let kind = command.kind();
        if kind.is_mutation() {
            if !self.in_flight.insert(kind) {
                self.notify(NoticeLevel::Info, "上一个操作仍在进行中，请稍候");
                return None;
            }
        } else {
            self.begin_load(kind);
        }
        Some(command)
    }

    /// 合并后台事件，返回需要继续派发的重新拉取指令
    pub fn apply(&mut self, event: Event, now: DateTime<Utc>) -> Vec<Command> {
        self.in_flight.remove(&event.kind);
        match event.result {
            Ok(outcome) => self.merge(outcome, now),
            Err(err) => {
                self.fail(event.kind, &err);
                Vec::new()
            }
        }
    }

    fn fail(&mut self, kind: CommandKind, err: &ConsoleError) {
        if err.is_auth_error() {
            self.session_expired = true;
            self.notify(NoticeLevel::Error, "登录已失效，请重新登录");
            return;
        }
        match kind {
            CommandKind::LoadDashboard => fail_load(&mut self.dashboard, err),
            CommandKind::LoadCompanies => fail_load(&mut self.companies, err),
            CommandKind::LoadPayments => fail_load(&mut self.payments, err),
            CommandKind::LoadSubscriptions => fail_load(&mut self.subscriptions, err),
            CommandKind::LoadPlans => fail_load(&mut self.plans, err),
            CommandKind::LoadAddOns => fail_load(&mut self.addons, err),
            CommandKind::LoadTickets => fail_load(&mut self.tickets, err),
            CommandKind::LoadNotifications => fail_load(&mut self.notifications, err),
            CommandKind::LoadContacts => fail_load(&mut self.contacts, err),
            CommandKind::LoadTemplates => fail_load(&mut self.templates, err),
            _ => {}
        }
        self.notify(NoticeLevel::Error, err.to_string());
    }

    fn merge(&mut self, outcome: Outcome, now: DateTime<Utc>) -> Vec<Command> {
        let rows = self.rows_per_page;
        match outcome {
            Outcome::Dashboard(payments, tickets) => {
                self.dashboard
                    .finish(Ok::<_, String>((payments, tickets)), |cur, fresh| *cur = fresh);
                Vec::new()
            }
            Outcome::Companies(list) => {
                store_list(&mut self.companies, list, |items| {
                    ListView::new(items, CompanyFilter::default(), rows)
                });
                Vec::new()
            }
            Outcome::Payments(stats, list) => {
                self.payment_stats = Some(stats);
                store_list(&mut self.payments, list, |items| {
                    ListView::new(items, PaymentFilter::default(), rows)
                });
                if let Some(view) = self.payments.value_mut() {
                    view.refresh_filter(|f| f.now = now);
                }
                Vec::new()
            }
            Outcome::Subscriptions(list) => {
                let derived = SubscriptionRow::derive_all(list, now);
                self.selected_subscriptions
                    .retain(|id| derived.iter().any(|r| r.id() == id));
                store_list(&mut self.subscriptions, derived, |items| {
                    ListView::new(items, SubscriptionFilter::default(), rows)
                });
                Vec::new()
            }
            Outcome::Plans(list) => {
                self.plans.finish(Ok::<_, String>(list), |cur, fresh| *cur = fresh);
                Vec::new()
            }
            Outcome::AddOns(list) => {
                self.addons.finish(Ok::<_, String>(list), |cur, fresh| *cur = fresh);
                Vec::new()
            }
            Outcome::Tickets(stats, list) => {
                self.ticket_stats = Some(stats);
                if let Some(open) = &mut self.open_ticket {
                    if let Some(fresh) = list.iter().find(|t| t.id == open.id) {
                        *open = fresh.clone();
                    }
                }
                store_list(&mut self.tickets, list, |items| {
                    ListView::new(items, TicketFilter::default(), rows)
                });
                Vec::new()
            }
            Outcome::Notifications(list) => {
                store_list(&mut self.notifications, list, |items| {
                    ListView::new(items, NotificationFilter::default(), rows)
                });
                if let Some(view) = self.notifications.value_mut() {
                    view.refresh_filter(|f| f.now = now);
                }
                Vec::new()
            }
            Outcome::Contacts(list) => {
                store_list(&mut self.contacts, list, |items| {
                    ListView::new(items, ContactFilter::default(), rows).with_order(open_first)
                });
                Vec::new()
            }
            Outcome::Templates(list) => {
                store_list(&mut self.templates, list, |items| {
                    ListView::new(items, NoFilter, rows)
                });
                Vec::new()
            }
            Outcome::BlockChanged { id, blocked } => {
                if let Some(view) = self.companies.value_mut() {
                    view.update_where(|c| c.id == id, |c| c.blocked = blocked);
                }
                self.notify(
                    NoticeLevel::Info,
                    if blocked { "用户已封禁" } else { "用户已解封" },
                );
                vec![Command::LoadCompanies]
            }
            Outcome::TicketOpened { ticket, progressed } => {
                let follow_up = if progressed {
                    if let Some(view) = self.tickets.value_mut() {
                        view.update_where(|t| t.id == ticket.id, |t| t.status = ticket.status);
                    }
                    vec![Command::LoadTickets]
                } else {
                    Vec::new()
                };
                self.open_ticket = Some(ticket);
                follow_up
            }
            Outcome::TicketReplied { id, message } => {
                let reply = TicketMessage {
                    message,
                    created_at: Some(to_iso8601_utc_string(&now)),
                };
                self.update_ticket(&id, |t| t.admin_messages.push(reply.clone()));
                self.notify(NoticeLevel::Info, "回复已发送");
                vec![Command::LoadTickets]
            }
            Outcome::TicketResolved { id, resolution } => {
                self.update_ticket(&id, |t| {
                    t.status = TicketStatus::Completed;
                    t.resolved_description = Some(resolution.clone());
                });
                self.notify(NoticeLevel::Info, "工单已解决");
                vec![Command::LoadTickets]
            }
            Outcome::SubscriptionAssigned => {
                self.notify(NoticeLevel::Info, "订阅已分配");
                vec![Command::LoadSubscriptions]
            }
            Outcome::SubscriptionUpdated { id, payload } => {
                if let Some(view) = self.subscriptions.value_mut() {
                    view.update_where(
                        |r| r.id() == id,
                        |r| {
                            let mut record = r.record.clone();
                            if let Some(plan) = &payload.plan_name {
                                record.plan_name = plan.clone();
                            }
                            if let Some(end) = &payload.end_date {
                                record.end_date = Some(end.clone());
                            }
                            if let Some(auto) = payload.auto_renewal {
                                record.auto_renewal = auto;
                            }
                            *r = SubscriptionRow::derive(record, now);
                        },
                    );
                }
                self.notify(NoticeLevel::Info, "订阅已更新");
                vec![Command::LoadSubscriptions]
            }
            Outcome::SubscriptionsDeactivated(ids) => {
                let canceled_at = to_iso8601_utc_string(&now);
                if let Some(view) = self.subscriptions.value_mut() {
                    view.update_where(
                        |r| ids.iter().any(|id| id == r.id()),
                        |r| {
                            r.record.canceled_at = Some(canceled_at.clone());
                            r.status = SubscriptionStatus::Inactive;
                        },
                    );
                }
                self.selected_subscriptions.retain(|id| !ids.contains(id));
                self.notify(NoticeLevel::Info, format!("已停用 {} 个订阅", ids.len()));
                vec![Command::LoadSubscriptions]
            }
            Outcome::PlanSaved { id, update } => {
                if let Some(plans) = self.plans.value_mut() {
                    plans
                        .iter_mut()
                        .filter(|p| p.id == id)
                        .for_each(|p| update.apply_to(p));
                }
                self.plan_editor.committed(&id, &update);
                self.notify(NoticeLevel::Info, "套餐已保存");
                vec![Command::LoadPlans]
            }
            Outcome::PlanContactChanged { id, is_contact } => {
                if let Some(plans) = self.plans.value_mut() {
                    plans
                        .iter_mut()
                        .filter(|p| p.id == id)
                        .for_each(|p| p.is_contact = is_contact);
                }
                vec![Command::LoadPlans]
            }
            Outcome::AddOnCreated(addon) => {
                if let Some(list) = self.addons.value_mut() {
                    list.push(addon);
                }
                self.notify(NoticeLevel::Info, "增值包已创建");
                vec![Command::LoadAddOns]
            }
            Outcome::AddOnUpdated { id, payload } => {
                if let Some(list) = self.addons.value_mut() {
                    for a in list.iter_mut().filter(|a| a.id == id) {
                        a.name = payload.name.clone();
                        a.description = payload.description.clone();
                        a.quantity = payload.quantity;
                        a.price = payload.price;
                        a.popular = payload.popular;
                    }
                }
                self.notify(NoticeLevel::Info, "增值包已更新");
                vec![Command::LoadAddOns]
            }
            Outcome::AddOnDeleted(id) => {
                if let Some(list) = self.addons.value_mut() {
                    list.retain(|a| a.id != id);
                }
                self.notify(NoticeLevel::Info, "增值包已删除");
                vec![Command::LoadAddOns]
            }
            Outcome::ContactStatusChanged { id, status } => {
                if let Some(view) = self.contacts.value_mut() {
                    view.update_where(|c| c.id == id, |c| c.status = status);
                }
                vec![Command::LoadContacts]
            }
            Outcome::ContactDeleted(id) => {
                if let Some(view) = self.contacts.value_mut() {
                    view.remove_where(|c| c.id == id);
                }
                self.notify(NoticeLevel::Info, "联系请求已删除");
                vec![Command::LoadContacts]
            }
            Outcome::TemplateSaved { id, payload } => {
                if let Some(view) = self.templates.value_mut() {
                    view.update_where(
                        |t| t.id == id,
                        |t| {
                            t.email_subject = payload.email_subject.clone();
                            t.email_body = payload.email_body.clone();
                        },
                    );
                }
                self.notify(NoticeLevel::Info, "模板已保存");
                vec![Command::LoadTemplates]
            }
            Outcome::EmailSent { recipients } => {
                self.notify(NoticeLevel::Info, format!("邮件已发送：{recipients}"));
                Vec::new()
            }
            Outcome::Unchanged => {
                self.notify(NoticeLevel::Info, "没有需要保存的修改");
                Vec::new()
            }
        }
    }

    fn update_ticket(&mut self, id: &str, f: impl Fn(&mut Ticket)) {
        if let Some(view) = self.tickets.value_mut() {
            view.update_where(|t| t.id == id, &f);
        }
        if let Some(open) = self.open_ticket.as_mut().filter(|t| t.id == id) {
            f(open);
        }
    }

    pub fn toggle_selected(&mut self, id: &str) -> bool {
        if self.selected_subscriptions.remove(id) {
            false
        } else {
            self.selected_subscriptions.insert(id.to_string());
            true
        }
    }

    /// 按勾选集合构造批量停用指令；是否有可停用的记录由执行时检查
    pub fn bulk_deactivate_command(&self) -> Command {
        let rows = self
            .subscriptions
            .value()
            .map(|view| {
                view.source()
                    .iter()
                    .filter(|r| self.selected_subscriptions.contains(r.id()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Command::BulkDeactivate(rows)
    }

    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push_back(Notice {
            text: text.into(),
            level,
        });
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    /// 读取并清除会话失效标记
    pub fn take_session_expired(&mut self) -> bool {
        std::mem::take(&mut self.session_expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactStatus, Subscription};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn ok(kind: CommandKind, outcome: Outcome) -> Event {
        Event {
            kind,
            result: Ok(outcome),
        }
    }

    fn company(id: &str) -> Company {
        Company {
            id: id.into(),
            company_name: format!("Company {id}"),
            email: format!("{id}@example.com"),
            website: String::new(),
            status: "Active".into(),
            blocked: false,
            logo: None,
        }
    }

    fn subscription(id: &str, end: &str) -> Subscription {
        Subscription {
            id: id.into(),
            company_name: "Acme".into(),
            user_email: "ops@acme.io".into(),
            plan_name: "Pro".into(),
            start_date: Some("2026-01-01".into()),
            end_date: Some(end.into()),
            auto_renewal: true,
            canceled_at: None,
        }
    }

    fn contact(id: &str, status: ContactStatus) -> ContactRequest {
        ContactRequest {
            id: id.into(),
            name: id.into(),
            company: String::new(),
            email: String::new(),
            description: String::new(),
            status,
            created_at: None,
        }
    }

    #[test]
    fn duplicate_mutation_is_blocked_until_result_arrives() {
        let mut state = ConsoleState::new(10);
        let cmd = Command::SetBlocked {
            id: "c1".into(),
            blocked: true,
        };
        assert!(state.submit(cmd.clone()).is_some());
        assert!(state.submit(cmd.clone()).is_none());
        assert_eq!(state.take_notice().map(|n| n.level), Some(NoticeLevel::Info));

        state.apply(
            ok(
                CommandKind::SetBlocked,
                Outcome::BlockChanged {
                    id: "c1".into(),
                    blocked: true,
                },
            ),
            now(),
        );
        assert!(!state.is_in_flight(CommandKind::SetBlocked));
        assert!(state.submit(cmd).is_some());
    }

    #[test]
    fn reads_are_never_deduplicated() {
        let mut state = ConsoleState::new(10);
        assert!(state.submit(Command::LoadCompanies).is_some());
        assert!(state.submit(Command::LoadCompanies).is_some());
        assert!(state.companies.is_loading());
    }

    #[test]
    fn block_toggle_merges_locally_and_refetches_companies_only() {
        let mut state = ConsoleState::new(10);
        state.apply(
            ok(CommandKind::LoadCompanies, Outcome::Companies(vec![company("c1"), company("c2")])),
            now(),
        );
        let follow = state.apply(
            ok(
                CommandKind::SetBlocked,
                Outcome::BlockChanged {
                    id: "c2".into(),
                    blocked: true,
                },
            ),
            now(),
        );
        assert!(matches!(follow.as_slice(), [Command::LoadCompanies]));
        let view = state.companies.value().unwrap();
        assert!(view.find(|c| c.id == "c2").unwrap().blocked);
        assert!(!view.find(|c| c.id == "c1").unwrap().blocked);
    }

    #[test]
    fn refetch_keeps_search_and_page() {
        let mut state = ConsoleState::new(5);
        let list: Vec<Company> = (0..20).map(|i| company(&format!("c{i}"))).collect();
        state.apply(ok(CommandKind::LoadCompanies, Outcome::Companies(list.clone())), now());
        let view = state.companies.value_mut().unwrap();
        view.set_search("example");
        view.go_to_page(3);

        state.apply(ok(CommandKind::LoadCompanies, Outcome::Companies(list)), now());
        let view = state.companies.value().unwrap();
        assert_eq!(view.search(), "example");
        assert_eq!(view.page(), 3);
    }

    #[test]
    fn failed_first_load_is_reported_but_refetch_failure_keeps_data() {
        let mut state = ConsoleState::new(10);
        state.submit(Command::LoadContacts);
        state.apply(
            Event {
                kind: CommandKind::LoadContacts,
                result: Err(ConsoleError::Api {
                    status: 500,
                    message: "boom".into(),
                }),
            },
            now(),
        );
        assert_eq!(state.contacts.error(), Some("boom"));
        assert_eq!(state.take_notice().map(|n| n.text), Some("boom".to_string()));

        state.apply(
            ok(CommandKind::LoadContacts, Outcome::Contacts(vec![contact("a", ContactStatus::Pending)])),
            now(),
        );
        state.apply(
            Event {
                kind: CommandKind::LoadContacts,
                result: Err(ConsoleError::Api {
                    status: 502,
                    message: "bad gateway".into(),
                }),
            },
            now(),
        );
        assert!(state.contacts.is_loaded());
    }

    #[test]
    fn auth_failure_flags_session_expiry() {
        let mut state = ConsoleState::new(10);
        state.apply(
            Event {
                kind: CommandKind::LoadPlans,
                result: Err(ConsoleError::Unauthorized("jwt expired".into())),
            },
            now(),
        );
        assert!(state.take_session_expired());
        assert!(!state.take_session_expired());
    }

    #[test]
    fn deactivation_marks_rows_inactive_and_clears_selection() {
        let mut state = ConsoleState::new(10);
        state.apply(
            ok(
                CommandKind::LoadSubscriptions,
                Outcome::Subscriptions(vec![
                    subscription("s1", "2026-12-01"),
                    subscription("s2", "2026-12-01"),
                ]),
            ),
            now(),
        );
        state.toggle_selected("s1");
        state.toggle_selected("s2");
        match state.bulk_deactivate_command() {
            Command::BulkDeactivate(rows) => assert_eq!(rows.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }

        let follow = state.apply(
            ok(
                CommandKind::BulkDeactivate,
                Outcome::SubscriptionsDeactivated(vec!["s1".into()]),
            ),
            now(),
        );
        assert!(matches!(follow.as_slice(), [Command::LoadSubscriptions]));
        let view = state.subscriptions.value().unwrap();
        assert!(!view.find(|r| r.id() == "s1").unwrap().is_active());
        assert!(view.find(|r| r.id() == "s2").unwrap().is_active());
        assert_eq!(
            state.selected_subscriptions.iter().collect::<Vec<_>>(),
            vec!["s2"]
        );
    }

    #[test]
    fn connected_contacts_sink_to_the_bottom() {
        let mut state = ConsoleState::new(10);
        state.apply(
            ok(
                CommandKind::LoadContacts,
                Outcome::Contacts(vec![
                    contact("a", ContactStatus::Pending),
                    contact("b", ContactStatus::Pending),
                ]),
            ),
            now(),
        );
        state.apply(
            ok(
                CommandKind::SetContactStatus,
                Outcome::ContactStatusChanged {
                    id: "a".into(),
                    status: ContactStatus::Connected,
                },
            ),
            now(),
        );
        let ids: Vec<&str> = state
            .contacts
            .value()
            .unwrap()
            .rows()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn ticket_reply_updates_list_and_open_panel() {
        let mut state = ConsoleState::new(10);
        let ticket: Ticket = serde_json::from_value(serde_json::json!({
            "_id": "t1", "status": "In Progress", "adminMessages": []
        }))
        .unwrap();
        state.apply(
            ok(
                CommandKind::LoadTickets,
                Outcome::Tickets(TicketStats::default(), vec![ticket.clone()]),
            ),
            now(),
        );
        let follow = state.apply(
            ok(
                CommandKind::OpenTicket,
                Outcome::TicketOpened {
                    ticket,
                    progressed: false,
                },
            ),
            now(),
        );
        assert!(follow.is_empty());

        state.apply(
            ok(
                CommandKind::ReplyTicket,
                Outcome::TicketReplied {
                    id: "t1".into(),
                    message: "On it".into(),
                },
            ),
            now(),
        );
        let open = state.open_ticket.as_ref().unwrap();
        assert_eq!(open.admin_messages.len(), 1);
        let listed = state.tickets.value().unwrap().find(|t| t.id == "t1").unwrap();
        assert_eq!(listed.admin_messages[0].message, "On it");
    }

    #[test]
    fn saved_plan_is_merged_and_draft_cleared() {
        use crate::plan_editor::PlanField;

        let mut state = ConsoleState::new(10);
        let plan: SubscriptionPlan =
            serde_json::from_value(serde_json::json!({"_id": "p1", "monthlyPrice": 10})).unwrap();
        state.apply(ok(CommandKind::LoadPlans, Outcome::Plans(vec![plan])), now());
        state.plan_editor.stage("p1", PlanField::Price, "12").unwrap();
        let update = state.plan_editor.pending_update("p1");
        state.apply(
            ok(
                CommandKind::SavePlan,
                Outcome::PlanSaved {
                    id: "p1".into(),
                    update,
                },
            ),
            now(),
        );
        assert!(!state.plan_editor.is_dirty("p1"));
        assert_eq!(state.plans.value().unwrap()[0].monthly_price, 12.0);
    }

    #[test]
    fn edits_staged_during_save_survive_the_ack() {
        use crate::plan_editor::PlanField;

        let mut state = ConsoleState::new(10);
        let plan: SubscriptionPlan = serde_json::from_value(
            serde_json::json!({"_id": "p1", "monthlyPrice": 10, "maxEditors": 1}),
        )
        .unwrap();
        state.apply(ok(CommandKind::LoadPlans, Outcome::Plans(vec![plan])), now());
        state.plan_editor.stage("p1", PlanField::Price, "12").unwrap();
        let sent = state.plan_editor.pending_update("p1");
        state.submit(Command::SavePlan {
            id: "p1".into(),
            update: sent.clone(),
        });

        state.plan_editor.stage("p1", PlanField::MaxEditors, "7").unwrap();
        state.apply(
            ok(
                CommandKind::SavePlan,
                Outcome::PlanSaved {
                    id: "p1".into(),
                    update: sent,
                },
            ),
            now(),
        );
        let pending = state.plan_editor.pending_update("p1");
        assert_eq!(pending.monthly_price, None);
        assert_eq!(pending.max_editors, Some(7));
        assert_eq!(state.plans.value().unwrap()[0].monthly_price, 12.0);
    }

    #[test]
    fn refetch_moves_rolling_windows_forward() {
        use crate::view::TimeWindow;
        use chrono::Duration;

        let t0 = now();
        let at = |t: DateTime<Utc>| Some(to_iso8601_utc_string(&t));
        let notification = |id: &str, created: DateTime<Utc>| Notification {
            id: id.into(),
            kind: "info".into(),
            category: "Billing".into(),
            title: id.into(),
            description: String::new(),
            created_at: at(created),
        };
        let payment: Payment = serde_json::from_value(serde_json::json!({
            "transaction_id": "tx-new",
            "price": 10,
            "status": "succeeded",
            "paid_at": to_iso8601_utc_string(&(t0 + Duration::minutes(5)))
        }))
        .unwrap();

        let mut state = ConsoleState::new(10);
        state.apply(
            ok(
                CommandKind::LoadNotifications,
                Outcome::Notifications(vec![notification("old", t0 - Duration::hours(1))]),
            ),
            t0,
        );
        state.apply(
            ok(
                CommandKind::LoadPayments,
                Outcome::Payments(PaymentStats::default(), Vec::new()),
            ),
            t0,
        );
        state
            .notifications
            .value_mut()
            .unwrap()
            .update_filter(|f| f.window = TimeWindow::Last24Hours);
        state
            .payments
            .value_mut()
            .unwrap()
            .update_filter(|f| f.window = TimeWindow::Last24Hours);

        let later = t0 + Duration::minutes(10);
        state.apply(
            ok(
                CommandKind::LoadNotifications,
                Outcome::Notifications(vec![
                    notification("old", t0 - Duration::hours(1)),
                    notification("new", t0 + Duration::minutes(5)),
                ]),
            ),
            later,
        );
        state.apply(
            ok(
                CommandKind::LoadPayments,
                Outcome::Payments(PaymentStats::default(), vec![payment]),
            ),
            later,
        );

        let visible: Vec<&str> = state
            .notifications
            .value()
            .unwrap()
            .rows()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(visible, ["old", "new"]);
        assert_eq!(state.payments.value().unwrap().filtered_len(), 1);
    }

    #[test]
    fn entering_a_section_only_loads_missing_domains() {
        let mut state = ConsoleState::new(10);
        assert_eq!(state.enter(Section::Subscriptions).len(), 2);
        state.apply(ok(CommandKind::LoadPlans, Outcome::Plans(Vec::new())), now());
        let cmds = state.enter(Section::Subscriptions);
        assert!(matches!(cmds.as_slice(), [Command::LoadSubscriptions]));
        assert_eq!(state.refresh(Section::Subscriptions).len(), 2);
    }
}
