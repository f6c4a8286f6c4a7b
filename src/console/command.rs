//! 控制台发往后端的指令及其结果事件

use futures_util::future::try_join;

use crate::api::{self, AdminClient};
use crate::error::ConsoleError;
use crate::models::{
    AddOn, AddOnPayload, AssignSubscriptionPayload, Company, ContactRequest, ContactStatus,
    EmailTemplate, Notification, Payment, PaymentStats, PlanUpdate, SendEmailPayload,
    Subscription, SubscriptionPlan, Ticket, TicketStats, UpdateEmailTemplatePayload,
    UpdateSubscriptionPayload,
};
use crate::subscription::SubscriptionRow;

/// 一次后端调用
#[derive(Debug, Clone)]
pub enum Command {
    LoadDashboard,
    LoadCompanies,
    LoadPayments,
    LoadSubscriptions,
    LoadPlans,
    LoadAddOns,
    LoadTickets,
    LoadNotifications,
    LoadContacts,
    LoadTemplates,
    SetBlocked { id: String, blocked: bool },
    OpenTicket(Ticket),
    ReplyTicket { id: String, message: String },
    ResolveTicket { id: String, resolution: String },
    AssignSubscription(AssignSubscriptionPayload),
    UpdateSubscription { id: String, payload: UpdateSubscriptionPayload },
    DeactivateSubscription(SubscriptionRow),
    BulkDeactivate(Vec<SubscriptionRow>),
    SavePlan { id: String, update: PlanUpdate },
    SetPlanContact { id: String, is_contact: bool },
    CreateAddOn(AddOnPayload),
    UpdateAddOn { id: String, payload: AddOnPayload },
    DeleteAddOn(String),
    SetContactStatus { id: String, status: ContactStatus },
    DeleteContact(String),
    SaveTemplate { id: String, payload: UpdateEmailTemplatePayload },
    SendEmail(SendEmailPayload),
}

/// 指令种类，用于防止同类写操作重复提交
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    LoadDashboard,
    LoadCompanies,
    LoadPayments,
    LoadSubscriptions,
    LoadPlans,
    LoadAddOns,
    LoadTickets,
    LoadNotifications,
    LoadContacts,
    LoadTemplates,
    SetBlocked,
    OpenTicket,
    ReplyTicket,
    ResolveTicket,
    AssignSubscription,
    UpdateSubscription,
    DeactivateSubscription,
    BulkDeactivate,
    SavePlan,
    SetPlanContact,
    CreateAddOn,
    UpdateAddOn,
    DeleteAddOn,
    SetContactStatus,
    DeleteContact,
    SaveTemplate,
    SendEmail,
}

impl CommandKind {
    pub fn is_mutation(self) -> bool {
        !matches!(
            self,
            CommandKind::LoadDashboard
                | CommandKind::LoadCompanies
                | CommandKind::LoadPayments
                | CommandKind::LoadSubscriptions
                | CommandKind::LoadPlans
                | CommandKind::LoadAddOns
                | CommandKind::LoadTickets
                | CommandKind::LoadNotifications
                | CommandKind::LoadContacts
                | CommandKind::LoadTemplates
        )
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::LoadDashboard => CommandKind::LoadDashboard,
            Command::LoadCompanies => CommandKind::LoadCompanies,
            Command::LoadPayments => CommandKind::LoadPayments,
            Command::LoadSubscriptions => CommandKind::LoadSubscriptions,
            Command::LoadPlans => CommandKind::LoadPlans,
            Command::LoadAddOns => CommandKind::LoadAddOns,
            Command::LoadTickets => CommandKind::LoadTickets,
            Command::LoadNotifications => CommandKind::LoadNotifications,
            Command::LoadContacts => CommandKind::LoadContacts,
            Command::LoadTemplates => CommandKind::LoadTemplates,
            Command::SetBlocked { .. } => CommandKind::SetBlocked,
            Command::OpenTicket(_) => CommandKind::OpenTicket,
            Command::ReplyTicket { .. } => CommandKind::ReplyTicket,
            Command::ResolveTicket { .. } => CommandKind::ResolveTicket,
            Command::AssignSubscription(_) => CommandKind::AssignSubscription,
            Command::UpdateSubscription { .. } => CommandKind::UpdateSubscription,
            Command::DeactivateSubscription(_) => CommandKind::DeactivateSubscription,
            Command::BulkDeactivate(_) => CommandKind::BulkDeactivate,
            Command::SavePlan { .. } => CommandKind::SavePlan,
            Command::SetPlanContact { .. } => CommandKind::SetPlanContact,
            Command::CreateAddOn(_) => CommandKind::CreateAddOn,
            Command::UpdateAddOn { .. } => CommandKind::UpdateAddOn,
            Command::DeleteAddOn(_) => CommandKind::DeleteAddOn,
            Command::SetContactStatus { .. } => CommandKind::SetContactStatus,
            Command::DeleteContact(_) => CommandKind::DeleteContact,
            Command::SaveTemplate { .. } => CommandKind::SaveTemplate,
            Command::SendEmail(_) => CommandKind::SendEmail,
        }
    }
}

/// 后端确认后的结果，携带本地合并所需的数据
#[derive(Debug, Clone)]
pub enum Outcome {
    Dashboard(PaymentStats, TicketStats),
    Companies(Vec<Company>),
    Payments(PaymentStats, Vec<Payment>),
    Subscriptions(Vec<Subscription>),
    Plans(Vec<SubscriptionPlan>),
    AddOns(Vec<AddOn>),
    Tickets(TicketStats, Vec<Ticket>),
    Notifications(Vec<Notification>),
    Contacts(Vec<ContactRequest>),
    Templates(Vec<EmailTemplate>),
    BlockChanged { id: String, blocked: bool },
    /// `progressed` 为 true 表示发出了 In Progress 流转
    TicketOpened { ticket: Ticket, progressed: bool },
    TicketReplied { id: String, message: String },
    TicketResolved { id: String, resolution: String },
    SubscriptionAssigned,
    SubscriptionUpdated { id: String, payload: UpdateSubscriptionPayload },
    SubscriptionsDeactivated(Vec<String>),
    PlanSaved { id: String, update: PlanUpdate },
    PlanContactChanged { id: String, is_contact: bool },
    AddOnCreated(AddOn),
    AddOnUpdated { id: String, payload: AddOnPayload },
    AddOnDeleted(String),
    ContactStatusChanged { id: String, status: ContactStatus },
    ContactDeleted(String),
    TemplateSaved { id: String, payload: UpdateEmailTemplatePayload },
    EmailSent { recipients: String },
    /// 没有需要提交的改动
    Unchanged,
}

/// 指令执行完毕后回到界面循环的事件
#[derive(Debug)]
pub struct Event {
    pub kind: CommandKind,
    pub result: Result<Outcome, ConsoleError>,
}

/// 执行一条指令；任何错误都收进事件，不会向上传播
pub async fn execute(client: &AdminClient, command: Command) -> Event {
    let kind = command.kind();
    let result = run(client, command).await;
    if let Err(e) = &result {
        tracing::warn!(?kind, error = %e, "command failed");
    }
    Event { kind, result }
}

async fn run(client: &AdminClient, command: Command) -> Result<Outcome, ConsoleError> {
    use crate::api::{
        companies, contacts, emails, notifications, payments, plans, subscriptions, tickets,
    };

    let outcome = match command {
        Command::LoadDashboard => {
            let (p, t) = try_join(payments::stats(client), tickets::stats(client)).await?;
            Outcome::Dashboard(p, t)
        }
        Command::LoadCompanies => Outcome::Companies(companies::list(client).await?),
        Command::LoadPayments => {
            let (stats, list) = payments::overview(client).await?;
            Outcome::Payments(stats, list)
        }
        Command::LoadSubscriptions => Outcome::Subscriptions(subscriptions::list(client).await?),
        Command::LoadPlans => Outcome::Plans(plans::list(client).await?),
        Command::LoadAddOns => Outcome::AddOns(plans::list_addons(client).await?),
        Command::LoadTickets => {
            let (stats, list) = try_join(tickets::stats(client), tickets::list(client)).await?;
            Outcome::Tickets(stats, list)
        }
        Command::LoadNotifications => Outcome::Notifications(notifications::list(client).await?),
        Command::LoadContacts => Outcome::Contacts(contacts::list(client).await?),
        Command::LoadTemplates => Outcome::Templates(emails::list_templates(client).await?),
        Command::SetBlocked { id, blocked } => {
            companies::set_blocked(client, &id, blocked).await?;
            Outcome::BlockChanged { id, blocked }
        }
        Command::OpenTicket(ticket) => {
            let opened = tickets::open(client, &ticket).await?;
            let progressed = opened.status != ticket.status;
            Outcome::TicketOpened {
                ticket: opened,
                progressed,
            }
        }
        Command::ReplyTicket { id, message } => {
            tickets::reply(client, &id, &message).await?;
            Outcome::TicketReplied {
                id,
                message: message.trim().to_string(),
            }
        }
        Command::ResolveTicket { id, resolution } => {
            tickets::resolve(client, &id, &resolution).await?;
            Outcome::TicketResolved {
                id,
                resolution: resolution.trim().to_string(),
            }
        }
        Command::AssignSubscription(payload) => {
            subscriptions::assign(client, &payload).await?;
            Outcome::SubscriptionAssigned
        }
        Command::UpdateSubscription { id, payload } => {
            if subscriptions::update(client, &id, &payload).await? {
                Outcome::SubscriptionUpdated { id, payload }
            } else {
                Outcome::Unchanged
            }
        }
        Command::DeactivateSubscription(row) => {
            subscriptions::deactivate(client, &row).await?;
            Outcome::SubscriptionsDeactivated(vec![row.id().to_string()])
        }
        Command::BulkDeactivate(rows) => {
            let refs: Vec<&SubscriptionRow> = rows.iter().collect();
            Outcome::SubscriptionsDeactivated(subscriptions::bulk_deactivate(client, &refs).await?)
        }
        Command::SavePlan { id, update } => {
            if plans::update_price(client, &id, &update).await? {
                Outcome::PlanSaved { id, update }
            } else {
                Outcome::Unchanged
            }
        }
        Command::SetPlanContact { id, is_contact } => {
            plans::set_contact(client, &id, is_contact).await?;
            Outcome::PlanContactChanged { id, is_contact }
        }
        Command::CreateAddOn(payload) => Outcome::AddOnCreated(plans::create_addon(client, &payload).await?),
        Command::UpdateAddOn { id, payload } => {
            plans::update_addon(client, &id, &payload).await?;
            Outcome::AddOnUpdated { id, payload }
        }
        Command::DeleteAddOn(id) => {
            plans::delete_addon(client, &id).await?;
            Outcome::AddOnDeleted(id)
        }
        Command::SetContactStatus { id, status } => {
            contacts::set_status(client, &id, status).await?;
            Outcome::ContactStatusChanged { id, status }
        }
        Command::DeleteContact(id) => {
            contacts::delete(client, &id).await?;
            Outcome::ContactDeleted(id)
        }
        Command::SaveTemplate { id, payload } => {
            emails::update_template(client, &id, &payload).await?;
            Outcome::TemplateSaved { id, payload }
        }
        Command::SendEmail(payload) => {
            emails::send(client, &payload).await?;
            Outcome::EmailSent {
                recipients: payload.recipients.label(),
            }
        }
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubBackend;
    use crate::models::TicketStatus;
    use serde_json::json;

    #[test]
    fn only_writes_are_mutations() {
        assert!(!Command::LoadCompanies.kind().is_mutation());
        assert!(!Command::LoadDashboard.kind().is_mutation());
        assert!(Command::DeleteContact("c1".into()).kind().is_mutation());
        assert!(
            Command::SetBlocked {
                id: "1".into(),
                blocked: true
            }
            .kind()
            .is_mutation()
        );
    }

    #[tokio::test]
    async fn dashboard_loads_both_stat_sets() {
        let stub = StubBackend::start().await;
        stub.respond(
            "GET",
            "/admin/payments/stats",
            200,
            json!({"data": {"totalRevenue": "120.5", "totalPayments": 3}}),
        );
        stub.respond("GET", "/admin/support/stats", 200, json!({"pending": 2}));
        let event = execute(&stub.client(), Command::LoadDashboard).await;
        assert_eq!(event.kind, CommandKind::LoadDashboard);
        match event.result {
            Ok(Outcome::Dashboard(_, tickets)) => assert_eq!(tickets.pending, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn opening_in_progress_ticket_reports_no_progress() {
        let stub = StubBackend::start().await;
        let ticket: Ticket =
            serde_json::from_value(json!({"_id": "t1", "status": "In Progress"})).unwrap();
        let event = execute(&stub.client(), Command::OpenTicket(ticket)).await;
        match event.result {
            Ok(Outcome::TicketOpened { ticket, progressed }) => {
                assert!(!progressed);
                assert_eq!(ticket.status, TicketStatus::InProgress);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(stub.requests().len(), 0);
    }

    #[tokio::test]
    async fn empty_plan_update_is_unchanged_without_request() {
        let stub = StubBackend::start().await;
        let event = execute(
            &stub.client(),
            Command::SavePlan {
                id: "p1".into(),
                update: PlanUpdate::default(),
            },
        )
        .await;
        assert!(matches!(event.result, Ok(Outcome::Unchanged)));
        assert_eq!(stub.requests().len(), 0);
    }

    #[tokio::test]
    async fn backend_errors_are_captured_in_event() {
        let stub = StubBackend::start().await;
        stub.respond(
            "DELETE",
            "/admin/contact-requests/c9",
            404,
            json!({"message": "Contact request not found"}),
        );
        let event = execute(&stub.client(), Command::DeleteContact("c9".into())).await;
        let err = event.result.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().contains("Contact request not found"));
    }
}
