use reqwest::Method;

use super::{AdminClient, record_id};
use crate::error::{ConsoleError, Result};
use crate::models::ticket::{TicketReplyPayload, TicketResolvePayload, TicketStatusPayload};
use crate::models::{Ticket, TicketStats, TicketStatus};

pub async fn stats(client: &AdminClient) -> Result<TicketStats> {
    client.get(&["admin", "support", "stats"]).await
}

pub async fn list(client: &AdminClient) -> Result<Vec<Ticket>> {
    client.get(&["admin", "support", "tickets"]).await
}

pub async fn set_status(client: &AdminClient, id: &str, status: TicketStatus) -> Result<()> {
    let path = ["admin", "support", "tickets", record_id(id)?, "status"];
    client.send(Method::PUT, &path, &TicketStatusPayload { status }).await
}

/// 打开工单详情
///
/// 仍处于待处理状态的工单会先被流转到 In Progress；
/// In Progress / Completed / Withdrawn 的工单不发任何请求
///
/// # Returns
///
/// 详情面板应展示的工单（状态已更新）
pub async fn open(client: &AdminClient, ticket: &Ticket) -> Result<Ticket> {
    let mut opened = ticket.clone();
    if ticket.status.needs_auto_progress() {
        set_status(client, &ticket.id, TicketStatus::InProgress).await?;
        opened.status = TicketStatus::InProgress;
    }
    Ok(opened)
}

/// 管理员回复
pub async fn reply(client: &AdminClient, id: &str, message: &str) -> Result<()> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ConsoleError::InvalidInput("reply message is empty".into()));
    }
    let path = ["admin", "support", "tickets", record_id(id)?, "messages"];
    client
        .send(
            Method::POST,
            &path,
            &TicketReplyPayload {
                message: message.to_string(),
            },
        )
        .await
}

/// 标记为 Completed 并记录解决说明
pub async fn resolve(client: &AdminClient, id: &str, resolution: &str) -> Result<()> {
    let resolution = resolution.trim();
    if resolution.is_empty() {
        return Err(ConsoleError::InvalidInput("resolution is required".into()));
    }
    let path = ["admin", "support", "tickets", record_id(id)?, "resolve"];
    client
        .send(
            Method::PUT,
            &path,
            &TicketResolvePayload {
                status: TicketStatus::Completed,
                resolved_description: resolution.to_string(),
            },
        )
        .await
}
