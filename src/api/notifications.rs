use super::AdminClient;
use crate::error::Result;
use crate::models::Notification;

pub async fn list(client: &AdminClient) -> Result<Vec<Notification>> {
    client.get(&["admin", "notifications"]).await
}
