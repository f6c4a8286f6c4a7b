use futures_util::future::try_join;

use super::AdminClient;
use crate::error::Result;
use crate::models::{Payment, PaymentStats};

pub async fn stats(client: &AdminClient) -> Result<PaymentStats> {
    client.get(&["admin", "payments", "stats"]).await
}

pub async fn list(client: &AdminClient) -> Result<Vec<Payment>> {
    client.get(&["admin", "payments"]).await
}

/// 并发拉取统计与流水；任一失败即整体失败
pub async fn overview(client: &AdminClient) -> Result<(PaymentStats, Vec<Payment>)> {
    try_join(stats(client), list(client)).await
}
