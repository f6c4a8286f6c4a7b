use serde::{Deserialize, Serialize};

use super::{Searchable, lenient};

/// 支付流水，管理端只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(alias = "transactionId", deserialize_with = "lenient::string_or_empty")]
    pub transaction_id: String,
    #[serde(rename = "companyName", default, deserialize_with = "lenient::string_or_empty")]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub email: String,
    #[serde(default, alias = "paymentMethod", deserialize_with = "lenient::string_or_empty")]
    pub payment_method: String,
    #[serde(default, alias = "amount", deserialize_with = "lenient::f64_or_zero")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub status: String,
    #[serde(default, alias = "paidAt", deserialize_with = "lenient::opt_timestamp")]
    pub paid_at: Option<String>,
}

impl Searchable for Payment {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            &self.transaction_id,
            &self.company_name,
            &self.email,
            &self.payment_method,
            &self.status,
        ]
    }
}

/// 支付概览统计，缺失字段按 0 处理
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentStats {
    #[serde(alias = "totalRevenue", deserialize_with = "lenient::f64_or_zero")]
    pub total_revenue: f64,
    #[serde(alias = "monthlyRevenue", deserialize_with = "lenient::f64_or_zero")]
    pub monthly_revenue: f64,
    #[serde(alias = "totalTransactions", deserialize_with = "lenient::u64_or_zero")]
    pub total_transactions: u64,
    #[serde(alias = "successfulTransactions", deserialize_with = "lenient::u64_or_zero")]
    pub successful_transactions: u64,
    #[serde(alias = "failedTransactions", deserialize_with = "lenient::u64_or_zero")]
    pub failed_transactions: u64,
    #[serde(alias = "activeSubscriptions", deserialize_with = "lenient::u64_or_zero")]
    pub active_subscriptions: u64,
}
