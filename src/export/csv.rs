use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::logging::time::display_or_na;
use crate::models::{Company, Payment};
use crate::subscription::SubscriptionRow;

/// 可导出为 CSV 行的记录
pub trait CsvRecord {
    const FILE_PREFIX: &'static str;

    fn header() -> &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn line(fields: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    let mut out = fields
        .into_iter()
        .map(|f| escape_csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str("\r\n");
    out
}

pub fn to_csv<'a, T: CsvRecord + 'a>(rows: impl IntoIterator<Item = &'a T>) -> String {
    let mut csv_content = line(T::header().iter().copied());
    for row in rows {
        csv_content.push_str(&line(row.fields()));
    }
    csv_content
}

/// 把（已过滤的）记录写成带时间戳的 CSV 文件
pub fn export<'a, T: CsvRecord + 'a>(
    dir: &Path,
    rows: impl IntoIterator<Item = &'a T>,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let content = to_csv(rows);
    let name = super::file_name(T::FILE_PREFIX, "csv", now);
    super::write_file(dir, &name, &content)
}

impl CsvRecord for Company {
    const FILE_PREFIX: &'static str = "users";

    fn header() -> &'static [&'static str] {
        &["id", "companyName", "email", "website", "status", "blocked"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.company_name.clone(),
            self.email.clone(),
            self.website.clone(),
            self.status.clone(),
            self.blocked.to_string(),
        ]
    }
}

impl CsvRecord for Payment {
    const FILE_PREFIX: &'static str = "payments";

    fn header() -> &'static [&'static str] {
        &[
            "transaction_id",
            "companyName",
            "email",
            "payment_method",
            "price",
            "status",
            "paid_at",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.transaction_id.clone(),
            self.company_name.clone(),
            self.email.clone(),
            self.payment_method.clone(),
            format!("{:.2}", self.price),
            self.status.clone(),
            display_or_na(self.paid_at.as_deref()),
        ]
    }
}

impl CsvRecord for SubscriptionRow {
    const FILE_PREFIX: &'static str = "subscriptions";

    fn header() -> &'static [&'static str] {
        &[
            "id",
            "companyName",
            "userEmail",
            "plan_name",
            "start_date",
            "end_date",
            "duration",
            "status",
            "auto_renewal",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let r = &self.record;
        vec![
            r.id.clone(),
            r.company_name.clone(),
            r.user_email.clone(),
            r.plan_name.clone(),
            display_or_na(r.start_date.as_deref()),
            display_or_na(r.end_date.as_deref()),
            self.duration.to_string(),
            self.status.as_str().to_string(),
            r.auto_renewal.to_string(),
        ]
    }
}
