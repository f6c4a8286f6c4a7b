use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::ExportConfig;
use crate::editor::markup::escape_html;
use crate::error::Result;
use crate::logging::time::{display_or_na, to_display_string};
use crate::models::{Payment, or_na};

/// 生成单笔支付的可打印发票（独立 HTML，浏览器打印即得 PDF）
pub fn render(payment: &Payment, issuer: &ExportConfig, generated_at: DateTime<Utc>) -> String {
    let mut issuer_lines = vec![escape_html(&issuer.issuer_name)];
    if let Some(addr) = issuer.issuer_address.as_deref().filter(|s| !s.trim().is_empty()) {
        issuer_lines.push(escape_html(addr));
    }
    if let Some(email) = issuer.issuer_email.as_deref().filter(|s| !s.trim().is_empty()) {
        issuer_lines.push(escape_html(email));
    }

    let rows = [
        ("Transaction ID", or_na(&payment.transaction_id).to_string()),
        ("Company", or_na(&payment.company_name).to_string()),
        ("Email", or_na(&payment.email).to_string()),
        ("Payment method", or_na(&payment.payment_method).to_string()),
        ("Status", or_na(&payment.status).to_string()),
        ("Paid at", display_or_na(payment.paid_at.as_deref())),
    ];
    let table: String = rows
        .iter()
        .map(|(k, v)| format!("<tr><th>{}</th><td>{}</td></tr>\n", k, escape_html(v)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<title>Invoice {id}</title>
<style>
body {{ font-family: Helvetica, Arial, sans-serif; margin: 40px; color: #222; }}
h1 {{ margin-bottom: 4px; }}
.issuer {{ color: #555; margin-bottom: 24px; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ text-align: left; padding: 8px; border-bottom: 1px solid #ddd; }}
.total {{ font-size: 1.3em; margin-top: 24px; text-align: right; }}
@media print {{ body {{ margin: 0; }} }}
</style>
</head>
<body>
<h1>Invoice</h1>
<div class="issuer">{issuer}</div>
<table>
{table}</table>
<div class="total">Total: ${total:.2}</div>
<p class="generated">Generated {generated}</p>
</body>
</html>
"#,
        id = escape_html(&payment.transaction_id),
        issuer = issuer_lines.join("<br />"),
        table = table,
        total = payment.price,
        generated = to_display_string(&generated_at),
    )
}

pub fn write(
    dir: &Path,
    payment: &Payment,
    issuer: &ExportConfig,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let html = render(payment, issuer, now);
    let prefix = format!("invoice-{}", payment.transaction_id);
    let name = super::file_name(&prefix, "html", now);
    super::write_file(dir, &name, &html)
}
