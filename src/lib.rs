//! 提案平台管理控制台
//!
//! 终端里的运营后台：用户、支付、订阅、套餐、工单、通知、联系请求与邮件模板。

pub mod api;
pub mod config;
pub mod console;
pub mod editor;
pub mod error;
pub mod export;
pub mod http_client;
pub mod logging;
pub mod models;
pub mod plan_editor;
pub mod session;
pub mod subscription;
pub mod tui;
pub mod view;
