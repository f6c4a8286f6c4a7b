//! 终端界面：终端初始化、事件循环与后台任务派发

pub mod app;
pub mod forms;
pub mod ui;

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64_STANDARD;
use chrono::Utc;
use crossterm::event::{self, Event as TermEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::prelude::CrosstermBackend;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use crate::api::{ApiClient, auth};
use crate::config::Settings;
use crate::console::execute;
use crate::error::Result;
use app::{App, Message, Outgoing};

type Term = ratatui::Terminal<CrosstermBackend<Stdout>>;

const TICK_RATE: Duration = Duration::from_millis(33);

/// 复制文本到系统剪贴板
///
/// 尝试使用系统剪贴板，如果失败则使用 OSC52 转义序列作为回退方案
///
/// # Arguments
///
/// * `text` - 要复制的文本
///
/// # Returns
///
/// * `Ok(())` - 复制成功
/// * `Err(String)` - 复制失败的错误信息
pub fn copy_to_clipboard(text: &str) -> std::result::Result<(), String> {
    match arboard::Clipboard::new().and_then(|mut c| c.set_text(text.to_string())) {
        Ok(()) => Ok(()),
        Err(e) => {
            let osc = format!("\x1b]52;c;{}\x07", B64_STANDARD.encode(text.as_bytes()));
            let mut out = io::stdout().lock();
            if out.write_all(osc.as_bytes()).is_ok() && out.flush().is_ok() {
                return Ok(());
            }
            Err(format!("系统剪贴板失败且 OSC52 回退失败：{e}"))
        }
    }
}

/// 初始化终端：原始模式 + 备用屏幕
fn init_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let terminal = ratatui::Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// 恢复终端状态
fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// 把待发请求交给 tokio 运行时；结果通过 channel 回到界面循环
fn spawn_outgoing(handle: &Handle, app: &App, outgoing: Outgoing, tx: &UnboundedSender<Message>) {
    let tx = tx.clone();
    match outgoing {
        Outgoing::Command { command, delay } => {
            let Some(client) = app.client().cloned() else {
                return;
            };
            handle.spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let event = execute(&client, command).await;
                let _ = tx.send(Message::Event(event));
            });
        }
        Outgoing::Login { email, password } => {
            let api: ApiClient = app.api().clone();
            handle.spawn(async move {
                let result = auth::login(&api, &email, &password).await;
                let _ = tx.send(Message::LoggedIn(result));
            });
        }
    }
}

fn event_loop(terminal: &mut Term, app: &mut App, handle: &Handle) -> Result<()> {
    let (tx, mut rx) = unbounded_channel::<Message>();
    loop {
        while let Ok(message) = rx.try_recv() {
            app.handle_message(message, Utc::now());
        }
        for outgoing in app.take_outgoing() {
            spawn_outgoing(handle, app, outgoing, &tx);
        }
        app.tick(Instant::now());

        terminal.draw(|f| ui::render(f, app))?;
        if event::poll(TICK_RATE)? {
            if let TermEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key, Utc::now());
                }
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

/// 运行控制台直到用户退出
///
/// # Arguments
///
/// * `settings` - 已加载的配置
/// * `handle` - 执行网络请求的 tokio 运行时
pub fn run(settings: Settings, handle: Handle) -> Result<()> {
    let mut app = App::new(settings, Utc::now())?;
    let mut terminal = init_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &handle);
    if let Err(e) = restore_terminal(&mut terminal) {
        tracing::warn!(error = %e, "failed to restore terminal");
    }
    tracing::info!("console closed");
    result
}
