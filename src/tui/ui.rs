use ratatui::{prelude::*, widgets::*};

use super::app::{App, InputMode, Screen};
use super::forms::{EmailDraft, Form, PromptPurpose};
use crate::console::{NoticeLevel, Section};
use crate::editor::RichTextEditor;
use crate::editor::preview::html_to_lines;
use crate::logging::time::display_or_na;
use crate::models::{RecipientGroup, Searchable, or_na};
use crate::plan_editor::PlanField;
use crate::view::{ListView, Loadable, RecordFilter};

/// 主渲染函数
///
/// 根据应用程序状态渲染登录页或控制台
///
/// # Arguments
///
/// * `frame` - 终端渲染帧
/// * `app` - 应用程序状态
pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.area();
    if app.screen == Screen::Login {
        render_login(frame, app, size);
        render_overlays(frame, app, size);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // 顶部多加一行空白
            Constraint::Min(8),    // 主内容
            Constraint::Length(1), // 底部帮助
        ])
        .split(size);

    render_header(frame, app, chunks[0]);
    match app.section() {
        Section::Dashboard => render_dashboard(frame, app, chunks[1]),
        Section::Users => render_users(frame, app, chunks[1]),
        Section::Payments => render_payments(frame, app, chunks[1]),
        Section::Subscriptions => render_subscriptions(frame, app, chunks[1]),
        Section::Plans => render_plans(frame, app, chunks[1]),
        Section::AddOns => render_addons(frame, app, chunks[1]),
        Section::Tickets => render_tickets(frame, app, chunks[1]),
        Section::Notifications => render_notifications(frame, app, chunks[1]),
        Section::Contacts => render_contacts(frame, app, chunks[1]),
        Section::Emails => render_emails(frame, app, chunks[1]),
    }

    let footer = Paragraph::new(footer_hint(app)).alignment(Alignment::Center);
    frame.render_widget(footer, chunks[2]);

    render_overlays(frame, app, size);
}

/// 渲染登录页
///
/// # Arguments
///
/// * `frame` - 终端渲染帧
/// * `app` - 应用程序状态
/// * `size` - 可用渲染区域
fn render_login(frame: &mut Frame, app: &App, size: Rect) {
    let area = centered_rect_fixed(56, 10, size);
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title("管理员登录")
        .borders(Borders::ALL);
    frame.render_widget(block, area);
    let inner = inner_rect(area);

    let mut lines = vec![
        Line::from(format!("服务: {}", app.api().base_url())).style(Style::default().fg(Color::DarkGray)),
        Line::from(""),
    ];
    lines.extend(form_lines(&app.login));
    lines.push(Line::from(""));
    let status = if app.login_pending {
        Line::from("登录中…").style(Style::default().fg(Color::Yellow))
    } else {
        Line::from("[Tab] 切换  [Enter] 登录  [Esc] 退出")
    };
    lines.push(status);
    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3)])
        .split(area);
    let titles: Vec<Line> = Section::ALL
        .iter()
        .enumerate()
        .map(|(i, s)| Line::from(format!("{} {}", (i + 1) % 10, s.title())))
        .collect();
    let nav_hint = format!(
        "{}{}",
        if app.nav.can_back() { "◀ [ " } else { "" },
        if app.nav.can_forward() { " ] ▶" } else { "" },
    );
    let tabs = Tabs::new(titles)
        .select(app.section().index())
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .title(format!("提案平台管理控制台  {nav_hint}")),
        );
    frame.render_widget(tabs, rows[1]);
}

/// 选中行是否为有效订阅（决定是否提示停用）
fn selected_subscription_active(app: &App) -> bool {
    app.console
        .subscriptions
        .value()
        .and_then(|v| v.row_at(app.selected))
        .is_some_and(|r| r.is_active())
}

fn footer_hint(app: &App) -> &'static str {
    match app.section() {
        Section::Dashboard => "[Tab] 切换区块  [r] 刷新  [L] 退出登录  [q] 退出",
        Section::Users => "[/] 搜索  [s] 状态  [b] 封禁  [Enter] 封禁/解封  [e] 导出  [y] 复制邮箱",
        Section::Payments => "[/] 搜索  [s] 状态  [m] 方式  [w] 时间  [i] 发票  [e] 导出",
        Section::Subscriptions if selected_subscription_active(app) => {
            "[p] 套餐  [d] 周期  [s] 状态  [Space] 勾选  [x] 停用  [X] 批量停用  [a] 分配  [u] 修改  [e] 导出"
        }
        Section::Subscriptions => {
            "[p] 套餐  [d] 周期  [s] 状态  [Space] 勾选  [X] 批量停用  [a] 分配  [u] 修改  [e] 导出"
        }
        Section::Plans => "←→ 字段  [Enter] 编辑  [c] 月/年  [s] 保存  [Esc] 放弃  [k] 联系销售",
        Section::AddOns => "[n] 新建  [Enter] 编辑  [d] 删除",
        Section::Tickets => "[/] 搜索  [s] 状态  [p] 优先级  [c] 分类  [Enter] 打开",
        Section::Notifications => "[/] 搜索  [c] 分类  [w] 时间",
        Section::Contacts => "[/] 搜索  [s] 状态  [Enter] 切换状态  [d] 删除",
        Section::Emails => "[Enter] 编辑模板  [n] 群发邮件",
    }
}

/// 未加载完成时的占位文字
fn placeholder<T>(slot: &Loadable<T>) -> Option<String> {
    match slot {
        Loadable::NotRequested | Loadable::Loading => Some("加载中…".to_string()),
        Loadable::Failed(e) => Some(format!("加载失败：{e}（按 r 重试）")),
        Loadable::Loaded(_) => None,
    }
}

fn render_placeholder(frame: &mut Frame, area: Rect, title: &str, text: String) {
    let p = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(p, area);
}

/// 分页与过滤状态行
fn list_status<T: Searchable, F: RecordFilter<T>>(view: &ListView<T, F>) -> String {
    let mut parts = vec![
        format!("第 {}/{} 页", view.page(), view.total_pages().max(1)),
        format!("共 {} 条", view.filtered_len()),
        format!("每页 {}", view.rows_per_page()),
    ];
    if !view.search().is_empty() {
        parts.push(format!("搜索: {}", view.search()));
    }
    if view.filter().is_active() {
        parts.push(format!("过滤: {}", view.filter().describe()));
    }
    parts.join("  ·  ")
}

/// 渲染带表头的数据表
///
/// # Arguments
///
/// * `frame` - 终端渲染帧
/// * `area` - 表格区域
/// * `title` - 边框标题
/// * `header` - 列名
/// * `widths` - 列宽
/// * `rows` - 每行各列文本
/// * `selected` - 选中行（页内下标）
fn render_table(
    frame: &mut Frame,
    area: Rect,
    title: String,
    header: &[&str],
    widths: &[Constraint],
    rows: Vec<Vec<String>>,
    selected: usize,
) {
    let header_row = Row::new(header.iter().map(|h| Cell::from(*h)))
        .style(Style::default().fg(Color::Yellow));
    let body: Vec<Row> = if rows.is_empty() {
        vec![Row::new(vec![Cell::from("暂无数据")]).style(Style::default().fg(Color::DarkGray))]
    } else {
        rows.into_iter()
            .enumerate()
            .map(|(i, cols)| {
                let row = Row::new(cols.into_iter().map(Cell::from));
                if i == selected {
                    row.style(Style::default().fg(Color::Black).bg(Color::Cyan))
                } else {
                    row
                }
            })
            .collect()
    };
    let table = Table::new(body, widths.to_vec())
        .header(header_row)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(text) = placeholder(&app.console.dashboard) {
        render_placeholder(frame, area, "概览", text);
        return;
    }
    let Some((payments, tickets)) = app.console.dashboard.value() else {
        return;
    };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let revenue = vec![
        Line::from(format!("总收入: {:.2}", payments.total_revenue)),
        Line::from(format!("本月收入: {:.2}", payments.monthly_revenue)),
        Line::from(format!("交易总数: {}", payments.total_transactions)),
        Line::from(format!("成功交易: {}", payments.successful_transactions))
            .style(Style::default().fg(Color::Green)),
        Line::from(format!("失败交易: {}", payments.failed_transactions))
            .style(Style::default().fg(Color::Red)),
        Line::from(format!("有效订阅: {}", payments.active_subscriptions)),
    ];
    let p = Paragraph::new(Text::from(revenue))
        .block(Block::default().title("收入").borders(Borders::ALL));
    frame.render_widget(p, cols[0]);

    let support = vec![
        Line::from(format!("工单总数: {}", tickets.total)),
        Line::from(format!("待处理: {}", tickets.pending)).style(Style::default().fg(Color::Yellow)),
        Line::from(format!("处理中: {}", tickets.in_progress)),
        Line::from(format!("重新打开: {}", tickets.re_opened)),
        Line::from(format!("已完成: {}", tickets.completed)).style(Style::default().fg(Color::Green)),
        Line::from(format!("已撤回: {}", tickets.withdrawn)),
    ];
    let p = Paragraph::new(Text::from(support))
        .block(Block::default().title("工单").borders(Borders::ALL));
    frame.render_widget(p, cols[1]);
}

fn render_users(frame: &mut Frame, app: &App, area: Rect) {
    let slot = &app.console.companies;
    let Some(view) = slot.value() else {
        render_placeholder(frame, area, "用户", placeholder(slot).unwrap_or_default());
        return;
    };
    let rows = view
        .rows()
        .into_iter()
        .map(|c| {
            vec![
                or_na(&c.company_name).to_string(),
                or_na(&c.email).to_string(),
                or_na(&c.website).to_string(),
                or_na(&c.status).to_string(),
                if c.blocked { "已封禁".into() } else { String::new() },
            ]
        })
        .collect();
    render_table(
        frame,
        area,
        format!("用户  {}", list_status(view)),
        &["公司", "邮箱", "网站", "状态", "封禁"],
        &[
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
        rows,
        app.selected,
    );
}

fn render_payments(frame: &mut Frame, app: &App, area: Rect) {
    let slot = &app.console.payments;
    let Some(view) = slot.value() else {
        render_placeholder(frame, area, "支付", placeholder(slot).unwrap_or_default());
        return;
    };
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);
    let stats = app
        .console
        .payment_stats
        .as_ref()
        .map(|s| {
            format!(
                "总收入 {:.2}    本月 {:.2}    交易 {}    成功 {}    失败 {}",
                s.total_revenue,
                s.monthly_revenue,
                s.total_transactions,
                s.successful_transactions,
                s.failed_transactions
            )
        })
        .unwrap_or_else(|| "--".into());
    frame.render_widget(
        Paragraph::new(stats).block(Block::default().title("统计").borders(Borders::ALL)),
        parts[0],
    );

    let rows = view
        .rows()
        .into_iter()
        .map(|p| {
            vec![
                or_na(&p.transaction_id).to_string(),
                or_na(&p.company_name).to_string(),
                or_na(&p.email).to_string(),
                or_na(&p.payment_method).to_string(),
                format!("{:.2}", p.price),
                or_na(&p.status).to_string(),
                display_or_na(p.paid_at.as_deref()),
            ]
        })
        .collect();
    render_table(
        frame,
        parts[1],
        format!("支付  {}", list_status(view)),
        &["交易号", "公司", "邮箱", "方式", "金额", "状态", "支付时间"],
        &[
            Constraint::Length(20),
            Constraint::Percentage(18),
            Constraint::Percentage(22),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(17),
        ],
        rows,
        app.selected,
    );
}

fn render_subscriptions(frame: &mut Frame, app: &App, area: Rect) {
    let slot = &app.console.subscriptions;
    let Some(view) = slot.value() else {
        render_placeholder(frame, area, "订阅", placeholder(slot).unwrap_or_default());
        return;
    };
    let marked = &app.console.selected_subscriptions;
    let rows = view
        .rows()
        .into_iter()
        .map(|r| {
            let s = &r.record;
            vec![
                if marked.contains(r.id()) { "[x]".into() } else { "[ ]".into() },
                or_na(&s.company_name).to_string(),
                or_na(&s.user_email).to_string(),
                or_na(&s.plan_name).to_string(),
                display_or_na(s.start_date.as_deref()),
                display_or_na(s.end_date.as_deref()),
                r.duration.to_string(),
                if s.auto_renewal { "是".into() } else { "否".into() },
                r.status.as_str().to_string(),
            ]
        })
        .collect();
    let title = if marked.is_empty() {
        format!("订阅  {}", list_status(view))
    } else {
        format!("订阅（已勾选 {}）  {}", marked.len(), list_status(view))
    };
    render_table(
        frame,
        area,
        title,
        &["", "公司", "邮箱", "套餐", "开始", "结束", "周期", "续费", "状态"],
        &[
            Constraint::Length(3),
            Constraint::Percentage(15),
            Constraint::Percentage(20),
            Constraint::Length(12),
            Constraint::Length(17),
            Constraint::Length(17),
            Constraint::Length(10),
            Constraint::Length(4),
            Constraint::Length(8),
        ],
        rows,
        app.selected,
    );
}

fn render_plans(frame: &mut Frame, app: &App, area: Rect) {
    let slot = &app.console.plans;
    let Some(plans) = slot.value() else {
        render_placeholder(frame, area, "套餐", placeholder(slot).unwrap_or_default());
        return;
    };
    let editor = &app.console.plan_editor;
    let mut header: Vec<Cell> = vec![Cell::from("套餐"), Cell::from("周期")];
    header.extend(PlanField::ALL.iter().map(|f| Cell::from(f.label())));
    header.push(Cell::from("联系销售"));
    let header = Row::new(header).style(Style::default().fg(Color::Yellow));

    let selected_style = Style::default().fg(Color::Black).bg(Color::Cyan);
    let rows: Vec<Row> = plans
        .iter()
        .enumerate()
        .map(|(i, plan)| {
            let dirty = editor.is_dirty(&plan.id);
            let name = if dirty {
                format!("{} *", plan.name)
            } else {
                plan.name.clone()
            };
            let mut cells = vec![
                Cell::from(name),
                Cell::from(editor.cycle(&plan.id).as_str()),
            ];
            for (j, field) in PlanField::ALL.iter().enumerate() {
                let cell = Cell::from(editor.display_value(plan, *field));
                cells.push(if i == app.selected && j == app.plan_field {
                    cell.style(selected_style.add_modifier(Modifier::BOLD))
                } else {
                    cell
                });
            }
            cells.push(Cell::from(if plan.is_contact { "是" } else { "否" }));
            let row = Row::new(cells);
            if i == app.selected {
                row.style(Style::default().fg(Color::Cyan))
            } else {
                row
            }
        })
        .collect();

    let mut widths = vec![Constraint::Length(14), Constraint::Length(8)];
    widths.extend(PlanField::ALL.iter().map(|_| Constraint::Length(11)));
    widths.push(Constraint::Length(8));
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title("套餐（* 表示有未保存的修改）").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_addons(frame: &mut Frame, app: &App, area: Rect) {
    let slot = &app.console.addons;
    let Some(addons) = slot.value() else {
        render_placeholder(frame, area, "增值包", placeholder(slot).unwrap_or_default());
        return;
    };
    let rows = addons
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                or_na(&a.description).to_string(),
                a.quantity.to_string(),
                format!("{:.2}", a.price),
                if a.popular { "★".into() } else { String::new() },
            ]
        })
        .collect();
    render_table(
        frame,
        area,
        format!("增值包（{}）", addons.len()),
        &["名称", "描述", "数量", "价格", "热门"],
        &[
            Constraint::Percentage(25),
            Constraint::Percentage(45),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(6),
        ],
        rows,
        app.selected,
    );
}

fn render_tickets(frame: &mut Frame, app: &App, area: Rect) {
    let slot = &app.console.tickets;
    let Some(view) = slot.value() else {
        render_placeholder(frame, area, "工单", placeholder(slot).unwrap_or_default());
        return;
    };
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);
    let stats = app
        .console
        .ticket_stats
        .as_ref()
        .map(|s| {
            format!(
                "总数 {}    待处理 {}    处理中 {}    重新打开 {}    已完成 {}    已撤回 {}",
                s.total, s.pending, s.in_progress, s.re_opened, s.completed, s.withdrawn
            )
        })
        .unwrap_or_else(|| "--".into());
    frame.render_widget(
        Paragraph::new(stats).block(Block::default().title("统计").borders(Borders::ALL)),
        parts[0],
    );

    let rows = view
        .rows()
        .into_iter()
        .map(|t| {
            vec![
                t.id.clone(),
                or_na(&t.company_name).to_string(),
                or_na(&t.category).to_string(),
                or_na(&t.sub_category).to_string(),
                t.priority.as_str().to_string(),
                t.status.as_str().to_string(),
                display_or_na(t.created_at.as_deref()),
            ]
        })
        .collect();
    render_table(
        frame,
        parts[1],
        format!("工单  {}", list_status(view)),
        &["编号", "公司", "分类", "子分类", "优先级", "状态", "创建时间"],
        &[
            Constraint::Length(14),
            Constraint::Percentage(18),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(17),
        ],
        rows,
        app.selected,
    );
}

fn render_notifications(frame: &mut Frame, app: &App, area: Rect) {
    let slot = &app.console.notifications;
    let Some(view) = slot.value() else {
        render_placeholder(frame, area, "通知", placeholder(slot).unwrap_or_default());
        return;
    };
    let rows = view
        .rows()
        .into_iter()
        .map(|n| {
            vec![
                or_na(&n.kind).to_string(),
                or_na(&n.category).to_string(),
                or_na(&n.title).to_string(),
                or_na(&n.description).to_string(),
                display_or_na(n.created_at.as_deref()),
            ]
        })
        .collect();
    render_table(
        frame,
        area,
        format!("通知  {}", list_status(view)),
        &["类型", "分类", "标题", "描述", "时间"],
        &[
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Percentage(25),
            Constraint::Percentage(40),
            Constraint::Length(17),
        ],
        rows,
        app.selected,
    );
}

fn render_contacts(frame: &mut Frame, app: &App, area: Rect) {
    let slot = &app.console.contacts;
    let Some(view) = slot.value() else {
        render_placeholder(frame, area, "联系请求", placeholder(slot).unwrap_or_default());
        return;
    };
    let rows = view
        .rows()
        .into_iter()
        .map(|c| {
            vec![
                or_na(&c.name).to_string(),
                or_na(&c.company).to_string(),
                or_na(&c.email).to_string(),
                or_na(&c.description).to_string(),
                c.status.label().to_string(),
                display_or_na(c.created_at.as_deref()),
            ]
        })
        .collect();
    render_table(
        frame,
        area,
        format!("联系请求  {}", list_status(view)),
        &["姓名", "公司", "邮箱", "描述", "状态", "时间"],
        &[
            Constraint::Percentage(14),
            Constraint::Percentage(16),
            Constraint::Percentage(20),
            Constraint::Percentage(30),
            Constraint::Length(10),
            Constraint::Length(17),
        ],
        rows,
        app.selected,
    );
}

fn render_emails(frame: &mut Frame, app: &App, area: Rect) {
    let slot = &app.console.templates;
    let Some(view) = slot.value() else {
        render_placeholder(frame, area, "邮件模板", placeholder(slot).unwrap_or_default());
        return;
    };
    let rows = view
        .rows()
        .into_iter()
        .map(|t| vec![or_na(&t.email_type).to_string(), or_na(&t.email_subject).to_string()])
        .collect();
    render_table(
        frame,
        area,
        format!("邮件模板  {}", list_status(view)),
        &["类型", "主题"],
        &[Constraint::Percentage(30), Constraint::Percentage(70)],
        rows,
        app.selected,
    );
}

fn form_lines(form: &Form) -> Vec<Line<'static>> {
    form.fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let cursor = if i == form.selected { "_" } else { "" };
            let line = Line::from(format!("{:<10} {}{}", f.label, f.display(), cursor));
            if i == form.selected {
                line.style(Style::default().fg(Color::Black).bg(Color::Cyan))
            } else {
                line
            }
        })
        .collect()
}

fn ticket_visible(mode: &InputMode) -> bool {
    match mode {
        InputMode::TicketDetail => true,
        InputMode::Prompt { purpose, .. } => matches!(
            purpose,
            PromptPurpose::TicketReply { .. } | PromptPurpose::TicketResolve { .. }
        ),
        _ => false,
    }
}

fn render_ticket_detail(frame: &mut Frame, app: &App, size: Rect) {
    let Some(t) = app.console.open_ticket.as_ref() else {
        return;
    };
    let area = centered_rect_fixed(84, 24, size);
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(format!("工单 {}  [r] 回复  [v] 解决  [Esc] 关闭", t.id))
        .borders(Borders::ALL);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(format!("公司: {}", or_na(&t.company_name))),
        Line::from(format!(
            "分类: {} / {}    优先级: {}    状态: {}",
            or_na(&t.category),
            or_na(&t.sub_category),
            t.priority.as_str(),
            t.status.as_str()
        )),
        Line::from(format!("创建时间: {}", display_or_na(t.created_at.as_deref()))),
        Line::from(""),
        Line::from(or_na(&t.description).to_string()),
        Line::from(""),
    ];
    let mut thread: Vec<(&str, Color, &crate::models::TicketMessage)> = t
        .user_messages
        .iter()
        .map(|m| ("用户", Color::White, m))
        .chain(t.admin_messages.iter().map(|m| ("客服", Color::Cyan, m)))
        .collect();
    thread.sort_by(|a, b| a.2.created_at.cmp(&b.2.created_at));
    for (who, color, m) in thread {
        lines.push(
            Line::from(format!(
                "[{}] {}: {}",
                display_or_na(m.created_at.as_deref()),
                who,
                m.message
            ))
            .style(Style::default().fg(color)),
        );
    }
    if let Some(resolution) = t.resolved_description.as_deref() {
        lines.push(Line::from(""));
        lines.push(Line::from(format!("解决说明: {resolution}")).style(Style::default().fg(Color::Green)));
    }
    let p = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
    frame.render_widget(p, inner_rect(area));
}

fn render_email_editor(frame: &mut Frame, draft: &EmailDraft, size: Rect) {
    let area = centered_rect_fixed(size.width.saturating_mul(4) / 5, size.height.saturating_mul(4) / 5, size);
    frame.render_widget(Clear, area);
    let block = Block::default().title(draft.title()).borders(Borders::ALL);
    frame.render_widget(block, area);
    let inner = inner_rect(area);
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(inner);

    let mut head = vec![Line::from(format!("主题: {}", or_na(draft.subject())))];
    if let EmailDraft::Custom(form) = draft {
        let recipients = match &form.recipients {
            RecipientGroup::Custom(list) => list.join(", "),
            other => other.label(),
        };
        head.push(Line::from(format!("收件人: {recipients}")));
    }
    frame.render_widget(Paragraph::new(Text::from(head)), parts[0]);

    let body: Vec<Line> = html_to_lines(draft.editor().content())
        .into_iter()
        .map(Line::from)
        .collect();
    let preview = Paragraph::new(Text::from(body))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("预览").borders(Borders::TOP));
    frame.render_widget(preview, parts[1]);

    let mut hint = String::from(
        "[s] 主题 [t] 段落 [b] 粗体 [i] 斜体 [h] 标题 [o/u] 列表 [l] 链接 [g] 图片 [c] 颜色 [k] 高亮",
    );
    if draft.editor().can_undo() {
        hint.push_str(" [z] 撤销");
    }
    hint.push_str(" [x] 清空");
    if matches!(draft, EmailDraft::Custom(_)) {
        hint.push_str(" [r] 分组 [R] 自定义收件人");
    }
    hint.push_str(" [Enter] 提交 [Esc] 放弃");
    frame.render_widget(Paragraph::new(hint).wrap(Wrap { trim: true }), parts[2]);
}

/// 渲染覆盖层界面
///
/// 渲染各种弹窗和提示信息，如表单、确认对话框、Toast 通知等
///
/// # Arguments
///
/// * `frame` - 终端渲染帧
/// * `app` - 应用程序状态
/// * `size` - 可用渲染区域
fn render_overlays(frame: &mut Frame, app: &App, size: Rect) {
    if ticket_visible(&app.input_mode) {
        render_ticket_detail(frame, app, size);
    }
    if let Some(draft) = app.draft.as_ref() {
        render_email_editor(frame, draft, size);
    }

    match &app.input_mode {
        InputMode::Search(buffer) => {
            render_input_box(frame, size, "搜索（Enter 确认，Esc 清除）", buffer);
        }
        InputMode::Prompt { title, buffer, .. } => {
            render_input_box(frame, size, title, buffer);
        }
        InputMode::Form(form) => {
            let can_deactivate = form.deactivate_command().is_some();
            let height = form.fields.len() as u16 + 4 + if can_deactivate { 2 } else { 0 };
            let area = centered_rect_fixed(64, height, size);
            frame.render_widget(Clear, area);
            let block = Block::default()
                .title(format!("{}  [Tab] 切换  [Enter] 提交  [Esc] 取消", form.title))
                .borders(Borders::ALL);
            frame.render_widget(block, area);
            let inner = inner_rect(area);
            let mut lines = form_lines(form);
            if can_deactivate {
                lines.push(Line::from(""));
                lines.push(Line::from("[Ctrl+D] 停用订阅").style(Style::default().fg(Color::Red)));
            }
            let p = Paragraph::new(Text::from(lines));
            frame.render_widget(p, Rect { y: inner.y + 1, height: inner.height.saturating_sub(1), ..inner });
        }
        InputMode::Confirm { message, .. } => {
            render_confirm(frame, size, message);
        }
        InputMode::ConfirmQuit => render_confirm(frame, size, "确认退出？"),
        InputMode::ConfirmLogout => render_confirm(frame, size, "确认退出登录？"),
        InputMode::None | InputMode::TicketDetail | InputMode::EmailEditor => {}
    }

    // Toast overlay（右上角，全局）
    if let Some(notice) = &app.toast {
        let w = (notice.text.chars().count().min(40) as u16) * 2 + 4;
        let w = w.min(size.width);
        let h = 3u16;
        let area = Rect {
            x: size.x + size.width.saturating_sub(w + 2),
            y: size.y + 1,
            width: w,
            height: h.min(size.height),
        };
        frame.render_widget(Clear, area);
        let color = match notice.level {
            NoticeLevel::Info => Color::Green,
            NoticeLevel::Error => Color::Red,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title("提示")
            .border_style(Style::default().fg(color));
        frame.render_widget(block, area);
        let p = Paragraph::new(notice.text.as_str()).alignment(Alignment::Center);
        frame.render_widget(p, inner_rect(area));
    }
}

fn render_input_box(frame: &mut Frame, size: Rect, title: &str, buffer: &str) {
    let area = centered_rect_fixed(64, 3, size);
    frame.render_widget(Clear, area);
    let p = Paragraph::new(format!("{buffer}_"))
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn render_confirm(frame: &mut Frame, size: Rect, message: &str) {
    let width = (message.chars().count() as u16).saturating_mul(2).max(30) + 4;
    let area = centered_rect_fixed(width, 6, size);
    frame.render_widget(Clear, area);
    let block = Block::default().title("确认").borders(Borders::ALL);
    frame.render_widget(block, area);
    let inner = inner_rect(area);
    let text_area = Rect {
        x: inner.x,
        y: inner.y + (inner.height.saturating_sub(2)) / 2,
        width: inner.width,
        height: 2.min(inner.height),
    };
    let lines = vec![Line::from(message.to_string()), Line::from("[Y] 是  [N] 否")];
    let p = Paragraph::new(Text::from(lines)).alignment(Alignment::Center);
    frame.render_widget(p, text_area);
}

fn inner_rect(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

/// 创建居中的矩形区域
///
/// 在给定的区域内创建一个指定尺寸的居中矩形
///
/// # Arguments
///
/// * `width` - 所需宽度
/// * `height` - 所需高度
/// * `r` - 父级区域
///
/// # Returns
///
/// 居中的矩形区域
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let w = width.min(r.width.saturating_sub(2));
    let h = height.min(r.height.saturating_sub(2));
    let x = r.x + (r.width.saturating_sub(w)) / 2;
    let y = r.y + (r.height.saturating_sub(h)) / 2;
    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}
