use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};
use crate::models::{Decision, Record, StatusFilter};
use crate::review::view::page_window;

pub fn draw(frame: &mut Frame, app: &App) {
    match &app.screen {
        Screen::Fatal(message) => draw_fatal(frame, message),
        Screen::SignIn => render_sign_in(frame, app),
        Screen::Ready => render_main(frame, app),
    }

    // Render help popup if active
    if app.show_help {
        render_help(frame);
    }
}

/// Blocking message for configuration the reviewer must fix outside the app.
pub fn draw_fatal(frame: &mut Frame, message: &str) {
    let area = centered_rect(70, 40, frame.area());

    let block = Block::default()
        .title(" Configuration error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = format!("{message}\n\nFix the configuration and restart.\n\nPress any key to exit");
    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn render_sign_in(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 30, frame.area());

    let block = Block::default()
        .title(" Sign in ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let mut lines = vec![
        Line::from(""),
        Line::from("Sign in to access the review spreadsheet."),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: sign in    q: quit",
            Style::default().fg(Color::Yellow),
        )),
    ];
    if let Some(message) = &app.status_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_main(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Progress header
            Constraint::Min(0),    // Filters + list
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)])
        .split(rows[1]);

    render_progress(frame, app, rows[0]);
    render_filters(frame, app, columns[0]);
    render_record_list(frame, app, columns[1]);
    render_status(frame, app, rows[2]);

    if let Some(record) = app.selected_record() {
        render_detail(frame, app, record);
    }
}

fn render_progress(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.stats();

    let title = format!(
        " Knowledge Review | Total {} | Reviewed {} | Approved {} | Rejected {} ",
        stats.total, stats.reviewed, stats.approved, stats.rejected
    );

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .gauge_style(Style::default().fg(Color::Blue))
        .percent(stats.percent_reviewed().min(100))
        .label(format!("{}% reviewed", stats.percent_reviewed()));

    frame.render_widget(gauge, area);
}

fn render_filters(frame: &mut Frame, app: &App, area: Rect) {
    let highlight = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let normal = Style::default().fg(Color::White);
    let heading = Style::default().fg(Color::Yellow);

    let search = if app.search_input_active {
        format!("> {}_", app.filter.search)
    } else if app.filter.search.is_empty() {
        "(/ to search)".to_string()
    } else {
        app.filter.search.clone()
    };

    let mut lines = vec![
        Line::from(Span::styled("Search", heading)),
        Line::from(search),
        Line::from(""),
        Line::from(Span::styled("Status (f)", heading)),
    ];

    let statuses = [
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::Approved,
        StatusFilter::Rejected,
    ];
    lines.push(Line::from(
        statuses
            .iter()
            .flat_map(|s| {
                let style = if *s == app.filter.status { highlight } else { normal };
                [Span::styled(format!(" {} ", s.label()), style), Span::raw(" ")]
            })
            .collect::<Vec<_>>(),
    ));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Category (c)", heading)));
    let any_style = if app.filter.category.is_none() { highlight } else { normal };
    lines.push(Line::from(Span::styled(" Any ", any_style)));
    for category in app.cache.categories() {
        let style = if app.filter.category.as_deref() == Some(category.as_str()) {
            highlight
        } else {
            normal
        };
        lines.push(Line::from(Span::styled(format!(" {category} "), style)));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().title(" Filters ").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn decision_span(record: &Record, pending: bool) -> Span<'static> {
    if pending {
        return Span::styled("[saving]  ", Style::default().fg(Color::Yellow));
    }
    match record.decision {
        Decision::Unreviewed => Span::styled("[pending] ", Style::default().fg(Color::DarkGray)),
        Decision::Approved => Span::styled("[approved]", Style::default().fg(Color::Green)),
        Decision::Rejected => Span::styled("[rejected]", Style::default().fg(Color::Red)),
    }
}

fn render_record_list(frame: &mut Frame, app: &App, area: Rect) {
    let page = app.current_view();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let title = if page.total_count == 0 {
        " No entries to review ".to_string()
    } else if page.items.is_empty() {
        format!(" 0 of {} ", page.total_count)
    } else {
        let first = page.first_index() + 1;
        let last = page.first_index() + page.items.len();
        format!(" {}-{} of {} ", first, last, page.total_count)
    };

    let items: Vec<ListItem> = page
        .items
        .iter()
        .map(|record| {
            let pending = app.cache.is_pending(record.row);
            let title_style = if pending {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                decision_span(record, pending),
                Span::raw(" "),
                Span::styled(
                    format!("[{}] ", record.category),
                    Style::default().fg(Color::Blue),
                ),
                Span::styled(record.title.as_str(), title_style),
                Span::styled(
                    format!("  ({} views, {} replies)", record.views, record.reply_count),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !page.items.is_empty() {
        state.select(Some(app.cursor));
    }

    frame.render_stateful_widget(list, chunks[0], &mut state);

    // Pager: « ‹ 1 2 [3] 4 5 › »
    let dim = Style::default().fg(Color::DarkGray);
    let on = Style::default().fg(Color::White);
    let mut spans = vec![
        Span::styled(" « ‹ ", if page.has_prev() { on } else { dim }),
    ];
    for n in page_window(page.page, page.page_count) {
        if n == page.page {
            spans.push(Span::styled(
                format!("[{n}]"),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(format!(" {n} "), on));
        }
    }
    spans.push(Span::styled(" › » ", if page.has_next() { on } else { dim }));
    spans.push(Span::styled(
        format!("  page {}/{}", page.page, page.page_count),
        dim,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[1]);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.is_loading {
        "Loading sheet...".to_string()
    } else if let Some(message) = &app.status_message {
        message.clone()
    } else {
        "j/k:nav  n/p:page  Enter:open  a/r:approve/reject  f:status  c:category  /:search  u:refresh  ?:help  q:quit"
            .to_string()
    };

    let paragraph = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_detail(frame: &mut Frame, app: &App, record: &Record) {
    let area = centered_rect(80, 80, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Title + metadata
            Constraint::Min(0),    // Question / answer
            Constraint::Length(3), // Decision + keys
        ])
        .split(area);

    frame.render_widget(Clear, area);

    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            record.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "[{}]  {}  {} views  {}",
                record.category,
                record.created_date(),
                record.views,
                record.url
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .title(format!(" Entry #{} (row {}) ", record.id, record.row))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    )
    .wrap(Wrap { trim: true });
    frame.render_widget(header, chunks[0]);

    let mut body = vec![
        Line::from(Span::styled("Question", Style::default().fg(Color::Yellow))),
    ];
    body.extend(record.body.lines().map(Line::from));
    if !record.reply.is_empty() {
        body.push(Line::from(""));
        body.push(Line::from(Span::styled(
            "Answer",
            Style::default().fg(Color::Yellow),
        )));
        body.extend(record.reply.lines().map(Line::from));
    }
    let content = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(content, chunks[1]);

    let pending = app.cache.is_pending(record.row);
    let keys = if pending {
        "saving...".to_string()
    } else {
        "a:approve  r:reject  o:open  Esc:close".to_string()
    };
    let cell = record.decision.as_cell().unwrap_or("empty");
    let footer = Paragraph::new(Line::from(vec![
        Span::raw("Current: "),
        decision_span(record, pending),
        Span::styled(format!(" (J{} = {cell})", record.row), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("   {keys}"), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[2]);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 70, frame.area());

    let help_text = vec![
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   n / →    Next page",
        "   p / ←    Previous page",
        "   Home/End First / last page",
        "   Enter    Open entry",
        "",
        " Highlighted or open entry:",
        "   a        Approve",
        "   r        Reject",
        "   o        Open source in browser (open entry)",
        "   Esc      Close (open entry)",
        "",
        " Filters:",
        "   f        Cycle review status",
        "   c        Cycle category",
        "   /        Search title, question, answer",
        "",
        " General:",
        "   u / F5   Reload sheet",
        "   x        Sign out",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
