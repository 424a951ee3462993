use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, StatusLevel};
use crate::domain::lookup::short_addr;
use crate::domain::LookupState;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_input(f, areas.input, app);
    draw_status_line(f, areas.status_line, app);
    draw_results(f, areas.results, app);
    draw_footer(f, areas.footer);

    if app.help_open {
        draw_help_popup(f, areas.size, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let wallet = if app.wallet.busy {
        Span::styled("wallet …", Style::default().fg(Color::Yellow))
    } else if app.wallet.connected {
        let account = app
            .wallet
            .accounts
            .first()
            .map(|account| short_addr(account))
            .unwrap_or_else(|| "--".to_string());
        Span::styled(
            format!("wallet {}", account),
            Style::default().fg(Color::Green),
        )
    } else {
        Span::styled("wallet disconnected", Style::default().fg(Color::DarkGray))
    };

    let title = Line::from(vec![
        Span::styled(
            "ERC-20 Indexer",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Network", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {}  ", app.network)),
        Span::styled("API", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {}  ", app.endpoint)),
        wallet,
    ]);

    let paragraph = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn draw_input(f: &mut Frame, area: Rect, app: &App) {
    let content = if app.input.is_empty() {
        Line::from(Span::styled(
            "0x… address or ENS name",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::raw(app.input.as_str()))
    };

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .title("Address / ENS")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);

    if !app.help_open {
        let width = app.input.chars().count() as u16;
        let x = area.x + 1 + width.min(area.width.saturating_sub(3));
        f.set_cursor(x, area.y + 1);
    }
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    // A failed lookup clears the status, so any message still set is newer
    let line = match (&app.lookup, app.status_text()) {
        (_, Some((text, level))) if level != StatusLevel::Info => {
            Line::from(Span::styled(text.to_string(), status_style(level)))
        }
        (LookupState::Loading { query, .. }, _) => Line::from(vec![
            Span::styled(
                format!("{} ", app.spinner_frame()),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(format!("Loading balances for {}", query.trim())),
        ]),
        (_, Some((text, level))) => Line::from(Span::styled(text.to_string(), status_style(level))),
        (LookupState::Failure { error, .. }, None) => Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )),
        (_, None) => Line::from(Span::styled(
            "Type an address or ENS name",
            Style::default().fg(Color::DarkGray),
        )),
    };

    f.render_widget(Paragraph::new(line), area);
}

fn status_style(level: StatusLevel) -> Style {
    match level {
        StatusLevel::Info => Style::default().fg(Color::Gray),
        StatusLevel::Warn => Style::default().fg(Color::Yellow),
        StatusLevel::Error => Style::default().fg(Color::Red),
    }
}

fn draw_results(f: &mut Frame, area: Rect, app: &App) {
    let title = match &app.lookup {
        LookupState::Success(outcome) => {
            let target = match &outcome.resolved_from {
                Some(name) => format!("{} ({})", name, short_addr(&outcome.address.to_checksum(None))),
                None => outcome.address.to_checksum(None),
            };
            format!(
                "Balances: {}  [{} tokens, {}]",
                target,
                outcome.rows.len(),
                outcome.fetched_at.format("%H:%M:%S")
            )
        }
        _ => "Balances".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    if let LookupState::Success(outcome) = &app.lookup {
        if outcome.rows.is_empty() {
            let empty = Paragraph::new("No ERC-20 balances")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(empty, area);
            return;
        }
    }

    let header = Row::new(vec!["Symbol", "Balance", "Name", "Contract", "Logo"])
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .rows()
        .iter()
        .map(|row| {
            let balance_style = if row.is_zero {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            Row::new(vec![
                Cell::from(row.symbol.clone()).style(Style::default().fg(Color::LightCyan)),
                Cell::from(row.balance.clone()).style(balance_style),
                Cell::from(row.name.clone().unwrap_or_else(|| "--".to_string())),
                Cell::from(short_addr(&row.contract)),
                Cell::from(if row.logo.is_some() { "yes" } else { "" }),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Percentage(30),
        Constraint::Percentage(30),
        Constraint::Length(14),
        Constraint::Length(5),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = TableState::default();
    if !app.rows().is_empty() {
        state.select(Some(app.selected_row));
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" lookup  "),
        Span::styled("Ctrl-W", Style::default().fg(Color::Yellow)),
        Span::raw(" wallet  "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" select  "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" help  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);
    f.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn draw_help_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = layout::centered_rect(64, 60, area);
    f.render_widget(Clear, popup_area);

    let wallet_line = format!("Wallet endpoint: {}", app.wallet.endpoint);

    let lines = vec![
        Line::from("Query"),
        Line::from("  type       Look up after a short pause"),
        Line::from("  Enter      Look up now"),
        Line::from("  Backspace  Delete character"),
        Line::from("  Ctrl-U     Clear input"),
        Line::from(""),
        Line::from("Results"),
        Line::from("  ↑ / ↓      Move selection"),
        Line::from(""),
        Line::from("Wallet"),
        Line::from("  Ctrl-W     Connect / disconnect"),
        Line::from(""),
        Line::from("  ? / F1     Toggle help"),
        Line::from("  Esc        Close help / quit"),
        Line::from("  Ctrl-C     Quit"),
        Line::from(""),
        Line::from("Examples:"),
        Line::from("  0x<40-hex-address>"),
        Line::from("  vitalik.eth"),
        Line::from(""),
        Line::from(wallet_line),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}
