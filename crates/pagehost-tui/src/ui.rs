//! Dashboard rendering

use pagehost_core::format::{Locale, format_date};
use pagehost_core::store::{Message, MessageKind, ProjectsState};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use crate::app::{App, Mode};

pub fn draw(
    frame: &mut Frame,
    app: &App,
    projects: &ProjectsState,
    message: &Message,
    api_base: &str,
    locale: Locale,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(6),    // Projects
            Constraint::Length(1), // Message line
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], app, projects, api_base);
    draw_projects(frame, chunks[1], app, projects, locale);
    draw_message(frame, chunks[2], message);
    draw_footer(frame, chunks[3], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App, projects: &ProjectsState, api_base: &str) {
    let filter = match &app.mode {
        Mode::Search => format!("Search: {}_", app.input),
        _ if projects.search_query.is_empty() => "All projects".to_string(),
        _ => format!("Filter: {}", projects.search_query),
    };
    let status = if projects.loading { "  (loading...)" } else { "" };

    let header = Paragraph::new(format!("{}{}", filter, status))
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("pagehost - {}", api_base)),
        );
    frame.render_widget(header, area);
}

fn draw_projects(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    projects: &ProjectsState,
    locale: Locale,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Projects ({})", projects.projects.len()));

    if let Some(error) = &projects.error {
        let text = Paragraph::new(format!("{}\n\nPress 'r' to retry", error))
            .style(Style::default().fg(Color::Red))
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    if projects.projects.is_empty() && !projects.loading {
        let text = Paragraph::new("No projects\n\nUpload one with: pagehost upload <FILE>")
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    let header = Row::new(["Name", "Slug", "Status", "Uploaded"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = projects.projects.iter().map(|p| {
        let status = if p.is_active {
            Cell::from("active").style(Style::default().fg(Color::Green))
        } else {
            Cell::from("inactive").style(Style::default().fg(Color::DarkGray))
        };
        Row::new(vec![
            Cell::from(p.name.clone()),
            Cell::from(p.slug.clone()),
            status,
            Cell::from(format_date(&p.uploaded_at, locale)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(35),
            Constraint::Percentage(25),
            Constraint::Length(10),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(table, area, &mut state);
}

fn message_color(kind: MessageKind) -> Color {
    match kind {
        MessageKind::Success => Color::Green,
        MessageKind::Error => Color::Red,
        MessageKind::Info => Color::Cyan,
    }
}

fn draw_message(frame: &mut Frame, area: Rect, message: &Message) {
    if !message.is_visible() {
        return;
    }
    let line = Paragraph::new(message.text.as_str())
        .style(Style::default().fg(message_color(message.kind)));
    frame.render_widget(line, area);
}

fn footer_hint(mode: &Mode) -> String {
    match mode {
        Mode::Normal => {
            "q: Quit | j/k: Move | /: Search | r: Refresh | t: Toggle | d: Delete | c: Copy URL"
                .to_string()
        }
        Mode::Search => "Enter: Search | Esc: Clear filter".to_string(),
        Mode::ConfirmDelete(slug) => format!("Delete '{}'? Press d again to confirm", slug),
    }
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let style = match app.mode {
        Mode::ConfirmDelete(_) => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::DarkGray),
    };
    let footer = Paragraph::new(footer_hint(&app.mode))
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
