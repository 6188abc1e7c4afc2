//! Stateless frame composition.
//!
//! Builds a single container table per project, rendered into a
//! header/main/footer layout: no charts, no log panel, no
//! mouse-intersect regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::app_state::AppState;
use crate::model::Snapshot;

const TITLE: &str = "🚀 DockedUp — Real-time Docker Compose Monitor";
const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 1;
/// Rows a single project panel occupies before it needs its own scroll slot.
const PROJECT_PANEL_ROWS: u16 = 8;

pub fn draw(frame: &mut Frame<'_>, snapshot: &Snapshot, app_state: &AppState) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    draw_header(frame, chunks[0], app_state.debug_mode());
    draw_main(frame, chunks[1], snapshot, app_state);
    draw_footer(frame, chunks[2], app_state.get_selected().is_some());
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, debug_mode: bool) {
    let mut spans = vec![Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD))];
    if debug_mode {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "[DEBUG MODE]",
            Style::default().fg(ratatui::style::Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    let block = Block::default().borders(Borders::ALL).border_type(BorderType::Rounded);
    let paragraph = Paragraph::new(Line::from(spans))
        .alignment(ratatui::layout::Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn draw_main(frame: &mut Frame<'_>, area: Rect, snapshot: &Snapshot, app_state: &AppState) {
    if snapshot.is_empty() {
        let paragraph = Paragraph::new("No containers found.")
            .alignment(ratatui::layout::Alignment::Center)
            .style(Style::default().fg(ratatui::style::Color::Yellow));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_projects = ((area.height / PROJECT_PANEL_ROWS).max(1) as usize).min(snapshot.groups.len());
    let scroll_offset = app_state.scroll_offset().min(snapshot.groups.len().saturating_sub(1));
    let end = (scroll_offset + visible_projects).min(snapshot.groups.len());
    let visible = &snapshot.groups[scroll_offset..end];

    let constraints: Vec<Constraint> = visible
        .iter()
        .map(|(_, containers)| Constraint::Length((containers.len() as u16 + 3).min(PROJECT_PANEL_ROWS)))
        .collect();
    let panel_areas = Layout::default().direction(Direction::Vertical).constraints(constraints).split(area);

    let selected_index = app_state.selected_index();
    let mut flat_index: usize = snapshot
        .groups
        .iter()
        .take(scroll_offset)
        .map(|(_, containers)| containers.len())
        .sum();
    for ((project, containers), panel_area) in visible.iter().zip(panel_areas.iter()) {
        flat_index = draw_project_panel(frame, *panel_area, project, containers, selected_index, flat_index);
    }
}

fn draw_project_panel(
    frame: &mut Frame<'_>,
    area: Rect,
    project: &str,
    containers: &[crate::model::ContainerRecord],
    selected_index: usize,
    mut flat_index: usize,
) -> usize {
    let header = Row::new(vec!["Container", "Status", "Uptime", "Health", "CPU %", "MEM USAGE / LIMIT"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = containers
        .iter()
        .map(|c| {
            let is_selected = flat_index == selected_index;
            flat_index += 1;
            let style = if is_selected { Style::default().add_modifier(Modifier::REVERSED) } else { Style::default() };
            let status = c.status_display();
            let health = c.health_display();
            Row::new(vec![
                Cell::from(c.name.clone()),
                Cell::from(status.text).style(Style::default().fg(status.color)),
                Cell::from(c.uptime_display().text),
                Cell::from(health.text).style(Style::default().fg(health.color)),
                Cell::from(c.cpu_display.text.clone()).style(Style::default().fg(c.cpu_display.color)),
                Cell::from(c.memory_display.text.clone()).style(Style::default().fg(c.memory_display.color)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(25),
        Constraint::Percentage(15),
        Constraint::Percentage(12),
        Constraint::Percentage(15),
        Constraint::Percentage(13),
        Constraint::Percentage(20),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!("Project: {project}"))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    frame.render_widget(table, area);
    flat_index
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, has_selection: bool) {
    let mut text = String::from("q quit | ↑/k ↓/j select | PgUp/PgDn scroll | ? help");
    if has_selection {
        text.push_str(" | l logs | r restart | x stop | s shell");
    }
    let paragraph = Paragraph::new(text).alignment(ratatui::layout::Alignment::Right);
    frame.render_widget(paragraph, area);
}
