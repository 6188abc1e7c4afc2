//! Terminal ownership and the combined render/input loop.
//!
//! Drawing a frame and then polling for a keypress within the same
//! loop iteration (rather than a genuinely separate input thread)
//! is what lets the dispatcher suspend and resume the terminal
//! without any cross-task contention: actions can never overlap,
//! since only this loop ever touches the terminal.

mod draw;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio_util::sync::CancellationToken;

use crate::actions;
use crate::app_error::AppError;
use crate::app_state::AppState;
use crate::container_api::ContainerApi;
use crate::input::{self, Command};
use crate::monitor::ContainerMonitor;

pub type Backend = CrosstermBackend<io::Stdout>;

/// How often the loop checks the terminal for a keypress between draws.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(75);

/// Enter raw mode + the alternate screen.
pub fn enter() -> Result<Terminal<Backend>, AppError> {
    enable_raw_mode().map_err(|_| AppError::Terminal)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(|_| AppError::Terminal)?;
    Terminal::new(CrosstermBackend::new(stdout)).map_err(|_| AppError::Terminal)
}

/// Leave the alternate screen and restore the shell, e.g. to hand the
/// terminal to an external command.
pub fn leave(terminal: &mut Terminal<Backend>) -> Result<(), AppError> {
    disable_raw_mode().map_err(|_| AppError::Terminal)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).map_err(|_| AppError::Terminal)?;
    terminal.show_cursor().map_err(|_| AppError::Terminal)
}

/// Run the dashboard until the operator quits.
pub async fn run(
    monitor: Arc<ContainerMonitor>,
    app_state: Arc<AppState>,
    api: Arc<dyn ContainerApi>,
    refresh: Duration,
    quit: CancellationToken,
) -> Result<(), AppError> {
    let mut terminal = enter()?;
    let result = main_loop(&mut terminal, &monitor, &app_state, api.as_ref(), refresh, &quit).await;
    leave(&mut terminal)?;
    result
}

async fn main_loop(
    terminal: &mut Terminal<Backend>,
    monitor: &Arc<ContainerMonitor>,
    app_state: &Arc<AppState>,
    api: &dyn ContainerApi,
    refresh: Duration,
    quit: &CancellationToken,
) -> Result<(), AppError> {
    let mut show_help = false;

    loop {
        let snapshot = monitor.snapshot();
        app_state.update_containers(snapshot.flatten());

        terminal
            .draw(|f| {
                draw::draw(f, &snapshot, app_state);
                if show_help {
                    draw_help_overlay(f);
                }
            })
            .map_err(|_| AppError::Terminal)?;

        let deadline = tokio::time::Instant::now() + refresh;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            let poll_for = remaining.min(INPUT_POLL_INTERVAL);
            let has_event = tokio::task::block_in_place(|| event::poll(poll_for)).unwrap_or(false);
            if !has_event {
                continue;
            }
            let Ok(Event::Key(key)) = tokio::task::block_in_place(event::read) else { continue };
            let Some(command) = input::map_key(key.code, key.modifiers) else { continue };

            match command {
                Command::Quit => {
                    quit.cancel();
                    return Ok(());
                }
                Command::MoveSelection(delta) => app_state.move_selection(delta),
                Command::ScrollView(delta) => app_state.scroll_view(delta, snapshot.groups.len()),
                Command::Help => {
                    show_help = !show_help;
                    if show_help {
                        wait_for_help_dismissal(terminal)?;
                        show_help = false;
                    }
                }
                Command::Act(action) => {
                    if let Some(selected) = app_state.get_selected() {
                        let is_running = selected.is_running();
                        actions::dispatch(terminal, api, action, &selected.id, is_running).await?;
                    }
                }
            }
        }

        if quit.is_cancelled() {
            break;
        }
    }
    Ok(())
}

/// `?`: suspend display, show help, wait for Enter, resume.
fn wait_for_help_dismissal(terminal: &mut Terminal<Backend>) -> Result<(), AppError> {
    terminal.draw(draw_help_overlay).map_err(|_| AppError::Terminal)?;
    loop {
        let read = tokio::task::block_in_place(event::read);
        if let Ok(Event::Key(key)) = read {
            if matches!(key.code, crossterm::event::KeyCode::Enter) {
                break;
            }
        }
    }
    Ok(())
}

fn draw_help_overlay(frame: &mut ratatui::Frame<'_>) {
    use ratatui::layout::{Alignment, Rect};
    use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

    let area = frame.area();
    let width = area.width.saturating_sub(10).min(60);
    let height = 10u16.min(area.height);
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );

    let text = "q/Ctrl+C  quit\n\
         ↑/k ↓/j   move selection\n\
         PgUp/PgDn scroll projects\n\
         l         logs\n\
         r         restart (confirm)\n\
         x         stop (confirm)\n\
         s         shell\n\
         Enter     close this help";

    let block = Block::default().title("Help").borders(Borders::ALL).border_type(BorderType::Rounded);
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Left).block(block), popup);
}
