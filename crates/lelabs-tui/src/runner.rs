// TUI event loop and terminal management
use crate::app::Activation;
use crate::{App, InputMode, View};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lelabs_core::config::UiConfig;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};

fn open_activation(app: &mut App, activation: Activation) {
    if let Activation::OpenUrl(url) = activation {
        if let Err(e) = open::that(&url) {
            app.error_message = Some(format!("Failed to open browser: {}", e));
        }
    }
}

pub async fn run_tui(mut app: App, ui: &UiConfig) -> anyhow::Result<()> {
    app.load().await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if ui.mouse_enabled {
        execute!(stdout, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick = Duration::from_millis(ui.tick_ms.max(16));

    // Main loop
    loop {
        terminal.draw(|f| crate::ui::render(f, &mut app))?;

        if !event::poll(tick)? {
            app.tick(Instant::now());
            continue;
        }

        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            Event::Mouse(mouse) if app.input_mode == InputMode::Normal => {
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        app.clear_error();
                        let activation = app.click_at(mouse.column, mouse.row);
                        open_activation(&mut app, activation);
                    }
                    MouseEventKind::ScrollDown => app.next_tile(),
                    MouseEventKind::ScrollUp => app.previous_tile(),
                    _ => {}
                }
                continue;
            }
            _ => continue,
        };

        match app.input_mode {
            InputMode::Notifications => match key.code {
                KeyCode::Esc | KeyCode::Char('n') => app.toggle_notifications(),
                KeyCode::Down | KeyCode::Char('j') => app.next_notification(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_notification(),
                KeyCode::Enter => app.mark_selected_read(),
                KeyCode::Char('a') => app.mark_all_read(),
                KeyCode::Char('d') => app.dismiss_selected(),
                KeyCode::Char('q') => app.quit(),
                _ => {}
            },
            InputMode::Normal => {
                app.clear_error();
                match key.code {
                    KeyCode::Char('q') => app.quit(),
                    KeyCode::Esc => match app.view {
                        View::Gallery => app.quit(),
                        _ => app.show_gallery(),
                    },
                    KeyCode::Down
                    | KeyCode::Right
                    | KeyCode::Char('j')
                    | KeyCode::Char('l') => app.next_tile(),
                    KeyCode::Up
                    | KeyCode::Left
                    | KeyCode::Char('k')
                    | KeyCode::Char('h') => app.previous_tile(),
                    KeyCode::Char(' ') => app.flip_selected(),
                    KeyCode::Enter => {
                        let activation = app.activate_selected();
                        open_activation(&mut app, activation);
                    }
                    KeyCode::Char('f') => app.toggle_follow_selected(),
                    KeyCode::Char('n') => app.toggle_notifications(),
                    KeyCode::Char('y') => app.show_your_news(),
                    KeyCode::Char('g') => app.show_gallery(),
                    KeyCode::Char('H') => app.show_home(),
                    KeyCode::Char('r') => app.refresh().await,
                    KeyCode::Char('m') => app.toggle_reduced_motion(),
                    KeyCode::Char('t') => app.toggle_theme(),
                    KeyCode::Char('s') => app.cycle_status_filter(),
                    KeyCode::Char('#') => app.cycle_tag_filter(),
                    KeyCode::Char('F') => app.toggle_followed_only(),
                    _ => {}
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    if ui.mouse_enabled {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    terminal.show_cursor()?;

    Ok(())
}
