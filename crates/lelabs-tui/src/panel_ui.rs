// Notification panel popup
use crate::ui::color;
use crate::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

pub fn render_notifications(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(70, 60, area);
    frame.render_widget(Clear, popup_area);

    let colors = &app.theme.colors;
    let notifications = app.notifications();

    let items: Vec<ListItem> = if notifications.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No notifications",
            Style::default().fg(color(colors.muted)),
        )))]
    } else {
        notifications
            .iter()
            .map(|n| {
                let marker = if n.read {
                    Span::raw("  ")
                } else {
                    Span::styled("● ", Style::default().fg(color(colors.unread)))
                };
                let title_style = if n.read {
                    Style::default().fg(color(colors.muted))
                } else {
                    Style::default()
                        .fg(color(colors.foreground))
                        .add_modifier(Modifier::BOLD)
                };
                ListItem::new(vec![
                    Line::from(vec![
                        marker,
                        Span::styled(n.project_title.clone(), title_style),
                        Span::styled(
                            format!("  {}", n.update.date.format("%Y-%m-%d")),
                            Style::default().fg(color(colors.muted)),
                        ),
                    ]),
                    Line::from(format!("  {}", n.update.title)),
                ])
            })
            .collect()
    };

    let title = format!(" Notifications ({} unread) ", app.unread_count());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color(colors.border_focused)))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(color(colors.selected_bg))
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !notifications.is_empty() {
        state.select(Some(app.notification_index));
    }
    frame.render_stateful_widget(list, popup_area, &mut state);
}

/// Helper function to create a centered rectangle
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(70, 60, area);
        assert_eq!(popup.width, 70);
        assert_eq!(popup.height, 30);
        assert!(popup.x >= 15 && popup.y >= 10);
    }
}
