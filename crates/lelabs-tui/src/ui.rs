// UI rendering logic
use crate::app::{GalleryTile, NewsTile};
use crate::{App, InputMode, View};
use lelabs_core::models::{NewsItem, Project};
use lelabs_core::tile::{parse_color, Rgb};
use lelabs_core::{Face, Tile, YourNews};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::time::Instant;

pub(crate) fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let screen = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(screen);

    render_header(frame, app, chunks[0]);

    app.tile_areas = match app.view.clone() {
        View::Home => render_home(frame, app, chunks[1]),
        View::Gallery => render_gallery(frame, app, chunks[1]),
        View::YourNews => {
            render_your_news(frame, app, chunks[1]);
            Vec::new()
        }
        View::Detail(id) => {
            render_detail(frame, app, &id, chunks[1]);
            Vec::new()
        }
    };

    if app.input_mode == InputMode::Notifications {
        crate::panel_ui::render_notifications(frame, app, screen);
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;

    let mut filter = match (app.filter.status, app.filter.followed_only) {
        (None, false) => "all projects".to_string(),
        (None, true) => "followed".to_string(),
        (Some(status), false) => status.as_str().to_string(),
        (Some(status), true) => format!("followed, {}", status.as_str()),
    };
    if let Some(tag) = &app.filter.tag {
        filter.push_str(&format!(", #{}", tag));
    }

    let unread = app.unread_count();
    let bell = if unread > 0 {
        Span::styled(
            format!(" ● {} new ", unread),
            Style::default()
                .fg(color(colors.unread))
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(" no new updates ", Style::default().fg(color(colors.muted)))
    };

    let line = Line::from(vec![
        Span::styled(
            "LE LABS",
            Style::default()
                .fg(color(colors.title))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}  ", view_title(&app.view)),
            Style::default().fg(color(colors.subtitle)),
        ),
        Span::styled(
            format!("[{}]", filter),
            Style::default().fg(color(colors.muted)),
        ),
        bell,
    ]);

    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color(colors.border))),
    );
    frame.render_widget(header, area);
}

fn view_title(view: &View) -> &'static str {
    match view {
        View::Home => "Home",
        View::Gallery => "Projects",
        View::YourNews => "Your News",
        View::Detail(_) => "Project",
    }
}

/// Pack tiles into rows of 12 columns
fn rows(spans: &[u8]) -> Vec<std::ops::Range<usize>> {
    let mut rows = Vec::new();
    let mut start = 0;
    let mut used = 0u8;
    for (index, span) in spans.iter().enumerate() {
        if used + span > 12 && index > start {
            rows.push(start..index);
            start = index;
            used = 0;
        }
        used += span;
    }
    if start < spans.len() {
        rows.push(start..spans.len());
    }
    rows
}

/// Place `(span, height)` cells on screen, scrolled so `selected` is visible
fn grid(cells: &[(u8, u16)], selected: usize, area: Rect) -> Vec<(usize, Rect)> {
    let spans: Vec<u8> = cells.iter().map(|(span, _)| *span).collect();
    let rows = rows(&spans);
    let heights: Vec<u16> = rows
        .iter()
        .map(|r| cells[r.clone()].iter().map(|(_, h)| *h).max().unwrap_or(7))
        .collect();

    let selected_row = rows.iter().position(|r| r.contains(&selected)).unwrap_or(0);
    let mut first_row = 0;
    while first_row < selected_row
        && heights[first_row..=selected_row].iter().sum::<u16>() > area.height
    {
        first_row += 1;
    }

    let mut placed = Vec::new();
    let mut y = area.y;
    for (row, height) in rows.iter().zip(&heights).skip(first_row) {
        if y >= area.bottom() {
            break;
        }
        let height = (*height).min(area.bottom() - y);
        let row_area = Rect::new(area.x, y, area.width, height);

        let constraints: Vec<Constraint> = spans[row.clone()]
            .iter()
            .map(|span| Constraint::Ratio(*span as u32, 12))
            .collect();
        let row_cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(row_area);

        placed.extend(
            row_cells
                .iter()
                .enumerate()
                .map(|(offset, cell)| (row.start + offset, *cell)),
        );
        y += height;
    }
    placed
}

fn render_gallery(frame: &mut Frame, app: &App, area: Rect) -> Vec<(usize, Rect)> {
    if app.is_loading() {
        let loading = Paragraph::new("Loading projects...")
            .style(Style::default().fg(color(app.theme.colors.muted)));
        frame.render_widget(loading, area);
        return Vec::new();
    }
    if app.tiles.is_empty() {
        let empty = Paragraph::new("No projects match the current filter.")
            .style(Style::default().fg(color(app.theme.colors.muted)));
        frame.render_widget(empty, area);
        return Vec::new();
    }

    let cells: Vec<(u8, u16)> = app.tiles.iter().map(|t| (t.span, t.size.height())).collect();
    let placed = grid(&cells, app.selected_index, area);

    let now = Instant::now();
    for (index, cell) in &placed {
        render_tile(frame, app, &app.tiles[*index], *index == app.selected_index, now, *cell);
    }
    placed
}

fn render_home(frame: &mut Frame, app: &App, area: Rect) -> Vec<(usize, Rect)> {
    let colors = &app.theme.colors;
    if app.news_tiles.is_empty() {
        let empty = Paragraph::new(if app.is_loading() { "Loading news..." } else { "No news yet." })
            .style(Style::default().fg(color(colors.muted)));
        frame.render_widget(empty, area);
        return Vec::new();
    }

    let cells: Vec<(u8, u16)> = app
        .news_tiles
        .iter()
        .map(|t| (t.span, t.size.height()))
        .collect();
    let placed = grid(&cells, app.news_index, area);

    let now = Instant::now();
    for (index, cell) in &placed {
        let news_tile = &app.news_tiles[*index];
        if let Some(item) = app.news_item(&news_tile.news_id) {
            render_news_tile(frame, app, item, news_tile, *index == app.news_index, now, *cell);
        }
    }
    placed
}

fn render_news_tile(
    frame: &mut Frame,
    app: &App,
    item: &NewsItem,
    news_tile: &NewsTile,
    selected: bool,
    now: Instant,
    area: Rect,
) {
    let colors = &app.theme.colors;
    let tile = &news_tile.tile;
    let (bg, fg) = tile_colors(app, tile, now);

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, selected))
        .title(Line::from(Span::styled(
            format!(" {} ", item.title),
            Style::default().fg(color(fg)).add_modifier(Modifier::BOLD),
        )))
        .style(Style::default().bg(color(bg)).fg(color(fg)));
    if tile.has_flip_control() {
        block = block.title_bottom(Line::from(format!(" {} ", tile.current_face())).right_aligned());
    }

    let body = match tile.current_face() {
        Face::Image => vec![
            Line::from(""),
            Line::from(Span::styled(
                "[ image ]",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
            Line::from(item.image.clone().unwrap_or_default()),
        ],
        _ => vec![
            Line::from(Span::styled(
                item.date.format("%Y-%m-%d").to_string(),
                Style::default().fg(color(colors.subtitle)),
            )),
            Line::from(item.summary.clone()),
        ],
    };

    let paragraph = Paragraph::new(body).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Ambient background and text colour for a tile; entering tiles fade in from muted
fn tile_colors(app: &App, tile: &Tile, now: Instant) -> (Rgb, Rgb) {
    let colors = &app.theme.colors;
    let (bg, fg) = if app.theme.tile_colors {
        (
            tile.ambient_rgb().unwrap_or(colors.background),
            parse_color(&tile.styles().color).unwrap_or(colors.foreground),
        )
    } else {
        (colors.background, colors.foreground)
    };

    if tile.entry_progress(now) < 1.0 {
        (bg, colors.muted)
    } else {
        (bg, fg)
    }
}

fn border_style(app: &App, selected: bool) -> Style {
    let colors = &app.theme.colors;
    if selected {
        Style::default()
            .fg(color(colors.border_focused))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color(colors.border))
    }
}

fn render_tile(
    frame: &mut Frame,
    app: &App,
    gallery_tile: &GalleryTile,
    selected: bool,
    now: Instant,
    area: Rect,
) {
    let Some(project) = app.project(&gallery_tile.project_id) else {
        return;
    };
    let colors = &app.theme.colors;
    let tile = &gallery_tile.tile;
    let (bg, fg) = tile_colors(app, tile, now);
    let border = border_style(app, selected);

    let mut title = vec![Span::styled(
        format!(" {} ", project.title),
        Style::default().fg(color(fg)).add_modifier(Modifier::BOLD),
    )];
    if app.has_unread_for(&project.id) {
        title.push(Span::styled("● ", Style::default().fg(color(colors.unread))));
    }
    if app.preferences().is_following(&project.id) {
        title.push(Span::styled("★ ", Style::default().fg(color(colors.warning))));
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Line::from(title))
        .style(Style::default().bg(color(bg)).fg(color(fg)));
    if tile.has_flip_control() {
        block = block.title_bottom(Line::from(format!(" {} ", tile.current_face())).right_aligned());
    }

    let body = match tile.current_face() {
        Face::Details => details_face(project, colors.subtitle),
        Face::Image => vec![
            Line::from(""),
            Line::from(Span::styled(
                "[ image ]",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
            Line::from(project.image.clone().unwrap_or_default()),
        ],
        Face::Links => project
            .link_entries()
            .into_iter()
            .map(|(label, url)| {
                Line::from(vec![
                    Span::styled(format!("{:<8}", label), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(url.to_string()),
                ])
            })
            .collect(),
    };

    let paragraph = Paragraph::new(body).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn details_face(project: &Project, muted: Rgb) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            project.status.to_string(),
            Style::default().fg(color(muted)),
        )),
        Line::from(project.summary.clone()),
    ];
    if !project.tags.is_empty() {
        lines.push(Line::from(Span::styled(
            project.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" "),
            Style::default().fg(color(muted)),
        )));
    }
    lines
}

fn render_detail(frame: &mut Frame, app: &App, project_id: &str, area: Rect) {
    let colors = &app.theme.colors;
    let Some(project) = app.project(project_id) else {
        let missing = Paragraph::new(format!("Project {} is no longer in the catalog", project_id))
            .style(Style::default().fg(color(colors.error)));
        frame.render_widget(missing, area);
        return;
    };

    let following = app.preferences().is_following(&project.id);
    let mut lines = vec![
        Line::from(Span::styled(
            project.title.clone(),
            Style::default()
                .fg(color(colors.title))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(project.status.to_string(), Style::default().fg(color(colors.subtitle))),
            Span::raw("  "),
            Span::styled(
                if following { "★ following" } else { "☆ not following" },
                Style::default().fg(color(colors.warning)),
            ),
        ]),
        Line::from(""),
        Line::from(project.description.clone()),
        Line::from(""),
    ];

    if !project.updates.is_empty() {
        lines.push(Line::from(Span::styled(
            "Updates",
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )));
        let mut updates: Vec<_> = project.updates.iter().collect();
        updates.sort_by(|a, b| b.date.cmp(&a.date));
        for update in updates {
            lines.push(Line::from(vec![
                Span::styled(
                    update.date.format("%Y-%m-%d  ").to_string(),
                    Style::default().fg(color(colors.muted)),
                ),
                Span::styled(update.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]));
            lines.push(Line::from(format!("  {}", update.content)));
        }
        lines.push(Line::from(""));
    }

    for (label, url) in project.link_entries() {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<10}", label), Style::default().fg(color(colors.subtitle))),
            Span::raw(url.to_string()),
        ]));
    }

    let detail = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color(colors.border_focused)))
                .title(format!(" {} ", project.detail_path())),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, area);
}

fn render_your_news(frame: &mut Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let lines = match app.your_news() {
        YourNews::NotFollowing => vec![
            Line::from("You are not following any projects yet."),
            Line::from(Span::styled(
                "Press f on a project tile to follow it.",
                Style::default().fg(color(colors.muted)),
            )),
        ],
        YourNews::NothingNew => vec![Line::from("You're all caught up.")],
        YourNews::Updates(entries) => entries
            .into_iter()
            .flat_map(|entry| {
                [
                    Line::from(vec![
                        Span::styled("● ", Style::default().fg(color(colors.unread))),
                        Span::styled(
                            entry.date.format("%Y-%m-%d  ").to_string(),
                            Style::default().fg(color(colors.muted)),
                        ),
                        Span::styled(entry.title, Style::default().add_modifier(Modifier::BOLD)),
                    ]),
                    Line::from(format!("  {}", entry.summary)),
                    Line::from(""),
                ]
            })
            .collect(),
    };

    let feed = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color(colors.border)))
                .title(" Your News "),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(feed, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;

    let line = if let Some(error) = &app.error_message {
        Line::from(Span::styled(
            format!(" {} ", error),
            Style::default().fg(color(colors.error)),
        ))
    } else {
        let hints = match app.input_mode {
            InputMode::Notifications => {
                " j/k: move | Enter: read | a: read all | d: dismiss | Esc: close"
            }
            InputMode::Normal => match app.view {
                View::Gallery => {
                    " j/k: move | Enter: open | Space: flip | f: follow | n: notifications | y: your news | H: home | s: status | #: tag | F: followed | m: motion | t: theme | r: refresh | q: quit"
                }
                View::Home => {
                    " j/k: move | Space: flip | g: gallery | y: your news | n: notifications | q: quit"
                }
                _ => " Esc/g: gallery | f: follow | n: notifications | y: your news | H: home | q: quit",
            },
        };
        let mut spans = vec![Span::styled(hints, Style::default().fg(color(colors.muted)))];
        if let Some(status) = &app.status_message {
            spans.push(Span::styled(
                format!("  {}", status),
                Style::default().fg(color(colors.success)),
            ));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line), area);
}
