//! Album card grid with search line and pagination footer.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::data_url;
use crate::view::{AlbumCard, GalleryPage};

use super::album_form::format_size;

const CARD_WIDTH: u16 = 34;
const CARD_HEIGHT: u16 = 7;

pub fn columns_for(width: u16) -> usize {
    ((width / CARD_WIDTH) as usize).max(1)
}

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header / search
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(1), // Pagination
        ])
        .split(area);

    let columns = columns_for(chunks[1].width);
    app.grid_columns = columns;

    let page = app.view.render(&app.store);
    if !page.cards.is_empty() && app.selected >= page.cards.len() {
        app.selected = page.cards.len() - 1;
    }

    render_header(frame, app, chunks[0]);
    if page.is_empty() {
        render_empty(frame, app, chunks[1]);
    } else {
        render_grid(frame, &page, app.selected, columns, chunks[1]);
    }
    render_footer(frame, &page, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.mode == AppMode::Searching || !app.view.query().is_empty() {
        let mut spans = vec![
            Span::styled(" Search: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(app.search.text().to_string()),
        ];
        if app.mode == AppMode::Searching {
            spans.push(Span::styled(" ", Style::default().bg(Color::White)));
        }
        Line::from(spans)
    } else {
        Line::from(Span::styled(
            format!(" Albums | Sort: {}", app.view.sort_order().label()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_empty(frame: &mut Frame, app: &App, area: Rect) {
    let text = if app.view.query().is_empty() {
        vec![
            Line::from(Span::styled("No albums yet", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("Press c to create your first album"),
        ]
    } else {
        vec![
            Line::from(Span::styled("No albums found", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("Try a different search term"),
        ]
    };
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(paragraph, area);
}

fn render_grid(frame: &mut Frame, page: &GalleryPage, selected: usize, columns: usize, area: Rect) {
    let rows = page.cards.len().div_ceil(columns);
    let visible_rows = ((area.height / CARD_HEIGHT) as usize).max(1);
    // Keep the selected row on screen
    let selected_row = selected / columns;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints((0..visible_rows).map(|_| Constraint::Length(CARD_HEIGHT)))
        .split(area);

    for (slot, row_area) in row_areas.iter().enumerate() {
        let row = first_row + slot;
        if row >= rows {
            break;
        }
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints((0..columns).map(|_| Constraint::Length(CARD_WIDTH)))
            .split(*row_area);

        for (col, cell) in cells.iter().enumerate() {
            let index = row * columns + col;
            if let Some(card) = page.cards.get(index) {
                render_card(frame, card, index == selected, *cell);
            }
        }
    }
}

fn render_card(frame: &mut Frame, card: &AlbumCard, is_selected: bool, area: Rect) {
    let border = if is_selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(
            format!(" {} ", card.album.name),
            Style::default().add_modifier(Modifier::BOLD),
        ));

    let cover = format!(
        "▣ {} {}",
        data_url::mime_of(&card.album.cover).unwrap_or("image"),
        format_size(data_url::payload_len(&card.album.cover) as u64)
    );
    let text = vec![
        Line::from(Span::styled(card.description, Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(vec![
            Span::styled(card.photos_label.clone(), Style::default().fg(Color::Cyan)),
            Span::raw(" · "),
            Span::raw(card.created.clone()),
        ]),
        Line::from(Span::styled(cover, Style::default().fg(Color::DarkGray))),
    ];

    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), area);
}

fn render_footer(frame: &mut Frame, page: &GalleryPage, area: Rect) {
    let enabled = Style::default().fg(Color::White);
    let disabled = Style::default().fg(Color::DarkGray);

    let line = Line::from(vec![
        Span::styled("« prev (p) ", if page.has_prev { enabled } else { disabled }),
        Span::styled(
            format!(" page {} of {} ", page.page, page.page_count.max(1)),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(" next (n) »", if page.has_next { enabled } else { disabled }),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_for_width() {
        assert_eq!(columns_for(10), 1);
        assert_eq!(columns_for(CARD_WIDTH * 3 + 5), 3);
    }
}
