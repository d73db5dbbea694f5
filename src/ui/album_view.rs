//! Single album: metadata and photo list.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::album::{Album, AlbumId};
use crate::data_url;

use super::album_form::format_size;

/// Which album is open and which photo is highlighted.
#[derive(Debug, Clone)]
pub struct AlbumDetail {
    pub id: AlbumId,
    pub selected: usize,
}

impl AlbumDetail {
    pub fn new(id: AlbumId) -> Self {
        Self { id, selected: 0 }
    }

    pub fn select_next(&mut self, count: usize) {
        if self.selected + 1 < count {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp(&mut self, count: usize) {
        self.selected = self.selected.min(count.saturating_sub(1));
    }
}

fn photo_label(album: &Album, index: usize) -> String {
    album
        .photo_name(index)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Photo {}", index + 1))
}

pub fn render(frame: &mut Frame, album: &Album, detail: &AlbumDetail, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3)])
        .split(area);

    let description = album.description.as_deref().unwrap_or("No description");
    let created = album
        .created_at
        .with_timezone(&chrono::Local)
        .format("%B %-d, %Y %H:%M")
        .to_string();
    let header = vec![
        Line::from(Span::styled(description, Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(vec![
            Span::styled("Created: ", Style::default().fg(Color::DarkGray)),
            Span::raw(created),
        ]),
        Line::from(vec![
            Span::styled("Cover:   ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!(
                "{} {}",
                data_url::mime_of(&album.cover).unwrap_or("unknown"),
                format_size(data_url::payload_len(&album.cover) as u64)
            )),
        ]),
    ];
    let header = Paragraph::new(header).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Span::styled(
                format!(" {} ", album.name),
                Style::default().add_modifier(Modifier::BOLD),
            )),
    );
    frame.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = album
        .photos
        .iter()
        .enumerate()
        .map(|(i, photo)| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:>3}. ", i + 1)),
                Span::styled(photo_label(album, i), Style::default().fg(Color::White)),
                Span::styled(
                    format!("  {}", format_size(data_url::payload_len(photo) as u64)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let title = match album.photo_count() {
        1 => " 1 photo ".to_string(),
        n => format!(" {} photos ", n),
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !album.photos.is_empty() {
        state.select(Some(detail.selected));
    }
    frame.render_stateful_widget(list, chunks[1], &mut state);
}
