//! Yes/no confirmation before destructive actions.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::album::AlbumId;
use crate::app::AppMode;

/// What runs when the user confirms. Albums are referenced by id so the
/// action still hits the right album if the page changed underneath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteAlbum(AlbumId),
    DeletePhoto { id: AlbumId, index: usize },
    DiscardForm,
}

pub struct ConfirmDialog {
    pub action: ConfirmAction,
    pub message: String,
    /// Mode to go back to when the dialog closes.
    pub return_mode: AppMode,
}

impl ConfirmDialog {
    pub fn new(action: ConfirmAction, return_mode: AppMode) -> Self {
        let message = match &action {
            ConfirmAction::DeleteAlbum(_) => {
                "Are you sure you want to delete this album? All photos will be lost.".to_string()
            }
            ConfirmAction::DeletePhoto { index, .. } => {
                format!("Delete photo {} from this album?", index + 1)
            }
            ConfirmAction::DiscardForm => {
                "Are you sure you want to cancel? All unsaved changes will be lost.".to_string()
            }
        };
        Self {
            action,
            message,
            return_mode,
        }
    }
}

pub fn render(frame: &mut Frame, dialog: &ConfirmDialog, area: Rect) {
    let dialog_width = 60.min(area.width.saturating_sub(4));
    let dialog_height = 9.min(area.height);

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;
    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .margin(1)
        .split(dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Confirm ");
    frame.render_widget(block, dialog_area);

    let message = Paragraph::new(dialog.message.as_str())
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    frame.render_widget(message, chunks[0]);

    let buttons = Line::from(vec![
        Span::styled("  [Enter/y] ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw("Yes"),
        Span::raw("    "),
        Span::styled("[Esc/n] ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw("No"),
    ]);
    frame.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), chunks[1]);
}
