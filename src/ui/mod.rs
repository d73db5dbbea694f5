pub mod album_form;
pub mod album_view;
pub mod confirm_dialog;
mod dialogs;
pub mod gallery;
mod status_bar;

use ratatui::prelude::*;

use crate::app::{App, AppMode};

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let showing_album = app.mode == AppMode::AlbumDetail
        || (app.mode == AppMode::Confirming && app.detail.is_some());
    let open_album = app
        .detail
        .as_ref()
        .filter(|_| showing_album)
        .and_then(|d| app.store.get(&d.id).map(|album| (album, d)));

    if let Some((album, detail)) = open_album {
        album_view::render(frame, album, detail, chunks[0]);
    } else {
        gallery::render(frame, app, chunks[0]);
    }

    status_bar::render(frame, app, chunks[1]);

    match app.mode {
        AppMode::Help => dialogs::render_help(frame, area),
        AppMode::Creating | AppMode::Editing => {
            if let Some(form) = &app.form {
                album_form::render(frame, form, &app.ingest, &app.task_manager, area);
            }
        }
        AppMode::Confirming => {
            if let Some(dialog) = &app.confirm {
                if let (AppMode::Creating | AppMode::Editing, Some(form)) = (dialog.return_mode, &app.form) {
                    album_form::render(frame, form, &app.ingest, &app.task_manager, area);
                }
                confirm_dialog::render(frame, dialog, area);
            }
        }
        _ => {}
    }
}
