use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::FutureExt;
use ratatui::prelude::*;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};

use crate::album::AlbumId;
use crate::config::Config;
use crate::download;
use crate::ingest::{
    self, convert_batch, CandidateFile, ConvertedPhoto, IngestError, IngestLimits, IngestSession, PreparedBatch,
    ValidationError,
};
use crate::notify::Notifier;
use crate::store::AlbumStore;
use crate::tasks::{BackgroundTaskManager, TaskId, TaskType};
use crate::ui;
use crate::ui::album_form::{AlbumForm, FormField, FormKind, TextField};
use crate::ui::album_view::AlbumDetail;
use crate::ui::confirm_dialog::{ConfirmAction, ConfirmDialog};
use crate::view::AlbumViewController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Gallery,
    Searching,
    Help,
    AlbumDetail,
    Creating,
    Editing,
    Confirming,
}

type ImportResult = Result<Vec<ConvertedPhoto>, IngestError>;

/// A conversion running on the runtime, tied to the form generation that
/// started it.
struct PendingImport {
    task: TaskId,
    kind: TaskType,
    generation: u64,
    handle: JoinHandle<ImportResult>,
}

pub struct App {
    pub config: Config,
    pub store: AlbumStore,
    pub view: AlbumViewController,
    pub notifier: Notifier,
    pub task_manager: BackgroundTaskManager,
    pub ingest: IngestSession,
    pub mode: AppMode,
    pub should_quit: bool,
    /// Highlighted card on the current page.
    pub selected: usize,
    /// Cards per row, updated on every draw.
    pub grid_columns: usize,
    pub search: TextField,
    pub detail: Option<AlbumDetail>,
    pub form: Option<AlbumForm>,
    pub confirm: Option<ConfirmDialog>,
    help_return: AppMode,
    pending: Vec<PendingImport>,
}

impl App {
    pub fn new(config: Config, store: AlbumStore) -> Self {
        let view = AlbumViewController::new(config.view.page_size, config.view.default_sort);
        let notifier = Notifier::new(Duration::from_millis(config.ui.notification_ms));
        let ingest = IngestSession::new(IngestLimits::from(&config.ingest));
        Self {
            config,
            store,
            view,
            notifier,
            task_manager: BackgroundTaskManager::new(),
            ingest,
            mode: AppMode::Gallery,
            should_quit: false,
            selected: 0,
            grid_columns: 1,
            search: TextField::default(),
            detail: None,
            form: None,
            confirm: None,
            help_return: AppMode::Gallery,
            pending: Vec::new(),
        }
    }

    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        while !self.should_quit {
            self.poll_imports();
            self.notifier.tick();

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }

        self.task_manager.cancel_all();
        Ok(())
    }

    /// Collect finished conversions and hand their results to the session.
    pub fn poll_imports(&mut self) {
        for done in self.task_manager.poll_updates() {
            tracing::debug!(task = ?done.id, kind = done.task_type.display_name(), success = done.success, "Task finished");
        }

        for mut import in std::mem::take(&mut self.pending) {
            if !import.handle.is_finished() {
                self.pending.push(import);
                continue;
            }
            match (&mut import.handle).now_or_never() {
                Some(joined) => self.finish_import(&import, joined),
                None => self.pending.push(import),
            }
        }
    }

    fn finish_import(&mut self, import: &PendingImport, joined: Result<ImportResult, JoinError>) {
        // The worker may have died before reporting on its channel
        self.task_manager.forget(import.task);

        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, kind = import.kind.display_name(), "Import task aborted");
                match import.kind {
                    TaskType::ImportPhotos => self.ingest.fail_batch(import.generation),
                    TaskType::ImportCover => self.ingest.fail_cover(import.generation),
                }
                self.notifier.error(format!("{} failed", import.kind.display_name()));
                return;
            }
        };

        match (import.kind, result) {
            (TaskType::ImportPhotos, Ok(photos)) => {
                let added = self.ingest.accept_batch(import.generation, photos);
                if added > 0 {
                    self.notifier
                        .success(format!("Added {} photo{}", added, if added == 1 { "" } else { "s" }));
                }
            }
            (TaskType::ImportCover, Ok(mut photos)) => match photos.pop() {
                Some(cover) => {
                    if self.ingest.set_cover(import.generation, cover) {
                        self.notifier.info("Cover loaded");
                    }
                }
                None => self.ingest.fail_cover(import.generation),
            },
            (kind, Err(e)) => {
                match kind {
                    TaskType::ImportPhotos => self.ingest.fail_batch(import.generation),
                    TaskType::ImportCover => self.ingest.fail_cover(import.generation),
                }
                if e != IngestError::Cancelled {
                    tracing::warn!(error = %e, "Import failed");
                    self.notifier.error(e.to_string());
                }
            }
        }
    }

    fn spawn_import(&mut self, kind: TaskType, batch: PreparedBatch) {
        let (task, tx, cancel) = self.task_manager.register_task(kind);
        let limits = self.ingest.limits().clone();
        let generation = batch.generation;
        let handle = tokio::spawn(convert_batch(batch.files, limits, Some(tx), Some(cancel)));
        if kind == TaskType::ImportPhotos {
            self.ingest.mark_dispatched();
        }
        self.pending.push(PendingImport {
            task,
            kind,
            generation,
            handle,
        });
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.mode {
            AppMode::Help => self.mode = self.help_return,
            AppMode::Gallery => self.handle_gallery_key(key),
            AppMode::Searching => self.handle_search_key(key),
            AppMode::AlbumDetail => self.handle_detail_key(key),
            AppMode::Creating | AppMode::Editing => self.handle_form_key(key),
            AppMode::Confirming => self.handle_confirm_key(key),
        }
    }

    fn open_help(&mut self) {
        self.help_return = self.mode;
        self.mode = AppMode::Help;
    }

    fn selected_album_id(&self) -> Option<AlbumId> {
        self.view
            .render(&self.store)
            .cards
            .get(self.selected)
            .map(|card| card.id().clone())
    }

    fn handle_gallery_key(&mut self, key: KeyEvent) {
        let count = self.view.render(&self.store).cards.len();
        let columns = self.grid_columns.max(1);

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.open_help(),
            KeyCode::Esc => {
                if self.task_manager.cancel_most_recent() {
                    self.notifier.info("Cancelling import...");
                } else if !self.view.query().is_empty() {
                    self.search.clear();
                    self.view.set_query("");
                    self.selected = 0;
                }
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            KeyCode::Char('h') | KeyCode::Left => self.selected = self.selected.saturating_sub(1),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + columns < count {
                    self.selected += columns;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.selected >= columns {
                    self.selected -= columns;
                }
            }
            KeyCode::Char('n') | KeyCode::Char(']') | KeyCode::PageDown => {
                if self.view.next_page(&self.store) {
                    self.selected = 0;
                }
            }
            KeyCode::Char('p') | KeyCode::Char('[') | KeyCode::PageUp => {
                if self.view.prev_page() {
                    self.selected = 0;
                }
            }
            KeyCode::Char('/') => {
                self.search = TextField::with_text(self.view.query());
                self.mode = AppMode::Searching;
            }
            KeyCode::Char('s') => {
                let order = self.view.sort_order().cycle();
                self.view.apply_sort(&mut self.store, order);
                self.selected = 0;
                self.notifier.info(format!("Sorted by {}", order.label()));
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_album_id() {
                    self.detail = Some(AlbumDetail::new(id));
                    self.mode = AppMode::AlbumDetail;
                }
            }
            KeyCode::Char('c') => self.open_create_form(),
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_album_id() {
                    self.open_edit_form(&id);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_album_id() {
                    self.ask(ConfirmAction::DeleteAlbum(id));
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.mode = AppMode::Gallery;
                return;
            }
            KeyCode::Esc => {
                self.search.clear();
                self.mode = AppMode::Gallery;
            }
            KeyCode::Backspace => self.search.backspace(),
            KeyCode::Delete => self.search.delete(),
            KeyCode::Left => self.search.move_left(),
            KeyCode::Right => self.search.move_right(),
            KeyCode::Home => self.search.move_home(),
            KeyCode::End => self.search.move_end(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.search.insert(c),
            _ => return,
        }
        if self.search.text() != self.view.query() {
            self.view.set_query(self.search.text());
            self.selected = 0;
        }
    }

    fn close_detail(&mut self) {
        self.detail = None;
        self.mode = AppMode::Gallery;
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        let Some(detail) = self.detail.as_ref() else {
            self.mode = AppMode::Gallery;
            return;
        };
        let id = detail.id.clone();
        let index = detail.selected;
        let Some(count) = self.store.get(&id).map(|a| a.photo_count()) else {
            self.close_detail();
            return;
        };

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => self.close_detail(),
            KeyCode::Char('?') => self.open_help(),
            KeyCode::Char('j') | KeyCode::Down => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.select_next(count);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.select_prev();
                }
            }
            KeyCode::Char('w') => self.download_photo(&id, index),
            KeyCode::Char('x') | KeyCode::Delete => {
                if index < count {
                    self.ask(ConfirmAction::DeletePhoto { id, index });
                }
            }
            KeyCode::Char('d') => self.ask(ConfirmAction::DeleteAlbum(id)),
            KeyCode::Char('e') => self.open_edit_form(&id),
            _ => {}
        }
    }

    fn download_photo(&mut self, id: &AlbumId, index: usize) {
        let Some(album) = self.store.get(id) else {
            return;
        };
        match download::download_photo(album, index, &self.config.ui.download_dir, Utc::now()) {
            Ok(path) => self.notifier.success(format!("Saved {}", path.display())),
            Err(e) => {
                tracing::warn!(error = %e, album = %id, index, "Download failed");
                self.notifier.error(format!("Download failed: {}", e));
            }
        }
    }

    fn open_create_form(&mut self) {
        self.ingest.clear();
        self.form = Some(AlbumForm::create());
        self.mode = AppMode::Creating;
    }

    fn open_edit_form(&mut self, id: &AlbumId) {
        if let Some(album) = self.store.get(id) {
            self.form = Some(AlbumForm::edit(album));
            self.mode = AppMode::Editing;
        }
    }

    /// Close the form, dropping the working selection and any imports still
    /// running for it.
    fn close_form(&mut self) {
        self.task_manager.cancel_all();
        self.ingest.clear();
        self.form = None;
        self.notifier.cancel_all();
        self.mode = if self.detail.is_some() {
            AppMode::AlbumDetail
        } else {
            AppMode::Gallery
        };
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            self.mode = AppMode::Gallery;
            return;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => {
                if form.is_dirty(&self.ingest) {
                    self.ask(ConfirmAction::DiscardForm);
                } else {
                    self.close_form();
                }
            }
            KeyCode::Char('s') if ctrl => self.submit_form(),
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Enter => {
                let editing = matches!(form.kind, FormKind::Edit(_));
                match form.focus {
                    FormField::Name | FormField::Description if editing => self.submit_form(),
                    FormField::Name | FormField::Description => form.next_field(),
                    FormField::Cover => self.load_cover(),
                    FormField::Photos => self.add_photos(),
                    FormField::Selection => {}
                }
            }
            _ if form.focus == FormField::Selection => match key.code {
                KeyCode::Char('j') | KeyCode::Down => form.select_next_photo(self.ingest.photos().len()),
                KeyCode::Char('k') | KeyCode::Up => form.select_prev_photo(),
                KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
                    if self.ingest.remove_photo(form.selected_photo).is_some() {
                        form.clamp_selection(self.ingest.photos().len());
                    }
                }
                _ => {}
            },
            code => {
                if let Some(field) = form.focused_text_mut() {
                    match code {
                        KeyCode::Backspace => field.backspace(),
                        KeyCode::Delete => field.delete(),
                        KeyCode::Left => field.move_left(),
                        KeyCode::Right => field.move_right(),
                        KeyCode::Home => field.move_home(),
                        KeyCode::End => field.move_end(),
                        KeyCode::Char('u') if ctrl => field.clear(),
                        KeyCode::Char(c) if !ctrl => field.insert(c),
                        _ => {}
                    }
                }
            }
        }
    }

    fn load_cover(&mut self) {
        if self.ingest.is_cover_loading() {
            self.notifier.info(IngestError::CoverLoading.to_string());
            return;
        }
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let Some(path) = ingest::parse_path_list(form.cover_path.text()).into_iter().next() else {
            self.notifier.error(ValidationError::MissingCover.to_string());
            return;
        };

        let file = match CandidateFile::from_path(&path) {
            Ok(file) => file,
            Err(e) => {
                self.notifier.error(format!("Cannot open {}: {}", path.display(), e));
                return;
            }
        };
        match self.ingest.prepare_cover(file) {
            Ok(batch) => {
                form.cover_path.clear();
                self.spawn_import(TaskType::ImportCover, batch);
            }
            Err(e) => self.notifier.error(e.to_string()),
        }
    }

    fn add_photos(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let paths = ingest::parse_path_list(form.photo_paths.text());
        if paths.is_empty() {
            return;
        }

        let files = match ingest::expand_inputs(&paths, &self.config.ingest.image_extensions) {
            Ok(files) => files,
            Err(e) => {
                self.notifier.error(format!("Cannot read photos: {}", e));
                return;
            }
        };
        match self.ingest.prepare_batch(files) {
            Ok(Some(batch)) => {
                form.photo_paths.clear();
                tracing::info!(files = batch.files.len(), "Loading photos");
                self.spawn_import(TaskType::ImportPhotos, batch);
            }
            Ok(None) => self.notifier.info("No image files found"),
            Err(e) => self.notifier.error(e.to_string()),
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let kind = form.kind.clone();
        let name = form.name.text().to_string();
        let description = form.description.text().to_string();

        match kind {
            FormKind::Create => match self.ingest.commit(&mut self.store, &name, &description, Utc::now()) {
                Ok(id) => {
                    self.close_form();
                    self.view.go_to_page(&self.store, 1);
                    self.selected = self
                        .view
                        .render(&self.store)
                        .cards
                        .iter()
                        .position(|card| card.id() == &id)
                        .unwrap_or(0);
                    self.notifier.success("Album created successfully!");
                }
                Err(e) => self.notifier.error(e.to_string()),
            },
            FormKind::Edit(id) => match self.store.update_metadata(&id, &name, Some(&description)) {
                Ok(()) => {
                    self.close_form();
                    self.notifier.success("Album updated");
                }
                Err(e) => self.notifier.error(e.to_string()),
            },
        }
    }

    fn ask(&mut self, action: ConfirmAction) {
        self.confirm = Some(ConfirmDialog::new(action, self.mode));
        self.mode = AppMode::Confirming;
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let Some(dialog) = self.confirm.take() else {
            self.mode = AppMode::Gallery;
            return;
        };

        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.mode = dialog.return_mode;
                self.execute(dialog.action);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = dialog.return_mode;
            }
            _ => self.confirm = Some(dialog),
        }
    }

    fn execute(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteAlbum(id) => match self.store.remove_by_id(&id) {
                Ok(_) => {
                    if self.detail.as_ref().is_some_and(|d| d.id == id) {
                        self.close_detail();
                    }
                    self.view.clamp(&self.store);
                    let visible = self.view.render(&self.store).cards.len();
                    self.selected = self.selected.min(visible.saturating_sub(1));
                    self.notifier.success("Album deleted successfully");
                }
                Err(e) => self.notifier.error(e.to_string()),
            },
            ConfirmAction::DeletePhoto { id, index } => match self.store.remove_photo_by_id(&id, index) {
                Ok(_) => {
                    let count = self.store.get(&id).map_or(0, |a| a.photo_count());
                    if let Some(detail) = self.detail.as_mut() {
                        detail.clamp(count);
                    }
                    self.notifier.success("Photo deleted");
                }
                Err(e) => self.notifier.error(e.to_string()),
            },
            ConfirmAction::DiscardForm => self.close_form(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album::fixtures::album;
    use crate::ingest::IngestState;
    use crate::storage::LocalStore;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn app() -> (TempDir, App) {
        let dir = tempdir().unwrap();
        let primary = LocalStore::open(&dir.path().join("local"), usize::MAX).unwrap();
        let store = AlbumStore::new(Box::new(primary), None, "albumsDB");
        let mut config = Config::default();
        config.ui.download_dir = dir.path().join("downloads");
        config.ingest.chunk_yield_ms = 0;
        (dir, App::new(config, store))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_delete_album_asks_first() {
        let (_dir, mut app) = app();
        app.store.insert(album(1, "keep", 0, 1)).unwrap();
        app.store.insert(album(2, "drop", 1, 1)).unwrap();

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode, AppMode::Confirming);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.len(), 2);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.mode, AppMode::Gallery);
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.albums()[0].name, "keep");
        assert_eq!(app.notifier.latest().unwrap().text, "Album deleted successfully");
    }

    #[test]
    fn test_confirm_targets_album_by_id() {
        let (_dir, mut app) = app();
        app.store.insert(album(1, "b", 0, 1)).unwrap();
        app.store.insert(album(2, "a", 1, 1)).unwrap();

        press(&mut app, KeyCode::Char('d'));
        // reorder while the dialog is open
        app.store.sort(crate::order::SortOrder::NameDesc);
        press(&mut app, KeyCode::Enter);

        let names: Vec<_> = app.store.albums().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["b"]);
    }

    #[test]
    fn test_search_filters_and_esc_clears() {
        let (_dir, mut app) = app();
        app.store.insert(album(1, "Beach", 0, 1)).unwrap();
        app.store.insert(album(2, "Mountains", 1, 1)).unwrap();

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "bea");
        assert_eq!(app.view.query(), "bea");
        assert_eq!(app.view.render(&app.store).total, 1);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Gallery);
        assert_eq!(app.view.query(), "bea");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view.query(), "");
    }

    #[test]
    fn test_album_detail_download_and_delete_photo() {
        let (dir, mut app) = app();
        let mut a = album(1, "Trip", 0, 2);
        a.photos = vec![
            crate::data_url::encode("image/png", b"one"),
            crate::data_url::encode("image/png", b"two"),
        ];
        app.store.insert(a).unwrap();

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::AlbumDetail);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('w'));
        let saved = fs::read(dir.path().join("downloads").join("Trip_1.png")).unwrap();
        assert_eq!(saved, b"two");

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.mode, AppMode::AlbumDetail);
        let album = &app.store.albums()[0];
        assert_eq!(album.photo_count(), 1);
        assert_eq!(app.detail.as_ref().unwrap().selected, 0);
    }

    #[test]
    fn test_edit_album_name() {
        let (_dir, mut app) = app();
        app.store.insert(album(1, "Old", 0, 1)).unwrap();

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.mode, AppMode::Editing);
        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        type_text(&mut app, "New");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, AppMode::Gallery);
        assert_eq!(app.store.albums()[0].name, "New");
    }

    #[tokio::test]
    async fn test_create_album_through_form() {
        let (dir, mut app) = app();
        let photos = dir.path().join("photos");
        fs::create_dir(&photos).unwrap();
        fs::write(photos.join("a.jpg"), b"a").unwrap();
        fs::write(photos.join("b.jpg"), b"b").unwrap();
        fs::write(photos.join("notes.txt"), b"n").unwrap();

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode, AppMode::Creating);
        type_text(&mut app, "Trip");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, photos.to_str().unwrap());
        press(&mut app, KeyCode::Enter);
        assert_ne!(app.ingest.state(), IngestState::Idle);

        for _ in 0..200 {
            app.poll_imports();
            if app.ingest.photos().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(app.ingest.photos().len(), 2);
        assert_eq!(app.ingest.state(), IngestState::Idle);

        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(app.mode, AppMode::Gallery);
        assert_eq!(app.store.len(), 1);
        let created = &app.store.albums()[0];
        assert_eq!(created.name, "Trip");
        assert_eq!(created.photo_names, Some(vec!["a.jpg".to_string(), "b.jpg".to_string()]));
        assert_eq!(created.cover, created.photos[0]);
    }

    #[tokio::test]
    async fn test_submit_waits_for_cover() {
        let (dir, mut app) = app();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();
        fs::write(dir.path().join("cover.png"), b"cover").unwrap();

        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "Trip");
        let form = app.form.as_mut().unwrap();
        form.photo_paths = TextField::with_text(dir.path().join("a.jpg").to_str().unwrap());
        app.add_photos();
        for _ in 0..200 {
            app.poll_imports();
            if app.ingest.photos().len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(app.ingest.photos().len(), 1);

        let form = app.form.as_mut().unwrap();
        form.cover_path = TextField::with_text(dir.path().join("cover.png").to_str().unwrap());
        app.load_cover();
        app.submit_form();
        assert!(app.store.is_empty());
        assert_eq!(app.mode, AppMode::Creating);
        assert!(app.notifier.latest().unwrap().text.contains("still loading"));

        for _ in 0..200 {
            app.poll_imports();
            if app.ingest.cover().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        app.submit_form();
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.albums()[0].cover, crate::data_url::encode("image/png", b"cover"));
    }

    #[test]
    fn test_dirty_form_asks_before_discarding() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "half");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Confirming);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Creating);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.mode, AppMode::Gallery);
        assert!(app.form.is_none());
    }

    #[test]
    fn test_commit_errors_are_shown() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::Char('c'));
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(app.notifier.latest().unwrap().text, "Please enter an album name");
        assert_eq!(app.mode, AppMode::Creating);
    }
}
