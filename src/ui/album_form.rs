//! Create / edit album form.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::album::{Album, AlbumId};
use crate::ingest::IngestSession;
use crate::tasks::{BackgroundTaskManager, TaskType};

/// Single-line text input. The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    text: String,
    cursor: usize,
}

impl TextField {
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Description,
    Cover,
    Photos,
    Selection,
}

impl FormField {
    fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Album name",
            FormField::Description => "Description",
            FormField::Cover => "Cover image (Enter to load)",
            FormField::Photos => "Add photos: files or folders, comma separated (Enter to add)",
            FormField::Selection => "Selected photos",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    Create,
    Edit(AlbumId),
}

pub struct AlbumForm {
    pub kind: FormKind,
    pub name: TextField,
    pub description: TextField,
    pub cover_path: TextField,
    pub photo_paths: TextField,
    pub focus: FormField,
    pub selected_photo: usize,
}

const CREATE_FIELDS: [FormField; 5] = [
    FormField::Name,
    FormField::Description,
    FormField::Cover,
    FormField::Photos,
    FormField::Selection,
];
const EDIT_FIELDS: [FormField; 2] = [FormField::Name, FormField::Description];

impl AlbumForm {
    pub fn create() -> Self {
        Self {
            kind: FormKind::Create,
            name: TextField::default(),
            description: TextField::default(),
            cover_path: TextField::default(),
            photo_paths: TextField::default(),
            focus: FormField::Name,
            selected_photo: 0,
        }
    }

    pub fn edit(album: &Album) -> Self {
        Self {
            kind: FormKind::Edit(album.id.clone()),
            name: TextField::with_text(&album.name),
            description: TextField::with_text(album.description.clone().unwrap_or_default()),
            ..Self::create()
        }
    }

    pub fn fields(&self) -> &'static [FormField] {
        match self.kind {
            FormKind::Create => &CREATE_FIELDS,
            FormKind::Edit(_) => &EDIT_FIELDS,
        }
    }

    pub fn next_field(&mut self) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(pos + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields = self.fields();
        let pos = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(pos + fields.len() - 1) % fields.len()];
    }

    pub fn focused_text_mut(&mut self) -> Option<&mut TextField> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Description => Some(&mut self.description),
            FormField::Cover => Some(&mut self.cover_path),
            FormField::Photos => Some(&mut self.photo_paths),
            FormField::Selection => None,
        }
    }

    /// Anything typed or loaded that closing the form would lose.
    pub fn is_dirty(&self, session: &IngestSession) -> bool {
        match &self.kind {
            FormKind::Create => {
                !self.name.is_empty()
                    || !self.description.is_empty()
                    || session.cover().is_some()
                    || !session.photos().is_empty()
            }
            FormKind::Edit(_) => false,
        }
    }

    pub fn select_next_photo(&mut self, count: usize) {
        if count > 0 && self.selected_photo + 1 < count {
            self.selected_photo += 1;
        }
    }

    pub fn select_prev_photo(&mut self) {
        self.selected_photo = self.selected_photo.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self, count: usize) {
        self.selected_photo = self.selected_photo.min(count.saturating_sub(1));
    }
}

pub fn render(
    frame: &mut Frame,
    form: &AlbumForm,
    session: &IngestSession,
    tasks: &BackgroundTaskManager,
    area: Rect,
) {
    let creating = form.kind == FormKind::Create;
    let dialog_width = 80.min(area.width.saturating_sub(4));
    let dialog_height = (if creating { 30 } else { 12 }).min(area.height.saturating_sub(2));
    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;
    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let title = if creating { " Create Album " } else { " Edit Album " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    frame.render_widget(block, dialog_area);

    let mut constraints = vec![Constraint::Length(3), Constraint::Length(3)];
    if creating {
        constraints.extend([
            Constraint::Length(3), // cover
            Constraint::Length(3), // photo paths
            Constraint::Length(1), // progress
            Constraint::Min(3),    // selection
        ]);
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(dialog_area);

    render_field(frame, form, FormField::Name, &form.name, chunks[0]);
    render_field(frame, form, FormField::Description, &form.description, chunks[1]);

    if creating {
        render_cover_field(frame, form, session, chunks[2]);
        render_field(frame, form, FormField::Photos, &form.photo_paths, chunks[3]);
        render_progress(frame, session, tasks, chunks[4]);
        render_selection(frame, form, session, chunks[5]);
    }

    let help = if creating {
        "Tab:next field | Ctrl+S:create | x:remove photo | Esc:cancel"
    } else {
        "Tab:next field | Ctrl+S / Enter:save | Esc:cancel"
    };
    let help = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[chunks.len() - 1]);
}

fn field_block(form: &AlbumForm, field: FormField) -> Block<'static> {
    titled_block(form, field, format!(" {} ", field.label()))
}

fn titled_block(form: &AlbumForm, field: FormField, title: String) -> Block<'static> {
    let focused = form.focus == field;
    Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        })
        .title(title)
}

fn render_field(frame: &mut Frame, form: &AlbumForm, field: FormField, input: &TextField, area: Rect) {
    let block = field_block(form, field);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Scroll horizontally so the cursor stays visible
    let width = inner.width.max(1) as usize;
    let offset = input.cursor().saturating_sub(width - 1);
    let visible: String = input.text().chars().skip(offset).take(width).collect();
    frame.render_widget(Paragraph::new(visible), inner);

    if form.focus == field {
        let cursor_x = inner.x + (input.cursor() - offset) as u16;
        frame.set_cursor_position(Position::new(cursor_x, inner.y));
    }
}

fn render_cover_field(frame: &mut Frame, form: &AlbumForm, session: &IngestSession, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(24)])
        .split(area);

    render_field(frame, form, FormField::Cover, &form.cover_path, chunks[0]);

    let status = match (session.cover(), session.photos().first()) {
        _ if session.is_cover_loading() => Span::styled(" loading...", Style::default().fg(Color::Cyan)),
        (Some(cover), _) => Span::styled(format!(" ✓ {}", cover.name), Style::default().fg(Color::Green)),
        (None, Some(_)) => Span::styled(" first photo", Style::default().fg(Color::Yellow)),
        (None, None) => Span::styled(" no cover", Style::default().fg(Color::DarkGray)),
    };
    let status = Paragraph::new(Line::from(status)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[1]);
}

fn render_progress(frame: &mut Frame, session: &IngestSession, tasks: &BackgroundTaskManager, area: Rect) {
    let running = tasks.running_tasks();
    let line = match running.iter().find_map(|t| t.progress.as_ref().map(|p| (t, p))) {
        Some((task, progress)) => format!(
            " {} {}/{} ({}%)",
            task.task_type.display_name(),
            progress.current,
            progress.total,
            progress.percent()
        ),
        None if session.state().is_busy() || tasks.is_running(TaskType::ImportCover) => {
            " Processing...".to_string()
        }
        None => String::new(),
    };
    frame.render_widget(Paragraph::new(line).style(Style::default().fg(Color::Cyan)), area);
}

fn render_selection(frame: &mut Frame, form: &AlbumForm, session: &IngestSession, area: Rect) {
    let limits = session.limits();
    let total_bytes: u64 = session.photos().iter().map(|p| p.size).sum();
    let title = format!(
        " {} ({}/{}, {}) ",
        FormField::Selection.label(),
        session.photos().len(),
        limits.max_photos,
        format_size(total_bytes)
    );

    let items: Vec<ListItem> = session
        .photos()
        .iter()
        .enumerate()
        .map(|(i, p)| ListItem::new(format!("{:>3}. {}  {}", i + 1, p.name, format_size(p.size))))
        .collect();

    let block = titled_block(form, FormField::Selection, title);
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut state = ListState::default();
    if form.focus == FormField::Selection && !session.photos().is_empty() {
        state.select(Some(form.selected_photo));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field_multibyte() {
        let mut field = TextField::with_text("café");
        field.backspace();
        assert_eq!(field.text(), "caf");
        field.insert('é');
        field.move_home();
        field.insert('¡');
        assert_eq!(field.text(), "¡café");
        field.move_end();
        field.move_left();
        field.delete();
        assert_eq!(field.text(), "¡caf");
        field.clear();
        assert!(field.is_empty());
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn test_field_cycle() {
        let mut form = AlbumForm::create();
        form.prev_field();
        assert_eq!(form.focus, FormField::Selection);
        form.next_field();
        assert_eq!(form.focus, FormField::Name);

        let album = crate::album::fixtures::album(1, "Trip", 0, 1);
        let mut form = AlbumForm::edit(&album);
        assert_eq!(form.name.text(), "Trip");
        form.next_field();
        form.next_field();
        assert_eq!(form.focus, FormField::Name);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
