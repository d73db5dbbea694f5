use ratatui::{prelude::*, widgets::Paragraph};

use crate::app::{App, AppMode};
use crate::notify::NoticeKind;
use crate::store::PersistOutcome;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(notice) = app.notifier.latest() {
        let style = match notice.kind {
            NoticeKind::Error => Style::default().fg(Color::White).bg(Color::Red),
            NoticeKind::Success => Style::default().fg(Color::Black).bg(Color::Green),
            NoticeKind::Info => Style::default().fg(Color::Yellow).bg(Color::DarkGray),
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(format!(" {} ", notice.text), style)));
        frame.render_widget(paragraph, area);
        return;
    }

    let page = app.view.render(&app.store);
    let mut spans = vec![Span::styled(
        format!(" {} albums ", app.store.len()),
        Style::default().fg(Color::White).bg(Color::DarkGray),
    )];

    spans.push(Span::styled(
        format!(" page {}/{} ", page.page, page.page_count.max(1)),
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::styled(
        format!(" sort: {} ", app.view.sort_order().label()),
        Style::default().fg(Color::Gray),
    ));
    if !app.view.query().is_empty() {
        spans.push(Span::styled(
            format!(" search: \"{}\" ({}) ", app.view.query(), page.total),
            Style::default().fg(Color::Yellow),
        ));
    }

    let running = app.task_manager.running_tasks();
    if !running.is_empty() {
        let indicators: Vec<String> = running
            .iter()
            .map(|task| match &task.progress {
                Some(progress) => format!("[{}:{}%]", task.task_type.short_name(), progress.percent()),
                None => format!("[{}:{}s]", task.task_type.short_name(), task.elapsed().as_secs()),
            })
            .collect();
        spans.push(Span::styled(
            format!(" {} ", indicators.join(" ")),
            Style::default().fg(Color::Cyan),
        ));
    }

    if app.store.last_persist() == Some(PersistOutcome::Failed) {
        spans.push(Span::styled(" unsaved ", Style::default().fg(Color::Red)));
    }

    let help_text = match app.mode {
        AppMode::Searching => " Enter:keep Esc:clear ",
        AppMode::AlbumDetail => " w:download x:delete Esc:back ",
        _ => " c:create /:search ?:help q:quit ",
    };

    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let available = area.width as usize;
    if available > used + help_text.len() {
        spans.push(Span::raw(" ".repeat(available - used - help_text.len())));
    }
    spans.push(Span::styled(
        help_text,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
