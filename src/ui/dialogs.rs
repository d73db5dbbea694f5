use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

fn heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan),
    ))
}

pub fn render_help(frame: &mut Frame, area: Rect) {
    let dialog_width = 60.min(area.width.saturating_sub(4));
    let dialog_height = 34.min(area.height.saturating_sub(2));

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;
    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let help_text = vec![
        heading("Gallery"),
        Line::from(""),
        Line::from("  h j k l / arrows   Move between albums"),
        Line::from("  n / ]              Next page"),
        Line::from("  p / [              Previous page"),
        Line::from("  /                  Search name, description, photos"),
        Line::from("  s                  Cycle sort order"),
        Line::from("  Enter              Open album"),
        Line::from("  c                  Create album"),
        Line::from("  e                  Edit album name / description"),
        Line::from("  d                  Delete album"),
        Line::from("  Esc                Cancel running import"),
        Line::from(""),
        heading("Album"),
        Line::from(""),
        Line::from("  j / k              Select photo"),
        Line::from("  w                  Download photo"),
        Line::from("  x                  Delete photo"),
        Line::from("  Esc / q            Back to gallery"),
        Line::from(""),
        heading("Create form"),
        Line::from(""),
        Line::from("  Tab / Shift+Tab    Next / previous field"),
        Line::from("  Enter              Load cover or add photos"),
        Line::from("  x / Delete         Remove selected photo"),
        Line::from("  Ctrl+S             Create album"),
        Line::from(""),
        Line::from("  ?                  Show this help"),
        Line::from("  q                  Quit"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, dialog_area);
}
