//! Conversation history display component

use crate::controller::EntryState;
use crate::events::Role;
use crate::view::{MessageView, MessagesView};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Message pane, anchored to the newest content
pub struct ConversationHistory<'a> {
    messages: &'a MessagesView,
    title: &'a str,
    spinner: &'a str,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(messages: &'a MessagesView, title: &'a str, spinner: &'a str) -> Self {
        Self {
            messages,
            title,
            spinner,
        }
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" 💬 {} ", self.title));

        let inner_area = block.inner(area);
        block.render(area, buf);

        match self.messages {
            MessagesView::Placeholder(text) => {
                let line = Line::from(Span::styled(*text, Style::default().fg(Color::Gray)));
                Paragraph::new(line)
                    .alignment(ratatui::layout::Alignment::Center)
                    .render(inner_area, buf);
            }
            MessagesView::Thread {
                entries,
                scroll_back,
            } => {
                let width = inner_area.width.saturating_sub(2) as usize;
                let mut all_lines: Vec<Line<'static>> = Vec::new();
                for entry in entries {
                    all_lines.extend(render_entry(entry, width, self.spinner));
                    // spacing between messages
                    all_lines.push(Line::default());
                }
                all_lines.pop();

                // Show the window ending `scroll_back` lines above the newest line
                let height = inner_area.height as usize;
                let total = all_lines.len();
                let max_back = total.saturating_sub(height);
                let end = total - (*scroll_back).min(max_back);
                let start = end.saturating_sub(height);

                Paragraph::new(all_lines[start..end].to_vec()).render(inner_area, buf);
            }
        }
    }
}

fn render_entry(entry: &MessageView, width: usize, spinner: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let (icon, style) = match entry.role {
        Role::User => ("👤", Style::default().fg(Color::Blue)),
        Role::Ai => ("🤖", Style::default().fg(Color::Green)),
    };
    lines.push(Line::from(vec![Span::styled(
        format!("{} {}", icon, entry.role.display_name()),
        style.add_modifier(Modifier::BOLD),
    )]));

    match entry.state {
        EntryState::Pending => {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{} thinking…", spinner), Style::default().fg(Color::Yellow)),
            ]));
        }
        EntryState::Failed => {
            for line in &entry.body.lines {
                let failed = Line::from(
                    line.spans
                        .iter()
                        .map(|span| {
                            Span::styled(
                                span.content.to_string(),
                                Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
                            )
                        })
                        .collect::<Vec<_>>(),
                );
                lines.extend(indent(wrap_line(&failed, width)));
            }
        }
        EntryState::Settled | EntryState::Streaming => {
            let mut body: Vec<Line<'static>> = Vec::new();
            for line in &entry.body.lines {
                body.extend(wrap_line(line, width));
            }
            if entry.state == EntryState::Streaming {
                let cursor = Span::styled("▋", Style::default().fg(Color::Yellow));
                match body.last_mut() {
                    Some(last) => last.spans.push(cursor),
                    None => body.push(Line::from(cursor)),
                }
            }
            lines.extend(indent(body));
        }
    }

    lines
}

fn indent(lines: Vec<Line<'static>>) -> Vec<Line<'static>> {
    lines
        .into_iter()
        .map(|mut line| {
            line.spans.insert(0, Span::raw("  "));
            line
        })
        .collect()
}

/// Wrap a styled line to `width` columns, breaking at spaces where possible
pub fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 || line.width() <= width {
        return vec![line.clone()];
    }

    let mut wrapped = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    for span in &line.spans {
        for word in span.content.split_inclusive(' ') {
            let word_width = Span::raw(word).width();
            if used + word_width > width && used > 0 {
                wrapped.push(Line::from(std::mem::take(&mut current)));
                used = 0;
            }
            if word_width <= width {
                current.push(Span::styled(word.to_string(), span.style));
                used += word_width;
                continue;
            }
            // A single word wider than the pane is split by character
            for ch in word.chars() {
                let piece = ch.to_string();
                let ch_width = Span::raw(piece.as_str()).width();
                if used + ch_width > width && used > 0 {
                    wrapped.push(Line::from(std::mem::take(&mut current)));
                    used = 0;
                }
                current.push(Span::styled(piece, span.style));
                used += ch_width;
            }
        }
    }

    if !current.is_empty() {
        wrapped.push(Line::from(current));
    }
    wrapped
}
