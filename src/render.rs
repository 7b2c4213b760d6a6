//! Turn message text into styled terminal content.
//!
//! User turns are shown verbatim. AI turns are parsed as Markdown. In both
//! cases every piece of text is sanitized before it can reach the terminal:
//! control characters (escape sequences included) are dropped and raw HTML
//! in Markdown is shown as inert text instead of being interpreted.

use crate::events::Role;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
};

/// Render a message body for display.
pub fn render(role: Role, text: &str) -> Text<'static> {
    match role {
        Role::User => render_plain(text),
        Role::Ai => render_markdown(text),
    }
}

/// Strip everything a terminal could interpret as a control sequence.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

fn render_plain(text: &str) -> Text<'static> {
    let clean = sanitize(text);
    let lines: Vec<Line<'static>> = clean
        .split('\n')
        .map(|line| Line::raw(line.to_string()))
        .collect();
    Text::from(lines)
}

fn render_markdown(text: &str) -> Text<'static> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut writer = MarkdownWriter::default();
    for event in Parser::new_ext(text, options) {
        writer.handle(event);
    }
    writer.finish()
}

fn code_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn dim_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

#[derive(Default)]
struct MarkdownWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    pending_marker: Option<String>,
    links: Vec<String>,
    quote_depth: usize,
    table_cell: usize,
    in_code_block: bool,
    needs_gap: bool,
}

impl MarkdownWriter {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                let style = if self.in_code_block {
                    code_style()
                } else {
                    self.style()
                };
                self.push_text(&text, style);
            }
            Event::Code(code) => {
                self.push_span(Span::styled(sanitize(&code), code_style()));
            }
            // Raw HTML is never interpreted, only shown.
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_text(&html, dim_style());
            }
            Event::SoftBreak | Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.begin_block();
                self.push_span(Span::styled("─".repeat(24), dim_style()));
                self.end_block();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(Span::styled(marker, dim_style()));
            }
            Event::FootnoteReference(name) => {
                self.push_span(Span::styled(format!("[^{}]", sanitize(&name)), dim_style()));
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.begin_block();
                }
            }
            Tag::Heading { level, .. } => {
                self.begin_block();
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                );
                let hashes = "#".repeat(level as usize);
                self.push_span(Span::styled(format!("{} ", hashes), self.style()));
            }
            Tag::BlockQuote => {
                self.begin_block();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.begin_block();
                if let CodeBlockKind::Fenced(lang) = kind {
                    let lang = sanitize(&lang);
                    if !lang.trim().is_empty() {
                        self.push_span(Span::styled(format!("[{}]", lang.trim()), dim_style()));
                        self.flush_line();
                    }
                }
                self.in_code_block = true;
            }
            Tag::HtmlBlock => self.begin_block(),
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.begin_block();
                } else {
                    self.flush_pending();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_pending();
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{}. ", number);
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.pending_marker = Some(marker);
            }
            Tag::Table(_) => {
                self.begin_block();
            }
            Tag::TableHead => {
                self.table_cell = 0;
                self.push_style(Style::default().add_modifier(Modifier::BOLD));
            }
            Tag::TableRow => self.table_cell = 0,
            Tag::TableCell => {
                if self.table_cell > 0 {
                    self.push_span(Span::styled(" │ ", dim_style()));
                }
                self.table_cell += 1;
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.links.push(sanitize(&dest_url));
                self.push_style(
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            Tag::Image { .. } => {
                self.push_span(Span::styled("[image: ", dim_style()));
            }
            Tag::FootnoteDefinition(name) => {
                self.begin_block();
                self.push_span(Span::styled(format!("[^{}]:", sanitize(&name)), dim_style()));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_pending();
                self.needs_gap = true;
            }
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.end_block();
            }
            TagEnd::BlockQuote => {
                self.flush_pending();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.needs_gap = true;
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.end_block();
            }
            TagEnd::HtmlBlock => self.end_block(),
            TagEnd::List(_) => {
                self.flush_pending();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.needs_gap = true;
                }
            }
            TagEnd::Item => self.flush_pending(),
            TagEnd::TableHead => {
                self.styles.pop();
                self.flush_pending();
            }
            TagEnd::TableRow => self.flush_pending(),
            TagEnd::Table => self.end_block(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(dest) = self.links.pop() {
                    if !dest.is_empty() {
                        self.push_span(Span::styled(format!(" ({})", dest), dim_style()));
                    }
                }
            }
            TagEnd::Image => {
                self.push_span(Span::styled("]", dim_style()));
            }
            TagEnd::FootnoteDefinition => self.end_block(),
            _ => {}
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, style: Style) {
        let merged = self.style().patch(style);
        self.styles.push(merged);
    }

    fn push_text(&mut self, text: &str, style: Style) {
        let clean = sanitize(text);
        for piece in clean.split_inclusive('\n') {
            let content = piece.trim_end_matches('\n');
            if !content.is_empty() {
                self.push_span(Span::styled(content.to_string(), style));
            }
            if piece.ends_with('\n') {
                self.flush_line();
            }
        }
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.current.is_empty() {
            let prefix = self.prefix();
            self.current.extend(prefix);
        }
        self.current.push(span);
    }

    fn prefix(&mut self) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::Green),
            ));
        }
        if !self.lists.is_empty() {
            let indent = "  ".repeat(self.lists.len() - 1);
            match self.pending_marker.take() {
                Some(marker) => spans.push(Span::styled(
                    format!("{}{}", indent, marker),
                    Style::default().fg(Color::Magenta),
                )),
                None => spans.push(Span::raw(format!("{}  ", indent))),
            }
        }
        if self.in_code_block {
            spans.push(Span::raw("  "));
        }
        spans
    }

    fn flush_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn flush_pending(&mut self) {
        if !self.current.is_empty() {
            self.flush_line();
        }
    }

    fn begin_block(&mut self) {
        self.flush_pending();
        if self.needs_gap && !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.needs_gap = false;
    }

    fn end_block(&mut self) {
        self.flush_pending();
        self.needs_gap = true;
    }

    fn finish(mut self) -> Text<'static> {
        self.flush_pending();
        while self
            .lines
            .last()
            .is_some_and(|line| line.spans.iter().all(|span| span.content.trim().is_empty()))
        {
            self.lines.pop();
        }
        Text::from(self.lines)
    }
}
