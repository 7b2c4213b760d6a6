use crate::ui::conversation::commands::{matching_commands, parse_slash_command, ParsedCommand};
use crate::view::ComposerView;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Block, Borders, Widget,
    },
};

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ConversationResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Cursor position in characters
    pub cursor_position: usize,
}

/// Conversation composer for user input
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    state: TextAreaState,
    placeholder: String,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder: placeholder.into(),
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationResult {
        if key.kind != KeyEventKind::Press {
            return ConversationResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key
                    .modifiers
                    .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT)
                {
                    self.insert_char('\n');
                } else if !self.state.content.trim().is_empty() {
                    let content = std::mem::take(&mut self.state.content);
                    self.state.cursor_position = 0;
                    if let Some(command) = parse_slash_command(&content) {
                        return ConversationResult::Command(command);
                    }
                    return ConversationResult::Submitted(content);
                }
            }
            KeyCode::Char(c) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.insert_char(c);
                }
            }
            KeyCode::Backspace => {
                if self.state.cursor_position > 0 {
                    self.state.cursor_position -= 1;
                    let at = self.byte_index(self.state.cursor_position);
                    self.state.content.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.state.cursor_position < self.char_count() {
                    let at = self.byte_index(self.state.cursor_position);
                    self.state.content.remove(at);
                }
            }
            KeyCode::Left => {
                self.state.cursor_position = self.state.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.state.cursor_position < self.char_count() {
                    self.state.cursor_position += 1;
                }
            }
            KeyCode::Home => self.state.cursor_position = 0,
            KeyCode::End => self.state.cursor_position = self.char_count(),
            _ => {}
        }

        ConversationResult::None
    }

    /// Insert a character at the cursor position
    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.state.cursor_position);
        self.state.content.insert(at, c);
        self.state.cursor_position += 1;
    }

    fn char_count(&self) -> usize {
        self.state.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.state
            .content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.state.content.len())
    }

    /// Get current content
    pub fn content(&self) -> &str {
        &self.state.content
    }

    /// Widget drawing the composer in the given view state
    pub fn widget<'a>(&'a self, view: ComposerView, focused: bool, spinner: &'a str) -> ComposerWidget<'a> {
        ComposerWidget {
            composer: self,
            view,
            focused,
            spinner,
        }
    }
}

pub struct ComposerWidget<'a> {
    composer: &'a ConversationComposer,
    view: ComposerView,
    focused: bool,
    spinner: &'a str,
}

impl Widget for ComposerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = &self.composer.state;

        // Send "button" state lives in the title
        let title = if self.view.busy {
            format!(" {} ", self.spinner)
        } else if self.view.enabled {
            " ✉ Send [Enter] ".to_string()
        } else {
            " Input disabled ".to_string()
        };

        let border_style = if !self.view.enabled {
            Style::default().fg(Color::DarkGray)
        } else if self.focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(border_style);

        if let Some(query) = state.content.strip_prefix('/') {
            let hints: Vec<String> = matching_commands(query.trim())
                .into_iter()
                .map(|c| format!("/{}", c.command()))
                .collect();
            if !hints.is_empty() {
                block = block.title(
                    Title::from(format!(" {} ", hints.join("  "))).position(Position::Bottom),
                );
            }
        }

        let inner_area = block.inner(area);
        block.render(area, buf);

        if state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.composer.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
            return;
        }

        // Render content with cursor indicator
        let mut content = state.content.clone();
        if self.focused && self.view.enabled {
            let at = self.composer.byte_index(state.cursor_position);
            content.insert(at, '▌');
        }

        let lines: Vec<&str> = content.split('\n').collect();
        let height = inner_area.height as usize;
        let skip = lines.len().saturating_sub(height);
        for (i, line_text) in lines.iter().skip(skip).enumerate() {
            let line = Line::from(vec![Span::raw(*line_text)]);
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}
