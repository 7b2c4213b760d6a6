//! Terminal drawing

pub mod conversation;
pub mod sidebar;

use crate::view::{ModalView, ViewModel};
use conversation::{ConversationComposer, ConversationHistory};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const SIDEBAR_WIDTH: u16 = 30;
const COMPOSER_HEIGHT: u16 = 5;

/// Pane receiving keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    Sidebar,
    #[default]
    Composer,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Focus::Sidebar => Focus::Composer,
            Focus::Composer => Focus::Sidebar,
        }
    }
}

pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER[tick % SPINNER.len()]
}

pub fn draw(
    frame: &mut Frame,
    view: &ViewModel,
    composer: &ConversationComposer,
    focus: Focus,
    tick: usize,
) {
    let spinner = spinner_frame(tick);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.size());

    let main_area = match &view.sidebar {
        Some(sidebar) => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
                .split(rows[0]);
            sidebar::render_sidebar(frame, columns[0], sidebar, focus == Focus::Sidebar);
            columns[1]
        }
        None => rows[0],
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),                  // History
            Constraint::Length(COMPOSER_HEIGHT), // Composer
        ])
        .split(main_area);

    frame.render_widget(
        ConversationHistory::new(&view.messages, &view.title, spinner),
        chunks[0],
    );
    frame.render_widget(
        composer.widget(view.composer, focus == Focus::Composer, spinner),
        chunks[1],
    );

    render_status_bar(frame, rows[1], focus);

    if let Some(modal) = &view.modal {
        render_modal(frame, modal);
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, focus: Focus) {
    let hints = match focus {
        Focus::Composer => "Enter send · Alt+Enter newline · Tab sidebar · Ctrl+N new · Ctrl+B hide list · /help · Ctrl+Q quit",
        Focus::Sidebar => "↑/↓ move · Enter open · d delete · n new · r refresh · Tab composer · Ctrl+Q quit",
    };
    let line = Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_modal(frame: &mut Frame, modal: &ModalView) {
    let (title, mut lines, keys, color): (&str, Vec<Line>, &str, Color) = match modal {
        ModalView::Alert(message) => (
            " Error ",
            vec![Line::from(message.as_str())],
            "[Enter] OK",
            Color::Red,
        ),
        ModalView::Info(text) => (
            " Help ",
            text.lines().map(Line::from).collect(),
            "[Enter] Close",
            Color::Cyan,
        ),
        ModalView::ConfirmDelete { title } => (
            " Delete conversation ",
            vec![Line::from(format!(
                "Are you sure you want to delete \"{}\"?",
                title
            ))],
            "[y] Delete   [n] Cancel",
            Color::Yellow,
        ),
    };
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        keys,
        Style::default().add_modifier(Modifier::BOLD),
    )));

    let (alignment, percent_x) = match modal {
        ModalView::Info(_) => (Alignment::Left, 70),
        _ => (Alignment::Center, 50),
    };
    let height = lines.len() as u16 + 2;
    let area = centered_rect(percent_x, height, frame.size());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color));
    let paragraph = Paragraph::new(lines)
        .alignment(alignment)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

/// A box `percent_x` wide and `height` rows tall centered in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = ((area.width as u32 * percent_x as u32 / 100) as u16)
        .max(30)
        .min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
