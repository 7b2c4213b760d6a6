//! Conversation list pane

use crate::view::SidebarView;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Shorten `title` to at most `max` characters, ending in an ellipsis when cut
pub fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let kept: String = title.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

pub fn render_sidebar(frame: &mut Frame, area: Rect, sidebar: &SidebarView, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Conversations ")
        .border_style(border_style);

    if let Some(placeholder) = sidebar.placeholder {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            placeholder,
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = sidebar
        .items
        .iter()
        .map(|item| {
            let title_style = if item.active {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(vec![
                Line::from(Span::styled(truncate_title(&item.title, width), title_style)),
                Line::from(Span::styled(
                    item.date.clone(),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("› ");

    let mut state = ListState::default();
    if focused {
        state.select(Some(sidebar.cursor.min(sidebar.items.len().saturating_sub(1))));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
