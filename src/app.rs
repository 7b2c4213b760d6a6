//! Interactive terminal client: terminal lifecycle, event loop and key bindings.

use crate::api::ChatBackend;
use crate::config::Config;
use crate::controller::UiController;
use crate::ui::conversation::{
    get_help_text, ConversationComposer, ConversationResult, ParsedCommand, SlashCommand,
};
use crate::ui::{self, Focus};
use crate::view::ViewModel;
use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;

pub const COMPOSER_PLACEHOLDER: &str = "Type your message here...";

const SCROLL_STEP: usize = 5;

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub struct App<B: ChatBackend> {
    controller: UiController<B>,
    composer: ConversationComposer,
    focus: Focus,
    tick: usize,
    should_quit: bool,
}

impl<B: ChatBackend> App<B> {
    pub fn new(backend: B, config: &Config) -> Self {
        let mut controller = UiController::new(backend);
        controller.set_show_sidebar(config.ui.show_sidebar);
        Self {
            controller,
            composer: ConversationComposer::new(COMPOSER_PLACEHOLDER),
            focus: Focus::Composer,
            tick: 0,
            should_quit: false,
        }
    }

    pub fn controller(&self) -> &UiController<B> {
        &self.controller
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&self, terminal: &mut Tui) -> Result<()> {
        let view = ViewModel::build(&self.controller, Utc::now());
        terminal
            .draw(|frame| ui::draw(frame, &view, &self.composer, self.focus, self.tick))
            .context("Failed to draw frame")?;
        Ok(())
    }

    /// Initial list load
    pub async fn load(&mut self) {
        self.controller.reload().await;
    }

    /// Apply pending stream events and advance the spinner
    pub async fn on_tick(&mut self) {
        self.controller.pump_stream().await;
        self.tick = self.tick.wrapping_add(1);
    }

    async fn run_loop(&mut self, terminal: &mut Tui, tick_rate: Duration) -> Result<()> {
        self.draw(terminal)?;
        self.load().await;

        while !self.should_quit {
            self.draw(terminal)?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key).await;
                }
            }

            self.on_tick().await;
        }

        Ok(())
    }

    /// Route a key press: modal first, then global bindings, then the focused pane.
    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.controller.alert().is_some() || self.controller.info().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.controller.dismiss_alert();
            }
            return;
        }
        if self.controller.pending_delete().is_some() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.controller.confirm_delete().await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.controller.cancel_delete();
                }
                _ => {}
            }
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('n') => {
                    self.controller.create().await;
                    return;
                }
                KeyCode::Char('b') => {
                    self.controller.toggle_sidebar();
                    if !self.controller.show_sidebar() {
                        self.focus = Focus::Composer;
                    }
                    return;
                }
                _ => {}
            }
        }

        match key.code {
            KeyCode::Tab => {
                if self.controller.show_sidebar() {
                    self.focus = self.focus.toggle();
                }
                return;
            }
            KeyCode::PageUp => {
                self.controller.scroll_up(SCROLL_STEP);
                return;
            }
            KeyCode::PageDown => {
                self.controller.scroll_down(SCROLL_STEP);
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Sidebar => self.handle_sidebar_key(key).await,
            Focus::Composer => self.handle_composer_key(key).await,
        }
    }

    async fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.controller.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.controller.move_cursor(1),
            KeyCode::Enter => {
                if let Some(chat_id) = self.controller.conversation_under_cursor() {
                    if self.controller.select(&chat_id).await {
                        self.focus = Focus::Composer;
                    }
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(chat_id) = self.controller.conversation_under_cursor() {
                    self.controller.request_delete(&chat_id);
                }
            }
            KeyCode::Char('n') => {
                self.controller.create().await;
            }
            KeyCode::Char('r') => {
                self.controller.reload().await;
            }
            _ => {}
        }
    }

    async fn handle_composer_key(&mut self, key: KeyEvent) {
        if !self.controller.input_enabled() {
            return;
        }
        match self.composer.handle_key(key) {
            ConversationResult::Submitted(question) => {
                self.controller.send(&question).await;
            }
            ConversationResult::Command(command) => self.run_command(command).await,
            ConversationResult::None => {}
        }
    }

    async fn run_command(&mut self, parsed: ParsedCommand) {
        tracing::debug!(command = parsed.command.command(), "slash command");
        match parsed.command {
            SlashCommand::New => {
                if self.controller.create().await {
                    if let Some(question) = parsed.argument {
                        self.controller.send(&question).await;
                    }
                }
            }
            SlashCommand::Delete => {
                if let Some(chat_id) = self.controller.session().current_chat_id().map(str::to_string) {
                    self.controller.request_delete(&chat_id);
                }
            }
            SlashCommand::Refresh => self.controller.reload().await,
            SlashCommand::Help => self.controller.show_info(get_help_text()),
            SlashCommand::Quit => self.should_quit = true,
        }
    }
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the interactive client until the user quits.
pub async fn run<B: ChatBackend>(backend: B, config: &Config) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(backend, config);

    let result = app
        .run_loop(&mut terminal, Duration::from_millis(config.ui.tick_rate_ms.max(10)))
        .await;

    // Restore even when the loop failed, then report the loop's error first.
    let restored = restore_terminal(&mut terminal);
    result?;
    restored
}
