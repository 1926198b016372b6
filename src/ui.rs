//! TUI module using ratatui.
//!
//! One screen: a URL input, a summary mode toggle, and a result area that shows either the
//! summary card, an error card, or a progress line. The summary request blocks the event loop
//! while it runs; there is nothing else to do in the meantime.

use crate::config::Config;
use crate::pipeline::{Pipeline, PipelineError, UserMessage};
use crate::summary::{SummaryMode, SummaryResult};
use crate::validate::validate_url;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Paragraph, Wrap};
use ratatui::{DefaultTerminal, Frame};
use std::io;

/// What the result area currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Working,
    Done(SummaryResult),
    Failed(UserMessage),
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Submit,
    Quit,
}

/// Screen state
#[derive(Debug)]
pub struct App {
    pub input: String,
    pub mode: SummaryMode,
    pub status: Status,
    pub show_preview: bool,
    scroll: u16,
}

impl Default for App {
    fn default() -> Self {
        Self {
            input: String::new(),
            mode: SummaryMode::OneLine,
            status: Status::Idle,
            show_preview: false,
            scroll: 0,
        }
    }
}

impl App {
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if ctrl => Action::Quit,
            KeyCode::Char('p') if ctrl => {
                self.show_preview = !self.show_preview;
                Action::None
            }
            KeyCode::Char('u') if ctrl => {
                self.input.clear();
                Action::None
            }
            KeyCode::Enter if self.status != Status::Working => Action::Submit,
            KeyCode::Tab | KeyCode::BackTab => {
                self.mode = self.mode.toggle();
                Action::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                Action::None
            }
            KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
                Action::None
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                Action::None
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                Action::None
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                Action::None
            }
            _ => Action::None,
        }
    }

    /// Record the outcome of a request
    pub fn finish(&mut self, outcome: Result<SummaryResult, PipelineError>) {
        self.scroll = 0;
        self.status = match outcome {
            Ok(result) => Status::Done(result),
            Err(e) => Status::Failed(e.user_message()),
        };
    }

    fn fail(&mut self, message: UserMessage) {
        self.scroll = 0;
        self.status = Status::Failed(message);
    }

    pub fn render(&self, frame: &mut Frame) {
        let [header, input, mode, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("precis", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  summarise any article"),
            ])),
            header,
        );

        frame.render_widget(
            Paragraph::new(self.input.as_str()).block(Block::bordered().title(" Paste URL ")),
            input,
        );
        let cursor_x = input.x + 1 + self.input.chars().count() as u16;
        frame.set_cursor_position(Position::new(
            cursor_x.min(input.right().saturating_sub(2)),
            input.y + 1,
        ));

        frame.render_widget(Paragraph::new(self.mode_line()), mode);
        self.render_body(frame, body);

        frame.render_widget(
            Paragraph::new(
                "Enter summarise · Tab mode · Ctrl-P preview · ↑/↓ scroll · Ctrl-U clear · Esc quit",
            )
            .style(Style::default().fg(Color::DarkGray)),
            footer,
        );
    }

    fn mode_line(&self) -> Line<'static> {
        let option = |mode: SummaryMode| {
            let marker = if self.mode == mode { "(•) " } else { "( ) " };
            let style = if self.mode == mode {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            Span::styled(format!("{marker}{}", mode.label()), style)
        };
        Line::from(vec![
            Span::raw(" "),
            option(SummaryMode::OneLine),
            Span::raw("   "),
            option(SummaryMode::Detailed),
        ])
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        match &self.status {
            Status::Idle => frame.render_widget(
                Paragraph::new("Paste a blog post or article URL and press Enter.")
                    .block(Block::bordered()),
                area,
            ),
            Status::Working => frame.render_widget(
                Paragraph::new("Fetching content and generating summary...")
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::bordered()),
                area,
            ),
            Status::Failed(message) => {
                let mut lines = vec![
                    Line::styled(
                        message.headline,
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                    Line::raw(message.message),
                ];
                if let Some(detail) = &message.detail {
                    lines.push(Line::raw(""));
                    lines.push(Line::styled(
                        detail.clone(),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                frame.render_widget(
                    Paragraph::new(Text::from(lines))
                        .wrap(Wrap { trim: false })
                        .block(Block::bordered().border_style(Style::default().fg(Color::Red))),
                    area,
                );
            }
            Status::Done(result) => {
                let (summary_area, preview_area) = if self.show_preview {
                    let [top, bottom] =
                        Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)])
                            .areas(area);
                    (top, Some(bottom))
                } else {
                    (area, None)
                };

                frame.render_widget(
                    Paragraph::new(result.summary.as_str())
                        .wrap(Wrap { trim: false })
                        .scroll((self.scroll, 0))
                        .block(
                            Block::bordered()
                                .title(format!(" {} ", result.title))
                                .border_style(Style::default().fg(Color::Green)),
                        ),
                    summary_area,
                );

                if let Some(preview_area) = preview_area {
                    frame.render_widget(
                        Paragraph::new(result.content_preview.as_str())
                            .wrap(Wrap { trim: false })
                            .style(Style::default().fg(Color::Gray))
                            .block(Block::bordered().title(" Extracted Content Preview ")),
                        preview_area,
                    );
                }
            }
        }
    }
}

/// Run the interactive shell until the user quits
pub async fn run(config: &Config) -> io::Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, config).await;
    ratatui::restore();
    result
}

async fn event_loop(terminal: &mut DefaultTerminal, config: &Config) -> io::Result<()> {
    let mut app = App::default();

    loop {
        terminal.draw(|frame| app.render(frame))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key) {
            Action::Quit => return Ok(()),
            Action::None => {}
            Action::Submit => {
                // Bad input is reported before any client is built
                if let Err(e) = validate_url(&app.input) {
                    app.fail(PipelineError::from(e).user_message());
                    continue;
                }

                let pipeline = match Pipeline::from_config(config) {
                    Ok(pipeline) => pipeline,
                    Err(e) => {
                        app.fail(UserMessage {
                            headline: "Configuration error",
                            message: "Check precis.toml and your API key environment variables.",
                            detail: Some(e.to_string()),
                        });
                        continue;
                    }
                };

                app.status = Status::Working;
                terminal.draw(|frame| app.render(frame))?;

                let outcome = pipeline.summarize_url(&app.input, app.mode).await;
                app.finish(outcome);
            }
        }
    }
}
