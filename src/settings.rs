//! Interactive settings editor behind `gitcat config`.
//!
//! A small state machine in the same shape as the commit workflow: key events
//! go in, the editor changes phase, and saving is handed back to the caller as
//! a command so the transitions stay free of I/O.

use std::path::Path;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};

use crate::config::{Config, Provider};
use crate::{glog, glog_debug, glog_error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsPhase {
    Provider { cursor: usize },
    CommitModel { input: String },
    PrModel { input: String },
    /// Ollama or OpenAI-compatible base URL.
    Endpoint { input: String },
    Confirm,
    Saved,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsCommand {
    Save(Config),
    Quit,
}

#[derive(Debug, Clone)]
pub struct SettingsEditor {
    pub phase: SettingsPhase,
    /// The configuration being edited.
    pub draft: Config,
}

impl SettingsEditor {
    pub const PROVIDERS: [Provider; 3] = Provider::ALL;

    pub fn new(config: Config) -> Self {
        let cursor = Self::PROVIDERS
            .iter()
            .position(|p| *p == config.provider)
            .unwrap_or(0);
        Self {
            phase: SettingsPhase::Provider { cursor },
            draft: config,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.phase,
            SettingsPhase::Saved | SettingsPhase::Failed(_) | SettingsPhase::Cancelled
        )
    }

    /// The endpoint currently configured for the draft provider.
    pub fn current_endpoint(&self) -> &str {
        match self.draft.provider {
            Provider::Anthropic => "",
            Provider::Ollama => &self.draft.ollama_url,
            Provider::OpenAi => self.draft.openai_url(),
        }
    }

    pub fn endpoint_label(&self) -> Option<String> {
        match self.draft.provider {
            Provider::Anthropic => None,
            _ => Some(self.current_endpoint().to_string()),
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Vec<SettingsCommand> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        if self.is_finished() {
            return vec![SettingsCommand::Quit];
        }

        let ctrl_c =
            key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl_c || key.code == KeyCode::Esc {
            glog_debug!("Settings editor cancelled");
            self.phase = SettingsPhase::Cancelled;
            return vec![SettingsCommand::Quit];
        }

        match &mut self.phase {
            SettingsPhase::Provider { cursor } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => *cursor = cursor.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => {
                    *cursor = (*cursor + 1).min(Self::PROVIDERS.len() - 1)
                }
                KeyCode::Char(c @ '1'..='3') => {
                    let index = c as usize - '1' as usize;
                    self.choose_provider(Self::PROVIDERS[index]);
                }
                KeyCode::Enter => {
                    let provider = Self::PROVIDERS[*cursor];
                    self.choose_provider(provider);
                }
                _ => {}
            },
            SettingsPhase::CommitModel { input }
            | SettingsPhase::PrModel { input }
            | SettingsPhase::Endpoint { input } => match key.code {
                KeyCode::Char(c) => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Enter => {
                    let value = input.trim().to_string();
                    self.submit(value);
                }
                _ => {}
            },
            SettingsPhase::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.draft.model = self.draft.commit_model().to_string();
                    return vec![SettingsCommand::Save(self.draft.clone())];
                }
                KeyCode::Char('n') => {
                    self.phase = SettingsPhase::Cancelled;
                    return vec![SettingsCommand::Quit];
                }
                _ => {}
            },
            SettingsPhase::Saved | SettingsPhase::Failed(_) | SettingsPhase::Cancelled => {}
        }

        vec![]
    }

    /// Outcome of a `Save` command.
    pub fn on_saved(&mut self, result: std::result::Result<(), String>) {
        self.phase = match result {
            Ok(()) => SettingsPhase::Saved,
            Err(e) => SettingsPhase::Failed(e),
        };
    }

    fn choose_provider(&mut self, provider: Provider) {
        if provider != self.draft.provider {
            self.draft.provider = provider;
            // Models configured for the previous provider do not carry over.
            self.draft.model = provider.default_model().to_string();
            self.draft.commit_model = None;
            self.draft.pr_model = None;
        }
        self.phase = SettingsPhase::CommitModel {
            input: String::new(),
        };
    }

    fn submit(&mut self, value: String) {
        let next = match &self.phase {
            SettingsPhase::CommitModel { .. } => {
                let model = keep_current(value, self.draft.commit_model());
                self.draft.commit_model = Some(model);
                SettingsPhase::PrModel {
                    input: String::new(),
                }
            }
            SettingsPhase::PrModel { .. } => {
                let model = keep_current(value, self.draft.pr_model());
                self.draft.pr_model = Some(model);
                if self.draft.provider == Provider::Anthropic {
                    SettingsPhase::Confirm
                } else {
                    SettingsPhase::Endpoint {
                        input: String::new(),
                    }
                }
            }
            SettingsPhase::Endpoint { .. } => {
                let url = keep_current(value, self.current_endpoint());
                match self.draft.provider {
                    Provider::Ollama => self.draft.ollama_url = url,
                    _ => self.draft.openai_url = Some(url),
                }
                SettingsPhase::Confirm
            }
            _ => return,
        };
        self.phase = next;
    }
}

fn keep_current(value: String, current: &str) -> String {
    if value.is_empty() {
        current.to_string()
    } else {
        value
    }
}

/// Run the editor until it finishes. Returns true when the config was saved.
pub fn run<B: Backend>(terminal: &mut Terminal<B>, config: Config, path: &Path) -> Result<bool> {
    glog!("Settings editor started, config={}", path.display());
    let mut editor = SettingsEditor::new(config);

    loop {
        terminal.draw(|frame| crate::ui::draw_settings(frame, &editor))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };

        for command in editor.on_key(key) {
            match command {
                SettingsCommand::Save(config) => {
                    let result = config.save_to(path).map_err(|e| {
                        glog_error!("Failed to save config: {}", e);
                        e.to_string()
                    });
                    editor.on_saved(result);
                }
                SettingsCommand::Quit => {
                    return Ok(editor.phase == SettingsPhase::Saved);
                }
            }
        }
    }
}
