//! Terminal UI rendering for gitcat.
//!
//! - Minimal chrome: no borders, whitespace as structure
//! - Grayscale text with one accent for titles and the selected choice
//! - Step line on top, phase view in the middle, keymap on the bottom line
//!
//! This module renders from RenderState (immutable snapshot) - it never
//! mutates application state.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::git::DIFF_LINE_LIMIT;
use crate::render::{RenderState, Step};
use crate::settings::{SettingsEditor, SettingsPhase};
use crate::tea::Phase;

// Color tokens
const COLOR_TITLE: Color = Color::LightBlue;
const COLOR_SELECTED: Color = Color::LightGreen;
const COLOR_MESSAGE: Color = Color::LightCyan;
const COLOR_WARNING: Color = Color::LightYellow;
const COLOR_ERROR: Color = Color::LightRed;
const COLOR_TEXT_DIMMED: Color = Color::Gray;
const COLOR_TEXT_MUTED: Color = Color::DarkGray;
const COLOR_SEPARATOR: Color = Color::White;

// Step indicator colors
const COLOR_STEP_CURRENT: Color = Color::Cyan;
const COLOR_STEP_COMPLETED: Color = Color::Green;
const COLOR_STEP_PENDING: Color = Color::DarkGray;

// -----------------------------------------------------------------------------
// Context-sensitive keymap
// -----------------------------------------------------------------------------

/// Which keybindings the bottom line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeymapContext {
    Select,
    TextInput { multiline: bool },
    /// A call is in flight; only quit is accepted.
    Busy,
    Finished,
}

impl KeymapContext {
    pub fn from_render_state(state: &RenderState) -> Self {
        if state.busy.is_some() {
            KeymapContext::Busy
        } else if state.phase.is_terminal() {
            KeymapContext::Finished
        } else if state.phase.is_text_input() {
            KeymapContext::TextInput {
                multiline: state.phase.is_multiline(),
            }
        } else {
            KeymapContext::Select
        }
    }
}

struct Keybinding(&'static str, &'static str);

struct KeybindingGroup(Vec<Keybinding>);

fn keybindings_for_context(ctx: KeymapContext) -> Vec<KeybindingGroup> {
    match ctx {
        KeymapContext::Select => vec![
            KeybindingGroup(vec![
                Keybinding("↑/k", "up"),
                Keybinding("↓/j", "down"),
                Keybinding("Enter", "confirm"),
            ]),
            KeybindingGroup(vec![Keybinding("q", "quit")]),
        ],
        KeymapContext::TextInput { multiline } => {
            let mut edit = vec![Keybinding("Enter", "submit")];
            if multiline {
                edit.push(Keybinding("Alt+Enter", "newline"));
            }
            vec![
                KeybindingGroup(edit),
                KeybindingGroup(vec![Keybinding("Ctrl+C", "quit")]),
            ]
        }
        KeymapContext::Busy => vec![KeybindingGroup(vec![Keybinding("Ctrl+C", "quit")])],
        KeymapContext::Finished => vec![],
    }
}

/// Main render function. Takes an immutable RenderState snapshot.
pub fn draw(frame: &mut Frame, state: &RenderState) {
    let area = frame.area();

    if let Some(ref error) = state.fatal_error {
        render_fatal(frame, error, area);
        return;
    }

    if area.height < 4 {
        render_body(frame, state, area);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    render_step_indicator(frame, chunks[0], state.step());
    render_separator(frame, chunks[1]);
    render_body(frame, state, chunks[2]);
    render_keymap_line(frame, chunks[3], KeymapContext::from_render_state(state));
}

fn render_fatal(frame: &mut Frame, error: &str, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            "Error: ",
            Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD),
        ),
        Span::styled(error.to_string(), Style::default().fg(COLOR_ERROR)),
    ]);
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: false }), area);
}

/// Step indicator with the current step highlighted.
fn render_step_indicator(frame: &mut Frame, area: Rect, step: Option<Step>) {
    let current = step.map(|s| s.index()).unwrap_or(Step::ALL.len());

    let mut spans: Vec<Span> = Vec::new();
    for (i, s) in Step::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" → ", Style::default().fg(COLOR_TEXT_MUTED)));
        }
        let style = if i < current {
            Style::default().fg(COLOR_STEP_COMPLETED)
        } else if i == current {
            Style::default()
                .fg(COLOR_STEP_CURRENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLOR_STEP_PENDING)
        };
        spans.push(Span::styled(s.label(), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_separator(frame: &mut Frame, area: Rect) {
    let solid = "─".repeat(area.width as usize);
    let line = Line::from(Span::styled(solid, Style::default().fg(COLOR_SEPARATOR)));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_keymap_line(frame: &mut Frame, area: Rect, ctx: KeymapContext) {
    let key_style = Style::default().fg(COLOR_TEXT_DIMMED);
    let desc_style = Style::default().fg(COLOR_TEXT_MUTED);
    let sep_style = Style::default().fg(COLOR_TEXT_MUTED);

    let mut spans: Vec<Span> = Vec::new();
    for group in keybindings_for_context(ctx) {
        if group.0.is_empty() {
            continue;
        }
        if !spans.is_empty() {
            spans.push(Span::styled(" │ ", sep_style));
        }
        for (idx, keybinding) in group.0.iter().enumerate() {
            if idx > 0 {
                spans.push(Span::styled(" • ", sep_style));
            }
            spans.push(Span::styled(keybinding.0, key_style));
            spans.push(Span::styled(format!(" {}", keybinding.1), desc_style));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_body(frame: &mut Frame, state: &RenderState, area: Rect) {
    let lines = phase_lines(state);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

/// The lines describing the current phase.
pub fn phase_lines(state: &RenderState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match &state.phase {
        Phase::BranchWarning { cursor } => {
            lines.push(title("⚠️  Warning: You are on a protected branch!"));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("Current branch: {}", state.branch),
                Style::default()
                    .fg(COLOR_WARNING)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::default());
            lines.push(Line::raw(
                "Committing directly to main/master branches is not recommended.",
            ));
            lines.push(Line::raw("Would you like to create a new branch instead?"));
            lines.push(Line::default());
            push_choices(&mut lines, &state.choices, *cursor);
        }
        Phase::BranchInput { input } => {
            lines.push(title("Enter new branch name:"));
            lines.push(Line::default());
            lines.push(hint(format!("Suggested: {}", state.branch_suggestion)));
            lines.push(Line::default());
            lines.push(prompt_line(input));
            lines.push(Line::default());
            lines.push(hint("Tip: Use format like 'feature/description' or 'fix/issue-123'"));
        }
        Phase::BranchCreating { name } => {
            lines.push(title(format!(
                "Creating and switching to branch '{}'...",
                name
            )));
        }
        Phase::Add { cursor } => {
            lines.push(title(
                "No staged changes found. Would you like to add all changes?",
            ));
            lines.push(Line::default());
            push_choices(&mut lines, &state.choices, *cursor);
        }
        Phase::Type { cursor } => {
            lines.push(title("Select commit type:"));
            lines.push(Line::default());
            push_choices(&mut lines, &state.choices, *cursor);
        }
        Phase::Scope { input } => {
            lines.push(title(format!(
                "Enter scope for {} (press enter when done):",
                state.commit_type
            )));
            lines.push(Line::default());
            lines.push(prompt_line(input));
        }
        Phase::Generating => {
            lines.push(title("Generating commit message..."));
        }
        Phase::CommitError { cursor } => {
            push_api_error(
                &mut lines,
                "Failed to generate commit message:",
                state.last_error.as_deref(),
            );
            push_choices(&mut lines, &state.choices, *cursor);
        }
        Phase::ManualInput { message } => {
            if state.large_diff {
                lines.push(title("⚠️  Large diff detected"));
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    format!(
                        "The diff is too large (>{} lines) to send to the API.",
                        DIFF_LINE_LIMIT
                    ),
                    Style::default().fg(COLOR_WARNING),
                )));
            } else {
                lines.push(title("Enter commit message:"));
                lines.push(Line::default());
            }
            lines.push(Line::raw("Please enter your commit message manually:"));
            lines.push(Line::default());
            let header = format!("{}({}): ", state.commit_type, state.scope);
            push_text_block(&mut lines, &format!("{}{}", header, message));
            lines.push(Line::default());
            lines.push(hint("Tip: Follow conventional commits format"));
        }
        Phase::Confirm { message, cursor } => {
            lines.push(title("Generated commit message:"));
            lines.push(Line::default());
            for line in message.lines() {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(COLOR_MESSAGE),
                )));
            }
            lines.push(Line::default());
            lines.push(title("Use this message?"));
            lines.push(Line::default());
            push_choices(&mut lines, &state.choices, *cursor);
        }
        Phase::Edit { message } => {
            lines.push(title("Edit commit message (press enter when done):"));
            lines.push(Line::default());
            push_text_block(&mut lines, message);
        }
        Phase::PushPrompt { cursor } => {
            lines.push(title("✓ Commit created successfully!"));
            lines.push(Line::default());
            lines.push(title("Push to remote?"));
            lines.push(Line::default());
            push_choices(&mut lines, &state.choices, *cursor);
        }
        Phase::UpstreamPrompt { cursor } => {
            lines.push(title("No upstream branch configured."));
            lines.push(Line::default());
            lines.push(title(format!(
                "Set upstream to 'origin/{}' and push?",
                state.branch
            )));
            lines.push(Line::default());
            push_choices(&mut lines, &state.choices, *cursor);
        }
        Phase::PrPrompt { cursor } => {
            lines.push(title("Create a pull request?"));
            lines.push(Line::default());
            push_choices(&mut lines, &state.choices, *cursor);
        }
        Phase::PrGenerating => {
            lines.push(title("Generating PR title and body..."));
        }
        Phase::PrError { cursor } => {
            push_api_error(
                &mut lines,
                "Failed to generate PR content:",
                state.last_error.as_deref(),
            );
            push_choices(&mut lines, &state.choices, *cursor);
        }
        Phase::PrManualTitle { title: text } => {
            lines.push(title("Enter PR title:"));
            lines.push(Line::default());
            lines.push(prompt_line(text));
            lines.push(Line::default());
            lines.push(hint("Tip: Keep it concise and descriptive (max 72 chars)"));
        }
        Phase::PrManualBody { title: text, body } => {
            lines.push(title("Enter PR body:"));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("Title: {}", text),
                Style::default().fg(COLOR_MESSAGE),
            )));
            lines.push(Line::default());
            push_text_block(&mut lines, body);
            lines.push(Line::default());
            lines.push(hint("Tip: Describe your changes, alt+enter for newlines"));
        }
        Phase::PrCreating { .. } | Phase::Done | Phase::Exiting => {
            if !state.summary.is_empty() {
                lines.push(Line::from(Span::styled(
                    state.summary.clone(),
                    Style::default().fg(COLOR_SELECTED),
                )));
            }
        }
    }

    if let Some(label) = state.busy {
        // Generation phases already say what is happening.
        if !matches!(
            state.phase,
            Phase::Generating | Phase::PrGenerating | Phase::BranchCreating { .. }
        ) {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(COLOR_TEXT_DIMMED),
            )));
        }
    }

    lines
}

fn title(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default().fg(COLOR_TITLE).add_modifier(Modifier::BOLD),
    ))
}

fn hint(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default().fg(COLOR_TEXT_MUTED),
    ))
}

fn cursor_span() -> Span<'static> {
    Span::styled(
        "_",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::SLOW_BLINK),
    )
}

fn prompt_line(input: &str) -> Line<'static> {
    Line::from(vec![Span::raw(format!("> {}", input)), cursor_span()])
}

/// Multi-line text with the cursor after the last line.
fn push_text_block(lines: &mut Vec<Line<'static>>, text: &str) {
    let mut rows: Vec<&str> = text.split('\n').collect();
    let last = rows.pop().unwrap_or_default();
    for row in rows {
        lines.push(Line::raw(row.to_string()));
    }
    lines.push(Line::from(vec![Span::raw(last.to_string()), cursor_span()]));
}

fn push_choices(lines: &mut Vec<Line<'static>>, choices: &[String], cursor: usize) {
    for (i, choice) in choices.iter().enumerate() {
        if i == cursor {
            lines.push(Line::from(vec![
                Span::raw("> "),
                Span::styled(
                    choice.clone(),
                    Style::default()
                        .fg(COLOR_SELECTED)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
        } else {
            lines.push(Line::raw(format!("  {}", choice)));
        }
    }
}

fn push_api_error(lines: &mut Vec<Line<'static>>, heading: &str, detail: Option<&str>) {
    lines.push(title("⚠️  API Error"));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        heading.to_string(),
        Style::default().fg(COLOR_ERROR),
    )));
    lines.push(hint(detail.unwrap_or_default().to_string()));
    lines.push(Line::default());
    lines.push(title("What would you like to do?"));
    lines.push(Line::default());
}

// -----------------------------------------------------------------------------
// Settings editor
// -----------------------------------------------------------------------------

pub fn draw_settings(frame: &mut Frame, editor: &SettingsEditor) {
    let area = frame.area();
    let chunks = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).split(area);

    frame.render_widget(
        Paragraph::new(settings_lines(editor)).wrap(Wrap { trim: false }),
        chunks[0],
    );

    let footer = match editor.phase {
        SettingsPhase::Provider { .. } => "1/2/3 or ↑/↓ select • Enter confirm • Esc cancel",
        SettingsPhase::Confirm => "y save • n cancel",
        SettingsPhase::Saved | SettingsPhase::Failed(_) => "any key to exit",
        _ => "Enter confirm (empty keeps current) • Esc cancel",
    };
    frame.render_widget(Paragraph::new(hint(footer)), chunks[1]);
}

pub fn settings_lines(editor: &SettingsEditor) -> Vec<Line<'static>> {
    let mut lines = vec![title("gitcat configuration"), Line::default()];
    let draft = &editor.draft;

    match &editor.phase {
        SettingsPhase::Provider { cursor } => {
            lines.push(title("Select provider:"));
            lines.push(Line::default());
            let labels: Vec<String> = SettingsEditor::PROVIDERS
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{}. {}", i + 1, p))
                .collect();
            push_choices(&mut lines, &labels, *cursor);
        }
        SettingsPhase::CommitModel { input } => {
            lines.push(title("Commit message model:"));
            lines.push(hint(format!("Current: {}", draft.commit_model())));
            lines.push(Line::default());
            lines.push(prompt_line(input));
        }
        SettingsPhase::PrModel { input } => {
            lines.push(title("PR content model:"));
            lines.push(hint(format!("Current: {}", draft.pr_model())));
            lines.push(Line::default());
            lines.push(prompt_line(input));
        }
        SettingsPhase::Endpoint { input } => {
            lines.push(title(format!("{} endpoint:", draft.provider)));
            lines.push(hint(format!("Current: {}", editor.current_endpoint())));
            lines.push(Line::default());
            lines.push(prompt_line(input));
        }
        SettingsPhase::Confirm => {
            lines.push(Line::raw(format!("Provider:      {}", draft.provider)));
            lines.push(Line::raw(format!("Commit model:  {}", draft.commit_model())));
            lines.push(Line::raw(format!("PR model:      {}", draft.pr_model())));
            if let Some(endpoint) = editor.endpoint_label() {
                lines.push(Line::raw(format!("Endpoint:      {}", endpoint)));
            }
            lines.push(Line::default());
            lines.push(title("Save configuration? (y/n)"));
        }
        SettingsPhase::Saved => {
            lines.push(Line::from(Span::styled(
                "✓ Configuration saved",
                Style::default().fg(COLOR_SELECTED),
            )));
        }
        SettingsPhase::Failed(error) => {
            lines.push(Line::from(Span::styled(
                format!("Error saving configuration: {}", error),
                Style::default().fg(COLOR_ERROR),
            )));
        }
        SettingsPhase::Cancelled => {
            lines.push(hint("Cancelled"));
        }
    }

    lines
}
