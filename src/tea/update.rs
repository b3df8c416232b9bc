//! Pure update function for the commit workflow.
//!
//! `update` takes the session and a message, mutates the session, and returns
//! the commands to execute. All I/O happens via the returned commands.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::{Failure, FailureKind};
use crate::git::{is_diff_too_large, validate_branch_name};
use crate::llm::prompt::{commit_header, parse_pr_content};
use crate::{glog, glog_debug, glog_error, glog_trace, glog_warn};

use super::command::{Call, CallKind, Command};
use super::message::{CallResult, Message};
use super::model::{CommitType, Phase, Session};

/// Commands to run when the session starts. PR-only sessions begin generating immediately.
pub fn init(session: &mut Session) -> Vec<Command> {
    glog!(
        "Session start: phase={} branch={} protected={} needs_staging={} pr_only={}",
        session.phase.name(),
        session.branch,
        session.is_protected_branch,
        session.needs_staging,
        session.pr_only
    );
    let mut cmds = Vec::new();
    if session.pr_only {
        let branch = session.branch.clone();
        dispatch(session, Call::GeneratePrContent { branch }, &mut cmds);
    }
    cmds
}

/// Pure update function: Session + Message → Commands
pub fn update(session: &mut Session, msg: Message) -> Vec<Command> {
    let mut cmds = Vec::new();

    match msg {
        Message::Key(key) => {
            session.dirty = true;
            on_key(session, key, &mut cmds);
        }

        Message::Resize(_, _) => {
            session.dirty = true;
        }

        Message::CallSucceeded(result) => {
            if take_pending(session, result.kind()) {
                session.dirty = true;
                on_success(session, result, &mut cmds);
            }
        }

        Message::CallFailed(kind, failure) => {
            if take_pending(session, kind) {
                session.dirty = true;
                on_failure(session, kind, failure, &mut cmds);
            }
        }
    }

    cmds
}

/// Clear `pending` if it matches `kind`. Outcomes of anything else are stale.
fn take_pending(session: &mut Session, kind: CallKind) -> bool {
    if session.pending == Some(kind) {
        session.pending = None;
        true
    } else {
        glog_warn!(
            "Ignoring stale {:?} outcome (pending={:?})",
            kind,
            session.pending
        );
        false
    }
}

fn set_phase(session: &mut Session, phase: Phase) {
    if session.phase.name() != phase.name() {
        glog!("phase {} -> {}", session.phase.name(), phase.name());
    }
    session.phase = phase;
}

/// Schedule `call`. Refused while another call is in flight.
fn dispatch(session: &mut Session, call: Call, cmds: &mut Vec<Command>) {
    let kind = call.kind();
    if let Some(pending) = session.pending {
        glog_warn!("Refusing {:?}: {:?} still in flight", kind, pending);
        return;
    }
    glog_debug!("dispatch {:?} from phase {}", kind, session.phase.name());
    session.pending = Some(kind);
    cmds.push(Command::Call(call));
}

fn quit(session: &mut Session, cmds: &mut Vec<Command>) {
    if let Some(kind) = session.pending.take() {
        glog_debug!("Abandoning in-flight {:?}", kind);
    }
    if !session.phase.is_terminal() {
        set_phase(session, Phase::Exiting);
    }
    cmds.push(Command::Quit);
}

fn finish(session: &mut Session, phase: Phase, cmds: &mut Vec<Command>) {
    set_phase(session, phase);
    cmds.push(Command::Quit);
}

fn fail(session: &mut Session, message: String, cmds: &mut Vec<Command>) {
    glog_error!("Session failed in {}: {}", session.phase.name(), message);
    session.fatal_error = Some(message);
    finish(session, Phase::Exiting, cmds);
}

fn is_quit_key(session: &Session, key: &KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }
    !session.phase.is_text_input() && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
}

fn on_key(session: &mut Session, key: KeyEvent, cmds: &mut Vec<Command>) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    if is_quit_key(session, &key) {
        quit(session, cmds);
        return;
    }
    if session.pending.is_some() || session.phase.is_terminal() {
        glog_trace!("key {:?} ignored in {}", key.code, session.phase.name());
        return;
    }

    if session.phase.is_text_input() {
        on_text_key(session, key, cmds);
    } else {
        on_select_key(session, key, cmds);
    }
}

fn on_select_key(session: &mut Session, key: KeyEvent, cmds: &mut Vec<Command>) {
    let len = session.choices().len();
    let Some(cursor) = session.phase.cursor_mut() else {
        return;
    };
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if *cursor + 1 < len {
                *cursor += 1;
            }
        }
        KeyCode::Enter => {
            let choice = *cursor;
            on_select(session, choice, cmds);
        }
        _ => {}
    }
}

fn on_text_key(session: &mut Session, key: KeyEvent, cmds: &mut Vec<Command>) {
    let multiline = session.phase.is_multiline();
    let Some(text) = session.phase.text_mut() else {
        return;
    };
    match key.code {
        KeyCode::Enter if multiline && key.modifiers.contains(KeyModifiers::ALT) => {
            text.push('\n');
        }
        KeyCode::Enter => submit_text(session, cmds),
        KeyCode::Backspace => {
            text.pop();
        }
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            text.push(c);
        }
        _ => {}
    }
}

/// Enter in a selection phase.
fn on_select(session: &mut Session, choice: usize, cmds: &mut Vec<Command>) {
    match session.phase.clone() {
        Phase::BranchWarning { .. } => {
            if choice == 0 {
                let input = session.branch_suggestion.clone();
                set_phase(session, Phase::BranchInput { input });
            } else {
                enter_commit_flow(session);
            }
        }

        Phase::Add { .. } => {
            if choice == 0 {
                dispatch(session, Call::StageAll, cmds);
            } else {
                finish(session, Phase::Exiting, cmds);
            }
        }

        Phase::Type { .. } => {
            session.commit_type = CommitType::ALL[choice.min(CommitType::ALL.len() - 1)];
            set_phase(
                session,
                Phase::Scope {
                    input: String::new(),
                },
            );
        }

        Phase::CommitError { .. } => {
            session.last_error = None;
            if choice == 0 {
                request_commit_message(session, cmds);
            } else {
                set_phase(
                    session,
                    Phase::ManualInput {
                        message: String::new(),
                    },
                );
            }
        }

        Phase::Confirm { message, .. } => {
            if choice == 0 {
                dispatch(session, Call::Commit { message }, cmds);
            } else {
                set_phase(session, Phase::Edit { message });
            }
        }

        Phase::PushPrompt { .. } => {
            if choice == 0 {
                dispatch(session, Call::Push, cmds);
            } else {
                finish(session, Phase::Exiting, cmds);
            }
        }

        Phase::UpstreamPrompt { .. } => {
            if choice == 0 {
                let branch = session.branch.clone();
                dispatch(session, Call::PushSetUpstream { branch }, cmds);
            } else {
                finish(session, Phase::Exiting, cmds);
            }
        }

        Phase::PrPrompt { .. } => {
            if choice == 0 {
                request_pr_content(session, cmds);
            } else {
                finish(session, Phase::Exiting, cmds);
            }
        }

        Phase::PrError { .. } => {
            session.last_error = None;
            match choice {
                0 => request_pr_content(session, cmds),
                1 => set_phase(
                    session,
                    Phase::PrManualTitle {
                        title: String::new(),
                    },
                ),
                _ => finish(session, Phase::Exiting, cmds),
            }
        }

        _ => {}
    }
}

/// Enter in a free-text phase.
fn submit_text(session: &mut Session, cmds: &mut Vec<Command>) {
    match session.phase.clone() {
        Phase::BranchInput { input } => {
            if let Err(e) = validate_branch_name(&input) {
                fail(session, e.to_string(), cmds);
                return;
            }
            set_phase(
                session,
                Phase::BranchCreating {
                    name: input.clone(),
                },
            );
            dispatch(session, Call::CreateBranch { name: input }, cmds);
        }

        Phase::Scope { input } => {
            session.scope = input;
            if is_diff_too_large(&session.diff) {
                glog!("Diff too large for generation, switching to manual entry");
                set_phase(
                    session,
                    Phase::ManualInput {
                        message: String::new(),
                    },
                );
            } else {
                request_commit_message(session, cmds);
            }
        }

        Phase::ManualInput { message } => {
            let header = commit_header(session.commit_type.as_str(), &session.scope);
            let message = format!("{}{}", header, message);
            dispatch(session, Call::Commit { message }, cmds);
        }

        Phase::Edit { message } => {
            dispatch(session, Call::Commit { message }, cmds);
        }

        Phase::PrManualTitle { title } => {
            set_phase(
                session,
                Phase::PrManualBody {
                    title,
                    body: String::new(),
                },
            );
        }

        Phase::PrManualBody { title, body } => start_pr(session, title, body, cmds),

        _ => {}
    }
}

fn on_success(session: &mut Session, result: CallResult, cmds: &mut Vec<Command>) {
    glog_debug!("{:?} succeeded in {}", result.kind(), session.phase.name());
    match result {
        CallResult::BranchCreated(name) => {
            session.completion.record_branch(&name);
            session.branch = name;
            enter_commit_flow(session);
        }

        CallResult::Staged { diff } => {
            session.diff = diff;
            set_phase(session, Phase::Type { cursor: 0 });
        }

        CallResult::CommitMessage(message) => {
            set_phase(session, Phase::Confirm { message, cursor: 0 });
        }

        CallResult::Committed { files } => {
            session.completion.record_commit(files);
            set_phase(session, Phase::PushPrompt { cursor: 1 });
        }

        CallResult::Pushed { .. } => {
            session.completion.record_push();
            let branch = session.branch.clone();
            dispatch(session, Call::CheckPrEligibility { branch }, cmds);
        }

        CallResult::PrEligibility(eligible) => {
            if eligible {
                set_phase(session, Phase::PrPrompt { cursor: 1 });
            } else {
                finish(session, Phase::Done, cmds);
            }
        }

        CallResult::PrContent(content) => {
            let (title, body) = parse_pr_content(&content);
            if title.is_empty() {
                session.last_error = Some("Generated PR content has no title".to_string());
                set_phase(session, Phase::PrError { cursor: 0 });
                return;
            }
            start_pr(session, title, body, cmds);
        }

        CallResult::PrCreated => {
            session.completion.record_pr();
            cmds.push(Command::Quit);
        }
    }
}

fn on_failure(session: &mut Session, kind: CallKind, failure: Failure, cmds: &mut Vec<Command>) {
    match (failure.kind, kind) {
        (FailureKind::Retryable, CallKind::GenerateCommitMessage) => {
            glog_warn!("Commit message generation failed: {}", failure.message);
            session.last_error = Some(failure.message);
            set_phase(session, Phase::CommitError { cursor: 0 });
        }

        (FailureKind::Retryable, CallKind::GeneratePrContent) => {
            glog_warn!("PR content generation failed: {}", failure.message);
            session.last_error = Some(failure.message);
            set_phase(session, Phase::PrError { cursor: 0 });
        }

        (FailureKind::MissingUpstream, CallKind::Push) => {
            set_phase(session, Phase::UpstreamPrompt { cursor: 0 });
        }

        _ => {
            let message = match kind.failure_label() {
                Some(label) => format!("{}: {}", label, failure.message),
                None => failure.message,
            };
            fail(session, message, cmds);
        }
    }
}

/// After the branch step: staging first if nothing is staged, otherwise type selection.
fn enter_commit_flow(session: &mut Session) {
    let next = if session.needs_staging {
        Phase::Add { cursor: 0 }
    } else {
        Phase::Type { cursor: 0 }
    };
    set_phase(session, next);
}

fn request_commit_message(session: &mut Session, cmds: &mut Vec<Command>) {
    set_phase(session, Phase::Generating);
    let call = Call::GenerateCommitMessage {
        diff: session.diff.clone(),
        commit_type: session.commit_type,
        scope: session.scope.clone(),
    };
    dispatch(session, call, cmds);
}

fn request_pr_content(session: &mut Session, cmds: &mut Vec<Command>) {
    set_phase(session, Phase::PrGenerating);
    let branch = session.branch.clone();
    dispatch(session, Call::GeneratePrContent { branch }, cmds);
}

fn start_pr(session: &mut Session, title: String, body: String, cmds: &mut Vec<Command>) {
    set_phase(
        session,
        Phase::PrCreating {
            title: title.clone(),
            body: body.clone(),
        },
    );
    dispatch(session, Call::CreatePr { title, body }, cmds);
}
