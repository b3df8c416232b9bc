use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};
use crossterm::event::{self, Event};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::forge::Forge;
use crate::git::VersionControl;
use crate::llm::prompt::{commit_prompt, pr_prompt};
use crate::llm::{
    GenerationError, GenerationRequest, TextGenerator, COMMIT_MAX_TOKENS, PR_MAX_TOKENS,
};
use crate::render::RenderState;
use crate::tea::{init, update, Call, CallResult, Command, Message, Session};
use crate::util::blocking;
use crate::{glog, glog_debug, glog_warn, Error, Result};

/// The collaborators a session's calls run against.
pub struct Backends {
    pub vcs: Arc<dyn VersionControl>,
    pub forge: Arc<dyn Forge>,
    pub generator: Arc<dyn TextGenerator>,
    pub commit_model: String,
    pub pr_model: String,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub summary: String,
    pub fatal: Option<String>,
}

impl SessionOutcome {
    pub fn of(session: &Session) -> Self {
        Self {
            summary: session.summary(),
            fatal: session.fatal_error.clone(),
        }
    }
}

/// Execute one call and turn its outcome into the message fed back to `update`.
pub async fn perform(backends: &Backends, call: Call) -> Message {
    let kind = call.kind();
    glog_debug!("perform {:?}", kind);
    match run_call(backends, call).await {
        Ok(result) => Message::CallSucceeded(result),
        Err(e) => {
            let failure = e.classify();
            glog_warn!("{:?} failed ({:?}): {}", kind, failure.kind, failure.message);
            Message::CallFailed(kind, failure)
        }
    }
}

async fn run_call(backends: &Backends, call: Call) -> Result<CallResult> {
    let vcs = backends.vcs.clone();
    match call {
        Call::CreateBranch { name } => {
            let branch = name.clone();
            blocking(move || vcs.create_and_checkout_branch(&branch)).await?;
            Ok(CallResult::BranchCreated(name))
        }

        Call::StageAll => {
            let diff = blocking(move || {
                vcs.stage_all()?;
                vcs.staged_diff()
            })
            .await?;
            Ok(CallResult::Staged { diff })
        }

        Call::GenerateCommitMessage {
            diff,
            commit_type,
            scope,
        } => {
            let request = GenerationRequest {
                prompt: commit_prompt(&diff, commit_type.as_str(), &scope),
                model: backends.commit_model.clone(),
                max_tokens: COMMIT_MAX_TOKENS,
            };
            let message = generate(backends.generator.as_ref(), &request).await?;
            Ok(CallResult::CommitMessage(message))
        }

        Call::Commit { message } => {
            let files = blocking(move || {
                let files = vcs.count_staged_files();
                vcs.commit(&message)?;
                Ok(files)
            })
            .await?;
            Ok(CallResult::Committed { files })
        }

        Call::Push => {
            blocking(move || vcs.push()).await?;
            Ok(CallResult::Pushed { upstream: false })
        }

        Call::PushSetUpstream { branch } => {
            blocking(move || vcs.push_set_upstream(&branch)).await?;
            Ok(CallResult::Pushed { upstream: true })
        }

        Call::CheckPrEligibility { branch } => {
            let forge = backends.forge.clone();
            let eligible =
                blocking(move || Ok(pr_eligible(vcs.as_ref(), forge.as_ref(), &branch))).await?;
            Ok(CallResult::PrEligibility(eligible))
        }

        Call::GeneratePrContent { branch } => {
            let log = blocking(move || vcs.branch_log(&branch))
                .await
                .map_err(|e| Error::Generation(GenerationError::Context(e.to_string())))?;
            let request = GenerationRequest {
                prompt: pr_prompt(&log),
                model: backends.pr_model.clone(),
                max_tokens: PR_MAX_TOKENS,
            };
            let content = generate(backends.generator.as_ref(), &request).await?;
            Ok(CallResult::PrContent(content))
        }

        Call::CreatePr { title, body } => {
            let forge = backends.forge.clone();
            blocking(move || forge.create_pr(&title, &body)).await?;
            Ok(CallResult::PrCreated)
        }
    }
}

/// Run one generation bounded by the backend's timeout.
async fn generate(generator: &dyn TextGenerator, request: &GenerationRequest) -> Result<String> {
    let limit = generator.timeout();
    glog_debug!(
        "generate via {} model={} prompt_len={}",
        generator.name(),
        request.model,
        request.prompt.len()
    );
    match tokio::time::timeout(limit, generator.generate(request)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(GenerationError::Timeout(limit).into()),
    }
}

/// Origin is a supported forge and there is no open PR for `branch`.
///
/// Every negative or failed check yields `false`.
pub fn pr_eligible(vcs: &dyn VersionControl, forge: &dyn Forge, branch: &str) -> bool {
    let origin = match vcs.origin_url() {
        Ok(url) => url,
        Err(e) => {
            glog!("No PR offered: {}", e);
            return false;
        }
    };
    if let Err(e) = forge.check_origin(&origin) {
        glog!("No PR offered: {}", e);
        return false;
    }
    if forge.has_existing_pr(branch) {
        glog!("No PR offered: {} already has an open PR", branch);
        return false;
    }
    true
}

pub struct LogicThread;

impl LogicThread {
    pub fn run(
        session: Session,
        backends: Backends,
        state_tx: Sender<RenderState>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<SessionOutcome> {
        let runtime = Runtime::new()?;
        let outcome = runtime.block_on(Self::run_async(
            session,
            Arc::new(backends),
            state_tx,
            shutdown,
        ));
        // An abandoned call must not hold up exit.
        runtime.shutdown_background();
        outcome
    }

    async fn run_async(
        mut session: Session,
        backends: Arc<Backends>,
        state_tx: Sender<RenderState>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<SessionOutcome> {
        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Message>();
        let cancel = CancellationToken::new();

        let initial = init(&mut session);
        let mut quit = execute_commands(initial, &backends, &msg_tx, &cancel);
        send_state(&state_tx, &mut session);

        while !quit {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Keyboard input (priority)
            while !quit && event::poll(Duration::ZERO)? {
                let msg = match event::read()? {
                    Event::Key(key) => Message::Key(key),
                    Event::Resize(w, h) => Message::Resize(w, h),
                    _ => continue,
                };
                let cmds = update(&mut session, msg);
                quit = execute_commands(cmds, &backends, &msg_tx, &cancel);
            }

            // Call outcomes
            while !quit {
                let Ok(msg) = msg_rx.try_recv() else { break };
                let cmds = update(&mut session, msg);
                quit = execute_commands(cmds, &backends, &msg_tx, &cancel);
            }

            send_state(&state_tx, &mut session);

            if !quit {
                tokio::time::sleep(Duration::from_micros(500)).await;
            }
        }

        cancel.cancel();
        shutdown.store(true, Ordering::Relaxed);
        glog!(
            "Session ended in {}: {}",
            session.phase.name(),
            session.summary()
        );
        Ok(SessionOutcome::of(&session))
    }
}

/// Spawn every call; returns true on `Quit`.
fn execute_commands(
    cmds: Vec<Command>,
    backends: &Arc<Backends>,
    msg_tx: &mpsc::UnboundedSender<Message>,
    cancel: &CancellationToken,
) -> bool {
    for cmd in cmds {
        match cmd {
            Command::Call(call) => {
                let kind = call.kind();
                let backends = backends.clone();
                let tx = msg_tx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            glog_debug!("{:?} cancelled", kind);
                        }
                        msg = perform(&backends, call) => {
                            let _ = tx.send(msg);
                        }
                    }
                });
            }
            Command::Quit => {
                glog_debug!("Command::Quit");
                return true;
            }
        }
    }
    false
}

/// Stays dirty while the render thread still holds the previous snapshot.
fn send_state(state_tx: &Sender<RenderState>, session: &mut Session) {
    if !session.dirty {
        return;
    }
    match state_tx.try_send(session.snapshot()) {
        Ok(()) | Err(TrySendError::Disconnected(_)) => session.dirty = false,
        Err(TrySendError::Full(_)) => {}
    }
}
