//! End-to-end workflow tests.
//!
//! Each test drives a session with key presses while the calls run against
//! scripted collaborators, then checks what was committed, pushed and opened.

use crossterm::event::{KeyCode, KeyModifiers};

use gitcat::llm::GenerationError;
use gitcat::tea::{CallKind, Phase, Session};

use crate::fixtures::{FakeForge, FakeVcs, Harness, PushBehavior, Reply, ScriptedGenerator};

const LOGIN_DIFF: &str = "diff --git a/src/login.rs b/src/login.rs\n+fn login() {}\n";

/// Given staged changes on main
/// When the user continues on main, picks feat, scope auth and accepts the message
/// Then one commit is made and the summary names main
#[tokio::test]
async fn test_feat_auth_commit_on_main() {
    let mut h = Harness::commit_session(
        FakeVcs::new("main").with_staged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Text("feat(auth): add login")]),
    )
    .await;
    assert_eq!(h.session.phase, Phase::BranchWarning { cursor: 0 });

    h.down().await;
    h.enter().await;
    assert_eq!(h.session.phase, Phase::Type { cursor: 0 });

    h.enter().await;
    h.type_text("auth").await;
    h.enter().await;
    assert_eq!(
        h.session.phase,
        Phase::Confirm {
            message: "feat(auth): add login".to_string(),
            cursor: 0
        }
    );

    h.enter().await;
    assert_eq!(h.session.phase, Phase::PushPrompt { cursor: 1 });

    // Default choice skips the push.
    h.enter().await;
    assert!(h.quit);
    assert_eq!(h.vcs.commits(), vec!["feat(auth): add login".to_string()]);
    assert_eq!(h.summary(), "Committed 1 file to branch main");

    let requests = h.generator.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "commit-model");
    assert!(requests[0].prompt.contains("+fn login() {}"));
}

/// Given nothing staged
/// When the user declines to add all changes
/// Then the session ends without a commit
#[tokio::test]
async fn test_declining_add_ends_without_commit() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login").with_unstaged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![]),
    )
    .await;
    assert_eq!(h.session.phase, Phase::Add { cursor: 0 });

    h.down().await;
    h.enter().await;

    assert!(h.quit);
    assert!(h.vcs.commits().is_empty());
    assert!(!h.session.completion.did_commit);
    assert_eq!(h.summary(), "");
}

/// Given nothing staged
/// When the user accepts staging
/// Then the refreshed diff is what the generator sees
#[tokio::test]
async fn test_staging_refreshes_diff() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login").with_unstaged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Text("feat: add login")]),
    )
    .await;

    h.enter().await;
    assert_eq!(h.session.phase, Phase::Type { cursor: 0 });
    assert_eq!(h.session.diff, LOGIN_DIFF);

    h.enter().await;
    h.enter().await;
    assert!(matches!(h.session.phase, Phase::Confirm { .. }));
    assert_eq!(
        h.calls,
        vec![CallKind::StageAll, CallKind::GenerateCommitMessage]
    );
}

/// Given a generator that never answers
/// When generation times out and the user switches to manual entry
/// Then the manual message starts empty and is committed with the header
#[tokio::test]
async fn test_generation_timeout_then_manual_entry() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login").with_staged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Hang]),
    )
    .await;

    h.enter().await;
    h.type_text("auth").await;
    h.enter().await;

    assert_eq!(h.session.phase, Phase::CommitError { cursor: 0 });
    let error = h.session.last_error.clone().unwrap_or_default();
    assert!(error.contains("timed out"), "last_error was {:?}", error);

    h.down().await;
    h.enter().await;
    assert_eq!(
        h.session.phase,
        Phase::ManualInput {
            message: String::new()
        }
    );

    h.type_text("add login").await;
    h.enter().await;
    assert_eq!(h.vcs.commits(), vec!["feat(auth): add login".to_string()]);
    assert_eq!(h.session.phase, Phase::PushPrompt { cursor: 1 });
}

/// Given a failed generation
/// When the user retries
/// Then the second answer is offered for confirmation
#[tokio::test]
async fn test_retry_after_api_error() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login").with_staged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![
            Reply::Fail(GenerationError::Status {
                status: 529,
                body: "overloaded".to_string(),
            }),
            Reply::Text("fix: handle overload"),
        ]),
    )
    .await;

    h.down().await;
    h.enter().await;
    h.enter().await;
    assert_eq!(h.session.phase, Phase::CommitError { cursor: 0 });
    assert!(h
        .session
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("529")));

    h.enter().await;
    assert_eq!(
        h.session.phase,
        Phase::Confirm {
            message: "fix: handle overload".to_string(),
            cursor: 0
        }
    );
    assert!(h.session.last_error.is_none());
}

/// Given a diff over the generation limit
/// When the scope is submitted
/// Then manual entry opens without calling the generator
#[tokio::test]
async fn test_large_diff_goes_to_manual_input() {
    let large = "+line\n".repeat(1200);
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/big").with_staged(&large),
        FakeForge::new(),
        ScriptedGenerator::new(vec![]),
    )
    .await;

    h.enter().await;
    h.type_text("core").await;
    h.enter().await;

    assert_eq!(
        h.session.phase,
        Phase::ManualInput {
            message: String::new()
        }
    );
    assert!(h.generator.requests.lock().unwrap().is_empty());
    assert!(h.session.snapshot().large_diff);
}

/// Given a generated message
/// When the user rejects it and edits the text
/// Then the edited text is committed
#[tokio::test]
async fn test_edit_generated_message() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login").with_staged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Text("feat: add logn")]),
    )
    .await;

    h.enter().await;
    h.enter().await;
    h.down().await;
    h.enter().await;
    assert_eq!(
        h.session.phase,
        Phase::Edit {
            message: "feat: add logn".to_string()
        }
    );

    h.press(KeyCode::Backspace).await;
    h.press(KeyCode::Backspace).await;
    h.type_text("gin").await;
    h.key(KeyCode::Enter, KeyModifiers::ALT).await;
    h.type_text("Body line").await;
    h.enter().await;

    assert_eq!(
        h.vcs.commits(),
        vec!["feat: add login\nBody line".to_string()]
    );
}

/// Given a branch without upstream on a GitHub origin
/// When the user pushes, sets the upstream and accepts the PR offer
/// Then the PR is created from the generated title and body
#[tokio::test]
async fn test_missing_upstream_then_pull_request() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login")
            .with_staged(LOGIN_DIFF)
            .with_push(PushBehavior::NoUpstream),
        FakeForge::new(),
        ScriptedGenerator::new(vec![
            Reply::Text("feat(auth): add login"),
            Reply::Text("Add login\n---BODY---\nAdds the login handler."),
        ]),
    )
    .await;

    h.enter().await;
    h.type_text("auth").await;
    h.enter().await;
    h.enter().await;

    h.press(KeyCode::Up).await;
    h.enter().await;
    assert_eq!(h.session.phase, Phase::UpstreamPrompt { cursor: 0 });

    h.enter().await;
    assert_eq!(h.session.phase, Phase::PrPrompt { cursor: 1 });
    assert_eq!(
        h.vcs.state.lock().unwrap().upstream_pushes,
        vec!["feature/login".to_string()]
    );

    h.press(KeyCode::Up).await;
    h.enter().await;

    assert!(h.quit);
    assert_eq!(
        h.forge.created(),
        vec![(
            "Add login".to_string(),
            "Adds the login handler.".to_string()
        )]
    );
    assert_eq!(
        h.summary(),
        "Committed 1 file to branch feature/login and pushed and created PR"
    );
    assert_eq!(
        h.calls,
        vec![
            CallKind::GenerateCommitMessage,
            CallKind::Commit,
            CallKind::Push,
            CallKind::PushSetUpstream,
            CallKind::CheckPrEligibility,
            CallKind::GeneratePrContent,
            CallKind::CreatePr,
        ]
    );
}

/// Given an existing PR for the branch
/// When the push succeeds
/// Then the session ends without offering a PR
#[tokio::test]
async fn test_existing_pr_skips_offer() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login").with_staged(LOGIN_DIFF),
        FakeForge::with_existing_pr(),
        ScriptedGenerator::new(vec![Reply::Text("feat: add login")]),
    )
    .await;

    h.enter().await;
    h.enter().await;
    h.enter().await;
    h.press(KeyCode::Up).await;
    h.enter().await;

    assert!(h.quit);
    assert_eq!(h.session.phase, Phase::Done);
    assert!(h.forge.created().is_empty());
    assert_eq!(h.summary(), "Committed 1 file to branch feature/login and pushed");
}

/// Given a non-GitHub origin
/// When the push succeeds
/// Then no PR is offered
#[tokio::test]
async fn test_non_github_origin_skips_offer() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login")
            .with_staged(LOGIN_DIFF)
            .with_origin(Some("git@gitlab.com:acme/app.git")),
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Text("feat: add login")]),
    )
    .await;

    h.enter().await;
    h.enter().await;
    h.enter().await;
    h.press(KeyCode::Up).await;
    h.enter().await;

    assert_eq!(h.session.phase, Phase::Done);
    assert!(h.session.completion.did_push);
    assert!(!h.session.completion.did_create_pr);
}

/// Given a remote that rejects the push
/// When the user pushes
/// Then the session ends with the push error
#[tokio::test]
async fn test_rejected_push_is_fatal() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login")
            .with_staged(LOGIN_DIFF)
            .with_push(PushBehavior::Reject),
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Text("feat: add login")]),
    )
    .await;

    h.enter().await;
    h.enter().await;
    h.enter().await;
    h.press(KeyCode::Up).await;
    h.enter().await;

    assert!(h.quit);
    let fatal = h.session.fatal_error.clone().unwrap_or_default();
    assert!(fatal.starts_with("Error pushing: git push failed"), "{}", fatal);
    assert!(h.session.completion.did_commit);
    assert!(!h.session.completion.did_push);
}

/// Given a failing commit hook
/// When the user accepts the message
/// Then the session ends with the commit error and nothing is recorded
#[tokio::test]
async fn test_commit_failure_is_fatal() {
    let vcs = FakeVcs::new("feature/login").with_staged(LOGIN_DIFF);
    vcs.state.lock().unwrap().commit_error = Some("pre-commit hook failed".to_string());
    let mut h = Harness::commit_session(
        vcs,
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Text("feat: add login")]),
    )
    .await;

    h.enter().await;
    h.enter().await;
    h.enter().await;

    assert_eq!(
        h.session.fatal_error.as_deref(),
        Some("Error committing: git commit failed: pre-commit hook failed")
    );
    assert!(!h.session.completion.did_commit);
    assert_eq!(h.summary(), "");
}

/// Given a protected branch
/// When the user creates the suggested branch
/// Then the commit lands on the new branch
#[tokio::test]
async fn test_protected_branch_creates_suggested_branch() {
    let mut h = Harness::commit_session(
        FakeVcs::new("master").with_staged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Text("feat: add login")]),
    )
    .await;

    h.enter().await;
    assert_eq!(
        h.session.phase,
        Phase::BranchInput {
            input: "test-user/feature-2025-01-01".to_string()
        }
    );

    h.enter().await;
    assert_eq!(h.session.phase, Phase::Type { cursor: 0 });
    assert_eq!(h.session.branch, "test-user/feature-2025-01-01");

    h.enter().await;
    h.enter().await;
    h.enter().await;
    h.enter().await;

    assert_eq!(
        h.summary(),
        "Committed 1 file to new branch test-user/feature-2025-01-01"
    );
    assert_eq!(
        h.vcs.state.lock().unwrap().created_branches,
        vec!["test-user/feature-2025-01-01".to_string()]
    );
}

/// Given a protected branch
/// When the user enters a name with a space
/// Then the session ends with the validation error
#[tokio::test]
async fn test_invalid_branch_name_is_fatal() {
    let mut h = Harness::commit_session(
        FakeVcs::new("main").with_staged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![]),
    )
    .await;

    h.enter().await;
    h.type_text(" x").await;
    h.enter().await;

    assert!(h.quit);
    assert!(h
        .session
        .fatal_error
        .as_deref()
        .is_some_and(|e| e.contains("invalid character")));
    assert!(h.vcs.state.lock().unwrap().created_branches.is_empty());
}

/// Given the text phases
/// When the user types q
/// Then it is text, while q quits from selection phases
#[tokio::test]
async fn test_quit_keys_respect_text_phases() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login").with_staged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![]),
    )
    .await;

    h.enter().await;
    h.type_text("qk").await;
    assert_eq!(
        h.session.phase,
        Phase::Scope {
            input: "qk".to_string()
        }
    );
    assert!(!h.quit);

    h.key(KeyCode::Char('c'), KeyModifiers::CONTROL).await;
    assert!(h.quit);
    assert_eq!(h.session.phase, Phase::Exiting);
}

/// Given PR-only mode and a failing generator
/// When the user enters the PR details manually
/// Then the PR is created and the summary names the branch
#[tokio::test]
async fn test_pr_only_manual_entry() {
    let mut h = Harness::start(
        Session::for_pull_request("feature/login".to_string()),
        FakeVcs::new("feature/login"),
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Fail(GenerationError::Request(
            "connection refused".to_string(),
        ))]),
    )
    .await;
    assert_eq!(h.session.phase, Phase::PrError { cursor: 0 });
    assert_eq!(
        h.session.last_error.as_deref(),
        Some("Error making request: connection refused")
    );

    h.down().await;
    h.enter().await;
    h.type_text("Add login").await;
    h.enter().await;
    h.type_text("First line").await;
    h.key(KeyCode::Enter, KeyModifiers::ALT).await;
    h.type_text("Second line").await;
    h.enter().await;

    assert!(h.quit);
    assert_eq!(
        h.forge.created(),
        vec![(
            "Add login".to_string(),
            "First line\nSecond line".to_string()
        )]
    );
    assert_eq!(h.summary(), "Created PR on branch feature/login");
    assert!(h.vcs.commits().is_empty());
}

/// Given PR-only mode
/// When the generated content lacks a body separator
/// Then the whole text becomes the title
#[tokio::test]
async fn test_pr_only_without_separator() {
    let h = Harness::start(
        Session::for_pull_request("feature/login".to_string()),
        FakeVcs::new("feature/login"),
        FakeForge::new(),
        ScriptedGenerator::new(vec![Reply::Text("Add login page")]),
    )
    .await;

    assert!(h.quit);
    assert_eq!(
        h.forge.created(),
        vec![("Add login page".to_string(), String::new())]
    );
    let requests = h.generator.requests.lock().unwrap();
    assert_eq!(requests[0].model, "pr-model");
}

/// Given a PR generation failure
/// When the user skips PR creation
/// Then the session ends with the push recorded and no PR
#[tokio::test]
async fn test_skip_pr_after_error() {
    let mut h = Harness::commit_session(
        FakeVcs::new("feature/login").with_staged(LOGIN_DIFF),
        FakeForge::new(),
        ScriptedGenerator::new(vec![
            Reply::Text("feat: add login"),
            Reply::Fail(GenerationError::EmptyResponse),
        ]),
    )
    .await;

    h.enter().await;
    h.enter().await;
    h.enter().await;
    h.press(KeyCode::Up).await;
    h.enter().await;
    h.press(KeyCode::Up).await;
    h.enter().await;
    assert_eq!(h.session.phase, Phase::PrError { cursor: 0 });

    h.down().await;
    h.down().await;
    h.enter().await;

    assert!(h.quit);
    assert!(h.forge.created().is_empty());
    assert_eq!(h.summary(), "Committed 1 file to branch feature/login and pushed");
}
