//! GitOps against real temporary repositories.

use gitcat::git::VersionControl;
use gitcat::Error;

use crate::fixtures::TestRepo;

#[test]
fn test_clean_repo_has_no_changes() {
    let repo = TestRepo::new();
    let git = repo.git_ops().unwrap();
    assert!(!git.has_changes().unwrap());
    assert_eq!(git.staged_diff().unwrap(), "");
}

#[test]
fn test_untracked_file_counts_as_change() {
    let repo = TestRepo::new();
    repo.write("notes/todo.txt", "buy milk\n");
    let git = repo.git_ops().unwrap();
    assert!(git.has_changes().unwrap());
    assert_eq!(git.staged_diff().unwrap(), "");
}

#[test]
fn test_staged_diff_contains_patch() {
    let repo = TestRepo::new();
    repo.write("src/login.rs", "fn login() {}\n");
    repo.stage("src/login.rs");

    let diff = repo.git_ops().unwrap().staged_diff().unwrap();
    assert!(diff.contains("src/login.rs"), "diff was: {}", diff);
    assert!(diff.contains("+fn login() {}"), "diff was: {}", diff);
}

#[test]
fn test_stage_all_includes_deletions() {
    let repo = TestRepo::new();
    repo.write("new.txt", "new\n");
    repo.remove("README.md");

    let git = repo.git_ops().unwrap();
    git.stage_all().unwrap();

    assert_eq!(git.count_staged_files(), 2);
    let diff = git.staged_diff().unwrap();
    assert!(diff.contains("-# Test Repository"));
    assert!(diff.contains("+new"));
}

#[test]
fn test_commit_runs_git_commit() {
    let repo = TestRepo::new();
    repo.write("a.txt", "a\n");
    let git = repo.git_ops().unwrap();
    git.stage_all().unwrap();
    git.commit("feat(auth): add login").unwrap();

    assert_eq!(repo.last_subject(), "feat(auth): add login");
    assert_eq!(repo.commit_count(), 2);
    assert!(!git.has_changes().unwrap());
}

#[test]
fn test_commit_with_nothing_staged_fails() {
    let repo = TestRepo::new();
    let err = repo.git_ops().unwrap().commit("chore: nothing").unwrap_err();
    match err {
        Error::GitCommand(msg) => assert!(msg.starts_with("git commit failed: "), "{}", msg),
        other => panic!("expected GitCommand, got {:?}", other),
    }
}

#[test]
fn test_current_branch_and_checkout() {
    let repo = TestRepo::new();
    let git = repo.git_ops().unwrap();
    assert_eq!(git.current_branch().unwrap(), "main");

    git.create_and_checkout_branch("feature/login").unwrap();
    assert_eq!(git.current_branch().unwrap(), "feature/login");
}

#[test]
fn test_checkout_existing_branch_fails() {
    let repo = TestRepo::new();
    let git = repo.git_ops().unwrap();
    git.create_and_checkout_branch("feature/login").unwrap();

    let err = git.create_and_checkout_branch("feature/login").unwrap_err();
    assert!(err.to_string().starts_with("Failed to create branch: "));
}

#[test]
fn test_user_name_from_config() {
    let repo = TestRepo::new();
    assert_eq!(
        repo.git_ops().unwrap().user_name().as_deref(),
        Some("Test User")
    );
}

#[test]
fn test_missing_origin_is_forge_error() {
    let repo = TestRepo::new();
    let err = repo.git_ops().unwrap().origin_url().unwrap_err();
    assert!(matches!(err, Error::Forge(_)));
    assert!(err.to_string().starts_with("failed to get origin URL"));
}

#[test]
fn test_push_without_upstream_is_distinguished() {
    let repo = TestRepo::new().with_bare_origin();
    repo.git(&["config", "push.default", "simple"]);
    repo.git(&["config", "push.autoSetupRemote", "false"]);
    let git = repo.git_ops().unwrap();

    let err = git.push().unwrap_err();
    assert!(matches!(err, Error::NoUpstream(_)), "got {:?}", err);

    git.push_set_upstream("main").unwrap();
    git.push().unwrap();
    assert!(git.origin_url().unwrap().ends_with("origin.git"));
}

#[test]
fn test_branch_log_lists_commits_not_on_default_branch() {
    let repo = TestRepo::new().with_bare_origin();
    let git = repo.git_ops().unwrap();
    git.push_set_upstream("main").unwrap();

    git.create_and_checkout_branch("feature/login").unwrap();
    repo.write("login.rs", "fn login() {}\n");
    git.stage_all().unwrap();
    git.commit("feat(auth): add login\n\nAdds the login handler.").unwrap();

    let log = git.branch_log("feature/login").unwrap();
    assert!(log.contains("feat(auth): add login"), "log was: {}", log);
    assert!(log.contains("Adds the login handler."));
    assert!(!log.contains("Initial commit"));
}

#[test]
fn test_branch_log_requires_origin() {
    let repo = TestRepo::new();
    let err = repo.git_ops().unwrap().branch_log("main").unwrap_err();
    assert!(err.to_string().starts_with("failed to get remote info"));
}
