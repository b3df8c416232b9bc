use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::LazyLock;

use chrono::NaiveDate;
use git2::{DiffFormat, ErrorCode, IndexAddOption, Repository, StatusOptions};
use regex::Regex;

use crate::{glog_debug, glog_trace, glog_warn, Error, Result};

/// Diffs longer than this many lines skip generation and go to manual entry.
pub const DIFF_LINE_LIMIT: usize = 1000;

const PROTECTED_BRANCHES: [&str; 2] = ["main", "master"];
const INVALID_BRANCH_SEQUENCES: [&str; 9] = ["..", "~", "^", ":", "?", "*", "[", "\\", " "];
const LOG_FORMAT: &str = "--pretty=format:%s%n%b%n---";

static NO_UPSTREAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(has no upstream branch|no upstream (branch|configured))").unwrap()
});

static HEAD_BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*HEAD branch:\s*(\S+)\s*$").unwrap());

/// Version-control operations the workflow needs.
///
/// Every method is blocking; callers run them off the async runtime.
pub trait VersionControl: Send + Sync {
    /// Patch text of the staged changes.
    fn staged_diff(&self) -> Result<String>;
    /// Whether the work tree has any change at all, untracked files included.
    fn has_changes(&self) -> Result<bool>;
    /// Stage everything, deletions included.
    fn stage_all(&self) -> Result<()>;
    /// Number of staged files. Zero when it cannot be determined.
    fn count_staged_files(&self) -> usize;
    /// Commit the index, running hooks.
    fn commit(&self, message: &str) -> Result<()>;
    /// Push the current branch. Fails with [`Error::NoUpstream`] when no upstream is set.
    fn push(&self) -> Result<()>;
    fn push_set_upstream(&self, branch: &str) -> Result<()>;
    fn current_branch(&self) -> Result<String>;
    fn create_and_checkout_branch(&self, name: &str) -> Result<()>;
    fn origin_url(&self) -> Result<String>;
    fn user_name(&self) -> Option<String>;
    /// Commit subjects and bodies on `branch` that are not on the remote default branch.
    fn branch_log(&self, branch: &str) -> Result<String>;
}

pub struct GitOps {
    repo_path: PathBuf,
}

impl GitOps {
    pub fn new(repo_path: &Path) -> Result<Self> {
        glog_debug!("GitOps::new path={}", repo_path.display());
        let repo = Repository::discover(repo_path)?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::GitCommand("repository has no working directory".into()))?;
        Ok(Self { repo_path: workdir })
    }

    fn repo(&self) -> Result<Repository> {
        Ok(Repository::open(&self.repo_path)?)
    }

    fn git(&self, args: &[&str]) -> Result<Output> {
        glog_trace!("git {}", args.join(" "));
        Ok(Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()?)
    }

    /// Run git and fail with `"<context>: <output>"` on a non-zero exit.
    fn git_checked(&self, args: &[&str], context: &str) -> Result<String> {
        let output = self.git(args)?;
        if !output.status.success() {
            let err = format!("{}: {}", context, combined_output(&output));
            glog_warn!("{}", err);
            return Err(Error::GitCommand(err));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn staged_diff_of(repo: &Repository) -> Result<git2::Diff<'_>> {
        let head_tree = match repo.head() {
            Ok(head) => Some(head.peel_to_tree()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                None
            }
            Err(e) => return Err(e.into()),
        };
        Ok(repo.diff_tree_to_index(head_tree.as_ref(), None, None)?)
    }

    fn remote_default_branch(&self) -> Result<String> {
        let info = self.git_checked(&["remote", "show", "origin"], "failed to get remote info")?;
        Ok(parse_head_branch(&info).unwrap_or_else(|| "main".to_string()))
    }
}

impl VersionControl for GitOps {
    fn staged_diff(&self) -> Result<String> {
        let repo = self.repo()?;
        let diff = Self::staged_diff_of(&repo)?;
        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if let origin @ ('+' | '-' | ' ') = line.origin() {
                patch.push(origin);
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        glog_debug!("staged diff: {} lines", patch.lines().count());
        Ok(patch)
    }

    fn has_changes(&self) -> Result<bool> {
        let repo = self.repo()?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let statuses = repo.statuses(Some(&mut opts))?;
        Ok(!statuses.is_empty())
    }

    fn stage_all(&self) -> Result<()> {
        glog_debug!("GitOps::stage_all");
        let repo = self.repo()?;
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    fn count_staged_files(&self) -> usize {
        let count = self
            .repo()
            .and_then(|repo| Ok(Self::staged_diff_of(&repo)?.deltas().len()));
        match count {
            Ok(n) => n,
            Err(e) => {
                glog_warn!("Could not count staged files: {}", e);
                0
            }
        }
    }

    fn commit(&self, message: &str) -> Result<()> {
        glog_debug!("GitOps::commit message_len={}", message.len());
        self.git_checked(&["commit", "-m", message], "git commit failed")?;
        Ok(())
    }

    fn push(&self) -> Result<()> {
        glog_debug!("GitOps::push");
        let output = self.git(&["push"])?;
        if output.status.success() {
            return Ok(());
        }
        let text = combined_output(&output);
        if is_missing_upstream(&text) {
            glog_debug!("push rejected: no upstream");
            return Err(Error::NoUpstream(text.trim().to_string()));
        }
        let err = format!("git push failed: {}", text);
        glog_warn!("{}", err);
        Err(Error::GitCommand(err))
    }

    fn push_set_upstream(&self, branch: &str) -> Result<()> {
        glog_debug!("GitOps::push_set_upstream branch={}", branch);
        self.git_checked(
            &["push", "--set-upstream", "origin", branch],
            "git push --set-upstream failed",
        )?;
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        let repo = self.repo()?;
        let name = match repo.head() {
            Ok(head) if head.is_branch() => head.shorthand().unwrap_or_default().to_string(),
            // Detached HEAD has no branch name.
            Ok(_) => String::new(),
            Err(e) if e.code() == ErrorCode::UnbornBranch => repo
                .find_reference("HEAD")?
                .symbolic_target()
                .and_then(|t| t.strip_prefix("refs/heads/"))
                .unwrap_or_default()
                .to_string(),
            Err(e) => return Err(e.into()),
        };
        Ok(name)
    }

    fn create_and_checkout_branch(&self, name: &str) -> Result<()> {
        glog_debug!("GitOps::create_and_checkout_branch name={}", name);
        self.git_checked(&["checkout", "-b", name], "Failed to create branch")?;
        Ok(())
    }

    fn origin_url(&self) -> Result<String> {
        let repo = self.repo()?;
        let remote = repo
            .find_remote("origin")
            .map_err(|e| Error::Forge(format!("failed to get origin URL: {}", e.message())))?;
        Ok(remote.url().unwrap_or_default().trim().to_string())
    }

    fn user_name(&self) -> Option<String> {
        let repo = self.repo().ok()?;
        let config = repo.config().ok()?;
        config
            .get_string("user.name")
            .ok()
            .filter(|name| !name.trim().is_empty())
    }

    fn branch_log(&self, branch: &str) -> Result<String> {
        let default_branch = self.remote_default_branch()?;
        let range = format!("origin/{}..{}", default_branch, branch);
        match self.git_checked(&["log", &range, LOG_FORMAT], "git log failed") {
            Ok(log) => Ok(log),
            Err(e) => {
                glog_debug!("branch log for {} failed ({}), using recent commits", range, e);
                self.git_checked(&["log", "-10", LOG_FORMAT], "failed to get git log")
            }
        }
    }
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stdout));
    text
}

fn is_missing_upstream(output: &str) -> bool {
    NO_UPSTREAM_RE.is_match(output)
}

fn parse_head_branch(remote_info: &str) -> Option<String> {
    HEAD_BRANCH_RE
        .captures(remote_info)
        .map(|c| c[1].to_string())
        .filter(|b| b != "(unknown)")
}

/// Reject names git would refuse or that would be parsed as an option.
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("branch name cannot be empty".to_string()));
    }
    if name.starts_with('-') {
        return Err(Error::Validation(
            "branch name cannot start with a hyphen".to_string(),
        ));
    }
    if let Some(bad) = INVALID_BRANCH_SEQUENCES
        .iter()
        .find(|seq| name.contains(*seq))
    {
        return Err(Error::Validation(format!(
            "branch name contains invalid character: {}",
            bad
        )));
    }
    Ok(())
}

/// `<user>/feature-<YYYY-MM-DD>`, with `dev` when no user name is configured.
pub fn default_branch_name(user_name: Option<&str>, date: NaiveDate) -> String {
    let user = user_name
        .map(|n| n.trim().to_lowercase().replace(' ', "-"))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "dev".to_string());
    format!("{}/feature-{}", user, date.format("%Y-%m-%d"))
}

pub fn is_protected_branch(branch: &str) -> bool {
    PROTECTED_BRANCHES.contains(&branch)
}

pub fn is_diff_too_large(diff: &str) -> bool {
    diff.split('\n').count() > DIFF_LINE_LIMIT
}
