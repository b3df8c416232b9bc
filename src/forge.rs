//! Pull-request hosting. Only GitHub is supported, through the `gh` CLI.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{glog_debug, glog_warn, Error, Result};

pub trait Forge: Send + Sync {
    /// Fails with [`Error::UnsupportedForge`] unless `origin_url` points at this forge.
    fn check_origin(&self, origin_url: &str) -> Result<()>;
    /// Best-effort: any failure counts as "no PR".
    fn has_existing_pr(&self, branch: &str) -> bool;
    fn create_pr(&self, title: &str, body: &str) -> Result<()>;
}

pub struct GitHubCli {
    gh: PathBuf,
    repo_path: PathBuf,
}

impl GitHubCli {
    pub fn new(repo_path: &Path) -> Self {
        let gh = which::which("gh").unwrap_or_else(|_| PathBuf::from("gh"));
        glog_debug!("GitHubCli using {}", gh.display());
        Self {
            gh,
            repo_path: repo_path.to_path_buf(),
        }
    }

    fn gh(&self, args: &[&str]) -> Result<std::process::Output> {
        Ok(Command::new(&self.gh)
            .args(args)
            .current_dir(&self.repo_path)
            .output()?)
    }
}

impl Forge for GitHubCli {
    fn check_origin(&self, origin_url: &str) -> Result<()> {
        if is_github_url(origin_url) {
            Ok(())
        } else {
            Err(Error::UnsupportedForge(origin_url.to_string()))
        }
    }

    fn has_existing_pr(&self, branch: &str) -> bool {
        match self.gh(&["pr", "list", "--head", branch, "--json", "number"]) {
            Ok(output) if output.status.success() => {
                lists_any_pr(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                glog_warn!(
                    "gh pr list failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                false
            }
            Err(e) => {
                glog_warn!("gh pr list could not run: {}", e);
                false
            }
        }
    }

    fn create_pr(&self, title: &str, body: &str) -> Result<()> {
        glog_debug!("GitHubCli::create_pr title={}", title);
        let output = self.gh(&["pr", "create", "--title", title, "--body", body])?;
        if !output.status.success() {
            return Err(Error::Forge(format!(
                "gh pr create failed: {}{}",
                String::from_utf8_lossy(&output.stderr),
                String::from_utf8_lossy(&output.stdout)
            )));
        }
        Ok(())
    }
}

pub fn is_github_url(url: &str) -> bool {
    url.contains("github.com")
}

/// `gh pr list --json number` prints `[]` when there is nothing.
fn lists_any_pr(output: &str) -> bool {
    let trimmed = output.trim();
    !trimmed.is_empty() && trimmed != "[]"
}
