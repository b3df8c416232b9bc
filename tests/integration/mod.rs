//! Integration test suite for gitcat.
//!
//! These tests exercise the commit workflow from the first key press to the
//! exit summary, and the git plumbing against real repositories.
//!
//! # Test Categories
//!
//! - `workflow_e2e`: Full sessions driven through keys and scripted calls
//! - `git_ops`: `GitOps` against temporary repositories and bare remotes
//!
//! # CI Compatibility
//!
//! Generation and PR creation use scripted collaborators, so no network access
//! or `gh` authentication is needed. The git tests need a `git` binary.


mod git_ops;
mod workflow_e2e;
