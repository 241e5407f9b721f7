//! Scripted in-memory [`Git`] double.
//!
//! Engine tests drive the same trait the real subprocess driver implements,
//! against a handful of pretend repositories. Every call is recorded with the
//! exact command line [`GitCli`](crate::GitCli) would have run, so tests can
//! assert not just on outcomes but on which git operations were reached.
//!
//! The fake keeps real git's sequencer rule: a cherry-pick attempted while an
//! earlier one is still unresolved fails rather than silently stacking.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::backend::{CherryPickOutcome, Git, PendingOp};
use crate::cli::{argv, command_line};
use crate::error::GitError;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RepoState {
    branches: Vec<String>,
    current: String,
    /// Porcelain status lines. `??` entries are untracked, `UU` unmerged.
    dirty: Vec<String>,
    pending: Option<PendingOp>,
    last_fetched: Option<String>,
    picked: Vec<String>,
    /// Revisions `rev_parse` can resolve, e.g. `origin/master`.
    remote_refs: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct FakeState {
    repos: BTreeMap<PathBuf, RepoState>,
    fetch_failures: BTreeSet<String>,
    conflicts: BTreeMap<String, Vec<String>>,
    unreachable_remotes: BTreeSet<String>,
    log: Vec<String>,
}

impl FakeState {
    fn repo(&self, dir: &Path, args: &[String]) -> Result<&RepoState, GitError> {
        self.repos.get(dir).ok_or_else(|| not_a_repo(dir, args))
    }

    fn repo_mut(&mut self, dir: &Path, args: &[String]) -> Result<&mut RepoState, GitError> {
        self.repos.get_mut(dir).ok_or_else(|| not_a_repo(dir, args))
    }
}

fn not_a_repo(dir: &Path, args: &[String]) -> GitError {
    GitError::Command {
        dir: dir.to_path_buf(),
        args: args.join(" "),
        stderr: "fatal: not a git repository (or any of the parent directories): .git".to_owned(),
    }
}

fn command_failed(dir: &Path, args: &[String], stderr: &str) -> GitError {
    GitError::Command {
        dir: dir.to_path_buf(),
        args: args.join(" "),
        stderr: stderr.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// FakeGit
// ---------------------------------------------------------------------------

/// In-memory [`Git`] implementation scripted per test.
#[derive(Debug, Default)]
pub struct FakeGit {
    state: RefCell<FakeState>,
}

impl FakeGit {
    pub fn new() -> Self {
        FakeGit::default()
    }

    // -- scripting ----------------------------------------------------------

    /// Register a repository at `dir` with `trunk` as its only branch,
    /// checked out and clean.
    pub fn add_repo(&self, dir: &Path, trunk: &str) {
        self.state.borrow_mut().repos.insert(
            dir.to_path_buf(),
            RepoState {
                branches: vec![trunk.to_owned()],
                current: trunk.to_owned(),
                ..RepoState::default()
            },
        );
    }

    pub fn add_branch(&self, dir: &Path, name: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(repo) = state.repos.get_mut(dir) {
            repo.branches.push(name.to_owned());
        }
    }

    /// Replace the repository's porcelain status with `lines`.
    pub fn set_dirty(&self, dir: &Path, lines: &[&str]) {
        let mut state = self.state.borrow_mut();
        if let Some(repo) = state.repos.get_mut(dir) {
            repo.dirty = lines.iter().map(|l| (*l).to_owned()).collect();
        }
    }

    pub fn set_pending(&self, dir: &Path, op: PendingOp) {
        let mut state = self.state.borrow_mut();
        if let Some(repo) = state.repos.get_mut(dir) {
            repo.pending = Some(op);
        }
    }

    /// Make `rev` (e.g. `origin/master`) resolvable to `sha` in `dir`.
    pub fn set_remote_ref(&self, dir: &Path, rev: &str, sha: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(repo) = state.repos.get_mut(dir) {
            repo.remote_refs.insert(rev.to_owned(), sha.to_owned());
        }
    }

    /// Make every `fetch <url> <reference>` of this ref fail.
    pub fn fail_fetch_of(&self, reference: &str) {
        self.state
            .borrow_mut()
            .fetch_failures
            .insert(reference.to_owned());
    }

    /// Make cherry-picking this fetched ref conflict on `files`.
    pub fn conflict_on(&self, reference: &str, files: &[&str]) {
        self.state.borrow_mut().conflicts.insert(
            reference.to_owned(),
            files.iter().map(|f| (*f).to_owned()).collect(),
        );
    }

    /// Make `fetch <remote>` fail in every repository.
    pub fn offline_remote(&self, remote: &str) {
        self.state
            .borrow_mut()
            .unreachable_remotes
            .insert(remote.to_owned());
    }

    // -- inspection ---------------------------------------------------------

    /// Every git command the code under test issued, in order, rendered the
    /// way the real driver would have run it.
    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    pub fn branches_of(&self, dir: &Path) -> Vec<String> {
        self.state
            .borrow()
            .repos
            .get(dir)
            .map(|r| r.branches.clone())
            .unwrap_or_default()
    }

    pub fn current_branch_of(&self, dir: &Path) -> Option<String> {
        self.state
            .borrow()
            .repos
            .get(dir)
            .map(|r| r.current.clone())
    }

    /// Refs applied by successful cherry-picks, in application order.
    pub fn picked_refs(&self, dir: &Path) -> Vec<String> {
        self.state
            .borrow()
            .repos
            .get(dir)
            .map(|r| r.picked.clone())
            .unwrap_or_default()
    }

    pub fn is_clean(&self, dir: &Path) -> bool {
        self.state
            .borrow()
            .repos
            .get(dir)
            .map(|r| r.dirty.is_empty())
            .unwrap_or(false)
    }

    pub fn pending_of(&self, dir: &Path) -> Option<PendingOp> {
        self.state.borrow().repos.get(dir).and_then(|r| r.pending)
    }

    fn record(&self, dir: Option<&Path>, args: &[String]) {
        self.state.borrow_mut().log.push(command_line(dir, args));
    }
}

impl Git for FakeGit {
    fn version(&self) -> Result<String, GitError> {
        let args = vec!["--version".to_owned()];
        self.record(None, &args);
        Ok("git version 2.fake.0".to_owned())
    }

    fn is_work_tree(&self, dir: &Path) -> bool {
        let args = vec!["rev-parse".to_owned(), "--is-inside-work-tree".to_owned()];
        self.record(Some(dir), &args);
        self.state.borrow().repos.contains_key(dir)
    }

    fn status_lines(&self, dir: &Path) -> Result<Vec<String>, GitError> {
        let args = argv::status();
        self.record(Some(dir), &args);
        let state = self.state.borrow();
        Ok(state.repo(dir, &args)?.dirty.clone())
    }

    fn current_branch(&self, dir: &Path) -> Result<Option<String>, GitError> {
        let args = argv::current_branch();
        self.record(Some(dir), &args);
        let state = self.state.borrow();
        Ok(Some(state.repo(dir, &args)?.current.clone()))
    }

    fn branch_exists(&self, dir: &Path, name: &str) -> Result<bool, GitError> {
        let args = argv::verify_rev(&format!("refs/heads/{name}"));
        self.record(Some(dir), &args);
        let state = self.state.borrow();
        Ok(state.repo(dir, &args)?.branches.iter().any(|b| b == name))
    }

    fn local_branches(&self, dir: &Path) -> Result<Vec<String>, GitError> {
        let args = argv::local_branches();
        self.record(Some(dir), &args);
        let state = self.state.borrow();
        let mut names = state.repo(dir, &args)?.branches.clone();
        names.sort();
        Ok(names)
    }

    fn pending_operation(&self, dir: &Path) -> Result<Option<PendingOp>, GitError> {
        let args = argv::git_dir();
        self.record(Some(dir), &args);
        let state = self.state.borrow();
        Ok(state.repo(dir, &args)?.pending)
    }

    fn rev_parse(&self, dir: &Path, rev: &str) -> Result<Option<String>, GitError> {
        let args = argv::verify_rev(rev);
        self.record(Some(dir), &args);
        let state = self.state.borrow();
        Ok(state.repo(dir, &args)?.remote_refs.get(rev).cloned())
    }

    fn checkout(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        let args = argv::checkout(branch);
        self.record(Some(dir), &args);
        let mut state = self.state.borrow_mut();
        let repo = state.repo_mut(dir, &args)?;
        if !repo.branches.iter().any(|b| b == branch) {
            return Err(command_failed(
                dir,
                &args,
                &format!("error: pathspec '{branch}' did not match any file(s) known to git"),
            ));
        }
        repo.current = branch.to_owned();
        Ok(())
    }

    fn create_branch(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        let args = argv::create_branch(branch);
        self.record(Some(dir), &args);
        let mut state = self.state.borrow_mut();
        let repo = state.repo_mut(dir, &args)?;
        if repo.branches.iter().any(|b| b == branch) {
            return Err(command_failed(
                dir,
                &args,
                &format!("fatal: a branch named '{branch}' already exists"),
            ));
        }
        repo.branches.push(branch.to_owned());
        repo.current = branch.to_owned();
        Ok(())
    }

    fn delete_branch(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        let args = argv::delete_branch(branch);
        self.record(Some(dir), &args);
        let mut state = self.state.borrow_mut();
        let repo = state.repo_mut(dir, &args)?;
        if repo.current == branch {
            return Err(command_failed(
                dir,
                &args,
                &format!("error: cannot delete branch '{branch}' used by worktree"),
            ));
        }
        if !repo.branches.iter().any(|b| b == branch) {
            return Err(command_failed(
                dir,
                &args,
                &format!("error: branch '{branch}' not found"),
            ));
        }
        repo.branches.retain(|b| b != branch);
        Ok(())
    }

    fn fetch_ref(&self, dir: &Path, url: &str, reference: &str) -> Result<(), GitError> {
        let args = argv::fetch_ref(url, reference);
        self.record(Some(dir), &args);
        let mut state = self.state.borrow_mut();
        if state.fetch_failures.contains(reference) {
            return Err(command_failed(
                dir,
                &args,
                &format!("fatal: couldn't find remote ref {reference}"),
            ));
        }
        let repo = state.repo_mut(dir, &args)?;
        repo.last_fetched = Some(reference.to_owned());
        Ok(())
    }

    fn fetch_remote(&self, dir: &Path, remote: &str) -> Result<(), GitError> {
        let args = argv::fetch_remote(remote);
        self.record(Some(dir), &args);
        let mut state = self.state.borrow_mut();
        if state.unreachable_remotes.contains(remote) {
            return Err(command_failed(
                dir,
                &args,
                "fatal: could not read from remote repository",
            ));
        }
        state.repo(dir, &args)?;
        Ok(())
    }

    fn cherry_pick_fetch_head(&self, dir: &Path) -> Result<CherryPickOutcome, GitError> {
        let args = argv::cherry_pick_fetch_head();
        self.record(Some(dir), &args);
        let mut state = self.state.borrow_mut();
        let FakeState {
            repos, conflicts, ..
        } = &mut *state;
        let repo = repos.get_mut(dir).ok_or_else(|| not_a_repo(dir, &args))?;

        // Same refusal the real driver reports when the sequencer is busy.
        if let Some(op) = repo.pending {
            return Err(command_failed(
                dir,
                &args,
                &format!("a {op} is already in progress"),
            ));
        }
        let Some(reference) = repo.last_fetched.clone() else {
            return Err(command_failed(dir, &args, "fatal: bad revision 'FETCH_HEAD'"));
        };

        if let Some(files) = conflicts.get(&reference) {
            repo.pending = Some(PendingOp::CherryPick);
            for file in files {
                repo.dirty.push(format!("UU {file}"));
            }
            return Ok(CherryPickOutcome::Conflict {
                files: files.clone(),
            });
        }

        repo.picked.push(reference);
        Ok(CherryPickOutcome::Applied)
    }

    fn abort_operation(&self, dir: &Path, op: PendingOp) -> Result<(), GitError> {
        let args = argv::abort(op);
        self.record(Some(dir), &args);
        let mut state = self.state.borrow_mut();
        let repo = state.repo_mut(dir, &args)?;
        repo.pending = None;
        repo.dirty.retain(|l| !l.starts_with("UU "));
        Ok(())
    }

    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<(), GitError> {
        let args = argv::reset_hard(target);
        self.record(Some(dir), &args);
        let mut state = self.state.borrow_mut();
        let repo = state.repo_mut(dir, &args)?;
        // A hard reset clears tracked modifications but not untracked files.
        repo.dirty.retain(|l| l.starts_with("??"));
        Ok(())
    }

    fn clean_untracked(&self, dir: &Path) -> Result<(), GitError> {
        let args = argv::clean_untracked();
        self.record(Some(dir), &args);
        let mut state = self.state.borrow_mut();
        let repo = state.repo_mut(dir, &args)?;
        repo.dirty.retain(|l| !l.starts_with("??"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
