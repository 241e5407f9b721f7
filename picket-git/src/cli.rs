//! Subprocess implementation of the [`Git`] trait.
//!
//! Every invocation is `git -C <dir> …` so the process working directory
//! never changes. Argument lists are built by the `argv` helpers, which the
//! dry-run decorator reuses to report the exact command it is suppressing.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::backend::{CherryPickOutcome, Git, PendingOp};
use crate::error::GitError;

// ---------------------------------------------------------------------------
// Argument builders
// ---------------------------------------------------------------------------

pub(crate) mod argv {
    use crate::backend::PendingOp;

    pub fn status() -> Vec<String> {
        svec(&["status", "--porcelain"])
    }

    pub fn current_branch() -> Vec<String> {
        svec(&["branch", "--show-current"])
    }

    pub fn local_branches() -> Vec<String> {
        svec(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])
    }

    pub fn verify_rev(rev: &str) -> Vec<String> {
        svec(&["rev-parse", "--verify", "--quiet", rev])
    }

    pub fn git_dir() -> Vec<String> {
        svec(&["rev-parse", "--git-dir"])
    }

    pub fn checkout(branch: &str) -> Vec<String> {
        svec(&["checkout", branch])
    }

    pub fn create_branch(branch: &str) -> Vec<String> {
        svec(&["checkout", "-b", branch])
    }

    pub fn delete_branch(branch: &str) -> Vec<String> {
        svec(&["branch", "-D", branch])
    }

    pub fn fetch_ref(url: &str, reference: &str) -> Vec<String> {
        svec(&["fetch", url, reference])
    }

    pub fn fetch_remote(remote: &str) -> Vec<String> {
        svec(&["fetch", remote])
    }

    pub fn cherry_pick_fetch_head() -> Vec<String> {
        svec(&["cherry-pick", "FETCH_HEAD"])
    }

    pub fn abort(op: PendingOp) -> Vec<String> {
        match op {
            PendingOp::CherryPick => svec(&["cherry-pick", "--abort"]),
            PendingOp::Merge => svec(&["merge", "--abort"]),
            PendingOp::Rebase => svec(&["rebase", "--abort"]),
        }
    }

    pub fn reset_hard(target: Option<&str>) -> Vec<String> {
        match target {
            Some(rev) => svec(&["reset", "--hard", rev]),
            None => svec(&["reset", "--hard"]),
        }
    }

    pub fn clean_untracked() -> Vec<String> {
        svec(&["clean", "-fd"])
    }

    fn svec(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }
}

/// Render the command line a given invocation runs, for logs and dry-run
/// reporting.
pub(crate) fn command_line(dir: Option<&Path>, args: &[String]) -> String {
    match dir {
        Some(d) => format!("git -C {} {}", d.display(), args.join(" ")),
        None => format!("git {}", args.join(" ")),
    }
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

/// Real `git` subprocess driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        GitCli
    }

    fn output(&self, dir: Option<&Path>, args: &[String]) -> Result<Output, GitError> {
        tracing::debug!("run: {}", command_line(dir, args));
        let mut cmd = Command::new("git");
        if let Some(d) = dir {
            cmd.arg("-C").arg(d);
        }
        cmd.args(args);
        Ok(cmd.output()?)
    }

    fn run(&self, dir: &Path, args: &[String]) -> Result<Output, GitError> {
        let out = self.output(Some(dir), args)?;
        if out.status.success() {
            Ok(out)
        } else {
            Err(command_error(dir, args, &out))
        }
    }

    fn run_ok(&self, dir: &Path, args: &[String]) -> Result<(), GitError> {
        self.run(dir, args).map(|_| ())
    }
}

fn command_error(dir: &Path, args: &[String], out: &Output) -> GitError {
    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_owned();
    GitError::Command {
        dir: dir.to_path_buf(),
        args: args.join(" "),
        stderr,
    }
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.to_owned())
        .collect()
}

impl Git for GitCli {
    fn version(&self) -> Result<String, GitError> {
        let args = vec!["--version".to_owned()];
        let out = self.output(None, &args)?;
        if !out.status.success() {
            return Err(command_error(Path::new("."), &args, &out));
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_owned())
    }

    fn is_work_tree(&self, dir: &Path) -> bool {
        Command::new("git")
            .args(["rev-parse", "--is-inside-work-tree"])
            .current_dir(dir)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn status_lines(&self, dir: &Path) -> Result<Vec<String>, GitError> {
        let out = self.run(dir, &argv::status())?;
        Ok(stdout_lines(&out))
    }

    fn current_branch(&self, dir: &Path) -> Result<Option<String>, GitError> {
        let out = self.run(dir, &argv::current_branch())?;
        let name = String::from_utf8_lossy(&out.stdout).trim().to_owned();
        Ok(if name.is_empty() { None } else { Some(name) })
    }

    fn branch_exists(&self, dir: &Path, name: &str) -> Result<bool, GitError> {
        let args = argv::verify_rev(&format!("refs/heads/{name}"));
        let out = self.output(Some(dir), &args)?;
        Ok(out.status.success())
    }

    fn local_branches(&self, dir: &Path) -> Result<Vec<String>, GitError> {
        let out = self.run(dir, &argv::local_branches())?;
        Ok(stdout_lines(&out))
    }

    fn pending_operation(&self, dir: &Path) -> Result<Option<PendingOp>, GitError> {
        let out = self.run(dir, &argv::git_dir())?;
        let raw = String::from_utf8_lossy(&out.stdout).trim().to_owned();
        let git_dir = {
            let p = PathBuf::from(raw);
            if p.is_absolute() {
                p
            } else {
                dir.join(p)
            }
        };

        if git_dir.join("CHERRY_PICK_HEAD").exists() {
            return Ok(Some(PendingOp::CherryPick));
        }
        if git_dir.join("MERGE_HEAD").exists() {
            return Ok(Some(PendingOp::Merge));
        }
        if git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists() {
            return Ok(Some(PendingOp::Rebase));
        }
        Ok(None)
    }

    fn rev_parse(&self, dir: &Path, rev: &str) -> Result<Option<String>, GitError> {
        let out = self.output(Some(dir), &argv::verify_rev(rev))?;
        if !out.status.success() {
            return Ok(None);
        }
        let sha = String::from_utf8_lossy(&out.stdout).trim().to_owned();
        Ok(if sha.is_empty() { None } else { Some(sha) })
    }

    fn checkout(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        self.run_ok(dir, &argv::checkout(branch))
    }

    fn create_branch(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        self.run_ok(dir, &argv::create_branch(branch))
    }

    fn delete_branch(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        self.run_ok(dir, &argv::delete_branch(branch))
    }

    fn fetch_ref(&self, dir: &Path, url: &str, reference: &str) -> Result<(), GitError> {
        self.run_ok(dir, &argv::fetch_ref(url, reference))
    }

    fn fetch_remote(&self, dir: &Path, remote: &str) -> Result<(), GitError> {
        self.run_ok(dir, &argv::fetch_remote(remote))
    }

    fn cherry_pick_fetch_head(&self, dir: &Path) -> Result<CherryPickOutcome, GitError> {
        let args = argv::cherry_pick_fetch_head();

        // A pick attempted while another sequencer operation is pending would
        // fail with that operation's unmerged paths still in the tree; check
        // first so the conflict report below only ever describes this pick.
        if let Some(op) = self.pending_operation(dir)? {
            return Err(GitError::Command {
                dir: dir.to_path_buf(),
                args: args.join(" "),
                stderr: format!("a {op} is already in progress"),
            });
        }

        let out = self.output(Some(dir), &args)?;
        if out.status.success() {
            return Ok(CherryPickOutcome::Applied);
        }

        // Distinguish a content conflict from other failures by asking for
        // unmerged paths; a conflicted pick leaves them behind. When that
        // query fails too, the pick's own error is the one worth reporting.
        let files = self
            .run(
                dir,
                &["diff", "--name-only", "--diff-filter=U"]
                    .iter()
                    .map(|s| (*s).to_owned())
                    .collect::<Vec<_>>(),
            )
            .map(|conflicts| stdout_lines(&conflicts))
            .unwrap_or_default();
        if files.is_empty() {
            Err(command_error(dir, &args, &out))
        } else {
            Ok(CherryPickOutcome::Conflict { files })
        }
    }

    fn abort_operation(&self, dir: &Path, op: PendingOp) -> Result<(), GitError> {
        self.run_ok(dir, &argv::abort(op))
    }

    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<(), GitError> {
        self.run_ok(dir, &argv::reset_hard(target))
    }

    fn clean_untracked(&self, dir: &Path) -> Result<(), GitError> {
        self.run_ok(dir, &argv::clean_untracked())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_builders_render_expected_commands() {
        assert_eq!(argv::checkout("master").join(" "), "checkout master");
        assert_eq!(
            argv::create_branch("picket/patches").join(" "),
            "checkout -b picket/patches"
        );
        assert_eq!(argv::delete_branch("old").join(" "), "branch -D old");
        assert_eq!(
            argv::fetch_ref("ssh://host:29418/p", "refs/changes/35/850035/3").join(" "),
            "fetch ssh://host:29418/p refs/changes/35/850035/3"
        );
        assert_eq!(
            argv::cherry_pick_fetch_head().join(" "),
            "cherry-pick FETCH_HEAD"
        );
        assert_eq!(
            argv::abort(PendingOp::CherryPick).join(" "),
            "cherry-pick --abort"
        );
        assert_eq!(argv::reset_hard(None).join(" "), "reset --hard");
        assert_eq!(
            argv::reset_hard(Some("origin/master")).join(" "),
            "reset --hard origin/master"
        );
        assert_eq!(argv::clean_untracked().join(" "), "clean -fd");
    }

    #[test]
    fn command_line_includes_directory() {
        let line = command_line(Some(Path::new("/srv/widget")), &argv::status());
        assert_eq!(line, "git -C /srv/widget status --porcelain");
        assert_eq!(
            command_line(None, &["--version".to_owned()]),
            "git --version"
        );
    }
}
