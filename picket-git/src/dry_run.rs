//! Dry-run decorator for the [`Git`] trait.
//!
//! Reads pass through to the wrapped implementation; every mutating call
//! is journaled as `[dry-run] would run: git -C <dir> …` and reported as
//! having succeeded. Because the engines only see the trait, the same
//! apply and reset code paths run unmodified with zero side effects.

use std::path::Path;

use picket_core::RunJournal;

use crate::backend::{CherryPickOutcome, Git, PendingOp};
use crate::cli::{argv, command_line};
use crate::error::GitError;

/// Wraps any [`Git`] and suppresses its mutations.
pub struct DryRunGit<'a> {
    inner: &'a dyn Git,
    journal: &'a RunJournal,
}

impl<'a> DryRunGit<'a> {
    pub fn new(inner: &'a dyn Git, journal: &'a RunJournal) -> Self {
        DryRunGit { inner, journal }
    }

    fn would_run(&self, dir: &Path, args: &[String]) {
        self.journal.info(format!(
            "[dry-run] would run: {}",
            command_line(Some(dir), args)
        ));
    }
}

impl Git for DryRunGit<'_> {
    fn version(&self) -> Result<String, GitError> {
        self.inner.version()
    }

    fn is_work_tree(&self, dir: &Path) -> bool {
        self.inner.is_work_tree(dir)
    }

    fn status_lines(&self, dir: &Path) -> Result<Vec<String>, GitError> {
        self.inner.status_lines(dir)
    }

    fn current_branch(&self, dir: &Path) -> Result<Option<String>, GitError> {
        self.inner.current_branch(dir)
    }

    fn branch_exists(&self, dir: &Path, name: &str) -> Result<bool, GitError> {
        self.inner.branch_exists(dir, name)
    }

    fn local_branches(&self, dir: &Path) -> Result<Vec<String>, GitError> {
        self.inner.local_branches(dir)
    }

    fn pending_operation(&self, dir: &Path) -> Result<Option<PendingOp>, GitError> {
        self.inner.pending_operation(dir)
    }

    fn rev_parse(&self, dir: &Path, rev: &str) -> Result<Option<String>, GitError> {
        self.inner.rev_parse(dir, rev)
    }

    fn checkout(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        self.would_run(dir, &argv::checkout(branch));
        Ok(())
    }

    fn create_branch(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        self.would_run(dir, &argv::create_branch(branch));
        Ok(())
    }

    fn delete_branch(&self, dir: &Path, branch: &str) -> Result<(), GitError> {
        self.would_run(dir, &argv::delete_branch(branch));
        Ok(())
    }

    fn fetch_ref(&self, dir: &Path, url: &str, reference: &str) -> Result<(), GitError> {
        self.would_run(dir, &argv::fetch_ref(url, reference));
        Ok(())
    }

    fn fetch_remote(&self, dir: &Path, remote: &str) -> Result<(), GitError> {
        self.would_run(dir, &argv::fetch_remote(remote));
        Ok(())
    }

    fn cherry_pick_fetch_head(&self, dir: &Path) -> Result<CherryPickOutcome, GitError> {
        self.would_run(dir, &argv::cherry_pick_fetch_head());
        Ok(CherryPickOutcome::Applied)
    }

    fn abort_operation(&self, dir: &Path, op: PendingOp) -> Result<(), GitError> {
        self.would_run(dir, &argv::abort(op));
        Ok(())
    }

    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<(), GitError> {
        self.would_run(dir, &argv::reset_hard(target));
        Ok(())
    }

    fn clean_untracked(&self, dir: &Path) -> Result<(), GitError> {
        self.would_run(dir, &argv::clean_untracked());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeGit;

    #[test]
    fn mutations_are_journaled_not_executed() {
        let fake = FakeGit::new();
        fake.add_repo(Path::new("/repo"), "master");
        let journal = RunJournal::memory();
        let dry = DryRunGit::new(&fake, &journal);

        dry.create_branch(Path::new("/repo"), "scratch").unwrap();
        dry.fetch_ref(Path::new("/repo"), "ssh://h:29418/p", "refs/changes/35/850035/3")
            .unwrap();
        let outcome = dry.cherry_pick_fetch_head(Path::new("/repo")).unwrap();
        assert_eq!(outcome, CherryPickOutcome::Applied);

        let messages = journal.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0],
            "[dry-run] would run: git -C /repo checkout -b scratch"
        );
        assert_eq!(
            messages[1],
            "[dry-run] would run: git -C /repo fetch ssh://h:29418/p refs/changes/35/850035/3"
        );
        assert_eq!(
            messages[2],
            "[dry-run] would run: git -C /repo cherry-pick FETCH_HEAD"
        );

        // The wrapped implementation saw none of it.
        assert_eq!(fake.branches_of(Path::new("/repo")), vec!["master"]);
        assert!(fake.picked_refs(Path::new("/repo")).is_empty());
    }

    #[test]
    fn reads_pass_through() {
        let fake = FakeGit::new();
        fake.add_repo(Path::new("/repo"), "master");
        fake.set_dirty(Path::new("/repo"), &[" M src/lib.rs"]);
        let journal = RunJournal::memory();
        let dry = DryRunGit::new(&fake, &journal);

        assert!(dry.is_work_tree(Path::new("/repo")));
        assert_eq!(
            dry.current_branch(Path::new("/repo")).unwrap().as_deref(),
            Some("master")
        );
        assert_eq!(dry.status_lines(Path::new("/repo")).unwrap().len(), 1);
        assert!(journal.messages().is_empty(), "reads must not be journaled");
    }
}
