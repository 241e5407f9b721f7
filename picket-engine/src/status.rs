//! Plan-wide status survey, strictly read-only.

use std::path::PathBuf;

use picket_core::PatchPlan;
use picket_git::{Git, GitError, PendingOp};

/// What one plan repository looks like right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    pub path: PathBuf,
    pub project: String,
    pub exists: bool,
    pub is_repo: bool,
    pub branch: Option<String>,
    pub clean: bool,
    pub pending: Option<PendingOp>,
    /// Changes the plan queues for this repository.
    pub queued: usize,
}

/// Observe every plan repository without mutating anything.
pub fn survey(plan: &PatchPlan, git: &dyn Git) -> Result<Vec<RepoStatus>, GitError> {
    let mut rows = Vec::with_capacity(plan.repos.len());
    for task in &plan.repos {
        let queued = task.changes.len();
        let exists = task.path.exists();
        let is_repo = exists && git.is_work_tree(&task.path);
        if !is_repo {
            rows.push(RepoStatus {
                path: task.path.clone(),
                project: task.project.clone(),
                exists,
                is_repo,
                branch: None,
                clean: false,
                pending: None,
                queued,
            });
            continue;
        }

        rows.push(RepoStatus {
            path: task.path.clone(),
            project: task.project.clone(),
            exists,
            is_repo,
            branch: git.current_branch(&task.path)?,
            clean: git.status_lines(&task.path)?.is_empty(),
            pending: git.pending_operation(&task.path)?,
            queued,
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use picket_core::{ChangeId, PlanDefaults, RepoTask};
    use picket_git::fakes::FakeGit;
    use tempfile::TempDir;

    #[test]
    fn survey_reports_one_row_per_plan_entry() {
        let dir = TempDir::new().unwrap();
        let healthy = dir.path().join("healthy");
        let wrecked = dir.path().join("wrecked");
        let plain = dir.path().join("plain");
        let missing = dir.path().join("missing");
        for p in [&healthy, &wrecked, &plain] {
            std::fs::create_dir_all(p).unwrap();
        }

        let fake = FakeGit::new();
        fake.add_repo(&healthy, "master");
        fake.add_repo(&wrecked, "picket/patches");
        fake.set_dirty(&wrecked, &["UU src/api.rs"]);
        fake.set_pending(&wrecked, PendingOp::CherryPick);

        let plan = PatchPlan {
            version: 1,
            defaults: PlanDefaults {
                host: "gerrit.example.com".into(),
                port: 29418,
                user: None,
                branch: None,
                trunk: "master".into(),
                remote: "origin".into(),
            },
            repos: [&healthy, &wrecked, &plain, &missing]
                .iter()
                .map(|p| RepoTask {
                    path: p.to_path_buf(),
                    project: "tools/frontend".into(),
                    changes: vec![ChangeId::from("850035")],
                })
                .collect(),
        };

        let rows = survey(&plan, &fake).unwrap();
        assert_eq!(rows.len(), 4);

        assert!(rows[0].is_repo);
        assert_eq!(rows[0].branch.as_deref(), Some("master"));
        assert!(rows[0].clean);
        assert_eq!(rows[0].pending, None);
        assert_eq!(rows[0].queued, 1);

        assert_eq!(rows[1].branch.as_deref(), Some("picket/patches"));
        assert!(!rows[1].clean);
        assert_eq!(rows[1].pending, Some(PendingOp::CherryPick));

        assert!(rows[2].exists);
        assert!(!rows[2].is_repo);

        assert!(!rows[3].exists);
        assert!(!rows[3].is_repo);
    }
}
