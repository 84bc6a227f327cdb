use std::{path::Path, process::Command};

use tracing::debug;

/// Commit checked out in `repo`, the contracts project the bytecode is
/// built from. Empty when git is unavailable or `repo` is not a checkout.
pub fn get_git_commit_hash(repo: &Path) -> String {
    match Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(repo)
        .output()
    {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_owned()
        }
        Ok(output) => {
            debug!(
                repo = %repo.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git rev-parse failed"
            );
            String::new()
        }
        Err(err) => {
            debug!(repo = %repo.display(), %err, "Failed to run git");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .args(["-c", "user.name=bridge", "-c", "user.email=bridge@localhost"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .output()
            .is_ok_and(|output| output.status.success())
    }

    #[test]
    fn reads_the_commit_of_the_given_checkout() {
        let dir = tempfile::tempdir().unwrap();
        if !git(dir.path(), &["init", "--quiet"]) {
            // No git binary in this environment.
            return;
        }
        assert!(git(
            dir.path(),
            &["commit", "--quiet", "--allow-empty", "-m", "contracts"]
        ));

        let expected = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(dir.path())
            .output()
            .unwrap();
        let commit = get_git_commit_hash(dir.path());

        assert_eq!(commit.len(), 40);
        assert_eq!(commit, String::from_utf8_lossy(&expected.stdout).trim());
    }

    #[test]
    fn missing_checkout_yields_an_empty_commit() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(get_git_commit_hash(&dir.path().join("absent")), "");
    }
}
