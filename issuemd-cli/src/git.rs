use std::path::Path;

use issuemd_core::constants::COMMIT_MESSAGE;
use issuemd_core::{IssueMdError, Result};
use tokio::process::Command;
use tracing::info;

/// Commit everything in the working tree and push it
pub async fn commit_and_push(work_dir: &Path) -> Result<()> {
    info!("Committing all files and pushing the change back to repository");

    run_git(work_dir, &["add", "--all"]).await?;
    run_git(work_dir, &["commit", "-m", COMMIT_MESSAGE]).await?;
    run_git(work_dir, &["push"]).await?;

    Ok(())
}

async fn run_git(work_dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(work_dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .await
        .map_err(|err| IssueMdError::Git(format!("Failed to execute git command: {}", err)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IssueMdError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(())
}
