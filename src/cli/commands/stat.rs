//! `--stat`: download counts per release.

use super::helpers::resolve_upload_config;
use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;
use crate::github::{GitHubClient, Release, ReleaseStore, RetryingStore};

/// Download total of one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ReleaseStat {
    pub tag: String,
    /// Publication date, `draft` when unpublished
    pub published: String,
    pub downloads: u64,
    /// Highest total in the repository (ties all count)
    pub best: bool,
}

/// Sum asset downloads per release and mark the most downloaded ones
pub(super) fn download_stats(releases: &[Release]) -> Vec<ReleaseStat> {
    let max = releases
        .iter()
        .map(Release::download_count)
        .max()
        .unwrap_or(0);

    releases
        .iter()
        .map(|release| {
            let downloads = release.download_count();
            ReleaseStat {
                tag: release.tag_name.clone(),
                published: release
                    .published_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "draft".to_string()),
                downloads,
                best: max > 0 && downloads == max,
            }
        })
        .collect()
}

/// Execute stat command
pub(super) async fn execute_stat(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let upload_config = resolve_upload_config(args).await?;
    let client = GitHubClient::new(
        &upload_config.owner,
        &upload_config.repo,
        &upload_config.token,
        &upload_config.api_url,
    )?;

    let store = RetryingStore::new(client, upload_config.retry)
        .with_deadline(upload_config.operation_timeout);

    let releases = store.list_releases().await?;
    config.verbose_println(&format!(
        "{} release(s) in {}/{}",
        releases.len(),
        upload_config.owner,
        upload_config.repo
    ));

    let stats = download_stats(&releases);
    let width = stats.iter().map(|stat| stat.tag.len()).max().unwrap_or(0);
    for stat in &stats {
        let line = format!(
            "{:<width$}  {:<10}  {:>8}",
            stat.tag,
            stat.published,
            stat.downloads,
            width = width
        );
        if stat.best {
            config.hot_println(&line);
        } else {
            config.println(&line);
        }
    }

    Ok(crate::ExitCode::Ok.code())
}
