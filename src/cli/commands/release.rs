//! Release command: resolve the release for a tag and sync local files to it.

use std::sync::Arc;

use super::helpers::resolve_upload_config;
use crate::cli::{Args, RuntimeConfig};
use crate::error::{CliError, Result};
use crate::github::{GitHubClient, ReleaseStore, RetryingStore};
use crate::local::local_assets;
use crate::release::{PipelineOutcome, ReleasePipeline, ResolveAction};

/// Execute release command
pub(super) async fn execute_release(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let spec = args.release_spec()?;
    let path = args.path.as_deref().ok_or_else(|| CliError::MissingArgument {
        argument: "PATH".to_string(),
    })?;

    let upload_config = resolve_upload_config(args).await?;

    // Local files are enumerated before any remote call
    let assets = local_assets(path)?;
    config.verbose_println(&format!(
        "{} file(s) from {} for {}/{}@{}",
        assets.len(),
        path.display(),
        upload_config.owner,
        upload_config.repo,
        spec.tag_name
    ));

    let client = GitHubClient::new(
        &upload_config.owner,
        &upload_config.repo,
        &upload_config.token,
        &upload_config.api_url,
    )?;
    let store: Arc<dyn ReleaseStore> = Arc::new(
        RetryingStore::new(client, upload_config.retry)
            .with_deadline(upload_config.operation_timeout),
    );

    config.step_println(&format!("Resolving release {}", spec.tag_name));
    let pipeline = ReleasePipeline::new(store, &upload_config);
    let outcome = pipeline.run(&spec, &assets).await?;

    report_outcome(&outcome, config);
    Ok(outcome.exit_code().code())
}

fn report_outcome(outcome: &PipelineOutcome, config: &RuntimeConfig) {
    let release = &outcome.release;
    let resolved = match outcome.resolution.action {
        ResolveAction::Created => "Created release",
        ResolveAction::CreatedDraft => "Created draft release",
        ResolveAction::ReusedExisting => "Using existing release",
        ResolveAction::RecreatedThenCreated => "Recreated release",
    };
    config.println(&format!("{} {} (id {})", resolved, release.tag_name, release.id));

    if outcome.deleted.attempted() > 0 {
        config.step_println("Deleting superseded assets");
        for name in &outcome.deleted.succeeded {
            config.indent(&format!("--> Deleted {}", name));
        }
    }

    config.step_println("Uploading assets");
    for name in &outcome.uploaded.succeeded {
        config.indent(&format!("--> Uploaded {}", name));
    }

    let failures: Vec<_> = outcome.failures().collect();
    if !failures.is_empty() {
        for failure in &failures {
            config.error_println(&failure.to_string());
        }
        config.warning_println(&format!(
            "{} of {} operation(s) failed; release {} left as {}",
            failures.len(),
            outcome.deleted.attempted() + outcome.uploaded.attempted(),
            release.tag_name,
            if release.draft { "draft" } else { "is" }
        ));

        if config.is_verbose() {
            for suggestion in failures
                .iter()
                .flat_map(|failure| failure.cause.recovery_suggestions())
                .take(2)
            {
                config.indent(&format!("• {}", suggestion));
            }
        }
        return;
    }

    if let Some(e) = &outcome.publish_error {
        config.error_println(&format!("Publishing {} failed: {}", release.tag_name, e));
        config.warning_println(&format!(
            "All assets uploaded; release {} left as draft: {}",
            release.tag_name, release.html_url
        ));
        return;
    }

    if outcome.published {
        config.success_println(&format!("Published {}", release.html_url));
    } else if release.draft {
        config.success_println(&format!("Draft release ready: {}", release.html_url));
    } else {
        config.success_println(&format!("Release updated: {}", release.html_url));
    }
}
