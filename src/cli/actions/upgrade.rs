use crate::{
    cli::actions::ApiArgs,
    upgrade::{
        CameraSession, FieldKind, FileCache, ImageFileDevice, PollState, Role,
        RoleUpgradeSubmission, UploadedFile, camera::content_type_for,
    },
};
use anyhow::{Context, Result, anyhow, bail};
use std::{path::Path, path::PathBuf, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub api: ApiArgs,
    pub role: Role,
    pub texts: Vec<(String, String)>,
    pub files: Vec<(String, PathBuf)>,
    pub selfie: Option<PathBuf>,
    pub wait: bool,
    pub poll_interval_seconds: u64,
}

async fn read_upload(path: &Path) -> Result<UploadedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
    Ok(UploadedFile {
        content_type: content_type_for(&file_name).to_string(),
        file_name,
        bytes,
    })
}

/// Captures the selfie through a scoped camera session so the stream is
/// stopped whether the capture succeeds or not.
async fn capture_selfie(path: &Path) -> Result<UploadedFile> {
    let device = ImageFileDevice::new(path);
    let session = CameraSession::open(&device).await?;
    Ok(session.capture().await?)
}

/// Fills the form from the arguments, then from files cached by an earlier
/// attempt.
///
/// # Errors
/// Returns an error for fields the role does not have or unreadable files.
pub async fn build_submission(args: &Args, cache: &FileCache) -> Result<RoleUpgradeSubmission> {
    let mut submission = RoleUpgradeSubmission::new(args.role)
        .with_poll_interval(Duration::from_secs(args.poll_interval_seconds));

    for (field, value) in &args.texts {
        submission.set_text(field, value.clone())?;
    }

    for (field, path) in &args.files {
        let file = read_upload(path).await?;
        submission.set_file(field, file, Some(cache))?;
    }

    if let Some(path) = &args.selfie {
        let field = args
            .role
            .required_fields()
            .iter()
            .find(|spec| spec.kind == FieldKind::Selfie)
            .ok_or_else(|| anyhow!("the {} application does not take a selfie", args.role))?;
        let selfie = capture_selfie(path).await?;
        submission.set_file(field.name, selfie, Some(cache))?;
    }

    let restored = submission.restore_files(cache)?;
    if restored > 0 {
        info!(restored, "restored files from a previous attempt");
    }

    Ok(submission)
}

/// Execute the upgrade action.
/// # Errors
/// Returns an error if the form is incomplete, the submission fails or the
/// verification is rejected.
pub async fn execute(args: Args) -> Result<()> {
    let client = args.api.client()?;
    let cache = FileCache::for_session(client.store());
    let mut submission = build_submission(&args, &cache).await?;

    let missing = submission.missing_fields();
    if !missing.is_empty() {
        for field in &missing {
            if let Some(spec) = args.role.field(field) {
                eprintln!("missing: {} ({})", spec.name, spec.label);
            }
        }
        bail!(
            "the {} application is incomplete; selected files were kept for the next attempt",
            args.role
        );
    }

    submission.submit(&client, Some(&cache)).await?;
    let submission_id = submission.submission_id().unwrap_or_default().to_string();
    println!("Submitted {} application {submission_id}", args.role);

    if !args.wait {
        return Ok(());
    }

    let poller = submission.start_polling(&client)?;
    let finished = tokio::select! {
        state = poller.wait() => Some(state),
        _ = tokio::signal::ctrl_c() => None,
    };
    let state = match finished {
        Some(state) => state,
        None => {
            warn!("interrupted, stopping verification polling");
            poller.stop().await
        }
    };

    match state {
        PollState::Verified { message } => {
            submission.mark_verified();
            println!("Verified{}", message.map(|m| format!(": {m}")).unwrap_or_default());
            Ok(())
        }
        PollState::Rejected { message } => Err(anyhow!(
            "application rejected{}",
            message.map(|m| format!(": {m}")).unwrap_or_default()
        )),
        PollState::AuthFailed(reason) => Err(anyhow!("session expired, log in again: {reason}")),
        other => {
            println!("Stopped waiting ({other:?}), status id {submission_id}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use ulid::Ulid;

    fn args(role: Role, dir: &Path) -> Args {
        Args {
            api: ApiArgs {
                api_base_url: "http://127.0.0.1:9".to_string(),
                request_timeout_seconds: 1,
                state_dir: dir.to_path_buf(),
            },
            role,
            texts: Vec::new(),
            files: Vec::new(),
            selfie: None,
            wait: false,
            poll_interval_seconds: 10,
        }
    }

    #[tokio::test]
    async fn builds_driver_form_from_files_and_selfie() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("commuter-upgrade-{}", Ulid::new()));
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("license.pdf"), b"%PDF-1.7")?;
        std::fs::write(dir.join("me.jpg"), [0xff, 0xd8, 0xff])?;

        let mut args = args(Role::Driver, &dir);
        args.texts.push(("license_number".to_string(), "DL-42".to_string()));
        args.files.push(("license_document".to_string(), dir.join("license.pdf")));
        args.selfie = Some(dir.join("me.jpg"));

        let cache = FileCache::for_session(&SessionStore::in_memory());
        let submission = build_submission(&args, &cache).await?;

        assert_eq!(submission.missing_fields(), vec!["vehicle_registration"]);
        let cached = cache.load("selfie")?;
        assert_eq!(cached.map(|file| file.content_type), Some("image/jpeg".to_string()));

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[tokio::test]
    async fn selfie_for_role_without_one_fails() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("commuter-upgrade-{}", Ulid::new()));
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("me.jpg"), [0xff, 0xd8])?;

        let mut args = args(Role::Contributor, &dir);
        args.selfie = Some(dir.join("me.jpg"));
        let cache = FileCache::for_session(&SessionStore::in_memory());
        assert!(build_submission(&args, &cache).await.is_err());

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[tokio::test]
    async fn cached_files_fill_the_next_attempt() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("commuter-upgrade-{}", Ulid::new()));
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("id.pdf"), b"%PDF-1.7")?;

        let cache = FileCache::for_session(&SessionStore::in_memory());
        let mut first = args(Role::Contributor, &dir);
        first.files.push(("id_document".to_string(), dir.join("id.pdf")));
        build_submission(&first, &cache).await?;

        let mut second = args(Role::Contributor, &dir);
        second.texts.push(("motivation".to_string(), "I map bus stops".to_string()));
        let submission = build_submission(&second, &cache).await?;
        assert!(submission.missing_fields().is_empty());

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
