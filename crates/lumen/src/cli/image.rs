//! The single-image commands: `edit`, `describe` and `tag`.
//!
//! Each checks for a stored credential first, then reads the image, so
//! nothing is sent when either is missing.

use std::path::{Path, PathBuf};

use clap::Args;
use lumen_core::api::TagOptions;
use lumen_core::{ImageInput, Session};

use super::theme;

/// Arguments for the `edit` command.
#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Image to edit
    pub path: PathBuf,

    /// What to change
    pub prompt: String,

    /// Where to write the result [default: <name>-edited.<ext> next to the input]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `describe` command.
#[derive(Args, Debug, Clone)]
pub struct DescribeArgs {
    /// Image to describe
    pub path: PathBuf,
}

/// Arguments for the `tag` command.
#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    /// Image to tag
    pub path: PathBuf,

    /// What to tag for
    pub prompt: String,

    /// Restrict tags to these choices
    #[arg(long, value_delimiter = ',')]
    pub choices: Vec<String>,

    /// Return at most one tag
    #[arg(long)]
    pub single: bool,

    /// Model mode
    #[arg(long)]
    pub mode: Option<String>,
}

pub async fn edit(session: &Session, args: EditArgs) -> anyhow::Result<()> {
    let client = session.vision_client()?;
    let image = ImageInput::from_path(&args.path)?;

    let spinner = theme::spinner("Editing image...");
    let result = client.edit(&image, &args.prompt).await;
    spinner.finish_and_clear();
    let edited = result?;

    let output = args
        .output
        .unwrap_or_else(|| default_edit_output(&args.path, edited.extension));
    std::fs::write(&output, &edited.bytes)?;

    tracing::info!(bytes = edited.bytes.len(), "Edited image written");
    theme::success(&format!("Saved to {}", output.display()));
    Ok(())
}

pub async fn describe(session: &Session, args: DescribeArgs) -> anyhow::Result<()> {
    let client = session.vision_client()?;
    let image = ImageInput::from_path(&args.path)?;

    let spinner = theme::spinner("Describing image...");
    let result = client.describe(&image).await;
    spinner.finish_and_clear();

    println!("{}", result?);
    Ok(())
}

pub async fn tag(session: &Session, args: TagArgs) -> anyhow::Result<()> {
    let client = session.vision_client()?;
    let image = ImageInput::from_path(&args.path)?;

    let options = tag_options(&args);
    let spinner = theme::spinner("Tagging image...");
    let result = client.tag(&image, &options).await;
    spinner.finish_and_clear();

    let tags = result?;
    if tags.is_empty() {
        theme::warning("No tags returned");
    }
    for tag in tags {
        println!("{tag}");
    }
    Ok(())
}

fn tag_options(args: &TagArgs) -> TagOptions {
    TagOptions {
        prompt: args.prompt.clone(),
        mode: args.mode.clone(),
        choices: args
            .choices
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        multiple: !args.single,
    }
}

/// `photo.jpg` → `photo-edited.<ext>`, in the same directory.
///
/// Uses the extension of the returned image when known, else the input's,
/// else `png`.
fn default_edit_output(input: &Path, returned_ext: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let ext = returned_ext
        .or_else(|| input.extension().and_then(|e| e.to_str()))
        .unwrap_or("png");
    input.with_file_name(format!("{stem}-edited.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Config, LumenError, TokenStore};

    fn logged_out_session(dir: &Path) -> Session {
        Session::with_store(
            Config::default(),
            TokenStore::new(dir.join("credentials.json")),
        )
    }

    fn logged_in_session(dir: &Path) -> Session {
        let session = logged_out_session(dir);
        session
            .store()
            .save(&lumen_core::Credential {
                access_token: "tok".to_string(),
                refresh_token: None,
                expires_at: None,
                user: None,
            })
            .unwrap();
        session
    }

    #[test]
    fn test_default_edit_output() {
        let input = Path::new("/photos/cat.jpg");
        assert_eq!(
            default_edit_output(input, Some("png")),
            PathBuf::from("/photos/cat-edited.png")
        );
        assert_eq!(
            default_edit_output(input, None),
            PathBuf::from("/photos/cat-edited.jpg")
        );
        assert_eq!(
            default_edit_output(Path::new("raw"), None),
            PathBuf::from("raw-edited.png")
        );
    }

    #[test]
    fn test_tag_options_from_args() {
        let args = TagArgs {
            path: PathBuf::from("a.jpg"),
            prompt: "animals".to_string(),
            choices: vec![" cat".to_string(), "".to_string(), "dog ".to_string()],
            single: true,
            mode: Some("fast".to_string()),
        };
        let options = tag_options(&args);
        assert_eq!(options.choices, vec!["cat", "dog"]);
        assert!(!options.multiple);
        assert_eq!(options.mode.as_deref(), Some("fast"));
    }

    #[tokio::test]
    async fn test_describe_requires_login_before_reading_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_out_session(dir.path());

        // Missing file and missing credential: the credential check wins.
        let err = describe(
            &session,
            DescribeArgs {
                path: dir.path().join("missing.jpg"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LumenError>(),
            Some(LumenError::NotAuthenticated)
        ));
    }

    fn assert_not_authenticated(err: anyhow::Error) {
        assert!(matches!(
            err.downcast_ref::<LumenError>(),
            Some(LumenError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_edit_requires_login() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_out_session(dir.path());
        let input = dir.path().join("a.jpg");
        std::fs::write(&input, b"img").unwrap();

        let err = edit(
            &session,
            EditArgs {
                path: input,
                prompt: "brighter".to_string(),
                output: None,
            },
        )
        .await
        .unwrap_err();
        assert_not_authenticated(err);
        assert!(!dir.path().join("a-edited.jpg").exists());
    }

    #[tokio::test]
    async fn test_tag_requires_login() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_out_session(dir.path());
        let input = dir.path().join("a.jpg");
        std::fs::write(&input, b"img").unwrap();

        let err = tag(
            &session,
            TagArgs {
                path: input,
                prompt: "animals".to_string(),
                choices: vec!["cat".to_string()],
                single: true,
                mode: None,
            },
        )
        .await
        .unwrap_err();
        assert_not_authenticated(err);
    }

    #[tokio::test]
    async fn test_tag_missing_file_is_local_error() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_in_session(dir.path());

        let err = tag(
            &session,
            TagArgs {
                path: dir.path().join("missing.jpg"),
                prompt: "x".to_string(),
                choices: vec![],
                single: false,
                mode: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LumenError>(),
            Some(LumenError::FileNotFound(_))
        ));
    }
}
