//! # Identity Resolution
//!
//! Maps a requested source URL to the stable, filesystem-safe name of its
//! local artifact, without transferring the resource body.

use std::fmt;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use url::Url;

use crate::error::{IdentityError, ResolveError};

/// Filesystem-safe name of a resource's local artifact.
///
/// Two requests that would produce the same artifact resolve to the same
/// `Identity`. An `Identity` is always a single path component: it can never
/// escape the archive namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Validate `name` as a single path component.
    pub fn new(name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentityError::Empty);
        }
        if name.contains(['/', '\\']) {
            return Err(IdentityError::Separator(name));
        }
        if name == "." || name == ".." {
            return Err(IdentityError::DirectoryRef(name));
        }
        if name.chars().any(char::is_control) {
            return Err(IdentityError::Control);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strategy for deriving an [`Identity`] from a source URL.
#[async_trait]
pub trait ResolveIdentity: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<Identity, ResolveError>;
}

/// Derives the identity from the final path segment of the URL itself.
///
/// Pure computation, no network or process side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

#[async_trait]
impl ResolveIdentity for PathResolver {
    async fn resolve(&self, url: &str) -> Result<Identity, ResolveError> {
        let parsed =
            Url::parse(url).map_err(|e| ResolveError::InvalidUrl(format!("{url}: {e}")))?;
        let segment = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| ResolveError::EmptySegment(url.to_string()))?;
        Ok(Identity::new(segment)?)
    }
}

/// Asks an external metadata probe for the canonical artifact name.
///
/// The probe prints the name the downloader would produce for the source,
/// without transferring the body. Its stdout is used verbatim as the
/// identity, minus the trailing newline.
#[derive(Debug, Clone)]
pub struct ProbeResolver {
    program: String,
    args: Vec<String>,
}

impl ProbeResolver {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The yt-dlp filename probe used by the media route.
    pub fn ytdlp(program: impl Into<String>) -> Self {
        Self::new(
            program,
            ["--get-filename", "-o", "%(title)s[%(id)s].%(ext)s"]
                .map(String::from)
                .to_vec(),
        )
    }
}

#[async_trait]
impl ResolveIdentity for ProbeResolver {
    async fn resolve(&self, url: &str) -> Result<Identity, ResolveError> {
        debug!(probe = %self.program, url, "probing for artifact name");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .output()
            .await?;
        if !output.status.success() {
            return Err(ResolveError::ProbeFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let name = String::from_utf8_lossy(&output.stdout);
        Ok(Identity::new(name.trim_end_matches(['\r', '\n']))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rejects_path_escapes() {
        assert!(matches!(Identity::new(""), Err(IdentityError::Empty)));
        assert!(matches!(
            Identity::new("a/b.mp4"),
            Err(IdentityError::Separator(_))
        ));
        assert!(matches!(
            Identity::new("..\\b.mp4"),
            Err(IdentityError::Separator(_))
        ));
        assert!(matches!(
            Identity::new(".."),
            Err(IdentityError::DirectoryRef(_))
        ));
        assert!(matches!(
            Identity::new("a\nb"),
            Err(IdentityError::Control)
        ));
    }

    #[test]
    fn identity_accepts_probe_style_names() {
        let identity = Identity::new("My Video[video123].mp4").unwrap();
        assert_eq!(identity.as_str(), "My Video[video123].mp4");
    }

    #[tokio::test]
    async fn path_resolver_takes_final_segment() {
        let identity = PathResolver
            .resolve("http://example.com/media/video123.mp4?token=abc")
            .await
            .unwrap();
        assert_eq!(identity.as_str(), "video123.mp4");
    }

    #[tokio::test]
    async fn path_resolver_rejects_empty_segment() {
        let err = PathResolver.resolve("http://example.com/").await.unwrap_err();
        assert!(matches!(err, ResolveError::EmptySegment(_)));
    }

    #[tokio::test]
    async fn path_resolver_rejects_garbage() {
        let err = PathResolver.resolve("not a url").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn path_resolver_cannot_escape_namespace() {
        // The url crate normalizes dot segments; anything that survives must
        // still pass Identity validation.
        let identity = PathResolver
            .resolve("http://example.com/a/../video.mp4")
            .await
            .unwrap();
        assert_eq!(identity.as_str(), "video.mp4");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_resolver_trims_trailing_newline() {
        let resolver = ProbeResolver::new(
            "sh",
            ["-c", "echo 'My Video[video123].mp4'", "probe"]
                .map(String::from)
                .to_vec(),
        );
        let identity = resolver.resolve("http://example.com/video123").await.unwrap();
        assert_eq!(identity.as_str(), "My Video[video123].mp4");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_resolver_reports_probe_failure() {
        let resolver = ProbeResolver::new(
            "sh",
            ["-c", "echo boom >&2; exit 3", "probe"].map(String::from).to_vec(),
        );
        let err = resolver
            .resolve("http://example.com/video123")
            .await
            .unwrap_err();
        match err {
            ResolveError::ProbeFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn probe_resolver_reports_spawn_failure() {
        let resolver = ProbeResolver::new("arkiv-test-missing-probe", Vec::new());
        let err = resolver
            .resolve("http://example.com/video123")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ProbeSpawn(_)));
    }
}
