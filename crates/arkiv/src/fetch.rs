//! # Fetch Executors
//!
//! The byte-transfer backends. Given a source URL and a destination inside
//! the archive store, a backend either produces the file or fails; it never
//! retries, and it never touches the fetch registry (the coordinator's
//! supervision owns that).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::{COOKIE, HeaderValue};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::identity::Identity;

/// A byte-transfer backend: given a source URL, produce a file at `dest`.
///
/// Transfers are long-running (seconds to minutes) and are always invoked
/// from a detached task, never from a request-handling path.
#[async_trait]
pub trait FetchMedia: Send + Sync {
    async fn fetch(&self, identity: &Identity, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Delegates the transfer to an external downloader process.
///
/// The invocation is `<program> [--cookies <file>] <args..> -o <dest> <url>`,
/// matching the yt-dlp argument convention.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: String,
    args: Vec<String>,
    cookies_file: Option<PathBuf>,
}

impl CommandFetcher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cookies_file: None,
        }
    }

    /// The yt-dlp invocation used by the media route.
    pub fn ytdlp(program: impl Into<String>) -> Self {
        Self::new(program, ["--format", "best"].map(String::from).to_vec())
    }

    /// Pass a cookie jar to the downloader process.
    pub fn with_cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }
}

#[async_trait]
impl FetchMedia for CommandFetcher {
    async fn fetch(&self, identity: &Identity, url: &str, dest: &Path) -> Result<(), FetchError> {
        let mut cmd = Command::new(&self.program);
        if let Some(cookies) = &self.cookies_file {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.args(&self.args).arg("-o").arg(dest).arg(url);

        debug!(identity = %identity, program = %self.program, "spawning downloader");
        let output = cmd.stdin(Stdio::null()).stdout(Stdio::null()).output().await?;
        if !output.status.success() {
            return Err(FetchError::ExitStatus {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Generic HTTP transfer with a browser-like header set.
///
/// Streams the response body chunk-by-chunk to the destination, so artifact
/// size is bounded by disk, not memory.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher from the provided configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = config.headers.clone();
        if let Some(cookies_file) = &config.cookies_file {
            headers.insert(COOKIE, read_cookie_header(cookies_file)?);
        }

        let mut client_builder = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            });

        if !config.timeout.is_zero() {
            client_builder = client_builder.timeout(config.timeout);
        }

        if !config.connect_timeout.is_zero() {
            client_builder = client_builder.connect_timeout(config.connect_timeout);
        }

        Ok(Self {
            client: client_builder.build()?,
        })
    }
}

#[async_trait]
impl FetchMedia for HttpFetcher {
    async fn fetch(&self, identity: &Identity, url: &str, dest: &Path) -> Result<(), FetchError> {
        debug!(identity = %identity, url, "starting HTTP transfer");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

/// Read a cookie string (`name=value; name2=value2`) from `path`, skipping
/// comment and blank lines.
fn read_cookie_header(path: &Path) -> Result<HeaderValue, FetchError> {
    let contents = std::fs::read_to_string(path)?;
    let line = contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .ok_or_else(|| FetchError::Cookies(format!("no cookie data in {}", path.display())))?;
    HeaderValue::from_str(line).map_err(|e| FetchError::Cookies(e.to_string()))
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::*;

    fn identity(name: &str) -> Identity {
        Identity::new(name).unwrap()
    }

    async fn serve(app: Router) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn http_fetcher_streams_body_to_destination() {
        let addr = serve(Router::new().route("/clip.mp4", get(|| async { "media-bytes" }))).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");
        let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
        fetcher
            .fetch(
                &identity("clip.mp4"),
                &format!("http://{addr}/clip.mp4"),
                &dest,
            )
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"media-bytes");
    }

    #[tokio::test]
    async fn http_fetcher_rejects_error_status() {
        let addr = serve(Router::new()).await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("absent.mp4");
        let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
        let err = fetcher
            .fetch(
                &identity("absent.mp4"),
                &format!("http://{addr}/absent.mp4"),
                &dest,
            )
            .await
            .unwrap_err();

        match err {
            FetchError::Status(status) => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_fetcher_produces_the_destination_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");
        // $1 = "-o", $2 = dest, $3 = url
        let fetcher = CommandFetcher::new(
            "sh",
            ["-c", "printf transferred > \"$2\"", "fetch"]
                .map(String::from)
                .to_vec(),
        );
        fetcher
            .fetch(&identity("clip.mp4"), "http://example.com/clip.mp4", &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"transferred");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_fetcher_captures_downloader_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");
        let fetcher = CommandFetcher::new(
            "sh",
            ["-c", "echo transfer failed >&2; exit 1", "fetch"]
                .map(String::from)
                .to_vec(),
        );
        let err = fetcher
            .fetch(&identity("clip.mp4"), "http://example.com/clip.mp4", &dest)
            .await
            .unwrap_err();

        match err {
            FetchError::ExitStatus { stderr, .. } => assert_eq!(stderr, "transfer failed"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn cookie_header_skips_comments_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "# session cookies\n\nsession=abc123; theme=dark\n").unwrap();

        let value = read_cookie_header(&path).unwrap();
        assert_eq!(value.to_str().unwrap(), "session=abc123; theme=dark");
    }

    #[test]
    fn empty_cookie_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "# nothing here\n").unwrap();

        assert!(matches!(
            read_cookie_header(&path),
            Err(FetchError::Cookies(_))
        ));
    }
}
