use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::Args;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the daemon listens on
    pub listen: SocketAddr,

    /// Directory where completed artifacts are stored
    pub archive_dir: PathBuf,

    /// Client addresses admitted by the router; everyone else gets 403
    pub allow_list: Vec<IpAddr>,

    /// Cookie file handed to the fetch backends. The daemon refuses to start
    /// if this is set and the file is missing.
    pub cookies_file: Option<PathBuf>,

    /// Program invoked to resolve an artifact name without transferring
    pub probe_program: String,

    /// Program invoked by the media route to perform the transfer
    pub downloader_program: String,

    /// Overall transfer timeout in seconds for the generic HTTP route
    /// (0 = unlimited)
    pub timeout: u64,

    /// Connection timeout in seconds for the generic HTTP route
    pub connect_timeout: u64,

    /// User agent for the generic HTTP route (browser-like default)
    pub user_agent: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            archive_dir: PathBuf::from("downloads"),
            allow_list: vec![IpAddr::from(Ipv4Addr::LOCALHOST)],
            cookies_file: Some(PathBuf::from("cookies.txt")),
            probe_program: "yt-dlp".to_string(),
            downloader_program: "yt-dlp".to_string(),
            timeout: 0,
            connect_timeout: 10,
            user_agent: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults when no
    /// file is given or the given path does not exist.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .context("Failed to read configuration file")?;
                toml::from_str(&content).context("Failed to parse configuration file")
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the file configuration.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(listen) = args.listen {
            self.listen = listen;
        }
        if let Some(archive_dir) = &args.archive_dir {
            self.archive_dir = archive_dir.clone();
        }
    }
}
