//! FTP transfer stage: batch upload of extracted files.
//!
//! Session setup failure aborts the whole batch before any upload. Once a
//! session exists the per-file loop is best-effort: a failed file does not
//! stop the remaining ones, but any failure degrades the batch result.

use std::fs::File;
use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use suppaftp::types::FileType;
use suppaftp::{FtpStream, Mode};
use tracing::{error, info, warn};

use crate::config::FtpConfig;

const FTP_PORT: u16 = 21;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Upload every file to the configured remote directory.
///
/// Returns true iff every file uploaded. An empty server address or an
/// empty batch is a "nothing to do" failure reported without connecting.
pub fn upload(cfg: &FtpConfig, files: &[PathBuf]) -> bool {
    if cfg.server.is_empty() {
        error!("No FTP server address");
        return false;
    }
    if files.is_empty() {
        error!("No data to transmit");
        return false;
    }

    let mut stream = match open_session(cfg) {
        Ok(stream) => stream,
        Err(e) => {
            error!(server = %cfg.server, error = %e, "FTP session setup failed");
            return false;
        }
    };

    let all_ok = upload_batch(files, |path| store_file(&mut stream, path));

    info!(server = %cfg.server, "Closing FTP connection");
    if let Err(e) = stream.quit() {
        warn!(error = %e, "Error closing FTP connection");
    }

    all_ok
}

/// Connect, authenticate and move into the remote directory.
fn open_session(cfg: &FtpConfig) -> Result<FtpStream> {
    let addr = format!("{}:{}", cfg.server, FTP_PORT)
        .to_socket_addrs()
        .with_context(|| format!("cannot resolve {}", cfg.server))?
        .next()
        .with_context(|| format!("no address found for {}", cfg.server))?;

    info!(server = %cfg.server, "Connecting to FTP server");
    let mut stream = FtpStream::connect_timeout(addr, CONNECT_TIMEOUT)?;
    stream.login(&cfg.username, &cfg.password)?;
    // Forcing passive mode
    stream.set_mode(Mode::Passive);
    stream.transfer_type(FileType::Binary)?;

    info!(path = %cfg.remote_path, "Moving into remote directory");
    stream.cwd(&cfg.remote_path)?;

    Ok(stream)
}

/// Best-effort loop over the batch: every entry is attempted regardless of
/// earlier failures. Empty paths are refused without an attempt.
fn upload_batch<F: FnMut(&Path) -> bool>(files: &[PathBuf], mut store: F) -> bool {
    let mut all_ok = true;

    for path in files {
        if path.as_os_str().is_empty() {
            error!("Refusing to transmit an empty path");
            all_ok = false;
            continue;
        }
        if !store(path) {
            all_ok = false;
        }
    }

    all_ok
}

/// Stream one local file to the remote directory in binary mode.
///
/// Directory components are stripped: remote files are organized flatly.
fn store_file(stream: &mut FtpStream, path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => {
            error!(path = %path.display(), "Cannot derive a remote filename");
            return false;
        }
    };

    info!(file = %path.display(), "Uploading file");
    let mut local = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            error!(file = %path.display(), error = %e, "Error opening local file");
            return false;
        }
    };

    match stream.put_file(name, &mut local) {
        Ok(_) => true,
        Err(e) => {
            error!(file = %path.display(), error = %e, "Error transferring file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ftp_config(server: &str) -> FtpConfig {
        FtpConfig {
            enabled: true,
            server: server.to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            remote_path: "/upload".to_string(),
        }
    }

    #[test]
    fn test_empty_server_returns_false_without_connecting() {
        assert!(!upload(&ftp_config(""), &[PathBuf::from("/a.nc")]));
    }

    #[test]
    fn test_empty_batch_returns_false_without_connecting() {
        assert!(!upload(&ftp_config("ftp.example.org"), &[]));
    }

    #[test]
    fn test_unreachable_server_returns_false() {
        // Reserved TLD, resolution fails before any upload is attempted.
        let files = vec![PathBuf::from("/a.nc")];
        assert!(!upload(&ftp_config("no-such-host.invalid"), &files));
    }

    #[test]
    fn test_batch_attempts_every_file_despite_failures() {
        let files = vec![
            PathBuf::from("/a.nc"),
            PathBuf::from(""),
            PathBuf::from("/b.nc"),
        ];

        let mut attempted = Vec::new();
        let result = upload_batch(&files, |path| {
            attempted.push(path.to_path_buf());
            true
        });

        // The empty entry fails the batch but both real files are attempted.
        assert!(!result);
        assert_eq!(
            attempted,
            vec![PathBuf::from("/a.nc"), PathBuf::from("/b.nc")]
        );
    }

    #[test]
    fn test_batch_is_the_logical_and_of_outcomes() {
        let files = vec![PathBuf::from("/a.nc"), PathBuf::from("/b.nc")];

        assert!(upload_batch(&files, |_| true));

        let mut calls = 0;
        let result = upload_batch(&files, |_| {
            calls += 1;
            calls != 1 // first file fails, second succeeds
        });
        assert!(!result);
        assert_eq!(calls, 2);
    }
}
