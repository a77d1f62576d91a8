//! Flat, line-oriented config file formats shared by both binaries.

use std::path::Path;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("malformed server line (expected ADDR/PORT): {0:?}")]
    MalformedServerLine(String),
}

/// Parses `<configDir>/ficheros`: one relative log path per line, blank
/// lines ignored.
pub fn read_file_list(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parses `<configDir>/servidores`: one `ADDR/PORT` per line.
pub fn read_server_list(path: &Path) -> Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path)?;
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            line.rsplit_once('/')
                .map(|(addr, port)| (addr.to_string(), port.to_string()))
                .ok_or_else(|| Error::MalformedServerLine(line.to_string()))
        })
        .collect()
}

/// The default configuration directory, `$HOME/.lognotify`.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".lognotify"))
        .unwrap_or_else(|| std::path::PathBuf::from(".lognotify"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_list_ignores_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ficheros");
        std::fs::write(&path, "a.log\n\n  \nsub/b.log\n").unwrap();
        let files = read_file_list(&path).unwrap();
        assert_eq!(files, vec!["a.log".to_string(), "sub/b.log".to_string()]);
    }

    #[test]
    fn server_list_splits_addr_and_port() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servidores");
        std::fs::write(&path, "10.0.0.1/9000\nhost.example.com/9001\n").unwrap();
        let servers = read_server_list(&path).unwrap();
        assert_eq!(
            servers,
            vec![
                ("10.0.0.1".to_string(), "9000".to_string()),
                ("host.example.com".to_string(), "9001".to_string()),
            ]
        );
    }

    #[test]
    fn server_list_rejects_a_line_without_a_slash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servidores");
        std::fs::write(&path, "not-valid\n").unwrap();
        assert!(read_server_list(&path).is_err());
    }
}
