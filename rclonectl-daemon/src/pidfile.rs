//! The PID file: the daemon's only durable record across invocations.
//!
//! A single line holding the decimal process id, nothing else.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::StopError;

/// Write `pid`, replacing any previous content.
///
/// Write flow: `<name>.tmp` sibling → `rename`, so a reader never sees a
/// half-written id.
pub fn write(path: &Path, pid: u32) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, format!("{pid}\n"))?;
    fs::rename(&tmp, path)
}

/// Read the process id. Only strictly positive ids that fit a `pid_t` are accepted.
pub fn read(path: &Path) -> Result<u32, StopError> {
    let content = fs::read_to_string(path).map_err(|source| StopError::NoPidFile {
        path: path.to_path_buf(),
        source,
    })?;
    content
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|pid| *pid > 0)
        .map(|pid| pid as u32)
        .ok_or_else(|| StopError::MalformedPid {
            path: path.to_path_buf(),
            content,
        })
}

/// Remove the file; a file that is already gone is not an error.
pub fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("run").join("rclone-ctl.pid");
        write(&path, 4242).expect("write");
        assert_eq!(read(&path).expect("read"), 4242);
        assert!(!dir.path().join("run").join("rclone-ctl.pid.tmp").exists());
    }

    #[test]
    fn write_overwrites_previous_pid() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("rclone-ctl.pid");
        write(&path, 1).unwrap();
        write(&path, 2).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "2\n");
    }

    #[test]
    fn read_rejects_non_positive_and_garbage() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("rclone-ctl.pid");
        for content in ["", "abc", "0", "-5", "99999999999"] {
            fs::write(&path, content).unwrap();
            let err = read(&path).unwrap_err();
            assert!(matches!(err, StopError::MalformedPid { .. }), "{content:?}: {err}");
        }
    }

    #[test]
    fn read_missing_is_no_pid_file() {
        let dir = TempDir::new().expect("tempdir");
        let err = read(&dir.path().join("absent.pid")).unwrap_err();
        assert!(matches!(err, StopError::NoPidFile { .. }));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("rclone-ctl.pid");
        write(&path, 7).unwrap();
        remove(&path).unwrap();
        remove(&path).unwrap();
        assert!(!path.exists());
    }
}
