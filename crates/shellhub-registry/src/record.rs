//! One JSON record per file, replaced atomically.

use serde::Serialize;
use serde::de::DeserializeOwned;
use shellhub_kernel::ShellhubError;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from record reads/writes.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("corrupted record: {0}")]
    Corrupt(String),
}

impl From<RecordError> for ShellhubError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Io(detail) => ShellhubError::Io(detail),
            other => ShellhubError::Io(other.to_string()),
        }
    }
}

/// Read and deserialize one record.
pub fn read_record<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, RecordError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| RecordError::Io(format!("{}: {e}", path.display())))?;
    validate_record_bytes(path, &bytes)?;
    serde_json::from_slice(&bytes).map_err(|e| RecordError::Parse(format!("{}: {e}", path.display())))
}

/// Serialize and write one record.
///
/// The content goes to a unique temporary sibling first and is renamed into
/// place after `fsync`, so readers observe either the old or the new record.
pub fn write_record<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), RecordError> {
    let path = path.as_ref();
    let content = serde_json::to_vec_pretty(value)
        .map_err(|e| RecordError::Serialize(format!("{}: {e}", path.display())))?;

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), RecordError> {
        let file = File::create(&tmp_path)
            .map_err(|e| RecordError::Io(format!("{}: {e}", tmp_path.display())))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&content)
            .map_err(|e| RecordError::Io(format!("{}: {e}", tmp_path.display())))?;
        let file = writer
            .into_inner()
            .map_err(|e| RecordError::Io(format!("{}: {e}", tmp_path.display())))?;
        file.sync_all()
            .map_err(|e| RecordError::Io(format!("{}: {e}", tmp_path.display())))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        RecordError::Io(format!("{} -> {}: {e}", tmp_path.display(), path.display()))
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let dir = File::open(parent)
            .map_err(|e| RecordError::Io(format!("{}: {e}", parent.display())))?;
        dir.sync_all()
            .map_err(|e| RecordError::Io(format!("{}: {e}", parent.display())))?;
    }

    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

fn validate_record_bytes(path: &Path, bytes: &[u8]) -> Result<(), RecordError> {
    if bytes.contains(&0) {
        return Err(RecordError::Corrupt(format!(
            "{}: contains NUL byte(s)",
            path.display()
        )));
    }
    if std::str::from_utf8(bytes).is_err() {
        return Err(RecordError::Corrupt(format!(
            "{}: contains non-UTF-8 byte sequence(s)",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellhub_kernel::{ErrorKind, Identifier, SubmodelDescriptor};

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "shellhub-record-{prefix}-{}-{unique}.json",
            std::process::id()
        ))
    }

    #[test]
    fn read_record_rejects_nul_payload() {
        let path = temp_path("nul");
        fs::write(&path, b"{\"idShort\":\"A\"}\0").expect("fixture should write");

        match read_record::<SubmodelDescriptor>(&path) {
            Err(RecordError::Corrupt(message)) => assert!(message.contains("contains NUL")),
            other => panic!("expected corrupt record error, got {other:?}"),
        }

        let _ = fs::remove_file(path);
    }

    #[test]
    fn read_record_reports_parse_errors() {
        let path = temp_path("parse");
        fs::write(&path, b"{not json").expect("fixture should write");

        let err = read_record::<SubmodelDescriptor>(&path).expect_err("must fail");
        assert!(matches!(err, RecordError::Parse(_)));
        assert_eq!(ShellhubError::from(err).kind(), ErrorKind::Io);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn io_errors_keep_a_single_prefix() {
        let path = temp_path("missing");
        let err = read_record::<SubmodelDescriptor>(&path).expect_err("absent file must fail");
        let converted = ShellhubError::from(err);
        assert_eq!(converted.kind(), ErrorKind::Io);
        assert_eq!(converted.to_string().matches("I/O error").count(), 1);
        assert!(converted.detail().contains(&path.display().to_string()));
    }

    #[test]
    fn write_record_replaces_previous_content() {
        let path = temp_path("replace");
        let first = SubmodelDescriptor::new("First", Identifier::custom("sm-1"));
        write_record(&path, &first).expect("first write should succeed");
        let second = SubmodelDescriptor::new("Second", Identifier::custom("sm-2"));
        write_record(&path, &second).expect("second write should succeed");

        let read: SubmodelDescriptor = read_record(&path).expect("record should read");
        assert_eq!(read, second);

        let _ = fs::remove_file(path);
    }
}
