use crate::error::{Error, ErrorKind, Result};
use crate::models::{Derived, File};
use exn::ResultExt;
use time::UtcDateTime;

/// Convert an instant into microseconds since the Unix epoch, as stored.
pub(crate) fn to_micros(instant: UtcDateTime) -> Result<i64> {
    i64::try_from(instant.unix_timestamp_nanos() / 1_000).or_raise(|| ErrorKind::InvalidData("timestamp"))
}

pub(crate) fn from_micros(micros: i64) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000).or_raise(|| ErrorKind::InvalidData("timestamp"))
}

/// The current instant, truncated to the precision the store keeps.
pub(crate) fn now() -> Result<UtcDateTime> {
    from_micros(to_micros(UtcDateTime::now())?)
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FileRow {
    pub(crate) id: i64,
    pub(crate) bin_id: String,
    pub(crate) filename: String,
    pub(crate) status: i64,
    pub(crate) mime: String,
    pub(crate) bytes: i64,
    pub(crate) md5: String,
    pub(crate) sha256: String,
    pub(crate) downloads: i64,
    pub(crate) updates: i64,
    pub(crate) ip: String,
    pub(crate) trace: String,
    pub(crate) nonce: String,
    pub(crate) updated: i64,
    pub(crate) created: i64,
    pub(crate) deleted: Option<i64>,
}
impl TryFrom<&File> for FileRow {
    type Error = Error;
    fn try_from(file: &File) -> Result<Self> {
        Ok(Self {
            id: file.id,
            bin_id: file.bin.clone(),
            filename: file.filename.clone(),
            status: i64::from(file.status),
            mime: file.mime.clone(),
            bytes: i64::try_from(file.bytes).or_raise(|| ErrorKind::InvalidData("bytes"))?,
            md5: file.md5.clone(),
            sha256: file.sha256.clone(),
            downloads: i64::try_from(file.downloads).or_raise(|| ErrorKind::InvalidData("downloads"))?,
            updates: i64::try_from(file.updates).or_raise(|| ErrorKind::InvalidData("updates"))?,
            ip: file.ip.clone(),
            trace: file.trace.clone(),
            nonce: file.nonce.clone(),
            updated: to_micros(file.updated)?,
            created: to_micros(file.created)?,
            deleted: file.deleted.map(to_micros).transpose()?,
        })
    }
}
impl TryFrom<FileRow> for File {
    type Error = Error;
    fn try_from(row: FileRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            bin: row.bin_id,
            filename: row.filename,
            status: i32::try_from(row.status).or_raise(|| ErrorKind::InvalidData("status"))?,
            mime: row.mime,
            bytes: u64::try_from(row.bytes).or_raise(|| ErrorKind::InvalidData("bytes"))?,
            md5: row.md5,
            sha256: row.sha256,
            downloads: u64::try_from(row.downloads).or_raise(|| ErrorKind::InvalidData("downloads"))?,
            updates: u64::try_from(row.updates).or_raise(|| ErrorKind::InvalidData("updates"))?,
            ip: row.ip,
            trace: row.trace,
            nonce: row.nonce,
            updated: from_micros(row.updated)?,
            created: from_micros(row.created)?,
            deleted: row.deleted.map(from_micros).transpose()?,
            derived: Derived::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> FileRow {
        FileRow {
            id: 7,
            bin_id: "abc123".to_string(),
            filename: "ph_to_.png".to_string(),
            status: 0,
            mime: "image/png".to_string(),
            bytes: 2048,
            md5: "0cc175b9c0f1b6a831c399e269772661".to_string(),
            sha256: "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb".to_string(),
            downloads: 3,
            updates: 1,
            ip: "192.0.2.10".to_string(),
            trace: "N/A".to_string(),
            nonce: String::new(),
            updated: 1_710_428_966_123_456,
            created: 1_710_428_966_123_456,
            deleted: None,
        }
    }

    #[test]
    fn test_row_to_model() {
        let model = File::try_from(sample_row()).unwrap();
        assert_eq!(model.id, 7);
        assert_eq!(model.bin, "abc123");
        assert_eq!(model.downloads, 3);
        assert_eq!(model.created.unix_timestamp(), 1_710_428_966);
        assert_eq!(model.created.microsecond(), 123_456);
        assert_eq!(model.deleted, None);
    }

    #[test]
    fn test_model_to_row() {
        let model = File::try_from(sample_row()).unwrap();
        let row = FileRow::try_from(&model).unwrap();
        assert_eq!(row.bytes, 2048);
        assert_eq!(row.created, 1_710_428_966_123_456);
    }

    #[test]
    fn test_negative_counter_is_rejected() {
        let row = FileRow { downloads: -1, ..sample_row() };
        let err = File::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("downloads"));
    }

    #[test]
    fn test_now_is_truncated_to_micros() {
        let now = now().unwrap();
        assert_eq!(now.nanosecond() % 1_000, 0);
        assert_eq!(from_micros(to_micros(now).unwrap()).unwrap(), now);
    }
}
