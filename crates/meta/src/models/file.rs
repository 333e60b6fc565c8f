use crate::humanize;
use crate::models::Category;
use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcDateTime};

/// Placeholder stored for provenance fields the caller left empty.
pub const NOT_AVAILABLE: &str = "N/A";

/// Metadata describing one uploaded file inside a bin.
///
/// Everything except [`derived`](Self::derived) is persisted. The derived
/// fields are presentation helpers recomputed by the repository whenever a
/// record is read or written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Assigned by the store on insert; `0` until then.
    pub id: i64,
    pub bin: String,
    pub filename: String,
    pub status: i32,
    pub mime: String,
    pub bytes: u64,
    pub md5: String,
    pub sha256: String,
    pub downloads: u64,
    pub updates: u64,
    pub ip: String,
    pub trace: String,
    pub nonce: String,
    #[serde(serialize_with = "rfc3339")]
    pub updated: UtcDateTime,
    #[serde(serialize_with = "rfc3339")]
    pub created: UtcDateTime,
    /// Set by the caller to mark the file as (soft) deleted.
    #[serde(serialize_with = "rfc3339_option")]
    pub deleted: Option<UtcDateTime>,
    #[serde(flatten)]
    pub derived: Derived,
}

/// Display-oriented fields computed from the persisted ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub category: Category,
    pub bytes_readable: String,
    pub updated_relative: String,
    pub created_relative: String,
    pub deleted_relative: Option<String>,
    /// `bin/filename`, only populated when listing the files of a bin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl File {
    /// Describe a file that has not been inserted yet.
    pub fn new(bin: impl Into<String>, filename: impl Into<String>, mime: impl Into<String>, bytes: u64) -> Self {
        let now = UtcDateTime::now();
        Self {
            id: 0,
            bin: bin.into(),
            filename: filename.into(),
            status: 0,
            mime: mime.into(),
            bytes,
            md5: String::new(),
            sha256: String::new(),
            downloads: 0,
            updates: 0,
            ip: String::new(),
            trace: String::new(),
            nonce: String::new(),
            updated: now,
            created: now,
            deleted: None,
            derived: Derived::default(),
        }
    }

    pub fn with_checksums(mut self, md5: impl Into<String>, sha256: impl Into<String>) -> Self {
        self.md5 = md5.into();
        self.sha256 = sha256.into();
        self
    }

    pub fn with_provenance(mut self, ip: impl Into<String>, trace: impl Into<String>) -> Self {
        self.ip = ip.into();
        self.trace = trace.into();
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self
    }

    pub fn with_deleted(mut self, deleted: UtcDateTime) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Path of the file relative to the service root. Empty segments are
    /// skipped, so a file without a bin is just its filename.
    pub fn url(&self) -> String {
        [self.bin.trim_matches('/'), self.filename.as_str()]
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Replace empty provenance fields with [`NOT_AVAILABLE`].
    pub(crate) fn default_provenance(&mut self) {
        for field in [&mut self.ip, &mut self.trace] {
            if field.is_empty() {
                *field = NOT_AVAILABLE.to_string();
            }
        }
    }

    /// Recompute size, relative time and category fields.
    pub(crate) fn derive(&mut self, now: UtcDateTime) {
        self.derived.category = Category::from_mime(&self.mime);
        self.derived.bytes_readable = humanize::bytes(self.bytes);
        self.derived.updated_relative = humanize::relative(self.updated, now);
        self.derived.created_relative = humanize::relative(self.created, now);
        self.derived.deleted_relative = self.deleted.map(|deleted| humanize::relative(deleted, now));
    }

    pub(crate) fn derive_with_url(&mut self, now: UtcDateTime) {
        self.derive(now);
        self.derived.url = Some(self.url());
    }
}

fn rfc3339<S: Serializer>(value: &UtcDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted = OffsetDateTime::from_unix_timestamp_nanos(value.unix_timestamp_nanos())
        .map_err(serde::ser::Error::custom)?
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

fn rfc3339_option<S: Serializer>(value: &Option<UtcDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => rfc3339(value, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::Duration;

    /// 2024-03-14T15:09:26Z
    fn fixed_instant() -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(1_710_428_966).unwrap()
    }

    #[test]
    fn test_default_provenance() {
        let mut file = File::new("abc123", "a.txt", "text/plain", 1).with_provenance("", "curl/8.5");
        file.default_provenance();
        assert_eq!(file.ip, NOT_AVAILABLE);
        assert_eq!(file.trace, "curl/8.5");
    }

    #[test]
    fn test_derive() {
        let created = fixed_instant();
        let mut file = File::new("abc123", "ph_to_.png", "image/png", 2048).with_deleted(created + Duration::hours(1));
        file.created = created;
        file.updated = created;
        file.derive(created + Duration::hours(3));
        assert_eq!(file.derived.category, Category::Image);
        assert_eq!(file.derived.bytes_readable, "2.0 kB");
        assert_eq!(file.derived.created_relative, "3 hours ago");
        assert_eq!(file.derived.deleted_relative.as_deref(), Some("2 hours ago"));
        assert_eq!(file.derived.url, None);
    }

    #[rstest]
    #[case("abc123", "a.png", "abc123/a.png")]
    #[case("abc123/", "a.png", "abc123/a.png")]
    #[case("", "a.png", "a.png")]
    #[case("abc123", "", "abc123")]
    #[case("", "", "")]
    fn test_url_joins_non_empty_segments(#[case] bin: &str, #[case] filename: &str, #[case] expected: &str) {
        assert_eq!(File::new(bin, filename, "image/png", 1).url(), expected);
    }

    #[test]
    fn test_url() {
        let mut file = File::new("abc123", "ph_to_.png", "image/png", 2048);
        assert_eq!(file.url(), "abc123/ph_to_.png");
        file.derive_with_url(UtcDateTime::now());
        assert_eq!(file.derived.url.as_deref(), Some("abc123/ph_to_.png"));
    }

    #[test]
    fn test_serialize() {
        let mut file = File::new("abc123", "clip.mp4", "video/mp4", 1_500_000);
        file.created = fixed_instant();
        file.updated = fixed_instant();
        file.derive(fixed_instant());
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["bin"], "abc123");
        assert_eq!(json["category"], "video");
        assert_eq!(json["bytesReadable"], "1.5 MB");
        assert_eq!(json["createdRelative"], "now");
        assert_eq!(json["created"], "2024-03-14T15:09:26Z");
        assert!(json["deleted"].is_null());
        assert!(json.get("url").is_none());
    }
}
