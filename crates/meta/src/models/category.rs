use derive_more::Display;
use serde::Serialize;

/// Coarse classification of a file, derived from its MIME type.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[display("image")]
    Image,
    #[display("video")]
    Video,
    #[default]
    #[display("unknown")]
    Unknown,
}
impl Category {
    /// Classify by MIME prefix only; subtype and parameters are ignored.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image") {
            Self::Image
        } else if mime.starts_with("video") {
            Self::Video
        } else {
            Self::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("image/png", Category::Image)]
    #[case("image/svg+xml; charset=utf-8", Category::Image)]
    #[case("video/mp4", Category::Video)]
    #[case("videogame/x-rom", Category::Video)]
    #[case("audio/ogg", Category::Unknown)]
    #[case("application/octet-stream", Category::Unknown)]
    #[case("IMAGE/PNG", Category::Unknown)]
    #[case("", Category::Unknown)]
    fn test_from_mime(#[case] mime: &str, #[case] expected: Category) {
        assert_eq!(Category::from_mime(mime), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(Category::Image.to_string(), "image");
        assert_eq!(Category::Unknown.to_string(), "unknown");
    }
}
