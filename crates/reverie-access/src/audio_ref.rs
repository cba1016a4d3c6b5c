//! Parsing of stored audio references.

use std::fmt;

use url::Url;

/// Path segments that precede `<bucket>/<path>` in storage object URLs.
const OBJECT_URL_MARKERS: [&str; 3] = [
    "/storage/v1/object/public/",
    "/storage/v1/object/sign/",
    "/storage/v1/object/authenticated/",
];

/// An object in a storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
}

impl StoredObject {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}

/// A dream's stored audio reference, as saved by the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioRef {
    /// An absolute URL that is not a storage object URL.
    Remote(Url),
    /// An object in storage, given as a path or as a storage object URL.
    Stored(StoredObject),
}

impl AudioRef {
    /// Parse a raw reference.
    ///
    /// Accepts full URLs (storage object URLs are recognised and reduced to
    /// their object), `bucket/path` and bare paths, which are placed in
    /// `default_bucket`. Returns `None` for an empty reference.
    pub fn parse(raw: &str, default_bucket: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(url) = Url::parse(raw) {
            if matches!(url.scheme(), "http" | "https") {
                return Some(
                    stored_object_from_url(&url).map_or(Self::Remote(url), Self::Stored),
                );
            }
        }

        let path = raw.trim_start_matches('/');
        let path = path
            .strip_prefix(default_bucket)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path);
        if path.is_empty() {
            return None;
        }

        Some(Self::Stored(StoredObject::new(default_bucket, path)))
    }

    /// The storage object this reference points at, if any.
    pub const fn stored_object(&self) -> Option<&StoredObject> {
        match self {
            Self::Stored(object) => Some(object),
            Self::Remote(_) => None,
        }
    }
}

fn stored_object_from_url(url: &Url) -> Option<StoredObject> {
    let path = url.path();
    let rest = OBJECT_URL_MARKERS
        .iter()
        .find_map(|marker| path.find(marker).map(|at| &path[at + marker.len()..]))?;
    let (bucket, object_path) = rest.split_once('/')?;
    if bucket.is_empty() || object_path.is_empty() {
        return None;
    }
    Some(StoredObject::new(bucket, object_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_path() {
        assert_eq!(
            AudioRef::parse("alice/d1.m4a", "dreams"),
            Some(AudioRef::Stored(StoredObject::new("dreams", "alice/d1.m4a")))
        );
        assert_eq!(
            AudioRef::parse("/dreams/alice/d1.m4a", "dreams"),
            Some(AudioRef::Stored(StoredObject::new("dreams", "alice/d1.m4a")))
        );
        assert_eq!(AudioRef::parse("  ", "dreams"), None);
        assert_eq!(AudioRef::parse("dreams/", "dreams"), None);
    }

    #[test]
    fn test_parse_storage_url() {
        let parsed = AudioRef::parse(
            "https://abc.supabase.co/storage/v1/object/public/dreams/alice/d1.m4a",
            "other",
        );
        assert_eq!(
            parsed,
            Some(AudioRef::Stored(StoredObject::new("dreams", "alice/d1.m4a")))
        );

        let signed = AudioRef::parse(
            "https://abc.supabase.co/storage/v1/object/sign/private-dreams/bob/d2.m4a?token=xyz",
            "dreams",
        );
        assert_eq!(
            signed.as_ref().and_then(AudioRef::stored_object),
            Some(&StoredObject::new("private-dreams", "bob/d2.m4a"))
        );
    }

    #[test]
    fn test_parse_remote_url() {
        let parsed = AudioRef::parse("https://cdn.example/audio/d1.mp3", "dreams");
        assert!(matches!(
            parsed,
            Some(AudioRef::Remote(url)) if url.host_str() == Some("cdn.example")
        ));
    }
}
