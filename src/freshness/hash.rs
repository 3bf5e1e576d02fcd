//! Content hashing using blake3.
//!
//! A missing or unreadable input hashes to `None`, never to an error.
//! Callers treat `None` as "changed" so unknown content is always rebuilt.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Blake3 digest of some content, serialized as 64 lowercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[cfg(test)]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Parse 64 hex chars. Anything else is `None`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl From<blake3::Hash> for ContentHash {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

/// Short form for logs: the first 8 bytes.
impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0[..8].iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = Cow::<str>::deserialize(deserializer)?;
        Self::from_hex(&hex).ok_or_else(|| serde::de::Error::custom("invalid content hash"))
    }
}

/// Hash an in-memory buffer.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    blake3::hash(bytes).into()
}

/// Hash a file's full content. `None` if the file cannot be read.
pub fn hash_file(path: &Path) -> Option<ContentHash> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(File::open(path).ok()?).ok()?;
    Some(hasher.finalize().into())
}

/// Hash several files as one fingerprint.
///
/// Each file contributes `"<path>:<content>"`, segments joined by `\n`, in
/// the order given, with `<path>` taken relative to `base` so the
/// fingerprint survives moving the project. The order must be stable across
/// runs. Any unreadable member makes the whole fingerprint `None`.
pub fn hash_many<P: AsRef<Path>>(base: &Path, paths: &[P]) -> Option<ContentHash> {
    let mut hasher = blake3::Hasher::new();

    for (i, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let file = File::open(path).ok()?;
        if i > 0 {
            hasher.update(b"\n");
        }
        let label = path.strip_prefix(base).unwrap_or(path);
        hasher.update(label.to_string_lossy().as_bytes());
        hasher.update(b":");
        hasher.update_reader(file).ok()?;
    }

    Some(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_display_is_short_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(hash.to_string(), "ab".repeat(8));
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(ContentHash::from_hex("abcd").is_none());
        assert!(ContentHash::from_hex("not hex").is_none());
    }

    #[test]
    fn test_hash_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.md");
        fs::write(&path, "hello world").unwrap();

        let before = hash_file(&path);
        assert_eq!(before, Some(hash_bytes(b"hello world")));
        assert_eq!(before, hash_file(&path));

        fs::write(&path, "goodbye world").unwrap();
        assert_ne!(before, hash_file(&path));
    }

    #[test]
    fn test_hash_file_nonexistent() {
        assert_eq!(hash_file(Path::new("/nonexistent/file.md")), None);
    }

    #[test]
    fn test_hash_many_order_matters() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "one").unwrap();
        fs::write(&b, "two").unwrap();

        let ab = hash_many(dir.path(), &[&a, &b]).unwrap();
        let ba = hash_many(dir.path(), &[&b, &a]).unwrap();
        assert_ne!(ab, ba);
        assert_eq!(Some(ab), hash_many(dir.path(), &[&a, &b]));
    }

    #[test]
    fn test_hash_many_includes_path() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();

        assert_ne!(hash_many(dir.path(), &[&a]), hash_many(dir.path(), &[&b]));
    }

    #[test]
    fn test_hash_many_ignores_base_location() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        for dir in [&one, &two] {
            fs::create_dir_all(dir.path().join("templates")).unwrap();
            fs::write(dir.path().join("templates/layout.html"), "<main>").unwrap();
        }

        let files = |dir: &TempDir| [dir.path().join("templates/layout.html")];
        let a = hash_many(one.path(), &files(&one));
        assert!(a.is_some());
        assert_eq!(a, hash_many(two.path(), &files(&two)));
    }

    #[test]
    fn test_hash_many_missing_member() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "one").unwrap();

        assert_eq!(hash_many(dir.path(), &[a, dir.path().join("gone.txt")]), None);
    }

    #[test]
    fn test_serde_as_hex() {
        let hash = ContentHash::new([0x12; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "12".repeat(32)));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
