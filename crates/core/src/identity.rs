//! Content identity: streaming SHA-256 fingerprints of source files.

use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::warn;

/// SHA-256 digest of a file's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest of an in-memory buffer.
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Outcome of fingerprinting one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    Available(ContentDigest),
    /// The file could not be read; it is treated as unique.
    Unavailable { reason: String },
}

impl Fingerprint {
    pub fn digest(&self) -> Option<&ContentDigest> {
        match self {
            Self::Available(digest) => Some(digest),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Hashes a file in `buffer_size` chunks without loading it whole.
pub async fn hash_file(path: &Path, buffer_size: usize) -> std::io::Result<ContentDigest> {
    let file = File::open(path).await?;
    let mut reader = BufReader::with_capacity(buffer_size, file);
    let mut buffer = vec![0u8; buffer_size];
    let mut hasher = Sha256::new();

    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentDigest(hasher.finalize().into()))
}

/// Computes fingerprints with bounded concurrency.
#[derive(Debug, Clone)]
pub struct ContentIdentityResolver {
    buffer_size: usize,
    concurrency: usize,
}

impl ContentIdentityResolver {
    pub fn new(buffer_size: usize, concurrency: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    /// Fingerprints one file. Read failures become [`Fingerprint::Unavailable`].
    pub async fn fingerprint(&self, path: &Path) -> Fingerprint {
        match hash_file(path, self.buffer_size).await {
            Ok(digest) => Fingerprint::Available(digest),
            Err(e) => {
                warn!("Fingerprint unavailable for {}: {}", path.display(), e);
                Fingerprint::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fingerprints many files; the result is in the same order as `paths`.
    pub async fn fingerprint_all(&self, paths: Vec<PathBuf>) -> Vec<Fingerprint> {
        stream::iter(paths)
            .map(|path| async move { self.fingerprint(&path).await })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

impl Default for ContentIdentityResolver {
    fn default() -> Self {
        Self::new(1024 * 1024, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_identical_content_same_digest() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.mp3");
        let b = temp.path().join("b.mp3");
        tokio::fs::write(&a, b"same bytes").await.unwrap();
        tokio::fs::write(&b, b"same bytes").await.unwrap();

        let resolver = ContentIdentityResolver::default();
        let fa = resolver.fingerprint(&a).await;
        let fb = resolver.fingerprint(&b).await;
        assert_eq!(fa, fb);
        assert_eq!(fa.digest(), Some(&ContentDigest::of(b"same bytes")));
    }

    #[tokio::test]
    async fn test_different_content_different_digest() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.mp3");
        let b = temp.path().join("b.mp3");
        tokio::fs::write(&a, b"one").await.unwrap();
        tokio::fs::write(&b, b"two").await.unwrap();

        let resolver = ContentIdentityResolver::default();
        assert_ne!(resolver.fingerprint(&a).await, resolver.fingerprint(&b).await);
    }

    #[tokio::test]
    async fn test_small_buffer_matches_one_shot_digest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.flac");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &data).await.unwrap();

        let digest = hash_file(&path, 7).await.unwrap();
        assert_eq!(digest, ContentDigest::of(&data));
    }

    #[tokio::test]
    async fn test_missing_file_unavailable() {
        let resolver = ContentIdentityResolver::default();
        let fp = resolver
            .fingerprint(Path::new("/nonexistent/track.mp3"))
            .await;
        assert!(matches!(fp, Fingerprint::Unavailable { .. }));
        assert!(fp.digest().is_none());
    }

    #[tokio::test]
    async fn test_fingerprint_all_preserves_order() {
        let temp = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..8 {
            let path = temp.path().join(format!("{i}.mp3"));
            tokio::fs::write(&path, format!("content {i}")).await.unwrap();
            paths.push(path);
        }
        paths.insert(3, temp.path().join("missing.mp3"));

        let resolver = ContentIdentityResolver::new(16, 3);
        let results = resolver.fingerprint_all(paths).await;

        assert_eq!(results.len(), 9);
        assert!(matches!(results[3], Fingerprint::Unavailable { .. }));
        assert_eq!(
            results[0].digest(),
            Some(&ContentDigest::of(b"content 0"))
        );
        assert_eq!(
            results[8].digest(),
            Some(&ContentDigest::of(b"content 7"))
        );
    }

    #[test]
    fn test_digest_hex() {
        let digest = ContentDigest::of(b"");
        assert_eq!(
            digest.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
