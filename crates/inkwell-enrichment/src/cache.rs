//! Semantic image cache.
//!
//! Wraps an [`ImageGenerator`] and reuses a previously generated image when a
//! new art description is close enough in embedding space. Entries can be
//! persisted to a JSON file so the cache survives restarts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inkwell_core::clock::Clock;
use inkwell_core::generator::{
    ArtDescriptor, EmbeddingProvider, GeneratedImage, GenerationError, ImageGenerator,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Similarity at or above which a cached image is reused.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.85;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    id: Uuid,
    prompt: String,
    embedding: Vec<f32>,
    image_url: String,
    created_at: DateTime<Utc>,
}

/// Cosine similarity of two vectors. Mismatched lengths and zero vectors
/// score `0.0`.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// An [`ImageGenerator`] decorator that serves semantically similar prompts
/// from cache.
pub struct SemanticImageCache {
    inner: Arc<dyn ImageGenerator>,
    embedder: Arc<dyn EmbeddingProvider>,
    clock: Arc<dyn Clock>,
    threshold: f32,
    store_path: Option<PathBuf>,
    entries: RwLock<Vec<CacheEntry>>,
    store_writer: Mutex<()>,
}

impl fmt::Debug for SemanticImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticImageCache")
            .field("threshold", &self.threshold)
            .field("store_path", &self.store_path)
            .finish_non_exhaustive()
    }
}

impl SemanticImageCache {
    /// Creates an empty, memory-only cache in front of `inner`.
    #[must_use]
    pub fn new(
        inner: Arc<dyn ImageGenerator>,
        embedder: Arc<dyn EmbeddingProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            embedder,
            clock,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            store_path: None,
            entries: RwLock::new(Vec::new()),
            store_writer: Mutex::new(()),
        }
    }

    /// Sets the similarity threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Persists entries to `path`, loading whatever is already there. A
    /// missing or unreadable file starts the cache empty.
    pub async fn with_store(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<CacheEntry>>(&bytes) {
                Ok(entries) => {
                    info!(path = %path.display(), entries = entries.len(), "loaded image cache");
                    self.entries = RwLock::new(entries);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "image cache file is corrupt, starting empty");
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                warn!(path = %path.display(), %error, "could not read image cache file");
            }
        }
        self.store_path = Some(path);
        self
    }

    /// Number of cached images.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no images.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn lookup(&self, embedding: &[f32]) -> Option<(String, f32)> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .map(|entry| (entry, cosine_similarity(embedding, &entry.embedding)))
            .filter(|(_, score)| *score >= self.threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(entry, score)| (entry.image_url.clone(), score))
    }

    async fn insert(&self, entry: CacheEntry) {
        let Some(path) = &self.store_path else {
            self.entries.write().await.push(entry);
            return;
        };

        // Held across snapshot and write so the file always ends up with the
        // newest snapshot.
        let _writer = self.store_writer.lock().await;
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.push(entry);
            entries.clone()
        };
        if let Err(error) = write_store(path, &snapshot).await {
            warn!(path = %path.display(), %error, "could not persist image cache");
        }
    }
}

/// Replaces the store file through a sibling temp file and a rename, so a
/// reader never sees a half-written file.
async fn write_store(path: &Path, entries: &[CacheEntry]) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(entries)?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, path).await
}

#[async_trait]
impl ImageGenerator for SemanticImageCache {
    async fn generate_image(&self, art: &ArtDescriptor) -> Result<GeneratedImage, GenerationError> {
        let prompt = art.prompt_text();
        let embedding = match self.embedder.embed(&prompt).await {
            Ok(embedding) => Some(embedding),
            Err(error) => {
                warn!(%error, "embedding failed, generating without cache");
                None
            }
        };

        if let Some(embedding) = &embedding {
            if let Some((image_url, score)) = self.lookup(embedding).await {
                debug!(score, "image cache hit");
                return Ok(GeneratedImage {
                    image_url,
                    cached: true,
                });
            }
        }

        let generated = self.inner.generate_image(art).await?;

        if let Some(embedding) = embedding {
            self.insert(CacheEntry {
                id: Uuid::new_v4(),
                prompt,
                embedding,
                image_url: generated.image_url.clone(),
                created_at: self.clock.now(),
            })
            .await;
        }

        Ok(GeneratedImage {
            image_url: generated.image_url,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use inkwell_test_support::{
        CountingImageGenerator, FailingEmbeddingProvider, FailingImageGenerator, FixedClock,
        StubEmbeddingProvider,
    };

    use super::*;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::default())
    }

    fn art(description: &str) -> ArtDescriptor {
        ArtDescriptor {
            art_description: description.to_owned(),
            style_notes: String::new(),
        }
    }

    fn embedder() -> Arc<StubEmbeddingProvider> {
        Arc::new(StubEmbeddingProvider::new(
            HashMap::from([
                ("throne", vec![1.0, 0.0, 0.0]),
                ("Throne", vec![0.98, 0.1, 0.0]),
                ("dungeon", vec![0.0, 1.0, 0.0]),
            ]),
            vec![0.0, 0.0, 1.0],
        ))
    }

    #[test]
    fn test_cosine_similarity_handles_degenerate_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_similar_prompt_is_served_from_cache() {
        // Arrange
        let inner = Arc::new(CountingImageGenerator::default());
        let cache = SemanticImageCache::new(inner.clone(), embedder(), clock());

        // Act
        let first = cache
            .generate_image(&art("A cold throne room at dusk"))
            .await
            .unwrap();
        let second = cache
            .generate_image(&art("Throne of iron swords"))
            .await
            .unwrap();

        // Assert
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.image_url, first.image_url);
        assert_eq!(inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_dissimilar_prompt_generates_new_image() {
        // Arrange
        let inner = Arc::new(CountingImageGenerator::default());
        let cache = SemanticImageCache::new(inner.clone(), embedder(), clock());

        // Act
        cache.generate_image(&art("A throne room")).await.unwrap();
        let other = cache.generate_image(&art("A damp dungeon")).await.unwrap();

        // Assert
        assert!(!other.cached);
        assert_eq!(inner.call_count(), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_embedding_failure_bypasses_cache() {
        // Arrange
        let inner = Arc::new(CountingImageGenerator::default());
        let cache = SemanticImageCache::new(inner.clone(), Arc::new(FailingEmbeddingProvider), clock());

        // Act
        let first = cache.generate_image(&art("A throne room")).await.unwrap();
        let second = cache.generate_image(&art("A throne room")).await.unwrap();

        // Assert
        assert!(!first.cached && !second.cached);
        assert_eq!(inner.call_count(), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_inner_failure_propagates_and_is_not_cached() {
        // Arrange
        let cache = SemanticImageCache::new(
            Arc::new(FailingImageGenerator::default()),
            embedder(),
            clock(),
        );

        // Act
        let result = cache.generate_image(&art("A throne room")).await;

        // Assert
        assert!(matches!(result, Err(GenerationError::Rejected { status: 429, .. })));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_entries_survive_reload_from_store() {
        // Arrange
        let path = std::env::temp_dir().join(format!("inkwell-cache-{}.json", Uuid::new_v4()));
        let inner = Arc::new(CountingImageGenerator::default());
        let cache = SemanticImageCache::new(inner.clone(), embedder(), clock())
            .with_store(&path)
            .await;
        let original = cache.generate_image(&art("A throne room")).await.unwrap();

        // Act
        let reloaded = SemanticImageCache::new(inner.clone(), embedder(), clock())
            .with_store(&path)
            .await;
        let hit = reloaded.generate_image(&art("A throne room")).await.unwrap();

        // Assert
        assert!(hit.cached);
        assert_eq!(hit.image_url, original.image_url);
        assert_eq!(inner.call_count(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_all_reach_the_store() {
        // Arrange
        let path = std::env::temp_dir().join(format!("inkwell-cache-{}.json", Uuid::new_v4()));
        let inner = Arc::new(CountingImageGenerator::default());
        let cache = SemanticImageCache::new(inner.clone(), embedder(), clock())
            .with_store(&path)
            .await;
        let (throne, dungeon, kingsroad) = (
            art("A throne room"),
            art("A damp dungeon"),
            art("The kingsroad at dawn"),
        );

        // Act
        let (a, b, c) = tokio::join!(
            cache.generate_image(&throne),
            cache.generate_image(&dungeon),
            cache.generate_image(&kingsroad),
        );
        let reloaded = SemanticImageCache::new(inner.clone(), embedder(), clock())
            .with_store(&path)
            .await;

        // Assert
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(reloaded.len().await, 3);
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        assert!(!PathBuf::from(staging).exists());
        let _ = std::fs::remove_file(&path);
    }
}
