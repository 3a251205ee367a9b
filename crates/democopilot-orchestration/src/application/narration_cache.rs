//! Memoized speech synthesis.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use democopilot_core::speech::{SpeechError, SpeechOutput, SpeechSynthesizer};
use sha2::{Digest, Sha256};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NarrationKey {
    voice_id: String,
    text_digest: Vec<u8>,
}

impl NarrationKey {
    fn new(voice_id: &str, text: &str) -> Self {
        Self {
            voice_id: voice_id.to_owned(),
            text_digest: Sha256::digest(text.as_bytes()).to_vec(),
        }
    }
}

/// Synthesized audio keyed by voice and exact text, shared by all sessions.
///
/// Concurrent misses for the same key may both synthesize; the later insert
/// overwrites the earlier with an equivalent value.
#[derive(Debug, Default)]
pub struct NarrationCache {
    entries: RwLock<HashMap<NarrationKey, SpeechOutput>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl NarrationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up audio for `text` in `voice_id`.
    pub fn get(&self, voice_id: &str, text: &str) -> Option<SpeechOutput> {
        let key = NarrationKey::new(voice_id, text);
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Stores audio for `text` in `voice_id`.
    pub fn insert(&self, voice_id: &str, text: &str, output: SpeechOutput) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(NarrationKey::new(voice_id, text), output);
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups that found an entry.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that found nothing.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// A synthesizer that consults a [`NarrationCache`] before delegating.
///
/// Silent outputs are never cached, so a backend outage does not outlive
/// itself.
pub struct CachedSpeech {
    inner: Arc<dyn SpeechSynthesizer>,
    cache: Arc<NarrationCache>,
}

impl CachedSpeech {
    /// Wraps `inner` with `cache`.
    #[must_use]
    pub fn new(inner: Arc<dyn SpeechSynthesizer>, cache: Arc<NarrationCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl SpeechSynthesizer for CachedSpeech {
    fn voice_id(&self) -> &str {
        self.inner.voice_id()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    async fn speak(&self, text: &str) -> Result<SpeechOutput, SpeechError> {
        let voice_id = self.inner.voice_id();
        if let Some(output) = self.cache.get(voice_id, text) {
            debug!(voice_id, "narration cache hit");
            return Ok(output);
        }
        let output = self.inner.speak(text).await?;
        if !output.is_silent() {
            self.cache.insert(voice_id, text, output.clone());
        }
        Ok(output)
    }
}
