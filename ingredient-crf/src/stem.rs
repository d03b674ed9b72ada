//! Cached English stemming.
//!
//! The stem of a token never changes, so results are kept in a bounded LRU
//! cache shared by the feature emitter and the foundation-food resolver.
//! The cache is content-addressed and thread-safe; single-threaded callers
//! never contend on the lock.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};

const STEM_CACHE_CAPACITY: usize = 512;

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

static STEM_CACHE: Lazy<Mutex<LruCache<String, String>>> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Mutex::new(LruCache::new(
        NonZeroUsize::new(STEM_CACHE_CAPACITY).expect("cache capacity is non-zero"),
    ))
});

/// Return the stem of a token.
pub fn stem(token: &str) -> String {
    if let Ok(mut cache) = STEM_CACHE.lock() {
        if let Some(stemmed) = cache.get(token) {
            return stemmed.clone();
        }
        let stemmed = STEMMER.stem(token).into_owned();
        cache.put(token.to_string(), stemmed.clone());
        stemmed
    } else {
        STEMMER.stem(token).into_owned()
    }
}
