use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;

use crate::image_loader::DecodedImage;

/// Byte-bounded LRU of decoded images keyed by file path.
///
/// Reselecting a recently viewed image hits this cache and skips the
/// decode round-trip entirely.
pub(crate) struct DecodedCache {
    max_bytes: usize,
    bytes: usize,
    entries: LruCache<PathBuf, Arc<DecodedImage>>,
}

impl DecodedCache {
    pub fn new(max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(256).unwrap();
        Self {
            max_bytes,
            bytes: 0,
            entries: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, path: &Path) -> Option<Arc<DecodedImage>> {
        self.entries.get(path).cloned()
    }

    pub fn insert(&mut self, path: PathBuf, image: Arc<DecodedImage>) {
        let added = image.byte_len();
        if let Some(existing) = self.entries.put(path, image) {
            self.bytes = self.bytes.saturating_sub(existing.byte_len());
        }
        self.bytes = self.bytes.saturating_add(added);

        while self.bytes > self.max_bytes {
            if let Some((_path, evicted)) = self.entries.pop_lru() {
                self.bytes = self.bytes.saturating_sub(evicted.byte_len());
            } else {
                break;
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
