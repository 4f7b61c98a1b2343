//! Preview URLs for images picked from disk.
//!
//! Every URL handed out by [`PreviewRegistry::acquire`] is released exactly once,
//! either when the image is removed or when the registry is drained on reset.

use std::collections::HashSet;

use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: HashSet<PreviewUrl>,
    released: usize,
}

impl PreviewRegistry {
    pub fn acquire(&mut self) -> PreviewUrl {
        let url = PreviewUrl(format!("preview://{}", Uuid::new_v4()));
        self.live.insert(url.clone());
        tracing::trace!(url = url.as_str(), "preview acquired");
        url
    }

    /// Returns `false` when the URL was not live (already released or foreign).
    pub fn release(&mut self, url: &PreviewUrl) -> bool {
        if self.live.remove(url) {
            self.released += 1;
            tracing::trace!(url = url.as_str(), "preview released");
            true
        } else {
            false
        }
    }

    pub fn release_all(&mut self) -> usize {
        let count = self.live.len();
        self.live.clear();
        self.released += count;
        count
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, url: &PreviewUrl) -> bool {
        self.live.contains(url)
    }

    pub fn released_count(&self) -> usize {
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_happens_once() {
        let mut registry = PreviewRegistry::default();
        let url = registry.acquire();
        assert!(registry.is_live(&url));
        assert!(registry.release(&url));
        assert!(!registry.release(&url));
        assert_eq!(registry.released_count(), 1);
    }

    #[test]
    fn drain_releases_everything_left() {
        let mut registry = PreviewRegistry::default();
        let first = registry.acquire();
        registry.acquire();
        registry.release(&first);
        assert_eq!(registry.release_all(), 1);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.released_count(), 2);
        assert_eq!(registry.release_all(), 0);
    }
}
