use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

struct PreviewEntry {
    image: String,
    ticket: u64,
}

/// Short-lived per-player preview images, shown right after a pick. Each
/// entry expires on its own timer or when a map change clears the table,
/// whichever comes first. Tickets stop an expiry task from removing an
/// entry that was replaced by a newer pick.
pub struct PreviewImages {
    entries: Arc<DashMap<i32, PreviewEntry>>,
    tickets: AtomicU64,
    ttl: Duration,
}

impl PreviewImages {
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            entries: Arc::new(DashMap::new()),
            tickets: AtomicU64::new(0),
            ttl,
        })
    }

    pub fn register(&self, slot: i32, image: String) {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(slot, PreviewEntry { image, ticket });

        let entries = Arc::clone(&self.entries);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            entries.remove_if(&slot, |_, entry| entry.ticket == ticket);
        });
    }

    pub fn current(&self, slot: i32) -> Option<String> {
        self.entries.get(&slot).map(|entry| entry.image.clone())
    }

    /// Map change cancels every pending preview early.
    pub fn clear_all(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let previews = PreviewImages::new(Duration::from_millis(20));
        previews.register(1, "img/ak47_vulcan.png".into());
        assert_eq!(previews.current(1).as_deref(), Some("img/ak47_vulcan.png"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(previews.current(1), None);
    }

    #[tokio::test]
    async fn newer_entry_survives_older_timer() {
        let previews = PreviewImages::new(Duration::from_millis(40));
        previews.register(1, "first.png".into());
        tokio::time::sleep(Duration::from_millis(25)).await;
        previews.register(1, "second.png".into());

        // The first entry's timer fires here; it must not evict the second.
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(previews.current(1).as_deref(), Some("second.png"));
    }

    #[tokio::test]
    async fn map_change_clears_immediately() {
        let previews = PreviewImages::new(Duration::from_secs(60));
        previews.register(1, "img.png".into());
        previews.clear_all();
        assert_eq!(previews.current(1), None);
    }
}
