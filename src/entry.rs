use std::sync::Arc;
use std::time::Instant;

/// A cached value together with its absolute expiry time.
///
/// `expires_at = None` means the entry never expires.  Expiry is lazy: the
/// cache checks the deadline whenever it reads the entry, there is no
/// background sweeper.
pub struct Entry<V> {
    pub(crate) value: Arc<V>,
    pub(crate) expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: Arc<V>, expires_at: Option<Instant>) -> Self {
        Entry { value, expires_at }
    }

    #[inline]
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn immortal_entry_never_expires() {
        let entry = Entry::new(Arc::new(1), None);
        assert!(!entry.is_expired(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn entry_expires_at_its_deadline() {
        let now = Instant::now();
        let entry = Entry::new(Arc::new(1), Some(now + Duration::from_millis(5)));
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + Duration::from_millis(5)));
    }
}
