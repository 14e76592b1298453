use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "sound enabled" intent for a whole catalog view.
///
/// Muted by default; the first explicit user interaction flips it. Items
/// read it when they bind their element and on their own toggle, so one
/// item's toggle never silently re-mutes another item that already bound.
/// Cheap to clone; every clone observes the same flag.
#[derive(Debug, Clone, Default)]
pub struct SoundIntent {
    enabled: Arc<AtomicBool>,
}

impl SoundIntent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// First user interaction anywhere on the page (autoplay unlock).
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flip the intent and return the new value.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_by_default() {
        assert!(!SoundIntent::new().is_enabled());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let intent = SoundIntent::new();
        let other = intent.clone();

        intent.enable();
        assert!(other.is_enabled());
    }

    #[test]
    fn test_toggle_returns_new_value() {
        let intent = SoundIntent::new();
        assert!(intent.toggle());
        assert!(intent.is_enabled());
        assert!(!intent.toggle());
        assert!(!intent.is_enabled());
    }
}
