use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::error::FactoryError;

/// Rejects nested entry while a guarded operation is in flight.
///
/// Held across calls into untrusted code (template initializers), which may
/// try to call back into the factory.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

/// Releases the guard when dropped, including on early return.
#[must_use]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GuardToken<'_>, FactoryError> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Re-entrant call rejected");
            return Err(FactoryError::ReentrantCall);
        }
        Ok(GuardToken { guard: self })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_entry_rejected() {
        let guard = ReentrancyGuard::new();
        let token = guard.enter().unwrap();
        assert!(guard.is_entered());
        assert!(matches!(guard.enter(), Err(FactoryError::ReentrantCall)));
        drop(token);
        assert!(!guard.is_entered());
        assert!(guard.enter().is_ok());
    }
}
