#![forbid(unsafe_code)]

//! Ancestor scroll suspension while a row is being dragged or is open.
//!
//! Hosts register every scrollable ancestor of the list as a
//! [`ScrollContainer`]. The manager suspends all of them on [`lock`] and
//! resumes them on [`unlock`]; both are idempotent, so repeated locks do not
//! stack and a single unlock always restores scrolling.
//!
//! # Invariants
//!
//! 1. `lock()` followed by any number of further `lock()` calls requires
//!    exactly one `unlock()` to restore scrolling.
//! 2. Each container sees at most one `suspend_scroll` per locked period.
//! 3. Dropping a locked manager resumes every container.
//!
//! [`lock`]: ScrollLockManager::lock
//! [`unlock`]: ScrollLockManager::unlock

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A scrollable ancestor the list can pause.
pub trait ScrollContainer {
    fn suspend_scroll(&mut self);
    fn resume_scroll(&mut self);
}

/// Shared-flag container for hosts that poll scroll state.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct ScrollFlag {
    suspended: Rc<Cell<bool>>,
    suspends: Rc<Cell<u32>>,
}

impl ScrollFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_scroll_enabled(&self) -> bool {
        !self.suspended.get()
    }

    /// How many times scrolling was suspended over the flag's lifetime.
    #[must_use]
    pub fn suspend_count(&self) -> u32 {
        self.suspends.get()
    }
}

impl ScrollContainer for ScrollFlag {
    fn suspend_scroll(&mut self) {
        self.suspended.set(true);
        self.suspends.set(self.suspends.get().saturating_add(1));
    }

    fn resume_scroll(&mut self) {
        self.suspended.set(false);
    }
}

#[derive(Default)]
pub struct ScrollLockManager {
    containers: Vec<Box<dyn ScrollContainer>>,
    locked: bool,
}

impl fmt::Debug for ScrollLockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollLockManager")
            .field("containers", &self.containers.len())
            .field("locked", &self.locked)
            .finish()
    }
}

impl ScrollLockManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scrollable ancestor. Suspended immediately if locked.
    pub fn attach(&mut self, mut container: Box<dyn ScrollContainer>) {
        if self.locked {
            container.suspend_scroll();
        }
        self.containers.push(container);
    }

    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether native touch-move handling (page scroll) must be prevented.
    #[inline]
    #[must_use]
    pub fn prevents_default(&self) -> bool {
        self.locked
    }

    /// Suspend scrolling. Returns `true` if this call changed the state.
    pub fn lock(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.locked = true;
        for container in &mut self.containers {
            container.suspend_scroll();
        }
        tracing::debug!(containers = self.containers.len(), "scroll locked");
        true
    }

    /// Restore scrolling. Returns `true` if this call changed the state.
    pub fn unlock(&mut self) -> bool {
        if !self.locked {
            return false;
        }
        self.locked = false;
        for container in &mut self.containers {
            container.resume_scroll();
        }
        tracing::debug!(containers = self.containers.len(), "scroll unlocked");
        true
    }

    /// Unlock and forget every container.
    pub fn release_on_teardown(&mut self) {
        if self.unlock() {
            tracing::warn!("scroll lock released by teardown");
        }
        self.containers.clear();
    }
}

impl Drop for ScrollLockManager {
    fn drop(&mut self) {
        self.release_on_teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with_flag() -> (ScrollLockManager, ScrollFlag) {
        let flag = ScrollFlag::new();
        let mut manager = ScrollLockManager::new();
        manager.attach(Box::new(flag.clone()));
        (manager, flag)
    }

    #[test]
    fn repeated_lock_needs_one_unlock() {
        let (mut manager, flag) = manager_with_flag();
        assert!(manager.lock());
        assert!(!manager.lock());
        assert!(!manager.lock());
        assert!(!flag.is_scroll_enabled());
        assert_eq!(flag.suspend_count(), 1);

        assert!(manager.unlock());
        assert!(flag.is_scroll_enabled());
        assert!(!manager.unlock());
    }

    #[test]
    fn attach_while_locked_suspends() {
        let mut manager = ScrollLockManager::new();
        manager.lock();
        let flag = ScrollFlag::new();
        manager.attach(Box::new(flag.clone()));
        assert!(!flag.is_scroll_enabled());
        assert!(manager.prevents_default());
    }

    #[test]
    fn drop_restores_scrolling() {
        let (mut manager, flag) = manager_with_flag();
        manager.lock();
        drop(manager);
        assert!(flag.is_scroll_enabled());
    }

    #[test]
    fn teardown_clears_containers() {
        let (mut manager, flag) = manager_with_flag();
        manager.lock();
        manager.release_on_teardown();
        assert!(flag.is_scroll_enabled());
        manager.lock();
        assert_eq!(flag.suspend_count(), 1);
    }
}
