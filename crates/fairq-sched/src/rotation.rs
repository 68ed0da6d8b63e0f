//! Round-robin rotation over the busy issuer queues
//!
//! The front of the deque is the rotation's current position. Serving an
//! issuer pops it from the front; if its queue stays busy the caller
//! requeues it at the back, so the position persists across dispatch calls
//! instead of restarting at the same issuer every time.

use fairq_common::IssuerId;
use std::collections::VecDeque;

/// Ordered cyclic list of busy issuers
#[derive(Debug, Default)]
pub struct RotationList {
    order: VecDeque<IssuerId>,
}

impl RotationList {
    /// Create an empty rotation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly-busy issuer at the back of the rotation
    pub fn push(&mut self, issuer: IssuerId) {
        debug_assert!(!self.contains(issuer), "issuer {issuer} already rotating");
        self.order.push_back(issuer);
    }

    /// Unlink an issuer that stopped being busy out of rotation order
    pub fn remove(&mut self, issuer: IssuerId) {
        let position = self
            .order
            .iter()
            .position(|&candidate| candidate == issuer)
            .expect("issuer missing from rotation list");
        self.order.remove(position);
    }

    /// Take the issuer at the current position
    pub fn take_current(&mut self) -> Option<IssuerId> {
        self.order.pop_front()
    }

    /// Put a still-busy issuer back at the end of the rotation
    pub fn requeue(&mut self, issuer: IssuerId) {
        self.order.push_back(issuer);
    }

    /// True if `issuer` is in the rotation
    #[must_use]
    pub fn contains(&self, issuer: IssuerId) -> bool {
        self.order.iter().any(|&candidate| candidate == issuer)
    }

    /// Number of busy issuers
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no issuer is busy
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_order_persists() {
        let mut rotation = RotationList::new();
        for raw in 1..=3 {
            rotation.push(IssuerId::new(raw));
        }

        // One full pass, each issuer requeued: order cycles
        for expected in 1..=3 {
            let issuer = rotation.take_current().unwrap();
            assert_eq!(issuer.as_u64(), expected);
            rotation.requeue(issuer);
        }
        // Next call resumes at issuer 1 again, not restarted mid-pass
        assert_eq!(rotation.take_current().unwrap().as_u64(), 1);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut rotation = RotationList::new();
        for raw in 1..=4 {
            rotation.push(IssuerId::new(raw));
        }
        rotation.remove(IssuerId::new(2));
        assert_eq!(rotation.len(), 3);
        assert_eq!(rotation.take_current().unwrap().as_u64(), 1);
        assert_eq!(rotation.take_current().unwrap().as_u64(), 3);
        assert_eq!(rotation.take_current().unwrap().as_u64(), 4);
    }

    #[test]
    #[should_panic(expected = "missing from rotation list")]
    fn test_remove_unknown_panics() {
        let mut rotation = RotationList::new();
        rotation.remove(IssuerId::new(9));
    }
}
