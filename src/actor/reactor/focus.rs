//! Focus history and focus-follows-pointer debouncing.
//!
//! The arbiter only decides; the reactor carries out the resulting
//! [`Handoff`] against the window server.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::common::config::{FocusPolicy, FocusSettings};
use crate::model::WindowId;

/// Focus moves from `previous` to `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub previous: Option<WindowId>,
    pub next: Option<WindowId>,
}

#[derive(Debug, Clone)]
pub struct FocusArbiter {
    /// Most recent first; the head is the focused window.
    history: Vec<WindowId>,
    last_entered: Option<WindowId>,
    last_enter_at: Option<Instant>,
    deadline: Option<Instant>,
    policy: FocusPolicy,
    delay: Duration,
}

impl FocusArbiter {
    pub fn new(settings: &FocusSettings) -> FocusArbiter {
        FocusArbiter {
            history: Vec::new(),
            last_entered: None,
            last_enter_at: None,
            deadline: None,
            policy: settings.policy,
            delay: settings.delay(),
        }
    }

    pub fn policy(&self) -> FocusPolicy { self.policy }

    pub fn focused(&self) -> Option<WindowId> { self.history.first().copied() }

    pub fn history(&self) -> &[WindowId] { &self.history }

    /// When the pending deferred focus is due, if one is pending.
    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    /// The pointer entered `window` (already resolved to its managed client).
    /// Returns the window to focus right away, if any.
    pub fn enter_window(&mut self, now: Instant, window: WindowId) -> Option<WindowId> {
        if self.last_entered == Some(window) {
            return None;
        }
        self.last_entered = Some(window);
        if self.policy == FocusPolicy::Click {
            return None;
        }

        let rapid = self
            .last_enter_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.delay);
        self.last_enter_at = Some(now);
        if rapid || self.deadline.is_some() {
            trace!(%window, "deferring focus");
            self.deadline = Some(now + self.delay);
            return None;
        }
        Some(window)
    }

    /// The pointer is over something that is not a managed window.
    pub fn enter_unmanaged(&mut self) { self.last_entered = None; }

    /// The deferred-focus timer went off. Returns the window entered most
    /// recently, which is the one to focus.
    pub fn fire(&mut self, now: Instant) -> Option<WindowId> {
        match self.deadline {
            Some(due) if now >= due => {
                self.deadline = None;
                self.last_entered
            }
            _ => None,
        }
    }

    /// Moves `window` to the head of the history. `None` when it already was.
    pub fn focus_client(&mut self, window: WindowId) -> Option<Handoff> {
        let previous = self.focused();
        if previous == Some(window) {
            return None;
        }
        self.history.retain(|&w| w != window);
        self.history.insert(0, window);
        Some(Handoff { previous, next: Some(window) })
    }

    /// Drops `window` from the history. If it was focused, focus goes to the
    /// most recent window for which `is_live` holds; stale entries met on the
    /// way are dropped too.
    pub fn unfocus_client(
        &mut self,
        window: WindowId,
        is_live: impl Fn(WindowId) -> bool,
    ) -> Option<Handoff> {
        let was_focused = self.focused() == Some(window);
        self.history.retain(|&w| w != window);
        if self.last_entered == Some(window) {
            self.last_entered = None;
        }
        if !was_focused {
            return None;
        }
        while let Some(head) = self.focused() {
            if is_live(head) {
                break;
            }
            self.history.remove(0);
        }
        Some(Handoff { previous: Some(window), next: self.focused() })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn arbiter(policy: FocusPolicy) -> FocusArbiter {
        FocusArbiter::new(&FocusSettings { policy, delay_ms: 50 })
    }

    const A: WindowId = WindowId(1);
    const B: WindowId = WindowId(2);
    const C: WindowId = WindowId(3);

    #[test]
    fn first_enter_focuses_at_once() {
        let mut f = arbiter(FocusPolicy::Enter);
        let t0 = Instant::now();
        assert_eq!(f.enter_window(t0, A), Some(A));
        assert_eq!(f.deadline(), None);
        // Crossing into another part of the same client does nothing.
        assert_eq!(f.enter_window(t0 + Duration::from_millis(5), A), None);
    }

    #[test]
    fn rapid_enters_defer_to_the_last_one() {
        let mut f = arbiter(FocusPolicy::Enter);
        let t0 = Instant::now();
        assert_eq!(f.enter_window(t0, A), Some(A));
        f.focus_client(A);
        assert_eq!(f.enter_window(t0 + Duration::from_millis(10), B), None);
        assert_eq!(f.enter_window(t0 + Duration::from_millis(20), C), None);
        assert_eq!(f.deadline(), Some(t0 + Duration::from_millis(70)));

        assert_eq!(f.fire(t0 + Duration::from_millis(60)), None);
        assert_eq!(f.fire(t0 + Duration::from_millis(70)), Some(C));
        assert_eq!(f.deadline(), None);
    }

    #[test]
    fn slow_enters_focus_immediately() {
        let mut f = arbiter(FocusPolicy::Enter);
        let t0 = Instant::now();
        assert_eq!(f.enter_window(t0, A), Some(A));
        assert_eq!(f.enter_window(t0 + Duration::from_millis(200), B), Some(B));
    }

    #[test]
    fn click_policy_ignores_enters() {
        let mut f = arbiter(FocusPolicy::Click);
        assert_eq!(f.enter_window(Instant::now(), A), None);
        assert_eq!(f.deadline(), None);
    }

    #[test]
    fn history_has_no_duplicates() {
        let mut f = arbiter(FocusPolicy::Enter);
        f.focus_client(A);
        f.focus_client(B);
        assert_eq!(f.focus_client(B), None);
        assert_eq!(f.focus_client(A), Some(Handoff { previous: Some(B), next: Some(A) }));
        assert_eq!(f.history(), &[A, B]);
    }

    #[test]
    fn unfocusing_the_head_falls_back_to_the_next_live_window() {
        let mut f = arbiter(FocusPolicy::Enter);
        f.focus_client(A);
        f.focus_client(B);
        f.focus_client(C);
        let handoff = f.unfocus_client(C, |w| w != B);
        assert_eq!(handoff, Some(Handoff { previous: Some(C), next: Some(A) }));
        assert_eq!(f.focused(), Some(A));

        assert_eq!(f.unfocus_client(WindowId(99), |_| true), None);
        assert_eq!(
            f.unfocus_client(A, |_| true),
            Some(Handoff { previous: Some(A), next: None })
        );
    }
}
