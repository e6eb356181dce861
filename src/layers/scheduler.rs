use crate::core::viewport::ViewportState;

/// Serializes reconciliation passes.
///
/// At most one pass runs at a time. Requests that arrive while a pass is
/// running collapse into a single follow-up pass that sees the latest state.
#[derive(Debug, Clone, Default)]
pub struct ReconcileScheduler {
    running: bool,
    pending: Option<ViewportState>,
    passes: u64,
    coalesced: u64,
}

impl ReconcileScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state to reconcile now, or `None` if a pass is already
    /// running and the request was parked as pending.
    pub fn request(&mut self, state: ViewportState) -> Option<ViewportState> {
        if self.running {
            if self.pending.replace(state).is_some() {
                self.coalesced += 1;
            }
            return None;
        }
        Some(state)
    }

    /// Marks a pass as started
    pub fn begin(&mut self) {
        self.running = true;
        self.passes += 1;
    }

    /// Marks the running pass as done and hands back the follow-up state, if any
    pub fn finish(&mut self) -> Option<ViewportState> {
        self.running = false;
        let next = self.pending.take();
        if next.is_some() {
            log::debug!(
                "follow-up reconciliation pass after {} coalesced requests",
                self.coalesced
            );
        }
        next
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Passes started since creation
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Requests folded into an already pending one
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLngBounds;

    fn state(zoom: f64) -> ViewportState {
        ViewportState::new(LatLngBounds::world(), zoom)
    }

    #[test]
    fn test_idle_request_runs_immediately() {
        let mut scheduler = ReconcileScheduler::new();
        assert_eq!(scheduler.request(state(3.0)), Some(state(3.0)));
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_requests_during_pass_collapse_to_latest() {
        let mut scheduler = ReconcileScheduler::new();
        scheduler.begin();
        assert_eq!(scheduler.request(state(1.0)), None);
        assert_eq!(scheduler.request(state(2.0)), None);
        assert_eq!(scheduler.request(state(3.0)), None);
        assert!(scheduler.has_pending());
        assert_eq!(scheduler.coalesced(), 2);

        assert_eq!(scheduler.finish(), Some(state(3.0)));
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.finish(), None);
        assert_eq!(scheduler.passes(), 1);
    }
}
