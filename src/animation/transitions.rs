use crate::animation::{
    interpolation::{EasingFunction, Interpolation},
    navigation::NavigationToken,
};
use crate::core::geo::LatLng;
use crate::rendering::surface::CameraMove;

/// State of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Running,
    Completed,
    /// Replaced by a newer move before it finished
    Cancelled,
}

/// An eased camera move from one center/zoom to another
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransition {
    pub token: NavigationToken,
    pub start_center: LatLng,
    pub start_zoom: f64,
    pub target_center: LatLng,
    pub target_zoom: f64,
    /// Duration in seconds
    pub duration: f64,
    pub easing: EasingFunction,
    pub state: TransitionState,
    /// Elapsed time in seconds
    pub elapsed_time: f64,
    current_center: LatLng,
    current_zoom: f64,
}

impl CameraTransition {
    pub fn new(start_center: LatLng, start_zoom: f64, camera_move: &CameraMove) -> Self {
        Self {
            token: camera_move.token,
            start_center,
            start_zoom,
            target_center: camera_move.center,
            target_zoom: camera_move.zoom,
            duration: camera_move.duration.as_secs_f64(),
            easing: camera_move.easing,
            state: TransitionState::Running,
            elapsed_time: 0.0,
            current_center: start_center,
            current_zoom: start_zoom,
        }
    }

    /// Advances by `delta_time` seconds; returns true while the camera moved
    pub fn update(&mut self, delta_time: f64) -> bool {
        if self.state != TransitionState::Running {
            return false;
        }

        self.elapsed_time += delta_time.max(0.0);
        let progress = self.progress();
        let eased = self.easing.apply(progress);

        self.current_center =
            Interpolation::lat_lng(&self.start_center, &self.target_center, eased);
        self.current_zoom = Interpolation::linear(self.start_zoom, self.target_zoom, eased);

        if progress >= 1.0 {
            self.complete();
        }
        true
    }

    fn complete(&mut self) {
        self.state = TransitionState::Completed;
        self.current_center = self.target_center;
        self.current_zoom = self.target_zoom;
    }

    pub fn cancel(&mut self) {
        if self.state == TransitionState::Running {
            self.state = TransitionState::Cancelled;
        }
    }

    pub fn current(&self) -> (LatLng, f64) {
        (self.current_center, self.current_zoom)
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            TransitionState::Completed | TransitionState::Cancelled
        )
    }

    /// Get the current progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed_time / self.duration).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn camera_move(duration_ms: u64) -> CameraMove {
        CameraMove {
            center: LatLng::new(10.0, 20.0),
            zoom: 12.0,
            duration: Duration::from_millis(duration_ms),
            easing: EasingFunction::Linear,
            token: NavigationToken::new(1),
        }
    }

    #[test]
    fn test_transition_progress() {
        let mut transition = CameraTransition::new(LatLng::new(0.0, 0.0), 4.0, &camera_move(1000));

        assert!(transition.update(0.5));
        let (center, zoom) = transition.current();
        assert!((center.lat - 5.0).abs() < 1e-9);
        assert!((zoom - 8.0).abs() < 1e-9);
        assert!(!transition.is_finished());

        assert!(transition.update(0.6));
        assert_eq!(transition.state, TransitionState::Completed);
        assert_eq!(transition.current(), (LatLng::new(10.0, 20.0), 12.0));
        assert!(!transition.update(0.1));
    }

    #[test]
    fn test_zero_duration_completes_on_first_update() {
        let mut transition = CameraTransition::new(LatLng::new(0.0, 0.0), 4.0, &camera_move(0));
        transition.update(0.0);
        assert!(transition.is_finished());
        assert_eq!(transition.current().1, 12.0);
    }

    #[test]
    fn test_cancel_stops_updates() {
        let mut transition = CameraTransition::new(LatLng::new(0.0, 0.0), 4.0, &camera_move(1000));
        transition.update(0.2);
        transition.cancel();
        assert_eq!(transition.state, TransitionState::Cancelled);
        assert!(!transition.update(0.2));
    }
}
