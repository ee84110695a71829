//! The orbit camera: a spherical pose around the origin, driven by drag and scroll gestures.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use log::{debug, warn};
use nalgebra::{Point2, Point3, Unit, Vector2, Vector3};

use crate::input::Button;
use crate::transform::Transform;

/// The smallest radius the camera may be zoomed to.
pub const MIN_RADIUS: f32 = 1e-3;

/// Radians per pixel of pointer movement, per axis.
pub const DRAG_SENSITIVITY: Vector2<f32> = Vector2::new(1. / 400., 1. / 400.);

/// Fraction of the radius removed per unit of scroll.
pub const SCROLL_FACTOR: f32 = 0.01;

/// Wrap an angle into `[0, 2π)`. `rem_euclid` rounds tiny negative angles up to exactly `TAU`.
fn wrap_azimuth(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.
    } else {
        wrapped
    }
}

/// A position in spherical coordinates, with `y` up. The polar angle is measured from `+y`, and
/// the azimuth is measured in the xz plane from `+z` towards `+x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    radius: f32,
    polar: f32,
    azimuth: f32,
}

impl Spherical {
    pub fn new(radius: f32, polar: f32, azimuth: f32) -> Self {
        Self {
            radius: radius.max(MIN_RADIUS),
            polar: polar.clamp(0., PI),
            azimuth: wrap_azimuth(azimuth),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// The cartesian position of the pose.
    pub fn position(&self) -> Point3<f32> {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        Point3::new(
            self.radius * sin_polar * sin_az,
            self.radius * cos_polar,
            self.radius * sin_polar * cos_az,
        )
    }

    /// The local frame at the pose: `z` points away from the origin, `x` follows increasing
    /// azimuth, and `y` completes the right-handed frame. `x` only depends on the azimuth, so the
    /// frame stays well defined at the poles.
    pub fn tangent_frame(&self) -> Transform {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();

        let z = Unit::new_normalize(Vector3::new(sin_polar * sin_az, cos_polar, sin_polar * cos_az));
        let x = Unit::new_normalize(Vector3::new(cos_az, 0., -sin_az));
        let y = Unit::new_normalize(z.cross(&x));

        Transform::from_frame(&x, &y, &z, &self.position())
    }
}

impl Default for Spherical {
    fn default() -> Self {
        Self::new(3., FRAC_PI_2, 0.)
    }
}

/// Whether a drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrbitState {
    #[default]
    Idle,
    Orbiting,
}

#[derive(Debug, Clone, Default)]
pub struct OrbitControl {
    pose: Spherical,
    state: OrbitState,
    previous: Option<Point2<f32>>,
}

impl OrbitControl {
    pub fn new(pose: Spherical) -> Self {
        Self {
            pose,
            state: OrbitState::Idle,
            previous: None,
        }
    }

    pub fn pose(&self) -> &Spherical {
        &self.pose
    }

    pub fn state(&self) -> OrbitState {
        self.state
    }

    pub fn button_pressed(&mut self, button: Button) {
        if button == Button::Left {
            self.state = OrbitState::Orbiting;
        }
    }

    pub fn button_released(&mut self, button: Button) {
        if button == Button::Left {
            self.state = OrbitState::Idle;
        }
    }

    /// Handle the pointer moving to `(x, y)`, in window coordinates with the origin at the top
    /// left. The position is remembered in every state so that starting a drag later doesn't
    /// jump.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let position = Point2::new(x, y);

        if let (OrbitState::Orbiting, Some(previous)) = (self.state, self.previous) {
            let angles = (position - previous).component_mul(&DRAG_SENSITIVITY);

            // The object should turn with the pointer, so the camera turns the opposite way.
            self.pose = Spherical {
                radius: self.pose.radius,
                polar: (self.pose.polar - angles.y).clamp(0., PI),
                azimuth: wrap_azimuth(self.pose.azimuth - angles.x),
            };
        }

        self.previous = Some(position);
    }

    /// Zoom by a relative amount. Scrolling up (positive `dy`) moves the camera in.
    pub fn scrolled(&mut self, dy: f32) {
        let factor = 1. - dy * SCROLL_FACTOR;
        if !(factor.is_finite() && factor > 0.) {
            warn!("ignoring scroll of {} that would collapse the orbit", dy);
            return;
        }

        self.pose.radius = (self.pose.radius * factor).max(MIN_RADIUS);
        debug!("orbit radius is now {}", self.pose.radius);
    }

    /// The camera-to-world transform for the current pose.
    pub fn camera_to_world(&self) -> Transform {
        self.pose.tangent_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::ApplyTransform;
    use approx::assert_abs_diff_eq;

    fn orbiting() -> OrbitControl {
        let mut control = OrbitControl::new(Spherical::new(5., 1.2, 1.));
        control.pointer_moved(100., 100.);
        control.button_pressed(Button::Left);
        control
    }

    #[test]
    fn test_state_transitions() {
        let mut control = OrbitControl::default();
        assert_eq!(OrbitState::Idle, control.state());

        control.button_pressed(Button::Right);
        assert_eq!(OrbitState::Idle, control.state());

        control.button_pressed(Button::Left);
        assert_eq!(OrbitState::Orbiting, control.state());

        control.button_released(Button::Middle);
        assert_eq!(OrbitState::Orbiting, control.state());

        control.button_released(Button::Left);
        assert_eq!(OrbitState::Idle, control.state());
    }

    #[test]
    fn test_idle_moves_do_not_rotate() {
        let mut control = OrbitControl::new(Spherical::new(5., 1.2, 1.));
        control.pointer_moved(0., 0.);
        control.pointer_moved(300., 200.);
        assert_eq!(Spherical::new(5., 1.2, 1.), *control.pose());
    }

    #[test]
    fn test_drag_subtracts_scaled_delta() {
        let mut control = orbiting();
        control.pointer_moved(140., 80.);
        assert_abs_diff_eq!(1. - 40. / 400., control.pose().azimuth(), epsilon = 1e-6);
        assert_abs_diff_eq!(1.2 + 20. / 400., control.pose().polar(), epsilon = 1e-6);
    }

    #[test]
    fn test_drag_round_trip() {
        let mut control = orbiting();
        let start = *control.pose();

        for (x, y) in [(150., 120.), (90., 180.), (130., 60.), (100., 100.)] {
            control.pointer_moved(x, y);
        }

        assert_abs_diff_eq!(start.azimuth(), control.pose().azimuth(), epsilon = 1e-5);
        assert_abs_diff_eq!(start.polar(), control.pose().polar(), epsilon = 1e-5);
        assert_eq!(start.radius(), control.pose().radius());
    }

    #[test]
    fn test_polar_clamp() {
        let mut control = orbiting();
        let mut y = 100.;
        for _ in 0..50 {
            y += 10_000.;
            control.pointer_moved(100., y);
            let polar = control.pose().polar();
            assert!((0. ..=PI).contains(&polar), "{}", polar);
        }
        assert_eq!(0., control.pose().polar());

        for _ in 0..50 {
            y -= 1e7;
            control.pointer_moved(100., y);
            let polar = control.pose().polar();
            assert!((0. ..=PI).contains(&polar), "{}", polar);
        }
        assert_eq!(PI, control.pose().polar());
    }

    #[test]
    fn test_azimuth_wraps() {
        let mut control = orbiting();
        control.pointer_moved(100. + 400. * 10., 100.);
        let azimuth = control.pose().azimuth();
        assert!((0. ..TAU).contains(&azimuth), "{}", azimuth);
    }

    #[test]
    fn test_tiny_negative_azimuth_wraps_to_zero() {
        assert_eq!(0., Spherical::new(1., 1., -1e-8).azimuth());

        let mut control = OrbitControl::default();
        control.pointer_moved(100., 100.);
        control.button_pressed(Button::Left);
        control.pointer_moved(100.00001, 100.);
        let azimuth = control.pose().azimuth();
        assert!((0. ..TAU).contains(&azimuth), "{}", azimuth);
    }

    #[test]
    fn test_no_jump_after_idle_moves() {
        let mut control = OrbitControl::new(Spherical::new(5., 1.2, 1.));
        control.pointer_moved(0., 0.);
        control.pointer_moved(500., 500.);
        control.button_pressed(Button::Left);
        control.pointer_moved(500., 500.);
        assert_eq!(Spherical::new(5., 1.2, 1.), *control.pose());
    }

    #[test]
    fn test_first_move_while_orbiting_does_not_jump() {
        let mut control = OrbitControl::new(Spherical::new(5., 1.2, 1.));
        control.button_pressed(Button::Left);
        control.pointer_moved(320., 240.);
        assert_eq!(Spherical::new(5., 1.2, 1.), *control.pose());
    }

    #[test]
    fn test_scroll() {
        let mut control = OrbitControl::new(Spherical::new(5., 1.2, 1.));

        control.scrolled(0.);
        assert_eq!(5., control.pose().radius());

        control.scrolled(10.);
        assert!(control.pose().radius() < 5.);
        assert_abs_diff_eq!(4.5, control.pose().radius(), epsilon = 1e-6);

        control.scrolled(-10.);
        assert_abs_diff_eq!(4.95, control.pose().radius(), epsilon = 1e-6);

        let before = control.pose().radius();
        control.scrolled(100.);
        assert_eq!(before, control.pose().radius());
        control.scrolled(1e9);
        assert_eq!(before, control.pose().radius());
        control.scrolled(f32::NAN);
        assert_eq!(before, control.pose().radius());

        for _ in 0..10_000 {
            control.scrolled(99.99);
        }
        assert!(control.pose().radius() >= MIN_RADIUS);
    }

    #[test]
    fn test_default_pose_looks_down_z() {
        let control = OrbitControl::new(Spherical::new(5., FRAC_PI_2, 0.));
        let frame = control.camera_to_world();

        assert_abs_diff_eq!(
            Point3::new(0., 0., 5.),
            Point3::origin().apply(&frame),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            Vector3::new(0., 0., -1.),
            Vector3::new(0., 0., -1.).apply(&frame),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            Vector3::new(0., 1., 0.),
            Vector3::new(0., 1., 0.).apply(&frame),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_camera_always_faces_origin() {
        for (polar, azimuth) in [(0., 0.), (0.3, 2.), (FRAC_PI_2, 4.), (PI, 1.)] {
            let pose = Spherical::new(4., polar, azimuth);
            let frame = pose.tangent_frame();
            let eye = Point3::origin().apply(&frame);
            let forward = Vector3::new(0., 0., -1.).apply(&frame);
            assert_abs_diff_eq!(-eye.coords.normalize(), forward, epsilon = 1e-5);
            assert_abs_diff_eq!(4., eye.coords.norm(), epsilon = 1e-5);
        }
    }
}
