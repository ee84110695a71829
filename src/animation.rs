use std::f32::consts::TAU;

use log::warn;
use nalgebra::Vector3;

use crate::{
    scene::{Prim, PrimitiveSet, MAX_PRIMITIVES},
    transform::Transform,
};

/// Produces the primitives for a frame. Implementations must be pure functions of `time`, so that
/// a frame can be reproduced exactly from its timestamp.
pub trait Animation: Send + Sync {
    fn primitives_at(&self, time: f32) -> PrimitiveSet;
}

/// Spheres circling the origin, bobbing up and down and spinning as they go.
#[derive(Debug, Clone, PartialEq)]
pub struct Orbiters {
    count: usize,
    radius: f32,
}

impl Orbiters {
    /// Angular speed of the orbit, in radians per second.
    const SPEED: f32 = 0.8;

    const SPHERE_RADIUS: f32 = 0.3;

    pub fn new(count: usize, radius: f32) -> Self {
        let count = if count > MAX_PRIMITIVES {
            warn!(
                "asked for {} orbiters, only {} fit in the scene",
                count, MAX_PRIMITIVES
            );
            MAX_PRIMITIVES
        } else {
            count
        };

        Self { count, radius }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    fn placement(&self, ix: usize, time: f32) -> Transform {
        let phase = ix as f32 * TAU / self.count as f32;
        let angle = time * Self::SPEED + phase;

        let center = Vector3::new(
            self.radius * angle.sin(),
            0.5 * (2. * time + phase).sin(),
            self.radius * angle.cos(),
        );

        Transform::new()
            .uniform_scale(1. + 0.25 * (time + phase).sin())
            .rotate(&(Vector3::y() * (time + phase)))
            .translate(&center)
    }
}

impl Animation for Orbiters {
    fn primitives_at(&self, time: f32) -> PrimitiveSet {
        let sphere = Prim::Sphere {
            radius: Self::SPHERE_RADIUS,
        };
        PrimitiveSet::from_placements((0..self.count).map(|ix| (sphere, self.placement(ix, time))))
    }
}

/// A fixed arrangement that ignores time.
#[derive(Debug, Clone, PartialEq)]
pub struct Still {
    placements: Vec<(Prim, Transform)>,
}

impl Still {
    pub fn new(placements: Vec<(Prim, Transform)>) -> Self {
        if placements.len() > MAX_PRIMITIVES {
            warn!(
                "{} placements given, only the first {} will be drawn",
                placements.len(),
                MAX_PRIMITIVES
            );
        }
        Self { placements }
    }

    /// A unit sphere at the origin.
    pub fn single() -> Self {
        Self::new(vec![(Prim::Sphere { radius: 1. }, Transform::new())])
    }

    /// One of each primitive shape, side by side.
    pub fn shapes() -> Self {
        Self::new(vec![
            (
                Prim::Sphere { radius: 0.5 },
                Transform::new().translate(&Vector3::new(-1.5, 0., 0.)),
            ),
            (
                Prim::Box {
                    width: 0.4,
                    height: 0.4,
                    depth: 0.4,
                },
                Transform::new().rotate(&Vector3::new(0.3, 0.6, 0.)),
            ),
            (
                Prim::Torus {
                    hole: 0.4,
                    radius: 0.15,
                },
                Transform::new()
                    .rotate(&Vector3::new(1., 0., 0.))
                    .translate(&Vector3::new(1.5, 0., 0.)),
            ),
        ])
    }
}

impl Animation for Still {
    fn primitives_at(&self, _time: f32) -> PrimitiveSet {
        PrimitiveSet::from_placements(self.placements.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;

    #[test]
    fn test_deterministic() {
        let anim = Orbiters::new(5, 1.5);
        for time in [0., 0.016, 1.25, 1000.5] {
            assert_eq!(anim.primitives_at(time), anim.primitives_at(time));
        }

        // a fresh animation with the same parameters agrees too
        assert_eq!(
            anim.primitives_at(3.7),
            Orbiters::new(5, 1.5).primitives_at(3.7)
        );
    }

    #[test]
    fn test_orbiters_move() {
        let anim = Orbiters::new(3, 1.5);
        assert_eq!(3, anim.primitives_at(0.).len());
        assert_ne!(anim.primitives_at(0.), anim.primitives_at(0.5));
    }

    #[test]
    fn test_orbiters_clamped() {
        let anim = Orbiters::new(20, 1.);
        assert_eq!(MAX_PRIMITIVES, anim.count());
        assert_eq!(MAX_PRIMITIVES, anim.primitives_at(2.).len());
    }

    #[test]
    fn test_no_orbiters() {
        let anim = Orbiters::new(0, 1.);
        assert!(anim.primitives_at(1.).is_empty());
    }

    #[test]
    fn test_orbiter_surface() {
        // at t = 0 the first orbiter sits at (0, 0, radius) with unit scale
        let anim = Orbiters::new(1, 2.);
        let set = anim.primitives_at(0.);
        assert_abs_diff_eq!(
            0.,
            set.distance(&Point3::new(0., 0., 2. + Orbiters::SPHERE_RADIUS)),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_still_ignores_time() {
        let anim = Still::shapes();
        assert_eq!(3, anim.primitives_at(0.).len());
        assert_eq!(anim.primitives_at(0.), anim.primitives_at(10.));
    }

    #[test]
    fn test_still_clamped() {
        let placements = vec![(Prim::Sphere { radius: 1. }, Transform::new()); 10];
        let anim = Still::new(placements);
        assert_eq!(MAX_PRIMITIVES, anim.primitives_at(0.).len());
    }
}
