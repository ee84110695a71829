use nalgebra::{Point3, Unit, Vector3};

use crate::ray::Ray;
use crate::scene::PrimitiveSet;

#[derive(Debug, Clone, PartialEq)]
pub struct MarchConfig {
    /// The most distance evaluations spent on a single ray.
    pub max_steps: u32,

    /// Distances below this count as a hit.
    pub hit_distance: f32,

    /// Rays are abandoned once the distance travelled along them, not the depth of the current
    /// position, exceeds this.
    pub far_plane: f32,
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self {
            max_steps: 20,
            hit_distance: 0.001,
            far_plane: 100.,
        }
    }
}

/// The outcome of marching a single ray. `steps` is the number of times the distance field was
/// evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum March {
    Hit { point: Point3<f32>, steps: u32 },
    Miss { steps: u32 },
}

impl March {
    pub fn steps(&self) -> u32 {
        match self {
            March::Hit { steps, .. } | March::Miss { steps } => *steps,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, March::Hit { .. })
    }
}

/// Sphere-trace `ray` through `scene`: step along the ray by the distance to the closest surface
/// until that distance drops below the hit threshold, the step budget runs out, or the ray
/// passes the far plane.
pub fn march(config: &MarchConfig, scene: &PrimitiveSet, mut ray: Ray) -> March {
    let mut depth = 0.;

    for i in 0..config.max_steps {
        let radius = scene.distance(&ray.position);

        if radius < config.hit_distance {
            return March::Hit {
                point: ray.position,
                steps: i + 1,
            };
        }

        depth += radius;

        if depth > config.far_plane {
            return March::Miss { steps: i + 1 };
        }

        ray.step(radius);
    }

    March::Miss {
        steps: config.max_steps,
    }
}

/// Offset used for the central differences in [`estimate_normal`].
pub const NORMAL_EPSILON: f32 = 1e-4;

/// Approximate the surface normal at `point` from the gradient of the distance field. Where the
/// gradient vanishes the normal is `+z`.
pub fn estimate_normal(
    scene: &PrimitiveSet,
    point: &Point3<f32>,
    epsilon: f32,
) -> Unit<Vector3<f32>> {
    let offset = Vector3::new(epsilon, 0.0, 0.0);

    let diff = |off: Vector3<f32>| scene.distance(&(point + off)) - scene.distance(&(point - off));

    let gradient = Vector3::new(
        diff(offset.xyy()),
        diff(offset.yxy()),
        diff(offset.yyx()),
    );

    if gradient.iter().all(|c| c.is_finite()) {
        Unit::try_new(gradient, f32::EPSILON * epsilon).unwrap_or_else(Vector3::z_axis)
    } else {
        Vector3::z_axis()
    }
}
