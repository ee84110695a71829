use nalgebra::{Point3, Unit, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    pub position: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    /// Construct a new ray.
    pub fn new(position: Point3<f32>, direction: Unit<Vector3<f32>>) -> Ray {
        Ray {
            position,
            direction,
        }
    }

    /// Move the position of the ray along `direction` by `amount`.
    #[inline]
    pub fn step(&mut self, amount: f32) {
        self.position += self.direction.scale(amount);
    }
}

#[test]
fn test_step() {
    let mut ray = Ray::new(Point3::new(0., 0., 5.), -Vector3::z_axis());
    ray.step(2.);
    assert_eq!(Point3::new(0., 0., 3.), ray.position);
    ray.step(3.);
    assert_eq!(Point3::new(0., 0., 0.), ray.position);
}
