use log::warn;
use nalgebra::{Point2, Point3, Unit, Vector3};

use crate::canvas::Canvas;
use crate::ray::Ray;
use crate::transform::{ApplyTransform, Transform};

/// The largest width or height a [`Viewport`] may have.
pub const MAX_DIMENSION: u32 = 16384;

/// The size in pixels of the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Create a new [`Viewport`]. Both dimensions are kept within `1..=MAX_DIMENSION`.
    pub fn new(width: u32, height: u32) -> Self {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            warn!(
                "viewport {}x{} is larger than {} pixels on a side, clamping",
                width, height, MAX_DIMENSION
            );
        }

        Self {
            width: width.clamp(1, MAX_DIMENSION),
            height: height.clamp(1, MAX_DIMENSION),
        }
    }

    /// Compute the aspect ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Allocate a canvas that covers the viewport.
    pub fn new_canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct Sample {
    /// The point on the film where the ray originates, with `(0, 0)` at the bottom-left corner of
    /// the bottom-left pixel.
    pub film: Point2<f32>,
}

impl Sample {
    pub fn new(fx: f32, fy: f32) -> Self {
        Self {
            film: Point2::new(fx, fy),
        }
    }

    /// The sample through the center of the pixel at `(col, row)`.
    pub fn pixel_center(col: u32, row: u32) -> Self {
        Self::new(col as f32 + 0.5, row as f32 + 0.5)
    }
}

pub trait Camera {
    /// Given a [`Sample`], generate a ray.
    fn generate_ray(&self, sample: &Sample) -> Ray;
}

/// A pinhole camera looking down its local `-z` axis, with the image plane `focal_length` units
/// in front of the eye.
#[derive(Debug, Clone)]
pub struct PinholeCamera {
    viewport: Viewport,
    camera_to_world: Transform,
    focal_length: f32,
}

impl PinholeCamera {
    pub fn new(viewport: Viewport, camera_to_world: Transform, focal_length: f32) -> Self {
        Self {
            viewport,
            camera_to_world,
            focal_length,
        }
    }

    /// Map a film position into `[-1, 1]` on both axes, with the horizontal extent stretched by
    /// the aspect ratio.
    pub fn film_to_screen(&self, film: &Point2<f32>) -> Point2<f32> {
        let x = 2. * film.x / self.viewport.width as f32 - 1.;
        let y = 2. * film.y / self.viewport.height as f32 - 1.;
        Point2::new(x * self.viewport.aspect_ratio(), y)
    }
}

impl Camera for PinholeCamera {
    fn generate_ray(&self, sample: &Sample) -> Ray {
        let screen = self.film_to_screen(&sample.film);
        let direction = Vector3::new(screen.x, screen.y, -self.focal_length);
        let direction = Unit::new_normalize(direction.apply(&self.camera_to_world));
        Ray::new(Point3::origin().apply(&self.camera_to_world), direction)
    }
}
