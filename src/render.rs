use anyhow::anyhow;
use crossbeam::{channel, thread};

use crate::{
    camera::{Camera, PinholeCamera, Sample, Viewport},
    canvas::{Canvas, Color},
    march::march,
    pipeline::Pipeline,
    scene::PrimitiveSet,
    transform::Transform,
};

/// The width and height of a tile, in pixels.
const TILE_SIZE: u32 = 16;

/// Everything a frame reads, fixed before the first pixel is computed.
#[derive(Debug, Clone)]
pub struct FrameInputs {
    pub viewport: Viewport,
    pub camera_to_world: Transform,
    pub primitives: PrimitiveSet,
}

impl FrameInputs {
    pub fn camera(&self, pipeline: &Pipeline) -> PinholeCamera {
        PinholeCamera::new(
            self.viewport,
            self.camera_to_world.clone(),
            pipeline.focal_length,
        )
    }
}

/// Compute the color seen through a single film sample.
pub fn luminance(
    camera: &impl Camera,
    primitives: &PrimitiveSet,
    pipeline: &Pipeline,
    sample: &Sample,
) -> Color {
    let ray = camera.generate_ray(sample);
    let res = march(&pipeline.march, primitives, ray);
    pipeline.shader.shade(&pipeline.march, primitives, &res)
}

/// An individual tile in the rendering target.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tile {
    offset_x: u32,
    offset_y: u32,
    width: u32,
    height: u32,
}

impl Tile {
    fn render(
        &self,
        camera: &impl Camera,
        primitives: &PrimitiveSet,
        pipeline: &Pipeline,
    ) -> Canvas {
        let mut chunk = Canvas::new(self.width, self.height);
        for ((col, row), pixel) in chunk.coords().zip(chunk.pixels_mut()) {
            let sample = Sample::pixel_center(col + self.offset_x, row + self.offset_y);
            *pixel = luminance(camera, primitives, pipeline, &sample);
        }
        chunk
    }
}

/// An iterator for tiles in a rendering target.
#[derive(Debug)]
struct Tiles {
    width: u32,
    height: u32,
    chunks_x: u32,
    chunks_y: u32,
    x: u32,
    y: u32,
}

impl Tiles {
    fn new(viewport: &Viewport) -> Self {
        Self {
            width: viewport.width,
            height: viewport.height,
            chunks_x: viewport.width.div_ceil(TILE_SIZE),
            chunks_y: viewport.height.div_ceil(TILE_SIZE),
            x: 0,
            y: 0,
        }
    }

    fn total(&self) -> usize {
        self.chunks_x as usize * self.chunks_y as usize
    }
}

impl Iterator for Tiles {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.x >= self.chunks_x {
            self.x = 0;
            self.y += 1;
        }

        if self.y >= self.chunks_y {
            return None;
        }

        let offset_x = self.x * TILE_SIZE;
        let offset_y = self.y * TILE_SIZE;

        self.x += 1;

        Some(Tile {
            offset_x,
            offset_y,
            width: (self.width - offset_x).min(TILE_SIZE),
            height: (self.height - offset_y).min(TILE_SIZE),
        })
    }
}

/// Render a whole frame, spreading tiles over `num_threads` workers.
pub fn render(
    frame: &FrameInputs,
    pipeline: &Pipeline,
    num_threads: usize,
) -> anyhow::Result<Canvas> {
    let mut canvas = frame.viewport.new_canvas();
    let camera = frame.camera(pipeline);
    let primitives = &frame.primitives;

    let (input, tiles) = channel::unbounded::<Tile>();
    let (results, chunks) = channel::unbounded();

    let tiles_to_render = Tiles::new(&frame.viewport);
    let expecting = tiles_to_render.total();

    thread::scope(|s| {
        for _ in 0..num_threads.max(1) {
            let results = results.clone();
            let tiles = tiles.clone();
            let camera = &camera;
            s.spawn(move |_| {
                for tile in tiles {
                    let chunk = tile.render(camera, primitives, pipeline);
                    if results.send((tile.offset_x, tile.offset_y, chunk)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(results);

        // The workers exit once every tile has been handed out.
        for tile in tiles_to_render {
            if input.send(tile).is_err() {
                break;
            }
        }
        drop(input);

        for (offset_x, offset_y, chunk) in chunks.iter().take(expecting) {
            canvas.blit(offset_x, offset_y, &chunk);
        }
    })
    .map_err(|_| anyhow!("a render worker panicked"))?;

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        march::{estimate_normal, March, NORMAL_EPSILON},
        scene::Prim,
        shading::Shading,
    };
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn sphere_ahead(viewport: Viewport) -> FrameInputs {
        FrameInputs {
            viewport,
            camera_to_world: Transform::new().translate(&Vector3::new(0., 0., 5.)),
            primitives: PrimitiveSet::from_placements([(
                Prim::Sphere { radius: 1. },
                Transform::new().translate(&Vector3::new(0., 0., -3.)),
            )]),
        }
    }

    #[test]
    fn test_tiles_cover_viewport() {
        let viewport = Viewport::new(37, 21);
        let tiles: Vec<Tile> = Tiles::new(&viewport).collect();
        assert_eq!(Tiles::new(&viewport).total(), tiles.len());
        assert_eq!(6, tiles.len());

        let mut covered = vec![0; 37 * 21];
        for tile in &tiles {
            for row in tile.offset_y..tile.offset_y + tile.height {
                for col in tile.offset_x..tile.offset_x + tile.width {
                    covered[(row * 37 + col) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&n| n == 1));

        assert_eq!(
            Tile {
                offset_x: 32,
                offset_y: 16,
                width: 5,
                height: 5,
            },
            tiles[5]
        );
    }

    #[test]
    fn test_tiles_for_huge_dimensions() {
        let viewport = Viewport {
            width: u32::MAX,
            height: u32::MAX,
        };
        let mut tiles = Tiles::new(&viewport);
        assert_eq!(268_435_456 * 268_435_456, tiles.total());

        tiles.x = tiles.chunks_x - 1;
        let last_column = tiles.next().unwrap();
        assert_eq!(u32::MAX - 15, last_column.offset_x);
        assert_eq!(15, last_column.width);
    }

    #[test]
    fn test_central_pixel_hits_facing_surface() {
        let viewport = Viewport::new(33, 33);
        let frame = sphere_ahead(viewport);
        let pipeline = Pipeline::default();
        let camera = frame.camera(&pipeline);

        let center = Sample::pixel_center(viewport.width / 2, viewport.height / 2);
        let ray = camera.generate_ray(&center);
        let res = march(&pipeline.march, &frame.primitives, ray);
        let point = match res {
            March::Hit { point, .. } => point,
            March::Miss { .. } => panic!("central ray missed"),
        };
        assert_abs_diff_eq!(-2., point.z, epsilon = 1e-2);

        let normal = estimate_normal(&frame.primitives, &point, NORMAL_EPSILON);
        assert_abs_diff_eq!(Vector3::z(), normal.into_inner(), epsilon = 1e-2);
    }

    #[test]
    fn test_corner_pixel_misses() {
        let frame = sphere_ahead(Viewport::new(33, 33));
        let pipeline = Pipeline::default();
        let canvas = render(&frame, &pipeline, 2).unwrap();
        assert_eq!(pipeline.shader.background, *canvas.get(0, 0));
        assert_ne!(pipeline.shader.background, *canvas.get(16, 16));
    }

    #[test]
    fn test_threads_agree() {
        let frame = sphere_ahead(Viewport::new(40, 23));
        let pipeline = Pipeline {
            shader: crate::shading::Shader {
                shading: Shading::Normals,
                ..Default::default()
            },
            ..Default::default()
        };

        let single = render(&frame, &pipeline, 1).unwrap();
        let many = render(&frame, &pipeline, 4).unwrap();
        assert_eq!(single.data(), many.data());

        // zero workers still renders
        let none = render(&frame, &pipeline, 0).unwrap();
        assert_eq!(single.data(), none.data());
    }

    #[test]
    fn test_matches_per_pixel() {
        let frame = sphere_ahead(Viewport::new(20, 18));
        let pipeline = Pipeline::default();
        let camera = frame.camera(&pipeline);
        let canvas = render(&frame, &pipeline, 3).unwrap();

        for (col, row) in canvas.coords() {
            let expected = luminance(
                &camera,
                &frame.primitives,
                &pipeline,
                &Sample::pixel_center(col, row),
            );
            assert_eq!(expected, *canvas.get(col as usize, row as usize));
        }
    }
}
