use std::time::Instant;

use log::{debug, error, info};

use crate::{
    animation::Animation,
    camera::Viewport,
    canvas::Canvas,
    input::{InputEvent, Key},
    orbit::OrbitControl,
    pipeline::PipelineContext,
    render::{render, FrameInputs},
    scene::PrimitiveSet,
};

/// How often the frame rate is reported, in seconds.
const FPS_REFRESH_PERIOD: f64 = 0.3;

/// Averages the frame rate over windows of [`FPS_REFRESH_PERIOD`].
#[derive(Debug, Default)]
pub struct FrameCounter {
    elapsed: f64,
    frames: u32,
}

impl FrameCounter {
    /// Count a frame that took `seconds`. Returns the average rate when a window closes.
    pub fn tick(&mut self, seconds: f64) -> Option<f64> {
        self.elapsed += seconds;
        self.frames += 1;

        if self.elapsed < FPS_REFRESH_PERIOD {
            return None;
        }

        let fps = self.frames as f64 / self.elapsed;
        self.elapsed = 0.;
        self.frames = 0;
        Some(fps)
    }
}

/// The control loop. Input is applied between frames, and each frame renders from a snapshot taken
/// after all preceding input has been handled.
pub struct App {
    pipeline: PipelineContext,
    camera: OrbitControl,
    animation: Box<dyn Animation>,
    primitives: PrimitiveSet,
    viewport: Viewport,
    threads: usize,
    running: bool,
    counter: FrameCounter,
}

impl App {
    pub fn new(
        pipeline: PipelineContext,
        animation: Box<dyn Animation>,
        viewport: Viewport,
        threads: usize,
    ) -> Self {
        Self {
            pipeline,
            camera: OrbitControl::default(),
            primitives: animation.primitives_at(0.),
            animation,
            viewport,
            threads,
            running: true,
            counter: FrameCounter::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn camera(&self) -> &OrbitControl {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn pipeline(&self) -> &PipelineContext {
        &self.pipeline
    }

    /// Apply a single input event. Frame events are driven through [`App::update`] and
    /// [`App::draw`] instead, and are ignored here.
    pub fn handle(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::PointerMoved { x, y } => self.camera.pointer_moved(x, y),
            InputEvent::ButtonPressed(button) => self.camera.button_pressed(button),
            InputEvent::ButtonReleased(button) => self.camera.button_released(button),
            InputEvent::Scrolled { dy } => self.camera.scrolled(dy),

            InputEvent::KeyPressed(Key::Reload) => match self.pipeline.reload() {
                Ok(()) => info!("reloaded pipeline `{}`", self.pipeline.path().display()),
                Err(err) => error!("cannot reload pipeline, keeping the previous one: {}", err),
            },

            InputEvent::KeyPressed(Key::Escape) => {
                info!("escape pressed, stopping");
                self.running = false;
            }

            InputEvent::Resized { width, height } => {
                self.viewport = Viewport::new(width, height);
                debug!("viewport is now {}x{}", self.viewport.width, self.viewport.height);
            }

            InputEvent::Frame { .. } => (),
        }
    }

    /// Advance the scene to `time`. The whole primitive set is replaced at once.
    pub fn update(&mut self, time: f32) {
        self.primitives = self.animation.primitives_at(time);
    }

    /// Snapshot everything the next frame reads.
    pub fn frame_inputs(&self) -> FrameInputs {
        FrameInputs {
            viewport: self.viewport,
            camera_to_world: self.camera.camera_to_world(),
            primitives: self.primitives.clone(),
        }
    }

    pub fn draw(&mut self) -> anyhow::Result<Canvas> {
        let frame = self.frame_inputs();

        let start = Instant::now();
        let canvas = render(&frame, self.pipeline.pipeline(), self.threads)?;
        let took = start.elapsed();

        debug!(
            "rendered {}x{} with {} primitive(s) in {:?}",
            frame.viewport.width,
            frame.viewport.height,
            frame.primitives.len(),
            took
        );
        if let Some(fps) = self.counter.tick(took.as_secs_f64()) {
            info!("{:.1} fps", fps);
        }

        Ok(canvas)
    }

    /// Feed `events` through the loop, handing every rendered frame to `present` along with its
    /// timestamp. Stops early when escape is pressed. Returns the number of frames drawn.
    pub fn run<I, F>(&mut self, events: I, mut present: F) -> anyhow::Result<usize>
    where
        I: IntoIterator<Item = InputEvent>,
        F: FnMut(f32, &Canvas) -> anyhow::Result<()>,
    {
        let mut frames = 0;

        for event in events {
            if !self.running {
                break;
            }

            match event {
                InputEvent::Frame { time } => {
                    self.update(time);
                    let canvas = self.draw()?;
                    present(time, &canvas)?;
                    frames += 1;
                }
                event => self.handle(&event),
            }
        }

        Ok(frames)
    }
}
