pub mod animation;
pub mod app;
pub mod camera;
pub mod canvas;
pub mod input;
pub mod march;
pub mod orbit;
pub mod parser;
pub mod pipeline;
pub mod ray;
pub mod render;
pub mod scene;
pub mod script;
pub mod shading;
pub mod transform;
