//! The per-pixel pipeline: everything about turning a pixel into a color that isn't scene or
//! camera state. Pipelines are built from a source file and swapped in whole.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use nalgebra::Unit;
use thiserror::Error;

use crate::{
    march::MarchConfig,
    parser::{self, Parser},
    shading::{Shader, Shading},
};

/// Extension of pipeline sources.
pub const EXTENSION: &str = "pipeline";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{source}", path.display())]
    Build {
        path: PathBuf,
        #[source]
        source: parser::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub march: MarchConfig,

    /// Distance from the eye to the image plane.
    pub focal_length: f32,

    pub shader: Shader,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            march: MarchConfig::default(),
            focal_length: 1.,
            shader: Shader::default(),
        }
    }
}

impl Pipeline {
    /// Build a pipeline from source text. Forms that are left out keep their defaults.
    pub fn parse(source: &str) -> parser::Result<Pipeline> {
        let mut pipeline = Pipeline::default();
        let mut parser = Parser::new(source);

        parser.forms(|p, head| {
            match head.text.as_str() {
                "march" => p.keywords(|p, key| {
                    let march = &mut pipeline.march;
                    match key.text.as_str() {
                        ":max-steps" => {
                            march.max_steps = p.count()?;
                            if march.max_steps == 0 {
                                return Err(p.invalid(key, "the step budget must be positive"));
                            }
                        }
                        ":hit-distance" => march.hit_distance = positive(p, key)?,
                        ":far-plane" => march.far_plane = positive(p, key)?,
                        _ => return Err(p.invalid(key, format!("unknown key `{}`", key.text))),
                    }
                    Ok(())
                })?,

                "camera" => p.keywords(|p, key| match key.text.as_str() {
                    ":focal-length" => {
                        pipeline.focal_length = positive(p, key)?;
                        Ok(())
                    }
                    _ => Err(p.invalid(key, format!("unknown key `{}`", key.text))),
                })?,

                "light" => {
                    let dir = p.vector()?;
                    pipeline.shader.light = Unit::try_new(dir, f32::EPSILON)
                        .ok_or_else(|| p.invalid(head, "the light direction must be non-zero"))?;
                }

                "albedo" => pipeline.shader.albedo = p.color()?,

                "background" => pipeline.shader.background = p.color()?,

                "split" => p.keywords(|p, key| {
                    let shader = &mut pipeline.shader;
                    match key.text.as_str() {
                        ":diffuse" => shader.diffuse = p.number()?,
                        ":ambient" => shader.ambient = p.number()?,
                        _ => return Err(p.invalid(key, format!("unknown key `{}`", key.text))),
                    }
                    Ok(())
                })?,

                "shading" => {
                    let mode = p.ident()?;
                    pipeline.shader.shading = match mode.text.as_str() {
                        "lambert" => Shading::Lambert,
                        "normals" => Shading::Normals,
                        "steps" => Shading::Steps,
                        _ => {
                            return Err(p.invalid(&mode, format!("unknown shading `{}`", mode.text)))
                        }
                    };
                }

                _ => return Err(p.invalid(head, format!("unknown form `{}`", head.text))),
            }
            Ok(())
        })?;

        Ok(pipeline)
    }

    /// Read and build the pipeline at `path`.
    pub fn load(path: &Path) -> Result<Pipeline, PipelineError> {
        let source = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Pipeline::parse(&source).map_err(|source| PipelineError::Build {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn positive(p: &mut Parser, key: &parser::Lexeme) -> parser::Result<f32> {
    let value = p.number()?;
    if value > 0. {
        Ok(value)
    } else {
        Err(p.invalid(key, format!("`{}` must be positive", key.text)))
    }
}

/// Owns the active pipeline, and knows where to rebuild it from.
#[derive(Debug)]
pub struct PipelineContext {
    path: PathBuf,
    active: Pipeline,
}

impl PipelineContext {
    /// Build the pipeline called `name` from the sources in `dir`.
    pub fn load(dir: &Path, name: &str) -> Result<Self, PipelineError> {
        let path = dir.join(name).with_extension(EXTENSION);
        let active = Pipeline::load(&path)?;
        info!("built pipeline `{}`", path.display());
        Ok(Self { path, active })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.active
    }

    /// Rebuild from disk. The active pipeline is only replaced when the build succeeds.
    pub fn reload(&mut self) -> Result<(), PipelineError> {
        self.active = Pipeline::load(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Color;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    /// A scratch directory under the system temp dir, removed on drop.
    struct Scratch(PathBuf);

    impl Scratch {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("raymarch-{}-{}", name, std::process::id()));
            fs::create_dir_all(&dir).unwrap();
            Scratch(dir)
        }

        fn write(&self, name: &str, source: &str) {
            fs::write(self.0.join(name).with_extension(EXTENSION), source).unwrap();
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_empty_source_is_default() {
        assert_eq!(Pipeline::default(), Pipeline::parse("; nothing here\n").unwrap());
    }

    #[test]
    fn test_parse_everything() {
        let pipeline = Pipeline::parse(
            r#"
            (march :max-steps 64 :hit-distance 0.01 :far-plane 50)
            (camera :focal-length 1.5)
            (light (0 2 0))
            (albedo #ff8000)
            (background #0000ff)
            (split :diffuse 0.5 :ambient 0.5)
            (shading normals)
            "#,
        )
        .unwrap();

        assert_eq!(
            MarchConfig {
                max_steps: 64,
                hit_distance: 0.01,
                far_plane: 50.,
            },
            pipeline.march
        );
        assert_eq!(1.5, pipeline.focal_length);
        assert_abs_diff_eq!(Vector3::new(0., 1., 0.), pipeline.shader.light.into_inner());
        assert_eq!(Color::new(1., 128. / 255., 0.), pipeline.shader.albedo);
        assert_eq!(Color::new(0., 0., 1.), pipeline.shader.background);
        assert_eq!(0.5, pipeline.shader.diffuse);
        assert_eq!(0.5, pipeline.shader.ambient);
        assert_eq!(Shading::Normals, pipeline.shader.shading);
    }

    #[test]
    fn test_exponent_numbers() {
        let pipeline = Pipeline::parse("(march :hit-distance 1e-4 :far-plane 1.5e2)").unwrap();
        assert_eq!(1e-4, pipeline.march.hit_distance);
        assert_eq!(150., pipeline.march.far_plane);
    }

    #[test]
    fn test_rejects_bad_sources() {
        for source in [
            "(march :max-steps 0)",
            "(march :max-steps 2.5)",
            "(march :hit-distance -1)",
            "(march :bogus 1)",
            "(camera :focal-length 0)",
            "(light (0 0 0))",
            "(shading phong)",
            "(fog 1)",
            "(albedo #fff)",
            "(albedo #ffffff",
            "albedo",
        ] {
            assert!(Pipeline::parse(source).is_err(), "{}", source);
        }
    }

    #[test]
    fn test_error_has_position() {
        let err = Pipeline::parse("(march :max-steps 20)\n(shading phong)").unwrap_err();
        assert_eq!("2:10: unknown shading `phong`", err.to_string());
    }

    #[test]
    fn test_missing_file() {
        let scratch = Scratch::new("missing");
        let err = PipelineContext::load(&scratch.0, "nope").unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn test_reload_keeps_previous_on_failure() {
        let scratch = Scratch::new("reload");
        scratch.write("main", "(shading steps)");

        let mut ctx = PipelineContext::load(&scratch.0, "main").unwrap();
        assert_eq!(Shading::Steps, ctx.pipeline().shader.shading);

        scratch.write("main", "(shading");
        let err = ctx.reload().unwrap_err();
        assert!(matches!(err, PipelineError::Build { .. }));
        assert_eq!(Shading::Steps, ctx.pipeline().shader.shading);

        scratch.write("main", "(shading normals)");
        ctx.reload().unwrap();
        assert_eq!(Shading::Normals, ctx.pipeline().shader.shading);
    }

    #[test]
    fn test_shipped_pipelines_build() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
        for name in ["raymarch", "normals", "steps"] {
            PipelineContext::load(&dir, name).unwrap();
        }
    }
}
