use nalgebra::{Unit, Vector3};

use crate::{
    canvas::Color,
    march::{estimate_normal, March, MarchConfig, NORMAL_EPSILON},
    scene::PrimitiveSet,
};

/// What a hit turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    /// Diffuse lighting from a single directional light, plus an ambient term.
    #[default]
    Lambert,

    /// The surface normal mapped into RGB.
    Normals,

    /// How much of the step budget was left when the ray hit.
    Steps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shader {
    pub shading: Shading,

    /// Direction towards the light.
    pub light: Unit<Vector3<f32>>,

    pub albedo: Color,

    /// Emitted for rays that miss.
    pub background: Color,

    pub diffuse: f32,
    pub ambient: f32,
}

impl Default for Shader {
    fn default() -> Self {
        Self {
            shading: Shading::Lambert,
            light: Unit::new_normalize(Vector3::new(1., 1., 1.)),
            albedo: Color::new(0.9, 0.7, 0.5),
            background: Color::black(),
            diffuse: 0.7,
            ambient: 0.3,
        }
    }
}

impl Shader {
    /// The color of a single marched ray.
    pub fn shade(&self, config: &MarchConfig, scene: &PrimitiveSet, res: &March) -> Color {
        let point = match res {
            March::Hit { point, .. } => point,
            March::Miss { .. } => return self.background,
        };

        match self.shading {
            Shading::Lambert => {
                let normal = estimate_normal(scene, point, NORMAL_EPSILON);
                self.lambert(&normal)
            }

            Shading::Normals => {
                let normal = estimate_normal(scene, point, NORMAL_EPSILON);
                Color::new(
                    0.5 + normal.x / 2.0,
                    0.5 + normal.y / 2.0,
                    0.5 + normal.z / 2.0,
                )
            }

            Shading::Steps => {
                let step_val = 1.0 - (res.steps() as f32) / (config.max_steps as f32);
                Color::new(step_val, 0.0, step_val)
            }
        }
    }

    /// Light a surface with the given normal.
    pub fn lambert(&self, normal: &Unit<Vector3<f32>>) -> Color {
        let intensity = normal.dot(self.light.as_ref()).max(0.0);
        self.albedo * (self.diffuse * intensity + self.ambient)
    }
}
