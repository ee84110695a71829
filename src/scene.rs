use log::warn;
use nalgebra::{Matrix4, Point3, Vector2, Vector3};
use thiserror::Error;

use crate::transform::Transform;

/// The number of slots in a [`PrimitiveSet`].
pub const MAX_PRIMITIVES: usize = 8;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("primitive set is full ({MAX_PRIMITIVES} slots)")]
pub struct CapacityError;

/// Primitive shapes, centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prim {
    /// A sphere with the given radius.
    Sphere { radius: f32 },

    /// A box with the given half-extents.
    Box { width: f32, height: f32, depth: f32 },

    /// A torus in the xz plane with the given hole radius and ring radius.
    Torus { hole: f32, radius: f32 },
}

impl Prim {
    /// The signed distance from `p` to the surface of the primitive. As primitives are all
    /// centered at the origin, `p` must already be in object space.
    pub fn sdf(&self, p: &Point3<f32>) -> f32 {
        let pv = p.coords;
        match *self {
            Prim::Sphere { radius } => pv.norm() - radius,

            Prim::Box {
                width,
                height,
                depth,
            } => {
                let p = pv.abs();
                let x = p.x - width;
                let y = p.y - height;
                let z = p.z - depth;
                let inside = x.max(y).max(z).min(0.0);
                Vector3::new(x.max(0.), y.max(0.), z.max(0.)).norm() + inside
            }

            Prim::Torus { hole, radius } => {
                let q = Vector2::new(pv.xz().norm() - hole, pv.y);
                q.norm() - radius
            }
        }
    }
}

/// One placed shape. Only the world-to-local side of the placement is kept, as that is the only
/// direction the distance function needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub prim: Prim,
    pub world_to_local: Matrix4<f32>,
    pub scale_factor: f32,
}

impl Primitive {
    pub fn new(prim: Prim, placement: &Transform) -> Self {
        Self {
            prim,
            world_to_local: *placement.inverse(),
            scale_factor: placement.scale_factor(),
        }
    }

    /// The distance from a world-space point to this primitive, in world units.
    #[inline]
    pub fn distance(&self, p: &Point3<f32>) -> f32 {
        let local = self.world_to_local.transform_point(p);
        self.prim.sdf(&local) * self.scale_factor
    }
}

impl Default for Primitive {
    fn default() -> Self {
        Self {
            prim: Prim::Sphere { radius: 1.0 },
            world_to_local: Matrix4::identity(),
            scale_factor: 1.0,
        }
    }
}

/// A fixed arena of [`MAX_PRIMITIVES`] slots, of which the first `count` are live. The whole set
/// is rebuilt every frame, so slots carry no identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrimitiveSet {
    slots: [Primitive; MAX_PRIMITIVES],
    count: usize,
}

impl PrimitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from placements, ignoring anything past the capacity.
    pub fn from_placements<I>(placements: I) -> Self
    where
        I: IntoIterator<Item = (Prim, Transform)>,
    {
        let mut set = Self::new();
        let mut dropped = 0;
        for (prim, placement) in placements {
            if set.push(prim, &placement).is_err() {
                dropped += 1;
            }
        }

        if dropped > 0 {
            warn!(
                "ignoring {} primitive(s) past the limit of {}",
                dropped, MAX_PRIMITIVES
            );
        }

        set
    }

    /// Add a primitive, failing when every slot is already in use.
    pub fn push(&mut self, prim: Prim, placement: &Transform) -> Result<(), CapacityError> {
        let slot = self.slots.get_mut(self.count).ok_or(CapacityError)?;
        *slot = Primitive::new(prim, placement);
        self.count += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The live primitives.
    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.slots[..self.count].iter()
    }

    /// The distance from `p` to the closest surface in the set: the union of every primitive. An
    /// empty set is infinitely far away.
    pub fn distance(&self, p: &Point3<f32>) -> f32 {
        self.iter()
            .map(|prim| prim.distance(p))
            .fold(f32::INFINITY, f32::min)
    }
}
