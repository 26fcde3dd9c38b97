//! Matrix transforms: a translated point, then the textured quad spinning in a corner.

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use super::{Exercise, ExerciseError, FrameContext};
use crate::abs::{GlDriver, Mesh, TexturedVertex};
use crate::config::Settings;
use crate::exercises::hello_triangle::QUAD_INDICES;
use crate::exercises::textures::TexturedScene;

pub const QUAD: [TexturedVertex; 4] = [
    TexturedVertex {
        position: [0.5, 0.5, 0.0],
        color: [1.0, 1.0, 1.0],
        uv: [1.0, 1.0],
    },
    TexturedVertex {
        position: [0.5, -0.5, 0.0],
        color: [1.0, 1.0, 1.0],
        uv: [1.0, 0.0],
    },
    TexturedVertex {
        position: [-0.5, -0.5, 0.0],
        color: [1.0, 1.0, 1.0],
        uv: [0.0, 0.0],
    },
    TexturedVertex {
        position: [-0.5, 0.5, 0.0],
        color: [1.0, 1.0, 1.0],
        uv: [0.0, 1.0],
    },
];

/// The point `(1, 0, 0)` moved by `(1, 1, 0)` with a translation matrix.
pub fn translation_demo() -> Vec4 {
    let trans = Mat4::from_translation(Vec3::new(1.0, 1.0, 0.0));
    trans * Vec4::new(1.0, 0.0, 0.0, 1.0)
}

/// Rotate about Z by `time` radians, then move to the bottom-right quadrant.
pub fn transform_at(time: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.5, -0.5, 0.0)) * Mat4::from_rotation_z(time)
}

pub struct Transformations<G: GlDriver = glow::Context> {
    scene: TexturedScene<G>,
    quad: Mesh<G>,
    transform: Mat4,
}

impl<G: GlDriver> Transformations<G> {
    pub fn new(gl: &Arc<G>, settings: &Settings) -> Result<Self, ExerciseError> {
        let moved = translation_demo();
        log::info!("translated (1, 0, 0) to {}", moved.truncate());

        let scene = TexturedScene::load(gl, settings, "shaders/transform.vs.glsl")?;
        let quad = Mesh::new(gl, &QUAD, &QUAD_INDICES, glow::TRIANGLES)?;
        Ok(Self {
            scene,
            quad,
            transform: Mat4::IDENTITY,
        })
    }
}

impl<G: GlDriver> Exercise for Transformations<G> {
    fn name(&self) -> &'static str {
        "transformations"
    }

    fn update(&mut self, ctx: &FrameContext) {
        self.transform = transform_at(ctx.time);
    }

    fn render(&mut self, ctx: &FrameContext) -> Result<(), ExerciseError> {
        self.scene.bind(ctx.time)?;
        self.scene.shader.set_uniform("transform", self.transform)?;
        self.quad.draw();
        Ok(())
    }

    fn release(&mut self) {
        self.quad.release();
        self.scene.release();
    }
}
