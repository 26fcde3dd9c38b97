//! A colored quad drawn from four vertices and six indices, tinted by a pulsing uniform.

use std::sync::Arc;

use glam::Vec4;

use super::{Exercise, ExerciseError, FrameContext, pulse};
use crate::abs::{ColorVertex, GlDriver, Mesh, ShaderProgram};
use crate::config::Settings;

pub const QUAD_VERTICES: [ColorVertex; 4] = [
    ColorVertex {
        position: [0.5, 0.5, 0.0],
        color: [1.0, 0.0, 0.0],
    },
    ColorVertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0],
    },
    ColorVertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 0.0, 1.0],
    },
    ColorVertex {
        position: [-0.5, 0.5, 0.0],
        color: [0.0, 1.0, 0.0],
    },
];

/// Two triangles sharing the bottom-right/top-left edge.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

pub struct HelloTriangle<G: GlDriver = glow::Context> {
    shader: ShaderProgram<G>,
    quad: Mesh<G>,
}

impl<G: GlDriver> HelloTriangle<G> {
    pub fn new(gl: &Arc<G>, settings: &Settings) -> Result<Self, ExerciseError> {
        let shader = ShaderProgram::from_files_with(
            gl,
            settings.asset_path("shaders/triangle.vs.glsl"),
            settings.asset_path("shaders/triangle.fs.glsl"),
            settings.shader_options(),
        )?;
        let quad = Mesh::new(gl, &QUAD_VERTICES, &QUAD_INDICES, glow::TRIANGLES)?;
        Ok(Self { shader, quad })
    }
}

impl<G: GlDriver> Exercise for HelloTriangle<G> {
    fn name(&self) -> &'static str {
        "hello_triangle"
    }

    fn render(&mut self, ctx: &FrameContext) -> Result<(), ExerciseError> {
        self.shader.activate()?;
        self.shader
            .set_uniform("uniformColor", Vec4::new(0.0, pulse(ctx.time), 0.0, 1.0))?;
        self.quad.draw();
        Ok(())
    }

    fn release(&mut self) {
        self.quad.release();
        self.shader.release();
    }
}
