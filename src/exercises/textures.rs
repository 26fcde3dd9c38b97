//! Two textures mixed on a quad. Texture coordinates run to 2.0 so the wrap modes show.

use std::path::Path;
use std::sync::Arc;

use glam::Vec4;

use super::{Exercise, ExerciseError, FrameContext, pulse};
use crate::abs::{
    GlDriver, Mesh, ShaderProgram, Texture, TextureError, TextureOptions, TexturedVertex, Wrap,
};
use crate::config::Settings;
use crate::exercises::hello_triangle::QUAD_INDICES;

pub const WRAPPED_QUAD: [TexturedVertex; 4] = [
    TexturedVertex {
        position: [0.5, 0.5, 0.0],
        color: [1.0, 0.0, 0.0],
        uv: [2.0, 2.0],
    },
    TexturedVertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0],
        uv: [2.0, 0.0],
    },
    TexturedVertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 0.0, 1.0],
        uv: [0.0, 0.0],
    },
    TexturedVertex {
        position: [-0.5, 0.5, 0.0],
        color: [1.0, 1.0, 0.0],
        uv: [0.0, 2.0],
    },
];

/// Loads a texture, falling back to the placeholder checkerboard when the file can't be
/// decoded. Failing to create the GL object is still an error.
pub fn load_or_placeholder<G: GlDriver>(
    gl: &Arc<G>,
    path: &Path,
    options: TextureOptions,
) -> Result<Texture<G>, TextureError> {
    match Texture::from_file(gl, path, options) {
        Ok(texture) => Ok(texture),
        Err(TextureError::Decode { path, source }) => {
            log::warn!("failed to load texture {path}: {source}; using placeholder");
            Texture::placeholder(gl)
        }
        Err(e) => Err(e),
    }
}

/// Shader, container and face textures shared with the transformations exercise.
pub(crate) struct TexturedScene<G: GlDriver> {
    pub shader: ShaderProgram<G>,
    pub container: Texture<G>,
    pub face: Texture<G>,
}

impl<G: GlDriver> TexturedScene<G> {
    pub fn load(
        gl: &Arc<G>,
        settings: &Settings,
        vertex_shader: &str,
    ) -> Result<Self, ExerciseError> {
        let shader = ShaderProgram::from_files_with(
            gl,
            settings.asset_path(vertex_shader),
            settings.asset_path("shaders/textured.fs.glsl"),
            settings.shader_options(),
        )?;

        let container = load_or_placeholder(
            gl,
            &settings.asset_path("textures/container.png"),
            TextureOptions::default(),
        )?;
        let face = load_or_placeholder(
            gl,
            &settings.asset_path("textures/awesomeface.png"),
            TextureOptions {
                wrap: Wrap::MirroredRepeat,
                ..Default::default()
            },
        )?;

        // Sampler uniforms only need to be set once per program.
        shader.set_uniform("texture1", 0)?;
        shader.set_uniform("texture2", 1)?;

        Ok(Self {
            shader,
            container,
            face,
        })
    }

    pub fn bind(&self, time: f32) -> Result<(), ExerciseError> {
        self.shader.activate()?;
        self.shader
            .set_uniform("uniformColor", Vec4::new(0.0, pulse(time), 0.0, 1.0))?;
        self.container.bind(0);
        self.face.bind(1);
        Ok(())
    }

    pub fn release(&mut self) {
        self.container.release();
        self.face.release();
        self.shader.release();
    }
}

pub struct Textures<G: GlDriver = glow::Context> {
    scene: TexturedScene<G>,
    quad: Mesh<G>,
}

impl<G: GlDriver> Textures<G> {
    pub fn new(gl: &Arc<G>, settings: &Settings) -> Result<Self, ExerciseError> {
        let scene = TexturedScene::load(gl, settings, "shaders/textured.vs.glsl")?;
        let quad = Mesh::new(gl, &WRAPPED_QUAD, &QUAD_INDICES, glow::TRIANGLES)?;
        Ok(Self { scene, quad })
    }
}

impl<G: GlDriver> Exercise for Textures<G> {
    fn name(&self) -> &'static str {
        "textures"
    }

    fn render(&mut self, ctx: &FrameContext) -> Result<(), ExerciseError> {
        self.scene.bind(ctx.time)?;
        self.quad.draw();
        Ok(())
    }

    fn release(&mut self) {
        self.quad.release();
        self.scene.release();
    }
}
