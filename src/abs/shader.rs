//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for managing OpenGL shaders.
//! This module also provides the [`Uniform`] trait for setting uniform variables in shader
//! programs.
//!
//! Construction never yields an unusable program: a stage that fails to compile, or a pair that
//! fails to link, is reported as a [`ShaderError`] carrying the driver's diagnostic log.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{IVec3, Mat4, Vec2, Vec3, Vec4};
use thiserror::Error;

use super::driver::{CreateError, GlDriver};

/// Byte budget for driver diagnostics, matching the classic `char infoLog[512]`.
pub const DEFAULT_INFO_LOG_LIMIT: usize = 512;

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// The GL enum used to create a shader object of this stage.
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("VERTEX"),
            ShaderStage::Fragment => f.write_str("FRAGMENT"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read {stage} shader source {}: {source}", path.display())]
    FileRead {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
    #[error(transparent)]
    Create(#[from] CreateError),
    #[error("uniform `{name}` is not an active uniform of the program")]
    UnknownUniform { name: String },
    #[error("shader program has been released")]
    Released,
}

/// What to do when a uniform name is not active in the linked program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UniformPolicy {
    /// Skip the write, like GL does for location `-1`.
    #[default]
    Ignore,
    /// Report [`ShaderError::UnknownUniform`].
    Strict,
}

/// Options applied while building a [`ShaderProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderOptions {
    /// Maximum number of bytes kept from a compile or link log. `usize::MAX` keeps everything.
    pub info_log_limit: usize,
    pub uniform_policy: UniformPolicy,
}

impl Default for ShaderOptions {
    fn default() -> Self {
        Self {
            info_log_limit: DEFAULT_INFO_LOG_LIMIT,
            uniform_policy: UniformPolicy::Ignore,
        }
    }
}

/// Cuts a driver log down to `limit` bytes on a char boundary and trims the trailing
/// whitespace and NULs drivers tend to leave behind.
pub fn bounded_log(log: &str, limit: usize) -> String {
    let mut end = log.len().min(limit);
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end]
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// Represents an individual OpenGL shader.
///
/// The shader object is deleted when this value is dropped; once a program has been linked
/// from it, it is no longer needed.
pub struct Shader<G: GlDriver = glow::Context> {
    gl: Arc<G>,
    id: G::Shader,
    stage: ShaderStage,
}

impl<G: GlDriver> Shader<G> {
    /// Compiles a new shader from the given source code.
    pub fn compile(
        gl: &Arc<G>,
        stage: ShaderStage,
        source: &str,
        info_log_limit: usize,
    ) -> Result<Self, ShaderError> {
        let shader = gl.create_shader(stage.gl_enum())?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.shader_compile_status(shader) {
            let log = bounded_log(&gl.shader_info_log(shader), info_log_limit);
            gl.delete_shader(shader);
            return Err(ShaderError::Compile { stage, log });
        }

        Ok(Self {
            gl: Arc::clone(gl),
            id: shader,
            stage,
        })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<G: GlDriver> Drop for Shader<G> {
    fn drop(&mut self) {
        self.gl.delete_shader(self.id);
    }
}

/// A value that can be written to a uniform slot.
pub trait Uniform {
    /// Writes the value to `location` of the currently used program.
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation);
}

impl Uniform for bool {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_1_i32(location, *self as i32);
    }
}

impl Uniform for i32 {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_1_i32(location, *self);
    }
}

impl Uniform for f32 {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_1_f32(location, *self);
    }
}

impl Uniform for Vec2 {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_2_f32(location, self.x, self.y);
    }
}

impl Uniform for Vec3 {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_3_f32(location, self.x, self.y, self.z);
    }
}

impl Uniform for IVec3 {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_3_i32(location, self.x, self.y, self.z);
    }
}

impl Uniform for Vec4 {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_4_f32(location, self.x, self.y, self.z, self.w);
    }
}

impl Uniform for [f32; 4] {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        let [x, y, z, w] = *self;
        gl.uniform_4_f32(location, x, y, z, w);
    }
}

impl Uniform for Mat4 {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_matrix_4_f32(location, &self.to_cols_array());
    }
}

impl<T: Uniform> Uniform for &T {
    fn write<G: GlDriver>(&self, gl: &G, location: &G::UniformLocation) {
        (*self).write(gl, location);
    }
}

/// Represents a linked OpenGL shader program.
///
/// The program is owned until [`ShaderProgram::release`] is called. Dropping a program that
/// was never released releases it as well.
pub struct ShaderProgram<G: GlDriver = glow::Context> {
    gl: Arc<G>,
    id: Option<G::Program>,
    uniform_policy: UniformPolicy,
}

impl<G: GlDriver> ShaderProgram<G> {
    /// Reads, compiles and links a vertex/fragment pair from disk with default options.
    pub fn from_files(
        gl: &Arc<G>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        Self::from_files_with(gl, vertex_path, fragment_path, ShaderOptions::default())
    }

    /// Reads, compiles and links a vertex/fragment pair from disk.
    ///
    /// Both files are read before any GL object is created.
    pub fn from_files_with(
        gl: &Arc<G>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        options: ShaderOptions,
    ) -> Result<Self, ShaderError> {
        let vertex = read_source(ShaderStage::Vertex, vertex_path.as_ref())?;
        let fragment = read_source(ShaderStage::Fragment, fragment_path.as_ref())?;
        log::debug!(
            "building shader program from {} and {}",
            vertex_path.as_ref().display(),
            fragment_path.as_ref().display()
        );
        Self::from_sources(gl, &vertex, &fragment, options)
    }

    /// Compiles and links a vertex/fragment pair from source text.
    pub fn from_sources(
        gl: &Arc<G>,
        vertex_source: &str,
        fragment_source: &str,
        options: ShaderOptions,
    ) -> Result<Self, ShaderError> {
        let limit = options.info_log_limit;
        let vertex = Shader::compile(gl, ShaderStage::Vertex, vertex_source, limit)?;
        let fragment = Shader::compile(gl, ShaderStage::Fragment, fragment_source, limit)?;
        Self::link(gl, &[&vertex, &fragment], options)
        // Both stage objects are deleted here, whatever the link outcome.
    }

    /// Links a new shader program from the given shaders.
    pub fn link(
        gl: &Arc<G>,
        shaders: &[&Shader<G>],
        options: ShaderOptions,
    ) -> Result<Self, ShaderError> {
        let program = gl.create_program()?;

        for shader in shaders {
            gl.attach_shader(program, shader.id);
        }

        gl.link_program(program);
        let linked = gl.program_link_status(program);

        for shader in shaders {
            gl.detach_shader(program, shader.id);
        }

        if !linked {
            let log = bounded_log(&gl.program_info_log(program), options.info_log_limit);
            gl.delete_program(program);
            return Err(ShaderError::Link { log });
        }

        log::debug!("linked shader program {program:?}");
        Ok(Self {
            gl: Arc::clone(gl),
            id: Some(program),
            uniform_policy: options.uniform_policy,
        })
    }

    /// The driver handle, or `None` once released.
    pub fn handle(&self) -> Option<G::Program> {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.id.is_none()
    }

    /// Binds the shader program for use by subsequent draw calls.
    pub fn activate(&self) -> Result<(), ShaderError> {
        let program = self.id.ok_or(ShaderError::Released)?;
        self.gl.use_program(Some(program));
        Ok(())
    }

    /// Whether `name` is an active uniform of the program.
    pub fn has_uniform(&self, name: &str) -> bool {
        self.id
            .is_some_and(|program| self.gl.uniform_location(program, name).is_some())
    }

    /// Sets a uniform variable in the shader program.
    ///
    /// GL writes uniforms to the program in use, so this program is made current first and
    /// stays current afterwards. A name that is not an active uniform is skipped under
    /// [`UniformPolicy::Ignore`] and reported under [`UniformPolicy::Strict`].
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) -> Result<(), ShaderError> {
        let program = self.id.ok_or(ShaderError::Released)?;
        match self.gl.uniform_location(program, name) {
            Some(location) => {
                self.gl.use_program(Some(program));
                value.write(self.gl.as_ref(), &location);
                Ok(())
            }
            None => match self.uniform_policy {
                UniformPolicy::Ignore => {
                    log::trace!("ignoring write to unknown uniform `{name}`");
                    Ok(())
                }
                UniformPolicy::Strict => Err(ShaderError::UnknownUniform {
                    name: name.to_string(),
                }),
            },
        }
    }

    /// Deletes the program object. Calling this again is a no-op.
    pub fn release(&mut self) {
        if let Some(program) = self.id.take() {
            self.gl.delete_program(program);
            log::debug!("released shader program {program:?}");
        }
    }
}

impl<G: GlDriver> Drop for ShaderProgram<G> {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_source(stage: ShaderStage, path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::FileRead {
        stage,
        path: path.to_path_buf(),
        source,
    })
}
