//! This module contains the core components of the renderer,
//! including application setup, the GL driver seam, shader management, meshes and textures.

pub mod app;
pub mod driver;
#[cfg(test)]
pub(crate) mod fake;
pub mod mesh;
pub mod shader;
pub mod texture;

pub use app::*;
pub use driver::*;
pub use mesh::*;
pub use shader::*;
pub use texture::*;
