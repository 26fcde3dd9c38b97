//! Mesh management module.
//!
//! This module defines the [`Mesh`] struct for managing vertex data on the GPU side.
//! Vertices should implement the [`Vertex`] trait, which describes their attribute layout.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use super::driver::{CreateError, GlDriver};

/// Trait that describes how a vertex is laid out in a vertex buffer.
///
/// Every attribute is made of `f32` components. Attribute `i` is bound to
/// `layout (location = i)` and the attributes follow each other without padding.
pub trait Vertex: Pod {
    /// Component count of each attribute, in location order.
    const ATTRIBUTES: &'static [i32];

    /// Configures the attribute pointers of the bound vertex array.
    fn vertex_attribs<G: GlDriver>(gl: &G) {
        let stride = std::mem::size_of::<Self>() as i32;
        let mut offset = 0;
        for (location, &components) in Self::ATTRIBUTES.iter().enumerate() {
            gl.vertex_attrib_pointer_f32(location as u32, components, stride, offset);
            gl.enable_vertex_attrib_array(location as u32);
            offset += components * std::mem::size_of::<f32>() as i32;
        }
    }
}

/// A bare position.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PosVertex {
    pub position: [f32; 3],
}

impl Vertex for PosVertex {
    const ATTRIBUTES: &'static [i32] = &[3];
}

/// A position with a per-vertex color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex for ColorVertex {
    const ATTRIBUTES: &'static [i32] = &[3, 3];
}

/// A position, a color and texture coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex for TexturedVertex {
    const ATTRIBUTES: &'static [i32] = &[3, 3, 2];
}

struct MeshObjects<G: GlDriver> {
    vao: G::VertexArray,
    vbo: G::Buffer,
    ebo: Option<G::Buffer>,
}

/// Represents a mesh stored on the GPU side.
pub struct Mesh<G: GlDriver = glow::Context> {
    gl: Arc<G>,
    draw_mode: u32,
    objects: Option<MeshObjects<G>>,
    count: usize,
    indexed: bool,
}

impl<G: GlDriver> Mesh<G> {
    /// Creates a new mesh from the given vertex and index data.
    ///
    /// With an empty `indices` slice no element buffer is created and the mesh is drawn with
    /// `draw_arrays` over all vertices.
    pub fn new<V: Vertex>(
        gl: &Arc<G>,
        vertices: &[V],
        indices: &[u32],
        draw_mode: u32,
    ) -> Result<Self, CreateError> {
        let vao = gl.create_vertex_array()?;
        let vbo = match gl.create_buffer() {
            Ok(vbo) => vbo,
            Err(e) => {
                gl.delete_vertex_array(vao);
                return Err(e);
            }
        };
        let ebo = if indices.is_empty() {
            None
        } else {
            match gl.create_buffer() {
                Ok(ebo) => Some(ebo),
                Err(e) => {
                    gl.delete_buffer(vbo);
                    gl.delete_vertex_array(vao);
                    return Err(e);
                }
            }
        };

        gl.bind_vertex_array(Some(vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(vertices),
            glow::STATIC_DRAW,
        );

        if let Some(ebo) = ebo {
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW,
            );
        }

        V::vertex_attribs(gl.as_ref());

        // The element buffer binding is part of the vertex array state, so it stays bound.
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_vertex_array(None);

        log::debug!(
            "created mesh {vao:?} with {} vertices and {} indices",
            vertices.len(),
            indices.len()
        );

        Ok(Self {
            gl: Arc::clone(gl),
            draw_mode,
            objects: Some(MeshObjects { vao, vbo, ebo }),
            count: if ebo.is_some() {
                indices.len()
            } else {
                vertices.len()
            },
            indexed: ebo.is_some(),
        })
    }

    /// Updates the mesh data. An indexed mesh must be given indices, an array mesh must not.
    pub fn update<V: Vertex>(&mut self, vertices: &[V], indices: &[u32]) {
        let Some(objects) = &self.objects else {
            return;
        };

        self.gl.bind_vertex_array(Some(objects.vao));
        self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(objects.vbo));
        self.gl.buffer_data(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(vertices),
            glow::STATIC_DRAW,
        );

        if let Some(ebo) = objects.ebo {
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            self.gl.buffer_data(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW,
            );
            self.count = indices.len();
        } else {
            self.count = vertices.len();
        }

        self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        self.gl.bind_vertex_array(None);
    }

    /// Draws the mesh with the currently active shader program. Does nothing once released.
    pub fn draw(&self) {
        let Some(objects) = &self.objects else {
            return;
        };
        self.gl.bind_vertex_array(Some(objects.vao));
        if self.indexed {
            self.gl
                .draw_elements_u32(self.draw_mode, self.count as i32, 0);
        } else {
            self.gl.draw_arrays(self.draw_mode, 0, self.count as i32);
        }
        self.gl.bind_vertex_array(None);
    }

    /// Returns the number of indices, or vertices for a mesh without indices.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Deletes the vertex array and its buffers. Calling this again is a no-op.
    pub fn release(&mut self) {
        if let Some(objects) = self.objects.take() {
            self.gl.delete_vertex_array(objects.vao);
            self.gl.delete_buffer(objects.vbo);
            if let Some(ebo) = objects.ebo {
                self.gl.delete_buffer(ebo);
            }
        }
    }
}

impl<G: GlDriver> Drop for Mesh<G> {
    fn drop(&mut self) {
        self.release();
    }
}
