//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct which is a CPU representation of a GPU texture,
//! and [`decode_image`] which turns an encoded image file into RGBA pixels.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

use super::driver::{CreateError, GlDriver};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("{width}x{height} RGBA texture needs {expected} bytes, got {actual}")]
    DataSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Create(#[from] CreateError),
}

/// How texture coordinates outside `0..1` are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Wrap {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

impl Wrap {
    fn gl_enum(self) -> u32 {
        match self {
            Wrap::Repeat => glow::REPEAT,
            Wrap::MirroredRepeat => glow::MIRRORED_REPEAT,
            Wrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            Wrap::ClampToBorder => glow::CLAMP_TO_BORDER,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

/// Sampling and upload options for a [`Texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureOptions {
    pub wrap: Wrap,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mipmaps: bool,
    /// Flip rows on load so the first row is the bottom of the image, as GL expects.
    pub flip_vertically: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            wrap: Wrap::Repeat,
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mipmaps: true,
            flip_vertically: true,
        }
    }
}

impl TextureOptions {
    fn min_filter_enum(&self) -> u32 {
        match (self.min_filter, self.mipmaps) {
            (Filter::Nearest, false) => glow::NEAREST,
            (Filter::Linear, false) => glow::LINEAR,
            (Filter::Nearest, true) => glow::NEAREST_MIPMAP_NEAREST,
            (Filter::Linear, true) => glow::LINEAR_MIPMAP_LINEAR,
        }
    }

    fn mag_filter_enum(&self) -> u32 {
        match self.mag_filter {
            Filter::Nearest => glow::NEAREST,
            Filter::Linear => glow::LINEAR,
        }
    }
}

/// Pixels decoded from an image file, always as RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Channel count of the source image before conversion to RGBA.
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Converts an already decoded image.
    pub fn from_image(image: &DynamicImage, flip_vertically: bool) -> Self {
        let image = if flip_vertically {
            image.flipv()
        } else {
            image.clone()
        };
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: image.color().channel_count(),
            pixels: image.to_rgba8().into_raw(),
        }
    }
}

/// Decodes an image file into RGBA pixels.
pub fn decode_image(
    path: impl AsRef<Path>,
    flip_vertically: bool,
) -> Result<DecodedImage, TextureError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| TextureError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    Ok(DecodedImage::from_image(&image, flip_vertically))
}

/// Represents a texture stored on the GPU side.
pub struct Texture<G: GlDriver = glow::Context> {
    gl: Arc<G>,
    id: Option<G::Texture>,
    width: u32,
    height: u32,
    channels: u8,
}

impl<G: GlDriver> Texture<G> {
    /// Loads and uploads an image file.
    pub fn from_file(
        gl: &Arc<G>,
        path: impl AsRef<Path>,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        let decoded = decode_image(path.as_ref(), options.flip_vertically)?;
        log::debug!(
            "decoded {} ({}x{}, {} channels)",
            path.as_ref().display(),
            decoded.width,
            decoded.height,
            decoded.channels
        );
        Self::upload(gl, &decoded, options)
    }

    /// Creates a new texture from the given [`image::DynamicImage`].
    pub fn from_image(
        gl: &Arc<G>,
        image: &DynamicImage,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        let decoded = DecodedImage::from_image(image, options.flip_vertically);
        Self::upload(gl, &decoded, options)
    }

    /// Creates a new texture from the given raw RGBA data. No flipping is applied.
    pub fn from_rgba(
        gl: &Arc<G>,
        width: u32,
        height: u32,
        data: &[u8],
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::DataSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        let decoded = DecodedImage {
            width,
            height,
            channels: 4,
            pixels: data.to_vec(),
        };
        Self::upload(gl, &decoded, options)
    }

    /// An 8x8 magenta and black checkerboard, used when a real texture can't be loaded.
    pub fn placeholder(gl: &Arc<G>) -> Result<Self, TextureError> {
        const SIZE: u32 = 8;
        let mut data = Vec::with_capacity((SIZE * SIZE * 4) as usize);
        for y in 0..SIZE {
            for x in 0..SIZE {
                let texel: [u8; 4] = if (x + y) % 2 == 0 {
                    [255, 0, 255, 255]
                } else {
                    [0, 0, 0, 255]
                };
                data.extend_from_slice(&texel);
            }
        }
        let options = TextureOptions {
            min_filter: Filter::Nearest,
            mag_filter: Filter::Nearest,
            mipmaps: false,
            ..Default::default()
        };
        Self::from_rgba(gl, SIZE, SIZE, &data, options)
    }

    fn upload(
        gl: &Arc<G>,
        image: &DecodedImage,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        let texture = gl.create_texture()?;
        gl.bind_texture_2d(Some(texture));

        let wrap = options.wrap.gl_enum() as i32;
        gl.tex_parameter_2d(glow::TEXTURE_WRAP_S, wrap);
        gl.tex_parameter_2d(glow::TEXTURE_WRAP_T, wrap);
        gl.tex_parameter_2d(glow::TEXTURE_MIN_FILTER, options.min_filter_enum() as i32);
        gl.tex_parameter_2d(glow::TEXTURE_MAG_FILTER, options.mag_filter_enum() as i32);

        gl.tex_image_2d_rgba(image.width, image.height, &image.pixels);
        if options.mipmaps {
            gl.generate_mipmap_2d();
        }
        gl.bind_texture_2d(None);

        Ok(Self {
            gl: Arc::clone(gl),
            id: Some(texture),
            width: image.width,
            height: image.height,
            channels: image.channels,
        })
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel count of the source image.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Binds the texture to the specified texture unit. Does nothing once released.
    pub fn bind(&self, unit: u32) {
        if let Some(id) = self.id {
            self.gl.active_texture(unit);
            self.gl.bind_texture_2d(Some(id));
        }
    }

    /// Deletes the texture object. Calling this again is a no-op.
    pub fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.gl.delete_texture(id);
        }
    }
}

impl<G: GlDriver> Drop for Texture<G> {
    fn drop(&mut self) {
        self.release();
    }
}
