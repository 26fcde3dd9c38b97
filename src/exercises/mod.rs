//! The tutorial exercises and the [`Exercise`] trait the render loop drives.
//!
//! Each exercise builds its GPU resources up front, draws one frame per [`Exercise::render`]
//! call and frees everything in [`Exercise::release`].

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::abs::{CreateError, GlDriver, ShaderError, TextureError};
use crate::config::Settings;

pub mod hello_triangle;
pub mod hello_window;
pub mod textures;
pub mod transformations;

#[derive(Debug, Error)]
pub enum ExerciseError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Create(#[from] CreateError),
}

/// Timing for the frame being rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameContext {
    /// Seconds since the loop started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta_time: f32,
}

/// A single tutorial step run by [`crate::abs::App::run`].
pub trait Exercise {
    fn name(&self) -> &'static str;

    /// Handles an event.
    fn handle_event(&mut self, _event: &sdl2::event::Event) {}

    /// Updates the exercise state.
    fn update(&mut self, _ctx: &FrameContext) {}

    /// Draws one frame. The color buffer has already been cleared.
    fn render(&mut self, ctx: &FrameContext) -> Result<(), ExerciseError>;

    /// Frees GPU resources. Called once when the loop ends.
    fn release(&mut self) {}
}

/// Green channel that pulses between 0 and 1 over time.
pub fn pulse(time: f32) -> f32 {
    time.sin() / 2.0 + 0.5
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExerciseKind {
    HelloWindow,
    HelloTriangle,
    #[default]
    Textures,
    Transformations,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::HelloWindow,
        ExerciseKind::HelloTriangle,
        ExerciseKind::Textures,
        ExerciseKind::Transformations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExerciseKind::HelloWindow => "hello_window",
            ExerciseKind::HelloTriangle => "hello_triangle",
            ExerciseKind::Textures => "textures",
            ExerciseKind::Transformations => "transformations",
        }
    }

    /// Creates the exercise's resources on `gl`.
    pub fn build<G: GlDriver + 'static>(
        self,
        gl: &Arc<G>,
        settings: &Settings,
    ) -> Result<Box<dyn Exercise>, ExerciseError> {
        let exercise: Box<dyn Exercise> = match self {
            ExerciseKind::HelloWindow => Box::new(hello_window::HelloWindow),
            ExerciseKind::HelloTriangle => {
                Box::new(hello_triangle::HelloTriangle::new(gl, settings)?)
            }
            ExerciseKind::Textures => Box::new(textures::Textures::new(gl, settings)?),
            ExerciseKind::Transformations => {
                Box::new(transformations::Transformations::new(gl, settings)?)
            }
        };
        Ok(exercise)
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ExerciseKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = ExerciseKind::ALL.iter().map(|k| k.name()).collect();
                let names = names.join(", ");
                format!("unknown exercise `{s}`, expected one of: {names}")
            })
    }
}
