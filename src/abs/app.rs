//! SDL2 and OpenGL application management.
//!
//! This module defines the [`App`] struct which encapsulates the SDL2
//! and OpenGL context necessary for creating a windowed application,
//! and drives an [`Exercise`] through the render loop.

use std::sync::Arc;
use std::time::Instant;

use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use thiserror::Error;

use super::driver::GlDriver;
use crate::config::{Settings, WindowSettings};
use crate::exercises::{Exercise, ExerciseError, FrameContext};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("SDL error: {0}")]
    Sdl(String),
    #[error(transparent)]
    WindowBuild(#[from] sdl2::video::WindowBuildError),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
}

/// The [`App`] struct encapsulates the SDL2 and OpenGL context.
pub struct App {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub window: sdl2::video::Window,
    pub gl_context: sdl2::video::GLContext,
    pub gl: Arc<glow::Context>,
    pub event_pump: sdl2::EventPump,
}

impl App {
    /// Creates a window with an OpenGL 3.3 core context made current on this thread.
    pub fn new(settings: &WindowSettings) -> Result<Self, AppError> {
        let sdl = sdl2::init().map_err(AppError::Sdl)?;
        let video_subsystem = sdl.video().map_err(AppError::Sdl)?;

        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        #[cfg(target_os = "macos")]
        gl_attr.set_context_flags().forward_compatible().set();

        let mut builder = video_subsystem.window(&settings.title, settings.width, settings.height);
        builder.opengl();
        if settings.resizable {
            builder.resizable();
        }
        let window = builder.build()?;

        let gl_context = window.gl_create_context().map_err(AppError::Sdl)?;
        window.gl_make_current(&gl_context).map_err(AppError::Sdl)?;

        let interval = if settings.vsync {
            sdl2::video::SwapInterval::VSync
        } else {
            sdl2::video::SwapInterval::Immediate
        };
        if let Err(e) = video_subsystem.gl_set_swap_interval(interval) {
            log::warn!("could not set swap interval: {e}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let (width, height) = window.drawable_size();
        gl.viewport(0, 0, width as i32, height as i32);

        let event_pump = sdl.event_pump().map_err(AppError::Sdl)?;
        log::info!("opened {:?} at {width}x{height}", settings.title);

        Ok(Self {
            sdl,
            video_subsystem,
            window,
            gl_context,
            gl: Arc::new(gl),
            event_pump,
        })
    }

    /// Runs the render loop until the window is closed or Escape is pressed, then releases
    /// the exercise's resources.
    pub fn run(
        &mut self,
        exercise: &mut dyn Exercise,
        settings: &Settings,
    ) -> Result<(), AppError> {
        if settings.wireframe {
            self.gl.polygon_mode(glow::LINE);
        }
        let result = self.frame_loop(exercise, settings);
        exercise.release();
        result
    }

    fn frame_loop(
        &mut self,
        exercise: &mut dyn Exercise,
        settings: &Settings,
    ) -> Result<(), AppError> {
        let start = Instant::now();
        let mut last_frame_time = start;
        let [r, g, b, a] = settings.clear_color;

        'running: loop {
            for event in self.event_pump.poll_iter() {
                match &event {
                    Event::Quit { .. }
                    | Event::KeyDown {
                        keycode: Some(Keycode::Escape),
                        ..
                    } => break 'running,
                    Event::Window { win_event, .. } => {
                        on_window_event(self.gl.as_ref(), win_event, self.window.drawable_size())
                    }
                    _ => {}
                }
                exercise.handle_event(&event);
            }

            let now = Instant::now();
            let ctx = FrameContext {
                time: now.duration_since(start).as_secs_f32(),
                delta_time: now.duration_since(last_frame_time).as_secs_f32(),
            };
            last_frame_time = now;

            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);

            exercise.update(&ctx);
            exercise.render(&ctx)?;

            self.window.gl_swap_window();
        }

        log::info!("closing {}", exercise.name());
        Ok(())
    }
}

/// Keeps the viewport covering the drawable area when the window changes size.
///
/// Resize events carry the logical window size, which is smaller than the drawable area on
/// HiDPI displays, so the drawable size is passed in separately.
fn on_window_event<G: GlDriver>(gl: &G, event: &WindowEvent, drawable_size: (u32, u32)) {
    if let WindowEvent::Resized(..) | WindowEvent::SizeChanged(..) = event {
        let (width, height) = drawable_size;
        gl.viewport(0, 0, width as i32, height as i32);
    }
}
