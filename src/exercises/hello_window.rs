//! Opens the window and clears it every frame. Clearing is done by the render loop.

use super::{Exercise, ExerciseError, FrameContext};

pub struct HelloWindow;

impl Exercise for HelloWindow {
    fn name(&self) -> &'static str {
        "hello_window"
    }

    fn render(&mut self, _ctx: &FrameContext) -> Result<(), ExerciseError> {
        Ok(())
    }
}
