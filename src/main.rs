use std::process::ExitCode;

use glsteps::abs::{App, AppError};
use glsteps::config::Settings;
use glsteps::exercises::ExerciseKind;

fn main() -> ExitCode {
    let settings = match Settings::load_or_default() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = glsteps::logging::init(settings.log_level()) {
        eprintln!("failed to set up logging: {e}");
    }

    let kind = match std::env::args().nth(1) {
        Some(name) => match name.parse::<ExerciseKind>() {
            Ok(kind) => kind,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => ExerciseKind::default(),
    };

    match run(kind, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}: {e}", kind.name());
            ExitCode::FAILURE
        }
    }
}

fn run(kind: ExerciseKind, settings: &Settings) -> Result<(), AppError> {
    let mut app = App::new(&settings.window)?;
    log::info!("running {}", kind.name());
    let mut exercise = kind.build(&app.gl, settings)?;
    app.run(exercise.as_mut(), settings)
}
