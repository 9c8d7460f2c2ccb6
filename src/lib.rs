pub mod app;
pub mod environment;
pub mod error;
pub mod headless;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod window;

pub use app::{run_application, Application};
pub use environment::Environment;
pub use error::RenderError;
pub use settings::RenderSettings;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

/// Initialises logging and runs `application` until its window closes.
pub fn run<T: Application>(application: T) -> Result<(), RenderError> {
    init_logging();

    log::info!("Starting {}", application.name());

    let result = run_application(application);

    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }

    log::info!("Application shutdown complete");

    result
}
