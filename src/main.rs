mod demo_scenes;

use std::process::ExitCode;

use demo_scenes::{Demo, DemoScene};

//const ACTIVE_SCENE: DemoScene = DemoScene::PbrTest;

const ACTIVE_SCENE: DemoScene = DemoScene::Simple;

fn main() -> ExitCode {
    match gl_cube::run(Demo::new(ACTIVE_SCENE)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Application error: {err}");
            ExitCode::FAILURE
        }
    }
}
