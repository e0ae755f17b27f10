use stagelight::{AppConfig, init_logging, run_with_config, showcase};

fn main() -> stagelight::Result<()> {
    init_logging();

    let config = AppConfig::new().title("Stagelight Showcase");
    run_with_config(config, showcase::setup)
}
