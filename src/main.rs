use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;

use squarecrop::config::CropperConfig;
use squarecrop::core::app::App;
use squarecrop::core::frame_loop::FrameLoop;
use squarecrop::core::host::MinifbHost;
use squarecrop::session::messages::Msg;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = CropperConfig::load();
    let mut app = App::new(config.clone())?;
    if let Some(dir) = std::env::args_os().nth(1) {
        app.update(Msg::LoadFolder(PathBuf::from(dir)), Instant::now());
    }

    let mut host = MinifbHost::new(
        "Crop Image",
        app.window_width() as usize,
        app.window_height() as usize,
    )?;
    FrameLoop::new(&config).run(&mut app, &mut host)
}
