use relm4::prelude::*;
use shelf::config;
use shelf::gui::app::AppModel;
use shelf::sys::runtime;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = config::load_or_default();

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx)?;

    let app = RelmApp::new("org.fanout.shelf");

    app.run::<AppModel>((config, rx));
    Ok(())
}
