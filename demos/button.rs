use log::info;
use tether::errors::Result;
use tether::sync::broadcast::BroadcastRegistry;

// -----------------------------------------------------------------------------
// 		- Button -
// 		Three handlers subscribed to a single click
// -----------------------------------------------------------------------------
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let clicked = BroadcastRegistry::new();
    clicked.subscribe(|| info!("Maximizing window."))?;
    clicked.subscribe(|| info!("Displaying annoying dialog box!"))?;
    clicked.subscribe(|| info!("Mouse clicked!"))?;

    let handlers = clicked.fire_and_join()?;
    info!("{} handlers ran", handlers);
    Ok(())
}
