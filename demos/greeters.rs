use log::info;
use tether::errors::Result;
use tether::fanout::fan_out;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    fan_out(5, |id| info!("Hello from {}", id))
}
