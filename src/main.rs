use anyhow::Result;

use icongen::{config::Config, generator};

fn main() -> Result<()> {
    // RUST_LOG 也可以写在 .env 里
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_cli();
    let outcome = generator::generate(&config)?;
    println!("{outcome}");

    Ok(())
}
