pub use error::Error;
mod command;
mod conf;
mod db;
mod error;
mod rest;
mod service;
use conf::Conf;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[actix_web::main]
async fn main() -> Result<()> {
    init_logging();

    let conf = Conf::from_env()?;
    let mut conn = db::open_connection(&conf.db_path)?;
    db::migration::run(&mut conn)?;

    let args: Vec<String> = env::args().collect();

    let command = match args.get(1) {
        Some(some) => some,
        None => Err(Error::Cli("No actions passed".into()))?,
    };

    match command.as_str() {
        "server" => {
            drop(conn);
            command::server::run(conf).await?
        }
        "import" => {
            let path = match args.get(2) {
                Some(some) => Path::new(some),
                None => Err(Error::Cli("Usage: import <file.csv>".into()))?,
            };
            command::import::run(path, &conf, &mut conn)?
        }
        "migrate" => {}
        first_arg => Err(Error::Cli(format!("Unknown command: {first_arg}")))?,
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cfg!(debug_assertions) {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .init();
    }
}
