use crate::{service::filesystem::data_dir_file_path, Result};
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

const ENV_DB: &str = "CUSTOMER_INSIGHTS_DB";
const ENV_ADDR: &str = "CUSTOMER_INSIGHTS_ADDR";
const ENV_PORT: &str = "CUSTOMER_INSIGHTS_PORT";
const ENV_QUERY_TIMEOUT_SECS: &str = "CUSTOMER_INSIGHTS_QUERY_TIMEOUT_SECS";
const ENV_IMPORT_BATCH_SIZE: &str = "CUSTOMER_INSIGHTS_IMPORT_BATCH_SIZE";

pub const DEFAULT_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct Conf {
    pub db_path: PathBuf,
    pub addr: String,
    pub port: u16,
    /// Budget shared by all queries of a single service call.
    pub query_timeout: Duration,
    pub import_batch_size: usize,
}

impl Conf {
    pub fn from_env() -> Result<Conf> {
        let db_path = match env::var(ENV_DB) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => data_dir_file_path("customers.db")?,
        };
        Ok(Conf {
            db_path,
            addr: env::var(ENV_ADDR).unwrap_or_else(|_| DEFAULT_ADDR.into()),
            port: parse_var(ENV_PORT, DEFAULT_PORT),
            query_timeout: Duration::from_secs(parse_var(
                ENV_QUERY_TIMEOUT_SECS,
                DEFAULT_QUERY_TIMEOUT.as_secs(),
            )),
            import_batch_size: parse_var(ENV_IMPORT_BATCH_SIZE, DEFAULT_IMPORT_BATCH_SIZE).max(1),
        })
    }
}

#[cfg(test)]
impl Conf {
    pub fn mock() -> Conf {
        Conf {
            db_path: PathBuf::from(":memory:"),
            addr: DEFAULT_ADDR.into(),
            port: DEFAULT_PORT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            import_batch_size: DEFAULT_IMPORT_BATCH_SIZE,
        }
    }
}

fn parse_var<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => parse_or(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr + Copy>(name: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(name, raw, "Invalid config value, using default");
            default
        }
    }
}

#[cfg(test)]
mod test {
    #[test]
    fn parse_or() {
        assert_eq!(8080, super::parse_or("port", "8080", 3000u16));
        assert_eq!(8080, super::parse_or("port", " 8080 ", 3000u16));
        assert_eq!(3000, super::parse_or("port", "not-a-port", 3000u16));
        assert_eq!(3000, super::parse_or("port", "70000", 3000u16));
    }
}
