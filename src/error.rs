use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    Rusqlite(rusqlite::Error),
    TimeFormat(time::error::Format),
    Csv(csv::Error),
    DeadpoolPool(deadpool_sqlite::PoolError),
    DeadpoolInteract(deadpool_sqlite::InteractError),
    DeadpoolConfig(deadpool_sqlite::ConfigError),
    DeadpoolBuild(deadpool_sqlite::BuildError),
    Timeout(Duration),
    Cli(String),
    Generic(String),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IO(err) => err.fmt(f),
            Error::Rusqlite(err) => err.fmt(f),
            Error::TimeFormat(err) => err.fmt(f),
            Error::Csv(err) => err.fmt(f),
            Error::DeadpoolPool(err) => err.fmt(f),
            Error::DeadpoolInteract(err) => err.fmt(f),
            Error::DeadpoolConfig(err) => err.fmt(f),
            Error::DeadpoolBuild(err) => err.fmt(f),
            Error::Timeout(budget) => write!(
                f,
                "Request timeout: processing took longer than {} seconds",
                budget.as_secs()
            ),
            Error::Cli(err) => write!(f, "{}", err),
            Error::Generic(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<&str> for Error {
    fn from(str: &str) -> Self {
        Error::Generic(str.to_owned())
    }
}

impl From<String> for Error {
    fn from(str: String) -> Self {
        Error::Generic(str)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Error::Rusqlite(error)
    }
}

impl From<time::error::Format> for Error {
    fn from(error: time::error::Format) -> Self {
        Error::TimeFormat(error)
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Error::Csv(error)
    }
}

impl From<deadpool_sqlite::PoolError> for Error {
    fn from(error: deadpool_sqlite::PoolError) -> Self {
        Error::DeadpoolPool(error)
    }
}

impl From<deadpool_sqlite::InteractError> for Error {
    fn from(error: deadpool_sqlite::InteractError) -> Self {
        Error::DeadpoolInteract(error)
    }
}

impl From<deadpool_sqlite::ConfigError> for Error {
    fn from(error: deadpool_sqlite::ConfigError) -> Self {
        Error::DeadpoolConfig(error)
    }
}

impl From<deadpool_sqlite::BuildError> for Error {
    fn from(error: deadpool_sqlite::BuildError) -> Self {
        Error::DeadpoolBuild(error)
    }
}

#[cfg(test)]
mod test {
    use super::Error;
    use std::time::Duration;

    #[test]
    fn display() {
        let err = Error::Timeout(Duration::from_secs(30));
        assert!(err.is_timeout());
        assert_eq!(
            "Request timeout: processing took longer than 30 seconds",
            err.to_string()
        );
        let err = Error::from("no such table: customer");
        assert!(!err.is_timeout());
        assert_eq!("no such table: customer", err.to_string());
    }
}
