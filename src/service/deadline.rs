use crate::{Error, Result};
use actix_web::rt::time::timeout;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Races `work` against `budget`. If the timer wins, `work` is dropped: queries
/// already handed to a pooled connection run to completion in the background
/// and their results are discarded.
pub async fn race<T>(budget: Duration, work: impl Future<Output = Result<T>>) -> Result<T> {
    match timeout(budget, work).await {
        Ok(res) => res,
        Err(_) => {
            warn!(budget_secs = budget.as_secs_f64(), "Query budget exceeded");
            Err(Error::Timeout(budget))
        }
    }
}
