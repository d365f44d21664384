use crate::conf::Conf;
use crate::rest::error::{RestApiError, RestResult};
use crate::service::summary::{self, SummaryReport};
use actix_web::get;
use actix_web::web::{Data, Json};
use deadpool_sqlite::Pool;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRes {
    pub status: &'static str,
    pub data: SummaryReport,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

#[get("/summary")]
pub async fn get(pool: Data<Pool>, conf: Data<Conf>) -> RestResult<SummaryRes> {
    let data = summary::compute(&pool, conf.query_timeout)
        .await
        .map_err(RestApiError::summary)?;
    Ok(Json(SummaryRes {
        status: "success",
        data,
        generated_at: OffsetDateTime::now_utc(),
    }))
}
