use crate::conf::Conf;
use crate::db::customer::schema::Customer;
use crate::rest::error::{RestApiError, RestResult};
use crate::service::customer::{self, Page, PageRequest};
use actix_web::get;
use actix_web::web::{Data, Json, Query};
use deadpool_sqlite::Pool;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Raw query values, validated leniently by `PageRequest::from_raw`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetArgs {
    page: Option<String>,
    per_page: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: i64,
    pub number: i64,
    pub name_of_location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub login_hour: String,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub email: String,
    pub no_telp: String,
    pub brand_device: String,
    pub digital_interest: String,
    pub location_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Customer> for Item {
    fn from(val: Customer) -> Self {
        Item {
            id: val.id,
            number: val.number,
            name_of_location: val.name_of_location,
            date: val.date,
            login_hour: val.login_hour,
            name: val.name,
            age: val.age,
            gender: val.gender,
            email: val.email,
            no_telp: val.no_telp,
            brand_device: val.brand_device,
            digital_interest: val.digital_interest,
            location_type: val.location_type,
            created_at: val.created_at,
            updated_at: val.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRes {
    pub page: i64,
    pub result: Vec<Item>,
    pub next_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub previous_page: i64,
}

impl From<Page> for PageRes {
    fn from(val: Page) -> Self {
        PageRes {
            page: val.page,
            result: val.result.into_iter().map(Into::into).collect(),
            next_page: val.next_page,
            per_page: val.per_page,
            total_pages: val.total_pages,
            total_count: val.total_count,
            previous_page: val.previous_page,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CountRes {
    pub count: i64,
    pub msg: String,
}

#[get("")]
pub async fn get(args: Query<GetArgs>, pool: Data<Pool>, conf: Data<Conf>) -> RestResult<PageRes> {
    let req = PageRequest::from_raw(
        args.page.as_deref(),
        args.per_page.as_deref(),
        args.sort_by.as_deref(),
        args.sort_order.as_deref(),
    );
    customer::list(&req, &pool, conf.query_timeout)
        .await
        .map(|it| Json(it.into()))
        .map_err(RestApiError::list_customers)
}

#[get("/count")]
pub async fn get_count(pool: Data<Pool>, conf: Data<Conf>) -> RestResult<CountRes> {
    customer::count(&pool, conf.query_timeout)
        .await
        .map(|count| {
            Json(CountRes {
                count,
                msg: "Total customers retrieved successfully".into(),
            })
        })
        .map_err(RestApiError::count_customers)
}
