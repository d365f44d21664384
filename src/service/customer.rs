use crate::db::customer::{
    queries,
    schema::{Columns, Customer},
};
use crate::service::{deadline, parse};
use crate::Result;
use deadpool_sqlite::Pool;
use std::str::FromStr;
use std::time::Duration;
use strum::{AsRefStr, EnumString};
use tracing::debug;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;

/// Fields a client may sort by, named as they appear on the wire. The
/// identifier is not sortable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum SortField {
    Number,
    NameOfLocation,
    Date,
    LoginHour,
    Name,
    Age,
    Gender,
    Email,
    NoTelp,
    BrandDevice,
    DigitalInterest,
    LocationType,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Unknown or missing names fall back to `createdAt`.
    pub fn parse_or_default(raw: Option<&str>) -> SortField {
        raw.and_then(|it| SortField::from_str(it).ok())
            .unwrap_or_default()
    }

    pub fn column(self) -> Columns {
        match self {
            SortField::Number => Columns::Number,
            SortField::NameOfLocation => Columns::NameOfLocation,
            SortField::Date => Columns::Date,
            SortField::LoginHour => Columns::LoginHour,
            SortField::Name => Columns::Name,
            SortField::Age => Columns::Age,
            SortField::Gender => Columns::Gender,
            SortField::Email => Columns::Email,
            SortField::NoTelp => Columns::NoTelp,
            SortField::BrandDevice => Columns::BrandDevice,
            SortField::DigitalInterest => Columns::DigitalInterest,
            SortField::LocationType => Columns::LocationType,
            SortField::CreatedAt => Columns::CreatedAt,
            SortField::UpdatedAt => Columns::UpdatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Accepts `asc` and `desc` in any case, anything else is `desc`.
    pub fn parse_or_default(raw: Option<&str>) -> SortOrder {
        match raw {
            Some(raw) if raw.eq_ignore_ascii_case("asc") => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    pub fn is_descending(self) -> bool {
        self == SortOrder::Descending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl PageRequest {
    /// Builds a request from raw query values. Invalid values are replaced
    /// with defaults, never rejected.
    pub fn from_raw(
        page: Option<&str>,
        per_page: Option<&str>,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> PageRequest {
        PageRequest {
            page: parse_positive(page, DEFAULT_PAGE),
            per_page: parse_positive(per_page, DEFAULT_PER_PAGE),
            sort_by: SortField::parse_or_default(sort_by),
            sort_order: SortOrder::parse_or_default(sort_order),
        }
    }

    fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// Reads the leading integer, so `"2.5"` is 2.
fn parse_positive(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(parse::int_prefix)
        .filter(|it| *it >= 1)
        .unwrap_or(default)
}

#[derive(Debug, PartialEq)]
pub struct Page {
    pub page: i64,
    pub result: Vec<Customer>,
    /// 0 when there is no next page.
    pub next_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    /// 0 when there is no previous page.
    pub previous_page: i64,
}

impl Page {
    /// `rows` is the result of fetching `per_page + 1` rows: the extra row only
    /// signals that a next page exists and is dropped.
    fn new(req: &PageRequest, mut rows: Vec<Customer>, total_count: i64) -> Page {
        let per_page = usize::try_from(req.per_page).unwrap_or(usize::MAX);
        let has_next_page = rows.len() > per_page;
        rows.truncate(per_page);
        Page {
            page: req.page,
            result: rows,
            next_page: if has_next_page { req.page + 1 } else { 0 },
            per_page: req.per_page,
            total_pages: total_pages(total_count, req.per_page),
            total_count,
            previous_page: if req.page > 1 { req.page - 1 } else { 0 },
        }
    }
}

fn total_pages(total_count: i64, per_page: i64) -> i64 {
    let full = total_count / per_page;
    if total_count % per_page > 0 {
        full + 1
    } else {
        full
    }
}

pub async fn list(req: &PageRequest, pool: &Pool, budget: Duration) -> Result<Page> {
    let sort_by: &str = req.sort_by.as_ref();
    debug!(
        page = req.page,
        per_page = req.per_page,
        sort_by,
        descending = req.sort_order.is_descending(),
        "Listing customers"
    );
    let (rows, total_count) = deadline::race(budget, async {
        futures_util::try_join!(
            queries::select_page(
                req.sort_by.column(),
                req.sort_order.is_descending(),
                req.per_page.saturating_add(1),
                req.offset(),
                pool,
            ),
            queries::select_count(pool),
        )
    })
    .await?;
    Ok(Page::new(req, rows, total_count))
}

pub async fn count(pool: &Pool, budget: Duration) -> Result<i64> {
    deadline::race(budget, queries::select_count(pool)).await
}
