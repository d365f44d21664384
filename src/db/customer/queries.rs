use super::{
    blocking_queries::{self, AgeBucketCount, GenderStats, GroupCount, InterestGenderCount},
    schema::{Columns, Customer},
};
use crate::Result;
use deadpool_sqlite::Pool;

pub async fn select_page(
    sort_by: Columns,
    descending: bool,
    limit: i64,
    offset: i64,
    pool: &Pool,
) -> Result<Vec<Customer>> {
    pool.get()
        .await?
        .interact(move |conn| blocking_queries::select_page(sort_by, descending, limit, offset, conn))
        .await?
}

pub async fn select_count(pool: &Pool) -> Result<i64> {
    pool.get()
        .await?
        .interact(|conn| blocking_queries::select_count(conn))
        .await?
}

pub async fn select_gender_stats(pool: &Pool) -> Result<Vec<GenderStats>> {
    pool.get()
        .await?
        .interact(|conn| blocking_queries::select_gender_stats(conn))
        .await?
}

pub async fn select_counts_by(
    column: Columns,
    limit: Option<i64>,
    pool: &Pool,
) -> Result<Vec<GroupCount>> {
    pool.get()
        .await?
        .interact(move |conn| blocking_queries::select_counts_by(column, limit, conn))
        .await?
}

pub async fn select_interest_gender_counts(pool: &Pool) -> Result<Vec<InterestGenderCount>> {
    pool.get()
        .await?
        .interact(|conn| blocking_queries::select_interest_gender_counts(conn))
        .await?
}

pub async fn select_age_bucket_counts(
    boundaries: &'static [i64],
    male: &'static str,
    female: &'static str,
    pool: &Pool,
) -> Result<Vec<AgeBucketCount>> {
    pool.get()
        .await?
        .interact(move |conn| {
            blocking_queries::select_age_bucket_counts(boundaries, male, female, conn)
        })
        .await?
}

pub async fn select_hour_counts(pool: &Pool) -> Result<Vec<GroupCount>> {
    pool.get()
        .await?
        .interact(|conn| blocking_queries::select_hour_counts(conn))
        .await?
}
