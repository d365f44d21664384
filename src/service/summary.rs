use crate::db::customer::{
    blocking_queries::{AgeBucketCount, GenderStats, GroupCount, InterestGenderCount},
    queries,
    schema::Columns,
};
use crate::service::deadline;
use crate::Result;
use deadpool_sqlite::Pool;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub const MALE: &str = "Male";
pub const FEMALE: &str = "Female";
pub const TOP_DEVICES: i64 = 10;
/// Lower bounds of the age ranges. The last value is the exclusive upper
/// bound of the last range, anything outside goes to `Other`.
pub const AGE_BOUNDARIES: [i64; 8] = [0, 18, 25, 35, 45, 55, 65, 100];
pub const OTHER_AGE_RANGE: &str = "Other";

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub total_customers: i64,
    pub gender_distribution: Vec<GenderBucket>,
    pub device_popularity: Vec<DeviceBucket>,
    pub interest_categories: Vec<InterestCategory>,
    pub location_breakdown: Vec<LocationBucket>,
    pub age_demographics: Vec<AgeBucket>,
    pub peak_hours: Vec<HourBucket>,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenderBucket {
    pub gender: String,
    pub count: i64,
    pub avg_age: f64,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct DeviceBucket {
    pub device: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterestCategory {
    pub interest: String,
    pub count: i64,
    pub top_gender: TopGender,
}

#[derive(Serialize, Debug, PartialEq, Clone)]
pub struct TopGender {
    pub gender: String,
    pub count: i64,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct LocationBucket {
    pub location: String,
    pub count: i64,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgeBucket {
    pub range: String,
    pub count: i64,
    pub male_count: i64,
    pub female_count: i64,
    pub male_percentage: f64,
    pub female_percentage: f64,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct HourBucket {
    pub hour: String,
    pub count: i64,
}

/// Recomputes every view from the store. The total count and the six
/// groupings run concurrently on separate connections, so they may observe
/// different instants if the store is written to meanwhile.
pub async fn compute(pool: &Pool, budget: Duration) -> Result<SummaryReport> {
    let (total, genders, devices, interests, locations, ages, hours) =
        deadline::race(budget, async {
            futures_util::try_join!(
                queries::select_count(pool),
                queries::select_gender_stats(pool),
                queries::select_counts_by(Columns::BrandDevice, Some(TOP_DEVICES), pool),
                queries::select_interest_gender_counts(pool),
                queries::select_counts_by(Columns::LocationType, None, pool),
                queries::select_age_bucket_counts(&AGE_BOUNDARIES, MALE, FEMALE, pool),
                queries::select_hour_counts(pool),
            )
        })
        .await?;
    debug!(total, "Computed summary");
    Ok(SummaryReport {
        total_customers: total,
        gender_distribution: gender_distribution(genders),
        device_popularity: device_popularity(devices, total),
        interest_categories: interest_categories(interests),
        location_breakdown: location_breakdown(locations),
        age_demographics: age_demographics(&AGE_BOUNDARIES, ages),
        peak_hours: peak_hours(hours),
    })
}

fn by_count_desc(a_count: i64, a_key: &str, b_count: i64, b_key: &str) -> Ordering {
    b_count.cmp(&a_count).then_with(|| a_key.cmp(b_key))
}

pub fn gender_distribution(stats: Vec<GenderStats>) -> Vec<GenderBucket> {
    let mut res: Vec<GenderBucket> = stats
        .into_iter()
        .map(|it| GenderBucket {
            gender: it.gender,
            count: it.count,
            avg_age: it.avg_age,
        })
        .collect();
    res.sort_by(|a, b| by_count_desc(a.count, &a.gender, b.count, &b.gender));
    res
}

/// `devices` is expected to hold the largest groups only, `total_customers`
/// counts the whole store.
pub fn device_popularity(devices: Vec<GroupCount>, total_customers: i64) -> Vec<DeviceBucket> {
    let mut res: Vec<DeviceBucket> = devices
        .into_iter()
        .map(|it| DeviceBucket {
            percentage: percentage(it.count, total_customers),
            device: it.key,
            count: it.count,
        })
        .collect();
    res.sort_by(|a, b| by_count_desc(a.count, &a.device, b.count, &b.device));
    res.truncate(TOP_DEVICES as usize);
    res
}

/// The top gender is the most frequent gender inside an interest group. Equal
/// counts resolve to the lexically smallest gender name.
pub fn interest_categories(rows: Vec<InterestGenderCount>) -> Vec<InterestCategory> {
    let mut groups: BTreeMap<String, (i64, TopGender)> = BTreeMap::new();
    for row in rows {
        let candidate = TopGender {
            gender: row.gender,
            count: row.count,
        };
        match groups.get_mut(&row.interest) {
            Some((count, top)) => {
                *count += row.count;
                if candidate.count > top.count
                    || (candidate.count == top.count && candidate.gender < top.gender)
                {
                    *top = candidate;
                }
            }
            None => {
                groups.insert(row.interest, (row.count, candidate));
            }
        }
    }
    let mut res: Vec<InterestCategory> = groups
        .into_iter()
        .map(|(interest, (count, top_gender))| InterestCategory {
            interest,
            count,
            top_gender,
        })
        .collect();
    res.sort_by(|a, b| by_count_desc(a.count, &a.interest, b.count, &b.interest));
    res
}

pub fn location_breakdown(locations: Vec<GroupCount>) -> Vec<LocationBucket> {
    let mut res: Vec<LocationBucket> = locations
        .into_iter()
        .map(|it| LocationBucket {
            location: it.key,
            count: it.count,
        })
        .collect();
    res.sort_by(|a, b| by_count_desc(a.count, &a.location, b.count, &b.location));
    res
}

/// Every range is reported, in boundary order, followed by `Other`. Ranges
/// without customers have all counts and percentages set to 0.
pub fn age_demographics(boundaries: &[i64], counts: Vec<AgeBucketCount>) -> Vec<AgeBucket> {
    let mut res: Vec<AgeBucket> = boundaries
        .windows(2)
        .map(|range| format!("{}-{}", range[0], range[1] - 1))
        .chain(std::iter::once(OTHER_AGE_RANGE.to_string()))
        .map(|range| AgeBucket {
            range,
            count: 0,
            male_count: 0,
            female_count: 0,
            male_percentage: 0.0,
            female_percentage: 0.0,
        })
        .collect();
    for it in counts {
        let Some(bucket) = usize::try_from(it.bucket)
            .ok()
            .and_then(|index| res.get_mut(index))
        else {
            continue;
        };
        bucket.count += it.count;
        bucket.male_count += it.male_count;
        bucket.female_count += it.female_count;
    }
    for bucket in &mut res {
        bucket.male_percentage = percentage(bucket.male_count, bucket.count);
        bucket.female_percentage = percentage(bucket.female_count, bucket.count);
    }
    res
}

/// Ordered by hour key as a string, so `"10"` sorts before `"9:"`.
pub fn peak_hours(hours: Vec<GroupCount>) -> Vec<HourBucket> {
    let mut res: Vec<HourBucket> = hours
        .into_iter()
        .map(|it| HourBucket {
            hour: it.key,
            count: it.count,
        })
        .collect();
    res.sort_by(|a, b| a.hour.cmp(&b.hour));
    res
}

/// `part / whole * 100` rounded to 2 decimal places, halves to even. An
/// empty `whole` yields 0.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    let scaled = i128::from(part) * 10_000;
    let whole = i128::from(whole);
    let quotient = scaled / whole;
    let hundredths = match (scaled % whole * 2).cmp(&whole) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal => quotient + quotient % 2,
    };
    hundredths as f64 / 100.0
}
