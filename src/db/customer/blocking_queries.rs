use super::schema::{self, Columns, Customer, NewCustomer};
use crate::{Error, Result};
use rusqlite::{named_params, params, Connection, Row};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, PartialEq)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

impl GroupCount {
    const fn mapper() -> fn(&Row) -> rusqlite::Result<GroupCount> {
        |row| {
            Ok(GroupCount {
                key: row.get(0)?,
                count: row.get(1)?,
            })
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct GenderStats {
    pub gender: String,
    pub count: i64,
    pub avg_age: f64,
}

#[derive(Debug, PartialEq)]
pub struct InterestGenderCount {
    pub interest: String,
    pub gender: String,
    pub count: i64,
}

#[derive(Debug, PartialEq)]
pub struct AgeBucketCount {
    /// Index of the lower boundary, or `boundaries.len() - 1` for ages
    /// outside all ranges.
    pub bucket: i64,
    pub count: i64,
    pub male_count: i64,
    pub female_count: i64,
}

/// Timestamps are stored as UTC text with nanosecond precision, so comparing
/// the text orders rows by instant.
pub fn format_timestamp(date_time: OffsetDateTime) -> Result<String> {
    if !schema::STORABLE_YEARS.contains(&date_time.year()) {
        return Err(Error::Generic(format!("Timestamp out of range: {date_time}")));
    }
    Ok(date_time.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
    ))?)
}

pub fn insert(customer: &NewCustomer, conn: &Connection) -> Result<Customer> {
    insert_row(customer, conn)?;
    select_by_id(conn.last_insert_rowid(), conn)
}

/// Runs inside the caller's transaction, if any.
pub fn insert_batch(customers: &[NewCustomer], conn: &Connection) -> Result<usize> {
    for customer in customers {
        insert_row(customer, conn)?;
    }
    Ok(customers.len())
}

fn insert_row(customer: &NewCustomer, conn: &Connection) -> Result<()> {
    let sql = format!(
        r#"
            INSERT INTO {table} (
                {number},
                {name_of_location},
                {date},
                {login_hour},
                {name},
                {age},
                {gender},
                {email},
                {no_telp},
                {brand_device},
                {digital_interest},
                {location_type}
            ) VALUES (
                :number,
                :name_of_location,
                :date,
                :login_hour,
                :name,
                :age,
                :gender,
                :email,
                :no_telp,
                :brand_device,
                :digital_interest,
                :location_type
            )
        "#,
        table = schema::TABLE_NAME,
        number = Columns::Number.as_str(),
        name_of_location = Columns::NameOfLocation.as_str(),
        date = Columns::Date.as_str(),
        login_hour = Columns::LoginHour.as_str(),
        name = Columns::Name.as_str(),
        age = Columns::Age.as_str(),
        gender = Columns::Gender.as_str(),
        email = Columns::Email.as_str(),
        no_telp = Columns::NoTelp.as_str(),
        brand_device = Columns::BrandDevice.as_str(),
        digital_interest = Columns::DigitalInterest.as_str(),
        location_type = Columns::LocationType.as_str(),
    );
    conn.prepare_cached(&sql)?.execute(named_params! {
        ":number": customer.number,
        ":name_of_location": customer.name_of_location,
        ":date": format_timestamp(customer.date)?,
        ":login_hour": customer.login_hour,
        ":name": customer.name,
        ":age": customer.age,
        ":gender": customer.gender,
        ":email": customer.email,
        ":no_telp": customer.no_telp,
        ":brand_device": customer.brand_device,
        ":digital_interest": customer.digital_interest,
        ":location_type": customer.location_type,
    })?;
    Ok(())
}

pub fn delete_all(conn: &Connection) -> Result<usize> {
    let sql = format!("DELETE FROM {table}", table = schema::TABLE_NAME);
    Ok(conn.execute(&sql, [])?)
}

pub fn select_by_id(id: i64, conn: &Connection) -> Result<Customer> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = Customer::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    Ok(conn.query_row(&sql, params![id], Customer::mapper())?)
}

/// Rows are ordered by `sort_by` and then by id, both in the same direction,
/// so rows sharing a sort value keep a stable position across pages.
pub fn select_page(
    sort_by: Columns,
    descending: bool,
    limit: i64,
    offset: i64,
    conn: &Connection,
) -> Result<Vec<Customer>> {
    let direction = if descending { "DESC" } else { "ASC" };
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            ORDER BY {sort_by} {direction}, {id} {direction}
            LIMIT :limit OFFSET :offset
        "#,
        projection = Customer::projection(),
        table = schema::TABLE_NAME,
        sort_by = sort_by.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(
            named_params! {
                ":limit": limit,
                ":offset": offset,
            },
            Customer::mapper(),
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub fn select_count(conn: &Connection) -> Result<i64> {
    let sql = format!(
        r#"
            SELECT count(*)
            FROM {table}
        "#,
        table = schema::TABLE_NAME,
    );
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

pub fn select_gender_stats(conn: &Connection) -> Result<Vec<GenderStats>> {
    let sql = format!(
        r#"
            SELECT {gender}, count(*) AS count, avg({age}) AS avg_age
            FROM {table}
            GROUP BY {gender}
            ORDER BY count DESC, {gender}
        "#,
        table = schema::TABLE_NAME,
        gender = Columns::Gender.as_str(),
        age = Columns::Age.as_str(),
    );
    conn.prepare(&sql)?
        .query_map([], |row| {
            Ok(GenderStats {
                gender: row.get(0)?,
                count: row.get(1)?,
                avg_age: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Counts per distinct value of `column`, largest first.
pub fn select_counts_by(
    column: Columns,
    limit: Option<i64>,
    conn: &Connection,
) -> Result<Vec<GroupCount>> {
    let sql = format!(
        r#"
            SELECT {column}, count(*) AS count
            FROM {table}
            GROUP BY {column}
            ORDER BY count DESC, {column}
            LIMIT :limit
        "#,
        table = schema::TABLE_NAME,
        column = column.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(
            named_params! { ":limit": limit.unwrap_or(i64::MAX) },
            GroupCount::mapper(),
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub fn select_interest_gender_counts(conn: &Connection) -> Result<Vec<InterestGenderCount>> {
    let sql = format!(
        r#"
            SELECT {interest}, {gender}, count(*) AS count
            FROM {table}
            GROUP BY {interest}, {gender}
            ORDER BY {interest}, {gender}
        "#,
        table = schema::TABLE_NAME,
        interest = Columns::DigitalInterest.as_str(),
        gender = Columns::Gender.as_str(),
    );
    conn.prepare(&sql)?
        .query_map([], |row| {
            Ok(InterestGenderCount {
                interest: row.get(0)?,
                gender: row.get(1)?,
                count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Buckets ages into `[boundaries[i], boundaries[i + 1])`. Everything else
/// lands in bucket `boundaries.len() - 1`. Empty buckets produce no row.
pub fn select_age_bucket_counts(
    boundaries: &[i64],
    male: &str,
    female: &str,
    conn: &Connection,
) -> Result<Vec<AgeBucketCount>> {
    let age = Columns::Age.as_str();
    let other = boundaries.len().saturating_sub(1);
    let whens: Vec<String> = boundaries
        .windows(2)
        .enumerate()
        .map(|(index, range)| {
            format!(
                "WHEN {age} >= {min} AND {age} < {max} THEN {index}",
                min = range[0],
                max = range[1],
            )
        })
        .collect();
    let bucket = if whens.is_empty() {
        other.to_string()
    } else {
        format!("CASE {} ELSE {other} END", whens.join(" "))
    };
    let sql = format!(
        r#"
            SELECT
                {bucket} AS bucket,
                count(*) AS count,
                sum(CASE WHEN {gender} = :male THEN 1 ELSE 0 END) AS male_count,
                sum(CASE WHEN {gender} = :female THEN 1 ELSE 0 END) AS female_count
            FROM {table}
            GROUP BY bucket
            ORDER BY bucket
        "#,
        table = schema::TABLE_NAME,
        gender = Columns::Gender.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(
            named_params! {
                ":male": male,
                ":female": female,
            },
            |row| {
                Ok(AgeBucketCount {
                    bucket: row.get(0)?,
                    count: row.get(1)?,
                    male_count: row.get(2)?,
                    female_count: row.get(3)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Groups by the first two characters of the login hour, ordered by that
/// prefix as a plain string.
pub fn select_hour_counts(conn: &Connection) -> Result<Vec<GroupCount>> {
    let sql = format!(
        r#"
            SELECT substr({login_hour}, 1, 2) AS hour, count(*) AS count
            FROM {table}
            GROUP BY hour
            ORDER BY hour COLLATE BINARY
        "#,
        table = schema::TABLE_NAME,
        login_hour = Columns::LoginHour.as_str(),
    );
    conn.prepare(&sql)?
        .query_map([], GroupCount::mapper())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

#[cfg(test)]
pub fn set_created_at(
    id: i64,
    created_at: OffsetDateTime,
    conn: &Connection,
) -> Result<Customer> {
    let sql = format!(
        r#"
            UPDATE {table}
            SET {created_at} = ?2
            WHERE {id} = ?1
        "#,
        table = schema::TABLE_NAME,
        created_at = Columns::CreatedAt.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.execute(&sql, params![id, format_timestamp(created_at)?])?;
    select_by_id(id, conn)
}

#[cfg(test)]
mod test {
    use super::GroupCount;
    use crate::db::customer::schema::{Columns, NewCustomer};
    use crate::{db::test::conn, Result};
    use time::macros::datetime;
    use time::{Date, Duration, Month, OffsetDateTime};

    fn customer(gender: &str, age: i64, device: &str) -> NewCustomer {
        NewCustomer {
            gender: gender.into(),
            age,
            brand_device: device.into(),
            ..NewCustomer::mock()
        }
    }

    #[test]
    fn insert_and_select_by_id() -> Result<()> {
        let conn = conn();
        let now = OffsetDateTime::now_utc();
        let inserted = super::insert(&NewCustomer::mock(), &conn)?;
        let selected = super::select_by_id(inserted.id, &conn)?;
        assert_eq!(inserted, selected);
        assert_eq!("Budi", selected.name);
        assert_eq!(OffsetDateTime::UNIX_EPOCH, selected.date);
        assert!(selected.created_at >= now - Duration::seconds(5));
        Ok(())
    }

    #[test]
    fn insert_batch_and_delete_all() -> Result<()> {
        let conn = conn();
        let batch = vec![NewCustomer::mock(); 3];
        assert_eq!(3, super::insert_batch(&batch, &conn)?);
        assert_eq!(3, super::select_count(&conn)?);
        assert_eq!(3, super::delete_all(&conn)?);
        assert_eq!(0, super::select_count(&conn)?);
        Ok(())
    }

    #[test]
    fn select_page() -> Result<()> {
        let conn = conn();
        let young = super::insert(&customer("Male", 20, "Oppo"), &conn)?;
        let old = super::insert(&customer("Male", 60, "Oppo"), &conn)?;
        let middle = super::insert(&customer("Male", 40, "Oppo"), &conn)?;

        let asc = super::select_page(Columns::Age, false, 10, 0, &conn)?;
        let ids: Vec<i64> = asc.iter().map(|it| it.id).collect();
        assert_eq!(vec![young.id, middle.id, old.id], ids);

        let desc = super::select_page(Columns::Age, true, 2, 1, &conn)?;
        let ids: Vec<i64> = desc.iter().map(|it| it.id).collect();
        assert_eq!(vec![middle.id, young.id], ids);
        Ok(())
    }

    #[test]
    fn select_page_orders_dates_by_instant() -> Result<()> {
        let conn = conn();
        let later = super::insert(
            &NewCustomer {
                date: datetime!(2024-01-01 5:00 UTC),
                ..NewCustomer::mock()
            },
            &conn,
        )?;
        let earlier = super::insert(
            &NewCustomer {
                date: datetime!(2024-01-01 10:00 +7),
                ..NewCustomer::mock()
            },
            &conn,
        )?;
        let res = super::select_page(Columns::Date, false, 10, 0, &conn)?;
        let ids: Vec<i64> = res.iter().map(|it| it.id).collect();
        assert_eq!(vec![earlier.id, later.id], ids);
        assert_eq!(datetime!(2024-01-01 3:00 UTC), res[0].date);
        Ok(())
    }

    #[test]
    fn format_timestamp() -> Result<()> {
        assert_eq!(
            "2024-01-01T03:00:00.000000000Z",
            super::format_timestamp(datetime!(2024-01-01 10:00 +7))?
        );
        let early = Date::from_calendar_date(9, Month::January, 1)
            .unwrap()
            .midnight()
            .assume_utc();
        assert_eq!(
            "0009-01-01T00:00:00.000000001Z",
            super::format_timestamp(early + Duration::nanoseconds(1))?
        );
        let negative = Date::from_calendar_date(-5, Month::January, 1)
            .unwrap()
            .midnight()
            .assume_utc();
        assert!(super::format_timestamp(negative).is_err());
        Ok(())
    }

    #[test]
    fn select_page_breaks_ties_by_id() -> Result<()> {
        let conn = conn();
        let first = super::insert(&NewCustomer::mock(), &conn)?;
        let second = super::insert(&NewCustomer::mock(), &conn)?;
        let res = super::select_page(Columns::Gender, true, 10, 0, &conn)?;
        assert_eq!(second.id, res[0].id);
        assert_eq!(first.id, res[1].id);
        Ok(())
    }

    #[test]
    fn select_gender_stats() -> Result<()> {
        let conn = conn();
        super::insert(&customer("Male", 20, ""), &conn)?;
        super::insert(&customer("Male", 30, ""), &conn)?;
        super::insert(&customer("Female", 40, ""), &conn)?;
        let res = super::select_gender_stats(&conn)?;
        assert_eq!(2, res.len());
        assert_eq!("Male", res[0].gender);
        assert_eq!(2, res[0].count);
        assert_eq!(25.0, res[0].avg_age);
        assert_eq!("Female", res[1].gender);
        assert_eq!(40.0, res[1].avg_age);
        Ok(())
    }

    #[test]
    fn select_counts_by_with_limit() -> Result<()> {
        let conn = conn();
        for device in ["Oppo", "Oppo", "Vivo", "Apple", "Apple", "Apple"] {
            super::insert(&customer("Male", 20, device), &conn)?;
        }
        let res = super::select_counts_by(Columns::BrandDevice, Some(2), &conn)?;
        assert_eq!(
            vec![
                GroupCount {
                    key: "Apple".into(),
                    count: 3
                },
                GroupCount {
                    key: "Oppo".into(),
                    count: 2
                },
            ],
            res,
        );
        Ok(())
    }

    #[test]
    fn select_age_bucket_counts() -> Result<()> {
        let conn = conn();
        super::insert(&customer("Male", 17, ""), &conn)?;
        super::insert(&customer("Female", 18, ""), &conn)?;
        super::insert(&customer("Male", 24, ""), &conn)?;
        super::insert(&customer("Female", 100, ""), &conn)?;
        super::insert(&customer("Female", -1, ""), &conn)?;
        let res = super::select_age_bucket_counts(&[0, 18, 25], "Male", "Female", &conn)?;
        assert_eq!(3, res.len());
        assert_eq!((0, 1, 1, 0), (res[0].bucket, res[0].count, res[0].male_count, res[0].female_count));
        assert_eq!((1, 2, 1, 1), (res[1].bucket, res[1].count, res[1].male_count, res[1].female_count));
        assert_eq!((2, 2, 0, 2), (res[2].bucket, res[2].count, res[2].male_count, res[2].female_count));
        Ok(())
    }

    #[test]
    fn select_hour_counts() -> Result<()> {
        let conn = conn();
        for login_hour in ["9:30", "10:00", "09:15", "10:45"] {
            super::insert(
                &NewCustomer {
                    login_hour: login_hour.into(),
                    ..NewCustomer::mock()
                },
                &conn,
            )?;
        }
        let res = super::select_hour_counts(&conn)?;
        let hours: Vec<&str> = res.iter().map(|it| it.key.as_str()).collect();
        assert_eq!(vec!["09", "10", "9:"], hours);
        assert_eq!(2, res[1].count);
        Ok(())
    }

    #[test]
    fn set_created_at() -> Result<()> {
        let conn = conn();
        let customer = super::insert(&NewCustomer::mock(), &conn)?;
        let created_at = OffsetDateTime::UNIX_EPOCH + Duration::days(1);
        let customer = super::set_created_at(customer.id, created_at, &conn)?;
        assert_eq!(created_at, customer.created_at);
        Ok(())
    }
}
