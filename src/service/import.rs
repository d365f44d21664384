use crate::db::customer::{blocking_queries, schema, schema::NewCustomer};
use crate::service::parse;
use crate::Result;
use rusqlite::Connection;
use serde::Deserialize;
use std::io::Read;
use time::{format_description::well_known::Rfc3339, macros::format_description};
use time::{Date, Month, OffsetDateTime};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(rename = "Number")]
    number: Option<String>,
    #[serde(rename = "Name of Location")]
    name_of_location: Option<String>,
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Login Hour")]
    login_hour: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Age")]
    age: Option<String>,
    #[serde(rename = "gender")]
    gender: Option<String>,
    #[serde(rename = "Email")]
    email: Option<String>,
    #[serde(rename = "No Telp")]
    no_telp: Option<String>,
    #[serde(rename = "Brand Device")]
    brand_device: Option<String>,
    #[serde(rename = "Digital Interest")]
    digital_interest: Option<String>,
    #[serde(rename = "Location Type")]
    location_type: Option<String>,
}

impl ImportRow {
    fn into_customer(self, now: OffsetDateTime) -> NewCustomer {
        let date = match self.date.as_deref().filter(|it| !it.is_empty()) {
            Some(raw) => parse_date(raw).unwrap_or_else(|| {
                warn!(raw, "Unparsable date, using import time");
                now
            }),
            None => now,
        };
        NewCustomer {
            number: parse_number(self.number.as_deref()),
            name_of_location: self.name_of_location.unwrap_or_default(),
            date,
            login_hour: self.login_hour.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            age: parse_number(self.age.as_deref()),
            gender: self.gender.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            no_telp: self.no_telp.unwrap_or_default(),
            brand_device: self.brand_device.unwrap_or_default(),
            digital_interest: self.digital_interest.unwrap_or_default(),
            location_type: self.location_type.unwrap_or_default(),
        }
    }
}

/// Leading integer of the field, 0 when there is none.
fn parse_number(raw: Option<&str>) -> i64 {
    raw.and_then(parse::int_prefix).unwrap_or(0)
}

/// Accepts RFC 3339, `YYYY-MM-DD` and `M/D/YYYY`. Dates without a time are
/// taken as midnight UTC. Years the store can't hold are rejected.
fn parse_date(raw: &str) -> Option<OffsetDateTime> {
    parse_date_any_year(raw.trim()).filter(|it| schema::STORABLE_YEARS.contains(&it.year()))
}

fn parse_date_any_year(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(date_time) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(date_time);
    }
    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Some(date.midnight().assume_utc());
    }
    let mut parts = raw.split('/').map(|it| it.trim().parse::<i32>().ok());
    let (Some(Some(month)), Some(Some(day)), Some(Some(year)), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
    let day = u8::try_from(day).ok()?;
    Date::from_calendar_date(year, month, day)
        .ok()
        .map(|it| it.midnight().assume_utc())
}

#[derive(Debug, PartialEq, Eq)]
pub struct ImportReport {
    pub deleted: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Replaces every stored customer with the rows of a CSV file. Rows are
/// buffered and inserted `batch_size` at a time. The wipe and all inserts
/// share one transaction, so a failed import keeps the previous rows.
pub fn import(input: impl Read, batch_size: usize, conn: &mut Connection) -> Result<ImportReport> {
    let batch_size = batch_size.max(1);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);
    // Fail on a broken header before touching stored data
    reader.headers()?;

    let tx = conn.transaction()?;
    let deleted = blocking_queries::delete_all(&tx)?;
    info!(deleted, "Cleared existing customers");

    let now = OffsetDateTime::now_utc();
    let mut batch = Vec::with_capacity(batch_size);
    let mut imported = 0;
    let mut skipped = 0;
    for row in reader.deserialize::<ImportRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                let line = e.position().map(|it| it.line());
                warn!(?line, error = %e, "Skipping malformed row");
                skipped += 1;
                continue;
            }
        };
        batch.push(row.into_customer(now));
        if batch.len() >= batch_size {
            imported += blocking_queries::insert_batch(&batch, &tx)?;
            batch.clear();
            info!(imported, "Imported customers so far");
        }
    }
    if !batch.is_empty() {
        imported += blocking_queries::insert_batch(&batch, &tx)?;
    }
    tx.commit()?;

    info!(imported, skipped, "Import completed");
    Ok(ImportReport {
        deleted,
        imported,
        skipped,
    })
}

#[cfg(test)]
mod test {
    use super::ImportReport;
    use crate::db::customer::{blocking_queries, schema::Columns};
    use crate::{db::test::conn, Result};
    use time::macros::datetime;
    use time::OffsetDateTime;

    const HEADER: &str = "Number,Name of Location,Date,Login Hour,Name,Age,gender,Email,No Telp,Brand Device,Digital Interest,Location Type";

    const CSV: &str = "\
Number,Name of Location,Date,Login Hour,Name,Age,gender,Email,No Telp,Brand Device,Digital Interest,Location Type
1,Jakarta,2023-05-01,09:15,Budi,31,Male,budi@example.com,0812,Samsung,Gaming,Urban
2,Bandung,5/2/2023,21:40,Sari,27,Female,sari@example.com,0813,Apple,Fashion,Rural
three,,,,,unknown,,,,,,
";

    #[test]
    fn import_rows_with_defaults() -> Result<()> {
        let mut conn = conn();
        let before = OffsetDateTime::now_utc();
        let report = super::import(CSV.as_bytes(), 2, &mut conn)?;
        assert_eq!(
            ImportReport {
                deleted: 0,
                imported: 3,
                skipped: 0,
            },
            report
        );

        let rows = blocking_queries::select_page(Columns::Number, false, 10, 0, &conn)?;
        assert_eq!(3, rows.len());

        let blank = &rows[0];
        assert_eq!(0, blank.number);
        assert_eq!(0, blank.age);
        assert_eq!("", blank.name);
        assert_eq!("", blank.gender);
        assert!(blank.date >= before);

        let budi = &rows[1];
        assert_eq!("Jakarta", budi.name_of_location);
        assert_eq!(datetime!(2023-05-01 0:00 UTC), budi.date);
        assert_eq!("09:15", budi.login_hour);
        assert_eq!(31, budi.age);
        assert_eq!("Samsung", budi.brand_device);

        let sari = &rows[2];
        assert_eq!(datetime!(2023-05-02 0:00 UTC), sari.date);
        assert_eq!("Fashion", sari.digital_interest);
        Ok(())
    }

    #[test]
    fn import_replaces_existing_rows() -> Result<()> {
        let mut conn = conn();
        super::import(CSV.as_bytes(), 1000, &mut conn)?;
        let report = super::import(CSV.as_bytes(), 1000, &mut conn)?;
        assert_eq!(3, report.deleted);
        assert_eq!(3, blocking_queries::select_count(&conn)?);
        Ok(())
    }

    #[test]
    fn import_orders_dates_by_instant() -> Result<()> {
        let mut conn = conn();
        let csv = format!(
            "{HEADER}\n1,,2024-01-01T10:00:00+07:00,,,,,,,,,\n2,,2024-01-01T05:00:00Z,,,,,,,,,\n"
        );
        super::import(csv.as_bytes(), 10, &mut conn)?;
        let rows = blocking_queries::select_page(Columns::Date, false, 10, 0, &conn)?;
        let numbers: Vec<i64> = rows.iter().map(|it| it.number).collect();
        assert_eq!(vec![1, 2], numbers);
        assert_eq!(datetime!(2024-01-01 3:00 UTC), rows[0].date);
        Ok(())
    }

    #[test]
    fn import_unstorable_year_falls_back_to_now() -> Result<()> {
        let mut conn = conn();
        super::import(CSV.as_bytes(), 10, &mut conn)?;
        let before = OffsetDateTime::now_utc();
        let csv = format!("{HEADER}\n3,,1/1/-5,,,,,,,,,\n");
        let report = super::import(csv.as_bytes(), 10, &mut conn)?;
        assert_eq!(1, report.imported);
        let rows = blocking_queries::select_page(Columns::Id, false, 10, 0, &conn)?;
        assert_eq!(1, rows.len());
        assert_eq!(3, rows[0].number);
        assert!(rows[0].date >= before);
        Ok(())
    }

    #[test]
    fn failed_import_keeps_previous_rows() -> Result<()> {
        let mut conn = conn();
        super::import(CSV.as_bytes(), 1, &mut conn)?;
        conn.execute_batch(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON customer WHEN NEW.name = 'Bad'
            BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )?;
        let csv = format!("{HEADER}\n4,,,,Good,,,,,,,\n5,,,,Bad,,,,,,,\n");
        assert!(super::import(csv.as_bytes(), 1, &mut conn).is_err());
        assert_eq!(3, blocking_queries::select_count(&conn)?);
        Ok(())
    }

    #[test]
    fn import_reads_leading_integers() -> Result<()> {
        let mut conn = conn();
        let csv = format!("{HEADER}\n7.0,,,,,31.5,,,,,,\n");
        super::import(csv.as_bytes(), 10, &mut conn)?;
        let rows = blocking_queries::select_page(Columns::Id, false, 10, 0, &conn)?;
        assert_eq!(7, rows[0].number);
        assert_eq!(31, rows[0].age);
        Ok(())
    }

    #[test]
    fn import_missing_columns() -> Result<()> {
        let mut conn = conn();
        let csv = "Name,gender\nAni,Female\n";
        super::import(csv.as_bytes(), 10, &mut conn)?;
        let rows = blocking_queries::select_page(Columns::Id, false, 10, 0, &conn)?;
        assert_eq!("Ani", rows[0].name);
        assert_eq!("Female", rows[0].gender);
        assert_eq!("", rows[0].brand_device);
        assert_eq!(0, rows[0].number);
        Ok(())
    }

    #[test]
    fn parse_date() {
        assert_eq!(
            Some(datetime!(2024-02-29 13:45 UTC)),
            super::parse_date("2024-02-29T13:45:00Z")
        );
        assert_eq!(
            Some(datetime!(2024-12-31 0:00 UTC)),
            super::parse_date("12/31/2024")
        );
        assert_eq!(None, super::parse_date("31/12/2024"));
        assert_eq!(None, super::parse_date("yesterday"));
        assert_eq!(None, super::parse_date("1/2/3/4"));
        assert_eq!(None, super::parse_date("1/1/-5"));
        assert_eq!(None, super::parse_date("1/1/0"));
        assert_eq!(None, super::parse_date("0000-06-01"));
    }
}
