use rusqlite::Row;
use std::ops::RangeInclusive;
use std::sync::OnceLock;
use time::OffsetDateTime;

pub const TABLE_NAME: &str = "customer";

/// Years a stored timestamp may have in any offset. Converting to UTC keeps
/// them within four digits.
pub const STORABLE_YEARS: RangeInclusive<i32> = 1..=9998;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Columns {
    Id,
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
    CreatedAt,
    UpdatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::Number => "number",
            Columns::NameOfLocation => "name_of_location",
            Columns::Date => "date",
            Columns::LoginHour => "login_hour",
            Columns::Name => "name",
            Columns::Age => "age",
            Columns::Gender => "gender",
            Columns::Email => "email",
            Columns::NoTelp => "no_telp",
            Columns::BrandDevice => "brand_device",
            Columns::DigitalInterest => "digital_interest",
            Columns::LocationType => "location_type",
            Columns::CreatedAt => "created_at",
            Columns::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub number: i64,
    pub name_of_location: String,
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
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Customer {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::Number,
                Columns::NameOfLocation,
                Columns::Date,
                Columns::LoginHour,
                Columns::Name,
                Columns::Age,
                Columns::Gender,
                Columns::Email,
                Columns::NoTelp,
                Columns::BrandDevice,
                Columns::DigitalInterest,
                Columns::LocationType,
                Columns::CreatedAt,
                Columns::UpdatedAt,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<Customer> {
        |row| {
            Ok(Customer {
                id: row.get(Columns::Id.as_str())?,
                number: row.get(Columns::Number.as_str())?,
                name_of_location: row.get(Columns::NameOfLocation.as_str())?,
                date: row.get(Columns::Date.as_str())?,
                login_hour: row.get(Columns::LoginHour.as_str())?,
                name: row.get(Columns::Name.as_str())?,
                age: row.get(Columns::Age.as_str())?,
                gender: row.get(Columns::Gender.as_str())?,
                email: row.get(Columns::Email.as_str())?,
                no_telp: row.get(Columns::NoTelp.as_str())?,
                brand_device: row.get(Columns::BrandDevice.as_str())?,
                digital_interest: row.get(Columns::DigitalInterest.as_str())?,
                location_type: row.get(Columns::LocationType.as_str())?,
                created_at: row.get(Columns::CreatedAt.as_str())?,
                updated_at: row.get(Columns::UpdatedAt.as_str())?,
            })
        }
    }
}

/// A customer row as it arrives from an import, before the store assigns
/// `id` and the timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub number: i64,
    pub name_of_location: String,
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
}

#[cfg(test)]
impl NewCustomer {
    pub fn mock() -> Self {
        NewCustomer {
            number: 1,
            name_of_location: "Jakarta".into(),
            date: OffsetDateTime::UNIX_EPOCH,
            login_hour: "09:00".into(),
            name: "Budi".into(),
            age: 30,
            gender: "Male".into(),
            email: "budi@example.com".into(),
            no_telp: "0812000000".into(),
            brand_device: "Samsung".into(),
            digital_interest: "Gaming".into(),
            location_type: "Urban".into(),
        }
    }
}
