//! Row mapping for every stored entity, plus the generic query helpers built on it.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Params, Row, types::Type};

use crate::error::Result;
use crate::models::{Consumer, License, LicenseType, Product, User};

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

pub const USER_COLS: &str = "id, email, password_hash, role, created_at";
pub const PRODUCT_COLS: &str = "id, name, description, created_by, created_at";
pub const CONSUMER_COLS: &str =
    "id, name, email, phone, country, account_number, created_by, created_at";
pub const LICENSE_COLS: &str =
    "id, license_key, product_id, consumer_id, license_type, expires, active, created_by, created_at";

pub fn query_one<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Option<T>> {
    let row = conn.query_row(sql, params, T::from_row).optional()?;
    Ok(row)
}

pub fn query_all<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Read a unix-milliseconds column as a UTC timestamp.
pub fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {}", millis).into(),
        )
    })
}

pub fn opt_timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let millis: Option<i64> = row.get(idx)?;
    match millis {
        Some(_) => timestamp_at(row, idx).map(Some),
        None => Ok(None),
    }
}

pub fn license_type_at(row: &Row, idx: usize) -> rusqlite::Result<LicenseType> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: strum::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get::<_, Option<String>>(2)?.filter(|h| !h.is_empty()),
            role: row.get(3)?,
            created_at: timestamp_at(row, 4)?,
        })
    }
}

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_by: row.get(3)?,
            created_at: timestamp_at(row, 4)?,
        })
    }
}

impl FromRow for Consumer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Consumer {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            country: row.get(4)?,
            account_number: row.get(5)?,
            created_by: row.get(6)?,
            created_at: timestamp_at(row, 7)?,
        })
    }
}

impl FromRow for License {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(License {
            id: row.get(0)?,
            license_key: row.get(1)?,
            product_id: row.get(2)?,
            consumer_id: row.get(3)?,
            license_type: license_type_at(row, 4)?,
            expires: opt_timestamp_at(row, 5)?,
            active: row.get(6)?,
            created_by: row.get(7)?,
            created_at: timestamp_at(row, 8)?,
        })
    }
}
