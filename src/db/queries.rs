use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{Connection, params};

use crate::error::{AppError, Result};
use crate::models::*;
use crate::util::{gen_id, generate_license_key, generate_session_token, hash_secret};

use super::from_row::{
    CONSUMER_COLS, FromRow, LICENSE_COLS, USER_COLS, license_type_at, opt_timestamp_at,
    query_all, query_one, timestamp_at,
};
use super::scope::Owned;

/// Timestamps are stored as unix milliseconds.
fn to_millis_precision(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(dt)
}

fn now() -> DateTime<Utc> {
    to_millis_precision(Utc::now())
}

// ============ Users ============

/// Create a user. `password_hash` is None for federated accounts.
pub fn create_user(conn: &Connection, email: &str, password_hash: Option<&str>) -> Result<User> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO users (id, email, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, email, password_hash, DEFAULT_ROLE, now.timestamp_millis()],
    )?;

    Ok(User {
        id,
        email: email.to_string(),
        password_hash: password_hash.map(String::from),
        role: DEFAULT_ROLE.to_string(),
        created_at: now,
    })
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        params![email],
    )
}

// ============ Sessions ============

/// Create a session for a user. Returns the session and the raw token,
/// which is shown to the client once and stored only as a hash.
pub fn create_session(conn: &Connection, user_id: &str, ttl_hours: i64) -> Result<(Session, String)> {
    let id = gen_id();
    let token = generate_session_token();
    let now = now();
    let expires_at = TimeDelta::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::Internal(format!("Session lifetime out of range: {}h", ttl_hours)))?;

    conn.execute(
        "INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            &id,
            user_id,
            hash_secret(&token),
            now.timestamp_millis(),
            expires_at.timestamp_millis()
        ],
    )?;

    Ok((
        Session {
            id,
            user_id: user_id.to_string(),
            expires_at,
        },
        token,
    ))
}

/// Resolve a raw session token to its user. Expired sessions resolve to None.
pub fn get_user_by_session_token(conn: &Connection, token: &str) -> Result<Option<User>> {
    query_one(
        conn,
        "SELECT u.id, u.email, u.password_hash, u.role, u.created_at
         FROM sessions s JOIN users u ON u.id = s.user_id
         WHERE s.token_hash = ?1 AND s.expires_at > ?2",
        params![hash_secret(token), Utc::now().timestamp_millis()],
    )
}

pub fn delete_session_by_token(conn: &Connection, token: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![hash_secret(token)],
    )?;
    Ok(deleted > 0)
}

pub fn purge_expired_sessions(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![Utc::now().timestamp_millis()],
    )?;
    Ok(deleted)
}

// ============ Products ============

pub fn create_product(
    conn: &Connection,
    owner: Owned,
    name: &str,
    description: Option<&str>,
) -> Result<Product> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO products (id, name, description, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, name, description, owner.owner(), now.timestamp_millis()],
    )?;

    Ok(Product {
        id,
        name: name.to_string(),
        description: description.map(String::from),
        created_by: owner.owner().to_string(),
        created_at: now,
    })
}

/// Whether any user has a product with this name. Used by verification,
/// which is not owner-scoped.
pub fn product_name_exists(conn: &Connection, name: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM products WHERE name = ?1)",
        params![name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// ============ Consumers ============

pub fn create_consumer(conn: &Connection, owner: Owned, input: &NewConsumer) -> Result<Consumer> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO consumers (id, name, email, phone, country, account_number, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &id,
            &input.name,
            &input.email,
            &input.phone,
            &input.country,
            &input.account_number,
            owner.owner(),
            now.timestamp_millis()
        ],
    )?;

    Ok(Consumer {
        id,
        name: input.name.clone(),
        email: input.email.clone(),
        phone: input.phone.clone(),
        country: input.country.clone(),
        account_number: input.account_number.clone(),
        created_by: owner.owner().to_string(),
        created_at: now,
    })
}

/// Owner-scoped consumer lookup. When both criteria are given, both must match.
pub fn find_consumer(
    conn: &Connection,
    owner: Owned,
    email: Option<&str>,
    account_number: Option<&str>,
) -> Result<Option<Consumer>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM consumers
             WHERE created_by = ?1
               AND (?2 IS NULL OR email = ?2)
               AND (?3 IS NULL OR account_number = ?3)
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1",
            CONSUMER_COLS
        ),
        params![owner.owner(), email, account_number],
    )
}

/// Whether any user has a consumer with this account number. Used by verification.
pub fn account_number_exists(conn: &Connection, account_number: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM consumers WHERE account_number = ?1)",
        params![account_number],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// ============ Licenses ============

pub fn create_license(
    conn: &Connection,
    owner: Owned,
    product_id: &str,
    consumer_id: &str,
    license_type: LicenseType,
    expires: Option<DateTime<Utc>>,
) -> Result<License> {
    let id = gen_id();
    let license_key = generate_license_key();
    let now = now();
    let expires = expires.map(to_millis_precision);

    conn.execute(
        "INSERT INTO licenses (id, license_key, product_id, consumer_id, license_type, expires, active, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)",
        params![
            &id,
            &license_key,
            product_id,
            consumer_id,
            license_type.as_ref(),
            expires.map(|e| e.timestamp_millis()),
            owner.owner(),
            now.timestamp_millis()
        ],
    )?;

    Ok(License {
        id,
        license_key,
        product_id: product_id.to_string(),
        consumer_id: consumer_id.to_string(),
        license_type,
        expires,
        active: true,
        created_by: owner.owner().to_string(),
        created_at: now,
    })
}

pub fn license_combination_exists(
    conn: &Connection,
    owner: Owned,
    license_type: LicenseType,
    product_id: &str,
    consumer_id: &str,
) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM licenses
            WHERE license_type = ?1 AND product_id = ?2 AND consumer_id = ?3 AND created_by = ?4
         )",
        params![license_type.as_ref(), product_id, consumer_id, owner.owner()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// License row joined with its product and consumer summaries.
struct LicenseDetailsRow(LicenseWithDetails);

impl FromRow for LicenseDetailsRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let license = License::from_row(row)?;
        Ok(LicenseDetailsRow(LicenseWithDetails {
            product: ProductSummary {
                id: license.product_id.clone(),
                name: row.get(9)?,
                description: None,
            },
            consumer: ConsumerSummary {
                id: license.consumer_id.clone(),
                name: row.get(10)?,
                email: row.get(11)?,
                account_number: row.get(12)?,
            },
            license,
        }))
    }
}

/// All licenses owned by a user with product and consumer details, newest first.
pub fn list_licenses_with_details(conn: &Connection, owner: Owned) -> Result<Vec<LicenseWithDetails>> {
    let rows: Vec<LicenseDetailsRow> = query_all(
        conn,
        "SELECT l.id, l.license_key, l.product_id, l.consumer_id, l.license_type, l.expires,
                l.active, l.created_by, l.created_at,
                p.name, c.name, c.email, c.account_number
         FROM licenses l
         JOIN products p ON p.id = l.product_id
         JOIN consumers c ON c.id = l.consumer_id
         WHERE l.created_by = ?1
         ORDER BY l.created_at DESC, l.rowid DESC",
        params![owner.owner()],
    )?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

struct ConsumerLicenseRow(ConsumerLicense);

impl FromRow for ConsumerLicenseRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(ConsumerLicenseRow(ConsumerLicense {
            id: row.get(0)?,
            license_key: row.get(1)?,
            license_type: license_type_at(row, 2)?,
            expires: opt_timestamp_at(row, 3)?,
            active: row.get(4)?,
            created_at: timestamp_at(row, 5)?,
            product: ProductSummary {
                id: row.get(6)?,
                name: row.get(7)?,
                description: row.get(8)?,
            },
        }))
    }
}

/// Licenses a user issued to one of their consumers, newest first.
pub fn list_licenses_for_consumer(
    conn: &Connection,
    owner: Owned,
    consumer_id: &str,
) -> Result<Vec<ConsumerLicense>> {
    let rows: Vec<ConsumerLicenseRow> = query_all(
        conn,
        "SELECT l.id, l.license_key, l.license_type, l.expires, l.active, l.created_at,
                p.id, p.name, p.description
         FROM licenses l
         JOIN products p ON p.id = l.product_id
         WHERE l.consumer_id = ?1 AND l.created_by = ?2
         ORDER BY l.created_at DESC, l.rowid DESC",
        params![consumer_id, owner.owner()],
    )?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Find the license a verification request refers to: the exact key, whose
/// own consumer has `account_number` and whose own product is named `product_name`.
///
/// Not owner-scoped; the caller is an external integrator, not a session.
pub fn find_license_for_verification(
    conn: &Connection,
    license_key: &str,
    account_number: &str,
    product_name: &str,
) -> Result<Option<License>> {
    let cols = LICENSE_COLS
        .split(", ")
        .map(|c| format!("l.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    query_one(
        conn,
        &format!(
            "SELECT {} FROM licenses l
             JOIN consumers c ON c.id = l.consumer_id
             JOIN products p ON p.id = l.product_id
             WHERE l.license_key = ?1 AND c.account_number = ?2 AND p.name = ?3",
            cols
        ),
        params![license_key, account_number, product_name],
    )
}

pub fn list_products(conn: &Connection, owner: Owned) -> Result<Vec<Product>> {
    owner.list::<Product>(conn)
}

pub fn list_consumers(conn: &Connection, owner: Owned) -> Result<Vec<Consumer>> {
    owner.list::<Consumer>(conn)
}
