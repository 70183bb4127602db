//! Owner scoping for user-created resources.
//!
//! Products, consumers and licenses belong to exactly one user. Every id-based
//! read, update and delete goes through [`Owned`], which always adds
//! `created_by = <owner>` to the predicate. A record owned by someone else is
//! therefore indistinguishable from one that does not exist.

use rusqlite::{Connection, ToSql, params};

use super::from_row::{
    CONSUMER_COLS, FromRow, LICENSE_COLS, PRODUCT_COLS, query_all, query_one,
};
use crate::error::Result;
use crate::models::{Consumer, License, Product};

/// A table whose rows carry a `created_by` owner column.
pub trait OwnedTable: FromRow {
    const TABLE: &'static str;
    const COLS: &'static str;
}

impl OwnedTable for Product {
    const TABLE: &'static str = "products";
    const COLS: &'static str = PRODUCT_COLS;
}

impl OwnedTable for Consumer {
    const TABLE: &'static str = "consumers";
    const COLS: &'static str = CONSUMER_COLS;
}

impl OwnedTable for License {
    const TABLE: &'static str = "licenses";
    const COLS: &'static str = LICENSE_COLS;
}

#[derive(Debug, Clone, Copy)]
pub struct Owned<'a> {
    owner: &'a str,
}

impl<'a> Owned<'a> {
    pub fn by(owner: &'a str) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &'a str {
        self.owner
    }

    pub fn get<T: OwnedTable>(&self, conn: &Connection, id: &str) -> Result<Option<T>> {
        query_one(
            conn,
            &format!(
                "SELECT {} FROM {} WHERE id = ?1 AND created_by = ?2",
                T::COLS,
                T::TABLE
            ),
            params![id, self.owner],
        )
    }

    /// All rows owned by this user, newest first.
    pub fn list<T: OwnedTable>(&self, conn: &Connection) -> Result<Vec<T>> {
        query_all(
            conn,
            &format!(
                "SELECT {} FROM {} WHERE created_by = ?1 ORDER BY created_at DESC, rowid DESC",
                T::COLS,
                T::TABLE
            ),
            params![self.owner],
        )
    }

    /// Set one column on an owned row. Returns false when no owned row matched.
    pub fn set<T: OwnedTable>(
        &self,
        conn: &Connection,
        id: &str,
        column: &'static str,
        value: &dyn ToSql,
    ) -> Result<bool> {
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET {} = ?1 WHERE id = ?2 AND created_by = ?3",
                T::TABLE,
                column
            ),
            params![value, id, self.owner],
        )?;
        Ok(updated > 0)
    }

    pub fn delete<T: OwnedTable>(&self, conn: &Connection, id: &str) -> Result<bool> {
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1 AND created_by = ?2", T::TABLE),
            params![id, self.owner],
        )?;
        Ok(deleted > 0)
    }

    /// Count owned rows where `column = value`.
    pub fn count_where<T: OwnedTable>(
        &self,
        conn: &Connection,
        column: &'static str,
        value: &str,
    ) -> Result<i64> {
        let count = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?1 AND created_by = ?2",
                T::TABLE,
                column
            ),
            params![value, self.owner],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
