//! Row mapping helpers shared by the PostgreSQL repositories.

use std::str::FromStr;

use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use recall_core::{Error, Reminder, Result, Tag};

/// Parse a TEXT enum column (status, role) into its Rust enum.
pub(crate) fn parse_enum<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(column);
    raw.parse::<T>().map_err(Error::Internal)
}

pub(crate) fn tag_from_row(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}

pub(crate) fn reminder_from_row(row: &PgRow) -> Result<Reminder> {
    Ok(Reminder {
        id: row.get("id"),
        bookmark_id: row.get("bookmark_id"),
        scheduled_at: row.get("scheduled_at"),
        message: row.get("message"),
        status: parse_enum(row, "status")?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Map the `r_`-prefixed columns of a `LEFT JOIN reminder r` into a reminder.
pub(crate) fn joined_reminder(row: &PgRow, bookmark_id: Uuid) -> Result<Option<Reminder>> {
    let id: Option<Uuid> = row.get("r_id");
    let Some(id) = id else {
        return Ok(None);
    };
    let raw_status: String = row.get("r_status");
    Ok(Some(Reminder {
        id,
        bookmark_id,
        scheduled_at: row.get("r_scheduled_at"),
        message: row.get("r_message"),
        status: raw_status.parse().map_err(Error::Internal)?,
        created_at: row.get("r_created_at"),
        updated_at: row.get("r_updated_at"),
    }))
}
