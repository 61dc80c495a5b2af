//! Key codec.
//!
//! Maps each entity shape onto the single table's `(PartitionKey, SortKey)`
//! pair and back. Entity discrimination is by key prefix only:
//!
//! | Entity   | Partition key                  | Sort key                        |
//! |----------|--------------------------------|---------------------------------|
//! | Account  | `ACCOUNT#<slug>`               | `#`                             |
//! | Member   | `MEMBER#<slug>`                | `#ROLE#<role>#USER#<subject>`   |
//! | Event    | `EVENT#ACCOUNT#<slug>`         | `<date>`                        |
//! | Tag      | `TAG#ACCOUNT#<slug>`           | `<value>`                       |
//! | EventTag | `EVENT_TAG#ACCOUNT#<slug>`     | `#TAG#<value>#DATE#<date>`      |
//!
//! Dates are UTC ISO-8601 with millisecond precision and a `Z` suffix, a
//! fixed-width form whose byte order is chronological order.

mod entities;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};

pub use entities::{Account, Entity, Event, EventTag, Member, Record, Role, Tag};

/// Key field delimiter.
pub const DELIMITER: char = '#';

/// Partition key prefixes.
pub mod prefix {
    pub const ACCOUNT: &str = "ACCOUNT#";
    pub const MEMBER: &str = "MEMBER#";
    pub const EVENT: &str = "EVENT#ACCOUNT#";
    pub const TAG: &str = "TAG#ACCOUNT#";
    pub const EVENT_TAG: &str = "EVENT_TAG#ACCOUNT#";
}

/// Non-key attribute names.
pub mod attr {
    pub const NAME: &str = "Name";
    pub const CREATE_DATE: &str = "CreateDate";
    pub const SUBJECT: &str = "Subject";
    pub const EMAIL: &str = "Email";
    pub const TITLE: &str = "Title";
    pub const DESCRIPTION: &str = "Description";
    pub const TAGS: &str = "Tags";
}

/// Sort key shared by every Account record.
pub const ACCOUNT_SORT_KEY: &str = "#";

/// Errors decoding a stored item into an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("missing or non-string attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Format a date the way keys carry it.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a date produced by [`format_date`] (any RFC 3339 date is accepted).
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Drop sub-millisecond precision so a date survives a key round trip.
pub fn key_precision(date: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = date.nanosecond();
    date.with_nanosecond(nanos - nanos % 1_000_000)
        .unwrap_or(date)
}

pub fn account_partition_key(slug: &str) -> String {
    format!("{}{}", prefix::ACCOUNT, slug)
}

pub fn member_partition_key(account_id: &str) -> String {
    format!("{}{}", prefix::MEMBER, account_id)
}

pub fn member_sort_key(role: Role, subject: &str) -> String {
    format!("#ROLE#{}#USER#{}", role, subject)
}

pub fn event_partition_key(account_id: &str) -> String {
    format!("{}{}", prefix::EVENT, account_id)
}

pub fn event_sort_key(date: DateTime<Utc>) -> String {
    format_date(date)
}

pub fn tag_partition_key(account_id: &str) -> String {
    format!("{}{}", prefix::TAG, account_id)
}

pub fn event_tag_partition_key(account_id: &str) -> String {
    format!("{}{}", prefix::EVENT_TAG, account_id)
}

pub fn event_tag_sort_key(value: &str, date: DateTime<Utc>) -> String {
    format!("#TAG#{}#DATE#{}", value, format_date(date))
}

/// Field at a fixed position of a `#`-delimited key.
fn field(key: &str, position: usize) -> Option<&str> {
    key.split(DELIMITER).nth(position).filter(|f| !f.is_empty())
}

/// Account slug of an Account partition key (`ACCOUNT#<slug>`).
pub fn account_slug_of(partition_key: &str) -> Option<&str> {
    partition_key
        .starts_with(prefix::ACCOUNT)
        .then(|| field(partition_key, 1))
        .flatten()
}

/// Account slug of a Member partition key (`MEMBER#<slug>`).
pub fn member_account_of(partition_key: &str) -> Option<&str> {
    partition_key
        .starts_with(prefix::MEMBER)
        .then(|| field(partition_key, 1))
        .flatten()
}

/// Account slug of an Event partition key (`EVENT#ACCOUNT#<slug>`).
pub fn event_account_of(partition_key: &str) -> Option<&str> {
    partition_key
        .starts_with(prefix::EVENT)
        .then(|| field(partition_key, 2))
        .flatten()
}

/// Account slug of a Tag partition key (`TAG#ACCOUNT#<slug>`).
pub fn tag_account_of(partition_key: &str) -> Option<&str> {
    partition_key
        .starts_with(prefix::TAG)
        .then(|| field(partition_key, 2))
        .flatten()
}

/// Account slug of an EventTag partition key (`EVENT_TAG#ACCOUNT#<slug>`).
pub fn event_tag_account_of(partition_key: &str) -> Option<&str> {
    partition_key
        .starts_with(prefix::EVENT_TAG)
        .then(|| field(partition_key, 2))
        .flatten()
}

/// Role and subject of a Member sort key (`#ROLE#<role>#USER#<subject>`).
pub fn member_role_of(sort_key: &str) -> Option<(&str, &str)> {
    sort_key
        .strip_prefix("#ROLE#")
        .and_then(|rest| rest.split_once("#USER#"))
}

/// Tag value and event date of an EventTag sort key (`#TAG#<value>#DATE#<date>`).
///
/// The date is taken after the last `#DATE#` so tag values may themselves
/// contain the delimiter.
pub fn event_tag_parts_of(sort_key: &str) -> Option<(&str, DateTime<Utc>)> {
    let (value, date) = sort_key.strip_prefix("#TAG#")?.rsplit_once("#DATE#")?;
    Some((value, parse_date(date)?))
}
