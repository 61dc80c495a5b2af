//! Typed entities and their item encodings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    account_partition_key, account_slug_of, attr, event_account_of, event_partition_key,
    event_sort_key, event_tag_account_of, event_tag_parts_of, event_tag_partition_key,
    event_tag_sort_key, format_date, member_account_of, member_partition_key, member_role_of,
    member_sort_key, parse_date, prefix, tag_account_of, tag_partition_key, KeyError,
    ACCOUNT_SORT_KEY,
};
use crate::storage::{AttributeValue, Item, Key, PARTITION_KEY, SORT_KEY};

/// An entity with a fixed key layout in the table.
pub trait Record: Sized {
    /// Primary key of this record.
    fn key(&self) -> Key;

    /// Full item, key attributes included.
    fn to_item(&self) -> Item;

    /// Decode an item of this entity's shape.
    fn from_item(item: &Item) -> Result<Self, KeyError>;
}

fn string_attr<'a>(item: &'a Item, name: &'static str) -> Result<&'a str, KeyError> {
    item.get(name)
        .and_then(AttributeValue::as_s)
        .ok_or(KeyError::MissingAttribute(name))
}

fn date_attr(item: &Item, name: &'static str) -> Result<DateTime<Utc>, KeyError> {
    let raw = string_attr(item, name)?;
    parse_date(raw).ok_or_else(|| KeyError::InvalidDate(raw.to_string()))
}

fn base_item(key: Key) -> Item {
    key.to_item()
}

fn malformed(key: &str) -> KeyError {
    KeyError::MalformedKey(key.to_string())
}

/// Member role, embedded in the Member sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "Owner"),
        }
    }
}

impl FromStr for Role {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Owner" => Ok(Role::Owner),
            other => Err(KeyError::UnknownRole(other.to_string())),
        }
    }
}

/// Account, keyed by its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub create_date: DateTime<Utc>,
}

impl Account {
    /// Key of the Account record owning `slug`.
    pub fn key_of(slug: &str) -> Key {
        Key::new(account_partition_key(slug), ACCOUNT_SORT_KEY)
    }
}

impl Record for Account {
    fn key(&self) -> Key {
        Self::key_of(&self.id)
    }

    fn to_item(&self) -> Item {
        let mut item = base_item(self.key());
        item.insert(attr::NAME.into(), self.name.clone().into());
        item.insert(attr::CREATE_DATE.into(), format_date(self.create_date).into());
        item
    }

    fn from_item(item: &Item) -> Result<Self, KeyError> {
        let pk = string_attr(item, PARTITION_KEY)?;
        Ok(Self {
            id: account_slug_of(pk).ok_or_else(|| malformed(pk))?.to_string(),
            name: string_attr(item, attr::NAME)?.to_string(),
            create_date: date_attr(item, attr::CREATE_DATE)?,
        })
    }
}

/// Membership of a user in an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub account_id: String,
    pub role: Role,
    pub subject: String,
    pub email: String,
    pub create_date: DateTime<Utc>,
}

impl Record for Member {
    fn key(&self) -> Key {
        Key::new(
            member_partition_key(&self.account_id),
            member_sort_key(self.role, &self.subject),
        )
    }

    fn to_item(&self) -> Item {
        let mut item = base_item(self.key());
        item.insert(attr::SUBJECT.into(), self.subject.clone().into());
        item.insert(attr::EMAIL.into(), self.email.clone().into());
        item.insert(attr::CREATE_DATE.into(), format_date(self.create_date).into());
        item
    }

    fn from_item(item: &Item) -> Result<Self, KeyError> {
        let pk = string_attr(item, PARTITION_KEY)?;
        let sk = string_attr(item, SORT_KEY)?;
        let (role, _) = member_role_of(sk).ok_or_else(|| malformed(sk))?;
        Ok(Self {
            account_id: member_account_of(pk).ok_or_else(|| malformed(pk))?.to_string(),
            role: role.parse()?,
            subject: string_attr(item, attr::SUBJECT)?.to_string(),
            email: string_attr(item, attr::EMAIL)?.to_string(),
            create_date: date_attr(item, attr::CREATE_DATE)?,
        })
    }
}

/// A time-stamped event. The date is the sort key and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub account_id: String,
    pub date: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl Event {
    /// Build the base state of an event addressed only by its key.
    pub fn from_key(key: &Key) -> Result<Self, KeyError> {
        let account_id = event_account_of(&key.partition_key)
            .ok_or_else(|| malformed(&key.partition_key))?;
        let date = parse_date(&key.sort_key)
            .ok_or_else(|| KeyError::InvalidDate(key.sort_key.clone()))?;
        Ok(Self {
            account_id: account_id.to_string(),
            date,
            title: String::new(),
            description: None,
            tags: Vec::new(),
        })
    }
}

impl Record for Event {
    fn key(&self) -> Key {
        Key::new(event_partition_key(&self.account_id), event_sort_key(self.date))
    }

    fn to_item(&self) -> Item {
        let mut item = base_item(self.key());
        item.insert(attr::TITLE.into(), self.title.clone().into());
        if let Some(description) = &self.description {
            item.insert(attr::DESCRIPTION.into(), description.clone().into());
        }
        // String sets cannot be empty
        if !self.tags.is_empty() {
            item.insert(attr::TAGS.into(), AttributeValue::Ss(self.tags.clone()));
        }
        item
    }

    fn from_item(item: &Item) -> Result<Self, KeyError> {
        let key = Key::of(item).ok_or(KeyError::MissingAttribute(PARTITION_KEY))?;
        let mut event = Self::from_key(&key)?;
        event.title = string_attr(item, attr::TITLE)?.to_string();
        event.description = item
            .get(attr::DESCRIPTION)
            .and_then(AttributeValue::as_s)
            .map(str::to_string);
        event.tags = item
            .get(attr::TAGS)
            .and_then(AttributeValue::as_ss)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        Ok(event)
    }
}

/// Account-level tag vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub account_id: String,
    pub value: String,
}

impl Record for Tag {
    fn key(&self) -> Key {
        Key::new(tag_partition_key(&self.account_id), self.value.clone())
    }

    fn to_item(&self) -> Item {
        base_item(self.key())
    }

    fn from_item(item: &Item) -> Result<Self, KeyError> {
        let pk = string_attr(item, PARTITION_KEY)?;
        Ok(Self {
            account_id: tag_account_of(pk).ok_or_else(|| malformed(pk))?.to_string(),
            value: string_attr(item, SORT_KEY)?.to_string(),
        })
    }
}

/// Join record from a tag value to one event date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTag {
    pub account_id: String,
    pub value: String,
    pub date: DateTime<Utc>,
}

impl EventTag {
    /// Key of the event this join record points at.
    pub fn event_key(&self) -> Key {
        Key::new(event_partition_key(&self.account_id), event_sort_key(self.date))
    }
}

impl Record for EventTag {
    fn key(&self) -> Key {
        Key::new(
            event_tag_partition_key(&self.account_id),
            event_tag_sort_key(&self.value, self.date),
        )
    }

    fn to_item(&self) -> Item {
        base_item(self.key())
    }

    fn from_item(item: &Item) -> Result<Self, KeyError> {
        let pk = string_attr(item, PARTITION_KEY)?;
        let sk = string_attr(item, SORT_KEY)?;
        let (value, date) = event_tag_parts_of(sk).ok_or_else(|| malformed(sk))?;
        Ok(Self {
            account_id: event_tag_account_of(pk)
                .ok_or_else(|| malformed(pk))?
                .to_string(),
            value: value.to_string(),
            date,
        })
    }
}

/// Any record of the table, discriminated by partition key prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Account(Account),
    Member(Member),
    Event(Event),
    Tag(Tag),
    EventTag(EventTag),
}

impl Entity {
    pub fn from_item(item: &Item) -> Result<Self, KeyError> {
        let pk = string_attr(item, PARTITION_KEY)?;
        if pk.starts_with(prefix::ACCOUNT) {
            Account::from_item(item).map(Entity::Account)
        } else if pk.starts_with(prefix::MEMBER) {
            Member::from_item(item).map(Entity::Member)
        } else if pk.starts_with(prefix::EVENT) {
            Event::from_item(item).map(Entity::Event)
        } else if pk.starts_with(prefix::TAG) {
            Tag::from_item(item).map(Entity::Tag)
        } else if pk.starts_with(prefix::EVENT_TAG) {
            EventTag::from_item(item).map(Entity::EventTag)
        } else {
            Err(malformed(pk))
        }
    }

    pub fn key(&self) -> Key {
        match self {
            Entity::Account(e) => e.key(),
            Entity::Member(e) => e.key(),
            Entity::Event(e) => e.key(),
            Entity::Tag(e) => e.key(),
            Entity::EventTag(e) => e.key(),
        }
    }

    pub fn to_item(&self) -> Item {
        match self {
            Entity::Account(e) => e.to_item(),
            Entity::Member(e) => e.to_item(),
            Entity::Event(e) => e.to_item(),
            Entity::Tag(e) => e.to_item(),
            Entity::EventTag(e) => e.to_item(),
        }
    }
}
