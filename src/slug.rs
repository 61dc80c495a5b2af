//! Account slug generation.
//!
//! Account ids are not opaque: they are a URL-friendly rendering of the
//! account name, made unique by probing the table and suffixing `-1`, `-2`,
//! and so on until a free Account partition is found.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::keys::account_partition_key;
use crate::storage::{RangeQuery, Result, Store};

/// Maximum slug length, suffix included.
pub const MAX_SLUG_LENGTH: usize = 50;

/// Slugs longer than the maximum are clipped to this many characters.
const CLIPPED_LENGTH: usize = 49;

/// Base used when nothing of the name survives transliteration.
pub const FALLBACK_SLUG: &str = "account";

static ENTITIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&\w+;").expect("entity pattern is valid"));

static REPEATED_DASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("dash pattern is valid"));

/// Transliterate a display name into a URL-friendly slug.
///
/// Lowercases, strips diacritics and HTML-entity-like sequences, keeps only
/// `[a-z0-9-]` (spaces become dashes, tabs and newlines are dropped),
/// collapses dash runs, trims leading dashes, clips to 49 characters when
/// longer than 50 and trims trailing dashes. A result that parses as a UUID
/// gets a random digit appended so it cannot be mistaken for a generated id.
///
/// May return an empty string when no character of the name survives.
pub fn url_friendly(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped: String = lowered
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .nfc()
        .collect();
    let without_entities = ENTITIES.replace_all(&stripped, "");

    let kept: String = without_entities
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => Some(c),
            '\t' | '\n' | '\r' => None,
            c if c.is_whitespace() => Some('-'),
            _ => None,
        })
        .collect();

    let collapsed = REPEATED_DASHES.replace_all(&kept, "-");
    let mut slug = collapsed.trim_start_matches('-').to_string();
    if slug.len() > MAX_SLUG_LENGTH {
        // ASCII only at this point, byte offsets are char offsets
        slug.truncate(CLIPPED_LENGTH);
    }
    let mut slug = slug.trim_end_matches('-').to_string();

    if uuid::Uuid::try_parse(&slug).is_ok() {
        let digit = rand::rng().random_range(0..9);
        slug.push_str(&digit.to_string());
    }

    slug
}

/// Append a numeric suffix, trimming the base so the result stays within
/// [`MAX_SLUG_LENGTH`].
pub fn with_suffix(base: &str, suffix: u32) -> String {
    if suffix == 0 {
        return base.to_string();
    }
    let tail = format!("-{}", suffix);
    let room = MAX_SLUG_LENGTH.saturating_sub(tail.len());
    let trimmed = base[..base.len().min(room)].trim_end_matches('-');
    format!("{}{}", trimmed, tail)
}

/// Whether an Account record already owns this slug.
async fn slug_taken(store: &dyn Store, slug: &str) -> Result<bool> {
    let query = RangeQuery::partition(account_partition_key(slug)).limit(1);
    let page = store.query(&query).await?;
    Ok(!page.items.is_empty())
}

/// Derive a slug from `name` that no Account currently uses.
///
/// Probes the store once per candidate, so a concurrent creator can still
/// claim the returned slug before it is written. Callers close that window
/// with a conditional create.
pub async fn generate_unique_account_id(store: &dyn Store, name: &str) -> Result<String> {
    let mut base = url_friendly(name);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    let mut suffix = 0;
    loop {
        let candidate = with_suffix(&base, suffix);
        if !slug_taken(store, &candidate).await? {
            debug!(slug = %candidate, probes = suffix + 1, "Found free account slug");
            return Ok(candidate);
        }
        suffix += 1;
    }
}
