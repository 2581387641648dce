//! Shared record vocabulary: ids, priorities, comments, and the traits
//! every entity kind implements so one store can serve all five.

use std::fmt::Debug;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{DeskError, Result};

/// Integer id, unique within one collection (or within one parent for comments).
pub type RecordId = u64;

/// `max(ids) + 1`, or `1` for an empty collection. Ids are never reused
/// while the maximum survives, since records are never deleted.
pub fn next_id<I: IntoIterator<Item = RecordId>>(ids: I) -> Result<RecordId> {
    match ids.into_iter().max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| DeskError::Storage("id space exhausted".into())),
    }
}

/// Display and sort classification; never drives any workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::Low, Self::Medium, Self::High];

    /// Sort rank: High sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == value)
            .ok_or(DeskError::missing("priority"))
    }
}

/// A reply in a record's thread. Owned by its parent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,
    #[serde(rename = "user")]
    pub author: String,
    pub text: String,
    pub date: Posted,
    /// Older collections flag staff replies as `isAdmin` or `isStaff`.
    #[serde(
        default,
        rename = "isOfficial",
        alias = "isAdmin",
        alias = "isStaff",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_official: bool,
}

/// When a comment was posted, at the precision it was stored with.
/// Notice threads carry full timestamps; the other kinds carry days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posted {
    Day(NaiveDate),
    At(NaiveDateTime),
}

impl Posted {
    pub fn day(self) -> NaiveDate {
        match self {
            Self::Day(day) => day,
            Self::At(at) => at.date(),
        }
    }
}

impl From<NaiveDate> for Posted {
    fn from(day: NaiveDate) -> Self {
        Self::Day(day)
    }
}

impl From<NaiveDateTime> for Posted {
    fn from(at: NaiveDateTime) -> Self {
        Self::At(at)
    }
}

impl Serialize for Posted {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Day(day) => serializer.collect_str(&day.format("%Y-%m-%d")),
            Self::At(at) => serializer.collect_str(&at.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl<'de> Deserialize<'de> for Posted {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        use serde::de::Error;

        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        let posted = if trimmed.len() == 10 {
            dates::parse_day(trimmed).map(Self::Day)
        } else {
            dates::parse_instant(trimmed)
                .map(Self::At)
                .or_else(|| dates::parse_day(trimmed).map(Self::Day))
        };
        posted.ok_or_else(|| D::Error::custom(format!("not a date: {raw:?}")))
    }
}

/// Who is acting, and when. Built by the store from its session and clock.
#[derive(Debug, Clone)]
pub struct Stamp {
    pub now: NaiveDateTime,
    pub author: String,
    pub official: bool,
}

impl Stamp {
    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

/// One entity kind held in a record store.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned {
    /// Durable storage key for the whole collection.
    const STORAGE_KEY: &'static str;
    /// Human-readable kind name for logs.
    const KIND: &'static str;

    /// The user-submitted form this kind is created from.
    type Draft;

    fn id(&self) -> RecordId;

    /// Collection used when nothing readable is stored yet.
    fn seed() -> Vec<Self>;

    /// Validate a submission and build the record it describes.
    fn from_draft(draft: Self::Draft, id: RecordId, stamp: &Stamp) -> Result<Self>;
}

pub trait Votable: Record {
    fn add_vote(&mut self);
}

pub trait Threaded: Record {
    /// The date a new comment posted at `now` carries.
    fn posted(now: NaiveDateTime) -> Posted {
        Posted::Day(now.date())
    }

    fn comments(&self) -> &[Comment];
    fn comments_mut(&mut self) -> &mut Vec<Comment>;
}

pub trait Pinnable: Record {
    fn is_pinned(&self) -> bool;
    fn set_pinned(&mut self, pinned: bool);
}

/// A status enum whose values sit on ordered stages.
pub trait StatusFlow: Copy + PartialEq + Debug + 'static {
    /// Every state, initial first.
    const ALL: &'static [Self];

    /// 0 for the initial state, higher for later states.
    fn stage(self) -> u8;
    fn name(self) -> &'static str;

    /// Whether no later state exists.
    fn is_final(self) -> bool {
        Self::ALL.iter().all(|s| s.stage() <= self.stage())
    }
}

/// Records whose status only ever moves forward.
pub trait Lifecycle: Record {
    type Status: StatusFlow;

    fn status(&self) -> Self::Status;

    /// Apply `next` along with any dates it implies.
    fn enter_status(&mut self, next: Self::Status, today: NaiveDate);
}

/// `["All", ...every state]` for status filter menus.
pub fn status_options<S: StatusFlow>() -> Vec<String> {
    std::iter::once("All")
        .chain(S::ALL.iter().map(|s| s.name()))
        .map(str::to_string)
        .collect()
}

// ─── Stored dates ─────────────────────────────────────────────────────────

/// Serde adapters for stored dates. Older collections hold full ISO
/// timestamps where a day is expected, UTC-suffixed timestamps, and empty
/// strings for unset values.
pub mod dates {
    use chrono::{NaiveDate, NaiveDateTime};

    pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// The calendar day at the front of `raw`, if any.
    pub fn parse_day(raw: &str) -> Option<NaiveDate> {
        let head = raw.trim().get(..10)?;
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    /// A timestamp with optional fraction and `Z`, or a bare day (midnight).
    pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim().trim_end_matches('Z');
        raw.parse::<NaiveDateTime>()
            .ok()
            .or_else(|| parse_day(raw).filter(|_| raw.len() == 10)?.and_hms_opt(0, 0, 0))
    }

    pub mod instant {
        use chrono::NaiveDateTime;
        use serde::de::Error;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(at: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(&at.format(super::INSTANT_FORMAT))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
            let raw = String::deserialize(deserializer)?;
            super::parse_instant(&raw).ok_or_else(|| D::Error::custom(format!("not a timestamp: {raw:?}")))
        }
    }

    pub mod optional_instant {
        use chrono::NaiveDateTime;
        use serde::de::Error;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(at: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match at {
                Some(at) => serializer.collect_str(&at.format(super::INSTANT_FORMAT)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse_instant(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("not a timestamp: {raw:?}"))),
            }
        }
    }

    pub mod day {
        use chrono::NaiveDate;
        use serde::de::Error;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(&date.format("%Y-%m-%d"))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
            let raw = String::deserialize(deserializer)?;
            super::parse_day(&raw).ok_or_else(|| D::Error::custom(format!("not a date: {raw:?}")))
        }
    }

    pub mod optional_day {
        use chrono::NaiveDate;
        use serde::de::Error;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse_day(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("not a date: {raw:?}"))),
            }
        }
    }
}

// ─── Form helpers ─────────────────────────────────────────────────────────

/// Trimmed value of a required text field.
pub fn required(value: &str, field: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DeskError::missing(field));
    }
    Ok(trimmed.to_string())
}

/// `value` if it is one of `options`.
pub fn one_of(value: &str, options: &[&str], field: &'static str) -> Result<String> {
    if options.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(DeskError::missing(field))
    }
}
