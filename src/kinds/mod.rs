//! The five entity kinds held by the desk, with their seed collections.

pub mod complaint;
pub mod maintenance;
pub mod notice;
pub mod room;
pub mod visitor;

use chrono::{NaiveDate, NaiveDateTime};

use crate::record::{Comment, Posted, RecordId};

pub use complaint::{Complaint, ComplaintDraft, ComplaintStatus};
pub use maintenance::{MaintenanceDraft, MaintenanceRequest, MaintenanceStatus};
pub use notice::{Notice, NoticeDraft};
pub use room::{Occupant, OccupantDraft, Room, RoomDraft, RoomStatus};
pub use visitor::{Visitor, VisitorDraft, VisitorStatus};

/// Calendar date for seed data. Seeds only use valid dates.
pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

pub(crate) fn ymd_hm(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    ymd(year, month, day)
        .and_hms_opt(hour, minute, 0)
        .unwrap_or_default()
}

pub(crate) fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

pub(crate) fn seed_comment(id: RecordId, author: &str, text: &str, date: impl Into<Posted>, official: bool) -> Comment {
    Comment {
        id,
        author: author.to_string(),
        text: text.to_string(),
        date: date.into(),
        is_official: official,
    }
}
