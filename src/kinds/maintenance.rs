//! Maintenance requests: like complaints, plus a location and work dates.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::kinds::{midnight, seed_comment, ymd};
use crate::query::{Facet, FacetValue, Queryable};
use crate::record::{
    dates, one_of, required, Comment, Lifecycle, Priority, Record, RecordId, Stamp, StatusFlow, Threaded, Votable,
};

pub const TYPES: &[&str] = &[
    "Electrical",
    "Plumbing",
    "HVAC",
    "Structural",
    "Cleaning",
    "Technology",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    Open,
    Scheduled,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl StatusFlow for MaintenanceStatus {
    const ALL: &'static [Self] = &[Self::Open, Self::InProgress, Self::Scheduled, Self::Resolved];

    fn stage(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Scheduled => 1,
            Self::InProgress => 2,
            Self::Resolved => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Scheduled => "Scheduled",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequest {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: MaintenanceStatus,
    #[serde(default)]
    pub priority: Priority,
    pub location: String,
    #[serde(with = "dates::day")]
    pub date: NaiveDate,
    #[serde(default, with = "dates::optional_day")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default, with = "dates::optional_day")]
    pub completed_date: Option<NaiveDate>,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct MaintenanceDraft {
    pub title: String,
    pub description: String,
    pub kind: String,
    pub priority: Priority,
    pub location: String,
}

impl Default for MaintenanceDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            kind: TYPES[0].to_string(),
            priority: Priority::Medium,
            location: String::new(),
        }
    }
}

impl Record for MaintenanceRequest {
    const STORAGE_KEY: &'static str = "maintenanceRequests";
    const KIND: &'static str = "maintenance";
    type Draft = MaintenanceDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn seed() -> Vec<Self> {
        seed()
    }

    fn from_draft(draft: MaintenanceDraft, id: RecordId, stamp: &Stamp) -> Result<Self> {
        Ok(Self {
            id,
            title: required(&draft.title, "title")?,
            description: required(&draft.description, "description")?,
            kind: one_of(draft.kind.trim(), TYPES, "type")?,
            status: MaintenanceStatus::Open,
            priority: draft.priority,
            location: required(&draft.location, "location")?,
            date: stamp.today(),
            scheduled_date: None,
            completed_date: None,
            votes: 0,
            comments: Vec::new(),
        })
    }
}

impl Votable for MaintenanceRequest {
    fn add_vote(&mut self) {
        self.votes = self.votes.saturating_add(1);
    }
}

impl Threaded for MaintenanceRequest {
    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }
}

impl Lifecycle for MaintenanceRequest {
    type Status = MaintenanceStatus;

    fn status(&self) -> MaintenanceStatus {
        self.status
    }

    fn enter_status(&mut self, next: MaintenanceStatus, today: NaiveDate) {
        match next {
            MaintenanceStatus::Scheduled => {
                self.scheduled_date.get_or_insert(today);
            }
            MaintenanceStatus::Resolved => self.completed_date = Some(today),
            MaintenanceStatus::Open | MaintenanceStatus::InProgress => {}
        }
        self.status = next;
    }
}

impl Queryable for MaintenanceRequest {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.description.as_str()),
            Cow::Borrowed(self.location.as_str()),
        ]
    }

    fn facet(&self, facet: Facet) -> FacetValue<'_> {
        match facet {
            Facet::Category => FacetValue::One(self.kind.as_str()),
            Facet::Status => FacetValue::One(self.status.name()),
            Facet::Priority => FacetValue::One(self.priority.name()),
            Facet::Location => FacetValue::One(self.location.as_str()),
            Facet::Audience => FacetValue::Absent,
        }
    }

    fn created_at(&self) -> Option<NaiveDateTime> {
        midnight(self.date)
    }

    fn priority(&self) -> Option<Priority> {
        Some(self.priority)
    }

    fn votes(&self) -> u32 {
        self.votes
    }
}

#[allow(clippy::too_many_arguments)]
fn request(
    id: RecordId,
    title: &str,
    description: &str,
    kind: &str,
    status: MaintenanceStatus,
    priority: Priority,
    location: &str,
    date: NaiveDate,
    scheduled_date: Option<NaiveDate>,
    votes: u32,
    comments: Vec<Comment>,
) -> MaintenanceRequest {
    let completed_date = (status == MaintenanceStatus::Resolved).then_some(scheduled_date).flatten();
    MaintenanceRequest {
        id,
        title: title.into(),
        description: description.into(),
        kind: kind.into(),
        status,
        priority,
        location: location.into(),
        date,
        scheduled_date,
        completed_date,
        votes,
        comments,
    }
}

fn seed() -> Vec<MaintenanceRequest> {
    use MaintenanceStatus::*;

    const STAFF: &str = "Maintenance Staff";
    vec![
        request(
            1,
            "Broken Heating in Room 302",
            "The heating system in Room 302 is not working properly. The room is very cold, especially at night.",
            "HVAC",
            InProgress,
            Priority::High,
            "Science Building",
            ymd(2025, 4, 22),
            Some(ymd(2025, 4, 28)),
            15,
            vec![
                seed_comment(1, "Taylor M.", "It's getting worse! Now even during the day it's freezing.", ymd(2025, 4, 23), false),
                seed_comment(2, STAFF, "We've ordered the replacement part. Should arrive by the 27th.", ymd(2025, 4, 24), true),
            ],
        ),
        request(
            2,
            "Leaking Faucet in Women's Bathroom",
            "The middle sink in the first floor women's bathroom is constantly leaking, causing water wastage and floor damage.",
            "Plumbing",
            Scheduled,
            Priority::Medium,
            "Library",
            ymd(2025, 4, 24),
            Some(ymd(2025, 5, 2)),
            8,
            vec![seed_comment(1, STAFF, "Scheduled for repair on May 2nd.", ymd(2025, 4, 26), true)],
        ),
        request(
            3,
            "Flickering Lights in Hallway",
            "The lights in the main hallway of the Business Building have been flickering for the past week. It's distracting during classes.",
            "Electrical",
            Open,
            Priority::Medium,
            "Business Building",
            ymd(2025, 4, 26),
            None,
            12,
            Vec::new(),
        ),
        request(
            4,
            "Broken Door Handle",
            "The handle on the main entrance door to the dormitory is loose and about to fall off. It's difficult to open and close the door.",
            "Structural",
            Resolved,
            Priority::High,
            "Dormitory Block A",
            ymd(2025, 4, 20),
            Some(ymd(2025, 4, 21)),
            23,
            vec![
                seed_comment(1, "Sam K.", "This is dangerous, someone could get locked in or out!", ymd(2025, 4, 20), false),
                seed_comment(2, STAFF, "Emergency repair completed. Door handle has been replaced.", ymd(2025, 4, 21), true),
            ],
        ),
        request(
            5,
            "Clogged Drain in Shower",
            "The shower drain in the second floor men's locker room is completely clogged. Water is backing up during use.",
            "Plumbing",
            InProgress,
            Priority::Medium,
            "Athletics Building",
            ymd(2025, 4, 25),
            Some(ymd(2025, 4, 29)),
            7,
            vec![seed_comment(
                1,
                STAFF,
                "Initial assessment done. Will need specialized equipment to clear the blockage completely.",
                ymd(2025, 4, 27),
                true,
            )],
        ),
        request(
            6,
            "Damaged Ceiling Tile",
            "There's a water-damaged ceiling tile in Room 105 that looks like it could fall at any moment.",
            "Structural",
            Scheduled,
            Priority::Low,
            "Humanities Building",
            ymd(2025, 4, 23),
            Some(ymd(2025, 5, 5)),
            5,
            vec![seed_comment(
                1,
                STAFF,
                "Scheduled for replacement during the upcoming maintenance window.",
                ymd(2025, 4, 25),
                true,
            )],
        ),
        request(
            7,
            "AC Not Working in Computer Lab",
            "The air conditioning in the main computer lab is not functioning. Room is overheating and affecting the computers' performance.",
            "HVAC",
            Resolved,
            Priority::High,
            "Technology Center",
            ymd(2025, 4, 19),
            Some(ymd(2025, 4, 20)),
            31,
            vec![
                seed_comment(1, "Prof. Johnson", "This is affecting my ability to teach the programming class.", ymd(2025, 4, 19), false),
                seed_comment(2, STAFF, "Emergency repair completed. The system needed a refrigerant recharge.", ymd(2025, 4, 20), true),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DeskError;

    fn stamp() -> Stamp {
        Stamp {
            now: ymd(2025, 5, 3).and_hms_opt(8, 0, 0).unwrap(),
            author: "Admin User".into(),
            official: true,
        }
    }

    #[test]
    fn test_location_required() {
        let draft = MaintenanceDraft {
            title: "Broken tap".into(),
            description: "Dripping all night".into(),
            location: "   ".into(),
            ..Default::default()
        };
        assert!(matches!(
            MaintenanceRequest::from_draft(draft, 8, &stamp()),
            Err(DeskError::Validation { field: "location" })
        ));
    }

    #[test]
    fn test_enter_status_dates() {
        let mut req = seed().remove(2);
        assert_eq!(req.scheduled_date, None);
        req.enter_status(MaintenanceStatus::Scheduled, ymd(2025, 5, 3));
        assert_eq!(req.scheduled_date, Some(ymd(2025, 5, 3)));

        req.enter_status(MaintenanceStatus::Resolved, ymd(2025, 5, 6));
        assert_eq!(req.scheduled_date, Some(ymd(2025, 5, 3)));
        assert_eq!(req.completed_date, Some(ymd(2025, 5, 6)));
        assert_eq!(req.status, MaintenanceStatus::Resolved);
    }

    #[test]
    fn test_wire_format() {
        let seed = seed();
        let json = serde_json::to_value(&seed[3]).unwrap();
        assert_eq!(json["type"], "Structural");
        assert_eq!(json["scheduledDate"], "2025-04-21");
        assert_eq!(json["completedDate"], "2025-04-21");
        let open = serde_json::to_value(&seed[2]).unwrap();
        assert!(open["scheduledDate"].is_null());
    }

    #[test]
    fn test_legacy_staff_comment() {
        let json = r#"{"id":9,"title":"t","description":"d","type":"Other","status":"Open",
            "priority":"Low","location":"Gym","date":"2025-04-01","scheduledDate":null,
            "votes":0,"comments":[{"id":1,"user":"Maintenance Staff","text":"ok","date":"2025-04-02","isStaff":true}]}"#;
        let req: MaintenanceRequest = serde_json::from_str(json).unwrap();
        assert!(req.comments[0].is_official);
        assert_eq!(req.completed_date, None);
    }
}
