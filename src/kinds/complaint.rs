//! Complaints: votable, threaded, forward-only status.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::kinds::{midnight, seed_comment, ymd};
use crate::query::{Facet, FacetValue, Queryable};
use crate::record::{
    dates, one_of, required, Comment, Lifecycle, Priority, Record, RecordId, Stamp, StatusFlow, Threaded, Votable,
};

pub const CATEGORIES: &[&str] = &[
    "Infrastructure",
    "Academic",
    "Cafeteria",
    "Transportation",
    "Dormitory",
    "Administration",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Open,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl StatusFlow for ComplaintStatus {
    const ALL: &'static [Self] = &[Self::Open, Self::InProgress, Self::UnderReview, Self::Resolved];

    fn stage(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::UnderReview => 1,
            Self::InProgress => 2,
            Self::Resolved => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::UnderReview => "Under Review",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: ComplaintStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(with = "dates::day")]
    pub date: NaiveDate,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// The new-complaint form.
#[derive(Debug, Clone)]
pub struct ComplaintDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
}

impl Default for ComplaintDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: CATEGORIES[0].to_string(),
            priority: Priority::Medium,
        }
    }
}

impl Record for Complaint {
    const STORAGE_KEY: &'static str = "complaints";
    const KIND: &'static str = "complaint";
    type Draft = ComplaintDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn seed() -> Vec<Self> {
        seed()
    }

    fn from_draft(draft: ComplaintDraft, id: RecordId, stamp: &Stamp) -> Result<Self> {
        Ok(Self {
            id,
            title: required(&draft.title, "title")?,
            description: required(&draft.description, "description")?,
            category: one_of(draft.category.trim(), CATEGORIES, "category")?,
            status: ComplaintStatus::Open,
            priority: draft.priority,
            date: stamp.today(),
            votes: 0,
            comments: Vec::new(),
        })
    }
}

impl Votable for Complaint {
    fn add_vote(&mut self) {
        self.votes = self.votes.saturating_add(1);
    }
}

impl Threaded for Complaint {
    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }
}

impl Lifecycle for Complaint {
    type Status = ComplaintStatus;

    fn status(&self) -> ComplaintStatus {
        self.status
    }

    fn enter_status(&mut self, next: ComplaintStatus, _today: NaiveDate) {
        self.status = next;
    }
}

impl Queryable for Complaint {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.title.as_str()), Cow::Borrowed(self.description.as_str())]
    }

    fn facet(&self, facet: Facet) -> FacetValue<'_> {
        match facet {
            Facet::Category => FacetValue::One(self.category.as_str()),
            Facet::Status => FacetValue::One(self.status.name()),
            Facet::Priority => FacetValue::One(self.priority.name()),
            Facet::Audience | Facet::Location => FacetValue::Absent,
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

fn seed() -> Vec<Complaint> {
    vec![
        Complaint {
            id: 1,
            title: "Slow Wi-Fi in Dorm Block C".into(),
            description: "The internet connection in Block C has been extremely slow for the past week, making it impossible to attend online classes or submit assignments.".into(),
            category: "Infrastructure".into(),
            status: ComplaintStatus::InProgress,
            priority: Priority::High,
            date: ymd(2025, 4, 25),
            votes: 24,
            comments: vec![
                seed_comment(1, "Jane D.", "I'm having the same issue!", ymd(2025, 4, 26), false),
                seed_comment(2, "Admin", "IT team has been notified and will check the routers tomorrow.", ymd(2025, 4, 27), true),
            ],
        },
        Complaint {
            id: 2,
            title: "Cafeteria Food Quality".into(),
            description: "The quality of food has deteriorated significantly in the last month. Many students have reported feeling unwell after eating lunch.".into(),
            category: "Cafeteria".into(),
            status: ComplaintStatus::UnderReview,
            priority: Priority::High,
            date: ymd(2025, 4, 26),
            votes: 32,
            comments: vec![seed_comment(1, "Mark L.", "I found something strange in my soup yesterday.", ymd(2025, 4, 27), false)],
        },
        Complaint {
            id: 3,
            title: "Library Closing Too Early".into(),
            description: "The library now closes at 8 PM instead of 10 PM, which is not enough time for many students who have evening classes.".into(),
            category: "Academic".into(),
            status: ComplaintStatus::Open,
            priority: Priority::Medium,
            date: ymd(2025, 4, 28),
            votes: 15,
            comments: Vec::new(),
        },
        Complaint {
            id: 4,
            title: "Leaking Roof in Science Building".into(),
            description: "There's a significant leak in the ceiling of Room 302 in the Science Building. It's causing damage and disrupting classes.".into(),
            category: "Infrastructure".into(),
            status: ComplaintStatus::Resolved,
            priority: Priority::High,
            date: ymd(2025, 4, 20),
            votes: 18,
            comments: vec![seed_comment(
                1,
                "Admin",
                "Maintenance has fixed the issue as of April 25th. Please let us know if you notice any further problems.",
                ymd(2025, 4, 25),
                true,
            )],
        },
        Complaint {
            id: 5,
            title: "Lack of Vegetarian Options".into(),
            description: "As a vegetarian student, I find it difficult to get proper nutritious meals as there are very limited vegetarian options in the cafeteria.".into(),
            category: "Cafeteria".into(),
            status: ComplaintStatus::InProgress,
            priority: Priority::Medium,
            date: ymd(2025, 4, 24),
            votes: 22,
            comments: vec![seed_comment(
                1,
                "Admin",
                "We're working with our catering service to add more vegetarian options starting next week.",
                ymd(2025, 4, 26),
                true,
            )],
        },
    ]
}
