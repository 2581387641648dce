//! Notices: pinnable, likeable, addressed to one or more audiences.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::{DeskError, Result};
use crate::kinds::{midnight, seed_comment, ymd, ymd_hm};
use crate::query::{Facet, FacetValue, Queryable};
use crate::record::{
    dates, one_of, required, Comment, Pinnable, Posted, Priority, Record, RecordId, Stamp, Threaded, Votable,
};

pub const CATEGORIES: &[&str] = &["General", "Academic", "Career", "Events", "Maintenance", "Security"];

pub const AUDIENCES: &[&str] = &["Students", "Faculty", "Staff", "Administration"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub audience: Vec<String>,
    pub author: String,
    #[serde(with = "dates::day")]
    pub date: NaiveDate,
    #[serde(default, with = "dates::optional_day")]
    pub expiry: Option<NaiveDate>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Notice {
    /// Whether the notice expired before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry.is_some_and(|expiry| expiry < today)
    }
}

#[derive(Debug, Clone)]
pub struct NoticeDraft {
    pub title: String,
    pub content: String,
    pub category: String,
    pub priority: Priority,
    pub audience: Vec<String>,
    pub expiry: Option<NaiveDate>,
}

impl Default for NoticeDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            category: CATEGORIES[0].to_string(),
            priority: Priority::Medium,
            audience: Vec::new(),
            expiry: None,
        }
    }
}

impl Record for Notice {
    const STORAGE_KEY: &'static str = "notices";
    const KIND: &'static str = "notice";
    type Draft = NoticeDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn seed() -> Vec<Self> {
        seed()
    }

    fn from_draft(draft: NoticeDraft, id: RecordId, stamp: &Stamp) -> Result<Self> {
        let title = required(&draft.title, "title")?;
        let content = required(&draft.content, "content")?;
        let category = one_of(draft.category.trim(), CATEGORIES, "category")?;

        let mut audience: Vec<String> = Vec::with_capacity(draft.audience.len());
        for wanted in &draft.audience {
            let wanted = one_of(wanted.trim(), AUDIENCES, "audience")?;
            if !audience.contains(&wanted) {
                audience.push(wanted);
            }
        }

        if stamp.author.trim().is_empty() {
            return Err(DeskError::missing("author"));
        }

        Ok(Self {
            id,
            title,
            content,
            category,
            priority: draft.priority,
            audience,
            author: stamp.author.clone(),
            date: stamp.today(),
            expiry: draft.expiry,
            pinned: false,
            likes: 0,
            comments: Vec::new(),
        })
    }
}

impl Votable for Notice {
    fn add_vote(&mut self) {
        self.likes = self.likes.saturating_add(1);
    }
}

impl Threaded for Notice {
    fn posted(now: NaiveDateTime) -> Posted {
        Posted::At(now)
    }

    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }
}

impl Pinnable for Notice {
    fn is_pinned(&self) -> bool {
        self.pinned
    }

    fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
    }
}

impl Queryable for Notice {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.content.as_str()),
            Cow::Borrowed(self.author.as_str()),
        ]
    }

    fn facet(&self, facet: Facet) -> FacetValue<'_> {
        match facet {
            Facet::Category => FacetValue::One(self.category.as_str()),
            Facet::Priority => FacetValue::One(self.priority.name()),
            Facet::Audience => FacetValue::Many(&self.audience),
            Facet::Status | Facet::Location => FacetValue::Absent,
        }
    }

    fn created_at(&self) -> Option<NaiveDateTime> {
        midnight(self.date)
    }

    fn expiry(&self) -> Option<NaiveDate> {
        self.expiry
    }

    fn priority(&self) -> Option<Priority> {
        Some(self.priority)
    }

    fn votes(&self) -> u32 {
        self.likes
    }

    fn pinned(&self) -> bool {
        self.pinned
    }

    fn author(&self) -> Option<&str> {
        Some(self.author.as_str())
    }
}

fn audience(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn seed() -> Vec<Notice> {
    vec![
        Notice {
            id: 1,
            title: "Campus Power Maintenance".into(),
            content: "There will be scheduled power maintenance on May 15th from 8:00 AM to 12:00 PM. All academic buildings will be affected. Please save your work and log off computers before this time.".into(),
            category: "Maintenance".into(),
            priority: Priority::High,
            audience: audience(&["Students", "Faculty"]),
            author: "Facilities Department".into(),
            date: ymd(2025, 5, 5),
            expiry: Some(ymd(2025, 5, 16)),
            pinned: true,
            likes: 24,
            comments: vec![
                seed_comment(1, "Alex Johnson", "Will the library have backup power?", ymd_hm(2025, 5, 5, 10, 30), false),
                seed_comment(
                    2,
                    "Facilities Dept",
                    "Yes, the library will have limited backup power for essential systems.",
                    ymd_hm(2025, 5, 5, 11, 15),
                    true,
                ),
            ],
        },
        Notice {
            id: 2,
            title: "Summer Internship Opportunities".into(),
            content: "Applications are now open for summer internships with our industry partners. Deadline for submission is May 30th. Visit the career center for more information.".into(),
            category: "Career".into(),
            priority: Priority::Medium,
            audience: audience(&["Students"]),
            author: "Career Services".into(),
            date: ymd(2025, 5, 3),
            expiry: Some(ymd(2025, 5, 31)),
            pinned: false,
            likes: 56,
            comments: Vec::new(),
        },
        Notice {
            id: 3,
            title: "New Cafeteria Menu Options".into(),
            content: "Starting next week, we're introducing new healthy menu options in the main cafeteria, including vegan and gluten-free choices.".into(),
            category: "General".into(),
            priority: Priority::Low,
            audience: audience(&["Students", "Faculty", "Staff"]),
            author: "Food Services".into(),
            date: ymd(2025, 5, 1),
            expiry: Some(ymd(2025, 5, 31)),
            pinned: false,
            likes: 102,
            comments: vec![seed_comment(1, "Taylor Smith", "Finally! Been waiting for more vegan options.", ymd_hm(2025, 5, 1, 14, 20), false)],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> Stamp {
        Stamp {
            now: ymd(2025, 5, 6).and_hms_opt(12, 0, 0).unwrap(),
            author: "Warden Office".into(),
            official: true,
        }
    }

    #[test]
    fn test_from_draft_author_and_audience() {
        let draft = NoticeDraft {
            title: "Fire drill".into(),
            content: "Thursday 10 AM".into(),
            category: "Security".into(),
            audience: vec!["Students".into(), "Staff".into(), "Students".into()],
            ..Default::default()
        };
        let notice = Notice::from_draft(draft, 4, &stamp()).unwrap();
        assert_eq!(notice.author, "Warden Office");
        assert_eq!(notice.audience, vec!["Students", "Staff"]);
        assert!(!notice.pinned);
        assert_eq!(notice.likes, 0);
    }

    #[test]
    fn test_from_draft_rejects_unknown_audience() {
        let draft = NoticeDraft {
            title: "Fire drill".into(),
            content: "Thursday".into(),
            audience: vec!["Parents".into()],
            ..Default::default()
        };
        assert!(matches!(
            Notice::from_draft(draft, 4, &stamp()),
            Err(DeskError::Validation { field: "audience" })
        ));
    }

    #[test]
    fn test_expiry_strictly_before_today() {
        let notice = seed().remove(0);
        assert!(!notice.is_expired(ymd(2025, 5, 16)));
        assert!(notice.is_expired(ymd(2025, 5, 17)));
    }

    #[test]
    fn test_legacy_wire_format() {
        let json = r#"{"id":7,"title":"t","content":"c","category":"Events","priority":"Low",
            "audience":["Faculty"],"author":"You","date":"2025-05-02","expiry":"",
            "pinned":false,"likes":3,
            "comments":[{"id":1746441000000,"user":"You","text":"hi","date":"2025-05-02T09:00:00.000Z"}]}"#;
        let notice: Notice = serde_json::from_str(json).unwrap();
        assert_eq!(notice.expiry, None);
        assert_eq!(notice.comments[0].date, Posted::At(ymd_hm(2025, 5, 2, 9, 0)));
        assert_eq!(notice.comments[0].date.day(), ymd(2025, 5, 2));
        assert_eq!(notice.votes(), 3);
    }
}
