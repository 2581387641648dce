//! Visitor log: check-in on creation, one check-out.

use std::borrow::Cow;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::kinds::ymd_hm;
use crate::query::{Facet, FacetValue, Queryable};
use crate::record::{dates, one_of, required, Record, RecordId, Stamp};

pub const CATEGORIES: &[&str] = &["Business", "Delivery", "Guest", "Student", "Vendor"];

pub const VERIFICATIONS: &[&str] = &["manual", "qr-code", "facial-recognition"];

const AVATAR_SERVICE: &str = "https://ui-avatars.com/api/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisitorStatus {
    CheckedIn,
    CheckedOut,
}

impl VisitorStatus {
    pub const ALL: [VisitorStatus; 2] = [Self::CheckedIn, Self::CheckedOut];

    pub fn name(self) -> &'static str {
        match self {
            Self::CheckedIn => "checked-in",
            Self::CheckedOut => "checked-out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub purpose: String,
    pub category: String,
    pub host: String,
    #[serde(with = "dates::instant")]
    pub check_in: NaiveDateTime,
    #[serde(default, with = "dates::optional_instant")]
    pub check_out: Option<NaiveDateTime>,
    pub status: VisitorStatus,
    #[serde(default = "default_verification")]
    pub verification: String,
    #[serde(default)]
    pub notes: String,
}

fn default_verification() -> String {
    VERIFICATIONS[0].to_string()
}

impl Visitor {
    pub fn is_checked_in(&self) -> bool {
        self.status == VisitorStatus::CheckedIn
    }

    /// Mark the visit finished at `now`. Returns false if it already was.
    pub fn check_out(&mut self, now: NaiveDateTime) -> bool {
        if !self.is_checked_in() {
            return false;
        }
        self.check_out = Some(now);
        self.status = VisitorStatus::CheckedOut;
        true
    }

    /// Time on premises; an open visit is measured up to `now`.
    pub fn visit_length(&self, now: NaiveDateTime) -> Duration {
        let end = self.check_out.unwrap_or(now);
        if end >= self.check_in {
            end - self.check_in
        } else {
            self.check_in - end
        }
    }
}

/// Generated avatar for visitors registered without a photo.
pub fn avatar_url(name: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!("{AVATAR_SERVICE}?name={encoded}&background=random")
}

#[derive(Debug, Clone)]
pub struct VisitorDraft {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub purpose: String,
    pub category: String,
    pub host: String,
    pub verification: String,
    pub notes: String,
    /// Captured photo, usually a data URL from the capture view.
    pub photo: Option<String>,
}

impl Default for VisitorDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            company: String::new(),
            email: String::new(),
            phone: String::new(),
            purpose: "Meeting".to_string(),
            category: CATEGORIES[0].to_string(),
            host: String::new(),
            verification: default_verification(),
            notes: String::new(),
            photo: None,
        }
    }
}

impl Record for Visitor {
    const STORAGE_KEY: &'static str = "visitors";
    const KIND: &'static str = "visitor";
    type Draft = VisitorDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn seed() -> Vec<Self> {
        seed()
    }

    fn from_draft(draft: VisitorDraft, id: RecordId, stamp: &Stamp) -> Result<Self> {
        let name = required(&draft.name, "name")?;
        let host = required(&draft.host, "host")?;
        let category = one_of(draft.category.trim(), CATEGORIES, "category")?;
        let verification = one_of(draft.verification.trim(), VERIFICATIONS, "verification")?;
        let photo = match draft.photo.filter(|p| !p.trim().is_empty()) {
            Some(photo) => photo,
            None => avatar_url(&name),
        };

        Ok(Self {
            id,
            name,
            company: draft.company.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            photo,
            purpose: draft.purpose.trim().to_string(),
            category,
            host,
            check_in: stamp.now,
            check_out: None,
            status: VisitorStatus::CheckedIn,
            verification,
            notes: draft.notes.trim().to_string(),
        })
    }
}

impl Queryable for Visitor {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.name.as_str()),
            Cow::Borrowed(self.company.as_str()),
            Cow::Borrowed(self.host.as_str()),
        ]
    }

    fn facet(&self, facet: Facet) -> FacetValue<'_> {
        match facet {
            Facet::Category => FacetValue::One(self.category.as_str()),
            Facet::Status => FacetValue::One(self.status.name()),
            Facet::Priority | Facet::Audience | Facet::Location => FacetValue::Absent,
        }
    }

    fn created_at(&self) -> Option<NaiveDateTime> {
        Some(self.check_in)
    }
}

#[allow(clippy::too_many_arguments)]
fn visitor(
    id: RecordId,
    name: &str,
    company: &str,
    email: &str,
    phone: &str,
    photo: &str,
    purpose: &str,
    category: &str,
    host: &str,
    check_in: NaiveDateTime,
    check_out: Option<NaiveDateTime>,
    verification: &str,
    notes: &str,
) -> Visitor {
    Visitor {
        id,
        name: name.into(),
        company: company.into(),
        email: email.into(),
        phone: phone.into(),
        photo: photo.into(),
        purpose: purpose.into(),
        category: category.into(),
        host: host.into(),
        check_in,
        check_out,
        status: if check_out.is_some() {
            VisitorStatus::CheckedOut
        } else {
            VisitorStatus::CheckedIn
        },
        verification: verification.into(),
        notes: notes.into(),
    }
}

fn seed() -> Vec<Visitor> {
    vec![
        visitor(
            1,
            "Sarah Johnson",
            "Tech Solutions Inc.",
            "sarah.j@techsolutions.com",
            "+1 (555) 123-4567",
            "https://randomuser.me/api/portraits/women/44.jpg",
            "Business Meeting",
            "Business",
            "Mark Williams (Sales Dept)",
            ymd_hm(2025, 5, 10, 9, 30),
            Some(ymd_hm(2025, 5, 10, 11, 45)),
            "facial-recognition",
            "Met with sales team about new software",
        ),
        visitor(
            2,
            "David Chen",
            "Global Logistics",
            "david.chen@globallogistics.com",
            "+1 (555) 987-6543",
            "https://randomuser.me/api/portraits/men/32.jpg",
            "Delivery",
            "Delivery",
            "Reception",
            ymd_hm(2025, 5, 10, 14, 15),
            None,
            "qr-code",
            "Dropped off packages for accounting",
        ),
        visitor(
            3,
            "Emma Rodriguez",
            "University of Tech",
            "emma.rodriguez@utech.edu",
            "+1 (555) 456-7890",
            "https://randomuser.me/api/portraits/women/68.jpg",
            "Campus Tour",
            "Guest",
            "Admissions Office",
            ymd_hm(2025, 5, 9, 10, 0),
            Some(ymd_hm(2025, 5, 9, 12, 30)),
            "manual",
            "Prospective student - very interested",
        ),
    ]
}
