//! Rooms and their occupants. A room's status is always derived from its
//! occupant count and is never read back from storage.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::{DeskError, Result};
use crate::kinds::ymd;
use crate::query::{Facet, FacetValue, Queryable};
use crate::record::{dates, required, Record, RecordId, Stamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomStatus {
    Available,
    PartiallyOccupied,
    Occupied,
}

impl RoomStatus {
    pub const ALL: [RoomStatus; 3] = [Self::Available, Self::PartiallyOccupied, Self::Occupied];

    /// Derive from an occupant count.
    pub fn from_count(occupants: usize, capacity: u32) -> Self {
        if occupants == 0 {
            Self::Available
        } else if occupants < capacity as usize {
            Self::PartiallyOccupied
        } else {
            Self::Occupied
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::PartiallyOccupied => "Partially Occupied",
            Self::Occupied => "Occupied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupant {
    /// Student id, e.g. `S001`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub food_preference: String,
    #[serde(with = "dates::day")]
    pub allocated_on: NaiveDate,
    #[serde(default)]
    pub fees_paid: bool,
    #[serde(default)]
    pub contact: String,
}

/// The allocation form, minus the target room.
#[derive(Debug, Clone)]
pub struct OccupantDraft {
    pub student_id: String,
    pub student_name: String,
    pub course: String,
    pub year: String,
    pub food_preference: String,
    pub contact: String,
}

impl Default for OccupantDraft {
    fn default() -> Self {
        Self {
            student_id: String::new(),
            student_name: String::new(),
            course: String::new(),
            year: String::new(),
            food_preference: "Vegetarian".to_string(),
            contact: String::new(),
        }
    }
}

impl OccupantDraft {
    /// Validate and build a new, unpaid occupant allocated `today`.
    pub fn into_occupant(self, today: NaiveDate) -> Result<Occupant> {
        Ok(Occupant {
            id: required(&self.student_id, "studentId")?,
            name: required(&self.student_name, "studentName")?,
            course: self.course.trim().to_string(),
            year: self.year.trim().to_string(),
            food_preference: self.food_preference.trim().to_string(),
            allocated_on: today,
            fees_paid: false,
            contact: self.contact.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Room number.
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: String,
    pub capacity: u32,
    #[serde(default)]
    pub occupants: Vec<Occupant>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl Room {
    pub fn status(&self) -> RoomStatus {
        RoomStatus::from_count(self.occupants.len(), self.capacity)
    }

    pub fn free_beds(&self) -> usize {
        (self.capacity as usize).saturating_sub(self.occupants.len())
    }

    pub fn has_space(&self) -> bool {
        self.free_beds() > 0
    }

    /// Rounded occupied share of capacity.
    pub fn occupancy_percent(&self) -> u32 {
        if self.capacity == 0 {
            return 0;
        }
        ((self.occupants.len() as f64 / self.capacity as f64) * 100.0).round() as u32
    }

    pub fn houses(&self, student_id: &str) -> bool {
        self.occupants.iter().any(|o| o.id == student_id)
    }

    /// Append `occupant`, refusing a full room.
    pub fn admit(&mut self, occupant: Occupant) -> Result<()> {
        if !self.has_space() {
            return Err(DeskError::Capacity {
                room_id: self.id,
                capacity: self.capacity,
            });
        }
        self.occupants.push(occupant);
        Ok(())
    }

    /// Remove the occupant with `student_id`. Returns false if absent.
    pub fn release(&mut self, student_id: &str) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|o| o.id != student_id);
        self.occupants.len() != before
    }
}

/// The new-room form.
#[derive(Debug, Clone, Default)]
pub struct RoomDraft {
    pub kind: String,
    pub capacity: u32,
    pub amenities: Vec<String>,
}

impl Record for Room {
    const STORAGE_KEY: &'static str = "hostelRooms";
    const KIND: &'static str = "room";
    type Draft = RoomDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn seed() -> Vec<Self> {
        seed()
    }

    fn from_draft(draft: RoomDraft, id: RecordId, _stamp: &Stamp) -> Result<Self> {
        let kind = required(&draft.kind, "type")?;
        if draft.capacity == 0 {
            return Err(DeskError::missing("capacity"));
        }
        let amenities = draft
            .amenities
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self {
            id,
            kind,
            capacity: draft.capacity,
            occupants: Vec::new(),
            amenities,
        })
    }
}

impl Queryable for Room {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![Cow::Owned(self.id.to_string()), Cow::Borrowed(self.kind.as_str())];
        for occupant in &self.occupants {
            fields.push(Cow::Borrowed(occupant.name.as_str()));
            fields.push(Cow::Borrowed(occupant.id.as_str()));
        }
        fields
    }

    fn facet(&self, facet: Facet) -> FacetValue<'_> {
        match facet {
            Facet::Category => FacetValue::One(self.kind.as_str()),
            Facet::Status => FacetValue::One(self.status().name()),
            Facet::Priority | Facet::Audience | Facet::Location => FacetValue::Absent,
        }
    }

    fn created_at(&self) -> Option<NaiveDateTime> {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn occupant(
    id: &str,
    name: &str,
    course: &str,
    year: &str,
    food: &str,
    allocated_on: NaiveDate,
    fees_paid: bool,
    contact: &str,
) -> Occupant {
    Occupant {
        id: id.into(),
        name: name.into(),
        course: course.into(),
        year: year.into(),
        food_preference: food.into(),
        allocated_on,
        fees_paid,
        contact: contact.into(),
    }
}

fn amenities(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn seed() -> Vec<Room> {
    vec![
        Room {
            id: 101,
            kind: "Single AC".into(),
            capacity: 1,
            occupants: vec![occupant(
                "S001",
                "Rahul Sharma",
                "B.Tech CSE",
                "3rd",
                "Vegetarian",
                ymd(2023, 6, 15),
                true,
                "rahul.sharma@example.com",
            )],
            amenities: amenities(&["AC", "WiFi", "Attached Bathroom", "Study Table"]),
        },
        Room {
            id: 102,
            kind: "Double Non-AC".into(),
            capacity: 2,
            occupants: vec![
                occupant("S002", "Priya Patel", "B.Sc Physics", "2nd", "Vegetarian", ymd(2023, 7, 10), true, "priya.patel@example.com"),
                occupant("S003", "Neha Gupta", "B.Com", "1st", "Vegan", ymd(2023, 7, 10), false, "neha.gupta@example.com"),
            ],
            amenities: amenities(&["WiFi", "Common Bathroom", "Study Table"]),
        },
        Room {
            id: 103,
            kind: "Dormitory".into(),
            capacity: 8,
            occupants: vec![
                occupant("S004", "Amit Singh", "B.Tech ME", "4th", "Non-Vegetarian", ymd(2023, 6, 1), true, "amit.singh@example.com"),
                occupant("S005", "Vikram Joshi", "B.Tech ECE", "4th", "Vegetarian", ymd(2023, 6, 1), true, "vikram.joshi@example.com"),
            ],
            amenities: amenities(&["Common Bathroom", "Study Hall", "Laundry Service"]),
        },
    ]
}
