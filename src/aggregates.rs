//! Derived aggregates: pure reducers over unfiltered collections, shaped
//! for the charting collaborator. Nothing here is cached; callers recompute
//! after every mutation.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::kinds::{Complaint, Room, RoomStatus, Visitor};
use crate::query::{Facet, FacetValue, Queryable};
use crate::record::{Lifecycle, StatusFlow};

/// `{labels, values}` as the chart host consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

/// Ordered counts keyed by label, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(String, u64)>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tally whose keys exist up front with zero counts.
    pub fn with_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            entries: keys.into_iter().map(|k| (k.to_string(), 0)).collect(),
        }
    }

    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, n: u64) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += n,
            None => self.entries.push((key.to_string(), n)),
        }
    }

    /// Fold another tally in, keeping this one's order for shared keys.
    pub fn merge(&mut self, other: &Tally) {
        for (key, n) in &other.entries {
            self.add_n(key, *n);
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.entries.iter().find(|(k, _)| k == key).map_or(0, |(_, n)| *n)
    }

    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Largest count; the first-seen key wins ties.
    pub fn most_common(&self) -> Option<&str> {
        let mut best: Option<&(String, u64)> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(k, _)| k.as_str())
    }

    pub fn sort_by_label(&mut self) {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
    }

    pub fn series(&self) -> ChartSeries {
        ChartSeries {
            labels: self.entries.iter().map(|(k, _)| k.clone()).collect(),
            values: self.entries.iter().map(|(_, n)| *n).collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for Tally {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for key in iter {
            tally.add(key);
        }
        tally
    }
}

// ─── Histograms ───────────────────────────────────────────────────────────

/// Count records by one facet. Multi-valued facets count every value.
pub fn facet_histogram<R: Queryable>(records: &[R], facet: Facet) -> Tally {
    let mut tally = Tally::new();
    for record in records {
        match record.facet(facet) {
            FacetValue::One(value) => tally.add(value),
            FacetValue::Many(values) => values.iter().for_each(|v| tally.add(v)),
            FacetValue::Absent => {}
        }
    }
    tally
}

/// Category (or type) histogram.
pub fn category_histogram<R: Queryable>(records: &[R]) -> Tally {
    facet_histogram(records, Facet::Category)
}

pub fn status_distribution<R: Queryable>(records: &[R]) -> Tally {
    facet_histogram(records, Facet::Status)
}

/// Category histogram across two issue kinds (complaints and maintenance).
pub fn combined_histogram<A: Queryable, B: Queryable>(a: &[A], b: &[B]) -> Tally {
    let mut tally = category_histogram(a);
    tally.merge(&category_histogram(b));
    tally
}

// ─── Trends ───────────────────────────────────────────────────────────────

/// One count per `YYYY-MM` present, ascending. Months with no records are
/// not emitted.
pub fn monthly_trend<R: Queryable>(records: &[R]) -> Tally {
    let months: Vec<String> = records
        .iter()
        .filter_map(Queryable::created_on)
        .map(|d| d.format("%Y-%m").to_string())
        .collect();
    let mut tally: Tally = months.iter().map(String::as_str).collect();
    tally.sort_by_label();
    tally
}

/// Last seven days ending today, zero-filled. Index 6 is today.
pub fn weekly_trend(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> ChartSeries {
    let mut values = vec![0u64; 7];
    for date in dates {
        let days_ago = (today - date).num_days();
        if (0..7).contains(&days_ago) {
            values[(6 - days_ago) as usize] += 1;
        }
    }
    let labels = (0..7)
        .map(|i| (today - Duration::days(6 - i)).format("%a").to_string())
        .collect();
    ChartSeries { labels, values }
}

/// Last six calendar months ending with the current one, zero-filled.
/// Index 5 is the current month.
pub fn six_month_trend(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> ChartSeries {
    let current = month_index(today);
    let mut values = vec![0u64; 6];
    for date in dates {
        let diff = current - month_index(date);
        if (0..6).contains(&diff) {
            values[(5 - diff) as usize] += 1;
        }
    }
    let labels = (0..6).rev().map(|back| month_label(current - back)).collect();
    ChartSeries { labels, values }
}

/// Creation days of every record that has one.
pub fn created_days<R: Queryable>(records: &[R]) -> impl Iterator<Item = NaiveDate> + '_ {
    records.iter().filter_map(Queryable::created_on)
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn month_label(index: i32) -> String {
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        .map(|d| d.format("%b %y").to_string())
        .unwrap_or_default()
}

// ─── Issue summary ────────────────────────────────────────────────────────

/// Headline numbers for a complaint or maintenance collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub total: usize,
    pub open: usize,
    pub resolved: usize,
    pub total_votes: u64,
    /// Rounded mean votes per record.
    pub average_votes: u64,
    pub top_category: Option<String>,
    /// Rounded share of resolved records, in percent.
    pub resolution_rate: u64,
}

pub fn issue_summary<R: Lifecycle + Queryable>(records: &[R]) -> IssueSummary {
    let total = records.len();
    let resolved = records.iter().filter(|r| r.status().is_final()).count();
    let total_votes: u64 = records.iter().map(|r| u64::from(r.votes())).sum();
    IssueSummary {
        total,
        open: total - resolved,
        resolved,
        total_votes,
        average_votes: rounded_ratio(total_votes, total as u64, 1),
        top_category: category_histogram(records).most_common().map(str::to_string),
        resolution_rate: rounded_ratio(resolved as u64, total as u64, 100),
    }
}

/// `round(part * scale / whole)`, or 0 for an empty whole.
fn rounded_ratio(part: u64, whole: u64, scale: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    ((part * scale) as f64 / whole as f64).round() as u64
}

// ─── Rooms ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOccupancy {
    pub room_id: u64,
    pub kind: String,
    pub occupants: usize,
    pub capacity: u32,
    pub percent: u32,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyStats {
    pub rooms: Vec<RoomOccupancy>,
    /// Every derived status, zeros included.
    pub by_status: Tally,
    pub by_type: Tally,
    pub total_beds: u64,
    pub occupied_beds: u64,
}

impl OccupancyStats {
    pub fn free_beds(&self) -> u64 {
        self.total_beds.saturating_sub(self.occupied_beds)
    }
}

pub fn occupancy_stats(rooms: &[Room]) -> OccupancyStats {
    let mut by_status = Tally::with_keys(RoomStatus::ALL.iter().map(|s| s.name()));
    let mut by_type = Tally::new();
    let mut total_beds = 0;
    let mut occupied_beds = 0;

    let per_room = rooms
        .iter()
        .map(|room| {
            let status = room.status();
            by_status.add(status.name());
            by_type.add(&room.kind);
            total_beds += u64::from(room.capacity);
            occupied_beds += room.occupants.len() as u64;
            RoomOccupancy {
                room_id: room.id,
                kind: room.kind.clone(),
                occupants: room.occupants.len(),
                capacity: room.capacity,
                percent: room.occupancy_percent(),
                status: status.name(),
            }
        })
        .collect();

    OccupancyStats {
        rooms: per_room,
        by_status,
        by_type,
        total_beds,
        occupied_beds,
    }
}

// ─── Visitors ─────────────────────────────────────────────────────────────

pub fn current_visitors(visitors: &[Visitor]) -> Vec<&Visitor> {
    visitors.iter().filter(|v| v.is_checked_in()).collect()
}

/// `"{h}h {m}m"`, or `"{m}m"` under an hour.
pub fn format_duration(length: Duration) -> String {
    let minutes = length.num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// How long a visit lasted, or has lasted so far.
pub fn visit_duration(visitor: &Visitor, now: NaiveDateTime) -> String {
    format_duration(visitor.visit_length(now))
}

// ─── Dashboard ────────────────────────────────────────────────────────────

/// The overview tab's cards and charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub rooms: usize,
    pub open_complaints: usize,
    pub visitors_today: usize,
    pub students_housed: usize,
    pub complaint_trend: ChartSeries,
    pub visitor_trend: ChartSeries,
    pub room_types: ChartSeries,
}

pub fn dashboard_snapshot(
    rooms: &[Room],
    complaints: &[Complaint],
    visitors: &[Visitor],
    today: NaiveDate,
) -> DashboardSnapshot {
    DashboardSnapshot {
        rooms: rooms.len(),
        open_complaints: complaints.iter().filter(|c| !c.status.is_final()).count(),
        visitors_today: visitors.iter().filter(|v| v.check_in.date() == today).count(),
        students_housed: rooms.iter().map(|r| r.occupants.len()).sum(),
        complaint_trend: weekly_trend(created_days(complaints), today),
        visitor_trend: six_month_trend(created_days(visitors), today),
        room_types: category_histogram(rooms).series(),
    }
}
