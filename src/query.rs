//! Query engine: criteria filtering and comparator sorting over a collection.
//!
//! A query never reorders or copies the stored collection; it returns a view
//! of references in the order the UI should render them.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::record::Priority;

/// Filterable dimensions a record kind may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Category,
    Status,
    Priority,
    Audience,
    Location,
}

/// What a record holds for one facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetValue<'a> {
    /// The kind has no such field; criteria on it are ignored.
    Absent,
    One(&'a str),
    Many(&'a [String]),
}

impl FacetValue<'_> {
    fn admits(&self, wanted: &str) -> bool {
        match self {
            Self::Absent => true,
            Self::One(value) => *value == wanted,
            Self::Many(values) => values.iter().any(|v| v == wanted),
        }
    }
}

/// Read-only view a record kind offers to the query engine and aggregates.
pub trait Queryable {
    /// Fields searched by the free-text criterion.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    fn facet(&self, facet: Facet) -> FacetValue<'_>;

    /// Creation instant. Date-only kinds report midnight.
    fn created_at(&self) -> Option<NaiveDateTime>;

    fn created_on(&self) -> Option<NaiveDate> {
        self.created_at().map(|t| t.date())
    }

    fn expiry(&self) -> Option<NaiveDate> {
        None
    }

    fn priority(&self) -> Option<Priority> {
        None
    }

    /// Votes or likes.
    fn votes(&self) -> u32 {
        0
    }

    fn pinned(&self) -> bool {
        false
    }

    fn author(&self) -> Option<&str> {
        None
    }
}

// ─── Criteria ─────────────────────────────────────────────────────────────

/// `All` (no constraint) or one wanted value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    #[default]
    All,
    Is(String),
}

impl Selector {
    /// The sentinel `All` is accepted in any letter case.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Is(value.to_string())
        }
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateRange {
    #[default]
    All,
    Today,
    /// Today and the seven days before it.
    Week,
}

impl DateRange {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Self::Today,
            "week" => Self::Week,
            _ => Self::All,
        }
    }

    fn admits(self, created: Option<NaiveDate>, today: NaiveDate) -> bool {
        match (self, created) {
            (Self::All, _) => true,
            (_, None) => false,
            (Self::Today, Some(day)) => day == today,
            (Self::Week, Some(day)) => day >= today - Duration::days(7),
        }
    }
}

/// Which slice of a board to show (the notice tabs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    All,
    Pinned,
    AuthoredBy(String),
}

impl Scope {
    fn admits<R: Queryable + ?Sized>(&self, record: &R) -> bool {
        match self {
            Self::All => true,
            Self::Pinned => record.pinned(),
            Self::AuthoredBy(label) => record.author() == Some(label.as_str()),
        }
    }
}

/// The recognized filter options. All active options are AND-ed.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    pub search: String,
    pub category: Selector,
    pub status: Selector,
    pub priority: Selector,
    pub audience: Selector,
    pub location: Selector,
    pub date_range: DateRange,
    pub show_expired: bool,
    pub scope: Scope,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: &str) -> Self {
        self.search = text.to_string();
        self
    }

    pub fn category(mut self, value: &str) -> Self {
        self.category = Selector::parse(value);
        self
    }

    pub fn status(mut self, value: &str) -> Self {
        self.status = Selector::parse(value);
        self
    }

    pub fn priority(mut self, value: &str) -> Self {
        self.priority = Selector::parse(value);
        self
    }

    pub fn audience(mut self, value: &str) -> Self {
        self.audience = Selector::parse(value);
        self
    }

    pub fn location(mut self, value: &str) -> Self {
        self.location = Selector::parse(value);
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn show_expired(mut self, show: bool) -> Self {
        self.show_expired = show;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    fn selectors(&self) -> [(Facet, &Selector); 5] {
        [
            (Facet::Category, &self.category),
            (Facet::Status, &self.status),
            (Facet::Priority, &self.priority),
            (Facet::Audience, &self.audience),
            (Facet::Location, &self.location),
        ]
    }

    /// Whether `record` passes every active criterion as of `today`.
    pub fn matches<R: Queryable + ?Sized>(&self, record: &R, today: NaiveDate) -> bool {
        if !self.show_expired && record.expiry().is_some_and(|expiry| expiry < today) {
            return false;
        }

        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty()
            && !record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        {
            return false;
        }

        for (facet, selector) in self.selectors() {
            if let Selector::Is(wanted) = selector {
                if !record.facet(facet).admits(wanted) {
                    return false;
                }
            }
        }

        self.date_range.admits(record.created_on(), today) && self.scope.admits(record)
    }
}

// ─── Sorting ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Newest first.
    Date,
    /// High, Medium, Low.
    Priority,
    /// Most votes (or likes) first.
    Votes,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" => Some(Self::Date),
            "priority" => Some(Self::Priority),
            "votes" | "likes" => Some(Self::Votes),
            _ => None,
        }
    }

    fn compare<R: Queryable + ?Sized>(self, a: &R, b: &R) -> Ordering {
        match self {
            Self::Date => b.created_at().cmp(&a.created_at()),
            Self::Priority => {
                let rank = |r: &R| r.priority().map_or(u8::MAX, Priority::rank);
                rank(a).cmp(&rank(b))
            }
            Self::Votes => b.votes().cmp(&a.votes()),
        }
    }
}

/// Keep the records matching `criteria`, in collection order.
pub fn filter<'a, R: Queryable>(records: &'a [R], criteria: &Criteria, today: NaiveDate) -> Vec<&'a R> {
    records
        .iter()
        .filter(|record| criteria.matches(*record, today))
        .collect()
}

/// Stable sort: ties keep their collection order.
pub fn sort<R: Queryable>(view: &mut [&R], key: SortKey) {
    view.sort_by(|a, b| key.compare(*a, *b));
}

/// Filter, then optionally sort.
pub fn query<'a, R: Queryable>(
    records: &'a [R],
    criteria: &Criteria,
    sort_key: Option<SortKey>,
    today: NaiveDate,
) -> Vec<&'a R> {
    let mut view = filter(records, criteria, today);
    if let Some(key) = sort_key {
        sort(&mut view, key);
    }
    view
}

/// `["All", ...distinct values present]`, in first-seen order.
pub fn facet_options<R: Queryable>(records: &[R], facet: Facet) -> Vec<String> {
    let mut options = vec!["All".to_string()];
    let mut push = |value: &str| {
        if !options.iter().skip(1).any(|o| o == value) {
            options.push(value.to_string());
        }
    };
    for record in records {
        match record.facet(facet) {
            FacetValue::Absent => {}
            FacetValue::One(value) => push(value),
            FacetValue::Many(values) => values.iter().for_each(|v| push(v.as_str())),
        }
    }
    options
}

/// The closed priority option list offered to filter UIs.
pub fn priority_options() -> Vec<String> {
    std::iter::once("All")
        .chain(Priority::ALL.iter().map(|p| p.name()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item {
        title: &'static str,
        category: &'static str,
        tags: Vec<String>,
        day: u32,
        priority: Priority,
        votes: u32,
        expiry: Option<NaiveDate>,
    }

    impl Queryable for Item {
        fn search_fields(&self) -> Vec<Cow<'_, str>> {
            vec![Cow::Borrowed(self.title)]
        }

        fn facet(&self, facet: Facet) -> FacetValue<'_> {
            match facet {
                Facet::Category => FacetValue::One(self.category),
                Facet::Priority => FacetValue::One(self.priority.name()),
                Facet::Audience => FacetValue::Many(&self.tags),
                _ => FacetValue::Absent,
            }
        }

        fn created_at(&self) -> Option<NaiveDateTime> {
            date(self.day).and_hms_opt(0, 0, 0)
        }

        fn expiry(&self) -> Option<NaiveDate> {
            self.expiry
        }

        fn priority(&self) -> Option<Priority> {
            Some(self.priority)
        }

        fn votes(&self) -> u32 {
            self.votes
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn item(title: &'static str, category: &'static str, day: u32, priority: Priority, votes: u32) -> Item {
        Item {
            title,
            category,
            tags: vec!["Students".into()],
            day,
            priority,
            votes,
            expiry: None,
        }
    }

    fn sample() -> Vec<Item> {
        vec![
            item("Slow Wi-Fi", "Infrastructure", 3, Priority::Low, 4),
            item("Cold food", "Cafeteria", 9, Priority::High, 10),
            item("Broken lamp", "Infrastructure", 9, Priority::Medium, 10),
            item("Noisy wifi router", "Dormitory", 1, Priority::High, 0),
        ]
    }

    #[test]
    fn test_search_case_insensitive() {
        let items = sample();
        let view = filter(&items, &Criteria::new().search("WIFI"), date(10));
        let titles: Vec<_> = view.iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["Noisy wifi router"]);
    }

    #[test]
    fn test_category_exact_match() {
        let items = sample();
        let view = filter(&items, &Criteria::new().category("Infrastructure"), date(10));
        assert_eq!(view.len(), 2);
        assert!(view.iter().all(|i| i.category == "Infrastructure"));
    }

    #[test]
    fn test_all_sentinel_any_case() {
        let items = sample();
        let view = filter(&items, &Criteria::new().category("all").status("All"), date(10));
        assert_eq!(view.len(), items.len());
    }

    #[test]
    fn test_absent_facet_ignored() {
        let items = sample();
        let view = filter(&items, &Criteria::new().location("Library"), date(10));
        assert_eq!(view.len(), items.len());
    }

    #[test]
    fn test_audience_membership() {
        let mut items = sample();
        items[1].tags = vec!["Faculty".into(), "Staff".into()];
        let view = filter(&items, &Criteria::new().audience("Staff"), date(10));
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Cold food");
    }

    #[test]
    fn test_date_ranges() {
        let items = sample();
        let today = filter(&items, &Criteria::new().date_range(DateRange::Today), date(9));
        assert_eq!(today.len(), 2);
        let week = filter(&items, &Criteria::new().date_range(DateRange::Week), date(9));
        assert_eq!(week.len(), 3);
    }

    #[test]
    fn test_week_reaches_back_seven_days() {
        let items = sample();
        let week = filter(&items, &Criteria::new().date_range(DateRange::Week), date(10));
        let titles: Vec<_> = week.iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["Slow Wi-Fi", "Cold food", "Broken lamp"]);
        let week = filter(&items, &Criteria::new().date_range(DateRange::Week), date(11));
        assert!(week.iter().all(|i| i.title != "Slow Wi-Fi"));
    }

    #[test]
    fn test_expired_hidden_unless_requested() {
        let mut items = sample();
        items[0].expiry = Some(date(5));
        items[1].expiry = Some(date(10));
        let hidden = filter(&items, &Criteria::new(), date(10));
        assert_eq!(hidden.len(), 3);
        assert!(hidden.iter().all(|i| i.title != "Slow Wi-Fi"));
        let shown = filter(&items, &Criteria::new().show_expired(true), date(10));
        assert_eq!(shown.len(), 4);
    }

    #[test]
    fn test_sort_by_date_is_stable() {
        let items = sample();
        let view = query(&items, &Criteria::new(), Some(SortKey::Date), date(10));
        let titles: Vec<_> = view.iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["Cold food", "Broken lamp", "Slow Wi-Fi", "Noisy wifi router"]);
    }

    #[test]
    fn test_sort_by_priority() {
        let items = sample();
        let view = query(&items, &Criteria::new(), Some(SortKey::Priority), date(10));
        let ranks: Vec<_> = view.iter().map(|i| i.priority).collect();
        assert_eq!(
            ranks,
            vec![Priority::High, Priority::High, Priority::Medium, Priority::Low]
        );
        assert_eq!(view[0].title, "Cold food");
    }

    #[test]
    fn test_sort_by_votes() {
        let items = sample();
        let view = query(&items, &Criteria::new(), Some(SortKey::Votes), date(10));
        let votes: Vec<_> = view.iter().map(|i| i.votes).collect();
        assert_eq!(votes, vec![10, 10, 4, 0]);
        assert_eq!(view[0].title, "Cold food");
    }

    #[test]
    fn test_facet_options_data_driven() {
        let items = sample();
        assert_eq!(
            facet_options(&items, Facet::Category),
            vec!["All", "Infrastructure", "Cafeteria", "Dormitory"]
        );
        assert_eq!(facet_options(&items, Facet::Location), vec!["All"]);
        assert_eq!(priority_options(), vec!["All", "Low", "Medium", "High"]);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(SortKey::parse("likes"), Some(SortKey::Votes));
        assert_eq!(SortKey::parse("Priority"), Some(SortKey::Priority));
        assert_eq!(SortKey::parse("alphabetical"), None);
    }
}
