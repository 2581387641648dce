//! The desk: all five record stores over one shared backend, plus the
//! session, banner and suggestion panel that sit beside them.

use tracing::info;

use crate::aggregates::{self, DashboardSnapshot, IssueSummary, OccupancyStats, Tally};
use crate::assist::{CompletionClient, SuggestionPanel};
use crate::clock::Clock;
use crate::config::{Backend, DeskConfig};
use crate::errors::Result;
use crate::kinds::{Complaint, MaintenanceRequest, Notice, Room, Visitor};
use crate::operations::{DeskContext, RecordStore};
use crate::session::Session;
use crate::storage::{FileKv, KvStore, MemoryKv, SharedKv, SqliteKv};
use crate::surface::BannerSlot;

/// The backend handle every store of a desk writes through.
pub type DeskKv = SharedKv<Box<dyn KvStore>>;

/// Open the configured backend.
pub fn open_backend(backend: &Backend) -> Result<Box<dyn KvStore>> {
    let kv: Box<dyn KvStore> = match backend {
        Backend::Memory => Box::new(MemoryKv::new()),
        Backend::Sqlite(path) => Box::new(SqliteKv::create(path)?),
        Backend::Files(dir) => Box::new(FileKv::new(dir)?),
    };
    info!(?backend, "storage backend opened");
    Ok(kv)
}

pub struct Desk {
    kv: DeskKv,
    config: DeskConfig,
    ctx: DeskContext,
    pub complaints: RecordStore<Complaint, DeskKv>,
    pub maintenance: RecordStore<MaintenanceRequest, DeskKv>,
    pub notices: RecordStore<Notice, DeskKv>,
    pub visitors: RecordStore<Visitor, DeskKv>,
    pub rooms: RecordStore<Room, DeskKv>,
    pub banner: BannerSlot,
    pub suggestions: SuggestionPanel,
}

impl Desk {
    /// Open the configured backend and load every collection from it.
    pub fn open(config: DeskConfig, clock: impl Clock + 'static) -> Result<Self> {
        let kv = open_backend(&config.backend)?;
        Ok(Self::with_backend(kv, config, clock))
    }

    /// Load every collection from `kv`. The session is read once, here.
    pub fn with_backend(kv: Box<dyn KvStore>, config: DeskConfig, clock: impl Clock + 'static) -> Self {
        let kv = SharedKv::new(kv);
        let ctx = DeskContext::new(Session::load(&kv), clock);
        Self {
            complaints: RecordStore::open(kv.clone(), ctx.clone()),
            maintenance: RecordStore::open(kv.clone(), ctx.clone()),
            notices: RecordStore::open(kv.clone(), ctx.clone()),
            visitors: RecordStore::open(kv.clone(), ctx.clone()),
            rooms: RecordStore::open(kv.clone(), ctx.clone()),
            banner: BannerSlot::new(config.banner_ttl),
            suggestions: SuggestionPanel::new(config.suggestion_sample, config.category_sample),
            kv,
            config,
            ctx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.ctx.session
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn storage(&self) -> &DeskKv {
        &self.kv
    }

    /// Show the outcome of a user action as a banner and hand back its value.
    pub fn report<T>(&mut self, outcome: Result<T>, success: &str) -> Option<T> {
        let now = self.ctx.now();
        match outcome {
            Ok(value) => {
                self.banner.success(success, now);
                Some(value)
            }
            Err(e) => {
                self.banner.error(e.to_string(), now);
                None
            }
        }
    }

    pub fn dashboard(&self) -> DashboardSnapshot {
        aggregates::dashboard_snapshot(
            self.rooms.records(),
            self.complaints.records(),
            self.visitors.records(),
            self.ctx.today(),
        )
    }

    pub fn complaint_summary(&self) -> IssueSummary {
        aggregates::issue_summary(self.complaints.records())
    }

    pub fn maintenance_summary(&self) -> IssueSummary {
        aggregates::issue_summary(self.maintenance.records())
    }

    /// Complaint categories and maintenance types together.
    pub fn issue_categories(&self) -> Tally {
        aggregates::combined_histogram(self.complaints.records(), self.maintenance.records())
    }

    pub fn occupancy(&self) -> OccupancyStats {
        aggregates::occupancy_stats(self.rooms.records())
    }

    /// Ask `client` for suggestions over the current issues.
    pub fn generate_suggestions(&mut self, client: &mut impl CompletionClient) -> Result<()> {
        self.suggestions
            .generate(client, self.complaints.records(), self.maintenance.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::kinds::{ComplaintDraft, OccupantDraft};
    use crate::session::{Profile, Role, CURRENT_USER_KEY};
    use crate::storage::save_value;

    fn clock() -> FixedClock {
        FixedClock::at(2025, 5, 10, 12).unwrap()
    }

    #[test]
    fn test_open_memory_desk_uses_seeds() {
        let desk = Desk::open(DeskConfig::default(), clock()).unwrap();
        assert_eq!(desk.complaints.len(), 5);
        assert_eq!(desk.maintenance.len(), 7);
        assert_eq!(desk.notices.len(), 3);
        assert_eq!(desk.visitors.len(), 3);
        assert_eq!(desk.rooms.len(), 3);
        assert_eq!(desk.session().label(), "Admin User");
    }

    #[test]
    fn test_stores_share_backend() {
        let mut desk = Desk::open(DeskConfig::default(), clock()).unwrap();
        desk.complaints
            .create(ComplaintDraft {
                title: "Noisy fan".into(),
                description: "Room 102".into(),
                ..Default::default()
            })
            .unwrap();
        let keys = desk.storage().keys().unwrap();
        assert_eq!(keys, vec!["complaints"]);
    }

    #[test]
    fn test_session_read_from_backend() {
        let mut kv = MemoryKv::new();
        let warden = Profile {
            name: "Wendy Warden".into(),
            email: "wendy@hostel.com".into(),
            role: Role::Warden,
            picture: None,
        };
        save_value(&mut kv, CURRENT_USER_KEY, &warden).unwrap();
        let mut desk = Desk::with_backend(Box::new(kv), DeskConfig::default(), clock());
        assert_eq!(desk.session().role(), Role::Warden);

        desk.complaints.add_comment(3, "Looking into it").unwrap();
        let comment = &desk.complaints.get(3).unwrap().comments[0];
        assert_eq!(comment.author, "Wendy Warden");
        assert!(comment.is_official);
    }

    #[test]
    fn test_report_sets_banner() {
        let mut desk = Desk::open(DeskConfig::default(), clock()).unwrap();
        let now = clock().0;
        let full = desk.rooms.allocate(
            101,
            OccupantDraft {
                student_id: "S100".into(),
                student_name: "Late Arrival".into(),
                ..Default::default()
            },
        );
        assert_eq!(desk.report(full, "Student allocated"), None);
        let banner = desk.banner.visible(now).unwrap();
        assert!(banner.message.contains("capacity"));
    }

    #[test]
    fn test_summaries() {
        let desk = Desk::open(DeskConfig::default(), clock()).unwrap();
        assert_eq!(desk.complaint_summary().resolved, 1);
        assert_eq!(desk.maintenance_summary().resolved, 2);
        assert_eq!(desk.occupancy().total_beds, 11);
        assert_eq!(desk.dashboard().visitors_today, 2);
        assert_eq!(desk.issue_categories().get("HVAC"), 2);
    }
}
