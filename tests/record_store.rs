//! End-to-end behavior of the record stores over real backends.

use hostel_desk::kinds::{
    Complaint, ComplaintDraft, ComplaintStatus, MaintenanceDraft, MaintenanceRequest, MaintenanceStatus, Notice,
    NoticeDraft, OccupantDraft, Room, RoomDraft, RoomStatus, Visitor, VisitorDraft,
};
use hostel_desk::operations::{DeskContext, RecordStore};
use hostel_desk::query::{Criteria, DateRange, Facet, Scope, SortKey};
use hostel_desk::record::{Priority, Record};
use hostel_desk::session::Session;
use hostel_desk::storage::{FileKv, KvStore, MemoryKv, SharedKv, SqliteKv};
use hostel_desk::{DeskError, FixedClock};

fn ctx() -> DeskContext {
    DeskContext::new(Session::default(), FixedClock::at(2025, 5, 12, 9).unwrap())
}

fn ctx_on(year: i32, month: u32, day: u32) -> DeskContext {
    DeskContext::new(Session::default(), FixedClock::at(year, month, day, 9).unwrap())
}

fn leaky_pipe(description: &str) -> ComplaintDraft {
    ComplaintDraft {
        title: "Leaky pipe".into(),
        description: description.into(),
        ..Default::default()
    }
}

#[test]
fn create_then_reload_from_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desk.db");

    let id = {
        let mut store: RecordStore<Complaint, _> = RecordStore::open(SqliteKv::create(&path).unwrap(), ctx());
        let previous_max = store.records().iter().map(|c| c.id).max().unwrap();
        let id = store.create(leaky_pipe("Second floor washroom")).unwrap();
        assert_eq!(id, previous_max + 1);
        id
    };

    let store: RecordStore<Complaint, _> = RecordStore::open(SqliteKv::open(&path).unwrap(), ctx());
    assert_eq!(store.len(), 6);
    assert_eq!(store.records()[0].id, id);
    assert_eq!(store.records()[0].title, "Leaky pipe");
    assert_eq!(store.records().iter().filter(|c| c.id == id).count(), 1);
}

#[test]
fn create_then_reload_from_files() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store: RecordStore<Visitor, _> = RecordStore::open(FileKv::new(dir.path()).unwrap(), ctx());
        store
            .create(VisitorDraft {
                name: "Jane Doe".into(),
                host: "Reception".into(),
                ..Default::default()
            })
            .unwrap();
    }
    let store: RecordStore<Visitor, _> = RecordStore::open(FileKv::new(dir.path()).unwrap(), ctx());
    assert_eq!(store.len(), 4);
    assert_eq!(store.records()[0].id, 4);
    assert!(store.records()[0].is_checked_in());
}

#[test]
fn first_record_in_empty_collection_gets_id_one() {
    let mut kv = MemoryKv::new();
    kv.put(Complaint::STORAGE_KEY, "[]").unwrap();
    let mut store: RecordStore<Complaint, _> = RecordStore::open(kv, ctx());
    assert!(store.is_empty());
    assert_eq!(store.create(leaky_pipe("Kitchen")).unwrap(), 1);
}

#[test]
fn malformed_storage_falls_back_to_seed() {
    let mut kv = MemoryKv::new();
    kv.put(Notice::STORAGE_KEY, "{\"broken\":").unwrap();
    let store: RecordStore<Notice, _> = RecordStore::open(kv, ctx());
    assert_eq!(store.records(), &Notice::seed()[..]);
}

#[test]
fn vote_twice_and_unknown_id() {
    let mut store: RecordStore<Complaint, _> = RecordStore::open(MemoryKv::new(), ctx());
    let before = store.get(2).unwrap().votes;
    store.vote(2).unwrap();
    store.vote(2).unwrap();
    assert_eq!(store.get(2).unwrap().votes, before + 2);

    let snapshot = store.records().to_vec();
    assert!(!store.vote(999).unwrap());
    assert_eq!(store.records(), &snapshot[..]);
}

#[test]
fn single_criterion_filters_exactly() {
    let store: RecordStore<Complaint, _> = RecordStore::open(MemoryKv::new(), ctx());
    for category in store.facet_options(Facet::Category).iter().skip(1) {
        let criteria = Criteria::new().status("All").category(category);
        let view = store.query(&criteria, None);
        let expected = store.records().iter().filter(|c| &c.category == category).count();
        assert_eq!(view.len(), expected);
        assert!(view.iter().all(|c| &c.category == category));
    }

    let high = store.query(&Criteria::new().status("All").priority("High"), None);
    assert_eq!(high.len(), 3);
    assert!(high.iter().all(|c| c.priority == Priority::High));
}

#[test]
fn priority_sort_puts_high_first() {
    let mut kv = MemoryKv::new();
    let seed = Complaint::seed();
    let trio: Vec<Complaint> = [Priority::Low, Priority::High, Priority::Medium]
        .into_iter()
        .zip(seed)
        .map(|(priority, mut c)| {
            c.priority = priority;
            c
        })
        .collect();
    kv.put(Complaint::STORAGE_KEY, &serde_json::to_string(&trio).unwrap()).unwrap();

    let store: RecordStore<Complaint, _> = RecordStore::open(kv, ctx());
    let sorted: Vec<Priority> = store
        .query(&Criteria::new(), Some(SortKey::Priority))
        .iter()
        .map(|c| c.priority)
        .collect();
    assert_eq!(sorted, vec![Priority::High, Priority::Medium, Priority::Low]);
}

#[test]
fn room_status_follows_occupants() {
    let mut store: RecordStore<Room, _> = RecordStore::open(MemoryKv::new(), ctx());
    let room_id = store
        .create(RoomDraft {
            kind: "Double AC".into(),
            capacity: 2,
            amenities: vec!["AC".into()],
        })
        .unwrap();
    assert_eq!(room_id, 104);
    assert_eq!(store.get(room_id).unwrap().status(), RoomStatus::Available);

    for (id, name) in [("S201", "Asha"), ("S202", "Bilal")] {
        store
            .allocate(
                room_id,
                OccupantDraft {
                    student_id: id.into(),
                    student_name: name.into(),
                    ..Default::default()
                },
            )
            .unwrap();
    }
    assert_eq!(store.get(room_id).unwrap().status(), RoomStatus::Occupied);

    let third = store.allocate(
        room_id,
        OccupantDraft {
            student_id: "S203".into(),
            student_name: "Chen".into(),
            ..Default::default()
        },
    );
    assert!(matches!(third, Err(DeskError::Capacity { capacity: 2, .. })));

    assert!(store.deallocate(room_id, "S201").unwrap());
    assert_eq!(store.get(room_id).unwrap().status(), RoomStatus::PartiallyOccupied);
    assert!(store.deallocate(room_id, "S202").unwrap());
    assert_eq!(store.get(room_id).unwrap().status(), RoomStatus::Available);
}

#[test]
fn missing_description_writes_nothing() {
    let kv = SharedKv::new(MemoryKv::new());
    let mut store: RecordStore<Complaint, _> = RecordStore::open(kv.clone(), ctx());
    let before = store.records().to_vec();

    let err = store.create(leaky_pipe("")).unwrap_err();
    assert!(matches!(err, DeskError::Validation { field: "description" }));
    assert_eq!(store.records(), &before[..]);
    assert_eq!(kv.with(|inner| inner.writes()), 0);
}

#[test]
fn expired_notice_hidden_unless_requested() {
    let mut store: RecordStore<Notice, _> = RecordStore::open(MemoryKv::new(), ctx_on(2024, 2, 1));
    let id = store
        .create(NoticeDraft {
            title: "Winter break".into(),
            content: "Hostel closes for two weeks".into(),
            expiry: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        })
        .unwrap();

    let hidden = store.query(&Criteria::new().show_expired(false), None);
    assert!(hidden.iter().all(|n| n.id != id));
    let shown = store.query(&Criteria::new().show_expired(true), None);
    assert!(shown.iter().any(|n| n.id == id));
}

#[test]
fn whitespace_comment_is_noop() {
    let kv = SharedKv::new(MemoryKv::new());
    let mut store: RecordStore<Notice, _> = RecordStore::open(kv.clone(), ctx());
    let count = store.get(1).unwrap().comments.len();
    assert!(!store.add_comment(1, "   \n\t").unwrap());
    assert_eq!(store.get(1).unwrap().comments.len(), count);
    assert_eq!(kv.with(|inner| inner.writes()), 0);
}

#[test]
fn notice_scopes() {
    let mut store: RecordStore<Notice, _> = RecordStore::open(MemoryKv::new(), ctx());
    let mine = store
        .create(NoticeDraft {
            title: "Water supply".into(),
            content: "No water 2-4 PM".into(),
            category: "Maintenance".into(),
            audience: vec!["Students".into()],
            ..Default::default()
        })
        .unwrap();

    let authored = store.query(
        &Criteria::new().show_expired(true).scope(Scope::AuthoredBy("Admin User".into())),
        None,
    );
    assert_eq!(authored.len(), 1);
    assert_eq!(authored[0].id, mine);

    store.toggle_pin(mine).unwrap();
    let pinned = store.query(&Criteria::new().show_expired(true).scope(Scope::Pinned), None);
    let ids: Vec<_> = pinned.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![mine, 1]);
}

#[test]
fn maintenance_lifecycle() {
    let mut store: RecordStore<MaintenanceRequest, _> = RecordStore::open(MemoryKv::new(), ctx());
    let id = store
        .create(MaintenanceDraft {
            title: "Fuse box sparks".into(),
            description: "Ground floor corridor".into(),
            location: "Block B".into(),
            priority: Priority::High,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(store.get(id).unwrap().status, MaintenanceStatus::Open);

    store.advance_status(id, MaintenanceStatus::Scheduled).unwrap();
    let today = chrono::NaiveDate::from_ymd_opt(2025, 5, 12);
    assert_eq!(store.get(id).unwrap().scheduled_date, today);

    assert!(matches!(
        store.advance_status(id, MaintenanceStatus::Open),
        Err(DeskError::InvalidTransition { .. })
    ));

    store.advance_status(id, MaintenanceStatus::Resolved).unwrap();
    let done = store.get(id).unwrap();
    assert_eq!(done.status, MaintenanceStatus::Resolved);
    assert_eq!(done.completed_date, today);

    let located = store.query(&Criteria::new().location("Block B"), None);
    assert_eq!(located.len(), 1);
}

#[test]
fn complaint_date_range_and_search() {
    let mut store: RecordStore<Complaint, _> = RecordStore::open(MemoryKv::new(), ctx_on(2025, 4, 28));
    store.create(leaky_pipe("Mess hall sink")).unwrap();

    let today = store.query(&Criteria::new().date_range(DateRange::Today), None);
    assert_eq!(today.len(), 2);

    let week = store.query(&Criteria::new().date_range(DateRange::Week), None);
    assert_eq!(week.len(), 5);

    let search = store.query(&Criteria::new().search("WI-FI"), None);
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].status, ComplaintStatus::InProgress);
}

#[test]
fn visitor_check_out_once() {
    let kv = SharedKv::new(MemoryKv::new());
    let mut store: RecordStore<Visitor, _> = RecordStore::open(kv.clone(), ctx());
    assert_eq!(store.on_premises().len(), 1);
    assert!(store.check_out(2).unwrap());
    assert!(!store.check_out(2).unwrap());
    assert!(store.on_premises().is_empty());
    assert_eq!(kv.with(|inner| inner.writes()), 1);
}

#[test]
fn exhausted_id_space_is_an_error() {
    let mut kv = MemoryKv::new();
    let mut stored = Complaint::seed();
    stored[0].id = u64::MAX;
    kv.put(Complaint::STORAGE_KEY, &serde_json::to_string(&stored).unwrap()).unwrap();
    let kv = SharedKv::new(kv);

    let mut store: RecordStore<Complaint, _> = RecordStore::open(kv.clone(), ctx());
    let before = store.records().to_vec();
    assert!(matches!(store.create(leaky_pipe("Basement")), Err(DeskError::Storage(_))));
    assert_eq!(store.records(), &before[..]);
    assert_eq!(kv.with(|inner| inner.writes()), 1);
}

#[test]
fn exhausted_comment_ids_are_an_error() {
    let mut kv = MemoryKv::new();
    let mut stored = Complaint::seed();
    stored[0].comments[1].id = u64::MAX;
    kv.put(Complaint::STORAGE_KEY, &serde_json::to_string(&stored).unwrap()).unwrap();

    let mut store: RecordStore<Complaint, _> = RecordStore::open(kv, ctx());
    let id = store.records()[0].id;
    assert!(matches!(store.add_comment(id, "Me too"), Err(DeskError::Storage(_))));
    assert_eq!(store.get(id).unwrap().comments.len(), 2);
}

#[test]
fn notice_comment_timestamps_survive_a_write() {
    let kv = SharedKv::new(MemoryKv::new());
    kv.clone()
        .put(
            Notice::STORAGE_KEY,
            r#"[{"id":1,"title":"Power outage","content":"Labs closed","category":"Maintenance",
                "priority":"High","audience":["Students"],"author":"Facilities","date":"2025-05-05",
                "pinned":true,"likes":2,
                "comments":[{"id":1,"user":"Alex","text":"Backup power?","date":"2025-05-05T10:30:00"}]}]"#,
        )
        .unwrap();

    let mut store: RecordStore<Notice, _> = RecordStore::open(kv.clone(), ctx());
    store.vote(1).unwrap();
    store.add_comment(1, "Yes, for essential systems").unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&kv.get(Notice::STORAGE_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(saved[0]["comments"][0]["date"], "2025-05-05T10:30:00");
    assert_eq!(saved[0]["comments"][1]["date"], "2025-05-12T09:00:00");
}
