//! Desk operations: the mutations every record store supports.
//!
//! The free functions are pure: they take the current collection and return
//! the next one (`None` when the call changes nothing). `RecordStore` pairs a
//! collection with its storage key and writes the whole collection back
//! exactly once per successful mutation.

use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::errors::{DeskError, Result};
use crate::kinds::{OccupantDraft, Room, Visitor};
use crate::query::{self, Criteria, Facet, Queryable, SortKey};
use crate::record::{next_id, Comment, Lifecycle, Pinnable, Record, RecordId, Stamp, StatusFlow, Threaded, Votable};
use crate::session::Session;
use crate::storage::{load_collection, save_collection, KvStore, Origin};

/// Desk operation codes, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeskOp {
    Create,
    Vote,
    Comment,
    TogglePin,
    AdvanceStatus,
    CheckOut,
    Allocate,
    Deallocate,
}

// ─── Pure collection transforms ───────────────────────────────────────────

/// Clone `records`, then apply `f` to the one with `id`. `None` if there
/// is no such record or `f` reports no change.
fn update<R: Record>(records: &[R], id: RecordId, f: impl FnOnce(&mut R) -> bool) -> Option<Vec<R>> {
    let index = records.iter().position(|r| r.id() == id)?;
    let mut next = records.to_vec();
    f(&mut next[index]).then_some(next)
}

/// CREATE: validate the draft, assign `max(id) + 1`, prepend.
pub fn create<R: Record>(records: &[R], draft: R::Draft, stamp: &Stamp) -> Result<Vec<R>> {
    let id = next_id(records.iter().map(Record::id))?;
    let record = R::from_draft(draft, id, stamp)?;
    let mut next = Vec::with_capacity(records.len() + 1);
    next.push(record);
    next.extend_from_slice(records);
    Ok(next)
}

/// VOTE: one more vote (or like). Unknown ids change nothing.
pub fn vote<R: Votable>(records: &[R], id: RecordId) -> Option<Vec<R>> {
    update(records, id, |r| {
        r.add_vote();
        true
    })
}

/// COMMENT: append to the record's thread. Blank text changes nothing.
pub fn add_comment<R: Threaded>(
    records: &[R],
    id: RecordId,
    text: &str,
    stamp: &Stamp,
) -> Result<Option<Vec<R>>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let Some(parent) = records.iter().find(|r| r.id() == id) else {
        return Ok(None);
    };
    let comment = Comment {
        id: next_id(parent.comments().iter().map(|c| c.id))?,
        author: stamp.author.clone(),
        text: text.to_string(),
        date: R::posted(stamp.now),
        is_official: stamp.official,
    };
    Ok(update(records, id, |r| {
        r.comments_mut().push(comment);
        true
    }))
}

/// TOGGLE: flip the pinned flag.
pub fn toggle_pin<R: Pinnable>(records: &[R], id: RecordId) -> Option<Vec<R>> {
    update(records, id, |r| {
        r.set_pinned(!r.is_pinned());
        true
    })
}

/// ADVANCE: move a record's status strictly forward.
pub fn advance_status<R: Lifecycle>(
    records: &[R],
    id: RecordId,
    next: R::Status,
    today: NaiveDate,
) -> Result<Option<Vec<R>>> {
    let Some(current) = records.iter().find(|r| r.id() == id) else {
        return Ok(None);
    };
    let from = current.status();
    if next.stage() <= from.stage() {
        return Err(DeskError::InvalidTransition {
            from: from.name().to_string(),
            to: next.name().to_string(),
        });
    }
    Ok(update(records, id, |r| {
        r.enter_status(next, today);
        true
    }))
}

/// CHECK OUT: close an open visit at `now`.
pub fn check_out(visitors: &[Visitor], id: RecordId, now: NaiveDateTime) -> Option<Vec<Visitor>> {
    update(visitors, id, |v| v.check_out(now))
}

/// ALLOCATE: house a student in a room with a free bed.
pub fn allocate(rooms: &[Room], room_id: RecordId, draft: OccupantDraft, today: NaiveDate) -> Result<Vec<Room>> {
    let occupant = draft.into_occupant(today)?;
    let index = rooms
        .iter()
        .position(|r| r.id == room_id)
        .ok_or(DeskError::RoomNotFound(room_id))?;
    if !rooms[index].has_space() {
        return Err(DeskError::Capacity {
            room_id,
            capacity: rooms[index].capacity,
        });
    }
    if rooms.iter().any(|r| r.houses(&occupant.id)) {
        return Err(DeskError::missing("studentId"));
    }
    let mut next = rooms.to_vec();
    next[index].admit(occupant)?;
    Ok(next)
}

/// DEALLOCATE: remove a student from a room. `None` if they were not there.
pub fn deallocate(rooms: &[Room], room_id: RecordId, student_id: &str) -> Result<Option<Vec<Room>>> {
    if !rooms.iter().any(|r| r.id == room_id) {
        return Err(DeskError::RoomNotFound(room_id));
    }
    Ok(update(rooms, room_id, |r| r.release(student_id)))
}

// ─── Record store ─────────────────────────────────────────────────────────

/// What every store is constructed with: the acting session and a clock.
#[derive(Clone)]
pub struct DeskContext {
    pub session: Rc<Session>,
    pub clock: Rc<dyn Clock>,
}

impl DeskContext {
    pub fn new(session: Session, clock: impl Clock + 'static) -> Self {
        Self {
            session: Rc::new(session),
            clock: Rc::new(clock),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn stamp(&self) -> Stamp {
        self.session.stamp(self.clock.now())
    }
}

/// One entity kind's collection, kept in sync with its storage key.
pub struct RecordStore<R: Record, K: KvStore> {
    kv: K,
    records: Vec<R>,
    ctx: DeskContext,
}

impl<R: Record, K: KvStore> RecordStore<R, K> {
    /// Load the stored collection, or the seed collection. Never fails.
    pub fn open(kv: K, ctx: DeskContext) -> Self {
        let (records, origin) = load_collection(&kv, R::STORAGE_KEY, R::seed);
        info!(
            kind = R::KIND,
            count = records.len(),
            seeded = origin == Origin::Seed,
            "record store opened"
        );
        Self { kv, records, ctx }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn context(&self) -> &DeskContext {
        &self.ctx
    }

    pub fn storage(&self) -> &K {
        &self.kv
    }

    /// Persist `next`, then make it current. A failed write leaves the
    /// current collection as it was.
    fn commit(&mut self, op: DeskOp, next: Vec<R>) -> Result<()> {
        save_collection(&mut self.kv, R::STORAGE_KEY, &next)?;
        debug!(kind = R::KIND, ?op, count = next.len(), "mutation committed");
        self.records = next;
        Ok(())
    }

    /// Commit `next` if there is one. Returns whether anything changed.
    fn apply(&mut self, op: DeskOp, next: Option<Vec<R>>) -> Result<bool> {
        match next {
            Some(next) => {
                self.commit(op, next)?;
                Ok(true)
            }
            None => {
                debug!(kind = R::KIND, ?op, "no-op mutation");
                Ok(false)
            }
        }
    }

    /// Create a record from a submitted form. Returns its id.
    pub fn create(&mut self, draft: R::Draft) -> Result<RecordId> {
        let next = create(&self.records, draft, &self.ctx.stamp())?;
        let id = next[0].id();
        self.commit(DeskOp::Create, next)?;
        Ok(id)
    }
}

impl<R: Record + Queryable, K: KvStore> RecordStore<R, K> {
    /// The filtered, optionally sorted view as of today.
    pub fn query(&self, criteria: &Criteria, sort: Option<SortKey>) -> Vec<&R> {
        query::query(&self.records, criteria, sort, self.ctx.today())
    }

    pub fn facet_options(&self, facet: Facet) -> Vec<String> {
        query::facet_options(&self.records, facet)
    }
}

impl<R: Votable, K: KvStore> RecordStore<R, K> {
    pub fn vote(&mut self, id: RecordId) -> Result<bool> {
        let next = vote(&self.records, id);
        self.apply(DeskOp::Vote, next)
    }
}

impl<R: Threaded, K: KvStore> RecordStore<R, K> {
    pub fn add_comment(&mut self, id: RecordId, text: &str) -> Result<bool> {
        let next = add_comment(&self.records, id, text, &self.ctx.stamp())?;
        self.apply(DeskOp::Comment, next)
    }
}

impl<R: Pinnable, K: KvStore> RecordStore<R, K> {
    pub fn toggle_pin(&mut self, id: RecordId) -> Result<bool> {
        let next = toggle_pin(&self.records, id);
        self.apply(DeskOp::TogglePin, next)
    }
}

impl<R: Lifecycle, K: KvStore> RecordStore<R, K> {
    pub fn advance_status(&mut self, id: RecordId, next: R::Status) -> Result<bool> {
        let next = advance_status(&self.records, id, next, self.ctx.today())?;
        self.apply(DeskOp::AdvanceStatus, next)
    }
}

impl<K: KvStore> RecordStore<Visitor, K> {
    pub fn check_out(&mut self, id: RecordId) -> Result<bool> {
        let next = check_out(&self.records, id, self.ctx.now());
        self.apply(DeskOp::CheckOut, next)
    }

    /// Visitors still on the premises.
    pub fn on_premises(&self) -> Vec<&Visitor> {
        self.records.iter().filter(|v| v.is_checked_in()).collect()
    }
}

impl<K: KvStore> RecordStore<Room, K> {
    pub fn allocate(&mut self, room_id: RecordId, draft: OccupantDraft) -> Result<()> {
        let next = allocate(&self.records, room_id, draft, self.ctx.today())?;
        self.commit(DeskOp::Allocate, next)
    }

    /// Confirmation happens before this call; the operation itself does not ask.
    pub fn deallocate(&mut self, room_id: RecordId, student_id: &str) -> Result<bool> {
        let next = deallocate(&self.records, room_id, student_id)?;
        self.apply(DeskOp::Deallocate, next)
    }

    /// Rooms with at least one free bed, for the allocation form.
    pub fn with_space(&self) -> Vec<&Room> {
        self.records.iter().filter(|r| r.has_space()).collect()
    }
}
