//! Pointer input normalization.
//!
//! The host coalesces multi-pointer motion into batches: zero or more
//! historical snapshots gathered since the last delivery, then the current
//! state. `normalize` flattens a batch into plain per-pointer samples in
//! chronological order so the engine never has to understand batching.

use std::collections::HashSet;

use crate::time;

// Raw action words as the host reports them.
pub const ACTION_DOWN: i32 = 0;
pub const ACTION_UP: i32 = 1;
pub const ACTION_MOVE: i32 = 2;
pub const ACTION_POINTER_DOWN: i32 = 5;
pub const ACTION_POINTER_UP: i32 = 6;
pub const ACTION_MASK: i32 = 0xff;
pub const ACTION_POINTER_INDEX_MASK: i32 = 0xff00;
pub const ACTION_POINTER_INDEX_SHIFT: i32 = 8;

/// What a single pointer did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Move,
    Up,
}

/// One pointer state at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub pointer_id: i32,
    pub x: f32,
    pub y: f32,
    /// When the pointer was at (x, y), host uptime milliseconds.
    pub event_time_ms: i64,
    /// When the sample left the bridge, same clock base.
    pub delivery_time_ms: i64,
    pub kind: TouchAction,
}

/// Coordinates of every batch pointer at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub event_time_ms: i64,
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
}

/// One host motion delivery: coalesced history plus the current state.
#[derive(Clone, Debug, PartialEq)]
pub struct InputBatch {
    /// Raw action word: transition kind plus an encoded pointer index for
    /// the secondary-pointer variants.
    pub action: i32,
    /// Stable ids, indexed like the snapshot coordinate arrays.
    pub pointer_ids: Vec<i32>,
    /// Oldest first.
    pub history: Vec<Snapshot>,
    pub current: Snapshot,
}

/// Decoded transition carried by a batch action word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BatchAction {
    Down,
    PointerDown(usize),
    Move,
    PointerUp(usize),
    Up,
}

impl BatchAction {
    fn decode(action: i32) -> Option<Self> {
        let index = ((action & ACTION_POINTER_INDEX_MASK) >> ACTION_POINTER_INDEX_SHIFT) as usize;
        match action & ACTION_MASK {
            ACTION_DOWN => Some(BatchAction::Down),
            ACTION_UP => Some(BatchAction::Up),
            ACTION_MOVE => Some(BatchAction::Move),
            ACTION_POINTER_DOWN => Some(BatchAction::PointerDown(index)),
            ACTION_POINTER_UP => Some(BatchAction::PointerUp(index)),
            _ => None,
        }
    }
}

/// Flatten a batch into per-pointer samples, oldest snapshot first.
///
/// Down and Up implicate one pointer (the encoded index for the secondary
/// variants, index 0 otherwise); Move implicates every pointer in batch
/// index order. Every sample keeps its snapshot's event time and carries a
/// freshly sampled delivery time, so replayed history stays datable while
/// the engine can still measure staleness. Malformed batches (no pointers,
/// an unrecognized action, a pointer index out of range, coordinate arrays
/// disagreeing with the pointer count) yield no samples.
pub fn normalize(batch: &InputBatch) -> Vec<PointerSample> {
    normalize_with(batch, time::uptime_millis)
}

/// `normalize` with an injectable delivery clock, sampled once per emitted
/// sample.
pub fn normalize_with(batch: &InputBatch, mut now: impl FnMut() -> i64) -> Vec<PointerSample> {
    let pointer_count = batch.pointer_ids.len();
    if pointer_count == 0 {
        return Vec::new();
    }
    let action = match BatchAction::decode(batch.action) {
        Some(action) => action,
        None => {
            log::debug!("normalize: unrecognized action {:#x}", batch.action);
            return Vec::new();
        }
    };
    if let BatchAction::PointerDown(index) | BatchAction::PointerUp(index) = action {
        if index >= pointer_count {
            log::warn!(
                "normalize: pointer index {} out of range for {} pointers",
                index,
                pointer_count
            );
            return Vec::new();
        }
    }
    let sized_ok =
        |snapshot: &Snapshot| snapshot.xs.len() == pointer_count && snapshot.ys.len() == pointer_count;
    if !sized_ok(&batch.current) || !batch.history.iter().all(sized_ok) {
        log::warn!("normalize: snapshot sizes disagree with pointer count, dropping batch");
        return Vec::new();
    }

    let per_snapshot = match action {
        BatchAction::Move => pointer_count,
        _ => 1,
    };
    let mut samples = Vec::with_capacity((batch.history.len() + 1) * per_snapshot);
    for snapshot in &batch.history {
        emit(&mut samples, batch, snapshot, action, &mut now);
    }
    emit(&mut samples, batch, &batch.current, action, &mut now);
    samples
}

fn emit(
    out: &mut Vec<PointerSample>,
    batch: &InputBatch,
    snapshot: &Snapshot,
    action: BatchAction,
    now: &mut impl FnMut() -> i64,
) {
    match action {
        BatchAction::Down => out.push(sample(batch, snapshot, 0, TouchAction::Down, now())),
        BatchAction::PointerDown(index) => {
            out.push(sample(batch, snapshot, index, TouchAction::Down, now()))
        }
        BatchAction::Move => {
            for index in 0..batch.pointer_ids.len() {
                out.push(sample(batch, snapshot, index, TouchAction::Move, now()));
            }
        }
        BatchAction::PointerUp(index) => {
            out.push(sample(batch, snapshot, index, TouchAction::Up, now()))
        }
        BatchAction::Up => out.push(sample(batch, snapshot, 0, TouchAction::Up, now())),
    }
}

fn sample(
    batch: &InputBatch,
    snapshot: &Snapshot,
    index: usize,
    kind: TouchAction,
    delivery_time_ms: i64,
) -> PointerSample {
    PointerSample {
        pointer_id: batch.pointer_ids[index],
        x: snapshot.xs[index],
        y: snapshot.ys[index],
        event_time_ms: snapshot.event_time_ms,
        delivery_time_ms,
        kind,
    }
}

/// Pointer ids currently held down within a session.
///
/// Down registers an id, Up releases it. The coordinator uses the set to
/// drop Move and Up samples for pointers it never saw go down, and drains
/// it to cancel in-flight gestures when the application pauses.
#[derive(Debug, Default)]
pub struct DownedPointers {
    downed: HashSet<i32>,
}

impl DownedPointers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pointer as down. False when it already was.
    pub fn press(&mut self, pointer_id: i32) -> bool {
        self.downed.insert(pointer_id)
    }

    /// Release a pointer. False when it was not down.
    pub fn release(&mut self, pointer_id: i32) -> bool {
        self.downed.remove(&pointer_id)
    }

    pub fn is_down(&self, pointer_id: i32) -> bool {
        self.downed.contains(&pointer_id)
    }

    pub fn is_empty(&self) -> bool {
        self.downed.is_empty()
    }

    /// Remove and return every downed pointer, in no particular order.
    pub fn drain(&mut self) -> Vec<i32> {
        self.downed.drain().collect()
    }

    pub fn clear(&mut self) {
        self.downed.clear();
    }
}
