use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::model::item::{BoardItem, Priority};

/// Column definition as configured: id is the status value items carry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnSpec {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: String,
    pub title: String,
    /// Ordered membership. Position is authoritative and only changes via
    /// `move_item`; nothing re-sorts by priority or date.
    pub item_ids: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum MoveError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

/// Receipt for one optimistic move: pre-move snapshots of both affected
/// columns plus a per-item sequence number. Settling a move (commit or
/// rollback) only takes effect while its sequence is still the latest issued
/// for that item, so a stale response can never clobber a newer move.
#[derive(Debug, Clone)]
pub struct MoveTicket {
    item_id: String,
    dest_column: String,
    seq: u64,
    prior_status: String,
    snapshots: Vec<(usize, Vec<String>)>,
}

impl MoveTicket {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn dest_column(&self) -> &str {
        &self.dest_column
    }
}

#[derive(Debug)]
pub enum MoveOutcome {
    /// Nothing changed: same position, or the item was not where the caller
    /// said it was.
    NoOp,
    Moved(MoveTicket),
}

/// Read-only render-time filter. Never touches column membership or status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardFilter {
    pub text: String,
    pub min_priority: Option<Priority>,
}

impl BoardFilter {
    pub fn is_active(&self) -> bool {
        !self.text.trim().is_empty() || self.min_priority.is_some()
    }

    fn matches(&self, item: &BoardItem) -> bool {
        if let Some(min) = self.min_priority {
            if item.priority < min {
                return false;
            }
        }
        let needle = self.text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        item.title.to_lowercase().contains(&needle)
            || item
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
            || item
                .assignee
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(&needle))
            || item.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

/// Client-side view of the board: fixed ordered columns partitioning the item
/// set. Every item id lives in exactly one column's list at all times.
#[derive(Debug)]
pub struct BoardState {
    columns: Vec<Column>,
    items: HashMap<String, BoardItem>,
    latest_seq: HashMap<String, u64>,
    next_seq: u64,
}

impl BoardState {
    /// Partition `items` into `specs` by matching status to column id. An
    /// unknown status is not an error: the item lands in the first column and
    /// its local status is rewritten to that column's id.
    pub fn new(specs: &[ColumnSpec], items: Vec<BoardItem>) -> Self {
        let mut columns: Vec<Column> = specs
            .iter()
            .map(|s| Column {
                id: s.id.clone(),
                title: s.title.clone(),
                item_ids: Vec::new(),
            })
            .collect();
        let mut map = HashMap::new();

        for mut item in items {
            if columns.is_empty() {
                break;
            }
            let idx = columns
                .iter()
                .position(|c| c.id == item.status)
                .unwrap_or(0);
            if columns[idx].id != item.status {
                item.status = columns[idx].id.clone();
            }
            columns[idx].item_ids.push(item.id.clone());
            map.insert(item.id.clone(), item);
        }

        Self {
            columns,
            items: map,
            latest_seq: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn item(&self, id: &str) -> Option<&BoardItem> {
        self.items.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Optimistic move: splice the item out of `source`, rewrite its status,
    /// insert at `dest_index` (clamped) in `dest`. Returns synchronously,
    /// before any persistence; the returned ticket settles the move later.
    pub fn move_item(
        &mut self,
        item_id: &str,
        source: &str,
        dest: &str,
        dest_index: usize,
    ) -> Result<MoveOutcome, MoveError> {
        let dest_idx = self
            .columns
            .iter()
            .position(|c| c.id == dest)
            .ok_or_else(|| MoveError::UnknownColumn(dest.to_string()))?;

        // An unknown source column means the item cannot be where the caller
        // claims, which is defined as a no-op rather than an error.
        let Some(src_idx) = self.columns.iter().position(|c| c.id == source) else {
            return Ok(MoveOutcome::NoOp);
        };
        let Some(pos) = self.columns[src_idx]
            .item_ids
            .iter()
            .position(|id| id == item_id)
        else {
            return Ok(MoveOutcome::NoOp);
        };

        let mut snapshots = vec![(src_idx, self.columns[src_idx].item_ids.clone())];
        if dest_idx != src_idx {
            snapshots.push((dest_idx, self.columns[dest_idx].item_ids.clone()));
        }

        self.columns[src_idx].item_ids.remove(pos);
        let insert_at = dest_index.min(self.columns[dest_idx].item_ids.len());
        self.columns[dest_idx]
            .item_ids
            .insert(insert_at, item_id.to_string());

        if src_idx == dest_idx && self.columns[src_idx].item_ids == snapshots[0].1 {
            return Ok(MoveOutcome::NoOp);
        }

        let prior_status = match self.items.get_mut(item_id) {
            Some(item) => {
                let prior = item.status.clone();
                item.status = self.columns[dest_idx].id.clone();
                prior
            }
            None => source.to_string(),
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_seq.insert(item_id.to_string(), seq);

        Ok(MoveOutcome::Moved(MoveTicket {
            item_id: item_id.to_string(),
            dest_column: dest.to_string(),
            seq,
            prior_status,
            snapshots,
        }))
    }

    fn is_latest(&self, ticket: &MoveTicket) -> bool {
        self.latest_seq.get(&ticket.item_id) == Some(&ticket.seq)
    }

    /// Persistence succeeded. The optimistic state is already correct, so
    /// this only retires the ticket. Returns false for a stale ticket.
    pub fn commit_move(&mut self, ticket: &MoveTicket) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.latest_seq.remove(&ticket.item_id);
        true
    }

    /// Persistence failed: restore both affected columns wholesale and the
    /// item's prior status. A stale ticket is discarded without touching
    /// state ("last user intent wins"). Returns whether the rollback applied.
    pub fn rollback_move(&mut self, ticket: &MoveTicket) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        for (idx, snapshot) in &ticket.snapshots {
            self.columns[*idx].item_ids = snapshot.clone();
        }
        if let Some(item) = self.items.get_mut(&ticket.item_id) {
            item.status = ticket.prior_status.clone();
        }
        self.latest_seq.remove(&ticket.item_id);
        true
    }

    /// Render-time view: each column paired with the items the filter keeps,
    /// in column order. Membership is untouched.
    pub fn filtered(&self, filter: &BoardFilter) -> Vec<(&Column, Vec<&BoardItem>)> {
        self.columns
            .iter()
            .map(|col| {
                let visible = col
                    .item_ids
                    .iter()
                    .filter_map(|id| self.items.get(id))
                    .filter(|item| filter.matches(item))
                    .collect();
                (col, visible)
            })
            .collect()
    }
}
