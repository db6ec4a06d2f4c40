use std::collections::HashSet;

use accessmgmt_domain::MatchKey;
use uuid::Uuid;

/// Why a staged batch had to be written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushReason {
    /// The incoming row touches a match key that is already staged.
    DuplicateKey,
    /// The incoming row was performed by a different actor.
    ActorChanged,
    /// The page is exhausted.
    EndOfPage,
}

impl FlushReason {
    /// Returns stable label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateKey => "duplicate_key",
            Self::ActorChanged => "actor_changed",
            Self::EndOfPage => "end_of_page",
        }
    }
}

/// Rows drained from a batch, written under one audit context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRows<T> {
    /// Actor every row was performed by.
    pub actor: Uuid,
    /// Rows to merge on their match key.
    pub merges: Vec<T>,
    /// Rows to remove by their match key.
    pub removals: Vec<T>,
}

/// Pending mutations sharing one actor, at most one per match key.
#[derive(Debug)]
pub struct StagedBatch<T: MatchKey> {
    actor: Option<Uuid>,
    merges: Vec<T>,
    removals: Vec<T>,
    keys: HashSet<T::Key>,
}

impl<T: MatchKey> Default for StagedBatch<T> {
    fn default() -> Self {
        Self {
            actor: None,
            merges: Vec::new(),
            removals: Vec::new(),
            keys: HashSet::new(),
        }
    }
}

impl<T: MatchKey> StagedBatch<T> {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns why `row` cannot join the batch, if it cannot.
    #[must_use]
    pub fn flush_reason(&self, actor: Uuid, row: &T) -> Option<FlushReason> {
        if self.keys.contains(&row.match_key()) {
            return Some(FlushReason::DuplicateKey);
        }
        if self.actor.is_some_and(|staged| staged != actor) {
            return Some(FlushReason::ActorChanged);
        }
        None
    }

    /// Stages a merge. Returns the row back when it must wait for a flush.
    pub fn stage_merge(&mut self, actor: Uuid, row: T) -> Result<(), (FlushReason, T)> {
        if let Err(reason) = self.admit(actor, &row) {
            return Err((reason, row));
        }
        self.merges.push(row);
        Ok(())
    }

    /// Stages a removal. Returns the row back when it must wait for a flush.
    pub fn stage_removal(&mut self, actor: Uuid, row: T) -> Result<(), (FlushReason, T)> {
        if let Err(reason) = self.admit(actor, &row) {
            return Err((reason, row));
        }
        self.removals.push(row);
        Ok(())
    }

    /// Returns the number of staged rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.merges.len() + self.removals.len()
    }

    /// Returns whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties the batch, returning staged rows when there are any.
    pub fn drain(&mut self) -> Option<StagedRows<T>> {
        let actor = self.actor.take()?;
        self.keys.clear();
        Some(StagedRows {
            actor,
            merges: std::mem::take(&mut self.merges),
            removals: std::mem::take(&mut self.removals),
        })
    }

    fn admit(&mut self, actor: Uuid, row: &T) -> Result<(), FlushReason> {
        if let Some(reason) = self.flush_reason(actor, row) {
            return Err(reason);
        }
        self.actor = Some(actor);
        self.keys.insert(row.match_key());
        Ok(())
    }
}
