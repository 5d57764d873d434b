//! Stage payload carriers and their mutation capability sets.
//!
//! Each stage wraps the object hooks may change in a carrier type that
//! exposes only the mutations legal for that stage: the entrypoint carrier
//! allows header, query and body edits; the raw auction carrier allows body
//! edits only; the processed auction carrier allows typed edits on known
//! bid-request sub-paths. Hooks never touch the carrier directly - they
//! return mutation values, and the group runner routes each value back to
//! the carrier's [`StagePayload::apply`] after the hook has finished.

mod body;
mod entrypoint;
mod processed_auction;
mod raw_auction;

pub use entrypoint::{EntrypointMutation, EntrypointPayload};
pub use processed_auction::{BidRequestMutation, ProcessedAuctionPayload};
pub use raw_auction::{RawAuctionMutation, RawAuctionPayload};

use crate::stage::Stage;
use thiserror::Error;

/// Whether a mutation writes a key or removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Set or overwrite the key.
    Update,
    /// Remove the key.
    Delete,
}

impl MutationKind {
    /// Returns the kind tag used in mutation audit messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a mutation could not be applied.
///
/// Mutation failures are never fatal: the group runner records a warning
/// and downgrades the hook's status, then keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The targeted key does not exist (benign miss on delete).
    #[error("key not found")]
    KeyNotFound,

    /// The carried body could not be interpreted as JSON.
    #[error("{0}")]
    InvalidBody(String),

    /// The mutation value is not representable in the payload.
    #[error("{0}")]
    InvalidValue(String),
}

/// A mutation value returned by a hook.
///
/// `key` is the dotted audit path (`header.foo`, `body.user.id`, ...) that
/// appears in outcome debug messages.
pub trait PayloadMutation: Send + Sync + 'static {
    /// The kind of change this mutation performs.
    fn kind(&self) -> MutationKind;

    /// The dotted path of the affected key.
    fn key(&self) -> String;
}

/// A stage's payload carrier.
///
/// Carriers are cheap to clone: every hook in a group receives a clone
/// taken when the group starts, and the group runner applies mutations to
/// the canonical instance afterwards, in plan order.
pub trait StagePayload: Clone + Send + 'static {
    /// The mutation capability set of this stage.
    type Mutation: PayloadMutation;

    /// The stage this payload belongs to.
    const STAGE: Stage;

    /// Applies one mutation, committing immediately.
    ///
    /// Failures leave previously applied mutations in place.
    fn apply(&mut self, mutation: &Self::Mutation) -> Result<(), MutationError>;
}
