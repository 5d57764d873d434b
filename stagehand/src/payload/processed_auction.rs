//! Processed auction stage carrier: the parsed OpenRTB bid request.
//!
//! Unlike the body carriers, mutations here are typed against known
//! bid-request sub-paths, so a hook cannot produce a structurally invalid
//! request. Updates create the `user` object when it is absent; deletes of
//! absent fields are benign misses.

use super::{MutationError, MutationKind, PayloadMutation, StagePayload};
use crate::openrtb::{BidRequest, User};
use crate::stage::Stage;

/// The parsed bid request handed to processed-auction hooks.
#[derive(Debug, Clone)]
pub struct ProcessedAuctionPayload {
    /// The request tree; mutated in place.
    pub bid_request: BidRequest,
}

/// Mutations legal at the processed auction stage.
#[derive(Debug, Clone, PartialEq)]
pub enum BidRequestMutation {
    /// Set `user.id`.
    SetUserId(String),
    /// Clear `user.id`.
    DeleteUserId,
    /// Set `user.yob`.
    SetUserYob(i64),
    /// Clear `user.yob`.
    DeleteUserYob,
    /// Set `user.consent`.
    SetUserConsent(String),
    /// Clear `user.consent`.
    DeleteUserConsent,
}

impl PayloadMutation for BidRequestMutation {
    fn kind(&self) -> MutationKind {
        match self {
            BidRequestMutation::SetUserId(_)
            | BidRequestMutation::SetUserYob(_)
            | BidRequestMutation::SetUserConsent(_) => MutationKind::Update,
            BidRequestMutation::DeleteUserId
            | BidRequestMutation::DeleteUserYob
            | BidRequestMutation::DeleteUserConsent => MutationKind::Delete,
        }
    }

    fn key(&self) -> String {
        let field = match self {
            BidRequestMutation::SetUserId(_) | BidRequestMutation::DeleteUserId => "user.id",
            BidRequestMutation::SetUserYob(_) | BidRequestMutation::DeleteUserYob => "user.yob",
            BidRequestMutation::SetUserConsent(_) | BidRequestMutation::DeleteUserConsent => {
                "user.consent"
            }
        };
        format!("bidRequest.{field}")
    }
}

impl StagePayload for ProcessedAuctionPayload {
    type Mutation = BidRequestMutation;

    const STAGE: Stage = Stage::ProcessedAuctionRequest;

    fn apply(&mut self, mutation: &BidRequestMutation) -> Result<(), MutationError> {
        let request = &mut self.bid_request;
        match mutation {
            BidRequestMutation::SetUserId(id) => {
                user_mut(request).id = Some(id.clone());
                Ok(())
            }
            BidRequestMutation::DeleteUserId => {
                clear_user_field(request, |user| user.id.take().map(|_| ()))
            }
            BidRequestMutation::SetUserYob(yob) => {
                user_mut(request).yob = Some(*yob);
                Ok(())
            }
            BidRequestMutation::DeleteUserYob => {
                clear_user_field(request, |user| user.yob.take().map(|_| ()))
            }
            BidRequestMutation::SetUserConsent(consent) => {
                user_mut(request).consent = Some(consent.clone());
                Ok(())
            }
            BidRequestMutation::DeleteUserConsent => {
                clear_user_field(request, |user| user.consent.take().map(|_| ()))
            }
        }
    }
}

fn user_mut(request: &mut BidRequest) -> &mut User {
    request.user.get_or_insert_with(User::default)
}

fn clear_user_field(
    request: &mut BidRequest,
    clear: impl FnOnce(&mut User) -> Option<()>,
) -> Result<(), MutationError> {
    request
        .user
        .as_mut()
        .and_then(clear)
        .ok_or(MutationError::KeyNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ProcessedAuctionPayload {
        ProcessedAuctionPayload {
            bid_request: BidRequest {
                id: "some-id".to_string(),
                user: Some(User {
                    id: Some("user-id".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_set_user_fields() {
        let mut payload = payload();
        payload.apply(&BidRequestMutation::SetUserYob(2000)).unwrap();
        payload
            .apply(&BidRequestMutation::SetUserConsent("true".to_string()))
            .unwrap();

        let user = payload.bid_request.user.unwrap();
        assert_eq!(user.yob, Some(2000));
        assert_eq!(user.consent, Some("true".to_string()));
        assert_eq!(user.id, Some("user-id".to_string()));
    }

    #[test]
    fn test_set_creates_user_when_absent() {
        let mut payload = ProcessedAuctionPayload {
            bid_request: BidRequest::default(),
        };
        payload.apply(&BidRequestMutation::SetUserYob(1990)).unwrap();
        assert_eq!(payload.bid_request.user.unwrap().yob, Some(1990));
    }

    #[test]
    fn test_delete_user_field() {
        let mut payload = payload();
        payload.apply(&BidRequestMutation::DeleteUserId).unwrap();
        assert_eq!(payload.bid_request.user.unwrap().id, None);
    }

    #[test]
    fn test_delete_absent_field_is_reported() {
        let mut payload = payload();
        let err = payload.apply(&BidRequestMutation::DeleteUserYob).unwrap_err();
        assert_eq!(err, MutationError::KeyNotFound);

        let mut payload = ProcessedAuctionPayload {
            bid_request: BidRequest::default(),
        };
        let err = payload
            .apply(&BidRequestMutation::DeleteUserConsent)
            .unwrap_err();
        assert_eq!(err, MutationError::KeyNotFound);
    }

    #[test]
    fn test_audit_keys() {
        assert_eq!(
            BidRequestMutation::SetUserYob(2000).key(),
            "bidRequest.user.yob"
        );
        assert_eq!(
            BidRequestMutation::DeleteUserConsent.key(),
            "bidRequest.user.consent"
        );
        assert_eq!(
            BidRequestMutation::SetUserYob(2000).kind(),
            MutationKind::Update
        );
        assert_eq!(
            BidRequestMutation::DeleteUserId.kind(),
            MutationKind::Delete
        );
    }
}
