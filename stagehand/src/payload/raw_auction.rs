//! Raw auction stage carrier: the unparsed request body.

use super::{body, MutationError, MutationKind, PayloadMutation, StagePayload};
use crate::stage::Stage;
use serde_json::Value;

/// The auction request body before OpenRTB parsing.
#[derive(Debug, Clone)]
pub struct RawAuctionPayload {
    /// Raw request body bytes.
    pub body: Vec<u8>,
}

/// Mutations legal at the raw auction stage.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAuctionMutation {
    /// Set a key in the JSON body (dot-separated path).
    SetBodyKey { key: String, value: Value },

    /// Remove a key from the JSON body (dot-separated path).
    DeleteBodyKey { key: String },
}

impl PayloadMutation for RawAuctionMutation {
    fn kind(&self) -> MutationKind {
        match self {
            RawAuctionMutation::SetBodyKey { .. } => MutationKind::Update,
            RawAuctionMutation::DeleteBodyKey { .. } => MutationKind::Delete,
        }
    }

    fn key(&self) -> String {
        match self {
            RawAuctionMutation::SetBodyKey { key, .. }
            | RawAuctionMutation::DeleteBodyKey { key } => format!("body.{key}"),
        }
    }
}

impl StagePayload for RawAuctionPayload {
    type Mutation = RawAuctionMutation;

    const STAGE: Stage = Stage::RawAuctionRequest;

    fn apply(&mut self, mutation: &RawAuctionMutation) -> Result<(), MutationError> {
        match mutation {
            RawAuctionMutation::SetBodyKey { key, value } => {
                self.body = body::set_key(&self.body, key, value)?;
                Ok(())
            }
            RawAuctionMutation::DeleteBodyKey { key } => {
                self.body = body::delete_key(&self.body, key)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_update_and_delete() {
        let mut payload = RawAuctionPayload {
            body: br#"{"name": "John", "last_name": "Doe"}"#.to_vec(),
        };
        payload
            .apply(&RawAuctionMutation::SetBodyKey {
                key: "foo".to_string(),
                value: json!("bar"),
            })
            .unwrap();
        payload
            .apply(&RawAuctionMutation::DeleteBodyKey {
                key: "name".to_string(),
            })
            .unwrap();

        let body: Value = serde_json::from_slice(&payload.body).unwrap();
        assert_eq!(body, json!({"last_name": "Doe", "foo": "bar"}));
    }

    #[test]
    fn test_delete_missing_key() {
        let mut payload = RawAuctionPayload {
            body: b"{}".to_vec(),
        };
        let err = payload
            .apply(&RawAuctionMutation::DeleteBodyKey {
                key: "missing".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, MutationError::KeyNotFound);
    }

    #[test]
    fn test_audit_keys() {
        let mutation = RawAuctionMutation::SetBodyKey {
            key: "ext.prebid.debug".to_string(),
            value: json!(true),
        };
        assert_eq!(mutation.key(), "body.ext.prebid.debug");
        assert_eq!(mutation.kind(), MutationKind::Update);
    }
}
