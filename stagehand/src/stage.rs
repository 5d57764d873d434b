//! Stage and entity tags for the hook pipeline.
//!
//! A stage is a named checkpoint in the auction pipeline where hooks may
//! run. The tag strings defined here appear verbatim in outcome records and
//! reject-error messages, so they are part of the observable contract.

use serde::Serialize;

/// Endpoint handled by the OpenRTB auction entrypoint.
pub const ENDPOINT_AUCTION: &str = "/openrtb2/auction";

/// Endpoint handled by the AMP entrypoint.
pub const ENDPOINT_AMP: &str = "/openrtb2/amp";

/// A checkpoint in the auction pipeline.
///
/// Stages run strictly sequentially within a request; each stage carries
/// its own payload type and mutation capability set (see [`crate::payload`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Raw HTTP request, before any parsing of the body.
    Entrypoint,

    /// Unparsed auction request body.
    RawAuctionRequest,

    /// Parsed and validated OpenRTB bid request.
    ProcessedAuctionRequest,
}

impl Stage {
    /// Returns the stage tag as it appears in outcomes and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Entrypoint => "entrypoint",
            Stage::RawAuctionRequest => "raw_auction_request",
            Stage::ProcessedAuctionRequest => "processed_auction_request",
        }
    }

    /// Returns the entity processed at this stage.
    pub fn entity(&self) -> Entity {
        match self {
            Stage::Entrypoint => Entity::HttpRequest,
            Stage::RawAuctionRequest | Stage::ProcessedAuctionRequest => Entity::AuctionRequest,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage was processing, as reported in [`StageOutcome`].
///
/// [`StageOutcome`]: crate::execution::StageOutcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Entity {
    /// The incoming HTTP request (entrypoint stage).
    HttpRequest,

    /// The auction request body, raw or parsed.
    AuctionRequest,
}

impl Entity {
    /// Returns the entity tag as it appears in outcomes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::HttpRequest => "http-request",
            Entity::AuctionRequest => "auction-request",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tags() {
        assert_eq!(Stage::Entrypoint.as_str(), "entrypoint");
        assert_eq!(Stage::RawAuctionRequest.as_str(), "raw_auction_request");
        assert_eq!(
            Stage::ProcessedAuctionRequest.as_str(),
            "processed_auction_request"
        );
    }

    #[test]
    fn test_stage_display_matches_as_str() {
        assert_eq!(format!("{}", Stage::RawAuctionRequest), "raw_auction_request");
    }

    #[test]
    fn test_stage_entities() {
        assert_eq!(Stage::Entrypoint.entity(), Entity::HttpRequest);
        assert_eq!(Stage::RawAuctionRequest.entity(), Entity::AuctionRequest);
        assert_eq!(
            Stage::ProcessedAuctionRequest.entity(),
            Entity::AuctionRequest
        );
    }

    #[test]
    fn test_entity_tags() {
        assert_eq!(Entity::HttpRequest.as_str(), "http-request");
        assert_eq!(Entity::AuctionRequest.as_str(), "auction-request");
    }

    #[test]
    fn test_stage_serializes_to_tag() {
        let json = serde_json::to_string(&Stage::ProcessedAuctionRequest).unwrap();
        assert_eq!(json, "\"processed_auction_request\"");

        let json = serde_json::to_string(&Entity::HttpRequest).unwrap();
        assert_eq!(json, "\"http-request\"");
    }
}
