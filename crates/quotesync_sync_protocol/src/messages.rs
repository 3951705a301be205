//! Wire messages exchanged with the remote.

use crate::error::{ProtocolError, ProtocolResult};
use quotesync_core::{Quote, QuoteId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A message carried as a JSON body.
pub trait WireMessage: Serialize + DeserializeOwned {
    /// Encodes to a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a valid message.
    fn decode(body: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// The remote's current quote list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Quotes as the server holds them.
    pub quotes: Vec<Quote>,
}

impl FetchResponse {
    /// Creates a fetch response.
    pub fn new(quotes: Vec<Quote>) -> Self {
        Self { quotes }
    }
}

impl WireMessage for FetchResponse {}

/// Local changes sent to the remote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRequest {
    /// Quotes to upsert on the server.
    pub quotes: Vec<Quote>,
}

impl PushRequest {
    /// Creates a push request.
    pub fn new(quotes: Vec<Quote>) -> Self {
        Self { quotes }
    }

    /// Returns true if there is nothing to push.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl WireMessage for PushRequest {}

/// The remote's acknowledgement of a push.
///
/// A server that keeps a newer copy of a pushed quote rejects it and lists
/// its id in `rejected`. Quotes not listed were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResponse {
    /// How many quotes the server accepted.
    pub accepted: usize,
    /// Ids of pushed quotes the server did not apply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<QuoteId>,
}

impl PushResponse {
    /// Creates a push response with nothing rejected.
    pub fn new(accepted: usize) -> Self {
        Self {
            accepted,
            rejected: Vec::new(),
        }
    }

    /// Creates a push response that rejects `rejected`.
    pub fn with_rejected(accepted: usize, rejected: Vec<QuoteId>) -> Self {
        Self { accepted, rejected }
    }

    /// Quotes of `request` the server applied, in request order.
    pub fn applied<'a>(&self, request: &'a PushRequest) -> Vec<&'a Quote> {
        let rejected: HashSet<&QuoteId> = self.rejected.iter().collect();
        request
            .quotes
            .iter()
            .filter(|q| !rejected.contains(&q.id))
            .collect()
    }

    /// Checks this response against the request it answers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMessage` if more quotes were accepted and rejected
    /// than sent, or if a rejected id was never pushed.
    pub fn check(&self, request: &PushRequest) -> ProtocolResult<()> {
        let sent = request.quotes.len();
        if self.accepted + self.rejected.len() > sent {
            return Err(ProtocolError::invalid(format!(
                "accepted {} and rejected {} of {} pushed quotes",
                self.accepted,
                self.rejected.len(),
                sent
            )));
        }
        if let Some(unknown) = self
            .rejected
            .iter()
            .find(|id| !request.quotes.iter().any(|q| q.id == **id))
        {
            return Err(ProtocolError::invalid(format!(
                "rejected quote {unknown} was not pushed"
            )));
        }
        Ok(())
    }
}

impl WireMessage for PushResponse {}
