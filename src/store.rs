//! Voter and relayer lookups.
//!
//! Both collections are owned by an external registration process; this
//! crate only ever reads them. Collection names follow the ones the
//! registration tooling writes (`voters`, `relayers`).

use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    options::ClientOptions,
    Client, Collection,
};

use crate::error::StoreError;
use crate::models::{Relayer, Voter};

pub const VOTERS: &str = "voters";
pub const RELAYERS: &str = "relayers";

#[async_trait]
pub trait VoterStore: Send + Sync {
    /// Finds a voter by id, optionally constrained to a constituency.
    async fn find_voter(
        &self,
        voter_id: &str,
        constituency: Option<i64>,
    ) -> Result<Option<Voter>, StoreError>;

    async fn find_relayer(&self, constituency: i64) -> Result<Option<Relayer>, StoreError>;
}

pub struct MongoStore {
    voters: Collection<Voter>,
    relayers: Collection<Relayer>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;
        let db = client.database(database);

        Ok(Self {
            voters: db.collection(VOTERS),
            relayers: db.collection(RELAYERS),
        })
    }
}

fn voter_filter(voter_id: &str, constituency: Option<i64>) -> Document {
    let mut filter = doc! { "voterId": voter_id };
    if let Some(constituency) = constituency {
        filter.insert("constituency", constituency);
    }
    filter
}

#[async_trait]
impl VoterStore for MongoStore {
    async fn find_voter(
        &self,
        voter_id: &str,
        constituency: Option<i64>,
    ) -> Result<Option<Voter>, StoreError> {
        let voter = self
            .voters
            .find_one(voter_filter(voter_id, constituency), None)
            .await?;
        Ok(voter)
    }

    async fn find_relayer(&self, constituency: i64) -> Result<Option<Relayer>, StoreError> {
        let relayer = self
            .relayers
            .find_one(doc! { "constituency": constituency }, None)
            .await?;
        Ok(relayer)
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    voters: Vec<Voter>,
    relayers: Vec<Relayer>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_voter(mut self, voter: Voter) -> Self {
        self.voters.push(voter);
        self
    }

    pub fn with_relayer(mut self, relayer: Relayer) -> Self {
        self.relayers.push(relayer);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl VoterStore for MemoryStore {
    async fn find_voter(
        &self,
        voter_id: &str,
        constituency: Option<i64>,
    ) -> Result<Option<Voter>, StoreError> {
        Ok(self
            .voters
            .iter()
            .find(|v| v.voter_id == voter_id && constituency.map_or(true, |c| v.constituency == c))
            .cloned())
    }

    async fn find_relayer(&self, constituency: i64) -> Result<Option<Relayer>, StoreError> {
        Ok(self
            .relayers
            .iter()
            .find(|r| r.constituency == constituency)
            .cloned())
    }
}
