//! Glue around the BVote voting contract.
//!
//! The server half ([`routes`], [`resolver`]) looks a voter up in MongoDB,
//! finds the relayer account for their constituency and tells the client how
//! to reach the contract. The [`client`] half hashes credentials, sends the
//! contract calls from that relayer and renders what comes back.
//!
//! Registration, login, vote counting and access control all live in the
//! contract itself.

pub mod artifacts;
pub mod client;
pub mod config;
pub mod error;
pub mod hashing;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod state;
pub mod store;
