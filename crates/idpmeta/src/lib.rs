//! `idpmeta` enriches assertions flowing through a federation proxy with
//! descriptive facts about the issuing identity provider (display name,
//! entity ID, organization names), sourced from the IdP's published
//! federation metadata.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod metadata;
pub mod store;
pub mod text;
