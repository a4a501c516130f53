// src/services/mod.rs
//
// Workflows that touch more than one table run inside a single transaction here.

pub mod bids;
pub mod moderation;
pub mod notify;
pub mod rating;
