//! Teamchat Realtime - presence tracking and event fan-out for team chat.
//!
//! Tracks which users are connected, which rooms each connection has
//! joined, and which users are subscribed to which channels. Business
//! services push events to users, workspaces and channels through the
//! dispatcher; members who are not online fall back to unread counts and
//! a queued notification.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
