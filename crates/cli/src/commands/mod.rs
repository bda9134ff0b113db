//! CLI Commands

pub mod events;
pub mod graph;
pub mod layout;
pub mod scope;
