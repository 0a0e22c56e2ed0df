//! One function per backend endpoint the client uses.

pub mod auth;
pub mod habits;
pub mod moods;
pub mod notes;
pub mod tags;
pub mod tasks;
