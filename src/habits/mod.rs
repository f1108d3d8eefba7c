//! Habit tracking domain: models, validation, the pure statistics engine
//! (periods, targets, streaks), and the SQLite-backed stores and services.

pub mod model;
pub mod period;
pub mod service;
pub mod storage;
pub mod streak;
pub mod target;
pub mod validate;
