//! Goalbot Core - shared library for the goal-tracking services.
//!
//! This crate provides:
//! - Domain and wire models plus the Redis key/stream contract
//! - `RedisBus` and typed cache accessors over the shared Redis instance
//! - The NHL api-web client (schedule, game log, standings, boxscore,
//!   play-by-play, roster, player landing)
//! - The scoring-probability estimator (heuristic factors, logistic
//!   sub-model, market blend, calibration scale)
//! - Roster name matching for goalie normalization

pub mod clients;
pub mod config;
pub mod matching;
pub mod models;
pub mod probability;
pub mod redis;
