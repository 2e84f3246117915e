//! Channel membership policy.
//!
//! A single rule: in a whitelist-governed channel, anyone who is neither on
//! the channel's list nor a bot is removed.

pub mod evaluator;
