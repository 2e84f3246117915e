//! Domain model module declarations.

pub mod membership;
pub mod whitelist;
