//! Persistence layer for the recipe API: SeaORM entities plus the identity
//! operations (email normalization, password hashing, token issuance) that
//! sit directly on top of them.

pub mod entities;
pub mod identity;
