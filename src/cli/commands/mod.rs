//! Command implementations

pub mod analysis;
pub mod completions;
pub mod eval;
pub mod init;
pub mod point;
pub mod record;
pub mod reference;
pub mod validate;
