//! Dashboard client: pagination state, column rendering and the HTTP source
//! the list view pulls pages from.

pub mod columns;
pub mod list;
pub mod session;
pub mod source;
