pub mod pagination;
pub mod ride;
pub mod session;
pub mod user;
