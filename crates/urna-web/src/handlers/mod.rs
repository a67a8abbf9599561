pub mod admin;
pub mod results;
pub mod session;
pub mod vote;
