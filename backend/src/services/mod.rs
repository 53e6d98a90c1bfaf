pub mod auth;
pub mod budget;
pub mod expenses;
pub mod households;
pub mod keep_alive;
pub mod reports;
pub mod users;
