pub mod requests;
pub mod trips;
pub mod users;
