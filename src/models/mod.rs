pub mod page;
pub mod session;
pub mod trip;
pub mod trip_request;
pub mod user;
