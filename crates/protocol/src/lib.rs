#![forbid(unsafe_code)]

mod connection;
mod request;

pub use connection::Connection;
pub use request::Request;
