#![forbid(unsafe_code)]

mod pool;
mod proxy;
mod ring;
mod watcher;

pub use pool::{ConnFactory, ConnFuture, Pool};
pub use proxy::{BackendConn, handle_proxy_connection};
pub use ring::{Backend, Ring};
pub use watcher::{load_backends, watch_backends};
