#![forbid(unsafe_code)]

mod error;

pub use error::*;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9443;
pub const DEFAULT_PROXY_PORT: u16 = 10000;
pub const MAX_CONNECTIONS: usize = 1024;
pub const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024; // 4 KB
pub const MAX_LINE_SIZE: usize = 64 * 1024; // 64 KB

// Defaults da engine de armazenamento.
pub const DEFAULT_EXPIRATION_SECS: i64 = 1800;
pub const CLEANUP_INTERVAL_SECS: u64 = 5;
pub const TTL_CHANNEL_CAPACITY: usize = 15;

// Defaults de persistência e de pressão de memória.
pub const BACKUP_INTERVAL_SECS: u64 = 300;
pub const BACKUP_NUMBER: usize = 2;
pub const BACKUPS_DIR: &str = ".backups";
pub const MAX_MEMORY_BYTES: u64 = 5_000_000;
pub const MEMORY_CHECK_INTERVAL_SECS: u64 = 5;
pub const EVICT_BATCH: usize = 20;

// Defaults do proxy.
pub const DEFAULT_POOL_SIZE: usize = 10;
