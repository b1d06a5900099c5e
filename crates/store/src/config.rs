use std::path::PathBuf;
use std::time::Duration;

use squall_common::{
    BACKUP_INTERVAL_SECS, BACKUP_NUMBER, BACKUPS_DIR, CLEANUP_INTERVAL_SECS,
    DEFAULT_EXPIRATION_SECS, EVICT_BATCH, MAX_MEMORY_BYTES, MEMORY_CHECK_INTERVAL_SECS,
    TTL_CHANNEL_CAPACITY,
};

/// Tunables da engine e dos workers de fundo. Os defaults vêm de
/// squall-common; testes encurtam os intervalos.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL aplicado pelo SET sem argumento de expiração, em segundos.
    pub default_expiration: i64,
    /// Intervalo da varredura de chaves expiradas.
    pub cleanup_interval: Duration,
    /// Capacidade do canal de eventos de TTL.
    pub ttl_channel_capacity: usize,
    /// Intervalo entre snapshots de persistência.
    pub backup_interval: Duration,
    /// Quantos snapshots recentes manter no diretório.
    pub backup_number: usize,
    /// Diretório onde os snapshots são gravados.
    pub backups_dir: PathBuf,
    /// Limite de memória do processo, em bytes.
    pub max_memory: u64,
    /// Intervalo de checagem de memória residente.
    pub memory_check_interval: Duration,
    /// Quantas chaves da cauda LRU remover por ciclo de pressão.
    pub evict_batch: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_expiration: DEFAULT_EXPIRATION_SECS,
            cleanup_interval: Duration::from_secs(CLEANUP_INTERVAL_SECS),
            ttl_channel_capacity: TTL_CHANNEL_CAPACITY,
            backup_interval: Duration::from_secs(BACKUP_INTERVAL_SECS),
            backup_number: BACKUP_NUMBER,
            backups_dir: PathBuf::from(BACKUPS_DIR),
            max_memory: MAX_MEMORY_BYTES,
            memory_check_interval: Duration::from_secs(MEMORY_CHECK_INTERVAL_SECS),
            evict_batch: EVICT_BATCH,
        }
    }
}
