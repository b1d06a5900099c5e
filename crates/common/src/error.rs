/// Erros da engine de armazenamento.
///
/// O texto de exibição é contrato de wire: o endpoint escreve
/// `err.to_string()` como linha de resposta, então as mensagens
/// ficam estáveis e em inglês.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no such command")]
    NoSuchCommand,
    #[error("wrong number of arguments")]
    ArgumentNumber,
    #[error("no such item")]
    NoItem,
    #[error("ttl should be a number")]
    TtlFormat,
    #[error("ttl should be >= 0")]
    TtlValue,
    #[error("index should be a number")]
    IndexFormat,
    #[error("index out of range")]
    IndexRange,
    #[error("not a string")]
    NotString,
    #[error("not a list")]
    NotList,
    #[error("not a hash")]
    NotHash,
    #[error("no such key in the hash")]
    NoHashKey,
}

/// Erros de conexão TCP.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("conexão resetada pelo peer")]
    ConnectionReset,
    #[error("linha excede o tamanho máximo ({0} bytes)")]
    LineTooLarge(usize),
    #[error("linha com encoding inválido")]
    InvalidEncoding,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Erros de leitura/escrita de snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("arquivo de snapshot truncado")]
    Truncated,
    #[error("magic inválido no snapshot")]
    BadMagic,
    #[error("versão de snapshot não suportada: {0}")]
    BadVersion(u8),
    #[error("checksum do snapshot não confere")]
    BadChecksum,
    #[error("tag de valor desconhecida: {0:#x}")]
    BadTag(u8),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}
