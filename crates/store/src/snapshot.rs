//! Snapshots periódicos do mapa chave → valor.
//!
//! Layout do arquivo (registros etiquetados com prefixo de tamanho):
//!
//! ```text
//! [magic: 4B "SQSN"][versão: 1B][count: u32]
//! [registros...]
//! [crc32 dos registros: u32]
//! ```
//!
//! Cada registro: `[key][tag: 1B][payload do tipo]`, onde strings são
//! `[len: u32][bytes]`. Tags: 0=string, 1=lista, 2=hash. A ordem de
//! recência não é serializada; na restauração as chaves entram pela
//! frente da lista em ordem de iteração.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use chrono::Utc;
use tokio::fs;
use tokio::time::interval;
use tracing::{info, warn};

use squall_common::SnapshotError;

use crate::entry::{Entry, Value};
use crate::store::Store;

const MAGIC: &[u8; 4] = b"SQSN";
const VERSION: u8 = 1;

const TAG_STR: u8 = 0;
const TAG_LIST: u8 = 1;
const TAG_HASH: u8 = 2;

const FILE_PREFIX: &str = "cache_data";
const FILE_EXT: &str = "snap";

/// Worker de persistência: a cada intervalo grava um snapshot novo no
/// diretório de backups e poda os antigos, mantendo os N mais recentes.
pub(crate) struct SnapshotWorker {
    store: Store,
}

impl SnapshotWorker {
    pub(crate) fn spawn(store: Store) {
        tokio::spawn(SnapshotWorker { store }.run());
    }

    async fn run(self) {
        let config = self.store.config().clone();
        let mut tick = interval(config.backup_interval);
        // o primeiro tick dispara imediato; backup só depois do intervalo
        tick.tick().await;

        loop {
            tick.tick().await;

            match self.store.write_snapshot(&config.backups_dir).await {
                Ok(path) => info!("backup criado: {}", path.display()),
                Err(e) => warn!("erro criando backup: {e}"),
            }

            if let Err(e) = prune_backups(&config.backups_dir, config.backup_number).await {
                warn!("erro podando backups antigos: {e}");
            }
        }
    }
}

impl Store {
    /// Grava um snapshot do mapa de valores num arquivo novo com nome
    /// timestampado, criando o diretório se preciso. O encoding roda sob
    /// o lock compartilhado; a escrita em disco, fora dele.
    pub async fn write_snapshot(&self, dir: &Path) -> Result<PathBuf, SnapshotError> {
        let image = {
            let state = self.shared.state.read().await;
            encode(&state.values)
        };

        fs::create_dir_all(dir).await?;
        let name = format!(
            "{FILE_PREFIX}{}.{FILE_EXT}",
            Utc::now().format("%Y%m%d%H%M%S")
        );
        let path = dir.join(name);
        fs::write(&path, &image).await?;

        Ok(path)
    }

    /// Restaura um snapshot: os valores voltam exatos, a recência é
    /// reiniciada (cada chave entra pela frente em ordem de iteração).
    pub async fn restore_from(&self, path: &Path) -> Result<usize, SnapshotError> {
        let data = fs::read(path).await?;
        let entries = decode(&data)?;
        let count = entries.len();

        let mut state = self.shared.state.write().await;
        for (key, value) in entries {
            if state.values.contains_key(&key) {
                let _ = state.remove(&key);
            }
            state.insert(key, value);
        }
        drop(state);

        info!("restauradas {count} chaves do backup {}", path.display());
        Ok(count)
    }
}

/// Apaga os snapshots mais antigos, mantendo os `keep` mais recentes.
/// O timestamp no nome ordena lexicograficamente.
pub(crate) async fn prune_backups(dir: &Path, keep: usize) -> std::io::Result<()> {
    let mut reader = match fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let suffix = format!(".{FILE_EXT}");
    let mut names = Vec::new();
    while let Some(dirent) = reader.next_entry().await? {
        let name = dirent.file_name().to_string_lossy().into_owned();
        if name.starts_with(FILE_PREFIX) && name.ends_with(&suffix) {
            names.push(name);
        }
    }

    if names.len() <= keep {
        return Ok(());
    }
    names.sort_unstable();

    for name in &names[..names.len() - keep] {
        if let Err(e) = fs::remove_file(dir.join(name)).await {
            warn!("não removeu backup obsoleto {name}: {e}");
        }
    }

    Ok(())
}

fn encode(values: &HashMap<String, Entry>) -> BytesMut {
    let mut body = BytesMut::new();
    for (key, entry) in values {
        put_str(&mut body, key);
        match &entry.value {
            Value::Str(s) => {
                body.put_u8(TAG_STR);
                put_str(&mut body, s);
            }
            Value::List(items) => {
                body.put_u8(TAG_LIST);
                body.put_u32(items.len() as u32);
                for item in items {
                    put_str(&mut body, item);
                }
            }
            Value::Hash(map) => {
                body.put_u8(TAG_HASH);
                body.put_u32(map.len() as u32);
                for (field, value) in map {
                    put_str(&mut body, field);
                    put_str(&mut body, value);
                }
            }
        }
    }

    let mut image = BytesMut::with_capacity(body.len() + 13);
    image.put_slice(MAGIC);
    image.put_u8(VERSION);
    image.put_u32(values.len() as u32);
    let crc = crc32fast::hash(&body);
    image.extend_from_slice(&body);
    image.put_u32(crc);

    image
}

fn decode(data: &[u8]) -> Result<Vec<(String, Value)>, SnapshotError> {
    if data.len() < 13 {
        return Err(SnapshotError::Truncated);
    }
    if &data[..4] != MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    if data[4] != VERSION {
        return Err(SnapshotError::BadVersion(data[4]));
    }

    let count = u32::from_be_bytes([data[5], data[6], data[7], data[8]]) as usize;
    let body = &data[9..data.len() - 4];
    let stored_crc = {
        let tail = &data[data.len() - 4..];
        u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]])
    };
    if crc32fast::hash(body) != stored_crc {
        return Err(SnapshotError::BadChecksum);
    }

    let mut reader = Reader { data: body, pos: 0 };
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let key = reader.get_str()?;
        let value = match reader.get_u8()? {
            TAG_STR => Value::Str(reader.get_str()?),
            TAG_LIST => {
                let n = reader.get_u32()? as usize;
                let mut items = Vec::with_capacity(n);
                for _ in 0..n {
                    items.push(reader.get_str()?);
                }
                Value::List(items)
            }
            TAG_HASH => {
                let n = reader.get_u32()? as usize;
                let mut map = HashMap::with_capacity(n);
                for _ in 0..n {
                    let field = reader.get_str()?;
                    let value = reader.get_str()?;
                    map.insert(field, value);
                }
                Value::Hash(map)
            }
            tag => return Err(SnapshotError::BadTag(tag)),
        };
        entries.push((key, value));
    }

    Ok(entries)
}

fn put_str(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

/// Cursor de leitura sobre o corpo do snapshot.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn get_u8(&mut self) -> Result<u8, SnapshotError> {
        let byte = *self.data.get(self.pos).ok_or(SnapshotError::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    fn get_u32(&mut self) -> Result<u32, SnapshotError> {
        let end = self.pos + 4;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(SnapshotError::Truncated)?;
        self.pos = end;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn get_str(&mut self) -> Result<String, SnapshotError> {
        let len = self.get_u32()? as usize;
        let end = self.pos + len;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(SnapshotError::Truncated)?;
        self.pos = end;
        String::from_utf8(bytes.to_vec()).map_err(|_| SnapshotError::Truncated)
    }
}
