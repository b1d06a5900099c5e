use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{RwLock, mpsc};
use tracing::debug;

use squall_common::StoreError;

use crate::config::Config;
use crate::entry::{Entry, Value};
use crate::expiry::{ExpiryWorker, TtlEvent};
use crate::lru::RecencyList;
use crate::memory::MemoryGuard;
use crate::snapshot::SnapshotWorker;

/// Estado guardado pelo lock único da engine: o mapa de valores e a
/// lista de recência são sempre co-mutados sob ele.
pub(crate) struct State {
    pub(crate) values: HashMap<String, Entry>,
    pub(crate) recency: RecencyList,
}

impl State {
    /// Insere chave nova: nó na frente da lista + entrada no mapa.
    pub(crate) fn insert(&mut self, key: String, value: Value) {
        let slot = self.recency.push_front(key.clone());
        self.values.insert(key, Entry::new(value, slot));
    }

    /// Remove a chave dos dois lados.
    pub(crate) fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let entry = self.values.remove(key).ok_or(StoreError::NoItem)?;
        self.recency.remove(entry.slot);
        Ok(())
    }
}

pub(crate) struct Shared {
    pub(crate) state: RwLock<State>,
    ttl_tx: mpsc::Sender<TtlEvent>,
    config: Config,
}

/// Handle para a engine de armazenamento. Clonar é barato; todos os
/// clones veem o mesmo estado.
#[derive(Clone)]
pub struct Store {
    pub(crate) shared: Arc<Shared>,
}

impl Store {
    /// Cria a engine e sobe os workers de fundo: expiração, pressão de
    /// memória e persistência.
    pub fn new(config: Config) -> Self {
        let (ttl_tx, ttl_rx) = mpsc::channel(config.ttl_channel_capacity);

        let store = Store {
            shared: Arc::new(Shared {
                state: RwLock::new(State {
                    values: HashMap::new(),
                    recency: RecencyList::new(),
                }),
                ttl_tx,
                config,
            }),
        };

        ExpiryWorker::spawn(store.clone(), ttl_rx);
        MemoryGuard::spawn(store.clone());
        SnapshotWorker::spawn(store.clone());

        store
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Executa um comando pelo nome (case-insensitive) com os argumentos
    /// dados. Retorna a linha de resposta ou o erro tipado.
    pub async fn exec(&self, command: &str, args: &[String]) -> Result<String, StoreError> {
        match command.to_uppercase().as_str() {
            "SET" => self.set(args).await,
            "GET" => self.get(args).await,
            "SIZE" => self.size(args).await,
            "REMOVE" => self.remove(args).await,
            "REMOVE_BATCH" => self.remove_batch(args).await,
            "KEYS" => self.keys(args).await,
            "TTL" => self.ttl(args).await,
            "LSET" => self.lset(args).await,
            "LPUSH" => self.lpush(args).await,
            "LGET" => self.lget(args).await,
            "HSET" => self.hset(args).await,
            "HGET" => self.hget(args).await,
            _ => Err(StoreError::NoSuchCommand),
        }
    }

    /// Número de chaves vivas.
    pub async fn len(&self) -> usize {
        self.shared.state.read().await.values.len()
    }

    /// Até n chaves a partir da cauda LRU, sem mutar a lista. Usado pelo
    /// guard de memória para montar o lote de despejo.
    pub async fn lru_tail(&self, n: usize) -> Vec<String> {
        let state = self.shared.state.write().await;
        state.recency.tail(n)
    }

    // --- comandos ---

    async fn set(&self, args: &[String]) -> Result<String, StoreError> {
        if args.len() < 2 || args.len() > 3 {
            return Err(StoreError::ArgumentNumber);
        }
        let key = &args[0];
        let value = &args[1];

        let ttl = match args.get(2) {
            Some(raw) => parse_ttl(raw)?,
            None => self.shared.config.default_expiration,
        };

        let mut state = self.shared.state.write().await;

        // SET sempre sobrescreve, inclusive trocando a variante
        let slot = match state.values.get_mut(key) {
            Some(entry) => {
                entry.value = Value::Str(value.clone());
                Some(entry.slot)
            }
            None => None,
        };
        match slot {
            Some(slot) => state.recency.move_to_front(slot),
            None => state.insert(key.clone(), Value::Str(value.clone())),
        }

        self.send_ttl(key, ttl).await;
        Ok("OK".into())
    }

    async fn get(&self, args: &[String]) -> Result<String, StoreError> {
        if args.len() != 1 {
            return Err(StoreError::ArgumentNumber);
        }
        let key = &args[0];

        // lock exclusivo: a leitura promove o item a mais recente
        let mut state = self.shared.state.write().await;

        let (reply, slot) = {
            let entry = state.values.get(key).ok_or(StoreError::NoItem)?;
            match &entry.value {
                Value::Str(s) => (s.clone(), entry.slot),
                _ => return Err(StoreError::NotString),
            }
        };
        state.recency.move_to_front(slot);

        Ok(reply)
    }

    async fn size(&self, args: &[String]) -> Result<String, StoreError> {
        if !args.is_empty() {
            return Err(StoreError::ArgumentNumber);
        }

        let state = self.shared.state.read().await;
        Ok(state.values.len().to_string())
    }

    async fn remove(&self, args: &[String]) -> Result<String, StoreError> {
        if args.len() != 1 {
            return Err(StoreError::ArgumentNumber);
        }
        let key = &args[0];

        let mut state = self.shared.state.write().await;
        state.remove(key)?;
        self.send_event(TtlEvent::Delete { key: key.clone() }).await;

        Ok("OK".into())
    }

    /// Remove várias chaves de uma vez; ausências são silenciosas. Cada
    /// chave processada emite Delete para o índice de TTL acompanhar.
    async fn remove_batch(&self, args: &[String]) -> Result<String, StoreError> {
        let mut state = self.shared.state.write().await;

        for key in args {
            if state.remove(key).is_err() {
                debug!("remove_batch: chave ausente: {key}");
            }
            self.send_event(TtlEvent::Delete { key: key.clone() }).await;
        }

        Ok("OK".into())
    }

    async fn keys(&self, args: &[String]) -> Result<String, StoreError> {
        if !args.is_empty() {
            return Err(StoreError::ArgumentNumber);
        }

        let state = self.shared.state.read().await;
        let keys: Vec<&str> = state.values.keys().map(String::as_str).collect();
        Ok(keys.join(" "))
    }

    /// Atualiza só o índice de TTL, via evento. Não valida a existência
    /// da chave (a varredura descobre) e não toca a recência.
    async fn ttl(&self, args: &[String]) -> Result<String, StoreError> {
        if args.len() != 2 {
            return Err(StoreError::ArgumentNumber);
        }
        let secs = parse_ttl(&args[1])?;

        let _state = self.shared.state.write().await;
        self.send_ttl(&args[0], secs).await;

        Ok("OK".into())
    }

    async fn lset(&self, args: &[String]) -> Result<String, StoreError> {
        if args.len() != 3 {
            return Err(StoreError::ArgumentNumber);
        }
        let key = &args[0];
        let index = parse_index(&args[1])?;
        let value = &args[2];

        let mut state = self.shared.state.write().await;

        let slot = {
            let entry = state.values.get_mut(key).ok_or(StoreError::NoItem)?;
            let Value::List(list) = &mut entry.value else {
                return Err(StoreError::NotList);
            };
            if index >= list.len() {
                return Err(StoreError::IndexRange);
            }
            list[index] = value.clone();
            entry.slot
        };
        state.recency.move_to_front(slot);

        Ok("OK".into())
    }

    async fn lpush(&self, args: &[String]) -> Result<String, StoreError> {
        if args.len() != 2 {
            return Err(StoreError::ArgumentNumber);
        }
        let key = &args[0];
        let value = &args[1];

        let mut state = self.shared.state.write().await;

        let slot = match state.values.get_mut(key) {
            Some(entry) => {
                let Value::List(list) = &mut entry.value else {
                    return Err(StoreError::NotList);
                };
                list.push(value.clone());
                Some(entry.slot)
            }
            None => None,
        };
        match slot {
            Some(slot) => state.recency.move_to_front(slot),
            None => {
                // chave nova vira lista de um elemento, com o TTL default
                state.insert(key.clone(), Value::List(vec![value.clone()]));
                self.send_ttl(key, self.shared.config.default_expiration)
                    .await;
            }
        }

        Ok("OK".into())
    }

    async fn lget(&self, args: &[String]) -> Result<String, StoreError> {
        if args.len() != 2 {
            return Err(StoreError::ArgumentNumber);
        }
        let key = &args[0];
        let index = parse_index(&args[1])?;

        let mut state = self.shared.state.write().await;

        let (reply, slot) = {
            let entry = state.values.get(key).ok_or(StoreError::NoItem)?;
            let Value::List(list) = &entry.value else {
                return Err(StoreError::NotList);
            };
            let value = list.get(index).ok_or(StoreError::IndexRange)?;
            (value.clone(), entry.slot)
        };
        state.recency.move_to_front(slot);

        Ok(reply)
    }

    async fn hset(&self, args: &[String]) -> Result<String, StoreError> {
        if args.len() != 3 {
            return Err(StoreError::ArgumentNumber);
        }
        let key = &args[0];
        let field = &args[1];
        let value = &args[2];

        let mut state = self.shared.state.write().await;

        let slot = match state.values.get_mut(key) {
            Some(entry) => {
                let Value::Hash(hash) = &mut entry.value else {
                    return Err(StoreError::NotHash);
                };
                hash.insert(field.clone(), value.clone());
                Some(entry.slot)
            }
            None => None,
        };
        match slot {
            Some(slot) => state.recency.move_to_front(slot),
            None => {
                let hash = HashMap::from([(field.clone(), value.clone())]);
                state.insert(key.clone(), Value::Hash(hash));
                self.send_ttl(key, self.shared.config.default_expiration)
                    .await;
            }
        }

        Ok("OK".into())
    }

    async fn hget(&self, args: &[String]) -> Result<String, StoreError> {
        if args.len() != 2 {
            return Err(StoreError::ArgumentNumber);
        }
        let key = &args[0];
        let field = &args[1];

        let mut state = self.shared.state.write().await;

        let (reply, slot) = {
            let entry = state.values.get(key).ok_or(StoreError::NoItem)?;
            let Value::Hash(hash) = &entry.value else {
                return Err(StoreError::NotHash);
            };
            let value = hash.get(field).ok_or(StoreError::NoHashKey)?;
            (value.clone(), entry.slot)
        };
        state.recency.move_to_front(slot);

        Ok(reply)
    }

    // --- eventos de TTL ---

    /// Traduz um TTL relativo em evento: 0 é a sentinela "sem expiração"
    /// e limpa o índice; positivo vira instante absoluto.
    async fn send_ttl(&self, key: &str, ttl_secs: i64) {
        let event = if ttl_secs == 0 {
            TtlEvent::Delete {
                key: key.to_string(),
            }
        } else {
            TtlEvent::Set {
                key: key.to_string(),
                at: now_unix() + ttl_secs,
            }
        };
        self.send_event(event).await;
    }

    /// Emite o evento ainda sob o lock do chamador; canal saturado segura
    /// o produtor (backpressure aceita).
    async fn send_event(&self, event: TtlEvent) {
        if self.shared.ttl_tx.send(event).await.is_err() {
            debug!("canal de ttl fechado, evento descartado");
        }
    }
}

/// Faz o parse de um TTL em segundos, validando formato e sinal.
fn parse_ttl(raw: &str) -> Result<i64, StoreError> {
    let ttl: i64 = raw.parse().map_err(|_| StoreError::TtlFormat)?;
    if ttl < 0 {
        return Err(StoreError::TtlValue);
    }
    Ok(ttl)
}

/// Faz o parse de um índice de lista não negativo.
fn parse_index(raw: &str) -> Result<usize, StoreError> {
    let index: i64 = raw.parse().map_err(|_| StoreError::IndexFormat)?;
    usize::try_from(index).map_err(|_| StoreError::IndexRange)
}

/// Segundos desde a época Unix.
pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::new(Config::default())
    }

    async fn exec(store: &Store, command: &str, args: &[&str]) -> Result<String, StoreError> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        store.exec(command, &args).await
    }

    async fn fill(store: &Store, n: usize) {
        for i in 0..n {
            let value = i.to_string();
            exec(store, "SET", &[&format!("key{value}"), &value])
                .await
                .unwrap();
        }
    }

    async fn mru_key(store: &Store) -> Option<String> {
        let state = store.shared.state.read().await;
        state.recency.front().map(str::to_string)
    }

    #[tokio::test]
    async fn set_basic_and_reset() {
        let store = store();
        assert_eq!(exec(&store, "SET", &["k", "v"]).await.unwrap(), "OK");
        assert_eq!(exec(&store, "SET", &["k", "v2"]).await.unwrap(), "OK");
        assert_eq!(exec(&store, "GET", &["k"]).await.unwrap(), "v2");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn set_with_ttl_argument() {
        let store = store();
        assert_eq!(exec(&store, "SET", &["k", "v", "15"]).await.unwrap(), "OK");
        assert_eq!(exec(&store, "SET", &["k", "v", "0"]).await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn set_argument_errors() {
        let store = store();
        assert_eq!(
            exec(&store, "SET", &[]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "SET", &["k"]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "SET", &["k", "v", "42", "huh?"]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "SET", &["k", "v", "fifteen"]).await,
            Err(StoreError::TtlFormat)
        );
        assert_eq!(
            exec(&store, "SET", &["k", "v", "-42"]).await,
            Err(StoreError::TtlValue)
        );
    }

    #[tokio::test]
    async fn set_over_existing_keeps_single_recency_node() {
        let store = store();
        exec(&store, "SET", &["k", "v1"]).await.unwrap();
        exec(&store, "SET", &["other", "x"]).await.unwrap();
        exec(&store, "SET", &["k", "v2"]).await.unwrap();

        let state = store.shared.state.read().await;
        assert_eq!(state.recency.len(), 2);
        assert_eq!(state.recency.keys_mru_order(), vec!["k", "other"]);
    }

    #[tokio::test]
    async fn get_errors() {
        let store = store();
        exec(&store, "SET", &["x", "15"]).await.unwrap();

        assert_eq!(exec(&store, "GET", &["x"]).await.unwrap(), "15");
        assert_eq!(exec(&store, "GET", &["y"]).await, Err(StoreError::NoItem));
        assert_eq!(
            exec(&store, "GET", &[]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "GET", &["a", "b"]).await,
            Err(StoreError::ArgumentNumber)
        );
    }

    #[tokio::test]
    async fn get_on_list_is_not_string() {
        let store = store();
        exec(&store, "LPUSH", &["list", "v"]).await.unwrap();
        assert_eq!(
            exec(&store, "GET", &["list"]).await,
            Err(StoreError::NotString)
        );
    }

    #[tokio::test]
    async fn size_counts_keys() {
        let store = store();
        assert_eq!(exec(&store, "SIZE", &[]).await.unwrap(), "0");

        fill(&store, 10).await;
        assert_eq!(exec(&store, "SIZE", &[]).await.unwrap(), "10");
        assert_eq!(
            exec(&store, "SIZE", &["x"]).await,
            Err(StoreError::ArgumentNumber)
        );
    }

    #[tokio::test]
    async fn remove_unlinks_both_sides() {
        let store = store();
        fill(&store, 3).await;

        assert_eq!(exec(&store, "REMOVE", &["key1"]).await.unwrap(), "OK");
        assert_eq!(
            exec(&store, "REMOVE", &["key1"]).await,
            Err(StoreError::NoItem)
        );

        let state = store.shared.state.read().await;
        assert_eq!(state.values.len(), 2);
        assert_eq!(state.recency.len(), 2);
        assert!(!state.recency.keys_mru_order().contains(&"key1".to_string()));
    }

    #[tokio::test]
    async fn remove_argument_errors() {
        let store = store();
        assert_eq!(
            exec(&store, "REMOVE", &[]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "REMOVE", &["x", "y"]).await,
            Err(StoreError::ArgumentNumber)
        );
    }

    #[tokio::test]
    async fn remove_batch_misses_are_silent() {
        let store = store();
        fill(&store, 3).await;

        let reply = exec(&store, "REMOVE_BATCH", &["key0", "nope", "key2"])
            .await
            .unwrap();
        assert_eq!(reply, "OK");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn keys_space_joined() {
        let store = store();
        assert_eq!(exec(&store, "KEYS", &[]).await.unwrap(), "");

        fill(&store, 3).await;
        let reply = exec(&store, "KEYS", &[]).await.unwrap();
        let mut keys: Vec<&str> = reply.split(' ').collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["key0", "key1", "key2"]);

        assert_eq!(
            exec(&store, "KEYS", &["x"]).await,
            Err(StoreError::ArgumentNumber)
        );
    }

    #[tokio::test]
    async fn ttl_command_contract() {
        let store = store();
        fill(&store, 2).await;

        assert_eq!(exec(&store, "TTL", &["key0", "25"]).await.unwrap(), "OK");
        // não valida existência: a varredura resolve depois
        assert_eq!(exec(&store, "TTL", &["missing", "25"]).await.unwrap(), "OK");
        assert_eq!(
            exec(&store, "TTL", &[]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "TTL", &["x"]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "TTL", &["x", "y"]).await,
            Err(StoreError::TtlFormat)
        );
        assert_eq!(
            exec(&store, "TTL", &["x", "-1"]).await,
            Err(StoreError::TtlValue)
        );
    }

    #[tokio::test]
    async fn ttl_does_not_touch_recency() {
        let store = store();
        exec(&store, "SET", &["a", "1"]).await.unwrap();
        exec(&store, "SET", &["b", "2"]).await.unwrap();

        exec(&store, "TTL", &["a", "100"]).await.unwrap();
        assert_eq!(mru_key(&store).await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn lset_contract() {
        let store = store();
        for v in ["0", "1", "2"] {
            exec(&store, "LPUSH", &["list", v]).await.unwrap();
        }
        exec(&store, "SET", &["x", "5"]).await.unwrap();

        assert_eq!(
            exec(&store, "LSET", &["list", "2", "10"]).await.unwrap(),
            "OK"
        );
        assert_eq!(exec(&store, "LGET", &["list", "2"]).await.unwrap(), "10");

        assert_eq!(
            exec(&store, "LSET", &["list", "2"]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "LSET", &["list", "index", "10"]).await,
            Err(StoreError::IndexFormat)
        );
        assert_eq!(
            exec(&store, "LSET", &["list", "10", "10"]).await,
            Err(StoreError::IndexRange)
        );
        assert_eq!(
            exec(&store, "LSET", &["x", "0", "0"]).await,
            Err(StoreError::NotList)
        );
        assert_eq!(
            exec(&store, "LSET", &["missing", "0", "14"]).await,
            Err(StoreError::NoItem)
        );
    }

    #[tokio::test]
    async fn lpush_creates_and_appends() {
        let store = store();
        assert_eq!(exec(&store, "LPUSH", &["list", "a"]).await.unwrap(), "OK");
        assert_eq!(exec(&store, "LPUSH", &["list", "b"]).await.unwrap(), "OK");

        // o push anexa no fim da lista
        assert_eq!(exec(&store, "LGET", &["list", "0"]).await.unwrap(), "a");
        assert_eq!(exec(&store, "LGET", &["list", "1"]).await.unwrap(), "b");

        exec(&store, "SET", &["x", "v"]).await.unwrap();
        assert_eq!(
            exec(&store, "LPUSH", &["x", "value"]).await,
            Err(StoreError::NotList)
        );
        assert_eq!(
            exec(&store, "LPUSH", &[]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "LPUSH", &["list"]).await,
            Err(StoreError::ArgumentNumber)
        );
    }

    #[tokio::test]
    async fn lget_contract() {
        let store = store();
        exec(&store, "LPUSH", &["list", "value"]).await.unwrap();
        exec(&store, "SET", &["x", "0"]).await.unwrap();

        assert_eq!(
            exec(&store, "LGET", &["list", "0"]).await.unwrap(),
            "value"
        );
        assert_eq!(
            exec(&store, "LGET", &["list", "99"]).await,
            Err(StoreError::IndexRange)
        );
        assert_eq!(
            exec(&store, "LGET", &["x", "0"]).await,
            Err(StoreError::NotList)
        );
        assert_eq!(
            exec(&store, "LGET", &["list", "index"]).await,
            Err(StoreError::IndexFormat)
        );
        assert_eq!(
            exec(&store, "LGET", &["nolist", "0"]).await,
            Err(StoreError::NoItem)
        );
        assert_eq!(
            exec(&store, "LGET", &["list"]).await,
            Err(StoreError::ArgumentNumber)
        );
    }

    #[tokio::test]
    async fn hset_hget_contract() {
        let store = store();
        exec(&store, "SET", &["x", "16"]).await.unwrap();

        assert_eq!(
            exec(&store, "HSET", &["hash", "f", "value"]).await.unwrap(),
            "OK"
        );
        assert_eq!(
            exec(&store, "HSET", &["hash", "g", "value2"])
                .await
                .unwrap(),
            "OK"
        );
        assert_eq!(
            exec(&store, "HGET", &["hash", "f"]).await.unwrap(),
            "value"
        );
        assert_eq!(
            exec(&store, "HGET", &["hash", "g"]).await.unwrap(),
            "value2"
        );

        assert_eq!(
            exec(&store, "HSET", &["hash", "f"]).await,
            Err(StoreError::ArgumentNumber)
        );
        assert_eq!(
            exec(&store, "HSET", &["x", "f", "v"]).await,
            Err(StoreError::NotHash)
        );
        assert_eq!(
            exec(&store, "HGET", &["hash", "missing"]).await,
            Err(StoreError::NoHashKey)
        );
        assert_eq!(
            exec(&store, "HGET", &["x", "f"]).await,
            Err(StoreError::NotHash)
        );
        assert_eq!(
            exec(&store, "HGET", &["nohash", "f"]).await,
            Err(StoreError::NoItem)
        );
        assert_eq!(
            exec(&store, "HGET", &["hash", "f", "v"]).await,
            Err(StoreError::ArgumentNumber)
        );
    }

    #[tokio::test]
    async fn hset_overwrites_field() {
        let store = store();
        exec(&store, "HSET", &["hash", "f", "v1"]).await.unwrap();
        exec(&store, "HSET", &["hash", "f", "v2"]).await.unwrap();
        assert_eq!(exec(&store, "HGET", &["hash", "f"]).await.unwrap(), "v2");
    }

    #[tokio::test]
    async fn unknown_command() {
        let store = store();
        assert_eq!(
            exec(&store, "WRONGCOMMAND", &[]).await,
            Err(StoreError::NoSuchCommand)
        );
    }

    #[tokio::test]
    async fn dispatch_is_case_insensitive() {
        let store = store();
        assert_eq!(exec(&store, "set", &["k", "v"]).await.unwrap(), "OK");
        assert_eq!(exec(&store, "gEt", &["k"]).await.unwrap(), "v");
    }

    #[tokio::test]
    async fn touched_key_moves_to_head() {
        let store = store();
        fill(&store, 5).await;
        assert_eq!(mru_key(&store).await.as_deref(), Some("key4"));

        exec(&store, "GET", &["key1"]).await.unwrap();
        assert_eq!(mru_key(&store).await.as_deref(), Some("key1"));

        exec(&store, "LPUSH", &["mylist", "v"]).await.unwrap();
        assert_eq!(mru_key(&store).await.as_deref(), Some("mylist"));

        exec(&store, "LGET", &["mylist", "0"]).await.unwrap();
        assert_eq!(mru_key(&store).await.as_deref(), Some("mylist"));

        exec(&store, "HSET", &["myhash", "f", "v"]).await.unwrap();
        exec(&store, "GET", &["key0"]).await.unwrap();
        exec(&store, "HGET", &["myhash", "f"]).await.unwrap();
        assert_eq!(mru_key(&store).await.as_deref(), Some("myhash"));
    }

    #[tokio::test]
    async fn failed_command_does_not_touch_recency() {
        let store = store();
        exec(&store, "SET", &["a", "1"]).await.unwrap();
        exec(&store, "SET", &["b", "2"]).await.unwrap();

        // erro de tipo não promove a chave
        assert!(exec(&store, "LPUSH", &["a", "v"]).await.is_err());
        assert_eq!(mru_key(&store).await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn eviction_order_spares_touched_key() {
        let store = store();
        for i in 0..10 {
            let v = i.to_string();
            exec(&store, "SET", &[&format!("k{v}"), &v]).await.unwrap();
        }
        // k0 é o mais antigo; o GET o promove
        exec(&store, "GET", &["k0"]).await.unwrap();

        let victims = store.lru_tail(1).await;
        assert_eq!(victims, vec!["k1"]);

        exec(
            &store,
            "REMOVE_BATCH",
            &victims.iter().map(String::as_str).collect::<Vec<_>>(),
        )
        .await
        .unwrap();

        assert_eq!(exec(&store, "GET", &["k0"]).await.unwrap(), "0");
        assert_eq!(exec(&store, "GET", &["k1"]).await, Err(StoreError::NoItem));
    }

    #[tokio::test]
    async fn lru_tail_does_not_mutate_order() {
        let store = store();
        fill(&store, 4).await;

        let before = {
            let state = store.shared.state.read().await;
            state.recency.keys_mru_order()
        };
        let tail = store.lru_tail(2).await;
        assert_eq!(tail, vec!["key0", "key1"]);

        let after = {
            let state = store.shared.state.read().await;
            state.recency.keys_mru_order()
        };
        assert_eq!(before, after);
    }
}
