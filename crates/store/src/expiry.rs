use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, warn};

use crate::store::{Store, now_unix};

/// Evento de TTL emitido pela engine sob o lock de escrita. O índice de
/// expiração vive só no worker; a engine nunca o lê.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtlEvent {
    Set { key: String, at: i64 },
    Delete { key: String },
}

/// Worker que mantém o índice chave → instante de expiração e varre as
/// chaves vencidas num tick periódico.
pub(crate) struct ExpiryWorker {
    store: Store,
    rx: mpsc::Receiver<TtlEvent>,
    index: HashMap<String, i64>,
}

impl ExpiryWorker {
    pub(crate) fn spawn(store: Store, rx: mpsc::Receiver<TtlEvent>) {
        let worker = ExpiryWorker {
            store,
            rx,
            index: HashMap::new(),
        };
        tokio::spawn(worker.run());
    }

    async fn run(mut self) {
        let mut tick = interval(self.store.config().cleanup_interval);

        loop {
            tokio::select! {
                event = self.rx.recv() => match event {
                    Some(TtlEvent::Set { key, at }) => {
                        self.index.insert(key, at);
                    }
                    Some(TtlEvent::Delete { key }) => {
                        self.index.remove(&key);
                    }
                    None => return, // engine encerrada
                },
                _ = tick.tick() => self.sweep(),
            }
        }
    }

    /// Recolhe as chaves com instante estritamente anterior a agora e
    /// submete um REMOVE_BATCH pela interface pública. A varredura é
    /// idempotente: remover chave já ausente é um miss silencioso.
    fn sweep(&mut self) {
        let now = now_unix();
        let expired: Vec<String> = self
            .index
            .iter()
            .filter(|&(_, &at)| at < now)
            .map(|(key, _)| key.clone())
            .collect();

        if expired.is_empty() {
            return;
        }

        // sai do índice já na coleta; os Delete que o lote emitir de
        // volta viram no-ops
        for key in &expired {
            self.index.remove(key);
        }

        debug!("varredura de ttl: {} chaves expiradas", expired.len());

        // o lote roda em task própria para o dreno de eventos não parar
        // atrás do próprio REMOVE_BATCH
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.exec("REMOVE_BATCH", &expired).await {
                warn!("varredura de ttl falhou: {e}");
            }
        });
    }
}
