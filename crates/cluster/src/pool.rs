use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tracing::warn;

use crate::ring::Backend;

/// Future devolvido pela fábrica de conexões.
pub type ConnFuture<T> = Pin<Box<dyn Future<Output = io::Result<T>> + Send>>;

/// Fábrica injetada na construção: endereço → conexão nova. É a costura
/// estreita do pool: ele não sabe nada de TLS nem do protocolo.
pub type ConnFactory<T> = Arc<dyn Fn(&str) -> ConnFuture<T> + Send + Sync>;

/// Fila limitada de conexões reutilizáveis de um backend.
struct Slot<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
}

/// Pool de conexões por endereço de backend. Get tira da fila sem
/// bloquear ou cria pela fábrica; Return devolve à fila e descarta o
/// excedente quando ela está cheia.
pub struct Pool<T> {
    slots: DashMap<String, Slot<T>>,
    factory: ConnFactory<T>,
}

impl<T: Send + 'static> Pool<T> {
    /// Cria o pool com uma fila de capacidade `size` para cada backend.
    pub fn new(size: usize, factory: ConnFactory<T>, backends: &[Backend]) -> Self {
        let slots = DashMap::new();
        for backend in backends {
            let (tx, rx) = mpsc::channel(size);
            slots.insert(
                backend.addr.clone(),
                Slot {
                    tx,
                    rx: Mutex::new(rx),
                },
            );
        }

        Pool { slots, factory }
    }

    /// Conexão para o endereço: reusa da fila se houver, senão cria pela
    /// fábrica. Endereço desconhecido ou fábrica falhando dão None.
    pub async fn get(&self, addr: &str) -> Option<T> {
        let slot = self.slots.get(addr)?;
        {
            let mut rx = slot.rx.lock().await;
            if let Ok(conn) = rx.try_recv() {
                return Some(conn);
            }
        }
        // não segurar a referência do mapa através do dial
        drop(slot);

        match (self.factory)(addr).await {
            Ok(conn) => Some(conn),
            Err(e) => {
                warn!("fábrica de conexões falhou para {addr}: {e}");
                None
            }
        }
    }

    /// Devolve a conexão à fila do endereço. Fila cheia fecha a conexão
    /// excedente e ainda conta como sucesso; endereço desconhecido fecha
    /// e retorna false.
    pub fn return_conn(&self, addr: &str, conn: T) -> bool {
        let Some(slot) = self.slots.get(addr) else {
            drop(conn);
            return false;
        };

        // fila cheia: o try_send consome e descarta a conexão
        let _ = slot.tx.try_send(conn);
        true
    }
}
