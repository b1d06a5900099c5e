use sysinfo::{Pid, System};
use tokio::time::interval;
use tracing::{info, warn};

use crate::store::Store;

/// Worker de pressão de memória: num tick periódico amostra a memória
/// residente do processo e, acima de 90% do limite, despeja um lote de
/// chaves da cauda LRU.
pub(crate) struct MemoryGuard {
    store: Store,
}

impl MemoryGuard {
    pub(crate) fn spawn(store: Store) {
        tokio::spawn(MemoryGuard { store }.run());
    }

    async fn run(self) {
        let config = self.store.config().clone();
        let threshold = (config.max_memory as f64 * 0.9) as u64;
        let mut tick = interval(config.memory_check_interval);
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        loop {
            tick.tick().await;

            system.refresh_process(pid);
            let Some(process) = system.process(pid) else {
                continue;
            };
            let rss = process.memory();
            if rss <= threshold {
                continue;
            }

            // duas fases: amostra a cauda sob o lock, remove fora dele.
            // uma promoção concorrente de chave amostrada só faz o lote
            // tolerar um miss
            let victims = self.store.lru_tail(config.evict_batch).await;
            if victims.is_empty() {
                continue;
            }

            info!(
                rss,
                threshold,
                batch = victims.len(),
                "memória acima do limite, despejando cauda LRU"
            );

            if let Err(e) = self.store.exec("REMOVE_BATCH", &victims).await {
                warn!("despejo por pressão de memória falhou: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::Config;
    use crate::store::Store;

    // o caminho de amostragem de RSS não é determinístico em teste; o
    // ciclo amostra-e-remove é exercitado direto contra a engine
    #[tokio::test]
    async fn evict_cycle_removes_lru_tail() {
        let store = Store::new(Config {
            memory_check_interval: Duration::from_secs(3600),
            ..Config::default()
        });

        for i in 0..30 {
            let v = i.to_string();
            let args = vec![format!("k{v}"), v];
            store.exec("SET", &args).await.unwrap();
        }
        store
            .exec("GET", &["k0".to_string()])
            .await
            .unwrap();

        let victims = store.lru_tail(20).await;
        assert_eq!(victims.len(), 20);
        assert_eq!(victims[0], "k1");
        assert!(!victims.contains(&"k0".to_string()));

        store.exec("REMOVE_BATCH", &victims).await.unwrap();
        assert_eq!(store.len().await, 10);
        assert_eq!(
            store.exec("GET", &["k0".to_string()]).await.unwrap(),
            "0"
        );
    }
}
