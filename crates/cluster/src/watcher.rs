use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::ring::{Backend, Ring};

/// Lê a lista de backends do arquivo JSON: um array de objetos
/// `{"addr": string, "weight": int}`.
pub fn load_backends(path: &Path) -> anyhow::Result<Vec<Backend>> {
    let raw = std::fs::read_to_string(path)?;
    let backends: Vec<Backend> = serde_json::from_str(&raw)?;
    Ok(backends)
}

/// Observa o arquivo da lista de servidores e reaplica a associação no
/// anel a cada escrita. Erros de watch ou de parse são logados e o anel
/// mantém a associação anterior.
pub async fn watch_backends(path: PathBuf, ring: Arc<Ring>) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<notify::Result<Event>>(16);

    // o handler roda na thread do notify, fora do runtime
    let mut watcher = notify::recommended_watcher(move |event| {
        let _ = tx.blocking_send(event);
    })?;
    watcher.watch(&path, RecursiveMode::NonRecursive)?;

    info!("observando lista de servidores em {}", path.display());

    while let Some(event) = rx.recv().await {
        match event {
            Ok(event) if matches!(event.kind, EventKind::Modify(_)) => {
                info!("lista de servidores modificada, reajustando a distribuição");
                match load_backends(&path) {
                    Ok(backends) => ring.adjust(&backends),
                    Err(e) => warn!("lista de servidores inválida, mantendo o anel: {e}"),
                }
            }
            Ok(_) => {}
            Err(e) => warn!("erro no watcher: {e}"),
        }
    }

    Ok(())
}
