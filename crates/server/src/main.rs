use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use squall_common::{BACKUPS_DIR, DEFAULT_HOST, DEFAULT_PORT, MAX_CONNECTIONS, MAX_MEMORY_BYTES};
use squall_protocol::Connection;
use squall_server::handle_connection;
use squall_store::{Config, Store};

#[derive(Parser, Debug)]
#[command(name = "squall-server", about = "Squall — nó de cache in-memory")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, default_value_t = MAX_CONNECTIONS)]
    max_connections: usize,
    /// Snapshot para restaurar no boot
    #[arg(long, value_name = "FILE")]
    backup: Option<PathBuf>,
    /// Diretório onde os snapshots periódicos são gravados
    #[arg(long, default_value = BACKUPS_DIR)]
    backups_dir: PathBuf,
    /// Limite de memória do processo, em bytes
    #[arg(long, default_value_t = MAX_MEMORY_BYTES)]
    max_memory: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squall_server=info,squall_store=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let store = Store::new(Config {
        backups_dir: args.backups_dir,
        max_memory: args.max_memory,
        ..Config::default()
    });

    // restaurar snapshot se configurado
    if let Some(ref backup) = args.backup {
        let count = store.restore_from(backup).await?;
        if count > 0 {
            info!("{count} chaves restauradas do backup");
        }
    }

    let listener = TcpListener::bind(&addr).await?;
    info!("Squall escutando em {addr}");

    let semaphore = std::sync::Arc::new(tokio::sync::Semaphore::new(args.max_connections));
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    loop {
        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => permit.unwrap(),
            _ = signal::ctrl_c() => {
                info!("shutdown signal recebido");
                break;
            }
        };

        let (socket, addr) = tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok(v) => v,
                    Err(e) => {
                        error!("erro ao aceitar conexão: {e}");
                        continue;
                    }
                }
            }
            _ = signal::ctrl_c() => {
                info!("shutdown signal recebido");
                break;
            }
        };

        info!("nova conexão: {addr}");
        let store = store.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let conn = Connection::new(socket);
            if let Err(e) = handle_connection(conn, store, &mut shutdown_rx).await {
                error!("erro na conexão {addr}: {e}");
            }
            info!("conexão encerrada: {addr}");
            drop(permit);
        });
    }

    Ok(())
}
