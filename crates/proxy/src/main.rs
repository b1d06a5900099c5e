use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufStream;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

use squall_cluster::{
    BackendConn, ConnFactory, Pool, Ring, handle_proxy_connection, load_backends, watch_backends,
};
use squall_common::{DEFAULT_HOST, DEFAULT_POOL_SIZE, DEFAULT_PROXY_PORT};

#[derive(Parser, Debug)]
#[command(name = "squall-proxy", about = "Squall — proxy de roteamento do cluster")]
struct Args {
    /// Arquivo JSON com a lista de servidores do cluster
    #[arg(long, default_value = "servers.json")]
    servers: PathBuf,
    /// Conexões no pool para cada servidor
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE)]
    conns: usize,
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PROXY_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squall_proxy=info,squall_cluster=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let backends = load_backends(&args.servers)?;
    info!(
        "{} servidores carregados de {}",
        backends.len(),
        args.servers.display()
    );

    let ring = Arc::new(Ring::new());
    ring.adjust(&backends);

    // a fábrica é a costura onde um dialer TLS entraria no lugar
    let factory: ConnFactory<BackendConn> = Arc::new(|addr: &str| {
        let addr = addr.to_string();
        Box::pin(async move {
            let stream = TcpStream::connect(&addr).await?;
            Ok(BufStream::new(stream))
        })
    });
    let pool = Arc::new(Pool::new(args.conns, factory, &backends));

    {
        let ring = ring.clone();
        let servers = args.servers.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_backends(servers, ring).await {
                error!("watcher da lista de servidores terminou: {e}");
            }
        });
    }

    let listener = TcpListener::bind(&addr).await?;
    info!("Proxy escutando em {addr}");

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                error!("erro ao aceitar conexão: {e}");
                continue;
            }
        };

        info!("cliente conectado ao proxy: {peer}");
        let ring = ring.clone();
        let pool = pool.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_proxy_connection(socket, ring, pool).await {
                error!("erro na conexão {peer}: {e}");
            }
            info!("conexão encerrada: {peer}");
        });
    }
}
