use tokio::sync::broadcast;
use tracing::debug;

use squall_common::ConnectionError;
use squall_protocol::{Connection, Request};
use squall_store::Store;

/// Loop principal de tratamento de uma conexão: uma linha vira um
/// comando na engine, a resposta (ou o texto do erro) volta como uma
/// linha. EOF encerra limpo.
pub async fn handle_connection(
    mut conn: Connection,
    store: Store,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), ConnectionError> {
    loop {
        let line = tokio::select! {
            result = conn.read_line() => result?,
            _ = shutdown.recv() => {
                return Ok(());
            }
        };

        let line = match line {
            Some(line) => line,
            None => return Ok(()), // EOF
        };

        // linha em branco não vira comando
        let Some(request) = Request::parse(&line) else {
            continue;
        };

        debug!("comando recebido: {request:?}");

        match store.exec(&request.command, &request.args).await {
            Ok(reply) => conn.write_line(&reply).await?,
            Err(e) => conn.write_line(&e.to_string()).await?,
        }
    }
}
