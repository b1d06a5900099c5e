use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufStream, BufWriter};
use tokio::net::TcpStream;
use tracing::warn;

use squall_protocol::Request;

use crate::pool::Pool;
use crate::ring::Ring;

/// Conexão agrupada no pool do proxy: stream TCP bufferizado para um
/// backend. O buffer vive junto com a conexão, então bytes lidos a mais
/// não se perdem entre empréstimos.
pub type BackendConn = BufStream<TcpStream>;

/// Atende uma conexão de cliente do proxy: para cada linha, exige pelo
/// menos dois tokens, resolve o dono da chave no anel, pega uma conexão
/// do pool, repassa a linha intocada e devolve uma linha de resposta.
pub async fn handle_proxy_connection(
    client: TcpStream,
    ring: Arc<Ring>,
    pool: Arc<Pool<BackendConn>>,
) -> io::Result<()> {
    let (read_half, write_half) = client.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(()); // EOF
        }
        let raw = line.trim_end_matches(['\r', '\n']);

        let key = Request::parse(raw).and_then(|req| req.routing_key().map(str::to_string));
        let Some(key) = key else {
            write_reply(
                &mut writer,
                "request should have at least 2 words: command and key",
            )
            .await?;
            continue;
        };

        let Some(backend) = ring.get(&key) else {
            warn!("anel vazio, sem dono para a chave {key}");
            write_reply(&mut writer, "no backend available").await?;
            continue;
        };

        let Some(mut conn) = pool.get(&backend.addr).await else {
            warn!("sem conexão para {}", backend.addr);
            let diagnostic = format!("couldn't get the connection to {}", backend.addr);
            write_reply(&mut writer, &diagnostic).await?;
            continue;
        };

        // erro do backend também volta como linha para o cliente; a
        // conexão retorna ao pool e uma quebrada falha no próximo uso
        match forward(&mut conn, raw).await {
            Ok(response) => write_reply(&mut writer, &response).await?,
            Err(e) => write_reply(&mut writer, &e.to_string()).await?,
        }
        pool.return_conn(&backend.addr, conn);
    }
}

/// Repassa a linha original ao backend e lê exatamente uma linha de
/// resposta, sem o terminador.
async fn forward(conn: &mut BackendConn, line: &str) -> io::Result<String> {
    conn.write_all(line.as_bytes()).await?;
    conn.write_all(b"\n").await?;
    conn.flush().await?;

    let mut response = String::new();
    if conn.read_line(&mut response).await? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "backend fechou a conexão",
        ));
    }
    Ok(response.trim_end_matches(['\r', '\n']).to_string())
}

async fn write_reply<W>(writer: &mut BufWriter<W>, reply: &str) -> io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    writer.write_all(reply.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
