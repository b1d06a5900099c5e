use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use squall_common::{ConnectionError, INITIAL_BUFFER_CAPACITY, MAX_LINE_SIZE};

/// Wrapper sobre TcpStream com buffer para leitura/escrita de linhas
/// do protocolo. Uma requisição e uma resposta ocupam uma linha cada.
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Lê uma linha completa do stream, sem o terminador. Retorna None
    /// no EOF limpo (buffer vazio).
    pub async fn read_line(&mut self) -> Result<Option<String>, ConnectionError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let mut line = self.buffer.split_to(pos + 1);
                line.truncate(pos);
                if line.last() == Some(&b'\r') {
                    line.truncate(pos - 1);
                }
                let line = std::str::from_utf8(&line)
                    .map_err(|_| ConnectionError::InvalidEncoding)?
                    .to_string();
                return Ok(Some(line));
            }

            // limite para uma linha sem terminador não crescer sem fim
            if self.buffer.len() >= MAX_LINE_SIZE {
                return Err(ConnectionError::LineTooLarge(self.buffer.len()));
            }

            // read_buf só enche a capacidade livre; cresce o buffer em
            // direção ao limite antes de cada leitura, senão um n == 0
            // de buffer cheio passaria por EOF
            let spare = (MAX_LINE_SIZE - self.buffer.len()).min(INITIAL_BUFFER_CAPACITY);
            self.buffer.reserve(spare);

            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ConnectionError::ConnectionReset);
            }
        }
    }

    /// Escreve uma linha de resposta seguida de `\n` e dá flush.
    pub async fn write_line(&mut self, line: &str) -> Result<(), ConnectionError> {
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;
        Ok(())
    }
}
