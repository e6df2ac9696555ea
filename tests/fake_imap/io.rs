//! Response writers for the fake IMAP server.
//!
//! Every write is flushed immediately so the client sees each response
//! as soon as the handler produces it.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

async fn send<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    data: &[u8],
) -> std::io::Result<()> {
    stream.get_mut().write_all(data).await?;
    stream.get_mut().flush().await
}

/// Write `* {text}\r\n`.
pub async fn untagged<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    text: &str,
) -> std::io::Result<()> {
    send(stream, format!("* {text}\r\n").as_bytes()).await
}

/// Write the completion line `{tag} {text}\r\n`.
pub async fn tagged<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    tag: &str,
    text: &str,
) -> std::io::Result<()> {
    send(stream, format!("{tag} {text}\r\n").as_bytes()).await
}

/// Write `* {seq} FETCH (BODY[] {len}\r\n<raw>)\r\n`.
///
/// The `{len}` marker announces a counted literal: the client reads
/// exactly that many bytes before looking for the closing `)`.
pub async fn fetch_literal<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    seq: u32,
    raw: &[u8],
) -> std::io::Result<()> {
    send(stream, format!("* {seq} FETCH (BODY[] {{{}}}\r\n", raw.len()).as_bytes()).await?;
    send(stream, raw).await?;
    send(stream, b")\r\n").await
}
