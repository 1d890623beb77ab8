//! Wire framing for the transcription bridge: every frame is a one-byte
//! kind tag, a big-endian u32 length, then that many payload bytes.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const KIND_CONTROL: u8 = 0;
pub const KIND_AUDIO: u8 = 1;

pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    kind: u8,
    payload: &[u8],
) -> std::io::Result<()> {
    writer.write_u8(kind).await?;
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(payload).await?;
    writer.flush().await
}

pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<(u8, Vec<u8>)> {
    let kind = reader.read_u8().await?;
    let len = reader.read_u32().await? as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok((kind, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn round_trips_a_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, KIND_AUDIO, b"hello").await.unwrap();

        let mut cursor = Cursor::new(buf);
        let (kind, payload) = read_frame(&mut cursor).await.unwrap();
        assert_eq!(kind, KIND_AUDIO);
        assert_eq!(payload, b"hello");
    }
}
