use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream};
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Turn a reader into a stream of byte chunks.
///
/// The stream owns the reader; dropping the stream releases it. The stream
/// ends after the first read error.
pub fn reader_stream<R>(reader: R) -> impl Stream<Item = std::io::Result<Bytes>> + Send
where
    R: AsyncRead + Unpin + Send + 'static,
{
    stream::unfold(Some(reader), |state| async move {
        let mut reader = state?;
        let mut buf = BytesMut::zeroed(READ_CHUNK_SIZE);

        match reader.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(buf.freeze()), Some(reader)))
            }
            Err(e) => Some((Err(e), None)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_reader_stream_yields_all_bytes() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 256) as u8).collect();

        let chunks: Vec<Bytes> = reader_stream(Cursor::new(data.clone()))
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_reader_stream_respects_take_limit() {
        let reader = Cursor::new(vec![7u8; 1000]).take(10);

        let chunks: Vec<Bytes> = reader_stream(reader)
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(chunks.concat(), vec![7u8; 10]);
    }
}
