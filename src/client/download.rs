use super::{session::Connection, Client};
use crate::error::{Error, Result};

use bytes::{Bytes, BytesMut};

use derivative::Derivative;

use futures::{
    stream::BoxStream,
    task::{Context, Poll},
    Future, Stream, StreamExt, TryStreamExt,
};

use std::{path::Path, pin::Pin};

use tokio::{fs, io::AsyncWriteExt};

use tokio_util::sync::WaitForCancellationFutureOwned;

use tracing::info;

/// Default size of the chunks yielded by a [`ChunkStream`]: 12 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 12 * 1024 * 1024;

/// Stream over the body of a download, in chunks of a fixed size.
///
/// Every chunk is exactly `chunk_size` bytes long, except for the last one which may be shorter.
/// Only one chunk is ever buffered at a time. The stream is bound to the connection it was
/// created from: it can only be read once, and exhausting or dropping it gives the connection
/// back. Closing the client ends the stream with [`Error::Closed`].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ChunkStream {
    #[derivative(Debug = "ignore")]
    body: Option<BoxStream<'static, reqwest::Result<Bytes>>>,
    connection: Option<Connection>,
    #[derivative(Debug = "ignore")]
    closed: Pin<Box<WaitForCancellationFutureOwned>>,

    buffer: BytesMut,
    chunk_size: usize,
    content_length: Option<u64>,
}

impl ChunkStream {
    pub(crate) fn new(
        response: reqwest::Response,
        connection: Connection,
        chunk_size: usize,
    ) -> Self {
        ChunkStream {
            content_length: response.content_length(),
            body: Some(response.bytes_stream().boxed()),
            closed: Box::pin(connection.closed()),
            connection: Some(connection),

            buffer: BytesMut::new(),
            chunk_size,
        }
    }

    /// Size of the whole body, if the server announced it.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn release(&mut self) {
        self.body = None;
        self.connection = None;
    }
}

impl Stream for ChunkStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Bytes>>> {
        let this = self.get_mut();

        loop {
            if this.body.is_some() && this.closed.as_mut().poll(cx).is_ready() {
                this.release();
                this.buffer.clear();
                return Poll::Ready(Some(Err(Error::Closed)));
            }

            if this.buffer.len() >= this.chunk_size {
                return Poll::Ready(Some(Ok(this.buffer.split_to(this.chunk_size).freeze())));
            }

            let body = match this.body.as_mut() {
                Some(body) => body,
                // the body is over, flush whatever is left
                None if this.buffer.is_empty() => return Poll::Ready(None),
                None => return Poll::Ready(Some(Ok(this.buffer.split().freeze()))),
            };

            match body.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(frame))) => this.buffer.extend_from_slice(&frame),
                Poll::Ready(Some(Err(e))) => {
                    // a broken body ends the stream
                    this.release();
                    this.buffer.clear();
                    return Poll::Ready(Some(Err(Error::from(e))));
                }
                Poll::Ready(None) => this.release(),
            }
        }
    }
}

impl Client {
    /// Downloads the contents of `url` to the file at `path`, overwriting it if it exists.
    ///
    /// Missing parent directories are created. The body is written chunk by chunk and never held
    /// in memory as a whole.
    ///
    /// ```no_run
    /// # use nexusmods::client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> nexusmods::error::Result<()> {
    /// let client = Client::new("MY_API_KEY", "morrowind")?;
    /// client.open().await?;
    ///
    /// let links = client.get_download_links(49565, 1000023992).await?;
    /// client.download(&links[0].uri, "downloads/api-test.zip").await?;
    ///
    /// client.close().await
    /// # }
    /// ```
    pub async fn download(&self, url: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut chunks = self.stream_download(url).await?;
        let mut file = fs::File::create(path).await?;
        let mut written = 0u64;

        while let Some(chunk) = chunks.try_next().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;

        info!(path = %path.display(), bytes = written, "download finished");
        Ok(())
    }
}
