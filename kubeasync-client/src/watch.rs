//! The client-level watch iterator: frames a chunked HTTP response body into
//! newline-terminated lines and decodes each line through
//! `kubeasync_core::models::decode_watch_line`.
//!
//! Frames the response body with `tokio_util::codec::LinesCodec` and
//! tolerates the `UnexpectedEof`/`TimedOut` I/O errors long-lived watches
//! produce. A malformed or unparseable line never terminates the stream or
//! surfaces an `Err` item: it's folded into
//! [`kubeasync_core::watch::WatchEvent::Malformed`] and handed to the
//! caller like any other event.
use std::future::ready;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use http_body_util::BodyExt;
use kubeasync_core::models::decode_watch_line;
use kubeasync_core::watch::WatchEvent;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;

use crate::client::Body;

/// A cooperatively cancellable stream of decoded watch events: exposes a
/// cooperative `stop()` rather than relying on the caller dropping it.
pub struct WatchStream {
    inner: Pin<Box<dyn Stream<Item = WatchEvent> + Send>>,
    stop: Arc<AtomicBool>,
}

impl WatchStream {
    pub(crate) fn new(body: Body, object_type: &'static str) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let data_stream = body.into_data_stream().map_err(|e| {
            // Chunked transfer-encoding decoders surface a long watch's
            // clean disconnect as an "unexpected EOF" I/O error; it isn't.
            if e.to_string().contains("unexpected EOF during chunk") {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, e)
            } else {
                std::io::Error::other(e)
            }
        });
        let frames = FramedRead::new(StreamReader::new(data_stream), LinesCodec::new());
        let inner = frames.filter_map(move |res| {
            ready(match res {
                Ok(line) => Some(decode_watch_line(object_type, line.as_bytes())),
                Err(LinesCodecError::Io(e))
                    if matches!(e.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::UnexpectedEof) =>
                {
                    None
                }
                Err(_) => None,
            })
        });
        Self {
            inner: Box::pin(inner),
            stop,
        }
    }

    /// Request that the stream stop yielding events. Observed at the next
    /// `poll_next`; already-buffered events up to that point are not lost,
    /// they simply aren't requested further.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Stream for WatchStream {
    type Item = WatchEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.stop.load(Ordering::Relaxed) {
            return Poll::Ready(None);
        }
        this.inner.as_mut().poll_next(cx)
    }
}
