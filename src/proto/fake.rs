use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::Waker;

struct Script {
    reads: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    reader: Option<Waker>,
}

/// Serial port stand-in replaying scripted read chunks and recording writes.
///
/// Once the script is exhausted reads stay pending, like a silent gauge,
/// so the caller's timeout decides when to give up.
pub(crate) struct FakeSerial {
    script: Arc<Mutex<Script>>,
}

/// Test-side view of a [`FakeSerial`] that outlives the transport owning it.
#[derive(Clone)]
pub(crate) struct FakeHandle {
    script: Arc<Mutex<Script>>,
}

impl FakeSerial {
    pub(crate) fn new(reads: &[&[u8]]) -> (Self, FakeHandle) {
        let script = Arc::new(Mutex::new(Script {
            reads: reads.iter().map(|chunk| chunk.to_vec()).collect(),
            written: Vec::new(),
            reader: None,
        }));
        (
            Self {
                script: script.clone(),
            },
            FakeHandle { script },
        )
    }
}

impl FakeHandle {
    pub(crate) fn written(&self) -> Vec<u8> {
        self.script.lock().unwrap().written.clone()
    }

    pub(crate) fn push_read(&self, chunk: &[u8]) {
        let mut script = self.script.lock().unwrap();
        script.reads.push_back(chunk.to_vec());
        if let Some(waker) = script.reader.take() {
            waker.wake();
        }
    }

    pub(crate) fn clear_written(&self) {
        self.script.lock().unwrap().written.clear();
    }
}

impl tokio::io::AsyncRead for FakeSerial {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let mut guard = self.script.lock().unwrap();
        let script = &mut *guard;
        match script.reads.front_mut() {
            Some(chunk) => {
                let c = buf.remaining().min(chunk.len());
                buf.put_slice(&chunk[0..c]);
                chunk.drain(0..c);
                if chunk.is_empty() {
                    script.reads.pop_front();
                }
                std::task::Poll::Ready(Ok(()))
            }
            None => {
                script.reader = Some(cx.waker().clone());
                std::task::Poll::Pending
            }
        }
    }
}

impl tokio::io::AsyncWrite for FakeSerial {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::result::Result<usize, std::io::Error>> {
        self.script.lock().unwrap().written.extend_from_slice(buf);
        std::task::Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }
}
