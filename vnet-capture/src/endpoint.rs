//! Frame endpoints: a filtered capture source plus an injection sink bound
//! to one interface

use crate::stats::{EndpointStats, KernelStats, StatsAccumulator};
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info};
use vnet_core::{Error, MacAddr, Result};

/// Blocking source of captured frames.
///
/// The slice returned by [`FrameReader::read`] may point into a buffer the
/// reader reuses, so it is only valid until the next call. The borrow on
/// `&mut self` enforces this; callers copy anything they keep.
pub trait FrameReader: Send {
    /// Wait up to the read timeout for the next frame.
    ///
    /// `None` means "nothing this time": a timeout, or a transient fault that
    /// has already been logged. It never means end of stream.
    fn read(&mut self) -> Option<&[u8]>;

    /// Release the capture session. Idempotent.
    fn close(&mut self);

    /// Counters maintained by the capture library, if any
    fn kernel_stats(&mut self) -> Option<KernelStats> {
        None
    }
}

/// Synchronous frame injection, callable from several threads at once
pub trait FrameWriter: Send + Sync {
    fn write(&self, frame: &[u8]) -> Result<()>;

    /// Release the injection session. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Addressing an endpoint was bound with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    /// Interface name
    pub name: String,
    /// Local hardware address (zero on interfaces without one)
    pub mac: MacAddr,
    /// Local IPv4 address
    pub local_ip: Ipv4Addr,
    /// Virtual subnet handled on this interface
    pub subnet: Ipv4Network,
    /// Capture filter in effect
    pub filter: String,
}

impl EndpointInfo {
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.subnet.contains(ip)
    }
}

/// A bound interface: one reader, one writer, shared statistics
pub struct Endpoint {
    info: EndpointInfo,
    reader: Box<dyn FrameReader>,
    writer: Arc<dyn FrameWriter>,
    stats: StatsAccumulator,
}

impl Endpoint {
    /// Assemble an endpoint from its parts
    pub fn from_parts(
        info: EndpointInfo,
        reader: Box<dyn FrameReader>,
        writer: Arc<dyn FrameWriter>,
    ) -> Self {
        Self {
            info,
            reader,
            writer,
            stats: StatsAccumulator::new(),
        }
    }

    pub fn info(&self) -> &EndpointInfo {
        &self.info
    }

    pub fn stats(&self) -> EndpointStats {
        self.stats.snapshot()
    }

    /// Read the next frame; see [`FrameReader::read`]
    pub fn read(&mut self) -> Option<&[u8]> {
        let frame = self.reader.read()?;
        self.stats.record_read(frame.len());
        Some(frame)
    }

    pub fn write(&self, frame: &[u8]) -> Result<()> {
        write_counted(&*self.writer, &self.stats, frame)
    }

    pub fn close(&mut self) {
        self.reader.close();
        self.writer.close();
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_closed()
    }

    /// Split into an exclusively owned read half and a shareable write half
    pub fn split(self) -> (EndpointReader, EndpointWriter) {
        let info = Arc::new(self.info);
        let reader = EndpointReader {
            info: Arc::clone(&info),
            reader: self.reader,
            stats: self.stats.clone(),
            closed: false,
        };
        let writer = EndpointWriter {
            info,
            writer: self.writer,
            stats: self.stats,
        };
        (reader, writer)
    }
}

fn write_counted(writer: &dyn FrameWriter, stats: &StatsAccumulator, frame: &[u8]) -> Result<()> {
    match writer.write(frame) {
        Ok(()) => {
            stats.record_write(frame.len());
            Ok(())
        }
        Err(e) => {
            stats.record_write_error();
            Err(match e {
                Error::Write(_) => e,
                other => Error::write(other.to_string()),
            })
        }
    }
}

/// Read half of an [`Endpoint`], owned by exactly one forwarding loop
pub struct EndpointReader {
    info: Arc<EndpointInfo>,
    reader: Box<dyn FrameReader>,
    stats: StatsAccumulator,
    closed: bool,
}

impl EndpointReader {
    pub fn info(&self) -> &EndpointInfo {
        &self.info
    }

    /// Read the next frame; see [`FrameReader::read`]
    pub fn read(&mut self) -> Option<&[u8]> {
        if self.closed {
            return None;
        }
        let frame = self.reader.read()?;
        self.stats.record_read(frame.len());
        Some(frame)
    }

    pub fn kernel_stats(&mut self) -> Option<KernelStats> {
        if self.closed {
            return None;
        }
        self.reader.kernel_stats()
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.reader.close();
        debug!(interface = %self.info.name, "Capture session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Write half of an [`Endpoint`]; clones share the same session
#[derive(Clone)]
pub struct EndpointWriter {
    info: Arc<EndpointInfo>,
    writer: Arc<dyn FrameWriter>,
    stats: StatsAccumulator,
}

impl EndpointWriter {
    pub fn info(&self) -> &EndpointInfo {
        &self.info
    }

    pub fn write(&self, frame: &[u8]) -> Result<()> {
        write_counted(&*self.writer, &self.stats, frame)
    }

    pub fn stats(&self) -> EndpointStats {
        self.stats.snapshot()
    }

    pub fn close(&self) {
        if !self.writer.is_closed() {
            self.writer.close();
            info!(interface = %self.info.name, "Endpoint closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ScriptReader {
        frames: VecDeque<Vec<u8>>,
        current: Vec<u8>,
        closed: Arc<AtomicBool>,
    }

    impl FrameReader for ScriptReader {
        fn read(&mut self) -> Option<&[u8]> {
            self.current = self.frames.pop_front()?;
            Some(&self.current)
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct RecordWriter {
        frames: Mutex<Vec<Vec<u8>>>,
        closed: AtomicBool,
        fail: bool,
    }

    impl FrameWriter for RecordWriter {
        fn write(&self, frame: &[u8]) -> Result<()> {
            if self.fail {
                return Err(Error::Io(std::io::Error::other("device gone")));
            }
            self.frames.lock().push(frame.to_vec());
            Ok(())
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    fn info() -> EndpointInfo {
        EndpointInfo {
            name: "test0".to_string(),
            mac: MacAddr::new([2, 0, 0, 0, 0, 1]),
            local_ip: Ipv4Addr::new(172, 24, 0, 1),
            subnet: "172.24.0.0/16".parse().unwrap(),
            filter: String::new(),
        }
    }

    fn endpoint(frames: Vec<Vec<u8>>, writer: Arc<RecordWriter>) -> (Endpoint, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        let reader = ScriptReader {
            frames: frames.into(),
            current: Vec::new(),
            closed: Arc::clone(&closed),
        };
        (
            Endpoint::from_parts(info(), Box::new(reader), writer),
            closed,
        )
    }

    #[test]
    fn test_read_and_write_are_counted() {
        let writer = Arc::new(RecordWriter::default());
        let (mut ep, _) = endpoint(vec![vec![1, 2, 3]], Arc::clone(&writer));

        assert_eq!(ep.read(), Some(&[1u8, 2, 3][..]));
        assert_eq!(ep.read(), None);
        ep.write(&[9; 60]).unwrap();

        let stats = ep.stats();
        assert_eq!(stats.frames_read, 1);
        assert_eq!(stats.bytes_read, 3);
        assert_eq!(stats.frames_written, 1);
        assert_eq!(writer.frames.lock().len(), 1);
    }

    #[test]
    fn test_write_error_is_wrapped() {
        let writer = Arc::new(RecordWriter {
            fail: true,
            ..Default::default()
        });
        let (ep, _) = endpoint(vec![], writer);

        assert!(matches!(ep.write(&[0; 60]), Err(Error::Write(_))));
        assert_eq!(ep.stats().write_errors, 1);
    }

    #[test]
    fn test_split_halves_share_stats_and_close() {
        let writer = Arc::new(RecordWriter::default());
        let (ep, reader_closed) = endpoint(vec![vec![7; 42]], Arc::clone(&writer));
        let (mut reader, writer_half) = ep.split();

        assert_eq!(reader.read().map(|f| f.len()), Some(42));
        writer_half.clone().write(&[1; 60]).unwrap();
        let stats = writer_half.stats();
        assert_eq!(stats.frames_read, 1);
        assert_eq!(stats.frames_written, 1);

        reader.close();
        reader.close();
        assert!(reader.is_closed());
        assert!(reader_closed.load(Ordering::SeqCst));
        assert_eq!(reader.read(), None);

        writer_half.close();
        writer_half.close();
        assert!(writer_half.is_closed());
    }

    #[test]
    fn test_endpoint_close() {
        let writer = Arc::new(RecordWriter::default());
        let (mut ep, reader_closed) = endpoint(vec![], Arc::clone(&writer));
        assert!(!ep.is_closed());
        ep.close();
        assert!(ep.is_closed());
        assert!(reader_closed.load(Ordering::SeqCst));
        assert!(ep.info().contains(Ipv4Addr::new(172, 24, 200, 1)));
    }
}
