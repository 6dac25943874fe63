//! In-memory endpoints for unit tests

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use vnet_capture::{Endpoint, EndpointInfo, EndpointReader, EndpointWriter, FrameReader, FrameWriter};
use vnet_core::{Error, MacAddr, Result};

pub const BRIDGE_MAC: MacAddr = MacAddr::new([0x02, 0x42, 0xac, 0x18, 0x00, 0x01]);

pub fn physical_info() -> EndpointInfo {
    EndpointInfo {
        name: "eth-test".to_string(),
        mac: BRIDGE_MAC,
        local_ip: Ipv4Addr::new(172, 24, 0, 1),
        subnet: "172.24.0.0/16".parse().unwrap(),
        filter: String::new(),
    }
}

pub fn tunnel_info() -> EndpointInfo {
    EndpointInfo {
        name: "utun-test".to_string(),
        mac: MacAddr::zero(),
        local_ip: Ipv4Addr::new(172, 24, 0, 1),
        subnet: "172.24.0.0/16".parse().unwrap(),
        filter: String::new(),
    }
}

/// Replays queued frames, then reports a short timeout on every read
#[derive(Default)]
pub struct MemoryReader {
    frames: VecDeque<Vec<u8>>,
    current: Vec<u8>,
}

impl FrameReader for MemoryReader {
    fn read(&mut self) -> Option<&[u8]> {
        match self.frames.pop_front() {
            Some(frame) => {
                self.current = frame;
                Some(&self.current)
            }
            None => {
                thread::sleep(Duration::from_millis(2));
                None
            }
        }
    }

    fn close(&mut self) {
        self.frames.clear();
    }
}

/// Records every injected frame
#[derive(Default)]
pub struct MemoryWriter {
    frames: Mutex<Vec<Vec<u8>>>,
    fail: AtomicBool,
    closed: AtomicBool,
}

impl MemoryWriter {
    /// A writer plus the endpoint write half wrapping it
    pub fn half(info: EndpointInfo) -> (Arc<Self>, EndpointWriter) {
        let (_, writer, half) = endpoint(info, Vec::new());
        (writer, half)
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl FrameWriter for MemoryWriter {
    fn write(&self, frame: &[u8]) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::write("injected failure"));
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

/// An unsplit endpoint that replays `frames`, plus its recording writer
pub fn endpoint_parts(info: EndpointInfo, frames: Vec<Vec<u8>>) -> (Endpoint, Arc<MemoryWriter>) {
    let writer = Arc::new(MemoryWriter::default());
    let reader = MemoryReader {
        frames: frames.into(),
        current: Vec::new(),
    };
    let shared: Arc<dyn FrameWriter> = writer.clone();
    (Endpoint::from_parts(info, Box::new(reader), shared), writer)
}

/// Split endpoint halves that replay `frames`
pub fn endpoint(
    info: EndpointInfo,
    frames: Vec<Vec<u8>>,
) -> (EndpointReader, Arc<MemoryWriter>, EndpointWriter) {
    let (endpoint, writer) = endpoint_parts(info, frames);
    let (reader, half) = endpoint.split();
    (reader, writer, half)
}

/// Ethernet frame carrying a minimal IPv4 datagram
pub fn ipv4_frame(src_mac: MacAddr, dst_mac: MacAddr, src: Ipv4Addr, dst: Ipv4Addr) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(dst_mac.as_bytes());
    frame.extend_from_slice(src_mac.as_bytes());
    frame.extend_from_slice(&[0x08, 0x00]);
    frame.extend_from_slice(&ipv4_datagram(src, dst));
    frame
}

/// 48-byte IPv4/UDP datagram
pub fn ipv4_datagram(src: Ipv4Addr, dst: Ipv4Addr) -> Vec<u8> {
    let mut datagram = vec![
        0x45, 0x00, 0x00, 0x30, // version/ihl, tos, total length 48
        0x1c, 0x46, 0x40, 0x00, // id, flags
        0x40, 0x11, 0x00, 0x00, // ttl, udp, checksum (unchecked)
    ];
    datagram.extend_from_slice(&src.octets());
    datagram.extend_from_slice(&dst.octets());
    datagram.extend((0..28u8).map(|i| i.wrapping_mul(7)));
    datagram
}
