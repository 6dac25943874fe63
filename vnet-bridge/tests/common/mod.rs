//! In-memory endpoints standing in for pcap sessions

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use vnet_capture::{Endpoint, EndpointInfo, FrameReader, FrameWriter};
use vnet_core::{MacAddr, Result};

pub const BRIDGE_MAC: MacAddr = MacAddr::new([0x02, 0x42, 0xac, 0x18, 0x00, 0x01]);
pub const HOST_MAC: MacAddr = MacAddr::new([0x3c, 0x22, 0xfb, 0x10, 0x20, 0x30]);
pub const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(172, 24, 0, 1);

/// Frames pushed from the test side, read by a forwarding loop
#[derive(Clone, Default)]
pub struct Feed {
    queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

impl Feed {
    pub fn push(&self, frame: Vec<u8>) {
        self.queue.lock().push_back(frame);
    }
}

struct FeedReader {
    feed: Feed,
    current: Vec<u8>,
}

impl FrameReader for FeedReader {
    fn read(&mut self) -> Option<&[u8]> {
        let next = self.feed.queue.lock().pop_front();
        match next {
            Some(frame) => {
                self.current = frame;
                Some(&self.current)
            }
            None => {
                thread::sleep(Duration::from_millis(5));
                None
            }
        }
    }

    fn close(&mut self) {
        self.feed.queue.lock().clear();
    }
}

/// Records injected frames
#[derive(Default)]
pub struct Sink {
    frames: Mutex<Vec<Vec<u8>>>,
    closed: AtomicBool,
}

impl Sink {
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl FrameWriter for Sink {
    fn write(&self, frame: &[u8]) -> Result<()> {
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

fn info(name: &str, mac: MacAddr) -> EndpointInfo {
    EndpointInfo {
        name: name.to_string(),
        mac,
        local_ip: LOCAL_IP,
        subnet: "172.24.0.0/16".parse::<ipnetwork::Ipv4Network>().unwrap(),
        filter: String::new(),
    }
}

fn endpoint(info: EndpointInfo) -> (Endpoint, Feed, Arc<Sink>) {
    let feed = Feed::default();
    let sink = Arc::new(Sink::default());
    let reader = FeedReader {
        feed: feed.clone(),
        current: Vec::new(),
    };
    let writer: Arc<dyn FrameWriter> = sink.clone();
    (Endpoint::from_parts(info, Box::new(reader), writer), feed, sink)
}

pub fn physical() -> (Endpoint, Feed, Arc<Sink>) {
    endpoint(info("eth-test", BRIDGE_MAC))
}

pub fn tunnel() -> (Endpoint, Feed, Arc<Sink>) {
    endpoint(info("utun-test", MacAddr::zero()))
}

/// Poll `condition` until it holds or two seconds pass
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Ethernet frame carrying a 48-byte IPv4/UDP datagram
pub fn ipv4_frame(src_mac: MacAddr, dst_mac: MacAddr, src: Ipv4Addr, dst: Ipv4Addr) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(dst_mac.as_bytes());
    frame.extend_from_slice(src_mac.as_bytes());
    frame.extend_from_slice(&[0x08, 0x00]);
    frame.extend_from_slice(&ipv4_datagram(src, dst));
    frame
}

pub fn ipv4_datagram(src: Ipv4Addr, dst: Ipv4Addr) -> Vec<u8> {
    let mut datagram = vec![
        0x45, 0x00, 0x00, 0x30, 0xbe, 0xef, 0x00, 0x00, 0x40, 0x11, 0x00, 0x00,
    ];
    datagram.extend_from_slice(&src.octets());
    datagram.extend_from_slice(&dst.octets());
    datagram.extend_from_slice(&[0xaa; 28]);
    datagram
}
