//! Per-protocol hooks applied to a stack before it is packed
//!
//! A [`Mutator`] gets one call per layer, with mutable access to that layer's
//! header. Methods that are not overridden leave the header unchanged.
//!
//! ```
//! use netstack_core::Result;
//! use netstack_packet::mutator::Mutator;
//! use netstack_packet::tcp::TcpSegment;
//!
//! struct HttpClient;
//!
//! impl Mutator for HttpClient {
//!     fn mutate_tcp(&mut self, segment: &mut TcpSegment) -> Result<()> {
//!         segment.set_source("49152")?;
//!         segment.set_destination("80")
//!     }
//! }
//! ```

use crate::ethernet::EthernetFrame;
use crate::ipv6::Ipv6Header;
use crate::tcp::TcpSegment;
use netstack_core::Result;

/// Hook set with one method per protocol
///
/// The implementing value is the context shared by all hooks.
pub trait Mutator {
    fn mutate_ethernet(&mut self, frame: &mut EthernetFrame) -> Result<()> {
        let _ = frame;
        Ok(())
    }

    fn mutate_ipv6(&mut self, header: &mut Ipv6Header) -> Result<()> {
        let _ = header;
        Ok(())
    }

    fn mutate_tcp(&mut self, segment: &mut TcpSegment) -> Result<()> {
        let _ = segment;
        Ok(())
    }
}

/// Leaves every layer unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Mutator for Identity {}

impl<M: Mutator + ?Sized> Mutator for &mut M {
    fn mutate_ethernet(&mut self, frame: &mut EthernetFrame) -> Result<()> {
        (**self).mutate_ethernet(frame)
    }

    fn mutate_ipv6(&mut self, header: &mut Ipv6Header) -> Result<()> {
        (**self).mutate_ipv6(header)
    }

    fn mutate_tcp(&mut self, segment: &mut TcpSegment) -> Result<()> {
        (**self).mutate_tcp(segment)
    }
}

type Hook<'a, T> = &'a mut dyn FnMut(&mut T) -> Result<()>;

/// A mutator assembled from optional borrowed closures
///
/// ```
/// use netstack_packet::mutator::Callbacks;
/// use netstack_packet::ethernet::EthernetFrame;
///
/// let mut set_mac = |frame: &mut EthernetFrame| frame.set_source("00:11:22:33:44:55");
/// let callbacks = Callbacks::new().on_ethernet(&mut set_mac);
/// # drop(callbacks);
/// ```
#[derive(Default)]
pub struct Callbacks<'a> {
    ethernet: Option<Hook<'a, EthernetFrame>>,
    ipv6: Option<Hook<'a, Ipv6Header>>,
    tcp: Option<Hook<'a, TcpSegment>>,
}

impl<'a> Callbacks<'a> {
    /// No callbacks: behaves like [`Identity`]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_ethernet(mut self, hook: Hook<'a, EthernetFrame>) -> Self {
        self.ethernet = Some(hook);
        self
    }

    pub fn on_ipv6(mut self, hook: Hook<'a, Ipv6Header>) -> Self {
        self.ipv6 = Some(hook);
        self
    }

    pub fn on_tcp(mut self, hook: Hook<'a, TcpSegment>) -> Self {
        self.tcp = Some(hook);
        self
    }
}

impl Mutator for Callbacks<'_> {
    fn mutate_ethernet(&mut self, frame: &mut EthernetFrame) -> Result<()> {
        match self.ethernet.as_deref_mut() {
            Some(hook) => hook(frame),
            None => Ok(()),
        }
    }

    fn mutate_ipv6(&mut self, header: &mut Ipv6Header) -> Result<()> {
        match self.ipv6.as_deref_mut() {
            Some(hook) => hook(header),
            None => Ok(()),
        }
    }

    fn mutate_tcp(&mut self, segment: &mut TcpSegment) -> Result<()> {
        match self.tcp.as_deref_mut() {
            Some(hook) => hook(segment),
            None => Ok(()),
        }
    }
}
