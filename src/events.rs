/// Exceptional conditions reported from the data path.
///
/// These do not interrupt processing by themselves; the status code of the
/// triggering call tells the caller whether the packet was still handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtpEvent {
    /// An SSRC was used in both the send and receive direction.
    SsrcCollision,
    /// Key usage passed the soft limit; rekeying should be scheduled.
    KeySoftLimit,
    /// Key usage reached the hard limit; the stream refuses further packets.
    KeyHardLimit,
    /// The packet index space is close to exhaustion.
    PacketIndexLimit,
}

/// Payload handed to the session's event handler.
#[derive(Debug, Clone, Copy)]
pub struct EventData {
    pub event: SrtpEvent,
    /// SSRC of the affected stream, in host order.
    pub ssrc: u32,
}

/// Session-scoped event callback. `None` disables reporting.
pub type EventHandler = Box<dyn FnMut(&EventData)>;

pub(crate) fn dispatch(handler: &mut Option<EventHandler>, event: SrtpEvent, ssrc: u32) {
    if let Some(h) = handler.as_mut() {
        h(&EventData { event, ssrc });
    }
}
