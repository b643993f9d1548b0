mod rtcp;
mod rtp;

use std::any::Any;
use std::sync::Arc;

use crate::error::SrtpError;
use crate::events::{self, EventHandler, SrtpEvent};
use crate::log::{LogSink, NoopLogSink};
use crate::policy::{Policy, Ssrc};
use crate::stream::{Direction, StreamCtx};
use crate::{sink_debug, sink_warn};

/// Where a packet's stream lives during pipeline processing: a concrete
/// entry in the stream list, or the session template standing in
/// provisionally until authentication passes.
pub(crate) enum Slot {
    Concrete(usize),
    Template,
}

/// An SRTP session: a set of per-SSRC streams under one key management
/// policy, plus an optional wildcard template that is cloned the first
/// time an unknown SSRC is seen.
///
/// All methods take `&mut self`; callers must serialize access to a
/// session. Distinct sessions are independent.
pub struct Session {
    pub(crate) streams: Vec<StreamCtx>,
    pub(crate) template: Option<StreamCtx>,
    pub(crate) handler: Option<EventHandler>,
    pub(crate) logger: Arc<dyn LogSink>,
    user_data: Option<Box<dyn Any>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("streams", &self.streams.len())
            .field("template", &self.template.is_some())
            .field("handler", &self.handler.is_some())
            .field("user_data", &self.user_data.is_some())
            .finish()
    }
}

impl Session {
    /// Creates a session from a list of policies, one stream per entry.
    /// On any failure the partially built session is discarded.
    pub fn create(policy_list: &[Policy]) -> Result<Self, SrtpError> {
        Self::create_with_logger(policy_list, Arc::new(NoopLogSink))
    }

    /// Like [`Session::create`], with an explicit log sink.
    pub fn create_with_logger(
        policy_list: &[Policy],
        logger: Arc<dyn LogSink>,
    ) -> Result<Self, SrtpError> {
        let mut session = Self {
            streams: Vec::new(),
            template: None,
            handler: None,
            logger,
            user_data: None,
        };
        for policy in policy_list {
            session.add_stream(policy)?;
        }
        Ok(session)
    }

    /// Adds a stream for the policy: a specific SSRC is prepended to the
    /// stream list, a wildcard installs the (single) session template.
    pub fn add_stream(&mut self, policy: &Policy) -> Result<(), SrtpError> {
        if policy.key.is_empty() {
            return Err(SrtpError::BadParam);
        }
        let ssrc_value = match policy.ssrc {
            Ssrc::Specific(v) => v,
            _ => 0,
        };
        let mut stream = StreamCtx::new(policy, ssrc_value)?;

        match policy.ssrc {
            Ssrc::AnyOutbound => {
                if self.template.is_some() {
                    return Err(SrtpError::BadParam);
                }
                stream.direction = Direction::Sender;
                self.template = Some(stream);
                sink_debug!(self.logger, "[SRTP] Installed any-outbound template");
            }
            Ssrc::AnyInbound => {
                if self.template.is_some() {
                    return Err(SrtpError::BadParam);
                }
                stream.direction = Direction::Receiver;
                self.template = Some(stream);
                sink_debug!(self.logger, "[SRTP] Installed any-inbound template");
            }
            Ssrc::Specific(ssrc) => {
                if self.find_stream(ssrc).is_some() {
                    return Err(SrtpError::BadParam);
                }
                self.streams.insert(0, stream);
                sink_debug!(self.logger, "[SRTP] Added stream SSRC={:#010x}", ssrc);
            }
            Ssrc::Undefined => return Err(SrtpError::BadParam),
        }
        Ok(())
    }

    /// Removes the stream bound to `ssrc` (host order).
    pub fn remove_stream(&mut self, ssrc: u32) -> Result<(), SrtpError> {
        match self.find_stream(ssrc) {
            Some(idx) => {
                self.streams.remove(idx);
                sink_debug!(self.logger, "[SRTP] Removed stream SSRC={:#010x}", ssrc);
                Ok(())
            }
            None => Err(SrtpError::NoCtx),
        }
    }

    /// Applies SRTP protection to the RTP packet in `packet`, growing it
    /// by the authentication tag.
    pub fn protect(&mut self, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
        rtp::protect(self, packet)
    }

    /// Verifies and strips SRTP protection from `packet`, shrinking it
    /// back to the original RTP packet.
    pub fn unprotect(&mut self, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
        rtp::unprotect(self, packet)
    }

    /// Applies SRTCP protection to the RTCP compound packet in `packet`,
    /// growing it by the trailer word and the authentication tag.
    pub fn protect_rtcp(&mut self, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
        rtcp::protect(self, packet)
    }

    /// Verifies and strips SRTCP protection from `packet`.
    pub fn unprotect_rtcp(&mut self, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
        rtcp::unprotect(self, packet)
    }

    /// Installs (or clears) the event handler for this session.
    pub fn install_event_handler(&mut self, handler: Option<EventHandler>) {
        self.handler = handler;
    }

    /// Attaches opaque caller data to the session.
    pub fn set_user_data(&mut self, data: Box<dyn Any>) {
        self.user_data = Some(data);
    }

    /// Borrows the caller data attached with `set_user_data`.
    pub fn get_user_data(&self) -> Option<&dyn Any> {
        self.user_data.as_deref()
    }

    pub(crate) fn find_stream(&self, ssrc: u32) -> Option<usize> {
        self.streams.iter().position(|s| s.ssrc == ssrc)
    }

    pub(crate) fn stream(&self, slot: &Slot) -> Result<&StreamCtx, SrtpError> {
        match slot {
            Slot::Concrete(i) => self.streams.get(*i).ok_or(SrtpError::NoCtx),
            Slot::Template => self.template.as_ref().ok_or(SrtpError::NoCtx),
        }
    }

    pub(crate) fn stream_mut(&mut self, slot: &Slot) -> Result<&mut StreamCtx, SrtpError> {
        match slot {
            Slot::Concrete(i) => self.streams.get_mut(*i).ok_or(SrtpError::NoCtx),
            Slot::Template => self.template.as_mut().ok_or(SrtpError::NoCtx),
        }
    }

    /// Pins a stream to `want`, raising an SSRC-collision event if it is
    /// already pinned to the opposite role. The direction never flips.
    pub(crate) fn pin_direction(
        &mut self,
        slot: &Slot,
        want: Direction,
    ) -> Result<(), SrtpError> {
        let ssrc = {
            let stream = self.stream_mut(slot)?;
            if stream.direction == want {
                return Ok(());
            }
            if stream.direction == Direction::Unknown {
                stream.direction = want;
                return Ok(());
            }
            stream.ssrc
        };
        sink_warn!(self.logger, "[SRTP] SSRC collision on {:#010x}", ssrc);
        self.handle_event(SrtpEvent::SsrcCollision, ssrc);
        Ok(())
    }

    pub(crate) fn handle_event(&mut self, event: SrtpEvent, ssrc: u32) {
        events::dispatch(&mut self.handler, event, ssrc);
    }

    /// Promotes the template into a concrete stream for `ssrc` and
    /// prepends it to the stream list.
    pub(crate) fn clone_template(&mut self, ssrc: u32) -> Result<Slot, SrtpError> {
        let template = self.template.as_ref().ok_or(SrtpError::NoCtx)?;
        let stream = StreamCtx::clone_from_template(template, ssrc)?;
        self.streams.insert(0, stream);
        sink_debug!(self.logger, "[SRTP] Cloned template for SSRC={:#010x}", ssrc);
        Ok(Slot::Concrete(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_limit::MAX_KEY_USAGE;
    use crate::policy::CryptoPolicy;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn policy_for(ssrc: Ssrc) -> Policy {
        Policy::new(ssrc, vec![0u8; 30])
    }

    fn rtp_packet(ssrc: u32, seq: u16, payload: &[u8]) -> Vec<u8> {
        let mut pkt = vec![0u8; 12];
        pkt[0] = 0x80;
        pkt[2..4].copy_from_slice(&seq.to_be_bytes());
        pkt[8..12].copy_from_slice(&ssrc.to_be_bytes());
        pkt.extend_from_slice(payload);
        pkt
    }

    #[test]
    fn only_one_template() {
        let mut session = Session::create(&[]).unwrap();
        session.add_stream(&policy_for(Ssrc::AnyInbound)).unwrap();
        assert_eq!(
            session.add_stream(&policy_for(Ssrc::AnyOutbound)).unwrap_err(),
            SrtpError::BadParam
        );
    }

    #[test]
    fn undefined_ssrc_rejected() {
        let mut session = Session::create(&[]).unwrap();
        assert_eq!(
            session.add_stream(&policy_for(Ssrc::Undefined)).unwrap_err(),
            SrtpError::BadParam
        );
    }

    #[test]
    fn duplicate_ssrc_rejected() {
        let mut session = Session::create(&[policy_for(Ssrc::Specific(7))]).unwrap();
        assert_eq!(
            session.add_stream(&policy_for(Ssrc::Specific(7))).unwrap_err(),
            SrtpError::BadParam
        );
    }

    #[test]
    fn remove_missing_stream() {
        let mut session = Session::create(&[policy_for(Ssrc::Specific(7))]).unwrap();
        assert_eq!(session.remove_stream(8).unwrap_err(), SrtpError::NoCtx);
        session.remove_stream(7).unwrap();
        assert_eq!(session.remove_stream(7).unwrap_err(), SrtpError::NoCtx);
    }

    #[test]
    fn user_data_roundtrip() {
        let mut session = Session::create(&[]).unwrap();
        assert!(session.get_user_data().is_none());
        session.set_user_data(Box::new(42u32));
        let v = session.get_user_data().and_then(|d| d.downcast_ref::<u32>());
        assert_eq!(v, Some(&42));
    }

    #[test]
    fn key_usage_hard_limit_on_fourth_protect() {
        let mut session = Session::create(&[policy_for(Ssrc::Specific(0xCAFE))]).unwrap();
        session.streams[0].limit.borrow_mut().set(3);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session.install_event_handler(Some(Box::new(move |data| {
            sink.borrow_mut().push(data.event);
        })));

        for seq in 1..=3u16 {
            let mut pkt = rtp_packet(0xCAFE, seq, b"x");
            session.protect(&mut pkt).unwrap();
        }
        let mut pkt = rtp_packet(0xCAFE, 4, b"x");
        assert_eq!(session.protect(&mut pkt).unwrap_err(), SrtpError::KeyExpired);
        assert!(events.borrow().contains(&SrtpEvent::KeyHardLimit));
    }

    #[test]
    fn key_limit_shared_with_clone() {
        let mut session = Session::create(&[policy_for(Ssrc::AnyOutbound)]).unwrap();
        let mut pkt = rtp_packet(0x1111, 1, b"x");
        session.protect(&mut pkt).unwrap();
        let template_limit = Rc::clone(&session.template.as_ref().unwrap().limit);
        assert!(Rc::ptr_eq(&template_limit, &session.streams[0].limit));
        // Exhaust via the shared limit; the clone sees it immediately.
        session.streams[0].limit.borrow_mut().set(0);
        let mut pkt = rtp_packet(0x1111, 2, b"x");
        assert_eq!(session.protect(&mut pkt).unwrap_err(), SrtpError::KeyExpired);
        template_limit.borrow_mut().set(MAX_KEY_USAGE);
    }

    #[test]
    fn null_policy_roundtrip() {
        // No confidentiality and no authentication: protect is the identity.
        let mut policy = policy_for(Ssrc::Specific(0xAA));
        policy.rtp = CryptoPolicy::null_cipher_hmac_null();
        policy.rtcp = CryptoPolicy::null_cipher_hmac_sha1_80();
        let mut session = Session::create(&[policy]).unwrap();

        let original = rtp_packet(0xAA, 9, b"clear");
        let mut pkt = original.clone();
        session.protect(&mut pkt).unwrap();
        assert_eq!(pkt, original);
    }
}
