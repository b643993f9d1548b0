//! SRTP protect/unprotect pipelines.
//!
//! Two data paths share the framing logic: AES-CM plus a separate MAC, and
//! AES-GCM where the cipher provides integrity. They differ in IV
//! formation, AAD, and where the tag lives.

use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder};

use crate::crypto::cipher::{CipherDirection, CipherTypeId};
use crate::crypto::constant_time_eq;
use crate::error::SrtpError;
use crate::events::SrtpEvent;
use crate::key_limit::KeyEvent;
use crate::packet;
use crate::stream::{Direction, StreamCtx};
use crate::{sink_error, sink_trace, sink_warn};

use super::{Session, Slot};

/// Spends one key use, reporting limit events; a hard limit refuses the
/// packet.
fn update_key_limit(session: &mut Session, slot: &Slot, ssrc: u32) -> Result<(), SrtpError> {
    let verdict = session.stream(slot)?.limit.borrow_mut().update();
    match verdict {
        KeyEvent::Normal => Ok(()),
        KeyEvent::SoftLimit => {
            session.handle_event(SrtpEvent::KeySoftLimit, ssrc);
            Ok(())
        }
        KeyEvent::HardLimit => {
            session.handle_event(SrtpEvent::KeyHardLimit, ssrc);
            Err(SrtpError::KeyExpired)
        }
    }
}

/// Counter-mode nonce: zero word, SSRC, then the extended index shifted
/// into the upper 48 bits of the low quadword. Ciphers without a dedicated
/// format get the bare index.
fn ctr_rtp_iv(stream: &StreamCtx, ssrc: u32, est: u64) -> [u8; 16] {
    let mut iv = [0u8; 16];
    if stream.rtp_cipher.borrow().id() == CipherTypeId::AesIcm {
        BigEndian::write_u32(&mut iv[4..8], ssrc);
        BigEndian::write_u64(&mut iv[8..16], est << 16);
    } else {
        BigEndian::write_u64(&mut iv[8..16], est);
    }
    iv
}

/// AEAD nonce per RFC 7714 section 8.1: `[00 00 | SSRC | ROC | SEQ]`
/// XORed with the session salt.
fn aead_rtp_iv(salt: &[u8; 12], ssrc: u32, est: u64) -> [u8; 12] {
    let mut iv = [0u8; 12];
    BigEndian::write_u32(&mut iv[2..6], ssrc);
    BigEndian::write_u32(&mut iv[6..10], (est >> 16) as u32);
    BigEndian::write_u16(&mut iv[10..12], est as u16);
    for (b, s) in iv.iter_mut().zip(salt.iter()) {
        *b ^= s;
    }
    iv
}

pub(super) fn protect(session: &mut Session, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
    packet::rtp_payload_offset(packet)?;
    let ssrc = packet::rtp_ssrc(packet);
    let seq = packet::rtp_seq(packet);

    let slot = match session.find_stream(ssrc) {
        Some(i) => Slot::Concrete(i),
        None if session.template.is_some() => {
            let slot = session.clone_template(ssrc)?;
            session.stream_mut(&slot)?.direction = Direction::Sender;
            slot
        }
        None => return Err(SrtpError::NoCtx),
    };

    session.pin_direction(&slot, Direction::Sender)?;

    if session.stream(&slot)?.is_aead() {
        return protect_aead(session, &slot, packet);
    }

    update_key_limit(session, &slot, ssrc)?;

    let (tag_len, services, allow_repeat_tx) = {
        let stream = session.stream(&slot)?;
        (
            stream.rtp_auth.borrow().tag_len(),
            stream.rtp_services,
            stream.allow_repeat_tx,
        )
    };

    let payload_offset = packet::rtp_payload_offset(packet)?;
    if services.confidentiality && packet[0] & 0x10 != 0 && payload_offset >= packet.len() {
        return Err(SrtpError::ParseErr);
    }

    let (est, delta) = session.stream(&slot)?.rtp_rdbx.estimate_index(seq);
    match session.stream(&slot)?.rtp_rdbx.check(delta) {
        Ok(()) => session.stream_mut(&slot)?.rtp_rdbx.add_index(delta),
        Err(SrtpError::ReplayFail) if allow_repeat_tx => {}
        Err(e) => return Err(e),
    }

    let cipher = Rc::clone(&session.stream(&slot)?.rtp_cipher);
    let auth = Rc::clone(&session.stream(&slot)?.rtp_auth);
    let iv = ctr_rtp_iv(session.stream(&slot)?, ssrc, est);
    cipher
        .borrow_mut()
        .set_iv(&iv, CipherDirection::Encrypt)
        .map_err(|_| SrtpError::CipherFail)?;

    let orig_len = packet.len();
    if services.authentication {
        packet.resize(orig_len + tag_len, 0);

        // A universal-hash authenticator consumes keystream ahead of the
        // payload; emit it into the tag slot first.
        let prefix_len = auth.borrow().prefix_len();
        if prefix_len > 0 {
            cipher
                .borrow_mut()
                .output(&mut packet[orig_len..orig_len + prefix_len])
                .map_err(|_| SrtpError::CipherFail)?;
        }
    }

    if services.confidentiality {
        cipher
            .borrow_mut()
            .encrypt(&mut packet[payload_offset..orig_len])
            .map_err(|_| SrtpError::CipherFail)?;
    }

    if services.authentication {
        let mut mac = auth.borrow_mut();
        mac.start()?;
        mac.update(&packet[..orig_len])?;
        // The MAC input ends with the rollover counter as four octets in
        // network order.
        let roc = ((est >> 16) as u32).to_be_bytes();
        mac.compute(&roc, &mut packet[orig_len..])?;
    }

    sink_trace!(
        session.logger,
        "[SRTP] Protected SSRC={:#010x} seq={} len={}",
        ssrc,
        seq,
        packet.len()
    );
    Ok(())
}

fn protect_aead(session: &mut Session, slot: &Slot, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
    let ssrc = packet::rtp_ssrc(packet);
    let seq = packet::rtp_seq(packet);

    update_key_limit(session, slot, ssrc)?;

    let payload_offset = packet::rtp_payload_offset(packet)?;
    if payload_offset >= packet.len() {
        return Err(SrtpError::ParseErr);
    }

    let allow_repeat_tx = session.stream(slot)?.allow_repeat_tx;
    let (est, delta) = session.stream(slot)?.rtp_rdbx.estimate_index(seq);
    match session.stream(slot)?.rtp_rdbx.check(delta) {
        Ok(()) => session.stream_mut(slot)?.rtp_rdbx.add_index(delta),
        Err(SrtpError::ReplayFail) if allow_repeat_tx => {}
        Err(e) => return Err(e),
    }

    let cipher = Rc::clone(&session.stream(slot)?.rtp_cipher);
    let tag_len = cipher.borrow().tag_len();
    let iv = aead_rtp_iv(&session.stream(slot)?.salt, ssrc, est);
    {
        let mut c = cipher.borrow_mut();
        c.set_iv(&iv, CipherDirection::Encrypt)
            .map_err(|_| SrtpError::CipherFail)?;
        // The AAD is everything before the encrypted region.
        c.set_aad(&packet[..payload_offset])
            .map_err(|_| SrtpError::CipherFail)?;
    }

    let orig_len = packet.len();
    packet.resize(orig_len + tag_len, 0);
    {
        let mut c = cipher.borrow_mut();
        c.encrypt(&mut packet[payload_offset..orig_len])
            .map_err(|_| SrtpError::CipherFail)?;
        c.get_tag(&mut packet[orig_len..])
            .map_err(|_| SrtpError::CipherFail)?;
    }

    sink_trace!(
        session.logger,
        "[SRTP] Protected (AEAD) SSRC={:#010x} seq={} len={}",
        ssrc,
        seq,
        packet.len()
    );
    Ok(())
}

pub(super) fn unprotect(session: &mut Session, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
    packet::rtp_payload_offset(packet)?;
    let ssrc = packet::rtp_ssrc(packet);
    let seq = packet::rtp_seq(packet);

    let (mut slot, est, delta) = match session.find_stream(ssrc) {
        Some(i) => {
            let slot = Slot::Concrete(i);
            let (est, delta) = session.stream(&slot)?.rtp_rdbx.estimate_index(seq);
            if let Err(e) = session.stream(&slot)?.rtp_rdbx.check(delta) {
                sink_warn!(
                    session.logger,
                    "[SRTP] Replay rejected SSRC={:#010x} seq={}",
                    ssrc,
                    seq
                );
                return Err(e);
            }
            (slot, est, delta)
        }
        // No stream yet: run against the template provisionally, with the
        // wire sequence number standing in for the extended index. The
        // replay database is only consulted after the clone exists.
        None if session.template.is_some() => (Slot::Template, seq as u64, seq as i64),
        None => return Err(SrtpError::NoCtx),
    };

    if session.stream(&slot)?.is_aead() {
        return unprotect_aead(session, slot, est, delta, packet);
    }

    let (tag_len, services) = {
        let stream = session.stream(&slot)?;
        (stream.rtp_auth.borrow().tag_len(), stream.rtp_services)
    };
    let payload_offset = packet::rtp_payload_offset(packet)?;
    if packet.len() < payload_offset + tag_len {
        return Err(SrtpError::BadParam);
    }
    let tag_start = packet.len() - tag_len;

    let cipher = Rc::clone(&session.stream(&slot)?.rtp_cipher);
    let auth = Rc::clone(&session.stream(&slot)?.rtp_auth);
    let iv = ctr_rtp_iv(session.stream(&slot)?, ssrc, est);
    cipher
        .borrow_mut()
        .set_iv(&iv, CipherDirection::Decrypt)
        .map_err(|_| SrtpError::CipherFail)?;

    if services.confidentiality && payload_offset >= packet.len() {
        return Err(SrtpError::ParseErr);
    }

    if services.authentication {
        let prefix_len = auth.borrow().prefix_len();
        if prefix_len > 0 {
            let mut prefix = vec![0u8; prefix_len];
            cipher
                .borrow_mut()
                .output(&mut prefix)
                .map_err(|_| SrtpError::CipherFail)?;
        }

        let tag_ok = {
            let mut mac = auth.borrow_mut();
            mac.start()?;
            mac.update(&packet[..tag_start])?;
            let roc = ((est >> 16) as u32).to_be_bytes();
            let mut computed = [0u8; 20];
            mac.compute(&roc, &mut computed)?;
            constant_time_eq(&computed[..tag_len], &packet[tag_start..])
        };
        if !tag_ok {
            sink_error!(
                session.logger,
                "[SRTP] Auth tag mismatch SSRC={:#010x} seq={}",
                ssrc,
                seq
            );
            return Err(SrtpError::AuthFail);
        }
    }

    update_key_limit(session, &slot, ssrc)?;

    if services.confidentiality {
        cipher
            .borrow_mut()
            .decrypt(&mut packet[payload_offset..tag_start])
            .map_err(|_| SrtpError::CipherFail)?;
    }

    // Only after authentication: pin the direction, promote the template,
    // and commit the index.
    session.pin_direction(&slot, Direction::Receiver)?;
    if matches!(slot, Slot::Template) {
        slot = session.clone_template(ssrc)?;
    }
    session.stream_mut(&slot)?.rtp_rdbx.add_index(delta);

    packet.truncate(tag_start);
    sink_trace!(
        session.logger,
        "[SRTP] Unprotected SSRC={:#010x} seq={}",
        ssrc,
        seq
    );
    Ok(())
}

fn unprotect_aead(
    session: &mut Session,
    mut slot: Slot,
    est: u64,
    delta: i64,
    packet: &mut Vec<u8>,
) -> Result<(), SrtpError> {
    let ssrc = packet::rtp_ssrc(packet);

    let cipher = Rc::clone(&session.stream(&slot)?.rtp_cipher);
    let tag_len = cipher.borrow().tag_len();
    let iv = aead_rtp_iv(&session.stream(&slot)?.salt, ssrc, est);
    cipher
        .borrow_mut()
        .set_iv(&iv, CipherDirection::Decrypt)
        .map_err(|_| SrtpError::CipherFail)?;

    let payload_offset = packet::rtp_payload_offset(packet)?;
    if payload_offset >= packet.len() {
        return Err(SrtpError::ParseErr);
    }
    if packet.len() - payload_offset < tag_len {
        return Err(SrtpError::CipherFail);
    }

    update_key_limit(session, &slot, ssrc)?;

    {
        let mut c = cipher.borrow_mut();
        c.set_aad(&packet[..payload_offset])
            .map_err(|_| SrtpError::CipherFail)?;
    }
    if let Err(e) = cipher.borrow_mut().decrypt(&mut packet[payload_offset..]) {
        sink_error!(
            session.logger,
            "[SRTP] AEAD authentication failure SSRC={:#010x}",
            ssrc
        );
        return Err(e);
    }

    session.pin_direction(&slot, Direction::Receiver)?;
    if matches!(slot, Slot::Template) {
        slot = session.clone_template(ssrc)?;
    }
    session.stream_mut(&slot)?.rtp_rdbx.add_index(delta);

    let stripped = packet.len() - tag_len;
    packet.truncate(stripped);
    Ok(())
}
