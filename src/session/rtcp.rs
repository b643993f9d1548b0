//! SRTCP protect/unprotect pipelines.
//!
//! SRTCP always authenticates on the send side. The trailer word carries
//! the E-bit and the 31-bit index; for the composed path it sits between
//! the payload and the tag, for AEAD it follows the tag.

use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder};

use crate::crypto::cipher::{CipherDirection, CipherTypeId};
use crate::crypto::constant_time_eq;
use crate::error::SrtpError;
use crate::packet;
use crate::stream::{Direction, StreamCtx};
use crate::{sink_error, sink_trace, sink_warn};

use super::{Session, Slot};

/// Counter-mode nonce for SRTCP: zero word, SSRC, then the 31-bit index
/// split across the two low words.
fn ctr_rtcp_iv(stream: &StreamCtx, ssrc: u32, index: u32) -> [u8; 16] {
    let mut iv = [0u8; 16];
    if stream.rtcp_cipher.borrow().id() == CipherTypeId::AesIcm {
        BigEndian::write_u32(&mut iv[4..8], ssrc);
        BigEndian::write_u32(&mut iv[8..12], index >> 16);
        BigEndian::write_u32(&mut iv[12..16], index << 16);
    } else {
        BigEndian::write_u32(&mut iv[12..16], index);
    }
    iv
}

/// AEAD nonce per RFC 7714 section 9.1: `[00 00 | SSRC | 00 00 | index]`
/// XORed with the RTCP session salt.
fn aead_rtcp_iv(salt: &[u8; 12], ssrc: u32, index: u32) -> [u8; 12] {
    let mut iv = [0u8; 12];
    BigEndian::write_u32(&mut iv[2..6], ssrc);
    BigEndian::write_u32(&mut iv[8..12], index & packet::SRTCP_INDEX_MASK);
    for (b, s) in iv.iter_mut().zip(salt.iter()) {
        *b ^= s;
    }
    iv
}

pub(super) fn protect(session: &mut Session, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
    if packet.len() < packet::RTCP_HEADER_LEN {
        return Err(SrtpError::BadParam);
    }
    let ssrc = packet::rtcp_ssrc(packet);

    // Unlike the RTP receive path there is no provisional mode here: a
    // first-seen SSRC clones the template immediately.
    let slot = match session.find_stream(ssrc) {
        Some(i) => Slot::Concrete(i),
        None if session.template.is_some() => session.clone_template(ssrc)?,
        None => return Err(SrtpError::NoCtx),
    };

    session.pin_direction(&slot, Direction::Sender)?;

    if session.stream(&slot)?.is_aead() {
        return protect_aead(session, &slot, packet);
    }

    let (tag_len, conf) = {
        let stream = session.stream(&slot)?;
        (
            stream.rtcp_auth.borrow().tag_len(),
            stream.rtcp_services.confidentiality,
        )
    };
    let orig_len = packet.len();

    session.stream_mut(&slot)?.rtcp_rdb.increment()?;
    let index = session.stream(&slot)?.rtcp_rdb.get_value();

    let trailer_word = if conf {
        packet::SRTCP_E_BIT | index
    } else {
        index
    };
    packet.resize(orig_len + packet::SRTCP_TRAILER_LEN + tag_len, 0);
    BigEndian::write_u32(
        &mut packet[orig_len..orig_len + packet::SRTCP_TRAILER_LEN],
        trailer_word,
    );

    let cipher = Rc::clone(&session.stream(&slot)?.rtcp_cipher);
    let auth = Rc::clone(&session.stream(&slot)?.rtcp_auth);
    let iv = ctr_rtcp_iv(session.stream(&slot)?, ssrc, index);
    cipher
        .borrow_mut()
        .set_iv(&iv, CipherDirection::Encrypt)
        .map_err(|_| SrtpError::CipherFail)?;

    // The sender always authenticates RTCP, whatever the service mask says.
    let prefix_len = auth.borrow().prefix_len();
    if prefix_len > 0 {
        let tag_off = orig_len + packet::SRTCP_TRAILER_LEN;
        cipher
            .borrow_mut()
            .output(&mut packet[tag_off..tag_off + prefix_len])
            .map_err(|_| SrtpError::CipherFail)?;
    }

    if conf {
        cipher
            .borrow_mut()
            .encrypt(&mut packet[packet::RTCP_HEADER_LEN..orig_len])
            .map_err(|_| SrtpError::CipherFail)?;
    }

    {
        // The MAC covers the packet plus the trailer word.
        let mut mac = auth.borrow_mut();
        mac.start()?;
        let (head, tag_area) = packet.split_at_mut(orig_len + packet::SRTCP_TRAILER_LEN);
        mac.compute(head, tag_area)?;
    }

    sink_trace!(
        session.logger,
        "[SRTCP] Protected SSRC={:#010x} index={} len={}",
        ssrc,
        index,
        packet.len()
    );
    Ok(())
}

fn protect_aead(session: &mut Session, slot: &Slot, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
    let ssrc = packet::rtcp_ssrc(packet);
    let cipher = Rc::clone(&session.stream(slot)?.rtcp_cipher);
    let tag_len = cipher.borrow().tag_len();
    let conf = session.stream(slot)?.rtcp_services.confidentiality;
    let orig_len = packet.len();

    session.stream_mut(slot)?.rtcp_rdb.increment()?;
    let index = session.stream(slot)?.rtcp_rdb.get_value();

    let trailer_word = if conf {
        packet::SRTCP_E_BIT | index
    } else {
        index
    };

    // AEAD layout: tag first, then the trailer word.
    packet.resize(orig_len + tag_len + packet::SRTCP_TRAILER_LEN, 0);
    BigEndian::write_u32(&mut packet[orig_len + tag_len..], trailer_word);

    let iv = aead_rtcp_iv(&session.stream(slot)?.c_salt, ssrc, index);
    {
        let mut c = cipher.borrow_mut();
        c.set_iv(&iv, CipherDirection::Encrypt)
            .map_err(|_| SrtpError::CipherFail)?;
        // With encryption the AAD is the RTCP header; without it the whole
        // packet is authenticated data. The trailer word follows either way.
        if conf {
            c.set_aad(&packet[..packet::RTCP_HEADER_LEN])
                .map_err(|_| SrtpError::CipherFail)?;
        } else {
            c.set_aad(&packet[..orig_len])
                .map_err(|_| SrtpError::CipherFail)?;
        }
        c.set_aad(&trailer_word.to_be_bytes())
            .map_err(|_| SrtpError::CipherFail)?;
    }

    if conf {
        cipher
            .borrow_mut()
            .encrypt(&mut packet[packet::RTCP_HEADER_LEN..orig_len])
            .map_err(|_| SrtpError::CipherFail)?;
    } else {
        // Run the cipher over nothing to produce the tag.
        let mut empty: [u8; 0] = [];
        cipher
            .borrow_mut()
            .encrypt(&mut empty)
            .map_err(|_| SrtpError::CipherFail)?;
    }
    cipher
        .borrow_mut()
        .get_tag(&mut packet[orig_len..orig_len + tag_len])
        .map_err(|_| SrtpError::CipherFail)?;

    sink_trace!(
        session.logger,
        "[SRTCP] Protected (AEAD) SSRC={:#010x} index={} len={}",
        ssrc,
        index,
        packet.len()
    );
    Ok(())
}

pub(super) fn unprotect(session: &mut Session, packet: &mut Vec<u8>) -> Result<(), SrtpError> {
    // The trailer must fit even before the tag length is known.
    if packet.len() < packet::RTCP_HEADER_LEN + packet::SRTCP_TRAILER_LEN {
        return Err(SrtpError::BadParam);
    }
    let ssrc = packet::rtcp_ssrc(packet);

    let mut slot = match session.find_stream(ssrc) {
        Some(i) => Slot::Concrete(i),
        None if session.template.is_some() => Slot::Template,
        None => return Err(SrtpError::NoCtx),
    };

    let (tag_len, conf) = {
        let stream = session.stream(&slot)?;
        (
            stream.rtcp_auth.borrow().tag_len(),
            stream.rtcp_services.confidentiality,
        )
    };
    if packet.len() < packet::RTCP_HEADER_LEN + tag_len + packet::SRTCP_TRAILER_LEN {
        return Err(SrtpError::BadParam);
    }

    if session.stream(&slot)?.is_aead() {
        return unprotect_aead(session, slot, packet);
    }

    let trailer_off = packet.len() - tag_len - packet::SRTCP_TRAILER_LEN;
    let trailer = BigEndian::read_u32(&packet[trailer_off..trailer_off + 4]);
    let e_bit = trailer & packet::SRTCP_E_BIT != 0;
    if e_bit != conf {
        return Err(SrtpError::CantCheck);
    }
    let index = trailer & packet::SRTCP_INDEX_MASK;

    if let Err(e) = session.stream(&slot)?.rtcp_rdb.check(index) {
        sink_warn!(
            session.logger,
            "[SRTCP] Replay rejected SSRC={:#010x} index={}",
            ssrc,
            index
        );
        return Err(e);
    }

    let cipher = Rc::clone(&session.stream(&slot)?.rtcp_cipher);
    let auth = Rc::clone(&session.stream(&slot)?.rtcp_auth);
    let iv = ctr_rtcp_iv(session.stream(&slot)?, ssrc, index);
    cipher
        .borrow_mut()
        .set_iv(&iv, CipherDirection::Decrypt)
        .map_err(|_| SrtpError::CipherFail)?;

    let auth_len = packet.len() - tag_len;
    let tag_ok = {
        let mut mac = auth.borrow_mut();
        mac.start()?;
        let mut computed = [0u8; 20];
        mac.compute(&packet[..auth_len], &mut computed)?;
        constant_time_eq(&computed[..tag_len], &packet[auth_len..])
    };
    if !tag_ok {
        sink_error!(
            session.logger,
            "[SRTCP] Auth tag mismatch SSRC={:#010x} index={}",
            ssrc,
            index
        );
        return Err(SrtpError::AuthFail);
    }

    if conf {
        cipher
            .borrow_mut()
            .decrypt(&mut packet[packet::RTCP_HEADER_LEN..trailer_off])
            .map_err(|_| SrtpError::CipherFail)?;
    }
    packet.truncate(trailer_off);

    session.pin_direction(&slot, Direction::Receiver)?;
    if matches!(slot, Slot::Template) {
        slot = session.clone_template(ssrc)?;
    }
    session.stream_mut(&slot)?.rtcp_rdb.add_index(index);

    sink_trace!(
        session.logger,
        "[SRTCP] Unprotected SSRC={:#010x} index={}",
        ssrc,
        index
    );
    Ok(())
}

fn unprotect_aead(
    session: &mut Session,
    mut slot: Slot,
    packet: &mut Vec<u8>,
) -> Result<(), SrtpError> {
    let ssrc = packet::rtcp_ssrc(packet);
    let cipher = Rc::clone(&session.stream(&slot)?.rtcp_cipher);
    let tag_len = cipher.borrow().tag_len();

    if packet.len() < packet::RTCP_HEADER_LEN + tag_len + packet::SRTCP_TRAILER_LEN {
        return Err(SrtpError::BadParam);
    }

    let trailer_off = packet.len() - packet::SRTCP_TRAILER_LEN;
    let trailer = BigEndian::read_u32(&packet[trailer_off..]);
    // Processing follows the E-bit in the packet; the trailer is part of
    // the AAD, so the tag check vouches for it.
    let e_bit = trailer & packet::SRTCP_E_BIT != 0;
    let index = trailer & packet::SRTCP_INDEX_MASK;
    let tag_start = trailer_off - tag_len;

    if let Err(e) = session.stream(&slot)?.rtcp_rdb.check(index) {
        sink_warn!(
            session.logger,
            "[SRTCP] Replay rejected SSRC={:#010x} index={}",
            ssrc,
            index
        );
        return Err(e);
    }

    let iv = aead_rtcp_iv(&session.stream(&slot)?.c_salt, ssrc, index);
    {
        let mut c = cipher.borrow_mut();
        c.set_iv(&iv, CipherDirection::Decrypt)
            .map_err(|_| SrtpError::CipherFail)?;
        if e_bit {
            c.set_aad(&packet[..packet::RTCP_HEADER_LEN])
                .map_err(|_| SrtpError::CipherFail)?;
        } else {
            c.set_aad(&packet[..tag_start])
                .map_err(|_| SrtpError::CipherFail)?;
        }
        c.set_aad(&packet[trailer_off..])
            .map_err(|_| SrtpError::CipherFail)?;
    }

    let decrypt_result = if e_bit {
        cipher
            .borrow_mut()
            .decrypt(&mut packet[packet::RTCP_HEADER_LEN..trailer_off])
    } else {
        // Nothing was encrypted; run the cipher over the bare tag so it is
        // still verified.
        cipher.borrow_mut().decrypt(&mut packet[tag_start..trailer_off])
    };
    if let Err(e) = decrypt_result {
        sink_error!(
            session.logger,
            "[SRTCP] AEAD authentication failure SSRC={:#010x}",
            ssrc
        );
        return Err(e);
    }

    packet.truncate(tag_start);

    session.pin_direction(&slot, Direction::Receiver)?;
    if matches!(slot, Slot::Template) {
        slot = session.clone_template(ssrc)?;
    }
    session.stream_mut(&slot)?.rtcp_rdb.add_index(index);

    sink_trace!(
        session.logger,
        "[SRTCP] Unprotected (AEAD) SSRC={:#010x} index={}",
        ssrc,
        index
    );
    Ok(())
}
