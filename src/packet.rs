use byteorder::{BigEndian, ByteOrder};

use crate::error::SrtpError;

/// Fixed RTP header length (RFC 3550).
pub const RTP_HEADER_LEN: usize = 12;
/// The part of an RTCP compound packet outside the encrypted region: the
/// first header plus the first SSRC.
pub const RTCP_HEADER_LEN: usize = 8;
/// SRTCP trailer word: E-bit plus 31-bit index.
pub const SRTCP_TRAILER_LEN: usize = 4;
/// High bit of the SRTCP trailer word: payload is encrypted.
pub const SRTCP_E_BIT: u32 = 0x8000_0000;
/// Low 31 bits of the SRTCP trailer word.
pub const SRTCP_INDEX_MASK: u32 = 0x7fff_ffff;

/// Validates the RTP header and returns the offset where the encrypted
/// region begins: past the fixed header, the CSRC list, and the extension
/// if the X bit is set.
pub fn rtp_payload_offset(packet: &[u8]) -> Result<usize, SrtpError> {
    if packet.len() < RTP_HEADER_LEN {
        return Err(SrtpError::BadParam);
    }
    let cc = (packet[0] & 0x0f) as usize;
    let x = packet[0] & 0x10 != 0;

    let mut header_len = RTP_HEADER_LEN + 4 * cc;
    if x {
        if packet.len() < header_len + 4 {
            return Err(SrtpError::BadParam);
        }
        // The extension profile length counts 32-bit words past the
        // 4-octet extension header.
        let ext_words = BigEndian::read_u16(&packet[header_len + 2..header_len + 4]) as usize;
        header_len += 4 + 4 * ext_words;
    }
    if packet.len() < header_len {
        return Err(SrtpError::BadParam);
    }
    Ok(header_len)
}

/// Sequence number from a (validated) RTP header.
pub fn rtp_seq(packet: &[u8]) -> u16 {
    BigEndian::read_u16(&packet[2..4])
}

/// SSRC from a (validated) RTP header, in host order.
pub fn rtp_ssrc(packet: &[u8]) -> u32 {
    BigEndian::read_u32(&packet[8..12])
}

/// SSRC of the first packet in an RTCP compound, in host order.
pub fn rtcp_ssrc(packet: &[u8]) -> u32 {
    BigEndian::read_u32(&packet[4..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rtp_header(cc: u8, x: bool, ext_words: u16, payload: usize) -> Vec<u8> {
        let mut pkt = vec![0u8; RTP_HEADER_LEN];
        pkt[0] = 0x80 | cc | if x { 0x10 } else { 0 };
        BigEndian::write_u16(&mut pkt[2..4], 0x1234);
        BigEndian::write_u32(&mut pkt[8..12], 0xdead_beef);
        pkt.extend(std::iter::repeat(0xAA).take(4 * cc as usize));
        if x {
            let mut ext = vec![0u8; 4];
            BigEndian::write_u16(&mut ext[2..4], ext_words);
            pkt.extend(ext);
            pkt.extend(std::iter::repeat(0xBB).take(4 * ext_words as usize));
        }
        pkt.extend(std::iter::repeat(0xCC).take(payload));
        pkt
    }

    #[test]
    fn plain_header() {
        let pkt = rtp_header(0, false, 0, 5);
        assert_eq!(rtp_payload_offset(&pkt).unwrap(), 12);
        assert_eq!(rtp_seq(&pkt), 0x1234);
        assert_eq!(rtp_ssrc(&pkt), 0xdead_beef);
    }

    #[test]
    fn csrcs_and_extension() {
        let pkt = rtp_header(3, true, 2, 5);
        assert_eq!(rtp_payload_offset(&pkt).unwrap(), 12 + 12 + 4 + 8);
    }

    #[test]
    fn max_csrc_extension_exact_fit() {
        // CC=15 and X=1 with an extension that exactly fills the packet.
        let pkt = rtp_header(15, true, 1, 0);
        assert_eq!(rtp_payload_offset(&pkt).unwrap(), pkt.len());

        let mut short = pkt.clone();
        short.pop();
        assert_eq!(rtp_payload_offset(&short).unwrap_err(), SrtpError::BadParam);
    }

    #[test]
    fn truncated_packets() {
        assert_eq!(rtp_payload_offset(&[0u8; 11]).unwrap_err(), SrtpError::BadParam);
        // X bit set, but no room for the extension header.
        let mut pkt = rtp_header(0, false, 0, 0);
        pkt[0] |= 0x10;
        assert_eq!(rtp_payload_offset(&pkt).unwrap_err(), SrtpError::BadParam);
    }
}
