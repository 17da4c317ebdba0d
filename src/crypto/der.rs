/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Just enough DER to pull the attestation certificate out of a registration
//! message and the subject public key out of that certificate.

use crate::errors::ValidationError;

const CONSTRUCTED: u8 = 1 << 5;
const CONTEXT_SPECIFIC: u8 = 2 << 6;

/// ASN.1 Tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Integer = 0x02,
    BitString = 0x03,
    Sequence = CONSTRUCTED | 0x10, // 0x30 or decimal 48
    ContextSpecificConstructed0 = CONTEXT_SPECIFIC | CONSTRUCTED,
}

type Result<T> = std::result::Result<T, ValidationError>;

fn malformed() -> ValidationError {
    ValidationError::MalformedRegistration("attestation certificate")
}

pub struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data }
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Reads one element, returning its tag, its value and its complete
    /// encoding.
    pub fn read_tlv(&mut self) -> Result<(u8, &'a [u8], &'a [u8])> {
        // So we don't panic below, when accessing individual bytes
        if self.data.len() < 2 {
            return Err(malformed());
        }
        let tag = self.data[0];

        // The short form of length is a single byte with the high order bit
        // set to zero. The long form of length is one byte with the high
        // order bit set, followed by N bytes, where N is encoded in the
        // lowest 7 bits of the first byte.
        let (header, len) = if self.data[1] & 0x80 == 0 {
            (2, self.data[1] as usize)
        } else {
            let n = (self.data[1] & 0x7f) as usize;
            if n == 0 || n > 4 || self.data.len() < 2 + n {
                return Err(malformed());
            }
            let bytes = &self.data[2..2 + n];
            // Not shortest possible encoding, forbidden by DER.
            if bytes[0] == 0 || (n == 1 && bytes[0] < 0x80) {
                return Err(malformed());
            }
            let len = bytes.iter().fold(0usize, |acc, b| acc << 8 | *b as usize);
            (2 + n, len)
        };

        let end = header.checked_add(len).ok_or_else(malformed)?;
        if self.data.len() < end {
            return Err(malformed());
        }

        let whole = &self.data[..end];
        self.data = &self.data[end..];
        Ok((tag, &whole[header..], whole))
    }

    pub fn expect(&mut self, tag: Tag) -> Result<&'a [u8]> {
        let (actual, value, _) = self.read_tlv()?;
        if actual != tag as u8 {
            return Err(malformed());
        }
        Ok(value)
    }

    pub fn skip_optional(&mut self, tag: Tag) -> Result<()> {
        if self.peek_tag() == Some(tag as u8) {
            self.read_tlv()?;
        }
        Ok(())
    }
}

/// Splits a certificate off the front of `data`, returning it and whatever
/// follows it.
pub fn split_certificate(data: &[u8]) -> Result<(&[u8], &[u8])> {
    let mut reader = Reader::new(data);
    let (tag, _, certificate) = reader.read_tlv()?;
    if tag != Tag::Sequence as u8 {
        return Err(malformed());
    }
    Ok((certificate, reader.remaining()))
}

/// The raw subjectPublicKey bits of an X.509 certificate.
pub fn certificate_public_key(certificate: &[u8]) -> Result<&[u8]> {
    let mut outer = Reader::new(Reader::new(certificate).expect(Tag::Sequence)?);
    let mut tbs = Reader::new(outer.expect(Tag::Sequence)?);

    tbs.skip_optional(Tag::ContextSpecificConstructed0)?; // version
    tbs.expect(Tag::Integer)?; // serialNumber
    tbs.expect(Tag::Sequence)?; // signature
    tbs.expect(Tag::Sequence)?; // issuer
    tbs.expect(Tag::Sequence)?; // validity
    tbs.expect(Tag::Sequence)?; // subject

    let mut spki = Reader::new(tbs.expect(Tag::Sequence)?);
    spki.expect(Tag::Sequence)?; // algorithm
    let bits = spki.expect(Tag::BitString)?;

    // Leading byte counts the unused bits of the last byte.
    match bits.split_first() {
        Some((0, key)) => Ok(key),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
pub(crate) fn encode(tag: Tag, value: &[u8]) -> Vec<u8> {
    let mut out = vec![tag as u8];
    let len = value.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.extend_from_slice(&[0x81, len as u8]);
    } else {
        out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(value);
    out
}

/// A structurally valid but otherwise meaningless certificate around
/// `public_key`.
#[cfg(test)]
pub(crate) fn fake_certificate(public_key: &[u8]) -> Vec<u8> {
    let name = encode(Tag::Sequence, &encode(Tag::Integer, b"test"));

    let mut bits = vec![0x00];
    bits.extend_from_slice(public_key);
    let mut spki = encode(Tag::Sequence, &encode(Tag::Integer, &[0x01]));
    spki.extend_from_slice(&encode(Tag::BitString, &bits));

    let mut tbs = encode(Tag::ContextSpecificConstructed0, &encode(Tag::Integer, &[0x02]));
    tbs.extend_from_slice(&encode(Tag::Integer, &[0x01, 0x02, 0x03]));
    tbs.extend_from_slice(&encode(Tag::Sequence, &[]));
    tbs.extend_from_slice(&name);
    tbs.extend_from_slice(&encode(Tag::Sequence, &[]));
    tbs.extend_from_slice(&name);
    tbs.extend_from_slice(&encode(Tag::Sequence, &spki));

    let mut certificate = encode(Tag::Sequence, &tbs);
    certificate.extend_from_slice(&encode(Tag::Sequence, &[]));
    certificate.extend_from_slice(&encode(Tag::BitString, &[0x00, 0xaa]));
    encode(Tag::Sequence, &certificate)
}
