//! Principal - the textual identifier the ledger keys balances by.
//!
//! Text form: lowercase base32 (RFC 4648, no padding) of
//! `crc32(bytes) ‖ bytes`, split into dash-separated groups of five.
//!
//! ```ignore
//! let anon = Principal::anonymous();
//! assert_eq!(anon.to_text(), "2vxsx-fae");
//! assert_eq!(Principal::from_text("2vxsx-fae")?, anon);
//! ```

use crate::error::PrincipalError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha224};
use std::fmt;
use std::str::FromStr;

const MAX_LEN: usize = 29;
const TAG_SELF_AUTHENTICATING: u8 = 0x02;
const TAG_ANONYMOUS: u8 = 0x04;
const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal(Vec<u8>);

impl Principal {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrincipalError> {
        if bytes.len() > MAX_LEN {
            return Err(PrincipalError::TooLong(bytes.len()));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// The caller seen by the ledger when no identity is attached.
    pub fn anonymous() -> Self { Self(vec![TAG_ANONYMOUS]) }

    /// Principal owned by a key pair: `sha224(public_key) ‖ 0x02`.
    pub fn self_authenticating(public_key: &[u8]) -> Self {
        let mut bytes = Sha224::digest(public_key).to_vec();
        bytes.push(TAG_SELF_AUTHENTICATING);
        Self(bytes)
    }

    pub fn is_anonymous(&self) -> bool { self.0 == [TAG_ANONYMOUS] }

    pub fn as_slice(&self) -> &[u8] { &self.0 }

    pub fn to_text(&self) -> String {
        let mut raw = Vec::with_capacity(self.0.len() + 4);
        raw.extend_from_slice(&crc32(&self.0).to_be_bytes());
        raw.extend_from_slice(&self.0);
        let encoded = base32_encode(&raw);

        let mut out = String::with_capacity(encoded.len() + encoded.len() / 5);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % 5 == 0 {
                out.push('-');
            }
            out.push(c);
        }
        out
    }

    /// Parse the canonical text form. Anything that does not re-encode to
    /// exactly the input is rejected.
    pub fn from_text(text: &str) -> Result<Self, PrincipalError> {
        if text.is_empty() {
            return Err(PrincipalError::Empty);
        }
        let compact: String = text.to_ascii_lowercase().chars().filter(|c| *c != '-').collect();
        let raw = base32_decode(&compact)?;
        if raw.len() < 4 {
            return Err(PrincipalError::Checksum);
        }
        let (checksum, body) = raw.split_at(4);
        let principal = Self::from_slice(body)?;
        if checksum != crc32(body).to_be_bytes() {
            return Err(PrincipalError::Checksum);
        }
        let expected = principal.to_text();
        if expected != text {
            return Err(PrincipalError::NotCanonical { expected });
        }
        Ok(principal)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_text()) }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Principal({})", self.to_text()) }
}

impl FromStr for Principal {
    type Err = PrincipalError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::from_text(s) }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_text(&text).map_err(serde::de::Error::custom)
    }
}

/// CRC-32/ISO-HDLC (the zlib/IEEE variant).
fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 31) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 31) as usize] as char);
    }
    out
}

fn base32_decode(text: &str) -> Result<Vec<u8>, PrincipalError> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for c in text.chars() {
        let value = ALPHABET
            .iter()
            .position(|a| *a as char == c)
            .ok_or(PrincipalError::InvalidChar(c))? as u32;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
        buffer &= (1 << bits) - 1;
    }
    Ok(out)
}
