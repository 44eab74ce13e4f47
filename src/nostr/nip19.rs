//! NIP-19 bech32 identifiers.
//!
//! Bare forms (`npub`, `nsec`, `note`) carry 32 raw bytes. `nevent` carries a TLV
//! list: type 0 is the event id, 1 a relay hint, 2 the author, 3 the kind (u32 BE).
//! Decoding yields a tagged [`Nip19`] value; callers ask for the variant they expect
//! and get [`Nip19Error::Mismatch`] otherwise.

use bech32::{FromBase32, ToBase32, Variant};
use thiserror::Error;

const HRP_PUBLIC_KEY: &str = "npub";
const HRP_SECRET_KEY: &str = "nsec";
const HRP_NOTE: &str = "note";
const HRP_EVENT: &str = "nevent";

const TLV_SPECIAL: u8 = 0;
const TLV_RELAY: u8 = 1;
const TLV_AUTHOR: u8 = 2;
const TLV_KIND: u8 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Nip19Error {
    #[error("bech32 decoding failed: {0}")]
    Bech32(String),

    #[error("unknown prefix '{0}'")]
    UnknownPrefix(String),

    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("malformed TLV entry")]
    MalformedTlv,

    #[error("nevent without event id")]
    MissingId,

    #[error("expected {expected}, got {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Event reference with optional hints (`nevent`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPointer {
    pub id: String,
    pub relays: Vec<String>,
    pub author: Option<String>,
    pub kind: Option<u32>,
}

/// Decoded identifier; hex strings for keys and ids, raw bytes for secrets
#[derive(Clone, PartialEq, Eq)]
pub enum Nip19 {
    PublicKey(String),
    SecretKey([u8; 32]),
    Note(String),
    Event(EventPointer),
}

impl std::fmt::Debug for Nip19 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nip19::SecretKey(_) => f.write_str("SecretKey(..)"),
            Nip19::PublicKey(pk) => f.debug_tuple("PublicKey").field(pk).finish(),
            Nip19::Note(id) => f.debug_tuple("Note").field(id).finish(),
            Nip19::Event(ptr) => f.debug_tuple("Event").field(ptr).finish(),
        }
    }
}

impl Nip19 {
    fn kind_name(&self) -> &'static str {
        match self {
            Nip19::PublicKey(_) => HRP_PUBLIC_KEY,
            Nip19::SecretKey(_) => HRP_SECRET_KEY,
            Nip19::Note(_) => HRP_NOTE,
            Nip19::Event(_) => HRP_EVENT,
        }
    }

    /// Event id from `note` or `nevent`
    pub fn into_event_id(self) -> Result<String, Nip19Error> {
        match self {
            Nip19::Note(id) => Ok(id),
            Nip19::Event(ptr) => Ok(ptr.id),
            other => Err(Nip19Error::Mismatch {
                expected: "note or nevent",
                found: other.kind_name(),
            }),
        }
    }

    pub fn into_secret_key(self) -> Result<[u8; 32], Nip19Error> {
        match self {
            Nip19::SecretKey(sk) => Ok(sk),
            other => Err(Nip19Error::Mismatch {
                expected: HRP_SECRET_KEY,
                found: other.kind_name(),
            }),
        }
    }

    pub fn into_public_key(self) -> Result<String, Nip19Error> {
        match self {
            Nip19::PublicKey(pk) => Ok(pk),
            other => Err(Nip19Error::Mismatch {
                expected: HRP_PUBLIC_KEY,
                found: other.kind_name(),
            }),
        }
    }
}

pub fn decode(s: &str) -> Result<Nip19, Nip19Error> {
    let (hrp, data, _variant) =
        bech32::decode(s.trim()).map_err(|e| Nip19Error::Bech32(e.to_string()))?;
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| Nip19Error::Bech32(e.to_string()))?;

    match hrp.as_str() {
        HRP_PUBLIC_KEY => Ok(Nip19::PublicKey(hex::encode(fixed32(&bytes)?))),
        HRP_SECRET_KEY => Ok(Nip19::SecretKey(fixed32(&bytes)?)),
        HRP_NOTE => Ok(Nip19::Note(hex::encode(fixed32(&bytes)?))),
        HRP_EVENT => decode_event_tlv(&bytes).map(Nip19::Event),
        other => Err(Nip19Error::UnknownPrefix(other.to_string())),
    }
}

/// Accept a bech32 `note`/`nevent` or a raw 64-character hex id
pub fn parse_event_id(s: &str) -> Result<String, Nip19Error> {
    let s = s.trim();
    if s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(s.to_ascii_lowercase());
    }
    decode(s)?.into_event_id()
}

pub fn encode_note(id_hex: &str) -> Result<String, Nip19Error> {
    encode_hex32(HRP_NOTE, id_hex)
}

pub fn encode_npub(pubkey_hex: &str) -> Result<String, Nip19Error> {
    encode_hex32(HRP_PUBLIC_KEY, pubkey_hex)
}

pub fn encode_nevent(ptr: &EventPointer) -> Result<String, Nip19Error> {
    let mut tlv = Vec::new();
    push_tlv(&mut tlv, TLV_SPECIAL, &hex32(&ptr.id)?)?;
    for relay in &ptr.relays {
        push_tlv(&mut tlv, TLV_RELAY, relay.as_bytes())?;
    }
    if let Some(author) = &ptr.author {
        push_tlv(&mut tlv, TLV_AUTHOR, &hex32(author)?)?;
    }
    if let Some(kind) = ptr.kind {
        push_tlv(&mut tlv, TLV_KIND, &kind.to_be_bytes())?;
    }
    encode_raw(HRP_EVENT, &tlv)
}

fn decode_event_tlv(bytes: &[u8]) -> Result<EventPointer, Nip19Error> {
    let mut id = None;
    let mut relays = Vec::new();
    let mut author = None;
    let mut kind = None;

    let mut rest = bytes;
    while rest.len() >= 2 {
        let (t, len) = (rest[0], rest[1] as usize);
        let value = rest.get(2..2 + len).ok_or(Nip19Error::MalformedTlv)?;
        match t {
            TLV_SPECIAL => id = Some(hex::encode(fixed32(value)?)),
            TLV_RELAY => relays.push(String::from_utf8_lossy(value).into_owned()),
            TLV_AUTHOR => author = Some(hex::encode(fixed32(value)?)),
            TLV_KIND => {
                let raw: [u8; 4] = value.try_into().map_err(|_| Nip19Error::MalformedTlv)?;
                kind = Some(u32::from_be_bytes(raw));
            }
            // Unknown types are skipped per NIP-19
            _ => {}
        }
        rest = &rest[2 + len..];
    }
    if !rest.is_empty() {
        return Err(Nip19Error::MalformedTlv);
    }

    Ok(EventPointer {
        id: id.ok_or(Nip19Error::MissingId)?,
        relays,
        author,
        kind,
    })
}

fn fixed32(bytes: &[u8]) -> Result<[u8; 32], Nip19Error> {
    bytes
        .try_into()
        .map_err(|_| Nip19Error::InvalidLength(bytes.len()))
}

fn hex32(s: &str) -> Result<[u8; 32], Nip19Error> {
    let bytes = hex::decode(s).map_err(|e| Nip19Error::Bech32(e.to_string()))?;
    fixed32(&bytes)
}

fn push_tlv(out: &mut Vec<u8>, t: u8, value: &[u8]) -> Result<(), Nip19Error> {
    let len = u8::try_from(value.len()).map_err(|_| Nip19Error::MalformedTlv)?;
    out.push(t);
    out.push(len);
    out.extend_from_slice(value);
    Ok(())
}

fn encode_hex32(hrp: &str, s: &str) -> Result<String, Nip19Error> {
    encode_raw(hrp, &hex32(s)?)
}

fn encode_raw(hrp: &str, bytes: &[u8]) -> Result<String, Nip19Error> {
    bech32::encode(hrp, bytes.to_base32(), Variant::Bech32)
        .map_err(|e| Nip19Error::Bech32(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NPUB: &str = "npub1sn0wdenkukak0d9dfczzeacvhkrgz92ak56egt7vdgzn8pv2wfqqhrjdv9";
    const NPUB_HEX: &str = "84dee6e676e5bb67b4ad4e042cf70cbd8681155db535942fcc6a0533858a7240";
    const NSEC: &str = "nsec1vl029mgpspedva04g90vltkh6fvh240zqtv9k0t9af8935ke9laqsnlfe5";
    const NSEC_HEX: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

    #[test]
    fn test_decode_known_npub() {
        assert_eq!(decode(NPUB).unwrap(), Nip19::PublicKey(NPUB_HEX.to_string()));
        assert_eq!(encode_npub(NPUB_HEX).unwrap(), NPUB);
    }

    #[test]
    fn test_decode_known_nsec() {
        let sk = decode(NSEC).unwrap().into_secret_key().unwrap();
        assert_eq!(hex::encode(sk), NSEC_HEX);
    }

    #[test]
    fn test_variant_mismatch_is_an_error() {
        let err = decode(NPUB).unwrap().into_secret_key().unwrap_err();
        assert_eq!(
            err,
            Nip19Error::Mismatch {
                expected: "nsec",
                found: "npub"
            }
        );
        assert!(decode(NSEC).unwrap().into_event_id().is_err());
    }

    #[test]
    fn test_note_and_nevent_yield_same_id() {
        let id = "d1".repeat(32);
        let note = encode_note(&id).unwrap();
        assert!(note.starts_with("note1"));

        let nevent = encode_nevent(&EventPointer {
            id: id.clone(),
            relays: vec!["wss://relay.example".to_string()],
            author: Some(NPUB_HEX.to_string()),
            kind: Some(1),
        })
        .unwrap();

        assert_eq!(parse_event_id(&note).unwrap(), id);
        assert_eq!(parse_event_id(&nevent).unwrap(), id);

        match decode(&nevent).unwrap() {
            Nip19::Event(ptr) => {
                assert_eq!(ptr.relays, vec!["wss://relay.example".to_string()]);
                assert_eq!(ptr.author.as_deref(), Some(NPUB_HEX));
                assert_eq!(ptr.kind, Some(1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_event_id_accepts_hex() {
        let id = "AB".repeat(32);
        assert_eq!(parse_event_id(&id).unwrap(), "ab".repeat(32));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(decode("hello"), Err(Nip19Error::Bech32(_))));
        assert!(parse_event_id("note1xyz").is_err());
    }
}
