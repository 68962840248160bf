use std::borrow::Borrow;
use std::fmt;

use bytes::Bytes;

/// Offset of the box id length inside the login payload: random (4) + magic (2).
const BOX_ID_LEN_OFFSET: usize = 6;
/// First byte of the box id.
const BOX_ID_OFFSET: usize = BOX_ID_LEN_OFFSET + 2;

/// A station's self-reported identity ("box id"); the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(String);

impl StationId {
    /// Wrap an identity. Returns `None` for an empty string.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed login payload.
///
/// ```text
/// ┌────────────┬───────────┬──────────────┬───────────┬──────────────────┬─────────┐
/// │ Random (4) │ Magic (2) │ BoxIdLen (2) │ BoxId (N) │ ReqDataLen (2)?  │ ReqData │
/// └────────────┴───────────┴──────────────┴───────────┴──────────────────┴─────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub random: [u8; 4],
    pub magic: u16,
    /// `None` when the payload is too short to carry the box id.
    pub station: Option<StationId>,
    pub request_data: Bytes,
}

impl LoginRequest {
    /// Parse a login payload. Never fails: missing pieces come back empty.
    pub fn parse(payload: &Bytes) -> Self {
        let mut random = [0u8; 4];
        let head = payload.len().min(4);
        random[..head].copy_from_slice(&payload[..head]);

        let magic = read_u16(payload, 4).unwrap_or(0);

        let Some(box_id_len) = read_u16(payload, BOX_ID_LEN_OFFSET) else {
            return Self::without_station(random, magic);
        };
        let box_id_end = BOX_ID_OFFSET + usize::from(box_id_len);
        let Some(box_id) = payload.get(BOX_ID_OFFSET..box_id_end) else {
            return Self::without_station(random, magic);
        };
        let station = StationId::new(
            String::from_utf8_lossy(box_id)
                .trim_matches('\0')
                .to_string(),
        );

        let request_data = read_u16(payload, box_id_end)
            .and_then(|len| {
                let start = box_id_end + 2;
                let end = (start + usize::from(len)).min(payload.len());
                (start <= end).then(|| payload.slice(start..end))
            })
            .unwrap_or_default();

        Self {
            random,
            magic,
            station,
            request_data,
        }
    }

    fn without_station(random: [u8; 4], magic: u16) -> Self {
        Self {
            random,
            magic,
            station: None,
            request_data: Bytes::new(),
        }
    }
}

fn read_u16(buf: &[u8], at: usize) -> Option<u16> {
    let bytes = buf.get(at..at + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

#[cfg(test)]
pub(crate) fn login_payload(box_id: &str, request_data: Option<&[u8]>) -> Vec<u8> {
    let mut payload = vec![0xDE, 0xAD, 0xBE, 0xEF, 0x12, 0x34];
    payload.extend_from_slice(&((box_id.len() + 1) as u16).to_be_bytes());
    payload.extend_from_slice(box_id.as_bytes());
    payload.push(0x00);
    if let Some(data) = request_data {
        payload.extend_from_slice(&(data.len() as u16).to_be_bytes());
        payload.extend_from_slice(data);
    }
    payload
}
