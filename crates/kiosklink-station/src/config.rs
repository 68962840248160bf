use std::time::Duration;

use kiosklink_frame::CodecConfig;

/// Bytes requested per socket read. One read is treated as one frame.
pub const DEFAULT_READ_BUFFER: usize = 1024;

/// Identifier length on the wire for power banks.
pub const POWER_BANK_ID_LEN: usize = 8;

/// What to do with the old connection when a station logs in again elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SupersedePolicy {
    /// Close the stale connection so it cannot linger half-registered.
    #[default]
    Close,
    /// Only replace the registry entry; the stale socket stays open until it fails.
    Keep,
}

/// Per-connection behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Size of the read buffer; bytes beyond this in one read are split.
    pub read_buffer_size: usize,
    /// Close a connection that stays silent this long. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Reconnect handling.
    pub supersede: SupersedePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER,
            idle_timeout: None,
            supersede: SupersedePolicy::default(),
        }
    }
}

/// A power bank sitting in a slot, as reported in query replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerBankSlot {
    pub slot: u8,
    /// Power-bank identifier; padded or truncated to 8 bytes on the wire.
    pub id: String,
    /// Charge level.
    pub level: u8,
}

/// Values the gateway answers query opcodes with.
#[derive(Debug, Clone)]
pub struct ReplyProfile {
    pub firmware_version: String,
    pub iccid: String,
    pub voice_level: u8,
    pub inventory: Vec<PowerBankSlot>,
}

impl Default for ReplyProfile {
    fn default() -> Self {
        Self {
            firmware_version: format!("kiosklink-{}", env!("CARGO_PKG_VERSION")),
            iccid: "00000000000000000000".to_string(),
            voice_level: 8,
            inventory: Vec::new(),
        }
    }
}

impl ReplyProfile {
    /// The power bank in `slot`, if the profile lists one.
    pub fn power_bank(&self, slot: u8) -> Option<&PowerBankSlot> {
        self.inventory.iter().find(|bank| bank.slot == slot)
    }
}

/// Everything the gateway needs to run.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub codec: CodecConfig,
    pub session: SessionConfig,
    pub replies: ReplyProfile,
}

/// Pad or truncate an identifier to exactly 8 bytes.
pub fn power_bank_id_bytes(id: &str) -> [u8; POWER_BANK_ID_LEN] {
    let mut out = [0u8; POWER_BANK_ID_LEN];
    let bytes = id.as_bytes();
    let n = bytes.len().min(POWER_BANK_ID_LEN);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}
