//! Protocol opcodes.
//!
//! The same byte is used in both directions: a station sends `RENT` back as the
//! answer to a gateway-issued `RENT`.

/// Station login (station → gateway).
pub const LOGIN: u8 = 0x60;

/// Keep-alive.
pub const HEARTBEAT: u8 = 0x61;

/// Firmware version query.
pub const QUERY_FIRMWARE: u8 = 0x62;

/// Reconfigure server address and heartbeat interval.
pub const SET_SERVER: u8 = 0x63;

/// Power-bank inventory query.
pub const QUERY_INVENTORY: u8 = 0x64;

/// Rent a power bank from a slot.
pub const RENT: u8 = 0x65;

/// A power bank was returned into a slot.
pub const RETURN_POWER_BANK: u8 = 0x66;

/// Restart the station.
pub const RESTART: u8 = 0x67;

/// SIM card ICCID query.
pub const QUERY_ICCID: u8 = 0x69;

/// Set speaker volume.
pub const SET_VOICE: u8 = 0x70;

/// Read speaker volume.
pub const GET_VOICE: u8 = 0x77;

/// Force-eject a power bank.
pub const EJECT: u8 = 0x80;

/// Returns a human-readable name for an opcode.
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        LOGIN => "login",
        HEARTBEAT => "heartbeat",
        QUERY_FIRMWARE => "query_fw",
        SET_SERVER => "set_server",
        QUERY_INVENTORY => "query_power_bank",
        RENT => "rent",
        RETURN_POWER_BANK => "return_power_bank",
        RESTART => "restart",
        QUERY_ICCID => "query_iccid",
        SET_VOICE => "voice_set",
        GET_VOICE => "voice_get",
        EJECT => "eject",
        _ => "unknown",
    }
}
