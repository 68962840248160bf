//! Static table of gateway-issued commands.
//!
//! Each entry ties a symbolic name to its opcode and to the shape of its
//! single parameter. The inbound dispatcher uses the same table to know how
//! many bytes a station's answer must carry before it is worth replying to.

use bytes::{BufMut, BytesMut};

use crate::codec::HEADER_SIZE;
use crate::error::CommandError;
use crate::opcode;

/// Shape and validation rule for a command's parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// No payload; any parameter is ignored.
    None,
    /// One slot byte in `1..=255`.
    Slot,
    /// One volume byte in `0..=15`.
    Level,
    /// `host,port,interval` with a non-zero heartbeat interval in seconds.
    ServerAddress,
}

pub const SLOT_MIN: i64 = 1;
pub const SLOT_MAX: i64 = 255;
pub const LEVEL_MIN: i64 = 0;
pub const LEVEL_MAX: i64 = 15;

impl ParamKind {
    /// Minimum payload bytes a frame of this kind must carry.
    pub fn min_payload_len(self) -> usize {
        match self {
            ParamKind::None => 0,
            ParamKind::Slot | ParamKind::Level | ParamKind::ServerAddress => 1,
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub opcode: u8,
    pub param: ParamKind,
}

/// Every command the gateway can send to a station.
pub const CATALOG: &[CommandSpec] = &[
    CommandSpec::new("heartbeat", opcode::HEARTBEAT, ParamKind::None),
    CommandSpec::new("query_fw", opcode::QUERY_FIRMWARE, ParamKind::None),
    CommandSpec::new("restart", opcode::RESTART, ParamKind::None),
    CommandSpec::new("query_iccid", opcode::QUERY_ICCID, ParamKind::None),
    CommandSpec::new("voice_get", opcode::GET_VOICE, ParamKind::None),
    CommandSpec::new("query_power_bank", opcode::QUERY_INVENTORY, ParamKind::None),
    CommandSpec::new("rent", opcode::RENT, ParamKind::Slot),
    CommandSpec::new("eject", opcode::EJECT, ParamKind::Slot),
    CommandSpec::new("voice_set", opcode::SET_VOICE, ParamKind::Level),
    CommandSpec::new("set_server", opcode::SET_SERVER, ParamKind::ServerAddress),
];

/// Find a catalog entry by command name.
pub fn lookup(name: &str) -> Result<&'static CommandSpec, CommandError> {
    CATALOG
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))
}

/// Find a catalog entry by opcode.
pub fn lookup_opcode(opcode: u8) -> Option<&'static CommandSpec> {
    CATALOG.iter().find(|spec| spec.opcode == opcode)
}

impl CommandSpec {
    pub const fn new(name: &'static str, opcode: u8, param: ParamKind) -> Self {
        Self {
            name,
            opcode,
            param,
        }
    }

    /// Smallest frame (header included) that carries this command's parameter.
    pub fn min_frame_len(&self) -> usize {
        HEADER_SIZE + self.param.min_payload_len()
    }

    /// Validate `param` and produce the payload bytes.
    pub fn build_payload(&self, param: &str) -> Result<Vec<u8>, CommandError> {
        match self.param {
            ParamKind::None => Ok(Vec::new()),
            ParamKind::Slot => {
                let slot = self.parse_in_range(param, "slot", SLOT_MIN, SLOT_MAX)?;
                Ok(vec![slot])
            }
            ParamKind::Level => {
                let level = self.parse_in_range(param, "level", LEVEL_MIN, LEVEL_MAX)?;
                Ok(vec![level])
            }
            ParamKind::ServerAddress => self.server_address_payload(param),
        }
    }

    fn parse_in_range(
        &self,
        raw: &str,
        what: &str,
        min: i64,
        max: i64,
    ) -> Result<u8, CommandError> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| self.invalid(format!("{what} {raw:?} is not an integer")))?;
        if !(min..=max).contains(&value) {
            return Err(self.invalid(format!("{what} {value} outside [{min}, {max}]")));
        }
        // Range check above keeps this within u8.
        Ok(value as u8)
    }

    fn server_address_payload(&self, raw: &str) -> Result<Vec<u8>, CommandError> {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let [host, port, interval] = parts.as_slice() else {
            return Err(self.invalid(format!("expected host,port,interval, got {raw:?}")));
        };
        if host.is_empty() {
            return Err(self.invalid("host must not be empty".to_string()));
        }
        let port_num: u16 = port
            .parse()
            .map_err(|_| self.invalid(format!("port {port:?} is not a valid port")))?;
        if port_num == 0 {
            return Err(self.invalid("port must be greater than zero".to_string()));
        }
        let interval: u8 = interval
            .parse()
            .map_err(|_| self.invalid(format!("interval {interval:?} is not in [1, 255]")))?;
        if interval == 0 {
            return Err(self.invalid("interval must be greater than zero".to_string()));
        }

        let mut buf = BytesMut::with_capacity(host.len() + port.len() + 7);
        put_cstring(&mut buf, host);
        put_cstring(&mut buf, port);
        buf.put_u8(interval);
        Ok(buf.to_vec())
    }

    fn invalid(&self, reason: String) -> CommandError {
        CommandError::InvalidParameter {
            command: self.name,
            reason,
        }
    }

    #[cfg(test)]
    pub(crate) fn sample_param(&self) -> &'static str {
        match self.param {
            ParamKind::None => "",
            ParamKind::Slot => "5",
            ParamKind::Level => "7",
            ParamKind::ServerAddress => "gw.example.com,9000,30",
        }
    }
}

/// Write a big-endian u16 length (NUL included), the bytes, then a NUL.
pub fn put_cstring(buf: &mut BytesMut, value: &str) {
    buf.put_u16((value.len() + 1) as u16);
    buf.put_slice(value.as_bytes());
    buf.put_u8(0x00);
}
