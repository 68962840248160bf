//! Opcode dispatch for frames arriving from stations.
//!
//! Each opcode maps to a plain handler function that looks at the decoded
//! frame and decides what, if anything, to answer. Frames shorter than the
//! handler requires are dropped without a reply: malformed requests are not
//! answered.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};
use kiosklink_frame::catalog::put_cstring;
use kiosklink_frame::codec::MIN_FRAME_LEN;
use kiosklink_frame::opcode::{self, opcode_name};
use kiosklink_frame::{lookup_opcode, CodecConfig, Frame, Token, HEADER_SIZE};
use tracing::{debug, info, warn};

use crate::config::{power_bank_id_bytes, ReplyProfile, POWER_BANK_ID_LEN};
use crate::login::{LoginRequest, StationId};

/// Success byte carried in acknowledgements.
pub const SUCCESS: u8 = 0x01;

/// Return frames carry a slot byte and an 8-byte power-bank id.
const RETURN_MIN_LEN: usize = HEADER_SIZE + 1 + POWER_BANK_ID_LEN;

/// What a handler wants sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send nothing.
    Silent,
    /// Send the received bytes back, cut to the declared frame length.
    Echo,
    /// Send a frame with the request's opcode and token and this payload.
    Payload(Vec<u8>),
}

/// Result of running one handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub reply: Reply,
    pub station: Option<StationId>,
}

impl Outcome {
    fn reply(payload: Vec<u8>) -> Self {
        Self {
            reply: Reply::Payload(payload),
            station: None,
        }
    }

    fn ack() -> Self {
        Self::reply(Vec::new())
    }
}

/// Handler signature: pure function of the frame and the reply profile.
pub type Handler = fn(&Frame, &ReplyProfile) -> Outcome;

#[derive(Clone, Copy)]
struct Route {
    min_len: usize,
    handler: Handler,
}

/// Result of handling one socket read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Bytes to write back to the station.
    pub reply: Option<Bytes>,
    /// Identity extracted from a login frame.
    pub station: Option<StationId>,
    /// Token carried by the decoded frame.
    pub token: Option<Token>,
}

/// Opcode-keyed handler table.
pub struct Dispatcher {
    routes: HashMap<u8, Route>,
    codec: CodecConfig,
    profile: ReplyProfile,
}

impl Dispatcher {
    /// Build the dispatcher with every built-in opcode handler.
    pub fn new(codec: CodecConfig, profile: ReplyProfile) -> Self {
        let mut dispatcher = Self {
            routes: HashMap::new(),
            codec,
            profile,
        };
        dispatcher.route(opcode::LOGIN, MIN_FRAME_LEN, handle_login);
        dispatcher.route(opcode::RETURN_POWER_BANK, RETURN_MIN_LEN, handle_return);
        dispatcher.route_catalog(opcode::HEARTBEAT, handle_heartbeat);
        dispatcher.route_catalog(opcode::QUERY_FIRMWARE, handle_query_firmware);
        dispatcher.route_catalog(opcode::RENT, handle_release);
        dispatcher.route_catalog(opcode::EJECT, handle_release);
        dispatcher.route_catalog(opcode::QUERY_ICCID, handle_query_iccid);
        dispatcher.route_catalog(opcode::GET_VOICE, handle_get_voice);
        dispatcher.route_catalog(opcode::SET_VOICE, handle_ack);
        dispatcher.route_catalog(opcode::QUERY_INVENTORY, handle_query_inventory);
        dispatcher.route_catalog(opcode::RESTART, handle_ack);
        dispatcher.route_catalog(opcode::SET_SERVER, handle_ack);
        dispatcher
    }

    /// Install or replace the handler for `opcode`.
    pub fn route(&mut self, opcode: u8, min_len: usize, handler: Handler) {
        self.routes.insert(opcode, Route { min_len, handler });
    }

    /// Install a handler whose minimum length comes from the command catalog.
    fn route_catalog(&mut self, opcode: u8, handler: Handler) {
        let min_len = lookup_opcode(opcode)
            .filter(|spec| spec.param.min_payload_len() > 0)
            .map(|spec| spec.min_frame_len())
            .unwrap_or(MIN_FRAME_LEN);
        self.route(opcode, min_len, handler);
    }

    pub fn codec(&self) -> &CodecConfig {
        &self.codec
    }

    /// Decode one socket read and dispatch it.
    ///
    /// `raw` must hold exactly one frame; reads are not reassembled. Decode
    /// failures are logged and yield an empty [`Dispatch`].
    pub fn handle_incoming(&self, raw: &[u8]) -> Dispatch {
        match self.codec.decode(raw) {
            Ok(frame) => self.handle(&frame),
            Err(err) => {
                warn!(error = %err, len = raw.len(), "dropping undecodable frame");
                Dispatch::default()
            }
        }
    }

    /// Run the handler for an already decoded frame.
    pub fn handle(&self, frame: &Frame) -> Dispatch {
        let name = opcode_name(frame.opcode);
        let Some(route) = self.routes.get(&frame.opcode) else {
            info!(opcode = %format_args!("0x{:02x}", frame.opcode), "received unhandled opcode");
            return Dispatch {
                token: Some(frame.token),
                ..Dispatch::default()
            };
        };

        if frame.wire_size() < route.min_len {
            debug!(
                opcode = name,
                len = frame.wire_size(),
                min = route.min_len,
                "dropping short frame"
            );
            return Dispatch {
                token: Some(frame.token),
                ..Dispatch::default()
            };
        }

        let outcome = (route.handler)(frame, &self.profile);
        let reply = match outcome.reply {
            Reply::Silent => None,
            Reply::Echo => Some(echo_bytes(frame)),
            Reply::Payload(payload) => {
                match self.codec.encode(frame.opcode, &frame.token, &payload) {
                    Ok(reply) => Some(reply.into_bytes()),
                    Err(err) => {
                        warn!(opcode = name, error = %err, "failed to encode reply");
                        None
                    }
                }
            }
        };

        Dispatch {
            reply,
            station: outcome.station,
            token: Some(frame.token),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(CodecConfig::default(), ReplyProfile::default())
    }
}

/// The received frame cut to its declared length.
fn echo_bytes(frame: &Frame) -> Bytes {
    let raw = frame.raw();
    let len = usize::from(frame.length).clamp(MIN_FRAME_LEN, raw.len());
    raw.slice(..len)
}

fn handle_login(frame: &Frame, _profile: &ReplyProfile) -> Outcome {
    let login = LoginRequest::parse(&frame.payload);
    match &login.station {
        Some(station) => info!(
            %station,
            token = %frame.token,
            magic = %format_args!("0x{:04x}", login.magic),
            random = %hex::encode(login.random),
            request_data = %hex::encode(&login.request_data),
            "received login"
        ),
        None => warn!(len = frame.payload.len(), "login without usable box id"),
    }
    Outcome {
        reply: Reply::Payload(vec![SUCCESS]),
        station: login.station,
    }
}

fn handle_heartbeat(_frame: &Frame, _profile: &ReplyProfile) -> Outcome {
    debug!("received heartbeat");
    Outcome {
        reply: Reply::Echo,
        station: None,
    }
}

fn handle_return(frame: &Frame, _profile: &ReplyProfile) -> Outcome {
    let slot = frame.payload[0];
    let bank = &frame.payload[1..1 + POWER_BANK_ID_LEN];
    info!(slot, power_bank = %hex::encode(bank), "received power bank return");
    Outcome::reply(vec![slot, SUCCESS])
}

fn handle_query_firmware(_frame: &Frame, profile: &ReplyProfile) -> Outcome {
    Outcome::reply(cstring_payload(&profile.firmware_version))
}

/// Rent and eject share a reply shape.
fn handle_release(frame: &Frame, profile: &ReplyProfile) -> Outcome {
    let slot = frame.payload[0];
    let bank = profile
        .power_bank(slot)
        .map(|bank| power_bank_id_bytes(&bank.id))
        .unwrap_or([0u8; POWER_BANK_ID_LEN]);
    info!(
        opcode = opcode_name(frame.opcode),
        slot,
        "received release request"
    );

    let mut payload = Vec::with_capacity(2 + POWER_BANK_ID_LEN);
    payload.push(slot);
    payload.push(SUCCESS);
    payload.extend_from_slice(&bank);
    Outcome::reply(payload)
}

fn handle_query_iccid(_frame: &Frame, profile: &ReplyProfile) -> Outcome {
    Outcome::reply(cstring_payload(&profile.iccid))
}

fn handle_get_voice(_frame: &Frame, profile: &ReplyProfile) -> Outcome {
    Outcome::reply(vec![profile.voice_level])
}

fn handle_query_inventory(_frame: &Frame, profile: &ReplyProfile) -> Outcome {
    let banks = &profile.inventory[..profile.inventory.len().min(usize::from(u8::MAX))];
    let mut buf = BytesMut::with_capacity(1 + banks.len() * (2 + POWER_BANK_ID_LEN));
    buf.put_u8(banks.len() as u8);
    for bank in banks {
        buf.put_u8(bank.slot);
        buf.put_slice(&power_bank_id_bytes(&bank.id));
        buf.put_u8(bank.level);
    }
    Outcome::reply(buf.to_vec())
}

fn handle_ack(frame: &Frame, _profile: &ReplyProfile) -> Outcome {
    debug!(opcode = opcode_name(frame.opcode), "acknowledging");
    Outcome::ack()
}

fn cstring_payload(value: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(value.len() + 3);
    put_cstring(&mut buf, value);
    buf.to_vec()
}
