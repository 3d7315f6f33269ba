use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DIRECTION_COUNT, NAME_BYTES, SIGNATURE_BYTES},
    crypto::{digest::encode_name, hash::decode_hex},
    error::{AppError, Result},
};

/// Move direction as encoded in the contract's `uint8 dir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Join,
    Move,
    SetName,
}

impl IntentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentKind::Join => "join",
            IntentKind::Move => "move",
            IntentKind::SetName => "set_name",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinIntent {
    pub player: Address,
    pub sequence: u64,
    pub expiry: u64,
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveIntent {
    pub player: Address,
    pub dir: Direction,
    pub sequence: u64,
    pub expiry: u64,
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetNameIntent {
    pub player: Address,
    pub name: [u8; NAME_BYTES],
    pub sequence: u64,
    pub expiry: u64,
    pub signature: Bytes,
}

/// A signed request to change arena state. Consumed once by the relayer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Join(JoinIntent),
    Move(MoveIntent),
    SetName(SetNameIntent),
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Join(_) => IntentKind::Join,
            Intent::Move(_) => IntentKind::Move,
            Intent::SetName(_) => IntentKind::SetName,
        }
    }

    pub fn player(&self) -> Address {
        match self {
            Intent::Join(i) => i.player,
            Intent::Move(i) => i.player,
            Intent::SetName(i) => i.player,
        }
    }

    pub fn sequence(&self) -> u64 {
        match self {
            Intent::Join(i) => i.sequence,
            Intent::Move(i) => i.sequence,
            Intent::SetName(i) => i.sequence,
        }
    }

    pub fn expiry(&self) -> u64 {
        match self {
            Intent::Join(i) => i.expiry,
            Intent::Move(i) => i.expiry,
            Intent::SetName(i) => i.expiry,
        }
    }

    pub fn signature(&self) -> &Bytes {
        match self {
            Intent::Join(i) => &i.signature,
            Intent::Move(i) => &i.signature,
            Intent::SetName(i) => &i.signature,
        }
    }

    /// `expiry == 0` never expires.
    pub fn is_expired_at(&self, now_unix: u64) -> bool {
        let expiry = self.expiry();
        expiry != 0 && expiry < now_unix
    }
}

// ==================== REQUEST TYPES ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub player: String,
    pub sequence: u64,
    #[serde(default)]
    pub expiry: u64,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNameRequest {
    pub player: String,
    /// Exact on-chain payload. Takes precedence over `name`.
    #[serde(default)]
    pub name_bytes12: Option<String>,
    /// Plain display name, encoded the way clients sign it.
    #[serde(default)]
    pub name: Option<String>,
    pub sequence: u64,
    #[serde(default)]
    pub expiry: u64,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub player: String,
    pub dir: i64,
    pub sequence: u64,
    #[serde(default)]
    pub expiry: u64,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickRequest {
    pub player: String,
}

impl TryFrom<JoinRequest> for JoinIntent {
    type Error = AppError;

    fn try_from(req: JoinRequest) -> Result<Self> {
        Ok(Self {
            player: parse_address(&req.player)?,
            sequence: req.sequence,
            expiry: req.expiry,
            signature: parse_signature(&req.signature)?,
        })
    }
}

impl TryFrom<MoveRequest> for MoveIntent {
    type Error = AppError;

    fn try_from(req: MoveRequest) -> Result<Self> {
        let dir = u8::try_from(req.dir)
            .ok()
            .and_then(Direction::from_code)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Bad dir: expected 0..{}",
                    DIRECTION_COUNT - 1
                ))
            })?;
        Ok(Self {
            player: parse_address(&req.player)?,
            dir,
            sequence: req.sequence,
            expiry: req.expiry,
            signature: parse_signature(&req.signature)?,
        })
    }
}

impl TryFrom<SetNameRequest> for SetNameIntent {
    type Error = AppError;

    fn try_from(req: SetNameRequest) -> Result<Self> {
        Ok(Self {
            player: parse_address(&req.player)?,
            name: match (req.name_bytes12.as_deref(), req.name.as_deref()) {
                (Some(raw), _) => parse_name_bytes12(raw)?,
                (None, Some(name)) => encode_name(name),
                (None, None) => {
                    return Err(AppError::Validation(
                        "nameBytes12 or name is required".to_string(),
                    ))
                }
            },
            sequence: req.sequence,
            expiry: req.expiry,
            signature: parse_signature(&req.signature)?,
        })
    }
}

// ==================== RESPONSE TYPES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { ok: true, data }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub submission_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub submission_id: String,
    pub deduped: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceResponse {
    pub player: String,
    pub sequence: u64,
}

// ==================== FIELD PARSERS ====================

/// Parses a `0x`-prefixed 20-byte address. Hex case is ignored.
pub fn parse_address(value: &str) -> Result<Address> {
    let trimmed = value.trim();
    let raw = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| AppError::Validation("Bad player address".to_string()))?;
    if raw.len() != 40 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::Validation("Bad player address".to_string()));
    }
    let bytes =
        hex::decode(raw).map_err(|_| AppError::Validation("Bad player address".to_string()))?;
    Ok(Address::from_slice(&bytes))
}

pub fn parse_signature(value: &str) -> Result<Bytes> {
    let bytes = decode_hex(value)
        .filter(|bytes| bytes.len() == SIGNATURE_BYTES)
        .ok_or_else(|| AppError::Validation("Bad signature encoding".to_string()))?;
    Ok(Bytes::from(bytes))
}

pub fn parse_name_bytes12(value: &str) -> Result<[u8; NAME_BYTES]> {
    let bytes = decode_hex(value)
        .filter(|bytes| bytes.len() == NAME_BYTES)
        .ok_or_else(|| {
            AppError::Validation(format!("nameBytes12 must be exactly {NAME_BYTES} bytes hex"))
        })?;
    let mut name = [0u8; NAME_BYTES];
    name.copy_from_slice(&bytes);
    Ok(name)
}
