/// Application constants

// Name payloads are `bytes12` on-chain
pub const NAME_BYTES: usize = 12;

// r || s || v
pub const SIGNATURE_BYTES: usize = 65;

// Move direction codes accepted by the arena contract
pub const DIRECTION_COUNT: u8 = 4;

// Intent typehashes (kind discriminators inside the digest)
pub const JOIN_TYPE: &str = "Join(address player,uint256 nonce,uint256 deadline)";
pub const MOVE_TYPE: &str = "Move(address player,uint8 dir,uint256 nonce,uint256 deadline)";
pub const SET_NAME_TYPE: &str =
    "SetName(address player,bytes12 name,uint256 nonce,uint256 deadline)";

// Rate limits
pub const RATE_LIMIT_WINDOW_MS: u64 = 2_000;
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 25;
pub const RATE_LIMIT_PRUNE_INTERVAL_SECS: u64 = 30;

// Receipt polling
pub const DEFAULT_RELAYER_POLL_ATTEMPTS: usize = 20;
pub const DEFAULT_RELAYER_POLL_INTERVAL_MS: u64 = 1_500;

// Admin header for privileged calls
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

// Machine strings returned to clients
pub const ERR_BAD_NONCE: &str = "Bad nonce";
pub const ERR_INTENT_EXPIRED: &str = "Intent expired";

// Lowercased fragments of RPC/revert messages that mean the sequence or the
// submitter's nonce raced
pub const ORDERING_CONFLICT_MARKERS: &[&str] = &[
    "bad nonce",
    "nonce too low",
    "invalid nonce",
    "replacement transaction underpriced",
    "replacement fee too low",
    "already known",
    "transaction underpriced",
];
