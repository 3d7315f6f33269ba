//! Intent digests, byte-compatible with the arena contract.
//!
//! ```text
//! domain = keccak256(abi.encode(uint256 chainId, address stateMachine))
//! digest = keccak256(abi.encode(domain, TYPEHASH, player, <fields>, nonce, deadline))
//! ```
//!
//! A deadline of `0` means "never expires" and is hashed as zero.

use ethers::abi::{encode, Token};
use ethers::types::{Address, U256};

use super::hash::keccak256;
use crate::constants::{JOIN_TYPE, MOVE_TYPE, NAME_BYTES, SET_NAME_TYPE};
use crate::models::{Direction, Intent, JoinIntent, MoveIntent, SetNameIntent};

/// Domain separator binding digests to one chain and one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainSeparator([u8; 32]);

impl DomainSeparator {
    pub fn new(chain_id: u64, state_machine: Address) -> Self {
        let encoded = encode(&[
            Token::Uint(U256::from(chain_id)),
            Token::Address(state_machine),
        ]);
        Self(keccak256(&encoded))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

fn typehash(signature: &str) -> Vec<u8> {
    keccak256(signature.as_bytes()).to_vec()
}

fn seal(domain: &DomainSeparator, kind: &str, player: Address, fields: Vec<Token>) -> [u8; 32] {
    let mut tokens = Vec::with_capacity(fields.len() + 3);
    tokens.push(Token::FixedBytes(domain.as_bytes().to_vec()));
    tokens.push(Token::FixedBytes(typehash(kind)));
    tokens.push(Token::Address(player));
    tokens.extend(fields);
    keccak256(&encode(&tokens))
}

pub fn digest_join(domain: &DomainSeparator, player: Address, sequence: u64, expiry: u64) -> [u8; 32] {
    seal(
        domain,
        JOIN_TYPE,
        player,
        vec![Token::Uint(U256::from(sequence)), Token::Uint(U256::from(expiry))],
    )
}

pub fn digest_move(
    domain: &DomainSeparator,
    player: Address,
    dir: Direction,
    sequence: u64,
    expiry: u64,
) -> [u8; 32] {
    seal(
        domain,
        MOVE_TYPE,
        player,
        vec![
            Token::Uint(U256::from(dir.code())),
            Token::Uint(U256::from(sequence)),
            Token::Uint(U256::from(expiry)),
        ],
    )
}

pub fn digest_set_name(
    domain: &DomainSeparator,
    player: Address,
    name: &[u8; NAME_BYTES],
    sequence: u64,
    expiry: u64,
) -> [u8; 32] {
    seal(
        domain,
        SET_NAME_TYPE,
        player,
        vec![
            Token::FixedBytes(name.to_vec()),
            Token::Uint(U256::from(sequence)),
            Token::Uint(U256::from(expiry)),
        ],
    )
}

/// Digest the player was expected to sign for `intent`.
pub fn digest_intent(domain: &DomainSeparator, intent: &Intent) -> [u8; 32] {
    match intent {
        Intent::Join(JoinIntent {
            player,
            sequence,
            expiry,
            ..
        }) => digest_join(domain, *player, *sequence, *expiry),
        Intent::Move(MoveIntent {
            player,
            dir,
            sequence,
            expiry,
            ..
        }) => digest_move(domain, *player, *dir, *sequence, *expiry),
        Intent::SetName(SetNameIntent {
            player,
            name,
            sequence,
            expiry,
            ..
        }) => digest_set_name(domain, *player, name, *sequence, *expiry),
    }
}

/// UTF-8 encodes `name`, truncates to 12 bytes and zero-pads.
pub fn encode_name(name: &str) -> [u8; NAME_BYTES] {
    let mut out = [0u8; NAME_BYTES];
    let bytes = name.as_bytes();
    let len = bytes.len().min(NAME_BYTES);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Strips trailing zero bytes. Invalid UTF-8 (e.g. a truncated code point)
/// is replaced rather than rejected.
pub fn decode_name(name: &[u8; NAME_BYTES]) -> String {
    let end = name
        .iter()
        .rposition(|byte| *byte != 0)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    String::from_utf8_lossy(&name[..end]).into_owned()
}
