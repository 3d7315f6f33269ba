// src/models/mod.rs
pub mod intent;

pub use intent::{
    ApiResponse, Direction, Intent, JoinIntent, JoinRequest, KickRequest, MoveIntent,
    MoveRequest, MoveResponse, SequenceResponse, SetNameIntent, SetNameRequest,
    SubmissionResponse,
};
