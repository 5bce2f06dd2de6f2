//! Effects produced by view transitions

use crate::imaging::ImageUpload;
use crate::session::SessionMode;

/// Effects to be executed after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Release the session handle or history and cancel in-flight work
    EndSession,

    /// Send a turn on the session of `mode`, starting one if none is live
    RunTurn {
        epoch: u64,
        mode: SessionMode,
        text: String,
    },

    /// One-shot image identification
    IdentifyImage {
        epoch: u64,
        prompt: String,
        image: ImageUpload,
    },

    /// One-shot text-to-image generation
    GenerateImage { epoch: u64, prompt: String },
}
