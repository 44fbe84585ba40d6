//! Subrelay - video transcription and caption relay
//!
//! Forwards uploaded videos to Deepgram (directly or through Cloudinary
//! hosting) and burns or muxes subtitle captions into videos with ffmpeg.

pub mod cli;
pub mod config;
pub mod error;
pub mod hosting;
pub mod http_client;
pub mod media;
pub mod pipeline;
pub mod scratch;
pub mod server;
pub mod subtitle;
pub mod transcribe;

#[cfg(test)]
mod test_support;
