//! Test helper utilities
//!
//! Shared fixtures for the ser-ensemble integration tests

#![allow(dead_code, unused_imports)]

pub mod audio_generator;
pub mod backends;
pub mod multipart;

pub use audio_generator::{generate_silent_wav, generate_test_wav, wav_bytes, AudioConfig};
pub use backends::{
    stub_adapter, stub_pipeline, DeclaredBackend, FailingBackend, FixedBackend, SoftmaxStub,
};
pub use multipart::{multipart_body, multipart_request, BOUNDARY};
