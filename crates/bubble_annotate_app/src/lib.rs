// SPDX-License-Identifier: MIT OR Apache-2.0
//! `BubbleAnnotate` editing session and media backend.
//!
//! The pieces a front end needs around the overlay and sequencer crates:
//! - Editor state with snapshot undo/redo
//! - Pointer and timeline drag tools
//! - Project documents and application configuration
//! - An ffmpeg implementation of the media subsystem

pub mod config;
pub mod document;
pub mod ffmpeg;
pub mod history;
pub mod state;
pub mod tools;
