//! Decoder configuration types
//!
//! This module defines the minimal configuration needed by the decoder library:
//! how trace files are laid out and which frames to decode. Output handling
//! lives in the application layer.

use crate::formats::DEFAULT_HEADER_LINES;
use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Number of header lines at the top of each trace file
    #[serde(default = "default_header_lines")]
    pub header_lines: usize,

    /// Optional: only decode frames from these CAN channels
    #[serde(default)]
    pub channel_filter: Option<Vec<u8>>,

    /// Optional: only decode these specific CAN message IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

fn default_header_lines() -> usize {
    DEFAULT_HEADER_LINES
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            header_lines: DEFAULT_HEADER_LINES,
            channel_filter: None,
            message_filter: None,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the number of header lines to skip
    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines;
        self
    }

    /// Builder method: set channel filter
    pub fn with_channel_filter(mut self, channels: Vec<u8>) -> Self {
        self.channel_filter = Some(channels);
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Check if a channel should be processed
    pub fn should_process_channel(&self, channel: u8) -> bool {
        match &self.channel_filter {
            Some(channels) => channels.contains(&channel),
            None => true,
        }
    }

    /// Check if a message ID should be processed
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }

    /// Check if a frame should be processed based on filters
    pub fn should_process_frame(&self, channel: u8, can_id: u32) -> bool {
        self.should_process_channel(channel) && self.should_process_message(can_id)
    }
}
