//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct is the entry point for loading DBC files and decoding
//! frames or whole trace files.

use crate::config::DecoderConfig;
use crate::formats::{TraceFrameIterator, TraceParser};
use crate::message_decoder::MessageDecoder;
use crate::signals::database::SkippedLine;
use crate::signals::SignalDatabase;
use crate::types::{CanFrame, DecodedFrame, Result, Timestamp};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
///
/// Loading needs `&mut self`; decoding only borrows, so one loaded decoder can
/// be shared by any number of worker threads.
#[derive(Debug, Default)]
pub struct Decoder {
    /// Internal signal database (loaded from DBC files)
    signal_db: SignalDatabase,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new() -> Self {
        Self {
            signal_db: SignalDatabase::new(),
        }
    }

    /// Load a DBC file and add its definitions to the signal database
    ///
    /// Malformed records are skipped; only an unreadable file is an error.
    ///
    /// # Example
    /// ```no_run
    /// use dbc_log_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_dbc(Path::new("battery.dbc")).unwrap();
    /// ```
    pub fn add_dbc(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading DBC file: {:?}", path);

        let database = crate::signals::dbc::parse_dbc_file(path)?;
        self.signal_db.merge(database);

        log::info!("DBC file loaded successfully: {:?}", path);
        Ok(())
    }

    /// Add definitions from DBC text
    pub fn add_dbc_str(&mut self, content: &str) {
        self.signal_db
            .merge(crate::signals::dbc::parse_dbc_str(content));
    }

    /// Read-only view of the loaded definitions
    pub fn database(&self) -> &SignalDatabase {
        &self.signal_db
    }

    /// Get statistics about the loaded signal database
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }

    /// DBC lines dropped while loading
    pub fn skipped_lines(&self) -> &[SkippedLine] {
        self.signal_db.skipped_lines()
    }

    /// All signal names in declaration order, without duplicates
    pub fn signal_names(&self) -> Vec<String> {
        self.signal_db.signal_names()
    }

    /// Decode one frame
    ///
    /// Returns `None` when the ID has no message definition; such frames are
    /// expected in real logs and are simply dropped.
    ///
    /// # Example
    /// ```
    /// use dbc_log_decoder::Decoder;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_dbc_str("BO_ 256 Status: 1 ECU\n SG_ Level : 0|8@1+ (1,0) [0|255] \"\" ECU\n");
    ///
    /// let frame = decoder.decode(0x100, &[0xFF], "12:00:00:0000").unwrap();
    /// assert_eq!(frame.signal("Level"), Some(255.0));
    /// assert!(decoder.decode(0x200, &[0xFF], "12:00:00:0000").is_none());
    /// ```
    pub fn decode<T>(&self, can_id: u32, data: &[u8], timestamp: T) -> Option<DecodedFrame<T>> {
        match self.signal_db.get_message(can_id) {
            Some(message_def) => Some(MessageDecoder::decode(timestamp, message_def, data)),
            None => {
                log::trace!("Unknown CAN ID: 0x{:X}, frame skipped", can_id);
                None
            }
        }
    }

    /// Decode a frame read from a trace
    pub fn decode_frame(&self, frame: &CanFrame) -> Option<DecodedFrame<Timestamp>> {
        self.decode(frame.can_id, &frame.data, frame.timestamp)
    }

    /// Read all frames of a trace file that pass the configured filters
    pub fn read_frames(path: &Path, config: &DecoderConfig) -> Result<Vec<CanFrame>> {
        let mut frames = Vec::new();
        for frame in TraceParser::parse(path, config.header_lines)? {
            let frame = frame?;
            if config.should_process_frame(frame.channel, frame.can_id) {
                frames.push(frame);
            }
        }
        log::debug!("Read {} frames from {:?}", frames.len(), path);
        Ok(frames)
    }

    /// Decode a trace file and return an iterator of decoded frames
    ///
    /// The iterator is lazy: frames are read and decoded one at a time.
    /// Frames with unknown IDs or filtered out by `config` are skipped.
    ///
    /// # Example
    /// ```no_run
    /// use dbc_log_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_dbc(Path::new("battery.dbc")).unwrap();
    ///
    /// for frame in decoder.decode_file(Path::new("drive.log"), DecoderConfig::new()).unwrap() {
    ///     match frame {
    ///         Ok(decoded) => println!("{}: {:?}", decoded.message_name, decoded.signals),
    ///         Err(e) => eprintln!("Error: {}", e),
    ///     }
    /// }
    /// ```
    pub fn decode_file(
        &self,
        path: &Path,
        config: DecoderConfig,
    ) -> Result<DecodingIterator<'_, TraceFrameIterator<BufReader<File>>>> {
        log::info!("Decoding log file: {:?}", path);
        let frame_iter = TraceParser::parse(path, config.header_lines)?;
        Ok(DecodingIterator::new(frame_iter, self, config))
    }
}

/// Iterator that decodes CAN frames into decoded frames
///
/// Wraps a frame iterator; frames that are filtered out or have no message
/// definition produce nothing.
pub struct DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<CanFrame>>,
{
    frame_iter: I,
    decoder: &'a Decoder,
    config: DecoderConfig,
}

impl<'a, I> DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<CanFrame>>,
{
    /// Wrap any frame source
    pub fn new(frame_iter: I, decoder: &'a Decoder, config: DecoderConfig) -> Self {
        Self {
            frame_iter,
            decoder,
            config,
        }
    }
}

impl<'a, I> Iterator for DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<CanFrame>>,
{
    type Item = Result<DecodedFrame<Timestamp>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = match self.frame_iter.next()? {
                Ok(frame) => frame,
                Err(e) => return Some(Err(e)),
            };
            if !self.config.should_process_frame(frame.channel, frame.can_id) {
                continue;
            }
            if let Some(decoded) = self.decoder.decode_frame(&frame) {
                return Some(Ok(decoded));
            }
        }
    }
}

// Re-export DatabaseStats for public API
pub use crate::signals::DatabaseStats;
