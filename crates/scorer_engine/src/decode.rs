use encoding_rs::{CoderResult, Decoder, UTF_8};
use engine_logging::{engine_debug, engine_warn};
use scorer_core::{classify_payload, PayloadOutcome, StreamEvent};

use crate::DecodeStats;

/// Prefix that marks an event record line.
pub const EVENT_PREFIX: &str = "data: ";

/// Incremental decoder for the scoring service's event stream.
///
/// Bytes may arrive split at any position, including inside a UTF-8 sequence
/// or inside a line. Only newline-terminated lines are parsed; the trailing
/// fragment is carried over to the next [`StreamDecoder::feed`] call.
pub struct StreamDecoder {
    decoder: Decoder,
    carry: String,
    stats: DecodeStats,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            carry: String::new(),
            stats: DecodeStats::default(),
        }
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Consumes one buffer and returns the events of every line it completed, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let text = self.decode_text(bytes, false);
        self.carry.push_str(&text);

        let Some(last_newline) = self.carry.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);

        let mut events = Vec::new();
        for line in complete.split_terminator('\n') {
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Ends the stream. An unterminated trailing fragment is discarded.
    pub fn finish(mut self) -> DecodeStats {
        let tail = self.decode_text(&[], true);
        self.carry.push_str(&tail);
        if !self.carry.is_empty() {
            engine_debug!(
                "Discarding {} unterminated bytes at end of stream",
                self.carry.len()
            );
            self.stats.discarded_tail_bytes = self.carry.len() as u64;
        }
        self.stats
    }

    fn decode_text(&mut self, bytes: &[u8], last: bool) -> String {
        let mut text = String::new();
        let mut remaining = bytes;
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(remaining.len())
                .unwrap_or(remaining.len() * 3 + 4);
            text.reserve(needed);
            let (result, read, replaced) =
                self.decoder.decode_to_string(remaining, &mut text, last);
            if replaced {
                engine_debug!("Replaced invalid UTF-8 in response body");
            }
            remaining = &remaining[read..];
            if matches!(result, CoderResult::InputEmpty) {
                return text;
            }
        }
    }

    fn process_line(&mut self, line: &str) -> Option<StreamEvent> {
        self.stats.lines += 1;
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some(payload) = line.strip_prefix(EVENT_PREFIX) else {
            if !line.is_empty() {
                self.stats.ignored_lines += 1;
            }
            return None;
        };

        match classify_payload(payload) {
            PayloadOutcome::Event(event) => {
                self.stats.events += 1;
                Some(event)
            }
            PayloadOutcome::Malformed(reason) => {
                self.stats.malformed += 1;
                engine_warn!("Skipping malformed event ({}): {}", reason, payload);
                None
            }
            PayloadOutcome::Unrecognized(kind) => {
                self.stats.unrecognized += 1;
                engine_debug!("Skipping unrecognized event kind {:?}", kind);
                None
            }
        }
    }
}
