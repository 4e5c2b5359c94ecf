use std::io;
use std::str::Chars;

use super::ToneSink;
use crate::types::ToneEvent;

/// Frequency band tones are drawn from: `[base_hz, base_hz + span_hz)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneBand {
    pub base_hz: u32,
    pub span_hz: u32,
}

impl ToneBand {
    /// Saturates at `u32::MAX` for a band that runs off the top of the range.
    pub fn frequency_of(&self, c: char) -> u32 {
        self.base_hz.saturating_add((c as u32) % self.span_hz.max(1))
    }

    pub fn contains(&self, hz: u32) -> bool {
        let top = u64::from(self.base_hz) + u64::from(self.span_hz.max(1));
        hz >= self.base_hz && u64::from(hz) < top
    }
}

/// Maps text to a short tone sequence, one tone per leading char.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sonifier {
    pub band: ToneBand,
    pub tone_ms: u32,
    pub gap_ms: u32,
    pub bounded_prefix_length: usize,
}

impl Default for Sonifier {
    fn default() -> Self {
        Self {
            band: ToneBand { base_hz: 400, span_hz: 1200 },
            tone_ms: 60,
            gap_ms: 20,
            bounded_prefix_length: 32,
        }
    }
}

impl Sonifier {
    pub fn sonify<'a>(&self, content: &'a str) -> ToneSequence<'a> {
        ToneSequence {
            chars: content.chars(),
            remaining: self.bounded_prefix_length,
            band: self.band,
            tone_ms: self.tone_ms,
        }
    }
}

/// Lazy tone iterator over a borrowed string. Clone it to replay from the current point.
#[derive(Debug, Clone)]
pub struct ToneSequence<'a> {
    chars: Chars<'a>,
    remaining: usize,
    band: ToneBand,
    tone_ms: u32,
}

impl Iterator for ToneSequence<'_> {
    type Item = ToneEvent;

    fn next(&mut self) -> Option<ToneEvent> {
        if self.remaining == 0 {
            return None;
        }
        let c = self.chars.next()?;
        self.remaining -= 1;
        Some(ToneEvent { frequency_hz: self.band.frequency_of(c), duration_ms: self.tone_ms })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Play `tones` into `sink` with `gap_ms` of silence between consecutive tones.
/// Returns the number of tones played.
pub fn play(tones: impl IntoIterator<Item = ToneEvent>, gap_ms: u32, sink: &mut dyn ToneSink) -> io::Result<usize> {
    let mut played = 0;
    for tone in tones {
        if played > 0 && gap_ms > 0 {
            sink.rest(gap_ms)?;
        }
        sink.play(tone)?;
        played += 1;
    }
    sink.finish()?;
    Ok(played)
}
