use std::f32::consts::TAU;
use std::io::{self, Write};

use beacon_core::render::ToneSink;
use beacon_core::types::ToneEvent;

pub const PCM_AMPLITUDE: f32 = 8000.0;

/// Writes tones as raw signed 16-bit little-endian mono PCM.
pub struct PcmToneSink<W: Write + Send> {
    out: W,
    sample_rate: u32,
}

impl<W: Write + Send> PcmToneSink<W> {
    pub fn new(out: W, sample_rate: u32) -> Self {
        Self { out, sample_rate }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn samples_for(&self, ms: u32) -> u64 {
        u64::from(self.sample_rate) * u64::from(ms) / 1000
    }
}

impl<W: Write + Send> ToneSink for PcmToneSink<W> {
    fn play(&mut self, tone: ToneEvent) -> io::Result<()> {
        let step = TAU * tone.frequency_hz as f32 / self.sample_rate as f32;
        for n in 0..self.samples_for(tone.duration_ms) {
            let sample = ((step * n as f32).sin() * PCM_AMPLITUDE) as i16;
            self.out.write_all(&sample.to_le_bytes())?;
        }
        Ok(())
    }

    fn rest(&mut self, ms: u32) -> io::Result<()> {
        for _ in 0..self.samples_for(ms) {
            self.out.write_all(&0i16.to_le_bytes())?;
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Audio channel for hosts without an output file: logs each tone.
#[derive(Debug, Default)]
pub struct ToneLog;

impl ToneSink for ToneLog {
    fn play(&mut self, tone: ToneEvent) -> io::Result<()> {
        tracing::debug!(frequency_hz = tone.frequency_hz, duration_ms = tone.duration_ms, "tone");
        Ok(())
    }

    fn rest(&mut self, _ms: u32) -> io::Result<()> {
        Ok(())
    }
}
