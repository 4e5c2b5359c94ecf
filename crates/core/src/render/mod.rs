//! Feedback channels: fixed-size text display, tone output, overflow dump.

pub mod sonify;
pub mod wrap;

use std::io;

use beacon_llm::provider::describe_code;

pub use sonify::{Sonifier, ToneBand, ToneSequence, play};
pub use wrap::{TRUNCATION_INDICATOR, TextWrapRenderer, layout};

use crate::config::BeaconCfg;
use crate::types::{OutcomeKind, QueryOutcome, RenderFrame, ToneEvent};

pub const TITLE_REPLY: &str = "Reply";
pub const TITLE_PARSE_ERROR: &str = "Parse Error";
pub const TITLE_REQUEST_FAILED: &str = "Request Failed";

/// A fixed-geometry text display.
pub trait DisplaySurface: Send {
    fn draw(&mut self, frame: &RenderFrame) -> io::Result<()>;
}

/// Something that can emit tones and silence. Calls block until output is written.
pub trait ToneSink: Send {
    fn play(&mut self, tone: ToneEvent) -> io::Result<()>;

    fn rest(&mut self, ms: u32) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Receives content that did not fit the display.
pub trait SideChannel: Send + Sync {
    fn dump(&self, title: &str, content: &str);
}

/// Overflow dump into the log under `beacon::overflow`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSideChannel;

impl SideChannel for TracingSideChannel {
    fn dump(&self, title: &str, content: &str) {
        tracing::warn!(target: "beacon::overflow", title, chars = content.chars().count(), content, "display overflow");
    }
}

/// What one render pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub kind: OutcomeKind,
    pub truncated: bool,
    pub tones: usize,
}

/// Presents outcomes on every configured channel.
///
/// The log is always written. Display and audio are optional; a failing
/// channel is logged and skipped, the others still run.
pub struct ResponseRenderer {
    display: Option<Box<dyn DisplaySurface>>,
    audio: Option<Box<dyn ToneSink>>,
    wrap: TextWrapRenderer,
    sonifier: Sonifier,
    side_channel: Box<dyn SideChannel>,
}

impl ResponseRenderer {
    pub fn new(wrap: TextWrapRenderer, sonifier: Sonifier) -> Self {
        Self {
            display: None,
            audio: None,
            wrap,
            sonifier,
            side_channel: Box::new(TracingSideChannel),
        }
    }

    /// Geometry and tone parameters from config; no channels attached yet.
    pub fn from_cfg(cfg: &BeaconCfg) -> Self {
        let sonifier = Sonifier {
            band: ToneBand { base_hz: cfg.tone_base_hz, span_hz: cfg.tone_band_hz },
            tone_ms: cfg.tone_ms,
            gap_ms: cfg.tone_gap_ms,
            bounded_prefix_length: cfg.tone_prefix,
        };
        Self::new(TextWrapRenderer::new(cfg.display_width, cfg.display_lines), sonifier)
    }

    pub fn with_display(mut self, display: Box<dyn DisplaySurface>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_audio(mut self, audio: Box<dyn ToneSink>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_side_channel(mut self, side_channel: Box<dyn SideChannel>) -> Self {
        self.side_channel = side_channel;
        self
    }

    pub fn wrap(&self) -> &TextWrapRenderer {
        &self.wrap
    }

    pub fn sonifier(&self) -> &Sonifier {
        &self.sonifier
    }

    /// Consume an outcome and present it.
    pub fn render(&mut self, outcome: QueryOutcome) -> RenderSummary {
        let kind = outcome.kind();
        let (title, body) = match outcome {
            QueryOutcome::Success { content } => {
                tracing::info!(chars = content.chars().count(), "reply");
                (TITLE_REPLY, content)
            }
            QueryOutcome::ParseError { message } => {
                tracing::warn!(%message, "parse error");
                (TITLE_PARSE_ERROR, message)
            }
            QueryOutcome::TransportError { code } => {
                let text = describe_code(code);
                tracing::warn!(code, %text, "request failed");
                (TITLE_REQUEST_FAILED, text)
            }
        };
        let (truncated, tones) = self.present(title, &body);
        RenderSummary { kind, truncated, tones }
    }

    /// Show a status notice outside the query cycle, e.g. a boot failure.
    pub fn notify(&mut self, title: &str, body: &str) -> bool {
        tracing::info!(title, body, "notice");
        self.present(title, body).0
    }

    fn present(&mut self, title: &str, body: &str) -> (bool, usize) {
        let frame = self.wrap.frame(title, body);
        if frame.truncated {
            self.side_channel.dump(title, body);
        }

        if let Some(display) = self.display.as_mut() {
            if let Err(e) = display.draw(&frame) {
                tracing::error!(error = %e, "display channel failed");
            }
        }

        let mut tones = 0;
        if let Some(audio) = self.audio.as_mut() {
            match play(self.sonifier.sonify(body), self.sonifier.gap_ms, audio.as_mut()) {
                Ok(n) => tones = n,
                Err(e) => tracing::error!(error = %e, "audio channel failed"),
            }
        }
        (frame.truncated, tones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Frames(Arc<Mutex<Vec<RenderFrame>>>);

    impl DisplaySurface for Frames {
        fn draw(&mut self, frame: &RenderFrame) -> io::Result<()> {
            self.0.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    struct BrokenDisplay;

    impl DisplaySurface for BrokenDisplay {
        fn draw(&mut self, _: &RenderFrame) -> io::Result<()> {
            Err(io::Error::other("panel unplugged"))
        }
    }

    #[derive(Clone, Default)]
    struct Tones(Arc<Mutex<Vec<ToneEvent>>>);

    impl ToneSink for Tones {
        fn play(&mut self, tone: ToneEvent) -> io::Result<()> {
            self.0.lock().unwrap().push(tone);
            Ok(())
        }

        fn rest(&mut self, _: u32) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Dumps(Arc<Mutex<Vec<(String, String)>>>);

    impl SideChannel for Dumps {
        fn dump(&self, title: &str, content: &str) {
            self.0.lock().unwrap().push((title.into(), content.into()));
        }
    }

    fn renderer(frames: &Frames, tones: &Tones, dumps: &Dumps) -> ResponseRenderer {
        ResponseRenderer::new(TextWrapRenderer::new(10, 3), Sonifier::default())
            .with_display(Box::new(frames.clone()))
            .with_audio(Box::new(tones.clone()))
            .with_side_channel(Box::new(dumps.clone()))
    }

    #[test]
    fn success_goes_to_every_channel() {
        let (f, t, d) = (Frames::default(), Tones::default(), Dumps::default());
        let mut r = renderer(&f, &t, &d);
        let summary = r.render(QueryOutcome::Success { content: "hi there".into() });
        assert_eq!(summary, RenderSummary { kind: OutcomeKind::Success, truncated: false, tones: 8 });
        let frames = f.0.lock().unwrap();
        assert_eq!(frames[0].title, TITLE_REPLY);
        assert_eq!(frames[0].body_lines, vec!["hi there"]);
        assert_eq!(t.0.lock().unwrap().len(), 8);
        assert!(d.0.lock().unwrap().is_empty());
    }

    #[test]
    fn errors_get_their_titles_and_text() {
        let (f, t, d) = (Frames::default(), Tones::default(), Dumps::default());
        let mut r = renderer(&f, &t, &d);
        r.render(QueryOutcome::TransportError { code: 500 });
        r.render(QueryOutcome::ParseError { message: "bad".into() });
        let frames = f.0.lock().unwrap();
        assert_eq!(frames[0].title, TITLE_REQUEST_FAILED);
        assert_eq!(frames[0].body_lines, vec!["HTTP 500"]);
        assert_eq!(frames[1].title, TITLE_PARSE_ERROR);
        assert_eq!(frames[1].body_lines, vec!["bad"]);
        // "HTTP 500" + "bad"
        assert_eq!(t.0.lock().unwrap().len(), 11);
    }

    #[test]
    fn overflow_dumps_full_content() {
        let (f, t, d) = (Frames::default(), Tones::default(), Dumps::default());
        let mut r = renderer(&f, &t, &d);
        let content = "many words that will never fit in three short lines".to_string();
        let summary = r.render(QueryOutcome::Success { content: content.clone() });
        assert!(summary.truncated);
        assert_eq!(d.0.lock().unwrap()[0], (TITLE_REPLY.to_string(), content));
    }

    #[test]
    fn failing_display_does_not_stop_audio() {
        let t = Tones::default();
        let mut r = ResponseRenderer::new(TextWrapRenderer::new(10, 3), Sonifier::default())
            .with_display(Box::new(BrokenDisplay))
            .with_audio(Box::new(t.clone()));
        let summary = r.render(QueryOutcome::Success { content: "ok".into() });
        assert_eq!(summary.tones, 2);
        assert_eq!(t.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn log_only_renderer() {
        let mut r = ResponseRenderer::from_cfg(&BeaconCfg::default());
        let summary = r.render(QueryOutcome::TransportError { code: -4 });
        assert_eq!(summary.kind, OutcomeKind::TransportError);
        assert_eq!(summary.tones, 0);
        assert!(!r.notify("Offline", "network unavailable"));
    }
}
