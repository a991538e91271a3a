//! Console progress frames
//!
//! Frames are a pure function of `(message, style, iteration)`. [`ProgressReporter`]
//! holds the iteration counter and is an endless iterator of frames; dropping it and
//! building a new one restarts the sequence.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;

const SPINNER_GLYPHS: &[char] = &['/', '-', '\\', '|'];
const BRAILLE_GLYPHS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Progress animation style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStyle {
    /// Cycles zero to three trailing dots, padded to a fixed width
    Dots,
    /// ASCII spinner `/ - \ |`
    Spinner,
    /// Braille dot spinner
    Braille,
    /// One more trailing dot per tick, never wrapping
    #[default]
    Counter,
}

impl ProgressStyle {
    /// Names accepted by [`str::parse`]
    pub const SUPPORTED: [&'static str; 4] = ["dots", "spinner", "braille", "counter"];
}

impl std::str::FromStr for ProgressStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dots" => Ok(ProgressStyle::Dots),
            "spinner" => Ok(ProgressStyle::Spinner),
            "braille" => Ok(ProgressStyle::Braille),
            "counter" => Ok(ProgressStyle::Counter),
            other => Err(Error::config(
                "progress.style",
                format!(
                    "loading style \"{}\" not supported. Supported styles: {}.",
                    other,
                    Self::SUPPORTED.join(", ")
                ),
            )),
        }
    }
}

/// Render the frame shown at `iteration`
#[must_use]
pub fn frame(message: &str, style: ProgressStyle, iteration: u64) -> String {
    match style {
        ProgressStyle::Dots => {
            let dots = (iteration % 4) as usize;
            format!("{}{}{}", message, ".".repeat(dots), " ".repeat(3 - dots))
        }
        ProgressStyle::Spinner => {
            let glyph = SPINNER_GLYPHS[(iteration % SPINNER_GLYPHS.len() as u64) as usize];
            format!("{message} {glyph}")
        }
        ProgressStyle::Braille => {
            let glyph = BRAILLE_GLYPHS[(iteration % BRAILLE_GLYPHS.len() as u64) as usize];
            format!("{message} {glyph}")
        }
        ProgressStyle::Counter => format!("{}{}", message, ".".repeat(iteration as usize)),
    }
}

/// Endless sequence of progress frames for one message
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    message: String,
    style: ProgressStyle,
    iteration: u64,
    delay: Duration,
}

impl ProgressReporter {
    /// Default time a frame stays on screen
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

    /// Create a reporter from a style name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the style is not one of [`ProgressStyle::SUPPORTED`].
    pub fn new(message: impl Into<String>, style: &str) -> Result<Self> {
        Ok(Self::with_style(message, style.parse()?))
    }

    /// Create a reporter from an already validated style
    pub fn with_style(message: impl Into<String>, style: ProgressStyle) -> Self {
        Self {
            message: message.into(),
            style,
            iteration: 0,
            delay: Self::DEFAULT_DELAY,
        }
    }

    /// Set how long [`render`](Self::render) keeps each frame on screen
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of frames produced so far
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Return the next frame and advance
    pub fn tick(&mut self) -> String {
        let text = frame(&self.message, self.style, self.iteration);
        self.iteration += 1;
        text
    }

    /// Write the next frame, hold it for the display delay, then erase it
    ///
    /// Waits at most one delay per call.
    pub async fn render<W: Write + Send>(&mut self, out: &mut W) -> std::io::Result<()> {
        let text = self.tick();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let erase = "\u{8}".repeat(text.chars().count() + 1);
        out.write_all(erase.as_bytes())?;
        out.flush()
    }
}

impl Iterator for ProgressReporter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.tick())
    }
}
