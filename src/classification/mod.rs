//! Classification source
//!
//! Produces a ratio in [0, 1] at each waypoint. The speech pipeline records a
//! fixed-length utterance, transcribes it with an external command and
//! measures how much of the transcript is English.
//!
//! Capture and transcription failures surface as [`Error::Classification`].
//! [`FailurePolicy`] turns those into a ratio (optionally after retrying) so
//! the mission always receives a value; any other error still propagates.

pub mod ratio;
pub mod recorder;
pub mod scripted;
pub mod transcriber;

pub use ratio::english_ratio;
pub use recorder::{ArecordRecorder, Recorder};
pub use scripted::ScriptedSource;
pub use transcriber::{CommandTranscriber, Transcriber};

use crate::config::ClassificationConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which classification source the mission uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Record, transcribe, measure
    #[default]
    Speech,
    /// Replay `scripted_ratios`
    Scripted,
}

/// How the English share of a transcript is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatioMetric {
    /// Latin letters over Latin letters plus Hangul syllables
    #[default]
    Letters,
    /// Latin words over all words
    Words,
}

/// Reaction to a failed classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicyKind {
    /// Substitute the fallback ratio immediately
    #[default]
    Fallback,
    /// Try again up to `max_attempts`, then substitute the fallback ratio
    Retry,
}

/// Produces a classification ratio from a recorded utterance
pub trait ClassificationSource {
    fn capture_and_classify(&mut self) -> Result<f32>;
}

/// Record, transcribe and measure
pub struct SpeechClassifier<R: Recorder, T: Transcriber> {
    recorder: R,
    transcriber: T,
    metric: RatioMetric,
}

impl<R: Recorder, T: Transcriber> SpeechClassifier<R, T> {
    pub fn new(recorder: R, transcriber: T, metric: RatioMetric) -> Self {
        Self {
            recorder,
            transcriber,
            metric,
        }
    }
}

impl<R: Recorder, T: Transcriber> ClassificationSource for SpeechClassifier<R, T> {
    fn capture_and_classify(&mut self) -> Result<f32> {
        let audio = self.recorder.record()?;
        let text = self.transcriber.transcribe(&audio)?;
        let ratio = english_ratio(&text, self.metric);
        log::info!("Transcript: {:?} ({:?} ratio {:.3})", text, self.metric, ratio);
        Ok(ratio)
    }
}

/// Create the configured classification source
pub fn create_source(config: &ClassificationConfig) -> Box<dyn ClassificationSource> {
    match config.source {
        SourceKind::Speech => Box::new(SpeechClassifier::new(
            ArecordRecorder::new(config.recorder.clone()),
            CommandTranscriber::new(config.transcriber.command.clone()),
            config.metric,
        )),
        SourceKind::Scripted => Box::new(ScriptedSource::new(config.scripted_ratios.clone())),
    }
}

/// Ratio obtained at one waypoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub ratio: f32,
    /// Capture attempts made, including the successful one
    pub attempts: u32,
    /// True when the ratio is the fallback value
    pub fallback: bool,
}

/// Converts classification failures into a ratio
#[derive(Debug, Clone, Copy)]
pub struct FailurePolicy {
    kind: FailurePolicyKind,
    max_attempts: u32,
    fallback_ratio: f32,
}

impl FailurePolicy {
    pub fn new(kind: FailurePolicyKind, max_attempts: u32, fallback_ratio: f32) -> Self {
        Self {
            kind,
            max_attempts: max_attempts.max(1),
            fallback_ratio: fallback_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &ClassificationConfig) -> Self {
        Self::new(config.on_error, config.max_attempts, config.fallback_ratio)
    }

    /// Obtain a ratio from `source`.
    ///
    /// Only [`Error::Classification`] is absorbed; other errors propagate.
    pub fn classify(&self, source: &mut dyn ClassificationSource) -> Result<Classification> {
        let attempts = match self.kind {
            FailurePolicyKind::Fallback => 1,
            FailurePolicyKind::Retry => self.max_attempts,
        };

        for attempt in 1..=attempts {
            match source.capture_and_classify() {
                Ok(ratio) if ratio.is_finite() => {
                    return Ok(Classification {
                        ratio: ratio.clamp(0.0, 1.0),
                        attempts: attempt,
                        fallback: false,
                    });
                }
                Ok(ratio) => {
                    log::warn!("Classification attempt {}/{}: invalid ratio {}", attempt, attempts, ratio);
                }
                Err(Error::Classification(reason)) => {
                    log::warn!("Classification attempt {}/{} failed: {}", attempt, attempts, reason);
                }
                Err(e) => return Err(e),
            }
        }

        log::warn!("Using fallback ratio {:.2}", self.fallback_ratio);
        Ok(Classification {
            ratio: self.fallback_ratio,
            attempts,
            fallback: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    struct FixedRecorder;

    impl Recorder for FixedRecorder {
        fn record(&mut self) -> Result<PathBuf> {
            Ok(PathBuf::from("utterance.wav"))
        }
    }

    struct FixedTranscriber(&'static str);

    impl Transcriber for FixedTranscriber {
        fn transcribe(&mut self, _audio: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenSource;

    impl ClassificationSource for BrokenSource {
        fn capture_and_classify(&mut self) -> Result<f32> {
            Err(Error::Io(std::io::Error::other("disk gone")))
        }
    }

    #[test]
    fn test_speech_classifier_measures_transcript() {
        let mut source = SpeechClassifier::new(
            FixedRecorder,
            FixedTranscriber("good 좋아"),
            RatioMetric::Letters,
        );
        // 4 Latin letters, 2 Hangul syllables
        let ratio = source.capture_and_classify().unwrap();
        assert!((ratio - 4.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_fallback_policy_substitutes_zero() {
        let policy = FailurePolicy::new(FailurePolicyKind::Fallback, 3, 0.0);
        let mut source = ScriptedSource::with_failures([None, Some(0.9)]);
        let result = policy.classify(&mut source).unwrap();

        assert_eq!(result.ratio, 0.0);
        assert!(result.fallback);
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn test_retry_policy_recovers() {
        let policy = FailurePolicy::new(FailurePolicyKind::Retry, 3, 0.0);
        let mut source = ScriptedSource::with_failures([None, None, Some(0.7)]);
        let result = policy.classify(&mut source).unwrap();

        assert_eq!(result.ratio, 0.7);
        assert_eq!(result.attempts, 3);
        assert!(!result.fallback);
    }

    #[test]
    fn test_retry_policy_gives_up() {
        let policy = FailurePolicy::new(FailurePolicyKind::Retry, 2, 0.25);
        let mut source = ScriptedSource::default();
        let result = policy.classify(&mut source).unwrap();

        assert_eq!(result.ratio, 0.25);
        assert_eq!(result.attempts, 2);
        assert!(result.fallback);
    }

    #[test]
    fn test_out_of_range_ratio_is_clamped() {
        let policy = FailurePolicy::new(FailurePolicyKind::Fallback, 1, 0.0);
        let mut source = ScriptedSource::new([1.4]);
        assert_eq!(policy.classify(&mut source).unwrap().ratio, 1.0);
    }

    #[test]
    fn test_other_errors_propagate() {
        let policy = FailurePolicy::new(FailurePolicyKind::Retry, 3, 0.0);
        assert!(matches!(
            policy.classify(&mut BrokenSource),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_create_scripted_source() {
        let config = ClassificationConfig {
            source: SourceKind::Scripted,
            scripted_ratios: vec![0.3],
            ..Default::default()
        };
        let mut source = create_source(&config);
        assert_eq!(source.capture_and_classify().unwrap(), 0.3);
        assert!(source.capture_and_classify().is_err());
    }
}
