//! Speech-to-text through an external command

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Converts a recorded utterance into text
pub trait Transcriber {
    fn transcribe(&mut self, audio: &Path) -> Result<String>;
}

/// Runs `command... <audio>` and reads the transcript from stdout.
///
/// A missing audio file yields empty text rather than an error.
pub struct CommandTranscriber {
    command: Vec<String>,
}

impl CommandTranscriber {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&mut self, audio: &Path) -> Result<String> {
        if !audio.exists() {
            log::warn!("Audio file {} missing, empty transcript", audio.display());
            return Ok(String::new());
        }
        let Some((program, args)) = self.command.split_first() else {
            return Err(Error::Classification(
                "no transcriber command configured".to_string(),
            ));
        };

        let output = Command::new(program)
            .args(args)
            .arg(audio)
            .output()
            .map_err(|e| Error::Classification(format!("failed to run {}: {}", program, e)))?;
        if !output.status.success() {
            return Err(Error::Classification(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sh(script: &str) -> CommandTranscriber {
        CommandTranscriber::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
            "transcribe".to_string(),
        ])
    }

    #[test]
    fn test_reads_transcript_from_stdout() {
        let audio = NamedTempFile::new().unwrap();
        let text = sh("echo 'hello 안녕'").transcribe(audio.path()).unwrap();
        assert_eq!(text, "hello 안녕");
    }

    #[test]
    fn test_audio_path_is_last_argument() {
        let audio = NamedTempFile::new().unwrap();
        let text = sh("echo \"$1\"").transcribe(audio.path()).unwrap();
        assert_eq!(Path::new(&text), audio.path());
    }

    #[test]
    fn test_missing_audio_gives_empty_text() {
        let text = sh("echo never")
            .transcribe(Path::new("/nonexistent/group.wav"))
            .unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_failures_are_classification_errors() {
        let audio = NamedTempFile::new().unwrap();
        assert!(matches!(
            sh("exit 3").transcribe(audio.path()),
            Err(Error::Classification(_))
        ));
        assert!(matches!(
            CommandTranscriber::new(Vec::new()).transcribe(audio.path()),
            Err(Error::Classification(_))
        ));
    }
}
