//! Audio output backends.
//!
//! A [`Speaker`] either plays an asset file or speaks text. The
//! [`CommandSpeaker`] spawns configurable external programs (for example
//! `afplay` / `say` on macOS, `paplay` / `espeak` on Linux) without waiting
//! for them. Finished commands are reaped on the next spawn, and at most
//! four run at once.

use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use crate::error::ConfigError;

/// Placeholder replaced by the asset path in player commands.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Placeholder replaced by the text in speech commands.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Audio commands allowed to run at once. Starting another stops the
/// oldest.
const MAX_IN_FLIGHT: usize = 4;

/// Audio output backend.
pub trait Speaker: Send {
    /// Plays an audio file.
    fn play_file(&mut self, path: &Path);

    /// Speaks text with a synthesizer.
    fn speak(&mut self, text: &str);

    /// Stops whatever is playing.
    fn stop(&mut self) {}
}

/// Splits a command line into argv using shell quoting rules.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for unbalanced quotes or an empty
/// command.
pub fn parse_command(field: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    match shlex::split(raw) {
        Some(argv) if !argv.is_empty() => Ok(argv),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            expected: "a non-empty command line with balanced quotes".to_string(),
        }),
    }
}

/// Substitutes `placeholder` with `value` in `template`, appending `value`
/// as a final argument when the placeholder does not occur.
fn expand_argv(template: &[String], placeholder: &str, value: &str) -> Vec<String> {
    let mut found = false;
    let mut argv: Vec<String> = template
        .iter()
        .map(|arg| {
            if arg.contains(placeholder) {
                found = true;
                arg.replace(placeholder, value)
            } else {
                arg.clone()
            }
        })
        .collect();
    if !found {
        argv.push(value.to_string());
    }
    argv
}

/// Speaker that spawns external programs, or echoes text when none are set.
pub struct CommandSpeaker {
    player: Option<Vec<String>>,
    speech: Option<Vec<String>>,
    echo: Box<dyn Write + Send>,
    children: Vec<Child>,
}

impl std::fmt::Debug for CommandSpeaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpeaker")
            .field("player", &self.player)
            .field("speech", &self.speech)
            .finish_non_exhaustive()
    }
}

impl CommandSpeaker {
    /// Creates a speaker from parsed player and speech commands.
    ///
    /// Without a player command, files are announced by name; without a
    /// speech command, text is echoed to stderr.
    #[must_use]
    pub fn new(player: Option<Vec<String>>, speech: Option<Vec<String>>) -> Self {
        Self::with_echo(player, speech, Box::new(std::io::stderr()))
    }

    /// Creates a speaker that echoes to `echo` instead of stderr.
    #[must_use]
    pub fn with_echo(
        player: Option<Vec<String>>,
        speech: Option<Vec<String>>,
        echo: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            player,
            speech,
            echo,
            children: Vec::new(),
        }
    }

    fn spawn(&mut self, argv: &[String]) {
        let Some((program, args)) = argv.split_first() else {
            return;
        };
        self.reap();
        if self.children.len() >= MAX_IN_FLIGHT {
            let oldest = self.children.remove(0);
            debug!(pid = oldest.id(), "stopping oldest audio command");
            terminate(oldest);
        }
        debug!(cmd = ?argv, "spawning audio command");
        match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => self.children.push(child),
            Err(e) => warn!(program = %program, error = %e, "audio command failed to start"),
        }
    }

    /// Collects finished children so they do not linger as zombies.
    fn reap(&mut self) {
        self.children
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_)) | Err(_)));
    }

    fn echo(&mut self, line: &str) {
        let _ = writeln!(self.echo, "\u{266a} {line}");
        let _ = self.echo.flush();
    }
}

impl Speaker for CommandSpeaker {
    fn play_file(&mut self, path: &Path) {
        if let Some(template) = self.player.clone() {
            let argv = expand_argv(&template, FILE_PLACEHOLDER, &path.to_string_lossy());
            self.spawn(&argv);
        } else {
            let name = path
                .file_stem()
                .map_or_else(|| path.to_string_lossy(), |s| s.to_string_lossy())
                .into_owned();
            self.echo(&name);
        }
    }

    fn speak(&mut self, text: &str) {
        if let Some(template) = self.speech.clone() {
            let argv = expand_argv(&template, TEXT_PLACEHOLDER, text);
            self.spawn(&argv);
        } else {
            self.echo(text);
        }
    }

    fn stop(&mut self) {
        for child in self.children.drain(..) {
            terminate(child);
        }
    }
}

/// Kills `child` and waits for it so the process table entry is released.
fn terminate(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct TestWriter(Arc<Mutex<Vec<u8>>>);

    impl TestWriter {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn parse_command_splits_quotes() {
        let argv = parse_command("coach.speech_command", "espeak -v 'en-us' {text}").unwrap();
        assert_eq!(argv, vec!["espeak", "-v", "en-us", "{text}"]);
    }

    #[test]
    fn parse_command_rejects_empty_and_unbalanced() {
        assert!(parse_command("coach.player_command", "   ").is_err());
        assert!(parse_command("coach.player_command", "afplay 'oops").is_err());
    }

    #[test]
    fn expand_argv_replaces_placeholder() {
        let template = vec!["espeak".to_string(), "--stdout={text}".to_string()];
        assert_eq!(
            expand_argv(&template, TEXT_PLACEHOLDER, "Rest"),
            vec!["espeak", "--stdout=Rest"]
        );
    }

    #[test]
    fn expand_argv_appends_when_placeholder_missing() {
        let template = vec!["afplay".to_string()];
        assert_eq!(
            expand_argv(&template, FILE_PLACEHOLDER, "/a/phase_rest.mp3"),
            vec!["afplay", "/a/phase_rest.mp3"]
        );
    }

    #[test]
    fn echo_without_commands() {
        let out = TestWriter::default();
        let mut speaker = CommandSpeaker::with_echo(None, None, Box::new(out.clone()));
        speaker.speak("Get Ready");
        speaker.play_file(Path::new("/assets/num_5.mp3"));
        let text = out.contents();
        assert!(text.contains("Get Ready"));
        assert!(text.contains("num_5"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn overlapping_commands_are_all_reaped() {
        let mut speaker = CommandSpeaker::with_echo(
            None,
            Some(vec!["sleep".to_string()]),
            Box::new(std::io::sink()),
        );
        let mut pids = Vec::new();
        for _ in 0..5 {
            speaker.speak("0.3");
            pids.extend(speaker.children.last().map(Child::id));
        }
        assert_eq!(pids.len(), 5);
        assert!(speaker.children.len() <= MAX_IN_FLIGHT);

        speaker.stop();
        assert!(speaker.children.is_empty());
        for pid in pids {
            assert!(
                !Path::new(&format!("/proc/{pid}")).exists(),
                "process {pid} was not reaped"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn finished_commands_are_reaped_on_next_spawn() {
        let mut speaker = CommandSpeaker::with_echo(
            None,
            Some(vec!["true".to_string()]),
            Box::new(std::io::sink()),
        );
        speaker.speak("one");
        speaker.speak("two");
        std::thread::sleep(std::time::Duration::from_millis(300));
        speaker.speak("three");
        assert_eq!(speaker.children.len(), 1);
    }

    #[test]
    fn missing_program_is_not_fatal() {
        let out = TestWriter::default();
        let mut speaker = CommandSpeaker::with_echo(
            None,
            Some(vec!["/nonexistent/onerep-speech-binary".to_string()]),
            Box::new(out),
        );
        speaker.speak("Rest");
        speaker.stop();
    }
}
