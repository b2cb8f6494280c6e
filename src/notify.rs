use std::{
    fs,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::constants::AUDIO;

pub trait Notifier {
    fn notify(&mut self);
}

#[derive(Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&mut self) {}
}

/// Plays a random tune from a directory through an external player without
/// waiting for it to finish. Finished players are reaped on the next call.
#[derive(Debug)]
pub struct SoundNotifier {
    tunes_dir: PathBuf,
    player: PathBuf,
    players: Vec<Child>,
}

impl SoundNotifier {
    pub fn new(tunes_dir: PathBuf) -> Self {
        Self {
            tunes_dir,
            player: PathBuf::from(AUDIO.player),
            players: Vec::new(),
        }
    }

    /// Drops players that have exited. Returns how many are still running.
    fn reap_finished(&mut self) -> usize {
        self.players.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = child.id(), %status, "audio player exited");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(pid = child.id(), error = %e, "audio player status check failed");
                false
            }
        });
        self.players.len()
    }

    pub fn pick_tune(&self) -> Option<PathBuf> {
        let tunes = list_tunes(&self.tunes_dir);
        tunes.choose(&mut rand::thread_rng()).cloned()
    }
}

impl Notifier for SoundNotifier {
    fn notify(&mut self) {
        self.reap_finished();

        let Some(tune) = self.pick_tune() else {
            debug!(dir = %self.tunes_dir.display(), "no tunes available");
            return;
        };

        let spawned = Command::new(&self.player)
            .args(AUDIO.player_args)
            .arg(&tune)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                debug!(tune = %tune.display(), pid = child.id(), "playing tune");
                self.players.push(child);
            }
            Err(e) => {
                warn!(player = %self.player.display(), error = %e, "could not start audio player")
            }
        }
    }
}

pub fn is_tune(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            AUDIO
                .extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

pub fn list_tunes(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut tunes: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_tune(path))
        .collect();
    tunes.sort();
    tunes
}

#[cfg(test)]
mod tests {
    use std::{
        thread,
        time::{Duration, SystemTime},
    };

    use super::*;

    fn unique_dir(prefix: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        PathBuf::from(format!("/tmp/{}_{}", prefix, now))
    }

    #[test]
    fn test_is_tune_checks_extension() {
        assert!(is_tune(Path::new("bell.mp3")));
        assert!(is_tune(Path::new("bell.WAV")));
        assert!(!is_tune(Path::new("notes.txt")));
        assert!(!is_tune(Path::new("mp3")));
    }

    #[test]
    fn test_missing_dir_has_no_tunes() {
        let notifier = SoundNotifier::new(unique_dir("dayblocks_missing_tunes"));
        assert_eq!(notifier.pick_tune(), None);
    }

    #[test]
    fn test_pick_tune_only_returns_audio_files() {
        let dir = unique_dir("dayblocks_tunes");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("chime.wav"), b"").unwrap();
        fs::write(dir.join("readme.md"), b"").unwrap();

        assert_eq!(list_tunes(&dir), vec![dir.join("chime.wav")]);
        let notifier = SoundNotifier::new(dir.clone());
        assert_eq!(notifier.pick_tune(), Some(dir.join("chime.wav")));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_empty_dir_notify_is_noop() {
        let dir = unique_dir("dayblocks_empty_tunes");
        fs::create_dir_all(&dir).unwrap();

        let mut notifier = SoundNotifier::new(dir.clone());
        notifier.notify();

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_finished_players_are_reaped() {
        let dir = unique_dir("dayblocks_reap_tunes");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("chime.wav"), b"").unwrap();

        let mut notifier = SoundNotifier::new(dir.clone());
        notifier.player = PathBuf::from("true");
        for _ in 0..5 {
            notifier.notify();
        }
        assert!(!notifier.players.is_empty());

        let mut running = notifier.reap_finished();
        for _ in 0..100 {
            if running == 0 {
                break;
            }
            thread::sleep(Duration::from_millis(20));
            running = notifier.reap_finished();
        }
        assert_eq!(running, 0);
        assert!(notifier.players.is_empty());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_player_is_not_tracked() {
        let dir = unique_dir("dayblocks_no_player_tunes");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("chime.wav"), b"").unwrap();

        let mut notifier = SoundNotifier::new(dir.clone());
        notifier.player = dir.join("no_such_player");
        notifier.notify();
        assert!(notifier.players.is_empty());

        fs::remove_dir_all(dir).ok();
    }
}
