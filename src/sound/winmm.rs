//! PlaySound and MCI backed playback

use crate::error::{ReminderError, Result};
use crate::sound::SoundBackend;
use crate::win::wide_str;
use std::path::Path;
use tracing::trace;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HMODULE, HWND};
use windows::Win32::Media::Audio::{PlaySoundW, SND_ALIAS, SND_ASYNC};
use windows::Win32::Media::Multimedia::mciSendStringW;

/// winmm playback: system aliases through PlaySound, files through MCI
pub struct WinmmBackend;

impl SoundBackend for WinmmBackend {
    fn play_alias(&self, alias: &str) -> Result<()> {
        let alias_w = wide_str(alias);
        let played = unsafe {
            PlaySoundW(
                PCWSTR::from_raw(alias_w.as_ptr()),
                HMODULE::default(),
                SND_ALIAS | SND_ASYNC,
            )
        };
        if played.as_bool() {
            Ok(())
        } else {
            Err(ReminderError::Playback(format!(
                "PlaySound failed for alias {}",
                alias
            )))
        }
    }

    fn play_file(&self, handle: &str, path: &Path) -> Result<()> {
        mci(&format!(
            "open \"{}\" type waveaudio alias {}",
            path.display(),
            handle
        ))?;
        mci(&format!("play {}", handle))
    }

    fn close(&self, handle: &str) {
        // Unknown aliases return an MCI error, which is fine here
        let _ = mci(&format!("close {}", handle));
    }
}

fn mci(command: &str) -> Result<()> {
    trace!("mci: {}", command);
    let command_w = wide_str(command);
    let code = unsafe {
        mciSendStringW(
            PCWSTR::from_raw(command_w.as_ptr()),
            None,
            HWND::default(),
        )
    };
    if code == 0 {
        Ok(())
    } else {
        Err(ReminderError::Playback(format!(
            "MCI error {} for '{}'",
            code, command
        )))
    }
}
