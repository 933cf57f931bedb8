//! Fixed-size binary layout of the settings file
//!
//! The layout mirrors the record written by earlier releases, so an existing
//! `settings.bin` keeps working. All integers are little-endian `i32`, paths
//! are 260 UTF-16 code units with a NUL terminator.

use crate::error::{ReminderError, Result};
use crate::settings::record::{BatteryReminder, IntervalReminder, PreferenceRecord, SoundChoice};

/// Total record size in bytes
pub const RECORD_LEN: usize = 1596;

/// UTF-16 units reserved per path, terminator included
const PATH_SLOT_UNITS: usize = 260;

/// Longest path that still leaves room for the terminator
pub const MAX_PATH_UNITS: usize = PATH_SLOT_UNITS - 1;

const BATTERY_THRESHOLD: usize = 0;
const BREAK_MIN: usize = 4;
const BREAK_SEC: usize = 8;
const CHECK_INTERVAL: usize = 12;
const BATTERY_ENABLED: usize = 16;
const BREAK_ENABLED: usize = 17;
const BATTERY_CUSTOM: usize = 18;
const BREAK_CUSTOM: usize = 19;
const BLINK_ENABLED: usize = 20;
const BLINK_MIN: usize = 24;
const BLINK_SEC: usize = 28;
const BLINK_CUSTOM: usize = 32;
const BATTERY_PATH: usize = 34;
const BREAK_PATH: usize = BATTERY_PATH + PATH_SLOT_UNITS * 2;
const BLINK_PATH: usize = BREAK_PATH + PATH_SLOT_UNITS * 2;
const AUTO_START: usize = BLINK_PATH + PATH_SLOT_UNITS * 2;

/// Serialize a record into its on-disk bytes
///
/// Paths longer than the slot are truncated; `PreferenceRecord::validate`
/// refuses them before a save gets here.
pub fn encode(record: &PreferenceRecord) -> Vec<u8> {
    let mut buf = vec![0u8; RECORD_LEN];

    put_i32(&mut buf, BATTERY_THRESHOLD, record.battery.threshold_percent);
    put_i32(&mut buf, BREAK_MIN, record.eye_break.minutes);
    put_i32(&mut buf, BREAK_SEC, record.eye_break.seconds);
    put_i32(&mut buf, CHECK_INTERVAL, record.battery.poll_interval_secs);

    buf[BATTERY_ENABLED] = record.battery.enabled as u8;
    buf[BREAK_ENABLED] = record.eye_break.enabled as u8;
    buf[BATTERY_CUSTOM] = record.battery.sound.use_custom as u8;
    buf[BREAK_CUSTOM] = record.eye_break.sound.use_custom as u8;
    buf[BLINK_ENABLED] = record.blink.enabled as u8;

    put_i32(&mut buf, BLINK_MIN, record.blink.minutes);
    put_i32(&mut buf, BLINK_SEC, record.blink.seconds);
    buf[BLINK_CUSTOM] = record.blink.sound.use_custom as u8;

    put_path(&mut buf, BATTERY_PATH, &record.battery.sound.custom_path);
    put_path(&mut buf, BREAK_PATH, &record.eye_break.sound.custom_path);
    put_path(&mut buf, BLINK_PATH, &record.blink.sound.custom_path);

    buf[AUTO_START] = record.auto_start as u8;
    buf
}

/// Parse on-disk bytes; anything but an exact-length buffer is rejected
pub fn decode(bytes: &[u8]) -> Result<PreferenceRecord> {
    if bytes.len() != RECORD_LEN {
        return Err(ReminderError::MalformedRecord(format!(
            "expected {} bytes, found {}",
            RECORD_LEN,
            bytes.len()
        )));
    }

    Ok(PreferenceRecord {
        battery: BatteryReminder {
            enabled: bytes[BATTERY_ENABLED] != 0,
            threshold_percent: get_i32(bytes, BATTERY_THRESHOLD),
            poll_interval_secs: get_i32(bytes, CHECK_INTERVAL),
            sound: SoundChoice {
                use_custom: bytes[BATTERY_CUSTOM] != 0,
                custom_path: get_path(bytes, BATTERY_PATH),
            },
        },
        eye_break: IntervalReminder {
            enabled: bytes[BREAK_ENABLED] != 0,
            minutes: get_i32(bytes, BREAK_MIN),
            seconds: get_i32(bytes, BREAK_SEC),
            sound: SoundChoice {
                use_custom: bytes[BREAK_CUSTOM] != 0,
                custom_path: get_path(bytes, BREAK_PATH),
            },
        },
        blink: IntervalReminder {
            enabled: bytes[BLINK_ENABLED] != 0,
            minutes: get_i32(bytes, BLINK_MIN),
            seconds: get_i32(bytes, BLINK_SEC),
            sound: SoundChoice {
                use_custom: bytes[BLINK_CUSTOM] != 0,
                custom_path: get_path(bytes, BLINK_PATH),
            },
        },
        auto_start: bytes[AUTO_START] != 0,
    })
}

fn put_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn get_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(raw)
}

fn put_path(buf: &mut [u8], offset: usize, path: &str) {
    for (i, unit) in path.encode_utf16().take(MAX_PATH_UNITS).enumerate() {
        let at = offset + i * 2;
        buf[at..at + 2].copy_from_slice(&unit.to_le_bytes());
    }
}

fn get_path(bytes: &[u8], offset: usize) -> String {
    let units: Vec<u16> = bytes[offset..offset + PATH_SLOT_UNITS * 2]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
