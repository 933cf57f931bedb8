//! Single background instance: lock file plus process control

use crate::error::{ReminderError, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use sysinfo::{Pid, System};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Lock file name inside the data directory
pub const LOCK_FILE: &str = "background.lock";

/// Held by the running background instance; removed on drop
///
/// The lock file records the holder's PID for `kill` and `show`. On Windows a
/// named mutex derived from the lock path is taken first, so two instances
/// racing over a stale file can never both win.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    #[cfg(windows)]
    _mutex: named_mutex::NamedMutex,
}

impl InstanceLock {
    /// Take the lock, reclaiming it if the recorded holder is gone
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let dir = lock_dir(&path);
        fs::create_dir_all(&dir).map_err(|e| ReminderError::io(&dir, e))?;

        #[cfg(windows)]
        let mutex = match named_mutex::NamedMutex::acquire(&path)? {
            Some(mutex) => mutex,
            None => return Err(ReminderError::AlreadyRunning(read_pid(&path).unwrap_or(0))),
        };

        let pid = std::process::id();

        // One retry after clearing a stale lock
        for _ in 0..2 {
            match publish_pid(&path, pid) {
                Ok(()) => {
                    info!("Acquired instance lock {:?} (pid {})", path, pid);
                    return Ok(Self {
                        path,
                        #[cfg(windows)]
                        _mutex: mutex,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let contents = fs::read_to_string(&path).unwrap_or_default();
                    if let Some(holder) = parse_pid(&contents).filter(|&p| is_live_instance(p)) {
                        return Err(ReminderError::AlreadyRunning(holder));
                    }
                    warn!("Removing stale instance lock {:?}", path);
                    reclaim_stale(&path, &contents)?;
                }
                Err(e) => return Err(ReminderError::io(&path, e)),
            }
        }

        match live_holder(&path) {
            Some(pid) => Err(ReminderError::AlreadyRunning(pid)),
            None => Err(ReminderError::io(
                &path,
                std::io::Error::new(ErrorKind::AlreadyExists, "lock contended"),
            )),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!("Failed to remove instance lock {:?}: {}", self.path, e);
        }
    }
}

fn lock_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Create the lock file with its PID already in place, failing if it exists
fn publish_pid(path: &Path, pid: u32) -> std::io::Result<()> {
    let mut file = NamedTempFile::new_in(lock_dir(path))?;
    write!(file, "{}", pid)?;
    file.flush()?;
    file.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

/// Delete a stale lock whose contents were `stale`
///
/// The file is first moved aside so only one process can claim it. If what
/// was moved is no longer the stale lock, another instance took the lock in
/// the meantime and its file is put back.
fn reclaim_stale(path: &Path, stale: &str) -> Result<()> {
    let aside = lock_dir(path).join(format!("{}.{}.stale", LOCK_FILE, std::process::id()));

    match fs::rename(path, &aside) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ReminderError::io(path, e)),
    }

    let moved = fs::read_to_string(&aside).unwrap_or_default();
    if moved != stale {
        debug!("Instance lock {:?} was taken meanwhile, restoring it", path);
        if let Err(e) = fs::hard_link(&aside, path) {
            warn!("Failed to restore instance lock {:?}: {}", path, e);
        }
    }

    if let Err(e) = fs::remove_file(&aside) {
        debug!("Failed to remove {:?}: {}", aside, e);
    }
    Ok(())
}

fn parse_pid(contents: &str) -> Option<u32> {
    contents.trim().parse().ok()
}

fn read_pid(path: &Path) -> Option<u32> {
    parse_pid(&fs::read_to_string(path).ok()?)
}

/// PID in the lock file, if that process is alive and is this program
fn live_holder(path: &Path) -> Option<u32> {
    read_pid(path).filter(|&pid| is_live_instance(pid))
}

fn is_live_instance(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }

    let mut system = System::new();
    let sys_pid = Pid::from_u32(pid);
    if !system.refresh_process(sys_pid) {
        return false;
    }
    let Some(process) = system.process(sys_pid) else {
        return false;
    };

    // A reused PID belonging to some other program does not count
    match current_exe_name() {
        Some(own) => process.name().eq_ignore_ascii_case(&own),
        None => true,
    }
}

fn current_exe_name() -> Option<String> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.file_name()?.to_string_lossy().into_owned())
}

#[cfg(windows)]
mod named_mutex {
    use crate::error::Result;
    use crate::win::wide_str;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::path::Path;
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, HANDLE};
    use windows::Win32::System::Threading::CreateMutexW;

    /// Session-local mutex named after the lock file path
    #[derive(Debug)]
    pub struct NamedMutex(HANDLE);

    impl NamedMutex {
        /// `None` if another holder already owns the name
        pub fn acquire(lock_path: &Path) -> Result<Option<Self>> {
            let mut hasher = DefaultHasher::new();
            lock_path.to_string_lossy().to_lowercase().hash(&mut hasher);
            let name = wide_str(&format!(
                "Local\\{}-{:016x}",
                crate::config::APP_NAME,
                hasher.finish()
            ));

            unsafe {
                let handle = CreateMutexW(None, false, PCWSTR::from_raw(name.as_ptr()))?;
                if GetLastError() == ERROR_ALREADY_EXISTS {
                    let _ = CloseHandle(handle);
                    return Ok(None);
                }
                Ok(Some(Self(handle)))
            }
        }
    }

    impl Drop for NamedMutex {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }
}

/// Control over the background reminder process, as seen by the console
pub trait BackgroundProcess: Send + Sync {
    /// Whether a background instance currently holds the lock
    fn is_running(&self) -> bool;

    /// Terminate the running instance; true if one was stopped
    fn terminate(&self) -> bool;

    /// Start a fresh background instance
    fn launch(&self) -> Result<()>;
}

/// The real background process: `<exe> -background`
pub struct BackgroundInstance {
    lock_path: PathBuf,
    exe: PathBuf,
}

impl BackgroundInstance {
    pub fn new(lock_path: impl Into<PathBuf>, exe: impl Into<PathBuf>) -> Self {
        Self {
            lock_path: lock_path.into(),
            exe: exe.into(),
        }
    }

    /// Lock in the data directory, relaunching the current executable
    pub fn for_current_exe(data_dir: &Path) -> Result<Self> {
        let exe = std::env::current_exe().map_err(|e| ReminderError::io("current_exe", e))?;
        Ok(Self::new(data_dir.join(LOCK_FILE), exe))
    }
}

impl BackgroundProcess for BackgroundInstance {
    fn is_running(&self) -> bool {
        live_holder(&self.lock_path).is_some()
    }

    fn terminate(&self) -> bool {
        let Some(pid) = live_holder(&self.lock_path) else {
            debug!("No background instance to terminate");
            return false;
        };
        if pid == std::process::id() {
            return false;
        }

        let mut system = System::new();
        let sys_pid = Pid::from_u32(pid);
        system.refresh_process(sys_pid);
        let killed = system.process(sys_pid).map(|p| p.kill()).unwrap_or(false);

        if killed {
            info!("Terminated background instance (pid {})", pid);
            // A killed process cannot clean up its own lock
            let _ = fs::remove_file(&self.lock_path);
        } else {
            warn!("Failed to terminate background instance (pid {})", pid);
        }
        killed
    }

    fn launch(&self) -> Result<()> {
        let mut command = Command::new(&self.exe);
        command.arg(crate::config::BACKGROUND_FLAG);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let child = command.spawn().map_err(ReminderError::Spawn)?;
        info!("Launched background instance (pid {})", child.id());
        Ok(())
    }
}
