//! The process-wide font library.
//!
//! Holds the list of installed fonts, the cached default font and the set
//! of live font faces. It starts on first use and lives until
//! [`FontLibrary::shutdown`]. Everything goes through one mutex.
//!
//! Fonts must never be dropped while the lock is held: dropping the last
//! reference to font data unregisters the face, which takes the lock again.
use crate::font::Font;
use crate::resolve::{best_match, DirectoryScanner, FontInfo, FontResolver};
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// How often an empty font scan is retried before giving up.
const SCAN_ATTEMPTS: usize = 5;
const SCAN_RETRY_DELAY: Duration = Duration::from_millis(10);

lazy_static! {
    static ref LIBRARY: Mutex<Option<FontLibrary>> = Mutex::new(None);
}

fn lock() -> MutexGuard<'static, Option<FontLibrary>> {
    // A panic while holding the lock leaves the data consistent enough.
    LIBRARY.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct FontLibrary {
    resolver: Box<dyn FontResolver>,
    infos: Vec<FontInfo>,
    names: Vec<String>,
    enumerated: bool,
    tracked: HashSet<u64>,
    default: Option<Font>,
}

impl FontLibrary {
    pub fn new(resolver: Box<dyn FontResolver>) -> FontLibrary {
        FontLibrary {
            resolver,
            infos: vec![],
            names: vec![],
            enumerated: false,
            tracked: HashSet::new(),
            default: None,
        }
    }

    /// Runs `f` on the global library, starting it with the system font
    /// directories if needed.
    pub fn with<T>(f: impl FnOnce(&mut FontLibrary) -> T) -> T {
        let mut guard = lock();
        let lib = guard.get_or_insert_with(|| {
            log::debug!("starting font library");
            FontLibrary::new(Box::new(DirectoryScanner::system()))
        });
        f(lib)
    }

    /// Replaces the global library, e.g. to resolve fonts from other
    /// directories.
    pub fn install(lib: FontLibrary) {
        let old = lock().replace(lib);
        // Dropped here, after the lock is released.
        drop(old);
    }

    /// Stops the global library. It restarts on next use.
    pub fn shutdown() {
        let old = lock().take();
        if let Some(old) = &old {
            log::debug!(
                "stopping font library, {} face(s) still alive",
                old.tracked.len()
            );
        }
        drop(old);
    }

    pub fn is_running() -> bool {
        lock().is_some()
    }

    pub(crate) fn face_created(id: u64) {
        FontLibrary::with(|lib| lib.tracked.insert(id));
    }

    /// Faces outliving the library are fine, this does not restart it.
    pub(crate) fn face_destroyed(id: u64) {
        if let Some(lib) = lock().as_mut() {
            lib.tracked.remove(&id);
        }
    }

    /// Number of font faces currently alive.
    pub fn tracked_faces(&self) -> usize {
        self.tracked.len()
    }

    /// Stores `font` as the default unless another thread got there
    /// first, and returns whichever font won.
    pub(crate) fn store_default(font: Font) -> Font {
        let (winner, loser) = {
            let mut guard = lock();
            let lib = guard.get_or_insert_with(|| {
                FontLibrary::new(Box::new(DirectoryScanner::system()))
            });
            match &lib.default {
                Some(existing) => (existing.clone(), Some(font)),
                None => {
                    lib.default = Some(font.clone());
                    (font, None)
                }
            }
        };
        drop(loser);
        winner
    }

    pub fn cached_default(&self) -> Option<Font> {
        self.default.clone()
    }

    pub fn default_family(&self) -> String {
        self.resolver.default_family().to_string()
    }

    /// The installed font best matching `name`, or the platform fallback.
    pub fn font_info(&mut self, name: &str) -> FontInfo {
        if !self.enumerated {
            self.enumerate();
        }
        match best_match(&self.infos, name) {
            Some(info) => {
                log::debug!("font '{}' resolved to {}", name, info.path.display());
                info.clone()
            }
            None => {
                let fallback = self.resolver.fallback();
                log::debug!("no font matches '{}', using {}", name, fallback.name);
                fallback
            }
        }
    }

    /// Unique, sorted names of the installed fonts.
    pub fn names(&mut self, force_refresh: bool) -> &[String] {
        if force_refresh || !self.enumerated {
            self.enumerate();
        }
        &self.names
    }

    fn enumerate(&mut self) {
        let mut infos = vec![];
        for attempt in 1..=SCAN_ATTEMPTS {
            infos = self.resolver.scan();
            if !infos.is_empty() {
                break;
            }
            if attempt < SCAN_ATTEMPTS {
                thread::sleep(SCAN_RETRY_DELAY);
            }
        }
        if infos.is_empty() {
            log::warn!("no fonts found after {} attempts", SCAN_ATTEMPTS);
        }

        let mut names: Vec<String> = infos.iter().map(|i| i.name.clone()).collect();
        names.sort();
        names.dedup();

        self.infos = infos;
        self.names = names;
        self.enumerated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves a fixed list, optionally failing the first few scans.
    struct Fixed {
        infos: Vec<FontInfo>,
        empty_scans: usize,
        scans: Arc<AtomicUsize>,
    }

    impl FontResolver for Fixed {
        fn scan(&mut self) -> Vec<FontInfo> {
            let n = self.scans.fetch_add(1, Ordering::SeqCst);
            if n < self.empty_scans {
                vec![]
            } else {
                self.infos.clone()
            }
        }

        fn fallback(&self) -> FontInfo {
            FontInfo::new("Fallback Sans", "/fonts/fallback.ttf")
        }

        fn default_family(&self) -> &str {
            "Fallback Sans"
        }
    }

    fn library(empty_scans: usize) -> (FontLibrary, Arc<AtomicUsize>) {
        let scans = Arc::new(AtomicUsize::new(0));
        let infos = ["Serif Bold", "Mono", "Serif Bold", "Serif"]
            .iter()
            .map(|n| FontInfo::new(n, format!("/fonts/{}.ttf", n)))
            .collect();
        let resolver = Fixed {
            infos,
            empty_scans,
            scans: Arc::clone(&scans),
        };
        (FontLibrary::new(Box::new(resolver)), scans)
    }

    #[test]
    fn names_are_sorted_and_unique() {
        let (mut lib, scans) = library(0);
        assert_eq!(lib.names(false), ["Mono", "Serif", "Serif Bold"]);
        lib.names(false);
        assert_eq!(scans.load(Ordering::SeqCst), 1);
        lib.names(true);
        assert_eq!(scans.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_scans_are_retried() {
        let (mut lib, scans) = library(3);
        assert_eq!(lib.names(false).len(), 3);
        assert_eq!(scans.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn gives_up_after_five_scans() {
        let (mut lib, scans) = library(100);
        assert!(lib.names(false).is_empty());
        assert_eq!(scans.load(Ordering::SeqCst), SCAN_ATTEMPTS);
    }

    #[test]
    fn font_info_falls_back() {
        let (mut lib, _) = library(0);
        assert_eq!(lib.font_info("mono").path, std::path::Path::new("/fonts/Mono.ttf"));
        assert_eq!(lib.font_info("serif").name, "Serif");
        assert_eq!(lib.font_info("Wingdings").name, "Fallback Sans");
        assert_eq!(lib.default_family(), "Fallback Sans");
    }

    #[test]
    fn starts_empty() {
        let (lib, _) = library(0);
        assert_eq!(lib.tracked_faces(), 0);
        assert!(lib.cached_default().is_none());
    }
}
