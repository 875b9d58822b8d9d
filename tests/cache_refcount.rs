use mdlforge::cache::SourceFileCache;
use mdlforge::import::{ImportBackend, ImportError, SourceAnimation, SourceBone, SourceFileData};
use std::path::{Path, PathBuf};

/// Records every oracle call; paths ending in `.bad` fail to parse.
#[derive(Default)]
struct SpyBackend {
    loads: Vec<PathBuf>,
    unloads: Vec<PathBuf>,
}

impl ImportBackend for SpyBackend {
    fn load_file(&mut self, path: &Path) -> Result<SourceFileData, ImportError> {
        self.loads.push(path.to_path_buf());
        if path.extension().is_some_and(|ext| ext == "bad") {
            return Err(ImportError::UnsupportedFormat("bad".to_string()));
        }
        Ok(SourceFileData {
            bones: vec![SourceBone { name: "root".to_string(), parent: None }],
            animations: vec![SourceAnimation { name: "clip_a".to_string(), frame_count: 2 }],
            parts: vec!["Head".to_string(), "Head_Ref".to_string()],
        })
    }

    fn unload_file(&mut self, path: &Path) {
        self.unloads.push(path.to_path_buf());
    }
}

#[test]
fn second_acquire_is_served_from_the_cache() {
    let mut backend = SpyBackend::default();
    let mut cache = SourceFileCache::new();
    let path = Path::new("/models/head.smd");

    let first = cache.acquire(&mut backend, path).expect("first acquire");
    let second = cache.acquire(&mut backend, path).expect("second acquire");

    assert_eq!(backend.loads.len(), 1, "one oracle call per loaded path");
    assert_eq!(cache.ref_count(path), 2);
    assert_eq!(first.parts, second.parts);
}

#[test]
fn equivalent_path_spellings_share_one_entry() {
    let mut backend = SpyBackend::default();
    let mut cache = SourceFileCache::new();

    cache.acquire(&mut backend, Path::new("/models/./head.smd")).expect("acquire dotted");
    cache.acquire(&mut backend, Path::new("/models/props/../head.smd")).expect("acquire parented");

    assert_eq!(backend.loads.len(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.ref_count(Path::new("/models/head.smd")), 2);
}

#[test]
fn last_release_unloads_and_removes_the_entry() {
    let mut backend = SpyBackend::default();
    let mut cache = SourceFileCache::new();
    let path = Path::new("/models/head.smd");

    cache.acquire(&mut backend, path).expect("acquire");
    cache.acquire(&mut backend, path).expect("acquire again");
    cache.release(&mut backend, path);
    assert!(cache.contains(path), "one holder remains");
    assert!(backend.unloads.is_empty());

    cache.release(&mut backend, path);
    assert!(!cache.contains(path));
    assert_eq!(backend.unloads, vec![PathBuf::from("/models/head.smd")]);
}

#[test]
fn releasing_an_unknown_path_is_a_silent_no_op() {
    let mut backend = SpyBackend::default();
    let mut cache = SourceFileCache::new();
    cache.release(&mut backend, Path::new("/models/never_loaded.smd"));
    assert!(cache.is_empty());
    assert!(backend.unloads.is_empty());
}

#[test]
fn replacing_a_path_with_itself_changes_nothing() {
    let mut backend = SpyBackend::default();
    let mut cache = SourceFileCache::new();
    let path = Path::new("/models/head.smd");

    cache.acquire(&mut backend, path).expect("acquire");
    let data =
        cache.replace(&mut backend, Some(path), Path::new("/models/./head.smd")).expect("replace");

    assert_eq!(cache.ref_count(path), 1, "count must not move on a re-pick");
    assert_eq!(backend.loads.len(), 1);
    assert!(backend.unloads.is_empty());
    assert_eq!(data.parts.len(), 2);
}

#[test]
fn replace_with_an_unheld_path_on_both_sides_just_acquires() {
    let mut backend = SpyBackend::default();
    let mut cache = SourceFileCache::new();
    let path = Path::new("/models/head.smd");

    let data = cache.replace(&mut backend, Some(path), path).expect("replace");

    assert_eq!(cache.ref_count(path), 1, "the entry must survive the replace");
    assert_eq!(backend.loads.len(), 1);
    assert!(backend.unloads.is_empty(), "the fresh entry must not be torn back down");
    assert_eq!(data.parts.len(), 2);
}

#[test]
fn replace_acquires_the_new_path_before_releasing_the_old() {
    let mut backend = SpyBackend::default();
    let mut cache = SourceFileCache::new();
    let old = Path::new("/models/head_old.smd");
    let new = Path::new("/models/head_new.smd");

    cache.acquire(&mut backend, old).expect("acquire old");
    cache.replace(&mut backend, Some(old), new).expect("replace");

    assert!(!cache.contains(old));
    assert_eq!(cache.ref_count(new), 1);
    assert_eq!(backend.loads, vec![old.to_path_buf(), new.to_path_buf()]);
    assert_eq!(backend.unloads, vec![old.to_path_buf()]);
}

#[test]
fn failed_replace_leaves_the_previous_reference_untouched() {
    let mut backend = SpyBackend::default();
    let mut cache = SourceFileCache::new();
    let old = Path::new("/models/head.smd");

    cache.acquire(&mut backend, old).expect("acquire old");
    let result = cache.replace(&mut backend, Some(old), Path::new("/models/broken.bad"));

    assert!(result.is_err());
    assert_eq!(cache.ref_count(old), 1);
    assert!(!cache.contains(Path::new("/models/broken.bad")), "failed loads insert nothing");
    assert!(backend.unloads.is_empty());
}

#[test]
fn teardown_releases_every_entry_exactly_once() {
    let mut backend = SpyBackend::default();
    let mut cache = SourceFileCache::new();
    let head = Path::new("/models/head.smd");
    let body = Path::new("/models/body.smd");

    cache.acquire(&mut backend, head).expect("acquire head");
    cache.acquire(&mut backend, head).expect("acquire head again");
    cache.acquire(&mut backend, body).expect("acquire body");

    cache.teardown(&mut backend);

    assert!(cache.is_empty());
    assert_eq!(backend.unloads.len(), 2, "one unload per path regardless of count");
    assert!(backend.unloads.contains(&head.to_path_buf()));
    assert!(backend.unloads.contains(&body.to_path_buf()));
}
