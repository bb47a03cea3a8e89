#![no_main]

use libfuzzer_sys::fuzz_target;
use vouch_core::remote::{is_valid_version, ModuleRef, RemoteRepository};

fuzz_target!(|data: &str| {
    if let Ok(remote) = RemoteRepository::parse(data) {
        assert!(!remote.domain.is_empty());
        assert!(remote.repo_path.starts_with(&remote.owner));
    }
    let _ = ModuleRef::parse(data);
    let _ = is_valid_version(data);
});
