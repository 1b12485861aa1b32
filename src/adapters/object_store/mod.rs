//! Object store adapter implementations (spec §6's object-store layout).

mod local_fs;

pub use local_fs::LocalFsObjectStore;
