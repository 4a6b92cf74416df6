//! Background tasks spawned from `main.rs`.

pub mod scan_watcher;
