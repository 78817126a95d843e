//! Fuzz target: persisted config blob
//!
//! Stores arbitrary bytes where the config lives and loads them back
//! through `NvsAdapter` (simulation backend), verifying:
//! - No panics under arbitrary stored bytes
//! - A blob that loads is always a valid config
//! - A loaded config re-encodes within `CONFIG_BLOB_SIZE` and decodes
//!   to the same value
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use heatguard::adapters::nvs::NvsAdapter;
use heatguard::app::ports::{ConfigError, ConfigPort, StoragePort};
use heatguard::config::{CONFIG_BLOB_SIZE, HeaterConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };
    if nvs.write("heater", "config", data).is_err() {
        return;
    }

    match nvs.load() {
        Ok(cfg) => {
            assert!(cfg.validate().is_ok(), "loaded config failed validation");
            let mut buf = [0u8; CONFIG_BLOB_SIZE];
            let bytes = cfg.encode(&mut buf).expect("valid config must encode");
            let back = HeaterConfig::decode(bytes).expect("re-encoded config must decode");
            assert_eq!(back, cfg);
        }
        Err(ConfigError::Corrupted | ConfigError::StorageFull | ConfigError::IoError) => {}
        Err(e) => panic!("unexpected load error: {}", e),
    }
});
