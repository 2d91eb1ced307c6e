//! Process-wide defaults consulted by codec constructors that omit an
//! explicit value, per §5/§9. Writes are expected only during embedder
//! start-up; reads afterwards are lock-free in spirit even though a
//! `RwLock` is used, since contention never occurs in practice.

use std::sync::RwLock;

use lazy_static::lazy_static;

use crate::ecss::PusVersion;

/// A snapshot of process-wide defaults. Every codec constructor that would
/// otherwise consult [`GLOBAL_CONFIG`] also accepts the equivalent fields
/// explicitly, so an embedder that wants a pure API can build `Config`
/// values itself and never touch the global.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub default_tm_apid: u16,
    pub default_tc_apid: u16,
    pub default_pus_tm_version: PusVersion,
    pub default_pus_tc_version: PusVersion,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_tm_apid: 0,
            default_tc_apid: 0,
            default_pus_tm_version: PusVersion::PusC,
            default_pus_tc_version: PusVersion::PusC,
        }
    }
}

lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<Config> = RwLock::new(Config::default());
}

pub fn default_tm_apid() -> u16 {
    GLOBAL_CONFIG.read().unwrap().default_tm_apid
}

pub fn set_default_tm_apid(apid: u16) {
    GLOBAL_CONFIG.write().unwrap().default_tm_apid = apid;
}

pub fn default_tc_apid() -> u16 {
    GLOBAL_CONFIG.read().unwrap().default_tc_apid
}

pub fn set_default_tc_apid(apid: u16) {
    GLOBAL_CONFIG.write().unwrap().default_tc_apid = apid;
}

pub fn default_pus_tm_version() -> PusVersion {
    GLOBAL_CONFIG.read().unwrap().default_pus_tm_version
}

pub fn set_default_pus_tm_version(version: PusVersion) {
    GLOBAL_CONFIG.write().unwrap().default_pus_tm_version = version;
}

pub fn default_pus_tc_version() -> PusVersion {
    GLOBAL_CONFIG.read().unwrap().default_pus_tc_version
}

pub fn set_default_pus_tc_version(version: PusVersion) {
    GLOBAL_CONFIG.write().unwrap().default_pus_tc_version = version;
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    // Serializes the global-config tests so they don't race each other's
    // writes to the process-wide RwLock.
    lazy_static! {
        static ref TEST_LOCK: Mutex<()> = Mutex::new(());
    }

    #[test]
    fn default_config_is_pus_c() {
        let _guard = TEST_LOCK.lock().unwrap();
        assert_eq!(default_pus_tm_version(), PusVersion::PusC);
        assert_eq!(default_pus_tc_version(), PusVersion::PusC);
    }

    #[test]
    fn set_and_read_apid() {
        let _guard = TEST_LOCK.lock().unwrap();
        set_default_tm_apid(0x42);
        assert_eq!(default_tm_apid(), 0x42);
        set_default_tm_apid(0);
    }
}
