#![allow(dead_code)]

use std::hash::{BuildHasherDefault, Hasher};
use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

pub fn initialize_logger() {
    INIT.call_once_force(|_| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Warn)
            .filter_module("bucket_map", LevelFilter::Debug)
            .is_test(true)
            .parse_default_env();

        // another test binary thread may have won the race
        let _ = builder.try_init();
    });
}

/// Deterministic hasher: integers hash to themselves, bytes fold as a
/// base-31 polynomial.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolyHasher(u64);

impl Hasher for PolyHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(b));
        }
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n
    }
}

pub type Poly = BuildHasherDefault<PolyHasher>;
