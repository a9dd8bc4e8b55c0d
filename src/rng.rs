//! Seeded random streams.
//!
//! The run seed is fixed once. Mapper draws come from one ChaCha8 stream per
//! patient (stream id derived from the patient ID), so results do not depend
//! on the order in which patients are scheduled.

use crc::{CRC_64_ECMA_182, Crc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const STREAM_CRC: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedStream {
    seed: u64,
}

impl SeedStream {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn patient(&self, patient_id: &str) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(stream_key(patient_id));
        rng
    }

    /// Fresh generator for one bootstrap computation.
    pub fn bootstrap(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }
}

pub fn stream_key(patient_id: &str) -> u64 {
    STREAM_CRC.checksum(patient_id.as_bytes())
}
