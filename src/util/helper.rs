#[cfg(test)]
pub mod test_helper {
    use crate::constants::MasterSeed;
    use rand::{rngs::OsRng, RngCore};

    pub fn gen_random_seed() -> MasterSeed {
        let mut seed = MasterSeed::default();
        OsRng.fill_bytes(&mut seed);
        seed
    }
}
