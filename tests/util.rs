#![allow(dead_code)]

use std::{
    fs::{read, OpenOptions},
    io::{Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use hbs_lms_state::{
    generate_private_key, HssParameter, LmotsAlgorithm, LmsAlgorithm, MasterSeed,
    PrivateKeyStorage, PRIVATE_KEY_LEN,
};
use tempfile::TempDir;

pub const KEY_NAME: &str = "testkey.prv";

/// A private key kept in a file; updates overwrite the start of the file in place.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: &Path) -> Self {
        FileStorage {
            path: path.to_path_buf(),
        }
    }
}

impl PrivateKeyStorage for FileStorage {
    fn read_private_key(&mut self, private_key: &mut [u8]) -> Result<(), ()> {
        let data = read(&self.path).map_err(|_| ())?;
        if data.len() != private_key.len() {
            return Err(());
        }
        private_key.copy_from_slice(&data);
        Ok(())
    }

    fn update_private_key(&mut self, private_key: &[u8]) -> Result<(), ()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)
            .map_err(|_| ())?;
        file.seek(SeekFrom::Start(0)).map_err(|_| ())?;
        file.write_all(private_key).map_err(|_| ())?;
        file.sync_all().map_err(|_| ())
    }
}

pub fn two_level_parameters() -> [HssParameter; 2] {
    [
        HssParameter::new(LmotsAlgorithm::LmotsSha256N32W2, LmsAlgorithm::LmsSha256N32H10),
        HssParameter::new(LmotsAlgorithm::LmotsSha256N32W4, LmsAlgorithm::LmsSha256N32H5),
    ]
}

pub fn gen_seed() -> MasterSeed {
    let mut seed = MasterSeed::default();
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut seed);
    seed
}

/// Generates a key file in a fresh temporary directory.
pub fn key_file(parameters: &[HssParameter], master_seed: &MasterSeed) -> (TempDir, PathBuf) {
    let tempdir = tempfile::tempdir().expect("Could not create temporary directory");
    let path = tempdir.path().join(KEY_NAME);

    let mut storage = FileStorage::new(&path);
    generate_private_key(parameters, master_seed, |data: &[u8]| {
        storage.update_private_key(data)
    })
    .expect("Should generate private key");

    assert_eq!(read(&path).unwrap().len(), PRIVATE_KEY_LEN);

    (tempdir, path)
}
