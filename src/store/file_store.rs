//! One JSON file per key under a data directory

use super::KeyValueStore;
use crate::error::{NeoCareError, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct FileStore {
    dir: PathBuf,
    // serializes read-modify-write across callers of this instance
    lock: Mutex<()>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys may hold any characters, so the file name is their hash
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    fn read(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        let value = serde_json::from_reader(reader)
            .map_err(|e| NeoCareError::Storage(format!("corrupt entry {:?}: {}", key, e)))?;
        Ok(Some(value))
    }

    fn write(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.read(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.write(key, &value)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    fn update(&self, key: &str, f: &mut dyn FnMut(Option<Value>) -> Value) -> Result<Value> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let next = f(self.read(key)?);
        self.write(key, &next)?;
        Ok(next)
    }
}
