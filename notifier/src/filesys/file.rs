//! JSON configuration files

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;

use crate::errors::NotifierError;

/// A configuration file on disk
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    pub async fn read_string(&self) -> Result<String, NotifierError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    /// Read and deserialize the whole file
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, NotifierError> {
        let contents = self.read_string().await?;
        let value = serde_json::from_str(&contents)?;
        Ok(value)
    }

    /// Like [`File::read_json`], but a missing file yields `T::default()`
    pub async fn read_json_or_default<T: DeserializeOwned + Default>(
        &self,
    ) -> Result<T, NotifierError> {
        if !self.exists().await {
            return Ok(T::default());
        }
        self.read_json().await
    }
}
