// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

pub const UPLOADS_SUBDIR: &str = "images/uploads";
pub const META_FILE: &str = "meta.json";
pub const META_TMP_FILE: &str = "meta.json.tmp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub uploads_dir: PathBuf,
}

impl StoreLayout {
    #[must_use]
    pub fn new(uploads_dir: PathBuf) -> Self {
        Self { uploads_dir }
    }

    /// Uploads live under `<root>/images/uploads`, matching the public `src` prefix.
    #[must_use]
    pub fn under_data_root(root: &Path) -> Self {
        Self::new(root.join(UPLOADS_SUBDIR))
    }

    #[must_use]
    pub fn meta_path(&self) -> PathBuf {
        self.uploads_dir.join(META_FILE)
    }

    #[must_use]
    pub fn meta_tmp_path(&self) -> PathBuf {
        self.uploads_dir.join(META_TMP_FILE)
    }

    #[must_use]
    pub fn file_path(&self, file: &str) -> PathBuf {
        self.uploads_dir.join(file)
    }

    /// Maps a public filename onto the uploads directory.
    ///
    /// Rejects separators, parent segments, dotfiles and the metadata document.
    #[must_use]
    pub fn resolve_public_file(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains("..")
            || name == META_FILE
            || name == META_TMP_FILE
        {
            return None;
        }
        Some(self.file_path(name))
    }
}
