//! Whole-file replacement through a sibling temp file and rename.

use crate::domain::error::MarketGraphError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// `<file name>.tmp` next to `path`; never equal to `path` itself.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn write_atomic(path: &Path, content: &str) -> Result<(), MarketGraphError> {
    let persist_err = |e: std::io::Error| MarketGraphError::Persist {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let temp_path = temp_path_for(path);
    let written = File::create(&temp_path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()
    });

    if let Err(e) = written.and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(persist_err(e));
    }
    Ok(())
}
