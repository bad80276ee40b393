use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ember8::{Ember8, LoadError, RandomSource};
use log::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum RomError {
    #[error("cannot read ROM {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Load(LoadError),
}

impl From<LoadError> for RomError {
    fn from(err: LoadError) -> Self {
        RomError::Load(err)
    }
}

/// Read a raw program image, no header is expected
pub fn read_rom(path: &Path) -> Result<Vec<u8>, RomError> {
    let rom = fs::read(path).map_err(|source| RomError::Io {
        path: path.to_owned(),
        source,
    })?;
    debug!("read {} bytes from {}", rom.len(), path.display());
    Ok(rom)
}

/// Read a program from `path` into `ember`
///
/// On failure the machine keeps whatever it held before.
pub fn load_rom<R: RandomSource>(ember: &mut Ember8<R>, path: &Path) -> Result<(), RomError> {
    let rom = read_rom(path)?;
    ember.load(&rom)?;
    info!("loaded {}", path.display());
    Ok(())
}
