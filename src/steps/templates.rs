use std::{
    fs::{self, DirBuilder, Permissions},
    os::unix::fs::{DirBuilderExt, PermissionsExt},
    path::Path,
};

use tracing::debug;

use crate::{
    assets::{AssetKind, AssetProvider},
    error::InstallerError,
};

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// Recreates the asset tree under `destination`. Existing files are
/// overwritten; the first failing entry aborts the whole walk.
///
/// Returns the number of files written.
pub fn deploy_tree(
    assets: &dyn AssetProvider,
    destination: &Path,
) -> Result<usize, InstallerError> {
    DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(destination)?;

    let mut written = 0;
    for entry in assets.entries()? {
        let target = destination.join(&entry.path);
        match entry.kind {
            AssetKind::Dir => {
                DirBuilder::new()
                    .recursive(true)
                    .mode(DIR_MODE)
                    .create(&target)?;
            }
            AssetKind::File => {
                let bytes = assets.read(&entry.path)?;
                fs::write(&target, &bytes)?;
                fs::set_permissions(&target, Permissions::from_mode(FILE_MODE))?;
                debug!(file = %target.display(), "template written");
                written += 1;
            }
        }
    }

    Ok(written)
}
