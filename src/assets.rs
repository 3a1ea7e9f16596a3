use std::{
    borrow::Cow,
    collections::BTreeMap,
    fs, io,
    path::{Component, Path, PathBuf},
};

use walkdir::WalkDir;

use crate::error::InstallerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Dir,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Relative to the root of the asset tree.
    pub path: PathBuf,
    pub kind: AssetKind,
}

/// A read-only tree of template files.
pub trait AssetProvider {
    /// Every entry of the tree. A directory always comes before its contents.
    fn entries(&self) -> Result<Vec<AssetEntry>, InstallerError>;

    fn read(&self, path: &Path) -> Result<Cow<'_, [u8]>, InstallerError>;
}

// ── Compiled-in templates ─────────────────────────────────────────────────────

macro_rules! template {
    ($path:literal) => {
        (
            $path,
            include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/", $path)) as &[u8],
        )
    };
}

static TEMPLATES: &[(&str, &[u8])] = &[
    template!("git/dot-gitconfig"),
    template!("zsh/dot-zshrc"),
    template!("tmux/dot-tmux.conf"),
    template!("nvim/dot-config/nvim/init.lua"),
    template!("p10k/dot-p10k.zsh"),
];

/// Files baked into the binary at build time, keyed by `/`-separated path.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedAssets {
    files: &'static [(&'static str, &'static [u8])],
}

impl EmbeddedAssets {
    /// The git, zsh, tmux, neovim and powerlevel10k templates.
    pub fn templates() -> Self {
        EmbeddedAssets { files: TEMPLATES }
    }

    #[cfg(test)]
    pub fn new(files: &'static [(&'static str, &'static [u8])]) -> Self {
        EmbeddedAssets { files }
    }
}

impl AssetProvider for EmbeddedAssets {
    fn entries(&self) -> Result<Vec<AssetEntry>, InstallerError> {
        // Path ordering is component-wise, so a parent sorts before its children.
        let mut tree = BTreeMap::new();
        for (name, _) in self.files {
            let path = checked_relative(name)?;
            for ancestor in path.ancestors().skip(1) {
                if !ancestor.as_os_str().is_empty() {
                    tree.insert(ancestor.to_path_buf(), AssetKind::Dir);
                }
            }
            tree.insert(path, AssetKind::File);
        }

        Ok(tree
            .into_iter()
            .map(|(path, kind)| AssetEntry { path, kind })
            .collect())
    }

    fn read(&self, path: &Path) -> Result<Cow<'_, [u8]>, InstallerError> {
        self.files
            .iter()
            .find(|(name, _)| Path::new(name) == path)
            .map(|(_, bytes)| Cow::Borrowed(*bytes))
            .ok_or_else(|| InstallerError::InvalidAsset(path.display().to_string()))
    }
}

/// Rejects absolute paths and `..` so nothing lands outside the destination.
fn checked_relative(name: &str) -> Result<PathBuf, InstallerError> {
    let path = Path::new(name);
    let clean = !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if clean {
        Ok(path.components().collect())
    } else {
        Err(InstallerError::InvalidAsset(name.to_string()))
    }
}

// ── Templates on disk ─────────────────────────────────────────────────────────

/// A template tree read from a directory, e.g. a checkout of the templates.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirAssets { root: root.into() }
    }
}

impl AssetProvider for DirAssets {
    fn entries(&self) -> Result<Vec<AssetEntry>, InstallerError> {
        let mut out = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| InstallerError::InvalidAsset(entry.path().display().to_string()))?
                .to_path_buf();
            let kind = if entry.file_type().is_dir() {
                AssetKind::Dir
            } else {
                AssetKind::File
            };
            out.push(AssetEntry { path, kind });
        }
        Ok(out)
    }

    fn read(&self, path: &Path) -> Result<Cow<'_, [u8]>, InstallerError> {
        Ok(Cow::Owned(fs::read(self.root.join(path))?))
    }
}
