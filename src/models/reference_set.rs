use crate::error::ScanError;
use crate::models::config::AssetConfig;
use std::path::PathBuf;

/// One template image, identified by its 1-based load index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAsset {
    pub index: usize,
    pub path: PathBuf,
}

/// Ordered templates plus the alphabet that must be loaded before scanning.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSet {
    templates: Vec<TemplateAsset>,
    alphabet: PathBuf,
}

impl ReferenceSet {
    pub fn new(template_paths: Vec<PathBuf>, alphabet: PathBuf) -> Result<Self, ScanError> {
        if template_paths.is_empty() {
            return Err(ScanError::Config(
                "reference set needs at least one template".to_string(),
            ));
        }

        let templates = template_paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| TemplateAsset { index: i + 1, path })
            .collect();

        Ok(Self { templates, alphabet })
    }

    /// `root/template_dir/{1..=N}.{ext}` and `root/alphabet_path`
    pub fn from_config(assets: &AssetConfig) -> Result<Self, ScanError> {
        let template_dir = assets.root.join(&assets.template_dir);
        let paths = (1..=assets.template_count)
            .map(|index| template_dir.join(format!("{}.{}", index, assets.template_extension)))
            .collect();

        Self::new(paths, assets.root.join(&assets.alphabet_path))
    }

    pub fn templates(&self) -> &[TemplateAsset] {
        &self.templates
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    pub fn alphabet(&self) -> &PathBuf {
        &self.alphabet
    }
}
