//! The dataset descriptor YAML handed to the training collaborator.
//!
//! ```yaml
//! path: data          # optional, relative to this file
//! train: images/train
//! val: images/val
//! names:
//!   0: robot
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ArenaLabelError;

#[derive(Clone, Debug, Deserialize)]
pub struct DatasetDescriptor {
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub train: PathBuf,
    pub val: PathBuf,
    names: ClassNames,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum ClassNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

impl DatasetDescriptor {
    pub fn load(path: &Path) -> Result<Self, ArenaLabelError> {
        let data = fs::read_to_string(path)?;
        Self::from_yaml_str(&data, path)
    }

    pub fn from_yaml_str(data: &str, path: &Path) -> Result<Self, ArenaLabelError> {
        serde_yaml::from_str(data).map_err(|source| ArenaLabelError::DescriptorParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Class names in id order. Gaps in a mapping are filled with
    /// `class_<id>`.
    pub fn class_names(&self) -> Vec<String> {
        match &self.names {
            ClassNames::Sequence(names) => names.clone(),
            ClassNames::Mapping(mapping) => {
                let Some(max_index) = mapping.keys().max() else {
                    return Vec::new();
                };
                (0..=*max_index)
                    .map(|id| {
                        mapping
                            .get(&id)
                            .filter(|name| !name.trim().is_empty())
                            .cloned()
                            .unwrap_or_else(|| format!("class_{id}"))
                    })
                    .collect()
            }
        }
    }

    /// The dataset root: `path` resolved against the descriptor's directory.
    pub fn root(&self, descriptor_path: &Path) -> PathBuf {
        let base = descriptor_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        match &self.path {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.join(root),
            None => base,
        }
    }

    pub fn train_dir(&self, descriptor_path: &Path) -> PathBuf {
        self.root(descriptor_path).join(&self.train)
    }

    pub fn val_dir(&self, descriptor_path: &Path) -> PathBuf {
        self.root(descriptor_path).join(&self.val)
    }

    /// Verifies the descriptor names at least one class and that both
    /// split directories exist.
    pub fn check(&self, descriptor_path: &Path) -> Result<(), ArenaLabelError> {
        let invalid = |message: String| ArenaLabelError::DescriptorInvalid {
            path: descriptor_path.to_path_buf(),
            message,
        };

        if self.class_names().is_empty() {
            return Err(invalid("names must list at least one class".to_string()));
        }
        for (split, dir) in [
            ("train", self.train_dir(descriptor_path)),
            ("val", self.val_dir(descriptor_path)),
        ] {
            if !dir.is_dir() {
                return Err(invalid(format!(
                    "{split} directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_names_fill_gaps() {
        let yaml = "train: images/train\nval: images/val\nnames:\n  0: robot\n  2: referee\n";
        let descriptor =
            DatasetDescriptor::from_yaml_str(yaml, Path::new("robos.yaml")).expect("parse");
        assert_eq!(
            descriptor.class_names(),
            vec!["robot", "class_1", "referee"]
        );
    }

    #[test]
    fn sequence_names_are_kept() {
        let yaml = "train: a\nval: b\nnames: [robot]\n";
        let descriptor =
            DatasetDescriptor::from_yaml_str(yaml, Path::new("robos.yaml")).expect("parse");
        assert_eq!(descriptor.class_names(), vec!["robot"]);
    }

    #[test]
    fn root_is_relative_to_the_descriptor() {
        let yaml = "path: data\ntrain: images/train\nval: images/val\nnames: [robot]\n";
        let descriptor =
            DatasetDescriptor::from_yaml_str(yaml, Path::new("project/robos.yaml")).expect("parse");
        assert_eq!(
            descriptor.train_dir(Path::new("project/robos.yaml")),
            Path::new("project/data/images/train")
        );
    }

    #[test]
    fn check_reports_missing_split_dirs() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let yaml_path = temp.path().join("robos.yaml");
        fs::write(
            &yaml_path,
            "train: images/train\nval: images/val\nnames: [robot]\n",
        )
        .expect("write yaml");
        fs::create_dir_all(temp.path().join("images/train")).expect("mkdir");

        let descriptor = DatasetDescriptor::load(&yaml_path).expect("load");
        let err = descriptor.check(&yaml_path).unwrap_err();
        assert!(err.to_string().contains("val directory"));

        fs::create_dir_all(temp.path().join("images/val")).expect("mkdir");
        descriptor.check(&yaml_path).expect("check passes");
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = DatasetDescriptor::from_yaml_str("train: [", Path::new("robos.yaml")).unwrap_err();
        assert!(matches!(err, ArenaLabelError::DescriptorParse { .. }));
    }
}
