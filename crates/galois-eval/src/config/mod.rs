use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use clap::ValueEnum;
use serde::Serialize;

use crate::error::EvalError;

pub const DEFAULT_JOBS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellMetric {
    /// Exact F1 over the sets of normalized cell values.
    #[default]
    Exact,
    /// F1 where a value counts when it is similar to any value on the other side.
    Similarity,
}

impl CellMetric {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Similarity => "similarity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleMetric {
    /// Normalized rows must appear with identical multiplicity.
    #[default]
    Constraint,
    /// Rows of equal length and multiplicity must be cell-wise similar.
    Similarity,
}

impl TupleMetric {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Constraint => "constraint",
            Self::Similarity => "similarity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricSelection {
    pub cell: CellMetric,
    pub tuple: TupleMetric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalPlan {
    pub metrics: MetricSelection,
    /// Worker count across datasets; `1` evaluates sequentially.
    pub jobs: usize,
    /// Worker count across queries inside one dataset.
    pub jobs_queries: usize,
    /// When set, only these dataset names are evaluated.
    pub datasets: Option<BTreeSet<String>>,
}

impl Default for EvalPlan {
    fn default() -> Self {
        Self {
            metrics: MetricSelection::default(),
            jobs: DEFAULT_JOBS,
            jobs_queries: DEFAULT_JOBS,
            datasets: None,
        }
    }
}

impl EvalPlan {
    #[must_use]
    pub fn allows(&self, dataset: &str) -> bool {
        self.datasets
            .as_ref()
            .is_none_or(|allowed| allowed.contains(dataset))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalPaths {
    pub ground_root: PathBuf,
    pub submissions_root: PathBuf,
}

/// Resolves both roots to absolute, lexically normalized paths. The ground
/// root must exist; the submissions root may be missing.
pub fn resolve_eval_paths(
    ground_root: &Path,
    submissions_root: &Path,
    home_dir: Option<&Path>,
    cwd: &Path,
) -> Result<EvalPaths> {
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    let cwd = normalize_lexical(cwd);
    let ground_root = resolve_user_path(ground_root, home_dir, &cwd)?;
    let submissions_root = resolve_user_path(submissions_root, home_dir, &cwd)?;

    if !ground_root.is_dir() {
        return Err(EvalError::FileNotFound { path: ground_root }.into());
    }

    Ok(EvalPaths {
        ground_root,
        submissions_root,
    })
}

fn resolve_user_path(path: &Path, home_dir: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path, home_dir)?;
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    Ok(normalize_lexical(&resolved))
}

fn expand_tilde(path: &Path, home_dir: Option<&Path>) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home_dir = home_dir
                .ok_or_else(|| anyhow!("HOME is not set; cannot expand {}", path.display()))?;
            let mut expanded = home_dir.to_path_buf();
            for component in components {
                expanded.push(component.as_os_str());
            }
            Ok(expanded)
        }
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
                path.display()
            )
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{EvalPlan, resolve_eval_paths};
    use crate::error::EvalError;

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("{prefix}-{nanos}"))
    }

    #[test]
    fn resolves_relative_roots_against_cwd() {
        let cwd = unique_temp_dir("galois-config-cwd");
        std::fs::create_dir_all(cwd.join("ground")).expect("ground dir should be creatable");

        let paths = resolve_eval_paths(
            Path::new("./ground"),
            Path::new("runs/../subs"),
            None,
            &cwd,
        )
        .expect("paths should resolve");

        assert_eq!(paths.ground_root, cwd.join("ground"));
        assert_eq!(paths.submissions_root, cwd.join("subs"));
    }

    #[test]
    fn expands_tilde_against_home_dir() {
        let home = unique_temp_dir("galois-config-home");
        std::fs::create_dir_all(home.join("gt")).expect("ground dir should be creatable");

        let paths = resolve_eval_paths(
            Path::new("~/gt"),
            Path::new("~/subs"),
            Some(&home),
            Path::new("/work"),
        )
        .expect("tilde paths should resolve");

        assert_eq!(paths.ground_root, home.join("gt"));
        assert_eq!(paths.submissions_root, home.join("subs"));
    }

    #[test]
    fn missing_ground_root_is_file_not_found() {
        let cwd = unique_temp_dir("galois-config-missing");
        let error = resolve_eval_paths(Path::new("nope"), Path::new("subs"), None, &cwd)
            .expect_err("missing ground root should fail");

        assert!(matches!(
            error.downcast_ref::<EvalError>(),
            Some(EvalError::FileNotFound { .. })
        ));
    }

    #[test]
    fn rejects_relative_cwd_and_user_tilde_forms() {
        let error = resolve_eval_paths(Path::new("g"), Path::new("s"), None, Path::new("rel"))
            .expect_err("relative cwd should fail");
        assert!(error.to_string().contains("cwd must be absolute"));

        let error = resolve_eval_paths(
            Path::new("~other/g"),
            Path::new("s"),
            Some(Path::new("/home/tester")),
            Path::new("/work"),
        )
        .expect_err("~user syntax should fail");
        assert!(error.to_string().contains("unsupported home expansion syntax"));
    }

    #[test]
    fn dataset_allow_list_filters_names() {
        let plan = EvalPlan::default();
        assert!(plan.allows("MOVIES"));

        let plan = EvalPlan {
            datasets: Some(BTreeSet::from(["MOVIES".to_string()])),
            ..EvalPlan::default()
        };
        assert!(plan.allows("MOVIES"));
        assert!(!plan.allows("WORLD"));
    }
}
