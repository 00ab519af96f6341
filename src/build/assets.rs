//! Asset copy.
//!
//! | Source                    | Output                              |
//! |---------------------------|-------------------------------------|
//! | `<theme>/static/**`       | `<output>/**`                       |
//! | `static/**`               | `<output>/**`, shadows the theme    |
//! | `styles/**`               | `<output>/styles/**`                |
//! | non-markdown `content/**` | `<output>/**`, locale rule applied  |
//!
//! Copies run on rayon inside `spawn_blocking`. A failed copy is recorded
//! for that file and never stops the others.

use super::error::{FailureKind, UnitFailure};
use crate::config::SiteConfig;
use crate::content::{ContentRegistry, LocaleSettings};
use crate::freshness::copy_if_changed;
use crate::logger::ProgressLine;
use crate::{debug, log};
use jwalk::WalkDir;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// One file to mirror into the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetJob {
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// Outcome of a copy batch.
#[derive(Debug, Default)]
pub struct AssetOutcome {
    /// Files that are up to date in the output after the batch.
    pub processed: usize,
    /// Files whose output content changed.
    pub copied: usize,
    pub removed: usize,
    pub failures: Vec<UnitFailure>,
}

/// Every asset of the site, for a full build.
pub fn collect_all(config: &SiteConfig, registry: &ContentRegistry) -> Vec<AssetJob> {
    let output = &config.build.output;
    // later roots overwrite earlier ones, so the site's static dir wins
    let mut jobs: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for dir in config.build.static_dirs() {
        for file in collect_files(&dir) {
            if let Ok(rel) = file.strip_prefix(&dir) {
                jobs.insert(output.join(rel), file.clone());
            }
        }
    }

    let styles = &config.build.styles;
    for file in collect_files(styles) {
        if let Ok(rel) = file.strip_prefix(styles) {
            jobs.insert(output.join("styles").join(rel), file.clone());
        }
    }

    let settings = config.i18n.settings();
    for file in registry.assets() {
        if let Some(dest) = content_output(config, &settings, file) {
            jobs.insert(dest, file.clone());
        }
    }

    jobs.into_iter()
        .map(|(dest, source)| AssetJob { source, dest })
        .collect()
}

/// Where a changed asset path lands in the output.
///
/// `None` for paths outside every asset root and for theme files shadowed
/// by a site file of the same name.
pub fn output_for(config: &SiteConfig, path: &Path) -> Option<PathBuf> {
    let build = &config.build;

    if path.starts_with(&build.content) {
        return content_output(config, &config.i18n.settings(), path);
    }
    if let Ok(rel) = path.strip_prefix(&build.styles) {
        return Some(build.output.join("styles").join(rel));
    }
    if let Ok(rel) = path.strip_prefix(&build.static_dir) {
        return Some(build.output.join(rel));
    }
    let theme_static = build.theme.as_ref()?.join("static");
    let rel = path.strip_prefix(&theme_static).ok()?;
    if build.static_dir.join(rel).is_file() {
        debug!("asset"; "{} is shadowed by the site", path.display());
        return None;
    }
    Some(build.output.join(rel))
}

fn content_output(config: &SiteConfig, settings: &LocaleSettings, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(&config.build.content).ok()?;
    Some(config.build.output.join(settings.asset_output(rel)))
}

/// Files under `dir`, hidden entries skipped. Empty when `dir` is missing.
fn collect_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .skip_hidden(true)
        .follow_links(false)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect()
}

/// Copy `jobs` in parallel.
pub fn copy_all(jobs: &[AssetJob], progress: Option<&ProgressLine>) -> AssetOutcome {
    let results: Vec<Result<bool, UnitFailure>> = jobs
        .par_iter()
        .map(|job| {
            let result = copy_if_changed(&job.source, &job.dest).map_err(|err| {
                log!("error"; "{}: {}", job.source.display(), err);
                UnitFailure::new(FailureKind::Asset, job.source.clone(), err.to_string())
            });
            if let Some(progress) = progress {
                progress.inc("assets");
            }
            result
        })
        .collect();

    let mut outcome = AssetOutcome::default();
    for result in results {
        match result {
            Ok(copied) => {
                outcome.processed += 1;
                outcome.copied += usize::from(copied);
            }
            Err(failure) => outcome.failures.push(failure),
        }
    }
    outcome
}

/// Mirror a batch of changed asset paths.
///
/// A path whose source is gone has its output copy removed.
pub fn sync_changed<'a>(
    config: &SiteConfig,
    paths: impl IntoIterator<Item = &'a PathBuf>,
) -> (Vec<AssetJob>, AssetOutcome) {
    let mut jobs = Vec::new();
    let mut outcome = AssetOutcome::default();

    for path in paths {
        let Some(dest) = output_for(config, path) else {
            continue;
        };
        if path.is_file() {
            jobs.push(AssetJob {
                source: path.clone(),
                dest,
            });
            continue;
        }
        match std::fs::remove_file(&dest) {
            Ok(()) => {
                debug!("asset"; "removed {}", dest.display());
                outcome.removed += 1;
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                log!("error"; "{}: {}", dest.display(), err);
                outcome.failures.push(UnitFailure::new(
                    FailureKind::Asset,
                    path.clone(),
                    format!("failed to remove output copy: {err}"),
                ));
            }
        }
    }
    (jobs, outcome)
}

/// Run [`copy_all`] on the blocking pool.
pub fn spawn_copy(
    jobs: Vec<AssetJob>,
    progress: Option<Arc<ProgressLine>>,
) -> JoinHandle<AssetOutcome> {
    tokio::task::spawn_blocking(move || copy_all(&jobs, progress.as_deref()))
}

/// Wait for a [`spawn_copy`] batch of `count` files.
pub async fn join_copy(handle: JoinHandle<AssetOutcome>, count: usize) -> AssetOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(err) => {
            log!("error"; "asset copy aborted: {}", err);
            AssetOutcome {
                failures: vec![UnitFailure::new(
                    FailureKind::Asset,
                    PathBuf::new(),
                    format!("copy of {count} assets aborted: {err}"),
                )],
                ..AssetOutcome::default()
            }
        }
    }
}

impl AssetOutcome {
    pub fn merge(&mut self, other: AssetOutcome) {
        self.processed += other.processed;
        self.copied += other.copied;
        self.removed += other.removed;
        self.failures.extend(other.failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::tests::Site;
    use std::fs;

    fn registry(config: &SiteConfig) -> ContentRegistry {
        ContentRegistry::scan(
            &config.build.content,
            &config.build.output,
            &config.i18n.settings(),
            config.build.max_depth,
        )
        .unwrap()
    }

    #[test]
    fn full_collection_maps_every_root() {
        let site = Site::bilingual();
        let config = site.config();
        let jobs = collect_all(&config, &registry(&config));
        let dests: Vec<_> = jobs
            .iter()
            .map(|j| j.dest.strip_prefix(site.output()).unwrap().to_path_buf())
            .collect();

        assert!(dests.contains(&PathBuf::from("logo.svg")));
        assert!(dests.contains(&PathBuf::from("styles/site.css")));
        // content/en/diagram.png belongs to the unprefixed default locale
        assert!(dests.contains(&PathBuf::from("diagram.png")));
    }

    #[test]
    fn site_static_shadows_theme() {
        let site = Site::bilingual();
        site.write("theme/static/logo.svg", "<svg>theme</svg>");
        site.write("theme/static/theme.js", "//");
        site.append_config("[build]\ntheme = \"theme\"\n");
        let config = site.config();

        let jobs = collect_all(&config, &registry(&config));
        let logo = jobs
            .iter()
            .find(|j| j.dest == site.output().join("logo.svg"))
            .unwrap();
        assert!(logo.source.starts_with(&config.build.static_dir));
        assert!(jobs.iter().any(|j| j.dest == site.output().join("theme.js")));

        let theme_logo = config.build.theme.clone().unwrap().join("static/logo.svg");
        assert_eq!(output_for(&config, &theme_logo), None);
    }

    #[test]
    fn copy_all_skips_unchanged_files() {
        let site = Site::bilingual();
        let config = site.config();
        let jobs = collect_all(&config, &registry(&config));

        let first = copy_all(&jobs, None);
        assert_eq!(first.processed, jobs.len());
        assert_eq!(first.copied, jobs.len());
        assert!(first.failures.is_empty());

        let second = copy_all(&jobs, None);
        assert_eq!(second.processed, jobs.len());
        assert_eq!(second.copied, 0);
    }

    #[test]
    fn missing_source_is_a_per_file_failure() {
        let site = Site::bilingual();
        let jobs = vec![
            AssetJob {
                source: site.root().join("static/nope.svg"),
                dest: site.output().join("nope.svg"),
            },
            AssetJob {
                source: site.root().join("static/logo.svg"),
                dest: site.output().join("logo.svg"),
            },
        ];
        let outcome = copy_all(&jobs, None);
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, FailureKind::Asset);
    }

    #[test]
    fn deleted_asset_removes_output() {
        let site = Site::bilingual();
        let config = site.config();
        let logo = config.build.static_dir.join("logo.svg");
        copy_all(&collect_all(&config, &registry(&config)), None);
        assert!(site.output().join("logo.svg").exists());

        fs::remove_file(&logo).unwrap();
        let (jobs, outcome) = sync_changed(&config, [&logo]);
        assert!(jobs.is_empty());
        assert_eq!(outcome.removed, 1);
        assert!(!site.output().join("logo.svg").exists());
    }
}
