//! Multilingual content registry.
//!
//! Maps every logical page to one variant per available locale. Missing
//! translations are filled with fallback variants that render another
//! locale's file into the missing locale's namespace.

use super::locale::{LocaleSettings, depth_of, url_for};
use super::scan::{Scan, ScanError, scan};
use crate::debug;
use crate::page::PageSource;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One locale's entry for a logical page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleVariant {
    /// File that is read to render this variant.
    pub input: PathBuf,
    /// Absolute output file.
    pub output: PathBuf,
    pub url: String,
    /// Directory levels of the output below the output root.
    pub depth: usize,
    /// A file exists for this locale.
    pub exists: bool,
    pub is_fallback: bool,
    /// Locale the input belongs to, set on fallbacks.
    pub fallback_locale: Option<String>,
}

/// logical path → locale → variant
pub type LocaleMap = BTreeMap<PathBuf, BTreeMap<String, LocaleVariant>>;

/// Link to the same logical page in another locale.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Translation {
    pub locale: String,
    pub url: String,
    pub is_fallback: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    variants: LocaleMap,
    assets: Vec<PathBuf>,
}

impl ContentRegistry {
    /// Scan the content tree and synthesize fallbacks.
    pub fn scan(
        content_root: &Path,
        output_root: &Path,
        settings: &LocaleSettings,
        max_depth: usize,
    ) -> Result<Self, ScanError> {
        let scanned = scan(content_root, output_root, settings, max_depth)?;
        Ok(Self::from_scan(scanned, output_root, settings))
    }

    pub fn from_scan(scanned: Scan, output_root: &Path, settings: &LocaleSettings) -> Self {
        let mut variants = LocaleMap::new();
        for page in scanned.pages {
            variants.entry(page.logical).or_default().insert(
                page.locale,
                LocaleVariant {
                    input: page.source,
                    output: page.output,
                    url: page.url,
                    depth: page.depth,
                    exists: true,
                    is_fallback: false,
                    fallback_locale: None,
                },
            );
        }
        build_fallbacks(&mut variants, settings, output_root);

        Self {
            variants,
            assets: scanned.assets,
        }
    }

    #[cfg(test)]
    pub fn variants(&self) -> &LocaleMap {
        &self.variants
    }

    /// Non-markdown files under the content root.
    #[inline]
    pub fn assets(&self) -> &[PathBuf] {
        &self.assets
    }

    #[inline]
    pub fn logical_count(&self) -> usize {
        self.variants.len()
    }

    /// Every render target, fallbacks included.
    pub fn pages(&self) -> Vec<PageSource> {
        self.variants
            .iter()
            .flat_map(|(logical, locales)| {
                locales
                    .iter()
                    .map(move |(locale, variant)| to_page(logical, locale, variant))
            })
            .collect()
    }

    /// Render targets grouped by the file they read.
    ///
    /// A unit is one input file and every variant rendered from it.
    pub fn units(&self) -> BTreeMap<PathBuf, Vec<PageSource>> {
        let mut units: BTreeMap<PathBuf, Vec<PageSource>> = BTreeMap::new();
        for page in self.pages() {
            units.entry(page.source.clone()).or_default().push(page);
        }
        units
    }

    /// Targets whose input is `source`: its own variant and any fallbacks.
    pub fn pages_for_source(&self, source: &Path) -> Vec<PageSource> {
        self.pages()
            .into_iter()
            .filter(|page| page.is_source(source))
            .collect()
    }

    /// All locale variants of a logical page, in locale order.
    pub fn translations(&self, logical: &Path) -> Vec<Translation> {
        self.variants
            .get(logical)
            .map(|locales| {
                locales
                    .iter()
                    .map(|(locale, variant)| Translation {
                        locale: locale.clone(),
                        url: variant.url.clone(),
                        is_fallback: variant.is_fallback,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fingerprint of the real page set. Changes when a page is added,
    /// removed or moved between locales.
    pub fn signature(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for (logical, locales) in &self.variants {
            for (locale, variant) in locales.iter().filter(|(_, v)| v.exists) {
                hasher.update(locale.as_bytes());
                hasher.update(logical.as_os_str().as_encoded_bytes());
                hasher.update(variant.input.as_os_str().as_encoded_bytes());
                hasher.update(&[0]);
            }
        }
        hasher.finalize()
    }
}

fn to_page(logical: &Path, locale: &str, variant: &LocaleVariant) -> PageSource {
    PageSource {
        source: variant.input.clone(),
        locale: locale.to_string(),
        logical: logical.to_path_buf(),
        output: variant.output.clone(),
        url: variant.url.clone(),
        depth: variant.depth,
        fallback_from: variant.fallback_locale.clone(),
    }
}

/// Fill every missing `(logical, locale)` slot with a fallback variant.
///
/// The source is the default locale's file, or the first locale in
/// configured order that has the page.
pub fn build_fallbacks(map: &mut LocaleMap, settings: &LocaleSettings, output_root: &Path) {
    for (logical, locales) in map.iter_mut() {
        let source_locale = if locales.contains_key(settings.default_locale()) {
            Some(settings.default_locale().to_string())
        } else {
            settings
                .available()
                .iter()
                .find(|l| locales.contains_key(l.as_str()))
                .cloned()
        };
        let Some(source_locale) = source_locale else {
            continue;
        };
        let Some(input) = locales.get(&source_locale).map(|v| v.input.clone()) else {
            continue;
        };

        for locale in settings.available() {
            if locales.contains_key(locale) {
                continue;
            }
            let output_relative = settings.page_output(locale, logical);
            debug!("i18n"; "{}:{} falls back to {}", locale, logical.display(), source_locale);
            locales.insert(
                locale.clone(),
                LocaleVariant {
                    input: input.clone(),
                    output: output_root.join(&output_relative),
                    url: url_for(&output_relative),
                    depth: depth_of(&output_relative),
                    exists: false,
                    is_fallback: true,
                    fallback_locale: Some(source_locale.clone()),
                },
            );
        }
    }
}
