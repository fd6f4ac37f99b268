//! Image selection: deduplicate, filter, rank and cap the harvested list.
//!
//! The steps always run in this order:
//! 1. count every occurrence in the raw list
//! 2. dedupe, keeping first-seen order
//! 3. drop images matching an ignore prefix
//! 4. stable sort by descending count
//! 5. truncate to the limit

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::image::ImageReference;

/// Filtering and capping applied to the deduplicated list.
#[derive(Debug, Clone, Default)]
pub struct SelectionPolicy {
    /// Images starting with any of these (already trimmed) prefixes are skipped.
    pub ignore_prefixes: Vec<String>,

    /// Pull at most this many images.
    pub limit: Option<usize>,
}

/// Occurrence count per image, taken from the raw list.
#[derive(Debug, Default)]
pub struct ImageCounts(HashMap<ImageReference, usize>);

impl ImageCounts {
    pub fn from_raw(raw: &[ImageReference]) -> Self {
        let mut counts = HashMap::with_capacity(raw.len());
        for image in raw {
            *counts.entry(image.clone()).or_insert(0) += 1;
        }
        Self(counts)
    }

    /// Occurrences of `image`, zero if never seen.
    pub fn get(&self, image: &ImageReference) -> usize {
        self.0.get(image).copied().unwrap_or(0)
    }
}

/// The ranked, unique images to pull. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalPullList(Vec<ImageReference>);

impl FinalPullList {
    pub fn iter(&self) -> std::slice::Iter<'_, ImageReference> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ImageReference] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a FinalPullList {
    type Item = &'a ImageReference;
    type IntoIter = std::slice::Iter<'a, ImageReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Keep the first occurrence of every image, preserving order.
pub fn dedupe(raw: &[ImageReference]) -> Vec<ImageReference> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.iter()
        .filter(|image| seen.insert(*image))
        .cloned()
        .collect()
}

/// Drop images that start with any of `prefixes`. Order is preserved.
pub fn filter_ignored(images: Vec<ImageReference>, prefixes: &[String]) -> Vec<ImageReference> {
    if prefixes.is_empty() {
        return images;
    }
    images
        .into_iter()
        .filter(|image| !prefixes.iter().any(|prefix| image.has_prefix(prefix)))
        .collect()
}

/// Sort by descending count. Ties keep their current relative order.
pub fn rank_by_count(mut images: Vec<ImageReference>, counts: &ImageCounts) -> Vec<ImageReference> {
    // sort_by_key is stable
    images.sort_by_key(|image| std::cmp::Reverse(counts.get(image)));
    images
}

/// Keep at most `limit` images.
pub fn cap(mut images: Vec<ImageReference>, limit: Option<usize>) -> Vec<ImageReference> {
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images
}

/// Turn the raw harvested list into the final pull list.
pub fn select_images(raw: &[ImageReference], policy: &SelectionPolicy) -> FinalPullList {
    let counts = ImageCounts::from_raw(raw);
    let unique = dedupe(raw);

    if !policy.ignore_prefixes.is_empty() {
        info!(
            prefixes = ?policy.ignore_prefixes,
            "IGNORE is set, skipping images with these prefixes"
        );
    }
    let kept = filter_ignored(unique, &policy.ignore_prefixes);
    let ranked = rank_by_count(kept, &counts);

    if let Some(limit) = policy.limit {
        if limit < ranked.len() {
            info!(limit, "LIMIT is set, only pulling the top images");
        }
    }
    let selected = cap(ranked, policy.limit);

    info!(
        harvested = raw.len(),
        selected = selected.len(),
        "Image selection complete"
    );

    FinalPullList(selected)
}
