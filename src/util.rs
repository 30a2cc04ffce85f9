use std::iter::repeat;
use std::path::{Path, PathBuf};

use crate::data::Id;

pub fn find_first_subpath<P: AsRef<Path>, F: Fn(&Path) -> bool>(
    root: impl AsRef<Path>,
    subpaths: &[P],
    search: F,
) -> Option<PathBuf> {
    subpaths
        .iter()
        .zip(repeat(root.as_ref()))
        .map(|(b, a)| a.join(b))
        .find(|it: &PathBuf| search(it))
}

/// Reorders `items` to follow `ids`, the way a populated reference list is
/// returned. Ids without a matching item are skipped.
pub fn order_by_ids<T>(ids: &[Id], mut items: Vec<T>, id_of: impl Fn(&T) -> Id) -> Vec<T> {
    let mut ordered = Vec::with_capacity(items.len());
    for id in ids {
        if let Some(pos) = items.iter().position(|it| id_of(it) == *id) {
            ordered.push(items.swap_remove(pos));
        }
    }
    ordered
}
