//! Matching local file names to remote assets.

use crate::github::Asset;

/// Remote assets whose name equals one of `local_names`
///
/// Names are compared byte for byte (no normalization, no case folding).
/// Results follow the order of `local_names`; a name matching nothing
/// contributes nothing.
pub fn match_assets<S: AsRef<str>>(remote: &[Asset], local_names: &[S]) -> Vec<Asset> {
    local_names
        .iter()
        .flat_map(|local| {
            remote
                .iter()
                .filter(move |asset| asset.name == local.as_ref())
        })
        .cloned()
        .collect()
}
