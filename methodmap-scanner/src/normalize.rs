use crate::error::{Result, ScanError};
use url::Url;

/// Resolve `raw` against `base`, drop the fragment and keep it only if the
/// result is an http(s) address. The returned string is the canonical form
/// used for deduplication.
pub fn normalize(raw: &str, base: &Url) -> Option<String> {
    let mut resolved = base.join(raw).ok()?;
    if !is_in_scope(&resolved) {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.into())
}

pub fn is_in_scope(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Validate and canonicalize a seed address. Unlike discovered links a bad
/// seed is a configuration error, not something to skip.
pub fn normalize_seed(seed: &str) -> Result<Url> {
    let mut url = Url::parse(seed.trim())
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed, e)))?;
    if !is_in_scope(&url) {
        return Err(ScanError::InvalidUrl(format!(
            "{}: scheme '{}' is not http or https",
            seed,
            url.scheme()
        )));
    }
    url.set_fragment(None);
    Ok(url)
}
