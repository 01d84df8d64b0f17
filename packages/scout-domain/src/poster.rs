/// Resolves a stored poster reference into an absolute URL.
///
/// Absolute `http(s)` URLs pass through; catalog paths are joined onto `base_url`. Blank and
/// `nan` placeholders left over from CSV imports resolve to `None`.
pub fn poster_url(raw: Option<&str>, base_url: &str) -> Option<String> {
	let raw = raw?.trim();

	if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
		return None;
	}
	if raw.starts_with("http") {
		return Some(raw.to_string());
	}

	let base = base_url.trim_end_matches('/');

	if raw.starts_with('/') { Some(format!("{base}{raw}")) } else { Some(format!("{base}/{raw}")) }
}
