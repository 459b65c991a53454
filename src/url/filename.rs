/// Name used for resources whose path ends in `/`
pub const INDEX_FILENAME: &str = "index";

/// Derives the output file name for a URL path
///
/// The name is the last `/`-separated segment of the path. Paths ending in
/// `/`, and final segments that would address a directory (`.` and `..`),
/// map to [`INDEX_FILENAME`].
pub fn output_filename(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some("") | Some(".") | Some("..") | None => INDEX_FILENAME,
        Some(segment) => segment,
    }
}
