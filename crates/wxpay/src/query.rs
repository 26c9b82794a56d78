//! Typed query-string encoding for optional request parameters.
//!
//! Callers decide whether options are present (`Option<&O>`) before encoding;
//! there is no runtime inspection of the options value.

/// Options that encode into query parameters.
pub trait QueryOptions {
    /// Parameter name/value pairs in output order. Empty values are skipped.
    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

/// Append `options` to `path` as a url-encoded query string, replacing any
/// query already present. A path with no non-empty pairs comes back bare.
pub fn with_query<O: QueryOptions + ?Sized>(path: &str, options: &O) -> String {
    let base = path.split_once('?').map_or(path, |(p, _)| p);

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in options.query_pairs() {
        if value.is_empty() {
            continue;
        }
        serializer.append_pair(key, &value);
        any = true;
    }

    if any {
        format!("{base}?{}", serializer.finish())
    } else {
        base.to_string()
    }
}

/// [`with_query`] when options were supplied, otherwise `path` unchanged.
pub fn with_optional_query<O: QueryOptions + ?Sized>(path: &str, options: Option<&O>) -> String {
    match options {
        Some(options) => with_query(path, options),
        None => path.to_string(),
    }
}
