/// Length in bytes of an escaped slash starting at `i`: `\/` or a quoted
/// `'/'` / `"/"`.
pub(crate) fn literal_slash_at(bytes: &[u8], i: usize) -> Option<usize> {
    match *bytes.get(i)? {
        b'\\' if bytes.get(i + 1) == Some(&b'/') => Some(2),
        q @ (b'\'' | b'"') if bytes.get(i + 1) == Some(&b'/') && bytes.get(i + 2) == Some(&q) => {
            Some(3)
        }
        _ => None,
    }
}

/// Splits `path` on every unescaped `/`, resolving escaped slashes.
///
/// Empty pieces are kept, so `"/a//b"` yields `["", "a", "", "b"]`.
pub(crate) fn pieces(path: &str) -> Vec<String> {
    let bytes = path.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut current = String::new();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(len) = literal_slash_at(bytes, i) {
            current.push_str(&path[start..i]);
            current.push('/');
            i += len;
            start = i;
        } else if bytes[i] == b'/' {
            current.push_str(&path[start..i]);
            out.push(std::mem::take(&mut current));
            i += 1;
            start = i;
        } else {
            i += 1;
        }
    }
    current.push_str(&path[start..]);
    out.push(current);
    out
}

/// Escapes literal slashes of one segment as `\/`.
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') {
        return component.to_string();
    }
    component.replace('/', "\\/")
}

/// Resolves `\/`, `'/'` and `"/"` in one segment into literal slashes.
pub fn unescape_component(component: &str) -> String {
    if !component.contains('/') {
        return component.to_string();
    }
    pieces(component).join("/")
}

/// RFC 6901 escaping of one pointer token.
pub(crate) fn escape_pointer_token(token: &str) -> String {
    if !token.contains('/') && !token.contains('~') {
        return token.to_string();
    }
    token.replace('~', "~0").replace('/', "~1")
}
