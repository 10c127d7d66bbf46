//! Wiki page name resolution
//!
//! Attachment references may carry a page part relative to the page that
//! embeds the thumbnail: `./` is the current page, `../` walks up one level
//! per segment, and a leading `/` is absolute.

/// Remove one pair of surrounding `[[ ]]` from a page reference
pub fn strip_bracket(name: &str) -> &str {
    name.strip_prefix("[[")
        .and_then(|inner| inner.strip_suffix("]]"))
        .unwrap_or(name)
}

/// Resolve `name` against the referring page
pub fn resolve_page_name(name: &str, refer: &str, default_page: &str) -> String {
    if name.is_empty() || name == "./" {
        return refer.to_string();
    }

    if let Some(absolute) = name.strip_prefix('/') {
        return if absolute.is_empty() {
            default_page.to_string()
        } else {
            absolute.to_string()
        };
    }

    if name.starts_with("./") {
        let mut parts: Vec<&str> = segments(name).collect();
        parts[0] = refer;
        return parts.join("/");
    }

    if name.starts_with("../") {
        let mut parts: Vec<&str> = segments(name).collect();
        let mut parents: Vec<&str> = segments(refer).collect();
        let ups = parts.iter().take_while(|s| **s == "..").count();
        parts.drain(..ups);
        for _ in 0..ups {
            parents.pop();
        }

        return match (parents.is_empty(), parts.is_empty()) {
            (false, _) => parents.into_iter().chain(parts).collect::<Vec<_>>().join("/"),
            (true, false) => format!("{}/{}", default_page, parts.join("/")),
            (true, true) => default_page.to_string(),
        };
    }

    name.to_string()
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
