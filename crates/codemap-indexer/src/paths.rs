//! Path arithmetic on project-relative `/`-separated module paths

/// Directory part of a module path; "" for files at the root.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Ascend `levels` directories. Going above the root yields `None`.
pub fn ascend(dir: &str, levels: usize) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    if levels > parts.len() {
        return None;
    }
    parts.truncate(parts.len() - levels);
    Some(parts.join("/"))
}

pub fn join(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{rest}"),
    }
}

/// Fold `.` and `..` segments. Escaping the root yields `None`.
pub fn normalize(path: &str) -> Option<String> {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop()?;
            }
            other => out.push(other),
        }
    }
    Some(out.join("/"))
}

/// First known `.{ext}` file directly inside `dir`, skipping files for which
/// `skip` returns true. Known paths are sorted, so the choice is stable.
pub fn first_file_in<'a>(
    known: impl IntoIterator<Item = &'a String>,
    dir: &str,
    ext: &str,
    skip: impl Fn(&str) -> bool,
) -> Option<String> {
    known
        .into_iter()
        .find(|p| {
            parent_dir(p.as_str()) == dir
                && p.rsplit_once('.').is_some_and(|(_, e)| e == ext)
                && !skip(p.as_str())
        })
        .cloned()
}
