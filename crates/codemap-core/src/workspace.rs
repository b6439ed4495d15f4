//! Workspace/monorepo detection and per-language source roots

use crate::model::Language;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceType {
    Cargo,
    Npm,
    GoModules,
    Maven,  // pom.xml
    Gradle, // build.gradle
    Python, // pyproject.toml / setup.py
}

/// Detect every build manifest present at the root (Cargo, npm, etc.)
pub fn detect_workspace(root: &Path) -> Vec<WorkspaceType> {
    let markers: [(&[&str], WorkspaceType); 6] = [
        (&["Cargo.toml"], WorkspaceType::Cargo),
        (&["package.json"], WorkspaceType::Npm),
        (&["go.mod"], WorkspaceType::GoModules),
        (&["pom.xml"], WorkspaceType::Maven),
        (&["build.gradle", "build.gradle.kts"], WorkspaceType::Gradle),
        (&["pyproject.toml", "setup.py", "setup.cfg"], WorkspaceType::Python),
    ];
    markers
        .iter()
        .filter(|(files, _)| files.iter().any(|f| root.join(f).is_file()))
        .map(|(_, kind)| *kind)
        .collect()
}

/// Project-level prefixes the import resolvers need, detected once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectLayout {
    pub workspaces: Vec<WorkspaceType>,
    /// `module` path declared in go.mod.
    pub go_module: Option<String>,
    /// Directory holding top-level Python packages when it is not the root (`src`).
    pub python_root: Option<String>,
    /// Directory holding the Java package tree (`src/main/java`, `src`).
    pub java_root: Option<String>,
}

impl ProjectLayout {
    pub fn detect(root: &Path) -> Self {
        ProjectLayout {
            workspaces: detect_workspace(root),
            go_module: read_go_module(root),
            python_root: detect_python_root(root),
            java_root: ["src/main/java", "src"]
                .iter()
                .find(|dir| root.join(dir).is_dir())
                .map(|dir| dir.to_string()),
        }
    }

    /// The prefix handed to the resolver of `language`.
    pub fn prefix_for(&self, language: Language) -> Option<&str> {
        match language {
            Language::Go => self.go_module.as_deref(),
            Language::Python => self.python_root.as_deref(),
            Language::Java => self.java_root.as_deref(),
            Language::Rust | Language::TypeScript | Language::JavaScript => None,
        }
    }
}

fn read_go_module(root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(root.join("go.mod")).ok()?;
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        let module = rest.trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    })
}

/// `src/` counts as the Python root when it holds a package but is not one itself.
fn detect_python_root(root: &Path) -> Option<String> {
    let src = root.join("src");
    if !src.is_dir() || src.join("__init__.py").exists() {
        return None;
    }
    let entries = std::fs::read_dir(&src).ok()?;
    let has_package = entries
        .flatten()
        .any(|e| e.path().join("__init__.py").is_file());
    has_package.then(|| "src".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detects_go_module_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("go.mod"),
            "module github.com/acme/widget\n\ngo 1.22\n",
        )
        .unwrap();

        let layout = ProjectLayout::detect(dir.path());
        assert_eq!(layout.workspaces, vec![WorkspaceType::GoModules]);
        assert_eq!(layout.prefix_for(Language::Go), Some("github.com/acme/widget"));
    }

    #[test]
    fn python_src_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/app")).unwrap();
        fs::write(dir.path().join("src/app/__init__.py"), "").unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]\nname = 'app'\n").unwrap();

        let layout = ProjectLayout::detect(dir.path());
        assert_eq!(layout.prefix_for(Language::Python), Some("src"));
        assert!(layout.workspaces.contains(&WorkspaceType::Python));
    }

    #[test]
    fn flat_python_layout_has_no_prefix() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();

        let layout = ProjectLayout::detect(dir.path());
        assert_eq!(layout.prefix_for(Language::Python), None);
        assert!(layout.workspaces.is_empty());
    }

    #[test]
    fn java_maven_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/main/java/com/acme")).unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();

        let layout = ProjectLayout::detect(dir.path());
        assert_eq!(layout.prefix_for(Language::Java), Some("src/main/java"));
        assert_eq!(layout.workspaces, vec![WorkspaceType::Maven]);
    }
}
