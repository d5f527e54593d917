use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Frontmatter fields of a SKILL.md.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Optional model override for this skill.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "allowed-tools")]
    pub allowed_tools: Option<String>,
}

/// Sibling resource directories of a skill.
#[derive(Debug, Clone, Default)]
pub struct SkillResources {
    pub scripts: Vec<PathBuf>,
    pub references: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
}

/// A loaded skill package.
#[derive(Debug, Clone)]
pub struct SkillPackage {
    pub meta: SkillMeta,
    /// Markdown body below the frontmatter; becomes the system prompt.
    pub body: String,
    /// Root directory of the package.
    pub path: PathBuf,
    pub resources: SkillResources,
}

impl SkillPackage {
    /// Load a package from a directory containing SKILL.md.
    pub fn load(dir: &Path) -> Result<Self, String> {
        let skill_md = dir.join("SKILL.md");
        let raw = fs::read_to_string(&skill_md)
            .map_err(|e| format!("Failed to read '{}': {}", skill_md.display(), e))?;

        let (frontmatter, body) = split_frontmatter(&raw)
            .ok_or_else(|| format!("'{}' has no YAML frontmatter", skill_md.display()))?;
        let meta: SkillMeta = serde_yaml::from_str(frontmatter)
            .map_err(|e| format!("Invalid frontmatter in '{}': {}", skill_md.display(), e))?;
        if meta.name.trim().is_empty() {
            return Err(format!("'{}' is missing a skill name", skill_md.display()));
        }

        Ok(Self {
            meta,
            body: body.trim().to_string(),
            path: dir.to_path_buf(),
            resources: SkillResources {
                scripts: list_files(&dir.join("scripts")),
                references: list_files(&dir.join("references")),
                assets: list_files(&dir.join("assets")),
            },
        })
    }
}

/// Split a `---` fenced YAML frontmatter block off a Markdown document.
fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---")?;
    let end = rest.find("\n---")?;
    let frontmatter = &rest[..end];
    let body = rest[end + 4..].trim_start_matches(['\r', '\n']);
    Some((frontmatter, body))
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Enumerate skill packages under a root directory, keyed by name.
/// Name collisions across packages fail discovery.
pub fn discover_skills(root: &Path) -> Result<HashMap<String, SkillPackage>, String> {
    if !root.is_dir() {
        return Err(format!("Skill directory '{}' does not exist", root.display()));
    }

    let mut skills = HashMap::new();

    // The root itself may be a single package.
    let mut candidates: Vec<PathBuf> = Vec::new();
    if root.join("SKILL.md").is_file() {
        candidates.push(root.to_path_buf());
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| format!("Failed to read '{}': {}", root.display(), e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && path.join("SKILL.md").is_file())
        .collect();
    entries.sort();
    candidates.extend(entries);

    for dir in candidates {
        let package = SkillPackage::load(&dir)?;
        let name = package.meta.name.clone();
        if skills.insert(name.clone(), package).is_some() {
            return Err(format!("Duplicate skill name '{}' under '{}'", name, root.display()));
        }
    }

    Ok(skills)
}


#[cfg(test)]
mod tests {
    use super::testing::write_skill;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_parses_frontmatter_and_body() {
        let dir = tempdir().unwrap();
        let skill_dir = dir.path().join("pdf");
        fs::create_dir_all(skill_dir.join("scripts")).unwrap();
        fs::write(skill_dir.join("scripts/convert.py"), "print('x')").unwrap();
        fs::write(
            skill_dir.join("SKILL.md"),
            "---\nname: pdf-tools\ndescription: Work with PDFs\nmodel: small-model\nallowed-tools: read_file, write_file\n---\n\n# PDF Tools\n\nBody text.\n",
        )
        .unwrap();

        let package = SkillPackage::load(&skill_dir).unwrap();
        assert_eq!(package.meta.name, "pdf-tools");
        assert_eq!(package.meta.description, "Work with PDFs");
        assert_eq!(package.meta.model.as_deref(), Some("small-model"));
        assert!(package.meta.allowed_tools.is_some());
        assert!(package.body.starts_with("# PDF Tools"));
        assert_eq!(package.resources.scripts.len(), 1);
        assert!(package.resources.references.is_empty());
    }

    #[test]
    fn test_missing_frontmatter_is_an_error() {
        let dir = tempdir().unwrap();
        let skill_dir = dir.path().join("bad");
        fs::create_dir_all(&skill_dir).unwrap();
        fs::write(skill_dir.join("SKILL.md"), "# No frontmatter\n").unwrap();
        assert!(SkillPackage::load(&skill_dir).is_err());
    }

    #[test]
    fn test_discover_finds_packages_by_name() {
        let dir = tempdir().unwrap();
        write_skill(dir.path(), "one", "alpha", "first skill");
        write_skill(dir.path(), "two", "beta", "second skill");
        fs::create_dir_all(dir.path().join("not-a-skill")).unwrap();

        let skills = discover_skills(dir.path()).unwrap();
        assert_eq!(skills.len(), 2);
        assert!(skills.contains_key("alpha"));
        assert!(skills.contains_key("beta"));
    }

    #[test]
    fn test_discover_rejects_duplicate_names() {
        let dir = tempdir().unwrap();
        write_skill(dir.path(), "one", "same", "first");
        write_skill(dir.path(), "two", "same", "second");
        let err = discover_skills(dir.path()).unwrap_err();
        assert!(err.contains("Duplicate skill name 'same'"));
    }

    #[test]
    fn test_discover_missing_root_is_an_error() {
        assert!(discover_skills(Path::new("/no/such/dir")).is_err());
    }
}
