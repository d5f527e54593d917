//! Skill packages.
//!
//! A skill package is a directory holding a `SKILL.md` (YAML frontmatter
//! plus a Markdown body) and optional `scripts/`, `references/` and
//! `assets/` directories. The runner discovers packages, lets the LLM pick
//! one by name, and executes its body with the tool-call loop.

pub mod package;
pub mod runner;

pub use package::{discover_skills, SkillMeta, SkillPackage, SkillResources};
pub use runner::SkillRunner;
