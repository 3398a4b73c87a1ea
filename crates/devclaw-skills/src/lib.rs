//! # devclaw-skills
//!
//! Skill packages: a directory holding `SKILL.md` (YAML frontmatter +
//! prompt body), optional `scripts/`, and optional `src/` entry points.
//! This crate parses the package, discovers runnable scripts, and checks
//! host requirements (OS gate, binaries, env vars). Execution itself is
//! the sandbox's job.

mod discovery;
mod frontmatter;
mod requirements;

pub use discovery::SkillScript;
pub use frontmatter::{ConfigRequirement, SkillMetadata, SkillRequirements};
pub use requirements::RequirementReport;

use std::path::{Path, PathBuf};

use devclaw_core::errors::{DevclawResult, SkillError};

/// A parsed skill package.
#[derive(Debug, Clone)]
pub struct SkillDefinition {
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub metadata: SkillMetadata,
    /// Prompt body, as written (with `{baseDir}` placeholders).
    body: String,
    pub base_dir: PathBuf,
    pub scripts: Vec<SkillScript>,
}

impl SkillDefinition {
    /// Load and parse `SKILL.md` from a skill directory, discovering its
    /// scripts along the way.
    pub fn load(dir: &Path) -> DevclawResult<Self> {
        let skill_md = dir.join("SKILL.md");
        let content = std::fs::read_to_string(&skill_md).map_err(|e| SkillError::Read {
            path: skill_md.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content, dir)
    }

    /// Parse SKILL.md content against a base directory.
    pub fn parse(content: &str, dir: &Path) -> DevclawResult<Self> {
        let (front, body) = frontmatter::split(content)?;
        let parsed = frontmatter::parse(front)?;
        Ok(Self {
            name: parsed.name,
            description: parsed.description,
            homepage: parsed.homepage,
            metadata: parsed.metadata,
            body: body.to_string(),
            base_dir: dir.to_path_buf(),
            scripts: discovery::discover(dir),
        })
    }

    /// The prompt body with every `{baseDir}` resolved to the skill's
    /// absolute directory.
    pub fn render_body(&self) -> String {
        self.body
            .replace("{baseDir}", &self.base_dir.display().to_string())
    }

    /// Check OS gate, required binaries, and required env vars against
    /// the current host.
    pub fn check_requirements(&self) -> RequirementReport {
        requirements::check(&self.metadata)
    }
}
