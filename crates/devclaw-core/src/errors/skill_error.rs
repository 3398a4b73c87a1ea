/// Skill package parsing and discovery errors.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("SKILL.md is missing its frontmatter block")]
    MissingFrontmatter,

    #[error("invalid frontmatter: {message}")]
    InvalidFrontmatter { message: String },

    #[error("frontmatter has no `name` field")]
    MissingName,

    #[error("failed to read skill file {path}: {message}")]
    Read { path: String, message: String },
}
