//! SKILL.md frontmatter: YAML between `---` delimiters, with optional
//! inline-JSON metadata under `metadata.openclaw` / `metadata.clawdbot`.

use std::collections::HashMap;

use serde::Deserialize;

use devclaw_core::errors::{DevclawResult, SkillError};

/// Parsed frontmatter, metadata already merged.
#[derive(Debug, Clone)]
pub(crate) struct Frontmatter {
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub metadata: SkillMetadata,
}

/// Skill metadata carried under the `openclaw`/`clawdbot` keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkillMetadata {
    pub emoji: Option<String>,
    /// Always offer this skill, regardless of context matching.
    pub always: bool,
    /// OS gate: empty means any.
    pub os: Vec<String>,
    pub requires: SkillRequirements,
    pub config: Vec<ConfigRequirement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkillRequirements {
    /// All of these binaries must be on PATH.
    pub bins: Vec<String>,
    /// At least one of these binaries must be on PATH.
    pub any_bins: Vec<String>,
    /// All of these env vars must be set.
    pub env: Vec<String>,
}

/// A config key the skill needs the host to provide.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequirement {
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFrontmatter {
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    metadata: Option<HashMap<String, serde_yaml::Value>>,
}

/// Split SKILL.md into the frontmatter document and the body.
pub(crate) fn split(content: &str) -> Result<(&str, &str), SkillError> {
    let rest = content
        .strip_prefix("---")
        .ok_or(SkillError::MissingFrontmatter)?;
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let end = rest
        .find("\n---")
        .ok_or(SkillError::MissingFrontmatter)?;
    let front = &rest[..end];
    let body = rest[end + 4..].strip_prefix('\n').unwrap_or(&rest[end + 4..]);
    Ok((front, body))
}

/// Parse the frontmatter document, resolving inline-JSON metadata.
pub(crate) fn parse(front: &str) -> DevclawResult<Frontmatter> {
    let raw: RawFrontmatter =
        serde_yaml::from_str(front).map_err(|e| SkillError::InvalidFrontmatter {
            message: e.to_string(),
        })?;
    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or(SkillError::MissingName)?;

    let mut metadata = SkillMetadata::default();
    if let Some(map) = raw.metadata {
        for key in ["openclaw", "clawdbot"] {
            if let Some(value) = map.get(key) {
                metadata = parse_metadata_value(value)?;
                break;
            }
        }
    }

    Ok(Frontmatter {
        name,
        description: raw.description,
        homepage: raw.homepage,
        metadata,
    })
}

/// Metadata may be a YAML mapping or a string holding inline JSON.
fn parse_metadata_value(value: &serde_yaml::Value) -> DevclawResult<SkillMetadata> {
    let metadata = match value {
        serde_yaml::Value::String(inline) => {
            serde_json::from_str(inline).map_err(|e| SkillError::InvalidFrontmatter {
                message: format!("inline metadata JSON: {e}"),
            })?
        }
        other => serde_yaml::from_value(other.clone()).map_err(|e| {
            SkillError::InvalidFrontmatter {
                message: format!("metadata mapping: {e}"),
            }
        })?,
    };
    Ok(metadata)
}
