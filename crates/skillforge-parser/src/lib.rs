//! Transforms a skill file into a validated [`skillforge_core::Skill`] or a
//! typed [`ParseError`].
//!
//! The parser is a pure function with respect to everything except the
//! file's modification time, which is captured once. [`parse_content`] is
//! the zero-I/O core: it is synchronous and callable from unit tests
//! without a runtime. [`SkillParser::parse_file`] is the thin I/O wrapper
//! used by the discovery path.

mod error;
mod frontmatter;
mod security;
mod validation;

pub use error::{ParseError, ParseWarning};

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use skillforge_core::{Category, RepoId, Skill, SkillId};

use frontmatter::RawFrontMatter;

/// Maximum accepted `name` length (spec §4.1).
pub const MAX_NAME_LEN: usize = 64;
/// Frontmatter byte budget before a progressive-disclosure warning fires.
pub const MAX_FRONTMATTER_LEN: usize = 400;
/// Body byte budget before a progressive-disclosure warning fires.
pub const MAX_BODY_LEN: usize = 20_000;
const MIN_DESCRIPTION_LEN: usize = 10;
const MIN_INSTRUCTIONS_LEN: usize = 50;

/// The successful result of a parse: the validated skill plus any
/// non-fatal warnings accumulated along the way.
#[derive(Debug, Clone)]
pub struct ParsedSkill {
    pub skill: Skill,
    pub warnings: Vec<ParseWarning>,
}

/// Stateless parser. Holds no configuration today but is a type (rather
/// than a bare function) so call sites read the same way across sync and
/// async contexts, and so future configuration (custom filename patterns,
/// stricter compatibility enforcement) has somewhere to live.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkillParser;

impl SkillParser {
    pub fn new() -> Self {
        Self
    }

    /// Read `path` from disk and parse it. `repo_id` identifies the
    /// repository the file belongs to; `repo_root` is used to compute the
    /// relative path that forms the back half of the skill's identifier.
    pub fn parse_file(
        &self,
        path: &Path,
        repo_root: &Path,
        repo_id: &RepoId,
    ) -> Result<ParsedSkill, ParseError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ParseError::MalformedFile(format!("{}: {e}", path.display())))?;
        let mtime = std::fs::metadata(path).ok().and_then(|m| m.modified().ok());
        let relative_dir = relative_skill_dir(path, repo_root);
        parse_content(&content, &relative_dir, repo_id, path, mtime)
    }
}

fn relative_skill_dir(path: &Path, repo_root: &Path) -> String {
    let relative = path.strip_prefix(repo_root).unwrap_or(path);
    let dir = relative.parent().unwrap_or_else(|| Path::new(""));
    dir.to_string_lossy().replace('\\', "/")
}

/// The zero-I/O parse core. See module docs.
pub fn parse_content(
    content: &str,
    relative_dir: &str,
    repo_id: &RepoId,
    file_path: &Path,
    mtime: Option<SystemTime>,
) -> Result<ParsedSkill, ParseError> {
    let mut warnings = Vec::new();

    let (frontmatter_raw, body) = split_frontmatter(content)?;
    if frontmatter_raw.len() > MAX_FRONTMATTER_LEN {
        warnings.push(ParseWarning::ProgressiveDisclosure(format!(
            "frontmatter is {} chars, exceeds the {} char budget",
            frontmatter_raw.len(),
            MAX_FRONTMATTER_LEN
        )));
    }
    if body.len() > MAX_BODY_LEN {
        warnings.push(ParseWarning::ProgressiveDisclosure(format!(
            "body is {} chars, exceeds the {} char budget",
            body.len(),
            MAX_BODY_LEN
        )));
    }

    let raw: RawFrontMatter = serde_yaml::from_str(frontmatter_raw)
        .map_err(|e| ParseError::MalformedFile(format!("invalid frontmatter yaml: {e}")))?;
    let (resolved, compat_warning) = raw.resolve();
    if let Some(w) = compat_warning {
        warnings.push(w);
    }

    let name = resolved
        .name
        .ok_or_else(|| ParseError::SchemaViolation("missing required field `name`".into()))?;
    let description = resolved.description.ok_or_else(|| {
        ParseError::SchemaViolation("missing required field `description`".into())
    })?;

    if description.len() < MIN_DESCRIPTION_LEN {
        return Err(ParseError::SchemaViolation(format!(
            "description is {} chars, must be at least {MIN_DESCRIPTION_LEN}",
            description.len()
        )));
    }
    if body.trim().len() < MIN_INSTRUCTIONS_LEN {
        return Err(ParseError::SchemaViolation(format!(
            "instructions body is {} chars, must be at least {MIN_INSTRUCTIONS_LEN}",
            body.trim().len()
        )));
    }
    if name.is_empty() {
        return Err(ParseError::SchemaViolation("name must not be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ParseError::SchemaViolation(format!(
            "name is {} chars, exceeds the {MAX_NAME_LEN} char limit",
            name.len()
        )));
    }

    let normalized_name = validation::normalize_identifier(&name);
    if !validation::is_valid_identifier(&normalized_name) {
        let message = format!(
            "name `{name}` normalizes to `{normalized_name}`, which contains characters outside [a-z0-9-]"
        );
        if resolved.compatibility_mode {
            warnings.push(ParseWarning::CompatibilityShape(message));
        } else {
            return Err(ParseError::SchemaViolation(message));
        }
    }

    let examples = extract_examples(body);
    warnings.extend(security::scan(body, &examples));

    let category = resolved
        .category
        .as_deref()
        .map(|s| s.parse().unwrap_or(Category::Other))
        .unwrap_or_default();

    let dependencies = resolved
        .dependencies
        .into_iter()
        .map(|dep| resolve_dependency_id(&dep, repo_id))
        .collect();

    let skill = Skill {
        id: SkillId::new(repo_id, relative_dir),
        name,
        description,
        instructions: body.to_string(),
        category,
        tags: resolved.tags,
        dependencies,
        examples,
        file_path: file_path.to_path_buf(),
        repo_id: repo_id.clone(),
        version: resolved.version,
        author: resolved.author,
        updated_at: mtime.map(DateTime::<Utc>::from),
    };

    Ok(ParsedSkill { skill, warnings })
}

/// A dependency may be declared as a bare relative path (resolved against
/// the same repository) or an already-qualified `repo_id/path` string.
fn resolve_dependency_id(raw: &str, default_repo: &RepoId) -> SkillId {
    if raw.contains('/') && raw.splitn(2, '/').next().map(|p| !p.is_empty()).unwrap_or(false) {
        // Heuristic: if the first segment looks like a repo id already
        // known to this skill (i.e. matches default_repo), treat the rest
        // as relative; otherwise the whole string is already qualified.
        if let Some(rest) = raw.strip_prefix(&format!("{}/", default_repo.as_str())) {
            return SkillId::new(default_repo, rest);
        }
        return SkillId::from_raw(raw.to_string());
    }
    SkillId::new(default_repo, raw)
}

/// Split on the first two `---` fence lines (regex-equivalent, DOTALL).
fn split_frontmatter(content: &str) -> Result<(&str, &str), ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
        .ok_or_else(|| ParseError::MalformedFile("missing opening --- fence".into()))?;

    let end = rest
        .find("\n---")
        .ok_or_else(|| ParseError::MalformedFile("missing closing --- fence".into()))?;

    let frontmatter = &rest[..end];
    let after_fence = &rest[end + 4..];
    let body = after_fence
        .strip_prefix("\r\n")
        .or_else(|| after_fence.strip_prefix('\n'))
        .unwrap_or(after_fence);

    Ok((frontmatter, body))
}

/// Locate an `## Examples` heading and collect subsequent bullet lines
/// until the next heading.
fn extract_examples(body: &str) -> Vec<String> {
    let mut examples = Vec::new();
    let mut in_examples = false;
    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            if in_examples {
                break;
            }
            in_examples = trimmed.trim_start_matches('#').trim().eq_ignore_ascii_case("examples");
            continue;
        }
        if in_examples {
            if let Some(bullet) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
                examples.push(bullet.trim().to_string());
            } else if trimmed.is_empty() {
                continue;
            }
        }
    }
    examples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoId {
        RepoId::from_raw("repo1")
    }

    #[test]
    fn parses_a_valid_skill() {
        let content = "---\nname: test-driven-development\ndescription: TDD patterns and practices for reliable code.\ntags: [testing, tdd]\ncategory: testing\n---\n\n## Examples\n\n- Write a failing test first\n- Make it pass\n- Refactor\n\nThis skill walks through the red-green-refactor loop in detail, explaining why each step matters for maintainable code over time.\n";
        let parsed = parse_content(content, "testing/tdd", &repo(), Path::new("/r/testing/tdd/SKILL.md"), None)
            .expect("should parse");
        assert_eq!(parsed.skill.name, "test-driven-development");
        assert_eq!(parsed.skill.id.as_str(), "repo1/testing/tdd");
        assert_eq!(parsed.skill.category, Category::Testing);
        assert_eq!(parsed.skill.examples.len(), 3);
        assert!(parsed.skill.tags.contains("tdd"));
    }

    #[test]
    fn missing_frontmatter_is_malformed() {
        let content = "Just a body, no frontmatter fences at all and it is long enough to pass other checks.";
        let err = parse_content(content, "x", &repo(), Path::new("x/SKILL.md"), None).unwrap_err();
        assert!(matches!(err, ParseError::MalformedFile(_)));
    }

    #[test]
    fn unclosed_frontmatter_is_malformed() {
        let content = "---\nname: x\ndescription: missing the closing fence\n\nBody content here that is long enough to pass body length checks easily now.";
        let err = parse_content(content, "x", &repo(), Path::new("x/SKILL.md"), None).unwrap_err();
        assert!(matches!(err, ParseError::MalformedFile(_)));
    }

    #[test]
    fn missing_description_is_schema_violation() {
        let content = "---\nname: incomplete\n---\n\nBody without description but otherwise long enough to pass, surely.";
        let err = parse_content(content, "x", &repo(), Path::new("x/SKILL.md"), None).unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation(_)));
    }

    #[test]
    fn short_description_is_schema_violation() {
        let content = "---\nname: x\ndescription: short\n---\n\nBody long enough to pass the instructions length check on its own merits easily.";
        let err = parse_content(content, "x", &repo(), Path::new("x/SKILL.md"), None).unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation(_)));
    }

    #[test]
    fn short_body_is_schema_violation() {
        let content = "---\nname: x\ndescription: A description long enough to pass.\n---\n\nToo short.";
        let err = parse_content(content, "x", &repo(), Path::new("x/SKILL.md"), None).unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation(_)));
    }

    #[test]
    fn overlong_name_is_schema_violation() {
        let long_name = "a".repeat(65);
        let content = format!(
            "---\nname: {long_name}\ndescription: A description long enough to pass easily.\n---\n\nBody long enough to pass the instructions length check on its own merits, easily."
        );
        let err = parse_content(&content, "x", &repo(), Path::new("x/SKILL.md"), None).unwrap_err();
        assert!(matches!(err, ParseError::SchemaViolation(_)));
    }

    #[test]
    fn dependencies_resolve_within_same_repo() {
        let content = "---\nname: x\ndescription: A description long enough to pass easily.\ndependencies: [testing/tdd]\n---\n\nBody long enough to pass the instructions length check on its own merits, easily.";
        let parsed = parse_content(content, "x", &repo(), Path::new("x/SKILL.md"), None).unwrap();
        let dep = parsed.skill.dependencies.iter().next().unwrap();
        assert_eq!(dep.as_str(), "repo1/testing/tdd");
    }

    #[test]
    fn oversized_frontmatter_warns_but_succeeds() {
        let padding = "x".repeat(500);
        let content = format!(
            "---\nname: x\ndescription: A description long enough to pass easily.\nauthor: {padding}\n---\n\nBody long enough to pass the instructions length check on its own merits, easily."
        );
        let parsed = parse_content(&content, "x", &repo(), Path::new("x/SKILL.md"), None).unwrap();
        assert!(parsed
            .warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::ProgressiveDisclosure(_))));
    }
}
