use skillforge_core::RepoId;
use skillforge_parser::SkillParser;
use std::fs;
use tempfile::TempDir;

fn write_skill(repo_root: &std::path::Path, relative_dir: &str, content: &str) -> std::path::PathBuf {
    let dir = repo_root.join(relative_dir);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("SKILL.md");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn parse_file_derives_identifier_from_repo_relative_path() {
    let repo = TempDir::new().unwrap();
    let path = write_skill(
        repo.path(),
        "testing/tdd",
        "---\nname: test-driven-development\ndescription: TDD patterns and practices for reliable code.\n---\n\nFollow the red-green-refactor loop to build confidence incrementally over time.\n",
    );

    let parser = SkillParser::new();
    let repo_id = RepoId::from_raw("repo1");
    let parsed = parser.parse_file(&path, repo.path(), &repo_id).unwrap();

    assert_eq!(parsed.skill.id.as_str(), "repo1/testing/tdd");
    assert_eq!(parsed.skill.name, "test-driven-development");
}

#[test]
fn parse_file_surfaces_mtime_as_updated_at() {
    let repo = TempDir::new().unwrap();
    let path = write_skill(
        repo.path(),
        "general/one",
        "---\nname: one\ndescription: A description that is long enough to pass easily.\n---\n\nBody text that comfortably exceeds the fifty character minimum requirement.\n",
    );

    let parser = SkillParser::new();
    let repo_id = RepoId::from_raw("repo1");
    let parsed = parser.parse_file(&path, repo.path(), &repo_id).unwrap();

    assert!(parsed.skill.updated_at.is_some());
}

#[test]
fn parse_file_on_missing_path_is_malformed() {
    let repo = TempDir::new().unwrap();
    let parser = SkillParser::new();
    let repo_id = RepoId::from_raw("repo1");
    let result = parser.parse_file(&repo.path().join("missing/SKILL.md"), repo.path(), &repo_id);
    assert!(result.is_err());
}
