//! File-backed composition repository
//!
//! Compositions live in one JSON document keyed by id, rewritten through a
//! temporary file and rename on every upsert. Pattern contributions are
//! appended to a JSONL file.

use async_trait::async_trait;
use conductor_application::ports::composition_repository::{
    CompositionRepository, PersistenceError,
};
use conductor_domain::{AgentComposition, PatternContribution};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const COMPOSITIONS_FILE: &str = "compositions.json";
const PATTERNS_FILE: &str = "patterns.jsonl";

pub struct JsonFileCompositionRepository {
    dir: PathBuf,
    /// Serializes writers of either file
    write_lock: Mutex<()>,
}

impl JsonFileCompositionRepository {
    /// Use `dir` as the data directory, creating it if needed
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        debug!("Composition repository at {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn compositions_path(&self) -> PathBuf {
        self.dir.join(COMPOSITIONS_FILE)
    }

    fn patterns_path(&self) -> PathBuf {
        self.dir.join(PATTERNS_FILE)
    }

    async fn read_compositions(&self) -> Result<BTreeMap<String, AgentComposition>, PersistenceError> {
        match tokio::fs::read_to_string(self.compositions_path()).await {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_compositions(
        &self,
        compositions: &BTreeMap<String, AgentComposition>,
    ) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(compositions)?;
        let tmp = self.dir.join(format!("{}.tmp", COMPOSITIONS_FILE));
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, self.compositions_path()).await?;
        Ok(())
    }
}

#[async_trait]
impl CompositionRepository for JsonFileCompositionRepository {
    async fn find_by_pattern(
        &self,
        task_pattern: &str,
    ) -> Result<Vec<AgentComposition>, PersistenceError> {
        Ok(self
            .read_compositions()
            .await?
            .into_values()
            .filter(|c| c.task_pattern == task_pattern)
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<AgentComposition>, PersistenceError> {
        Ok(self.read_compositions().await?.remove(id))
    }

    async fn upsert(&self, composition: &AgentComposition) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut compositions = self.read_compositions().await?;
        compositions.insert(composition.id.clone(), composition.clone());
        self.write_compositions(&compositions).await
    }

    async fn append_contribution(
        &self,
        contribution: &PatternContribution,
    ) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(contribution)?;
        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.patterns_path())
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn contributions(
        &self,
        task_pattern: &str,
    ) -> Result<Vec<PatternContribution>, PersistenceError> {
        let text = match tokio::fs::read_to_string(self.patterns_path()).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut contributions = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<PatternContribution>(line) {
                Ok(c) if c.task_pattern == task_pattern => contributions.push(c),
                Ok(_) => {}
                Err(e) => warn!("Skipping malformed pattern contribution: {}", e),
            }
        }
        Ok(contributions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_domain::{AgentSpec, QualityGates, Strategy, Tier};
    use std::collections::BTreeSet;

    fn composition(pattern: &str, template: &str) -> AgentComposition {
        AgentComposition::new(
            pattern,
            vec![AgentSpec {
                template_id: template.into(),
                role: template.into(),
                tier: Tier::Capable,
                capabilities: BTreeSet::from(["security_scan".to_string()]),
                tools: vec!["read_file".into()],
                instructions_template: "Scan {{task}}".into(),
                quality_gates: QualityGates::new().with_gate("min_quality", 0.55),
                timeout_secs: Some(60),
            }],
            Strategy::Parallel,
            QualityGates::new(),
        )
    }

    #[tokio::test]
    async fn test_upsert_and_find_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileCompositionRepository::open(dir.path()).await.unwrap();

        let a = composition("security:moderate", "security_scanner");
        let b = composition("testing:simple", "test_writer");
        repo.upsert(&a).await.unwrap();
        repo.upsert(&b).await.unwrap();

        let found = repo.find_by_pattern("security:moderate").await.unwrap();
        assert_eq!(found, vec![a.clone()]);
        assert_eq!(repo.get(&b.id).await.unwrap(), Some(b));
        assert!(repo.get("comp-missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = composition("security:moderate", "security_scanner");
        {
            let repo = JsonFileCompositionRepository::open(dir.path()).await.unwrap();
            repo.upsert(&c).await.unwrap();
            c.usage_count = 5;
            repo.upsert(&c).await.unwrap();
        }

        let reopened = JsonFileCompositionRepository::open(dir.path()).await.unwrap();
        let found = reopened.find_by_pattern("security:moderate").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].usage_count, 5);
    }

    #[tokio::test]
    async fn test_contributions_filtered_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileCompositionRepository::open(dir.path()).await.unwrap();

        for (pattern, success) in [("security:moderate", true), ("testing:simple", false), ("security:moderate", false)] {
            repo.append_contribution(&PatternContribution {
                composition_id: "comp-1".into(),
                task_pattern: pattern.into(),
                strategy: Strategy::Parallel,
                success,
                quality_score: 0.7,
                timestamp: 1,
            })
            .await
            .unwrap();
        }

        let security = repo.contributions("security:moderate").await.unwrap();
        assert_eq!(security.len(), 2);
        assert!(security[0].success && !security[1].success);
        assert!(repo.contributions("docs:simple").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(COMPOSITIONS_FILE), "{ not json").unwrap();
        let repo = JsonFileCompositionRepository::open(dir.path()).await.unwrap();

        assert!(matches!(
            repo.find_by_pattern("security:moderate").await,
            Err(PersistenceError::Serialization(_))
        ));
    }
}
