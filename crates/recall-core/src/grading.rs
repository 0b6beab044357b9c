//! Grading orchestrator.
//!
//! Decides between the local engine and an optional remote grader. The local
//! assessment is always computed, and it is the answer whenever the remote
//! grader is disabled, missing, slow, or fails.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RemoteError;
use crate::model::{Flashcard, Project};
use crate::report::{CardResult, DeckReport, ProjectSummary};
use crate::scorer::{assess, Assessment, Grade, Rule};
use crate::statistics::summarize;
use crate::traits::{GradeRequest, RemoteGrader};

/// Where grades should come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingMode {
    /// Only the offline engine.
    #[default]
    Local,
    /// Ask the remote grader first, fall back to the offline engine.
    Remote,
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingMode::Local => write!(f, "local"),
            GradingMode::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for GradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "offline" => Ok(GradingMode::Local),
            "remote" => Ok(GradingMode::Remote),
            other => Err(format!("unknown grading mode: {other}")),
        }
    }
}

/// Configuration for the grader.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    pub mode: GradingMode,
    /// How long to wait for the remote grader before falling back.
    pub remote_timeout: Duration,
    /// Maximum cards graded concurrently by [`Grader::grade_deck`].
    pub parallelism: usize,
    /// Percent at or above which a card counts as recalled.
    pub pass_threshold: u8,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            mode: GradingMode::Local,
            remote_timeout: Duration::from_secs(3),
            parallelism: 4,
            pass_threshold: 80,
        }
    }
}

/// Which side produced the final percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeSource {
    Local,
    Remote,
}

/// The result of grading one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeOutcome {
    /// The offline engine's assessment. Always present.
    pub local: Assessment,
    /// What the remote grader answered, if it was asked and answered in time.
    #[serde(default)]
    pub remote_percent: Option<u8>,
    pub source: GradeSource,
    /// Final display percentage.
    pub percent: u8,
}

impl GradeOutcome {
    /// An outcome decided by the offline engine alone.
    pub fn local(local: Assessment) -> Self {
        Self {
            local,
            remote_percent: None,
            source: GradeSource::Local,
            percent: local.grade.percent(),
        }
    }

    fn remote(local: Assessment, percent: u8) -> Self {
        Self {
            local,
            remote_percent: Some(percent),
            source: GradeSource::Remote,
            percent,
        }
    }

    /// The final bucket. A remote percent is mapped onto the bucket scale.
    pub fn grade(&self) -> Grade {
        match self.remote_percent {
            Some(percent) if self.source == GradeSource::Remote => Grade::from_percent(percent),
            _ => self.local.grade,
        }
    }

    pub fn passed(&self, threshold: u8) -> bool {
        self.percent >= threshold
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_card_graded(&self, folder: &str, card: &Flashcard, outcome: &GradeOutcome);
    fn on_deck_complete(&self, graded: usize, unanswered: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_card_graded(&self, _: &str, _: &Flashcard, _: &GradeOutcome) {}
    fn on_deck_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// Grades answers locally, optionally consulting a remote grader first.
pub struct Grader {
    remote: Option<Arc<dyn RemoteGrader>>,
    config: GraderConfig,
}

impl Grader {
    pub fn new(remote: Option<Arc<dyn RemoteGrader>>, config: GraderConfig) -> Self {
        Self { remote, config }
    }

    /// A grader that only uses the offline engine.
    pub fn offline(config: GraderConfig) -> Self {
        Self::new(None, config)
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    /// Grade a single answer.
    pub async fn grade(&self, reference: &str, candidate: &str) -> GradeOutcome {
        let local = assess(reference, candidate);

        if self.config.mode == GradingMode::Local || local.rule == Rule::EmptyInput {
            return GradeOutcome::local(local);
        }

        let Some(remote) = &self.remote else {
            tracing::warn!("remote grading requested but no remote grader configured, using local score");
            return GradeOutcome::local(local);
        };

        match self.ask_remote(remote.as_ref(), reference, candidate).await {
            Ok(percent) => GradeOutcome::remote(local, percent),
            Err(e) => {
                tracing::warn!(
                    grader = remote.name(),
                    error = %e,
                    local = local.grade.percent(),
                    "remote grading failed, using local score"
                );
                GradeOutcome::local(local)
            }
        }
    }

    async fn ask_remote(
        &self,
        remote: &dyn RemoteGrader,
        reference: &str,
        candidate: &str,
    ) -> Result<u8, RemoteError> {
        let request = GradeRequest::new(reference, candidate);
        let timeout = self.config.remote_timeout;

        let score = tokio::time::timeout(timeout, remote.grade(&request))
            .await
            .map_err(|_| RemoteError::Timeout(timeout.as_millis() as u64))??;

        tracing::debug!(grader = remote.name(), percent = score.percent, "remote grade received");
        Ok(score.percent.min(100))
    }

    /// Grade every answered card in a project.
    ///
    /// Cards without a response are skipped and counted as unanswered. Results
    /// come back in deck order regardless of completion order.
    pub async fn grade_deck(
        &self,
        project: &Project,
        progress: &dyn ProgressReporter,
    ) -> DeckReport {
        let start = Instant::now();
        let parallelism = self.config.parallelism.max(1);

        let answered: Vec<(usize, &str, &Flashcard, &str)> = project
            .cards()
            .filter_map(|(folder, card)| {
                card.response
                    .as_deref()
                    .map(|response| (folder.name.as_str(), card, response))
            })
            .enumerate()
            .map(|(idx, (folder, card, response))| (idx, folder, card, response))
            .collect();
        let unanswered = project.card_count() - answered.len();

        tracing::info!(
            project = %project.name,
            cards = answered.len(),
            unanswered,
            mode = %self.config.mode,
            "grading deck"
        );

        let mut graded: Vec<(usize, CardResult)> = stream::iter(answered)
            .map(|(idx, folder, card, response)| async move {
                let outcome = self.grade(&card.answer, response).await;
                progress.on_card_graded(folder, card, &outcome);
                (
                    idx,
                    CardResult {
                        folder: folder.to_string(),
                        card_id: card.id,
                        question: card.question.clone(),
                        reference: card.answer.clone(),
                        response: response.to_string(),
                        outcome,
                    },
                )
            })
            .buffer_unordered(parallelism)
            .collect()
            .await;
        graded.sort_by_key(|(idx, _)| *idx);
        let results: Vec<CardResult> = graded.into_iter().map(|(_, r)| r).collect();

        let elapsed = start.elapsed();
        progress.on_deck_complete(results.len(), unanswered, elapsed);

        let summary = summarize(&results, unanswered, self.config.pass_threshold);

        DeckReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            project: ProjectSummary {
                id: project.id,
                name: project.name.clone(),
                folder_count: project.folders.len(),
                card_count: project.card_count(),
            },
            results,
            summary,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGrader;
    use crate::model::Folder;
    use std::sync::Mutex;

    fn remote_config() -> GraderConfig {
        GraderConfig {
            mode: GradingMode::Remote,
            remote_timeout: Duration::from_millis(200),
            ..GraderConfig::default()
        }
    }

    #[test]
    fn mode_parse_and_display() {
        assert_eq!("local".parse::<GradingMode>().unwrap(), GradingMode::Local);
        assert_eq!("Remote".parse::<GradingMode>().unwrap(), GradingMode::Remote);
        assert_eq!("offline".parse::<GradingMode>().unwrap(), GradingMode::Local);
        assert!("cloud".parse::<GradingMode>().is_err());
        assert_eq!(GradingMode::Remote.to_string(), "remote");
    }

    #[tokio::test]
    async fn local_mode_never_calls_remote() {
        let remote = Arc::new(MockGrader::fixed(10));
        let grader = Grader::new(Some(remote.clone()), GraderConfig::default());

        let outcome = grader.grade("elephant", "elephnat").await;
        assert_eq!(outcome.source, GradeSource::Local);
        assert_eq!(outcome.percent, 80);
        assert_eq!(outcome.local.grade, Grade::Close);
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn remote_score_used_when_available() {
        let remote = Arc::new(MockGrader::fixed(65));
        let grader = Grader::new(Some(remote.clone()), remote_config());

        let outcome = grader.grade("Paris", "paris france").await;
        assert_eq!(outcome.source, GradeSource::Remote);
        assert_eq!(outcome.percent, 65);
        assert_eq!(outcome.remote_percent, Some(65));
        assert_eq!(outcome.local.grade, Grade::NearExact);
        assert_eq!(remote.call_count(), 1);
        assert_eq!(
            remote.last_request(),
            Some(GradeRequest::new("Paris", "paris france"))
        );
    }

    #[tokio::test]
    async fn remote_failure_falls_back() {
        let remote = Arc::new(MockGrader::failing(|| {
            RemoteError::Unavailable("connection refused".into())
        }));
        let grader = Grader::new(Some(remote.clone()), remote_config());

        let outcome = grader.grade("Paris", "Paris").await;
        assert_eq!(outcome.source, GradeSource::Local);
        assert_eq!(outcome.percent, 100);
        assert_eq!(outcome.remote_percent, None);
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_remote_times_out() {
        let remote = Arc::new(MockGrader::fixed(5).with_delay(Duration::from_secs(30)));
        let grader = Grader::new(Some(remote.clone()), remote_config());

        let outcome = grader.grade("elephant", "elephnat").await;
        assert_eq!(outcome.source, GradeSource::Local);
        assert_eq!(outcome.percent, 80);
    }

    #[tokio::test]
    async fn remote_mode_without_grader_uses_local() {
        let grader = Grader::offline(remote_config());
        let outcome = grader.grade("cat", "dog").await;
        assert_eq!(outcome.source, GradeSource::Local);
        assert_eq!(outcome.percent, 0);
    }

    #[tokio::test]
    async fn empty_answer_skips_remote() {
        let remote = Arc::new(MockGrader::fixed(100));
        let grader = Grader::new(Some(remote.clone()), remote_config());

        let outcome = grader.grade("Paris", "   ").await;
        assert_eq!(outcome.percent, 0);
        assert_eq!(outcome.source, GradeSource::Local);
        assert_eq!(remote.call_count(), 0);
    }

    #[test]
    fn outcome_grade_follows_source() {
        let local = assess("elephant", "elephnat");
        assert_eq!(GradeOutcome::local(local).grade(), Grade::Close);
        assert_eq!(GradeOutcome::remote(local, 45).grade(), Grade::Partial);
        assert_eq!(GradeOutcome::remote(local, 100).grade(), Grade::Exact);
        assert_eq!(GradeOutcome::remote(local, 0).grade(), Grade::Incorrect);
    }

    #[test]
    fn outcome_pass_threshold() {
        let outcome = GradeOutcome::local(assess("elephant", "elephnat"));
        assert!(outcome.passed(80));
        assert!(!outcome.passed(81));
    }

    struct RecordingReporter {
        graded: Mutex<Vec<String>>,
        completed: Mutex<Option<(usize, usize)>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn on_card_graded(&self, folder: &str, card: &Flashcard, _: &GradeOutcome) {
            self.graded
                .lock()
                .unwrap()
                .push(format!("{folder}/{}", card.answer));
        }

        fn on_deck_complete(&self, graded: usize, unanswered: usize, _: Duration) {
            *self.completed.lock().unwrap() = Some((graded, unanswered));
        }
    }

    fn deck() -> Project {
        Project::new(
            "Geography",
            vec![
                Folder::new(
                    "Capitals",
                    vec![
                        Flashcard::new("Capital of France?", "Paris").with_response("paris"),
                        Flashcard::new("Capital of Germany?", "Berlin"),
                        Flashcard::new("Capital of Japan?", "Tokyo").with_response("Kyoto"),
                    ],
                ),
                Folder::new(
                    "Rivers",
                    vec![Flashcard::new("Longest river?", "The Nile").with_response("nile")],
                ),
            ],
        )
    }

    #[tokio::test]
    async fn grade_deck_offline() {
        let grader = Grader::offline(GraderConfig {
            parallelism: 2,
            ..GraderConfig::default()
        });
        let reporter = RecordingReporter {
            graded: Mutex::new(Vec::new()),
            completed: Mutex::new(None),
        };

        let report = grader.grade_deck(&deck(), &reporter).await;

        assert_eq!(report.project.name, "Geography");
        assert_eq!(report.project.card_count, 4);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.summary.unanswered, 1);

        let answers: Vec<&str> = report.results.iter().map(|r| r.reference.as_str()).collect();
        assert_eq!(answers, vec!["Paris", "Tokyo", "The Nile"]);

        assert_eq!(report.results[0].outcome.percent, 100);
        assert_eq!(report.results[2].outcome.local.grade, Grade::NearExact);
        assert_eq!(report.results[2].folder, "Rivers");

        assert_eq!(reporter.graded.lock().unwrap().len(), 3);
        assert_eq!(*reporter.completed.lock().unwrap(), Some((3, 1)));
    }

    #[tokio::test]
    async fn grade_deck_with_remote() {
        let remote = Arc::new(MockGrader::fixed(42));
        let grader = Grader::new(Some(remote.clone()), remote_config());

        let report = grader.grade_deck(&deck(), &NoopReporter).await;
        assert_eq!(report.summary.remote_graded, 3);
        assert!(report.results.iter().all(|r| r.outcome.percent == 42));
        assert_eq!(remote.call_count(), 3);
    }
}
