//! AI suggestion panel over complaints and maintenance requests.
//!
//! The completion service itself is a collaborator behind `CompletionClient`.
//! This module picks the records to send, keeps one request in flight at a
//! time, and turns free-text answers into numbered suggestions.

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{DeskError, Result};
use crate::kinds::{Complaint, MaintenanceRequest};
use crate::query::{Facet, FacetValue, Queryable};

const FALLBACK_CATEGORY: &str = "General";

/// One outgoing request: an instruction plus a JSON array of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    /// `None` for the general request.
    pub category: Option<String>,
    pub instruction: String,
    pub records: String,
}

/// The external text-completion collaborator.
pub trait CompletionClient {
    fn complete(&mut self, request: &SuggestionRequest) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub id: usize,
    pub text: String,
}

/// Split a free-text answer into suggestions: one per non-blank line with
/// any leading `N.` ordinal removed. An answer with no ordinals at all is
/// kept whole as a single suggestion.
pub fn parse_suggestions(response: &str) -> Vec<Suggestion> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = trimmed.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if !lines.iter().any(|l| strip_ordinal(l).is_some()) {
        return vec![Suggestion {
            id: 0,
            text: trimmed.to_string(),
        }];
    }

    lines
        .into_iter()
        .map(|l| strip_ordinal(l).unwrap_or(l))
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(id, text)| Suggestion {
            id,
            text: text.to_string(),
        })
        .collect()
}

/// The text after a leading `N.` ordinal, if there is one.
fn strip_ordinal(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == line.len() {
        return None;
    }
    rest.strip_prefix('.').map(str::trim_start)
}

// ─── Panel ────────────────────────────────────────────────────────────────

/// Requests prepared for one "generate suggestions" action.
#[derive(Debug, Clone)]
pub struct SuggestionJob {
    pub general: SuggestionRequest,
    pub by_category: Vec<SuggestionRequest>,
}

/// Answers for a finished job, in request order.
#[derive(Debug, Clone)]
pub struct JobAnswers {
    pub general: String,
    pub by_category: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct SuggestionPanel {
    general: Vec<Suggestion>,
    by_category: Vec<(String, Vec<Suggestion>)>,
    in_flight: bool,
    error: Option<String>,
    general_sample: usize,
    category_sample: usize,
}

impl SuggestionPanel {
    /// `general_sample` records go into the general request and up to
    /// `category_sample` into each per-category request.
    pub fn new(general_sample: usize, category_sample: usize) -> Self {
        Self {
            general_sample,
            category_sample,
            ..Self::default()
        }
    }

    pub fn general(&self) -> &[Suggestion] {
        &self.general
    }

    pub fn for_category(&self, category: &str) -> &[Suggestion] {
        if category.eq_ignore_ascii_case("all") {
            return &self.general;
        }
        self.by_category
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, s)| s.as_slice())
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> Vec<&str> {
        self.by_category.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// The last failure, shown until dismissed or until a request succeeds.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Prepare the requests for one action and mark it in flight.
    pub fn begin(&mut self, complaints: &[Complaint], maintenance: &[MaintenanceRequest]) -> Result<SuggestionJob> {
        if self.in_flight {
            return Err(DeskError::Busy);
        }
        let job = match self.build_job(complaints, maintenance) {
            Ok(job) => job,
            Err(e) => return Err(self.record_failure(e)),
        };
        self.in_flight = true;
        self.error = None;
        debug!(categories = job.by_category.len(), "suggestion request started");
        Ok(job)
    }

    /// Settle the in-flight action. Previous suggestions survive a failure.
    pub fn finish(&mut self, outcome: Result<JobAnswers>) -> Result<()> {
        self.in_flight = false;
        let answers = outcome.map_err(|e| self.record_failure(e))?;
        self.general = parse_suggestions(&answers.general);
        self.by_category = answers
            .by_category
            .into_iter()
            .map(|(category, text)| (category, parse_suggestions(&text)))
            .collect();
        debug!(general = self.general.len(), "suggestions updated");
        Ok(())
    }

    /// Run one full action against `client`.
    pub fn generate(
        &mut self,
        client: &mut impl CompletionClient,
        complaints: &[Complaint],
        maintenance: &[MaintenanceRequest],
    ) -> Result<()> {
        let job = self.begin(complaints, maintenance)?;
        let outcome = run_job(client, &job);
        self.finish(outcome)
    }

    fn record_failure(&mut self, error: DeskError) -> DeskError {
        warn!(error = %error, "suggestion request failed");
        self.error = Some(error.to_string());
        error
    }

    fn build_job(&self, complaints: &[Complaint], maintenance: &[MaintenanceRequest]) -> Result<SuggestionJob> {
        let mut issues = Vec::with_capacity(complaints.len() + maintenance.len());
        for complaint in complaints {
            issues.push(Issue::of(complaint)?);
        }
        for request in maintenance {
            issues.push(Issue::of(request)?);
        }
        if issues.is_empty() {
            return Err(DeskError::ExternalService("no data available to analyze".to_string()));
        }

        let general = SuggestionRequest {
            category: None,
            instruction: "Analyze these campus issues and provide 3-5 actionable suggestions".to_string(),
            records: sample_json(issues.iter(), self.general_sample)?,
        };

        let mut categories: Vec<&str> = Vec::new();
        for issue in &issues {
            if !categories.contains(&issue.category.as_str()) {
                categories.push(issue.category.as_str());
            }
        }
        let by_category = categories
            .into_iter()
            .map(|category| -> Result<SuggestionRequest> {
                let members = issues.iter().filter(|i| i.category == category);
                Ok(SuggestionRequest {
                    category: Some(category.to_string()),
                    instruction: format!("Analyze these {category} issues and provide 3 specific suggestions"),
                    records: sample_json(members, self.category_sample)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SuggestionJob { general, by_category })
    }
}

/// Send every request in `job`, stopping at the first failure.
pub fn run_job(client: &mut impl CompletionClient, job: &SuggestionJob) -> Result<JobAnswers> {
    let general = client.complete(&job.general)?;
    let mut by_category = Vec::with_capacity(job.by_category.len());
    for request in &job.by_category {
        let answer = client.complete(request)?;
        by_category.push((request.category.clone().unwrap_or_default(), answer));
    }
    Ok(JobAnswers { general, by_category })
}

struct Issue {
    category: String,
    json: serde_json::Value,
}

impl Issue {
    fn of<R: Queryable + Serialize>(record: &R) -> Result<Self> {
        let category = match record.facet(Facet::Category) {
            FacetValue::One(c) if !c.trim().is_empty() => c.to_string(),
            _ => FALLBACK_CATEGORY.to_string(),
        };
        Ok(Self {
            category,
            json: serde_json::to_value(record)?,
        })
    }
}

fn sample_json<'a>(issues: impl Iterator<Item = &'a Issue>, limit: usize) -> Result<String> {
    let sample: Vec<&serde_json::Value> = issues.take(limit).map(|i| &i.json).collect();
    Ok(serde_json::to_string(&sample)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    /// Answers with a numbered list, or fails on request `fail_at`.
    struct Scripted {
        seen: Vec<SuggestionRequest>,
        fail_at: Option<usize>,
    }

    impl Scripted {
        fn new(fail_at: Option<usize>) -> Self {
            Self { seen: Vec::new(), fail_at }
        }
    }

    impl CompletionClient for Scripted {
        fn complete(&mut self, request: &SuggestionRequest) -> Result<String> {
            let n = self.seen.len();
            self.seen.push(request.clone());
            if self.fail_at == Some(n) {
                return Err(DeskError::ExternalService("quota exceeded".into()));
            }
            let topic = request.category.as_deref().unwrap_or("campus");
            Ok(format!("1. Fix {topic} first\n\n2. Then review {topic}\n"))
        }
    }

    #[test]
    fn test_parse_numbered() {
        let parsed = parse_suggestions("1. Add routers\n\n2.  Extend library hours\n10. Audit menus");
        let texts: Vec<_> = parsed.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Add routers", "Extend library hours", "Audit menus"]);
        assert_eq!(parsed[2].id, 2);
    }

    #[test]
    fn test_parse_unnumbered_kept_whole() {
        let parsed = parse_suggestions("  Consider hiring more staff.\nAlso buy routers.  ");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "Consider hiring more staff.\nAlso buy routers.");
        assert!(parse_suggestions(" \n ").is_empty());
    }

    #[test]
    fn test_parse_mixed_lines() {
        let parsed = parse_suggestions("Here are ideas:\n1. One\n2. Two");
        let texts: Vec<_> = parsed.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Here are ideas:", "One", "Two"]);
    }

    #[test]
    fn test_generate_groups_by_category() {
        let mut panel = SuggestionPanel::new(10, 5);
        let mut client = Scripted::new(None);
        panel
            .generate(&mut client, &Complaint::seed(), &MaintenanceRequest::seed())
            .unwrap();

        assert_eq!(panel.general().len(), 2);
        assert_eq!(panel.categories()[0], "Infrastructure");
        assert_eq!(panel.for_category("Plumbing")[0].text, "Fix Plumbing first");
        assert_eq!(panel.for_category("All"), panel.general());
        assert!(panel.for_category("Unknown").is_empty());
        assert!(!panel.is_busy());

        let general: Vec<serde_json::Value> = serde_json::from_str(&client.seen[0].records).unwrap();
        assert_eq!(general.len(), 10);
    }

    #[test]
    fn test_failure_keeps_previous_results() {
        let mut panel = SuggestionPanel::new(10, 5);
        panel
            .generate(&mut Scripted::new(None), &Complaint::seed(), &[])
            .unwrap();
        let before = panel.general().to_vec();

        let err = panel
            .generate(&mut Scripted::new(Some(1)), &Complaint::seed(), &[])
            .unwrap_err();
        assert!(matches!(err, DeskError::ExternalService(_)));
        assert_eq!(panel.general(), &before[..]);
        assert!(panel.error().unwrap().contains("quota exceeded"));
        assert!(!panel.is_busy());

        panel.dismiss_error();
        assert_eq!(panel.error(), None);
    }

    #[test]
    fn test_second_request_while_in_flight() {
        let mut panel = SuggestionPanel::new(10, 5);
        let job = panel.begin(&Complaint::seed(), &[]).unwrap();
        assert!(panel.is_busy());
        assert!(matches!(panel.begin(&Complaint::seed(), &[]), Err(DeskError::Busy)));

        let answers = run_job(&mut Scripted::new(None), &job);
        panel.finish(answers).unwrap();
        assert!(!panel.is_busy());
    }

    #[test]
    fn test_no_data() {
        let mut panel = SuggestionPanel::new(10, 5);
        assert!(panel.begin(&[], &[]).is_err());
        assert!(!panel.is_busy());
        assert!(panel.error().is_some());
    }
}
