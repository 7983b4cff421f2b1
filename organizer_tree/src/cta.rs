//! Calls to action and the folding of their results into per-question
//! histograms.

use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::CtaResult;

/// Words shorter than this are not used on their own for matching.
const MIN_WORD_LEN: usize = 2;

/// One answer option and the number of results that picked it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OptionTally {
    pub label: String,
    pub count: u32,
    /// False for the options created from unmatched answers.
    pub declared: bool,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Question {
    pub key: String,
    pub text: String,
    pub question_type: String,
    pub survey_question_van_id: Option<i64>,
    options: Vec<OptionTally>,
    null_answers: u32,
}

impl Question {
    /// Blank labels are dropped.
    pub fn new(key: &str, text: &str, question_type: &str, labels: &[String]) -> Question {
        Question {
            key: key.to_string(),
            text: text.to_string(),
            question_type: question_type.to_string(),
            survey_question_van_id: None,
            options: labels
                .iter()
                .filter(|l| !l.trim().is_empty())
                .map(|l| OptionTally {
                    label: l.clone(),
                    count: 0,
                    declared: true,
                })
                .collect(),
            null_answers: 0,
        }
    }

    /// The declared options in their declared order, followed by the
    /// ad-hoc options in order of first appearance.
    pub fn options(&self) -> &[OptionTally] {
        &self.options
    }

    /// The answers that landed in an option, declared or ad-hoc.
    /// Null answers are not included.
    pub fn num_answers(&self) -> u32 {
        self.options.iter().map(|o| o.count).sum()
    }

    pub fn null_answers(&self) -> u32 {
        self.null_answers
    }

    /// Folds one raw answer into the histogram.
    ///
    /// The first option whose label matches wins. An answer that matches
    /// nothing becomes a new option keyed by its raw text.
    pub fn add_answer(&mut self, raw: Option<&str>) {
        let answer = match raw {
            Some(a) if !a.trim().is_empty() => a,
            _ => {
                self.null_answers += 1;
                return;
            }
        };
        match self
            .options
            .iter_mut()
            .find(|o| answer_matches(answer, &o.label))
        {
            Some(opt) => opt.count += 1,
            None => {
                debug!(
                    "add_answer: question {}: new option {:?}",
                    self.key, answer
                );
                self.options.push(OptionTally {
                    label: answer.to_string(),
                    count: 1,
                    declared: false,
                });
            }
        }
    }
}

/// Keeps only the alphanumeric characters, lower-cased.
pub fn normalize_answer(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Whether a raw answer selects the option with the given label.
///
/// The normalized answer must be a substring of the normalized label.
/// Failing that, any word of the answer of at least two characters that
/// is a substring of the label is enough: `Yes/Si` selects `Yes`.
///
/// The word fallback is broader than a plain substring test. An answer that
/// names two options, such as `Yes and no`, counts for the first of them
/// instead of becoming a new option. An answer none of whose words appears
/// in a label still becomes a new option.
pub fn answer_matches(answer: &str, label: &str) -> bool {
    let label = normalize_answer(label);
    if label.is_empty() {
        return false;
    }
    let whole = normalize_answer(answer);
    if !whole.is_empty() && label.contains(&whole) {
        return true;
    }
    answer
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .any(|w| label.contains(&w.to_lowercase()))
}

/// A survey definition, and the results collected for it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CallToAction {
    pub id: i64,
    pub name: String,
    pub instructions_html: String,
    pub created_mts: Option<i64>,
    pub organization_id: i64,
    pub region_ids: BTreeSet<i64>,
    pub is_intro_cta: bool,
    questions: Vec<Question>,
    results: Vec<CtaResult>,
}

impl CallToAction {
    pub fn new(id: i64, name: &str) -> CallToAction {
        CallToAction {
            id,
            name: name.to_string(),
            instructions_html: String::new(),
            created_mts: None,
            organization_id: 0,
            region_ids: BTreeSet::new(),
            is_intro_cta: false,
            questions: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Adds a question, or replaces the question with the same key.
    pub fn add_question(&mut self, q: Question) {
        match self.questions.iter_mut().find(|x| x.key == q.key) {
            Some(existing) => {
                warn!(
                    "add_question: CTA {} declares question {} twice",
                    self.id, q.key
                );
                *existing = q;
            }
            None => self.questions.push(q),
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.key == key)
    }

    /// Folds the answers of one result into the questions, then keeps the
    /// result.
    ///
    /// Questions the result has no key for are left untouched.
    pub fn add_cta_result(&mut self, result: CtaResult) {
        for q in self.questions.iter_mut() {
            if let Some(answer) = result.answers.get(&q.key) {
                q.add_answer(answer.as_deref());
            }
        }
        self.results.push(result);
    }

    pub fn num_cta_results(&self) -> usize {
        self.results.len()
    }

    pub fn results(&self) -> &[CtaResult] {
        &self.results
    }
}

/// Routes every result to its call to action.
///
/// Returns the results whose CTA is unknown.
pub fn fold_results(
    ctas: &mut BTreeMap<i64, CallToAction>,
    results: impl IntoIterator<Item = CtaResult>,
) -> Vec<CtaResult> {
    let mut unrouted: Vec<CtaResult> = Vec::new();
    let mut num_folded: usize = 0;
    for r in results {
        match ctas.get_mut(&r.cta_id) {
            Some(cta) => {
                cta.add_cta_result(r);
                num_folded += 1;
            }
            None => {
                debug!(
                    "fold_results: result of {} for unknown CTA {}",
                    r.profile_eid, r.cta_id
                );
                unrouted.push(r);
            }
        }
    }
    if !unrouted.is_empty() {
        warn!(
            "fold_results: {} results refer to an unknown CTA",
            unrouted.len()
        );
    }
    info!(
        "fold_results: {} results folded into {} CTAs",
        num_folded,
        ctas.len()
    );
    unrouted
}
