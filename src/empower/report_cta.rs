// The call-to-action results report.

use std::collections::BTreeMap;
use std::io::{self, Write};

use organizer_tree::cta::CallToAction;

const WORDS_PER_LINE: usize = 10;

fn wrap_words(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(WORDS_PER_LINE)
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Writes every CTA with its questions and the folded answers.
///
/// `num_unrouted` is the number of results that named an unknown CTA.
pub fn write_cta_report<W: Write>(
    w: &mut W,
    ctas: &BTreeMap<i64, CallToAction>,
    num_unrouted: usize,
) -> io::Result<()> {
    for cta in ctas.values() {
        writeln!(w, "CTA Id: {}", cta.id)?;
        writeln!(w, "CTA name: {}", cta.name)?;
        for q in cta.questions() {
            let lines = wrap_words(&q.text);
            let indent = " ".repeat("    Question ".len() + q.key.len() + 2);
            match lines.split_first() {
                None => writeln!(w, "    Question {}:", q.key)?,
                Some((first, rest)) => {
                    writeln!(w, "    Question {}: {}", q.key, first)?;
                    for l in rest {
                        writeln!(w, "{}{}", indent, l)?;
                    }
                }
            }
        }
        writeln!(w, "Respondent count: {}", cta.num_cta_results())?;
        for q in cta.questions() {
            writeln!(w, "Question {}: responses {}", q.key, q.num_answers())?;
            for o in q.options() {
                writeln!(w, "    {}: {}", o.label, o.count)?;
            }
            writeln!(w, "    Null or empty: {}", q.null_answers())?;
            writeln!(w)?;
        }
        writeln!(w)?;
    }
    if num_unrouted > 0 {
        writeln!(w, "Results for unknown CTAs: {}", num_unrouted)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use organizer_tree::cta::Question;
    use organizer_tree::CtaResult;
    use std::collections::HashMap;

    fn result(answer: Option<&str>) -> CtaResult {
        let mut answers = HashMap::new();
        answers.insert("1".to_string(), answer.map(|s| s.to_string()));
        CtaResult {
            profile_eid: "v".to_string(),
            cta_id: 3,
            contacted_mts: None,
            answers,
            notes: String::new(),
        }
    }

    #[test]
    fn long_questions_wrap() {
        let text = "one two three four five six seven eight nine ten eleven";
        assert_eq!(
            wrap_words(text),
            vec![
                "one two three four five six seven eight nine ten".to_string(),
                "eleven".to_string()
            ]
        );
        assert!(wrap_words("   ").is_empty());
    }

    #[test]
    fn cta_block() {
        let labels = vec!["Yes".to_string(), "No".to_string()];
        let mut cta = CallToAction::new(3, "Door knock");
        cta.add_question(Question::new("1", "Will you vote?", "choice", &labels));
        for a in [Some("Yes/Si"), Some("  yes "), Some("Nope"), None] {
            cta.add_cta_result(result(a));
        }
        let mut ctas = BTreeMap::new();
        ctas.insert(3, cta);

        let mut out: Vec<u8> = Vec::new();
        write_cta_report(&mut out, &ctas, 2).unwrap();
        let s = String::from_utf8(out).unwrap();
        let expected = "\
CTA Id: 3
CTA name: Door knock
    Question 1: Will you vote?
Respondent count: 4
Question 1: responses 3
    Yes: 2
    No: 0
    Nope: 1
    Null or empty: 1


Results for unknown CTAs: 2
";
        assert_eq!(s, expected);
    }
}
