// The CSV report variants.
//
// Every variant walks the trees below the start organizers, leaves out the
// rows of deleted organizers, and closes each block with a one-field
// separator row.

use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDate;
use csv::Writer;

use organizer_tree::cta::{answer_matches, CallToAction};
use organizer_tree::quality::{classify, DataQuality, Standing};
use organizer_tree::traversal::{is_deleted_row, keep_all, walk, ChildOrder, TreeRow};

use crate::empower::io_common::{
    days_since, format_days_since, format_mts, UNKNOWN_LOGIN, UNKNOWN_LOGIN_DAYS,
};
use crate::empower::*;

const SEPARATOR: [&str; 1] = [" "];

/// The question and answer selecting the contacts of the interest report.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct InterestSelection {
    pub cta_id: i64,
    pub question: String,
    pub answer: String,
}

pub fn csv_writer<W: Write>(w: W) -> Writer<W> {
    csv::WriterBuilder::new().flexible(true).from_writer(w)
}

fn write_row<W: Write, I, T>(wtr: &mut Writer<W>, row: I) -> EmpowerResult<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    wtr.write_record(row).context(CsvWriteSnafu {})
}

// The leading apostrophe keeps spreadsheets from reading the markers as a
// formula.
fn organizer_cell(c: &Contact, level: usize) -> String {
    format!("'{}{}", "-".repeat(level * DEPTH_STEP), c.first_name)
}

fn contact_cell(c: &Contact, level: usize, index: Option<usize>) -> String {
    let stars = "*".repeat(level * DEPTH_STEP);
    match index {
        Some(i) => format!("'{} {}. {}", stars, i, c.first_name),
        None => format!("'{}{}", stars, c.first_name),
    }
}

fn days_since_login(c: &Contact, today: NaiveDate) -> i64 {
    days_since(c.last_used_mts, today).unwrap_or(UNKNOWN_LOGIN_DAYS)
}

// Last login, days since login, created, days since created.
fn login_columns(c: &Contact, today: NaiveDate) -> [String; 4] {
    let last_login = match c.last_used_mts {
        Some(_) => format_mts(c.last_used_mts),
        None => UNKNOWN_LOGIN.to_string(),
    };
    [
        last_login,
        format_days_since(c.last_used_mts, today),
        format_mts(c.created_mts),
        format_days_since(c.created_mts, today),
    ]
}

fn rate_cell(tree: &OrganizerTree, id: NodeId, scope: ActivationScope) -> String {
    format!("{:.2}", tree.activation_rate(id, scope))
}

// The rows below `start`, without the rows of deleted organizers. The
// organizers and voters below a deleted organizer are kept.
fn visible_rows(
    tree: &OrganizerTree,
    start: NodeId,
    order: ChildOrder,
    include_voters: bool,
    prune: &dyn Fn(&OrganizerTree, NodeId) -> bool,
) -> Vec<TreeRow> {
    walk(tree, start, order, include_voters, prune)
        .into_iter()
        .filter(|row| !is_deleted_row(tree, row))
        .collect()
}

// Writes the rows of one block and the separator after it, unless the block
// is empty.
fn write_block<W: Write>(wtr: &mut Writer<W>, rows: Vec<Vec<String>>) -> EmpowerResult<()> {
    if rows.is_empty() {
        return Ok(());
    }
    for row in rows {
        write_row(wtr, row)?;
    }
    write_row(wtr, SEPARATOR)
}

/// `First Name, Last Name, EID, Phone` for every organizer, in declared
/// order.
pub fn write_tree_csv<W: Write>(
    wtr: &mut Writer<W>,
    tree: &OrganizerTree,
    starts: &[NodeId],
) -> EmpowerResult<()> {
    write_row(wtr, ["First Name", "Last Name", "EID", "Phone"])?;
    for start in starts {
        let rows: Vec<Vec<String>> = visible_rows(tree, *start, ChildOrder::Declared, false, &keep_all)
            .into_iter()
            .map(|row| {
                let c = &tree.get(row_node(&row)).contact;
                vec![
                    organizer_cell(c, row.level()),
                    c.last_name.clone(),
                    c.eid.clone(),
                    c.phone.clone(),
                ]
            })
            .collect();
        write_block(wtr, rows)?;
    }
    Ok(())
}

fn row_node(row: &TreeRow) -> NodeId {
    match row {
        TreeRow::Organizer { node, .. } => *node,
        TreeRow::Voters { organizer, .. } => *organizer,
    }
}

/// Organizers with their activation counts, each followed by its subtree
/// and then by its direct contacts that never answered a call to action.
pub fn write_unactivated<W: Write>(
    wtr: &mut Writer<W>,
    tree: &OrganizerTree,
    starts: &[NodeId],
    today: NaiveDate,
) -> EmpowerResult<()> {
    write_row(
        wtr,
        [
            "First Name",
            "Last Name",
            "EID",
            "VAN ID",
            "Phone",
            "Region",
            "Unactivated Contacts",
            "Active CTA Contacts",
            "Current CTA Contacts",
            "Direct Contacts",
            "Activation Rate",
            "Last Login",
            "Days Since Login",
            "Created",
            "Days Since Created",
        ],
    )?;
    for start in starts {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in visible_rows(tree, *start, ChildOrder::Declared, true, &keep_all) {
            match row {
                TreeRow::Organizer { node, level } => {
                    let c = &tree.get(node).contact;
                    let direct = tree.direct_contact_count(node);
                    let any = tree.activated_contact_count(node, ActivationScope::Any);
                    let mut cells = vec![
                        organizer_cell(c, level),
                        c.last_name.clone(),
                        c.eid.clone(),
                        c.van_id_or_empty().to_string(),
                        c.phone.clone(),
                        c.region_name.clone(),
                        (direct - any).to_string(),
                        tree.activated_contact_count(node, ActivationScope::Active)
                            .to_string(),
                        tree.activated_contact_count(node, ActivationScope::Current)
                            .to_string(),
                        direct.to_string(),
                        rate_cell(tree, node, ActivationScope::Any),
                    ];
                    cells.extend(login_columns(c, today));
                    rows.push(cells);
                }
                TreeRow::Voters { organizer, level } => {
                    let unactivated = tree
                        .direct_contacts(organizer)
                        .iter()
                        .filter(|v| !tree.get(**v).is_activated(ActivationScope::Any));
                    for (idx, v) in unactivated.enumerate() {
                        let c = &tree.get(*v).contact;
                        let mut cells = vec![
                            contact_cell(c, level, Some(idx + 1)),
                            c.last_name.clone(),
                            c.eid.clone(),
                            c.van_id_or_empty().to_string(),
                            c.phone.clone(),
                            c.region_name.clone(),
                        ];
                        cells.extend(std::iter::repeat(" ".to_string()).take(7));
                        cells.push(format_mts(c.created_mts));
                        cells.push(format_days_since(c.created_mts, today));
                        rows.push(cells);
                    }
                }
            }
        }
        write_block(wtr, rows)?;
    }
    Ok(())
}

/// Organizers with the VAN standing of their direct contacts, each followed
/// by its subtree and then by its clean contacts that have no VAN match.
pub fn write_unmatched<W: Write>(
    wtr: &mut Writer<W>,
    tree: &OrganizerTree,
    starts: &[NodeId],
    rules: &QualityRules,
) -> EmpowerResult<()> {
    write_row(
        wtr,
        [
            "First Name",
            "Last Name",
            "EID",
            "VAN ID",
            "Phone",
            "Unmatched Contacts",
            "Bad Data Contacts",
            "Matched Contacts",
            "Direct Contacts",
        ],
    )?;
    for start in starts {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in visible_rows(tree, *start, ChildOrder::Declared, true, &keep_all) {
            match row {
                TreeRow::Organizer { node, level } => {
                    let c = &tree.get(node).contact;
                    let mut standings: HashMap<Standing, usize> = HashMap::new();
                    for v in tree.direct_contacts(node) {
                        let standing = classify(&tree.get(*v).contact, rules).standing();
                        *standings.entry(standing).or_insert(0) += 1;
                    }
                    let count = |s: Standing| standings.get(&s).cloned().unwrap_or(0).to_string();
                    rows.push(vec![
                        organizer_cell(c, level),
                        c.last_name.clone(),
                        c.eid.clone(),
                        c.van_id_or_empty().to_string(),
                        c.phone.clone(),
                        count(Standing::Unmatched),
                        count(Standing::BadData),
                        count(Standing::Matched),
                        tree.direct_contact_count(node).to_string(),
                    ]);
                }
                TreeRow::Voters { organizer, level } => {
                    let unmatched = tree
                        .direct_contacts(organizer)
                        .iter()
                        .filter(|v| classify(&tree.get(**v).contact, rules) == DataQuality::Clean);
                    for (idx, v) in unmatched.enumerate() {
                        let c = &tree.get(*v).contact;
                        rows.push(vec![
                            contact_cell(c, level, Some(idx + 1)),
                            c.last_name.clone(),
                            c.eid.clone(),
                            c.van_id_or_empty().to_string(),
                            c.phone.clone(),
                            " ".to_string(),
                            " ".to_string(),
                            " ".to_string(),
                        ]);
                    }
                }
            }
        }
        write_block(wtr, rows)?;
    }
    Ok(())
}

/// Organizers by descending activation over any call to action.
///
/// With a cutoff, organizers that have not logged in for more than that many
/// days are left out, together with the organizers below them.
pub fn write_activation<W: Write>(
    wtr: &mut Writer<W>,
    tree: &OrganizerTree,
    starts: &[NodeId],
    login_cutoff: Option<u64>,
    today: NaiveDate,
) -> EmpowerResult<()> {
    write_row(
        wtr,
        [
            "First Name",
            "Last Name",
            "EID",
            "Phone",
            "Region",
            "Activated Contacts",
            "Direct Contacts",
            "Activation Rate",
            "Last Login",
            "Days Since Login",
            "Created",
            "Days Since Created",
        ],
    )?;
    let prune = |t: &OrganizerTree, id: NodeId| -> bool {
        match login_cutoff {
            Some(cutoff) => days_since_login(&t.get(id).contact, today) > cutoff as i64,
            None => false,
        }
    };
    let order = ChildOrder::ByRate(ActivationScope::Any);
    for start in starts {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in visible_rows(tree, *start, order, false, &prune) {
            let node = row_node(&row);
            let c = &tree.get(node).contact;
            let mut cells = vec![
                organizer_cell(c, row.level()),
                c.last_name.clone(),
                c.eid.clone(),
                c.phone.clone(),
                c.region_name.clone(),
                tree.activated_contact_count(node, ActivationScope::Any)
                    .to_string(),
                tree.direct_contact_count(node).to_string(),
                rate_cell(tree, node, ActivationScope::Any),
            ];
            cells.extend(login_columns(c, today));
            rows.push(cells);
        }
        write_block(wtr, rows)?;
    }
    Ok(())
}

/// For every organizer with direct contacts whose answer to the selected
/// question matches the selected answer: the chain of organizers from the
/// root, then those contacts.
pub fn write_interest<W: Write>(
    wtr: &mut Writer<W>,
    tree: &OrganizerTree,
    starts: &[NodeId],
    cta: &CallToAction,
    selection: &InterestSelection,
) -> EmpowerResult<()> {
    let mut by_organizer: HashMap<NodeId, Vec<(NodeId, &CtaResult, &str)>> = HashMap::new();
    for r in cta.results() {
        let answer = match r.answers.get(&selection.question) {
            Some(Some(a)) => a.as_str(),
            _ => continue,
        };
        if !answer_matches(answer, &selection.answer) {
            continue;
        }
        let node = match tree.find(&r.profile_eid) {
            Some(n) if !tree.get(n).is_organizer() => n,
            _ => continue,
        };
        if let Some(organizer) = tree.parent(node) {
            by_organizer
                .entry(organizer)
                .or_default()
                .push((node, r, answer));
        }
    }
    debug!(
        "write_interest: {} organizers with matching contacts",
        by_organizer.len()
    );

    write_row(
        wtr,
        [
            "First Name",
            "Last Name",
            "EID",
            "Phone",
            "Interest",
            "Contacted",
            "Notes",
        ],
    )?;
    for start in starts {
        for row in visible_rows(tree, *start, ChildOrder::Declared, false, &keep_all) {
            let node = row_node(&row);
            let contacts = match by_organizer.get(&node) {
                Some(cs) => cs,
                None => continue,
            };
            let mut chain: Vec<NodeId> = tree
                .ancestors(node)
                .into_iter()
                .filter(|o| !tree.get(*o).contact.role.is_deleted())
                .collect();
            chain.reverse();
            chain.push(node);
            let mut rows: Vec<Vec<String>> = Vec::new();
            for (level, o) in chain.iter().enumerate() {
                let c = &tree.get(*o).contact;
                rows.push(vec![
                    organizer_cell(c, level),
                    c.last_name.clone(),
                    c.eid.clone(),
                    c.phone.clone(),
                    " ".to_string(),
                    " ".to_string(),
                    " ".to_string(),
                ]);
            }
            for (v, r, answer) in contacts {
                let c = &tree.get(*v).contact;
                rows.push(vec![
                    contact_cell(c, chain.len(), None),
                    c.last_name.clone(),
                    c.eid.clone(),
                    c.phone.clone(),
                    answer.to_string(),
                    format_mts(r.contacted_mts),
                    r.notes.clone(),
                ]);
            }
            write_block(wtr, rows)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use organizer_tree::builder::Builder;
    use organizer_tree::cta::Question;

    const DAY_MS: i64 = 86_400_000;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, 31).unwrap()
    }

    fn today_mts() -> i64 {
        io_common::iso_date_to_mts("2021-03-31").unwrap()
    }

    fn profile(eid: &str, role: Role, parent: &str, first: &str) -> Contact {
        let mut c = Contact::new(eid, role);
        if !parent.is_empty() {
            c.parent_eid = Some(parent.to_string());
        }
        c.first_name = first.to_string();
        c.last_name = "Lopez".to_string();
        c.phone = "(608) 555-0100".to_string();
        c
    }

    fn result(eid: &str, cta_id: i64, answer: Option<&str>) -> CtaResult {
        let mut answers = HashMap::new();
        answers.insert("1".to_string(), answer.map(|s| s.to_string()));
        CtaResult {
            profile_eid: eid.to_string(),
            cta_id,
            contacted_mts: Some(today_mts()),
            answers,
            notes: "call back".to_string(),
        }
    }

    // root -> (busy -> (gone), idle), gone is deleted.
    fn sample() -> OrganizerTree {
        let mut root = profile("org-1-1", Role::Organizer, "", "Root");
        root.last_used_mts = Some(today_mts() - 2 * DAY_MS);
        let mut busy = profile("org-1-2", Role::Organizer, "org-1-1", "Busy");
        busy.last_used_mts = Some(today_mts() - 40 * DAY_MS);
        let idle = profile("org-1-3", Role::Organizer, "org-1-1", "Idle");
        let gone = profile("org-1-4", Role::Deleted, "org-1-2", "Gone");
        let mut matched = profile("a", Role::Contact, "org-1-2", "Ana");
        matched.van_id = Some("42".to_string());
        let mut b = Builder::new();
        b.add_profiles(vec![
            root,
            busy,
            idle,
            gone,
            matched,
            profile("b", Role::Contact, "org-1-2", "Bea"),
            profile("c", Role::Contact, "org-1-2", "Mr"),
            profile("d", Role::Contact, "org-1-3", "Dan"),
            profile("e", Role::Contact, "org-1-4", "Eve"),
        ]);
        let mut t = b.build();
        t.record_responses(&[result("b", 1, Some("Yes"))], &ActivationScopes::default());
        t
    }

    fn render(f: impl FnOnce(&mut Writer<&mut Vec<u8>>, &OrganizerTree, &[NodeId])) -> Vec<String> {
        let t = sample();
        let starts = t.roots();
        let mut out: Vec<u8> = Vec::new();
        {
            let mut wtr = csv_writer(&mut out);
            f(&mut wtr, &t, &starts);
            wtr.flush().unwrap();
        }
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn tree_csv_skips_deleted_organizers() {
        let lines = render(|w, t, s| write_tree_csv(w, t, s).unwrap());
        assert_eq!(
            lines,
            vec![
                "First Name,Last Name,EID,Phone",
                "'Root,Lopez,org-1-1,(608) 555-0100",
                "'---Busy,Lopez,org-1-2,(608) 555-0100",
                "'---Idle,Lopez,org-1-3,(608) 555-0100",
                " ",
            ]
        );
    }

    #[test]
    fn unactivated_lists_silent_contacts() {
        let lines = render(|w, t, s| write_unactivated(w, t, s, today()).unwrap());
        assert_eq!(lines.len(), 1 + 3 + 3 + 1 + 1);
        assert_eq!(
            lines[1],
            "'Root,Lopez,org-1-1,,(608) 555-0100,,0,0,0,0,0.00,2021-03-29,2 days,,"
        );
        assert_eq!(
            lines[2],
            "'---Busy,Lopez,org-1-2,,(608) 555-0100,,2,1,0,3,0.33,2021-02-19,40 days,,"
        );
        // The deleted organizer has no row, its contact stays at its level.
        assert!(lines[3].starts_with("'********* 1. Eve,Lopez,e,,"));
        assert!(lines[4].starts_with("'****** 1. Ana,Lopez,a,42,"));
        assert!(lines[5].starts_with("'****** 2. Mr,Lopez,c,,"));
        assert_eq!(
            lines[6],
            "'---Idle,Lopez,org-1-3,,(608) 555-0100,,1,0,0,1,0.00,Unknown/Never,,,"
        );
        assert!(lines[7].starts_with("'****** 1. Dan,"));
        assert_eq!(lines[8], " ");
    }

    #[test]
    fn unmatched_counts_standings() {
        let lines = render(|w, t, s| write_unmatched(w, t, s, &QualityRules::default()).unwrap());
        // Ana is matched, Bea is clean and unmatched, "Mr" is bad data.
        assert_eq!(lines[2], "'---Busy,Lopez,org-1-2,,(608) 555-0100,1,1,1,3");
        assert!(lines[3].starts_with("'********* 1. Eve,"));
        assert_eq!(lines[4], "'****** 1. Bea,Lopez,b,,(608) 555-0100, , , ");
        assert_eq!(lines[5], "'---Idle,Lopez,org-1-3,,(608) 555-0100,1,0,0,1");
        assert!(lines[6].starts_with("'****** 1. Dan,"));
    }

    #[test]
    fn activation_applies_the_login_cutoff() {
        let all = render(|w, t, s| write_activation(w, t, s, None, today()).unwrap());
        assert_eq!(all.len(), 5);
        // Busy has the best rate.
        assert!(all[2].starts_with("'---Busy,"));
        assert!(all[3].starts_with("'---Idle,"));

        let recent = render(|w, t, s| write_activation(w, t, s, Some(30), today()).unwrap());
        assert_eq!(recent.len(), 3);
        assert!(recent[1].starts_with("'Root,"));
        assert_eq!(recent[2], " ");
    }

    #[test]
    fn interest_lists_the_chain_and_the_contacts() {
        let labels = vec!["Yes".to_string(), "No".to_string()];
        let mut cta = CallToAction::new(1, "Volunteer");
        cta.add_question(Question::new("1", "Can you help?", "choice", &labels));
        cta.add_cta_result(result("b", 1, Some("yes!")));
        cta.add_cta_result(result("d", 1, Some("No")));
        cta.add_cta_result(result("e", 1, Some("Yes")));
        let selection = InterestSelection {
            cta_id: 1,
            question: "1".to_string(),
            answer: "Yes".to_string(),
        };
        let lines = render(|w, t, s| write_interest(w, t, s, &cta, &selection).unwrap());
        assert_eq!(
            lines,
            vec![
                "First Name,Last Name,EID,Phone,Interest,Contacted,Notes",
                "'Root,Lopez,org-1-1,(608) 555-0100, , , ",
                "'---Busy,Lopez,org-1-2,(608) 555-0100, , , ",
                "'******Bea,Lopez,b,(608) 555-0100,yes!,2021-03-31,call back",
                " ",
            ]
        );
    }

    #[test]
    fn deleted_organizers_only_leave_the_csv_reports() {
        let t = sample();
        let starts = t.roots();
        let mut text: Vec<u8> = Vec::new();
        for s in starts.iter() {
            report_text::write_tree(&mut text, &t, *s, false, false).unwrap();
        }
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("Gone Lopez (4)"));

        let mut out: Vec<u8> = Vec::new();
        {
            let mut wtr = csv_writer(&mut out);
            write_tree_csv(&mut wtr, &t, &starts).unwrap();
            wtr.flush().unwrap();
        }
        let csv_text = String::from_utf8(out).unwrap();
        assert!(!csv_text.contains("Gone"));
        assert!(!csv_text.contains("org-1-4"));
    }

    #[test]
    fn organizers_below_a_deleted_one_stay_in_the_reports() {
        let mut b = Builder::new();
        b.add_profiles(vec![
            profile("org-1-1", Role::Organizer, "", "Root"),
            profile("org-1-5", Role::Deleted, "org-1-1", "Gone"),
            profile("org-1-6", Role::Organizer, "org-1-5", "Alive"),
            profile("f", Role::Contact, "org-1-6", "Flor"),
        ]);
        let t = b.build();
        let starts = t.roots();
        let mut out: Vec<u8> = Vec::new();
        {
            let mut wtr = csv_writer(&mut out);
            write_unactivated(&mut wtr, &t, &starts, today()).unwrap();
            wtr.flush().unwrap();
        }
        let lines: Vec<String> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("'Root,"));
        assert!(lines[2].starts_with("'------Alive,Lopez,org-1-6,"));
        assert!(lines[3].starts_with("'********* 1. Flor,Lopez,f,"));
        assert_eq!(lines[4], " ");

        let mut out: Vec<u8> = Vec::new();
        {
            let mut wtr = csv_writer(&mut out);
            write_tree_csv(&mut wtr, &t, &starts).unwrap();
            wtr.flush().unwrap();
        }
        let csv_text = String::from_utf8(out).unwrap();
        assert!(csv_text.contains("'------Alive"));
        assert!(!csv_text.contains("Gone"));
    }
}
