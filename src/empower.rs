use log::{debug, info, warn};

use organizer_tree::builder::Builder;
use organizer_tree::cta::{fold_results, CallToAction};
use organizer_tree::quality::QualityTally;
use organizer_tree::traversal::{keep_all, walk, ChildOrder, TreeRow};
use organizer_tree::*;
use snafu::{prelude::*, Snafu};

use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use text_diff::print_diff;

use crate::args::Args;
use crate::empower::config_reader::*;
use crate::empower::io_common::simplify_file_name;
use crate::empower::io_csv::read_csv_profiles;
use crate::empower::io_json::read_json_export;
use crate::empower::io_xlsx::read_excel_profiles;
use crate::empower::report_csv::InterestSelection;

mod config_reader;
mod io_common;
mod io_csv;
mod io_json;
mod io_xlsx;
mod report_csv;
mod report_cta;
mod report_text;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EmpowerError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile { source: io::Error, path: String },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing a CSV record"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Error opening the Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("Error writing the report to {path}"))]
    WritingReport { source: io::Error, path: String },
    #[snafu(display("Unknown input type {input_type}: expected csv, xlsx or json"))]
    UnknownInputType { input_type: String },
    #[snafu(display(
        "Unknown report {report}: expected tree, tree-csv, unactivated, unmatched, activation, interest or quality"
    ))]
    UnknownReport { report: String },
    #[snafu(display(
        "The interest report needs --interest-cta, --interest-question and --interest"
    ))]
    MissingInterestSelection {},
    #[snafu(display("The call to action {cta_id} is not in the data"))]
    UnknownCta { cta_id: i64 },
    #[snafu(display("The report differs from the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type EmpowerResult<T> = Result<T, EmpowerError>;
pub type BEmpowerResult<T> = Result<T, Box<EmpowerError>>;

/// Everything read from the input files, before the tree is built.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Export {
    pub contacts: Vec<Contact>,
    pub ctas: BTreeMap<i64, CallToAction>,
    pub results: Vec<CtaResult>,
    pub regions: Vec<Region>,
}

impl Export {
    /// Takes the calls to action, their results and the regions of another
    /// export. Its profiles are ignored.
    fn merge_cta_data(&mut self, other: Export) {
        if !other.contacts.is_empty() {
            debug!(
                "merge_cta_data: ignoring {} profiles of the CTA data",
                other.contacts.len()
            );
        }
        for (id, cta) in other.ctas {
            if self.ctas.insert(id, cta).is_some() {
                warn!("merge_cta_data: CTA {} is defined twice", id);
            }
        }
        self.results.extend(other.results);
        self.regions.extend(other.regions);
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Xlsx,
    Json,
}

/// The input type, as given or as inferred from the extension of the input
/// file.
pub fn input_type(args: &Args) -> EmpowerResult<InputType> {
    let name = match &args.input_type {
        Some(t) => t.trim().to_lowercase(),
        None => Path::new(&args.infile)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default(),
    };
    match name.as_str() {
        "csv" => Ok(InputType::Csv),
        "xlsx" | "excel" => Ok(InputType::Xlsx),
        "json" => Ok(InputType::Json),
        "" => {
            whatever!(
                "Cannot infer the type of {}, please use --input-type",
                args.infile
            )
        }
        x => UnknownInputTypeSnafu { input_type: x }.fail(),
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ReportKind {
    Tree,
    TreeCsv,
    Unactivated,
    Unmatched,
    Activation,
    Interest,
    Quality,
}

impl ReportKind {
    pub fn parse(s: Option<&str>) -> EmpowerResult<ReportKind> {
        let name = s.map(|x| x.trim().to_lowercase()).unwrap_or_default();
        match name.as_str() {
            "" | "tree" => Ok(ReportKind::Tree),
            "tree-csv" => Ok(ReportKind::TreeCsv),
            "unactivated" => Ok(ReportKind::Unactivated),
            "unmatched" => Ok(ReportKind::Unmatched),
            "activation" => Ok(ReportKind::Activation),
            "interest" => Ok(ReportKind::Interest),
            "quality" => Ok(ReportKind::Quality),
            x => UnknownReportSnafu { report: x }.fail(),
        }
    }
}

/// The tree with its activation annotations, and the calls to action with
/// their folded results.
#[derive(Debug, Clone)]
pub struct Roster {
    pub tree: OrganizerTree,
    pub ctas: BTreeMap<i64, CallToAction>,
    /// The results that named an unknown call to action.
    pub num_unrouted: usize,
}

pub fn assemble(export: Export, scopes: &ActivationScopes) -> Roster {
    let mut builder = Builder::new();
    builder.add_profiles(export.contacts);
    let mut tree = builder.build();
    tree.assign_region_names(&export.regions);
    tree.record_responses(&export.results, scopes);
    let mut ctas = export.ctas;
    let unrouted = fold_results(&mut ctas, export.results);
    Roster {
        tree,
        ctas,
        num_unrouted: unrouted.len(),
    }
}

fn read_export(args: &Args) -> BEmpowerResult<Export> {
    let mut export = match input_type(args)? {
        InputType::Csv => Export {
            contacts: read_csv_profiles(&args.infile)?,
            ..Export::default()
        },
        InputType::Xlsx => Export {
            contacts: read_excel_profiles(&args.infile)?,
            ..Export::default()
        },
        InputType::Json => read_json_export(&args.infile)?,
    };
    if let Some(path) = &args.cta_data {
        export.merge_cta_data(read_json_export(path)?);
    }
    Ok(export)
}

fn compress_name(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

/// The organizers the reports start from: the roots, or the organizers
/// matching the name and id filters.
pub fn start_nodes(tree: &OrganizerTree, names: &[String], ids: &[String]) -> Vec<NodeId> {
    if names.is_empty() && ids.is_empty() {
        return tree.roots();
    }
    let names: Vec<String> = names.iter().map(|n| compress_name(n)).collect();
    let starts: Vec<NodeId> = tree
        .organizers()
        .filter(|o| {
            let c = &tree.get(*o).contact;
            names.contains(&compress_name(&c.full_name()))
                || ids
                    .iter()
                    .any(|i| i.trim() == c.eid || i.trim() == tree.contact_id(*o))
        })
        .collect();
    if starts.is_empty() {
        warn!(
            "start_nodes: no organizer matches the names {:?} or the ids {:?}",
            names, ids
        );
    }
    starts
}

fn interest_selection(args: &Args) -> EmpowerResult<InterestSelection> {
    Ok(InterestSelection {
        cta_id: args.interest_cta.context(MissingInterestSelectionSnafu)?,
        question: args
            .interest_question
            .clone()
            .context(MissingInterestSelectionSnafu)?,
        answer: args.interest.clone().context(MissingInterestSelectionSnafu)?,
    })
}

fn output_name(path: &Option<String>) -> String {
    match path.as_deref() {
        None | Some("") | Some("stdout") => "stdout".to_string(),
        Some(p) => p.to_string(),
    }
}

/// Writes the report into memory.
pub fn render_report(
    kind: ReportKind,
    roster: &Roster,
    args: &Args,
    config: &RunConfig,
    today: NaiveDate,
) -> BEmpowerResult<Vec<u8>> {
    let tree = &roster.tree;
    let starts = start_nodes(tree, &args.name, &args.id);
    let filtered = !args.name.is_empty() || !args.id.is_empty();
    let path = output_name(&args.outfile);
    let mut out: Vec<u8> = Vec::new();
    match kind {
        ReportKind::Tree => {
            let show_voters = args.verbose || filtered;
            report_text::write_header(&mut out, args.spanish, show_voters)
                .context(WritingReportSnafu { path: &path })?;
            for start in starts {
                report_text::write_tree(&mut out, tree, start, args.verbose, show_voters)
                    .context(WritingReportSnafu { path: &path })?;
            }
        }
        ReportKind::Quality => {
            let rules = config.quality_rules();
            let tally = if filtered {
                // Nested start organizers share contacts.
                let mut contacts: BTreeSet<NodeId> = BTreeSet::new();
                for start in starts {
                    for row in walk(tree, start, ChildOrder::Declared, true, &keep_all) {
                        if let TreeRow::Voters { organizer, .. } = row {
                            contacts.extend(tree.direct_contacts(organizer).iter().cloned());
                        }
                    }
                }
                QualityTally::from_contacts(contacts.iter().map(|v| &tree.get(*v).contact), &rules)
            } else {
                let contacts = tree
                    .nodes()
                    .filter(|(_, n)| !n.is_organizer())
                    .map(|(_, n)| &n.contact);
                QualityTally::from_contacts(contacts, &rules)
            };
            info!("render_report: data quality: {:?}", tally);
            report_text::write_quality_summary(
                &mut out,
                &simplify_file_name(&args.infile),
                &tally,
                args.spanish,
            )
            .context(WritingReportSnafu { path: &path })?;
        }
        _ => {
            let mut wtr = report_csv::csv_writer(&mut out);
            match kind {
                ReportKind::Unactivated => {
                    report_csv::write_unactivated(&mut wtr, tree, &starts, today)?
                }
                ReportKind::Unmatched => {
                    report_csv::write_unmatched(&mut wtr, tree, &starts, &config.quality_rules())?
                }
                ReportKind::Activation => {
                    let cutoff = args.login_cutoff.or(config.login_cutoff_days);
                    report_csv::write_activation(&mut wtr, tree, &starts, cutoff, today)?
                }
                ReportKind::Interest => {
                    let selection = interest_selection(args)?;
                    let cta = roster.ctas.get(&selection.cta_id).context(UnknownCtaSnafu {
                        cta_id: selection.cta_id,
                    })?;
                    report_csv::write_interest(&mut wtr, tree, &starts, cta, &selection)?
                }
                _ => report_csv::write_tree_csv(&mut wtr, tree, &starts)?,
            }
            wtr.flush().context(WritingReportSnafu { path: &path })?;
        }
    }
    Ok(out)
}

fn write_output(path: &Option<String>, bytes: &[u8]) -> BEmpowerResult<()> {
    let name = output_name(path);
    if name == "stdout" {
        io::stdout()
            .write_all(bytes)
            .context(WritingReportSnafu { path: name })?;
    } else {
        fs::write(&name, bytes).context(WritingReportSnafu { path: &name })?;
        info!("write_output: wrote {} bytes to {}", bytes.len(), name);
    }
    Ok(())
}

fn check_reference(path: &str, produced: &[u8]) -> BEmpowerResult<()> {
    let reference = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let produced = String::from_utf8_lossy(produced);
    if reference != produced {
        warn!("check_reference: found differences with the reference {}", path);
        print_diff(reference.as_str(), produced.as_ref(), "\n");
        return Err(Box::new(EmpowerError::ReferenceMismatch {
            path: path.to_string(),
        }));
    }
    info!("check_reference: the report matches {}", path);
    Ok(())
}

pub fn run(args: &Args) -> BEmpowerResult<()> {
    run_with_date(args, Utc::now().date_naive())
}

/// Runs with `today` as the date of the report.
pub fn run_with_date(args: &Args, today: NaiveDate) -> BEmpowerResult<()> {
    let kind = ReportKind::parse(args.report.as_deref())?;
    let config = match &args.config {
        Some(path) => read_run_config(path)?,
        None => RunConfig::default(),
    };

    let export = read_export(args)?;
    let scopes = config.activation_scopes(&export.regions);
    let roster = assemble(export, &scopes);
    info!(
        "run: {} nodes, {} roots, {} CTAs",
        roster.tree.len(),
        roster.tree.roots().len(),
        roster.ctas.len()
    );

    let report = render_report(kind, &roster, args, &config, today)?;
    write_output(&args.outfile, &report)?;

    if let Some(path) = &args.ctaoutfile {
        let mut cta_report: Vec<u8> = Vec::new();
        report_cta::write_cta_report(&mut cta_report, &roster.ctas, roster.num_unrouted)
            .context(WritingReportSnafu { path })?;
        write_output(&args.ctaoutfile, &cta_report)?;
    }

    if let Some(path) = &args.reference {
        check_reference(path, &report)?;
    }
    Ok(())
}
