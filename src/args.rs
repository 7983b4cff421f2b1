use clap::Parser;

/// This program builds the organizer tree of a CRM roster export and writes activation and
/// data-quality reports.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The roster export: CSV, Excel (.xlsx) or JSON.
    #[clap(short, long, value_parser)]
    pub infile: String,

    /// (file path, 'stdout' or empty) Where the report is written. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub outfile: Option<String>,

    /// (file path or empty) If specified, the results of the calls to action are written to this
    /// location.
    #[clap(long, value_parser)]
    pub ctaoutfile: Option<String>,

    /// (csv, xlsx or json) The type of the input. By default, it is inferred from the extension
    /// of the input file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path, optional) A JSON export providing the calls to action, their results and the
    /// regions, when the roster itself is a CSV or Excel file.
    #[clap(long, value_parser)]
    pub cta_data: Option<String>,

    /// (default tree) The report to write: tree, tree-csv, unactivated, unmatched, activation,
    /// interest or quality.
    #[clap(long, value_parser)]
    pub report: Option<String>,

    /// (file path, optional) A JSON file with the activation scopes, the login cutoff and the
    /// data-quality stoplists.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (organizer name, repeatable) Start the report at the organizers with this name instead of
    /// the roots.
    #[clap(short, long, value_parser)]
    pub name: Vec<String>,

    /// (organizer id, repeatable) Start the report at the organizers with this EID or contact id.
    #[clap(long, value_parser)]
    pub id: Vec<String>,

    /// (days) The activation report leaves out the organizers who did not log in for longer than
    /// this.
    #[clap(long, value_parser)]
    pub login_cutoff: Option<u64>,

    /// (CTA id) The call to action of the interest report.
    #[clap(long, value_parser)]
    pub interest_cta: Option<i64>,

    /// (question key) The question of the interest report.
    #[clap(long, value_parser)]
    pub interest_question: Option<String>,

    /// (answer) The answer of the interest report.
    #[clap(long, value_parser)]
    pub interest: Option<String>,

    /// (file path) A reference report. If provided, the report is compared with it and the
    /// program fails when they differ.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, the headers of the text reports are written in Spanish.
    #[clap(short, long, takes_value = false)]
    pub spanish: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging and add the ancestors and the
    /// contacts to the tree report.
    #[clap(short, long, takes_value = false)]
    pub verbose: bool,
}
