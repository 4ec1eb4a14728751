use clap::Parser;

/// This is a survey tabulation program: it cross-tabulates the answers of a survey by district.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the report: data source, derivations,
    /// modules and allowed users. Without it, the standard survey layout is used.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The Excel workbook with the survey data. Setting this option overrides the path
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (module name or number, repeatable) The modules to tabulate. All the modules by default.
    #[clap(short, long, value_parser)]
    pub module: Vec<String>,

    /// (district name, repeatable) Restricts the tables to these districts. All the districts
    /// by default.
    #[clap(short, long, value_parser)]
    pub district: Vec<String>,

    /// (directory, 'stdout' or empty) Where the outputs are written. Setting this option overrides
    /// the directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (csv, html or json; default csv) The output format.
    #[clap(long, value_parser)]
    pub format: Option<String>,

    /// (directory) A directory of expected CSV exports. If provided, svtab checks that every
    /// produced table matches the file of the same name.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// The user name, when the configuration restricts the access.
    #[clap(short, long, value_parser)]
    pub user: Option<String>,

    /// The password of the user.
    #[clap(long, value_parser)]
    pub password: Option<String>,

    // Other arguments
    /// Lists the modules and exits.
    #[clap(long, takes_value = false)]
    pub list_modules: bool,

    /// Reads commands from the standard input: select modules and districts, reload the data.
    #[clap(long, takes_value = false)]
    pub interactive: bool,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
