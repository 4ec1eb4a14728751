use crate::report::*;

use std::collections::BTreeMap;

pub const DEFAULT_TITLE: &str = "Survey Tabulation";
pub const DEFAULT_GROUPING_COLUMN: &str = "District";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportTitle")]
    pub report_title: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    pub format: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourceSettings {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "databaseSheet")]
    _database_sheet: Option<String>,
    #[serde(rename = "keySheet")]
    _key_sheet: Option<String>,
    #[serde(rename = "keyMrqSheet")]
    _key_mrq_sheet: Option<String>,
}

impl DataSourceSettings {
    pub fn database_sheet(&self) -> String {
        self._database_sheet
            .clone()
            .unwrap_or_else(|| "Database".to_string())
    }

    pub fn key_sheet(&self) -> String {
        self._key_sheet.clone().unwrap_or_else(|| "Key".to_string())
    }

    pub fn key_mrq_sheet(&self) -> String {
        self._key_mrq_sheet
            .clone()
            .unwrap_or_else(|| "Key_MRQ".to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum DerivationKind {
    #[serde(rename = "ageClass")]
    AgeClass,
    #[serde(rename = "visitCap")]
    VisitCap,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Derivation {
    pub kind: DerivationKind,
    pub source: String,
    pub target: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(rename = "multiResponse", default)]
    pub multi_response: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSource", default)]
    pub data_source: DataSourceSettings,
    #[serde(rename = "groupingColumn")]
    _grouping_column: Option<String>,
    #[serde(rename = "derivations")]
    _derivations: Option<Vec<Derivation>>,
    #[serde(rename = "modules")]
    _modules: Option<Vec<ModuleConfig>>,
    pub users: Option<BTreeMap<String, String>>,
}

impl ReportConfig {
    pub fn report_title(&self) -> String {
        self.output_settings
            .report_title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    pub fn grouping_column(&self) -> String {
        self._grouping_column
            .clone()
            .unwrap_or_else(|| DEFAULT_GROUPING_COLUMN.to_string())
    }

    /// The derivations of the file, or the standard ones when the file does not list any.
    pub fn derivations(&self) -> Vec<Derivation> {
        self._derivations.clone().unwrap_or_else(default_derivations)
    }

    /// The modules of the file, or the standard catalogue.
    pub fn modules(&self) -> Vec<ModuleConfig> {
        self._modules.clone().unwrap_or_else(default_modules)
    }
}

pub fn parse_config(s: &str) -> ReportResult<ReportConfig> {
    serde_json::from_str(s).context(ParsingJsonSnafu {})
}

pub fn read_config(path: &str) -> ReportResult<ReportConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config = parse_config(&contents)?;
    info!("config: {:?}", config);
    Ok(config)
}

/// The output formats.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OutputFormat {
    Csv,
    Html,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> ReportResult<OutputFormat> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            _ => UnknownFormatSnafu { format: s }.fail(),
        }
    }
}

fn default_derivations() -> Vec<Derivation> {
    vec![
        Derivation {
            kind: DerivationKind::AgeClass,
            source: "cb4".to_string(),
            target: "cb4_class".to_string(),
        },
        Derivation {
            kind: DerivationKind::VisitCap,
            source: "AC2".to_string(),
            target: "AC2_new".to_string(),
        },
    ]
}

fn module(name: &str, variables: &[&str]) -> ModuleConfig {
    ModuleConfig {
        name: name.to_string(),
        variables: variables.iter().map(|s| s.to_string()).collect(),
        multi_response: false,
    }
}

fn default_modules() -> Vec<ModuleConfig> {
    vec![
        module(
            "Module : Basic Information",
            &["Cluster_Area", "MB3", "MB4", "MB5"],
        ),
        module("BACKGROUND MODULE: INFANT/CHILD", &["cb2", "cb4_class"]),
        module("MODULE 1: ANC", &["AC1", "AC2_new", "AC5", "AC7"]),
        module(
            "MODULE 2: IRON/IRON AND FOLIC ACID CONTAINING SUPPLEMENTS",
            &["IF1", "IF2"],
        ),
        module("MODULE 3: IFA BCI", &["BC1", "BC4", "BC40"]),
        module(
            "MODULE 4: SKILLED BIRTH ATTENDANCE & CARE POST-DELIVERY",
            &["SB1", "SB1_A1", "SB1_A2", "SB1_A3", "SB3", "SB4", "SB5"],
        ),
        module(
            "MODULE 5: BREAST FEEDING",
            &["BF1", "BF2", "BF4", "BF6", "BF8", "BF9"],
        ),
        module("MODULE 6: COUNSELLING IYCF", &["CL1"]),
        module(
            "MODULE 7: BENEFICIARY KNOWLEDGE – BREAST FEEDING",
            &["BKB1", "BKB2"],
        ),
        module(
            "MODULE 8: KANGAROO CARE",
            &["KC2", "KC3", "KC4", "KC5", "KC6", "KC8"],
        ),
        module("MODULE 9: WORK AND TIME USAGE QUESTIONS", &["WT1", "WT8"]),
        module(
            "MODULE 10: New Gender questions for endline",
            &[
                "GE1", "GE2", "GE3", "GE4", "GE5_A", "GE5_B", "GE5_C", "GE5_D", "GE5_E",
            ],
        ),
        ModuleConfig {
            name: "Analysis of Multi-Response Variables".to_string(),
            variables: vec![],
            multi_response: true,
        },
    ]
}

/// The configuration used without a configuration file: the standard survey layout.
pub fn default_config() -> ReportConfig {
    ReportConfig::default()
}
