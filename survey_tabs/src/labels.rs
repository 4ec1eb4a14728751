use std::collections::HashMap;

/// The human-readable titles of the variables.
///
/// Two dictionaries are consulted in order: the labels of the multi-response questions and
/// options, then the general labels. A code found in neither is its own label.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct LabelBook {
    multi_response: HashMap<String, String>,
    general: HashMap<String, String>,
}

impl LabelBook {
    pub fn new(general: HashMap<String, String>, multi_response: HashMap<String, String>) -> Self {
        LabelBook {
            multi_response,
            general,
        }
    }

    /// Builds the dictionaries from (code, label) pairs. For repeated codes, the last pair wins.
    pub fn from_pairs(general: &[(String, String)], multi_response: &[(String, String)]) -> Self {
        LabelBook::new(
            general.iter().cloned().collect(),
            multi_response.iter().cloned().collect(),
        )
    }

    /// Resolves a variable code to its label. Never fails.
    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        self.multi_response
            .get(code)
            .or_else(|| self.general.get(code))
            .map(|s| s.as_str())
            .unwrap_or(code)
    }

    pub fn has_multi_response_labels(&self) -> bool {
        !self.multi_response.is_empty()
    }

    pub fn general_len(&self) -> usize {
        self.general.len()
    }
}
