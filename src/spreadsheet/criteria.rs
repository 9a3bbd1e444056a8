use glob::Pattern;

/// Criteria for selecting the sheet to read from a workbook.
#[derive(Clone, Debug)]
pub(crate) struct Criteria {
    /// Sheet name as given; always matches itself
    pub(crate) sheet_name: String,
    /// Glob reading of the name, absent when it is not a valid pattern
    pub(crate) sheet_name_pattern: Option<Pattern>,
}

impl Criteria {
    /// Selects the sheet named `sheet_name`, or the sheets its glob reading matches.
    pub(crate) fn new(sheet_name: &str) -> Self {
        Criteria {
            sheet_name: sheet_name.to_owned(),
            sheet_name_pattern: Pattern::new(sheet_name).ok(),
        }
    }

    /// Checks if a sheet name is the requested name or matches its pattern.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        self.sheet_name == sheet_name
            || self.sheet_name_pattern.as_ref().map(|pattern| pattern.matches(sheet_name)).unwrap_or(false)
    }
}
