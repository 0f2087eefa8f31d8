//! Filename normalization.
//!
//! Matching compares only lower-case ASCII letters, digits and dots, so
//! `Report_Final.TXT`, `report-final.txt` and `reportfinal.txt` are all the
//! same to the search engine.

/// Reduce a filename or path to its canonical comparable form.
///
/// Lower-cases the input, then drops everything that is not an ASCII letter,
/// an ASCII digit or a literal `.`.
pub fn normalize(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.')
        .collect()
}
