//! Built-in language extractors.
//!
//! Each language implements the `SymbolExtractor` trait and is listed here.

pub mod python;
pub mod typescript;

use crate::extractor::SymbolExtractor;

/// Returns the built-in extractors, in registration order.
pub fn default_extractors() -> Vec<Box<dyn SymbolExtractor>> {
    vec![
        Box::new(typescript::TypeScriptExtractor::new()),
        Box::new(python::PythonExtractor::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_ins_cover_both_languages() {
        let names: Vec<String> = default_extractors()
            .iter()
            .map(|e| e.language_name().to_string())
            .collect();
        assert_eq!(names, vec!["typescript", "python"]);
    }
}
