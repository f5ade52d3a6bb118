// Translation seam. Catalog lookup belongs to the host; the core only needs `t`.

use std::collections::HashMap;

pub trait Translator {
    /// Translate `key`, substituting `{{name}}` placeholders from `interpolations`.
    fn t(&self, key: &str, interpolations: &[(&str, &str)]) -> String;
}

/// Interpolate `{{name}}` placeholders. Unknown placeholders are left as-is.
pub fn interpolate(template: &str, interpolations: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in interpolations {
        out = out.replace(&format!("{{{{{}}}}}", name), value);
    }
    out
}

/// Returns the key itself (the English source string) with placeholders filled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

impl Translator for PassthroughTranslator {
    fn t(&self, key: &str, interpolations: &[(&str, &str)]) -> String {
        interpolate(key, interpolations)
    }
}

/// In-memory catalog, falling back to the key for missing entries.
#[derive(Debug, Clone, Default)]
pub struct CatalogTranslator {
    entries: HashMap<String, String>,
}

impl CatalogTranslator {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl Translator for CatalogTranslator {
    fn t(&self, key: &str, interpolations: &[(&str, &str)]) -> String {
        let template = self.entries.get(key).map(String::as_str).unwrap_or(key);
        interpolate(template, interpolations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_interpolates_placeholders() {
        let t = PassthroughTranslator;
        assert_eq!(
            t.t("Patient invite for {{name}} has been accepted.", &[("name", "Jill Jellyfish")]),
            "Patient invite for Jill Jellyfish has been accepted."
        );
        assert_eq!(t.t("{{missing}} stays", &[]), "{{missing}} stays");
    }

    #[test]
    fn catalog_falls_back_to_key() {
        let mut entries = HashMap::new();
        entries.insert("Review".to_string(), "Revisar".to_string());
        let t = CatalogTranslator::new(entries);
        assert_eq!(t.t("Review", &[]), "Revisar");
        assert_eq!(t.t("Back", &[]), "Back");
    }
}
