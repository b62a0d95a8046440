//! Target path normalization.

use crate::config::ExtensionConfig;
use crate::ports::filesystem::{has_extension, is_directory_shaped, normalize_relative};
use crate::ports::WriteTargetError;

/// Chooses an extension for a path that has none.
pub trait ExtensionPolicy: Send + Sync {
    /// Extension, including the leading dot, for the extensionless `path`.
    fn infer_extension(&self, path: &str) -> &str;
}

/// Picks an extension from keywords in the lowercased path.
///
/// Checked in order, first match wins: `controller`, `model`, `service`
/// give the source extension; `view` or `page` the template extension;
/// `script` the script extension; `style` the stylesheet extension.
/// Anything else gets the source extension.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtensionPolicy {
    extensions: ExtensionConfig,
}

impl KeywordExtensionPolicy {
    /// Creates a policy using the given extension set.
    #[must_use]
    pub fn new(extensions: ExtensionConfig) -> Self {
        Self { extensions }
    }
}

impl ExtensionPolicy for KeywordExtensionPolicy {
    fn infer_extension(&self, path: &str) -> &str {
        let lower = path.to_lowercase();
        let has = |keyword: &str| lower.contains(keyword);
        let ext = &self.extensions;
        if has("controller") || has("model") || has("service") {
            &ext.source
        } else if has("view") || has("page") {
            &ext.template
        } else if has("script") {
            &ext.script
        } else if has("style") {
            &ext.stylesheet
        } else {
            &ext.source
        }
    }
}

/// Normalizes a planned or generated target path.
///
/// Keeps an existing extension; otherwise appends the one `policy` infers.
///
/// # Errors
///
/// Returns [`WriteTargetError::Blank`] for a blank path and
/// [`WriteTargetError::DirectoryShaped`] for a path ending in a separator,
/// which cannot be given an extension.
pub fn normalize_target(path: &str, policy: &dyn ExtensionPolicy) -> Result<String, WriteTargetError> {
    if path.trim().is_empty() {
        return Err(WriteTargetError::Blank);
    }
    if is_directory_shaped(path) {
        return Err(WriteTargetError::DirectoryShaped(path.trim().to_string()));
    }
    let normalized = normalize_relative(path);
    if has_extension(&normalized) {
        return Ok(normalized);
    }
    let ext = policy.infer_extension(&normalized);
    Ok(format!("{normalized}{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(path: &str) -> Result<String, WriteTargetError> {
        normalize_target(path, &KeywordExtensionPolicy::default())
    }

    #[test]
    fn infers_extension_from_keywords() {
        assert_eq!(normalize("Services/Foo").unwrap(), "Services/Foo.cs");
        assert_eq!(normalize("Views/Index").unwrap(), "Views/Index.cshtml");
        assert_eq!(normalize("styles/app").unwrap(), "styles/app.css");
        assert_eq!(normalize("wwwroot/scripts/site").unwrap(), "wwwroot/scripts/site.js");
        assert_eq!(normalize("Pages/Privacy").unwrap(), "Pages/Privacy.cshtml");
        assert_eq!(normalize("Program").unwrap(), "Program.cs");
    }

    #[test]
    fn first_keyword_wins() {
        // "controller" is checked before "view".
        assert_eq!(normalize("Views/ControllerHelpers").unwrap(), "Views/ControllerHelpers.cs");
        // "page" is checked before "style".
        assert_eq!(normalize("stylepages/main").unwrap(), "stylepages/main.cshtml");
    }

    #[test]
    fn keeps_existing_extension() {
        assert_eq!(normalize("./Models/Food.cs").unwrap(), "Models/Food.cs");
        assert_eq!(normalize(" views\\site.css ").unwrap(), "views/site.css");
    }

    #[test]
    fn rejects_blank_and_directory_paths() {
        assert_eq!(normalize("  "), Err(WriteTargetError::Blank));
        assert_eq!(normalize("Models/"), Err(WriteTargetError::DirectoryShaped("Models/".into())));
    }

    #[test]
    fn custom_extension_set() {
        let policy = KeywordExtensionPolicy::new(ExtensionConfig {
            source: ".rs".into(),
            ..ExtensionConfig::default()
        });
        assert_eq!(normalize_target("src/model", &policy).unwrap(), "src/model.rs");
    }
}
