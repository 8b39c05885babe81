//! Code synthesizer: template text plus model shape in, unit source out.
//!
//! A template becomes one unit holding one module, one type and one
//! `Interpolate` function whose body returns the template as an
//! interpolated string:
//!
//! ```text
//! #![edition = 1]
//! use std;
//!
//! module Stencil_greeting {
//!     type Stencil_greetingTemplateGenerator {
//!         fn Interpolate(model: app::Person) -> string {
//!             return $"hello {model.Name}";
//!         }
//!     }
//! }
//! ```
//!
//! Synthesis is pure: the same inputs always produce the same text.

use std::fmt::Write as _;

use stencil_compiler::LanguageVersion;
use stencil_core::ModelShape;

use crate::error::SynthesisError;

/// Name of the generated function every template is rendered through.
pub const ENTRY_POINT: &str = "Interpolate";

const MODULE_PREFIX: &str = "Stencil_";
const TYPE_SUFFIX: &str = "TemplateGenerator";

/// A unit ready for the toolchain.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedUnit {
    pub template_id: String,
    pub module_name: String,
    pub type_name: String,
    pub source: String,
    /// Shape of the entry point's parameter.
    pub model: ModelShape,
}

impl SynthesizedUnit {
    /// `module::Type`, the name the generated type is looked up by.
    pub fn qualified_type_name(&self) -> String {
        format!("{}::{}", self.module_name, self.type_name)
    }
}

/// Module name for a template id.
///
/// ASCII letters and digits are kept, a few common separators get two-letter
/// codes, and anything else is written as its hex code point, so distinct
/// ids always produce distinct names.
pub fn module_name(template_id: &str) -> Result<String, SynthesisError> {
    if template_id.is_empty() {
        return Err(SynthesisError::EmptyTemplateId);
    }
    let mut name = String::with_capacity(MODULE_PREFIX.len() + template_id.len() * 2);
    name.push_str(MODULE_PREFIX);
    for c in template_id.chars() {
        match c {
            c if c.is_ascii_alphanumeric() => name.push(c),
            '/' => name.push_str("__"),
            '.' => name.push_str("_d"),
            '\\' => name.push_str("_b"),
            '_' => name.push_str("_u"),
            '-' => name.push_str("_h"),
            other => {
                let _ = write!(name, "_x{:X}_", other as u32);
            }
        }
    }
    Ok(name)
}

/// Recover the template id from a generated module name.
pub fn template_id_from_module_name(module_name: &str) -> Option<String> {
    let encoded = module_name.strip_prefix(MODULE_PREFIX)?;
    let mut id = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        if c != '_' {
            id.push(c);
            continue;
        }
        match chars.next()? {
            '_' => id.push('/'),
            'd' => id.push('.'),
            'b' => id.push('\\'),
            'u' => id.push('_'),
            'h' => id.push('-'),
            'x' => {
                let hex: String = chars.by_ref().take_while(|&c| c != '_').collect();
                let code = u32::from_str_radix(&hex, 16).ok()?;
                id.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    (!id.is_empty()).then_some(id)
}

/// `{module}::{type}` for a template id, without synthesizing anything.
pub fn generated_type_path(template_id: &str) -> Result<String, SynthesisError> {
    let module = module_name(template_id)?;
    Ok(format!("{module}::{module}{TYPE_SUFFIX}"))
}

/// Prepare template text for embedding in an interpolated string literal.
///
/// Line breaks are removed and quotes escaped. A doubled quote (`""`) in the
/// template turns back into a bare quote, which inside a `{...}` placeholder
/// starts a string literal: `{model.Tag ?? ""none""}`.
pub fn normalize_template(raw: &str) -> String {
    raw.replace("\r\n", "")
        .replace(['\n', '\r'], "")
        .replace('"', "\\\"")
        .replace("\\\"\\\"", "\"")
}

/// Builds units for one engine's namespaces and language version.
#[derive(Debug, Clone)]
pub struct CodeSynthesizer {
    language_version: LanguageVersion,
    default_namespaces: Vec<String>,
}

impl CodeSynthesizer {
    pub fn new(language_version: LanguageVersion, default_namespaces: Vec<String>) -> Self {
        Self {
            language_version,
            default_namespaces,
        }
    }

    /// Build the unit for one template.
    ///
    /// `extra_namespaces` follow the default ones; repeats are dropped.
    pub fn synthesize(
        &self,
        template_id: &str,
        template: &str,
        model: &ModelShape,
        extra_namespaces: &[&str],
    ) -> Result<SynthesizedUnit, SynthesisError> {
        let model_type = model.type_name().ok_or_else(|| SynthesisError::InvalidModelShape {
            host_name: model.host_name.to_string(),
        })?;
        let module_name = module_name(template_id)?;
        let type_name = format!("{module_name}{TYPE_SUFFIX}");

        let mut uses: Vec<&str> = Vec::new();
        let defaults = self.default_namespaces.iter().map(String::as_str);
        for namespace in defaults.chain(extra_namespaces.iter().copied()) {
            if !uses.contains(&namespace) {
                uses.push(namespace);
            }
        }

        let mut source = String::new();
        let _ = writeln!(source, "#![edition = {}]", self.language_version.number());
        for namespace in &uses {
            let _ = writeln!(source, "use {namespace};");
        }
        let _ = write!(
            source,
            "\nmodule {module_name} {{\n    type {type_name} {{\n        fn {ENTRY_POINT}(model: {model_type}) -> string {{\n            return $\"{}\";\n        }}\n    }}\n}}\n",
            normalize_template(template)
        );

        Ok(SynthesizedUnit {
            template_id: template_id.to_string(),
            module_name,
            type_name,
            source,
            model: model.clone(),
        })
    }
}

impl Default for CodeSynthesizer {
    fn default() -> Self {
        Self::new(LanguageVersion::default(), vec!["std".to_string()])
    }
}

#[cfg(test)]
mod tests {
    use stencil_core::{FieldKind, FieldShape};

    use super::*;

    fn person() -> ModelShape {
        ModelShape::new(
            "app::Person",
            vec![
                FieldShape::new("Name", FieldKind::Str),
                FieldShape::new("Age", FieldKind::Int),
            ],
        )
    }

    #[test]
    fn module_names_are_identifiers_and_invertible() {
        for id in ["greeting", "emails/welcome.txt", "a_b-c\\d", "naïve id", "x/_/y"] {
            let name = module_name(id).unwrap();
            assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'), "{name}");
            assert_eq!(template_id_from_module_name(&name).as_deref(), Some(id));
        }
        assert_eq!(module_name("emails/welcome.txt").unwrap(), "Stencil_emails__welcome_dtxt");
    }

    #[test]
    fn separators_do_not_collide() {
        let ids = ["a/b", "a_b", "a.b", "a-b", "a__b", "a_ub"];
        let mut names: Vec<_> = ids.iter().map(|id| module_name(id).unwrap()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ids.len());
    }

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(module_name(""), Err(SynthesisError::EmptyTemplateId));
        assert_eq!(template_id_from_module_name("Stencil_"), None);
        assert_eq!(template_id_from_module_name("Other_a"), None);
    }

    #[test]
    fn normalization_escapes_quotes_and_joins_lines() {
        assert_eq!(normalize_template("say \"hi\"\r\nnow"), "say \\\"hi\\\"now");
        assert_eq!(
            normalize_template("{model.Tag ?? \"\"none\"\"}"),
            "{model.Tag ?? \"none\"}"
        );
    }

    #[test]
    fn synthesis_is_deterministic() {
        let synthesizer = CodeSynthesizer::default();
        let a = synthesizer
            .synthesize("greet", "hello {model.Name}", &person(), &["app", "std"])
            .unwrap();
        let b = synthesizer
            .synthesize("greet", "hello {model.Name}", &person(), &["app", "std"])
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.qualified_type_name(), "Stencil_greet::Stencil_greetTemplateGenerator");
        assert_eq!(generated_type_path("greet").unwrap(), a.qualified_type_name());
        assert_eq!(
            a.source,
            "#![edition = 1]\nuse std;\nuse app;\n\nmodule Stencil_greet {\n    type Stencil_greetTemplateGenerator {\n        fn Interpolate(model: app::Person) -> string {\n            return $\"hello {model.Name}\";\n        }\n    }\n}\n"
        );
    }

    #[test]
    fn unnameable_models_are_rejected() {
        let shape = ModelShape::new("&app::Person", Vec::new());
        let error = CodeSynthesizer::default()
            .synthesize("t", "x", &shape, &[])
            .unwrap_err();
        assert_eq!(
            error,
            SynthesisError::InvalidModelShape {
                host_name: "&app::Person".into()
            }
        );
    }
}
