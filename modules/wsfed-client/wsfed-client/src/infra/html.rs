//! Form field lookup backed by the `tl` HTML parser.

use tl::ParserOptions;
use wsfed_client_sdk::{FormError, FormFieldQuery};

/// Looks up `<input>` attributes with `tl`.
///
/// Tag and attribute names match case-insensitively; the `name` value
/// matches exactly. The first matching input in document order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlFormQuery;

impl FormFieldQuery for TlFormQuery {
    fn input_attribute(
        &self,
        html: &str,
        field: &str,
        attribute: &str,
    ) -> Result<String, FormError> {
        let dom = tl::parse(html, ParserOptions::default())
            .map_err(|_| FormError::Markup("document exceeds parser limits".to_owned()))?;

        let input = dom
            .nodes()
            .iter()
            .filter_map(|node| node.as_tag())
            .filter(|tag| tag.name().as_utf8_str().eq_ignore_ascii_case("input"))
            .find(|tag| attribute_value(tag, "name").is_some_and(|name| name == field))
            .ok_or_else(|| FormError::FieldMissing {
                field: field.to_owned(),
            })?;

        attribute_value(input, attribute)
            .ok_or_else(|| FormError::AttributeMissing {
                field: field.to_owned(),
                attribute: attribute.to_owned(),
            })
    }
}

fn attribute_value(tag: &tl::HTMLTag<'_>, key: &str) -> Option<String> {
    tag.attributes()
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .and_then(|(_, value)| value.map(std::borrow::Cow::into_owned))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn first_matching_input_wins() {
        let html = r#"<form><input name="wresult" value="first" /><input name="wresult" value="second" /></form>"#;

        assert_eq!(
            TlFormQuery.input_attribute(html, "wresult", "value").unwrap(),
            "first"
        );
    }

    #[test]
    fn tag_names_match_case_insensitively() {
        let html = r#"<FORM><INPUT name="wresult" value="upper" /></FORM>"#;

        assert_eq!(
            TlFormQuery.input_attribute(html, "wresult", "value").unwrap(),
            "upper"
        );
    }

    #[test]
    fn attribute_names_match_case_insensitively() {
        let html = r#"<form><INPUT NAME="wresult" VALUE="shouted" /></form>"#;

        assert_eq!(
            TlFormQuery.input_attribute(html, "wresult", "value").unwrap(),
            "shouted"
        );
    }

    #[test]
    fn other_elements_with_the_name_are_ignored() {
        let html = r#"<textarea name="wresult">nope</textarea><input name="wresult" value="yes"/>"#;

        assert_eq!(
            TlFormQuery.input_attribute(html, "wresult", "value").unwrap(),
            "yes"
        );
    }

    #[test]
    fn value_is_returned_undecoded() {
        let html = r#"<input type="hidden" name="wresult" value="&lt;a&gt;" />"#;

        assert_eq!(
            TlFormQuery.input_attribute(html, "wresult", "value").unwrap(),
            "&lt;a&gt;"
        );
    }

    #[test]
    fn empty_value_is_a_value() {
        let html = r#"<input type="hidden" name="wctx" value="" />"#;

        assert_eq!(TlFormQuery.input_attribute(html, "wctx", "value").unwrap(), "");
    }

    #[test]
    fn missing_input_and_attribute_are_distinguished() {
        let html = r#"<input type="hidden" name="wresult" />"#;

        assert!(matches!(
            TlFormQuery.input_attribute(html, "wa", "value"),
            Err(FormError::FieldMissing { .. })
        ));
        assert!(matches!(
            TlFormQuery.input_attribute(html, "wresult", "value"),
            Err(FormError::AttributeMissing { .. })
        ));
    }
}
