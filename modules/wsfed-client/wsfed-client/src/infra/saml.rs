//! SAML assertion parsing with `quick-xml`.
//!
//! Both SAML 1.1 (`AttributeName`/`AttributeNamespace`, the usual payload of
//! a WS-Federation `wresult`) and SAML 2.0 (`Name`/`NameFormat`) assertions
//! are recognised. Elements only count when bound to a SAML assertion
//! namespace; an unprefixed `<Assertion>` without one is ignored.
//!
//! Signatures are not verified here: the token was received over TLS from
//! the identity provider the caller is authenticating against.

use std::fmt::Display;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use wsfed_client_sdk::{
    AssertionParser, AttributeStatement, SamlAttribute, SecurityToken, TokenError,
};

const SAML_NAMESPACES: [&[u8]; 2] = [
    b"urn:oasis:names:tc:SAML:1.0:assertion",
    b"urn:oasis:names:tc:SAML:2.0:assertion",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SamlAssertionParser;

impl AssertionParser for SamlAssertionParser {
    fn parse(&self, xml: &str) -> Result<SecurityToken, TokenError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            let (ns, event) = reader.read_resolved_event().map_err(malformed)?;
            match event {
                Event::Start(start) if is_assertion(&ns, &start) => {
                    let builder = AssertionBuilder::new(assertion_header(&start)?);
                    return builder.read(&mut reader);
                }
                Event::Empty(start) if is_assertion(&ns, &start) => {
                    return assertion_header(&start);
                }
                Event::Eof => return Err(TokenError::AssertionNotFound),
                _ => {}
            }
        }
    }
}

fn is_saml(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if SAML_NAMESPACES.contains(uri))
}

fn is_assertion(ns: &ResolveResult<'_>, start: &BytesStart<'_>) -> bool {
    is_saml(ns) && start.local_name().as_ref() == b"Assertion"
}

fn assertion_header(start: &BytesStart<'_>) -> Result<SecurityToken, TokenError> {
    Ok(SecurityToken {
        id: attribute_value(start, &[b"ID", b"AssertionID"])?,
        issuer: attribute_value(start, &[b"Issuer"])?,
        attribute_statements: Vec::new(),
    })
}

fn attribute_value(start: &BytesStart<'_>, keys: &[&[u8]]) -> Result<Option<String>, TokenError> {
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        if keys.contains(&attr.key.local_name().as_ref()) {
            let value = attr.unescape_value().map_err(malformed)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn malformed(e: impl Display) -> TokenError {
    TokenError::Malformed(e.to_string())
}

#[derive(Debug, Clone, Copy)]
enum Capture {
    Issuer,
    Value,
}

/// Accumulates the content of one assertion element.
struct AssertionBuilder {
    token: SecurityToken,
    statement: Option<AttributeStatement>,
    attribute: Option<SamlAttribute>,
    capture: Option<(Capture, String)>,
}

impl AssertionBuilder {
    fn new(token: SecurityToken) -> Self {
        Self {
            token,
            statement: None,
            attribute: None,
            capture: None,
        }
    }

    fn read(mut self, reader: &mut NsReader<&[u8]>) -> Result<SecurityToken, TokenError> {
        let mut depth = 0usize;
        loop {
            let (ns, event) = reader.read_resolved_event().map_err(malformed)?;
            let saml = is_saml(&ns);
            match event {
                Event::Start(start) => {
                    depth += 1;
                    if saml {
                        self.open(&start)?;
                    }
                }
                Event::Empty(start) if saml => {
                    self.open(&start)?;
                    self.close(start.local_name().as_ref())?;
                }
                Event::End(end) => {
                    if depth == 0 {
                        return Ok(self.token);
                    }
                    depth -= 1;
                    if saml {
                        self.close(end.local_name().as_ref())?;
                    }
                }
                Event::Text(text) => {
                    if let Some((_, buffer)) = self.capture.as_mut() {
                        buffer.push_str(&text.unescape().map_err(malformed)?);
                    }
                }
                Event::CData(cdata) => {
                    if let Some((_, buffer)) = self.capture.as_mut() {
                        buffer.push_str(std::str::from_utf8(&cdata).map_err(malformed)?);
                    }
                }
                Event::Eof => {
                    return Err(TokenError::Malformed(
                        "assertion element is not closed".to_owned(),
                    ));
                }
                _ => {}
            }
        }
    }

    fn open(&mut self, start: &BytesStart<'_>) -> Result<(), TokenError> {
        match start.local_name().as_ref() {
            b"AttributeStatement" => {
                self.statement = Some(AttributeStatement::default());
            }
            b"Attribute" => {
                if self.statement.is_none() {
                    return Err(TokenError::Malformed(
                        "Attribute outside of an AttributeStatement".to_owned(),
                    ));
                }
                let name = attribute_value(start, &[b"Name", b"AttributeName"])?.ok_or_else(
                    || TokenError::Malformed("Attribute without a name".to_owned()),
                )?;
                self.attribute = Some(SamlAttribute {
                    name,
                    namespace: attribute_value(start, &[b"AttributeNamespace", b"NameFormat"])?,
                    values: Vec::new(),
                });
            }
            b"AttributeValue" => {
                if self.attribute.is_none() {
                    return Err(TokenError::Malformed(
                        "AttributeValue outside of an Attribute".to_owned(),
                    ));
                }
                self.capture = Some((Capture::Value, String::new()));
            }
            b"Issuer" => self.capture = Some((Capture::Issuer, String::new())),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, local_name: &[u8]) -> Result<(), TokenError> {
        match local_name {
            b"AttributeValue" | b"Issuer" => match (self.capture.take(), self.attribute.as_mut()) {
                (Some((Capture::Value, value)), Some(attribute)) => attribute.values.push(value),
                (Some((Capture::Issuer, issuer)), _) => self.token.issuer = Some(issuer),
                _ => {}
            },
            b"Attribute" => {
                if let (Some(attribute), Some(statement)) =
                    (self.attribute.take(), self.statement.as_mut())
                {
                    statement.attributes.push(attribute);
                }
            }
            b"AttributeStatement" => {
                let statement = self.statement.take().ok_or_else(|| {
                    TokenError::Malformed("unbalanced AttributeStatement".to_owned())
                })?;
                self.token.attribute_statements.push(statement);
            }
            _ => {}
        }
        Ok(())
    }
}
