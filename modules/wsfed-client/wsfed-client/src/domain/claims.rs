//! Result decoding: callback fragment and SAML assertion claims.

use wsfed_client_sdk::{AssertionParser, FragmentClaims, HandshakeError, TokenClaims, Wresult};

/// Decode the `key=value&...` fragment of the terminal callback `Location`.
///
/// Values are percent-decoded; `+` is kept literally. The split happens at the
/// first `=`, so values may themselves contain `=`.
///
/// # Errors
///
/// Returns [`HandshakeError::MalformedCallbackResponse`] when there is no
/// fragment, a segment has no `=`, a value is not valid percent-encoded
/// UTF-8, or a key appears twice.
pub fn decode_fragment(location: &str) -> Result<FragmentClaims, HandshakeError> {
    let (_, fragment) = location.split_once('#').ok_or_else(|| {
        HandshakeError::MalformedCallbackResponse("callback location has no fragment".to_owned())
    })?;

    let mut claims = FragmentClaims::new();
    for pair in fragment.split('&') {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            HandshakeError::MalformedCallbackResponse(format!(
                "fragment segment '{}' is not a key=value pair",
                redact(pair)
            ))
        })?;
        let value = urlencoding::decode(raw).map_err(|_| {
            HandshakeError::MalformedCallbackResponse(format!(
                "value of '{key}' is not valid percent-encoded UTF-8"
            ))
        })?;
        if claims.insert(key.to_owned(), value.into_owned()).is_some() {
            return Err(HandshakeError::MalformedCallbackResponse(format!(
                "claim '{key}' appears more than once"
            )));
        }
    }
    Ok(claims)
}

/// Parse `wresult` as a SAML token and flatten its attribute statements.
///
/// # Errors
///
/// Returns [`HandshakeError::AssertionNotFound`] when no assertion is present
/// and [`HandshakeError::TokenParseError`] on structural failures.
pub fn decode_token(
    parser: &dyn AssertionParser,
    wresult: &Wresult,
) -> Result<TokenClaims, HandshakeError> {
    let token = parser.parse(wresult.expose())?;
    Ok(token.claims())
}

// Segments without '=' may still be a bare token; keep only a prefix.
fn redact(segment: &str) -> String {
    let prefix: String = segment.chars().take(8).collect();
    if prefix.len() < segment.len() {
        format!("{prefix}...")
    } else {
        prefix
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::infra::SamlAssertionParser;

    #[test]
    fn decodes_token_fragment() {
        let claims =
            decode_fragment("https://host/cb#access_token=AAA&token_type=Bearer").unwrap();

        assert_eq!(claims.len(), 2);
        assert_eq!(claims["access_token"], "AAA");
        assert_eq!(claims["token_type"], "Bearer");
    }

    #[test]
    fn values_are_percent_decoded_and_keep_equals_signs() {
        let claims = decode_fragment(
            "http://headless.local#id_token=a.b.c%3D%3D&scope=openid%20profile&state=x=y&plus=a+b",
        )
        .unwrap();

        assert_eq!(claims["id_token"], "a.b.c==");
        assert_eq!(claims["scope"], "openid profile");
        assert_eq!(claims["state"], "x=y");
        assert_eq!(claims["plus"], "a+b");
    }

    #[test]
    fn missing_fragment_is_malformed() {
        assert!(matches!(
            decode_fragment("http://headless.local/?error=access_denied"),
            Err(HandshakeError::MalformedCallbackResponse(_))
        ));
    }

    #[test]
    fn pair_without_equals_is_malformed() {
        let err = decode_fragment("http://headless.local#access_token=AAA&garbage_value").unwrap_err();

        assert!(matches!(err, HandshakeError::MalformedCallbackResponse(_)));
        assert!(err.to_string().contains("garbage_..."));
    }

    #[test]
    fn empty_fragment_is_malformed() {
        assert!(matches!(
            decode_fragment("http://headless.local#"),
            Err(HandshakeError::MalformedCallbackResponse(_))
        ));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        assert!(matches!(
            decode_fragment("http://headless.local#a=1&a=2"),
            Err(HandshakeError::MalformedCallbackResponse(_))
        ));
    }

    #[test]
    fn invalid_utf8_escape_is_malformed() {
        assert!(matches!(
            decode_fragment("http://headless.local#a=%FF"),
            Err(HandshakeError::MalformedCallbackResponse(_))
        ));
    }

    #[test]
    fn token_claims_merge_multi_valued_attributes() {
        let wresult = Wresult::new(
            r#"<t:RequestSecurityTokenResponse xmlns:t="http://schemas.xmlsoap.org/ws/2005/02/trust">
              <t:RequestedSecurityToken>
                <saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:1.0:assertion" AssertionID="_a1" Issuer="urn:tenant">
                  <saml:AttributeStatement>
                    <saml:Attribute AttributeName="email" AttributeNamespace="http://schemas.xmlsoap.org/claims">
                      <saml:AttributeValue>a@x.com</saml:AttributeValue>
                      <saml:AttributeValue>b@x.com</saml:AttributeValue>
                    </saml:Attribute>
                  </saml:AttributeStatement>
                </saml:Assertion>
              </t:RequestedSecurityToken>
            </t:RequestSecurityTokenResponse>"#,
        );

        let claims = decode_token(&SamlAssertionParser, &wresult).unwrap();

        assert_eq!(claims.len(), 1);
        assert_eq!(claims["email"], vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn missing_assertion_is_reported_not_empty() {
        let wresult = Wresult::new("<t:RequestSecurityTokenResponse xmlns:t=\"urn:t\"/>");

        assert!(matches!(
            decode_token(&SamlAssertionParser, &wresult),
            Err(HandshakeError::AssertionNotFound)
        ));
    }
}
