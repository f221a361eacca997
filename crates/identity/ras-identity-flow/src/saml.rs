//! SP-initiated SAML 2.0 AuthnRequest construction.

use crate::client::FlowClient;
use crate::config::SamlRedirectEncoding;
use crate::error::{FlowError, FlowResult};
use crate::logging::{FlowLogger, MAX_LOGGED_URL_CHARS, truncate};
use crate::provider::SamlProviderConfig;
use crate::store::ArtifactKind;
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use serde_json::json;
use std::io::Write;
use url::Url;

pub const PROTOCOL_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
pub const ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
pub const HTTP_POST_BINDING: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";
pub const NAMEID_FORMAT_EMAIL: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";

/// Id of the auto-submitting form in [`FlowClient::build_saml_post_form`] output
pub const POST_FORM_ID: &str = "saml-post-form";

/// Escape text for use in XML/HTML content and attribute values
pub fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn validate(config: &SamlProviderConfig) -> FlowResult<()> {
    for (value, field) in [
        (&config.idp_sso_url, "idpSsoUrl"),
        (&config.entity_id, "entityId"),
        (&config.acs_url, "acsUrl"),
    ] {
        if value.trim().is_empty() {
            return Err(FlowError::MissingField(field));
        }
    }
    Ok(())
}

/// Render the AuthnRequest document for a given id and instant
pub fn render_authn_request(
    config: &SamlProviderConfig,
    request_id: &str,
    issue_instant: DateTime<Utc>,
) -> String {
    let name_id_format = config
        .name_id_format
        .as_deref()
        .unwrap_or(NAMEID_FORMAT_EMAIL);

    let mut xml = String::new();
    xml.push_str("<samlp:AuthnRequest xmlns:samlp=\"");
    xml.push_str(PROTOCOL_NS);
    xml.push_str("\"\n    xmlns:saml=\"");
    xml.push_str(ASSERTION_NS);
    xml.push_str("\"\n    ID=\"");
    xml.push_str(&xml_escape(request_id));
    xml.push_str("\"\n    Version=\"2.0\"\n    IssueInstant=\"");
    xml.push_str(&issue_instant.format("%Y-%m-%dT%H:%M:%SZ").to_string());
    xml.push_str("\"\n    Destination=\"");
    xml.push_str(&xml_escape(&config.idp_sso_url));
    xml.push_str("\"\n    AssertionConsumerServiceURL=\"");
    xml.push_str(&xml_escape(&config.acs_url));
    xml.push_str("\"\n    ProtocolBinding=\"");
    xml.push_str(HTTP_POST_BINDING);
    if config.force_authn {
        xml.push_str("\"\n    ForceAuthn=\"true");
    }
    xml.push_str("\">\n    <saml:Issuer>");
    xml.push_str(&xml_escape(&config.entity_id));
    xml.push_str("</saml:Issuer>\n    <samlp:NameIDPolicy Format=\"");
    xml.push_str(&xml_escape(name_id_format));
    xml.push_str("\" AllowCreate=\"true\"/>\n</samlp:AuthnRequest>");
    xml
}

/// Base64 for the POST binding, optionally deflated first for the redirect binding
pub fn encode_saml_request(xml: &str, encoding: SamlRedirectEncoding) -> FlowResult<String> {
    match encoding {
        SamlRedirectEncoding::Raw => Ok(STANDARD.encode(xml.as_bytes())),
        SamlRedirectEncoding::Deflate => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(xml.as_bytes())
                .map_err(|e| FlowError::EncodingError(format!("deflate failed: {}", e)))?;
            let compressed = encoder
                .finish()
                .map_err(|e| FlowError::EncodingError(format!("deflate failed: {}", e)))?;
            Ok(STANDARD.encode(compressed))
        }
    }
}

impl FlowClient {
    /// Build an AuthnRequest and remember its id for the response check
    pub fn build_saml_request(&self, config: &SamlProviderConfig) -> FlowResult<String> {
        validate(config)?;

        let request_id = format!("_{}", self.tokens().generate_state()?);
        let xml = render_authn_request(config, &request_id, Utc::now());
        self.store().put(ArtifactKind::SamlRequestId, &request_id)?;

        FlowLogger::SAML.debug(
            "Built AuthnRequest",
            json!({
                "entity_id": config.entity_id,
                "destination": truncate(&config.idp_sso_url, MAX_LOGGED_URL_CHARS),
            }),
        );

        Ok(xml)
    }

    fn start_relay_state(&self) -> FlowResult<String> {
        let relay_state = self.tokens().generate_state()?;
        self.store().put(ArtifactKind::SamlRelayState, &relay_state)?;
        Ok(relay_state)
    }

    /// IdP SSO URL carrying `SAMLRequest` and `RelayState` (HTTP-Redirect binding)
    pub fn build_saml_redirect_url(&self, config: &SamlProviderConfig) -> FlowResult<String> {
        validate(config)?;
        let mut url = Url::parse(&config.idp_sso_url)?;

        let xml = self.build_saml_request(config)?;
        let encoding = self.config().saml_redirect_encoding;
        let saml_request = encode_saml_request(&xml, encoding)?;
        let relay_state = self.start_relay_state()?;

        url.query_pairs_mut()
            .append_pair("SAMLRequest", &saml_request)
            .append_pair("RelayState", &relay_state);

        FlowLogger::SAML.info(
            "Built redirect binding URL",
            json!({
                "idp": truncate(&config.idp_sso_url, MAX_LOGGED_URL_CHARS),
                "entity_id": config.entity_id,
                "deflated": encoding == SamlRedirectEncoding::Deflate,
            }),
        );

        Ok(url.to_string())
    }

    /// Self-submitting HTML form posting the request to the IdP (HTTP-POST binding)
    pub fn build_saml_post_form(&self, config: &SamlProviderConfig) -> FlowResult<String> {
        validate(config)?;
        Url::parse(&config.idp_sso_url)?;

        let xml = self.build_saml_request(config)?;
        let saml_request = encode_saml_request(&xml, SamlRedirectEncoding::Raw)?;
        let relay_state = self.start_relay_state()?;

        let form = format!(
            concat!(
                "<form id=\"{id}\" method=\"POST\" action=\"{action}\">\n",
                "    <input type=\"hidden\" name=\"SAMLRequest\" value=\"{request}\"/>\n",
                "    <input type=\"hidden\" name=\"RelayState\" value=\"{relay}\"/>\n",
                "    <noscript><button type=\"submit\">Continue</button></noscript>\n",
                "</form>\n",
                "<script>document.getElementById(\"{id}\").submit();</script>"
            ),
            id = POST_FORM_ID,
            action = xml_escape(&config.idp_sso_url),
            request = xml_escape(&saml_request),
            relay = xml_escape(&relay_state),
        );

        FlowLogger::SAML.info(
            "Built POST binding form",
            json!({
                "idp": truncate(&config.idp_sso_url, MAX_LOGGED_URL_CHARS),
                "entity_id": config.entity_id,
            }),
        );

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use flate2::read::DeflateDecoder;
    use std::collections::HashMap;
    use std::io::Read;

    fn config() -> SamlProviderConfig {
        SamlProviderConfig::new(
            "https://idp.example/sso",
            "sp1",
            "https://app.example/acs",
        )
    }

    fn client() -> FlowClient {
        FlowClient::in_memory(FlowConfig::new("https://app.example"))
    }

    fn query(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn decode(encoded: &str) -> String {
        String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap()
    }

    #[test]
    fn test_authn_request_document() {
        let client = client();
        let xml = client.build_saml_request(&config()).unwrap();

        assert_eq!(xml.matches("<samlp:AuthnRequest").count(), 1);
        assert!(xml.contains("<saml:Issuer>sp1</saml:Issuer>"));
        assert!(xml.contains("AssertionConsumerServiceURL=\"https://app.example/acs\""));
        assert!(xml.contains("Destination=\"https://idp.example/sso\""));
        assert!(xml.contains("Version=\"2.0\""));
        assert!(xml.contains(&format!("xmlns:samlp=\"{}\"", PROTOCOL_NS)));
        assert!(xml.contains(&format!("xmlns:saml=\"{}\"", ASSERTION_NS)));
        assert!(xml.contains(&format!("ProtocolBinding=\"{}\"", HTTP_POST_BINDING)));
        assert!(xml.contains(&format!(
            "<samlp:NameIDPolicy Format=\"{}\" AllowCreate=\"true\"/>",
            NAMEID_FORMAT_EMAIL
        )));
        assert!(!xml.contains("ForceAuthn"));

        let request_id = client
            .store()
            .peek(ArtifactKind::SamlRequestId)
            .unwrap()
            .unwrap();
        assert!(request_id.starts_with('_'));
        assert!(xml.contains(&format!("ID=\"{}\"", request_id)));
    }

    #[test]
    fn test_render_is_deterministic_for_fixed_inputs() {
        let instant = DateTime::parse_from_rfc3339("2024-05-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut config = config();
        config.force_authn = true;
        config.entity_id = "sp&<1>".to_string();

        let xml = render_authn_request(&config, "_abc", instant);
        assert_eq!(xml, render_authn_request(&config, "_abc", instant));
        assert!(xml.contains("IssueInstant=\"2024-05-01T12:30:00Z\""));
        assert!(xml.contains("ForceAuthn=\"true\""));
        assert!(xml.contains("<saml:Issuer>sp&amp;&lt;1&gt;</saml:Issuer>"));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut config = config();
        config.acs_url = String::new();

        let result = client().build_saml_request(&config);
        assert!(matches!(result, Err(FlowError::MissingField("acsUrl"))));
    }

    #[test]
    fn test_redirect_url_carries_request_and_relay_state() {
        let client = client();
        let url = client.build_saml_redirect_url(&config()).unwrap();

        assert!(url.starts_with("https://idp.example/sso?"));
        let params = query(&url);

        let xml = decode(&params["SAMLRequest"]);
        let request_id = client
            .store()
            .peek(ArtifactKind::SamlRequestId)
            .unwrap()
            .unwrap();
        assert_eq!(xml.matches("<samlp:AuthnRequest").count(), 1);
        assert!(xml.contains(&format!("ID=\"{}\"", request_id)));
        assert!(xml.contains("<saml:Issuer>sp1</saml:Issuer>"));

        assert_eq!(
            client.store().peek(ArtifactKind::SamlRelayState).unwrap().as_ref(),
            params.get("RelayState")
        );
    }

    #[test]
    fn test_encoding_reproduces_document() {
        let xml = render_authn_request(&config(), "_id", Utc::now());

        let raw = encode_saml_request(&xml, SamlRedirectEncoding::Raw).unwrap();
        assert_eq!(decode(&raw), xml);

        let deflated = encode_saml_request(&xml, SamlRedirectEncoding::Deflate).unwrap();
        let mut inflated = String::new();
        DeflateDecoder::new(STANDARD.decode(deflated).unwrap().as_slice())
            .read_to_string(&mut inflated)
            .unwrap();
        assert_eq!(inflated, xml);
    }

    #[test]
    fn test_deflate_redirect_encoding() {
        let client = FlowClient::in_memory(
            FlowConfig::new("https://app.example")
                .with_saml_redirect_encoding(SamlRedirectEncoding::Deflate),
        );
        let params = query(&client.build_saml_redirect_url(&config()).unwrap());

        let compressed = STANDARD.decode(&params["SAMLRequest"]).unwrap();
        let mut xml = String::new();
        DeflateDecoder::new(compressed.as_slice())
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("<saml:Issuer>sp1</saml:Issuer>"));
    }

    #[test]
    fn test_post_form() {
        let client = client();
        let form = client.build_saml_post_form(&config()).unwrap();

        assert!(form.contains("method=\"POST\" action=\"https://idp.example/sso\""));
        assert!(form.contains("name=\"SAMLRequest\""));
        assert!(form.contains(&format!(
            "name=\"RelayState\" value=\"{}\"",
            client
                .store()
                .peek(ArtifactKind::SamlRelayState)
                .unwrap()
                .unwrap()
        )));
        assert!(form.contains(&format!("getElementById(\"{}\").submit()", POST_FORM_ID)));
    }

    #[test]
    fn test_post_form_escapes_action() {
        let mut config = config();
        config.idp_sso_url = "https://idp.example/sso?a=1&b=\"2\"".to_string();

        let form = client().build_saml_post_form(&config).unwrap();
        assert!(form.contains("action=\"https://idp.example/sso?a=1&amp;b=&quot;2&quot;\""));
    }
}
