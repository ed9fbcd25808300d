//! Microsoft Translator HTTP adapter
//!
//! Token exchange is a form POST answered with JSON. The translation
//! endpoints speak XML in both directions.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing::debug;

use super::{Authority, TranslationProvider};
use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{AccessToken, Credential, TokenGrant};

const GRANT_TYPE: &str = "client_credentials";
const ARRAYS_NS: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";
const SERVICE_NS: &str = "http://schemas.datacontract.org/2004/07/Microsoft.MT.Web.Service.V2";

/// OAuth endpoint of the translator service
#[derive(Debug, Clone)]
pub struct MicrosoftAuthority {
    client: reqwest::Client,
    endpoint: String,
    scope: String,
}

impl MicrosoftAuthority {
    /// Authority posting to `endpoint` and requesting `scope`
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            scope: scope.into(),
        }
    }

    /// Endpoints taken from `config`
    pub fn from_config(client: reqwest::Client, config: &TranslatorConfig) -> Self {
        Self::new(client, &config.auth_endpoint, &config.scope)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    expires_in: ExpiresIn,
    #[serde(default)]
    scope: String,
}

/// The service sends the lifetime as a decimal string; plain numbers are accepted too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(u64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Result<u64> {
        match self {
            ExpiresIn::Seconds(secs) => Ok(*secs),
            ExpiresIn::Text(text) => text.trim().parse::<u64>().map_err(|e| {
                TranslationError::auth(format!("expires_in {:?} is not a number: {}", text, e))
            }),
        }
    }
}

#[async_trait]
impl Authority for MicrosoftAuthority {
    async fn exchange(&self, credential: &Credential) -> Result<TokenGrant> {
        let form = [
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("scope", self.scope.as_str()),
            ("grant_type", GRANT_TYPE),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| TranslationError::auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranslationError::auth(format!("token response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(TranslationError::auth(format!(
                "token request rejected: {} - {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::auth(format!("malformed token response: {}", e)))?;

        Ok(TokenGrant {
            expires_in: parsed.expires_in.seconds()?,
            access_token: parsed.access_token,
            token_type: parsed.token_type,
            scope: parsed.scope,
        })
    }
}

/// Translate / TranslateArray / DetectArray endpoints
#[derive(Debug, Clone)]
pub struct MicrosoftTranslatorApi {
    client: reqwest::Client,
    translate_endpoint: String,
    translate_array_endpoint: String,
    detect_array_endpoint: String,
}

impl MicrosoftTranslatorApi {
    /// Adapter for the three translation endpoints
    pub fn new(
        client: reqwest::Client,
        translate_endpoint: impl Into<String>,
        translate_array_endpoint: impl Into<String>,
        detect_array_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            translate_endpoint: translate_endpoint.into(),
            translate_array_endpoint: translate_array_endpoint.into(),
            detect_array_endpoint: detect_array_endpoint.into(),
        }
    }

    /// Endpoints taken from `config`
    pub fn from_config(client: reqwest::Client, config: &TranslatorConfig) -> Self {
        Self::new(
            client,
            &config.translate_endpoint,
            &config.translate_array_endpoint,
            &config.detect_array_endpoint,
        )
    }

    async fn post_xml(&self, url: &str, token: &AccessToken, body: String) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header("Authorization", bearer(token))
            .header("Content-Type", "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| TranslationError::provider(format!("request to {} failed: {}", url, e)))?;

        read_body(response).await
    }
}

fn bearer(token: &AccessToken) -> String {
    format!("Bearer {}", token.value)
}

async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| TranslationError::provider(format!("response unreadable: {}", e)))?;

    if !status.is_success() {
        return Err(TranslationError::provider(format!(
            "API error: {} - {}",
            status.as_u16(),
            body
        )));
    }

    Ok(body)
}

/// Text content of every `element` in `body`, in document order.
///
/// Values are taken verbatim: surrounding whitespace is part of a
/// translation and is never trimmed.
fn element_texts(body: &str, root: &str, element: &str, what: &str) -> Result<Vec<String>> {
    let malformed =
        |detail: String| TranslationError::provider(format!("malformed {} response: {}", what, detail));

    let mut reader = Reader::from_str(body);
    reader.trim_text(false);

    let mut values = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut capture: Option<(usize, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if depth == 0 {
                    if seen_root || name.as_ref() != root.as_bytes() {
                        return Err(malformed(format!("expected <{}> root", root)));
                    }
                    seen_root = true;
                }
                depth += 1;
                if capture.is_none() && name.as_ref() == element.as_bytes() {
                    capture = Some((depth, String::new()));
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if depth == 0 {
                    if seen_root || name.as_ref() != root.as_bytes() {
                        return Err(malformed(format!("expected <{}> root", root)));
                    }
                    seen_root = true;
                }
                if capture.is_none() && name.as_ref() == element.as_bytes() {
                    values.push(String::new());
                }
            }
            Ok(Event::Text(text)) => {
                if let Some((_, buffer)) = capture.as_mut() {
                    let unescaped = text.unescape().map_err(|e| malformed(e.to_string()))?;
                    buffer.push_str(&unescaped);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some((_, buffer)) = capture.as_mut() {
                    let raw = std::str::from_utf8(&data).map_err(|e| malformed(e.to_string()))?;
                    buffer.push_str(raw);
                }
            }
            Ok(Event::End(_)) => {
                if matches!(capture, Some((level, _)) if level == depth) {
                    if let Some((_, value)) = capture.take() {
                        values.push(value);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(e.to_string())),
        }
    }

    if !seen_root || depth != 0 {
        return Err(malformed("truncated document".to_string()));
    }

    Ok(values)
}

fn string_items(texts: &[String]) -> String {
    texts
        .iter()
        .map(|text| {
            format!(
                r#"<string xmlns="{}">{}</string>"#,
                ARRAYS_NS,
                quick_xml::escape::escape(text.as_str())
            )
        })
        .collect()
}

fn translate_array_body(texts: &[String], source_lang: &str, target_lang: &str) -> String {
    format!(
        concat!(
            "<TranslateArrayRequest>",
            "<AppId />",
            "<From>{from}</From>",
            "<Options>",
            r#"<Category xmlns="{ns}" />"#,
            r#"<ContentType xmlns="{ns}">text/plain</ContentType>"#,
            r#"<ReservedFlags xmlns="{ns}" />"#,
            r#"<State xmlns="{ns}" />"#,
            r#"<Uri xmlns="{ns}" />"#,
            r#"<User xmlns="{ns}" />"#,
            "</Options>",
            "<Texts>{texts}</Texts>",
            "<To>{to}</To>",
            "</TranslateArrayRequest>"
        ),
        from = quick_xml::escape::escape(source_lang),
        ns = SERVICE_NS,
        texts = string_items(texts),
        to = quick_xml::escape::escape(target_lang),
    )
}

fn detect_array_body(texts: &[String]) -> String {
    format!(
        r#"<ArrayOfstring xmlns="{}">{}</ArrayOfstring>"#,
        ARRAYS_NS,
        string_items(texts)
    )
}

#[async_trait]
impl TranslationProvider for MicrosoftTranslatorApi {
    async fn translate_one(
        &self,
        token: &AccessToken,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String> {
        let mut query = vec![("text", text), ("to", target_lang)];
        if !source_lang.is_empty() {
            query.push(("from", source_lang));
        }

        debug!("Translate [{}] -> [{}]", source_lang, target_lang);

        let response = self
            .client
            .get(&self.translate_endpoint)
            .query(&query)
            .header("Authorization", bearer(token))
            .send()
            .await
            .map_err(|e| {
                TranslationError::provider(format!(
                    "request to {} failed: {}",
                    self.translate_endpoint, e
                ))
            })?;

        let body = read_body(response).await?;
        let mut values = element_texts(&body, "string", "string", "Translate")?;
        Ok(if values.is_empty() {
            String::new()
        } else {
            values.swap_remove(0)
        })
    }

    async fn translate_batch(
        &self,
        token: &AccessToken,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>> {
        debug!(
            "TranslateArray {} texts [{}] -> [{}]",
            texts.len(),
            source_lang,
            target_lang
        );

        let body = translate_array_body(texts, source_lang, target_lang);
        let body = self
            .post_xml(&self.translate_array_endpoint, token, body)
            .await?;

        element_texts(
            &body,
            "ArrayOfTranslateArrayResponse",
            "TranslatedText",
            "TranslateArray",
        )
    }

    async fn detect_batch(&self, token: &AccessToken, texts: &[String]) -> Result<Vec<String>> {
        debug!("DetectArray {} texts", texts.len());

        let body = self
            .post_xml(&self.detect_array_endpoint, token, detect_array_body(texts))
            .await?;

        element_texts(&body, "ArrayOfstring", "string", "DetectArray")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::{
        matchers::{body_string_contains, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_token() -> AccessToken {
        AccessToken {
            value: "test-token".to_string(),
            token_type: None,
            granted_scope: "http://api.microsofttranslator.com".to_string(),
            issued_at: Utc::now(),
            expires_in_secs: 600,
        }
    }

    fn api_for(server: &MockServer) -> MicrosoftTranslatorApi {
        MicrosoftTranslatorApi::new(
            reqwest::Client::new(),
            format!("{}/v2/Http.svc/Translate", server.uri()),
            format!("{}/V2/Http.svc/TranslateArray", server.uri()),
            format!("{}/V2/Http.svc/DetectArray", server.uri()),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_exchange_parses_string_lifetime() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/OAuth2-13"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=a"))
            .and(body_string_contains("client_secret=b"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"access_token":"abc","token_type":"http://schemas.xmlsoap.org/ws/2009/11/swt-token-profile-1.0","expires_in":"600","scope":"http://api.microsofttranslator.com"}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let authority = MicrosoftAuthority::new(
            reqwest::Client::new(),
            format!("{}/v2/OAuth2-13", mock_server.uri()),
            "http://api.microsofttranslator.com",
        );

        let grant = authority
            .exchange(&Credential::new("a", "b"))
            .await
            .expect("Should succeed");

        assert_eq!(grant.access_token, "abc");
        assert_eq!(grant.expires_in, 600);
        assert_eq!(grant.scope, "http://api.microsofttranslator.com");
        assert!(grant.token_type.is_some());
    }

    #[tokio::test]
    async fn test_exchange_accepts_numeric_lifetime() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"access_token":"abc","expires_in":3600,"scope":"s"}"#,
            ))
            .mount(&mock_server)
            .await;

        let authority = MicrosoftAuthority::new(reqwest::Client::new(), mock_server.uri(), "s");
        let grant = authority.exchange(&Credential::new("a", "b")).await.unwrap();

        assert_eq!(grant.expires_in, 3600);
        assert_eq!(grant.token_type, None);
    }

    #[tokio::test]
    async fn test_exchange_rejects_non_numeric_lifetime() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"access_token":"abc","expires_in":"ten minutes","scope":"s"}"#,
            ))
            .mount(&mock_server)
            .await;

        let authority = MicrosoftAuthority::new(reqwest::Client::new(), mock_server.uri(), "s");
        let err = authority.exchange(&Credential::new("a", "b")).await.unwrap_err();

        assert!(matches!(err, TranslationError::AuthError { .. }));
    }

    #[tokio::test]
    async fn test_exchange_surfaces_rejection_as_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_client"}"#))
            .mount(&mock_server)
            .await;

        let authority = MicrosoftAuthority::new(reqwest::Client::new(), mock_server.uri(), "s");
        let err = authority.exchange(&Credential::new("a", "b")).await.unwrap_err();

        assert!(matches!(err, TranslationError::AuthError { .. }));
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("invalid_client"));
    }

    #[tokio::test]
    async fn test_exchange_unreachable_authority() {
        let authority =
            MicrosoftAuthority::new(reqwest::Client::new(), "http://127.0.0.1:1/token", "s");
        let err = authority.exchange(&Credential::new("a", "b")).await.unwrap_err();

        assert!(matches!(err, TranslationError::AuthError { .. }));
    }

    #[tokio::test]
    async fn test_translate_one() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/Http.svc/Translate"))
            .and(query_param("text", "um"))
            .and(query_param("from", "pt"))
            .and(query_param("to", "en"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<string xmlns="{}">one</string>"#,
                ARRAYS_NS
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = api_for(&mock_server)
            .translate_one(&test_token(), "um", "pt", "en")
            .await
            .expect("Should succeed");

        assert_eq!(result, "one");
    }

    #[tokio::test]
    async fn test_translate_one_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let err = api_for(&mock_server)
            .translate_one(&test_token(), "um", "pt", "en")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::ProviderError { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_translate_batch_parses_in_order() {
        let mock_server = MockServer::start().await;

        let response = format!(
            concat!(
                r#"<ArrayOfTranslateArrayResponse xmlns="{svc}" xmlns:i="http://www.w3.org/2001/XMLSchema-instance">"#,
                "<TranslateArrayResponse><From>pt</From>",
                r#"<OriginalTextSentenceLengths xmlns:a="{arr}"><a:int>2</a:int></OriginalTextSentenceLengths>"#,
                "<TranslatedText>one</TranslatedText>",
                r#"<TranslatedTextSentenceLengths xmlns:a="{arr}"><a:int>3</a:int></TranslatedTextSentenceLengths>"#,
                "</TranslateArrayResponse>",
                "<TranslateArrayResponse><From>pt</From>",
                "<TranslatedText>two</TranslatedText>",
                "</TranslateArrayResponse>",
                "</ArrayOfTranslateArrayResponse>"
            ),
            svc = SERVICE_NS,
            arr = ARRAYS_NS,
        );

        Mock::given(method("POST"))
            .and(path("/V2/Http.svc/TranslateArray"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("Content-Type", "text/xml"))
            .and(body_string_contains("<From>pt</From>"))
            .and(body_string_contains("<To>en</To>"))
            .and(body_string_contains(">um</string>"))
            .and(body_string_contains(">dois</string>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(response))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = api_for(&mock_server)
            .translate_batch(&test_token(), &strings(&["um", "dois"]), "pt", "en")
            .await
            .expect("Should succeed");

        assert_eq!(result, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_translate_batch_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>oops"))
            .mount(&mock_server)
            .await;

        let err = api_for(&mock_server)
            .translate_batch(&test_token(), &strings(&["um"]), "pt", "en")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::ProviderError { .. }));
    }

    #[tokio::test]
    async fn test_translate_one_keeps_surrounding_whitespace() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/Http.svc/Translate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<string xmlns="{}">  fish &amp; chips  </string>"#,
                ARRAYS_NS
            )))
            .mount(&mock_server)
            .await;

        let result = api_for(&mock_server)
            .translate_one(&test_token(), "  peixe e batatas  ", "pt", "en")
            .await
            .expect("Should succeed");

        assert_eq!(result, "  fish & chips  ");
    }

    #[tokio::test]
    async fn test_translate_batch_keeps_item_whitespace() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/V2/Http.svc/TranslateArray"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                concat!(
                    r#"<ArrayOfTranslateArrayResponse xmlns="{}">"#,
                    "<TranslateArrayResponse><From>pt</From><TranslatedText> one</TranslatedText></TranslateArrayResponse>",
                    "<TranslateArrayResponse><From>pt</From><TranslatedText>two\n</TranslatedText></TranslateArrayResponse>",
                    "<TranslateArrayResponse><From>pt</From><TranslatedText>   </TranslatedText></TranslateArrayResponse>",
                    "<TranslateArrayResponse><From>pt</From><TranslatedText /></TranslateArrayResponse>",
                    "</ArrayOfTranslateArrayResponse>"
                ),
                SERVICE_NS
            )))
            .mount(&mock_server)
            .await;

        let result = api_for(&mock_server)
            .translate_batch(&test_token(), &strings(&[" um", "dois\n", "   ", ""]), "pt", "en")
            .await
            .expect("Should succeed");

        assert_eq!(result, vec![" one", "two\n", "   ", ""]);
    }

    #[test]
    fn test_element_texts_reads_cdata_and_entities() {
        let body = r#"<ArrayOfstring><string><![CDATA[ a<b ]]></string><string> &lt;c&gt; </string></ArrayOfstring>"#;
        let values = element_texts(body, "ArrayOfstring", "string", "DetectArray").unwrap();
        assert_eq!(values, vec![" a<b ", " <c> "]);
    }

    #[test]
    fn test_element_texts_rejects_wrong_root() {
        let err = element_texts("<string>en</string>", "ArrayOfstring", "string", "DetectArray")
            .unwrap_err();
        assert!(err.to_string().contains("ArrayOfstring"));
    }

    #[test]
    fn test_element_texts_rejects_truncated_document() {
        let err = element_texts("<ArrayOfstring><string>en</string>", "ArrayOfstring", "string", "DetectArray")
            .unwrap_err();
        assert!(matches!(err, TranslationError::ProviderError { .. }));
    }

    #[tokio::test]
    async fn test_detect_batch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/V2/Http.svc/DetectArray"))
            .and(body_string_contains("<ArrayOfstring"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<ArrayOfstring xmlns="{}"><string>en</string><string>pt</string></ArrayOfstring>"#,
                ARRAYS_NS
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = api_for(&mock_server)
            .detect_batch(&test_token(), &strings(&["hello", "olá"]))
            .await
            .expect("Should succeed");

        assert_eq!(result, vec!["en", "pt"]);
    }

    #[test]
    fn test_request_body_escapes_text() {
        let body = translate_array_body(&strings(&["<b>fish & chips</b>"]), "en", "pt");

        assert!(body.contains("&lt;b&gt;fish &amp; chips&lt;/b&gt;"));
        assert!(body.contains("<ContentType xmlns=\""));
        assert!(body.contains(">text/plain</ContentType>"));
        assert!(!body.contains("<b>fish"));
    }

    #[test]
    fn test_detect_body_wraps_strings() {
        let body = detect_array_body(&strings(&["a", "b"]));
        assert!(body.starts_with("<ArrayOfstring"));
        assert_eq!(body.matches("<string ").count(), 2);
    }
}
