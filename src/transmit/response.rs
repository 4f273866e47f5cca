//! Integrator response interpretation.
//!
//! The provider's response format is unreliable: sometimes a well-formed
//! SOAP body with a namespaced `return` node, sometimes mangled namespaces or
//! bare fragments. Interpretation is therefore a deliberate two-stage chain:
//! structured extraction first, independent per-field regex extraction as the
//! fallback. The stages are ordered on purpose - do not collapse them.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Codes the integrator uses to signal success.
const SUCCESS_CODES: &[&str] = &["000", "0"];

/// Last-resort keywords scanned in the explanation when no code is present.
/// Matched against the lowercased text.
const SUCCESS_KEYWORDS: &[&str] = &["başarı", "basari", "success"];

/// Classified transmission outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Provider acknowledged the document.
    Accepted,
    /// HTTP error status or an explicit fault marker in the body. Evaluated
    /// before anything else and short-circuits success evaluation.
    ProtocolFault {
        code: Option<String>,
        string: Option<String>,
        detail: Option<String>,
    },
    /// Well-formed response with a non-success code. Not retryable with the
    /// same content; the underlying data needs correction.
    Rejected,
    /// Neither parsing stage extracted a code or a usable explanation.
    /// Surfaced distinctly so operators do not conflate "provider said no"
    /// with "we could not tell what the provider said".
    Indeterminate,
}

/// Result of one transmission attempt. Business-level outcomes live here;
/// only transport failures are raised as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmissionResult {
    pub success: bool,
    pub http_status: u16,
    pub outcome: Outcome,
    pub response_code: Option<String>,
    pub explanation: Option<String>,
    pub cause: Option<String>,
    pub provider_document_uuid: Option<String>,
    /// Verbatim response body, kept for diagnostics.
    pub raw_body: String,
}

/// Fields of the provider's `return` node, however we managed to get them.
#[derive(Debug, Default, PartialEq, Eq)]
struct Reply {
    code: Option<String>,
    explanation: Option<String>,
    cause: Option<String>,
    document_uuid: Option<String>,
}

impl Reply {
    fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.explanation.is_none()
            && self.cause.is_none()
            && self.document_uuid.is_none()
    }
}

static FAULT_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:[a-z0-9]+:)?Fault[\s>/]|<faultcode").expect("valid regex")
});
static FAULT_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9]+:)?faultcode[^>]*>\s*([^<]*?)\s*</").expect("valid regex")
});
static FAULT_STRING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9]+:)?faultstring[^>]*>\s*([^<]*?)\s*</").expect("valid regex")
});
static FAULT_DETAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9]+:)?detail[^>]*>(.*?)</(?:[a-z0-9]+:)?detail\s*>")
        .expect("valid regex")
});
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9]+:)?code[^>]*>\s*([^<]*?)\s*</").expect("valid regex")
});
static EXPLANATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9]+:)?explanation[^>]*>\s*([^<]*?)\s*</").expect("valid regex")
});
static CAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9]+:)?cause[^>]*>\s*([^<]*?)\s*</").expect("valid regex")
});
static DOCUMENT_UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[a-z0-9]+:)?documentUUID[^>]*>\s*([^<]*?)\s*</").expect("valid regex")
});

/// Classify a raw HTTP response into a [`TransmissionResult`].
pub fn classify(http_status: u16, raw_body: String) -> TransmissionResult {
    // Faults win over everything, even a success code elsewhere in the body.
    if http_status >= 400 || FAULT_MARKER_RE.is_match(&raw_body) {
        let code = capture(&FAULT_CODE_RE, &raw_body);
        let string = capture(&FAULT_STRING_RE, &raw_body);
        let detail = capture(&FAULT_DETAIL_RE, &raw_body);
        tracing::warn!(http_status, fault_code = ?code, "integrator returned a protocol fault");
        return TransmissionResult {
            success: false,
            http_status,
            outcome: Outcome::ProtocolFault {
                code: code.clone(),
                string: string.clone(),
                detail,
            },
            response_code: code,
            explanation: string,
            cause: None,
            provider_document_uuid: None,
            raw_body,
        };
    }

    let reply = match extract_structured(&raw_body) {
        Some(reply) if !reply.is_empty() => reply,
        _ => {
            tracing::debug!("structured extraction yielded nothing, falling back to regex");
            extract_fallback(&raw_body)
        }
    };

    let (success, outcome) = evaluate(&reply);
    TransmissionResult {
        success,
        http_status,
        outcome,
        response_code: reply.code,
        explanation: reply.explanation,
        cause: reply.cause,
        provider_document_uuid: reply.document_uuid,
        raw_body,
    }
}

fn evaluate(reply: &Reply) -> (bool, Outcome) {
    match reply.code.as_deref().map(str::trim) {
        Some(code) if SUCCESS_CODES.contains(&code) => (true, Outcome::Accepted),
        Some(code) if !code.is_empty() => (false, Outcome::Rejected),
        // No code: the explanation keyword scan is the last-resort success
        // signal; anything else is indeterminate, never a silent failure.
        _ => match reply.explanation.as_deref() {
            Some(explanation) if contains_success_keyword(explanation) => {
                (true, Outcome::Accepted)
            }
            _ => (false, Outcome::Indeterminate),
        },
    }
}

fn contains_success_keyword(explanation: &str) -> bool {
    let lowered = explanation.to_lowercase();
    SUCCESS_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Stage 1: namespace-tolerant structured extraction of the `return` node.
/// Returns `None` on malformed XML so the regex stage gets its turn.
fn extract_structured(body: &str) -> Option<Reply> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut reply = Reply::default();
    let mut in_return = false;
    let mut current_field: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if local == "return" {
                    in_return = true;
                } else if in_return {
                    current_field = Some(local);
                }
            }
            Ok(Event::Text(t)) => {
                if in_return {
                    if let Some(field) = current_field.as_deref() {
                        let value = t.unescape().ok()?.trim().to_string();
                        if !value.is_empty() {
                            match field {
                                "code" => reply.code = Some(value),
                                "explanation" => reply.explanation = Some(value),
                                "cause" => reply.cause = Some(value),
                                "documentUUID" | "documentUuid" => {
                                    reply.document_uuid = Some(value)
                                }
                                _ => {}
                            }
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if local == "return" {
                    in_return = false;
                }
                current_field = None;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }
    Some(reply)
}

/// Stage 2: independent regex extraction per field from the raw body.
fn extract_fallback(body: &str) -> Reply {
    Reply {
        code: capture(&CODE_RE, body),
        explanation: capture(&EXPLANATION_RE, body),
        cause: capture(&CAUSE_RE, body),
        document_uuid: capture(&DOCUMENT_UUID_RE, body),
    }
}

fn capture(re: &Regex, body: &str) -> Option<String> {
    re.captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <ns2:sendDocumentResponse xmlns:ns2="http://service.integrator.example/">
      <return>
        <code>000</code>
        <explanation>İşlem başarıyla tamamlandı</explanation>
        <documentUUID>f81d4fae-7dec-11d0-a765-00a0c91e6bf6</documentUUID>
      </return>
    </ns2:sendDocumentResponse>
  </soap:Body>
</soap:Envelope>"#;

    #[test]
    fn structured_success() {
        let result = classify(200, OK_BODY.to_string());
        assert!(result.success);
        assert_eq!(result.outcome, Outcome::Accepted);
        assert_eq!(result.response_code.as_deref(), Some("000"));
        assert_eq!(
            result.provider_document_uuid.as_deref(),
            Some("f81d4fae-7dec-11d0-a765-00a0c91e6bf6")
        );
    }

    #[test]
    fn fault_wins_even_with_success_code_in_body() {
        let body = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Server</faultcode>
      <faultstring>internal error</faultstring>
      <detail><code>000</code></detail>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#;
        let result = classify(500, body.to_string());
        assert!(!result.success);
        match result.outcome {
            Outcome::ProtocolFault { code, string, .. } => {
                assert_eq!(code.as_deref(), Some("soap:Server"));
                assert_eq!(string.as_deref(), Some("internal error"));
            }
            other => panic!("expected ProtocolFault, got {other:?}"),
        }
    }

    #[test]
    fn http_error_without_fault_markup_is_protocol_fault() {
        let result = classify(503, "Service Unavailable".to_string());
        assert!(matches!(result.outcome, Outcome::ProtocolFault { .. }));
    }

    #[test]
    fn regex_fallback_handles_mangled_namespaces() {
        // unclosed namespace prefix declaration makes this unparseable XML
        let body = r#"<ns1:return xmlns:ns1="><ns1:code>200</ns1:code><ns1:explanation>kayıt bulunamadı</ns1:explanation></ns1:return>"#;
        let result = classify(200, body.to_string());
        assert!(!result.success);
        assert_eq!(result.outcome, Outcome::Rejected);
        assert_eq!(result.response_code.as_deref(), Some("200"));
        assert_eq!(result.explanation.as_deref(), Some("kayıt bulunamadı"));
    }

    #[test]
    fn keyword_heuristic_when_code_missing() {
        let body = "<return><explanation>İşlem başarıyla tamamlandı</explanation></return>";
        let result = classify(200, body.to_string());
        assert!(result.success);
        assert_eq!(result.outcome, Outcome::Accepted);
    }

    #[test]
    fn zero_code_variant_is_success() {
        let body = "<return><code>0</code></return>";
        let result = classify(200, body.to_string());
        assert!(result.success);
    }

    #[test]
    fn rejection_code_is_not_success() {
        let body =
            "<return><code>101</code><cause>VKN gecersiz</cause></return>";
        let result = classify(200, body.to_string());
        assert!(!result.success);
        assert_eq!(result.outcome, Outcome::Rejected);
        assert_eq!(result.cause.as_deref(), Some("VKN gecersiz"));
    }

    #[test]
    fn no_signal_is_indeterminate() {
        let result = classify(200, "<html>proxy page</html>".to_string());
        assert!(!result.success);
        assert_eq!(result.outcome, Outcome::Indeterminate);
    }

    #[test]
    fn explanation_without_keyword_is_indeterminate() {
        let body = "<return><explanation>beklemede</explanation></return>";
        let result = classify(200, body.to_string());
        assert!(!result.success);
        assert_eq!(result.outcome, Outcome::Indeterminate);
        assert_eq!(result.explanation.as_deref(), Some("beklemede"));
    }
}
