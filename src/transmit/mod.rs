//! Envelope construction and synchronous submission to the invoicing
//! integrator.
//!
//! One blocking POST per call with bounded timeouts. Credentials travel as
//! custom plaintext headers and are passed per call - there is no shared
//! mutable client state, so one process can serve many tenants concurrently.
//! Retry scheduling and backoff belong to the external job layer; on a
//! transport failure the caller resends the *same* [`InvoiceDocument`].

mod response;

pub use response::{Outcome, TransmissionResult};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::EfaturaError;
use crate::ubl::InvoiceDocument;

/// Credential pair sent as `Username`/`Password` headers, never in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Sender/receiver mailbox aliases. Required for the business regime, where
/// the envelope must name both endpoints; consumer documents have no
/// receiving mailbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxPair {
    pub sender: String,
    pub receiver: String,
}

/// Per-call transmission parameters.
#[derive(Debug, Clone)]
pub struct TransmitConfig {
    pub endpoint_url: String,
    pub credentials: Credentials,
    /// Required when sending `TEMELFATURA` documents.
    pub mailboxes: Option<MailboxPair>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl TransmitConfig {
    /// 30 s connect + 30 s overall timeouts.
    pub fn new(endpoint_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            credentials,
            mailboxes: None,
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn mailboxes(mut self, pair: MailboxPair) -> Self {
        self.mailboxes = Some(pair);
        self
    }
}

/// Submit a built document. Business-level outcomes - acceptance, rejection,
/// provider fault, indeterminate response - come back as an `Ok`
/// [`TransmissionResult`]; only transport failures are errors.
pub fn send(
    document: &InvoiceDocument,
    config: &TransmitConfig,
) -> Result<TransmissionResult, EfaturaError> {
    let envelope = build_envelope(document, config.mailboxes.as_ref())?;

    let client = reqwest::blocking::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout)
        .build()
        .map_err(|e| EfaturaError::Transport(e.to_string()))?;

    tracing::debug!(
        document_id = %document.document_id,
        profile = document.profile.code(),
        endpoint = %config.endpoint_url,
        "submitting document"
    );

    let response = client
        .post(&config.endpoint_url)
        .header("Content-Type", "text/xml; charset=utf-8")
        .header("SOAPAction", "")
        .header("Username", &config.credentials.username)
        .header("Password", &config.credentials.password)
        .body(envelope)
        .send()
        .map_err(|e| EfaturaError::Transport(e.to_string()))?;

    let http_status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|e| EfaturaError::Transport(e.to_string()))?;

    tracing::debug!(http_status, body_len = body.len(), "integrator responded");
    Ok(response::classify(http_status, body))
}

/// Wrap the document as CDATA in the regime-selected envelope. The consumer
/// envelope carries only the content and identifying metadata; the business
/// envelope additionally names the sender and receiver mailboxes.
pub(crate) fn build_envelope(
    document: &InvoiceDocument,
    mailboxes: Option<&MailboxPair>,
) -> Result<String, EfaturaError> {
    let addressing = if document.profile.is_consumer() {
        String::new()
    } else {
        let pair = mailboxes.ok_or_else(|| {
            EfaturaError::Configuration(
                "sender/receiver mailbox aliases are required for TEMELFATURA documents".into(),
            )
        })?;
        format!(
            "\n      <senderAlias>{}</senderAlias>\n      <receiverAlias>{}</receiverAlias>",
            escape_text(&pair.sender),
            escape_text(&pair.receiver),
        )
    };

    Ok(format!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Header/>
  <soapenv:Body>
    <sendDocument>
      <documentId>{id}</documentId>
      <documentUUID>{uuid}</documentUUID>{addressing}
      <document><![CDATA[{content}]]></document>
    </sendDocument>
  </soapenv:Body>
</soapenv:Envelope>"#,
        id = escape_text(&document.document_id),
        uuid = escape_text(&document.uuid),
        content = cdata_safe(&document.xml),
    ))
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A `]]>` inside the payload would terminate the CDATA section early; split
/// it across two sections.
fn cdata_safe(content: &str) -> String {
    content.replace("]]>", "]]]]><![CDATA[>")
}
