//! Classic management-certificate XML parsing (§4E.e).
//!
//! The classic `GET {management}/{subId}/certificates` endpoint returns an
//! XML document listing `SubscriptionCertificate` elements; only the
//! thumbprint and creation date are of interest here.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// One parsed `SubscriptionCertificate` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementCertificate {
    pub thumbprint: String,
    pub created: String,
}

/// Extracts every `SubscriptionCertificateThumbprint`/`Created` pair found
/// inside a `SubscriptionCertificate` element.
///
/// Malformed XML yields an empty list rather than an error: the caller
/// has already checked for a `ForbiddenError` body and any other failure
/// here is logged and the subscription's certificates are simply skipped
/// (§7 `TransportError`: "log, skip the item").
#[must_use]
pub fn parse_management_certificates(xml: &str) -> Vec<ManagementCertificate> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut certs = Vec::new();
    let mut current_thumbprint: Option<String> = None;
    let mut current_created: Option<String> = None;
    let mut current_tag = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                current_tag = local_name(e.name().as_ref());
                if current_tag == "SubscriptionCertificate" {
                    current_thumbprint = None;
                    current_created = None;
                }
            }
            Ok(Event::Text(text)) => {
                let value = text.unescape().unwrap_or_default().to_string();
                match current_tag.as_str() {
                    "SubscriptionCertificateThumbprint" => current_thumbprint = Some(value),
                    "Created" => current_created = Some(value),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == "SubscriptionCertificate" {
                    if let (Some(thumbprint), Some(created)) =
                        (current_thumbprint.take(), current_created.take())
                    {
                        certs.push(ManagementCertificate { thumbprint, created });
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    certs
}

fn local_name(qualified: &[u8]) -> String {
    let name = String::from_utf8_lossy(qualified);
    name.rsplit(':').next().unwrap_or(&name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<SubscriptionCertificates xmlns="http://schemas.microsoft.com/windowsazure">
  <SubscriptionCertificate>
    <SubscriptionCertificateThumbprint>ABC123</SubscriptionCertificateThumbprint>
    <Created>2020-01-01T00:00:00Z</Created>
  </SubscriptionCertificate>
  <SubscriptionCertificate>
    <SubscriptionCertificateThumbprint>DEF456</SubscriptionCertificateThumbprint>
    <Created>2021-06-15T00:00:00Z</Created>
  </SubscriptionCertificate>
</SubscriptionCertificates>"#;

    #[test]
    fn parses_every_certificate_entry() {
        let certs = parse_management_certificates(SAMPLE);
        assert_eq!(certs.len(), 2);
        assert_eq!(certs[0].thumbprint, "ABC123");
        assert_eq!(certs[1].created, "2021-06-15T00:00:00Z");
    }

    #[test]
    fn malformed_xml_yields_no_certificates() {
        assert!(parse_management_certificates("not xml at all").is_empty());
    }

    #[test]
    fn empty_list_yields_no_certificates() {
        let xml = r#"<SubscriptionCertificates xmlns="http://schemas.microsoft.com/windowsazure"/>"#;
        assert!(parse_management_certificates(xml).is_empty());
    }
}
