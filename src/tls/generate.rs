//! Self-signed certificate generation.

use std::net::IpAddr;

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType, SerialNumber};
use time::{Duration, OffsetDateTime};

use crate::error::{BrokerError, BrokerResult};

/// Subject of a generated certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSubject {
    pub country: String,
    pub state: String,
    pub locality: String,
    pub organization: String,
    /// The server address the certificate is issued for.
    pub common_name: String,
}

/// A freshly generated certificate and its plaintext key.
pub struct SelfSignedCertificate {
    /// PEM-encoded certificate.
    pub cert_pem: String,
    /// PKCS#8 DER private key, not yet encrypted.
    pub key_pkcs8_der: Vec<u8>,
}

/// Build a self-signed certificate for `subject`.
///
/// Issuer equals subject, the serial number is random, and the single
/// subject-alternative-name entry is an IP address when the common name
/// parses as one and a DNS name otherwise.
pub fn generate_self_signed(
    subject: &CertificateSubject,
    validity_days: u32,
) -> BrokerResult<SelfSignedCertificate> {
    let mut params = CertificateParams::default();

    let mut name = DistinguishedName::new();
    name.push(DnType::CountryName, subject.country.as_str());
    name.push(DnType::StateOrProvinceName, subject.state.as_str());
    name.push(DnType::LocalityName, subject.locality.as_str());
    name.push(DnType::OrganizationName, subject.organization.as_str());
    name.push(DnType::CommonName, subject.common_name.as_str());
    params.distinguished_name = name;

    params.subject_alt_names = vec![subject_alt_name(&subject.common_name)?];
    params.serial_number = Some(random_serial());

    let now = OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + Duration::days(i64::from(validity_days));

    let key_pair = KeyPair::generate().map_err(certificate_error)?;
    let cert = params.self_signed(&key_pair).map_err(certificate_error)?;

    Ok(SelfSignedCertificate {
        cert_pem: cert.pem(),
        key_pkcs8_der: key_pair.serialize_der(),
    })
}

/// SAN entry for a server address.
pub fn subject_alt_name(address: &str) -> BrokerResult<SanType> {
    match address.parse::<IpAddr>() {
        Ok(ip) => Ok(SanType::IpAddress(ip)),
        Err(_) => Ok(SanType::DnsName(address.try_into().map_err(certificate_error)?)),
    }
}

/// Positive 159-bit serial number.
fn random_serial() -> SerialNumber {
    let mut bytes: [u8; 20] = rand::random();
    bytes[0] = (bytes[0] & 0x7f) | 0x40;
    SerialNumber::from_slice(&bytes)
}

fn certificate_error(e: rcgen::Error) -> BrokerError {
    BrokerError::Certificate {
        message: e.to_string(),
    }
}
