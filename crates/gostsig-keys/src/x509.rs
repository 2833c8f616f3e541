#![forbid(unsafe_code)]

//! X.509 certificates carrying GOST R 34.10-2001 public keys.
//!
//! The certificate is treated as the signer's key handle: it is embedded in
//! `KeyInfo` and in CMS envelopes, and its public key verifies signatures.
//! No chain or trust validation is performed.

use base64::Engine;
use der::asn1::{ObjectIdentifier, OctetString};
use der::{Decode, Encode, Sequence};
use gostsig_core::{algorithm::oid, Error};
use gostsig_crypto::VerifyingKey;

/// `GostR3410-2001-PublicKeyParameters`.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct GostKeyParams {
    pub public_key_param_set: ObjectIdentifier,
    pub digest_param_set: ObjectIdentifier,
}

/// A parsed certificate together with its DER encoding.
#[derive(Clone, Debug)]
pub struct Certificate {
    der: Vec<u8>,
    cert: x509_cert::Certificate,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Certificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let cert = x509_cert::Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse certificate: {e}")))?;
        Ok(Self {
            der: der.to_vec(),
            cert,
        })
    }

    /// Parse base64 DER, ignoring embedded whitespace (as in `X509Certificate`).
    pub fn from_base64(text: &str) -> Result<Self, Error> {
        let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let der = base64::engine::general_purpose::STANDARD
            .decode(&clean)
            .map_err(|e| Error::Base64(format!("X509Certificate: {e}")))?;
        Self::from_der(&der)
    }

    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.der)
    }

    /// The decoded certificate structure.
    pub fn inner(&self) -> &x509_cert::Certificate {
        &self.cert
    }

    pub fn subject(&self) -> String {
        self.cert.tbs_certificate.subject.to_string()
    }

    pub fn issuer(&self) -> String {
        self.cert.tbs_certificate.issuer.to_string()
    }

    pub fn serial_number(&self) -> &[u8] {
        self.cert.tbs_certificate.serial_number.as_bytes()
    }

    /// The GOST R 34.10-2001 public key in `subjectPublicKeyInfo`.
    pub fn public_key(&self) -> Result<VerifyingKey, Error> {
        let spki = &self.cert.tbs_certificate.subject_public_key_info;
        if spki.algorithm.oid.to_string() != oid::GOSTR3410_2001 {
            return Err(Error::Key(format!(
                "certificate key is not GOST R 34.10-2001 (algorithm {})",
                spki.algorithm.oid
            )));
        }
        let bits = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| Error::Key("public key BIT STRING has unused bits".into()))?;
        let point = OctetString::from_der(bits)
            .map_err(|e| Error::Der(format!("GOST public key: {e}")))?;
        VerifyingKey::from_le_bytes(point.as_bytes())
    }
}

/// Encode `key` as the `subjectPublicKey` content: an OCTET STRING of `x || y`.
pub fn encode_public_key(key: &VerifyingKey) -> Result<Vec<u8>, Error> {
    OctetString::new(key.to_le_bytes())
        .and_then(|o| o.to_der())
        .map_err(|e| Error::Der(e.to_string()))
}

/// Issue a self-signed certificate for `key` with subject `CN=<common_name>`.
///
/// Valid from now for one year.
#[cfg(any(test, feature = "test-util"))]
pub fn self_signed(
    key: &gostsig_crypto::SigningKey,
    common_name: &str,
) -> Result<Certificate, Error> {
    use der::asn1::{Any, BitString, UtcTime};
    use std::str::FromStr;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use x509_cert::name::Name;
    use x509_cert::serial_number::SerialNumber;
    use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
    use x509_cert::time::{Time, Validity};
    use x509_cert::{TbsCertificate, Version};

    let der_err = |e: der::Error| Error::Der(e.to_string());
    let parse_oid = |s: &str| ObjectIdentifier::new(s).map_err(|e| Error::Der(e.to_string()));

    let params = GostKeyParams {
        public_key_param_set: parse_oid(oid::CRYPTOPRO_A_PARAMSET)?,
        digest_param_set: parse_oid(oid::GOSTR3411_94_CRYPTOPRO_PARAMSET)?,
    };
    let spki = SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: parse_oid(oid::GOSTR3410_2001)?,
            parameters: Some(Any::encode_from(&params).map_err(der_err)?),
        },
        subject_public_key: BitString::from_bytes(&encode_public_key(&key.verifying_key())?)
            .map_err(der_err)?,
    };
    let signature_algorithm = AlgorithmIdentifierOwned {
        oid: parse_oid(oid::GOSTR3411_94_WITH_GOSTR3410_2001)?,
        parameters: None,
    };

    let name = Name::from_str(&format!("CN={common_name}")).map_err(der_err)?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Certificate(e.to_string()))?;
    let not_after = now + Duration::from_secs(365 * 24 * 60 * 60);
    let validity = Validity {
        not_before: Time::UtcTime(UtcTime::from_unix_duration(now).map_err(der_err)?),
        not_after: Time::UtcTime(UtcTime::from_unix_duration(not_after).map_err(der_err)?),
    };
    let serial = now.as_nanos().to_be_bytes();
    let serial = &serial[serial.iter().position(|&b| b != 0).unwrap_or(15)..];

    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(serial).map_err(der_err)?,
        signature: signature_algorithm.clone(),
        issuer: name.clone(),
        subject: name,
        validity,
        subject_public_key_info: spki,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: None,
    };
    let tbs_der = tbs_certificate.to_der().map_err(der_err)?;
    let signer = gostsig_crypto::sign::from_uri(gostsig_core::algorithm::profile::SIGNATURE)?;
    let signature = signer.sign(key, &tbs_der)?;

    let cert = x509_cert::Certificate {
        tbs_certificate,
        signature_algorithm,
        signature: BitString::from_bytes(&signature).map_err(der_err)?,
    };
    Certificate::from_der(&cert.to_der().map_err(der_err)?)
}
