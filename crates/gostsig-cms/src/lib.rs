#![forbid(unsafe_code)]

//! Detached CMS (PKCS#7) `SignedData` envelopes for binary content.
//!
//! The envelope carries no encapsulated content and no signed attributes:
//! the single `SignerInfo` holds a GOST R 34.10-2001 signature computed
//! directly over the caller's GOST R 34.11-94 digest, and the signer
//! certificate is embedded in `certificates`.

use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{
    CertificateSet, EncapsulatedContentInfo, SignedData, SignerIdentifier, SignerInfo,
    SignerInfos,
};
use der::asn1::{Any, ObjectIdentifier, OctetString, SetOfVec};
use der::{Decode, Encode};
use gostsig_core::{algorithm::oid, Error};
use gostsig_crypto::SigningKey;
use gostsig_keys::Certificate;
use x509_cert::spki::AlgorithmIdentifierOwned;

/// Outcome of verifying an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    /// The signature matches; carries the signer certificate.
    Valid(Certificate),
    /// The envelope is well-formed but does not verify.
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

fn der_err(e: der::Error) -> Error {
    Error::Der(e.to_string())
}

fn parse_oid(s: &str) -> Result<ObjectIdentifier, Error> {
    ObjectIdentifier::new(s).map_err(|e| Error::Der(e.to_string()))
}

fn algorithm_id(s: &str) -> Result<AlgorithmIdentifierOwned, Error> {
    Ok(AlgorithmIdentifierOwned {
        oid: parse_oid(s)?,
        parameters: None,
    })
}

/// Sign `digest` and wrap the signature in a detached `SignedData`.
pub fn sign_detached(digest: &[u8], key: &SigningKey, cert: &Certificate) -> Result<Vec<u8>, Error> {
    let signature = key.sign_digest(digest)?;
    let tbs = &cert.inner().tbs_certificate;

    let signer_info = SignerInfo {
        version: CmsVersion::V1,
        sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: tbs.issuer.clone(),
            serial_number: tbs.serial_number.clone(),
        }),
        digest_alg: algorithm_id(oid::GOSTR3411_94)?,
        signed_attrs: None,
        signature_algorithm: algorithm_id(oid::GOSTR3410_2001)?,
        signature: OctetString::new(signature).map_err(der_err)?,
        unsigned_attrs: None,
    };

    let signed_data = SignedData {
        version: CmsVersion::V1,
        digest_algorithms: SetOfVec::try_from(vec![algorithm_id(oid::GOSTR3411_94)?])
            .map_err(der_err)?,
        encap_content_info: EncapsulatedContentInfo {
            econtent_type: parse_oid(oid::PKCS7_DATA)?,
            econtent: None,
        },
        certificates: Some(CertificateSet(
            SetOfVec::try_from(vec![CertificateChoices::Certificate(cert.inner().clone())])
                .map_err(der_err)?,
        )),
        crls: None,
        signer_infos: SignerInfos(SetOfVec::try_from(vec![signer_info]).map_err(der_err)?),
    };

    let content_info = ContentInfo {
        content_type: parse_oid(oid::PKCS7_SIGNED_DATA)?,
        content: Any::encode_from(&signed_data).map_err(der_err)?,
    };
    tracing::debug!(signer = %cert.subject(), "built detached CMS envelope");
    content_info.to_der().map_err(der_err)
}

/// Verify a detached `SignedData` envelope against `digest`.
///
/// Malformed DER is an `Err`; a well-formed envelope that does not verify,
/// or carries no usable signer certificate, is [`VerifyResult::Invalid`].
pub fn verify_detached(digest: &[u8], envelope: &[u8]) -> Result<VerifyResult, Error> {
    let content_info = ContentInfo::from_der(envelope).map_err(der_err)?;
    if content_info.content_type.to_string() != oid::PKCS7_SIGNED_DATA {
        return Err(Error::Der(format!(
            "expected SignedData, got content type {}",
            content_info.content_type
        )));
    }
    let signed_data: SignedData = content_info.content.decode_as().map_err(der_err)?;

    let signer_info = signed_data
        .signer_infos
        .0
        .iter()
        .next()
        .ok_or_else(|| Error::MissingElement("SignerInfo".into()))?;

    let digest_oid = signer_info.digest_alg.oid.to_string();
    if digest_oid != oid::GOSTR3411_94 {
        return Err(Error::UnsupportedAlgorithm(format!("CMS digest algorithm {digest_oid}")));
    }
    let sig_oid = signer_info.signature_algorithm.oid.to_string();
    if sig_oid != oid::GOSTR3410_2001 && sig_oid != oid::GOSTR3411_94_WITH_GOSTR3410_2001 {
        return Err(Error::UnsupportedAlgorithm(format!("CMS signature algorithm {sig_oid}")));
    }
    if signer_info.signed_attrs.is_some() {
        return Err(Error::UnsupportedAlgorithm(
            "CMS signed attributes are not supported".into(),
        ));
    }

    let Some(certificate) = signer_certificate(&signed_data, &signer_info.sid)? else {
        return Ok(VerifyResult::Invalid {
            reason: "no public key information; the signature cannot be checked".into(),
        });
    };
    let public_key = certificate.public_key()?;
    if public_key.verify_digest(digest, signer_info.signature.as_bytes())? {
        Ok(VerifyResult::Valid(certificate))
    } else {
        Ok(VerifyResult::Invalid {
            reason: "signature integrity is violated".into(),
        })
    }
}

/// The embedded certificate matching the signer identifier.
fn signer_certificate(
    signed_data: &SignedData,
    sid: &SignerIdentifier,
) -> Result<Option<Certificate>, Error> {
    let SignerIdentifier::IssuerAndSerialNumber(id) = sid else {
        return Err(Error::Certificate(
            "only issuerAndSerialNumber signer identifiers are supported".into(),
        ));
    };
    let Some(certificates) = &signed_data.certificates else {
        return Ok(None);
    };
    for choice in certificates.0.iter() {
        if let CertificateChoices::Certificate(cert) = choice {
            let tbs = &cert.tbs_certificate;
            if tbs.issuer == id.issuer && tbs.serial_number == id.serial_number {
                let der = cert.to_der().map_err(der_err)?;
                return Certificate::from_der(&der).map(Some);
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gostsig_crypto::digest::gost3411;
    use gostsig_keys::x509::self_signed;

    fn signer() -> (SigningKey, Certificate) {
        let key = SigningKey::random(&mut rand::thread_rng());
        let cert = self_signed(&key, "cms signer").unwrap();
        (key, cert)
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let (key, cert) = signer();
        let digest = gost3411(b"binary payload");
        let envelope = sign_detached(&digest, &key, &cert).unwrap();
        assert_eq!(verify_detached(&digest, &envelope).unwrap(), VerifyResult::Valid(cert));
    }

    #[test]
    fn test_wrong_digest_is_invalid() {
        let (key, cert) = signer();
        let envelope = sign_detached(&gost3411(b"one"), &key, &cert).unwrap();
        let result = verify_detached(&gost3411(b"two"), &envelope).unwrap();
        assert!(matches!(result, VerifyResult::Invalid { reason } if reason.contains("integrity")));
    }

    #[test]
    fn test_missing_certificate_is_invalid() {
        let (key, cert) = signer();
        let digest = gost3411(b"payload");
        let envelope = sign_detached(&digest, &key, &cert).unwrap();

        let content_info = ContentInfo::from_der(&envelope).unwrap();
        let mut signed_data: SignedData = content_info.content.decode_as().unwrap();
        signed_data.certificates = None;
        let stripped = ContentInfo {
            content_type: content_info.content_type,
            content: Any::encode_from(&signed_data).unwrap(),
        }
        .to_der()
        .unwrap();

        let result = verify_detached(&digest, &stripped).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_garbage_envelope_is_an_error() {
        assert!(verify_detached(&[0u8; 32], b"\x30\x03\x02\x01\x01").is_err());
    }
}
