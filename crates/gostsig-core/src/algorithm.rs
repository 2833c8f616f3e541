#![forbid(unsafe_code)]

//! Algorithm identifiers for the signing profile.
//!
//! Each URI constant is the exact string that appears in an `Algorithm`
//! attribute; the OID constants are used by the CMS envelope and by
//! X.509 certificates carrying GOST keys.

// ── Canonicalization ─────────────────────────────────────────────────

pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub const EXC_C14N_WITH_COMMENTS: &str = "http://www.w3.org/2001/10/xml-exc-c14n#WithComments";

// ── Digest and signature (GOST R 34.11-94 / GOST R 34.10-2001) ───────

pub const GOSTR3411: &str = "http://www.w3.org/2001/04/xmldsig-more#gostr3411";
pub const GOSTR34102001_GOSTR3411: &str =
    "http://www.w3.org/2001/04/xmldsig-more#gostr34102001-gostr3411";

// ── Transform algorithms ─────────────────────────────────────────────

pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
/// SMEV content-preparation transform, applied after canonicalization.
pub const SMEV_TRANSFORM: &str = "urn://smev-gov-ru/xmldsig/transform";

/// The profile's fixed algorithm choices.
pub mod profile {
    pub const CANONICALIZATION: &str = super::EXC_C14N;
    pub const DIGEST: &str = super::GOSTR3411;
    pub const SIGNATURE: &str = super::GOSTR34102001_GOSTR3411;
}

// ── Object identifiers ───────────────────────────────────────────────

pub mod oid {
    /// id-GostR3411-94
    pub const GOSTR3411_94: &str = "1.2.643.2.2.9";
    /// id-GostR3410-2001 (public key and signature algorithm)
    pub const GOSTR3410_2001: &str = "1.2.643.2.2.19";
    /// id-GostR3411-94-with-GostR3410-2001
    pub const GOSTR3411_94_WITH_GOSTR3410_2001: &str = "1.2.643.2.2.3";
    /// id-GostR3410-2001-CryptoPro-A-ParamSet
    pub const CRYPTOPRO_A_PARAMSET: &str = "1.2.643.2.2.35.1";
    /// id-GostR3411-94-CryptoProParamSet
    pub const GOSTR3411_94_CRYPTOPRO_PARAMSET: &str = "1.2.643.2.2.30.1";
    /// id-data
    pub const PKCS7_DATA: &str = "1.2.840.113549.1.7.1";
    /// id-signedData
    pub const PKCS7_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
}
