#![forbid(unsafe_code)]

//! GOST R 34.10-2001 signatures over the CryptoPro-A parameter set.
//!
//! Points are kept in Jacobian coordinates during scalar multiplication and
//! converted to affine form once at the end.
//!
//! Encodings:
//! - signature value: `s || r`, 32 bytes each, big-endian
//! - digest: interpreted as a little-endian integer before reduction mod q
//! - public key: `x || y`, 32 bytes each, little-endian

use gostsig_core::Error;
use num_bigint_dig::BigUint;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use std::fmt;
use std::sync::OnceLock;

/// Length of a coordinate, a scalar and each signature half.
pub const SCALAR_LEN: usize = 32;

// id-GostR3410-2001-CryptoPro-A-ParamSet
const P_HEX: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFD97";
const A_HEX: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFD94";
const B_HEX: &str = "A6";
const Q_HEX: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF6C611070995AD10045841B09B761B893";
const GX_HEX: &str = "1";
const GY_HEX: &str = "8D91E471E0989CDA27DF505A453F2B7635294F2DDF23E3B122ACC99C9E9F1E14";

struct Curve {
    p: BigUint,
    a: BigUint,
    b: BigUint,
    q: BigUint,
    g: Jacobian,
}

fn hex(s: &str) -> BigUint {
    BigUint::parse_bytes(s.as_bytes(), 16).unwrap_or_else(BigUint::zero)
}

/// The CryptoPro-A curve.
fn curve() -> &'static Curve {
    static CURVE: OnceLock<Curve> = OnceLock::new();
    CURVE.get_or_init(|| Curve::from_hex(P_HEX, A_HEX, B_HEX, Q_HEX, GX_HEX, GY_HEX))
}

impl Curve {
    fn from_hex(p: &str, a: &str, b: &str, q: &str, gx: &str, gy: &str) -> Self {
        Self {
            p: hex(p),
            a: hex(a),
            b: hex(b),
            q: hex(q),
            g: Jacobian {
                x: hex(gx),
                y: hex(gy),
                z: BigUint::one(),
            },
        }
    }

    fn is_on_curve(&self, x: &BigUint, y: &BigUint) -> bool {
        let p = &self.p;
        if x >= p || y >= p {
            return false;
        }
        let lhs = mul_mod(y, y, p);
        let x3 = mul_mod(&mul_mod(x, x, p), x, p);
        let rhs = add_mod(&add_mod(&x3, &mul_mod(&self.a, x, p), p), &self.b, p);
        lhs == rhs
    }

    /// The digest as an integer mod q; zero maps to one.
    fn digest_scalar(&self, digest: &[u8]) -> BigUint {
        let e = BigUint::from_bytes_le(digest) % &self.q;
        if e.is_zero() {
            BigUint::one()
        } else {
            e
        }
    }

    /// Random scalar in `[1, q-1]`.
    fn random_scalar<R: RngCore + CryptoRng>(&self, rng: &mut R) -> BigUint {
        let mut buf = [0u8; SCALAR_LEN + 8];
        rng.fill_bytes(&mut buf);
        BigUint::from_bytes_be(&buf) % (&self.q - BigUint::one()) + BigUint::one()
    }

    /// `(r, s)` for private key `d`, digest scalar `e` and nonce `k`;
    /// `None` when `k` has to be replaced.
    fn sign_with_nonce(&self, d: &BigUint, e: &BigUint, k: &BigUint) -> Option<(BigUint, BigUint)> {
        let q = &self.q;
        let (x, _) = self.g.mul(k, self).to_affine(self)?;
        let r = x % q;
        if r.is_zero() {
            return None;
        }
        let s = add_mod(&mul_mod(&r, d, q), &mul_mod(k, e, q), q);
        if s.is_zero() {
            return None;
        }
        Some((r, s))
    }

    fn verify(&self, public: (&BigUint, &BigUint), e: &BigUint, r: &BigUint, s: &BigUint) -> bool {
        let q = &self.q;
        if r.is_zero() || s.is_zero() || r >= q || s >= q {
            return false;
        }
        let v = inv_mod(e, q);
        let z1 = mul_mod(s, &v, q);
        let z2 = sub_mod(&BigUint::zero(), &mul_mod(r, &v, q), q);
        let public = Jacobian {
            x: public.0.clone(),
            y: public.1.clone(),
            z: BigUint::one(),
        };
        let point = self.g.mul(&z1, self).add(&public.mul(&z2, self), self);
        match point.to_affine(self) {
            Some((x, _)) => &(x % q) == r,
            None => false,
        }
    }
}

// ── Field and group arithmetic ───────────────────────────────────────

fn add_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a + b) % m
}

/// `a - b mod m` for reduced operands.
fn sub_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    ((a + m) - b) % m
}

fn mul_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a * b) % m
}

/// Inverse modulo a prime, by Fermat.
fn inv_mod(a: &BigUint, m: &BigUint) -> BigUint {
    a.modpow(&(m - BigUint::from(2u32)), m)
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Jacobian {
    x: BigUint,
    y: BigUint,
    z: BigUint,
}

impl Jacobian {
    fn infinity() -> Self {
        Self {
            x: BigUint::one(),
            y: BigUint::one(),
            z: BigUint::zero(),
        }
    }

    fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    fn double(&self, c: &Curve) -> Self {
        if self.is_infinity() || self.y.is_zero() {
            return Self::infinity();
        }
        let p = &c.p;
        let xx = mul_mod(&self.x, &self.x, p);
        let yy = mul_mod(&self.y, &self.y, p);
        let yyyy = mul_mod(&yy, &yy, p);
        let zz = mul_mod(&self.z, &self.z, p);
        let s = mul_mod(&BigUint::from(4u32), &mul_mod(&self.x, &yy, p), p);
        let m = add_mod(
            &mul_mod(&BigUint::from(3u32), &xx, p),
            &mul_mod(&c.a, &mul_mod(&zz, &zz, p), p),
            p,
        );
        let x3 = sub_mod(&mul_mod(&m, &m, p), &add_mod(&s, &s, p), p);
        let y3 = sub_mod(
            &mul_mod(&m, &sub_mod(&s, &x3, p), p),
            &mul_mod(&BigUint::from(8u32), &yyyy, p),
            p,
        );
        let z3 = mul_mod(&BigUint::from(2u32), &mul_mod(&self.y, &self.z, p), p);
        Self { x: x3, y: y3, z: z3 }
    }

    fn add(&self, other: &Self, c: &Curve) -> Self {
        if self.is_infinity() {
            return other.clone();
        }
        if other.is_infinity() {
            return self.clone();
        }
        let p = &c.p;
        let z1z1 = mul_mod(&self.z, &self.z, p);
        let z2z2 = mul_mod(&other.z, &other.z, p);
        let u1 = mul_mod(&self.x, &z2z2, p);
        let u2 = mul_mod(&other.x, &z1z1, p);
        let s1 = mul_mod(&self.y, &mul_mod(&other.z, &z2z2, p), p);
        let s2 = mul_mod(&other.y, &mul_mod(&self.z, &z1z1, p), p);
        if u1 == u2 {
            return if s1 == s2 {
                self.double(c)
            } else {
                Self::infinity()
            };
        }
        let h = sub_mod(&u2, &u1, p);
        let r = sub_mod(&s2, &s1, p);
        let hh = mul_mod(&h, &h, p);
        let hhh = mul_mod(&h, &hh, p);
        let v = mul_mod(&u1, &hh, p);
        let x3 = sub_mod(
            &sub_mod(&mul_mod(&r, &r, p), &hhh, p),
            &add_mod(&v, &v, p),
            p,
        );
        let y3 = sub_mod(
            &mul_mod(&r, &sub_mod(&v, &x3, p), p),
            &mul_mod(&s1, &hhh, p),
            p,
        );
        let z3 = mul_mod(&mul_mod(&self.z, &other.z, p), &h, p);
        Self { x: x3, y: y3, z: z3 }
    }

    /// Double-and-add, most significant bit first.
    fn mul(&self, k: &BigUint, c: &Curve) -> Self {
        let mut acc = Self::infinity();
        for byte in k.to_bytes_be() {
            for bit in (0..8).rev() {
                acc = acc.double(c);
                if (byte >> bit) & 1 == 1 {
                    acc = acc.add(self, c);
                }
            }
        }
        acc
    }

    /// Affine `(x, y)`, or `None` for the point at infinity.
    fn to_affine(&self, c: &Curve) -> Option<(BigUint, BigUint)> {
        if self.is_infinity() {
            return None;
        }
        let p = &c.p;
        let zinv = inv_mod(&self.z, p);
        let zinv2 = mul_mod(&zinv, &zinv, p);
        let x = mul_mod(&self.x, &zinv2, p);
        let y = mul_mod(&self.y, &mul_mod(&zinv2, &zinv, p), p);
        Some((x, y))
    }
}

/// Big-endian, left-padded to [`SCALAR_LEN`].
fn to_fixed_be(n: &BigUint) -> [u8; SCALAR_LEN] {
    let bytes = n.to_bytes_be();
    let mut out = [0u8; SCALAR_LEN];
    out[SCALAR_LEN - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Little-endian, right-padded to [`SCALAR_LEN`].
fn to_fixed_le(n: &BigUint) -> [u8; SCALAR_LEN] {
    let bytes = n.to_bytes_le();
    let mut out = [0u8; SCALAR_LEN];
    out[..bytes.len()].copy_from_slice(&bytes);
    out
}

/// `s || r`, each big-endian.
fn encode_signature(r: &BigUint, s: &BigUint) -> Vec<u8> {
    let mut signature = Vec::with_capacity(2 * SCALAR_LEN);
    signature.extend_from_slice(&to_fixed_be(s));
    signature.extend_from_slice(&to_fixed_be(r));
    signature
}

/// Split an `s || r` value into `(r, s)`.
fn decode_signature(signature: &[u8]) -> Result<(BigUint, BigUint), Error> {
    if signature.len() != 2 * SCALAR_LEN {
        return Err(Error::Crypto(format!(
            "GOST signature must be {} bytes, got {}",
            2 * SCALAR_LEN,
            signature.len()
        )));
    }
    let s = BigUint::from_bytes_be(&signature[..SCALAR_LEN]);
    let r = BigUint::from_bytes_be(&signature[SCALAR_LEN..]);
    Ok((r, s))
}

// ── Keys ─────────────────────────────────────────────────────────────

/// A GOST R 34.10-2001 private key.
#[derive(Clone)]
pub struct SigningKey {
    d: BigUint,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Generate a fresh key.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            d: curve().random_scalar(rng),
        }
    }

    /// Load a private scalar (big-endian).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let d = BigUint::from_bytes_be(bytes);
        if d.is_zero() || d >= curve().q {
            return Err(Error::Key("GOST private key out of range".into()));
        }
        Ok(Self { d })
    }

    /// The private scalar, big-endian.
    pub fn to_bytes(&self) -> [u8; SCALAR_LEN] {
        to_fixed_be(&self.d)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        // d is in [1, q-1], so dG is never the point at infinity.
        let c = curve();
        let (x, y) = c
            .g
            .mul(&self.d, c)
            .to_affine(c)
            .unwrap_or_else(|| (BigUint::zero(), BigUint::zero()));
        VerifyingKey { x, y }
    }

    /// Sign a precomputed GOST R 34.11-94 digest.
    pub fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, Error> {
        self.sign_digest_with_rng(digest, &mut rand::thread_rng())
    }

    pub fn sign_digest_with_rng<R: RngCore + CryptoRng>(
        &self,
        digest: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, Error> {
        if digest.is_empty() {
            return Err(Error::Crypto("cannot sign an empty digest".into()));
        }
        let c = curve();
        let e = c.digest_scalar(digest);
        loop {
            let k = c.random_scalar(rng);
            if let Some((r, s)) = c.sign_with_nonce(&self.d, &e, &k) {
                return Ok(encode_signature(&r, &s));
            }
        }
    }
}

/// A GOST R 34.10-2001 public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKey {
    x: BigUint,
    y: BigUint,
}

impl VerifyingKey {
    /// Parse `x || y` little-endian coordinates, as carried in certificates.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != 2 * SCALAR_LEN {
            return Err(Error::Key(format!(
                "GOST public key must be {} bytes, got {}",
                2 * SCALAR_LEN,
                bytes.len()
            )));
        }
        let x = BigUint::from_bytes_le(&bytes[..SCALAR_LEN]);
        let y = BigUint::from_bytes_le(&bytes[SCALAR_LEN..]);
        if !curve().is_on_curve(&x, &y) {
            return Err(Error::Key("GOST public key is not on the curve".into()));
        }
        Ok(Self { x, y })
    }

    /// `x || y` little-endian coordinates.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 * SCALAR_LEN);
        out.extend_from_slice(&to_fixed_le(&self.x));
        out.extend_from_slice(&to_fixed_le(&self.y));
        out
    }

    /// Verify an `s || r` signature over a precomputed digest.
    pub fn verify_digest(&self, digest: &[u8], signature: &[u8]) -> Result<bool, Error> {
        let (r, s) = decode_signature(signature)?;
        let c = curve();
        Ok(c.verify((&self.x, &self.y), &c.digest_scalar(digest), &r, &s))
    }
}
