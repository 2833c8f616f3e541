#![forbid(unsafe_code)]

//! Digest (hash) algorithm implementations and stream helpers.

use gostsig_core::{algorithm, Error};
use digest::Digest;
use std::io::{self, Read};

/// Buffer size used when digesting a stream.
pub const STREAM_BUFFER_SIZE: usize = 4096;

/// Trait for digest algorithms.
pub trait DigestAlgorithm: Send {
    /// Feed data into the hash.
    fn update(&mut self, data: &[u8]);
    /// Finalize and return the hash value.
    fn finalize(self: Box<Self>) -> Vec<u8>;
    /// Algorithm URI.
    fn uri(&self) -> &'static str;
}

/// Create a digest algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
    match uri {
        algorithm::GOSTR3411 => Ok(Box::new(Gost3411Digest::new())),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "digest algorithm: {uri}"
        ))),
    }
}

/// Compute a digest in one shot.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hasher = from_uri(uri)?;
    hasher.update(data);
    Ok(hasher.finalize())
}

/// GOST R 34.11-94 (CryptoPro S-box) of `data`.
pub fn gost3411(data: &[u8]) -> Vec<u8> {
    gost94::Gost94CryptoPro::digest(data).to_vec()
}

/// Digest everything `input` yields, reading [`STREAM_BUFFER_SIZE`] bytes at a time.
///
/// The stream is taken by value and dropped before returning, whether the
/// digest succeeded or a read failed.
pub fn calculate_digest<R: Read>(input: R, uri: &str) -> Result<Vec<u8>, Error> {
    let mut input = input;
    let mut hasher = from_uri(uri)?;
    let mut buf = [0u8; STREAM_BUFFER_SIZE];
    loop {
        match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                drop(input);
                tracing::warn!(error = %e, "reading the digested stream failed; stream released");
                return Err(Error::Io(e));
            }
        }
    }
    drop(input);
    Ok(hasher.finalize())
}

// ── DigestReader ─────────────────────────────────────────────────────

/// A reader that digests every byte read through it.
///
/// The digest becomes available once the wrapped stream reports
/// end-of-stream.
pub struct DigestReader<R> {
    inner: R,
    hasher: gost94::Gost94CryptoPro,
    digest: Option<Vec<u8>>,
}

impl<R: Read> DigestReader<R> {
    /// Wrap `inner`, digesting with GOST R 34.11-94.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: gost94::Gost94CryptoPro::new(),
            digest: None,
        }
    }

    /// The digest of everything read, once the stream is exhausted.
    pub fn digest(&self) -> Option<&[u8]> {
        self.digest.as_deref()
    }

    /// Whether the wrapped stream has reported end-of-stream.
    pub fn is_exhausted(&self) -> bool {
        self.digest.is_some()
    }

    /// Drain whatever is left and return the digest, releasing the stream.
    pub fn finish(mut self) -> Result<Vec<u8>, Error> {
        io::copy(&mut self, &mut io::sink())?;
        self.digest
            .take()
            .ok_or_else(|| Error::Crypto("digest stream ended without a digest".into()))
    }
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.digest.is_some() {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        if n == 0 {
            let hasher = std::mem::take(&mut self.hasher);
            self.digest = Some(Digest::finalize(hasher).to_vec());
        } else {
            Digest::update(&mut self.hasher, &buf[..n]);
        }
        Ok(n)
    }
}

// ── Concrete implementations ─────────────────────────────────────────

macro_rules! impl_digest {
    ($name:ident, $hasher:ty, $uri:expr) => {
        struct $name {
            inner: $hasher,
        }

        impl $name {
            fn new() -> Self {
                Self {
                    inner: <$hasher>::new(),
                }
            }
        }

        impl DigestAlgorithm for $name {
            fn update(&mut self, data: &[u8]) {
                Digest::update(&mut self.inner, data);
            }

            fn finalize(self: Box<Self>) -> Vec<u8> {
                Digest::finalize(self.inner).to_vec()
            }

            fn uri(&self) -> &'static str {
                $uri
            }
        }
    };
}

impl_digest!(Gost3411Digest, gost94::Gost94CryptoPro, algorithm::GOSTR3411);
