// ============================================
// File: crates/coordnode-core/src/crypto/ecdh.rs
// ============================================
//! # Elliptic-Curve Diffie-Hellman
//!
//! ## Creation Reason
//! Every handshake step (mID 0x01, 0x03, 0x05) answers the sensor's
//! ephemeral public point with a fresh point of our own and hashes the
//! shared point into new keys.
//!
//! ## Main Functionality
//! - `CurveParams`: the curve constants, carried as configuration
//! - `Ecdh`: validated context exposing generate/check/derive
//! - `EphemeralKeyPair`: single-use credential consumed by `agree`
//!
//! ## Encoding
//! ```text
//! Public point:  ┌──────────── X (32B) ────────────┬──────────── Y (32B) ────────────┐
//! Shared secret: │  X of d·Q, big-endian, padded   │  Y of d·Q, big-endian, padded   │
//!                └─────────────────────────────────┴─────────────────────────────────┘
//! ```
//! No SEC1 tag byte travels on the wire.
//!
//! ## ⚠️ Important Note for Next Developer
//! - The secret is X || Y of the product point, NOT the usual X-only
//!   ECDH output; deployed sensors hash both coordinates
//! - `CurveParams` are checked against the p256 backend at startup; a
//!   different curve must come with a matching backend, not a patched
//!   constant
//! - Coordinates are always 32 bytes, leading zeros included
//!
//! ## Last Modified
//! v0.1.0 - Initial ECDH implementation

use std::fmt;

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{ProjectivePoint, PublicKey, SecretKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use super::{COORDINATE_SIZE, PUBLIC_KEY_SIZE, SHARED_SECRET_SIZE};
use crate::error::{CoreError, Result};

// ============================================
// Types
// ============================================

/// Private scalar in `[1, n)`; zeroed on drop by the backend.
pub type PrivateScalar = SecretKey;

/// Raw shared secret (X || Y), zeroed on drop.
pub type SharedSecret = Zeroizing<[u8; SHARED_SECRET_SIZE]>;

/// SEC1 tag for an uncompressed point.
const SEC1_UNCOMPRESSED: u8 = 0x04;

// ============================================
// CurveParams
// ============================================

const DEPLOYED_P: &str = "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff";
const DEPLOYED_N: &str = "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551";
const DEPLOYED_B: &str = "5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b";
const DEPLOYED_GX: &str = "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296";
const DEPLOYED_GY: &str = "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5";

/// Short-Weierstrass curve constants as big-endian hex strings.
///
/// The default is the set the sensors ship with (identical to NIST
/// P-256 and the RFC 5114 §A.6 example group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveParams {
    /// Prime field modulus.
    pub p: String,
    /// Order of the base point.
    pub n: String,
    /// Curve coefficient `b` (with `a = -3`).
    pub b: String,
    /// Base point X coordinate.
    pub gx: String,
    /// Base point Y coordinate.
    pub gy: String,
}

impl CurveParams {
    /// Returns the deployed curve constants.
    #[must_use]
    pub fn deployed() -> Self {
        Self {
            p: DEPLOYED_P.into(),
            n: DEPLOYED_N.into(),
            b: DEPLOYED_B.into(),
            gx: DEPLOYED_GX.into(),
            gy: DEPLOYED_GY.into(),
        }
    }

    fn decode(name: &str, value: &str) -> Result<[u8; COORDINATE_SIZE]> {
        let bytes = hex::decode(value.trim())
            .map_err(|e| CoreError::unsupported_curve(format!("{name}: {e}")))?;
        if bytes.len() > COORDINATE_SIZE {
            return Err(CoreError::unsupported_curve(format!(
                "{name}: wider than {COORDINATE_SIZE} bytes"
            )));
        }
        let mut out = [0u8; COORDINATE_SIZE];
        out[COORDINATE_SIZE - bytes.len()..].copy_from_slice(&bytes);
        Ok(out)
    }
}

impl Default for CurveParams {
    fn default() -> Self {
        Self::deployed()
    }
}

// ============================================
// Ecdh
// ============================================

/// ECDH context bound to a validated set of curve parameters.
///
/// # Example
/// ```
/// use coordnode_core::crypto::{CurveParams, Ecdh};
///
/// let ecdh = Ecdh::new(CurveParams::deployed()).unwrap();
///
/// let a = ecdh.generate_private();
/// let b = ecdh.generate_private();
/// let a_pub = ecdh.generate_public(&a);
/// let b_pub = ecdh.generate_public(&b);
///
/// assert!(ecdh.check_public(&a_pub));
/// let s1 = ecdh.derive_secret(&a, &b_pub).unwrap();
/// let s2 = ecdh.derive_secret(&b, &a_pub).unwrap();
/// assert_eq!(*s1, *s2);
/// ```
pub struct Ecdh {
    params: CurveParams,
}

impl Ecdh {
    /// Creates a context after checking `params` against the backend.
    ///
    /// # Errors
    /// Returns `UnsupportedCurve` if any constant differs from the curve
    /// the arithmetic backend implements.
    pub fn new(params: CurveParams) -> Result<Self> {
        let generator = ProjectivePoint::GENERATOR.to_affine().to_encoded_point(false);
        let (Some(backend_gx), Some(backend_gy)) = (generator.x(), generator.y()) else {
            return Err(CoreError::unsupported_curve("backend generator is the identity"));
        };

        let mut gx = [0u8; COORDINATE_SIZE];
        let mut gy = [0u8; COORDINATE_SIZE];
        gx.copy_from_slice(backend_gx);
        gy.copy_from_slice(backend_gy);

        let checks = [
            ("p", params.p.as_str(), CurveParams::decode("p", DEPLOYED_P)?),
            ("n", params.n.as_str(), CurveParams::decode("n", DEPLOYED_N)?),
            ("b", params.b.as_str(), CurveParams::decode("b", DEPLOYED_B)?),
            ("gx", params.gx.as_str(), gx),
            ("gy", params.gy.as_str(), gy),
        ];

        for (name, configured, backend) in checks {
            if CurveParams::decode(name, configured)? != backend {
                return Err(CoreError::unsupported_curve(format!(
                    "parameter '{name}' does not match the P-256 backend"
                )));
            }
        }

        debug!("Curve parameters match the P-256 backend");
        Ok(Self { params })
    }

    /// Returns the parameters this context was validated with.
    #[must_use]
    pub const fn params(&self) -> &CurveParams {
        &self.params
    }

    /// Generates a uniformly random private scalar in `[1, n)`.
    #[must_use]
    pub fn generate_private(&self) -> PrivateScalar {
        SecretKey::random(&mut OsRng)
    }

    /// Loads a private scalar from 32 big-endian bytes.
    ///
    /// # Errors
    /// Returns `KeyGeneration` if the value is zero or not below `n`.
    pub fn private_from_bytes(&self, bytes: &[u8]) -> Result<PrivateScalar> {
        SecretKey::from_slice(bytes).map_err(|_| CoreError::KeyGeneration {
            context: "private scalar out of range".into(),
        })
    }

    /// Computes `priv · G` encoded as X || Y.
    #[must_use]
    pub fn generate_public(&self, private: &PrivateScalar) -> [u8; PUBLIC_KEY_SIZE] {
        let encoded = private.public_key().to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        // A public key is never the identity, so both coordinates exist.
        if let (Some(x), Some(y)) = (encoded.x(), encoded.y()) {
            out[..COORDINATE_SIZE].copy_from_slice(x);
            out[COORDINATE_SIZE..].copy_from_slice(y);
        }
        out
    }

    /// Returns `true` if `point` is a 64-byte X || Y encoding of a point
    /// on the curve. The all-zero encoding is rejected.
    #[must_use]
    pub fn check_public(&self, point: &[u8]) -> bool {
        parse_public(point).is_some()
    }

    /// Computes X || Y of `priv · peer`.
    ///
    /// # Errors
    /// Returns `InvalidPeerKey` if `peer` fails [`Ecdh::check_public`].
    pub fn derive_secret(&self, private: &PrivateScalar, peer: &[u8]) -> Result<SharedSecret> {
        let peer = parse_public(peer).ok_or(CoreError::InvalidPeerKey)?;

        let product = (peer.to_projective() * *private.to_nonzero_scalar()).to_affine();
        let encoded = product.to_encoded_point(false);
        let (Some(x), Some(y)) = (encoded.x(), encoded.y()) else {
            return Err(CoreError::InvalidPeerKey);
        };

        let mut secret = Zeroizing::new([0u8; SHARED_SECRET_SIZE]);
        secret[..COORDINATE_SIZE].copy_from_slice(x);
        secret[COORDINATE_SIZE..].copy_from_slice(y);
        Ok(secret)
    }

    /// Generates a fresh single-use key pair.
    #[must_use]
    pub fn generate_key_pair(&self) -> EphemeralKeyPair {
        let private = self.generate_private();
        let public = self.generate_public(&private);
        EphemeralKeyPair { private, public }
    }
}

impl fmt::Debug for Ecdh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ecdh")
            .field("gx", &self.params.gx)
            .finish_non_exhaustive()
    }
}

/// Parses an untagged X || Y point, validating curve membership.
fn parse_public(point: &[u8]) -> Option<PublicKey> {
    if point.len() != PUBLIC_KEY_SIZE {
        return None;
    }
    let mut tagged = [0u8; PUBLIC_KEY_SIZE + 1];
    tagged[0] = SEC1_UNCOMPRESSED;
    tagged[1..].copy_from_slice(point);

    PublicKey::from_sec1_bytes(&tagged).ok()
}

// ============================================
// EphemeralKeyPair
// ============================================

/// Ephemeral credential for one handshake step.
///
/// Consumed by [`EphemeralKeyPair::agree`] so the private scalar cannot
/// outlive the step that created it.
pub struct EphemeralKeyPair {
    private: PrivateScalar,
    public: [u8; PUBLIC_KEY_SIZE],
}

impl EphemeralKeyPair {
    /// Returns the public point (X || Y).
    #[must_use]
    pub const fn public_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public
    }

    /// Derives the shared secret with `peer`, consuming the key pair.
    ///
    /// # Errors
    /// Returns `InvalidPeerKey` if `peer` is not a valid point.
    pub fn agree(self, ecdh: &Ecdh, peer: &[u8]) -> Result<SharedSecret> {
        ecdh.derive_secret(&self.private, peer)
    }
}

impl fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &format_args!("{}...", hex::encode(&self.public[..4])))
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
