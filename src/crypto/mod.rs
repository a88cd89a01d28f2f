// crypto/mod.rs - Cryptographic primitives
//
// `cipher` implements the whole-buffer AES-256-GCM AEAD (C4); `kdf`
// implements scrypt-based key derivation (C3); `secure` provides
// zeroizing wrappers for passwords and key material.

mod cipher;
mod kdf;
mod secure;

pub use cipher::{decrypt, encrypt};
pub use kdf::{concat_passwords, derive_key, generate_salt, KdfParams};
pub use secure::{Password, SecureBytes};
