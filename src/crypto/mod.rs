//! The crypto module contains all of our cryptographic primitives for key
//! generation, signing, and messaging.

pub mod base;
