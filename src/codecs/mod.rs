// src/codecs/mod.rs
//
// Native codec bindings that are optional at build time.

pub mod heif;
