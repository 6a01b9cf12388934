//! Feature modules, hexagonal-architecture style: each owns its
//! `domain`/`ports`/`infrastructure`/`application` split.

pub mod ifds_engine;
