//! Parsers for the byte-level layers between a PES payload and caption codes
//!
//! `utils` holds the stateless field readers, `sei` splits an SEI RBSP into
//! messages and `cea708` decodes the ITU-T T.35 caption payload inside them.

pub mod utils;
pub mod sei;
pub mod cea708;

pub use utils::{parse_pts, find_start_code, find_emulation_prevention_byte, remove_emulation_prevention};
pub use sei::{Sei, SeiMessage, SeiMessageType};
pub use cea708::{Cea708Unit, CcData, CcType, T35Provider, UserData};
