//! rh-protocol: Plain-text wire protocol for roamhost
//!
//! Every exchange is a single newline-terminated request line answered by a
//! response that carries bracketed `[Key=value]` tokens. This crate owns the
//! token grammar, request classification, the line codec, and the
//! presentation boundary used to turn session events into responses.

pub mod codec;
pub mod error;
pub mod page;
pub mod request;
pub mod token;

pub use codec::{LineCodec, DEFAULT_MAX_LINE_LENGTH};
pub use error::ProtocolError;
pub use page::{HtmlPresenter, Page, Presenter};
pub use request::{host_request, is_favicon_request, RequestKind};
pub use token::{parse_port, parse_state, port_token, state_token};
