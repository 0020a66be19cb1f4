//! recmux-box: bounds-checked ISO BMFF box writer.
//!
//! Boxes are written straight into a caller-supplied byte buffer. Each box is
//! opened with a 4-byte size placeholder and its 4-byte type, filled with
//! big-endian fields and nested child boxes, and closed, at which point the
//! real size is back-patched into the placeholder.
//!
//! # Example
//!
//! ```
//! use recmux_box::BoxWriter;
//!
//! let mut buf = [0u8; 64];
//! let mut moov = BoxWriter::open(&mut buf, b"moov").unwrap();
//! let mut mvex = moov.open_local(b"mvex").unwrap();
//! mvex.append_u32(7).unwrap();
//! assert_eq!(mvex.close(), 12);
//! assert_eq!(moov.close(), 20);
//! assert_eq!(&buf[..4], &20u32.to_be_bytes());
//! ```

pub mod error;
mod writer;

pub use error::{Error, Result};
pub use writer::{patch_u32, BoxType, BoxWriter, BOX_HEADER_SIZE, FULL_BOX_HEADER_SIZE};
