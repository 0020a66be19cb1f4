//! Cursor-based box writer.
//!
//! Each box follows the standard layout: 4-byte size (big-endian u32),
//! 4-byte type (ASCII), then box-specific content. The size is unknown until
//! every child has been written, so [`BoxWriter::close`] patches it in.

use std::fmt;

use crate::{Error, Result};

/// Four-character box type code.
pub type BoxType = [u8; 4];

/// Size of a compact box header: 4-byte size + 4-byte type.
pub const BOX_HEADER_SIZE: usize = 8;

/// Size of the version + flags prefix of a full box.
pub const FULL_BOX_HEADER_SIZE: usize = 4;

/// A box that is currently being written.
///
/// The writer never owns the output buffer. A top-level writer borrows the
/// caller's buffer; a nested writer created by [`BoxWriter::open_local`]
/// borrows its container, so the container cannot be written to (or closed)
/// until the nested box has been closed.
///
/// Positions reported by [`start`](Self::start) and
/// [`position`](Self::position) are byte indices into the buffer passed to
/// [`BoxWriter::open`].
pub struct BoxWriter<'a> {
    buf: &'a mut [u8],
    box_type: BoxType,
    start: usize,
    position: usize,
    container_position: Option<&'a mut usize>,
}

impl<'a> BoxWriter<'a> {
    /// Open a top-level box at the start of `buf`.
    ///
    /// Reserves the size field and writes the box type immediately.
    pub fn open(buf: &'a mut [u8], box_type: &BoxType) -> Result<Self> {
        let mut writer = Self {
            buf,
            box_type: *box_type,
            start: 0,
            position: 0,
            container_position: None,
        };
        writer.write_header()?;
        Ok(writer)
    }

    /// Open a box nested inside this one, starting at the current position.
    ///
    /// The nested box shares this box's buffer end, so its capacity checks
    /// see the real end of the caller's buffer. This box's position only
    /// advances once the nested box is closed.
    pub fn open_local(&mut self, box_type: &BoxType) -> Result<BoxWriter<'_>> {
        let mut writer = BoxWriter {
            buf: &mut *self.buf,
            box_type: *box_type,
            start: self.position,
            position: self.position,
            container_position: Some(&mut self.position),
        };
        writer.write_header()?;
        Ok(writer)
    }

    fn write_header(&mut self) -> Result<()> {
        self.reserve(BOX_HEADER_SIZE)?;
        // Size is patched in on close.
        self.put(&[0; 4]);
        let box_type = self.box_type;
        self.put(&box_type);
        Ok(())
    }

    /// Position of this box's size field.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Position of the next byte to be written.
    pub fn position(&self) -> usize {
        self.position
    }

    /// End of the underlying buffer.
    pub fn end(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.end() - self.position
    }

    /// Type code of this box.
    pub fn box_type(&self) -> BoxType {
        self.box_type
    }

    fn reserve(&self, need: usize) -> Result<()> {
        let have = self.remaining();
        if need > have {
            tracing::trace!(
                box_type = %String::from_utf8_lossy(&self.box_type),
                need,
                have,
                "box does not fit in output buffer"
            );
            return Err(Error::out_of_resources(need, have));
        }
        Ok(())
    }

    fn put(&mut self, bytes: &[u8]) {
        let end = self.position + bytes.len();
        self.buf[self.position..end].copy_from_slice(bytes);
        self.position = end;
    }

    /// Append a full box header: 1-byte version and 24-bit flags.
    pub fn append_full_box_header(&mut self, version: u8, flags: u32) -> Result<()> {
        debug_assert!(flags <= 0x00FF_FFFF, "full box flags exceed 24 bits");
        let val = ((version as u32) << 24) | (flags & 0x00FF_FFFF);
        self.append_u32(val)
    }

    /// Append a `u8`.
    pub fn append_u8(&mut self, value: u8) -> Result<()> {
        self.append_bytes(&[value])
    }

    /// Append a big-endian `u16`.
    pub fn append_u16(&mut self, value: u16) -> Result<()> {
        self.append_bytes(&value.to_be_bytes())
    }

    /// Append a big-endian `u32`.
    pub fn append_u32(&mut self, value: u32) -> Result<()> {
        self.append_bytes(&value.to_be_bytes())
    }

    /// Append a big-endian `u64`.
    pub fn append_u64(&mut self, value: u64) -> Result<()> {
        self.append_bytes(&value.to_be_bytes())
    }

    /// Append raw bytes.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.put(bytes);
        Ok(())
    }

    /// Append `len` zero bytes.
    pub fn append_zero(&mut self, len: usize) -> Result<()> {
        self.reserve(len)?;
        let end = self.position + len;
        self.buf[self.position..end].fill(0);
        self.position = end;
        Ok(())
    }

    /// Finish the box and return its total size, header included.
    ///
    /// Writes the size into the box's size field and, for a nested box,
    /// moves the container's position past everything written here.
    pub fn close(mut self) -> usize {
        let size = self.position - self.start;
        debug_assert!(size <= u32::MAX as usize, "box size exceeds 32 bits");
        patch_u32(self.buf, self.start, size as u32);
        if let Some(container_position) = self.container_position.take() {
            *container_position = self.position;
        }
        size
    }
}

impl fmt::Debug for BoxWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxWriter")
            .field("box_type", &String::from_utf8_lossy(&self.box_type))
            .field("start", &self.start)
            .field("position", &self.position)
            .field("end", &self.end())
            .field("nested", &self.container_position.is_some())
            .finish()
    }
}

/// Overwrite four bytes at `offset` with `value` in big-endian order.
///
/// Used for fields whose value is only known after the surrounding boxes
/// have been closed.
pub fn patch_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
