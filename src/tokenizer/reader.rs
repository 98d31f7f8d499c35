use crate::error::{malformed, Result};

/// Cursor over one data unit (or macro template).
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.data.get(self.pos + ahead).copied()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn next(&mut self) -> Result<u8> {
        let b = self.peek().ok_or_else(|| malformed(format!("truncated at byte {}", self.pos)))?;
        self.pos += 1;
        Ok(b)
    }

    /// Parameter byte of a C0/C1 control, restricted to 0x20..=0x7F.
    pub fn param(&mut self) -> Result<u8> {
        let b = self.next()?;
        if !(0x20..=0x7F).contains(&b) {
            return Err(malformed(format!("control parameter {b:#04x}")));
        }
        Ok(b)
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len())
            .ok_or_else(|| malformed(format!("{n} bytes wanted at {}", self.pos)))?;
        let s = &self.data[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    /// Bytes from the cursor to the end
    pub fn rest(&mut self) -> &'a [u8] {
        let s = &self.data[self.pos.min(self.data.len())..];
        self.pos = self.data.len();
        s
    }
}
