//! Bounds checked reads over [`Buf`], for parsing packet bodies.

use bytes::Buf;

use crate::errors::Result;

pub trait BufParsing: Buf + Sized {
    fn read_u8(&mut self) -> Result<u8> {
        ensure!(self.remaining() >= 1, "unexpected end of input");
        Ok(self.get_u8())
    }

    fn read_be_u16(&mut self) -> Result<u16> {
        ensure!(self.remaining() >= 2, "unexpected end of input");
        Ok(self.get_u16())
    }

    fn read_be_u32(&mut self) -> Result<u32> {
        ensure!(self.remaining() >= 4, "unexpected end of input");
        Ok(self.get_u32())
    }

    fn read_array<const C: usize>(&mut self) -> Result<[u8; C]> {
        ensure!(self.remaining() >= C, "unexpected end of input");
        let mut arr = [0u8; C];
        self.copy_to_slice(&mut arr);
        Ok(arr)
    }

    fn read_take(&mut self, size: usize) -> Result<Vec<u8>> {
        ensure!(
            self.remaining() >= size,
            "unexpected end of input: needed {}, remaining {}",
            size,
            self.remaining()
        );
        let mut out = vec![0u8; size];
        self.copy_to_slice(&mut out);
        Ok(out)
    }

    fn rest(&mut self) -> Vec<u8> {
        let mut out = vec![0u8; self.remaining()];
        self.copy_to_slice(&mut out);
        out
    }
}

impl<B: Buf> BufParsing for B {}
