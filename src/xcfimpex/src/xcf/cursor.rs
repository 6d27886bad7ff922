// This file is part of xcfkit.
// Copyright (C) 2023 xcfkit contributors
//
// xcfkit is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// As additional permission under section 7, you are allowed to distribute
// the software through an app store, even if that store has restrictive
// terms and conditions that are incompatible with the GPL, provided that
// the source is also available under the GPL with or without this permission
// through a channel without those restrictive terms and conditions.
//
// xcfkit is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with xcfkit.  If not, see <https://www.gnu.org/licenses/>.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

use super::{XcfError, XcfResult};

/// Big endian reader over a seekable XCF stream.
///
/// The file format version decides the width of stored offsets.
pub struct XcfCursor<R> {
    inner: R,
    version: u32,
}

impl<R: Read + Seek> XcfCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, version: 0 }
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    pub fn read_u8(&mut self) -> XcfResult<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_u32(&mut self) -> XcfResult<u32> {
        Ok(self.inner.read_u32::<BigEndian>()?)
    }

    pub fn read_i32(&mut self) -> XcfResult<i32> {
        Ok(self.inner.read_i32::<BigEndian>()?)
    }

    pub fn read_f32(&mut self) -> XcfResult<f32> {
        Ok(self.inner.read_f32::<BigEndian>()?)
    }

    /// Read a file offset.
    ///
    /// Version 11 and later store 64 bit offsets. Negative offsets are
    /// rejected.
    pub fn read_offset(&mut self) -> XcfResult<u64> {
        if self.version >= 11 {
            let offset = self.inner.read_i64::<BigEndian>()?;
            u64::try_from(offset)
                .map_err(|_| XcfError::Corrupt(format!("negative offset {offset}")))
        } else {
            Ok(self.inner.read_u32::<BigEndian>()? as u64)
        }
    }

    pub fn read_bytes(&mut self, len: usize) -> XcfResult<Vec<u8>> {
        let mut buf = vec![0; len];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read up to `len` bytes, zero filling whatever the stream
    /// could not provide.
    ///
    /// Returns the buffer and the number of bytes actually read.
    pub fn read_up_to(&mut self, len: usize) -> XcfResult<(Vec<u8>, usize)> {
        let mut buf = Vec::with_capacity(len);
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        buf.resize(len, 0);
        Ok((buf, got))
    }

    /// Read a length prefixed string.
    ///
    /// The stored length includes the NUL terminator. A zero length is
    /// an empty string.
    pub fn read_string(&mut self) -> XcfResult<String> {
        let len = self.read_u32()?;
        if len == 0 {
            return Ok(String::new());
        }
        let mut bytes = Vec::new();
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut bytes)?;
        if got < len as usize {
            return Err(XcfError::Truncated);
        }
        if let Some(nul) = bytes.iter().position(|&b| b == 0) {
            bytes.truncate(nul);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn skip(&mut self, len: u64) -> XcfResult<()> {
        self.inner.seek(SeekFrom::Current(len as i64))?;
        Ok(())
    }

    pub fn seek(&mut self, pos: u64) -> XcfResult<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn position(&mut self) -> XcfResult<u64> {
        Ok(self.inner.stream_position()?)
    }
}
