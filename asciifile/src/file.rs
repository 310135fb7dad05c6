use crate::{Position, PositionIterator};
use failure::Fail;
use memmap::Mmap;
use std::{fs::File, io, ops::Deref, path::Path};

#[derive(Debug)]
pub struct AsciiFile<'m> {
    mapping: &'m [u8],
}

#[derive(Debug, Fail)]
pub enum EncodingError {
    #[fail(
        display = "input contains non-ascii character at byte offset {}: {}<?>",
        position, prev
    )]
    NotAscii { position: usize, prev: String },
}

const ENCODING_ERROR_MAX_CONTEXT_LENGTH: usize = 80;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum LineTruncation {
    Truncated,
    NotTruncated,
}

impl<'m> AsciiFile<'m> {
    /// Checks that every byte of `mapping` is ASCII.
    ///
    /// cost: O(fileLen)
    pub fn new(mapping: &'m [u8]) -> Result<AsciiFile<'m>, EncodingError> {
        if let Some(position) = mapping.iter().position(|c| !c.is_ascii()) {
            let (truncation, start_idx) =
                line_start_idx(mapping, position, ENCODING_ERROR_MAX_CONTEXT_LENGTH);

            // the prefix of the offending line is ASCII, we just checked
            // every byte before `position`
            let prev = String::from_utf8_lossy(&mapping[start_idx..position]);
            let prev = match truncation {
                LineTruncation::Truncated => format!("...{}", prev),
                LineTruncation::NotTruncated => prev.into_owned(),
            };

            return Err(EncodingError::NotAscii { position, prev });
        }

        Ok(AsciiFile { mapping })
    }

    /// Memory-map the file at `path`. The returned mapping has to outlive
    /// the `AsciiFile` built on top of it.
    pub fn mmap<P: AsRef<Path>>(path: P) -> io::Result<Option<Mmap>> {
        let file = File::open(path)?;
        // mapping an empty file fails on most platforms
        if file.metadata()?.len() == 0 {
            return Ok(None);
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Some(mmap))
    }

    pub fn iter(&self) -> PositionIterator<'_> {
        PositionIterator::new(Position::at_file_start(self))
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn as_bytes(&self) -> &'m [u8] {
        self.mapping
    }

    pub fn as_str(&self) -> &'m str {
        // every byte was checked to be ASCII in `new`
        unsafe { std::str::from_utf8_unchecked(self.mapping) }
    }
}

impl<'m> Deref for AsciiFile<'m> {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

/// Return the start index of the line containing `byte_offset`, looking
/// back at most `max_context_length` bytes.
fn line_start_idx(
    mapping: &[u8],
    byte_offset: usize,
    max_context_length: usize,
) -> (LineTruncation, usize) {
    debug_assert!(byte_offset <= mapping.len());

    let (truncation, region_start) = byte_offset
        .checked_sub(max_context_length)
        .map(|start| (LineTruncation::Truncated, start))
        .unwrap_or((LineTruncation::NotTruncated, 0));

    mapping[region_start..byte_offset]
        .iter()
        .rposition(|&chr| chr == b'\n')
        .map(|pos| (LineTruncation::NotTruncated, pos + region_start + 1))
        .unwrap_or((truncation, region_start))
}
