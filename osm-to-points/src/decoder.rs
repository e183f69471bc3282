use std::io::{BufRead, BufReader, Read};

use anyhow::{bail, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Chunk size for reads from the input source. Only affects I/O
/// granularity; a tag split across a chunk boundary is reassembled before
/// it surfaces as an event.
pub const READ_CHUNK_BYTES: usize = 4096;

/// Pulls start tags out of an XML byte stream, one at a time.
///
/// The stream must be UTF-8: a declaration naming any other encoding, or a
/// UTF-16 byte order mark, is fatal. Everything else in the document (end
/// tags, text, comments) is consumed and dropped. The sequence is finite
/// and not restartable: after `next_element` returns `Ok(None)` the
/// document is exhausted.
pub struct ElementDecoder<R: Read> {
    reader: Reader<BufReader<R>>,
    buf: Vec<u8>,
    started: bool,
}

impl<R: Read> ElementDecoder<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(BufReader::with_capacity(READ_CHUNK_BYTES, source)),
            buf: Vec::new(),
            started: false,
        }
    }

    /// Next start tag (`<e ...>` and `<e .../>` both qualify), or `None` at
    /// end of document. Malformed XML is fatal: there is nothing worth
    /// salvaging from a corrupt stream, so no resync is attempted.
    pub fn next_element(&mut self) -> Result<Option<BytesStart<'static>>> {
        if !self.started {
            self.started = true;
            self.reject_utf16_bom()?;
        }
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(tag)) | Ok(Event::Empty(tag)) => {
                    return Ok(Some(tag.into_owned()));
                }
                Ok(Event::Decl(decl)) => {
                    if let Some(encoding) = decl.encoding().transpose()? {
                        if !encoding.eq_ignore_ascii_case(b"utf-8") {
                            bail!(
                                "document declares encoding {}; only UTF-8 is supported",
                                String::from_utf8_lossy(&encoding)
                            );
                        }
                    }
                }
                Ok(Event::Eof) => return Ok(None),
                Ok(_) => {}
                Err(err) => bail!(
                    "malformed XML near byte {}: {err}",
                    self.reader.buffer_position()
                ),
            }
        }
    }

    /// A UTF-16 stream tokenized as UTF-8 yields NUL-laced names that match
    /// nothing, so the byte order mark has to be caught before parsing
    /// starts. Peeks without consuming; a UTF-8 mark passes through.
    fn reject_utf16_bom(&mut self) -> Result<()> {
        let head = self.reader.get_mut().fill_buf()?;
        if head.starts_with(&[0xFF, 0xFE]) || head.starts_with(&[0xFE, 0xFF]) {
            bail!("input carries a UTF-16 byte order mark; only UTF-8 is supported");
        }
        Ok(())
    }
}
