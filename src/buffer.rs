//!
//! Encoded payload buffers.
//!
//! The bytes of a data array are held in exactly one wire representation at a time: raw binary,
//! base64, or base64 over a compressed block. Every representation can be decoded back to the
//! raw bytes it was built from, which is how one representation is converted into another.
//!
//! Base64 payloads are split into a header and a body, each base64 encoded on its own. The
//! header carries 32-bit unsigned words in the byte order of the file: the raw length for
//! uncompressed data, and `[1, raw_len, raw_len, compressed_len]` for data compressed as a
//! single block.
//!

use std::fmt;
use std::io;
#[cfg(feature = "compression")]
use std::io::{Read, Write};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use crate::xml::Element;

/// Error produced while encoding or decoding a buffer.
#[derive(Debug)]
pub enum Error {
    /// The encoder and compressor combination is not supported.
    InvalidEncoding {
        encoder: Encoder,
        compressor: Option<Compressor>,
    },
    /// A compressor name was not recognized.
    UnknownCompressor(String),
    /// Compression was requested but the `compression` feature is disabled.
    CompressorUnavailable(Compressor),
    /// Raw binary buffers cannot be embedded in XML.
    BinaryNotEmbeddable,
    /// A length does not fit in a 32-bit header word.
    PayloadTooLarge(usize),
    Base64(base64::DecodeError),
    Compression(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidEncoding {
                encoder,
                compressor: Some(c),
            } => write!(f, "Invalid encoding: {} with {} compression", encoder, c),
            Error::InvalidEncoding {
                encoder,
                compressor: None,
            } => write!(f, "Invalid encoding: {}", encoder),
            Error::UnknownCompressor(name) => write!(f, "Unknown compressor: {}", name),
            Error::CompressorUnavailable(c) => write!(
                f,
                "The {} compressor requires the \"compression\" feature",
                c
            ),
            Error::BinaryNotEmbeddable => {
                write!(f, "Raw binary data cannot be embedded in an XML element")
            }
            Error::PayloadTooLarge(len) => {
                write!(f, "Length {} does not fit in a 32-bit header", len)
            }
            Error::Base64(source) => write!(f, "Base64 decoding error: {}", source),
            Error::Compression(source) => write!(f, "Compression error: {}", source),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Base64(source) => Some(source),
            Error::Compression(source) => Some(source),
            _ => None,
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Error {
        Error::Base64(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Compression(e)
    }
}

/// Byte order of numeric data and header words in a file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// Byte order of the host.
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    fn write_u32(self, buf: &mut [u8], n: u32) {
        match self {
            ByteOrder::BigEndian => BigEndian::write_u32(buf, n),
            ByteOrder::LittleEndian => LittleEndian::write_u32(buf, n),
        }
    }

    fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            ByteOrder::BigEndian => BigEndian::read_u32(buf),
            ByteOrder::LittleEndian => LittleEndian::read_u32(buf),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::native()
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ByteOrder::BigEndian => write!(f, "BigEndian"),
            ByteOrder::LittleEndian => write!(f, "LittleEndian"),
        }
    }
}

/// Text encoding of a buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoder {
    Binary,
    Base64,
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Encoder::Binary => write!(f, "binary"),
            Encoder::Base64 => write!(f, "base64"),
        }
    }
}

/// Block compressor applied before base64 encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compressor {
    ZLib,
    LZ4,
    LZMA,
}

impl Compressor {
    /// Name of the VTK class able to decompress this data, as written in the `VTKFile` element.
    pub fn vtk_name(self) -> &'static str {
        match self {
            Compressor::ZLib => "vtkZLibDataCompressor",
            Compressor::LZ4 => "vtkLZ4DataCompressor",
            Compressor::LZMA => "vtkLZMADataCompressor",
        }
    }

    /// Whether compressors were compiled in.
    pub fn is_available() -> bool {
        cfg!(feature = "compression")
    }

    #[cfg(feature = "compression")]
    fn compress(self, raw: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Compressor::ZLib => {
                use flate2::{write::ZlibEncoder, Compression};
                let mut e = ZlibEncoder::new(Vec::new(), Compression::default());
                e.write_all(raw)?;
                Ok(e.finish()?)
            }
            Compressor::LZ4 => Ok(lz4::block::compress(raw)),
            Compressor::LZMA => {
                let mut e = xz2::write::XzEncoder::new(Vec::new(), 6);
                e.write_all(raw)?;
                Ok(e.finish()?)
            }
        }
    }

    #[cfg(not(feature = "compression"))]
    fn compress(self, _raw: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::CompressorUnavailable(self))
    }

    #[cfg(feature = "compression")]
    fn decompress(self, data: &[u8], raw_len: usize) -> Result<Vec<u8>, Error> {
        match self {
            Compressor::ZLib => {
                let mut out = Vec::with_capacity(raw_len);
                flate2::read::ZlibDecoder::new(data).read_to_end(&mut out)?;
                Ok(out)
            }
            Compressor::LZ4 => lz4::block::decompress(data, raw_len).map_err(|e| {
                Error::Compression(io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
            }),
            Compressor::LZMA => {
                let mut out = Vec::with_capacity(raw_len);
                xz2::read::XzDecoder::new(data).read_to_end(&mut out)?;
                Ok(out)
            }
        }
    }

    #[cfg(not(feature = "compression"))]
    fn decompress(self, _data: &[u8], _raw_len: usize) -> Result<Vec<u8>, Error> {
        Err(Error::CompressorUnavailable(self))
    }
}

impl fmt::Display for Compressor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Compressor::ZLib => write!(f, "zlib"),
            Compressor::LZ4 => write!(f, "lz4"),
            Compressor::LZMA => write!(f, "lzma"),
        }
    }
}

impl FromStr for Compressor {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zlib" => Ok(Compressor::ZLib),
            "lz4" => Ok(Compressor::LZ4),
            "lzma" => Ok(Compressor::LZMA),
            _ => Err(Error::UnknownCompressor(s.to_string())),
        }
    }
}

/// Checks that `encoder` supports `compressor`.
pub fn check_encoding(encoder: Encoder, compressor: Option<Compressor>) -> Result<(), Error> {
    match (encoder, compressor) {
        (Encoder::Binary, Some(_)) => Err(Error::InvalidEncoding {
            encoder,
            compressor,
        }),
        _ => Ok(()),
    }
}

fn header_words(words: &[usize], byte_order: ByteOrder) -> Result<Vec<u8>, Error> {
    let mut out = vec![0u8; 4 * words.len()];
    for (chunk, &word) in out.chunks_exact_mut(4).zip(words) {
        let word = u32::try_from(word).map_err(|_| Error::PayloadTooLarge(word))?;
        byte_order.write_u32(chunk, word);
    }
    Ok(out)
}

/// A data payload in one of its wire representations.
#[derive(Clone, Debug, PartialEq)]
pub enum EncodedBuffer {
    /// Raw bytes in host order.
    Binary(Vec<u8>),
    /// Base64 header holding the raw length, followed by the base64 body.
    Base64 { header: String, data: String },
    /// Base64 header holding the block layout, followed by the base64 compressed body.
    Base64Compressed {
        compressor: Compressor,
        raw_len: usize,
        header: String,
        data: String,
    },
}

impl EncodedBuffer {
    /// Encode `raw` with header words in host byte order.
    pub fn encode(
        raw: &[u8],
        encoder: Encoder,
        compressor: Option<Compressor>,
    ) -> Result<Self, Error> {
        Self::encode_with_byte_order(raw, encoder, compressor, ByteOrder::native())
    }

    /// Encode `raw`, writing header words in the given byte order.
    ///
    /// The payload bytes are taken as given. Callers are responsible for swapping them when
    /// `byte_order` differs from the host.
    pub fn encode_with_byte_order(
        raw: &[u8],
        encoder: Encoder,
        compressor: Option<Compressor>,
        byte_order: ByteOrder,
    ) -> Result<Self, Error> {
        check_encoding(encoder, compressor)?;
        match (encoder, compressor) {
            (Encoder::Binary, _) => Ok(EncodedBuffer::Binary(raw.to_vec())),
            (Encoder::Base64, None) => Ok(EncodedBuffer::Base64 {
                header: STANDARD.encode(header_words(&[raw.len()], byte_order)?),
                data: STANDARD.encode(raw),
            }),
            (Encoder::Base64, Some(compressor)) => {
                let compressed = compressor.compress(raw)?;
                let words = [1, raw.len(), raw.len(), compressed.len()];
                Ok(EncodedBuffer::Base64Compressed {
                    compressor,
                    raw_len: raw.len(),
                    header: STANDARD.encode(header_words(&words, byte_order)?),
                    data: STANDARD.encode(compressed),
                })
            }
        }
    }

    pub fn encoder(&self) -> Encoder {
        match self {
            EncodedBuffer::Binary(_) => Encoder::Binary,
            EncodedBuffer::Base64 { .. } | EncodedBuffer::Base64Compressed { .. } => {
                Encoder::Base64
            }
        }
    }

    pub fn compressor(&self) -> Option<Compressor> {
        match self {
            EncodedBuffer::Base64Compressed { compressor, .. } => Some(*compressor),
            _ => None,
        }
    }

    /// Whether this buffer is in the given representation.
    pub fn is_encoded_as(&self, encoder: Encoder, compressor: Option<Compressor>) -> bool {
        self.encoder() == encoder && self.compressor() == compressor
    }

    /// Recover the raw bytes this buffer was built from.
    pub fn raw_buffer(&self) -> Result<Vec<u8>, Error> {
        match self {
            EncodedBuffer::Binary(raw) => Ok(raw.clone()),
            EncodedBuffer::Base64 { data, .. } => Ok(STANDARD.decode(data)?),
            EncodedBuffer::Base64Compressed {
                compressor,
                raw_len,
                data,
                ..
            } => compressor.decompress(&STANDARD.decode(data)?, *raw_len),
        }
    }

    /// Append the header and body as two text children of `elem`.
    ///
    /// Returns the number of characters appended.
    pub fn add_to_xml_element(&self, elem: &mut Element) -> Result<usize, Error> {
        match self {
            EncodedBuffer::Binary(_) => Err(Error::BinaryNotEmbeddable),
            EncodedBuffer::Base64 { header, data }
            | EncodedBuffer::Base64Compressed { header, data, .. } => {
                elem.add_child(header.as_str());
                elem.add_child(data.as_str());
                Ok(header.len() + data.len())
            }
        }
    }

    /// Decode the header words of a base64 buffer written in the given byte order.
    pub fn header_words(&self, byte_order: ByteOrder) -> Result<Vec<u32>, Error> {
        match self {
            EncodedBuffer::Binary(_) => Ok(Vec::new()),
            EncodedBuffer::Base64 { header, .. }
            | EncodedBuffer::Base64Compressed { header, .. } => Ok(STANDARD
                .decode(header)?
                .chunks_exact(4)
                .map(|word| byte_order.read_u32(word))
                .collect()),
        }
    }
}
