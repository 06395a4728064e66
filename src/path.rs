//! Archive path encodings.
//!
//! The storage driver addresses directories and files with one of three
//! mutually exclusive encodings: a UTF text path, an opaque sequence of
//! 32-bit words, or the empty path meaning "the archive root". Save and
//! extra-data archives themselves are addressed by a short binary path
//! carrying the 64-bit container id.

/// Format discriminator leading every save-data binary path.
const SAVE_PATH_FORMAT: u32 = 1;

/// A path argument for a single storage-driver call.
///
/// A spec only borrows its backing storage, so an encoded path can never
/// outlive the value it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSpec<'a> {
    /// No path; addresses the archive root.
    Empty,
    /// A `/`-separated text path.
    Text(&'a str),
    /// An opaque binary path of fixed-width words.
    Binary(&'a [u32]),
}

impl<'a> PathSpec<'a> {
    pub fn text(path: &'a str) -> Self {
        PathSpec::Text(path)
    }

    /// Wraps a word sequence as a binary path. An empty sequence is the
    /// empty path, never a zero-length binary spec.
    pub fn binary(words: &'a [u32]) -> Self {
        if words.is_empty() {
            PathSpec::Empty
        } else {
            PathSpec::Binary(words)
        }
    }

    /// Byte length as the driver accounts it: UTF-16 units plus a
    /// terminator for text paths, word width for binary ones.
    pub fn byte_len(&self) -> usize {
        match self {
            PathSpec::Empty => 0,
            PathSpec::Text(s) => 2 * s.encode_utf16().count() + 2,
            PathSpec::Binary(words) => 4 * words.len(),
        }
    }
}

/// Binary address of a save or extra-data archive: the format word followed
/// by the low and high halves of the container id.
///
/// The caller owns the words and the spec borrows them, so the encoding is
/// valid exactly as long as the driver call it was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveBinaryPath {
    words: [u32; 3],
}

impl SaveBinaryPath {
    pub fn new(container_id: u64) -> Self {
        Self {
            words: [
                SAVE_PATH_FORMAT,
                container_id as u32,
                (container_id >> 32) as u32,
            ],
        }
    }

    /// The path spec borrowing this address's storage.
    pub fn spec(&self) -> PathSpec<'_> {
        PathSpec::binary(&self.words)
    }

    /// Reconstructs the container id the address was built from.
    pub fn container_id(&self) -> u64 {
        u64::from(self.words[2]) << 32 | u64::from(self.words[1])
    }
}

/// Reads the container id back out of a save-data binary path, if that is
/// what the spec holds.
pub fn decode_container_id(path: &PathSpec) -> Option<u64> {
    if let PathSpec::Binary(&[SAVE_PATH_FORMAT, low, high]) = path {
        Some(u64::from(high) << 32 | u64::from(low))
    } else {
        None
    }
}

/// Renders a 32-bit value as exactly eight lowercase hex digits.
pub fn hex32(value: u32) -> String {
    format!("{:08x}", value)
}
