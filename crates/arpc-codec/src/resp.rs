use std::fmt;

/// One decoded RESP value.
///
/// The server only ever needs `Array` of `BulkString` on the way in and a
/// single `BulkString` on the way out, but the encoder supports the full
/// value set so the wire stays genuinely Redis-compatible for diagnostic
/// tools (e.g. `redis-cli -3`) that might probe the port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resp {
    SimpleString(String),
    Error(String),
    Integer(i64),
    /// `None` encodes/decodes as the null bulk string, `$-1\r\n`.
    BulkString(Option<Vec<u8>>),
    /// `None` encodes/decodes as the null array, `*-1\r\n`.
    Array(Option<Vec<Resp>>),
}

impl Resp {
    #[must_use]
    pub fn bulk(bytes: impl Into<Vec<u8>>) -> Self {
        Resp::BulkString(Some(bytes.into()))
    }

    #[must_use]
    pub fn nil() -> Self {
        Resp::BulkString(None)
    }

    /// Borrows this value as a bulk string's bytes, if it is one.
    #[must_use]
    pub fn as_bulk(&self) -> Option<&[u8]> {
        match self {
            Resp::BulkString(Some(b)) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Resp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resp::SimpleString(s) => write!(f, "+{s}"),
            Resp::Error(e) => write!(f, "-{e}"),
            Resp::Integer(i) => write!(f, ":{i}"),
            Resp::BulkString(Some(b)) => {
                write!(f, "${}", String::from_utf8_lossy(b))
            }
            Resp::BulkString(None) => write!(f, "$-1"),
            Resp::Array(Some(items)) => write!(f, "*{}", items.len()),
            Resp::Array(None) => write!(f, "*-1"),
        }
    }
}

/// Serializes `value` in RESP wire format into `out`.
pub fn encode(value: &Resp, out: &mut Vec<u8>) {
    match value {
        Resp::SimpleString(s) => {
            out.push(b'+');
            out.extend_from_slice(s.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Resp::Error(e) => {
            out.push(b'-');
            out.extend_from_slice(e.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Resp::Integer(i) => {
            out.push(b':');
            out.extend_from_slice(i.to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Resp::BulkString(None) => out.extend_from_slice(b"$-1\r\n"),
        Resp::BulkString(Some(bytes)) => {
            out.push(b'$');
            out.extend_from_slice(bytes.len().to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(bytes);
            out.extend_from_slice(b"\r\n");
        }
        Resp::Array(None) => out.extend_from_slice(b"*-1\r\n"),
        Resp::Array(Some(items)) => {
            out.push(b'*');
            out.extend_from_slice(items.len().to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
            for item in items {
                encode(item, out);
            }
        }
    }
}

/// A framing error. Per §4.1, malformed frames close the connection; the
/// parser never attempts resynchronization mid-array.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("malformed RESP frame: {0}")]
    Malformed(&'static str),
    #[error("bulk string or array length out of range")]
    LengthOutOfRange,
    #[error("I/O error while framing: {0}")]
    Io(#[from] std::io::Error),
}

impl PartialEq for FrameError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Malformed(a), Self::Malformed(b)) => a == b,
            (Self::LengthOutOfRange, Self::LengthOutOfRange) => true,
            _ => false,
        }
    }
}

/// Attempts to parse one complete [`Resp`] value from the front of `buf`.
///
/// Returns `Ok(None)` when `buf` holds an incomplete frame so the caller can
/// wait for more bytes from a buffered, partial read. Returns
/// `Ok(Some((value, consumed)))` on a complete frame, where `consumed` is
/// the number of bytes to drop from the front of `buf`.
pub fn parse(buf: &[u8]) -> Result<Option<(Resp, usize)>, FrameError> {
    parse_at(buf, 0)
}

fn parse_at(buf: &[u8], start: usize) -> Result<Option<(Resp, usize)>, FrameError> {
    let Some(&prefix) = buf.get(start) else {
        return Ok(None);
    };
    let Some(line_end) = find_crlf(buf, start + 1) else {
        return Ok(None);
    };
    let line = &buf[start + 1..line_end];
    let after_line = line_end + 2;

    match prefix {
        b'+' => {
            let s = to_utf8(line)?;
            Ok(Some((Resp::SimpleString(s), after_line)))
        }
        b'-' => {
            let s = to_utf8(line)?;
            Ok(Some((Resp::Error(s), after_line)))
        }
        b':' => {
            let n = parse_i64(line)?;
            Ok(Some((Resp::Integer(n), after_line)))
        }
        b'$' => {
            let len = parse_i64(line)?;
            if len < 0 {
                return Ok(Some((Resp::BulkString(None), after_line)));
            }
            let len = usize::try_from(len).map_err(|_| FrameError::LengthOutOfRange)?;
            let data_end = after_line
                .checked_add(len)
                .ok_or(FrameError::LengthOutOfRange)?;
            let term_end = data_end.checked_add(2).ok_or(FrameError::LengthOutOfRange)?;
            if buf.len() < term_end {
                return Ok(None);
            }
            if &buf[data_end..term_end] != b"\r\n" {
                return Err(FrameError::Malformed("bulk string missing CRLF terminator"));
            }
            let data = buf[after_line..data_end].to_vec();
            Ok(Some((Resp::BulkString(Some(data)), term_end)))
        }
        b'*' => {
            let len = parse_i64(line)?;
            if len < 0 {
                return Ok(Some((Resp::Array(None), after_line)));
            }
            let len = usize::try_from(len).map_err(|_| FrameError::LengthOutOfRange)?;
            let mut items = Vec::with_capacity(len.min(4096));
            let mut cursor = after_line;
            for _ in 0..len {
                match parse_at(buf, cursor)? {
                    Some((item, next)) => {
                        items.push(item);
                        cursor = next;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((Resp::Array(Some(items)), cursor)))
        }
        _ => Err(FrameError::Malformed("unknown RESP type prefix")),
    }
}

fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|p| from + p)
}

fn to_utf8(bytes: &[u8]) -> Result<String, FrameError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| FrameError::Malformed("non-UTF-8 line"))
}

fn parse_i64(bytes: &[u8]) -> Result<i64, FrameError> {
    to_utf8(bytes)?
        .parse()
        .map_err(|_| FrameError::Malformed("expected an integer"))
}
