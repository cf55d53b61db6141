//! Token layouts of the OpenBSM record format
//!
//! All integers are big-endian. A token starts with a one-byte id; the
//! length of the body follows from the id and from length fields carried
//! inside the body, so every token listed here can be skipped without
//! understanding it.

use nom::{
    bytes::complete::{tag, take, take_until},
    combinator::verify,
    error::{Error, ErrorKind},
    multi::length_data,
    number::complete::{be_u16, be_u32, be_u64, be_u8},
    sequence::terminated,
    IResult,
};

pub const AUT_OTHER_FILE32: u8 = 0x11;
pub const AUT_TRAILER: u8 = 0x13;
pub const AUT_HEADER32: u8 = 0x14;
pub const AUT_HEADER32_EX: u8 = 0x15;
pub const AUT_DATA: u8 = 0x21;
pub const AUT_IPC: u8 = 0x22;
pub const AUT_PATH: u8 = 0x23;
pub const AUT_SUBJECT32: u8 = 0x24;
pub const AUT_XATPATH: u8 = 0x25;
pub const AUT_PROCESS32: u8 = 0x26;
pub const AUT_RETURN32: u8 = 0x27;
pub const AUT_TEXT: u8 = 0x28;
pub const AUT_OPAQUE: u8 = 0x29;
pub const AUT_IN_ADDR: u8 = 0x2a;
pub const AUT_IP: u8 = 0x2b;
pub const AUT_IPORT: u8 = 0x2c;
pub const AUT_ARG32: u8 = 0x2d;
pub const AUT_SOCKET: u8 = 0x2e;
pub const AUT_SEQ: u8 = 0x2f;
pub const AUT_IPC_PERM: u8 = 0x32;
pub const AUT_UPRIV: u8 = 0x39;
pub const AUT_NEWGROUPS: u8 = 0x3b;
pub const AUT_EXEC_ARGS: u8 = 0x3c;
pub const AUT_EXEC_ENV: u8 = 0x3d;
pub const AUT_ATTR32: u8 = 0x3e;
pub const AUT_EXIT: u8 = 0x52;
pub const AUT_ZONENAME: u8 = 0x60;
pub const AUT_ARG64: u8 = 0x71;
pub const AUT_RETURN64: u8 = 0x72;
pub const AUT_ATTR64: u8 = 0x73;
pub const AUT_HEADER64: u8 = 0x74;
pub const AUT_SUBJECT64: u8 = 0x75;
pub const AUT_PROCESS64: u8 = 0x77;
pub const AUT_HEADER64_EX: u8 = 0x79;
pub const AUT_SUBJECT32_EX: u8 = 0x7a;
pub const AUT_PROCESS32_EX: u8 = 0x7b;
pub const AUT_SUBJECT64_EX: u8 = 0x7c;
pub const AUT_PROCESS64_EX: u8 = 0x7d;
pub const AUT_IN_ADDR_EX: u8 = 0x7e;
pub const AUT_SOCKET_EX: u8 = 0x7f;
pub const AUT_SOCKINET32: u8 = 0x80;
pub const AUT_SOCKINET128: u8 = 0x81;
pub const AUT_SOCKUNIX: u8 = 0x82;
pub const AUT_IDENTITY: u8 = 0xed;

/// Address widths allowed in `_ex` tokens
const AU_IPV4: u32 = 4;
const AU_IPV6: u32 = 16;

/// sun_path capacity of a unix socket token
const SOCKUNIX_PATH_MAX: usize = 104;

/// Returns true for the ids a record may start with
pub fn is_header(id: u8) -> bool {
    matches!(id, AUT_HEADER32 | AUT_HEADER32_EX | AUT_HEADER64 | AUT_HEADER64_EX)
}

/// Record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Byte count of the whole record, header included
    pub record_len: u32,
    pub event_type: u16,
    pub modifier: u16,
    pub seconds: u64,
    pub millis: u64,
}

/// Acting process credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub audit_uid: u32,
    pub euid: u32,
    pub egid: u32,
    pub ruid: u32,
    pub rgid: u32,
    pub pid: u32,
    pub session: u32,
}

/// A decoded token. Only the kinds needed for filtering carry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Header(Header),
    Subject(Subject),
    /// Raw path bytes as stored, usually NUL-terminated
    Path(&'a [u8]),
    /// Any other recognised token, identified by its id
    Other(u8),
}

/// Parse the body of the token identified by `id`.
///
/// Unknown ids fail with `ErrorKind::Tag`, short input with
/// `ErrorKind::Eof` and inconsistent length fields with
/// `ErrorKind::Verify`.
pub fn token_body(id: u8, i: &[u8]) -> IResult<&[u8], Token<'_>> {
    match id {
        AUT_HEADER32 => header(i, false, false),
        AUT_HEADER32_EX => header(i, true, false),
        AUT_HEADER64 => header(i, false, true),
        AUT_HEADER64_EX => header(i, true, true),
        AUT_SUBJECT32 => subject(i, false, false).map(|(i, s)| (i, Token::Subject(s))),
        AUT_SUBJECT32_EX => subject(i, true, false).map(|(i, s)| (i, Token::Subject(s))),
        AUT_SUBJECT64 => subject(i, false, true).map(|(i, s)| (i, Token::Subject(s))),
        AUT_SUBJECT64_EX => subject(i, true, true).map(|(i, s)| (i, Token::Subject(s))),
        AUT_PATH => {
            let (i, path) = length_data(be_u16)(i)?;
            Ok((i, Token::Path(path)))
        }
        _ => {
            let (i, ()) = skip_body(id, i)?;
            Ok((i, Token::Other(id)))
        }
    }
}

fn header(i: &[u8], ex: bool, wide: bool) -> IResult<&[u8], Token<'_>> {
    let (i, record_len) = be_u32(i)?;
    let (i, _version) = be_u8(i)?;
    let (i, event_type) = be_u16(i)?;
    let (i, modifier) = be_u16(i)?;
    let (i, _host) = if ex { address(i)? } else { (i, &[][..]) };
    let (i, seconds, millis) = if wide {
        let (i, s) = be_u64(i)?;
        let (i, ms) = be_u64(i)?;
        (i, s, ms)
    } else {
        let (i, s) = be_u32(i)?;
        let (i, ms) = be_u32(i)?;
        (i, u64::from(s), u64::from(ms))
    };
    Ok((
        i,
        Token::Header(Header {
            record_len,
            event_type,
            modifier,
            seconds,
            millis,
        }),
    ))
}

/// Subject and process tokens share one layout
fn subject(i: &[u8], ex: bool, wide: bool) -> IResult<&[u8], Subject> {
    let (i, audit_uid) = be_u32(i)?;
    let (i, euid) = be_u32(i)?;
    let (i, egid) = be_u32(i)?;
    let (i, ruid) = be_u32(i)?;
    let (i, rgid) = be_u32(i)?;
    let (i, pid) = be_u32(i)?;
    let (i, session) = be_u32(i)?;
    // terminal id: port, then a fixed IPv4 or a typed address
    let (i, _port) = if wide { be_u64(i)? } else { be_u32(i).map(|(i, p)| (i, u64::from(p)))? };
    let (i, _machine) = if ex { address(i)? } else { take(4usize)(i)? };
    Ok((
        i,
        Subject {
            audit_uid,
            euid,
            egid,
            ruid,
            rgid,
            pid,
            session,
        },
    ))
}

/// A 32-bit address type followed by that many address bytes
fn address(i: &[u8]) -> IResult<&[u8], &[u8]> {
    let (i, width) = verify(be_u32, |w: &u32| *w == AU_IPV4 || *w == AU_IPV6)(i)?;
    take(width as usize)(i)
}

fn nul_terminated(i: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_until(&b"\0"[..]), tag(&b"\0"[..]))(i)
}

fn fixed(i: &[u8], n: usize) -> IResult<&[u8], ()> {
    let (i, _) = take(n)(i)?;
    Ok((i, ()))
}

fn counted(i: &[u8]) -> IResult<&[u8], ()> {
    let (i, _) = length_data(be_u16)(i)?;
    Ok((i, ()))
}

/// Consume the body of a token whose content is not needed
fn skip_body(id: u8, i: &[u8]) -> IResult<&[u8], ()> {
    match id {
        AUT_TRAILER => fixed(i, 6),
        AUT_OTHER_FILE32 => {
            let (i, ()) = fixed(i, 8)?;
            counted(i)
        }
        AUT_DATA => {
            let (i, _how_to_print) = be_u8(i)?;
            let (i, unit) = verify(be_u8, |u: &u8| *u <= 3)(i)?;
            let (i, count) = be_u8(i)?;
            fixed(i, usize::from(count) << unit)
        }
        AUT_IPC => fixed(i, 5),
        AUT_XATPATH | AUT_TEXT | AUT_OPAQUE | AUT_ZONENAME => counted(i),
        AUT_PROCESS32 => subject(i, false, false).map(|(i, _)| (i, ())),
        AUT_PROCESS32_EX => subject(i, true, false).map(|(i, _)| (i, ())),
        AUT_PROCESS64 => subject(i, false, true).map(|(i, _)| (i, ())),
        AUT_PROCESS64_EX => subject(i, true, true).map(|(i, _)| (i, ())),
        AUT_RETURN32 => fixed(i, 5),
        AUT_RETURN64 => fixed(i, 9),
        AUT_IN_ADDR => fixed(i, 4),
        AUT_IN_ADDR_EX => address(i).map(|(i, _)| (i, ())),
        AUT_IP => fixed(i, 20),
        AUT_IPORT => fixed(i, 2),
        AUT_ARG32 => {
            let (i, ()) = fixed(i, 5)?;
            counted(i)
        }
        AUT_ARG64 => {
            let (i, ()) = fixed(i, 9)?;
            counted(i)
        }
        AUT_SOCKET => fixed(i, 14),
        AUT_SOCKET_EX => {
            let (i, _domain) = be_u16(i)?;
            let (i, _kind) = be_u16(i)?;
            let (i, width) = verify(be_u16, |w: &u16| u32::from(*w) == AU_IPV4 || u32::from(*w) == AU_IPV6)(i)?;
            fixed(i, 4 + 2 * usize::from(width))
        }
        AUT_SEQ => fixed(i, 4),
        AUT_IPC_PERM => fixed(i, 28),
        AUT_UPRIV => {
            let (i, _success) = be_u8(i)?;
            counted(i)
        }
        AUT_NEWGROUPS => {
            let (i, count) = be_u16(i)?;
            fixed(i, 4 * usize::from(count))
        }
        AUT_EXEC_ARGS | AUT_EXEC_ENV => {
            let (mut i, count) = be_u32(i)?;
            for _ in 0..count {
                (i, _) = nul_terminated(i)?;
            }
            Ok((i, ()))
        }
        AUT_ATTR32 => fixed(i, 28),
        AUT_ATTR64 => fixed(i, 32),
        AUT_EXIT => fixed(i, 8),
        AUT_SOCKINET32 => fixed(i, 8),
        AUT_SOCKINET128 => fixed(i, 20),
        AUT_SOCKUNIX => {
            let (i, _family) = be_u16(i)?;
            let (i, _path) = verify(nul_terminated, |p: &[u8]| p.len() < SOCKUNIX_PATH_MAX)(i)?;
            Ok((i, ()))
        }
        AUT_IDENTITY => {
            let (i, _signer_type) = be_u32(i)?;
            let (i, ()) = counted(i)?;
            let (i, _signing_id_truncated) = be_u8(i)?;
            let (i, ()) = counted(i)?;
            let (i, _team_id_truncated) = be_u8(i)?;
            // cdhash
            counted(i)
        }
        _ => Err(nom::Err::Error(Error::new(i, ErrorKind::Tag))),
    }
}
