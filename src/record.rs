//! Synthesis of slot accounts and groups, and their serialization into a
//! caller-owned scratch buffer.
//!
//! Serialization is two-phase: the exact byte count is computed first and the
//! buffer is only touched once it is known to be large enough. A rejected call
//! leaves the buffer as it was.

use std::ffi::{c_char, CStr};
use std::{fmt, iter, mem};

use crate::error::{Error, Result};
use crate::slot::{self, SlotName};

pub const ACCOUNT_PASSWD: &CStr = c"x";
pub const ACCOUNT_GECOS: &CStr = c"";
pub const ACCOUNT_HOME: &CStr = c"/";
pub const ACCOUNT_SHELL: &CStr = c"/bin/false";
pub const GROUP_PASSWD: &CStr = c"x";

/// Bytes of the NULL pointer terminating a group's (always empty) member array.
pub const MEMBER_LIST_LEN: usize = mem::size_of::<*mut c_char>();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Account {
    pub uid: u32,
    pub gid: u32,
    pub name: SlotName,
    pub passwd: &'static CStr,
    pub gecos: &'static CStr,
    pub home: &'static CStr,
    pub shell: &'static CStr,
}

impl Account {
    /// Bytes needed to serialize: every string plus its terminator.
    pub fn required_len(&self) -> usize {
        self.strings()
            .iter()
            .map(|s| s.to_bytes_with_nul().len())
            .sum()
    }

    fn strings(&self) -> [&CStr; 5] {
        [
            self.name.as_cstr(),
            self.passwd,
            self.gecos,
            self.home,
            self.shell,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Group {
    pub gid: u32,
    pub name: SlotName,
    pub passwd: &'static CStr,
}

impl Group {
    /// Name and password with terminators, plus the member array terminator.
    pub fn required_len(&self) -> usize {
        self.name.as_cstr().to_bytes_with_nul().len()
            + self.passwd.to_bytes_with_nul().len()
            + MEMBER_LIST_LEN
    }
}

pub fn synthesize_account(slot: u32) -> Result<Account> {
    let name = slot::format_name(slot).ok_or(Error::NotFound)?;
    let id = slot::numeric_id_of(slot);

    Ok(Account {
        uid: id,
        gid: id,
        name,
        passwd: ACCOUNT_PASSWD,
        gecos: ACCOUNT_GECOS,
        home: ACCOUNT_HOME,
        shell: ACCOUNT_SHELL,
    })
}

pub fn synthesize_group(slot: u32) -> Result<Group> {
    let name = slot::format_name(slot).ok_or(Error::NotFound)?;

    Ok(Group {
        gid: slot::numeric_id_of(slot),
        name,
        passwd: GROUP_PASSWD,
    })
}

/// An account whose strings live in the scratch buffer it was written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountEntry<'a> {
    pub uid: u32,
    pub gid: u32,
    pub name: &'a CStr,
    pub passwd: &'a CStr,
    pub gecos: &'a CStr,
    pub home: &'a CStr,
    pub shell: &'a CStr,
}

/// A group whose strings and member array live in the scratch buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupEntry<'a> {
    pub gid: u32,
    pub name: &'a CStr,
    pub passwd: &'a CStr,
    pub members: MemberList<'a>,
}

/// A NULL-terminated array of member names inside the scratch buffer. Slot
/// groups have no members, so only the terminator is ever stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberList<'a> {
    terminator: &'a [u8],
}

impl<'a> MemberList<'a> {
    /// Start of the array, for handing to C as a `char **`.
    pub fn as_ptr(&self) -> *const u8 {
        self.terminator.as_ptr()
    }

    pub fn names(&self) -> impl Iterator<Item = &'a CStr> {
        iter::empty()
    }
}

pub fn serialize_account<'a>(account: &Account, buf: &'a mut [u8]) -> Result<AccountEntry<'a>> {
    let mut scratch = Scratch::reserve(buf, account.required_len())?;

    Ok(AccountEntry {
        uid: account.uid,
        gid: account.gid,
        name: scratch.put_str(account.name.as_cstr()),
        passwd: scratch.put_str(account.passwd),
        gecos: scratch.put_str(account.gecos),
        home: scratch.put_str(account.home),
        shell: scratch.put_str(account.shell),
    })
}

pub fn serialize_group<'a>(group: &Group, buf: &'a mut [u8]) -> Result<GroupEntry<'a>> {
    let mut scratch = Scratch::reserve(buf, group.required_len())?;

    Ok(GroupEntry {
        gid: group.gid,
        name: scratch.put_str(group.name.as_cstr()),
        passwd: scratch.put_str(group.passwd),
        members: scratch.put_member_list(),
    })
}

/// Write cursor over a buffer already checked to hold everything put into it.
struct Scratch<'a> {
    rest: &'a mut [u8],
}

impl<'a> Scratch<'a> {
    fn reserve(buf: &'a mut [u8], required: usize) -> Result<Self> {
        if buf.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                available: buf.len(),
            });
        }
        Ok(Scratch { rest: buf })
    }

    fn take(&mut self, len: usize) -> &'a mut [u8] {
        let (head, tail) = mem::take(&mut self.rest).split_at_mut(len);
        self.rest = tail;
        head
    }

    fn put_str(&mut self, s: &CStr) -> &'a CStr {
        let bytes = s.to_bytes_with_nul();
        let head = self.take(bytes.len());
        head.copy_from_slice(bytes);
        let head: &'a [u8] = head;
        // SAFETY: `head` is a byte-for-byte copy of a valid C string.
        unsafe { CStr::from_bytes_with_nul_unchecked(head) }
    }

    fn put_member_list(&mut self) -> MemberList<'a> {
        let terminator = self.take(MEMBER_LIST_LEN);
        // A null pointer is all zero bits on every target libc supports.
        terminator.fill(0);
        MemberList { terminator }
    }
}

/// Renders the passwd(5) line.
impl fmt::Display for AccountEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}:{}",
            self.name.to_string_lossy(),
            self.passwd.to_string_lossy(),
            self.uid,
            self.gid,
            self.gecos.to_string_lossy(),
            self.home.to_string_lossy(),
            self.shell.to_string_lossy()
        )
    }
}

/// Renders the group(5) line.
impl fmt::Display for GroupEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:",
            self.name.to_string_lossy(),
            self.passwd.to_string_lossy(),
            self.gid
        )?;
        for (i, member) in self.members.names().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(&member.to_string_lossy())?;
        }
        Ok(())
    }
}
