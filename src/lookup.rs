//! The four lookups: account or group, keyed by numeric id or by name.
//!
//! Each call is self-contained. The key is validated, normalized to a slot
//! index, and the record is rebuilt and written into `buf`.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::record::{self, AccountEntry, GroupEntry};
use crate::slot;

fn slot_of_id(id: u32) -> Result<u32> {
    if slot::is_valid_numeric_id(id) {
        Ok(slot::slot_index_of(id))
    } else {
        Err(Error::NotFound)
    }
}

fn slot_of_name(name: &[u8]) -> Result<u32> {
    slot::parse_name(name).ok_or(Error::NotFound)
}

fn account<'a>(slot: u32, buf: &'a mut [u8]) -> Result<AccountEntry<'a>> {
    let account = record::synthesize_account(slot)?;
    record::serialize_account(&account, buf).inspect_err(|err| {
        debug!("account {}: {}", account.name, err);
    })
}

fn group<'a>(slot: u32, buf: &'a mut [u8]) -> Result<GroupEntry<'a>> {
    let group = record::synthesize_group(slot)?;
    record::serialize_group(&group, buf).inspect_err(|err| {
        debug!("group {}: {}", group.name, err);
    })
}

pub fn account_by_id(uid: u32, buf: &mut [u8]) -> Result<AccountEntry<'_>> {
    trace!("account_by_id {}", uid);
    account(slot_of_id(uid)?, buf)
}

pub fn account_by_name<'a>(name: &[u8], buf: &'a mut [u8]) -> Result<AccountEntry<'a>> {
    trace!("account_by_name {:?}", String::from_utf8_lossy(name));
    account(slot_of_name(name)?, buf)
}

pub fn group_by_id(gid: u32, buf: &mut [u8]) -> Result<GroupEntry<'_>> {
    trace!("group_by_id {}", gid);
    group(slot_of_id(gid)?, buf)
}

pub fn group_by_name<'a>(name: &[u8], buf: &'a mut [u8]) -> Result<GroupEntry<'a>> {
    trace!("group_by_name {:?}", String::from_utf8_lossy(name));
    group(slot_of_name(name)?, buf)
}
