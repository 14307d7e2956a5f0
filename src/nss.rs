//! glibc NSS entry points for the `slots` service.
//!
//! With `libnss_slots.so.2` on the library path and `slots` listed in the
//! `passwd` and `group` lines of `/etc/nsswitch.conf`, glibc resolves the slot
//! window through these functions. They only translate between glibc's
//! `struct passwd`/`struct group` plus scratch buffer and [`crate::lookup`].

use std::ffi::CStr;
use std::slice;

use libc::{c_char, c_int, gid_t, group, passwd, size_t, uid_t, ERANGE};
use log::debug;

use crate::error::{Error, Result};
use crate::lookup;
use crate::record::{AccountEntry, GroupEntry};

/// `enum nss_status` from `<nss.h>`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NssStatus {
    TryAgain = -2,
    Unavail = -1,
    NotFound = 0,
    Success = 1,
    Return = 2,
}

/// Borrows glibc's scratch buffer. A null pointer is an empty buffer.
unsafe fn scratch<'a>(buf: *mut c_char, buflen: size_t) -> &'a mut [u8] {
    if buf.is_null() {
        Default::default()
    } else {
        // SAFETY: glibc hands us `buflen` writable bytes at `buf` for the call.
        unsafe { slice::from_raw_parts_mut(buf.cast::<u8>(), buflen) }
    }
}

unsafe fn key<'a>(name: *const c_char) -> Option<&'a [u8]> {
    if name.is_null() {
        None
    } else {
        // SAFETY: glibc passes a NUL-terminated name.
        Some(unsafe { CStr::from_ptr(name) }.to_bytes())
    }
}

/// Maps a lookup result onto a status, filling the record on success.
unsafe fn finish<T>(result: Result<T>, errnop: *mut c_int, fill: impl FnOnce(T)) -> NssStatus {
    match result {
        Ok(entry) => {
            fill(entry);
            NssStatus::Success
        }
        Err(Error::NotFound) => NssStatus::NotFound,
        Err(err @ Error::BufferTooSmall { .. }) => {
            debug!("nss_slots: {}", err);
            if !errnop.is_null() {
                // SAFETY: non-null `errnop` points at the caller's errno.
                unsafe { *errnop = ERANGE };
            }
            NssStatus::TryAgain
        }
    }
}

fn fill_passwd(pwbuf: &mut passwd, entry: AccountEntry<'_>) {
    pwbuf.pw_uid = entry.uid;
    pwbuf.pw_gid = entry.gid;
    pwbuf.pw_name = entry.name.as_ptr().cast_mut();
    pwbuf.pw_passwd = entry.passwd.as_ptr().cast_mut();
    pwbuf.pw_gecos = entry.gecos.as_ptr().cast_mut();
    pwbuf.pw_dir = entry.home.as_ptr().cast_mut();
    pwbuf.pw_shell = entry.shell.as_ptr().cast_mut();
}

fn fill_group(grbuf: &mut group, entry: GroupEntry<'_>) {
    grbuf.gr_gid = entry.gid;
    grbuf.gr_name = entry.name.as_ptr().cast_mut();
    grbuf.gr_passwd = entry.passwd.as_ptr().cast_mut();
    // The terminator follows 8 bytes of strings, so it keeps the buffer's
    // pointer alignment.
    grbuf.gr_mem = entry.members.as_ptr().cast_mut().cast::<*mut c_char>();
}

/// # Safety
/// `pwbuf` must be null or valid for writes, `buf` must be null or valid for
/// `buflen` bytes, and `errnop` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn _nss_slots_getpwuid_r(
    uid: uid_t,
    pwbuf: *mut passwd,
    buf: *mut c_char,
    buflen: size_t,
    errnop: *mut c_int,
) -> NssStatus {
    // SAFETY: upheld by the caller as documented above.
    let Some(pwbuf) = (unsafe { pwbuf.as_mut() }) else {
        return NssStatus::NotFound;
    };
    // SAFETY: `buf` and `errnop` are null or valid for the whole call.
    unsafe {
        let buf = scratch(buf, buflen);
        finish(lookup::account_by_id(uid, buf), errnop, |entry| {
            fill_passwd(pwbuf, entry)
        })
    }
}

/// # Safety
/// `name` must be null or a NUL-terminated string; otherwise as
/// [`_nss_slots_getpwuid_r`].
#[no_mangle]
pub unsafe extern "C" fn _nss_slots_getpwnam_r(
    name: *const c_char,
    pwbuf: *mut passwd,
    buf: *mut c_char,
    buflen: size_t,
    errnop: *mut c_int,
) -> NssStatus {
    // SAFETY: upheld by the caller as documented above.
    let (Some(name), Some(pwbuf)) = (unsafe { key(name) }, unsafe { pwbuf.as_mut() }) else {
        return NssStatus::NotFound;
    };
    // SAFETY: `buf` and `errnop` are null or valid for the whole call.
    unsafe {
        let buf = scratch(buf, buflen);
        finish(lookup::account_by_name(name, buf), errnop, |entry| {
            fill_passwd(pwbuf, entry)
        })
    }
}

/// # Safety
/// `grbuf` must be null or valid for writes, `buf` must be null or valid for
/// `buflen` bytes, and `errnop` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn _nss_slots_getgrgid_r(
    gid: gid_t,
    grbuf: *mut group,
    buf: *mut c_char,
    buflen: size_t,
    errnop: *mut c_int,
) -> NssStatus {
    // SAFETY: upheld by the caller as documented above.
    let Some(grbuf) = (unsafe { grbuf.as_mut() }) else {
        return NssStatus::NotFound;
    };
    // SAFETY: `buf` and `errnop` are null or valid for the whole call.
    unsafe {
        let buf = scratch(buf, buflen);
        finish(lookup::group_by_id(gid, buf), errnop, |entry| {
            fill_group(grbuf, entry)
        })
    }
}

/// # Safety
/// `name` must be null or a NUL-terminated string; otherwise as
/// [`_nss_slots_getgrgid_r`].
#[no_mangle]
pub unsafe extern "C" fn _nss_slots_getgrnam_r(
    name: *const c_char,
    grbuf: *mut group,
    buf: *mut c_char,
    buflen: size_t,
    errnop: *mut c_int,
) -> NssStatus {
    // SAFETY: upheld by the caller as documented above.
    let (Some(name), Some(grbuf)) = (unsafe { key(name) }, unsafe { grbuf.as_mut() }) else {
        return NssStatus::NotFound;
    };
    // SAFETY: `buf` and `errnop` are null or valid for the whole call.
    unsafe {
        let buf = scratch(buf, buflen);
        finish(lookup::group_by_name(name, buf), errnop, |entry| {
            fill_group(grbuf, entry)
        })
    }
}

#[cfg(test)]
mod test {
    use std::mem::MaybeUninit;
    use std::ptr;

    use super::*;

    fn empty_passwd() -> passwd {
        // SAFETY: `passwd` is plain data; null pointers and zero ids are valid.
        unsafe { MaybeUninit::zeroed().assume_init() }
    }

    fn empty_group() -> group {
        // SAFETY: as above for `group`.
        unsafe { MaybeUninit::zeroed().assume_init() }
    }

    unsafe fn string<'a>(ptr: *const c_char) -> &'a str {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
    }

    #[test]
    fn getpwnam_fills_passwd() {
        let mut pw = empty_passwd();
        let mut buf = [0 as c_char; 64];
        let mut errno: c_int = 0;
        let status = unsafe {
            _nss_slots_getpwnam_r(
                c"s0042".as_ptr(),
                &mut pw,
                buf.as_mut_ptr(),
                buf.len(),
                &mut errno,
            )
        };

        assert_eq!(status, NssStatus::Success);
        assert_eq!(errno, 0);
        assert_eq!(pw.pw_uid, 20042);
        assert_eq!(pw.pw_gid, 20042);
        assert_eq!(pw.pw_name.cast_const(), buf.as_ptr());
        unsafe {
            assert_eq!(string(pw.pw_name), "s0042");
            assert_eq!(string(pw.pw_passwd), "x");
            assert_eq!(string(pw.pw_gecos), "");
            assert_eq!(string(pw.pw_dir), "/");
            assert_eq!(string(pw.pw_shell), "/bin/false");
        }
    }

    #[test]
    fn getpwuid_fills_passwd() {
        let mut by_uid = empty_passwd();
        let mut buf = [0 as c_char; 64];
        let mut errno: c_int = 0;
        let status = unsafe {
            _nss_slots_getpwuid_r(20042, &mut by_uid, buf.as_mut_ptr(), buf.len(), &mut errno)
        };
        assert_eq!(status, NssStatus::Success);
        assert_eq!(by_uid.pw_uid, 20042);
        unsafe {
            assert_eq!(string(by_uid.pw_name), "s0042");
            assert_eq!(string(by_uid.pw_shell), "/bin/false");
        }
    }

    #[test]
    fn getpwuid_outside_window_is_not_found() {
        let mut pw = empty_passwd();
        let mut buf = [0 as c_char; 64];
        let mut errno: c_int = 0;
        for uid in [0, 19999, 30000] {
            let status = unsafe {
                _nss_slots_getpwuid_r(uid, &mut pw, buf.as_mut_ptr(), buf.len(), &mut errno)
            };
            assert_eq!(status, NssStatus::NotFound);
        }
        assert_eq!(errno, 0);
        assert!(pw.pw_name.is_null());
    }

    #[test]
    fn small_buffer_sets_erange() {
        let mut pw = empty_passwd();
        let mut buf = [0 as c_char; 1];
        let mut errno: c_int = 0;
        let status = unsafe {
            _nss_slots_getpwnam_r(
                c"s0042".as_ptr(),
                &mut pw,
                buf.as_mut_ptr(),
                buf.len(),
                &mut errno,
            )
        };
        assert_eq!(status, NssStatus::TryAgain);
        assert_eq!(errno, ERANGE);
        assert!(pw.pw_name.is_null());
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn getgrnam_fills_group() {
        // u64 storage keeps the member array pointer aligned
        let mut storage = [0u64; 4];
        let buf = storage.as_mut_ptr().cast::<c_char>();
        let buflen = std::mem::size_of_val(&storage);
        let mut gr = empty_group();
        let mut errno: c_int = 0;
        let status =
            unsafe { _nss_slots_getgrnam_r(c"s9999".as_ptr(), &mut gr, buf, buflen, &mut errno) };

        assert_eq!(status, NssStatus::Success);
        assert_eq!(gr.gr_gid, 29999);
        unsafe {
            assert_eq!(string(gr.gr_name), "s9999");
            assert_eq!(string(gr.gr_passwd), "x");
            assert!((*gr.gr_mem).is_null());
        }
    }

    #[test]
    fn getgrgid_fills_group() {
        let mut storage = [0xffu64; 4];
        let buf = storage.as_mut_ptr().cast::<c_char>();
        let buflen = std::mem::size_of_val(&storage);
        let mut gr = empty_group();
        let mut errno: c_int = 0;
        let status = unsafe { _nss_slots_getgrgid_r(20042, &mut gr, buf, buflen, &mut errno) };

        assert_eq!(status, NssStatus::Success);
        assert_eq!(errno, 0);
        assert_eq!(gr.gr_gid, 20042);
        assert_eq!(gr.gr_name.cast_const(), buf.cast_const());
        unsafe {
            assert_eq!(string(gr.gr_name), "s0042");
            assert_eq!(string(gr.gr_passwd), "x");
            assert!((*gr.gr_mem).is_null());
        }
    }

    #[test]
    fn getgrgid_exact_buffer() {
        let required = 6 + 2 + std::mem::size_of::<*mut c_char>();
        let mut storage = [0xffu64; 4];
        let buf = storage.as_mut_ptr().cast::<c_char>();
        let mut errno: c_int = 0;

        let mut gr = empty_group();
        let status =
            unsafe { _nss_slots_getgrgid_r(29999, &mut gr, buf, required - 1, &mut errno) };
        assert_eq!(status, NssStatus::TryAgain);
        assert_eq!(errno, ERANGE);
        assert!(gr.gr_name.is_null());

        let mut errno: c_int = 0;
        let mut gr = empty_group();
        let status = unsafe { _nss_slots_getgrgid_r(29999, &mut gr, buf, required, &mut errno) };
        assert_eq!(status, NssStatus::Success);
        assert_eq!(errno, 0);
        assert_eq!(gr.gr_gid, 29999);
        unsafe {
            assert_eq!(string(gr.gr_name), "s9999");
            assert!((*gr.gr_mem).is_null());
        }
    }

    #[test]
    fn getgrgid_small_buffer() {
        let mut gr = empty_group();
        let mut buf = [0 as c_char; 9];
        let mut errno: c_int = 0;
        let status = unsafe {
            _nss_slots_getgrgid_r(20000, &mut gr, buf.as_mut_ptr(), buf.len(), &mut errno)
        };
        assert_eq!(status, NssStatus::TryAgain);
        assert_eq!(errno, ERANGE);
    }

    #[test]
    fn null_pointers_do_not_crash() {
        let mut pw = empty_passwd();
        let mut gr = empty_group();
        unsafe {
            assert_eq!(
                _nss_slots_getpwnam_r(ptr::null(), &mut pw, ptr::null_mut(), 0, ptr::null_mut()),
                NssStatus::NotFound
            );
            assert_eq!(
                _nss_slots_getgrnam_r(
                    c"s0001".as_ptr(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    0,
                    ptr::null_mut()
                ),
                NssStatus::NotFound
            );
            assert_eq!(
                _nss_slots_getpwuid_r(20001, &mut pw, ptr::null_mut(), 0, ptr::null_mut()),
                NssStatus::TryAgain
            );
            assert_eq!(
                _nss_slots_getgrgid_r(20001, &mut gr, ptr::null_mut(), 64, ptr::null_mut()),
                NssStatus::TryAgain
            );
        }
    }
}
