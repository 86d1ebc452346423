use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::ptr;

use libc::c_char;

pub trait ToCString {
    fn to_cstring(&self) -> CString;
}

impl<T: AsRef<OsStr>> ToCString for T {
    fn to_cstring(&self) -> CString {
        CString::new(self.as_ref().as_bytes()).unwrap()
    }
}

/// NUL-terminated pointer array over `arr`, in the shape execve wants
///
/// The pointers borrow from `arr`; the array must stay alive (and
/// unmoved) until the exec happens.
pub fn raw_with_null(arr: &[CString]) -> Vec<*const c_char> {
    let mut vec = Vec::with_capacity(arr.len() + 1);
    for item in arr {
        vec.push(item.as_ptr());
    }
    vec.push(ptr::null());
    vec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_array_is_null_terminated() {
        let strings = vec!["a".to_cstring(), "bc".to_cstring()];
        let raw = raw_with_null(&strings);
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0], strings[0].as_ptr());
        assert!(raw[2].is_null());
    }

    #[test]
    fn empty_array_is_just_the_terminator() {
        let raw = raw_with_null(&[]);
        assert_eq!(raw.len(), 1);
        assert!(raw[0].is_null());
    }
}
