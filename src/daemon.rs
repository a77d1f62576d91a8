//! Daemonization: fork, detach from the controlling terminal, and close
//! the standard streams. A handful of raw syscalls with no higher-level
//! crate in front of them — `libc` is the idiomatic way to reach them.

#[cfg(unix)]
pub fn daemonize() -> std::io::Result<()> {
    use std::ffi::CString;

    unsafe {
        match libc::fork() {
            -1 => return Err(std::io::Error::last_os_error()),
            0 => {} // child continues
            _ => std::process::exit(0), // parent exits
        }

        if libc::setsid() < 0 {
            return Err(std::io::Error::last_os_error());
        }

        libc::umask(0);

        let root = CString::new("/").expect("no interior NUL");
        if libc::chdir(root.as_ptr()) != 0 {
            return Err(std::io::Error::last_os_error());
        }

        libc::close(0);
        libc::close(1);
        libc::close(2);
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn daemonize() -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "daemonization is only supported on unix",
    ))
}
